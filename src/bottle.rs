use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::record::{BottleId, BottleReference};
use crate::{Error, Result};

/// Certified concentrations of the reference gas bottles
///
/// Loaded once per run and shared read-only between systems.
#[derive(Clone, Debug)]
pub struct BottleRegistry {
    bottles: HashMap<BottleId, f64>,
}

impl BottleRegistry {
    /// Build a registry from reference rows
    ///
    /// # Errors
    /// Returns [`Error::EmptyRegistry`] if `references` is empty and [`Error::DuplicateBottle`]
    /// if a bottle appears twice.
    pub fn new(references: impl IntoIterator<Item = BottleReference>) -> Result<Self> {
        let mut bottles = HashMap::new();
        for reference in references {
            if bottles
                .insert(reference.bottle_id, reference.true_concentration)
                .is_some()
            {
                return Err(Error::DuplicateBottle(reference.bottle_id));
            }
        }
        if bottles.is_empty() {
            return Err(Error::EmptyRegistry);
        }
        Ok(Self { bottles })
    }

    /// Read a registry from a CSV file with `cal_bottle_id` and `cal_bottle_co2` columns
    ///
    /// # Errors
    /// Returns an error if the file is missing or malformed, or for the reasons given in
    /// [`BottleRegistry::new`].
    pub fn from_csv(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let file = fs::read(path)?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(&file[..]);

        let references = rdr
            .deserialize()
            .collect::<std::result::Result<Vec<BottleReference>, _>>()?;
        Self::new(references)
    }

    #[must_use]
    pub fn true_concentration(&self, bottle_id: BottleId) -> Option<f64> {
        self.bottles.get(&bottle_id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bottles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bottles.is_empty()
    }
}
