//! Water vapour dilution of CO2 readings.
//!
//! The sensors report the mole fraction in humid air. Dividing by the dry air fraction
//! `1 - x_h2o` recovers the dry mole fraction.

/// 0 °C in kelvin
pub const T0: f64 = 273.15;
/// Critical temperature of water in kelvin
pub const TC: f64 = 647.096;
/// Critical pressure of water in pascal
pub const PC: f64 = 22.064e6;

#[must_use]
pub fn absolute_temperature(celsius: f64) -> f64 {
    celsius + T0
}

/// Saturation vapour pressure of water in pascal at `kelvin`
#[must_use]
pub fn saturation_vapor_pressure(kelvin: f64) -> f64 {
    const A: [f64; 6] = [
        -7.859_517_83,
        1.844_082_59,
        -11.786_649_7,
        22.680_741_1,
        -15.961_871_9,
        1.801_225_02,
    ];
    let theta = 1.0 - kelvin / TC;
    let sum = A[0] * theta
        + A[1] * theta.powf(1.5)
        + A[2] * theta.powi(3)
        + A[3] * theta.powf(3.5)
        + A[4] * theta.powi(4)
        + A[5] * theta.powf(7.5);
    (TC / kelvin * sum).exp() * PC
}

/// Water vapour mole fraction (0..1) from temperature (°C), relative humidity (%) and
/// pressure (hPa)
#[must_use]
pub fn h2o_mole_fraction(temperature: f64, humidity: f64, pressure: f64) -> f64 {
    saturation_vapor_pressure(absolute_temperature(temperature)) * humidity / 100.0
        / (pressure * 100.0)
}

#[must_use]
pub fn h2o_volume_percent(temperature: f64, humidity: f64, pressure: f64) -> f64 {
    h2o_mole_fraction(temperature, humidity, pressure) * 100.0
}

/// Convert a wet CO2 mole fraction to the dry mole fraction
#[must_use]
pub fn wet_to_dry(co2_wet: f64, temperature: f64, humidity: f64, pressure: f64) -> f64 {
    co2_wet / (1.0 - h2o_mole_fraction(temperature, humidity, pressure))
}
