//! Kelvin based temperature conversions.

/// Converts an ACPI thermal zone reading in tenths of Kelvin to Celsius.
pub fn tenths_kelvin_to_celsius(raw_tenths_kelvin: u32) -> f64 {
    raw_tenths_kelvin as f64 / 10.0 - 273.15
}

/// Converts a whole-Kelvin performance counter reading to Celsius.
///
/// Precision quirk: the offset is computed as
/// `2732 / 10` in integer arithmetic, which drops the 0.15 K fraction, so
/// results read 0.15 °C high compared to [`tenths_kelvin_to_celsius`].
pub fn counter_kelvin_to_celsius(kelvin: u32) -> f64 {
    (kelvin as i64 - 2732 / 10) as f64
}
