//! Unit conversions.
//!
//! Two families live here:
//!
//! - canonical converters, applied once while normalizing provider data
//!   (kelvin → °C, m/s → km/h, m → km). Every result is an integer.
//! - display converters (°C ↔ °F, km/h ↔ mph, hPa ↔ inHg), applied only when a
//!   stored bundle is rendered for a user. Their output never flows back into a
//!   normalized record.
//!
//! Rounding follows `round_half_up` everywhere so that `-0.5` becomes `0`, the
//! same way browsers round the numbers they display.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Offset between kelvin and degrees Celsius.
const KELVIN_OFFSET: f64 = 273.15;
/// m/s → km/h multiplier.
const MS_TO_KMH: f64 = 3.6;
/// Kilometres per statute mile.
const KM_PER_MILE: f64 = 1.609_344;
/// Inches of mercury per hectopascal.
const INHG_PER_HPA: f64 = 0.029_529_983;

/// Largest magnitude accepted for a raw provider reading. Anything beyond it
/// is treated as absent before conversion, which keeps every converted value
/// well inside `i32`.
pub const MAX_READING_MAGNITUDE: f64 = 1.0e6;

/// Round to the nearest integer, with halves rounded towards +∞.
///
/// Computed from the exact fractional part, so `0.49999999999999994` rounds
/// to 0. Inputs outside the `i32` range saturate; raw readings are bounded by
/// `MAX_READING_MAGNITUDE` before they get here.
pub fn round_half_up(v: f64) -> i32 {
    let floor = v.floor();
    let rounded = if v - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i32
}

/// A finite raw reading within `MAX_READING_MAGNITUDE`, or `None`.
pub fn plausible_reading(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite() && x.abs() <= MAX_READING_MAGNITUDE)
}

/// `round(k - 273.15)`. Callers must not pass an absent reading; absent values
/// are filtered out during raw-entry validation.
pub fn kelvin_to_celsius(k: f64) -> i32 {
    round_half_up(k - KELVIN_OFFSET)
}

/// `round(v * 3.6)`.
pub fn meters_per_second_to_kmh(v: f64) -> i32 {
    round_half_up(v * MS_TO_KMH)
}

/// `round(v / 1000)`, or `None` (unavailable) when the provider omitted the value.
///
/// `Some(0)` is thick fog; `None` means the provider said nothing.
pub fn meters_to_km(v: Option<f64>) -> Option<i32> {
    v.map(|m| round_half_up(m / 1000.0))
}

// ---------------------------------------------------------------------------
// Display units
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WindUnit {
    #[default]
    Kmh,
    Mph,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PressureUnit {
    #[default]
    Hpa,
    Inhg,
}

pub fn celsius_to_fahrenheit(c: i32) -> i32 {
    round_half_up(f64::from(c) * 9.0 / 5.0 + 32.0)
}

pub fn fahrenheit_to_celsius(f: i32) -> i32 {
    round_half_up((f64::from(f) - 32.0) * 5.0 / 9.0)
}

pub fn kmh_to_mph(kmh: i32) -> i32 {
    round_half_up(f64::from(kmh) / KM_PER_MILE)
}

pub fn mph_to_kmh(mph: i32) -> i32 {
    round_half_up(f64::from(mph) * KM_PER_MILE)
}

/// hPa → inHg, kept to 2 decimal places (barometers are read to the hundredth).
pub fn hpa_to_inhg(hpa: i32) -> f64 {
    (f64::from(hpa) * INHG_PER_HPA * 100.0).round() / 100.0
}

pub fn inhg_to_hpa(inhg: f64) -> i32 {
    round_half_up(inhg / INHG_PER_HPA)
}

impl TemperatureUnit {
    /// Render a canonical °C value in this unit.
    pub fn display(self, celsius: i32) -> i32 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius_to_fahrenheit(celsius),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

impl WindUnit {
    /// Render a canonical km/h value in this unit.
    pub fn display(self, kmh: i32) -> i32 {
        match self {
            WindUnit::Kmh => kmh,
            WindUnit::Mph => kmh_to_mph(kmh),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            WindUnit::Kmh => "km/h",
            WindUnit::Mph => "mph",
        }
    }
}

impl PressureUnit {
    /// Render a canonical hPa value in this unit.
    pub fn display(self, hpa: i32) -> f64 {
        match self {
            PressureUnit::Hpa => f64::from(hpa),
            PressureUnit::Inhg => hpa_to_inhg(hpa),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            PressureUnit::Hpa => "hPa",
            PressureUnit::Inhg => "inHg",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(2.49), 2);
        assert_eq!(round_half_up(-0.5), 0);
        assert_eq!(round_half_up(-1.5), -1);
        assert_eq!(round_half_up(-1.51), -2);
    }

    #[test]
    fn test_round_half_up_just_below_half() {
        // Adding 0.5 first would round this up to 1
        assert_eq!(round_half_up(0.499_999_999_999_999_94), 0);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(1.0e6 + 0.5), 1_000_001);
    }

    #[test]
    fn test_plausible_reading() {
        assert_eq!(plausible_reading(Some(1013.0)), Some(1013.0));
        assert_eq!(plausible_reading(Some(-40.0)), Some(-40.0));
        assert_eq!(plausible_reading(Some(1.0e12)), None);
        assert_eq!(plausible_reading(Some(f64::NAN)), None);
        assert_eq!(plausible_reading(Some(f64::INFINITY)), None);
        assert_eq!(plausible_reading(None), None);
    }

    #[test]
    fn test_kelvin_to_celsius() {
        assert_eq!(kelvin_to_celsius(280.0), 7);
        assert_eq!(kelvin_to_celsius(285.0), 12);
        assert_eq!(kelvin_to_celsius(273.15), 0);
        assert_eq!(kelvin_to_celsius(263.15), -10);
    }

    #[test]
    fn test_kelvin_to_celsius_near_zero() {
        // -0.45 °C rounds to 0, not -0
        assert_eq!(kelvin_to_celsius(272.7), 0);
        // -0.65 °C rounds to -1
        assert_eq!(kelvin_to_celsius(272.5), -1);
    }

    #[test]
    fn test_meters_per_second_to_kmh() {
        assert_eq!(meters_per_second_to_kmh(0.0), 0);
        assert_eq!(meters_per_second_to_kmh(1.0), 4); // 3.6
        assert_eq!(meters_per_second_to_kmh(3.2), 12); // 11.52
        assert_eq!(meters_per_second_to_kmh(10.0), 36);
    }

    #[test]
    fn test_meters_to_km() {
        assert_eq!(meters_to_km(Some(10000.0)), Some(10));
        assert_eq!(meters_to_km(Some(1500.0)), Some(2));
        assert_eq!(meters_to_km(Some(0.0)), Some(0));
    }

    #[test]
    fn test_meters_to_km_absent_is_not_zero() {
        assert_eq!(meters_to_km(None), None);
        assert_ne!(meters_to_km(None), Some(0));
    }

    #[test]
    fn test_temperature_display() {
        assert_eq!(celsius_to_fahrenheit(0), 32);
        assert_eq!(celsius_to_fahrenheit(100), 212);
        assert_eq!(celsius_to_fahrenheit(-40), -40);
        assert_eq!(fahrenheit_to_celsius(212), 100);
        assert_eq!(TemperatureUnit::Celsius.display(21), 21);
        assert_eq!(TemperatureUnit::Fahrenheit.display(21), 70); // 69.8
    }

    #[test]
    fn test_wind_display() {
        assert_eq!(kmh_to_mph(100), 62);
        assert_eq!(mph_to_kmh(62), 100);
        assert_eq!(WindUnit::Kmh.display(12), 12);
        assert_eq!(WindUnit::Mph.display(12), 7); // 7.46
    }

    #[test]
    fn test_pressure_display() {
        assert!((hpa_to_inhg(1013) - 29.91).abs() < 1e-9);
        assert_eq!(inhg_to_hpa(29.92), 1013);
        assert!((PressureUnit::Hpa.display(1013) - 1013.0).abs() < 1e-9);
        assert!((PressureUnit::Inhg.display(1013) - 29.91).abs() < 1e-9);
    }

    #[test]
    fn test_unit_serialization() {
        assert_eq!(
            serde_json::to_string(&TemperatureUnit::Fahrenheit).unwrap(),
            "\"fahrenheit\""
        );
        let w: WindUnit = serde_json::from_str("\"mph\"").unwrap();
        assert_eq!(w, WindUnit::Mph);
        let p: PressureUnit = serde_json::from_str("\"inhg\"").unwrap();
        assert_eq!(p, PressureUnit::Inhg);
    }
}
