//! Psychrometric formulas for metrics derived from temperature and humidity.
//!
//! Both functions use Magnus-type approximations and are pure. Callers are
//! expected to pass values that already satisfy the [`Sample`](crate::Sample)
//! invariants: a finite temperature above absolute zero and a relative
//! humidity in `(0, 100]`.

/// Magnus coefficients used for saturation vapour pressure.
const SVP_A: f64 = 17.67;
const SVP_B: f64 = 243.5;
/// Saturation vapour pressure at 0 °C, in hPa.
const SVP_BASE_HPA: f64 = 6.112;
/// Converts hPa / K into g/m³ for water vapour.
const WATER_VAPOUR_FACTOR: f64 = 216.7;
const ZERO_CELSIUS_K: f64 = 273.15;

/// Magnus-Tetens coefficients used for the dew point.
const DEW_A: f64 = 17.62;
const DEW_B: f64 = 243.12;

/// Absolute humidity in g/m³ for a temperature in °C and relative humidity in %.
///
/// ```
/// use envlog_types::psychro::absolute_humidity;
///
/// let ah = absolute_humidity(20.0, 50.0);
/// assert!((ah - 8.64).abs() < 0.1);
/// ```
#[must_use]
pub fn absolute_humidity(temp_c: f64, rh_pct: f64) -> f64 {
    let saturation = SVP_BASE_HPA * ((SVP_A * temp_c) / (temp_c + SVP_B)).exp();
    let actual = rh_pct / 100.0 * saturation;
    WATER_VAPOUR_FACTOR * actual / (temp_c + ZERO_CELSIUS_K)
}

/// Dew point in °C for a temperature in °C and relative humidity in %.
///
/// Requires `rh_pct > 0`.
///
/// ```
/// use envlog_types::psychro::dew_point;
///
/// let dp = dew_point(20.0, 50.0);
/// assert!((dp - 9.27).abs() < 0.1);
/// ```
#[must_use]
pub fn dew_point(temp_c: f64, rh_pct: f64) -> f64 {
    let alpha = (DEW_A * temp_c) / (DEW_B + temp_c) + (rh_pct / 100.0).ln();
    (DEW_B * alpha) / (DEW_A - alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reference_values() {
        assert!((dew_point(20.0, 50.0) - 9.27).abs() < 0.1);
        assert!((absolute_humidity(20.0, 50.0) - 8.64).abs() < 0.1);
    }

    #[test]
    fn test_saturated_air_dew_point_equals_temperature() {
        for t in [-10.0, 0.0, 15.0, 30.0] {
            assert!((dew_point(t, 100.0) - t).abs() < 1e-9);
        }
    }

    #[test]
    fn test_absolute_humidity_scales_with_rh() {
        let half = absolute_humidity(25.0, 50.0);
        let full = absolute_humidity(25.0, 100.0);
        assert!((full - 2.0 * half).abs() < 1e-9);
    }

    #[test]
    fn test_absolute_humidity_grows_with_temperature() {
        assert!(absolute_humidity(30.0, 50.0) > absolute_humidity(10.0, 50.0));
    }

    proptest! {
        #[test]
        fn prop_dew_point_below_air_temperature(
            t in -30.0f64..50.0,
            rh in 1.0f64..99.9,
        ) {
            prop_assert!(dew_point(t, rh) < t);
        }

        #[test]
        fn prop_absolute_humidity_positive(
            t in -30.0f64..50.0,
            rh in 0.1f64..=100.0,
        ) {
            let ah = absolute_humidity(t, rh);
            prop_assert!(ah.is_finite());
            prop_assert!(ah > 0.0);
        }
    }
}
