use super::models::OptionType;
use std::f64::consts::SQRT_2;

/// Smallest time to expiry used by the estimator (one day, in years).
pub const MIN_TIME_TO_EXPIRY: f64 = 1.0 / 365.0;

/// Black-Scholes delta of a European option.
///
/// `time_to_expiry` is in years and is floored to one day so a contract
/// expiring today still gets a finite estimate. Returns `None` when the
/// inputs cannot produce a number (non-positive spot, strike or volatility,
/// or any non-finite intermediate); callers render that as `N/A`.
pub fn delta(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    risk_free_rate: f64,
    volatility: f64,
    option_type: OptionType,
) -> Option<f64> {
    if !(spot.is_finite() && strike.is_finite() && volatility.is_finite() && risk_free_rate.is_finite()) {
        return None;
    }
    if spot <= 0.0 || strike <= 0.0 || volatility <= 0.0 {
        return None;
    }

    let t = if time_to_expiry.is_finite() {
        time_to_expiry.max(MIN_TIME_TO_EXPIRY)
    } else {
        return None;
    };

    let d1 = ((spot / strike).ln() + (risk_free_rate + 0.5 * volatility * volatility) * t)
        / (volatility * t.sqrt());

    if !d1.is_finite() {
        return None;
    }

    let n_d1 = norm_cdf(d1);

    Some(match option_type {
        OptionType::Call => n_d1.clamp(0.0, 1.0),
        OptionType::Put => (n_d1 - 1.0).clamp(-1.0, 0.0),
    })
}

/// Standard normal CDF, Φ(x).
fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / SQRT_2))
}

/// Abramowitz & Stegun 7.1.26, max error 1.5e-7.
fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}
