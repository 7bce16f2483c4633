//! Financial metric primitives.

use thiserror::Error;

/// Quarter weights for relative strength, oldest quarter first.
///
/// The most recent quarter counts double.
pub const RS_WEIGHTS: [f64; 4] = [0.2, 0.2, 0.2, 0.4];

/// Errors raised by the metric primitives.
///
/// Both indicate corrupt upstream data; no recovery is defined for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MetricsError {
    #[error("initial value of zero is undefined")]
    DivideByZero,

    #[error("NaN inputs are undefined")]
    InvalidInput,
}

/// Percent change from `initial` to `final_value`.
pub fn percent_change(initial: f64, final_value: f64) -> Result<f64, MetricsError> {
    if initial == 0.0 {
        return Err(MetricsError::DivideByZero);
    }

    if initial.is_nan() || final_value.is_nan() {
        return Err(MetricsError::InvalidInput);
    }

    Ok(100.0 * (final_value - initial) / initial)
}

/// Weighted relative strength from `(start, end)` prices of four
/// consecutive quarters, oldest first.
pub fn relative_strength(quarters: [(f64, f64); 4]) -> Result<f64, MetricsError> {
    let mut score = 0.0;
    for ((start, end), weight) in quarters.into_iter().zip(RS_WEIGHTS) {
        score += weight * percent_change(start, end)?;
    }
    Ok(score)
}
