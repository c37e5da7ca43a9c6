use crate::{PlError, PlResult};

/// Floating point type used for every reading and control value.
pub type Real = f64;

/// One tolerance for every value comparison.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-9,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

/// Numeric value of a displayed control value.
///
/// Control values are shown as text and may carry a decoration after the
/// number, e.g. the motor speed `"890 (50)"` is 890 rpm at 50 %. Only the
/// leading whitespace-delimited token is parsed.
pub fn leading_number(text: &str) -> Option<Real> {
    let token = text.split_whitespace().next()?;
    let value: Real = token.parse().ok()?;
    value.is_finite().then_some(value)
}

/// Like [`leading_number`] but reports the offending text.
pub fn parse_control_value(text: &str) -> PlResult<Real> {
    leading_number(text).ok_or_else(|| PlError::NonNumeric {
        value: text.to_string(),
    })
}

/// Two control values match when their leading numbers are nearly equal.
pub fn values_match(a: Real, b: Real) -> bool {
    nearly_equal(a, b, Tolerances::default())
}

/// Render a reading the way it is displayed: integral values without a
/// fractional part.
pub fn format_reading(v: Real) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
