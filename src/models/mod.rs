// src/models/mod.rs

pub mod attempt;
pub mod question;
pub mod result;
pub mod session;

use serde::Serializer;

/// Display rounding for score percentages. The stored and grade-deciding
/// values stay unrounded; only serialized output is clipped to one decimal.
pub(crate) fn round_one_decimal<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64((value * 10.0).round() / 10.0)
}
