//! Serialization policy for floating-point fields that may legitimately be NaN.
//!
//! JSON has no representation for NaN, so non-finite values are written as
//! `null`, and `null` reads back as `f64::NAN`. The value is never coerced to
//! `0`: a missing price or an average over zero reviews stays distinguishable
//! from a real zero after a round trip.

/// `#[serde(with = "nan_as_null")]` adapter for `f64` fields.
pub mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Writes finite values as numbers and everything else as `null`.
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying serializer.
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    /// Reads a number, mapping `null` to `f64::NAN`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is neither a number nor `null`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Price {
        #[serde(with = "super::nan_as_null")]
        value: f64,
    }

    #[test]
    fn nan_serializes_as_null() {
        let json = serde_json::to_string(&Price { value: f64::NAN }).unwrap();
        assert_eq!(json, r#"{"value":null}"#);
    }

    #[test]
    fn null_deserializes_as_nan() {
        let price: Price = serde_json::from_str(r#"{"value":null}"#).unwrap();
        assert!(price.value.is_nan());
    }

    #[test]
    fn finite_value_is_kept() {
        let json = serde_json::to_string(&Price { value: 74.99 }).unwrap();
        let back: Price = serde_json::from_str(&json).unwrap();
        assert!((back.value - 74.99).abs() < f64::EPSILON);
    }

    #[test]
    fn integer_json_reads_as_float() {
        let price: Price = serde_json::from_str(r#"{"value":8}"#).unwrap();
        assert!((price.value - 8.0).abs() < f64::EPSILON);
    }
}
