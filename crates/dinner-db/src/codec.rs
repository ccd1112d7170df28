//! # Type Codec
//!
//! Conversions between the scalar types PostgreSQL stores and the types the
//! domain speaks.
//!
//! ```text
//! ┌──────────────────────────┬────────────────────────────┐
//! │  Column                  │  Domain                    │
//! ├──────────────────────────┼────────────────────────────┤
//! │  INTEGER (i32)           │  u8 / u16 / u32            │
//! │  BIGINT  (i64)           │  u32                       │
//! │  SMALLINT (i16)          │  i8                        │
//! │  NUMERIC (Decimal)       │  f32 / f64                 │
//! │  TEXT                    │  enum (FromStr)            │
//! │  min_* / max_* pair      │  range value object        │
//! │  NULL                    │  None                      │
//! └──────────────────────────┴────────────────────────────┘
//! ```
//!
//! Reads are checked: a stored value that does not fit its domain type is
//! corrupted data and surfaces as [`DbError::Integrity`]. Writes of values
//! that cannot be represented (NaN, infinities, indices past `i32::MAX`)
//! are caller errors and surface as validation failures.
//!
//! Nullable TEXT columns bind `Option<String>` directly; the driver keeps
//! `Some("")` and `None` apart, so no conversion is needed for them.

use std::str::FromStr;

use dinner_core::{
    Float32RangeWithOptionalMax, OptionalFloat32Range, OptionalUint32Range,
    Uint16RangeWithOptionalMax, Uint32RangeWithOptionalMax, ValidationError,
};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::error::{DbError, DbResult};

// =============================================================================
// Decimals
// =============================================================================

/// Encodes a float for a NUMERIC column.
pub fn decimal_from_f32(field: &str, value: f32) -> DbResult<Decimal> {
    Decimal::from_f32(value).ok_or_else(|| not_representable(field))
}

pub fn optional_decimal_from_f32(field: &str, value: Option<f32>) -> DbResult<Option<Decimal>> {
    value.map(|v| decimal_from_f32(field, v)).transpose()
}

pub fn decimal_from_f64(field: &str, value: f64) -> DbResult<Decimal> {
    Decimal::from_f64(value).ok_or_else(|| not_representable(field))
}

pub fn optional_decimal_from_f64(field: &str, value: Option<f64>) -> DbResult<Option<Decimal>> {
    value.map(|v| decimal_from_f64(field, v)).transpose()
}

/// Decodes a NUMERIC column into an `f32`.
pub fn f32_from_decimal(column: &str, value: Decimal) -> DbResult<f32> {
    value
        .to_f32()
        .ok_or_else(|| DbError::integrity(column, value, "does not fit in f32"))
}

pub fn optional_f32_from_decimal(column: &str, value: Option<Decimal>) -> DbResult<Option<f32>> {
    value.map(|v| f32_from_decimal(column, v)).transpose()
}

pub fn optional_f64_from_decimal(column: &str, value: Option<Decimal>) -> DbResult<Option<f64>> {
    value
        .map(|v| {
            v.to_f64()
                .ok_or_else(|| DbError::integrity(column, v, "does not fit in f64"))
        })
        .transpose()
}

fn not_representable(field: &str) -> DbError {
    DbError::Validation(ValidationError::OutOfRange {
        field: field.to_string(),
        min: i64::MIN,
        max: i64::MAX,
    })
}

// =============================================================================
// Integers
// =============================================================================

/// Encodes an unsigned domain integer for an INTEGER column.
pub fn i32_from_u32(field: &str, value: u32) -> DbResult<i32> {
    i32::try_from(value).map_err(|_| {
        DbError::Validation(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i32::MAX.into(),
        })
    })
}

/// Decodes an INTEGER / BIGINT / SMALLINT column into a narrower domain
/// integer, treating anything out of range as corruption.
pub fn narrow<S, T>(column: &str, value: S) -> DbResult<T>
where
    S: Copy + ToString,
    T: TryFrom<S>,
{
    T::try_from(value).map_err(|_| DbError::integrity(column, value, "out of range"))
}

pub fn narrow_optional<S, T>(column: &str, value: Option<S>) -> DbResult<Option<T>>
where
    S: Copy + ToString,
    T: TryFrom<S>,
{
    value.map(|v| narrow(column, v)).transpose()
}

// =============================================================================
// Enumerations
// =============================================================================

/// Decodes a TEXT column into one of the domain's string enums.
pub fn parse_enum<T>(column: &str, value: &str) -> DbResult<T>
where
    T: FromStr<Err = ValidationError>,
{
    value
        .parse()
        .map_err(|e: ValidationError| DbError::integrity(column, value, e.to_string()))
}

// =============================================================================
// Ranges
// =============================================================================

/// Min/max column pair as it is bound or read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalPair {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl DecimalPair {
    pub fn from_float32_range_with_optional_max(
        field: &str,
        range: &Float32RangeWithOptionalMax,
    ) -> DbResult<Self> {
        Ok(DecimalPair {
            min: Some(decimal_from_f32(field, range.min)?),
            max: optional_decimal_from_f32(field, range.max)?,
        })
    }

    pub fn from_optional_float32_range(field: &str, range: &OptionalFloat32Range) -> DbResult<Self> {
        Ok(DecimalPair {
            min: optional_decimal_from_f32(field, range.min)?,
            max: optional_decimal_from_f32(field, range.max)?,
        })
    }
}

pub fn float32_range_with_optional_max(
    column: &str,
    min: Decimal,
    max: Option<Decimal>,
) -> DbResult<Float32RangeWithOptionalMax> {
    Ok(Float32RangeWithOptionalMax {
        min: f32_from_decimal(column, min)?,
        max: optional_f32_from_decimal(column, max)?,
    })
}

pub fn optional_float32_range(
    column: &str,
    min: Option<Decimal>,
    max: Option<Decimal>,
) -> DbResult<OptionalFloat32Range> {
    Ok(OptionalFloat32Range {
        min: optional_f32_from_decimal(column, min)?,
        max: optional_f32_from_decimal(column, max)?,
    })
}

pub fn uint16_range_with_optional_max(
    column: &str,
    min: i32,
    max: Option<i32>,
) -> DbResult<Uint16RangeWithOptionalMax> {
    Ok(Uint16RangeWithOptionalMax {
        min: narrow(column, min)?,
        max: narrow_optional(column, max)?,
    })
}

pub fn uint32_range_with_optional_max(
    column: &str,
    min: i64,
    max: Option<i64>,
) -> DbResult<Uint32RangeWithOptionalMax> {
    Ok(Uint32RangeWithOptionalMax {
        min: narrow(column, min)?,
        max: narrow_optional(column, max)?,
    })
}

pub fn optional_uint32_range(
    column: &str,
    min: Option<i64>,
    max: Option<i64>,
) -> DbResult<OptionalUint32Range> {
    Ok(OptionalUint32Range {
        min: narrow_optional(column, min)?,
        max: narrow_optional(column, max)?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use dinner_core::VesselShape;

    #[test]
    fn test_decimal_round_trip_keeps_value() {
        let encoded = decimal_from_f32("capacity", 2.5).unwrap();
        assert_eq!(encoded, Decimal::new(25, 1));
        assert_eq!(f32_from_decimal("capacity", encoded).unwrap(), 2.5);
    }

    #[test]
    fn test_nan_is_rejected_on_write() {
        let err = decimal_from_f32("capacity", f32::NAN).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_out_of_range_read_is_integrity_error() {
        let err = narrow::<i32, u16>("minimum_vessel_count", 70_000).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Integrity);

        let err = narrow::<i32, u8>("rank", -1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Integrity);
    }

    #[test]
    fn test_null_stays_none() {
        assert_eq!(narrow_optional::<i64, u32>("seconds", None).unwrap(), None);
        assert_eq!(optional_f32_from_decimal("temp", None).unwrap(), None);
    }

    #[test]
    fn test_unknown_enum_value_is_integrity_error() {
        assert_eq!(
            parse_enum::<VesselShape>("shape", "cylinder").unwrap(),
            VesselShape::Cylinder
        );
        let err = parse_enum::<VesselShape>("shape", "torus").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Integrity);
    }

    #[test]
    fn test_range_pairs() {
        let range = optional_uint32_range("estimated_time_in_seconds", Some(60), None).unwrap();
        assert_eq!(range, OptionalUint32Range::new(Some(60), None));

        let pair = DecimalPair::from_float32_range_with_optional_max(
            "quantity",
            &Float32RangeWithOptionalMax::new(1.0, Some(2.0)),
        )
        .unwrap();
        assert_eq!(pair.min, Some(Decimal::ONE));
        assert_eq!(pair.max, Some(Decimal::TWO));
    }

    #[test]
    fn test_index_past_i32_is_rejected() {
        assert!(i32_from_u32("index", u32::MAX).is_err());
        assert_eq!(i32_from_u32("index", 3).unwrap(), 3);
    }
}
