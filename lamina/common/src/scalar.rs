// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! A dynamically typed single value, and the arithmetic and comparison
//! kernels over it.
//!
//! The same kernels back both the optimizer's constant folder and the
//! eager row evaluator, so a folded plan cannot produce a different
//! result than the unfolded one.

use crate::operator::{Operator, UnaryOperator};
use crate::types::DataType;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

macro_rules! cast_int {
    ($value:expr, $native:ty, $variant:ident) => {
        match $value.parse_f64() {
            Some(v) => ScalarValue::$variant(v as $native),
            None => ScalarValue::Null,
        }
    };
}

/// A single dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Utf8(String),
    Binary(Vec<u8>),
    Null,
    /// A data type used as a value, carried by data-type column
    /// selectors such as `col_type(i64)`.
    Type(DataType),
}

impl ScalarValue {
    pub fn data_type(&self) -> DataType {
        match self {
            ScalarValue::Boolean(_) => DataType::Boolean,
            ScalarValue::Int8(_) => DataType::Int8,
            ScalarValue::Int16(_) => DataType::Int16,
            ScalarValue::Int32(_) => DataType::Int32,
            ScalarValue::Int64(_) => DataType::Int64,
            ScalarValue::UInt8(_) => DataType::UInt8,
            ScalarValue::UInt16(_) => DataType::UInt16,
            ScalarValue::UInt32(_) => DataType::UInt32,
            ScalarValue::UInt64(_) => DataType::UInt64,
            ScalarValue::Float32(_) => DataType::Float32,
            ScalarValue::Float64(_) => DataType::Float64,
            ScalarValue::Utf8(_) => DataType::Utf8,
            ScalarValue::Binary(_) => DataType::Binary,
            ScalarValue::Null => DataType::Null,
            ScalarValue::Type(_) => DataType::Unknown,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn is_numeric(&self) -> bool {
        self.data_type().is_numeric()
    }

    /// Integer view of the value, when it fits in `i64`.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Int8(v) => Some(*v as i64),
            ScalarValue::Int16(v) => Some(*v as i64),
            ScalarValue::Int32(v) => Some(*v as i64),
            ScalarValue::Int64(v) => Some(*v),
            ScalarValue::UInt8(v) => Some(*v as i64),
            ScalarValue::UInt16(v) => Some(*v as i64),
            ScalarValue::UInt32(v) => Some(*v as i64),
            ScalarValue::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Float view of any numeric value.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Float32(v) => Some(*v as f64),
            ScalarValue::Float64(v) => Some(*v),
            other => other.to_i64().map(|v| v as f64),
        }
    }

    /// Evaluate `self <op> rhs` for arithmetic operators.
    ///
    /// Returns `None` when the operation is not evaluable without
    /// changing observable semantics: non-numeric operands, integer
    /// overflow, or a zero divisor. A `Null` on either side propagates.
    pub fn arithmetic(op: Operator, lhs: &ScalarValue, rhs: &ScalarValue) -> Option<ScalarValue> {
        debug_assert!(op.is_arithmetic());
        if lhs.is_null() || rhs.is_null() {
            return Some(ScalarValue::Null);
        }
        if !lhs.is_numeric() || !rhs.is_numeric() {
            return None;
        }
        if lhs.data_type().is_float() || rhs.data_type().is_float() {
            let (l, r) = (lhs.to_f64()?, rhs.to_f64()?);
            let out = match op {
                Operator::Plus => l + r,
                Operator::Minus => l - r,
                Operator::Multiply => l * r,
                Operator::Divide => {
                    if r == 0.0 {
                        return None;
                    }
                    l / r
                }
                _ => return None,
            };
            Some(ScalarValue::Float64(out))
        } else {
            let (l, r) = (lhs.to_i64()?, rhs.to_i64()?);
            let out = match op {
                Operator::Plus => l.checked_add(r)?,
                Operator::Minus => l.checked_sub(r)?,
                Operator::Multiply => l.checked_mul(r)?,
                Operator::Divide => {
                    if r == 0 {
                        return None;
                    }
                    l.checked_div(r)?
                }
                _ => return None,
            };
            Some(ScalarValue::Int64(out))
        }
    }

    /// Evaluate `self <op> rhs` for comparison operators.
    ///
    /// `Eq`/`NotEq` use structural equality and never null-propagate;
    /// ordered comparisons on a `Null` operand yield `Null`.
    pub fn compare(op: Operator, lhs: &ScalarValue, rhs: &ScalarValue) -> Option<ScalarValue> {
        debug_assert!(op.is_comparison());
        match op {
            Operator::Eq => return Some(ScalarValue::Boolean(lhs == rhs)),
            Operator::NotEq => return Some(ScalarValue::Boolean(lhs != rhs)),
            _ => {}
        }
        if lhs.is_null() || rhs.is_null() {
            return Some(ScalarValue::Null);
        }
        let ordering = lhs.order(rhs)?;
        let out = match op {
            Operator::Lt => ordering == Ordering::Less,
            Operator::LtEq => ordering != Ordering::Greater,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::GtEq => ordering != Ordering::Less,
            _ => return None,
        };
        Some(ScalarValue::Boolean(out))
    }

    /// Evaluate `self <op> rhs` for `And`/`Or` over booleans.
    pub fn logical(op: Operator, lhs: &ScalarValue, rhs: &ScalarValue) -> Option<ScalarValue> {
        debug_assert!(op.is_logical());
        match (lhs, rhs) {
            (ScalarValue::Boolean(l), ScalarValue::Boolean(r)) => {
                let out = match op {
                    Operator::And => *l && *r,
                    Operator::Or => *l || *r,
                    _ => return None,
                };
                Some(ScalarValue::Boolean(out))
            }
            _ => None,
        }
    }

    /// Evaluate a unary operator.
    pub fn unary(op: UnaryOperator, value: &ScalarValue) -> Option<ScalarValue> {
        match op {
            UnaryOperator::IsNull => Some(ScalarValue::Boolean(value.is_null())),
            UnaryOperator::IsNotNull => Some(ScalarValue::Boolean(!value.is_null())),
            UnaryOperator::Not => match value {
                ScalarValue::Boolean(v) => Some(ScalarValue::Boolean(!v)),
                ScalarValue::Null => Some(ScalarValue::Null),
                _ => None,
            },
            UnaryOperator::Negative => match value {
                ScalarValue::Int8(v) => v.checked_neg().map(ScalarValue::Int8),
                ScalarValue::Int16(v) => v.checked_neg().map(ScalarValue::Int16),
                ScalarValue::Int32(v) => v.checked_neg().map(ScalarValue::Int32),
                ScalarValue::Int64(v) => v.checked_neg().map(ScalarValue::Int64),
                ScalarValue::Float32(v) => Some(ScalarValue::Float32(-v)),
                ScalarValue::Float64(v) => Some(ScalarValue::Float64(-v)),
                ScalarValue::Null => Some(ScalarValue::Null),
                _ => None,
            },
        }
    }

    /// Total ordering between two comparable values, `None` when the
    /// pair does not order (mixed non-numeric types, NaN).
    pub fn order(&self, other: &ScalarValue) -> Option<Ordering> {
        match (self, other) {
            (ScalarValue::Utf8(l), ScalarValue::Utf8(r)) => Some(l.cmp(r)),
            (ScalarValue::Binary(l), ScalarValue::Binary(r)) => Some(l.cmp(r)),
            (ScalarValue::Boolean(l), ScalarValue::Boolean(r)) => Some(l.cmp(r)),
            (l, r) if l.is_numeric() && r.is_numeric() => {
                if l.data_type().is_float() || r.data_type().is_float() {
                    l.to_f64()?.partial_cmp(&r.to_f64()?)
                } else {
                    // integers of any width and signedness compare exactly
                    let l = widen(l)?;
                    let r = widen(r)?;
                    Some(l.cmp(&r))
                }
            }
            _ => None,
        }
    }

    /// Convert the value to the target type.
    ///
    /// Lossy conversions truncate the way `as` does; values with no
    /// sensible representation in the target type become `Null`.
    pub fn cast_to(&self, to: DataType) -> ScalarValue {
        if self.data_type() == to {
            return self.clone();
        }
        match to {
            DataType::Utf8 => ScalarValue::Utf8(self.to_string()),
            DataType::Boolean => match self {
                ScalarValue::Boolean(v) => ScalarValue::Boolean(*v),
                other => match other.to_i64() {
                    Some(v) => ScalarValue::Boolean(v != 0),
                    None => ScalarValue::Null,
                },
            },
            DataType::Float32 => match self.parse_f64() {
                Some(v) => ScalarValue::Float32(v as f32),
                None => ScalarValue::Null,
            },
            DataType::Float64 => match self.parse_f64() {
                Some(v) => ScalarValue::Float64(v),
                None => ScalarValue::Null,
            },
            DataType::Int8 => cast_int!(self, i8, Int8),
            DataType::Int16 => cast_int!(self, i16, Int16),
            DataType::Int32 => cast_int!(self, i32, Int32),
            DataType::Int64 => cast_int!(self, i64, Int64),
            DataType::UInt8 => cast_int!(self, u8, UInt8),
            DataType::UInt16 => cast_int!(self, u16, UInt16),
            DataType::UInt32 => cast_int!(self, u32, UInt32),
            DataType::UInt64 => match self {
                ScalarValue::UInt64(v) => ScalarValue::UInt64(*v),
                other => match other.parse_f64() {
                    Some(v) if v >= 0.0 => ScalarValue::UInt64(v as u64),
                    _ => ScalarValue::Null,
                },
            },
            DataType::Binary => match self {
                ScalarValue::Utf8(s) => ScalarValue::Binary(s.clone().into_bytes()),
                _ => ScalarValue::Null,
            },
            DataType::Null | DataType::Unknown => ScalarValue::Null,
        }
    }

    // numeric view that also parses strings, used by casts only
    fn parse_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Utf8(s) => s.trim().parse::<f64>().ok(),
            ScalarValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            other => other.to_f64(),
        }
    }
}

// integer reading for exact cross-width comparison
fn widen(value: &ScalarValue) -> Option<i128> {
    match value {
        ScalarValue::UInt64(v) => Some(*v as i128),
        other => other.to_i64().map(|v| v as i128),
    }
}

macro_rules! impl_from_native {
    ($native:ty, $variant:ident) => {
        impl From<$native> for ScalarValue {
            fn from(value: $native) -> Self {
                ScalarValue::$variant(value)
            }
        }
    };
}

impl_from_native!(bool, Boolean);
impl_from_native!(i8, Int8);
impl_from_native!(i16, Int16);
impl_from_native!(i32, Int32);
impl_from_native!(i64, Int64);
impl_from_native!(u8, UInt8);
impl_from_native!(u16, UInt16);
impl_from_native!(u32, UInt32);
impl_from_native!(u64, UInt64);
impl_from_native!(f32, Float32);
impl_from_native!(f64, Float64);
impl_from_native!(String, Utf8);

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Utf8(value.to_string())
    }
}

impl From<DataType> for ScalarValue {
    fn from(value: DataType) -> Self {
        ScalarValue::Type(value)
    }
}

impl Display for ScalarValue {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ScalarValue::Boolean(v) => write!(f, "{v}"),
            ScalarValue::Int8(v) => write!(f, "{v}"),
            ScalarValue::Int16(v) => write!(f, "{v}"),
            ScalarValue::Int32(v) => write!(f, "{v}"),
            ScalarValue::Int64(v) => write!(f, "{v}"),
            ScalarValue::UInt8(v) => write!(f, "{v}"),
            ScalarValue::UInt16(v) => write!(f, "{v}"),
            ScalarValue::UInt32(v) => write!(f, "{v}"),
            ScalarValue::UInt64(v) => write!(f, "{v}"),
            ScalarValue::Float32(v) => write!(f, "{v}"),
            ScalarValue::Float64(v) => write!(f, "{v}"),
            ScalarValue::Utf8(v) => write!(f, "{v}"),
            ScalarValue::Binary(v) => {
                for byte in v {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            ScalarValue::Null => write!(f, "null"),
            ScalarValue::Type(dt) => write!(f, "{dt}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_arithmetic_folds_to_int64() {
        let out = ScalarValue::arithmetic(
            Operator::Plus,
            &ScalarValue::Int32(1),
            &ScalarValue::Int32(2),
        );
        assert_eq!(out, Some(ScalarValue::Int64(3)));
    }

    #[test]
    fn float_arithmetic_folds_to_float64() {
        let out = ScalarValue::arithmetic(
            Operator::Multiply,
            &ScalarValue::Int64(2),
            &ScalarValue::Float64(1.5),
        );
        assert_eq!(out, Some(ScalarValue::Float64(3.0)));
    }

    #[test]
    fn division_by_zero_does_not_evaluate() {
        assert_eq!(
            ScalarValue::arithmetic(
                Operator::Divide,
                &ScalarValue::Int64(1),
                &ScalarValue::Int64(0)
            ),
            None
        );
        assert_eq!(
            ScalarValue::arithmetic(
                Operator::Divide,
                &ScalarValue::Float64(1.0),
                &ScalarValue::Float64(0.0)
            ),
            None
        );
    }

    #[test]
    fn null_propagates_through_arithmetic_and_ordering() {
        assert_eq!(
            ScalarValue::arithmetic(Operator::Plus, &ScalarValue::Null, &ScalarValue::Int64(1)),
            Some(ScalarValue::Null)
        );
        assert_eq!(
            ScalarValue::compare(Operator::Lt, &ScalarValue::Null, &ScalarValue::Int64(1)),
            Some(ScalarValue::Null)
        );
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(
            ScalarValue::compare(Operator::Eq, &ScalarValue::Null, &ScalarValue::Null),
            Some(ScalarValue::Boolean(true))
        );
        assert_eq!(
            ScalarValue::compare(
                Operator::NotEq,
                &ScalarValue::Utf8("a".into()),
                &ScalarValue::Utf8("b".into())
            ),
            Some(ScalarValue::Boolean(true))
        );
    }

    #[test]
    fn cross_width_integer_comparison() {
        let out = ScalarValue::compare(
            Operator::Gt,
            &ScalarValue::UInt64(u64::MAX),
            &ScalarValue::Int64(i64::MAX),
        );
        assert_eq!(out, Some(ScalarValue::Boolean(true)));
    }

    #[test]
    fn casts() {
        assert_eq!(
            ScalarValue::Int64(3).cast_to(DataType::Float64),
            ScalarValue::Float64(3.0)
        );
        assert_eq!(
            ScalarValue::Utf8("12".into()).cast_to(DataType::Int32),
            ScalarValue::Int32(12)
        );
        assert_eq!(
            ScalarValue::Utf8("abc".into()).cast_to(DataType::Int32),
            ScalarValue::Null
        );
        assert_eq!(
            ScalarValue::Float64(1.5).cast_to(DataType::Utf8),
            ScalarValue::Utf8("1.5".into())
        );
    }
}
