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

//! The data type set understood by the engine, with the canonical
//! lowercase names used by cast expressions.

use crate::error::{LaminaError, Result};
use std::fmt::{Display, Formatter};

/// Logical type of a column or scalar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Utf8,
    Binary,
    Null,
    /// Placeholder for a type the planner could not resolve, e.g. a
    /// column that is absent from the input schema.
    Unknown,
}

impl DataType {
    /// The canonical lowercase name accepted by cast expressions.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            DataType::Boolean => "bool",
            DataType::Int8 => "i8",
            DataType::Int16 => "i16",
            DataType::Int32 => "i32",
            DataType::Int64 => "i64",
            DataType::UInt8 => "u8",
            DataType::UInt16 => "u16",
            DataType::UInt32 => "u32",
            DataType::UInt64 => "u64",
            DataType::Float32 => "f32",
            DataType::Float64 => "f64",
            DataType::Utf8 => "str",
            DataType::Binary => "binary",
            DataType::Null => "null",
            DataType::Unknown => "unknown",
        }
    }

    /// Parse a canonical type name. Names outside the type set are
    /// reported as [`LaminaError::UnknownCastType`].
    pub fn parse_canonical(name: &str) -> Result<DataType> {
        Ok(match name {
            "bool" => DataType::Boolean,
            "i8" => DataType::Int8,
            "i16" => DataType::Int16,
            "i32" => DataType::Int32,
            "i64" => DataType::Int64,
            "u8" => DataType::UInt8,
            "u16" => DataType::UInt16,
            "u32" => DataType::UInt32,
            "u64" => DataType::UInt64,
            "f32" => DataType::Float32,
            "f64" => DataType::Float64,
            "str" => DataType::Utf8,
            "binary" => DataType::Binary,
            "null" => DataType::Null,
            _ => return Err(LaminaError::UnknownCastType(name.to_string())),
        })
    }

    pub fn is_signed_integer(&self) -> bool {
        matches!(
            self,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    }

    pub fn is_unsigned_integer(&self) -> bool {
        matches!(
            self,
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64
        )
    }

    pub fn is_integer(&self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

/// The numeric type both sides of a binary arithmetic expression are
/// coerced to.
///
/// Floats dominate integers, wider floats dominate narrower ones, and a
/// signed operand widens an all-integer pair to `Int64` (`UInt64` when
/// both sides are unsigned). Non-numeric input yields `Unknown`.
pub fn merge_numeric(left: DataType, right: DataType) -> DataType {
    use DataType::*;
    if left == Float64 || right == Float64 {
        Float64
    } else if left == Float32 || right == Float32 {
        Float32
    } else if left.is_integer() && right.is_integer() {
        if left.is_signed_integer() || right.is_signed_integer() {
            Int64
        } else {
            UInt64
        }
    } else {
        Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_round_trip() {
        for dt in [
            DataType::Boolean,
            DataType::Int8,
            DataType::Int16,
            DataType::Int32,
            DataType::Int64,
            DataType::UInt8,
            DataType::UInt16,
            DataType::UInt32,
            DataType::UInt64,
            DataType::Float32,
            DataType::Float64,
            DataType::Utf8,
            DataType::Binary,
            DataType::Null,
        ] {
            assert_eq!(DataType::parse_canonical(dt.canonical_name()).unwrap(), dt);
        }
    }

    #[test]
    fn unknown_cast_name() {
        let err = DataType::parse_canonical("decimal").unwrap_err();
        assert!(matches!(err, LaminaError::UnknownCastType(_)));
    }

    #[test]
    fn merge_numeric_lattice() {
        assert_eq!(
            merge_numeric(DataType::Int64, DataType::Float64),
            DataType::Float64
        );
        assert_eq!(
            merge_numeric(DataType::Int8, DataType::Float32),
            DataType::Float32
        );
        assert_eq!(
            merge_numeric(DataType::Int32, DataType::UInt64),
            DataType::Int64
        );
        assert_eq!(
            merge_numeric(DataType::UInt8, DataType::UInt64),
            DataType::UInt64
        );
        assert_eq!(
            merge_numeric(DataType::Utf8, DataType::Int64),
            DataType::Unknown
        );
    }
}
