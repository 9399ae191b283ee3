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

//! A named, typed column of optional values.

use lamina_common::error::{LaminaError, Result};
use lamina_common::operator::AggregateFunction;
use lamina_common::scalar::ScalarValue;
use lamina_common::types::DataType;

/// Typed storage backing a [Series]. One vector variant per data type;
/// an all-null column of unknown element type only tracks its length.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesData {
    Boolean(Vec<Option<bool>>),
    Int8(Vec<Option<i8>>),
    Int16(Vec<Option<i16>>),
    Int32(Vec<Option<i32>>),
    Int64(Vec<Option<i64>>),
    UInt8(Vec<Option<u8>>),
    UInt16(Vec<Option<u16>>),
    UInt32(Vec<Option<u32>>),
    UInt64(Vec<Option<u64>>),
    Float32(Vec<Option<f32>>),
    Float64(Vec<Option<f64>>),
    Utf8(Vec<Option<String>>),
    Binary(Vec<Option<Vec<u8>>>),
    Null(usize),
}

/// Expand `$body` once per typed variant, binding the value vector to
/// `$v`; `Null` columns run `$null_body` with the length bound to `$n`.
macro_rules! dispatch {
    ($data:expr, $v:ident => $body:expr, $n:ident => $null_body:expr) => {
        match $data {
            SeriesData::Boolean($v) => $body,
            SeriesData::Int8($v) => $body,
            SeriesData::Int16($v) => $body,
            SeriesData::Int32($v) => $body,
            SeriesData::Int64($v) => $body,
            SeriesData::UInt8($v) => $body,
            SeriesData::UInt16($v) => $body,
            SeriesData::UInt32($v) => $body,
            SeriesData::UInt64($v) => $body,
            SeriesData::Float32($v) => $body,
            SeriesData::Float64($v) => $body,
            SeriesData::Utf8($v) => $body,
            SeriesData::Binary($v) => $body,
            SeriesData::Null($n) => $null_body,
        }
    };
}

/// Expand `$body` once per typed variant, rebuilding the same variant
/// from the result.
macro_rules! rebuild {
    ($data:expr, $v:ident => $body:expr, $n:ident => $null_len:expr) => {
        match $data {
            SeriesData::Boolean($v) => SeriesData::Boolean($body),
            SeriesData::Int8($v) => SeriesData::Int8($body),
            SeriesData::Int16($v) => SeriesData::Int16($body),
            SeriesData::Int32($v) => SeriesData::Int32($body),
            SeriesData::Int64($v) => SeriesData::Int64($body),
            SeriesData::UInt8($v) => SeriesData::UInt8($body),
            SeriesData::UInt16($v) => SeriesData::UInt16($body),
            SeriesData::UInt32($v) => SeriesData::UInt32($body),
            SeriesData::UInt64($v) => SeriesData::UInt64($body),
            SeriesData::Float32($v) => SeriesData::Float32($body),
            SeriesData::Float64($v) => SeriesData::Float64($body),
            SeriesData::Utf8($v) => SeriesData::Utf8($body),
            SeriesData::Binary($v) => SeriesData::Binary($body),
            SeriesData::Null($n) => SeriesData::Null($null_len),
        }
    };
}

macro_rules! collect_variant {
    ($values:expr, $dtype:expr, $scalar:ident, $data:ident) => {{
        let out = $values
            .iter()
            .map(|value| match value.cast_to($dtype) {
                ScalarValue::$scalar(x) => Some(x),
                _ => None,
            })
            .collect();
        SeriesData::$data(out)
    }};
}

macro_rules! primitive_ctor {
    ($fn_name:ident, $opt_fn_name:ident, $native:ty, $variant:ident) => {
        pub fn $fn_name(name: impl Into<String>, values: Vec<$native>) -> Series {
            Series {
                name: name.into(),
                data: SeriesData::$variant(values.into_iter().map(Some).collect()),
            }
        }

        pub fn $opt_fn_name(name: impl Into<String>, values: Vec<Option<$native>>) -> Series {
            Series {
                name: name.into(),
                data: SeriesData::$variant(values),
            }
        }
    };
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: String,
    data: SeriesData,
}

impl Series {
    primitive_ctor!(new_bool, new_opt_bool, bool, Boolean);
    primitive_ctor!(new_i8, new_opt_i8, i8, Int8);
    primitive_ctor!(new_i16, new_opt_i16, i16, Int16);
    primitive_ctor!(new_i32, new_opt_i32, i32, Int32);
    primitive_ctor!(new_i64, new_opt_i64, i64, Int64);
    primitive_ctor!(new_u8, new_opt_u8, u8, UInt8);
    primitive_ctor!(new_u16, new_opt_u16, u16, UInt16);
    primitive_ctor!(new_u32, new_opt_u32, u32, UInt32);
    primitive_ctor!(new_u64, new_opt_u64, u64, UInt64);
    primitive_ctor!(new_f32, new_opt_f32, f32, Float32);
    primitive_ctor!(new_f64, new_opt_f64, f64, Float64);

    pub fn new_utf8(name: impl Into<String>, values: Vec<&str>) -> Series {
        Series {
            name: name.into(),
            data: SeriesData::Utf8(values.into_iter().map(|s| Some(s.to_string())).collect()),
        }
    }

    pub fn new_opt_utf8(name: impl Into<String>, values: Vec<Option<String>>) -> Series {
        Series {
            name: name.into(),
            data: SeriesData::Utf8(values),
        }
    }

    pub fn new_binary(name: impl Into<String>, values: Vec<Vec<u8>>) -> Series {
        Series {
            name: name.into(),
            data: SeriesData::Binary(values.into_iter().map(Some).collect()),
        }
    }

    pub fn new_null(name: impl Into<String>, len: usize) -> Series {
        Series {
            name: name.into(),
            data: SeriesData::Null(len),
        }
    }

    /// Build a series of the given element type from scalar values.
    /// Scalars that do not convert to the target type become null.
    pub fn from_scalars_typed(
        name: impl Into<String>,
        dtype: DataType,
        values: &[ScalarValue],
    ) -> Result<Series> {
        let data = match dtype {
            DataType::Boolean => collect_variant!(values, dtype, Boolean, Boolean),
            DataType::Int8 => collect_variant!(values, dtype, Int8, Int8),
            DataType::Int16 => collect_variant!(values, dtype, Int16, Int16),
            DataType::Int32 => collect_variant!(values, dtype, Int32, Int32),
            DataType::Int64 => collect_variant!(values, dtype, Int64, Int64),
            DataType::UInt8 => collect_variant!(values, dtype, UInt8, UInt8),
            DataType::UInt16 => collect_variant!(values, dtype, UInt16, UInt16),
            DataType::UInt32 => collect_variant!(values, dtype, UInt32, UInt32),
            DataType::UInt64 => collect_variant!(values, dtype, UInt64, UInt64),
            DataType::Float32 => collect_variant!(values, dtype, Float32, Float32),
            DataType::Float64 => collect_variant!(values, dtype, Float64, Float64),
            DataType::Utf8 => collect_variant!(values, dtype, Utf8, Utf8),
            DataType::Binary => collect_variant!(values, dtype, Binary, Binary),
            DataType::Null => SeriesData::Null(values.len()),
            DataType::Unknown => {
                return Err(LaminaError::UnknownCastType("unknown".to_string()))
            }
        };
        Ok(Series {
            name: name.into(),
            data,
        })
    }

    /// Build a series whose element type is inferred from the first
    /// non-null scalar. An all-null input produces a `Null` column.
    pub fn from_scalars(name: impl Into<String>, values: &[ScalarValue]) -> Result<Series> {
        let dtype = values
            .iter()
            .find(|v| !v.is_null())
            .map(ScalarValue::data_type)
            .unwrap_or(DataType::Null);
        Series::from_scalars_typed(name, dtype, values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Series {
        self.rename(name);
        self
    }

    pub fn len(&self) -> usize {
        dispatch!(&self.data, v => v.len(), n => *n)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match &self.data {
            SeriesData::Boolean(_) => DataType::Boolean,
            SeriesData::Int8(_) => DataType::Int8,
            SeriesData::Int16(_) => DataType::Int16,
            SeriesData::Int32(_) => DataType::Int32,
            SeriesData::Int64(_) => DataType::Int64,
            SeriesData::UInt8(_) => DataType::UInt8,
            SeriesData::UInt16(_) => DataType::UInt16,
            SeriesData::UInt32(_) => DataType::UInt32,
            SeriesData::UInt64(_) => DataType::UInt64,
            SeriesData::Float32(_) => DataType::Float32,
            SeriesData::Float64(_) => DataType::Float64,
            SeriesData::Utf8(_) => DataType::Utf8,
            SeriesData::Binary(_) => DataType::Binary,
            SeriesData::Null(_) => DataType::Null,
        }
    }

    /// Value at row `i`, with nulls surfaced as [`ScalarValue::Null`].
    pub fn get(&self, i: usize) -> ScalarValue {
        macro_rules! get_variant {
            ($v:expr, $variant:ident) => {
                $v.get(i)
                    .and_then(|o| o.clone())
                    .map(ScalarValue::$variant)
                    .unwrap_or(ScalarValue::Null)
            };
        }
        match &self.data {
            SeriesData::Boolean(v) => get_variant!(v, Boolean),
            SeriesData::Int8(v) => get_variant!(v, Int8),
            SeriesData::Int16(v) => get_variant!(v, Int16),
            SeriesData::Int32(v) => get_variant!(v, Int32),
            SeriesData::Int64(v) => get_variant!(v, Int64),
            SeriesData::UInt8(v) => get_variant!(v, UInt8),
            SeriesData::UInt16(v) => get_variant!(v, UInt16),
            SeriesData::UInt32(v) => get_variant!(v, UInt32),
            SeriesData::UInt64(v) => get_variant!(v, UInt64),
            SeriesData::Float32(v) => get_variant!(v, Float32),
            SeriesData::Float64(v) => get_variant!(v, Float64),
            SeriesData::Utf8(v) => get_variant!(v, Utf8),
            SeriesData::Binary(v) => get_variant!(v, Binary),
            SeriesData::Null(_) => ScalarValue::Null,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = ScalarValue> + '_ {
        (0..self.len()).map(|i| self.get(i))
    }

    /// String rendering of row `i`, used to build compound group and
    /// partition keys.
    pub fn str_key(&self, i: usize) -> String {
        self.get(i).to_string()
    }

    /// New series with the rows at `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> Series {
        let data = rebuild!(
            &self.data,
            v => indices.iter().map(|&i| v[i].clone()).collect(),
            _n => indices.len()
        );
        Series {
            name: self.name.clone(),
            data,
        }
    }

    /// Like [`Series::take`] but `None` positions produce null rows;
    /// used by outer joins.
    pub fn take_opt(&self, indices: &[Option<usize>]) -> Series {
        let data = rebuild!(
            &self.data,
            v => indices.iter().map(|i| i.and_then(|i| v[i].clone())).collect(),
            _n => indices.len()
        );
        Series {
            name: self.name.clone(),
            data,
        }
    }

    /// Element-wise conversion to another type.
    pub fn cast(&self, to: DataType) -> Result<Series> {
        let values: Vec<ScalarValue> = self.iter().collect();
        Series::from_scalars_typed(self.name.clone(), to, &values)
    }

    /// Count of null rows.
    pub fn null_count(&self) -> usize {
        dispatch!(&self.data, v => v.iter().filter(|o| o.is_none()).count(), n => *n)
    }

    /// Reduce the column to a single value.
    pub fn aggregate(&self, func: AggregateFunction) -> Result<ScalarValue> {
        crate::aggregate::aggregate_series(self, func)
    }
}
