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

//! Ordered, named field lists describing the shape of a table.

use crate::error::{LaminaError, Result};
use crate::types::DataType;
use itertools::Itertools;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Suffix appended to right-hand field names that collide in a join.
pub const JOIN_RIGHT_SUFFIX: &str = "_right";

/// A named, typed column slot in a [Schema].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    data_type: DataType,
    nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn with_name(&self, name: impl Into<String>) -> Field {
        Field {
            name: name.into(),
            ..self.clone()
        }
    }
}

/// An ordered list of [Field]s. Names are unique within one schema;
/// lookup is by exact match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

/// A reference-counted [Schema]
pub type SchemaRef = Arc<Schema>;

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        debug_assert!(
            fields.iter().map(Field::name).all_unique(),
            "schema field names must be unique"
        );
        Self { fields }
    }

    pub fn empty() -> Self {
        Self { fields: vec![] }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, i: usize) -> &Field {
        &self.fields[i]
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(Field::name).collect()
    }

    /// Position of the field with the given name.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f.name() == name)
            .ok_or_else(|| LaminaError::UnknownColumn(name.to_string()))
    }

    pub fn field_with_name(&self, name: &str) -> Result<&Field> {
        self.index_of(name).map(|i| &self.fields[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name() == name)
    }

    /// Merge the schemas of the two sides of a join.
    ///
    /// Left fields keep their position and name; right fields follow in
    /// order, with names already present on the left suffixed with
    /// [`JOIN_RIGHT_SUFFIX`].
    pub fn merge_join(left: &Schema, right: &Schema) -> Schema {
        let mut fields = left.fields.clone();
        for field in &right.fields {
            if left.contains(field.name()) {
                fields.push(field.with_name(format!("{}{}", field.name(), JOIN_RIGHT_SUFFIX)));
            } else {
                fields.push(field.clone());
            }
        }
        Schema::new(fields)
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}]",
            self.fields
                .iter()
                .map(|field| format!("{}:{}", field.name(), field.data_type()))
                .join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(names: &[(&str, DataType)]) -> Schema {
        Schema::new(
            names
                .iter()
                .map(|(n, dt)| Field::new(*n, *dt, true))
                .collect(),
        )
    }

    #[test]
    fn lookup_is_exact_match() {
        let s = schema(&[("a", DataType::Int64), ("b", DataType::Utf8)]);
        assert_eq!(s.index_of("b").unwrap(), 1);
        assert!(matches!(
            s.index_of("B").unwrap_err(),
            LaminaError::UnknownColumn(_)
        ));
    }

    #[test]
    fn join_merge_suffixes_collisions_in_order() {
        let left = schema(&[("id", DataType::Int64), ("v", DataType::Float64)]);
        let right = schema(&[("id", DataType::Int64), ("w", DataType::Utf8)]);
        let merged = Schema::merge_join(&left, &right);
        assert_eq!(merged.field_names(), vec!["id", "v", "id_right", "w"]);
        assert_eq!(merged.field(2).data_type(), DataType::Int64);
    }

    #[test]
    fn display_lists_fields() {
        let s = schema(&[("a", DataType::Int64), ("b", DataType::Utf8)]);
        assert_eq!(s.to_string(), "[a:i64, b:str]");
    }
}
