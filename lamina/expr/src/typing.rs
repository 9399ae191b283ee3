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

//! Pure type inference over arena expressions and an input schema.

use crate::arena::{Arena, NodeId, NodePayload};
use lamina_common::error::Result;
use lamina_common::operator::AggregateFunction;
use lamina_common::schema::Schema;
use lamina_common::types::{merge_numeric, DataType};

/// The type the expression at `id` produces against `input_schema`.
///
/// Unknown columns type as [`DataType::Unknown`] rather than failing,
/// so optimizer rules stay total on unresolvable plans.
pub fn type_of(arena: &Arena, id: NodeId, input_schema: &Schema) -> Result<DataType> {
    let node = arena.get(id)?;
    let out = match &node.payload {
        NodePayload::Column { name } => {
            let name = arena.string(*name)?;
            match input_schema.field_with_name(name) {
                Ok(field) => field.data_type(),
                Err(_) => DataType::Unknown,
            }
        }
        NodePayload::Literal { value } => value.data_type(),
        NodePayload::Binary { op } => {
            if op.is_comparison() || op.is_logical() {
                DataType::Boolean
            } else {
                let left = type_of(arena, node.children[0], input_schema)?;
                let right = type_of(arena, node.children[1], input_schema)?;
                merge_numeric(left, right)
            }
        }
        NodePayload::Unary { op } => match op {
            lamina_common::operator::UnaryOperator::Negative => {
                type_of(arena, node.children[0], input_schema)?
            }
            _ => DataType::Boolean,
        },
        NodePayload::Agg { op } => match op {
            AggregateFunction::Count => DataType::Int64,
            AggregateFunction::Mean
            | AggregateFunction::Std
            | AggregateFunction::Var
            | AggregateFunction::Median => DataType::Float64,
            _ => type_of(arena, node.children[0], input_schema)?,
        },
        NodePayload::Cast { type_name } => {
            DataType::parse_canonical(arena.string(*type_name)?)?
        }
        NodePayload::Alias { .. } => type_of(arena, node.children[0], input_schema)?,
        NodePayload::Window { func, .. } => {
            let input = match node.children.first() {
                Some(&child) => type_of(arena, child, input_schema)?,
                None => DataType::Null,
            };
            func.data_type(input)
        }
        NodePayload::Function { .. } => DataType::Unknown,
        NodePayload::Sort { .. } | NodePayload::Filter | NodePayload::Slice { .. } => {
            match node.children.first() {
                Some(&child) => type_of(arena, child, input_schema)?,
                None => DataType::Unknown,
            }
        }
        NodePayload::Ternary => match node.children.get(1) {
            Some(&child) => type_of(arena, child, input_schema)?,
            None => DataType::Unknown,
        },
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use lamina_common::operator::Operator;
    use lamina_common::scalar::ScalarValue;
    use lamina_common::schema::Field;

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("a", DataType::Int64, true),
            Field::new("b", DataType::Float64, true),
            Field::new("s", DataType::Utf8, true),
        ])
    }

    #[test]
    fn columns_and_literals() {
        let mut arena = Arena::new();
        let a = arena.add_column("a");
        let missing = arena.add_column("zzz");
        let one = arena.add_literal(ScalarValue::Float32(1.0));

        assert_eq!(type_of(&arena, a, &schema()).unwrap(), DataType::Int64);
        assert_eq!(type_of(&arena, missing, &schema()).unwrap(), DataType::Unknown);
        assert_eq!(type_of(&arena, one, &schema()).unwrap(), DataType::Float32);
    }

    #[test]
    fn arithmetic_merges_comparison_is_boolean() {
        let mut arena = Arena::new();
        let a = arena.add_column("a");
        let b = arena.add_column("b");
        let add = arena.add_binary(a, Operator::Plus, b);
        let cmp = arena.add_binary(a, Operator::Gt, b);

        assert_eq!(type_of(&arena, add, &schema()).unwrap(), DataType::Float64);
        assert_eq!(type_of(&arena, cmp, &schema()).unwrap(), DataType::Boolean);
    }

    #[test]
    fn aggregates() {
        let mut arena = Arena::new();
        let a = arena.add_column("a");
        let count = arena.add_agg(AggregateFunction::Count, a);
        let mean = arena.add_agg(AggregateFunction::Mean, a);
        let min = arena.add_agg(AggregateFunction::Min, a);

        assert_eq!(type_of(&arena, count, &schema()).unwrap(), DataType::Int64);
        assert_eq!(type_of(&arena, mean, &schema()).unwrap(), DataType::Float64);
        assert_eq!(type_of(&arena, min, &schema()).unwrap(), DataType::Int64);
    }

    #[test]
    fn casts_and_aliases() {
        let mut arena = Arena::new();
        let a = arena.add_column("a");
        let cast = arena.add_cast(a, "f32");
        let alias = arena.add_alias(cast, "renamed");

        assert_eq!(type_of(&arena, cast, &schema()).unwrap(), DataType::Float32);
        assert_eq!(type_of(&arena, alias, &schema()).unwrap(), DataType::Float32);
    }
}
