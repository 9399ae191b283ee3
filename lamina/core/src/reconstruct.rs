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

//! Translation of arena expressions into the table's own expression
//! handle, used wherever an operator hands work to the frame layer.
//!
//! The mapping is 1:1 for columns, literals, binary and unary
//! operators, aliases, casts and aggregates. Window nodes are executed
//! by the engine itself and everything else has no frame counterpart;
//! both are rejected here.

use lamina_common::error::{LaminaError, Result};
use lamina_common::types::DataType;
use lamina_expr::arena::{Arena, NodeId, NodePayload};
use lamina_frame::FrameExpr;

/// Rebuild the arena expression at `id` as a [FrameExpr].
pub fn reconstruct(arena: &Arena, id: NodeId) -> Result<FrameExpr> {
    let node = arena.get(id)?;
    let out = match &node.payload {
        NodePayload::Column { name } => FrameExpr::Column(arena.string(*name)?.to_string()),
        NodePayload::Literal { value } => FrameExpr::Literal(value.clone()),
        NodePayload::Binary { op } => FrameExpr::BinaryExpr {
            left: Box::new(reconstruct(arena, node.children[0])?),
            op: *op,
            right: Box::new(reconstruct(arena, node.children[1])?),
        },
        NodePayload::Unary { op } => FrameExpr::Unary {
            op: *op,
            expr: Box::new(reconstruct(arena, node.children[0])?),
        },
        NodePayload::Agg { op } => FrameExpr::Aggregate {
            func: *op,
            expr: Box::new(reconstruct(arena, node.children[0])?),
        },
        NodePayload::Alias { name } => FrameExpr::Alias {
            expr: Box::new(reconstruct(arena, node.children[0])?),
            name: arena.string(*name)?.to_string(),
        },
        NodePayload::Cast { type_name } => {
            let name = arena.string(*type_name)?;
            let to = DataType::parse_canonical(name)?;
            FrameExpr::Cast {
                expr: Box::new(reconstruct(arena, node.children[0])?),
                to,
            }
        }
        other => {
            return Err(LaminaError::UnsupportedExpression(format!(
                "{:?} has no table counterpart",
                other.kind()
            )))
        }
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamina_common::operator::{AggregateFunction, Operator};
    use lamina_common::scalar::ScalarValue;
    use lamina_expr::window::{WindowKind, WindowSpec};

    #[test]
    fn round_trips_the_shared_kinds() {
        let mut arena = Arena::new();
        let a = arena.add_column("a");
        let one = arena.add_literal(ScalarValue::Int64(1));
        let add = arena.add_binary(a, Operator::Plus, one);
        let cast = arena.add_cast(add, "f64");
        let aliased = arena.add_alias(cast, "x");

        let out = reconstruct(&arena, aliased).unwrap();
        assert_eq!(out.to_string(), "cast((col(a) + lit(1)) AS f64) AS x");
    }

    #[test]
    fn aggregates_translate() {
        let mut arena = Arena::new();
        let v = arena.add_column("v");
        let sum = arena.add_agg(AggregateFunction::Sum, v);
        let out = reconstruct(&arena, sum).unwrap();
        assert_eq!(out.output_name(), "v_sum");
    }

    #[test]
    fn unknown_cast_types_error() {
        let mut arena = Arena::new();
        let a = arena.add_column("a");
        let cast = arena.add_cast(a, "decimal");
        let err = reconstruct(&arena, cast).unwrap_err();
        assert!(matches!(err, LaminaError::UnknownCastType(_)));
    }

    #[test]
    fn windows_are_rejected() {
        let mut arena = Arena::new();
        let v = arena.add_column("v");
        let window = arena.add_window(
            WindowKind::Aggregate(AggregateFunction::Sum),
            WindowSpec::partition_by(["k"]),
            Some(v),
        );
        let err = reconstruct(&arena, window).unwrap_err();
        assert!(matches!(err, LaminaError::UnsupportedExpression(_)));
    }
}
