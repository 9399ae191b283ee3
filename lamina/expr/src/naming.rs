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

//! Deterministic, purely syntactic output names for expressions.

use crate::arena::{Arena, NodeId, NodeKind, NodePayload};
use lamina_common::error::Result;

/// The column name the expression at `id` produces.
///
/// Aggregates append `_<op>` to their input's name (`v_sum`); windows
/// bound to a column append `_<func>` (`v_sum` for a sum window,
/// `row_number` when unbound). Casts and unary wrappers are
/// transparent, so a coerced expression keeps the name of the original.
pub fn output_name(arena: &Arena, id: NodeId) -> Result<String> {
    let node = arena.get(id)?;
    let name = match &node.payload {
        NodePayload::Column { name } => arena.string(*name)?.to_string(),
        NodePayload::Alias { name } => arena.string(*name)?.to_string(),
        NodePayload::Agg { op } => {
            format!("{}_{}", output_name(arena, node.children[0])?, op)
        }
        NodePayload::Window { func, .. } => match node.children.first() {
            Some(&child) => {
                if arena.get(child)?.kind() == NodeKind::Column {
                    format!("{}_{}", output_name(arena, child)?, func.name())
                } else {
                    func.name().to_string()
                }
            }
            None => func.name().to_string(),
        },
        NodePayload::Literal { .. } => "literal".to_string(),
        NodePayload::Function { name } => arena.string(*name)?.to_string(),
        NodePayload::Binary { .. } => output_name(arena, node.children[0])?,
        NodePayload::Cast { .. } | NodePayload::Unary { .. } => {
            output_name(arena, node.children[0])?
        }
        _ => "expr".to_string(),
    };
    Ok(name)
}
