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

//! Expression arena, fluent expression surface and logical plan of the
//! Lamina query engine.

pub mod arena;
pub mod display;
pub mod dsl;
pub mod logical_plan;
pub mod naming;
pub mod source;
pub mod typing;
pub mod window;

pub use arena::{Arena, Node, NodeId, NodeKind, NodePayload, StringId, COL_TYPE_FUNCTION, WILDCARD};
pub use display::{fmt_expr, fmt_plan};
pub use dsl::{col, col_type, lit, new_arena, ArenaRef, Expr};
pub use logical_plan::{Aggregate, Filter, Join, LogicalPlan, Projection, Scan};
pub use naming::output_name;
pub use source::DataSource;
pub use typing::type_of;
pub use window::{
    WindowExprBuilder, WindowFunction, WindowKind, WindowPartition, WindowSpec,
};
