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

//! Lamina: a lazy query engine for in-memory columnar analytics.
//!
//! Queries are built fluently on a [LazyFrame], accumulate as a logical
//! plan over an expression arena, run through a rule based optimizer,
//! compile to physical operators and execute against pluggable data
//! sources.
//!
//! ```
//! use lamina::prelude::*;
//! use lamina_frame::{DataFrame, Series};
//!
//! # fn main() -> lamina_common::error::Result<()> {
//! let frame = DataFrame::new(vec![
//!     Series::new_i64("a", vec![1, 2, 3]),
//!     Series::new_utf8("b", vec!["x", "y", "z"]),
//! ])?;
//!
//! let out = LazyFrame::from_frame(frame)
//!     .filter(col("a").gt(lit(1)))?
//!     .select([col("b")])?
//!     .collect()?;
//!
//! assert_eq!(out.height(), 2);
//! # Ok(())
//! # }
//! ```

pub mod datasource;
pub mod execution;
pub mod frame;
pub mod physical_plan;
pub mod reconstruct;
pub mod window_functions;

/// The most commonly used names, for glob import.
pub mod prelude {
    pub use crate::datasource::{ExecutableSource, MemSource};
    pub use crate::execution::{CancellationToken, TaskContext};
    pub use crate::frame::{LazyFrame, LazyGroupBy};
    pub use crate::window_functions::{
        dense_rank, first_value, lag, last_value, lead, ntile, percent_rank, rank, row_number,
    };
    pub use lamina_common::error::{LaminaError, Result};
    pub use lamina_common::operator::JoinType;
    pub use lamina_common::scalar::ScalarValue;
    pub use lamina_common::types::DataType;
    pub use lamina_expr::dsl::{col, col_type, lit, Expr};
    pub use lamina_expr::window::WindowSpec;
    pub use lamina_optimizer::OptimizerOptions;
}

pub use frame::{LazyFrame, LazyGroupBy};
