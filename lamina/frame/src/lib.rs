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

//! The eager, in-memory columnar table the query engine executes
//! against: typed [Series] columns assembled into a [DataFrame], with
//! its own small expression handle ([FrameExpr]) for filters,
//! projections and aggregations.

pub mod aggregate;
pub mod eval;
pub mod expr;
pub mod frame;
pub mod groupby;
pub mod join;
pub mod series;

pub use expr::{col, lit, FrameExpr};
pub use frame::DataFrame;
pub use groupby::GroupBy;
pub use series::Series;
