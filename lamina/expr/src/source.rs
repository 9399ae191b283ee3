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

//! The capability a scan plans against: a named, schema-bearing source.
//!
//! Materialization lives one layer up (the engine's executable source);
//! `as_any` is the downcast seam that recovers it at compile time.

use lamina_common::error::Result;
use lamina_common::schema::SchemaRef;
use std::any::Any;
use std::fmt::Debug;

/// A named relation whose schema can be inspected during planning.
/// `schema` must be safe to call concurrently.
pub trait DataSource: Debug + Send + Sync {
    fn name(&self) -> String;

    fn schema(&self) -> Result<SchemaRef>;

    /// Downcast seam for recovering the concrete source at physical
    /// planning time.
    fn as_any(&self) -> &dyn Any;
}
