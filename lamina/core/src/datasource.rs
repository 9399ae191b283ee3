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

//! Executable data sources.
//!
//! Logical planning only needs [DataSource] (a name and a schema).
//! Execution additionally needs materialization, modeled by
//! [ExecutableSource]. A scan created through the lazy frame wraps its
//! executable source in [DefaultSource]; the physical planner recovers
//! it with [source_as_executable], and a source that was never
//! executable fails there with `NotExecutable`.

use lamina_common::error::{LaminaError, Result};
use lamina_common::schema::SchemaRef;
use lamina_expr::source::DataSource;
use lamina_frame::DataFrame;
use std::any::Any;
use std::sync::Arc;

/// A [DataSource] that can also materialize its rows.
pub trait ExecutableSource: DataSource {
    fn data_frame(&self) -> Result<DataFrame>;
}

/// Adapter presenting an [ExecutableSource] as the [DataSource] the
/// logical plan stores.
#[derive(Debug)]
pub struct DefaultSource {
    source: Arc<dyn ExecutableSource>,
}

impl DefaultSource {
    pub fn new(source: Arc<dyn ExecutableSource>) -> DefaultSource {
        DefaultSource { source }
    }
}

impl DataSource for DefaultSource {
    fn name(&self) -> String {
        self.source.name()
    }

    fn schema(&self) -> Result<SchemaRef> {
        self.source.schema()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Recover the executable source behind a logical [DataSource].
pub fn source_as_executable(
    source: &Arc<dyn DataSource>,
) -> Result<Arc<dyn ExecutableSource>> {
    source
        .as_any()
        .downcast_ref::<DefaultSource>()
        .map(|wrapper| wrapper.source.clone())
        .ok_or_else(|| LaminaError::NotExecutable(source.name()))
}

/// An in-memory source over an existing [DataFrame].
#[derive(Debug)]
pub struct MemSource {
    name: String,
    frame: DataFrame,
    schema: SchemaRef,
}

impl MemSource {
    pub fn new(name: impl Into<String>, frame: DataFrame) -> MemSource {
        let schema = Arc::new(frame.schema());
        MemSource {
            name: name.into(),
            frame,
            schema,
        }
    }
}

impl DataSource for MemSource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn schema(&self) -> Result<SchemaRef> {
        Ok(self.schema.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ExecutableSource for MemSource {
    fn data_frame(&self) -> Result<DataFrame> {
        Ok(self.frame.clone())
    }
}
