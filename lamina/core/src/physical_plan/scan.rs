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

//! Leaf operator materializing a data source.

use crate::datasource::ExecutableSource;
use crate::execution::TaskContext;
use crate::physical_plan::ExecutionPlan;
use lamina_common::error::Result;
use lamina_frame::DataFrame;
use log::trace;
use std::any::Any;
use std::sync::Arc;

/// Produces the source's table.
#[derive(Debug)]
pub struct ScanExec {
    source: Arc<dyn ExecutableSource>,
}

impl ScanExec {
    pub fn new(source: Arc<dyn ExecutableSource>) -> ScanExec {
        ScanExec { source }
    }

    pub fn source_name(&self) -> String {
        self.source.name()
    }
}

impl ExecutionPlan for ScanExec {
    fn name(&self) -> &str {
        "ScanExec"
    }

    fn children(&self) -> Vec<&Arc<dyn ExecutionPlan>> {
        vec![]
    }

    fn execute(&self, ctx: &TaskContext) -> Result<DataFrame> {
        ctx.token().check()?;
        let frame = self.source.data_frame()?;
        trace!(
            "scanned '{}': {} rows x {} columns",
            self.source.name(),
            frame.height(),
            frame.width()
        );
        Ok(frame)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
