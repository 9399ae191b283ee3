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

//! An ordered collection of equally sized [Series].

use crate::eval::{evaluate, filter_indices};
use crate::expr::FrameExpr;
use crate::groupby::GroupBy;
use crate::series::Series;
use itertools::Itertools;
use lamina_common::error::{LaminaError, Result};
use lamina_common::plan_err;
use lamina_common::schema::{Field, Schema};

/// An in-memory table of named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataFrame {
    columns: Vec<Series>,
}

impl DataFrame {
    /// Create a frame from columns. All columns must have the same
    /// height and distinct names.
    pub fn new(columns: Vec<Series>) -> Result<DataFrame> {
        if let Some(first) = columns.first() {
            let height = first.len();
            if let Some(odd) = columns.iter().find(|s| s.len() != height) {
                return plan_err!(
                    "column '{}' has height {}, expected {}",
                    odd.name(),
                    odd.len(),
                    height
                );
            }
        }
        if !columns.iter().map(Series::name).all_unique() {
            return plan_err!("duplicate column names in data frame");
        }
        Ok(DataFrame { columns })
    }

    pub fn empty() -> DataFrame {
        DataFrame { columns: vec![] }
    }

    pub fn schema(&self) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .map(|s| Field::new(s.name(), s.data_type(), true))
                .collect(),
        )
    }

    pub fn height(&self) -> usize {
        self.columns.first().map(Series::len).unwrap_or(0)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Series] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Series::name).collect()
    }

    pub fn column(&self, name: &str) -> Result<&Series> {
        self.columns
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| LaminaError::UnknownColumn(name.to_string()))
    }

    /// Keep the rows where the boolean predicate evaluates to true.
    pub fn filter(&self, predicate: &FrameExpr) -> Result<DataFrame> {
        let mask = evaluate(self, predicate)?;
        let indices = filter_indices(&mask)?;
        Ok(self.take(&indices))
    }

    /// Keep the named columns, in the requested order.
    pub fn select(&self, names: &[impl AsRef<str>]) -> Result<DataFrame> {
        let columns = names
            .iter()
            .map(|name| self.column(name.as_ref()).cloned())
            .collect::<Result<Vec<_>>>()?;
        DataFrame::new(columns)
    }

    /// New frame with the rows at `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> DataFrame {
        DataFrame {
            columns: self.columns.iter().map(|s| s.take(indices)).collect(),
        }
    }

    /// Evaluate `expr` and attach the result under `name`, replacing an
    /// existing column of that name.
    pub fn with_column(&self, name: &str, expr: &FrameExpr) -> Result<DataFrame> {
        let series = evaluate(self, expr)?.with_name(name);
        Ok(self.with_series(series))
    }

    pub fn with_columns(&self, exprs: &[(String, FrameExpr)]) -> Result<DataFrame> {
        let mut out = self.clone();
        for (name, expr) in exprs {
            out = out.with_column(name, expr)?;
        }
        Ok(out)
    }

    /// Attach a pre-built column, replacing any column of the same name.
    pub fn with_series(&self, series: Series) -> DataFrame {
        let mut columns = self.columns.clone();
        match columns.iter().position(|s| s.name() == series.name()) {
            Some(i) => columns[i] = series,
            None => columns.push(series),
        }
        DataFrame { columns }
    }

    /// Group rows by the given key columns.
    pub fn group_by(&self, keys: &[impl AsRef<str>]) -> Result<GroupBy> {
        GroupBy::new(self, keys)
    }
}
