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

//! Error type for the Lamina query engine.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for operations that could result in a [LaminaError]
pub type Result<T, E = LaminaError> = std::result::Result<T, E>;

/// Error type returned by the planning, optimization and execution layers.
///
/// Arena accessors panic only on definitional violations (see
/// `Arena::must_get`); everything else is reported through this enum.
#[derive(Debug)]
pub enum LaminaError {
    /// Error during planning, such as combining incompatible expressions
    Plan(String),
    /// Error during physical execution
    Execution(String),
    /// Internal error: unexpected engine state. This is always a bug.
    Internal(String),
    /// Expressions from two different arenas were combined
    ArenaMismatch,
    /// A node id did not resolve inside its arena
    InvalidNode(String),
    /// A plan node was rebuilt with the wrong number of children
    InvalidChildren(String),
    /// A plan node that carries expressions has no arena attached
    MissingArena(String),
    /// A plan node is missing a required input
    MissingInput(String),
    /// A scan node has no data source
    MissingSource(String),
    /// A column name did not resolve against a schema
    UnknownColumn(String),
    /// A cast named a type outside the canonical type set
    UnknownCastType(String),
    /// The scan source does not support materialization
    NotExecutable(String),
    /// Physical translation met an expression kind it cannot express
    UnsupportedExpression(String),
    /// An aggregate was converted to a window over a non-column input
    BadWindowInput(String),
    /// Two output expressions resolve to the same column name
    DuplicateProjection(String),
    /// A window partition produced a type the scatterer cannot assemble
    UnsupportedWindowResult(String),
    /// The cancellation token was signalled
    Cancelled,
}

impl Display for LaminaError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            LaminaError::Plan(desc) => write!(f, "Error during planning: {desc}"),
            LaminaError::Execution(desc) => write!(f, "Execution error: {desc}"),
            LaminaError::Internal(desc) => write!(
                f,
                "Internal error: {desc}. This was likely caused by a bug in \
                 Lamina's code and we would welcome that you file a bug report"
            ),
            LaminaError::ArenaMismatch => {
                write!(f, "Cannot combine expressions from different arenas")
            }
            LaminaError::InvalidNode(desc) => write!(f, "Invalid expression node: {desc}"),
            LaminaError::InvalidChildren(desc) => {
                write!(f, "Invalid plan children: {desc}")
            }
            LaminaError::MissingArena(desc) => write!(f, "Missing arena: {desc}"),
            LaminaError::MissingInput(desc) => write!(f, "Missing input: {desc}"),
            LaminaError::MissingSource(desc) => write!(f, "Missing source: {desc}"),
            LaminaError::UnknownColumn(name) => {
                write!(f, "Unknown column: '{name}'")
            }
            LaminaError::UnknownCastType(name) => {
                write!(f, "Unknown cast type: '{name}'")
            }
            LaminaError::NotExecutable(name) => write!(
                f,
                "Source '{name}' does not support materializing a data frame"
            ),
            LaminaError::UnsupportedExpression(desc) => {
                write!(f, "Unsupported expression: {desc}")
            }
            LaminaError::BadWindowInput(desc) => {
                write!(f, "Window functions require a column input, got {desc}")
            }
            LaminaError::DuplicateProjection(name) => {
                write!(f, "Duplicate projection output name: '{name}'")
            }
            LaminaError::UnsupportedWindowResult(desc) => {
                write!(f, "Unsupported window result type: {desc}")
            }
            LaminaError::Cancelled => write!(f, "Query cancelled"),
        }
    }
}

impl Error for LaminaError {}

/// Macro that wraps a message into [`LaminaError::Plan`] and returns it as `Err`
#[macro_export]
macro_rules! plan_err {
    ($($args:expr),*) => {
        Err($crate::error::LaminaError::Plan(format!($($args),*)))
    };
}

/// Macro that wraps a message into [`LaminaError::Execution`] and returns it as `Err`
#[macro_export]
macro_rules! exec_err {
    ($($args:expr),*) => {
        Err($crate::error::LaminaError::Execution(format!($($args),*)))
    };
}

/// Macro that wraps a message into [`LaminaError::Internal`] and returns it as `Err`
#[macro_export]
macro_rules! internal_err {
    ($($args:expr),*) => {
        Err($crate::error::LaminaError::Internal(format!($($args),*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = LaminaError::UnknownColumn("z".to_string());
        assert_eq!(err.to_string(), "Unknown column: 'z'");

        let err = LaminaError::Cancelled;
        assert_eq!(err.to_string(), "Query cancelled");
    }

    #[test]
    fn error_macros() {
        fn fail() -> Result<()> {
            plan_err!("cannot resolve {}", "x")
        }
        let err = fail().unwrap_err();
        assert!(matches!(err, LaminaError::Plan(_)));
        assert_eq!(err.to_string(), "Error during planning: cannot resolve x");
    }
}
