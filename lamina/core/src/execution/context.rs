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

//! Cooperative cancellation for query execution.
//!
//! Execution is single-threaded; every operator re-checks the token at
//! its boundary before producing output, so a signalled token stops the
//! query at the next operator edge. Timeouts are layered on top by
//! whoever owns the token.

use lamina_common::error::{LaminaError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared flag that cancels an in-flight query.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    /// Signal cancellation. Safe to call from another thread.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with [`LaminaError::Cancelled`] when signalled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(LaminaError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Per-query execution state handed to every operator.
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    token: CancellationToken,
}

impl TaskContext {
    pub fn new() -> TaskContext {
        TaskContext::default()
    }

    pub fn with_token(token: CancellationToken) -> TaskContext {
        TaskContext { token }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_trips_once_cancelled() {
        let token = CancellationToken::new();
        assert!(token.check().is_ok());

        let shared = token.clone();
        shared.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check().unwrap_err(), LaminaError::Cancelled));
    }
}
