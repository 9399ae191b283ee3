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

//! The fluent expression surface.
//!
//! Factories such as [col] and [lit] allocate a node in a fresh,
//! detached arena; combinators allocate in the left operand's arena and
//! splice a detached right operand in. A lazy frame adopts an arena on
//! creation, and inserting an expression that belongs to a *different*
//! frame's arena is rejected with `ArenaMismatch`.

use crate::arena::{Arena, NodeId, NodeKind, NodePayload, COL_TYPE_FUNCTION};
use crate::window::{WindowKind, WindowSpec};
use lamina_common::error::{LaminaError, Result};
use lamina_common::operator::{AggregateFunction, Operator, UnaryOperator};
use lamina_common::scalar::ScalarValue;
use lamina_common::types::DataType;
use parking_lot::Mutex;
use std::ops::{Add, Div, Mul, Sub};
use std::sync::Arc;

/// Shared handle to an [Arena].
pub type ArenaRef = Arc<Mutex<Arena>>;

/// Create a fresh, detached arena handle.
pub fn new_arena() -> ArenaRef {
    Arc::new(Mutex::new(Arena::new()))
}

/// A handle to an expression node inside an arena.
#[derive(Debug, Clone)]
pub struct Expr {
    arena: ArenaRef,
    id: NodeId,
}

/// Create a column reference. The name `*` expands to every input
/// column during optimization.
pub fn col(name: &str) -> Expr {
    let arena = new_arena();
    let id = arena.lock().add_column(name);
    Expr { arena, id }
}

/// Create a literal expression.
pub fn lit(value: impl Into<ScalarValue>) -> Expr {
    let arena = new_arena();
    let id = arena.lock().add_literal(value.into());
    Expr { arena, id }
}

/// Create a data-type column selector, expanding to every input column
/// of the given type during optimization.
pub fn col_type(data_type: DataType) -> Expr {
    let arena = new_arena();
    let id = {
        let mut guard = arena.lock();
        let marker = guard.add_literal(ScalarValue::Type(data_type));
        guard.add_function(COL_TYPE_FUNCTION, vec![marker])
    };
    Expr { arena, id }
}

macro_rules! comparison_method {
    ($fn_name:ident, $op:ident) => {
        pub fn $fn_name(self, rhs: Expr) -> Expr {
            self.binary(Operator::$op, rhs)
        }
    };
}

macro_rules! agg_method {
    ($fn_name:ident, $func:ident) => {
        pub fn $fn_name(self) -> Expr {
            self.apply(|arena, id| arena.add_agg(AggregateFunction::$func, id))
        }
    };
}

macro_rules! unary_method {
    ($fn_name:ident, $op:ident) => {
        pub fn $fn_name(self) -> Expr {
            self.apply(|arena, id| arena.add_unary(UnaryOperator::$op, id))
        }
    };
}

impl Expr {
    /// Wrap an existing node. The id must belong to the given arena.
    pub fn from_parts(arena: ArenaRef, id: NodeId) -> Expr {
        Expr { arena, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn arena(&self) -> &ArenaRef {
        &self.arena
    }

    /// Run a closure against the owning arena.
    pub fn with_arena<T>(&self, f: impl FnOnce(&Arena) -> Result<T>) -> Result<T> {
        f(&self.arena.lock())
    }

    comparison_method!(eq, Eq);
    comparison_method!(neq, NotEq);
    comparison_method!(lt, Lt);
    comparison_method!(lt_eq, LtEq);
    comparison_method!(gt, Gt);
    comparison_method!(gt_eq, GtEq);
    comparison_method!(and, And);
    comparison_method!(or, Or);

    agg_method!(sum, Sum);
    agg_method!(mean, Mean);
    agg_method!(min, Min);
    agg_method!(max, Max);
    agg_method!(count, Count);
    agg_method!(std, Std);
    agg_method!(var, Var);
    agg_method!(first, First);
    agg_method!(last, Last);
    agg_method!(median, Median);

    unary_method!(not, Not);
    unary_method!(neg, Negative);
    unary_method!(is_null, IsNull);
    unary_method!(is_not_null, IsNotNull);

    pub fn alias(self, name: &str) -> Expr {
        self.apply(|arena, id| arena.add_alias(id, name))
    }

    /// Cast to the given type, recorded under its canonical name.
    pub fn cast(self, to: DataType) -> Expr {
        self.apply(|arena, id| arena.add_cast(id, to.canonical_name()))
    }

    /// Convert an aggregate expression into a window over `spec`.
    ///
    /// The aggregate's input must be a plain column reference, e.g.
    /// `col("v").sum().over(spec)`; anything else is
    /// [`LaminaError::BadWindowInput`].
    pub fn over(self, spec: WindowSpec) -> Result<Expr> {
        let (func, column) = {
            let arena = self.arena.lock();
            let node = arena.get(self.id)?;
            let op = match &node.payload {
                NodePayload::Agg { op } => *op,
                _ => {
                    return Err(LaminaError::BadWindowInput(format!("{:?}", node.kind())));
                }
            };
            let column = node.children[0];
            if arena.get(column)?.kind() != NodeKind::Column {
                return Err(LaminaError::BadWindowInput(format!(
                    "{:?}",
                    arena.get(column)?.kind()
                )));
            }
            (op, column)
        };
        let id = self
            .arena
            .lock()
            .add_window(WindowKind::Aggregate(func), spec, Some(column));
        Ok(Expr {
            arena: self.arena,
            id,
        })
    }

    /// Resolve this expression against the arena owned by a lazy frame.
    ///
    /// An expression already in `target` is used as-is; a detached one
    /// is spliced in; one belonging to another frame's arena is the
    /// programmer error [`LaminaError::ArenaMismatch`].
    pub fn bind_to(&self, target: &ArenaRef) -> Result<NodeId> {
        if Arc::ptr_eq(&self.arena, target) {
            return Ok(self.id);
        }
        let source = self.arena.lock();
        if source.is_adopted() {
            return Err(LaminaError::ArenaMismatch);
        }
        Ok(target.lock().splice_from(&source, self.id))
    }

    pub(crate) fn new_window(func: WindowKind, spec: WindowSpec, input: Option<Expr>) -> Expr {
        match input {
            None => {
                let arena = new_arena();
                let id = arena.lock().add_window(func, spec, None);
                Expr { arena, id }
            }
            Some(input) => input.map_window(func, spec),
        }
    }

    pub(crate) fn map_window(self, func: WindowKind, spec: WindowSpec) -> Expr {
        self.apply(|arena, id| arena.add_window(func, spec, Some(id)))
    }

    fn binary(self, op: Operator, rhs: Expr) -> Expr {
        let (arena, left, right) = unify(self, rhs);
        let id = arena.lock().add_binary(left, op, right);
        Expr { arena, id }
    }

    fn apply(self, f: impl FnOnce(&mut Arena, NodeId) -> NodeId) -> Expr {
        let id = f(&mut self.arena.lock(), self.id);
        Expr {
            arena: self.arena,
            id,
        }
    }
}

/// Bring both operands into one arena, splicing the right one over when
/// the handles are detached from each other.
fn unify(lhs: Expr, rhs: Expr) -> (ArenaRef, NodeId, NodeId) {
    if Arc::ptr_eq(&lhs.arena, &rhs.arena) {
        (lhs.arena, lhs.id, rhs.id)
    } else {
        let right = {
            let mut target = lhs.arena.lock();
            let source = rhs.arena.lock();
            target.splice_from(&source, rhs.id)
        };
        (lhs.arena, lhs.id, right)
    }
}

macro_rules! impl_expr_op {
    ($trait:ident, $fn_name:ident, $op:ident) => {
        impl $trait for Expr {
            type Output = Expr;

            fn $fn_name(self, rhs: Expr) -> Expr {
                self.binary(Operator::$op, rhs)
            }
        }
    };
}

impl_expr_op!(Add, add, Plus);
impl_expr_op!(Sub, sub, Minus);
impl_expr_op!(Mul, mul, Multiply);
impl_expr_op!(Div, div, Divide);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combinators_share_one_arena() {
        let e = (col("a") + lit(1)).gt(lit(2));
        e.with_arena(|arena| {
            let node = arena.get(e.id())?;
            assert_eq!(node.kind(), NodeKind::Binary);
            // col, lit, add, lit, gt
            assert_eq!(arena.len(), 5);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn over_requires_aggregate_of_column() {
        let spec = WindowSpec::partition_by(["k"]);
        assert!(col("v").sum().over(spec.clone()).is_ok());

        let err = (col("v") + lit(1)).sum().over(spec.clone()).unwrap_err();
        assert!(matches!(err, LaminaError::BadWindowInput(_)));

        let err = col("v").over(spec).unwrap_err();
        assert!(matches!(err, LaminaError::BadWindowInput(_)));
    }

    #[test]
    fn bind_rejects_foreign_adopted_arena() {
        let owned = col("a");
        owned.arena().lock().mark_adopted();

        let target = new_arena();
        let err = owned.bind_to(&target).unwrap_err();
        assert!(matches!(err, LaminaError::ArenaMismatch));

        // a detached expression splices in cleanly
        let detached = col("b");
        let id = detached.bind_to(&target).unwrap();
        assert_eq!(target.lock().get(id).unwrap().kind(), NodeKind::Column);
    }
}
