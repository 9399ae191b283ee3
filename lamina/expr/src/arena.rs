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

//! Append-only storage for expression AST nodes.
//!
//! Every expression lives in an [Arena] as a flat [Node] record and is
//! referenced through a 32-bit [NodeId]. Nodes are never mutated in
//! place: rewriting a subtree allocates fresh nodes bottom-up, and ids
//! handed out earlier stay valid for the arena's lifetime. Strings
//! (column names, function names, cast targets) are interned once and
//! shared through [StringId]s.

use ahash::RandomState;
use lamina_common::error::{LaminaError, Result};
use lamina_common::operator::{AggregateFunction, Operator, UnaryOperator};
use lamina_common::scalar::ScalarValue;
use std::collections::HashMap;

use crate::window::{WindowKind, WindowSpec};

/// The magic column name that expands to every input column.
pub const WILDCARD: &str = "*";

/// The reserved function name of data-type column selectors.
pub const COL_TYPE_FUNCTION: &str = "col_type";

/// Handle to a [Node] inside an [Arena]. The value `-1` is the invalid
/// sentinel; valid ids are stable for the arena's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(i32);

impl NodeId {
    pub const NULL: NodeId = NodeId(-1);

    pub fn new(id: i32) -> NodeId {
        NodeId(id)
    }

    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }

    pub fn value(&self) -> i32 {
        self.0
    }

    fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Handle to an interned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringId(u32);

impl StringId {
    pub fn value(&self) -> u32 {
        self.0
    }

    fn index(&self) -> usize {
        self.0 as usize
    }
}

/// The discriminant of a [Node], used where only the shape matters
/// (sub-expression keys, translation dispatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Column,
    Literal,
    Binary,
    Unary,
    Agg,
    Function,
    Cast,
    Sort,
    Filter,
    Slice,
    Window,
    Ternary,
    Alias,
}

/// Kind-specific data carried by a [Node].
#[derive(Debug, Clone)]
pub enum NodePayload {
    /// A column reference; no children
    Column { name: StringId },
    /// A constant; no children
    Literal { value: ScalarValue },
    /// Two children, left then right
    Binary { op: Operator },
    /// One child
    Unary { op: UnaryOperator },
    /// One child, the expression being aggregated
    Agg { op: AggregateFunction },
    /// N children
    Function { name: StringId },
    /// One child; the target is a canonical type name
    Cast { type_name: StringId },
    /// One child
    Sort { descending: bool },
    /// Two children: input and boolean mask
    Filter,
    /// One child
    Slice { offset: i64, len: u32 },
    /// Zero children (unbound) or one column child
    Window { func: WindowKind, spec: WindowSpec },
    /// Three children: condition, truthy, falsy
    Ternary,
    /// One child
    Alias { name: StringId },
}

impl NodePayload {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodePayload::Column { .. } => NodeKind::Column,
            NodePayload::Literal { .. } => NodeKind::Literal,
            NodePayload::Binary { .. } => NodeKind::Binary,
            NodePayload::Unary { .. } => NodeKind::Unary,
            NodePayload::Agg { .. } => NodeKind::Agg,
            NodePayload::Function { .. } => NodeKind::Function,
            NodePayload::Cast { .. } => NodeKind::Cast,
            NodePayload::Sort { .. } => NodeKind::Sort,
            NodePayload::Filter => NodeKind::Filter,
            NodePayload::Slice { .. } => NodeKind::Slice,
            NodePayload::Window { .. } => NodeKind::Window,
            NodePayload::Ternary => NodeKind::Ternary,
            NodePayload::Alias { .. } => NodeKind::Alias,
        }
    }
}

impl PartialEq for NodePayload {
    fn eq(&self, other: &Self) -> bool {
        use NodePayload::*;
        match (self, other) {
            (Column { name: l }, Column { name: r }) => l == r,
            (Literal { value: l }, Literal { value: r }) => l == r,
            (Binary { op: l }, Binary { op: r }) => l == r,
            (Unary { op: l }, Unary { op: r }) => l == r,
            (Agg { op: l }, Agg { op: r }) => l == r,
            (Function { name: l }, Function { name: r }) => l == r,
            (Cast { type_name: l }, Cast { type_name: r }) => l == r,
            (Sort { descending: l }, Sort { descending: r }) => l == r,
            (Filter, Filter) => true,
            (
                Slice {
                    offset: lo,
                    len: ll,
                },
                Slice {
                    offset: ro,
                    len: rl,
                },
            ) => lo == ro && ll == rl,
            // window capabilities compare by declared name and spec
            (
                Window { func: lf, spec: ls },
                Window { func: rf, spec: rs },
            ) => lf.name() == rf.name() && ls == rs,
            (Ternary, Ternary) => true,
            (Alias { name: l }, Alias { name: r }) => l == r,
            _ => false,
        }
    }
}

/// One expression AST node: kind-specific payload plus an ordered list
/// of children ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub payload: NodePayload,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn new(payload: NodePayload, children: Vec<NodeId>) -> Node {
        Node { payload, children }
    }

    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }
}

/// Append-only node store with string interning.
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<Node>,
    strings: Vec<String>,
    interned: HashMap<String, StringId, RandomState>,
    /// Set once a lazy frame adopts the arena; expressions spliced in
    /// from another adopted arena are a programmer error.
    adopted: bool,
}

impl Arena {
    pub fn new() -> Arena {
        Arena::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn mark_adopted(&mut self) {
        self.adopted = true;
    }

    pub fn is_adopted(&self) -> bool {
        self.adopted
    }

    /// Intern a string, returning the same id for equal inputs.
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(id) = self.interned.get(s) {
            return *id;
        }
        let id = StringId(self.strings.len() as u32);
        self.strings.push(s.to_string());
        self.interned.insert(s.to_string(), id);
        id
    }

    /// Resolve an interned string.
    pub fn string(&self, id: StringId) -> Result<&str> {
        self.strings
            .get(id.index())
            .map(String::as_str)
            .ok_or_else(|| LaminaError::InvalidNode(format!("string id {} out of range", id.value())))
    }

    /// Append a node, returning its fresh id. Ids are never re-used.
    pub fn add(&mut self, node: Node) -> NodeId {
        debug_assert!(self.nodes.len() < i32::MAX as usize);
        let id = NodeId(self.nodes.len() as i32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Result<&Node> {
        if !id.is_valid() {
            return Err(LaminaError::InvalidNode(
                "the invalid node id sentinel was dereferenced".to_string(),
            ));
        }
        self.nodes.get(id.index()).ok_or_else(|| {
            LaminaError::InvalidNode(format!("node id {} out of range", id.value()))
        })
    }

    /// Like [`Arena::get`] but panics on an id that does not resolve.
    /// Only call with ids obtained from this arena.
    pub fn must_get(&self, id: NodeId) -> &Node {
        match self.get(id) {
            Ok(node) => node,
            Err(e) => panic!("{e}"),
        }
    }

    /// A node equal to `get(id)` but with the given children. Returns
    /// the original id when the children are unchanged, otherwise
    /// appends a fresh node.
    pub fn with_children(&mut self, id: NodeId, children: Vec<NodeId>) -> Result<NodeId> {
        let node = self.get(id)?;
        if node.children == children {
            return Ok(id);
        }
        let payload = node.payload.clone();
        Ok(self.add(Node::new(payload, children)))
    }

    pub fn add_column(&mut self, name: &str) -> NodeId {
        let name = self.intern(name);
        self.add(Node::new(NodePayload::Column { name }, vec![]))
    }

    pub fn add_literal(&mut self, value: ScalarValue) -> NodeId {
        self.add(Node::new(NodePayload::Literal { value }, vec![]))
    }

    pub fn add_binary(&mut self, left: NodeId, op: Operator, right: NodeId) -> NodeId {
        self.add(Node::new(NodePayload::Binary { op }, vec![left, right]))
    }

    pub fn add_unary(&mut self, op: UnaryOperator, input: NodeId) -> NodeId {
        self.add(Node::new(NodePayload::Unary { op }, vec![input]))
    }

    pub fn add_agg(&mut self, op: AggregateFunction, input: NodeId) -> NodeId {
        self.add(Node::new(NodePayload::Agg { op }, vec![input]))
    }

    pub fn add_function(&mut self, name: &str, children: Vec<NodeId>) -> NodeId {
        let name = self.intern(name);
        self.add(Node::new(NodePayload::Function { name }, children))
    }

    pub fn add_alias(&mut self, input: NodeId, name: &str) -> NodeId {
        let name = self.intern(name);
        self.add(Node::new(NodePayload::Alias { name }, vec![input]))
    }

    pub fn add_cast(&mut self, input: NodeId, type_name: &str) -> NodeId {
        let type_name = self.intern(type_name);
        self.add(Node::new(NodePayload::Cast { type_name }, vec![input]))
    }

    pub fn add_window(
        &mut self,
        func: WindowKind,
        spec: WindowSpec,
        input: Option<NodeId>,
    ) -> NodeId {
        let children = input.into_iter().collect();
        self.add(Node::new(NodePayload::Window { func, spec }, children))
    }

    /// Copy the subtree rooted at `root` in `other` into this arena,
    /// returning the copied root's id here. Shared sub-nodes are copied
    /// once.
    ///
    /// Panics when `root` does not resolve in `other`, like
    /// [`Arena::must_get`].
    pub fn splice_from(&mut self, other: &Arena, root: NodeId) -> NodeId {
        let mut mapping: HashMap<NodeId, NodeId, RandomState> = HashMap::default();
        self.splice_node(other, root, &mut mapping)
    }

    fn splice_node(
        &mut self,
        other: &Arena,
        id: NodeId,
        mapping: &mut HashMap<NodeId, NodeId, RandomState>,
    ) -> NodeId {
        if let Some(mapped) = mapping.get(&id) {
            return *mapped;
        }
        let node = other.must_get(id).clone();
        let children = node
            .children
            .iter()
            .map(|&child| self.splice_node(other, child, mapping))
            .collect();
        // re-intern any strings the payload refers to
        let payload = match node.payload {
            NodePayload::Column { name } => NodePayload::Column {
                name: self.intern(other.must_string(name)),
            },
            NodePayload::Function { name } => NodePayload::Function {
                name: self.intern(other.must_string(name)),
            },
            NodePayload::Alias { name } => NodePayload::Alias {
                name: self.intern(other.must_string(name)),
            },
            NodePayload::Cast { type_name } => NodePayload::Cast {
                type_name: self.intern(other.must_string(type_name)),
            },
            other_payload => other_payload,
        };
        let new_id = self.add(Node::new(payload, children));
        mapping.insert(id, new_id);
        new_id
    }

    fn must_string(&self, id: StringId) -> &str {
        match self.string(id) {
            Ok(s) => s,
            Err(e) => panic!("{e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut arena = Arena::new();
        let a = arena.intern("x");
        let b = arena.intern("x");
        let c = arena.intern("y");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(arena.string(a).unwrap(), "x");
    }

    #[test]
    fn added_nodes_read_back_unchanged() {
        let mut arena = Arena::new();
        let col = arena.add_column("a");
        let lit = arena.add_literal(ScalarValue::Int64(1));
        let sum = arena.add_binary(col, Operator::Plus, lit);

        let node = arena.get(sum).unwrap();
        assert_eq!(node.kind(), NodeKind::Binary);
        assert_eq!(node.children, vec![col, lit]);

        let name = match &arena.get(col).unwrap().payload {
            NodePayload::Column { name } => *name,
            other => panic!("expected column, got {other:?}"),
        };
        assert_eq!(arena.string(name).unwrap(), "a");
    }

    #[test]
    fn with_children_allocates_only_on_change() {
        let mut arena = Arena::new();
        let a = arena.add_column("a");
        let b = arena.add_column("b");
        let lit = arena.add_literal(ScalarValue::Int64(1));
        let add = arena.add_binary(a, Operator::Plus, lit);

        let unchanged = arena.with_children(add, vec![a, lit]).unwrap();
        assert_eq!(unchanged, add);

        let changed = arena.with_children(add, vec![b, lit]).unwrap();
        assert_ne!(changed, add);
        assert_eq!(arena.get(changed).unwrap().children, vec![b, lit]);
        // the original node is untouched
        assert_eq!(arena.get(add).unwrap().children, vec![a, lit]);
    }

    #[test]
    fn invalid_ids_error() {
        let arena = Arena::new();
        assert!(matches!(
            arena.get(NodeId::NULL).unwrap_err(),
            LaminaError::InvalidNode(_)
        ));
        assert!(matches!(
            arena.get(NodeId::new(7)).unwrap_err(),
            LaminaError::InvalidNode(_)
        ));
    }

    #[test]
    #[should_panic]
    fn must_get_panics_on_sentinel() {
        Arena::new().must_get(NodeId::NULL);
    }

    #[test]
    fn splice_copies_subtree_and_reinterns() {
        let mut src = Arena::new();
        let col = src.add_column("a");
        let lit = src.add_literal(ScalarValue::Int64(2));
        let root = src.add_binary(col, Operator::Multiply, lit);

        let mut dst = Arena::new();
        dst.add_column("unrelated");
        let copied = dst.splice_from(&src, root);

        let node = dst.get(copied).unwrap();
        assert_eq!(node.kind(), NodeKind::Binary);
        let left = dst.get(node.children[0]).unwrap();
        match &left.payload {
            NodePayload::Column { name } => assert_eq!(dst.string(*name).unwrap(), "a"),
            other => panic!("expected column, got {other:?}"),
        }
    }
}
