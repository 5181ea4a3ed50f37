//! Insertion, removal and traversal control on paths.

use std::collections::HashSet;

use crate::ast::{ChildMut, Field, NodeId, NodeType};
use crate::error::{Result, TraverseError};
use crate::session::Session;

use super::{Container, Key, PathId};

impl Session {
    /// Put `node` at the position of `path` without any conversion, requeue
    /// or comment handling.
    pub(crate) fn set_node(&mut self, path: PathId, node: NodeId) -> Result<()> {
        let (container, key) = (self.container(path), self.key(path));
        match (container, key) {
            (Container::Root, _) => self.ast.set_root(node),
            (Container::Slot(parent), Key::Field(field)) => {
                let parent_type = self.ast.node_type(parent);
                match self.ast.kind_mut(parent).child_mut(field) {
                    Some(ChildMut::Required(slot)) => *slot = node,
                    Some(ChildMut::Optional(slot)) => *slot = Some(node),
                    Some(ChildMut::List(_)) => return Err(TraverseError::NotASlot { parent: parent_type, field }),
                    None => return Err(TraverseError::unknown_field(parent_type, field.as_str())),
                }
            }
            (Container::List { parent, field }, Key::Index(index)) => {
                let parent_type = self.ast.node_type(parent);
                match self.ast.kind_mut(parent).child_mut(field) {
                    Some(ChildMut::List(list)) if index < list.len() => list[index] = node,
                    Some(ChildMut::List(list)) => {
                        return Err(TraverseError::OutOfBounds { field, index, len: list.len() })
                    }
                    _ => return Err(TraverseError::unknown_field(parent_type, field.as_str())),
                }
            }
            _ => return Err(TraverseError::EmptyPath),
        }
        let data = self.data_mut(path);
        data.node = Some(node);
        data.type_annotation = None;
        Ok(())
    }

    /// Splice `nodes` into the list `field` of the node at `parent_path`,
    /// starting at `index`. Cached siblings at or after `index` shift.
    pub(crate) fn insert_at(
        &mut self,
        parent_path: PathId,
        field: Field,
        index: usize,
        nodes: Vec<NodeId>,
    ) -> Result<Vec<PathId>> {
        let parent = self.node(parent_path).ok_or(TraverseError::EmptyPath)?;
        let parent_type = self.ast.node_type(parent);
        let count = nodes.len();
        match self.ast.kind_mut(parent).child_mut(field) {
            Some(ChildMut::List(list)) => {
                if index > list.len() {
                    return Err(TraverseError::OutOfBounds { field, index, len: list.len() });
                }
                list.splice(index..index, nodes.iter().copied());
            }
            Some(_) => return Err(TraverseError::not_a_list("insert")),
            None => return Err(TraverseError::unknown_field(parent_type, field.as_str())),
        }
        self.update_sibling_keys(Container::List { parent, field }, index, count as isize);

        let paths: Vec<PathId> = (index..index + count)
            .map(|position| self.get_index(parent_path, field, position))
            .collect();
        self.record_mutation();
        tracing::debug!(parent = %parent_type, %field, index, count, "inserted nodes");

        if self.scopes_crawled() {
            for &path in &paths {
                if self.node_type(path).is_some_and(|ty| ty.is_declaration()) {
                    self.register_declaration(path)?;
                }
            }
        }
        Ok(paths)
    }

    /// Insert `nodes` before this path. Statements in a single-node slot are
    /// wrapped in a block; paths whose parent is a statement wrapper delegate
    /// to the parent.
    pub fn insert_before(&mut self, path: PathId, nodes: Vec<NodeId>) -> Result<Vec<PathId>> {
        self.insert_beside(path, nodes, false)
    }

    /// Insert `nodes` after this path. Same placement rules as
    /// [`Session::insert_before`].
    pub fn insert_after(&mut self, path: PathId, nodes: Vec<NodeId>) -> Result<Vec<PathId>> {
        self.insert_beside(path, nodes, true)
    }

    fn insert_beside(&mut self, path: PathId, nodes: Vec<NodeId>, after: bool) -> Result<Vec<PathId>> {
        if self.is_removed(path) {
            return Err(TraverseError::RemovedPath);
        }
        if nodes.is_empty() {
            return Ok(Vec::new());
        }
        self.resync(path);

        let delegate = match self.parent_type(path) {
            Some(NodeType::ExpressionStatement | NodeType::LabeledStatement | NodeType::ExportNamedDeclaration) => true,
            Some(NodeType::ExportDefaultDeclaration) => self.node_type(path).is_some_and(|ty| ty.is_declaration()),
            _ => false,
        };
        if delegate {
            if let Some(parent) = self.parent_path(path) {
                return self.insert_beside(parent, nodes, after);
            }
        }

        if let (Container::List { field, .. }, Key::Index(index), Some(parent)) =
            (self.container(path), self.key(path), self.parent_path(path))
        {
            let at = if after { index + 1 } else { index };
            return self.insert_at(parent, field, at, nodes);
        }

        if self.is_statement_or_block(path) {
            let current = self.node(path).ok_or(TraverseError::EmptyPath)?;
            let count = nodes.len();
            let mut body = nodes;
            if after {
                body.insert(0, current);
            } else {
                body.push(current);
            }
            let block = self.ast.block_statement(body);
            self.set_node(path, block)?;
            self.record_mutation();
            tracing::debug!("wrapped statement in a block for insertion");
            let first = usize::from(after);
            return Ok((first..first + count).map(|i| self.get_index(path, Field::Body, i)).collect());
        }

        Err(TraverseError::not_a_list(if after { "insert_after" } else { "insert_before" }))
    }

    /// Insert `nodes` at the start of the list `field` of the node at `path`.
    pub fn unshift_container(&mut self, path: PathId, field: Field, nodes: Vec<NodeId>) -> Result<Vec<PathId>> {
        if self.is_removed(path) {
            return Err(TraverseError::RemovedPath);
        }
        self.insert_at(path, field, 0, nodes)
    }

    /// Insert `nodes` at the end of the list `field` of the node at `path`.
    pub fn push_container(&mut self, path: PathId, field: Field, nodes: Vec<NodeId>) -> Result<Vec<PathId>> {
        if self.is_removed(path) {
            return Err(TraverseError::RemovedPath);
        }
        let node = self.node(path).ok_or(TraverseError::EmptyPath)?;
        let len = self.list_len(node, field);
        self.insert_at(path, field, len, nodes)
    }

    /// Detach the node at this path.
    ///
    /// Structural hooks run first: a removal that would leave the parent
    /// meaningless removes or collapses the parent instead, and a required
    /// body becomes an empty block. Bindings declared inside the removed
    /// subtree are unregistered.
    pub fn remove(&mut self, path: PathId) -> Result<()> {
        if self.is_removed(path) {
            return Err(TraverseError::RemovedPath);
        }
        self.resync(path);
        let node = self.node(path).ok_or(TraverseError::EmptyPath)?;
        tracing::debug!(node = %self.ast.node_type(node), "removing");

        self.remove_from_scope(node);
        if !self.call_removal_hooks(path)? {
            self.detach(path)?;
        }
        self.mark_removed(path);
        self.record_mutation();
        Ok(())
    }

    /// Returns `true` when a hook took care of the removal.
    fn call_removal_hooks(&mut self, path: PathId) -> Result<bool> {
        let (Some(parent), Some(parent_type)) = (self.parent_path(path), self.parent_type(path)) else {
            return Ok(false);
        };
        let field = self.field(path);
        let key = self.key(path);

        let remove_parent = (key == Key::Field(Field::Test) && parent_type.is_while())
            || (key == Key::Field(Field::Declaration) && parent_type.is_export_declaration())
            || (key == Key::Field(Field::Body) && parent_type == NodeType::LabeledStatement)
            || (field == Some(Field::Declarations)
                && parent_type == NodeType::VariableDeclaration
                && self.parent_node(path).map(|p| self.list_len(p, Field::Declarations)) == Some(1))
            || (key == Key::Field(Field::Expression) && parent_type == NodeType::ExpressionStatement);
        if remove_parent {
            self.remove(parent)?;
            return Ok(true);
        }

        if parent_type == NodeType::SequenceExpression {
            if let (Some(parent_node), Key::Index(index)) = (self.parent_node(path), key) {
                if self.list_len(parent_node, Field::Expressions) == 2 {
                    let other = self.get_index(parent, Field::Expressions, 1 - index.min(1));
                    if let Some(other) = self.node(other) {
                        self.replace_with(parent, other)?;
                        return Ok(true);
                    }
                }
            }
        }

        if parent_type.is_binary() {
            let opposite = if key == Key::Field(Field::Left) { Field::Right } else { Field::Left };
            let other = self.get(parent, opposite);
            if let Some(other) = self.node(other) {
                self.replace_with(parent, other)?;
                return Ok(true);
            }
        }

        if (parent_type == NodeType::IfStatement && key == Key::Field(Field::Consequent))
            || (key == Key::Field(Field::Body)
                && (parent_type.is_loop() || parent_type == NodeType::ArrowFunctionExpression))
        {
            let block = self.ast.block_statement(Vec::new());
            self.set_node(path, block)?;
            return Ok(true);
        }
        Ok(false)
    }

    pub(crate) fn detach(&mut self, path: PathId) -> Result<()> {
        match (self.container(path), self.key(path)) {
            (Container::Root, _) => Err(TraverseError::RootRemoval),
            (Container::Slot(parent), Key::Field(field)) => {
                let parent_type = self.ast.node_type(parent);
                match self.ast.kind_mut(parent).child_mut(field) {
                    Some(ChildMut::Optional(slot)) => {
                        *slot = None;
                        Ok(())
                    }
                    Some(ChildMut::Required(_)) => Err(TraverseError::RequiredSlot { parent: parent_type, field }),
                    _ => Err(TraverseError::unknown_field(parent_type, field.as_str())),
                }
            }
            (container @ Container::List { parent, field }, Key::Index(index)) => {
                match self.ast.kind_mut(parent).child_mut(field) {
                    Some(ChildMut::List(list)) if index < list.len() => {
                        list.remove(index);
                    }
                    Some(ChildMut::List(list)) => {
                        return Err(TraverseError::OutOfBounds { field, index, len: list.len() })
                    }
                    _ => return Err(TraverseError::not_a_list("remove")),
                }
                self.update_sibling_keys(container, index + 1, -1);
                Ok(())
            }
            _ => Err(TraverseError::EmptyPath),
        }
    }

    /// Forget bindings, references and violations that live in the subtree
    /// rooted at `node`.
    pub(crate) fn remove_from_scope(&mut self, node: NodeId) {
        if !self.scopes_crawled() {
            return;
        }
        let mut subtree = HashSet::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            subtree.insert(id);
            stack.extend(self.ast.children(id));
        }

        let inside = |session: &Session, path: PathId| session.node(path).map_or(true, |n| subtree.contains(&n));
        for scope in self.scope_ids().collect::<Vec<_>>() {
            let names: Vec<String> = self
                .scope(scope)
                .bindings
                .values()
                .filter(|binding| subtree.contains(&binding.identifier))
                .map(|binding| binding.name.clone())
                .collect();
            for name in &names {
                tracing::debug!(name = name.as_str(), "unregistering binding");
                self.scope_mut(scope).bindings.shift_remove(name.as_str());
            }

            let stale: Vec<(String, Vec<PathId>)> = self
                .scope(scope)
                .bindings
                .values()
                .map(|binding| {
                    let gone = binding
                        .reference_paths
                        .iter()
                        .chain(&binding.constant_violations)
                        .copied()
                        .filter(|&p| inside(self, p))
                        .collect();
                    (binding.name.clone(), gone)
                })
                .filter(|(_, gone): &(String, Vec<PathId>)| !gone.is_empty())
                .collect();
            for (name, gone) in stale {
                if let Some(binding) = self.scope_mut(scope).bindings.get_mut(&name) {
                    binding.reference_paths.retain(|p| !gone.contains(p));
                    binding.constant_violations.retain(|p| !gone.contains(p));
                }
            }
        }
    }

    /// Visit this path again, as a fresh entry, before its traversal frame
    /// moves on.
    pub fn requeue(&mut self, path: PathId) {
        let data = self.data(path);
        if data.removed {
            return;
        }
        let Some(frame_id) = data.frame else {
            return;
        };
        if let Some(frame) = self.frames.iter_mut().rev().find(|frame| frame.id == frame_id) {
            if !frame.queue.contains(&path) {
                frame.queue.push_back(path);
            }
        }
    }

    /// Do not descend into this path's children.
    pub fn skip(&mut self, path: PathId) {
        self.data_mut(path).should_skip = true;
    }

    /// Abort the traversal that is visiting this path.
    pub fn stop(&mut self, path: PathId) {
        let data = self.data_mut(path);
        data.should_stop = true;
        data.should_skip = true;
        self.stopping = true;
    }

    pub fn should_skip(&self, path: PathId) -> bool {
        self.data(path).should_skip
    }

    pub fn should_stop(&self, path: PathId) -> bool {
        self.data(path).should_stop
    }
}
