/*!
Paths: stable handles to "a node at a position".

A position is a container (the root, a single-node slot of a parent node, or
an ordered list field of a parent node) plus a key. Handles are cached per
container so that navigating to the same place twice yields the same
[`PathId`]. List elements are matched by node identity, so an element keeps
its handle while insertions and removals shift its index.
*/

use std::collections::HashMap;

use serde_json::Value;

use crate::ast::{Alias, Child, Field, NodeId, NodeKind, NodeType, TypeAnnotation};
use crate::error::{Result, TraverseError};
use crate::session::Session;

pub mod family;
pub mod inference;
pub mod introspection;
pub mod modification;
pub mod replacement;

/// Handle to a path owned by a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathId(u32);

impl PathId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where a path's node lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    /// The tree root.
    Root,
    /// A single-node field of `parent`; the key names the field.
    Slot(NodeId),
    /// An ordered list field of `parent`; the key is the index.
    List { parent: NodeId, field: Field },
    /// No position at all: navigation ran off the tree.
    Detached,
}

impl Container {
    pub fn parent(self) -> Option<NodeId> {
        match self {
            Container::Slot(parent) | Container::List { parent, .. } => Some(parent),
            Container::Root | Container::Detached => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Root,
    Field(Field),
    Index(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct PathData {
    pub(crate) node: Option<NodeId>,
    pub(crate) parent_path: Option<PathId>,
    pub(crate) container: Container,
    pub(crate) key: Key,
    pub(crate) removed: bool,
    pub(crate) should_skip: bool,
    pub(crate) should_stop: bool,
    /// Traversal frame that last visited this path; requeues go there.
    pub(crate) frame: Option<u64>,
    pub(crate) requeues: usize,
    pub(crate) type_annotation: Option<TypeAnnotation>,
    pub(crate) data: HashMap<String, Value>,
}

impl PathData {
    fn new(node: Option<NodeId>, parent_path: Option<PathId>, container: Container, key: Key) -> Self {
        Self {
            node,
            parent_path,
            container,
            key,
            removed: false,
            should_skip: false,
            should_stop: false,
            frame: None,
            requeues: 0,
            type_annotation: None,
            data: HashMap::new(),
        }
    }
}

impl Session {
    pub(crate) fn data(&self, path: PathId) -> &PathData {
        &self.paths[path.index()]
    }

    pub(crate) fn data_mut(&mut self, path: PathId) -> &mut PathData {
        &mut self.paths[path.index()]
    }

    fn alloc_path(&mut self, data: PathData) -> PathId {
        let id = PathId(self.paths.len() as u32);
        self.paths.push(data);
        id
    }

    /// Current occupant of a position.
    pub(crate) fn node_at(&self, container: Container, key: Key) -> Option<NodeId> {
        match (container, key) {
            (Container::Root, _) => self.ast.root(),
            (Container::Slot(parent), Key::Field(field)) => match self.ast.kind(parent).child(field) {
                Some(Child::Node(node)) => node,
                _ => None,
            },
            (Container::List { parent, field }, Key::Index(index)) => match self.ast.kind(parent).child(field) {
                Some(Child::List(list)) => list.get(index).copied(),
                _ => None,
            },
            _ => None,
        }
    }

    pub(crate) fn list_len(&self, parent: NodeId, field: Field) -> usize {
        match self.ast.kind(parent).child(field) {
            Some(Child::List(list)) => list.len(),
            _ => 0,
        }
    }

    /// Cached path for a position, creating it on first use.
    pub fn path_for(&mut self, parent_path: Option<PathId>, container: Container, key: Key) -> PathId {
        if container == Container::Detached {
            let fresh = PathData::new(None, parent_path, container, key);
            return match self.detached.get(&parent_path).copied() {
                Some(path) => {
                    *self.data_mut(path) = fresh;
                    path
                }
                None => {
                    let path = self.alloc_path(fresh);
                    self.detached.insert(parent_path, path);
                    path
                }
            };
        }
        let node = self.node_at(container, key);
        let cached = self.cache.get(&container).and_then(|paths| {
            paths.iter().copied().find(|&p| {
                let data = &self.paths[p.index()];
                match (container, node) {
                    (Container::List { .. }, Some(node)) => data.node == Some(node),
                    _ => data.key == key,
                }
            })
        });
        match cached {
            Some(path) => {
                let data = self.data_mut(path);
                data.parent_path = parent_path;
                data.key = key;
                data.node = node;
                path
            }
            None => {
                let path = self.alloc_path(PathData::new(node, parent_path, container, key));
                self.cache.entry(container).or_default().push(path);
                path
            }
        }
    }

    /// A path with no node and no position, parented for ascent only.
    pub(crate) fn detached_path(&mut self, parent_path: Option<PathId>) -> PathId {
        self.path_for(parent_path, Container::Detached, Key::Root)
    }

    pub fn root_path(&mut self) -> PathId {
        self.path_for(None, Container::Root, Key::Root)
    }

    /// Path of a single-node field. List fields and missing fields yield an
    /// absent path.
    pub fn get(&mut self, path: PathId, field: Field) -> PathId {
        let Some(node) = self.node(path) else {
            return self.detached_path(Some(path));
        };
        match self.ast.kind(node).child(field) {
            Some(Child::Node(_)) => self.path_for(Some(path), Container::Slot(node), Key::Field(field)),
            _ => self.detached_path(Some(path)),
        }
    }

    /// Path of one element of a list field; out-of-range indices yield a
    /// path whose node is absent.
    pub fn get_index(&mut self, path: PathId, field: Field, index: usize) -> PathId {
        let Some(node) = self.node(path) else {
            return self.detached_path(Some(path));
        };
        match self.ast.kind(node).child(field) {
            Some(Child::List(_)) => self.path_for(Some(path), Container::List { parent: node, field }, Key::Index(index)),
            _ => self.detached_path(Some(path)),
        }
    }

    /// Paths of every element of a list field.
    pub fn get_list(&mut self, path: PathId, field: Field) -> Vec<PathId> {
        let Some(node) = self.node(path) else {
            return Vec::new();
        };
        let len = self.list_len(node, field);
        (0..len).map(|index| self.get_index(path, field, index)).collect()
    }

    /// Paths held by a field, whether it is a slot or a list.
    pub fn child_paths(&mut self, path: PathId, field: Field) -> Vec<PathId> {
        let Some(node) = self.node(path) else {
            return Vec::new();
        };
        match self.ast.kind(node).child(field) {
            Some(Child::List(_)) => self.get_list(path, field),
            Some(Child::Node(Some(_))) => vec![self.get(path, field)],
            _ => Vec::new(),
        }
    }

    /// Dotted lookup such as `consequent.body.0`. An empty segment climbs to
    /// the parent path.
    pub fn get_pattern(&mut self, path: PathId, pattern: &str) -> Result<PathId> {
        let mut current = path;
        let mut pending_list: Option<Field> = None;
        for part in pattern.split('.') {
            if let Some(field) = pending_list.take() {
                let node_type = self.node_type(current).ok_or(TraverseError::EmptyPath)?;
                let index: usize = part.parse().map_err(|_| TraverseError::unknown_field(node_type, part))?;
                current = self.get_index(current, field, index);
                continue;
            }
            if part.is_empty() {
                current = match self.parent_path(current) {
                    Some(parent) => parent,
                    None => self.detached_path(None),
                };
                continue;
            }
            let node = self.node(current).ok_or(TraverseError::EmptyPath)?;
            let node_type = self.ast.node_type(node);
            let field: Field = part.parse().map_err(|_| TraverseError::unknown_field(node_type, part))?;
            match self.ast.kind(node).child(field) {
                Some(Child::List(_)) => pending_list = Some(field),
                Some(Child::Node(_)) => current = self.get(current, field),
                None => return Err(TraverseError::unknown_field(node_type, part)),
            }
        }
        if let Some(field) = pending_list {
            let parent = self.node_type(current).ok_or(TraverseError::EmptyPath)?;
            return Err(TraverseError::NotASlot { parent, field });
        }
        Ok(current)
    }

    pub fn node(&self, path: PathId) -> Option<NodeId> {
        self.data(path).node
    }

    pub fn node_type(&self, path: PathId) -> Option<NodeType> {
        self.node(path).map(|node| self.ast.node_type(node))
    }

    pub fn kind(&self, path: PathId) -> Option<&NodeKind> {
        self.node(path).map(|node| self.ast.kind(node))
    }

    pub fn is(&self, path: PathId, ty: NodeType) -> bool {
        self.node_type(path) == Some(ty)
    }

    pub fn is_alias(&self, path: PathId, alias: Alias) -> bool {
        self.node_type(path).is_some_and(|ty| ty.is_alias(alias))
    }

    pub fn identifier_name(&self, path: PathId) -> Option<&str> {
        self.kind(path).and_then(NodeKind::identifier_name)
    }

    pub fn parent_path(&self, path: PathId) -> Option<PathId> {
        self.data(path).parent_path
    }

    /// Node owning the container this path sits in.
    pub fn parent_node(&self, path: PathId) -> Option<NodeId> {
        self.data(path).container.parent()
    }

    pub fn parent_type(&self, path: PathId) -> Option<NodeType> {
        self.parent_node(path).map(|node| self.ast.node_type(node))
    }

    pub fn container(&self, path: PathId) -> Container {
        self.data(path).container
    }

    pub fn key(&self, path: PathId) -> Key {
        self.data(path).key
    }

    /// Field holding this path: the slot name or the list field.
    pub fn field(&self, path: PathId) -> Option<Field> {
        let data = self.data(path);
        match (data.container, data.key) {
            (Container::List { field, .. }, _) => Some(field),
            (_, Key::Field(field)) => Some(field),
            _ => None,
        }
    }

    pub fn list_key(&self, path: PathId) -> Option<Field> {
        match self.data(path).container {
            Container::List { field, .. } => Some(field),
            _ => None,
        }
    }

    pub fn index(&self, path: PathId) -> Option<usize> {
        match self.data(path).key {
            Key::Index(index) => Some(index),
            _ => None,
        }
    }

    pub fn in_list(&self, path: PathId) -> bool {
        self.list_key(path).is_some()
    }

    pub fn is_removed(&self, path: PathId) -> bool {
        self.data(path).removed
    }

    pub fn set_data(&mut self, path: PathId, key: &str, value: impl Into<Value>) {
        self.data_mut(path).data.insert(key.to_string(), value.into());
    }

    pub fn get_data(&self, path: PathId, key: &str) -> Option<&Value> {
        self.data(path).data.get(key)
    }

    /// Re-derive the key from the container when the tree changed outside
    /// the mutation protocol. A node that can no longer be found marks the
    /// path removed.
    pub fn resync(&mut self, path: PathId) {
        if self.data(path).removed {
            return;
        }
        self.resync_parent(path);
        self.resync_key(path);
    }

    fn resync_parent(&mut self, path: PathId) {
        let data = self.data(path);
        let Some(parent_node) = data.parent_path.and_then(|parent| self.node(parent)) else {
            return;
        };
        let container = match data.container {
            Container::Slot(parent) if parent != parent_node => Container::Slot(parent_node),
            Container::List { parent, field } if parent != parent_node => {
                Container::List { parent: parent_node, field }
            }
            _ => return,
        };
        self.move_to_container(path, container);
    }

    fn resync_key(&mut self, path: PathId) {
        let data = self.data(path);
        let Some(node) = data.node else {
            return;
        };
        let (container, key) = (data.container, data.key);
        if self.node_at(container, key) == Some(node) {
            return;
        }
        match container {
            Container::Slot(parent) => {
                let kind = self.ast.kind(parent);
                let found = kind
                    .node_type()
                    .visitor_keys()
                    .iter()
                    .copied()
                    .find(|&field| kind.child(field) == Some(Child::Node(Some(node))));
                match found {
                    Some(field) => self.data_mut(path).key = Key::Field(field),
                    None => self.mark_removed(path),
                }
            }
            Container::List { parent, field } => {
                let position = match self.ast.kind(parent).child(field) {
                    Some(Child::List(list)) => list.iter().position(|&n| n == node),
                    _ => None,
                };
                match position {
                    Some(index) => self.data_mut(path).key = Key::Index(index),
                    None => self.mark_removed(path),
                }
            }
            Container::Root => {
                if self.ast.root() != Some(node) {
                    self.mark_removed(path);
                }
            }
            Container::Detached => {}
        }
    }

    /// Re-home a path at another position without touching the tree.
    pub(crate) fn move_to(&mut self, path: PathId, parent_path: Option<PathId>, container: Container, key: Key) {
        self.move_to_container(path, container);
        let data = self.data_mut(path);
        data.parent_path = parent_path;
        data.key = key;
    }

    fn move_to_container(&mut self, path: PathId, container: Container) {
        let old = self.data(path).container;
        if let Some(paths) = self.cache.get_mut(&old) {
            paths.retain(|&p| p != path);
        }
        self.cache.entry(container).or_default().push(path);
        self.data_mut(path).container = container;
    }

    pub(crate) fn mark_removed(&mut self, path: PathId) {
        let container = self.data(path).container;
        if let Some(paths) = self.cache.get_mut(&container) {
            paths.retain(|&p| p != path);
        }
        let data = self.data_mut(path);
        data.removed = true;
        data.should_skip = true;
        data.node = None;
    }

    /// Shift cached keys of list siblings at or after `from` by `delta`.
    pub(crate) fn update_sibling_keys(&mut self, container: Container, from: usize, delta: isize) {
        let Some(paths) = self.cache.get(&container) else {
            return;
        };
        for &path in paths {
            let data = &mut self.paths[path.index()];
            if let Key::Index(index) = data.key {
                if index >= from {
                    data.key = Key::Index(index.saturating_add_signed(delta));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Ast;

    fn session_with_statements(names: &[&str]) -> Session {
        let mut ast = Ast::new();
        let body = names
            .iter()
            .map(|name| {
                let id = ast.identifier(*name);
                ast.expression_statement(id)
            })
            .collect();
        let program = ast.program(body);
        ast.set_root(program);
        Session::new(ast)
    }

    #[test]
    fn test_identity_cache() {
        let mut session = session_with_statements(&["a", "b"]);
        let root = session.root_path();
        let first = session.get_index(root, Field::Body, 0);
        assert_eq!(first, session.get_index(root, Field::Body, 0));
        let expr = session.get(first, Field::Expression);
        assert_eq!(expr, session.get(first, Field::Expression));
        assert_eq!(session.identifier_name(expr), Some("a"));
        assert_eq!(session.parent_path(expr), Some(first));
        assert_eq!(session.parent_path(first), Some(root));
        assert_eq!(session.parent_path(root), None);
    }

    #[test]
    fn test_missing_fields_share_one_handle_per_parent() {
        let mut session = session_with_statements(&["a", "b"]);
        let root = session.root_path();
        let first = session.get_index(root, Field::Body, 0);
        let missing = session.get(first, Field::Label);
        let arena = session.paths.len();
        for _ in 0..100 {
            assert_eq!(session.get(first, Field::Label), missing);
            assert_eq!(session.get(first, Field::Body), missing);
        }
        assert_eq!(session.paths.len(), arena);
        assert_eq!(session.node(missing), None);
        assert_eq!(session.parent_path(missing), Some(first));

        let second = session.get_index(root, Field::Body, 1);
        let other = session.get(second, Field::Label);
        assert_ne!(other, missing);
        assert_eq!(session.parent_path(other), Some(second));
    }

    #[test]
    fn test_out_of_range_is_absent_not_error() {
        let mut session = session_with_statements(&["a"]);
        let root = session.root_path();
        let missing = session.get_index(root, Field::Body, 5);
        assert_eq!(session.node(missing), None);
        assert!(!session.is_removed(missing));
        let nothing = session.get(missing, Field::Expression);
        assert_eq!(session.node(nothing), None);
    }

    #[test]
    fn test_resync_after_external_shift() {
        let mut session = session_with_statements(&["a", "b"]);
        let root = session.root_path();
        let second = session.get_index(root, Field::Body, 1);
        let program = session.node(root).unwrap();
        let extra = {
            let ast = session.ast_mut();
            let id = ast.identifier("z");
            ast.expression_statement(id)
        };
        if let NodeKind::Program { body, .. } = session.ast_mut().kind_mut(program) {
            body.insert(0, extra);
        }
        session.resync(second);
        assert_eq!(session.key(second), Key::Index(2));
        assert_eq!(session.get_index(root, Field::Body, 2), second);
    }

    #[test]
    fn test_resync_marks_missing_node_removed() {
        let mut session = session_with_statements(&["a", "b"]);
        let root = session.root_path();
        let first = session.get_index(root, Field::Body, 0);
        let program = session.node(root).unwrap();
        if let NodeKind::Program { body, .. } = session.ast_mut().kind_mut(program) {
            body.remove(0);
        }
        session.resync(first);
        assert!(session.is_removed(first));
        assert_eq!(session.node(first), None);
    }

    #[test]
    fn test_get_pattern() {
        let mut session = session_with_statements(&["a", "b"]);
        let root = session.root_path();
        let expr = session.get_pattern(root, "body.1.expression").unwrap();
        assert_eq!(session.identifier_name(expr), Some("b"));
        let stmt = session.get_pattern(expr, "").unwrap();
        assert_eq!(stmt, session.get_index(root, Field::Body, 1));
        assert!(matches!(
            session.get_pattern(root, "body"),
            Err(TraverseError::NotASlot { field: Field::Body, .. })
        ));
        assert!(matches!(
            session.get_pattern(root, "callee"),
            Err(TraverseError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_path_data() {
        let mut session = session_with_statements(&["a"]);
        let root = session.root_path();
        session.set_data(root, "seen", true);
        assert_eq!(session.get_data(root, "seen"), Some(&Value::Bool(true)));
        assert_eq!(session.get_data(root, "other"), None);
    }
}
