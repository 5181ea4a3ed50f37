//! Ancestors, siblings, statement parents and completion records.

use std::collections::VecDeque;

use indexmap::IndexMap;

use crate::ast::{validators, Field, NodeId, NodeType};
use crate::error::{Result, TraverseError};
use crate::session::Session;

use super::{Container, Key, PathId};

impl Session {
    /// Element `index` of the list this path sits in. Slot paths and
    /// out-of-range indices yield an absent path.
    pub fn get_sibling(&mut self, path: PathId, index: usize) -> PathId {
        let parent = self.parent_path(path);
        match (self.container(path), parent) {
            (Container::List { field, .. }, Some(parent)) => self.get_index(parent, field, index),
            _ => self.detached_path(parent),
        }
    }

    pub fn get_prev_sibling(&mut self, path: PathId) -> PathId {
        match self.index(path).and_then(|index| index.checked_sub(1)) {
            Some(index) => self.get_sibling(path, index),
            None => {
                let parent = self.parent_path(path);
                self.detached_path(parent)
            }
        }
    }

    pub fn get_next_sibling(&mut self, path: PathId) -> PathId {
        match self.index(path) {
            Some(index) => self.get_sibling(path, index + 1),
            None => {
                let parent = self.parent_path(path);
                self.detached_path(parent)
            }
        }
    }

    /// Every later sibling, nearest first.
    pub fn get_all_next_siblings(&mut self, path: PathId) -> Vec<PathId> {
        let Some(mut index) = self.index(path) else {
            return Vec::new();
        };
        let mut siblings = Vec::new();
        loop {
            index += 1;
            let sibling = self.get_sibling(path, index);
            if self.node(sibling).is_none() {
                return siblings;
            }
            siblings.push(sibling);
        }
    }

    /// Every earlier sibling, nearest first.
    pub fn get_all_prev_siblings(&mut self, path: PathId) -> Vec<PathId> {
        let Some(index) = self.index(path) else {
            return Vec::new();
        };
        (0..index).rev().map(|i| self.get_sibling(path, i)).collect()
    }

    /// The other operand of a binary-shaped parent: `left` for `right` and
    /// the reverse.
    pub fn get_opposite(&mut self, path: PathId) -> Option<PathId> {
        let opposite = match self.key(path) {
            Key::Field(Field::Left) => Field::Right,
            Key::Field(Field::Right) => Field::Left,
            _ => return None,
        };
        let parent = self.parent_path(path)?;
        Some(self.get(parent, opposite))
    }

    /// Nearest strict ancestor satisfying `predicate`.
    pub fn find_parent(&self, path: PathId, mut predicate: impl FnMut(&Session, PathId) -> bool) -> Option<PathId> {
        let mut current = self.parent_path(path);
        while let Some(p) = current {
            if predicate(self, p) {
                return Some(p);
            }
            current = self.parent_path(p);
        }
        None
    }

    /// Like [`Session::find_parent`] but starting with the path itself.
    pub fn find(&self, path: PathId, mut predicate: impl FnMut(&Session, PathId) -> bool) -> Option<PathId> {
        if predicate(self, path) {
            return Some(path);
        }
        self.find_parent(path, predicate)
    }

    /// The path followed by each ancestor up to the root.
    pub fn get_ancestry(&self, path: PathId) -> Vec<PathId> {
        let mut ancestry = vec![path];
        let mut current = path;
        while let Some(parent) = self.parent_path(current) {
            ancestry.push(parent);
            current = parent;
        }
        ancestry
    }

    pub fn get_function_parent(&self, path: PathId) -> Option<PathId> {
        self.find_parent(path, |s, p| s.node_type(p).is_some_and(NodeType::is_function))
    }

    pub fn get_program_parent(&self, path: PathId) -> Option<PathId> {
        self.find(path, |s, p| s.is(p, NodeType::Program))
    }

    /// Is `ancestor` a strict ancestor of this path (compared by node).
    pub fn is_descendant(&self, path: PathId, ancestor: PathId) -> bool {
        let Some(target) = self.node(ancestor) else {
            return false;
        };
        self.find_parent(path, |s, p| s.node(p) == Some(target)).is_some()
    }

    pub fn is_ancestor(&self, path: PathId, descendant: PathId) -> bool {
        self.is_descendant(descendant, path)
    }

    /// Nearest path, starting with this one, that is a statement sitting in
    /// a list. Fails when the ascent reaches a parentless path first.
    pub fn get_statement_parent(&self, path: PathId) -> Result<PathId> {
        let mut current = path;
        loop {
            let is_listed_statement =
                self.in_list(current) && self.node_type(current).is_some_and(NodeType::is_statement);
            if is_listed_statement {
                return Ok(current);
            }
            match self.parent_path(current) {
                Some(parent) => current = parent,
                None => return Err(TraverseError::NoStatementParent),
            }
        }
    }

    /// Paths whose value becomes the completion value of this construct.
    pub fn get_completion_records(&mut self, path: PathId) -> Vec<PathId> {
        let Some(ty) = self.node_type(path) else {
            return Vec::new();
        };
        let mut records = Vec::new();
        match ty {
            NodeType::IfStatement => {
                for field in [Field::Consequent, Field::Alternate] {
                    let branch = self.get(path, field);
                    records.extend(self.get_completion_records(branch));
                }
            }
            _ if ty.is_for() || ty.is_while() => {
                let body = self.get(path, Field::Body);
                records.extend(self.get_completion_records(body));
            }
            NodeType::Program | NodeType::BlockStatement => {
                if let Some(last) = self.get_list(path, Field::Body).pop() {
                    records.extend(self.get_completion_records(last));
                }
            }
            _ if ty.is_function() => {
                let body = self.get(path, Field::Body);
                return self.get_completion_records(body);
            }
            NodeType::TryStatement => {
                for field in [Field::Block, Field::Handler, Field::Finalizer] {
                    let part = self.get(path, field);
                    records.extend(self.get_completion_records(part));
                }
            }
            NodeType::CatchClause => {
                let body = self.get(path, Field::Body);
                records.extend(self.get_completion_records(body));
            }
            _ => records.push(path),
        }
        records
    }

    /// Binding identifier paths introduced by this node, keyed by name.
    ///
    /// Export declarations unwrap to their declaration. With `outer_only`, a
    /// function declaration contributes only its name and function
    /// expressions contribute nothing.
    pub fn get_binding_identifier_paths(
        &mut self,
        path: PathId,
        duplicates: bool,
        outer_only: bool,
    ) -> IndexMap<String, Vec<PathId>> {
        let mut ids: IndexMap<String, Vec<PathId>> = IndexMap::new();
        let mut search = VecDeque::from([path]);
        while let Some(id) = search.pop_front() {
            let Some(ty) = self.node_type(id) else {
                continue;
            };
            if let Some(name) = self.identifier_name(id) {
                let entry = ids.entry(name.to_string()).or_default();
                if !duplicates {
                    entry.clear();
                }
                entry.push(id);
                continue;
            }
            if ty.is_export_declaration() {
                let declaration = self.get(id, Field::Declaration);
                if self.node_type(declaration).is_some_and(NodeType::is_declaration) {
                    search.push_back(declaration);
                }
                continue;
            }
            if outer_only {
                match ty {
                    NodeType::FunctionDeclaration => {
                        search.push_back(self.get(id, Field::Id));
                        continue;
                    }
                    NodeType::FunctionExpression | NodeType::ArrowFunctionExpression => continue,
                    _ => {}
                }
            }
            for &field in ty.binding_identifier_keys() {
                search.extend(self.child_paths(id, field));
            }
        }
        ids
    }

    pub fn get_outer_binding_identifier_paths(&mut self, path: PathId, duplicates: bool) -> IndexMap<String, Vec<PathId>> {
        self.get_binding_identifier_paths(path, duplicates, true)
    }

    /// Node-level variant of [`Session::get_binding_identifier_paths`].
    pub fn get_binding_identifiers(&self, path: PathId, duplicates: bool) -> IndexMap<String, Vec<NodeId>> {
        match self.node(path) {
            Some(node) => validators::get_binding_identifiers(&self.ast, node, duplicates, false),
            None => IndexMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Ast, VariableKind};

    fn statements(count: usize) -> Session {
        let mut ast = Ast::new();
        let body = (0..count)
            .map(|i| {
                let call = ast.call(&format!("f{i}"), vec![]);
                ast.expression_statement(call)
            })
            .collect();
        let program = ast.program(body);
        ast.set_root(program);
        Session::new(ast)
    }

    #[test]
    fn test_sibling_partition() {
        let mut session = statements(5);
        let root = session.root_path();
        let all = session.get_list(root, Field::Body);
        let middle = all[2];

        let mut union = session.get_all_prev_siblings(middle);
        union.reverse();
        union.push(middle);
        union.extend(session.get_all_next_siblings(middle));
        assert_eq!(union, all);

        assert_eq!(session.get_prev_sibling(middle), all[1]);
        assert_eq!(session.get_next_sibling(middle), all[3]);
        let before_first = session.get_prev_sibling(all[0]);
        assert_eq!(session.node(before_first), None);
        let after_last = session.get_next_sibling(all[4]);
        assert_eq!(session.node(after_last), None);
    }

    #[test]
    fn test_ancestry_ends_at_root() {
        let mut session = statements(1);
        let root = session.root_path();
        let callee = session.get_pattern(root, "body.0.expression.callee").unwrap();
        let ancestry = session.get_ancestry(callee);
        assert_eq!(ancestry.len(), 4);
        assert_eq!(ancestry.last(), Some(&root));
        assert!(session.is_descendant(callee, root));
        assert!(session.is_ancestor(root, callee));
        assert!(!session.is_ancestor(callee, root));
    }

    #[test]
    fn test_statement_parent() {
        let mut session = statements(2);
        let root = session.root_path();
        let callee = session.get_pattern(root, "body.1.expression.callee").unwrap();
        let statement = session.get_statement_parent(callee).unwrap();
        assert_eq!(statement, session.get_index(root, Field::Body, 1));
        assert!(matches!(
            session.get_statement_parent(root),
            Err(TraverseError::NoStatementParent)
        ));
    }

    #[test]
    fn test_statement_parent_of_detached_expression() {
        let mut ast = Ast::new();
        let call = ast.call("f", vec![]);
        ast.set_root(call);
        let mut session = Session::with_config(ast, crate::SessionConfig::default().with_noscope(true));
        let root = session.root_path();
        let callee = session.get(root, Field::Callee);
        assert!(matches!(
            session.get_statement_parent(callee),
            Err(TraverseError::NoStatementParent)
        ));

        let nowhere = session.path_for(None, Container::Detached, Key::Root);
        assert!(matches!(
            session.get_statement_parent(nowhere),
            Err(TraverseError::NoStatementParent)
        ));
    }

    #[test]
    fn test_outer_binding_identifiers() {
        let mut ast = Ast::new();
        let inner = ast.declare(VariableKind::Var, "inner", None);
        let body = ast.block_statement(vec![inner]);
        let name = ast.identifier("outer");
        let param = ast.identifier("p");
        let func = ast.function_declaration(Some(name), vec![param], body);
        let export = ast.export_named_declaration(Some(func), vec![]);
        let program = ast.program(vec![export]);
        ast.set_root(program);
        let mut session = Session::new(ast);
        let root = session.root_path();
        let export = session.get_index(root, Field::Body, 0);

        let outer: Vec<String> = session.get_outer_binding_identifier_paths(export, false).into_keys().collect();
        assert_eq!(outer, vec!["outer".to_string()]);
        let all: Vec<String> = session.get_binding_identifier_paths(export, false, false).into_keys().collect();
        assert_eq!(all, vec!["outer".to_string(), "p".to_string()]);
    }
}
