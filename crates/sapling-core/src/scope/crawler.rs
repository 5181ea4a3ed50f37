//! Builds scopes and binding tables for a subtree.
//!
//! Declarations are registered during the walk; references and constant
//! violations are collected and resolved once the walk is done so that
//! hoisted declarations are visible to uses that precede them.

use crate::ast::{validators, Field, NodeKind, NodeType, VariableKind};
use crate::path::PathId;
use crate::session::Session;

use super::{BindingKind, ScopeId};

/// Create a scope for `block` under `parent` and crawl everything below it.
pub(crate) fn crawl_scope(session: &mut Session, block: PathId, parent: Option<ScopeId>) -> ScopeId {
    let scope = session.create_scope(block, parent);
    let mut crawler = Crawler::default();
    crawler.visit_block(session, block, scope);
    crawler.finish(session);
    scope
}

/// Register every binding identifier of the pattern at `pattern`.
pub(crate) fn register_pattern(
    session: &mut Session,
    pattern: PathId,
    kind: BindingKind,
    scope: ScopeId,
    declaration: PathId,
) {
    for (name, ids) in session.get_binding_identifier_paths(pattern, true, false) {
        for id in ids {
            if let Some(node) = session.node(id) {
                session.register_binding(scope, &name, kind, declaration, node);
            }
        }
    }
}

#[derive(Default)]
struct Crawler {
    references: Vec<(ScopeId, PathId)>,
    violations: Vec<(ScopeId, PathId, Vec<String>)>,
}

impl Crawler {
    fn visit_block(&mut self, session: &mut Session, block: PathId, scope: ScopeId) {
        let Some(ty) = session.node_type(block) else {
            return;
        };
        match ty {
            NodeType::FunctionDeclaration | NodeType::FunctionExpression | NodeType::ArrowFunctionExpression => {
                if ty == NodeType::FunctionExpression {
                    let id = session.get(block, Field::Id);
                    if let (Some(node), Some(name)) = (session.node(id), session.identifier_name(id)) {
                        let name = name.to_string();
                        session.register_binding(scope, &name, BindingKind::Local, block, node);
                    }
                }
                for param in session.get_list(block, Field::Params) {
                    register_pattern(session, param, BindingKind::Param, scope, param);
                    self.walk(session, param, scope);
                }
                let body = session.get(block, Field::Body);
                if session.is(body, NodeType::BlockStatement) {
                    self.walk_children(session, body, scope);
                } else {
                    self.walk(session, body, scope);
                }
            }
            NodeType::CatchClause => {
                let param = session.get(block, Field::Param);
                if session.node(param).is_some() {
                    register_pattern(session, param, BindingKind::Let, scope, param);
                    self.walk(session, param, scope);
                }
                let body = session.get(block, Field::Body);
                self.walk_children(session, body, scope);
            }
            _ => self.walk_children(session, block, scope),
        }
    }

    fn walk_children(&mut self, session: &mut Session, path: PathId, scope: ScopeId) {
        let Some(ty) = session.node_type(path) else {
            return;
        };
        for &field in ty.visitor_keys() {
            for child in session.child_paths(path, field) {
                self.walk(session, child, scope);
            }
        }
    }

    fn walk(&mut self, session: &mut Session, path: PathId, scope: ScopeId) {
        let Some(node) = session.node(path) else {
            return;
        };
        let ty = session.ast.node_type(node);

        if session.is_scope_block(path) {
            if ty == NodeType::FunctionDeclaration {
                let id = session.get(path, Field::Id);
                if let (Some(id_node), Some(name)) = (session.node(id), session.identifier_name(id)) {
                    let name = name.to_string();
                    let target = session.get_function_scope(scope);
                    session.register_binding(target, &name, BindingKind::Hoisted, path, id_node);
                }
            }
            let child = session.create_scope(path, Some(scope));
            self.visit_block(session, path, child);
            return;
        }

        match session.ast.kind(node) {
            NodeKind::VariableDeclaration { kind, .. } => {
                let kind = *kind;
                let target = match kind {
                    VariableKind::Var => session.get_function_scope(scope),
                    _ => scope,
                };
                for declarator in session.get_list(path, Field::Declarations) {
                    let id = session.get(declarator, Field::Id);
                    register_pattern(session, id, kind.into(), target, declarator);
                    self.walk_children(session, declarator, scope);
                }
                return;
            }
            NodeKind::ImportDeclaration { .. } => {
                for specifier in session.get_list(path, Field::Specifiers) {
                    let local = session.get(specifier, Field::Local);
                    register_pattern(session, local, BindingKind::Module, scope, specifier);
                }
                return;
            }
            NodeKind::AssignmentExpression { left, .. } => {
                let names = validators::get_binding_identifiers(&session.ast, *left, false, false)
                    .into_keys()
                    .collect();
                self.violations.push((scope, path, names));
            }
            NodeKind::UpdateExpression { argument, .. } => {
                if let Some(name) = session.ast.identifier_name(*argument) {
                    self.violations.push((scope, path, vec![name.to_string()]));
                }
            }
            NodeKind::Identifier { .. } => {
                if session.is_referenced_identifier(path) {
                    self.references.push((scope, path));
                }
            }
            _ => {}
        }
        self.walk_children(session, path, scope);
    }

    fn finish(self, session: &mut Session) {
        for (scope, path, names) in self.violations {
            for name in names {
                if let Some(binding) = session.binding_mut(scope, &name) {
                    binding.reassign(path);
                }
            }
        }
        for (scope, path) in self.references {
            let Some(name) = session.identifier_name(path).map(str::to_string) else {
                continue;
            };
            let program = session.get_program_scope(scope);
            session.scope_mut(program).references.insert(name.clone());
            match session.binding_mut(scope, &name) {
                Some(binding) => binding.reference(path),
                None => {
                    session.scope_mut(program).globals.insert(name);
                }
            }
        }
    }
}
