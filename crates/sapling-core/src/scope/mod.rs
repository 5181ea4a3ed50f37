/*!
Lexical scopes and bindings.

One scope exists per program, function, catch clause, `for` head and
non-function-body block. Scopes are built by the [`crawler`] when the session
starts (or lazily on first query) and are kept current by the mutation API:
hoisting and generated declarations register bindings synchronously, and
removal unregisters the bindings a removed declaration introduced.
*/

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::ast::{Child, Field, NodeId, NodeKind, NodeType, VariableKind};
use crate::error::{Result, TraverseError};
use crate::path::{Container, Key, PathId};
use crate::session::Session;

pub mod binding;
pub mod crawler;

pub use binding::{Binding, BindingKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScopeId(u32);

impl ScopeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    /// Path of the node that opens this scope.
    pub block: PathId,
    pub block_type: NodeType,
    pub parent: Option<ScopeId>,
    pub bindings: IndexMap<String, Binding>,
    /// Every name referenced or declared below this scope. Only populated on
    /// the program scope.
    pub(crate) references: HashSet<String>,
    /// Names referenced without any binding. Program scope only.
    pub(crate) globals: HashSet<String>,
    /// Generated uids. Program scope only.
    pub(crate) uids: HashSet<String>,
}

impl Scope {
    fn new(block: PathId, block_type: NodeType, parent: Option<ScopeId>) -> Self {
        Self {
            block,
            block_type,
            parent,
            bindings: IndexMap::new(),
            references: HashSet::new(),
            globals: HashSet::new(),
            uids: HashSet::new(),
        }
    }

    /// Does this scope own `var` and function declarations?
    pub fn is_function_scope(&self) -> bool {
        self.block_type == NodeType::Program || self.block_type.is_function()
    }

    pub fn globals(&self) -> impl Iterator<Item = &str> {
        self.globals.iter().map(String::as_str)
    }
}

#[derive(Debug, Default)]
pub(crate) struct ScopeTable {
    scopes: Vec<Scope>,
    by_block: HashMap<NodeId, ScopeId>,
    /// Generated `var` declaration per body node, reused by `push_declaration`.
    generated: HashMap<NodeId, NodeId>,
    root: Option<ScopeId>,
    crawled: bool,
}

impl ScopeTable {
    pub(crate) fn len(&self) -> usize {
        self.scopes.len()
    }
}

impl Session {
    pub(crate) fn ensure_scopes(&mut self) {
        if self.scopes.crawled {
            return;
        }
        self.scopes.crawled = true;
        let root = self.root_path();
        if self.node(root).is_some() {
            crawler::crawl_scope(self, root, None);
        }
    }

    pub(crate) fn scopes_crawled(&self) -> bool {
        self.scopes.crawled
    }

    /// Rebuild every scope from the current tree, returning the program scope.
    pub fn crawl(&mut self) -> Option<ScopeId> {
        self.scopes = ScopeTable::default();
        self.ensure_scopes();
        self.scopes.root
    }

    /// Does the node at `path` open a scope? Function bodies and catch
    /// bodies share the scope of their owner.
    pub fn is_scope_block(&self, path: PathId) -> bool {
        match self.node_type(path) {
            Some(NodeType::BlockStatement) => {
                !matches!(self.parent_type(path), Some(ty) if ty.is_function() || ty == NodeType::CatchClause)
            }
            Some(ty) => ty.is_scopable(),
            None => false,
        }
    }

    pub(crate) fn create_scope(&mut self, block: PathId, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.scopes.len() as u32);
        let block_type = self.node_type(block).unwrap_or(NodeType::Program);
        self.scopes.scopes.push(Scope::new(block, block_type, parent));
        if let Some(node) = self.node(block) {
            self.scopes.by_block.insert(node, id);
        }
        if parent.is_none() && self.scopes.root.is_none() {
            self.scopes.root = Some(id);
        }
        id
    }

    /// Innermost scope enclosing `path` (a scope block is its own scope).
    /// Blocks created after the initial crawl are crawled on first query.
    pub fn scope_of(&mut self, path: PathId) -> ScopeId {
        self.ensure_scopes();
        let mut current = Some(path);
        while let Some(p) = current {
            if let Some(node) = self.node(p) {
                if self.is_scope_block(p) {
                    if let Some(&scope) = self.scopes.by_block.get(&node) {
                        return scope;
                    }
                    let parent = self.parent_path(p).map(|parent| self.scope_of(parent));
                    tracing::trace!(block = %self.ast.node_type(node), "crawling new scope");
                    return crawler::crawl_scope(self, p, parent);
                }
            }
            current = self.parent_path(p);
        }
        match self.scopes.root {
            Some(root) => root,
            None => {
                let root = self.root_path();
                self.create_scope(root, None)
            }
        }
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes.scopes[id.index()]
    }

    pub(crate) fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes.scopes[id.index()]
    }

    pub fn scope_ids(&self) -> impl Iterator<Item = ScopeId> {
        (0..self.scopes.scopes.len() as u32).map(ScopeId)
    }

    pub fn get_own_binding(&self, scope: ScopeId, name: &str) -> Option<&Binding> {
        self.scope(scope).bindings.get(name)
    }

    /// Scope that declares `name`, searching outward from `scope`.
    pub fn get_binding_scope(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scope(id);
            if scope.bindings.contains_key(name) {
                return Some(id);
            }
            current = scope.parent;
        }
        None
    }

    pub fn get_binding(&self, scope: ScopeId, name: &str) -> Option<&Binding> {
        let owner = self.get_binding_scope(scope, name)?;
        self.get_own_binding(owner, name)
    }

    pub(crate) fn binding_mut(&mut self, scope: ScopeId, name: &str) -> Option<&mut Binding> {
        let owner = self.get_binding_scope(scope, name)?;
        self.scope_mut(owner).bindings.get_mut(name)
    }

    pub fn has_binding(&self, scope: ScopeId, name: &str) -> bool {
        self.get_binding_scope(scope, name).is_some()
    }

    pub fn has_global(&self, scope: ScopeId, name: &str) -> bool {
        let program = self.get_program_scope(scope);
        self.scope(program).globals.contains(name)
    }

    pub fn has_reference(&self, scope: ScopeId, name: &str) -> bool {
        let program = self.get_program_scope(scope);
        self.scope(program).references.contains(name)
    }

    /// Binding of the identifier at `path`, if it resolves to one.
    pub fn binding_for(&mut self, path: PathId) -> Option<Binding> {
        let name = self.identifier_name(path)?.to_string();
        let scope = self.scope_of(path);
        self.get_binding(scope, &name).cloned()
    }

    /// Nearest enclosing function or program scope.
    pub fn get_function_scope(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        loop {
            let data = self.scope(current);
            match data.parent {
                Some(parent) if !data.is_function_scope() => current = parent,
                _ => return current,
            }
        }
    }

    pub fn get_program_scope(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        while let Some(parent) = self.scope(current).parent {
            current = parent;
        }
        current
    }

    /// Record a binding in `scope`. A redeclaration replaces the binding and
    /// keeps the earlier declaration as a constant violation.
    pub(crate) fn register_binding(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: BindingKind,
        path: PathId,
        identifier: NodeId,
    ) {
        let program = self.get_program_scope(scope);
        self.scope_mut(program).references.insert(name.to_string());

        let mut binding = Binding::new(name, identifier, scope, path, kind);
        if let Some(existing) = self.scope(scope).bindings.get(name) {
            if existing.identifier == identifier {
                return;
            }
            if matches!(existing.kind, BindingKind::Let | BindingKind::Const | BindingKind::Module)
                || matches!(kind, BindingKind::Let | BindingKind::Const)
            {
                tracing::warn!(name, "duplicate declaration");
            }
            binding.constant_violations.push(existing.path);
            binding.constant_violations.extend(existing.constant_violations.iter().copied());
            binding.reference_paths = existing.reference_paths.clone();
        }
        self.scope_mut(scope).bindings.insert(name.to_string(), binding);
    }

    /// Forget `name` in the scope that declares it.
    pub fn remove_binding(&mut self, scope: ScopeId, name: &str) {
        if let Some(owner) = self.get_binding_scope(scope, name) {
            self.scope_mut(owner).bindings.shift_remove(name);
        }
    }

    /// Register the bindings introduced by the declaration at `path`, for
    /// declarations inserted after the crawl.
    pub fn register_declaration(&mut self, path: PathId) -> Result<()> {
        let node = self.node(path).ok_or(TraverseError::EmptyPath)?;
        let scope = self.scope_of(path);
        match self.ast.kind(node).clone() {
            NodeKind::VariableDeclaration { kind, .. } => {
                let target = match kind {
                    VariableKind::Var => self.get_function_scope(scope),
                    _ => scope,
                };
                for declarator in self.get_list(path, Field::Declarations) {
                    let id = self.get(declarator, Field::Id);
                    crawler::register_pattern(self, id, kind.into(), target, declarator);
                }
            }
            NodeKind::FunctionDeclaration { id: Some(id), .. } => {
                // The function's own scope is `scope`; the name lives outside.
                let outer = match self.scope(scope).parent {
                    Some(parent) => self.get_function_scope(parent),
                    None => scope,
                };
                if let Some(name) = self.ast.identifier_name(id).map(str::to_string) {
                    self.register_binding(outer, &name, BindingKind::Hoisted, path, id);
                }
            }
            NodeKind::ImportDeclaration { .. } => {
                for specifier in self.get_list(path, Field::Specifiers) {
                    let local = self.get(specifier, Field::Local);
                    crawler::register_pattern(self, local, BindingKind::Module, scope, specifier);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Generate a name that collides with no binding, global, reference or
    /// earlier uid: `_name`, `_name2`, `_name3`, ...
    pub fn generate_uid(&mut self, scope: ScopeId, name: &str) -> String {
        let base = uid_base(name);
        let prefix = self.config.uid_prefix.clone();
        let program = self.get_program_scope(scope);
        let mut i = 0;
        loop {
            let uid = if i > 1 { format!("{prefix}{base}{i}") } else { format!("{prefix}{base}") };
            i += 1;
            let taken = self.has_binding(scope, &uid)
                || self.has_global(scope, &uid)
                || self.has_reference(scope, &uid)
                || self.scope(program).uids.contains(&uid);
            if !taken {
                let program = self.scope_mut(program);
                program.references.insert(uid.clone());
                program.uids.insert(uid.clone());
                return uid;
            }
        }
    }

    /// Generate a uid and declare it with `var` in the function scope.
    pub fn generate_declared_uid(&mut self, scope: ScopeId, name: &str) -> Result<String> {
        let uid = self.generate_uid(scope, name);
        self.push_declaration(scope, &uid, None)?;
        Ok(uid)
    }

    /// Declare `var <name> = <init>` at the top of the nearest function or
    /// program body and register the binding. Repeated pushes into the same
    /// body share one generated declaration. Returns the declarator path.
    pub fn push_declaration(&mut self, scope: ScopeId, name: &str, init: Option<NodeId>) -> Result<PathId> {
        let target = self.get_function_scope(scope);
        let block = self.scope(target).block;
        let body_owner = if self.is(block, NodeType::Program) {
            block
        } else {
            self.ensure_block(block)?;
            self.get(block, Field::Body)
        };
        let body_node = self.node(body_owner).ok_or(TraverseError::EmptyPath)?;

        let existing = self.scopes.generated.get(&body_node).copied().and_then(|decl| {
            match self.ast.kind(body_node).child(Field::Body) {
                Some(Child::List(list)) => list.iter().position(|&n| n == decl),
                _ => None,
            }
        });
        let declaration = match existing {
            Some(index) => self.get_index(body_owner, Field::Body, index),
            None => {
                let decl = self.ast.variable_declaration(VariableKind::Var, Vec::new());
                let inserted = self.unshift_container(body_owner, Field::Body, vec![decl])?;
                self.scopes.generated.insert(body_node, decl);
                inserted[0]
            }
        };

        let id = self.ast.identifier(name);
        let declarator = self.ast.variable_declarator(id, init);
        let inserted = self.push_container(declaration, Field::Declarations, vec![declarator])?;
        let declarator_path = inserted[0];
        self.register_binding(target, name, BindingKind::Var, declarator_path, id);
        tracing::debug!(name, "declared var in function scope");
        Ok(declarator_path)
    }

    /// Give an arrow function with an expression body a block body. The
    /// expression keeps its path, which now sits under the `return`.
    pub(crate) fn ensure_block(&mut self, function: PathId) -> Result<()> {
        let body = self.get(function, Field::Body);
        let Some(expr) = self.node(body) else {
            return Err(TraverseError::EmptyPath);
        };
        if self.ast.is(expr, NodeType::BlockStatement) {
            return Ok(());
        }
        let ret = self.ast.return_statement(Some(expr));
        let block = self.ast.block_statement(vec![ret]);
        self.move_to(body, None, Container::Slot(ret), Key::Field(Field::Argument));

        let block_path = self.get(function, Field::Body);
        self.set_node(block_path, block)?;
        let ret_path = self.get_index(block_path, Field::Body, 0);
        self.move_to(body, Some(ret_path), Container::Slot(ret), Key::Field(Field::Argument));
        Ok(())
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::warn!(%err, pattern, "invalid identifier pattern");
            None
        }
    }
}

fn invalid_chars() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| compile(r"[^a-zA-Z0-9$_]")).as_ref()
}

fn leading_junk() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| compile(r"^[-0-9]+")).as_ref()
}

fn separators() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| compile(r"[-\s]+(.)?")).as_ref()
}

/// Turn arbitrary text into an identifier: invalid characters become word
/// breaks and the result is camel-cased.
pub fn to_identifier(name: &str) -> String {
    let mut name = name.to_string();
    if let Some(re) = invalid_chars() {
        name = re.replace_all(&name, "-").into_owned();
    }
    if let Some(re) = leading_junk() {
        name = re.replace(&name, "").into_owned();
    }
    if let Some(re) = separators() {
        name = re
            .replace_all(&name, |caps: &Captures| {
                caps.get(1).map(|c| c.as_str().to_uppercase()).unwrap_or_default()
            })
            .into_owned();
    }
    if name.is_empty() {
        "_".to_string()
    } else {
        name
    }
}

fn uid_base(name: &str) -> String {
    let ident = to_identifier(name);
    let trimmed = ident.trim_start_matches('_').trim_end_matches(|c: char| c.is_ascii_digit());
    if trimmed.is_empty() {
        "temp".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Ast;

    #[test]
    fn test_to_identifier() {
        assert_eq!(to_identifier("foo-bar"), "fooBar");
        assert_eq!(to_identifier("1abc"), "abc");
        assert_eq!(to_identifier("a b.c"), "aBC");
        assert_eq!(uid_base("_ret2"), "ret");
    }

    #[test]
    fn test_generate_uid_avoids_collisions() {
        let mut ast = Ast::new();
        let decl = ast.declare(VariableKind::Var, "_ret", None);
        let program = ast.program(vec![decl]);
        ast.set_root(program);
        let mut session = Session::new(ast);
        let root = session.root_path();
        let scope = session.scope_of(root);

        assert_eq!(session.generate_uid(scope, "ret"), "_ret2");
        assert_eq!(session.generate_uid(scope, "ret"), "_ret3");
        assert_eq!(session.generate_uid(scope, "temp"), "_temp");
    }

    #[test]
    fn test_push_declaration_reuses_generated_declaration() {
        let mut ast = Ast::new();
        let call = ast.call("f", vec![]);
        let stmt = ast.expression_statement(call);
        let program = ast.program(vec![stmt]);
        ast.set_root(program);
        let mut session = Session::new(ast);
        let root = session.root_path();
        let scope = session.scope_of(root);

        let a = session.generate_declared_uid(scope, "a").unwrap();
        let b = session.generate_declared_uid(scope, "b").unwrap();
        assert_eq!((a.as_str(), b.as_str()), ("_a", "_b"));
        assert_eq!(session.get_list(root, Field::Body).len(), 2);
        let binding = session.get_binding(scope, "_b").unwrap();
        assert_eq!(binding.kind, BindingKind::Var);
        assert_eq!(
            crate::ast::ToSource::to_source(&session.node(root).unwrap(), session.ast()),
            "var _a, _b;\nf();"
        );
    }
}
