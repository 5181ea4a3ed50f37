use serde::Serialize;
use std::fmt;

use crate::ast::{NodeId, VariableKind};
use crate::path::PathId;

use super::ScopeId;

/// How a name was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingKind {
    Var,
    Let,
    Const,
    Param,
    /// Function declarations, hoisted to the function scope.
    Hoisted,
    /// Names only visible inside their own construct, such as a named
    /// function expression.
    Local,
    Module,
}

impl From<VariableKind> for BindingKind {
    fn from(kind: VariableKind) -> Self {
        match kind {
            VariableKind::Var => BindingKind::Var,
            VariableKind::Let => BindingKind::Let,
            VariableKind::Const => BindingKind::Const,
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BindingKind::Var => "var",
            BindingKind::Let => "let",
            BindingKind::Const => "const",
            BindingKind::Param => "param",
            BindingKind::Hoisted => "hoisted",
            BindingKind::Local => "local",
            BindingKind::Module => "module",
        };
        f.write_str(name)
    }
}

/// A declared name: where it was declared, where it is reassigned and where
/// it is read.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    /// The binding identifier node.
    pub identifier: NodeId,
    pub scope: ScopeId,
    /// Declaration site: the declarator, function, param or import specifier.
    pub path: PathId,
    pub kind: BindingKind,
    pub constant_violations: Vec<PathId>,
    pub reference_paths: Vec<PathId>,
}

impl Binding {
    pub fn new(name: impl Into<String>, identifier: NodeId, scope: ScopeId, path: PathId, kind: BindingKind) -> Self {
        Self {
            name: name.into(),
            identifier,
            scope,
            path,
            kind,
            constant_violations: Vec::new(),
            reference_paths: Vec::new(),
        }
    }

    pub fn is_constant(&self) -> bool {
        self.constant_violations.is_empty()
    }

    pub fn is_referenced(&self) -> bool {
        !self.reference_paths.is_empty()
    }

    pub fn references(&self) -> usize {
        self.reference_paths.len()
    }

    pub fn reassign(&mut self, path: PathId) {
        if !self.constant_violations.contains(&path) {
            self.constant_violations.push(path);
        }
    }

    pub fn reference(&mut self, path: PathId) {
        if !self.reference_paths.contains(&path) {
            self.reference_paths.push(path);
        }
    }

    pub fn dereference(&mut self, path: PathId) {
        self.reference_paths.retain(|&p| p != path);
    }
}
