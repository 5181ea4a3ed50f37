//! Child field names, visitation order per node type, and uniform field
//! access over [`NodeKind`].

use super::{NodeId, NodeKind, NodeType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of a child-bearing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Body,
    Expression,
    Declarations,
    Id,
    Init,
    Params,
    Test,
    Consequent,
    Alternate,
    Update,
    Left,
    Right,
    Argument,
    Block,
    Handler,
    Finalizer,
    Param,
    Label,
    Object,
    Property,
    Callee,
    Arguments,
    Expressions,
    Properties,
    Key,
    Value,
    Elements,
    Specifiers,
    Source,
    Local,
    Imported,
    Exported,
    Declaration,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Body => "body",
            Field::Expression => "expression",
            Field::Declarations => "declarations",
            Field::Id => "id",
            Field::Init => "init",
            Field::Params => "params",
            Field::Test => "test",
            Field::Consequent => "consequent",
            Field::Alternate => "alternate",
            Field::Update => "update",
            Field::Left => "left",
            Field::Right => "right",
            Field::Argument => "argument",
            Field::Block => "block",
            Field::Handler => "handler",
            Field::Finalizer => "finalizer",
            Field::Param => "param",
            Field::Label => "label",
            Field::Object => "object",
            Field::Property => "property",
            Field::Callee => "callee",
            Field::Arguments => "arguments",
            Field::Expressions => "expressions",
            Field::Properties => "properties",
            Field::Key => "key",
            Field::Value => "value",
            Field::Elements => "elements",
            Field::Specifiers => "specifiers",
            Field::Source => "source",
            Field::Local => "local",
            Field::Imported => "imported",
            Field::Exported => "exported",
            Field::Declaration => "declaration",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s {
            "body" => Field::Body,
            "expression" => Field::Expression,
            "declarations" => Field::Declarations,
            "id" => Field::Id,
            "init" => Field::Init,
            "params" => Field::Params,
            "test" => Field::Test,
            "consequent" => Field::Consequent,
            "alternate" => Field::Alternate,
            "update" => Field::Update,
            "left" => Field::Left,
            "right" => Field::Right,
            "argument" => Field::Argument,
            "block" => Field::Block,
            "handler" => Field::Handler,
            "finalizer" => Field::Finalizer,
            "param" => Field::Param,
            "label" => Field::Label,
            "object" => Field::Object,
            "property" => Field::Property,
            "callee" => Field::Callee,
            "arguments" => Field::Arguments,
            "expressions" => Field::Expressions,
            "properties" => Field::Properties,
            "key" => Field::Key,
            "value" => Field::Value,
            "elements" => Field::Elements,
            "specifiers" => Field::Specifiers,
            "source" => Field::Source,
            "local" => Field::Local,
            "imported" => Field::Imported,
            "exported" => Field::Exported,
            "declaration" => Field::Declaration,
            other => return Err(other.to_string()),
        };
        Ok(field)
    }
}

impl NodeType {
    /// Child fields in visitation order.
    pub fn visitor_keys(self) -> &'static [Field] {
        use Field::*;
        match self {
            NodeType::Program | NodeType::BlockStatement => &[Body],
            NodeType::ExpressionStatement => &[Expression],
            NodeType::EmptyStatement
            | NodeType::DebuggerStatement
            | NodeType::StringLiteral
            | NodeType::NumericLiteral
            | NodeType::BooleanLiteral
            | NodeType::NullLiteral
            | NodeType::ThisExpression
            | NodeType::Identifier => &[],
            NodeType::ReturnStatement | NodeType::ThrowStatement => &[Argument],
            NodeType::IfStatement | NodeType::ConditionalExpression => &[Test, Consequent, Alternate],
            NodeType::ForStatement => &[Init, Test, Update, Body],
            NodeType::ForInStatement | NodeType::ForOfStatement => &[Left, Right, Body],
            NodeType::WhileStatement => &[Test, Body],
            NodeType::DoWhileStatement => &[Body, Test],
            NodeType::BreakStatement | NodeType::ContinueStatement => &[Label],
            NodeType::TryStatement => &[Block, Handler, Finalizer],
            NodeType::CatchClause => &[Param, Body],
            NodeType::LabeledStatement => &[Label, Body],
            NodeType::VariableDeclaration => &[Declarations],
            NodeType::VariableDeclarator => &[Id, Init],
            NodeType::FunctionDeclaration | NodeType::FunctionExpression => &[Id, Params, Body],
            NodeType::ArrowFunctionExpression => &[Params, Body],
            NodeType::MemberExpression => &[Object, Property],
            NodeType::CallExpression | NodeType::NewExpression => &[Callee, Arguments],
            NodeType::BinaryExpression
            | NodeType::LogicalExpression
            | NodeType::AssignmentExpression
            | NodeType::AssignmentPattern => &[Left, Right],
            NodeType::UnaryExpression | NodeType::UpdateExpression | NodeType::RestElement => &[Argument],
            NodeType::SequenceExpression => &[Expressions],
            NodeType::ObjectExpression | NodeType::ObjectPattern => &[Properties],
            NodeType::ObjectProperty => &[Key, Value],
            NodeType::ArrayExpression | NodeType::ArrayPattern => &[Elements],
            NodeType::TypeCastExpression => &[Expression],
            NodeType::ImportDeclaration => &[Specifiers, Source],
            NodeType::ImportSpecifier => &[Local, Imported],
            NodeType::ImportDefaultSpecifier | NodeType::ImportNamespaceSpecifier => &[Local],
            NodeType::ExportNamedDeclaration => &[Declaration, Specifiers, Source],
            NodeType::ExportSpecifier => &[Local, Exported],
            NodeType::ExportDefaultDeclaration => &[Declaration],
        }
    }

    /// Fields that introduce binding identifiers, in search order.
    pub fn binding_identifier_keys(self) -> &'static [Field] {
        use Field::*;
        match self {
            NodeType::CatchClause => &[Param],
            NodeType::LabeledStatement => &[Label],
            NodeType::UnaryExpression | NodeType::UpdateExpression | NodeType::RestElement => &[Argument],
            NodeType::AssignmentExpression | NodeType::AssignmentPattern => &[Left],
            NodeType::ImportSpecifier
            | NodeType::ImportDefaultSpecifier
            | NodeType::ImportNamespaceSpecifier => &[Local],
            NodeType::ImportDeclaration => &[Specifiers],
            NodeType::ExportSpecifier => &[Exported],
            NodeType::FunctionDeclaration | NodeType::FunctionExpression => &[Id, Params],
            NodeType::ObjectProperty => &[Value],
            NodeType::ArrayPattern => &[Elements],
            NodeType::ObjectPattern => &[Properties],
            NodeType::VariableDeclaration => &[Declarations],
            NodeType::VariableDeclarator => &[Id],
            _ => &[],
        }
    }
}

/// Read view of a child field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Child<'a> {
    Node(Option<NodeId>),
    List(&'a [NodeId]),
}

/// Write view of a child field.
#[derive(Debug)]
pub enum ChildMut<'a> {
    Required(&'a mut NodeId),
    Optional(&'a mut Option<NodeId>),
    List(&'a mut Vec<NodeId>),
}

macro_rules! read_one {
    ($e:expr) => {
        Child::Node(Some(*$e))
    };
}
macro_rules! read_opt {
    ($e:expr) => {
        Child::Node(*$e)
    };
}
macro_rules! read_many {
    ($e:expr) => {
        Child::List($e.as_slice())
    };
}
macro_rules! write_one {
    ($e:expr) => {
        ChildMut::Required($e)
    };
}
macro_rules! write_opt {
    ($e:expr) => {
        ChildMut::Optional($e)
    };
}
macro_rules! write_many {
    ($e:expr) => {
        ChildMut::List($e)
    };
}

// One table drives both the read and the write accessor.
macro_rules! node_fields {
    ($kind:expr, $f:ident, $one:ident, $opt:ident, $many:ident) => {
        match $kind {
            NodeKind::Program { body, .. } if $f == Field::Body => Some($many!(body)),
            NodeKind::ExpressionStatement { expression } if $f == Field::Expression => Some($one!(expression)),
            NodeKind::BlockStatement { body } if $f == Field::Body => Some($many!(body)),
            NodeKind::ReturnStatement { argument } if $f == Field::Argument => Some($opt!(argument)),
            NodeKind::IfStatement { test, .. } if $f == Field::Test => Some($one!(test)),
            NodeKind::IfStatement { consequent, .. } if $f == Field::Consequent => Some($one!(consequent)),
            NodeKind::IfStatement { alternate, .. } if $f == Field::Alternate => Some($opt!(alternate)),
            NodeKind::ForStatement { init, .. } if $f == Field::Init => Some($opt!(init)),
            NodeKind::ForStatement { test, .. } if $f == Field::Test => Some($opt!(test)),
            NodeKind::ForStatement { update, .. } if $f == Field::Update => Some($opt!(update)),
            NodeKind::ForStatement { body, .. } if $f == Field::Body => Some($one!(body)),
            NodeKind::ForInStatement { left, .. } | NodeKind::ForOfStatement { left, .. } if $f == Field::Left => {
                Some($one!(left))
            }
            NodeKind::ForInStatement { right, .. } | NodeKind::ForOfStatement { right, .. }
                if $f == Field::Right =>
            {
                Some($one!(right))
            }
            NodeKind::ForInStatement { body, .. } | NodeKind::ForOfStatement { body, .. } if $f == Field::Body => {
                Some($one!(body))
            }
            NodeKind::WhileStatement { test, .. } | NodeKind::DoWhileStatement { test, .. } if $f == Field::Test => {
                Some($one!(test))
            }
            NodeKind::WhileStatement { body, .. } | NodeKind::DoWhileStatement { body, .. } if $f == Field::Body => {
                Some($one!(body))
            }
            NodeKind::BreakStatement { label } | NodeKind::ContinueStatement { label } if $f == Field::Label => {
                Some($opt!(label))
            }
            NodeKind::ThrowStatement { argument } if $f == Field::Argument => Some($one!(argument)),
            NodeKind::TryStatement { block, .. } if $f == Field::Block => Some($one!(block)),
            NodeKind::TryStatement { handler, .. } if $f == Field::Handler => Some($opt!(handler)),
            NodeKind::TryStatement { finalizer, .. } if $f == Field::Finalizer => Some($opt!(finalizer)),
            NodeKind::CatchClause { param, .. } if $f == Field::Param => Some($opt!(param)),
            NodeKind::CatchClause { body, .. } if $f == Field::Body => Some($one!(body)),
            NodeKind::LabeledStatement { label, .. } if $f == Field::Label => Some($one!(label)),
            NodeKind::LabeledStatement { body, .. } if $f == Field::Body => Some($one!(body)),
            NodeKind::VariableDeclaration { declarations, .. } if $f == Field::Declarations => {
                Some($many!(declarations))
            }
            NodeKind::VariableDeclarator { id, .. } if $f == Field::Id => Some($one!(id)),
            NodeKind::VariableDeclarator { init, .. } if $f == Field::Init => Some($opt!(init)),
            NodeKind::FunctionDeclaration { id, .. } | NodeKind::FunctionExpression { id, .. } if $f == Field::Id => {
                Some($opt!(id))
            }
            NodeKind::FunctionDeclaration { params, .. }
            | NodeKind::FunctionExpression { params, .. }
            | NodeKind::ArrowFunctionExpression { params, .. }
                if $f == Field::Params =>
            {
                Some($many!(params))
            }
            NodeKind::FunctionDeclaration { body, .. }
            | NodeKind::FunctionExpression { body, .. }
            | NodeKind::ArrowFunctionExpression { body, .. }
                if $f == Field::Body =>
            {
                Some($one!(body))
            }
            NodeKind::MemberExpression { object, .. } if $f == Field::Object => Some($one!(object)),
            NodeKind::MemberExpression { property, .. } if $f == Field::Property => Some($one!(property)),
            NodeKind::CallExpression { callee, .. } | NodeKind::NewExpression { callee, .. }
                if $f == Field::Callee =>
            {
                Some($one!(callee))
            }
            NodeKind::CallExpression { arguments, .. } | NodeKind::NewExpression { arguments, .. }
                if $f == Field::Arguments =>
            {
                Some($many!(arguments))
            }
            NodeKind::BinaryExpression { left, .. }
            | NodeKind::LogicalExpression { left, .. }
            | NodeKind::AssignmentExpression { left, .. }
            | NodeKind::AssignmentPattern { left, .. }
                if $f == Field::Left =>
            {
                Some($one!(left))
            }
            NodeKind::BinaryExpression { right, .. }
            | NodeKind::LogicalExpression { right, .. }
            | NodeKind::AssignmentExpression { right, .. }
            | NodeKind::AssignmentPattern { right, .. }
                if $f == Field::Right =>
            {
                Some($one!(right))
            }
            NodeKind::UnaryExpression { argument, .. }
            | NodeKind::UpdateExpression { argument, .. }
            | NodeKind::RestElement { argument }
                if $f == Field::Argument =>
            {
                Some($one!(argument))
            }
            NodeKind::ConditionalExpression { test, .. } if $f == Field::Test => Some($one!(test)),
            NodeKind::ConditionalExpression { consequent, .. } if $f == Field::Consequent => {
                Some($one!(consequent))
            }
            NodeKind::ConditionalExpression { alternate, .. } if $f == Field::Alternate => Some($one!(alternate)),
            NodeKind::SequenceExpression { expressions } if $f == Field::Expressions => Some($many!(expressions)),
            NodeKind::ObjectExpression { properties } | NodeKind::ObjectPattern { properties }
                if $f == Field::Properties =>
            {
                Some($many!(properties))
            }
            NodeKind::ObjectProperty { key, .. } if $f == Field::Key => Some($one!(key)),
            NodeKind::ObjectProperty { value, .. } if $f == Field::Value => Some($one!(value)),
            NodeKind::ArrayExpression { elements } | NodeKind::ArrayPattern { elements } if $f == Field::Elements => {
                Some($many!(elements))
            }
            NodeKind::TypeCastExpression { expression, .. } if $f == Field::Expression => Some($one!(expression)),
            NodeKind::ImportDeclaration { specifiers, .. } if $f == Field::Specifiers => Some($many!(specifiers)),
            NodeKind::ImportDeclaration { source, .. } if $f == Field::Source => Some($one!(source)),
            NodeKind::ImportSpecifier { local, .. }
            | NodeKind::ImportDefaultSpecifier { local }
            | NodeKind::ImportNamespaceSpecifier { local }
            | NodeKind::ExportSpecifier { local, .. }
                if $f == Field::Local =>
            {
                Some($one!(local))
            }
            NodeKind::ImportSpecifier { imported, .. } if $f == Field::Imported => Some($one!(imported)),
            NodeKind::ExportSpecifier { exported, .. } if $f == Field::Exported => Some($one!(exported)),
            NodeKind::ExportNamedDeclaration { declaration, .. } if $f == Field::Declaration => {
                Some($opt!(declaration))
            }
            NodeKind::ExportNamedDeclaration { specifiers, .. } if $f == Field::Specifiers => {
                Some($many!(specifiers))
            }
            NodeKind::ExportNamedDeclaration { source, .. } if $f == Field::Source => Some($opt!(source)),
            NodeKind::ExportDefaultDeclaration { declaration } if $f == Field::Declaration => {
                Some($one!(declaration))
            }
            _ => None,
        }
    };
}

impl NodeKind {
    /// Read a child field; `None` when this kind has no such field.
    pub fn child(&self, field: Field) -> Option<Child<'_>> {
        node_fields!(self, field, read_one, read_opt, read_many)
    }

    /// Mutable access to a child field.
    pub fn child_mut(&mut self, field: Field) -> Option<ChildMut<'_>> {
        node_fields!(self, field, write_one, write_opt, write_many)
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.child(field).is_some()
    }
}
