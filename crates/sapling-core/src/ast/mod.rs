//! Arena node model for the ECMAScript subset the engine transforms.
//!
//! Nodes live in an [`Ast`] arena and are addressed by [`NodeId`]. Nodes carry
//! no parent pointer: positions are described by the path layer as a
//! container plus a key.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod builders;
pub mod fields;
pub mod parens;
pub mod source_gen;
pub mod types;
pub mod validators;

pub use fields::{Child, ChildMut, Field};
pub use parens::needs_parens;
pub use source_gen::ToSource;
pub use types::TypeAnnotation;

/// Index of a node in its [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Byte range of a node in the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentKind {
    Line,
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub kind: CommentKind,
    pub value: String,
}

impl Comment {
    pub fn line(value: impl Into<String>) -> Self {
        Self { kind: CommentKind::Line, value: value.into() }
    }

    pub fn block(value: impl Into<String>) -> Self {
        Self { kind: CommentKind::Block, value: value.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

impl VariableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VariableKind::Var => "var",
            VariableKind::Let => "let",
            VariableKind::Const => "const",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
    #[serde(rename = "%")]
    Modulo,
    #[serde(rename = "**")]
    Power,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = "===")]
    StrictEqual,
    #[serde(rename = "!==")]
    StrictNotEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterEqual,
    #[serde(rename = "<<")]
    ShiftLeft,
    #[serde(rename = ">>")]
    ShiftRight,
    #[serde(rename = ">>>")]
    UnsignedShiftRight,
    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "|")]
    BitOr,
    #[serde(rename = "^")]
    BitXor,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "instanceof")]
    InstanceOf,
}

impl BinaryOperator {
    pub fn as_str(self) -> &'static str {
        use BinaryOperator::*;
        match self {
            Add => "+",
            Subtract => "-",
            Multiply => "*",
            Divide => "/",
            Modulo => "%",
            Power => "**",
            Equal => "==",
            NotEqual => "!=",
            StrictEqual => "===",
            StrictNotEqual => "!==",
            LessThan => "<",
            LessEqual => "<=",
            GreaterThan => ">",
            GreaterEqual => ">=",
            ShiftLeft => "<<",
            ShiftRight => ">>",
            UnsignedShiftRight => ">>>",
            BitAnd => "&",
            BitOr => "|",
            BitXor => "^",
            In => "in",
            InstanceOf => "instanceof",
        }
    }

    /// Operators that always produce a number.
    pub fn is_numeric(self) -> bool {
        use BinaryOperator::*;
        matches!(
            self,
            Subtract
                | Divide
                | Modulo
                | Multiply
                | Power
                | BitAnd
                | BitOr
                | ShiftRight
                | UnsignedShiftRight
                | ShiftLeft
                | BitXor
        )
    }

    /// Relational operators that coerce both operands to numbers.
    pub fn is_numeric_comparison(self) -> bool {
        use BinaryOperator::*;
        matches!(self, GreaterThan | LessThan | GreaterEqual | LessEqual)
    }

    /// Operators that always produce a boolean.
    pub fn is_boolean(self) -> bool {
        use BinaryOperator::*;
        matches!(self, Equal | StrictEqual | NotEqual | StrictNotEqual | In | InstanceOf)
            || self.is_numeric_comparison()
    }

    pub fn precedence(self) -> u8 {
        use BinaryOperator::*;
        match self {
            BitOr => 3,
            BitXor => 4,
            BitAnd => 5,
            Equal | NotEqual | StrictEqual | StrictNotEqual => 6,
            LessThan | LessEqual | GreaterThan | GreaterEqual | In | InstanceOf => 7,
            ShiftLeft | ShiftRight | UnsignedShiftRight => 8,
            Add | Subtract => 9,
            Multiply | Divide | Modulo => 10,
            Power => 11,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

impl LogicalOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOperator::And => "&&",
            LogicalOperator::Or => "||",
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            LogicalOperator::Or => 1,
            LogicalOperator::And => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "~")]
    BitNot,
    #[serde(rename = "typeof")]
    Typeof,
    #[serde(rename = "void")]
    Void,
    #[serde(rename = "delete")]
    Delete,
}

impl UnaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOperator::Minus => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::Not => "!",
            UnaryOperator::BitNot => "~",
            UnaryOperator::Typeof => "typeof",
            UnaryOperator::Void => "void",
            UnaryOperator::Delete => "delete",
        }
    }

    pub fn is_keyword(self) -> bool {
        matches!(self, UnaryOperator::Typeof | UnaryOperator::Void | UnaryOperator::Delete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateOperator {
    #[serde(rename = "++")]
    Increment,
    #[serde(rename = "--")]
    Decrement,
}

impl UpdateOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateOperator::Increment => "++",
            UpdateOperator::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignmentOperator {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    AddAssign,
    #[serde(rename = "-=")]
    SubtractAssign,
    #[serde(rename = "*=")]
    MultiplyAssign,
    #[serde(rename = "/=")]
    DivideAssign,
    #[serde(rename = "%=")]
    ModuloAssign,
}

impl AssignmentOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentOperator::Assign => "=",
            AssignmentOperator::AddAssign => "+=",
            AssignmentOperator::SubtractAssign => "-=",
            AssignmentOperator::MultiplyAssign => "*=",
            AssignmentOperator::DivideAssign => "/=",
            AssignmentOperator::ModuloAssign => "%=",
        }
    }
}

/// Kind-specific payload of a node.
///
/// Child fields are `NodeId` (required), `Option<NodeId>` (optional) or
/// `Vec<NodeId>` (ordered list). Everything else is scalar data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    // Program and statements
    Program {
        body: Vec<NodeId>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        directives: Vec<String>,
    },
    ExpressionStatement {
        expression: NodeId,
    },
    BlockStatement {
        body: Vec<NodeId>,
    },
    EmptyStatement,
    DebuggerStatement,
    ReturnStatement {
        argument: Option<NodeId>,
    },
    IfStatement {
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    },
    ForStatement {
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    ForInStatement {
        left: NodeId,
        right: NodeId,
        body: NodeId,
    },
    ForOfStatement {
        left: NodeId,
        right: NodeId,
        body: NodeId,
    },
    WhileStatement {
        test: NodeId,
        body: NodeId,
    },
    DoWhileStatement {
        body: NodeId,
        test: NodeId,
    },
    BreakStatement {
        label: Option<NodeId>,
    },
    ContinueStatement {
        label: Option<NodeId>,
    },
    ThrowStatement {
        argument: NodeId,
    },
    TryStatement {
        block: NodeId,
        handler: Option<NodeId>,
        finalizer: Option<NodeId>,
    },
    CatchClause {
        param: Option<NodeId>,
        body: NodeId,
    },
    LabeledStatement {
        label: NodeId,
        body: NodeId,
    },

    // Declarations
    VariableDeclaration {
        kind: VariableKind,
        declarations: Vec<NodeId>,
    },
    VariableDeclarator {
        id: NodeId,
        init: Option<NodeId>,
    },
    FunctionDeclaration {
        id: Option<NodeId>,
        params: Vec<NodeId>,
        body: NodeId,
        #[serde(default)]
        is_async: bool,
        #[serde(default)]
        is_generator: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        return_type: Option<TypeAnnotation>,
    },

    // Expressions
    FunctionExpression {
        id: Option<NodeId>,
        params: Vec<NodeId>,
        body: NodeId,
        #[serde(default)]
        is_async: bool,
        #[serde(default)]
        is_generator: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        return_type: Option<TypeAnnotation>,
    },
    ArrowFunctionExpression {
        params: Vec<NodeId>,
        body: NodeId,
        #[serde(default)]
        is_async: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        return_type: Option<TypeAnnotation>,
    },
    Identifier {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        type_annotation: Option<TypeAnnotation>,
    },
    StringLiteral {
        value: String,
    },
    NumericLiteral {
        value: f64,
    },
    BooleanLiteral {
        value: bool,
    },
    NullLiteral,
    ThisExpression,
    MemberExpression {
        object: NodeId,
        property: NodeId,
        #[serde(default)]
        computed: bool,
    },
    CallExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    NewExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    BinaryExpression {
        operator: BinaryOperator,
        left: NodeId,
        right: NodeId,
    },
    LogicalExpression {
        operator: LogicalOperator,
        left: NodeId,
        right: NodeId,
    },
    UnaryExpression {
        operator: UnaryOperator,
        argument: NodeId,
    },
    UpdateExpression {
        operator: UpdateOperator,
        argument: NodeId,
        #[serde(default)]
        prefix: bool,
    },
    AssignmentExpression {
        operator: AssignmentOperator,
        left: NodeId,
        right: NodeId,
    },
    ConditionalExpression {
        test: NodeId,
        consequent: NodeId,
        alternate: NodeId,
    },
    SequenceExpression {
        expressions: Vec<NodeId>,
    },
    ObjectExpression {
        properties: Vec<NodeId>,
    },
    ObjectProperty {
        key: NodeId,
        value: NodeId,
        #[serde(default)]
        computed: bool,
        #[serde(default)]
        shorthand: bool,
    },
    ArrayExpression {
        elements: Vec<NodeId>,
    },
    TypeCastExpression {
        expression: NodeId,
        type_annotation: TypeAnnotation,
    },

    // Patterns
    AssignmentPattern {
        left: NodeId,
        right: NodeId,
    },
    ArrayPattern {
        elements: Vec<NodeId>,
    },
    ObjectPattern {
        properties: Vec<NodeId>,
    },
    RestElement {
        argument: NodeId,
    },

    // Modules
    ImportDeclaration {
        specifiers: Vec<NodeId>,
        source: NodeId,
    },
    ImportSpecifier {
        local: NodeId,
        imported: NodeId,
    },
    ImportDefaultSpecifier {
        local: NodeId,
    },
    ImportNamespaceSpecifier {
        local: NodeId,
    },
    ExportNamedDeclaration {
        declaration: Option<NodeId>,
        specifiers: Vec<NodeId>,
        source: Option<NodeId>,
    },
    ExportSpecifier {
        local: NodeId,
        exported: NodeId,
    },
    ExportDefaultDeclaration {
        declaration: NodeId,
    },
}

/// Fieldless tag of a [`NodeKind`], used as the key of dispatch tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    Program,
    ExpressionStatement,
    BlockStatement,
    EmptyStatement,
    DebuggerStatement,
    ReturnStatement,
    IfStatement,
    ForStatement,
    ForInStatement,
    ForOfStatement,
    WhileStatement,
    DoWhileStatement,
    BreakStatement,
    ContinueStatement,
    ThrowStatement,
    TryStatement,
    CatchClause,
    LabeledStatement,
    VariableDeclaration,
    VariableDeclarator,
    FunctionDeclaration,
    FunctionExpression,
    ArrowFunctionExpression,
    Identifier,
    StringLiteral,
    NumericLiteral,
    BooleanLiteral,
    NullLiteral,
    ThisExpression,
    MemberExpression,
    CallExpression,
    NewExpression,
    BinaryExpression,
    LogicalExpression,
    UnaryExpression,
    UpdateExpression,
    AssignmentExpression,
    ConditionalExpression,
    SequenceExpression,
    ObjectExpression,
    ObjectProperty,
    ArrayExpression,
    TypeCastExpression,
    AssignmentPattern,
    ArrayPattern,
    ObjectPattern,
    RestElement,
    ImportDeclaration,
    ImportSpecifier,
    ImportDefaultSpecifier,
    ImportNamespaceSpecifier,
    ExportNamedDeclaration,
    ExportSpecifier,
    ExportDefaultDeclaration,
}

impl NodeType {
    pub const ALL: [NodeType; 54] = [
        NodeType::Program,
        NodeType::ExpressionStatement,
        NodeType::BlockStatement,
        NodeType::EmptyStatement,
        NodeType::DebuggerStatement,
        NodeType::ReturnStatement,
        NodeType::IfStatement,
        NodeType::ForStatement,
        NodeType::ForInStatement,
        NodeType::ForOfStatement,
        NodeType::WhileStatement,
        NodeType::DoWhileStatement,
        NodeType::BreakStatement,
        NodeType::ContinueStatement,
        NodeType::ThrowStatement,
        NodeType::TryStatement,
        NodeType::CatchClause,
        NodeType::LabeledStatement,
        NodeType::VariableDeclaration,
        NodeType::VariableDeclarator,
        NodeType::FunctionDeclaration,
        NodeType::FunctionExpression,
        NodeType::ArrowFunctionExpression,
        NodeType::Identifier,
        NodeType::StringLiteral,
        NodeType::NumericLiteral,
        NodeType::BooleanLiteral,
        NodeType::NullLiteral,
        NodeType::ThisExpression,
        NodeType::MemberExpression,
        NodeType::CallExpression,
        NodeType::NewExpression,
        NodeType::BinaryExpression,
        NodeType::LogicalExpression,
        NodeType::UnaryExpression,
        NodeType::UpdateExpression,
        NodeType::AssignmentExpression,
        NodeType::ConditionalExpression,
        NodeType::SequenceExpression,
        NodeType::ObjectExpression,
        NodeType::ObjectProperty,
        NodeType::ArrayExpression,
        NodeType::TypeCastExpression,
        NodeType::AssignmentPattern,
        NodeType::ArrayPattern,
        NodeType::ObjectPattern,
        NodeType::RestElement,
        NodeType::ImportDeclaration,
        NodeType::ImportSpecifier,
        NodeType::ImportDefaultSpecifier,
        NodeType::ImportNamespaceSpecifier,
        NodeType::ExportNamedDeclaration,
        NodeType::ExportSpecifier,
        NodeType::ExportDefaultDeclaration,
    ];

    pub fn is_statement(self) -> bool {
        use NodeType::*;
        matches!(
            self,
            ExpressionStatement
                | BlockStatement
                | EmptyStatement
                | DebuggerStatement
                | ReturnStatement
                | IfStatement
                | ForStatement
                | ForInStatement
                | ForOfStatement
                | WhileStatement
                | DoWhileStatement
                | BreakStatement
                | ContinueStatement
                | ThrowStatement
                | TryStatement
                | LabeledStatement
                | VariableDeclaration
                | FunctionDeclaration
                | ImportDeclaration
                | ExportNamedDeclaration
                | ExportDefaultDeclaration
        )
    }

    pub fn is_expression(self) -> bool {
        use NodeType::*;
        matches!(
            self,
            FunctionExpression
                | ArrowFunctionExpression
                | Identifier
                | StringLiteral
                | NumericLiteral
                | BooleanLiteral
                | NullLiteral
                | ThisExpression
                | MemberExpression
                | CallExpression
                | NewExpression
                | BinaryExpression
                | LogicalExpression
                | UnaryExpression
                | UpdateExpression
                | AssignmentExpression
                | ConditionalExpression
                | SequenceExpression
                | ObjectExpression
                | ArrayExpression
                | TypeCastExpression
        )
    }

    pub fn is_function(self) -> bool {
        matches!(
            self,
            NodeType::FunctionDeclaration | NodeType::FunctionExpression | NodeType::ArrowFunctionExpression
        )
    }

    pub fn is_for(self) -> bool {
        matches!(self, NodeType::ForStatement | NodeType::ForInStatement | NodeType::ForOfStatement)
    }

    pub fn is_while(self) -> bool {
        matches!(self, NodeType::WhileStatement | NodeType::DoWhileStatement)
    }

    pub fn is_loop(self) -> bool {
        self.is_for() || self.is_while()
    }

    pub fn is_scopable(self) -> bool {
        self.is_function()
            || self.is_for()
            || matches!(self, NodeType::Program | NodeType::BlockStatement | NodeType::CatchClause)
    }

    pub fn is_declaration(self) -> bool {
        use NodeType::*;
        matches!(
            self,
            VariableDeclaration
                | FunctionDeclaration
                | ImportDeclaration
                | ExportNamedDeclaration
                | ExportDefaultDeclaration
        )
    }

    pub fn is_literal(self) -> bool {
        use NodeType::*;
        matches!(self, StringLiteral | NumericLiteral | BooleanLiteral | NullLiteral)
    }

    pub fn is_pattern(self) -> bool {
        use NodeType::*;
        matches!(self, AssignmentPattern | ArrayPattern | ObjectPattern | RestElement)
    }

    pub fn is_export_declaration(self) -> bool {
        matches!(self, NodeType::ExportNamedDeclaration | NodeType::ExportDefaultDeclaration)
    }

    pub fn is_module_specifier(self) -> bool {
        use NodeType::*;
        matches!(
            self,
            ImportSpecifier | ImportDefaultSpecifier | ImportNamespaceSpecifier | ExportSpecifier
        )
    }

    pub fn is_binary(self) -> bool {
        matches!(self, NodeType::BinaryExpression | NodeType::LogicalExpression)
    }

    pub fn is_alias(self, alias: Alias) -> bool {
        match alias {
            Alias::Statement => self.is_statement(),
            Alias::Expression => self.is_expression(),
            Alias::Function => self.is_function(),
            Alias::Loop => self.is_loop(),
            Alias::For => self.is_for(),
            Alias::While => self.is_while(),
            Alias::Scopable => self.is_scopable(),
            Alias::Declaration => self.is_declaration(),
            Alias::Literal => self.is_literal(),
            Alias::Pattern => self.is_pattern(),
            Alias::ExportDeclaration => self.is_export_declaration(),
            Alias::ModuleSpecifier => self.is_module_specifier(),
            Alias::Binary => self.is_binary(),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Named groups of node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alias {
    Statement,
    Expression,
    Function,
    Loop,
    For,
    While,
    Scopable,
    Declaration,
    Literal,
    Pattern,
    ExportDeclaration,
    ModuleSpecifier,
    Binary,
}

impl Alias {
    /// Every node type belonging to this alias.
    pub fn members(self) -> impl Iterator<Item = NodeType> {
        NodeType::ALL.into_iter().filter(move |ty| ty.is_alias(self))
    }
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Program { .. } => NodeType::Program,
            NodeKind::ExpressionStatement { .. } => NodeType::ExpressionStatement,
            NodeKind::BlockStatement { .. } => NodeType::BlockStatement,
            NodeKind::EmptyStatement => NodeType::EmptyStatement,
            NodeKind::DebuggerStatement => NodeType::DebuggerStatement,
            NodeKind::ReturnStatement { .. } => NodeType::ReturnStatement,
            NodeKind::IfStatement { .. } => NodeType::IfStatement,
            NodeKind::ForStatement { .. } => NodeType::ForStatement,
            NodeKind::ForInStatement { .. } => NodeType::ForInStatement,
            NodeKind::ForOfStatement { .. } => NodeType::ForOfStatement,
            NodeKind::WhileStatement { .. } => NodeType::WhileStatement,
            NodeKind::DoWhileStatement { .. } => NodeType::DoWhileStatement,
            NodeKind::BreakStatement { .. } => NodeType::BreakStatement,
            NodeKind::ContinueStatement { .. } => NodeType::ContinueStatement,
            NodeKind::ThrowStatement { .. } => NodeType::ThrowStatement,
            NodeKind::TryStatement { .. } => NodeType::TryStatement,
            NodeKind::CatchClause { .. } => NodeType::CatchClause,
            NodeKind::LabeledStatement { .. } => NodeType::LabeledStatement,
            NodeKind::VariableDeclaration { .. } => NodeType::VariableDeclaration,
            NodeKind::VariableDeclarator { .. } => NodeType::VariableDeclarator,
            NodeKind::FunctionDeclaration { .. } => NodeType::FunctionDeclaration,
            NodeKind::FunctionExpression { .. } => NodeType::FunctionExpression,
            NodeKind::ArrowFunctionExpression { .. } => NodeType::ArrowFunctionExpression,
            NodeKind::Identifier { .. } => NodeType::Identifier,
            NodeKind::StringLiteral { .. } => NodeType::StringLiteral,
            NodeKind::NumericLiteral { .. } => NodeType::NumericLiteral,
            NodeKind::BooleanLiteral { .. } => NodeType::BooleanLiteral,
            NodeKind::NullLiteral => NodeType::NullLiteral,
            NodeKind::ThisExpression => NodeType::ThisExpression,
            NodeKind::MemberExpression { .. } => NodeType::MemberExpression,
            NodeKind::CallExpression { .. } => NodeType::CallExpression,
            NodeKind::NewExpression { .. } => NodeType::NewExpression,
            NodeKind::BinaryExpression { .. } => NodeType::BinaryExpression,
            NodeKind::LogicalExpression { .. } => NodeType::LogicalExpression,
            NodeKind::UnaryExpression { .. } => NodeType::UnaryExpression,
            NodeKind::UpdateExpression { .. } => NodeType::UpdateExpression,
            NodeKind::AssignmentExpression { .. } => NodeType::AssignmentExpression,
            NodeKind::ConditionalExpression { .. } => NodeType::ConditionalExpression,
            NodeKind::SequenceExpression { .. } => NodeType::SequenceExpression,
            NodeKind::ObjectExpression { .. } => NodeType::ObjectExpression,
            NodeKind::ObjectProperty { .. } => NodeType::ObjectProperty,
            NodeKind::ArrayExpression { .. } => NodeType::ArrayExpression,
            NodeKind::TypeCastExpression { .. } => NodeType::TypeCastExpression,
            NodeKind::AssignmentPattern { .. } => NodeType::AssignmentPattern,
            NodeKind::ArrayPattern { .. } => NodeType::ArrayPattern,
            NodeKind::ObjectPattern { .. } => NodeType::ObjectPattern,
            NodeKind::RestElement { .. } => NodeType::RestElement,
            NodeKind::ImportDeclaration { .. } => NodeType::ImportDeclaration,
            NodeKind::ImportSpecifier { .. } => NodeType::ImportSpecifier,
            NodeKind::ImportDefaultSpecifier { .. } => NodeType::ImportDefaultSpecifier,
            NodeKind::ImportNamespaceSpecifier { .. } => NodeType::ImportNamespaceSpecifier,
            NodeKind::ExportNamedDeclaration { .. } => NodeType::ExportNamedDeclaration,
            NodeKind::ExportSpecifier { .. } => NodeType::ExportSpecifier,
            NodeKind::ExportDefaultDeclaration { .. } => NodeType::ExportDefaultDeclaration,
        }
    }

    /// Name carried by an `Identifier`.
    pub fn identifier_name(&self) -> Option<&str> {
        match self {
            NodeKind::Identifier { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// A node in the arena: kind payload plus attached comments and span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub leading_comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trailing_comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inner_comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            leading_comments: Vec::new(),
            trailing_comments: Vec::new(),
            inner_comments: Vec::new(),
            span: None,
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }
}

/// Node arena for one program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ast {
    nodes: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    root: Option<NodeId>,
    /// Original source text, when the producer kept it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(source: impl Into<String>) -> Self {
        Self { source: Some(source.into()), ..Self::default() }
    }

    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.alloc_node(Node::new(kind))
    }

    pub fn alloc_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Panics when `id` was not allocated by this arena.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.node_mut(id).kind
    }

    pub fn node_type(&self, id: NodeId) -> NodeType {
        self.node(id).node_type()
    }

    pub fn is(&self, id: NodeId, ty: NodeType) -> bool {
        self.node_type(id) == ty
    }

    pub fn identifier_name(&self, id: NodeId) -> Option<&str> {
        self.kind(id).identifier_name()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }

    /// Source text covered by a node's span.
    pub fn source_of(&self, id: NodeId) -> Option<&str> {
        let span = self.node(id).span?;
        self.source.as_deref()?.get(span.start..span.end)
    }

    /// Direct children in visitation order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let kind = self.kind(id);
        let mut out = Vec::new();
        for &field in kind.node_type().visitor_keys() {
            match kind.child(field) {
                Some(Child::Node(Some(child))) => out.push(child),
                Some(Child::List(list)) => out.extend_from_slice(list),
                _ => {}
            }
        }
        out
    }

    /// Copy a subtree into fresh arena slots, returning the new root.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let mut node = self.node(id).clone();
        let ty = node.node_type();
        for &field in ty.visitor_keys() {
            match node.kind.child(field) {
                Some(Child::Node(Some(child))) => {
                    let copy = self.deep_clone(child);
                    match node.kind.child_mut(field) {
                        Some(ChildMut::Required(slot)) => *slot = copy,
                        Some(ChildMut::Optional(slot)) => *slot = Some(copy),
                        _ => {}
                    }
                }
                Some(Child::List(list)) => {
                    let list = list.to_vec();
                    let copies: Vec<NodeId> = list.into_iter().map(|child| self.deep_clone(child)).collect();
                    if let Some(ChildMut::List(slot)) = node.kind.child_mut(field) {
                        *slot = copies;
                    }
                }
                _ => {}
            }
        }
        self.alloc_node(node)
    }

    /// Is `descendant` inside the subtree rooted at `ancestor` (inclusive).
    pub fn subtree_contains(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        if ancestor == descendant {
            return true;
        }
        self.children(ancestor)
            .into_iter()
            .any(|child| self.subtree_contains(child, descendant))
    }

    pub fn add_comment(&mut self, id: NodeId, leading: bool, comment: Comment) {
        let node = self.node_mut(id);
        if leading {
            node.leading_comments.push(comment);
        } else {
            node.trailing_comments.push(comment);
        }
    }

    pub fn inherit_leading_comments(&mut self, child: NodeId, parent: NodeId) {
        let comments = self.node(parent).leading_comments.clone();
        self.node_mut(child).leading_comments.extend(comments);
    }

    pub fn inherit_trailing_comments(&mut self, child: NodeId, parent: NodeId) {
        let comments = self.node(parent).trailing_comments.clone();
        self.node_mut(child).trailing_comments.extend(comments);
    }

    pub fn inherit_inner_comments(&mut self, child: NodeId, parent: NodeId) {
        let comments = self.node(parent).inner_comments.clone();
        self.node_mut(child).inner_comments.extend(comments);
    }

    pub fn inherits_comments(&mut self, child: NodeId, parent: NodeId) {
        self.inherit_leading_comments(child, parent);
        self.inherit_trailing_comments(child, parent);
        self.inherit_inner_comments(child, parent);
    }

    pub fn remove_comments(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        node.leading_comments.clear();
        node.trailing_comments.clear();
        node.inner_comments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_membership() {
        assert!(NodeType::ForOfStatement.is_alias(Alias::Loop));
        assert!(NodeType::DoWhileStatement.is_alias(Alias::While));
        assert!(!NodeType::Program.is_statement());
        assert!(NodeType::BlockStatement.is_scopable());
        let functions: Vec<_> = Alias::Function.members().collect();
        assert_eq!(
            functions,
            vec![
                NodeType::FunctionDeclaration,
                NodeType::FunctionExpression,
                NodeType::ArrowFunctionExpression
            ]
        );
    }

    #[test]
    fn test_every_type_is_listed_once() {
        let mut all = NodeType::ALL.to_vec();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), NodeType::ALL.len());
    }

    #[test]
    fn test_deep_clone_copies_subtree() {
        let mut ast = Ast::new();
        let a = ast.identifier("a");
        let one = ast.numeric_literal(1.0);
        let sum = ast.binary_expression(BinaryOperator::Add, a, one);
        let copy = ast.deep_clone(sum);
        assert_ne!(copy, sum);
        assert_eq!(ast.kind(copy).node_type(), NodeType::BinaryExpression);
        let children = ast.children(copy);
        assert_eq!(children.len(), 2);
        assert!(!children.contains(&a));
        assert_eq!(ast.identifier_name(children[0]), Some("a"));
    }

    #[test]
    fn test_json_round_trip_keeps_tags() {
        let mut ast = Ast::new();
        let x = ast.identifier("x");
        let stmt = ast.expression_statement(x);
        let program = ast.program(vec![stmt]);
        ast.set_root(program);

        let json = serde_json::to_string(&ast).unwrap();
        assert!(json.contains("\"type\":\"ExpressionStatement\""));
        let back: Ast = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ast);
    }

    #[test]
    fn test_comment_inheritance() {
        let mut ast = Ast::new();
        let old = ast.identifier("old");
        let new = ast.identifier("new");
        ast.add_comment(old, true, Comment::line(" keep me"));
        ast.inherits_comments(new, old);
        ast.remove_comments(old);
        assert_eq!(ast.node(new).leading_comments.len(), 1);
        assert!(ast.node(old).leading_comments.is_empty());
    }
}
