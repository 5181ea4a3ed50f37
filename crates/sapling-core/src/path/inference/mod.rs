//! Conservative type inference over paths.
//!
//! Every answer is either a concrete annotation or `Any`; nothing here
//! fails. Results are cached on the path until its node is replaced or the
//! scope tables are cleared.

use crate::ast::{BinaryOperator, Field, NodeKind, NodeType, TypeAnnotation, UnaryOperator};
use crate::session::Session;

use super::{Key, PathId};

mod reference;

impl Session {
    /// Inferred annotation of the node at this path, `Any` when unknown.
    pub fn get_type_annotation(&mut self, path: PathId) -> TypeAnnotation {
        if let Some(cached) = &self.data(path).type_annotation {
            return cached.clone();
        }
        // An empty union stands in while inference is running so that
        // cyclic references terminate.
        self.data_mut(path).type_annotation = Some(TypeAnnotation::Union(Vec::new()));
        let annotation = self.infer_type(path).unwrap_or(TypeAnnotation::Any);
        self.data_mut(path).type_annotation = Some(annotation.clone());
        annotation
    }

    /// Uncached inference; `None` means unknown.
    pub fn infer_type(&mut self, path: PathId) -> Option<TypeAnnotation> {
        let Some(node) = self.node(path) else {
            return self.infer_missing_init(path);
        };
        let kind = self.ast.kind(node).clone();
        match kind {
            NodeKind::Identifier { type_annotation: Some(annotation), .. } => Some(annotation),
            NodeKind::Identifier { name, .. } => self.infer_reference(path, &name),
            NodeKind::VariableDeclarator { id, .. } => {
                if !self.ast.is(id, NodeType::Identifier) {
                    return None;
                }
                let init = self.get(path, Field::Init);
                Some(self.get_type_annotation(init))
            }
            NodeKind::TypeCastExpression { type_annotation, .. } => Some(type_annotation),
            NodeKind::NewExpression { callee, .. } => {
                self.ast.identifier_name(callee).map(TypeAnnotation::generic)
            }
            NodeKind::UnaryExpression { operator, .. } => Some(match operator {
                UnaryOperator::Typeof => TypeAnnotation::String,
                UnaryOperator::Void => TypeAnnotation::Void,
                UnaryOperator::Minus | UnaryOperator::Plus | UnaryOperator::BitNot => TypeAnnotation::Number,
                UnaryOperator::Not | UnaryOperator::Delete => TypeAnnotation::Boolean,
            }),
            NodeKind::BinaryExpression { operator, .. } => self.infer_binary(path, operator),
            NodeKind::LogicalExpression { .. } => self.union_of(path, &[Field::Left, Field::Right]),
            NodeKind::ConditionalExpression { .. } => self.union_of(path, &[Field::Consequent, Field::Alternate]),
            NodeKind::SequenceExpression { expressions } => {
                let last = self.get_index(path, Field::Expressions, expressions.len().checked_sub(1)?);
                Some(self.get_type_annotation(last))
            }
            NodeKind::AssignmentExpression { .. } => {
                let right = self.get(path, Field::Right);
                Some(self.get_type_annotation(right))
            }
            NodeKind::UpdateExpression { .. } => Some(TypeAnnotation::Number),
            NodeKind::StringLiteral { .. } => Some(TypeAnnotation::String),
            NodeKind::NumericLiteral { .. } => Some(TypeAnnotation::Number),
            NodeKind::BooleanLiteral { .. } => Some(TypeAnnotation::Boolean),
            NodeKind::NullLiteral => Some(TypeAnnotation::Null),
            NodeKind::ObjectExpression { .. } => Some(TypeAnnotation::generic("Object")),
            NodeKind::ArrayExpression { .. } | NodeKind::RestElement { .. } => Some(TypeAnnotation::generic("Array")),
            NodeKind::FunctionDeclaration { .. }
            | NodeKind::FunctionExpression { .. }
            | NodeKind::ArrowFunctionExpression { .. } => Some(TypeAnnotation::generic("Function")),
            NodeKind::CallExpression { .. } => {
                let callee = self.get(path, Field::Callee);
                self.infer_call(callee)
            }
            _ if self.parent_type(path) == Some(NodeType::TypeCastExpression) => {
                let parent = self.parent_path(path)?;
                Some(self.get_type_annotation(parent))
            }
            _ => None,
        }
    }

    /// A declarator without an initializer holds `undefined`, except as the
    /// head of a `for-in` (a key string) or `for-of` (anything).
    fn infer_missing_init(&self, path: PathId) -> Option<TypeAnnotation> {
        if self.key(path) != Key::Field(Field::Init) || self.parent_type(path) != Some(NodeType::VariableDeclarator) {
            return None;
        }
        let declaration = self.parent_path(path).and_then(|declarator| self.parent_path(declarator));
        let Some(declaration) = declaration else {
            return Some(TypeAnnotation::Void);
        };
        if self.key(declaration) == Key::Field(Field::Left) {
            match self.parent_type(declaration) {
                Some(NodeType::ForInStatement) => return Some(TypeAnnotation::String),
                Some(NodeType::ForOfStatement) => return Some(TypeAnnotation::Any),
                _ => {}
            }
        }
        Some(TypeAnnotation::Void)
    }

    fn infer_binary(&mut self, path: PathId, operator: BinaryOperator) -> Option<TypeAnnotation> {
        if operator.is_numeric() {
            return Some(TypeAnnotation::Number);
        }
        if operator.is_boolean() {
            return Some(TypeAnnotation::Boolean);
        }
        if operator != BinaryOperator::Add {
            return None;
        }
        let left = self.get(path, Field::Left);
        let right = self.get(path, Field::Right);
        if self.is_base_type(left, "number", false) && self.is_base_type(right, "number", false) {
            return Some(TypeAnnotation::Number);
        }
        if self.is_base_type(left, "string", false) || self.is_base_type(right, "string", false) {
            return Some(TypeAnnotation::String);
        }
        TypeAnnotation::union([TypeAnnotation::String, TypeAnnotation::Number])
    }

    fn union_of(&mut self, path: PathId, fields: &[Field]) -> Option<TypeAnnotation> {
        let types: Vec<TypeAnnotation> = fields
            .iter()
            .map(|&field| {
                let child = self.get(path, field);
                self.get_type_annotation(child)
            })
            .collect();
        TypeAnnotation::union(types)
    }

    /// Result of calling the function the callee resolves to: a promise
    /// for async functions, else the declared return type.
    fn infer_call(&mut self, callee: PathId) -> Option<TypeAnnotation> {
        let callee = self.resolve(callee, false);
        match self.kind(callee)? {
            NodeKind::FunctionDeclaration { is_async: true, is_generator, .. }
            | NodeKind::FunctionExpression { is_async: true, is_generator, .. } => Some(if *is_generator {
                TypeAnnotation::generic("AsyncIterator")
            } else {
                TypeAnnotation::generic("Promise")
            }),
            NodeKind::ArrowFunctionExpression { is_async: true, .. } => Some(TypeAnnotation::generic("Promise")),
            NodeKind::FunctionDeclaration { return_type, .. }
            | NodeKind::FunctionExpression { return_type, .. }
            | NodeKind::ArrowFunctionExpression { return_type, .. } => return_type.clone(),
            _ => None,
        }
    }

    /// Is the inferred type the named base type (`string`, `number`,
    /// `boolean`, `any`, `mixed`, `void`, `null`)? Unknown names never
    /// match; outside `soft` mode they are also logged.
    pub fn is_base_type(&mut self, path: PathId, name: &str, soft: bool) -> bool {
        if !soft && !is_known_base(name) {
            tracing::warn!(name, "unknown base type");
            return false;
        }
        self.get_type_annotation(path).is_base(name)
    }

    /// Could the value be of the named base type? `Any` could be anything
    /// and a union could be any of its members.
    pub fn could_be_base_type(&mut self, path: PathId, name: &str) -> bool {
        match self.get_type_annotation(path) {
            TypeAnnotation::Any => true,
            TypeAnnotation::Union(members) => members.iter().any(|member| member.is_base(name)),
            other => other.is_base(name),
        }
    }

    /// Do both paths infer to the same base type, `Any` excluded?
    pub fn base_type_strictly_matches(&mut self, path: PathId, other: PathId) -> bool {
        let left = self.get_type_annotation(path);
        let right = self.get_type_annotation(other);
        let is_base = matches!(
            left,
            TypeAnnotation::Mixed
                | TypeAnnotation::Number
                | TypeAnnotation::String
                | TypeAnnotation::Boolean
                | TypeAnnotation::Void
                | TypeAnnotation::Null
        );
        is_base && left == right
    }

    pub fn is_generic_type(&mut self, path: PathId, name: &str) -> bool {
        matches!(self.get_type_annotation(path), TypeAnnotation::Generic(generic) if generic == name)
    }
}

fn is_known_base(name: &str) -> bool {
    matches!(name, "string" | "number" | "boolean" | "any" | "mixed" | "void" | "null")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Ast, LogicalOperator, NodeId, VariableKind};

    fn expression_session(build: impl FnOnce(&mut Ast) -> NodeId) -> (Session, PathId) {
        let mut ast = Ast::new();
        let expression = build(&mut ast);
        let stmt = ast.expression_statement(expression);
        let program = ast.program(vec![stmt]);
        ast.set_root(program);
        let mut session = Session::new(ast);
        let root = session.root_path();
        let path = session.get_pattern(root, "body.0.expression").unwrap();
        (session, path)
    }

    #[test]
    fn test_literal_and_operator_types() {
        let (mut session, path) = expression_session(|ast| {
            let one = ast.numeric_literal(1.0);
            let two = ast.numeric_literal(2.0);
            ast.binary_expression(BinaryOperator::Add, one, two)
        });
        assert_eq!(session.get_type_annotation(path), TypeAnnotation::Number);

        let (mut session, path) = expression_session(|ast| {
            let one = ast.numeric_literal(1.0);
            let s = ast.string_literal("a");
            ast.binary_expression(BinaryOperator::Add, one, s)
        });
        assert_eq!(session.get_type_annotation(path), TypeAnnotation::String);

        let (mut session, path) = expression_session(|ast| {
            let x = ast.identifier("x");
            let one = ast.numeric_literal(1.0);
            ast.binary_expression(BinaryOperator::Add, x, one)
        });
        assert_eq!(
            session.get_type_annotation(path),
            TypeAnnotation::Union(vec![TypeAnnotation::String, TypeAnnotation::Number])
        );
        assert!(session.could_be_base_type(path, "number"));
        assert!(!session.could_be_base_type(path, "boolean"));

        let (mut session, path) = expression_session(|ast| {
            let s = ast.string_literal("a");
            let n = ast.null_literal();
            ast.logical_expression(LogicalOperator::Or, s, n)
        });
        assert_eq!(
            session.get_type_annotation(path),
            TypeAnnotation::Union(vec![TypeAnnotation::String, TypeAnnotation::Null])
        );
    }

    #[test]
    fn test_generic_types() {
        let (mut session, path) = expression_session(|ast| {
            let date = ast.identifier("Date");
            ast.new_expression(date, vec![])
        });
        assert!(session.is_generic_type(path, "Date"));

        let (mut session, path) = expression_session(|ast| ast.array_expression(vec![]));
        assert!(session.is_generic_type(path, "Array"));
        assert!(!session.is_generic_type(path, "Object"));
    }

    #[test]
    fn test_call_of_annotated_function() {
        let mut ast = Ast::new();
        let body = ast.block_statement(vec![]);
        let name = ast.identifier("f");
        let function = ast.function_declaration(Some(name), vec![], body);
        if let NodeKind::FunctionDeclaration { return_type, .. } = ast.kind_mut(function) {
            *return_type = Some(TypeAnnotation::Boolean);
        }
        let call = ast.call("f", vec![]);
        let stmt = ast.expression_statement(call);
        let program = ast.program(vec![function, stmt]);
        ast.set_root(program);
        let mut session = Session::new(ast);
        let root = session.root_path();
        let call = session.get_pattern(root, "body.1.expression").unwrap();
        assert!(session.is_base_type(call, "boolean", false));
        let f = session.get_pattern(root, "body.1.expression.callee").unwrap();
        assert!(session.is_generic_type(f, "Function"));
    }

    #[test]
    fn test_declarator_without_init_is_void() {
        let mut ast = Ast::new();
        let decl = ast.declare(VariableKind::Let, "x", None);
        let program = ast.program(vec![decl]);
        ast.set_root(program);
        let mut session = Session::new(ast);
        let root = session.root_path();
        let declarator = session.get_pattern(root, "body.0.declarations.0").unwrap();
        assert_eq!(session.get_type_annotation(declarator), TypeAnnotation::Void);
    }

    #[test]
    fn test_strict_base_match() {
        let (mut session, path) = expression_session(|ast| {
            let one = ast.numeric_literal(1.0);
            let two = ast.numeric_literal(2.0);
            ast.binary_expression(BinaryOperator::Subtract, one, two)
        });
        let left = session.get(path, Field::Left);
        let right = session.get(path, Field::Right);
        assert!(session.base_type_strictly_matches(left, right));
        assert!(session.is_base_type(path, "number", false));
        assert!(!session.is_base_type(path, "numeric", false));
    }
}
