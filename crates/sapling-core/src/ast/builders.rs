//! Node constructors on the arena.

use super::{
    AssignmentOperator, Ast, BinaryOperator, LogicalOperator, NodeId, NodeKind, TypeAnnotation,
    UnaryOperator, UpdateOperator, VariableKind,
};

impl Ast {
    pub fn program(&mut self, body: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Program { body, directives: Vec::new() })
    }

    pub fn expression_statement(&mut self, expression: NodeId) -> NodeId {
        self.alloc(NodeKind::ExpressionStatement { expression })
    }

    pub fn block_statement(&mut self, body: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::BlockStatement { body })
    }

    pub fn empty_statement(&mut self) -> NodeId {
        self.alloc(NodeKind::EmptyStatement)
    }

    pub fn return_statement(&mut self, argument: Option<NodeId>) -> NodeId {
        self.alloc(NodeKind::ReturnStatement { argument })
    }

    pub fn if_statement(&mut self, test: NodeId, consequent: NodeId, alternate: Option<NodeId>) -> NodeId {
        self.alloc(NodeKind::IfStatement { test, consequent, alternate })
    }

    pub fn for_statement(
        &mut self,
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    ) -> NodeId {
        self.alloc(NodeKind::ForStatement { init, test, update, body })
    }

    pub fn for_in_statement(&mut self, left: NodeId, right: NodeId, body: NodeId) -> NodeId {
        self.alloc(NodeKind::ForInStatement { left, right, body })
    }

    pub fn for_of_statement(&mut self, left: NodeId, right: NodeId, body: NodeId) -> NodeId {
        self.alloc(NodeKind::ForOfStatement { left, right, body })
    }

    pub fn while_statement(&mut self, test: NodeId, body: NodeId) -> NodeId {
        self.alloc(NodeKind::WhileStatement { test, body })
    }

    pub fn do_while_statement(&mut self, body: NodeId, test: NodeId) -> NodeId {
        self.alloc(NodeKind::DoWhileStatement { body, test })
    }

    pub fn break_statement(&mut self, label: Option<NodeId>) -> NodeId {
        self.alloc(NodeKind::BreakStatement { label })
    }

    pub fn throw_statement(&mut self, argument: NodeId) -> NodeId {
        self.alloc(NodeKind::ThrowStatement { argument })
    }

    pub fn try_statement(&mut self, block: NodeId, handler: Option<NodeId>, finalizer: Option<NodeId>) -> NodeId {
        self.alloc(NodeKind::TryStatement { block, handler, finalizer })
    }

    pub fn catch_clause(&mut self, param: Option<NodeId>, body: NodeId) -> NodeId {
        self.alloc(NodeKind::CatchClause { param, body })
    }

    pub fn labeled_statement(&mut self, label: NodeId, body: NodeId) -> NodeId {
        self.alloc(NodeKind::LabeledStatement { label, body })
    }

    pub fn variable_declaration(&mut self, kind: VariableKind, declarations: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::VariableDeclaration { kind, declarations })
    }

    pub fn variable_declarator(&mut self, id: NodeId, init: Option<NodeId>) -> NodeId {
        self.alloc(NodeKind::VariableDeclarator { id, init })
    }

    /// `<kind> <name> = <init>;` with a single declarator.
    pub fn declare(&mut self, kind: VariableKind, name: &str, init: Option<NodeId>) -> NodeId {
        let id = self.identifier(name);
        let declarator = self.variable_declarator(id, init);
        self.variable_declaration(kind, vec![declarator])
    }

    pub fn function_declaration(&mut self, id: Option<NodeId>, params: Vec<NodeId>, body: NodeId) -> NodeId {
        self.alloc(NodeKind::FunctionDeclaration {
            id,
            params,
            body,
            is_async: false,
            is_generator: false,
            return_type: None,
        })
    }

    pub fn function_expression(&mut self, id: Option<NodeId>, params: Vec<NodeId>, body: NodeId) -> NodeId {
        self.alloc(NodeKind::FunctionExpression {
            id,
            params,
            body,
            is_async: false,
            is_generator: false,
            return_type: None,
        })
    }

    pub fn arrow_function_expression(&mut self, params: Vec<NodeId>, body: NodeId) -> NodeId {
        self.alloc(NodeKind::ArrowFunctionExpression { params, body, is_async: false, return_type: None })
    }

    pub fn identifier(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Identifier { name: name.into(), type_annotation: None })
    }

    pub fn typed_identifier(&mut self, name: impl Into<String>, annotation: TypeAnnotation) -> NodeId {
        self.alloc(NodeKind::Identifier { name: name.into(), type_annotation: Some(annotation) })
    }

    pub fn string_literal(&mut self, value: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::StringLiteral { value: value.into() })
    }

    pub fn numeric_literal(&mut self, value: f64) -> NodeId {
        self.alloc(NodeKind::NumericLiteral { value })
    }

    pub fn boolean_literal(&mut self, value: bool) -> NodeId {
        self.alloc(NodeKind::BooleanLiteral { value })
    }

    pub fn null_literal(&mut self) -> NodeId {
        self.alloc(NodeKind::NullLiteral)
    }

    pub fn this_expression(&mut self) -> NodeId {
        self.alloc(NodeKind::ThisExpression)
    }

    /// `void 0`, the canonical `undefined`.
    pub fn undefined_node(&mut self) -> NodeId {
        let zero = self.numeric_literal(0.0);
        self.unary_expression(UnaryOperator::Void, zero)
    }

    pub fn member_expression(&mut self, object: NodeId, property: NodeId, computed: bool) -> NodeId {
        self.alloc(NodeKind::MemberExpression { object, property, computed })
    }

    /// Non-computed member chain from a dotted path such as `React.createClass`.
    pub fn member_chain(&mut self, dotted: &str) -> NodeId {
        let mut parts = dotted.split('.');
        let first = parts.next().unwrap_or_default();
        let mut object = if first == "this" { self.this_expression() } else { self.identifier(first) };
        for part in parts {
            let property = self.identifier(part);
            object = self.member_expression(object, property, false);
        }
        object
    }

    pub fn call_expression(&mut self, callee: NodeId, arguments: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::CallExpression { callee, arguments })
    }

    /// `name(args...)`
    pub fn call(&mut self, name: &str, arguments: Vec<NodeId>) -> NodeId {
        let callee = self.identifier(name);
        self.call_expression(callee, arguments)
    }

    pub fn new_expression(&mut self, callee: NodeId, arguments: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::NewExpression { callee, arguments })
    }

    pub fn binary_expression(&mut self, operator: BinaryOperator, left: NodeId, right: NodeId) -> NodeId {
        self.alloc(NodeKind::BinaryExpression { operator, left, right })
    }

    pub fn logical_expression(&mut self, operator: LogicalOperator, left: NodeId, right: NodeId) -> NodeId {
        self.alloc(NodeKind::LogicalExpression { operator, left, right })
    }

    pub fn unary_expression(&mut self, operator: UnaryOperator, argument: NodeId) -> NodeId {
        self.alloc(NodeKind::UnaryExpression { operator, argument })
    }

    pub fn update_expression(&mut self, operator: UpdateOperator, argument: NodeId, prefix: bool) -> NodeId {
        self.alloc(NodeKind::UpdateExpression { operator, argument, prefix })
    }

    pub fn assignment_expression(&mut self, operator: AssignmentOperator, left: NodeId, right: NodeId) -> NodeId {
        self.alloc(NodeKind::AssignmentExpression { operator, left, right })
    }

    pub fn conditional_expression(&mut self, test: NodeId, consequent: NodeId, alternate: NodeId) -> NodeId {
        self.alloc(NodeKind::ConditionalExpression { test, consequent, alternate })
    }

    pub fn sequence_expression(&mut self, expressions: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::SequenceExpression { expressions })
    }

    pub fn object_expression(&mut self, properties: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::ObjectExpression { properties })
    }

    pub fn object_property(&mut self, key: NodeId, value: NodeId) -> NodeId {
        self.alloc(NodeKind::ObjectProperty { key, value, computed: false, shorthand: false })
    }

    pub fn array_expression(&mut self, elements: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::ArrayExpression { elements })
    }

    pub fn type_cast_expression(&mut self, expression: NodeId, type_annotation: TypeAnnotation) -> NodeId {
        self.alloc(NodeKind::TypeCastExpression { expression, type_annotation })
    }

    pub fn assignment_pattern(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.alloc(NodeKind::AssignmentPattern { left, right })
    }

    pub fn array_pattern(&mut self, elements: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::ArrayPattern { elements })
    }

    pub fn rest_element(&mut self, argument: NodeId) -> NodeId {
        self.alloc(NodeKind::RestElement { argument })
    }

    pub fn import_declaration(&mut self, specifiers: Vec<NodeId>, source: &str) -> NodeId {
        let source = self.string_literal(source);
        self.alloc(NodeKind::ImportDeclaration { specifiers, source })
    }

    pub fn import_specifier(&mut self, local: &str, imported: &str) -> NodeId {
        let local = self.identifier(local);
        let imported = self.identifier(imported);
        self.alloc(NodeKind::ImportSpecifier { local, imported })
    }

    pub fn import_default_specifier(&mut self, local: &str) -> NodeId {
        let local = self.identifier(local);
        self.alloc(NodeKind::ImportDefaultSpecifier { local })
    }

    pub fn import_namespace_specifier(&mut self, local: &str) -> NodeId {
        let local = self.identifier(local);
        self.alloc(NodeKind::ImportNamespaceSpecifier { local })
    }

    pub fn export_named_declaration(&mut self, declaration: Option<NodeId>, specifiers: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::ExportNamedDeclaration { declaration, specifiers, source: None })
    }

    pub fn export_default_declaration(&mut self, declaration: NodeId) -> NodeId {
        self.alloc(NodeKind::ExportDefaultDeclaration { declaration })
    }
}
