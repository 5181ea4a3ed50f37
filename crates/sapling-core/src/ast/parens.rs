//! Parenthesization table consulted by printers.

use super::{Ast, Child, Field, NodeId, NodeKind, NodeType};

/// Which field of `parent` holds `node`, if any.
pub fn field_of(ast: &Ast, parent: NodeId, node: NodeId) -> Option<Field> {
    let kind = ast.kind(parent);
    kind.node_type().visitor_keys().iter().copied().find(|&field| match kind.child(field) {
        Some(Child::Node(Some(child))) => child == node,
        Some(Child::List(list)) => list.contains(&node),
        _ => false,
    })
}

/// Would `node` need parentheses when printed as a child of `parent`?
///
/// `stack` holds the ancestors from the outermost down to `parent`; it is
/// only consulted to decide whether `node` starts an expression statement.
pub fn needs_parens(ast: &Ast, node: NodeId, parent: Option<NodeId>, stack: &[NodeId]) -> bool {
    let Some(parent) = parent else {
        return false;
    };
    let field = field_of(ast, parent, node);
    let parent_ty = ast.node_type(parent);

    if parent_ty == NodeType::NewExpression && field == Some(Field::Callee) && has_call(ast, node) {
        return true;
    }

    match ast.kind(node) {
        NodeKind::UpdateExpression { .. } => {
            parent_ty == NodeType::MemberExpression && field == Some(Field::Object)
                || is_power_left(ast, parent, field)
        }
        NodeKind::ObjectExpression { .. } => {
            parent_ty == NodeType::ArrowFunctionExpression && field == Some(Field::Body)
                || is_first_in_statement(ast, node, stack)
        }
        NodeKind::FunctionExpression { .. } => is_first_in_statement(ast, node, stack),
        NodeKind::BinaryExpression { operator, .. } => {
            binary_needs_parens(ast, parent, field, operator.precedence(), *operator == super::BinaryOperator::Power)
        }
        NodeKind::LogicalExpression { operator, .. } => {
            binary_needs_parens(ast, parent, field, operator.precedence(), false)
        }
        NodeKind::SequenceExpression { .. } => !matches!(
            (parent_ty, field),
            (NodeType::ForStatement, _)
                | (NodeType::ThrowStatement, _)
                | (NodeType::ReturnStatement, _)
                | (NodeType::IfStatement, Some(Field::Test))
                | (NodeType::WhileStatement, Some(Field::Test))
                | (NodeType::ForInStatement, Some(Field::Right))
                | (NodeType::ExpressionStatement, Some(Field::Expression))
        ),
        NodeKind::UnaryExpression { .. } => {
            parent_ty == NodeType::MemberExpression && field == Some(Field::Object)
                || is_power_left(ast, parent, field)
        }
        NodeKind::ArrowFunctionExpression { .. } => {
            parent_ty.is_export_declaration()
                || parent_ty.is_binary()
                || parent_ty == NodeType::UnaryExpression
                || conditional_like_needs_parens(parent_ty, field)
        }
        NodeKind::ConditionalExpression { .. } => conditional_like_needs_parens(parent_ty, field),
        NodeKind::AssignmentExpression { left, .. } => {
            if ast.node_type(*left) == NodeType::ObjectPattern {
                return true;
            }
            conditional_like_needs_parens(parent_ty, field)
        }
        _ => false,
    }
}

fn binary_needs_parens(ast: &Ast, parent: NodeId, field: Option<Field>, precedence: u8, is_power: bool) -> bool {
    let parent_ty = ast.node_type(parent);
    if matches!(parent_ty, NodeType::CallExpression | NodeType::NewExpression) && field == Some(Field::Callee)
        || parent_ty == NodeType::UnaryExpression
        || parent_ty == NodeType::MemberExpression && field == Some(Field::Object)
    {
        return true;
    }
    let parent_precedence = match ast.kind(parent) {
        NodeKind::BinaryExpression { operator, .. } => operator.precedence(),
        NodeKind::LogicalExpression { operator, .. } => operator.precedence(),
        _ => return false,
    };
    if parent_precedence > precedence {
        return true;
    }
    if parent_precedence == precedence {
        // `**` is right-associative, everything else associates left.
        return if is_power { field == Some(Field::Left) } else { field == Some(Field::Right) };
    }
    false
}

fn conditional_like_needs_parens(parent_ty: NodeType, field: Option<Field>) -> bool {
    parent_ty.is_binary()
        || parent_ty == NodeType::UnaryExpression
        || parent_ty == NodeType::ConditionalExpression && field == Some(Field::Test)
        || matches!(parent_ty, NodeType::CallExpression | NodeType::NewExpression) && field == Some(Field::Callee)
        || parent_ty == NodeType::MemberExpression && field == Some(Field::Object)
}

fn is_power_left(ast: &Ast, parent: NodeId, field: Option<Field>) -> bool {
    matches!(
        ast.kind(parent),
        NodeKind::BinaryExpression { operator: super::BinaryOperator::Power, .. }
    ) && field == Some(Field::Left)
}

fn has_call(ast: &Ast, node: NodeId) -> bool {
    match ast.kind(node) {
        NodeKind::CallExpression { .. } => true,
        NodeKind::MemberExpression { object, .. } => has_call(ast, *object),
        _ => false,
    }
}

/// Does `node` sit at the very start of an expression statement?
fn is_first_in_statement(ast: &Ast, node: NodeId, stack: &[NodeId]) -> bool {
    let mut node = node;
    for &parent in stack.iter().rev() {
        let field = field_of(ast, parent, node);
        let leftmost = match ast.kind(parent) {
            NodeKind::ExpressionStatement { .. } => return field == Some(Field::Expression),
            NodeKind::CallExpression { .. } => field == Some(Field::Callee),
            NodeKind::SequenceExpression { expressions } => expressions.first() == Some(&node),
            NodeKind::MemberExpression { .. } => field == Some(Field::Object),
            NodeKind::ConditionalExpression { .. } => field == Some(Field::Test),
            NodeKind::BinaryExpression { .. }
            | NodeKind::LogicalExpression { .. }
            | NodeKind::AssignmentExpression { .. } => field == Some(Field::Left),
            _ => false,
        };
        if !leftmost {
            return false;
        }
        node = parent;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOperator, LogicalOperator, ToSource};

    #[test]
    fn test_new_callee_with_call_needs_parens() {
        let mut ast = Ast::new();
        let inner = ast.call("factory", vec![]);
        let member = {
            let prop = ast.identifier("Thing");
            ast.member_expression(inner, prop, false)
        };
        let new = ast.new_expression(member, vec![]);
        assert!(needs_parens(&ast, member, Some(new), &[new]));
    }

    #[test]
    fn test_precedence() {
        let mut ast = Ast::new();
        let a = ast.identifier("a");
        let b = ast.identifier("b");
        let c = ast.identifier("c");
        let sum = ast.binary_expression(BinaryOperator::Add, a, b);
        let product = ast.binary_expression(BinaryOperator::Multiply, sum, c);
        assert!(needs_parens(&ast, sum, Some(product), &[product]));

        let d = ast.identifier("d");
        let e = ast.identifier("e");
        let and = ast.logical_expression(LogicalOperator::And, d, e);
        let f = ast.identifier("f");
        let or = ast.logical_expression(LogicalOperator::Or, and, f);
        assert!(!needs_parens(&ast, and, Some(or), &[or]));
    }

    #[test]
    fn test_function_expression_at_statement_start() {
        let mut ast = Ast::new();
        let body = ast.block_statement(vec![]);
        let func = ast.function_expression(None, vec![], body);
        let call = ast.call_expression(func, vec![]);
        let stmt = ast.expression_statement(call);
        assert!(needs_parens(&ast, func, Some(call), &[stmt, call]));

        let arg_call = ast.call("g", vec![]);
        assert!(!needs_parens(&ast, arg_call, Some(stmt), &[stmt]));
    }

    #[test]
    fn test_sequence_in_argument_position() {
        let mut ast = Ast::new();
        let a = ast.identifier("a");
        let b = ast.identifier("b");
        let seq = ast.sequence_expression(vec![a, b]);
        let call = ast.call("f", vec![seq]);
        assert!(needs_parens(&ast, seq, Some(call), &[call]));
        let stmt = ast.expression_statement(seq);
        assert!(!needs_parens(&ast, seq, Some(stmt), &[stmt]));
    }

    #[test]
    fn test_sequence_as_arrow_body() {
        let mut ast = Ast::new();
        let a = ast.identifier("a");
        let b = ast.identifier("b");
        let seq = ast.sequence_expression(vec![a, b]);
        let param = ast.identifier("x");
        let arrow = ast.arrow_function_expression(vec![param], seq);
        assert!(needs_parens(&ast, seq, Some(arrow), &[arrow]));
        assert_eq!(arrow.to_source(&ast), "(x) => (a, b)");
    }
}
