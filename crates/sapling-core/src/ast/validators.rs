//! Node-level predicates that do not need path context.

use super::{Ast, Child, Field, NodeId, NodeKind, NodeType};
use indexmap::IndexMap;
use std::collections::VecDeque;

/// Is an identifier in `field` of `parent` read as a value?
///
/// Binding positions, non-computed property names and labels are not
/// references. Assignment targets are constant violations, not references.
pub fn is_referenced(ast: &Ast, parent: NodeId, field: Field) -> bool {
    match ast.kind(parent) {
        NodeKind::MemberExpression { computed, .. } => field == Field::Object || *computed,
        NodeKind::ObjectProperty { computed, .. } => match field {
            Field::Key => *computed,
            _ => true,
        },
        NodeKind::VariableDeclarator { .. } => field == Field::Init,
        NodeKind::FunctionDeclaration { .. }
        | NodeKind::FunctionExpression { .. }
        | NodeKind::ArrowFunctionExpression { .. } => field == Field::Body,
        NodeKind::CatchClause { .. } => false,
        NodeKind::LabeledStatement { .. } | NodeKind::BreakStatement { .. } | NodeKind::ContinueStatement { .. } => {
            false
        }
        NodeKind::ImportSpecifier { .. }
        | NodeKind::ImportDefaultSpecifier { .. }
        | NodeKind::ImportNamespaceSpecifier { .. } => false,
        NodeKind::ExportSpecifier { .. } => field == Field::Local,
        NodeKind::ExportNamedDeclaration { source, .. } => source.is_none(),
        NodeKind::AssignmentExpression { .. } | NodeKind::AssignmentPattern { .. } => field == Field::Right,
        NodeKind::ArrayPattern { .. } | NodeKind::ObjectPattern { .. } | NodeKind::RestElement { .. } => false,
        _ => true,
    }
}

/// Binding identifiers introduced by a node, keyed by name.
///
/// With `duplicates` every identifier for a name is kept, otherwise the last
/// one wins. With `outer_only` function declarations contribute only their
/// name and function expressions contribute nothing.
pub fn get_binding_identifiers(
    ast: &Ast,
    node: NodeId,
    duplicates: bool,
    outer_only: bool,
) -> IndexMap<String, Vec<NodeId>> {
    let mut ids: IndexMap<String, Vec<NodeId>> = IndexMap::new();
    let mut search = VecDeque::from([node]);
    while let Some(id) = search.pop_front() {
        let kind = ast.kind(id);
        let ty = kind.node_type();
        if let NodeKind::Identifier { name, .. } = kind {
            let entry = ids.entry(name.clone()).or_default();
            if !duplicates {
                entry.clear();
            }
            entry.push(id);
            continue;
        }
        if ty.is_export_declaration() {
            if let Some(Child::Node(Some(declaration))) = kind.child(Field::Declaration) {
                if ast.node_type(declaration).is_declaration() {
                    search.push_back(declaration);
                }
            }
            continue;
        }
        if outer_only {
            match ty {
                NodeType::FunctionDeclaration => {
                    if let Some(Child::Node(Some(name))) = kind.child(Field::Id) {
                        search.push_back(name);
                    }
                    continue;
                }
                NodeType::FunctionExpression | NodeType::ArrowFunctionExpression => continue,
                _ => {}
            }
        }
        for &field in ty.binding_identifier_keys() {
            match kind.child(field) {
                Some(Child::Node(Some(child))) => search.push_back(child),
                Some(Child::List(list)) => search.extend(list.iter().copied()),
                _ => {}
            }
        }
    }
    ids
}

/// Key of a member access or property as a string, when statically known.
pub fn static_key(ast: &Ast, key: NodeId, computed: bool) -> Option<String> {
    match ast.kind(key) {
        NodeKind::Identifier { name, .. } if !computed => Some(name.clone()),
        NodeKind::StringLiteral { value } => Some(value.clone()),
        NodeKind::NumericLiteral { value } => Some(number_to_string(*value)),
        _ => None,
    }
}

/// ECMAScript `Number::toString` for the values that appear as keys.
pub fn number_to_string(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e21 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Literal or identifier nodes that can be dropped without observable effect.
pub fn is_pure_value(ast: &Ast, node: NodeId) -> bool {
    match ast.kind(node) {
        NodeKind::Identifier { .. }
        | NodeKind::StringLiteral { .. }
        | NodeKind::NumericLiteral { .. }
        | NodeKind::BooleanLiteral { .. }
        | NodeKind::NullLiteral
        | NodeKind::ThisExpression => true,
        NodeKind::UnaryExpression { operator: super::UnaryOperator::Void, argument } => {
            ast.node_type(*argument).is_literal()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::VariableKind;

    #[test]
    fn test_member_property_is_not_a_reference() {
        let mut ast = Ast::new();
        let member = ast.member_chain("a.b");
        assert!(is_referenced(&ast, member, Field::Object));
        assert!(!is_referenced(&ast, member, Field::Property));
    }

    #[test]
    fn test_binding_identifiers_of_declaration() {
        let mut ast = Ast::new();
        let a = ast.identifier("a");
        let b = ast.identifier("b");
        let pattern = ast.array_pattern(vec![a, b]);
        let declarator = ast.variable_declarator(pattern, None);
        let decl = ast.variable_declaration(VariableKind::Let, vec![declarator]);
        let ids = get_binding_identifiers(&ast, decl, false, false);
        assert_eq!(ids.keys().cloned().collect::<Vec<_>>(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_outer_only_skips_function_params() {
        let mut ast = Ast::new();
        let name = ast.identifier("f");
        let param = ast.identifier("x");
        let body = ast.block_statement(vec![]);
        let func = ast.function_declaration(Some(name), vec![param], body);
        let outer = get_binding_identifiers(&ast, func, false, true);
        assert_eq!(outer.len(), 1);
        assert!(outer.contains_key("f"));
        let all = get_binding_identifiers(&ast, func, false, false);
        assert!(all.contains_key("x"));
    }

    #[test]
    fn test_number_keys() {
        assert_eq!(number_to_string(3.0), "3");
        assert_eq!(number_to_string(1.5), "1.5");
    }
}
