/*!
# Traversal and Rule Runner Integration Tests

Rewrite rules running through the transformer against whole programs, plus
the queue and limit behaviour a rule author relies on.
*/

use std::cell::{Cell, RefCell};

use pretty_assertions::assert_eq;
use sapling_core::transform::{ConstantInliner, StrictMode};
use sapling_core::{
    Alias, Ast, Field, NodeId, NodeType, RewriteRule, Session, SessionConfig, ToSource, Transformer,
    TraverseError, TypeAnnotation, VariableKind, VisitorTable,
};

fn program(build: impl FnOnce(&mut Ast) -> Vec<NodeId>) -> Ast {
    let mut ast = Ast::new();
    let body = build(&mut ast);
    let root = ast.program(body);
    ast.set_root(root);
    ast
}

fn render(session: &Session) -> String {
    session.ast().to_source(session.ast())
}

/// Renames every call of `from` to `to` and counts what it saw.
struct RenameCalls {
    from: &'static str,
    to: &'static str,
}

impl RewriteRule for RenameCalls {
    fn name(&self) -> &'static str {
        "rename-calls"
    }

    fn description(&self) -> &'static str {
        "Renames call targets"
    }

    fn priority(&self) -> u32 {
        50
    }

    fn visitor(&self) -> VisitorTable<'_> {
        VisitorTable::new().enter(NodeType::CallExpression, move |session: &mut Session, path| {
            let callee = session.get(path, Field::Callee);
            if session.identifier_name(callee) == Some(self.from) {
                let renamed = session.ast_mut().identifier(self.to);
                session.replace_with(callee, renamed)?;
            }
            Ok(())
        })
    }
}

#[test]
fn test_rules_compose_in_priority_order() -> anyhow::Result<()> {
    // const a = 1; old(a);
    let ast = program(|ast| {
        let one = ast.numeric_literal(1.0);
        let decl = ast.declare(VariableKind::Const, "a", Some(one));
        let a = ast.identifier("a");
        let call = ast.call("old", vec![a]);
        vec![decl, ast.expression_statement(call)]
    });
    let mut session = Session::new(ast);
    let mut transformer = Transformer::new();
    transformer.add_rule(Box::new(RenameCalls { from: "old", to: "fresh" }));
    transformer.add_rule(Box::new(ConstantInliner::new()));
    transformer.add_rule(Box::new(StrictMode::new()));
    assert_eq!(transformer.rule_names(), vec!["strict-mode", "constant-inliner", "rename-calls"]);

    let summary = transformer.run(&mut session)?;
    assert_eq!(render(&session), "\"use strict\";\nconst a = 1;\nfresh(1);");
    assert_eq!(summary.rules_run, 3);
    assert_eq!(
        summary.rules_applied,
        vec!["strict-mode".to_string(), "constant-inliner".to_string(), "rename-calls".to_string()]
    );
    assert_eq!(summary.mutations, 3);
    assert!(summary.stopped.is_empty());

    // A second run finds nothing left to do.
    let again = transformer.run(&mut session)?;
    assert!(!again.changed());
    assert_eq!(transformer.stats()["strict-mode"].applications, 2);
    assert_eq!(transformer.stats()["constant-inliner"].transformations, 1);
    Ok(())
}

#[test]
fn test_alias_handlers_see_every_function() -> anyhow::Result<()> {
    // function f() {} (function () {}); () => 1;
    let ast = program(|ast| {
        let body = ast.block_statement(vec![]);
        let name = ast.identifier("f");
        let declaration = ast.function_declaration(Some(name), vec![], body);
        let body = ast.block_statement(vec![]);
        let expression = ast.function_expression(None, vec![], body);
        let one = ast.numeric_literal(1.0);
        let arrow = ast.arrow_function_expression(vec![], one);
        vec![declaration, ast.expression_statement(expression), ast.expression_statement(arrow)]
    });
    let mut session = Session::new(ast);
    let seen = RefCell::new(Vec::new());
    let exits = Cell::new(0);
    let mut table = VisitorTable::new()
        .enter_alias(Alias::Function, |s: &mut Session, p| {
            seen.borrow_mut().extend(s.node_type(p));
            Ok(())
        })
        .exit_alias(Alias::Function, |_: &mut Session, _| {
            exits.set(exits.get() + 1);
            Ok(())
        });
    session.traverse(&mut table)?;
    drop(table);
    assert_eq!(
        seen.into_inner(),
        vec![
            NodeType::FunctionDeclaration,
            NodeType::FunctionExpression,
            NodeType::ArrowFunctionExpression
        ]
    );
    assert_eq!(exits.get(), 3);
    Ok(())
}

#[test]
fn test_traverse_node_only_walks_children() -> anyhow::Result<()> {
    let ast = program(|ast| {
        let a = ast.call("a", vec![]);
        let b = ast.call("b", vec![]);
        let inner = ast.expression_statement(b);
        let block = ast.block_statement(vec![inner]);
        vec![ast.expression_statement(a), block]
    });
    let mut session = Session::new(ast);
    let root = session.root_path();
    let block = session.get_index(root, Field::Body, 1);
    let types = RefCell::new(Vec::new());
    let mut table = VisitorTable::new().enter_any(|s: &mut Session, p| {
        types.borrow_mut().extend(s.node_type(p));
        Ok(())
    });
    let outcome = session.traverse_node(block, &mut table)?;
    drop(table);
    assert_eq!(
        types.into_inner(),
        vec![NodeType::ExpressionStatement, NodeType::CallExpression, NodeType::Identifier]
    );
    assert_eq!(outcome.visited, 3);
    Ok(())
}

#[test]
fn test_endless_requeue_is_reported() {
    let ast = program(|ast| {
        let x = ast.identifier("x");
        vec![ast.expression_statement(x)]
    });
    let mut session = Session::with_config(ast, SessionConfig::default().with_max_requeues(5));
    let mut table = VisitorTable::new().enter(NodeType::Identifier, |s: &mut Session, p| {
        let again = s.ast_mut().identifier("x");
        s.replace_with(p, again)?;
        Ok(())
    });
    let result = session.traverse(&mut table);
    drop(table);
    assert!(matches!(
        result,
        Err(TraverseError::RequeueLimit { node_type: NodeType::Identifier, max_requeues: 5 })
    ));
}

#[test]
fn test_inference_inside_a_rule() -> anyhow::Result<()> {
    // var n = 1; n = n + 1; use(n); use("s" + n);
    let ast = program(|ast| {
        let one = ast.numeric_literal(1.0);
        let decl = ast.declare(VariableKind::Var, "n", Some(one));
        let n = ast.identifier("n");
        let one = ast.numeric_literal(1.0);
        let sum = ast.binary_expression(sapling_core::ast::BinaryOperator::Add, n, one);
        let target = ast.identifier("n");
        let assign = ast.assignment_expression(sapling_core::ast::AssignmentOperator::Assign, target, sum);
        let n = ast.identifier("n");
        let first = ast.call("use", vec![n]);
        let s = ast.string_literal("s");
        let n = ast.identifier("n");
        let concat = ast.binary_expression(sapling_core::ast::BinaryOperator::Add, s, n);
        let second = ast.call("use", vec![concat]);
        vec![
            decl,
            ast.expression_statement(assign),
            ast.expression_statement(first),
            ast.expression_statement(second),
        ]
    });
    let mut session = Session::new(ast);
    let argument_types = RefCell::new(Vec::new());
    let mut table = VisitorTable::new().enter(NodeType::CallExpression, |s: &mut Session, p| {
        let argument = s.get_index(p, Field::Arguments, 0);
        let annotation = s.get_type_annotation(argument);
        argument_types.borrow_mut().push(annotation);
        Ok(())
    });
    session.traverse(&mut table)?;
    drop(table);
    assert_eq!(argument_types.into_inner(), vec![TypeAnnotation::Number, TypeAnnotation::String]);
    Ok(())
}

#[test]
fn test_replaced_ancestor_skips_its_exit() -> anyhow::Result<()> {
    // a; b;  where entering `a` empties its statement
    let ast = program(|ast| {
        let a = ast.identifier("a");
        let b = ast.identifier("b");
        vec![ast.expression_statement(a), ast.expression_statement(b)]
    });
    let mut session = Session::new(ast);
    let exited = RefCell::new(Vec::new());
    let empties = Cell::new(0);
    let mut table = VisitorTable::new()
        .enter(NodeType::Identifier, |s: &mut Session, p| {
            if s.identifier_name(p) == Some("a") {
                if let Some(statement) = s.parent_path(p) {
                    let empty = s.ast_mut().empty_statement();
                    s.replace_with(statement, empty)?;
                }
            }
            Ok(())
        })
        .exit(NodeType::ExpressionStatement, |s: &mut Session, p| {
            exited.borrow_mut().extend(s.node_type(p));
            Ok(())
        })
        .enter(NodeType::EmptyStatement, |_: &mut Session, _| {
            empties.set(empties.get() + 1);
            Ok(())
        });
    session.traverse(&mut table)?;
    drop(table);
    assert_eq!(exited.into_inner(), vec![NodeType::ExpressionStatement]);
    assert_eq!(empties.get(), 1);
    assert_eq!(render(&session), ";\nb;");
    Ok(())
}
