/*!
# Path Scenario Tests

End-to-end checks of navigation, replacement and scope bookkeeping on
small programs, driven through traversals the way a rewrite rule would.
*/

use std::cell::RefCell;
use std::collections::HashSet;

use pretty_assertions::assert_eq;
use sapling_core::ast::{AssignmentOperator, BinaryOperator, LogicalOperator, UpdateOperator};
use sapling_core::{
    Ast, BindingKind, ExecutionStatus, Field, Key, NodeId, NodeType, Session, ToSource, TypeAnnotation, VariableKind,
    VisitorTable,
};

fn program(build: impl FnOnce(&mut Ast) -> Vec<NodeId>) -> Session {
    let mut ast = Ast::new();
    let body = build(&mut ast);
    let root = ast.program(body);
    ast.set_root(root);
    Session::new(ast)
}

fn render(session: &Session) -> String {
    session.ast().to_source(session.ast())
}

fn call_statement(ast: &mut Ast, name: &str) -> NodeId {
    let call = ast.call(name, vec![]);
    ast.expression_statement(call)
}

/// function outer(a) { if (a && a > 0) { return a + 1; } else { log(a); } }
/// for (var i = 0; i < 3; i++) { outer(i); }
fn nested_program() -> Session {
    program(|ast| {
        let a = ast.identifier("a");
        let a2 = ast.identifier("a");
        let zero = ast.numeric_literal(0.0);
        let positive = ast.binary_expression(BinaryOperator::GreaterThan, a2, zero);
        let test = ast.logical_expression(LogicalOperator::And, a, positive);
        let a3 = ast.identifier("a");
        let one = ast.numeric_literal(1.0);
        let sum = ast.binary_expression(BinaryOperator::Add, a3, one);
        let ret = ast.return_statement(Some(sum));
        let consequent = ast.block_statement(vec![ret]);
        let a4 = ast.identifier("a");
        let log = ast.call("log", vec![a4]);
        let log = ast.expression_statement(log);
        let alternate = ast.block_statement(vec![log]);
        let branch = ast.if_statement(test, consequent, Some(alternate));
        let body = ast.block_statement(vec![branch]);
        let name = ast.identifier("outer");
        let param = ast.identifier("a");
        let outer = ast.function_declaration(Some(name), vec![param], body);

        let zero = ast.numeric_literal(0.0);
        let init = ast.declare(VariableKind::Var, "i", Some(zero));
        let i = ast.identifier("i");
        let three = ast.numeric_literal(3.0);
        let test = ast.binary_expression(BinaryOperator::LessThan, i, three);
        let i = ast.identifier("i");
        let update = ast.update_expression(UpdateOperator::Increment, i, false);
        let i = ast.identifier("i");
        let call = ast.call("outer", vec![i]);
        let call = ast.expression_statement(call);
        let body = ast.block_statement(vec![call]);
        let lp = ast.for_statement(Some(init), Some(test), Some(update), body);
        vec![outer, lp]
    })
}

#[test]
fn test_every_visited_path_ascends_to_the_root() -> anyhow::Result<()> {
    let mut session = nested_program();
    let root = session.root_path();
    let ancestries = RefCell::new(Vec::new());
    let mut table = VisitorTable::new().enter_any(|s: &mut Session, p| {
        let ancestry = s.get_ancestry(p);
        ancestries.borrow_mut().push((p, ancestry));
        Ok(())
    });
    let outcome = session.traverse(&mut table)?;
    drop(table);

    let ancestries = ancestries.into_inner();
    assert_eq!(ancestries.len(), outcome.visited);
    for (path, ancestry) in ancestries {
        assert_eq!(ancestry.first(), Some(&path));
        assert_eq!(ancestry.last(), Some(&root));
        let distinct: HashSet<_> = ancestry.iter().collect();
        assert_eq!(distinct.len(), ancestry.len());
        assert_eq!(session.get_program_parent(path), Some(root));
    }
    Ok(())
}

#[test]
fn test_function_parent_and_statement_parent_from_a_traversal() -> anyhow::Result<()> {
    let mut session = nested_program();
    let root = session.root_path();
    let outer = session.get_index(root, Field::Body, 0);
    let found = RefCell::new(Vec::new());
    let mut table = VisitorTable::new().enter(NodeType::ReturnStatement, |s: &mut Session, p| {
        let argument = s.get(p, Field::Argument);
        let statement = s.get_statement_parent(argument)?;
        found.borrow_mut().push((s.get_function_parent(p), statement == p));
        Ok(())
    });
    session.traverse(&mut table)?;
    drop(table);
    assert_eq!(found.into_inner(), vec![(Some(outer), true)]);
    Ok(())
}

#[test]
fn test_siblings_partition_and_run_in_order() -> anyhow::Result<()> {
    let mut session = program(|ast| ["a", "b", "c", "d"].iter().map(|name| call_statement(ast, name)).collect());
    let root = session.root_path();
    let all = session.get_list(root, Field::Body);

    for (index, &path) in all.iter().enumerate() {
        let mut prev = session.get_all_prev_siblings(path);
        prev.reverse();
        let next = session.get_all_next_siblings(path);
        assert_eq!(prev.len(), index);
        let mut union = prev;
        union.push(path);
        union.extend(next);
        assert_eq!(union, all);
    }

    for (i, &earlier) in all.iter().enumerate() {
        for &later in &all[i + 1..] {
            assert_eq!(session.guess_execution_status_relative_to(earlier, later), ExecutionStatus::Before);
            assert_eq!(session.guess_execution_status_relative_to(later, earlier), ExecutionStatus::After);
        }
    }
    Ok(())
}

#[test]
fn test_if_else_completion_records() -> anyhow::Result<()> {
    // if (x) { a; } else { b; c; }
    let mut session = program(|ast| {
        let x = ast.identifier("x");
        let a = ast.identifier("a");
        let a = ast.expression_statement(a);
        let consequent = ast.block_statement(vec![a]);
        let b = ast.identifier("b");
        let b = ast.expression_statement(b);
        let c = ast.identifier("c");
        let c = ast.expression_statement(c);
        let alternate = ast.block_statement(vec![b, c]);
        vec![ast.if_statement(x, consequent, Some(alternate))]
    });
    let root = session.root_path();
    let branch = session.get_index(root, Field::Body, 0);
    let records = session.get_completion_records(branch);
    let sources: Vec<String> = records
        .iter()
        .filter_map(|&p| session.node(p))
        .map(|node| node.to_source(session.ast()))
        .collect();
    assert_eq!(sources, vec!["a;".to_string(), "c;".to_string()]);
    assert_eq!(session.get_completion_records(root), records);
    Ok(())
}

#[test]
fn test_replace_with_multiple_shifts_later_siblings_by_two() -> anyhow::Result<()> {
    let mut session = program(|ast| ["a", "b", "c", "d"].iter().map(|name| call_statement(ast, name)).collect());
    let root = session.root_path();
    let b = session.get_index(root, Field::Body, 1);
    let c = session.get_index(root, Field::Body, 2);
    let d = session.get_index(root, Field::Body, 3);
    let c_node = session.node(c);

    let nodes: Vec<NodeId> = ["x", "y", "z"].iter().map(|name| call_statement(session.ast_mut(), name)).collect();
    let inserted = session.replace_with_multiple(b, nodes)?;

    assert_eq!(inserted.iter().map(|&p| session.key(p)).collect::<Vec<_>>(), vec![Key::Index(1), Key::Index(2), Key::Index(3)]);
    assert_eq!(session.key(c), Key::Index(4));
    assert_eq!(session.key(d), Key::Index(5));
    assert_eq!(session.node(c), c_node);
    assert_eq!(render(&session), "a();\nx();\ny();\nz();\nc();\nd();");
    Ok(())
}

#[test]
fn test_replace_with_then_resync_sees_the_new_node() -> anyhow::Result<()> {
    let mut session = program(|ast| vec![call_statement(ast, "old")]);
    let root = session.root_path();
    let call = session.get_pattern(root, "body.0.expression")?;
    let replacement = session.ast_mut().call("fresh", vec![]);
    session.replace_with(call, replacement)?;
    session.resync(call);
    assert_eq!(session.node(call), Some(replacement));
    assert!(!session.is_removed(call));
    assert_eq!(session.get_pattern(root, "body.0.expression")?, call);
    assert_eq!(render(&session), "fresh();");
    Ok(())
}

#[test]
fn test_statements_in_argument_position_keep_statement_index() -> anyhow::Result<()> {
    // before(); f(doStuff());
    let mut session = program(|ast| {
        let before = call_statement(ast, "before");
        let inner = ast.call("doStuff", vec![]);
        let outer = ast.call("f", vec![inner]);
        vec![before, ast.expression_statement(outer)]
    });
    let mut table = VisitorTable::new().enter(NodeType::CallExpression, |s: &mut Session, p| {
        let callee = s.get(p, Field::Callee);
        if s.identifier_name(callee) != Some("doStuff") {
            return Ok(());
        }
        let statements = {
            let ast = s.ast_mut();
            let compute = ast.call("compute", vec![]);
            let decl = ast.declare(VariableKind::Let, "t", Some(compute));
            let t = ast.identifier("t");
            let used = ast.call("use", vec![t]);
            vec![decl, ast.expression_statement(used)]
        };
        s.replace_expression_with_statements(p, statements)?;
        Ok(())
    });
    session.traverse(&mut table)?;
    drop(table);

    let root = session.root_path();
    assert_eq!(session.get_list(root, Field::Body).len(), 2);
    let callee = session.get_pattern(root, "body.1.expression.callee")?;
    assert_eq!(session.identifier_name(callee), Some("f"));
    assert_eq!(
        render(&session),
        "before();\nf(function () { let t = compute(); return use(t); }());"
    );
    Ok(())
}

#[test]
fn test_member_pattern_and_self_reference() -> anyhow::Result<()> {
    let mut session = program(|ast| {
        let dotted = ast.member_chain("React.createClass");
        let react = ast.identifier("React");
        let key = ast.string_literal("createClass");
        let computed = ast.member_expression(react, key, true);
        let a = ast.identifier("a");
        let decl = ast.declare(VariableKind::Let, "a", Some(a));
        vec![ast.expression_statement(dotted), ast.expression_statement(computed), decl]
    });
    let root = session.root_path();
    let dotted = session.get_pattern(root, "body.0.expression")?;
    let computed = session.get_pattern(root, "body.1.expression")?;
    assert!(session.matches_pattern(dotted, "React.createClass", false));
    assert!(session.matches_pattern(computed, "React.createClass", false));
    assert!(!session.matches_pattern(dotted, "React.createElement", false));

    let init = session.get_pattern(root, "body.2.declarations.0.init")?;
    let resolved = session.resolve(init, false);
    assert!(session.is(resolved, NodeType::Identifier));
    Ok(())
}

#[test]
fn test_scopes_track_declarations_and_references() -> anyhow::Result<()> {
    // var _tmp = 1; function g(x) { let y = x; } g(_tmp);
    let mut session = program(|ast| {
        let one = ast.numeric_literal(1.0);
        let tmp = ast.declare(VariableKind::Var, "_tmp", Some(one));
        let x = ast.identifier("x");
        let y = ast.declare(VariableKind::Let, "y", Some(x));
        let body = ast.block_statement(vec![y]);
        let name = ast.identifier("g");
        let param = ast.identifier("x");
        let g = ast.function_declaration(Some(name), vec![param], body);
        let arg = ast.identifier("_tmp");
        let call = ast.call("g", vec![arg]);
        vec![tmp, g, ast.expression_statement(call)]
    });
    let root = session.root_path();
    let program_scope = session.scope_of(root);
    let kinds: Vec<(String, BindingKind)> = session
        .scope(program_scope)
        .bindings
        .values()
        .map(|binding| (binding.name.clone(), binding.kind))
        .collect();
    assert_eq!(kinds, vec![("_tmp".to_string(), BindingKind::Var), ("g".to_string(), BindingKind::Hoisted)]);

    let x_ref = session.get_pattern(root, "body.1.body.body.0.declarations.0.init")?;
    let function_scope = session.scope_of(x_ref);
    assert_ne!(function_scope, program_scope);
    assert_eq!(session.get_function_scope(function_scope), function_scope);
    assert_eq!(session.get_program_scope(function_scope), program_scope);
    let binding = session.binding_for(x_ref).ok_or_else(|| anyhow::anyhow!("x is unbound"))?;
    assert_eq!(binding.kind, BindingKind::Param);
    assert_eq!(binding.references(), 1);
    assert!(session.has_binding(function_scope, "_tmp"));
    assert!(session.get_own_binding(function_scope, "_tmp").is_none());

    assert_eq!(session.generate_uid(program_scope, "tmp"), "_tmp2");
    let declared = session.generate_declared_uid(function_scope, "ref")?;
    assert_eq!(declared, "_ref");
    assert!(session.get_own_binding(function_scope, "_ref").is_some());
    assert_eq!(
        render(&session),
        "var _tmp = 1;\nfunction g(x) { var _ref; let y = x; }\ng(_tmp);"
    );
    Ok(())
}

#[test]
fn test_try_catch_finally_completion_records() -> anyhow::Result<()> {
    // try { a; } catch (e) { b; } finally { c; }
    let mut session = program(|ast| {
        let statements: Vec<NodeId> = ["a", "b", "c"]
            .iter()
            .map(|name| {
                let id = ast.identifier(*name);
                ast.expression_statement(id)
            })
            .collect();
        let block = ast.block_statement(vec![statements[0]]);
        let param = ast.identifier("e");
        let body = ast.block_statement(vec![statements[1]]);
        let handler = ast.catch_clause(Some(param), body);
        let finalizer = ast.block_statement(vec![statements[2]]);
        vec![ast.try_statement(block, Some(handler), Some(finalizer))]
    });
    let root = session.root_path();
    let attempt = session.get_index(root, Field::Body, 0);
    let sources: Vec<String> = session
        .get_completion_records(attempt)
        .into_iter()
        .filter_map(|p| session.node(p))
        .map(|node| node.to_source(session.ast()))
        .collect();
    assert_eq!(sources, vec!["a;".to_string(), "b;".to_string(), "c;".to_string()]);
    Ok(())
}

/// var x = 1; <calls and reassignment>; function f() { x; <extra> }
fn program_with_function_reading_x(
    build: impl FnOnce(&mut Ast, NodeId) -> Vec<NodeId>,
    extra: impl FnOnce(&mut Ast) -> Vec<NodeId>,
) -> Session {
    program(|ast| {
        let x = ast.identifier("x");
        let mut body = vec![ast.expression_statement(x)];
        body.extend(extra(ast));
        let block = ast.block_statement(body);
        let name = ast.identifier("f");
        let function = ast.function_declaration(Some(name), vec![], block);
        build(ast, function)
    })
}

fn reassign_x(ast: &mut Ast) -> NodeId {
    let target = ast.identifier("x");
    let value = ast.string_literal("s");
    let assign = ast.assignment_expression(AssignmentOperator::Assign, target, value);
    ast.expression_statement(assign)
}

#[test]
fn test_escaping_function_has_unknown_order() -> anyhow::Result<()> {
    // var x = 1; function f() { x; g(f); } f(); x = "s";
    let mut session = program_with_function_reading_x(
        |ast, function| {
            let one = ast.numeric_literal(1.0);
            let decl = ast.declare(VariableKind::Var, "x", Some(one));
            let call = call_statement(ast, "f");
            vec![decl, function, call, reassign_x(ast)]
        },
        |ast| {
            let f = ast.identifier("f");
            let call = ast.call("g", vec![f]);
            vec![ast.expression_statement(call)]
        },
    );
    let root = session.root_path();
    let read = session.get_pattern(root, "body.1.body.body.0.expression")?;
    let reassignment = session.get_pattern(root, "body.3.expression")?;
    assert_eq!(
        session.guess_execution_status_relative_to(reassignment, read),
        ExecutionStatus::Unknown
    );
    assert_eq!(
        session.get_type_annotation(read),
        TypeAnnotation::Union(vec![TypeAnnotation::Number, TypeAnnotation::String])
    );
    Ok(())
}

#[test]
fn test_disagreeing_call_sites_have_unknown_order() -> anyhow::Result<()> {
    // var x = 1; f(); function f() { x; } x = "s"; f();
    let mut session = program_with_function_reading_x(
        |ast, function| {
            let one = ast.numeric_literal(1.0);
            let decl = ast.declare(VariableKind::Var, "x", Some(one));
            let early = call_statement(ast, "f");
            let reassign = reassign_x(ast);
            let late = call_statement(ast, "f");
            vec![decl, early, function, reassign, late]
        },
        |_| Vec::new(),
    );
    let root = session.root_path();
    let read = session.get_pattern(root, "body.2.body.body.0.expression")?;
    let decl = session.get_index(root, Field::Body, 0);
    let reassignment = session.get_pattern(root, "body.3.expression")?;
    assert_eq!(session.guess_execution_status_relative_to(decl, read), ExecutionStatus::Before);
    assert_eq!(
        session.guess_execution_status_relative_to(reassignment, read),
        ExecutionStatus::Unknown
    );
    assert_eq!(
        session.get_type_annotation(read),
        TypeAnnotation::Union(vec![TypeAnnotation::Number, TypeAnnotation::String])
    );

    // Dropping the late call leaves both call sites agreeing.
    let late = session.get_index(root, Field::Body, 4);
    session.remove(late)?;
    session.crawl();
    assert_eq!(
        session.guess_execution_status_relative_to(reassignment, read),
        ExecutionStatus::After
    );
    Ok(())
}
