//! Built-in rewrite rules.

use crate::ast::{NodeKind, NodeType};
use crate::scope::BindingKind;
use crate::session::Session;
use crate::traverse::VisitorTable;

use super::RewriteRule;

const USE_STRICT: &str = "use strict";

/// Adds the `"use strict"` directive to the program unless it is already
/// there.
#[derive(Debug, Clone)]
pub struct StrictMode {
    enabled: bool,
    priority: u32,
}

impl StrictMode {
    pub fn new() -> Self {
        Self { enabled: true, priority: 200 }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}

impl Default for StrictMode {
    fn default() -> Self {
        Self::new()
    }
}

impl RewriteRule for StrictMode {
    fn name(&self) -> &'static str {
        "strict-mode"
    }

    fn description(&self) -> &'static str {
        "Adds a \"use strict\" directive to the program"
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn visitor(&self) -> VisitorTable<'_> {
        let enabled = self.enabled;
        VisitorTable::new().enter(NodeType::Program, move |session: &mut Session, path| {
            // Directives are program data, not child nodes; nothing below
            // the program needs visiting.
            session.skip(path);
            let Some(program) = session.node(path) else {
                return Ok(());
            };
            if !enabled {
                return Ok(());
            }
            if let NodeKind::Program { directives, .. } = session.ast_mut().kind_mut(program) {
                if directives.iter().any(|directive| directive == USE_STRICT) {
                    return Ok(());
                }
                directives.insert(0, USE_STRICT.to_string());
            }
            session.record_mutation();
            tracing::debug!("added \"use strict\" directive");
            Ok(())
        })
    }
}

/// Replaces reads of constant bindings whose value resolves to a literal
/// with a copy of that literal.
#[derive(Debug, Clone)]
pub struct ConstantInliner {
    priority: u32,
}

impl ConstantInliner {
    pub fn new() -> Self {
        Self { priority: 100 }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}

impl Default for ConstantInliner {
    fn default() -> Self {
        Self::new()
    }
}

impl RewriteRule for ConstantInliner {
    fn name(&self) -> &'static str {
        "constant-inliner"
    }

    fn description(&self) -> &'static str {
        "Inlines literal values of bindings that are never reassigned"
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn visitor(&self) -> VisitorTable<'_> {
        VisitorTable::new().enter(NodeType::Identifier, |session: &mut Session, path| {
            if !session.is_referenced_identifier(path) {
                return Ok(());
            }
            let Some(binding) = session.binding_for(path) else {
                return Ok(());
            };
            if !binding.is_constant() || !matches!(binding.kind, BindingKind::Var | BindingKind::Let | BindingKind::Const) {
                return Ok(());
            }
            let resolved = session.resolve(path, false);
            if resolved == path || !session.node_type(resolved).is_some_and(NodeType::is_literal) {
                return Ok(());
            }
            // A read in the temporal dead zone or before the assignment
            // must keep seeing the variable.
            if !session.will_execute_before(resolved, path) {
                return Ok(());
            }
            let Some(literal) = session.node(resolved) else {
                return Ok(());
            };
            let copy = session.ast_mut().deep_clone(literal);
            session.replace_with(path, copy)?;
            if let Some(binding) = session.binding_mut(binding.scope, &binding.name) {
                binding.dereference(path);
            }
            tracing::debug!(name = %binding.name, "inlined constant");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Ast, AssignmentOperator, NodeId, ToSource, VariableKind};
    use crate::transform::Transformer;

    fn run(rule: impl RewriteRule + 'static, build: impl FnOnce(&mut Ast) -> Vec<NodeId>) -> (Session, u64) {
        let mut ast = Ast::new();
        let body = build(&mut ast);
        let program = ast.program(body);
        ast.set_root(program);
        let mut session = Session::new(ast);
        let mut transformer = Transformer::new();
        transformer.add_rule(Box::new(rule));
        let summary = transformer.run(&mut session).unwrap();
        (session, summary.mutations)
    }

    fn render(session: &Session) -> String {
        session.ast().to_source(session.ast())
    }

    #[test]
    fn test_strict_mode_added_once() {
        let (session, mutations) = run(StrictMode::new(), |ast| {
            let call = ast.call("a", vec![]);
            vec![ast.expression_statement(call)]
        });
        assert_eq!(render(&session), "\"use strict\";\na();");
        assert_eq!(mutations, 1);

        let (session, mutations) = run(StrictMode::new(), |ast| {
            let literal = ast.string_literal("use strict");
            vec![ast.expression_statement(literal)]
        });
        // A string statement is not a directive.
        assert_eq!(mutations, 1);
        assert_eq!(render(&session), "\"use strict\";\n\"use strict\";");
    }

    #[test]
    fn test_strict_mode_disabled() {
        let (session, mutations) = run(StrictMode::new().enabled(false), |ast| {
            let call = ast.call("a", vec![]);
            vec![ast.expression_statement(call)]
        });
        assert_eq!(mutations, 0);
        assert_eq!(render(&session), "a();");
    }

    #[test]
    fn test_inlines_constant_literals() {
        let (session, mutations) = run(ConstantInliner::new(), |ast| {
            let one = ast.numeric_literal(1.0);
            let decl = ast.declare(VariableKind::Const, "a", Some(one));
            let a = ast.identifier("a");
            let call = ast.call("f", vec![a]);
            vec![decl, ast.expression_statement(call)]
        });
        assert_eq!(render(&session), "const a = 1;\nf(1);");
        assert_eq!(mutations, 1);
    }

    #[test]
    fn test_leaves_reassigned_and_early_reads() {
        let (session, mutations) = run(ConstantInliner::new(), |ast| {
            let one = ast.numeric_literal(1.0);
            let decl = ast.declare(VariableKind::Var, "a", Some(one));
            let target = ast.identifier("a");
            let two = ast.numeric_literal(2.0);
            let assign = ast.assignment_expression(AssignmentOperator::Assign, target, two);
            let a = ast.identifier("a");
            let call = ast.call("f", vec![a]);

            let early = ast.identifier("b");
            let early_call = ast.call("g", vec![early]);
            let three = ast.numeric_literal(3.0);
            let late = ast.declare(VariableKind::Var, "b", Some(three));
            vec![
                decl,
                ast.expression_statement(assign),
                ast.expression_statement(call),
                ast.expression_statement(early_call),
                late,
            ]
        });
        assert_eq!(mutations, 0);
        assert_eq!(render(&session), "var a = 1;\na = 2;\nf(a);\ng(b);\nvar b = 3;");
    }
}
