//! Replacing the node at a path, including turning an expression position
//! into a multi-statement computation.

use crate::ast::{validators, Alias, AssignmentOperator, Field, NodeId, NodeKind, NodeType, VariableKind};
use crate::error::{Result, TraverseError};
use crate::scope::ScopeId;
use crate::session::Session;
use crate::traverse::VisitorTable;

use super::{Key, PathId};

/// Path data key holding the result variable shared by every completion
/// inside one loop of an expression wrapper.
const RETURN_UID_KEY: &str = "expressionReplacementReturnUid";

/// What a caller may hand to [`Session::replace_with`]. Only a node or a
/// path is accepted; the other shapes exist so misuse is reported instead
/// of silently coerced.
#[derive(Debug, Clone, PartialEq)]
pub enum Replacement {
    Node(NodeId),
    Path(PathId),
    Nodes(Vec<NodeId>),
    Source(String),
    Nothing,
}

impl From<NodeId> for Replacement {
    fn from(node: NodeId) -> Self {
        Replacement::Node(node)
    }
}

impl From<PathId> for Replacement {
    fn from(path: PathId) -> Self {
        Replacement::Path(path)
    }
}

impl From<Vec<NodeId>> for Replacement {
    fn from(nodes: Vec<NodeId>) -> Self {
        Replacement::Nodes(nodes)
    }
}

impl From<&str> for Replacement {
    fn from(source: &str) -> Self {
        Replacement::Source(source.to_string())
    }
}

impl From<String> for Replacement {
    fn from(source: String) -> Self {
        Replacement::Source(source)
    }
}

impl From<Option<NodeId>> for Replacement {
    fn from(node: Option<NodeId>) -> Self {
        node.map_or(Replacement::Nothing, Replacement::Node)
    }
}

impl Session {
    /// Replace the node at this path.
    ///
    /// An expression put where a statement stands is wrapped in an
    /// expression statement; a statement put where an expression stands is
    /// routed through [`Session::replace_expression_with_statements`]. The
    /// path keeps its position and is requeued.
    pub fn replace_with(&mut self, path: PathId, replacement: impl Into<Replacement>) -> Result<()> {
        let replacement = match replacement.into() {
            Replacement::Node(node) => node,
            Replacement::Path(other) => self.node(other).ok_or(TraverseError::FalsyReplacement)?,
            Replacement::Nodes(_) => return Err(TraverseError::ArrayReplacement),
            Replacement::Source(_) => return Err(TraverseError::SourceReplacement),
            Replacement::Nothing => return Err(TraverseError::FalsyReplacement),
        };
        if self.is_removed(path) {
            return Err(TraverseError::RemovedPath);
        }
        self.resync(path);
        if self.is_removed(path) {
            return Err(TraverseError::RemovedPath);
        }

        let old = self.node(path);
        if old == Some(replacement) {
            return Ok(());
        }
        let replacement_type = self.ast.node_type(replacement);
        if self.is(path, NodeType::Program) && replacement_type != NodeType::Program {
            return Err(TraverseError::RootReplacement { found: replacement_type });
        }

        let mut replacement = replacement;
        if let Some(current) = self.node_type(path) {
            let flexible = self.can_have_variable_declaration_or_expression(path)
                || self.can_swap_between_expression_and_statement(path, replacement);
            if current.is_statement()
                && replacement_type.is_expression()
                && !flexible
                && self.parent_type(path) != Some(NodeType::ExportDefaultDeclaration)
            {
                replacement = self.ast.expression_statement(replacement);
            }
            if current.is_expression() && replacement_type.is_statement() && !flexible {
                self.replace_expression_with_statements(path, vec![replacement])?;
                return Ok(());
            }
        }

        if let Some(old) = old {
            self.ast.inherits_comments(replacement, old);
            self.ast.remove_comments(old);
        }
        self.set_node(path, replacement)?;
        self.record_mutation();
        tracing::debug!(
            from = %old.map(|n| self.ast.node_type(n).to_string()).unwrap_or_default(),
            to = %self.ast.node_type(replacement),
            "replace with"
        );

        if self.scopes_crawled() && self.ast.node_type(replacement).is_declaration() {
            self.register_declaration(path)?;
        }
        self.requeue(path);
        Ok(())
    }

    /// Replace this list element with several nodes. The first and last
    /// inherit the leading and trailing comments of the replaced node.
    pub fn replace_with_multiple(&mut self, path: PathId, nodes: Vec<NodeId>) -> Result<Vec<PathId>> {
        if self.is_removed(path) {
            return Err(TraverseError::RemovedPath);
        }
        self.resync(path);
        let (Some(first), Some(last)) = (nodes.first().copied(), nodes.last().copied()) else {
            return Err(TraverseError::EmptyNodeList);
        };
        let old = self.node(path).ok_or(TraverseError::EmptyPath)?;
        let (Some(field), Key::Index(index), Some(parent)) = (self.list_key(path), self.key(path), self.parent_path(path))
        else {
            return Err(TraverseError::not_a_list("replace_with_multiple"));
        };

        self.ast.inherit_leading_comments(first, old);
        self.ast.inherit_trailing_comments(last, old);
        self.ast.remove_comments(old);

        let paths = self.insert_at(parent, field, index + 1, nodes)?;
        self.remove_from_scope(old);
        self.detach(path)?;
        self.mark_removed(path);
        tracing::debug!(count = paths.len(), "replaced with multiple");
        Ok(paths)
    }

    /// Splice `nodes` in place of this path. List elements are spliced;
    /// elsewhere a single node is a plain replacement, several statements
    /// become a block, and an expression becomes a statement sequence.
    pub fn replace_inline(&mut self, path: PathId, nodes: Vec<NodeId>) -> Result<Vec<PathId>> {
        if self.in_list(path) {
            return self.replace_with_multiple(path, nodes);
        }
        match nodes.as_slice() {
            [] => Err(TraverseError::EmptyNodeList),
            [single] => {
                self.replace_with(path, *single)?;
                Ok(vec![path])
            }
            _ if self.node_type(path).is_some_and(NodeType::is_expression) => {
                self.replace_expression_with_statements(path, nodes)?;
                Ok(vec![path])
            }
            _ if self.is_statement_or_block(path) => {
                let block = self.ast.block_statement(nodes);
                self.replace_with(path, block)?;
                Ok(self.get_list(path, Field::Body))
            }
            _ => Err(TraverseError::not_a_list("replace_inline")),
        }
    }

    /// Parse `source` with the installed [`crate::ExpressionParser`] and
    /// replace this path with the result.
    pub fn replace_with_source_string(&mut self, path: PathId, source: &str) -> Result<()> {
        let mut parser = self.parser.take().ok_or(TraverseError::NoParser)?;
        let parsed = parser.parse_expression(&mut self.ast, source);
        self.parser = Some(parser);
        let node = parsed.map_err(|err| TraverseError::Parse { message: err.message, offset: err.offset })?;
        self.replace_with(path, node)
    }

    /// Put a list of statements where an expression stands.
    ///
    /// Statements that reduce to expressions become a sequence expression,
    /// with `var` names declared in the enclosing function. Anything else is
    /// wrapped in an immediately invoked function whose `var` declarations
    /// are hoisted out and whose completion values are returned. Returns the
    /// path now holding the replacement.
    pub fn replace_expression_with_statements(&mut self, path: PathId, statements: Vec<NodeId>) -> Result<PathId> {
        if statements.is_empty() {
            return Err(TraverseError::EmptyNodeList);
        }
        if self.is_removed(path) {
            return Err(TraverseError::RemovedPath);
        }
        self.resync(path);
        let scope = self.scope_of(path);

        let mut declared = Vec::new();
        if let Some(expression) = self.gather_sequence_expressions(&statements, &mut declared) {
            for name in declared {
                self.push_declaration(scope, &name, None)?;
            }
            let expression = self.maybe_pop_pure_value(path, expression);
            self.replace_with(path, expression)?;
            return Ok(path);
        }

        let body = self.ast.block_statement(statements);
        let function = self.ast.function_expression(None, Vec::new(), body);
        let call = self.ast.call_expression(function, Vec::new());
        self.replace_with(path, call)?;
        let callee = self.get(path, Field::Callee);

        self.hoist_variables(callee, scope)?;

        let records = self.get_completion_records(callee);
        for record in records {
            if !self.is(record, NodeType::ExpressionStatement) {
                continue;
            }
            let Some(NodeKind::ExpressionStatement { expression }) = self.kind(record) else {
                continue;
            };
            let expression = *expression;
            match self.enclosing_loop_within(record, callee) {
                Some(lp) => {
                    let uid = match self.get_data(lp, RETURN_UID_KEY).and_then(|v| v.as_str()) {
                        Some(uid) => uid.to_string(),
                        None => {
                            let function_scope = self.scope_of(callee);
                            let uid = self.generate_declared_uid(function_scope, "ret")?;
                            let body = self.get(callee, Field::Body);
                            let returned = self.ast.identifier(uid.as_str());
                            let ret = self.ast.return_statement(Some(returned));
                            self.push_container(body, Field::Body, vec![ret])?;
                            self.set_data(lp, RETURN_UID_KEY, uid.as_str());
                            uid
                        }
                    };
                    let target = self.ast.identifier(uid);
                    let assign = self.ast.assignment_expression(AssignmentOperator::Assign, target, expression);
                    let expression_path = self.get(record, Field::Expression);
                    self.replace_with(expression_path, assign)?;
                }
                None => {
                    let ret = self.ast.return_statement(Some(expression));
                    self.replace_with(record, ret)?;
                }
            }
        }
        tracing::debug!("replaced expression with a function wrapper");
        Ok(path)
    }

    /// Reduce statements to one expression, collecting names of `var`
    /// bindings that must be declared outside. `None` when a statement has
    /// no expression form.
    fn gather_sequence_expressions(&mut self, nodes: &[NodeId], declared: &mut Vec<String>) -> Option<NodeId> {
        let mut expressions = Vec::new();
        let mut ensure_last_undefined = false;
        for &node in nodes {
            ensure_last_undefined = false;
            let kind = self.ast.kind(node).clone();
            let ty = kind.node_type();
            match kind {
                _ if ty.is_expression() => expressions.push(node),
                NodeKind::ExpressionStatement { expression } => expressions.push(expression),
                NodeKind::VariableDeclaration { kind: VariableKind::Var, declarations } => {
                    for declarator in declarations {
                        let NodeKind::VariableDeclarator { id, init } = self.ast.kind(declarator).clone() else {
                            continue;
                        };
                        declared.extend(validators::get_binding_identifiers(&self.ast, id, false, false).into_keys());
                        if let Some(init) = init {
                            expressions.push(self.ast.assignment_expression(AssignmentOperator::Assign, id, init));
                        }
                    }
                    ensure_last_undefined = true;
                }
                NodeKind::VariableDeclaration { .. } => return None,
                NodeKind::IfStatement { test, consequent, alternate } => {
                    let consequent = self.gather_sequence_expressions(&[consequent], declared)?;
                    let alternate = match alternate {
                        Some(alternate) => self.gather_sequence_expressions(&[alternate], declared)?,
                        None => self.ast.undefined_node(),
                    };
                    expressions.push(self.ast.conditional_expression(test, consequent, alternate));
                }
                NodeKind::BlockStatement { body } => {
                    expressions.push(self.gather_sequence_expressions(&body, declared)?);
                }
                NodeKind::EmptyStatement => ensure_last_undefined = true,
                _ => return None,
            }
        }
        if ensure_last_undefined || expressions.is_empty() {
            expressions.push(self.ast.undefined_node());
        }
        match expressions.as_slice() {
            [single] => Some(*single),
            _ => Some(self.ast.sequence_expression(expressions)),
        }
    }

    /// In statement position the value of a sequence is unused unless it is
    /// a completion record, so a trailing pure value can go.
    fn maybe_pop_pure_value(&mut self, path: PathId, expression: NodeId) -> NodeId {
        if self.parent_type(path) != Some(NodeType::ExpressionStatement) || self.is_completion_record(path, false) {
            return expression;
        }
        let NodeKind::SequenceExpression { expressions } = self.ast.kind(expression) else {
            return expression;
        };
        let Some(&last) = expressions.last() else {
            return expression;
        };
        if expressions.len() < 2 || !validators::is_pure_value(&self.ast, last) {
            return expression;
        }
        if let NodeKind::SequenceExpression { expressions } = self.ast.kind_mut(expression) {
            expressions.pop();
            if let [single] = expressions.as_slice() {
                return *single;
            }
        }
        expression
    }

    /// Nearest loop between `path` and the function wrapper at `wrapper`.
    fn enclosing_loop_within(&self, path: PathId, wrapper: PathId) -> Option<PathId> {
        let wrapper = self.node(wrapper);
        let mut current = self.parent_path(path);
        while let Some(p) = current {
            if self.node(p) == wrapper {
                return None;
            }
            if self.node_type(p).is_some_and(NodeType::is_loop) {
                return Some(p);
            }
            current = self.parent_path(p);
        }
        None
    }

    /// Move `var` declarations inside the function at `function` (but not
    /// inside nested functions) to `scope`, turning declarators into
    /// assignments.
    fn hoist_variables(&mut self, function: PathId, scope: ScopeId) -> Result<()> {
        let mut table = VisitorTable::new()
            .enter_alias(Alias::Function, |session: &mut Session, path| {
                session.skip(path);
                Ok(())
            })
            .enter(NodeType::VariableDeclaration, move |session: &mut Session, path| {
                session.hoist_declaration(path, scope)
            });
        self.traverse_node(function, &mut table)?;
        Ok(())
    }

    fn hoist_declaration(&mut self, path: PathId, scope: ScopeId) -> Result<()> {
        let Some(NodeKind::VariableDeclaration { kind: VariableKind::Var, declarations }) = self.kind(path).cloned()
        else {
            return Ok(());
        };

        let mut assignments = Vec::new();
        let mut first_id = None;
        for declarator in declarations {
            let NodeKind::VariableDeclarator { id, init } = self.ast.kind(declarator).clone() else {
                continue;
            };
            first_id.get_or_insert(id);
            let names: Vec<String> = validators::get_binding_identifiers(&self.ast, id, false, false)
                .into_keys()
                .collect();
            for name in names {
                self.push_declaration(scope, &name, None)?;
            }
            if let Some(init) = init {
                assignments.push(self.ast.assignment_expression(AssignmentOperator::Assign, id, init));
            }
        }
        tracing::debug!(count = assignments.len(), "hoisting var declaration");

        if self.can_have_variable_declaration_or_expression(path) {
            if self.key(path) == Key::Field(Field::Left) {
                if let Some(id) = first_id {
                    self.replace_with(path, id)?;
                }
                return Ok(());
            }
            return match assignments.as_slice() {
                [] => self.remove(path),
                [single] => self.replace_with(path, *single),
                _ => {
                    let sequence = self.ast.sequence_expression(assignments);
                    self.replace_with(path, sequence)
                }
            };
        }

        let statements: Vec<NodeId> = assignments
            .into_iter()
            .map(|assign| self.ast.expression_statement(assign))
            .collect();
        if self.in_list(path) {
            if statements.is_empty() {
                self.remove(path)?;
            } else {
                self.replace_with_multiple(path, statements)?;
            }
            return Ok(());
        }
        let replacement = match statements.as_slice() {
            [] => self.ast.empty_statement(),
            [single] => *single,
            _ => self.ast.block_statement(statements),
        };
        self.replace_with(path, replacement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Ast, ToSource};
    use crate::session::{ExpressionParser, ParseError};

    fn render(session: &Session) -> String {
        session.ast().to_source(session.ast())
    }

    fn one_statement(build: impl FnOnce(&mut Ast) -> NodeId) -> Session {
        let mut ast = Ast::new();
        let expression = build(&mut ast);
        let stmt = ast.expression_statement(expression);
        let program = ast.program(vec![stmt]);
        ast.set_root(program);
        Session::new(ast)
    }

    #[test]
    fn test_replace_with_keeps_position() {
        let mut session = one_statement(|ast| ast.call("a", vec![]));
        let root = session.root_path();
        let expr = session.get_pattern(root, "body.0.expression").unwrap();
        let replacement = session.ast_mut().call("b", vec![]);
        session.replace_with(expr, replacement).unwrap();
        session.resync(expr);
        assert_eq!(session.node(expr), Some(replacement));
        assert_eq!(session.key(expr), Key::Field(Field::Expression));
        assert_eq!(render(&session), "b();");
    }

    #[test]
    fn test_replace_with_rejects_misuse() {
        let mut session = one_statement(|ast| ast.call("a", vec![]));
        let root = session.root_path();
        let expr = session.get_pattern(root, "body.0.expression").unwrap();
        let node = session.ast_mut().identifier("x");
        assert!(matches!(
            session.replace_with(expr, vec![node]),
            Err(TraverseError::ArrayReplacement)
        ));
        assert!(matches!(
            session.replace_with(expr, "x + 1"),
            Err(TraverseError::SourceReplacement)
        ));
        assert!(matches!(
            session.replace_with(expr, None::<NodeId>),
            Err(TraverseError::FalsyReplacement)
        ));
        assert!(matches!(
            session.replace_with(root, node),
            Err(TraverseError::RootReplacement { found: NodeType::Identifier })
        ));
    }

    #[test]
    fn test_expression_into_statement_slot_is_wrapped() {
        let mut session = one_statement(|ast| ast.call("a", vec![]));
        let root = session.root_path();
        let stmt = session.get_index(root, Field::Body, 0);
        let x = session.ast_mut().identifier("x");
        session.replace_with(stmt, x).unwrap();
        assert!(session.is(stmt, NodeType::ExpressionStatement));
        assert_eq!(render(&session), "x;");
    }

    #[test]
    fn test_statements_reduce_to_sequence() {
        let mut session = one_statement(|ast| {
            let inner = ast.call("g", vec![]);
            ast.call("f", vec![inner])
        });
        let root = session.root_path();
        let argument = session.get_pattern(root, "body.0.expression.arguments.0").unwrap();
        let statements = {
            let ast = session.ast_mut();
            let one = ast.numeric_literal(1.0);
            let decl = ast.declare(VariableKind::Var, "t", Some(one));
            let t = ast.identifier("t");
            let call = ast.call("use", vec![t]);
            let stmt = ast.expression_statement(call);
            vec![decl, stmt]
        };
        session.replace_expression_with_statements(argument, statements).unwrap();
        assert_eq!(render(&session), "var t;\nf((t = 1, use(t)));");
        let scope = session.scope_of(root);
        assert!(session.has_binding(scope, "t"));
    }

    #[test]
    fn test_sequence_into_arrow_expression_body() {
        let mut session = one_statement(|ast| {
            let y = ast.identifier("y");
            let body = ast.call("f", vec![y]);
            let param = ast.identifier("x");
            ast.arrow_function_expression(vec![param], body)
        });
        let root = session.root_path();
        let body = session.get_pattern(root, "body.0.expression.body").unwrap();
        let statements = {
            let ast = session.ast_mut();
            let one = ast.numeric_literal(1.0);
            let decl = ast.declare(VariableKind::Var, "t", Some(one));
            let t = ast.identifier("t");
            let call = ast.call("use", vec![t]);
            let stmt = ast.expression_statement(call);
            vec![decl, stmt]
        };
        let replaced = session.replace_expression_with_statements(body, statements).unwrap();
        assert_eq!(render(&session), "(x) => { var t; return t = 1, use(t); };");
        assert_eq!(session.parent_type(replaced), Some(NodeType::ReturnStatement));
        assert!(session.is(replaced, NodeType::SequenceExpression));
        let scope = session.scope_of(replaced);
        assert!(session.has_binding(scope, "t"));
        let arrow = session.get_pattern(root, "body.0.expression").unwrap();
        let block = session.get(arrow, Field::Body);
        assert!(session.is(block, NodeType::BlockStatement));
    }

    #[test]
    fn test_let_declaration_builds_function_wrapper() {
        let mut session = one_statement(|ast| {
            let inner = ast.call("doStuff", vec![]);
            ast.call("f", vec![inner])
        });
        let root = session.root_path();
        let argument = session.get_pattern(root, "body.0.expression.arguments.0").unwrap();
        let statements = {
            let ast = session.ast_mut();
            let compute = ast.call("compute", vec![]);
            let decl = ast.declare(VariableKind::Let, "t", Some(compute));
            let t = ast.identifier("t");
            let call = ast.call("use", vec![t]);
            let stmt = ast.expression_statement(call);
            vec![decl, stmt]
        };
        session.replace_expression_with_statements(argument, statements).unwrap();
        assert_eq!(
            render(&session),
            "f(function () { let t = compute(); return use(t); }());"
        );
    }

    #[test]
    fn test_wrapper_hoists_var_and_returns_from_loops() {
        let mut session = one_statement(|ast| ast.call("f", vec![]));
        let root = session.root_path();
        let call = session.get_pattern(root, "body.0.expression").unwrap();
        let statements = {
            let ast = session.ast_mut();
            let zero = ast.numeric_literal(0.0);
            let decl = ast.declare(VariableKind::Var, "i", Some(zero));
            let test = ast.identifier("go");
            let i = ast.identifier("i");
            let value = ast.expression_statement(i);
            let body = ast.block_statement(vec![value]);
            let lp = ast.while_statement(test, body);
            vec![decl, lp]
        };
        session.replace_expression_with_statements(call, statements).unwrap();
        assert_eq!(
            render(&session),
            "var i;\n(function () { var _ret; i = 0; while (go) { _ret = i; } return _ret; })();"
        );
    }

    struct Fixed;

    impl ExpressionParser for Fixed {
        fn parse_expression(&mut self, ast: &mut Ast, source: &str) -> std::result::Result<NodeId, ParseError> {
            match source {
                "ok" => Ok(ast.identifier("ok")),
                _ => Err(ParseError { message: "Unexpected token".to_string(), offset: Some(0) }),
            }
        }
    }

    #[test]
    fn test_replace_with_source_string() {
        let mut session = one_statement(|ast| ast.call("a", vec![]));
        let root = session.root_path();
        let expr = session.get_pattern(root, "body.0.expression").unwrap();
        assert!(matches!(
            session.replace_with_source_string(expr, "ok"),
            Err(TraverseError::NoParser)
        ));

        session.set_parser(Box::new(Fixed));
        let err = session.replace_with_source_string(expr, "(").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected token - make sure this is an expression.");
        session.replace_with_source_string(expr, "ok").unwrap();
        assert_eq!(render(&session), "ok;");
    }

    #[test]
    fn test_replace_with_multiple_shifts_siblings() {
        let mut ast = Ast::new();
        let body: Vec<NodeId> = ["a", "b", "c"]
            .iter()
            .map(|name| {
                let call = ast.call(name, vec![]);
                ast.expression_statement(call)
            })
            .collect();
        let program = ast.program(body);
        ast.set_root(program);
        let mut session = Session::new(ast);
        let root = session.root_path();
        let b = session.get_index(root, Field::Body, 1);
        let c = session.get_index(root, Field::Body, 2);
        let nodes: Vec<NodeId> = ["x", "y", "z"]
            .iter()
            .map(|name| {
                let ast = session.ast_mut();
                let call = ast.call(name, vec![]);
                ast.expression_statement(call)
            })
            .collect();
        let paths = session.replace_with_multiple(b, nodes).unwrap();
        assert_eq!(paths.iter().map(|&p| session.index(p)).collect::<Vec<_>>(), vec![Some(1), Some(2), Some(3)]);
        assert_eq!(session.key(c), Key::Index(4));
        assert!(session.is_removed(b));
        assert_eq!(render(&session), "a();\nx();\ny();\nz();\nc();");
    }
}
