// Source rendering for debugging, tests and the CLI.
// One statement per line at program level, blocks rendered inline.

use super::parens::needs_parens;
use super::validators::number_to_string;
use super::*;

/// Types that can render the source text of a subtree.
pub trait ToSource {
    fn to_source(&self, ast: &Ast) -> String;
}

impl ToSource for NodeId {
    fn to_source(&self, ast: &Ast) -> String {
        SourceWriter { ast, stack: Vec::new() }.print(*self)
    }
}

impl ToSource for Ast {
    fn to_source(&self, _ast: &Ast) -> String {
        match self.root() {
            Some(root) => root.to_source(self),
            None => String::new(),
        }
    }
}

struct SourceWriter<'a> {
    ast: &'a Ast,
    stack: Vec<NodeId>,
}

impl<'a> SourceWriter<'a> {
    fn print(&mut self, node: NodeId) -> String {
        let parens = needs_parens(self.ast, node, self.stack.last().copied(), &self.stack);
        self.stack.push(node);
        let body = self.render(node);
        self.stack.pop();

        let source = if parens { format!("({body})") } else { body };
        self.with_comments(node, source)
    }

    fn with_comments(&self, node: NodeId, source: String) -> String {
        let node = self.ast.node(node);
        if node.leading_comments.is_empty() && node.trailing_comments.is_empty() {
            return source;
        }
        let mut out = String::new();
        for comment in &node.leading_comments {
            match comment.kind {
                CommentKind::Block => out.push_str(&format!("/*{}*/ ", comment.value)),
                CommentKind::Line => out.push_str(&format!("//{}\n", comment.value)),
            }
        }
        out.push_str(&source);
        for comment in &node.trailing_comments {
            match comment.kind {
                CommentKind::Block => out.push_str(&format!(" /*{}*/", comment.value)),
                CommentKind::Line => out.push_str(&format!(" //{}\n", comment.value)),
            }
        }
        out
    }

    fn list(&mut self, nodes: &[NodeId], separator: &str) -> String {
        nodes.iter().map(|&n| self.print(n)).collect::<Vec<_>>().join(separator)
    }

    fn block_body(&mut self, body: &[NodeId]) -> String {
        if body.is_empty() {
            "{}".to_string()
        } else {
            format!("{{ {} }}", self.list(body, " "))
        }
    }

    fn function(
        &mut self,
        id: Option<NodeId>,
        params: &[NodeId],
        body: NodeId,
        is_async: bool,
        is_generator: bool,
    ) -> String {
        let mut out = String::new();
        if is_async {
            out.push_str("async ");
        }
        out.push_str("function");
        if is_generator {
            out.push('*');
        }
        if let Some(id) = id {
            out.push(' ');
            out.push_str(&self.print(id));
        } else {
            out.push(' ');
        }
        out.push_str(&format!("({}) {}", self.list(params, ", "), self.print(body)));
        out
    }

    /// Declarations heading a `for` loop carry no semicolon.
    fn in_for_head(&self) -> bool {
        let depth = self.stack.len();
        if depth < 2 {
            return false;
        }
        let parent = self.stack[depth - 2];
        let node = self.stack[depth - 1];
        match self.ast.kind(parent) {
            NodeKind::ForStatement { init, .. } => *init == Some(node),
            NodeKind::ForInStatement { left, .. } | NodeKind::ForOfStatement { left, .. } => *left == node,
            _ => false,
        }
    }

    fn render(&mut self, node: NodeId) -> String {
        let ast = self.ast;
        match ast.kind(node) {
            NodeKind::Program { body, directives } => {
                let mut lines: Vec<String> = directives.iter().map(|d| format!("\"{}\";", escape_string(d))).collect();
                lines.extend(body.iter().map(|&stmt| self.print(stmt)));
                lines.join("\n")
            }
            NodeKind::ExpressionStatement { expression } => format!("{};", self.print(*expression)),
            NodeKind::BlockStatement { body } => self.block_body(body),
            NodeKind::EmptyStatement => ";".to_string(),
            NodeKind::DebuggerStatement => "debugger;".to_string(),
            NodeKind::ReturnStatement { argument } => match argument {
                Some(arg) => format!("return {};", self.print(*arg)),
                None => "return;".to_string(),
            },
            NodeKind::IfStatement { test, consequent, alternate } => {
                let mut out = format!("if ({}) {}", self.print(*test), self.print(*consequent));
                if let Some(alt) = alternate {
                    out.push_str(&format!(" else {}", self.print(*alt)));
                }
                out
            }
            NodeKind::ForStatement { init, test, update, body } => {
                let init = init.map(|n| self.print(n)).unwrap_or_default();
                let test = test.map(|n| format!(" {}", self.print(n))).unwrap_or_default();
                let update = update.map(|n| format!(" {}", self.print(n))).unwrap_or_default();
                format!("for ({init};{test};{update}) {}", self.print(*body))
            }
            NodeKind::ForInStatement { left, right, body } => {
                format!("for ({} in {}) {}", self.print(*left), self.print(*right), self.print(*body))
            }
            NodeKind::ForOfStatement { left, right, body } => {
                format!("for ({} of {}) {}", self.print(*left), self.print(*right), self.print(*body))
            }
            NodeKind::WhileStatement { test, body } => {
                format!("while ({}) {}", self.print(*test), self.print(*body))
            }
            NodeKind::DoWhileStatement { body, test } => {
                format!("do {} while ({});", self.print(*body), self.print(*test))
            }
            NodeKind::BreakStatement { label } => match label {
                Some(label) => format!("break {};", self.print(*label)),
                None => "break;".to_string(),
            },
            NodeKind::ContinueStatement { label } => match label {
                Some(label) => format!("continue {};", self.print(*label)),
                None => "continue;".to_string(),
            },
            NodeKind::ThrowStatement { argument } => format!("throw {};", self.print(*argument)),
            NodeKind::TryStatement { block, handler, finalizer } => {
                let mut out = format!("try {}", self.print(*block));
                if let Some(handler) = handler {
                    out.push(' ');
                    out.push_str(&self.print(*handler));
                }
                if let Some(finalizer) = finalizer {
                    out.push_str(&format!(" finally {}", self.print(*finalizer)));
                }
                out
            }
            NodeKind::CatchClause { param, body } => match param {
                Some(param) => format!("catch ({}) {}", self.print(*param), self.print(*body)),
                None => format!("catch {}", self.print(*body)),
            },
            NodeKind::LabeledStatement { label, body } => {
                format!("{}: {}", self.print(*label), self.print(*body))
            }
            NodeKind::VariableDeclaration { kind, declarations } => {
                let decls = self.list(declarations, ", ");
                if self.in_for_head() {
                    format!("{} {decls}", kind.as_str())
                } else {
                    format!("{} {decls};", kind.as_str())
                }
            }
            NodeKind::VariableDeclarator { id, init } => match init {
                Some(init) => format!("{} = {}", self.print(*id), self.print(*init)),
                None => self.print(*id),
            },
            NodeKind::FunctionDeclaration { id, params, body, is_async, is_generator, .. }
            | NodeKind::FunctionExpression { id, params, body, is_async, is_generator, .. } => {
                self.function(*id, params, *body, *is_async, *is_generator)
            }
            NodeKind::ArrowFunctionExpression { params, body, is_async, .. } => {
                let prefix = if *is_async { "async " } else { "" };
                format!("{prefix}({}) => {}", self.list(params, ", "), self.print(*body))
            }
            NodeKind::Identifier { name, type_annotation } => match type_annotation {
                Some(ty) => format!("{name}: {ty}"),
                None => name.clone(),
            },
            NodeKind::StringLiteral { value } => format!("\"{}\"", escape_string(value)),
            NodeKind::NumericLiteral { value } => number_to_string(*value),
            NodeKind::BooleanLiteral { value } => value.to_string(),
            NodeKind::NullLiteral => "null".to_string(),
            NodeKind::ThisExpression => "this".to_string(),
            NodeKind::MemberExpression { object, property, computed } => {
                if *computed {
                    format!("{}[{}]", self.print(*object), self.print(*property))
                } else {
                    format!("{}.{}", self.print(*object), self.print(*property))
                }
            }
            NodeKind::CallExpression { callee, arguments } => {
                format!("{}({})", self.print(*callee), self.list(arguments, ", "))
            }
            NodeKind::NewExpression { callee, arguments } => {
                format!("new {}({})", self.print(*callee), self.list(arguments, ", "))
            }
            NodeKind::BinaryExpression { operator, left, right } => {
                format!("{} {} {}", self.print(*left), operator.as_str(), self.print(*right))
            }
            NodeKind::LogicalExpression { operator, left, right } => {
                format!("{} {} {}", self.print(*left), operator.as_str(), self.print(*right))
            }
            NodeKind::UnaryExpression { operator, argument } => {
                if operator.is_keyword() {
                    format!("{} {}", operator.as_str(), self.print(*argument))
                } else {
                    format!("{}{}", operator.as_str(), self.print(*argument))
                }
            }
            NodeKind::UpdateExpression { operator, argument, prefix } => {
                if *prefix {
                    format!("{}{}", operator.as_str(), self.print(*argument))
                } else {
                    format!("{}{}", self.print(*argument), operator.as_str())
                }
            }
            NodeKind::AssignmentExpression { operator, left, right } => {
                format!("{} {} {}", self.print(*left), operator.as_str(), self.print(*right))
            }
            NodeKind::ConditionalExpression { test, consequent, alternate } => format!(
                "{} ? {} : {}",
                self.print(*test),
                self.print(*consequent),
                self.print(*alternate)
            ),
            NodeKind::SequenceExpression { expressions } => self.list(expressions, ", "),
            NodeKind::ObjectExpression { properties } | NodeKind::ObjectPattern { properties } => {
                if properties.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{ {} }}", self.list(properties, ", "))
                }
            }
            NodeKind::ObjectProperty { key, value, computed, shorthand } => {
                if *shorthand {
                    self.print(*value)
                } else if *computed {
                    format!("[{}]: {}", self.print(*key), self.print(*value))
                } else {
                    format!("{}: {}", self.print(*key), self.print(*value))
                }
            }
            NodeKind::ArrayExpression { elements } | NodeKind::ArrayPattern { elements } => {
                format!("[{}]", self.list(elements, ", "))
            }
            NodeKind::TypeCastExpression { expression, type_annotation } => {
                format!("({}: {type_annotation})", self.print(*expression))
            }
            NodeKind::AssignmentPattern { left, right } => {
                format!("{} = {}", self.print(*left), self.print(*right))
            }
            NodeKind::RestElement { argument } => format!("...{}", self.print(*argument)),
            NodeKind::ImportDeclaration { specifiers, source } => {
                let source = self.print(*source);
                if specifiers.is_empty() {
                    return format!("import {source};");
                }
                let mut parts = Vec::new();
                let mut named = Vec::new();
                for &spec in specifiers {
                    if ast.is(spec, NodeType::ImportSpecifier) {
                        named.push(self.print(spec));
                    } else {
                        parts.push(self.print(spec));
                    }
                }
                if !named.is_empty() {
                    parts.push(format!("{{ {} }}", named.join(", ")));
                }
                format!("import {} from {source};", parts.join(", "))
            }
            NodeKind::ImportSpecifier { local, imported } => {
                let local_src = self.print(*local);
                let imported_src = self.print(*imported);
                if local_src == imported_src {
                    local_src
                } else {
                    format!("{imported_src} as {local_src}")
                }
            }
            NodeKind::ImportDefaultSpecifier { local } => self.print(*local),
            NodeKind::ImportNamespaceSpecifier { local } => format!("* as {}", self.print(*local)),
            NodeKind::ExportNamedDeclaration { declaration, specifiers, source } => {
                if let Some(declaration) = declaration {
                    return format!("export {}", self.print(*declaration));
                }
                let mut out = format!("export {{ {} }}", self.list(specifiers, ", "));
                if let Some(source) = source {
                    out.push_str(&format!(" from {}", self.print(*source)));
                }
                out.push(';');
                out
            }
            NodeKind::ExportSpecifier { local, exported } => {
                let local_src = self.print(*local);
                let exported_src = self.print(*exported);
                if local_src == exported_src {
                    local_src
                } else {
                    format!("{local_src} as {exported_src}")
                }
            }
            NodeKind::ExportDefaultDeclaration { declaration } => {
                let decl = self.print(*declaration);
                if ast.node_type(*declaration).is_statement() {
                    format!("export default {decl}")
                } else {
                    format!("export default {decl};")
                }
            }
        }
    }
}

fn escape_string(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '"' => r#"\""#.to_string(),
            '\\' => r"\\".to_string(),
            '\n' => r"\n".to_string(),
            '\r' => r"\r".to_string(),
            '\t' => r"\t".to_string(),
            c => c.to_string(),
        })
        .collect()
}
