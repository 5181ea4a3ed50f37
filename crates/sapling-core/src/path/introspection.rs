//! Questions about a path that never mutate the tree.

use crate::ast::{validators, Child, Field, NodeId, NodeKind, NodeType};
use crate::scope::BindingKind;
use crate::session::Session;

use super::{Container, Key, PathId};

/// Relative execution order of two paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionStatus {
    Before,
    After,
    Unknown,
}

impl Session {
    /// Does the member chain at this path match a dotted pattern such as
    /// `React.createClass`? `*` matches any one segment; computed accesses
    /// match only through string literal keys.
    pub fn matches_pattern(&self, path: PathId, pattern: &str, allow_partial: bool) -> bool {
        let Some(node) = self.node(path) else {
            return false;
        };
        if !self.ast.is(node, NodeType::MemberExpression) {
            return false;
        }
        let parts: Vec<&str> = pattern.split('.').collect();

        let mut segments = Vec::new();
        let mut current = node;
        while let NodeKind::MemberExpression { object, property, computed } = self.ast.kind(current) {
            let segment = match self.ast.kind(*property) {
                NodeKind::Identifier { name, .. } if !computed => Some(name.as_str()),
                NodeKind::StringLiteral { value } => Some(value.as_str()),
                _ => None,
            };
            segments.push(segment);
            current = *object;
        }
        segments.push(match self.ast.kind(current) {
            NodeKind::Identifier { name, .. } => Some(name.as_str()),
            NodeKind::ThisExpression => Some("this"),
            _ => None,
        });
        segments.reverse();

        if segments.len() < parts.len() || (!allow_partial && segments.len() > parts.len()) {
            return false;
        }
        parts
            .iter()
            .zip(&segments)
            .all(|(part, segment)| matches!(segment, Some(value) if *part == "*" || part == value))
    }

    /// Follow declarators, constant bindings and type casts (and, when
    /// `dangerous`, member accesses into literal objects and arrays) to the
    /// expression a path stands for. Unresolvable input and cycles yield the
    /// path itself.
    pub fn resolve(&mut self, path: PathId, dangerous: bool) -> PathId {
        let mut resolved = Vec::new();
        self.resolve_inner(path, dangerous, &mut resolved).unwrap_or(path)
    }

    fn resolve_or_self(&mut self, path: PathId, dangerous: bool, resolved: &mut Vec<PathId>) -> PathId {
        self.resolve_inner(path, dangerous, resolved).unwrap_or(path)
    }

    fn resolve_inner(&mut self, path: PathId, dangerous: bool, resolved: &mut Vec<PathId>) -> Option<PathId> {
        if resolved.contains(&path) {
            return None;
        }
        resolved.push(path);
        let ty = self.node_type(path)?;

        match ty {
            NodeType::VariableDeclarator => {
                let id = self.get(path, Field::Id);
                if !self.is(id, NodeType::Identifier) {
                    return None;
                }
                let init = self.get(path, Field::Init);
                Some(self.resolve_or_self(init, dangerous, resolved))
            }
            NodeType::Identifier if self.is_referenced_identifier(path) => {
                let binding = self.binding_for(path)?;
                if !binding.is_constant() || binding.kind == BindingKind::Module || binding.path == path {
                    return None;
                }
                let target = self.resolve_or_self(binding.path, dangerous, resolved);
                let target_node = self.node(target);
                if self.find(path, |s, p| s.node(p) == target_node).is_some() {
                    return None;
                }
                Some(target)
            }
            NodeType::TypeCastExpression => {
                let inner = self.get(path, Field::Expression);
                Some(self.resolve_or_self(inner, dangerous, resolved))
            }
            NodeType::MemberExpression if dangerous => {
                let node = self.node(path)?;
                let NodeKind::MemberExpression { property, computed, .. } = self.ast.kind(node) else {
                    return None;
                };
                let (property, computed) = (*property, *computed);
                if computed && !self.ast.node_type(property).is_literal() {
                    return None;
                }
                let name = validators::static_key(&self.ast, property, computed)?;
                let object = self.get(path, Field::Object);
                let target = self.resolve_or_self(object, dangerous, resolved);
                match self.node_type(target)? {
                    NodeType::ObjectExpression => {
                        let mut properties = self.get_list(target, Field::Properties);
                        properties.reverse();
                        for prop in properties {
                            let Some(NodeKind::ObjectProperty { key, computed, .. }) = self.kind(prop) else {
                                continue;
                            };
                            if validators::static_key(&self.ast, *key, *computed).as_deref() == Some(name.as_str()) {
                                let value = self.get(prop, Field::Value);
                                return Some(self.resolve_or_self(value, dangerous, resolved));
                            }
                        }
                        None
                    }
                    NodeType::ArrayExpression => {
                        let index: usize = name.parse().ok()?;
                        let element = self.get_index(target, Field::Elements, index);
                        self.node(element)?;
                        Some(self.resolve_or_self(element, dangerous, resolved))
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Is this identifier bound by an import of `name` from `source`?
    /// `name` is `default` for default imports, `*` for namespace imports
    /// and `None` for any import from the source.
    pub fn references_import(&mut self, path: PathId, source: &str, name: Option<&str>) -> bool {
        if !self.is_referenced_identifier(path) {
            return false;
        }
        let Some(binding) = self.binding_for(path) else {
            return false;
        };
        if binding.kind != BindingKind::Module {
            return false;
        }
        let specifier = binding.path;
        let Some(declaration) = self.parent_path(specifier) else {
            return false;
        };
        let Some(NodeKind::ImportDeclaration { source: source_node, .. }) = self.kind(declaration) else {
            return false;
        };
        if !matches!(self.ast.kind(*source_node), NodeKind::StringLiteral { value } if value == source) {
            return false;
        }
        let Some(name) = name else {
            return true;
        };
        match self.kind(specifier) {
            Some(NodeKind::ImportDefaultSpecifier { .. }) => name == "default",
            Some(NodeKind::ImportNamespaceSpecifier { .. }) => name == "*",
            Some(NodeKind::ImportSpecifier { imported, .. }) => self.ast.identifier_name(*imported) == Some(name),
            _ => false,
        }
    }

    /// Is `field` populated: a present node or a non-empty list.
    pub fn has(&self, path: PathId, field: Field) -> bool {
        match self.kind(path).and_then(|kind| kind.child(field)) {
            Some(Child::Node(node)) => node.is_some(),
            Some(Child::List(list)) => !list.is_empty(),
            None => false,
        }
    }

    /// Is this path's value the completion value of its enclosing program
    /// (or of its function, with `allow_inside_function`)?
    pub fn is_completion_record(&self, path: PathId, allow_inside_function: bool) -> bool {
        let mut current = path;
        let mut first = true;
        loop {
            if !first && self.node_type(current).is_some_and(NodeType::is_function) {
                return allow_inside_function;
            }
            first = false;
            if let (Container::List { parent, field }, Key::Index(index)) = (self.container(current), self.key(current)) {
                if index + 1 != self.list_len(parent, field) {
                    return false;
                }
            }
            match self.parent_path(current) {
                Some(parent) if !self.is(parent, NodeType::Program) => current = parent,
                _ => return true,
            }
        }
    }

    /// Does this path sit in a slot that accepts either one statement or a
    /// block (`if` branches, loop bodies)?
    pub fn is_statement_or_block(&self, path: PathId) -> bool {
        if self.parent_type(path) == Some(NodeType::LabeledStatement) || self.in_list(path) {
            return false;
        }
        matches!(
            self.key(path),
            Key::Field(Field::Consequent | Field::Body | Field::Alternate)
        ) && !self.parent_type(path).is_some_and(NodeType::is_function)
    }

    /// Is this the `init` of a `for` or the `left` of a `for-in`/`for-of`?
    pub fn can_have_variable_declaration_or_expression(&self, path: PathId) -> bool {
        matches!(self.key(path), Key::Field(Field::Init | Field::Left))
            && self.parent_type(path).is_some_and(NodeType::is_for)
    }

    /// Can this arrow function body switch between expression and block
    /// form when replaced with `replacement`?
    pub fn can_swap_between_expression_and_statement(&self, path: PathId, replacement: NodeId) -> bool {
        if self.key(path) != Key::Field(Field::Body)
            || self.parent_type(path) != Some(NodeType::ArrowFunctionExpression)
        {
            return false;
        }
        let replacement = self.ast.node_type(replacement);
        match self.node_type(path) {
            Some(NodeType::BlockStatement) => replacement.is_expression(),
            Some(ty) if ty.is_expression() => replacement == NodeType::BlockStatement,
            _ => false,
        }
    }

    /// Is this an identifier read as a value (not a binding site, property
    /// name or label)?
    pub fn is_referenced_identifier(&self, path: PathId) -> bool {
        self.is(path, NodeType::Identifier) && self.is_referenced(path)
    }

    pub fn is_referenced(&self, path: PathId) -> bool {
        match (self.parent_node(path), self.field(path)) {
            (Some(parent), Some(field)) => validators::is_referenced(&self.ast, parent, field),
            _ => false,
        }
    }

    /// Original source text of this path's node, or an empty string.
    pub fn get_source(&self, path: PathId) -> String {
        self.node(path)
            .and_then(|node| self.ast.source_of(node))
            .map(str::to_string)
            .unwrap_or_default()
    }

    pub fn will_execute_before(&mut self, path: PathId, target: PathId) -> bool {
        self.guess_execution_status_relative_to(path, target) == ExecutionStatus::Before
    }

    pub fn will_maybe_execute_before(&mut self, path: PathId, target: PathId) -> bool {
        self.guess_execution_status_relative_to(path, target) != ExecutionStatus::After
    }

    /// Heuristic order of this path relative to `target`.
    ///
    /// Inside one function the answer comes from tree position. Across
    /// functions only named function declarations that are exclusively
    /// called directly, with all call sites agreeing, produce an answer.
    pub fn guess_execution_status_relative_to(&mut self, path: PathId, target: PathId) -> ExecutionStatus {
        let mut in_progress = Vec::new();
        self.guess_status(path, target, &mut in_progress)
    }

    /// Nearest enclosing function or program. A function's own position
    /// belongs to the function around it.
    fn execution_parent(&self, path: PathId) -> Option<PathId> {
        let start = if self.node_type(path).is_some_and(NodeType::is_function) {
            self.parent_path(path)?
        } else {
            path
        };
        self.find(start, |s, p| {
            s.node_type(p).is_some_and(|ty| ty.is_function() || ty == NodeType::Program)
        })
    }

    fn guess_status(&mut self, path: PathId, target: PathId, in_progress: &mut Vec<NodeId>) -> ExecutionStatus {
        let self_function = self.execution_parent(path);
        let target_function = self.execution_parent(target);
        let self_node = self_function.and_then(|p| self.node(p));
        let target_node = target_function.and_then(|p| self.node(p));

        if self_node != target_node {
            if let Some(function) = target_function {
                let status =
                    self.status_through_calls(function, in_progress, |s, call, guard| s.guess_status(path, call, guard));
                if let Some(status) = status {
                    return status;
                }
            }
            if let Some(function) = self_function {
                if self.has_references(function) {
                    let status = self
                        .status_through_calls(function, in_progress, |s, call, guard| s.guess_status(call, target, guard));
                    if let Some(status) = status {
                        return status;
                    }
                }
            }
            return ExecutionStatus::Unknown;
        }
        self.guess_status_same_function(path, target)
    }

    fn has_references(&mut self, function: PathId) -> bool {
        let id = self.get(function, Field::Id);
        self.binding_for(id).is_some_and(|binding| binding.is_referenced())
    }

    /// Agreeing status over every direct call site of the named function
    /// declaration at `function`. `None` when the function is anonymous,
    /// exported, referenced other than as a callee, already being examined,
    /// or the call sites disagree.
    fn status_through_calls(
        &mut self,
        function: PathId,
        in_progress: &mut Vec<NodeId>,
        mut status_at: impl FnMut(&mut Session, PathId, &mut Vec<NodeId>) -> ExecutionStatus,
    ) -> Option<ExecutionStatus> {
        if !self.is(function, NodeType::FunctionDeclaration)
            || self.parent_type(function).is_some_and(NodeType::is_export_declaration)
        {
            return None;
        }
        let function_node = self.node(function)?;
        if in_progress.contains(&function_node) {
            return None;
        }
        let id = self.get(function, Field::Id);
        let binding = self.binding_for(id)?;
        if !binding.is_referenced() {
            return Some(ExecutionStatus::Before);
        }

        in_progress.push(function_node);
        let mut agreed = None;
        for reference in binding.reference_paths {
            let is_call = self.key(reference) == Key::Field(Field::Callee)
                && self.parent_type(reference) == Some(NodeType::CallExpression);
            if !is_call {
                agreed = None;
                break;
            }
            // Recursive calls do not order the function against outside code.
            if self.find(reference, |s, p| s.node(p) == Some(function_node)).is_some() {
                continue;
            }
            let status = status_at(self, reference, in_progress);
            if status == ExecutionStatus::Unknown || agreed.is_some_and(|prev| prev != status) {
                agreed = None;
                break;
            }
            agreed = Some(status);
        }
        in_progress.retain(|&n| n != function_node);
        agreed
    }

    fn guess_status_same_function(&mut self, path: PathId, target: PathId) -> ExecutionStatus {
        let self_paths = self.get_ancestry(path);
        let target_paths = self.get_ancestry(target);
        let target_nodes: Vec<Option<NodeId>> = target_paths.iter().map(|&p| self.node(p)).collect();

        let mut common = None;
        for (self_index, &ancestor) in self_paths.iter().enumerate() {
            let node = self.node(ancestor);
            if node.is_none() {
                continue;
            }
            if let Some(target_index) = target_nodes.iter().position(|&n| n == node) {
                common = Some((self_index, target_index, ancestor));
                break;
            }
        }
        let Some((self_index, target_index, common_path)) = common else {
            return ExecutionStatus::Unknown;
        };
        if self_index == 0 || target_index == 0 {
            return ExecutionStatus::After;
        }
        let self_relation = self_paths[self_index - 1];
        let target_relation = target_paths[target_index - 1];

        let (self_container, target_container) = (self.container(self_relation), self.container(target_relation));
        if matches!(self_container, Container::List { .. }) && self_container == target_container {
            return match (self.index(self_relation), self.index(target_relation)) {
                (Some(a), Some(b)) if a < b => ExecutionStatus::Before,
                (Some(_), Some(_)) => ExecutionStatus::After,
                _ => ExecutionStatus::Unknown,
            };
        }

        let Some(common_type) = self.node_type(common_path) else {
            return ExecutionStatus::Unknown;
        };
        let keys = common_type.visitor_keys();
        let position = |field: Option<Field>| field.and_then(|f| keys.iter().position(|&k| k == f));
        match (position(self.field(self_relation)), position(self.field(target_relation))) {
            (Some(a), Some(b)) if a < b => ExecutionStatus::Before,
            (Some(_), Some(_)) => ExecutionStatus::After,
            _ => ExecutionStatus::Unknown,
        }
    }
}
