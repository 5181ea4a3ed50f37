//! Types of referenced identifiers, from their binding's declaration and
//! reassignments and from the conditions guarding the reference.

use std::collections::VecDeque;

use crate::ast::{BinaryOperator, Field, NodeKind, NodeType, TypeAnnotation, UnaryOperator};
use crate::path::introspection::ExecutionStatus;
use crate::path::{Key, PathId};
use crate::scope::Binding;
use crate::session::Session;

impl Session {
    pub(super) fn infer_reference(&mut self, path: PathId, name: &str) -> Option<TypeAnnotation> {
        if !self.is_referenced(path) {
            return None;
        }
        if let Some(binding) = self.binding_for(path) {
            if let NodeKind::Identifier { type_annotation: Some(annotation), .. } = self.ast.kind(binding.identifier) {
                return Some(annotation.clone());
            }
            return self.infer_from_violations(path, name, &binding);
        }
        match name {
            "undefined" => Some(TypeAnnotation::Void),
            "NaN" | "Infinity" => Some(TypeAnnotation::Number),
            _ => None,
        }
    }

    /// Union of every assignment that runs before `path`, with a guarding
    /// condition overriding assignments made before that condition.
    /// Assignments whose order cannot be told always contribute.
    fn infer_from_violations(&mut self, path: PathId, name: &str, binding: &Binding) -> Option<TypeAnnotation> {
        let mut types = Vec::new();
        let (mut violations, unordered) = self.violations_before(binding, path);

        if let Some((narrowed, conditional)) = self.conditional_annotation(path, name) {
            let (before_test, _) = self.violations_before(binding, conditional);
            violations.retain(|violation| !before_test.contains(violation));
            types.push(narrowed);
        }
        violations.extend(unordered);
        for violation in violations {
            types.push(self.get_type_annotation(violation));
        }
        TypeAnnotation::union(types)
    }

    /// The declaration and reassignments of `binding` that execute before
    /// `path`, and separately those with no known order relative to it.
    fn violations_before(&mut self, binding: &Binding, path: PathId) -> (Vec<PathId>, Vec<PathId>) {
        let mut candidates = vec![binding.path];
        candidates.extend(binding.constant_violations.iter().copied());
        let mut before = Vec::new();
        let mut unordered = Vec::new();
        for violation in candidates {
            let resolved = self.resolve(violation, false);
            match self.guess_execution_status_relative_to(resolved, path) {
                ExecutionStatus::Before => before.push(violation),
                ExecutionStatus::Unknown => unordered.push(violation),
                ExecutionStatus::After => {}
            }
        }
        (before, unordered)
    }

    /// Nearest `if` or conditional expression whose branch holds `path`.
    /// A path inside the test is not narrowed by it.
    fn parent_conditional(&self, path: PathId) -> Option<PathId> {
        let mut current = path;
        while let Some(parent) = self.parent_path(current) {
            if matches!(
                self.node_type(parent),
                Some(NodeType::IfStatement | NodeType::ConditionalExpression)
            ) {
                if self.key(current) == Key::Field(Field::Test) {
                    return None;
                }
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// Type implied for `name` by the closest condition that says anything
    /// about it, searching through `&&` and `||`.
    fn conditional_annotation(&mut self, path: PathId, name: &str) -> Option<(TypeAnnotation, PathId)> {
        let conditional = self.parent_conditional(path)?;
        let test = self.get(conditional, Field::Test);
        let mut pending = VecDeque::from([test]);
        let mut types = Vec::new();
        while let Some(next) = pending.pop_front() {
            let next = self.resolve(next, false);
            match self.node_type(next) {
                Some(NodeType::LogicalExpression) => {
                    pending.push_back(self.get(next, Field::Left));
                    pending.push_back(self.get(next, Field::Right));
                }
                Some(NodeType::BinaryExpression) => types.extend(self.infer_from_comparison(name, next)),
                _ => {}
            }
        }
        match TypeAnnotation::union(types) {
            Some(annotation) => Some((annotation, conditional)),
            None => self.conditional_annotation(conditional, name),
        }
    }

    /// `x === expr` gives the type of `expr`; `x < n` and friends coerce to
    /// a number; `typeof x === "lit"` gives the named type.
    fn infer_from_comparison(&mut self, name: &str, path: PathId) -> Option<TypeAnnotation> {
        let Some(NodeKind::BinaryExpression { operator, .. }) = self.kind(path) else {
            return None;
        };
        let operator = *operator;
        let left = self.get(path, Field::Left);
        let left = self.resolve(left, false);
        let right = self.get(path, Field::Right);
        let right = self.resolve(right, false);

        let target = if self.identifier_name(left) == Some(name) {
            Some(right)
        } else if self.identifier_name(right) == Some(name) {
            Some(left)
        } else {
            None
        };
        if let Some(target) = target {
            return match operator {
                BinaryOperator::StrictEqual => Some(self.get_type_annotation(target)),
                _ if operator.is_numeric_comparison() => Some(TypeAnnotation::Number),
                _ => None,
            };
        }
        if operator != BinaryOperator::StrictEqual {
            return None;
        }

        let is_typeof = |s: &Session, p: PathId| {
            matches!(s.kind(p), Some(NodeKind::UnaryExpression { operator: UnaryOperator::Typeof, .. }))
        };
        let (typeof_path, literal) = if is_typeof(self, left) {
            (left, right)
        } else if is_typeof(self, right) {
            (right, left)
        } else {
            return None;
        };
        let literal = self.resolve(literal, false);
        let Some(NodeKind::StringLiteral { value }) = self.kind(literal) else {
            return None;
        };
        let value = value.clone();
        let argument = self.get(typeof_path, Field::Argument);
        if self.identifier_name(argument) != Some(name) {
            return None;
        }
        TypeAnnotation::from_typeof(&value)
    }
}
