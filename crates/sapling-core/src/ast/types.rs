use serde::{Deserialize, Serialize};
use std::fmt;

/// Flow-style type annotation attached to identifiers, functions and casts,
/// and produced by inference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of")]
pub enum TypeAnnotation {
    Any,
    Mixed,
    Number,
    String,
    Boolean,
    Void,
    Null,
    /// Named type such as `Array`, `Object`, `Function` or a class name.
    Generic(String),
    Union(Vec<TypeAnnotation>),
}

impl TypeAnnotation {
    pub fn generic(name: impl Into<String>) -> Self {
        TypeAnnotation::Generic(name.into())
    }

    /// Build a union, flattening nested unions and dropping duplicates.
    ///
    /// `Any` absorbs everything; a single member collapses to itself and no
    /// members yields `None`.
    pub fn union(types: impl IntoIterator<Item = TypeAnnotation>) -> Option<TypeAnnotation> {
        let mut members: Vec<TypeAnnotation> = Vec::new();
        let mut pending: Vec<TypeAnnotation> = types.into_iter().collect();
        pending.reverse();
        while let Some(ty) = pending.pop() {
            match ty {
                TypeAnnotation::Any => return Some(TypeAnnotation::Any),
                TypeAnnotation::Union(inner) => pending.extend(inner.into_iter().rev()),
                other => {
                    if !members.contains(&other) {
                        members.push(other);
                    }
                }
            }
        }
        match members.len() {
            0 => None,
            1 => members.pop(),
            _ => Some(TypeAnnotation::Union(members)),
        }
    }

    /// Annotation implied by a `typeof x === "<value>"` comparison.
    pub fn from_typeof(value: &str) -> Option<TypeAnnotation> {
        match value {
            "string" => Some(TypeAnnotation::String),
            "number" => Some(TypeAnnotation::Number),
            "undefined" => Some(TypeAnnotation::Void),
            "boolean" => Some(TypeAnnotation::Boolean),
            "function" => Some(TypeAnnotation::generic("Function")),
            "object" => Some(TypeAnnotation::generic("Object")),
            "symbol" => Some(TypeAnnotation::generic("Symbol")),
            _ => None,
        }
    }

    /// Does this annotation name the given base type (`string`, `number`,
    /// `boolean`, `any`, `mixed`, `void`, `null`)?
    pub fn is_base(&self, name: &str) -> bool {
        matches!(
            (name, self),
            ("string", TypeAnnotation::String)
                | ("number", TypeAnnotation::Number)
                | ("boolean", TypeAnnotation::Boolean)
                | ("any", TypeAnnotation::Any)
                | ("mixed", TypeAnnotation::Mixed)
                | ("void", TypeAnnotation::Void)
                | ("null", TypeAnnotation::Null)
        )
    }
}

impl fmt::Display for TypeAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeAnnotation::Any => f.write_str("any"),
            TypeAnnotation::Mixed => f.write_str("mixed"),
            TypeAnnotation::Number => f.write_str("number"),
            TypeAnnotation::String => f.write_str("string"),
            TypeAnnotation::Boolean => f.write_str("boolean"),
            TypeAnnotation::Void => f.write_str("void"),
            TypeAnnotation::Null => f.write_str("null"),
            TypeAnnotation::Generic(name) => f.write_str(name),
            TypeAnnotation::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
        }
    }
}
