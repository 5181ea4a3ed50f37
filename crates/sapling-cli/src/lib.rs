//! Sapling CLI - command-line front end for the sapling traversal engine
//!
//! Reads a program tree serialized as JSON, then renders it, reports its
//! scopes and inferred types, or runs built-in rewrite rules over it.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use sapling_core::transform::{ConstantInliner, StrictMode};
use sapling_core::{
    Ast, BindingKind, NodeType, RewriteRule, ScopeId, Session, SessionConfig, ToSource,
    TransformationSummary, Transformer, VisitorTable,
};
use serde::Serialize;
use tracing::{debug, info};

/// Names accepted by `--rule`.
pub const RULE_NAMES: &[&str] = &["strict-mode", "constant-inliner"];

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub max_depth: Option<usize>,
    pub noscope: bool,
}

impl CliOptions {
    pub fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::default().with_noscope(self.noscope);
        if let Some(max_depth) = self.max_depth {
            config = config.with_max_depth(max_depth);
        }
        config
    }
}

/// Load a program tree from a JSON file.
pub fn load_ast(path: &Path) -> Result<Ast> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let ast: Ast = serde_json::from_str(&text).with_context(|| format!("{} is not a valid AST", path.display()))?;
    match ast.root() {
        Some(root) if ast.contains(root) && ast.is(root, NodeType::Program) => Ok(ast),
        Some(_) => bail!("{}: root must be a Program node", path.display()),
        None => bail!("{}: AST has no root", path.display()),
    }
}

pub fn open_session(path: &Path, options: &CliOptions) -> Result<Session> {
    let ast = load_ast(path)?;
    debug!(nodes = ast.len(), "loaded AST");
    Ok(Session::with_config(ast, options.session_config()))
}

/// Render the whole program.
pub fn render(session: &Session) -> String {
    session.ast().to_source(session.ast())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindingReport {
    pub name: String,
    pub kind: BindingKind,
    pub constant: bool,
    pub references: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeReport {
    pub id: ScopeId,
    pub block: NodeType,
    pub parent: Option<ScopeId>,
    pub bindings: Vec<BindingReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentifierType {
    pub name: String,
    #[serde(rename = "type")]
    pub annotation: String,
}

/// Everything `inspect` reports about a program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectReport {
    pub scopes: Vec<ScopeReport>,
    pub globals: Vec<String>,
    pub completion_records: Vec<String>,
    pub identifier_types: Vec<IdentifierType>,
}

pub fn inspect(session: &mut Session) -> Result<InspectReport> {
    let root = session.root_path();
    let program_scope = session.scope_of(root);

    let ids: Vec<ScopeId> = session.scope_ids().collect();
    let scopes = ids
        .into_iter()
        .map(|id| {
            let scope = session.scope(id);
            ScopeReport {
                id,
                block: scope.block_type,
                parent: scope.parent,
                bindings: scope
                    .bindings
                    .values()
                    .map(|binding| BindingReport {
                        name: binding.name.clone(),
                        kind: binding.kind,
                        constant: binding.is_constant(),
                        references: binding.references(),
                    })
                    .collect(),
            }
        })
        .collect();

    let mut globals: Vec<String> = session.scope(program_scope).globals().map(str::to_string).collect();
    globals.sort();

    let completion_records = session
        .get_completion_records(root)
        .into_iter()
        .filter_map(|path| session.node(path))
        .map(|node| node.to_source(session.ast()))
        .collect();

    let identifier_types = RefCell::new(Vec::new());
    let mut table = VisitorTable::new().enter(NodeType::Identifier, |s: &mut Session, path| {
        if !s.is_referenced_identifier(path) {
            return Ok(());
        }
        let name = s.identifier_name(path).unwrap_or_default().to_string();
        let annotation = s.get_type_annotation(path).to_string();
        identifier_types.borrow_mut().push(IdentifierType { name, annotation });
        Ok(())
    });
    session.traverse(&mut table).context("failed to walk the program")?;
    drop(table);

    Ok(InspectReport {
        scopes,
        globals,
        completion_records,
        identifier_types: identifier_types.into_inner(),
    })
}

/// Plain-text form of an [`InspectReport`].
pub fn format_report(report: &InspectReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "scopes:");
    for scope in &report.scopes {
        match scope.parent {
            Some(parent) => {
                let _ = writeln!(out, "  {} {} (parent {})", scope.id, scope.block, parent);
            }
            None => {
                let _ = writeln!(out, "  {} {}", scope.id, scope.block);
            }
        }
        for binding in &scope.bindings {
            let constant = if binding.constant { "constant" } else { "reassigned" };
            let _ = writeln!(
                out,
                "    {}: {}, {constant}, references: {}",
                binding.name, binding.kind, binding.references
            );
        }
    }
    if !report.globals.is_empty() {
        let _ = writeln!(out, "globals: {}", report.globals.join(", "));
    }
    let _ = writeln!(out, "completion records:");
    for record in &report.completion_records {
        let _ = writeln!(out, "  {record}");
    }
    let _ = writeln!(out, "identifier types:");
    for ty in &report.identifier_types {
        let _ = writeln!(out, "  {}: {}", ty.name, ty.annotation);
    }
    out
}

/// Build a built-in rule by name.
pub fn rule_by_name(name: &str) -> Result<Box<dyn RewriteRule>> {
    match name {
        "strict-mode" => Ok(Box::new(StrictMode::new())),
        "constant-inliner" => Ok(Box::new(ConstantInliner::new())),
        other => bail!("unknown rule `{other}` (available: {})", RULE_NAMES.join(", ")),
    }
}

/// Run the named rules, highest priority first.
pub fn transform(session: &mut Session, rules: &[String]) -> Result<TransformationSummary> {
    if rules.is_empty() {
        bail!("no rules given; pass --rule with one of: {}", RULE_NAMES.join(", "));
    }
    let mut transformer = Transformer::new();
    for name in rules {
        transformer.add_rule(rule_by_name(name)?);
    }
    let summary = transformer.run(session)?;
    for stats in transformer.stats().values() {
        debug!(
            rule = %stats.rule_name,
            transformations = stats.transformations,
            average_ms = stats.average_time_ms(),
            "rule statistics"
        );
    }
    info!(mutations = summary.mutations, rules = ?summary.rules_applied, "transform complete");
    Ok(summary)
}

/// Serialize the session's tree back to JSON.
pub fn to_json(session: &Session) -> Result<String> {
    serde_json::to_string_pretty(session.ast()).context("failed to serialize AST")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_rule_lists_choices() {
        let err = rule_by_name("minify").err().map(|e| e.to_string());
        assert_eq!(
            err.as_deref(),
            Some("unknown rule `minify` (available: strict-mode, constant-inliner)")
        );
    }

    #[test]
    fn test_session_config_from_options() {
        let options = CliOptions { max_depth: Some(64), noscope: true };
        let config = options.session_config();
        assert_eq!(config.max_depth, 64);
        assert!(config.noscope);
        assert_eq!(CliOptions::default().session_config().max_depth, 10_000);
    }
}
