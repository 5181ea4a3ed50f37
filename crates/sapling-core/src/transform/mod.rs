/*!
# Rewrite Rules

A [`RewriteRule`] contributes one visitor table; a [`Transformer`] runs its
registered rules over a session, highest priority first, each as its own
traversal, and keeps per-rule statistics.

```rust,ignore
use sapling_core::transform::{rules::StrictMode, Transformer};

let mut transformer = Transformer::new();
transformer.add_rule(Box::new(StrictMode::new()));
let summary = transformer.run(&mut session)?;
```
*/

use std::time::Instant;

use anyhow::Context;
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::session::Session;
use crate::traverse::VisitorTable;

pub mod rules;

pub use rules::{ConstantInliner, StrictMode};

/// A tree rewrite expressed as a visitor table.
pub trait RewriteRule {
    /// Human-readable name for this rule
    fn name(&self) -> &'static str;

    /// What the rule rewrites
    fn description(&self) -> &'static str;

    /// Priority for rule ordering (higher priority runs first)
    fn priority(&self) -> u32 {
        100
    }

    /// Handlers for one traversal of the tree.
    fn visitor(&self) -> VisitorTable<'_>;
}

/// Rule execution statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleStats {
    pub rule_name: String,
    /// Traversals run with this rule
    pub applications: u64,
    /// Mutations the rule made through the path API
    pub transformations: u64,
    pub errors: u64,
    pub total_time_ms: u64,
}

impl RuleStats {
    pub fn new(rule_name: impl Into<String>) -> Self {
        Self { rule_name: rule_name.into(), ..Self::default() }
    }

    pub fn average_time_ms(&self) -> f64 {
        if self.applications == 0 {
            0.0
        } else {
            (self.total_time_ms as f64) / (self.applications as f64)
        }
    }
}

/// Outcome of a [`Transformer::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformationSummary {
    pub rules_run: u64,
    /// Rules that changed the tree
    pub rules_applied: Vec<String>,
    pub mutations: u64,
    pub nodes_visited: u64,
    /// Rules whose traversal ended through `stop`
    pub stopped: Vec<String>,
}

impl TransformationSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, other: TransformationSummary) {
        self.rules_run += other.rules_run;
        self.rules_applied.extend(other.rules_applied);
        self.mutations += other.mutations;
        self.nodes_visited += other.nodes_visited;
        self.stopped.extend(other.stopped);
    }

    pub fn changed(&self) -> bool {
        self.mutations > 0
    }
}

/// Runs rewrite rules in priority order.
#[derive(Default)]
pub struct Transformer {
    rules: Vec<Box<dyn RewriteRule>>,
    stats: IndexMap<String, RuleStats>,
}

impl Transformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule. Rules of equal priority keep registration order.
    pub fn add_rule(&mut self, rule: Box<dyn RewriteRule>) {
        let rule_name = rule.name().to_string();
        self.stats.insert(rule_name.clone(), RuleStats::new(rule_name));
        self.rules.push(rule);
        self.rules.sort_by_key(|rule| std::cmp::Reverse(rule.priority()));
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Run every rule once. The first failing rule aborts the run.
    pub fn run(&mut self, session: &mut Session) -> anyhow::Result<TransformationSummary> {
        let mut summary = TransformationSummary::new();
        for rule in &self.rules {
            let name = rule.name();
            let stats = self.stats.entry(name.to_string()).or_insert_with(|| RuleStats::new(name));
            stats.applications += 1;

            let before = session.mutation_count();
            let start = Instant::now();
            let mut table = rule.visitor();
            let result = session.traverse(&mut table);
            drop(table);
            stats.total_time_ms += start.elapsed().as_millis() as u64;

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(err) => {
                    stats.errors += 1;
                    return Err(err).with_context(|| format!("rule `{name}` failed"));
                }
            };
            let mutations = session.mutation_count() - before;
            stats.transformations += mutations;
            debug!(rule = name, mutations, visited = outcome.visited, "rule finished");

            summary.rules_run += 1;
            summary.mutations += mutations;
            summary.nodes_visited += outcome.visited as u64;
            if mutations > 0 {
                summary.rules_applied.push(name.to_string());
            }
            if outcome.stopped {
                summary.stopped.push(name.to_string());
            }
        }
        info!(rules = summary.rules_run, mutations = summary.mutations, "transformation finished");
        Ok(summary)
    }

    /// Get transformation statistics
    pub fn stats(&self) -> &IndexMap<String, RuleStats> {
        &self.stats
    }
}
