//! Operator-facing dump of a dispatch index: every group in dispatch
//! order, so overlapping definitions can be reasoned about without a
//! debugger.

use std::fmt::Write;

use conduit_engine::definition::ItemDefinition;
use conduit_engine::predicate::PredicateStrategy;
use conduit_engine::registry::DispatchIndex;

/// Render the whole index as a plain-text report.
pub fn render(index: &DispatchIndex) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} custom item definitions",
        index.definition_count()
    );
    for (item, model, definitions) in index.groups() {
        let _ = writeln!(out, "{item} / {model} ({} definitions):", definitions.len());
        for definition in definitions {
            let _ = writeln!(out, "  {}", describe(definition));
        }
    }
    out
}

fn describe(definition: &ItemDefinition) -> String {
    let strategy = match definition.strategy() {
        PredicateStrategy::And => "all of",
        PredicateStrategy::Or => "any of",
    };
    if definition.is_fallback() {
        format!("[priority {:>3}] {} (fallback)", definition.priority(), definition.target())
    } else {
        format!(
            "[priority {:>3}] {} ({} {} predicates)",
            definition.priority(),
            definition.target(),
            strategy,
            definition.predicates().len(),
        )
    }
}
