//! The dispatch registry: indexes definitions by (origin item, origin model)
//! and performs the match.
//!
//! Write path and read path are fully separated. An [`IndexBuilder`]
//! accumulates definitions (startup, reload, programmatic registration),
//! enforces the structural rules, and freezes into an immutable
//! [`DispatchIndex`] with every group pre-sorted into dispatch order.
//! [`DispatchRegistry`] publishes whole indexes atomically, so concurrent
//! matches always observe one consistent snapshot and never block.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use thiserror::Error;

use crate::definition::ItemDefinition;
use crate::ident::Identifier;
use crate::predicate::{ItemContext, Predicate, RangeProperty};

/// Structural violations caught at registration time. Dispatch itself never
/// fails; overlapping predicates between definitions are resolved by
/// ordering, not rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Target identifiers are unique across the whole registry, not just
    /// within a group.
    #[error("target identifier {0} is already registered")]
    DuplicateTargetIdentifier(Identifier),
    /// At most one empty-predicate definition per (item, model) group.
    #[error("{item} (model {model}) already has fallback definition {existing}")]
    DuplicateFallback {
        item: Identifier,
        model: Identifier,
        existing: Identifier,
    },
}

/// Accumulates definitions and freezes them into a [`DispatchIndex`].
///
/// Build the entire new index off to the side, then hand it to
/// [`DispatchRegistry::publish`]; never edit a live index.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    // item -> model -> definitions in registration order
    groups: IndexMap<Identifier, IndexMap<Identifier, Vec<ItemDefinition>>>,
    targets: HashSet<Identifier>,
    definitions: usize,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition as a dispatch candidate for `origin_item` and the
    /// definition's own model.
    pub fn register(
        &mut self,
        origin_item: Identifier,
        definition: ItemDefinition,
    ) -> Result<(), RegistrationError> {
        if self.targets.contains(definition.target()) {
            return Err(RegistrationError::DuplicateTargetIdentifier(
                definition.target().clone(),
            ));
        }

        let group = self
            .groups
            .entry(origin_item.clone())
            .or_default()
            .entry(definition.model().clone())
            .or_default();

        if definition.is_fallback() {
            if let Some(existing) = group.iter().find(|d| d.is_fallback()) {
                return Err(RegistrationError::DuplicateFallback {
                    item: origin_item,
                    model: definition.model().clone(),
                    existing: existing.target().clone(),
                });
            }
        }

        self.targets.insert(definition.target().clone());
        group.push(definition);
        self.definitions += 1;
        Ok(())
    }

    pub fn definition_count(&self) -> usize {
        self.definitions
    }

    /// Sort every group into dispatch order and freeze. Ordering is computed
    /// once here, never per match.
    pub fn build(mut self) -> DispatchIndex {
        let mut groups = 0;
        for models in self.groups.values_mut() {
            for group in models.values_mut() {
                // Stable sort: registration order is the final tie-break.
                group.sort_by(dispatch_order);
                groups += 1;
            }
        }
        tracing::debug!(
            definitions = self.definitions,
            groups,
            "dispatch index built"
        );
        DispatchIndex {
            groups: self.groups,
            definitions: self.definitions,
        }
    }
}

/// Total dispatch order within one (item, model) group:
/// priority descending, then shared-key range-dispatch thresholds
/// descending, then predicate count descending. Callers rely on a stable
/// sort for the final registration-order tie-break.
fn dispatch_order(a: &ItemDefinition, b: &ItemDefinition) -> Ordering {
    b.priority()
        .cmp(&a.priority())
        .then_with(|| range_threshold_order(a, b))
        .then_with(|| b.predicates().len().cmp(&a.predicates().len()))
}

/// Tie-break on similar range-dispatch predicates: when both definitions
/// carry a range-dispatch predicate on the same (property, index, normalize)
/// key, the one with the higher maximum threshold on that key sorts first,
/// so narrower numeric bands are tried before wider ones. Keys are visited
/// in their own canonical order, independent of which definition carries
/// them, which keeps the comparator symmetric and the resulting order
/// registration-independent. Definitions with no shared key compare equal
/// here and fall through to predicate count.
fn range_threshold_order(a: &ItemDefinition, b: &ItemDefinition) -> Ordering {
    let mut keys: Vec<_> = a
        .predicates()
        .iter()
        .chain(b.predicates())
        .filter_map(Predicate::range_key)
        .collect();
    keys.sort_unstable();
    keys.dedup();
    for key in keys {
        let (Some(max_a), Some(max_b)) = (max_threshold(a, key), max_threshold(b, key)) else {
            continue;
        };
        let order = max_b.total_cmp(&max_a);
        if order != Ordering::Equal {
            return order;
        }
    }
    Ordering::Equal
}

fn max_threshold(definition: &ItemDefinition, key: (RangeProperty, usize, bool)) -> Option<f64> {
    definition
        .predicates()
        .iter()
        .filter_map(|p| match p {
            Predicate::RangeDispatch(range) if range.key() == key => Some(range.threshold),
            _ => None,
        })
        .max_by(|a, b| f64::total_cmp(a, b))
}

/// Immutable, fully-sorted dispatch index. Matching is a linear scan of the
/// precomputed group list; it performs no allocation and cannot fail.
#[derive(Debug, Default)]
pub struct DispatchIndex {
    groups: IndexMap<Identifier, IndexMap<Identifier, Vec<ItemDefinition>>>,
    definitions: usize,
}

impl DispatchIndex {
    /// The first definition in dispatch order whose predicate strategy
    /// evaluates true against `context`, or `None`. An unknown group is the
    /// `None` case, not an error.
    pub fn matches(
        &self,
        origin_item: &Identifier,
        origin_model: &Identifier,
        context: &ItemContext,
    ) -> Option<&ItemDefinition> {
        self.definitions_for(origin_item, origin_model)
            .iter()
            .find(|definition| definition.matches(context))
    }

    /// The group's definitions in dispatch order. Exposed for diagnostics
    /// and dumps; empty for unknown groups.
    pub fn definitions_for(
        &self,
        origin_item: &Identifier,
        origin_model: &Identifier,
    ) -> &[ItemDefinition] {
        self.groups
            .get(origin_item)
            .and_then(|models| models.get(origin_model))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All groups in registration order, for operator-facing reports.
    pub fn groups(
        &self,
    ) -> impl Iterator<Item = (&Identifier, &Identifier, &[ItemDefinition])> {
        self.groups.iter().flat_map(|(item, models)| {
            models
                .iter()
                .map(move |(model, group)| (item, model, group.as_slice()))
        })
    }

    pub fn definition_count(&self) -> usize {
        self.definitions
    }

    pub fn is_empty(&self) -> bool {
        self.definitions == 0
    }
}

/// Shared handle the translation layer matches against.
///
/// Read extremely often (per item seen, across many concurrent sessions),
/// written rarely (startup, explicit reload). Readers take a cheap atomic
/// snapshot and never coordinate with writers; a reload builds a complete
/// new index and swaps it in whole.
#[derive(Debug, Default)]
pub struct DispatchRegistry {
    index: ArcSwap<DispatchIndex>,
}

impl DispatchRegistry {
    /// Starts empty: every match is `None` until an index is published.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the entire index. In-flight matches keep the
    /// snapshot they already hold.
    pub fn publish(&self, index: DispatchIndex) {
        tracing::info!(definitions = index.definition_count(), "dispatch index published");
        self.index.store(Arc::new(index));
    }

    /// The current index snapshot. Hold it for a batch of matches; it stays
    /// consistent even across a concurrent reload.
    pub fn snapshot(&self) -> Arc<DispatchIndex> {
        self.index.load_full()
    }
}
