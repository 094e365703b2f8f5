//! The predicate model: a closed set of boolean tests over an item's
//! evaluation context.
//!
//! Every variant knows how to invert itself, so negation never needs a
//! wrapping "not" node and stays closed over the enum. Evaluation is pure
//! and total: malformed or absent context data reads as `false`, never as
//! an error, which is what keeps the dispatch hot path panic-free.

pub mod context;

pub use context::{ItemContext, ProjectileKind};

use crate::ident::Identifier;

/// How a definition's predicate list combines into one boolean.
///
/// [`And`](PredicateStrategy::And) over an empty list is `true`; that is what
/// makes an empty-predicate definition a universal fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredicateStrategy {
    #[default]
    And,
    Or,
}

/// Pure boolean properties of the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionProperty {
    Damageable,
    Broken,
    Damaged,
    HasComponent(Identifier),
}

/// What a crossbow-style item is expected to be charged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeType {
    /// Matches only an empty projectile list.
    None,
    /// Matches any non-empty projectile list.
    Arrow,
    /// Requires at least one rocket among the projectiles.
    Rocket,
}

/// Equality tests of a context-derived value against a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchProperty {
    ChargeType(ChargeType),
    TrimMaterial(Identifier),
}

/// Numeric properties a range-dispatch predicate can threshold on.
/// `Damage` and `Count` have maximum accessors (max damage, max stack size)
/// consulted only when normalising.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RangeProperty {
    BundleFullness,
    Damage,
    Count,
    CustomModelData,
}

/// Threshold test on a numeric context property.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeDispatch {
    pub property: RangeProperty,
    /// Custom-model-data slot; ignored by the other properties.
    pub index: usize,
    pub threshold: f64,
    /// Divide the value by the property's maximum before comparing.
    pub normalize: bool,
    /// Inverts the comparison: `value < threshold` instead of
    /// `value >= threshold`. The two are exact complements, so negation only
    /// flips this flag.
    pub negated: bool,
}

impl RangeDispatch {
    /// The sort key two range-dispatch predicates must share to be
    /// comparable in dispatch ordering.
    pub fn key(&self) -> (RangeProperty, usize, bool) {
        (self.property, self.index, self.normalize)
    }
}

/// Literal for the indexed custom-model-data test.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    Bool(bool),
    Str(String),
}

/// A boolean test over an [`ItemContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `property(context) == expected`.
    Condition {
        property: ConditionProperty,
        expected: bool,
    },
    /// `value(context) matches literal`, inverted when `expected` is false.
    Match {
        property: MatchProperty,
        expected: bool,
    },
    RangeDispatch(RangeDispatch),
    /// Test against an indexed custom-model-data slot. The most common
    /// predicate in practice, so it gets its own variant instead of living
    /// inside `Condition`/`Match`.
    CustomFlag {
        index: usize,
        value: FlagValue,
        expected: bool,
    },
}

impl Predicate {
    /// The logical complement. Closed over the variant set: each variant
    /// flips its own flag.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Predicate::Condition { property, expected } => Predicate::Condition {
                property,
                expected: !expected,
            },
            Predicate::Match { property, expected } => Predicate::Match {
                property,
                expected: !expected,
            },
            Predicate::RangeDispatch(range) => Predicate::RangeDispatch(RangeDispatch {
                negated: !range.negated,
                ..range
            }),
            Predicate::CustomFlag { index, value, expected } => Predicate::CustomFlag {
                index,
                value,
                expected: !expected,
            },
        }
    }

    /// Pure, total, no side effects. Absent context data reads as `false`.
    pub fn evaluate(&self, context: &ItemContext) -> bool {
        match self {
            Predicate::Condition { property, expected } => {
                let actual = match property {
                    ConditionProperty::Damageable => context.damageable(),
                    ConditionProperty::Broken => context.broken(),
                    ConditionProperty::Damaged => context.damaged(),
                    ConditionProperty::HasComponent(id) => context.has_component(id),
                };
                actual == *expected
            }
            Predicate::Match { property, expected } => {
                let actual = match property {
                    MatchProperty::ChargeType(charge) => match charge {
                        ChargeType::None => context.charged_projectiles.is_empty(),
                        ChargeType::Arrow => !context.charged_projectiles.is_empty(),
                        ChargeType::Rocket => context
                            .charged_projectiles
                            .iter()
                            .any(|p| *p == ProjectileKind::Rocket),
                    },
                    MatchProperty::TrimMaterial(material) => {
                        context.trim_material.as_ref() == Some(material)
                    }
                };
                actual == *expected
            }
            Predicate::RangeDispatch(range) => evaluate_range(range, context),
            Predicate::CustomFlag { index, value, expected } => {
                let actual = match value {
                    FlagValue::Bool(flag) => context.custom_flag(*index).unwrap_or(false) == *flag,
                    FlagValue::Str(s) => context.custom_string(*index) == Some(s),
                };
                actual == *expected
            }
        }
    }

    /// The range-dispatch sort key, if this predicate has one.
    pub fn range_key(&self) -> Option<(RangeProperty, usize, bool)> {
        match self {
            Predicate::RangeDispatch(range) => Some(range.key()),
            _ => None,
        }
    }
}

fn evaluate_range(range: &RangeDispatch, context: &ItemContext) -> bool {
    let Some(mut value) = raw_value(range.property, range.index, context) else {
        return false;
    };
    if range.normalize {
        // Never divide by zero and never let 0/0 turn into a match.
        let Some(max) = maximum(range.property, context) else {
            return false;
        };
        if max == 0.0 || value == 0.0 {
            return false;
        }
        value /= max;
    }
    if range.negated {
        value < range.threshold
    } else {
        value >= range.threshold
    }
}

fn raw_value(property: RangeProperty, index: usize, context: &ItemContext) -> Option<f64> {
    match property {
        RangeProperty::BundleFullness => context.bundle_fullness,
        RangeProperty::Damage => context.damage.map(f64::from),
        RangeProperty::Count => Some(f64::from(context.count)),
        RangeProperty::CustomModelData => context.custom_float(index),
    }
}

/// The property's maximum accessor; `None` for properties that have none.
fn maximum(property: RangeProperty, context: &ItemContext) -> Option<f64> {
    match property {
        RangeProperty::Damage => context.max_damage.map(f64::from),
        RangeProperty::Count => context.max_stack_size.map(f64::from),
        RangeProperty::BundleFullness | RangeProperty::CustomModelData => None,
    }
}

/// Combine a predicate list under a strategy. `And` short-circuits on the
/// first false, `Or` on the first true.
pub fn evaluate_all(
    predicates: &[Predicate],
    strategy: PredicateStrategy,
    context: &ItemContext,
) -> bool {
    match strategy {
        PredicateStrategy::And => predicates.iter().all(|p| p.evaluate(context)),
        PredicateStrategy::Or => predicates.iter().any(|p| p.evaluate(context)),
    }
}
