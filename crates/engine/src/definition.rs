//! Custom item definitions: the target-protocol identity a matching origin
//! item stack is rendered as, plus everything dispatch needs to pick it.

use indexmap::IndexMap;

use crate::ident::{HolderSet, Identifier};
use crate::predicate::{evaluate_all, ItemContext, Predicate, PredicateStrategy};

/// Target-client creative inventory tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreativeCategory {
    None,
    Construction,
    Equipment,
    Items,
    Nature,
}

impl CreativeCategory {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "construction" => Some(Self::Construction),
            "equipment" => Some(Self::Equipment),
            "items" => Some(Self::Items),
            "nature" => Some(Self::Nature),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Construction => "construction",
            Self::Equipment => "equipment",
            Self::Items => "items",
            Self::Nature => "nature",
        }
    }
}

/// Rendering options that only exist on the target protocol side. Opaque to
/// the dispatch algorithm.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TargetOptions {
    /// Icon texture name. When unset, derived from the target identifier.
    pub icon: Option<String>,
    pub allow_offhand: Option<bool>,
    pub display_handheld: Option<bool>,
    pub protection_value: Option<u32>,
    pub creative_category: Option<CreativeCategory>,
    pub creative_group: Option<String>,
    pub tags: Vec<Identifier>,
}

/// A typed data component value carried on the definition. Must mirror
/// components the origin item is expected to always carry; dispatch never
/// looks inside.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Id(Identifier),
    ItemSet(HolderSet),
}

/// One custom item definition: a candidate for dispatch within its
/// (origin item, origin model) group.
///
/// Constructed once via [`ItemDefinition::builder`] at configuration-load
/// time and never mutated; reloads replace whole definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDefinition {
    target: Identifier,
    model: Identifier,
    display_name: String,
    icon: String,
    predicates: Vec<Predicate>,
    strategy: PredicateStrategy,
    priority: i32,
    options: TargetOptions,
    components: IndexMap<Identifier, ComponentValue>,
}

impl ItemDefinition {
    pub fn builder(target: Identifier, model: Identifier) -> ItemDefinitionBuilder {
        ItemDefinitionBuilder {
            target,
            model,
            display_name: None,
            predicates: Vec::new(),
            strategy: PredicateStrategy::default(),
            priority: 0,
            options: TargetOptions::default(),
            components: IndexMap::new(),
        }
    }

    /// The unique key of the rendered target item.
    pub fn target(&self) -> &Identifier {
        &self.target
    }

    /// The origin model this definition is a candidate for.
    pub fn model(&self) -> &Identifier {
        &self.model
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn strategy(&self) -> PredicateStrategy {
        self.strategy
    }

    /// Higher sorts first in dispatch order.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn options(&self) -> &TargetOptions {
        &self.options
    }

    pub fn components(&self) -> &IndexMap<Identifier, ComponentValue> {
        &self.components
    }

    /// A definition with no predicates matches unconditionally when reached
    /// in dispatch order.
    pub fn is_fallback(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Evaluate this definition's predicate list against a context.
    pub fn matches(&self, context: &ItemContext) -> bool {
        evaluate_all(&self.predicates, self.strategy, context)
    }
}

/// Plain builder; definitions have exactly one construction path.
#[derive(Debug)]
pub struct ItemDefinitionBuilder {
    target: Identifier,
    model: Identifier,
    display_name: Option<String>,
    predicates: Vec<Predicate>,
    strategy: PredicateStrategy,
    priority: i32,
    options: TargetOptions,
    components: IndexMap<Identifier, ComponentValue>,
}

impl ItemDefinitionBuilder {
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn strategy(mut self, strategy: PredicateStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn options(mut self, options: TargetOptions) -> Self {
        self.options = options;
        self
    }

    pub fn component(mut self, id: Identifier, value: ComponentValue) -> Self {
        self.components.insert(id, value);
        self
    }

    pub fn build(self) -> ItemDefinition {
        let display_name = self
            .display_name
            .unwrap_or_else(|| self.target.to_string());
        let icon = self
            .options
            .icon
            .clone()
            .unwrap_or_else(|| self.target.to_string().replace(':', ".").replace('/', "_"));
        ItemDefinition {
            target: self.target,
            model: self.model,
            display_name,
            icon,
            predicates: self.predicates,
            strategy: self.strategy,
            priority: self.priority,
            options: self.options,
            components: self.components,
        }
    }
}
