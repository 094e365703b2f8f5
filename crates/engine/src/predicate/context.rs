//! Evaluation context for item predicates.
//!
//! The item-translation layer builds one [`ItemContext`] per origin item
//! stack just before dispatch. The engine only reads it; absent data makes
//! the predicates referencing it evaluate to false rather than fail.

use crate::ident::Identifier;

/// What a crossbow-style item is charged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileKind {
    Arrow,
    Rocket,
}

/// Read-only snapshot of one origin item stack's resolved state.
///
/// `Option` fields model data components the stack may simply not carry;
/// the custom-model-data lists are indexed with out-of-range reads yielding
/// `None`.
#[derive(Debug, Clone, Default)]
pub struct ItemContext {
    pub count: u32,
    pub max_stack_size: Option<u32>,
    pub damage: Option<u32>,
    pub max_damage: Option<u32>,
    pub unbreakable: bool,
    pub bundle_fullness: Option<f64>,
    pub trim_material: Option<Identifier>,
    pub charged_projectiles: Vec<ProjectileKind>,
    /// Identifiers of the data components present on the stack.
    pub components: Vec<Identifier>,
    pub custom_flags: Vec<bool>,
    pub custom_strings: Vec<String>,
    pub custom_floats: Vec<f64>,
}

impl ItemContext {
    /// The item takes damage: not flagged unbreakable and has a positive
    /// maximum damage.
    pub fn damageable(&self) -> bool {
        !self.unbreakable && self.max_damage.unwrap_or(0) > 0
    }

    /// Damageable and has taken at least one point of damage.
    pub fn damaged(&self) -> bool {
        self.damageable() && self.damage.unwrap_or(0) > 0
    }

    /// The next point of damage destroys the item.
    pub fn broken(&self) -> bool {
        self.damageable() && self.damage.unwrap_or(0) >= self.max_damage.unwrap_or(0).saturating_sub(1)
    }

    pub fn has_component(&self, id: &Identifier) -> bool {
        self.components.contains(id)
    }

    pub fn custom_flag(&self, index: usize) -> Option<bool> {
        self.custom_flags.get(index).copied()
    }

    pub fn custom_string(&self, index: usize) -> Option<&str> {
        self.custom_strings.get(index).map(String::as_str)
    }

    pub fn custom_float(&self, index: usize) -> Option<f64> {
        self.custom_floats.get(index).copied()
    }
}
