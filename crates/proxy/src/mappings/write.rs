//! Serializes a definition back into the canonical single-definition JSON
//! shape. Reading the produced document yields a definition equal to the
//! input, which keeps mapping dumps usable as mapping files.

use conduit_engine::definition::{ComponentValue, ItemDefinition, TargetOptions};
use conduit_engine::ident::HolderSet;
use conduit_engine::predicate::{
    ChargeType, ConditionProperty, FlagValue, MatchProperty, Predicate, PredicateStrategy,
    RangeProperty,
};
use serde_json::{json, Map, Value};

/// Emit the canonical `type: "definition"` shape. Defaults are omitted.
pub fn definition_to_json(definition: &ItemDefinition) -> Value {
    let mut out = Map::new();
    out.insert("type".into(), "definition".into());
    out.insert("target_identifier".into(), definition.target().to_string().into());
    out.insert("model".into(), definition.model().to_string().into());

    if definition.display_name() != definition.target().to_string() {
        out.insert("display_name".into(), definition.display_name().into());
    }
    if definition.priority() != 0 {
        out.insert("priority".into(), definition.priority().into());
    }
    if !definition.predicates().is_empty() {
        let predicates: Vec<Value> = definition.predicates().iter().map(predicate_to_json).collect();
        out.insert("predicate".into(), predicates.into());
    }
    if definition.strategy() == PredicateStrategy::Or {
        out.insert("predicate_strategy".into(), "or".into());
    }
    if let Some(options) = target_options_to_json(definition.options()) {
        out.insert("target_options".into(), options);
    }
    if !definition.components().is_empty() {
        let components: Map<String, Value> = definition
            .components()
            .iter()
            .map(|(id, value)| (id.to_string(), component_value_to_json(value)))
            .collect();
        out.insert("components".into(), components.into());
    }

    Value::Object(out)
}

fn predicate_to_json(predicate: &Predicate) -> Value {
    match predicate {
        Predicate::Condition { property, expected } => {
            let mut out = Map::new();
            out.insert("type".into(), "condition".into());
            let name = match property {
                ConditionProperty::Damageable => "damageable",
                ConditionProperty::Broken => "broken",
                ConditionProperty::Damaged => "damaged",
                ConditionProperty::HasComponent(component) => {
                    out.insert("component".into(), component.to_string().into());
                    "has_component"
                }
            };
            out.insert("property".into(), name.into());
            if !expected {
                out.insert("expected".into(), false.into());
            }
            Value::Object(out)
        }
        Predicate::Match { property, expected } => {
            let mut out = Map::new();
            out.insert("type".into(), "match".into());
            match property {
                MatchProperty::ChargeType(charge) => {
                    out.insert("property".into(), "charge_type".into());
                    let value = match charge {
                        ChargeType::None => "none",
                        ChargeType::Arrow => "arrow",
                        ChargeType::Rocket => "rocket",
                    };
                    out.insert("value".into(), value.into());
                }
                MatchProperty::TrimMaterial(material) => {
                    out.insert("property".into(), "trim_material".into());
                    out.insert("value".into(), material.to_string().into());
                }
            }
            if !expected {
                out.insert("expected".into(), false.into());
            }
            Value::Object(out)
        }
        Predicate::RangeDispatch(range) => {
            let mut out = Map::new();
            out.insert("type".into(), "range_dispatch".into());
            let property = match range.property {
                RangeProperty::BundleFullness => "bundle_fullness",
                RangeProperty::Damage => "damage",
                RangeProperty::Count => "count",
                RangeProperty::CustomModelData => "custom_model_data",
            };
            out.insert("property".into(), property.into());
            out.insert("threshold".into(), json!(range.threshold));
            if range.index != 0 {
                out.insert("index".into(), range.index.into());
            }
            if range.normalize {
                out.insert("normalize".into(), true.into());
            }
            if range.negated {
                out.insert("negated".into(), true.into());
            }
            Value::Object(out)
        }
        Predicate::CustomFlag { index, value, expected } => {
            let mut out = Map::new();
            match value {
                // The boolean flag test reads back through the condition
                // shape; fold a `false` literal into the expected flag.
                FlagValue::Bool(flag) => {
                    out.insert("type".into(), "condition".into());
                    out.insert("property".into(), "custom_model_data".into());
                    let effective = if *flag { *expected } else { !*expected };
                    if !effective {
                        out.insert("expected".into(), false.into());
                    }
                }
                FlagValue::Str(s) => {
                    out.insert("type".into(), "match".into());
                    out.insert("property".into(), "custom_model_data".into());
                    out.insert("value".into(), s.as_str().into());
                    if !expected {
                        out.insert("expected".into(), false.into());
                    }
                }
            }
            if *index != 0 {
                out.insert("index".into(), (*index).into());
            }
            Value::Object(out)
        }
    }
}

fn target_options_to_json(options: &TargetOptions) -> Option<Value> {
    if *options == TargetOptions::default() {
        return None;
    }
    let mut out = Map::new();
    if let Some(icon) = &options.icon {
        out.insert("icon".into(), icon.as_str().into());
    }
    if let Some(allow_offhand) = options.allow_offhand {
        out.insert("allow_offhand".into(), allow_offhand.into());
    }
    if let Some(display_handheld) = options.display_handheld {
        out.insert("display_handheld".into(), display_handheld.into());
    }
    if let Some(protection_value) = options.protection_value {
        out.insert("protection_value".into(), protection_value.into());
    }
    if let Some(category) = options.creative_category {
        out.insert("creative_category".into(), category.name().into());
    }
    if let Some(group) = &options.creative_group {
        out.insert("creative_group".into(), group.as_str().into());
    }
    if !options.tags.is_empty() {
        let tags: Vec<Value> = options.tags.iter().map(|t| t.to_string().into()).collect();
        out.insert("tags".into(), tags.into());
    }
    Some(Value::Object(out))
}

fn component_value_to_json(value: &ComponentValue) -> Value {
    match value {
        ComponentValue::Bool(b) => (*b).into(),
        ComponentValue::Int(i) => (*i).into(),
        ComponentValue::Float(f) => json!(f),
        ComponentValue::Str(s) => s.as_str().into(),
        ComponentValue::Id(id) => id.to_string().into(),
        ComponentValue::ItemSet(HolderSet::Tag(tag)) => format!("#{tag}").into(),
        ComponentValue::ItemSet(HolderSet::Entries(entries)) => {
            Value::Array(entries.iter().map(|e| e.to_string().into()).collect())
        }
    }
}
