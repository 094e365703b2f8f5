//! Mapping-file reader: turns parsed JSON mapping documents into
//! `(origin item, definition)` pairs ready to feed into the dispatch
//! registry.
//!
//! A document's `items` object maps each origin item identifier to an array
//! of entries. Three entry shapes, mutually recursive and discriminated by
//! `type`:
//!
//! - `definition`: one full definition;
//! - `legacy`: sugar for a definition with a single generated
//!   custom-model-data range-dispatch predicate;
//! - `group`: shares a `model` with its child entries, which may be groups
//!   themselves; model resolution chains outward.
//!
//! File discovery and JSON syntax parsing belong to [`crate::loader`]; this
//! module only sees already-parsed trees.

mod node;
mod write;

pub use node::MappingError;
pub use write::definition_to_json;

use conduit_engine::definition::{
    ComponentValue, CreativeCategory, ItemDefinition, ItemDefinitionBuilder, TargetOptions,
};
use conduit_engine::ident::{HolderSet, Identifier, CUSTOM_NAMESPACE};
use conduit_engine::predicate::{
    ChargeType, ConditionProperty, FlagValue, MatchProperty, Predicate, PredicateStrategy,
    RangeDispatch, RangeProperty,
};
use serde_json::Value;

use node::{
    boolean, double, field, identifier, index, int, int32, non_empty_string, push_context,
    read_array_if_present, read_if_present, read_or_default, read_or_throw, string, unsigned_int32,
};

/// Read a whole mapping document. A missing `items` key is an empty
/// document, not an error.
pub fn read_mappings(root: &Value) -> Result<Vec<(Identifier, ItemDefinition)>, MappingError> {
    let Value::Object(map) = root else {
        return Err(MappingError::new(
            "reading mappings",
            format!("expected document root to be an object (node was {root})"),
            &[],
        ));
    };
    let Some(items) = map.get("items") else {
        return Ok(Vec::new());
    };
    let Value::Object(items) = items else {
        return Err(MappingError::new(
            "reading mappings",
            format!("expected items key to be an object (node was {items})"),
            &[],
        ));
    };

    let mut out = Vec::new();
    for (key, entries) in items {
        let origin_item = Identifier::parse(key).map_err(|e| {
            MappingError::new("reading item key", e.to_string(), &[])
        })?;
        let context = [format!("item {origin_item}")];
        let Value::Array(entries) = entries else {
            return Err(MappingError::new(
                "reading item entries",
                format!("expected an array of entries (node was {entries})"),
                &context,
            ));
        };
        for entry in entries {
            read_entry(entry, &origin_item, None, &context, &mut out)?;
        }
    }
    Ok(out)
}

/// Read one entry of any of the three shapes, appending the definitions it
/// yields. `parent_model` is the model inherited from an enclosing group,
/// if any.
pub fn read_definition(
    entry: &Value,
    origin_item: &Identifier,
    parent_model: Option<&Identifier>,
) -> Result<Vec<(Identifier, ItemDefinition)>, MappingError> {
    let mut out = Vec::new();
    let context = [format!("item {origin_item}")];
    read_entry(entry, origin_item, parent_model, &context, &mut out)?;
    Ok(out)
}

fn read_entry(
    entry: &Value,
    origin_item: &Identifier,
    parent_model: Option<&Identifier>,
    context: &[String],
    out: &mut Vec<(Identifier, ItemDefinition)>,
) -> Result<(), MappingError> {
    let entry_type = read_or_throw(entry, "type", non_empty_string, "reading entry", context)?;
    match entry_type.as_str() {
        "group" => read_group(entry, origin_item, parent_model, context, out),
        "definition" => {
            let definition = read_single(entry, parent_model, context)?;
            out.push((origin_item.clone(), definition));
            Ok(())
        }
        "legacy" => {
            let definition = read_legacy(entry, parent_model, context)?;
            out.push((origin_item.clone(), definition));
            Ok(())
        }
        other => Err(MappingError::new(
            "reading entry",
            format!("unknown entry type {other}"),
            context,
        )),
    }
}

fn read_group(
    entry: &Value,
    origin_item: &Identifier,
    parent_model: Option<&Identifier>,
    context: &[String],
    out: &mut Vec<(Identifier, ItemDefinition)>,
) -> Result<(), MappingError> {
    // A group's own model is inherited from its parent group when absent.
    let own_model = read_if_present(entry, "model", identifier, "reading group", context)?;
    let model = own_model.as_ref().or(parent_model);

    let context = match model {
        Some(model) => push_context(format!("group (model={model})"), context),
        None => push_context("group", context),
    };

    let Some(children) = field(entry, "definitions", "reading group", &context)? else {
        return Err(MappingError::new(
            "reading group",
            "missing definitions key".to_string(),
            &context,
        ));
    };
    let Value::Array(children) = children else {
        return Err(MappingError::new(
            "reading group",
            format!("expected definitions key to be an array (node was {children})"),
            &context,
        ));
    };
    if children.is_empty() {
        return Err(MappingError::new(
            "reading group",
            "definitions array must not be empty".to_string(),
            &context,
        ));
    }
    for child in children {
        read_entry(child, origin_item, model, &context, out)?;
    }
    Ok(())
}

fn read_single(
    entry: &Value,
    parent_model: Option<&Identifier>,
    context: &[String],
) -> Result<ItemDefinition, MappingError> {
    let target = read_target_identifier(entry, context)?;
    // The target identifier is known; carry it in the context so nested
    // errors can be located in the document.
    let context = push_context(format!("item definition (target identifier={target})"), context);

    let model = read_model(entry, parent_model, &context)?;
    let mut builder = ItemDefinition::builder(target, model);

    if let Some(name) =
        read_if_present(entry, "display_name", non_empty_string, "reading display name", &context)?
    {
        builder = builder.display_name(name);
    }
    builder = builder.priority(read_or_default(
        entry,
        "priority",
        int32,
        0,
        "reading priority",
        &context,
    )?);

    builder = read_predicates(builder, entry, &context)?;
    builder = builder.strategy(read_or_default(
        entry,
        "predicate_strategy",
        strategy,
        PredicateStrategy::And,
        "reading predicate strategy",
        &context,
    )?);
    builder = builder.options(read_target_options(entry, &context)?);
    builder = read_components(builder, entry, &context)?;

    Ok(builder.build())
}

/// Legacy shape: one integer custom-model-data value, synthesized into a
/// single definition with one generated range-dispatch predicate at index 0.
fn read_legacy(
    entry: &Value,
    parent_model: Option<&Identifier>,
    context: &[String],
) -> Result<ItemDefinition, MappingError> {
    let target = read_target_identifier(entry, context)?;
    let context = push_context(format!("legacy definition (target identifier={target})"), context);

    let model = read_model(entry, parent_model, &context)?;
    let custom_model_data = read_or_throw(
        entry,
        "custom_model_data",
        int,
        "reading custom model data",
        &context,
    )?;

    let mut builder = ItemDefinition::builder(target, model).predicate(Predicate::RangeDispatch(
        RangeDispatch {
            property: RangeProperty::CustomModelData,
            index: 0,
            threshold: custom_model_data as f64,
            normalize: false,
            negated: false,
        },
    ));
    if let Some(name) =
        read_if_present(entry, "display_name", non_empty_string, "reading display name", &context)?
    {
        builder = builder.display_name(name);
    }
    Ok(builder.build())
}

fn read_target_identifier(entry: &Value, context: &[String]) -> Result<Identifier, MappingError> {
    let target = read_or_throw(
        entry,
        "target_identifier",
        identifier,
        "reading target identifier",
        context,
    )?;
    // Target identifiers must not masquerade as vanilla content; move them
    // into the reserved proxy namespace instead of rejecting the file.
    if target.is_vanilla() {
        return target.with_namespace(CUSTOM_NAMESPACE).map_err(|e| {
            MappingError::new("reading target identifier", e.to_string(), context)
        });
    }
    Ok(target)
}

/// Model resolution: the entry's own `model` key, else the model chained
/// down from enclosing groups. No model at all is an error.
fn read_model(
    entry: &Value,
    parent_model: Option<&Identifier>,
    context: &[String],
) -> Result<Identifier, MappingError> {
    let own = read_if_present(entry, "model", identifier, "reading item model", context)?;
    own.or_else(|| parent_model.cloned()).ok_or_else(|| {
        MappingError::new("reading item model", "no model present".to_string(), context)
    })
}

fn strategy(node: &Value) -> Result<PredicateStrategy, String> {
    let s = non_empty_string(node)?;
    match s.to_lowercase().as_str() {
        "and" => Ok(PredicateStrategy::And),
        "or" => Ok(PredicateStrategy::Or),
        other => Err(format!("unknown predicate strategy {other}")),
    }
}

// ── Predicates ───────────────────────────────────────────────────────────────

fn read_predicates(
    mut builder: ItemDefinitionBuilder,
    entry: &Value,
    context: &[String],
) -> Result<ItemDefinitionBuilder, MappingError> {
    let Some(node) = field(entry, "predicate", "reading predicates", context)? else {
        return Ok(builder);
    };
    // One predicate object or an array of them; both are accepted.
    match node {
        Value::Object(_) => {
            builder = builder.predicate(read_predicate(node, context)?);
        }
        Value::Array(predicates) => {
            for predicate in predicates {
                builder = builder.predicate(read_predicate(predicate, context)?);
            }
        }
        other => {
            return Err(MappingError::new(
                "reading predicates",
                format!("expected predicate key to be a predicate or a list of predicates (node was {other})"),
                context,
            ));
        }
    }
    Ok(builder)
}

fn read_predicate(node: &Value, context: &[String]) -> Result<Predicate, MappingError> {
    let predicate_type = read_or_throw(node, "type", non_empty_string, "reading predicate", context)?;
    let context = push_context(format!("{predicate_type} predicate"), context);

    match predicate_type.as_str() {
        "condition" => read_condition(node, &context),
        "match" => read_match(node, &context),
        "range_dispatch" => read_range_dispatch(node, &context),
        other => Err(MappingError::new(
            "reading predicate",
            format!("unknown predicate type {other}"),
            &context,
        )),
    }
}

fn read_condition(node: &Value, context: &[String]) -> Result<Predicate, MappingError> {
    let property = read_or_throw(node, "property", non_empty_string, "reading property", context)?;
    let expected = read_or_default(node, "expected", boolean, true, "reading expected", context)?;

    let predicate = match property.as_str() {
        "damageable" => Predicate::Condition {
            property: ConditionProperty::Damageable,
            expected: true,
        },
        "broken" => Predicate::Condition {
            property: ConditionProperty::Broken,
            expected: true,
        },
        "damaged" => Predicate::Condition {
            property: ConditionProperty::Damaged,
            expected: true,
        },
        "has_component" => Predicate::Condition {
            property: ConditionProperty::HasComponent(read_or_throw(
                node,
                "component",
                identifier,
                "reading component",
                context,
            )?),
            expected: true,
        },
        "custom_model_data" => Predicate::CustomFlag {
            index: read_or_default(node, "index", index, 0, "reading index", context)?,
            value: FlagValue::Bool(true),
            expected: true,
        },
        other => {
            return Err(MappingError::new(
                "reading property",
                format!("unknown property {other}"),
                context,
            ));
        }
    };

    Ok(if expected { predicate } else { predicate.negate() })
}

fn read_match(node: &Value, context: &[String]) -> Result<Predicate, MappingError> {
    let property = read_or_throw(node, "property", non_empty_string, "reading property", context)?;
    let expected = read_or_default(node, "expected", boolean, true, "reading expected", context)?;

    match property.as_str() {
        "charge_type" => {
            let value = read_or_throw(node, "value", charge_type, "reading value", context)?;
            Ok(Predicate::Match {
                property: MatchProperty::ChargeType(value),
                expected,
            })
        }
        "trim_material" => {
            let value = read_or_throw(node, "value", identifier, "reading value", context)?;
            Ok(Predicate::Match {
                property: MatchProperty::TrimMaterial(value),
                expected,
            })
        }
        "custom_model_data" => Ok(Predicate::CustomFlag {
            index: read_or_default(node, "index", index, 0, "reading index", context)?,
            value: FlagValue::Str(read_or_throw(node, "value", string, "reading value", context)?),
            expected,
        }),
        other => Err(MappingError::new(
            "reading property",
            format!("unknown property {other}"),
            context,
        )),
    }
}

fn charge_type(node: &Value) -> Result<ChargeType, String> {
    let s = non_empty_string(node)?;
    match s.to_lowercase().as_str() {
        "none" => Ok(ChargeType::None),
        "arrow" => Ok(ChargeType::Arrow),
        "rocket" => Ok(ChargeType::Rocket),
        other => Err(format!("unknown charge type {other}")),
    }
}

fn read_range_dispatch(node: &Value, context: &[String]) -> Result<Predicate, MappingError> {
    let property = read_or_throw(node, "property", non_empty_string, "reading property", context)?;
    let property = match property.as_str() {
        "bundle_fullness" => RangeProperty::BundleFullness,
        "damage" => RangeProperty::Damage,
        "count" => RangeProperty::Count,
        "custom_model_data" => RangeProperty::CustomModelData,
        other => {
            return Err(MappingError::new(
                "reading property",
                format!("unknown property {other}"),
                context,
            ));
        }
    };

    Ok(Predicate::RangeDispatch(RangeDispatch {
        property,
        index: read_or_default(node, "index", index, 0, "reading index", context)?,
        threshold: read_or_throw(node, "threshold", double, "reading threshold", context)?,
        normalize: read_or_default(node, "normalize", boolean, false, "reading normalize", context)?,
        negated: read_or_default(node, "negated", boolean, false, "reading negated", context)?,
    }))
}

// ── Target options and components ────────────────────────────────────────────

fn read_target_options(entry: &Value, context: &[String]) -> Result<TargetOptions, MappingError> {
    let Some(node) = field(entry, "target_options", "reading target options", context)? else {
        return Ok(TargetOptions::default());
    };
    let context = push_context("target options", context);

    let mut options = TargetOptions {
        icon: read_if_present(node, "icon", non_empty_string, "reading icon", &context)?,
        allow_offhand: read_if_present(node, "allow_offhand", boolean, "reading allow offhand", &context)?,
        display_handheld: read_if_present(
            node,
            "display_handheld",
            boolean,
            "reading display handheld",
            &context,
        )?,
        protection_value: read_if_present(
            node,
            "protection_value",
            unsigned_int32,
            "reading protection value",
            &context,
        )?,
        creative_category: read_if_present(
            node,
            "creative_category",
            creative_category,
            "reading creative category",
            &context,
        )?,
        creative_group: read_if_present(
            node,
            "creative_group",
            non_empty_string,
            "reading creative group",
            &context,
        )?,
        tags: Vec::new(),
    };
    if let Some(tags) = read_array_if_present(node, "tags", identifier, "reading tags", &context)? {
        options.tags = tags;
    }
    Ok(options)
}

fn creative_category(node: &Value) -> Result<CreativeCategory, String> {
    let s = non_empty_string(node)?;
    CreativeCategory::from_name(&s.to_lowercase())
        .ok_or_else(|| format!("unknown creative category {s}"))
}

fn read_components(
    mut builder: ItemDefinitionBuilder,
    entry: &Value,
    context: &[String],
) -> Result<ItemDefinitionBuilder, MappingError> {
    let Some(node) = field(entry, "components", "reading components", context)? else {
        return Ok(builder);
    };
    let Value::Object(components) = node else {
        return Err(MappingError::new(
            "reading components",
            format!("components key must be an object (node was {node})"),
            context,
        ));
    };
    for (key, value) in components {
        let context = push_context(format!("component {key}"), context);
        let id = Identifier::parse(key)
            .map_err(|e| MappingError::new("reading component", e.to_string(), &context))?;
        let value = component_value(value)
            .map_err(|message| MappingError::new("reading component", message, &context))?;
        builder = builder.component(id, value);
    }
    Ok(builder)
}

/// Component values are typed by JSON shape: scalars map directly, a
/// `#tag` or `ns:path` string becomes a tag or identifier, and an array of
/// identifier strings becomes a holder set.
fn component_value(node: &Value) -> Result<ComponentValue, String> {
    match node {
        Value::Bool(b) => Ok(ComponentValue::Bool(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(ComponentValue::Int(i)),
            None => n
                .as_f64()
                .map(ComponentValue::Float)
                .ok_or_else(|| "expected a representable number".into()),
        },
        Value::String(s) => {
            if let Some(tag) = s.strip_prefix('#') {
                let tag = Identifier::parse(tag).map_err(|e| e.to_string())?;
                let set = HolderSet::builder().tag(tag).build().map_err(|e| e.to_string())?;
                Ok(ComponentValue::ItemSet(set))
            } else if s.contains(':') {
                Ok(ComponentValue::Id(Identifier::parse(s).map_err(|e| e.to_string())?))
            } else {
                Ok(ComponentValue::Str(s.clone()))
            }
        }
        Value::Array(entries) => {
            let mut set = HolderSet::builder();
            for entry in entries {
                set = set.entry(identifier(entry)?);
            }
            Ok(ComponentValue::ItemSet(set.build().map_err(|e| e.to_string())?))
        }
        _ => Err("expected a component value".into()),
    }
}
