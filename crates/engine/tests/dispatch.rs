//! Dispatch registry contract: total ordering, totality, determinism,
//! structural registration errors, and snapshot publication.

use conduit_engine::definition::ItemDefinition;
use conduit_engine::ident::Identifier;
use conduit_engine::predicate::{
    FlagValue, ItemContext, Predicate, RangeDispatch, RangeProperty,
};
use conduit_engine::registry::{DispatchRegistry, IndexBuilder, RegistrationError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn id(s: &str) -> Identifier {
    Identifier::parse(s).unwrap()
}

fn flag(index: usize) -> Predicate {
    Predicate::CustomFlag {
        index,
        value: FlagValue::Bool(true),
        expected: true,
    }
}

fn damage_range(threshold: f64) -> Predicate {
    Predicate::RangeDispatch(RangeDispatch {
        property: RangeProperty::Damage,
        index: 0,
        threshold,
        normalize: false,
        negated: false,
    })
}

fn count_range(threshold: f64) -> Predicate {
    Predicate::RangeDispatch(RangeDispatch {
        property: RangeProperty::Count,
        index: 0,
        threshold,
        normalize: false,
        negated: false,
    })
}

/// A definition with `predicate_count` distinct custom-flag predicates.
fn def(target: &str, priority: i32, predicate_count: usize) -> ItemDefinition {
    let mut builder =
        ItemDefinition::builder(id(target), id("conduit:model")).priority(priority);
    for index in 0..predicate_count {
        builder = builder.predicate(flag(index));
    }
    builder.build()
}

fn targets(definitions: &[ItemDefinition]) -> Vec<String> {
    definitions.iter().map(|d| d.target().to_string()).collect()
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[test]
fn priority_then_predicate_count() {
    // A and B tie on priority and are split by predicate count; C loses on
    // priority alone despite having the most predicates.
    let a = def("conduit:a", 10, 2);
    let b = def("conduit:b", 10, 3);
    let c = def("conduit:c", 5, 5);

    let mut builder = IndexBuilder::new();
    for definition in [c, a, b] {
        builder.register(id("minecraft:stick"), definition).unwrap();
    }
    let index = builder.build();

    let order = targets(index.definitions_for(&id("minecraft:stick"), &id("conduit:model")));
    assert_eq!(order, ["conduit:b", "conduit:a", "conduit:c"]);
}

#[test]
fn similar_range_dispatch_higher_threshold_first() {
    let d = ItemDefinition::builder(id("conduit:d"), id("conduit:model"))
        .predicate(damage_range(10.0))
        .build();
    let e = ItemDefinition::builder(id("conduit:e"), id("conduit:model"))
        .predicate(damage_range(20.0))
        .build();

    let mut builder = IndexBuilder::new();
    builder.register(id("minecraft:pickaxe"), d).unwrap();
    builder.register(id("minecraft:pickaxe"), e).unwrap();
    let index = builder.build();

    let group = index.definitions_for(&id("minecraft:pickaxe"), &id("conduit:model"));
    assert_eq!(targets(group), ["conduit:e", "conduit:d"]);

    // damage = 15: E (threshold 20) evaluates false, so first-match-wins
    // falls through to D even though E sorts first.
    let mut context = ItemContext::default();
    context.damage = Some(15);
    let winner = index
        .matches(&id("minecraft:pickaxe"), &id("conduit:model"), &context)
        .unwrap();
    assert_eq!(winner.target(), &id("conduit:d"));

    // damage = 25 matches E directly.
    context.damage = Some(25);
    let winner = index
        .matches(&id("minecraft:pickaxe"), &id("conduit:model"), &context)
        .unwrap();
    assert_eq!(winner.target(), &id("conduit:e"));
}

#[test]
fn priority_beats_range_thresholds() {
    let low = ItemDefinition::builder(id("conduit:low"), id("conduit:model"))
        .predicate(damage_range(100.0))
        .build();
    let high = ItemDefinition::builder(id("conduit:high"), id("conduit:model"))
        .priority(1)
        .predicate(damage_range(1.0))
        .build();

    let mut builder = IndexBuilder::new();
    builder.register(id("minecraft:sword"), low).unwrap();
    builder.register(id("minecraft:sword"), high).unwrap();
    let index = builder.build();

    let group = index.definitions_for(&id("minecraft:sword"), &id("conduit:model"));
    assert_eq!(targets(group), ["conduit:high", "conduit:low"]);
}

#[test]
fn definitions_without_comparable_ranges_fall_through_to_count() {
    // One definition thresholds on damage, the other on count: no shared
    // key, so predicate count decides.
    let damage = ItemDefinition::builder(id("conduit:damage"), id("conduit:model"))
        .predicate(damage_range(10.0))
        .build();
    let count_and_flag = ItemDefinition::builder(id("conduit:count"), id("conduit:model"))
        .predicate(Predicate::RangeDispatch(RangeDispatch {
            property: RangeProperty::Count,
            index: 0,
            threshold: 1.0,
            normalize: false,
            negated: false,
        }))
        .predicate(flag(0))
        .build();

    let mut builder = IndexBuilder::new();
    builder.register(id("minecraft:axe"), damage).unwrap();
    builder.register(id("minecraft:axe"), count_and_flag).unwrap();
    let index = builder.build();

    let group = index.definitions_for(&id("minecraft:axe"), &id("conduit:model"));
    assert_eq!(targets(group), ["conduit:count", "conduit:damage"]);
}

#[test]
fn crossing_range_keys_compare_the_same_from_both_sides() {
    // Both definitions threshold on both damage and count, with the wins
    // crossing: A has the higher damage threshold, B the higher count
    // threshold. The first shared key in canonical order (damage) must
    // decide, no matter which definition was registered first.
    let a = || {
        ItemDefinition::builder(id("conduit:a"), id("conduit:model"))
            .predicate(damage_range(5.0))
            .predicate(count_range(2.0))
            .build()
    };
    let b = || {
        ItemDefinition::builder(id("conduit:b"), id("conduit:model"))
            .predicate(count_range(10.0))
            .predicate(damage_range(3.0))
            .build()
    };

    let mut forward = IndexBuilder::new();
    forward.register(id("minecraft:stick"), a()).unwrap();
    forward.register(id("minecraft:stick"), b()).unwrap();
    let forward = forward.build();

    let mut reverse = IndexBuilder::new();
    reverse.register(id("minecraft:stick"), b()).unwrap();
    reverse.register(id("minecraft:stick"), a()).unwrap();
    let reverse = reverse.build();

    let expected = ["conduit:a", "conduit:b"];
    assert_eq!(
        targets(forward.definitions_for(&id("minecraft:stick"), &id("conduit:model"))),
        expected
    );
    assert_eq!(
        targets(reverse.definitions_for(&id("minecraft:stick"), &id("conduit:model"))),
        expected
    );
}

#[test]
fn registration_order_is_the_final_tie_break() {
    // Identical priority, no ranges, same predicate count: first registered
    // wins, reproducibly.
    let first = ItemDefinition::builder(id("conduit:first"), id("conduit:model"))
        .predicate(flag(0))
        .build();
    let second = ItemDefinition::builder(id("conduit:second"), id("conduit:model"))
        .predicate(flag(0))
        .build();

    let mut builder = IndexBuilder::new();
    builder.register(id("minecraft:stick"), first).unwrap();
    builder.register(id("minecraft:stick"), second).unwrap();
    let index = builder.build();

    let group = index.definitions_for(&id("minecraft:stick"), &id("conduit:model"));
    assert_eq!(targets(group), ["conduit:first", "conduit:second"]);
}

#[test]
fn order_is_independent_of_registration_order() {
    let build = |names: &[&str]| {
        let mut builder = IndexBuilder::new();
        for name in names {
            let definition = match *name {
                "a" => def("conduit:a", 10, 2),
                "b" => def("conduit:b", 10, 3),
                "c" => def("conduit:c", 5, 5),
                "d" => ItemDefinition::builder(id("conduit:d"), id("conduit:model"))
                    .predicate(damage_range(10.0))
                    .build(),
                "e" => ItemDefinition::builder(id("conduit:e"), id("conduit:model"))
                    .predicate(damage_range(20.0))
                    .build(),
                _ => unreachable!(),
            };
            builder.register(id("minecraft:stick"), definition).unwrap();
        }
        builder.build()
    };

    let reference = build(&["a", "b", "c", "d", "e"]);
    let reordered = build(&["e", "c", "d", "b", "a"]);

    let expected = targets(reference.definitions_for(&id("minecraft:stick"), &id("conduit:model")));
    let actual = targets(reordered.definitions_for(&id("minecraft:stick"), &id("conduit:model")));
    assert_eq!(expected, actual);

    let mut context = ItemContext::default();
    context.damage = Some(15);
    context.custom_flags = vec![true, true, true, true, true];
    let expected_winner = reference
        .matches(&id("minecraft:stick"), &id("conduit:model"), &context)
        .map(|d| d.target().clone());
    let actual_winner = reordered
        .matches(&id("minecraft:stick"), &id("conduit:model"), &context)
        .map(|d| d.target().clone());
    assert_eq!(expected_winner, actual_winner);
}

// ---------------------------------------------------------------------------
// Totality
// ---------------------------------------------------------------------------

#[test]
fn group_with_a_fallback_always_matches() {
    let specific = ItemDefinition::builder(id("conduit:specific"), id("conduit:model"))
        .predicate(damage_range(10.0))
        .build();
    let fallback = ItemDefinition::builder(id("conduit:fallback"), id("conduit:model")).build();

    let mut builder = IndexBuilder::new();
    builder.register(id("minecraft:stick"), specific).unwrap();
    builder.register(id("minecraft:stick"), fallback).unwrap();
    let index = builder.build();

    let contexts = [
        ItemContext::default(),
        ItemContext {
            damage: Some(50),
            ..ItemContext::default()
        },
        ItemContext {
            unbreakable: true,
            count: 64,
            ..ItemContext::default()
        },
    ];
    for context in &contexts {
        assert!(index
            .matches(&id("minecraft:stick"), &id("conduit:model"), context)
            .is_some());
    }
}

#[test]
fn unknown_group_is_none_not_an_error() {
    let index = IndexBuilder::new().build();
    assert!(index
        .matches(&id("minecraft:stick"), &id("conduit:model"), &ItemContext::default())
        .is_none());
    assert!(index
        .definitions_for(&id("minecraft:stick"), &id("conduit:model"))
        .is_empty());
}

#[test]
fn same_model_different_items_are_separate_groups() {
    let for_stick = ItemDefinition::builder(id("conduit:stick_item"), id("conduit:model")).build();
    let for_rod = ItemDefinition::builder(id("conduit:rod_item"), id("conduit:model")).build();

    let mut builder = IndexBuilder::new();
    builder.register(id("minecraft:stick"), for_stick).unwrap();
    builder.register(id("minecraft:fishing_rod"), for_rod).unwrap();
    let index = builder.build();

    let context = ItemContext::default();
    let stick = index
        .matches(&id("minecraft:stick"), &id("conduit:model"), &context)
        .unwrap();
    assert_eq!(stick.target(), &id("conduit:stick_item"));
    let rod = index
        .matches(&id("minecraft:fishing_rod"), &id("conduit:model"), &context)
        .unwrap();
    assert_eq!(rod.target(), &id("conduit:rod_item"));
}

// ---------------------------------------------------------------------------
// Registration errors
// ---------------------------------------------------------------------------

#[test]
fn duplicate_target_identifier_is_rejected_across_groups() {
    let first = ItemDefinition::builder(id("conduit:ruby"), id("conduit:model_a")).build();
    let second = ItemDefinition::builder(id("conduit:ruby"), id("conduit:model_b"))
        .predicate(flag(0))
        .build();

    let mut builder = IndexBuilder::new();
    builder.register(id("minecraft:stick"), first).unwrap();
    let err = builder
        .register(id("minecraft:emerald"), second)
        .unwrap_err();
    assert_eq!(
        err,
        RegistrationError::DuplicateTargetIdentifier(id("conduit:ruby"))
    );
}

#[test]
fn second_fallback_in_a_group_is_rejected() {
    let first = ItemDefinition::builder(id("conduit:first"), id("conduit:model")).build();
    let second = ItemDefinition::builder(id("conduit:second"), id("conduit:model")).build();

    let mut builder = IndexBuilder::new();
    builder.register(id("minecraft:stick"), first).unwrap();
    let err = builder.register(id("minecraft:stick"), second).unwrap_err();
    assert_eq!(
        err,
        RegistrationError::DuplicateFallback {
            item: id("minecraft:stick"),
            model: id("conduit:model"),
            existing: id("conduit:first"),
        }
    );
}

#[test]
fn fallbacks_in_different_groups_do_not_conflict() {
    let for_model_a = ItemDefinition::builder(id("conduit:a"), id("conduit:model_a")).build();
    let for_model_b = ItemDefinition::builder(id("conduit:b"), id("conduit:model_b")).build();

    let mut builder = IndexBuilder::new();
    builder.register(id("minecraft:stick"), for_model_a).unwrap();
    builder.register(id("minecraft:stick"), for_model_b).unwrap();
    assert_eq!(builder.definition_count(), 2);
}

// ---------------------------------------------------------------------------
// Snapshot publication
// ---------------------------------------------------------------------------

#[test]
fn publish_swaps_whole_snapshots() {
    let registry = DispatchRegistry::new();
    let context = ItemContext::default();

    // Empty until something is published.
    assert!(registry
        .snapshot()
        .matches(&id("minecraft:stick"), &id("conduit:model"), &context)
        .is_none());

    let mut builder = IndexBuilder::new();
    builder
        .register(
            id("minecraft:stick"),
            ItemDefinition::builder(id("conduit:old"), id("conduit:model")).build(),
        )
        .unwrap();
    registry.publish(builder.build());

    // A reader holding the old snapshot keeps seeing it after a reload.
    let held = registry.snapshot();
    let mut builder = IndexBuilder::new();
    builder
        .register(
            id("minecraft:stick"),
            ItemDefinition::builder(id("conduit:new"), id("conduit:model")).build(),
        )
        .unwrap();
    registry.publish(builder.build());

    let old = held
        .matches(&id("minecraft:stick"), &id("conduit:model"), &context)
        .unwrap();
    assert_eq!(old.target(), &id("conduit:old"));

    let current = registry.snapshot();
    let new = current
        .matches(&id("minecraft:stick"), &id("conduit:model"), &context)
        .unwrap();
    assert_eq!(new.target(), &id("conduit:new"));
}
