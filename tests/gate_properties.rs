//! Property tests for the transition gate.
//!
//! Every combination of (from, to, entity validity, target validity, skip) is
//! checked against the expected outcome computed straight from the table.

use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

use transitioner::adapters::memory::{InMemoryStore, Model, Record};
use transitioner::domain::workflow::{
    StateDefinition, StateMachineConfig, StateTable, TransitionOptions, Transitionable, ValidationContext,
};
use transitioner::ports::StatefulEntity;

const REGISTERED: [&str; 4] = ["a", "b", "c", "d"];
const TARGETS: [&str; 6] = ["a", "b", "c", "d", "ghost", "missing"];

fn requires_pass(ctx: &ValidationContext<'_, Record>, errors: &mut transitioner::domain::workflow::ErrorCollection) {
    if !ctx.entity().flag("passes") {
        errors.add_to_base("target validation failed");
    }
}

fn model() -> Arc<Model> {
    let config = StateMachineConfig::new("props", ["a", "b", "c", "d", "ghost"]).with_state_validations_on_object(false);
    let table = StateTable::builder(config)
        .state(StateDefinition::new("a").transitions_to(["b", "c", "ghost"]).validate(requires_pass))
        .state(StateDefinition::new("b").transitions_to(["c", "a"]).validate(requires_pass))
        .state(StateDefinition::new("c").transitions_to(["d"]).validate(requires_pass))
        .state(StateDefinition::new("d").transactional(true).validate(requires_pass))
        .build()
        .expect("props table");

    Arc::new(Model::new(Arc::new(table)).with_validator(|record, errors| {
        if !record.flag("valid") {
            errors.add("valid", transitioner::domain::workflow::ErrorKind::Invalid, "is not valid");
        }
    }))
}

#[derive(Debug, Clone)]
struct Case {
    from: &'static str,
    to: &'static str,
    valid: bool,
    passes: bool,
    skip: bool,
}

fn case_strategy() -> impl Strategy<Value = Case> {
    (
        prop::sample::select(REGISTERED.to_vec()),
        prop::sample::select(TARGETS.to_vec()),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(from, to, valid, passes, skip)| Case {
            from,
            to,
            valid,
            passes,
            skip,
        })
}

fn record_for(store: &Arc<InMemoryStore>, model: &Arc<Model>, case: &Case) -> Record {
    Record::create(
        store,
        model,
        [
            ("status", json!(case.from)),
            ("valid", json!(case.valid)),
            ("passes", json!(case.passes)),
        ],
    )
    .expect("create record")
}

fn options(skip: bool) -> TransitionOptions {
    TransitionOptions {
        skip_validations: skip,
    }
}

proptest! {
    #[test]
    fn gate_correctness(case in case_strategy()) {
        let store = Arc::new(InMemoryStore::new());
        let model = model();
        let table = Arc::clone(model.table());
        let mut record = record_for(&store, &model, &case);

        let registered = table.definition(case.to).is_some();
        let allowed = table.possible_transitions(case.from).iter().any(|s| s == case.to);
        // the write re-validates the entity, so an invalid entity never persists
        let expected = if case.skip {
            registered && case.valid
        } else {
            registered && allowed && case.valid && case.passes
        };

        let result = record.transition_to(case.to, options(case.skip)).unwrap();
        prop_assert_eq!(result, expected);

        record.reload().unwrap();
        let stored = if expected { case.to } else { case.from };
        prop_assert!(record.is_in_state(stored));
    }

    #[test]
    fn illegal_targets_never_change_state(case in case_strategy()) {
        let store = Arc::new(InMemoryStore::new());
        let model = model();
        let allowed = model.table().possible_transitions(case.from).iter().any(|s| s == case.to);
        prop_assume!(!allowed && !case.skip);

        let mut record = record_for(&store, &model, &case);
        prop_assert!(!record.transition_to(case.to, options(false)).unwrap());
        prop_assert!(record.is_in_state(case.from));

        let reloaded = Record::find(&store, &model, record.id()).unwrap();
        prop_assert!(reloaded.is_in_state(case.from));
    }

    #[test]
    fn skip_flag_is_always_reset(case in case_strategy()) {
        let store = Arc::new(InMemoryStore::new());
        let model = model();
        let mut record = record_for(&store, &model, &case);

        let _ = record.attempt_transition(case.to, options(case.skip)).unwrap();
        prop_assert!(!record.skip_state_validations());
    }

    #[test]
    fn transactional_result_matches_reloaded_state(valid in any::<bool>(), passes in any::<bool>(), skip in any::<bool>()) {
        let store = Arc::new(InMemoryStore::new());
        let model = model();
        let case = Case { from: "c", to: "d", valid, passes, skip };
        let mut record = record_for(&store, &model, &case);

        let result = record.transition_to("d", options(skip)).unwrap();
        let reloaded = Record::find(&store, &model, record.id()).unwrap();
        prop_assert_eq!(result, reloaded.is_in_state("d"));
    }
}
