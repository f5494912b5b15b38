//! Property-based tests for the action loop
//!
//! Arbitrary decision scripts against mock clients and recording actions.

use super::*;
use crate::converse::ConverseResponse;
use crate::session::EpochRegistry;
use crate::testing::{context_from, MockConverseClient, RecordingAction, Returns};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

const ACTION_NAMES: &[&str] = &["alpha", "beta", "gamma"];

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

struct Harness {
    client: MockConverseClient,
    actions: ActionTable,
    send: Arc<RecordingAction>,
    custom: Vec<(&'static str, Arc<RecordingAction>)>,
}

impl Harness {
    fn new(script: Vec<ConverseResponse>) -> Self {
        let send = RecordingAction::unchanged();
        let custom: Vec<_> = ACTION_NAMES
            .iter()
            .map(|name| {
                let action =
                    RecordingAction::new(Returns::Merge(context_from(json!({ *name: true }))));
                (*name, action)
            })
            .collect();

        let actions = custom
            .iter()
            .fold(
                ActionTable::builder().action("send", Arc::clone(&send)),
                |b, (name, action)| b.action(*name, Arc::clone(action)),
            )
            .build()
            .unwrap();

        Self {
            client: MockConverseClient::with_responses(script),
            actions,
            send,
            custom,
        }
    }

    fn run(&self, max_steps: u32) -> Result<BotResponse, WitError> {
        let registry = EpochRegistry::new();
        block_on(
            ActionLoop::new(&self.client, &self.actions, &registry).run(
                "prop-session",
                Some("hello"),
                None,
                max_steps,
            ),
        )
    }

    fn custom_invocations(&self) -> usize {
        self.custom.iter().map(|(_, a)| a.call_count()).sum()
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_action_decision() -> impl Strategy<Value = ConverseResponse> {
    prop::sample::select(ACTION_NAMES).prop_map(ConverseResponse::action)
}

fn arb_message_decision() -> impl Strategy<Value = ConverseResponse> {
    "[a-z ]{0,12}".prop_map(ConverseResponse::msg)
}

fn arb_non_terminal_decision() -> impl Strategy<Value = ConverseResponse> {
    prop_oneof![arb_action_decision(), arb_message_decision()]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Never more than max_steps round trips, and one callback per decision
    #[test]
    fn prop_round_trips_bounded_by_budget(
        script in prop::collection::vec(arb_action_decision(), 0..12),
        max_steps in 0u32..8,
    ) {
        let harness = Harness::new(script.clone());
        let result = harness.run(max_steps);

        let calls = harness.client.call_count();
        prop_assert!(calls <= max_steps as usize);
        // Every decision received before the budget ran out was dispatched once
        prop_assert!(harness.custom_invocations() <= calls);

        if script.len() >= max_steps as usize {
            prop_assert!(
                matches!(result, Err(WitError::StepBudgetExceeded { .. })),
                "Expected budget exhaustion, got {:?}", result
            );
            prop_assert_eq!(calls, max_steps as usize);
            prop_assert_eq!(harness.custom_invocations(), calls);
        } else {
            // Script ran dry: the mock reports a transport error
            prop_assert!(matches!(result, Err(WitError::Converse(_))));
            prop_assert_eq!(harness.custom_invocations(), script.len());
        }
    }

    /// Messages come back exactly as sent, in order, duplicates kept
    #[test]
    fn prop_messages_preserved_in_order(
        texts in prop::collection::vec("[a-c]{0,3}", 0..10),
    ) {
        let mut script: Vec<_> = texts.iter().cloned().map(ConverseResponse::msg).collect();
        script.push(ConverseResponse::stop());

        let harness = Harness::new(script);
        let response = harness.run(u32::try_from(texts.len()).unwrap() + 1).unwrap();

        prop_assert_eq!(&response.messages, &texts);
        prop_assert_eq!(harness.send.call_count(), texts.len());
    }

    /// Only the first converse call of a turn carries the user message
    #[test]
    fn prop_message_only_on_first_call(
        mut script in prop::collection::vec(arb_non_terminal_decision(), 0..8),
    ) {
        script.push(ConverseResponse::stop());
        let steps = u32::try_from(script.len()).unwrap();

        let harness = Harness::new(script);
        harness.run(steps).unwrap();

        let calls = harness.client.recorded_calls();
        prop_assert_eq!(calls[0].message.as_deref(), Some("hello"));
        prop_assert!(calls[1..].iter().all(|c| c.message.is_none()));
    }

    /// A legacy `merge` behaves exactly like `action("merge")`
    #[test]
    fn prop_merge_equivalent_to_action_merge(
        prefix in prop::collection::vec(arb_non_terminal_decision(), 0..5),
        initial in prop::collection::btree_map("[a-z]{1,4}", 0i64..100, 0..4),
    ) {
        let run_with = |merge: ConverseResponse| {
            let mut script = prefix.clone();
            script.push(merge);
            script.push(ConverseResponse::stop());
            let steps = u32::try_from(script.len()).unwrap();

            let send = RecordingAction::unchanged();
            let merge_action = RecordingAction::new(Returns::Merge(context_from(json!({"merged": 1}))));
            let actions = ACTION_NAMES
                .iter()
                .fold(
                    ActionTable::builder()
                        .action("send", send)
                        .action("merge", Arc::clone(&merge_action)),
                    |b, name| b.action(*name, RecordingAction::unchanged()),
                )
                .build()
                .unwrap();
            let client = MockConverseClient::with_responses(script);
            let registry = EpochRegistry::new();
            let context = context_from(serde_json::to_value(&initial).unwrap());

            let response = block_on(
                ActionLoop::new(&client, &actions, &registry)
                    .run("s", Some("hi"), Some(context), steps),
            )
            .unwrap();
            (response, merge_action.invocations())
        };

        let (legacy, legacy_calls) = run_with(ConverseResponse::merge());
        let (modern, modern_calls) = run_with(ConverseResponse::action("merge"));

        prop_assert_eq!(legacy, modern);
        prop_assert_eq!(legacy_calls.len(), 1);
        prop_assert_eq!(legacy_calls, modern_calls);
    }
}
