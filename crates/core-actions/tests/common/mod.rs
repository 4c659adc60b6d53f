#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use core_actions::{DispatchResult, KeyTranslator, dispatch};
use core_events::{KeySet, LogicalKey};
use core_state::EditorState;

pub fn keys(keys: &[LogicalKey]) -> KeySet {
    keys.iter().copied().collect()
}

/// One dispatch tick: plan from the held/new key sets and apply every action.
pub fn tick(
    translator: &KeyTranslator,
    state: &mut EditorState,
    current: &[LogicalKey],
    newly: &[LogicalKey],
) -> DispatchResult {
    translator
        .plan_tick(&keys(current), &keys(newly))
        .into_iter()
        .fold(DispatchResult::clean(), |acc, action| {
            acc.merge(dispatch(action, state, &[]))
        })
}

/// Press `key` alone (optionally with Shift held) for one tick.
pub fn type_key(translator: &KeyTranslator, state: &mut EditorState, key: LogicalKey, shift: bool) {
    if shift {
        tick(translator, state, &[LogicalKey::Shift, key], &[LogicalKey::Shift, key]);
    } else {
        tick(translator, state, &[key], &[key]);
    }
}
