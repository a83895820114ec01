//! Property tests: any sequence of travels lands on the replayed state.

use std::sync::Arc;

use proptest::prelude::*;
use rekishi_ops::{Component, JsonDocument, JsonOp, OpLog};
use rekishi_travel::{TimeTravel, TravelConfig};
use serde_json::{Value, json};

/// Generate a valid log by simulating edits against a list of strings.
fn arb_log() -> impl Strategy<Value = OpLog<JsonOp>> {
    prop::collection::vec((0u8..4, any::<prop::sample::Index>(), "[a-z]{1,3}"), 0..40).prop_map(
        |edits| {
            let mut items: Vec<String> = Vec::new();
            let mut ops = Vec::new();
            for (kind, index, word) in edits {
                let op = match kind {
                    0 => {
                        let at = index.index(items.len() + 1);
                        items.insert(at, word.clone());
                        Component::list_insert(["items"], at, json!(word))
                    }
                    1 if !items.is_empty() => {
                        let at = index.index(items.len());
                        let gone = items.remove(at);
                        Component::list_delete(["items"], at, json!(gone))
                    }
                    2 if !items.is_empty() => {
                        let at = index.index(items.len());
                        let before = std::mem::replace(&mut items[at], word.clone());
                        Component::list_replace(["items"], at, json!(before), json!(word))
                    }
                    _ => Component::number_add(["total"], word.len() as i64),
                };
                ops.push(JsonOp::single(op));
            }
            OpLog::from(ops)
        },
    )
}

fn base() -> JsonDocument {
    JsonDocument::new(json!({"items": [], "total": 0}))
}

fn replay_to(log: &OpLog<JsonOp>, v: usize) -> Value {
    let mut doc = base();
    for op in log.slice(0, v).unwrap() {
        doc.try_apply(op).unwrap();
    }
    doc.into_inner()
}

proptest! {
    #[test]
    fn prop_travel_sequence_matches_replay(
        log in arb_log(),
        start in any::<prop::sample::Index>(),
        targets in prop::collection::vec(any::<prop::sample::Index>(), 1..12),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();
        let _guard = rt.enter();

        let n = log.len();
        let log = Arc::new(log);
        let start = start.index(n + 1);
        let mut travel =
            TimeTravel::from_base(Arc::clone(&log), base(), start, TravelConfig::default()).unwrap();
        prop_assert_eq!(travel.document().root(), &replay_to(&log, start));

        for target in targets {
            let target = target.index(n + 1);
            travel.travel_to(target).unwrap();
            prop_assert_eq!(travel.current_version(), target);
            prop_assert_eq!(travel.document().root(), &replay_to(&log, target));
        }
    }

    #[test]
    fn prop_there_and_back_restores_state(
        log in arb_log(),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();
        let _guard = rt.enter();

        let n = log.len();
        let (a, b) = (a.index(n + 1), b.index(n + 1));
        let mut travel =
            TimeTravel::from_base(Arc::new(log), base(), a, TravelConfig::default()).unwrap();
        let before = travel.document().clone();

        travel.travel_to(b).unwrap();
        travel.travel_to(a).unwrap();

        prop_assert_eq!(travel.document(), &before);
    }
}
