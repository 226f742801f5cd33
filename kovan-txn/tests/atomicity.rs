mod common;

use common::{TestEnv, put};
use kovan_txn::{Commit, Key, Prewrite, Rollback, TimeStamp};
use proptest::collection::{btree_set, vec};
use proptest::prelude::*;

const TXNS: usize = 3;

#[derive(Debug, Clone, Copy)]
enum Step {
    Prewrite(usize),
    CommitPrimary(usize),
    Rollback(usize),
    ResolveCommit(usize),
    ResolveRollback(usize),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..TXNS).prop_map(Step::Prewrite),
        (0..TXNS).prop_map(Step::CommitPrimary),
        (0..TXNS).prop_map(Step::Rollback),
        (0..TXNS).prop_map(Step::ResolveCommit),
        (0..TXNS).prop_map(Step::ResolveRollback),
    ]
}

struct Txn {
    keys: Vec<Key>,
    start_ts: TimeStamp,
    commit_ts: TimeStamp,
    /// Set once a prewrite locked every key.
    prewritten: bool,
    primary_committed: bool,
}

impl Txn {
    fn primary(&self) -> &Key {
        &self.keys[0]
    }
}

fn committed(env: &TestEnv, key: &[u8], start_ts: TimeStamp) -> Option<TimeStamp> {
    env.txn_write(key, start_ts)
        .filter(|(write, _)| !write.is_rollback())
        .map(|(_, commit_ts)| commit_ts)
}

fn apply(env: &TestEnv, txn: &mut Txn, step: Step) {
    match step {
        Step::Prewrite(_) => {
            let mutations = txn.keys.iter().map(|key| put(key, b"v")).collect();
            let resp = env
                .scheduler
                .run(Prewrite::new(
                    mutations,
                    txn.primary().clone(),
                    txn.start_ts,
                    common::TTL,
                ))
                .unwrap();
            txn.prewritten |= resp.errors.is_empty();
        }
        // A client only commits after a clean prewrite
        Step::CommitPrimary(_) if txn.prewritten => {
            let resp = env
                .scheduler
                .run(Commit::new(
                    vec![txn.primary().clone()],
                    txn.start_ts,
                    txn.commit_ts,
                ))
                .unwrap();
            txn.primary_committed |= resp.error.is_none();
        }
        // ...and never rolls back once its primary is committed
        Step::Rollback(_) if !txn.primary_committed => {
            let resp = env
                .scheduler
                .run(Rollback::new(txn.keys.clone(), txn.start_ts))
                .unwrap();
            assert!(resp.error.is_none(), "{:?}", resp.error);
        }
        Step::ResolveCommit(_) => {
            env.resolve(txn.start_ts, txn.commit_ts);
        }
        Step::ResolveRollback(_) => {
            env.resolve(txn.start_ts, 0);
        }
        _ => {}
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_transactions_commit_all_or_nothing(
        key_sets in vec(btree_set(0u8..4, 1..=3), TXNS),
        steps in vec(step(), 0..40),
    ) {
        let env = TestEnv::new();
        let mut txns: Vec<Txn> = key_sets
            .into_iter()
            .enumerate()
            .map(|(i, keys)| Txn {
                keys: keys.into_iter().map(|k| vec![b'k', k]).collect(),
                start_ts: i as TimeStamp + 1,
                commit_ts: 100 + i as TimeStamp,
                prewritten: false,
                primary_committed: false,
            })
            .collect();

        for step in steps {
            let (Step::Prewrite(i)
            | Step::CommitPrimary(i)
            | Step::Rollback(i)
            | Step::ResolveCommit(i)
            | Step::ResolveRollback(i)) = step;
            apply(&env, &mut txns[i], step);
        }

        // Whoever finds the leftovers cleans them up from the primary's state
        for txn in &txns {
            let primary_commit = committed(&env, txn.primary(), txn.start_ts);
            let resp = env.resolve(txn.start_ts, primary_commit.unwrap_or(0));
            prop_assert!(resp.error.is_none(), "{:?}", resp.error);
        }

        prop_assert!(env.locks().is_empty(), "left over locks: {:?}", env.locks());

        for txn in &txns {
            let primary_commit = committed(&env, txn.primary(), txn.start_ts);
            if txn.primary_committed {
                prop_assert_eq!(primary_commit, Some(txn.commit_ts));
            }
            for key in &txn.keys {
                prop_assert_eq!(
                    committed(&env, key, txn.start_ts),
                    primary_commit,
                    "txn {} is partially committed on {:?}",
                    txn.start_ts,
                    key
                );
            }
        }
    }
}
