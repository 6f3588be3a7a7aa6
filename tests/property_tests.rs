//! Property-based tests using proptest

use proptest::prelude::*;
use scoped_logger::{ContextSnapshot, ContextStore, Level, LevelConfig, ScopeGuard};

const KEYS: [&str; 4] = ["request_id", "user", "tenant", "step"];

#[derive(Debug, Clone)]
enum Op {
    Open(usize, String),
    Close,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..KEYS.len(), "[a-z0-9 \\-]{0,8}").prop_map(|(key, value)| Op::Open(key, value)),
        Just(Op::Close),
    ]
}

fn level() -> impl Strategy<Value = Level> {
    prop_oneof![
        Just(Level::Trace),
        Just(Level::Debug),
        Just(Level::Info),
        Just(Level::Warn),
        Just(Level::Error),
    ]
}

fn config() -> impl Strategy<Value = LevelConfig> {
    (
        level(),
        prop::collection::vec(("(a|b|c)(\\.(a|b|c)){0,2}", level()), 0..6),
    )
        .prop_map(|(default, thresholds)| {
            thresholds
                .into_iter()
                .fold(LevelConfig::new(default), |config, (prefix, level)| {
                    config.with_threshold(prefix, level)
                })
        })
}

proptest! {
    /// Closing every scope in LIFO order restores the snapshot taken before it was opened.
    #[test]
    fn test_nested_scopes_restore_prior_snapshot(
        base in prop::collection::vec((0..KEYS.len(), "[a-z]{1,4}"), 0..4),
        ops in prop::collection::vec(op(), 0..64),
    ) {
        let store = ContextStore::new();
        let base_snapshot: ContextSnapshot = base
            .iter()
            .map(|(key, value)| (KEYS[*key], value.clone()))
            .collect();
        store.replace_with(&base_snapshot);
        let before = store.snapshot();

        let mut open: Vec<(ScopeGuard<'_>, ContextSnapshot)> = Vec::new();
        for op in ops {
            match op {
                Op::Open(key, value) => {
                    let snapshot = store.snapshot();
                    open.push((store.scope(KEYS[key], value), snapshot));
                }
                Op::Close => {
                    if let Some((guard, snapshot)) = open.pop() {
                        guard.close().unwrap();
                        prop_assert_eq!(store.snapshot(), snapshot);
                    }
                }
            }
        }
        while let Some((guard, snapshot)) = open.pop() {
            guard.close().unwrap();
            prop_assert_eq!(store.snapshot(), snapshot);
        }

        prop_assert_eq!(store.snapshot(), before);
    }

    /// If a level is enabled, every less verbose level is enabled too.
    #[test]
    fn test_is_enabled_is_monotonic(
        config in config(),
        name in "(a|b|c|d)(\\.(a|b|c|d)){0,3}",
        at in level(),
        above in level(),
    ) {
        if config.is_enabled(&name, at) && above >= at {
            prop_assert!(config.is_enabled(&name, above));
        }
    }

    /// The effective level comes from the longest configured prefix.
    #[test]
    fn test_effective_level_uses_longest_prefix(
        config in config(),
        name in "(a|b|c)(\\.(a|b|c)){0,3}",
    ) {
        let segments: Vec<&str> = name.split('.').collect();
        let expected = (1..=segments.len())
            .rev()
            .find_map(|len| config.threshold(&segments[..len].join(".")))
            .unwrap_or_else(|| config.default_level());

        prop_assert_eq!(config.effective_level(&name), expected);
    }
}
