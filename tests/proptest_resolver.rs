//! Property-based tests with proptest.
//!
//! Inputs are stitched together from fragments that stress the scanner:
//! placeholder openers and closers, separators, quotes, comment markers,
//! newlines and non-ASCII text.

use cmake_path_resolver::{
    SourceBuffer, Status, VariableEnv, collect, normalize, resolve_str,
};
use proptest::prelude::*;

// -- Strategies --

fn fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => Just("${".to_string()),
        3 => "[A-Z_]{1,6}",
        3 => Just("}".to_string()),
        2 => Just("/".to_string()),
        1 => Just("\\".to_string()),
        1 => Just("..".to_string()),
        1 => Just(".".to_string()),
        2 => Just(" ".to_string()),
        1 => Just("\"".to_string()),
        1 => Just("//".to_string()),
        1 => Just("/*".to_string()),
        1 => Just("*/".to_string()),
        1 => Just("\n".to_string()),
        1 => Just("$".to_string()),
        2 => "[a-z0-9]{1,4}",
        1 => Just("路径".to_string()),
    ]
}

fn source() -> impl Strategy<Value = String> {
    prop::collection::vec(fragment(), 0..24).prop_map(|parts| parts.concat())
}

/// Values may themselves contain placeholders or backslashes.
fn value() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z/.]{0,8}",
        1 => "[A-Z]:\\\\[a-z]{1,4}",
        1 => "\\$\\{[A-Z]\\}/[a-z]{1,3}",
    ]
}

fn bindings() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map("[A-Z]{1,2}", value(), 0..8)
        .prop_map(|m| m.into_iter().collect::<Vec<_>>())
}

fn env_from(pairs: &[(String, String)]) -> VariableEnv {
    let mut env = VariableEnv::new();
    for (k, v) in pairs {
        env.bind(k.as_str(), v.as_str()).unwrap();
    }
    env
}

fn path() -> impl Strategy<Value = String> {
    (
        prop_oneof![
            Just(String::new()),
            Just("/".to_string()),
            Just("//".to_string()),
            Just("C:/".to_string()),
        ],
        prop::collection::vec(
            prop_oneof![
                Just(".".to_string()),
                Just("..".to_string()),
                Just(String::new()),
                "[a-z]{1,3}",
            ],
            0..8,
        ),
        prop::bool::ANY,
    )
        .prop_map(|(root, segs, trailing)| {
            let mut p = root + &segs.join("/");
            if trailing {
                p.push('/');
            }
            p
        })
}

// -- Property tests --

proptest! {
    /// Every span lies in the buffer and covers exactly the raw text.
    #[test]
    fn spans_match_raw_text(input in source(), pairs in bindings()) {
        let env = env_from(&pairs);
        for r in resolve_str(&input, &env) {
            let span = r.source_span;
            prop_assert!(span.start < span.end && span.end <= input.len());
            prop_assert_eq!(&input.as_bytes()[span.start..span.end], r.raw_text.as_bytes());
        }
    }

    /// Resolved paths are free of placeholders and backslashes.
    #[test]
    fn resolved_paths_are_clean(input in source(), pairs in bindings()) {
        let env = env_from(&pairs);
        for r in resolve_str(&input, &env) {
            if r.status == Status::Resolved {
                prop_assert!(!r.resolved_path.contains("${"), "{:?}", r);
                prop_assert!(!r.resolved_path.contains('\\'), "{:?}", r);
                prop_assert!(r.kind.is_some());
            }
            prop_assert_ne!(r.status, Status::NotAPath);
        }
    }

    /// Without any `${` there is nothing to report.
    #[test]
    fn no_opener_no_output(input in "[^$]{0,64}", pairs in bindings()) {
        let env = env_from(&pairs);
        let buffers = [SourceBuffer::from_text("p.c", &input)];
        prop_assert!(collect(&buffers, &env).is_empty());
    }

    /// Output is strictly ascending by span start.
    #[test]
    fn output_strictly_ascending(input in source(), pairs in bindings()) {
        let env = env_from(&pairs);
        let refs = resolve_str(&input, &env);
        for pair in refs.windows(2) {
            prop_assert!(pair[0].source_span.start < pair[1].source_span.start);
            prop_assert!(pair[0].source_span.end <= pair[1].source_span.start);
        }
    }

    /// Normalizing twice changes nothing.
    #[test]
    fn normalize_idempotent(p in path()) {
        let once = normalize(&p);
        prop_assert_eq!(normalize(&once), once);
    }

    /// The order of `bind` calls does not affect the result.
    #[test]
    fn bind_order_irrelevant(
        input in source(),
        (pairs, shuffled) in bindings().prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
    ) {
        let a = resolve_str(&input, &env_from(&pairs));
        let b = resolve_str(&input, &env_from(&shuffled));
        prop_assert_eq!(a, b);
    }
}
