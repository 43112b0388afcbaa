#![allow(dead_code)]

use std::path::PathBuf;

use cmake_path_resolver::{ResolvedReference, VariableEnv, resolve_str};

/// Environment with the variable set used throughout the fixtures.
pub fn project_env() -> VariableEnv {
    [
        ("PROJECT_ROOT", "/home/u/proj"),
        ("SRC_DIR", "/home/u/proj/src"),
        ("INCLUDE_DIR", "/home/u/proj/include"),
        ("BUILD_DIR", "/home/u/proj/build"),
        ("THIRD_PARTY", "/opt/third_party"),
    ]
    .into_iter()
    .collect()
}

pub fn env_of(pairs: &[(&str, &str)]) -> VariableEnv {
    pairs.iter().copied().collect()
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Resolve `input` and assert the buffer bytes behind each span equal its raw text.
pub fn resolve_checked(input: &str, env: &VariableEnv) -> Vec<ResolvedReference> {
    let refs = resolve_str(input, env);
    for r in &refs {
        let span = r.source_span;
        assert_eq!(
            &input[span.start..span.end],
            r.raw_text,
            "span/raw_text mismatch for {r:?}"
        );
    }
    refs
}

pub fn resolved_paths(refs: &[ResolvedReference]) -> Vec<&str> {
    refs.iter().map(|r| r.resolved_path.as_str()).collect()
}
