//! Shared query/schema builder fixtures and a YAML golden-SQL runner used
//! by the dialect crates' contract tests: [`fixtures`] builds
//! dialect-agnostic ASTs for the end-to-end scenarios every dialect must
//! compile correctly, and [`golden`] loads the per-dialect expected output
//! for each one from `fixtures/golden.yaml`.

pub mod fixtures;
pub mod golden;

pub use golden::{bundled_cases, expect, load_cases, GoldenCase, GoldenValue};
