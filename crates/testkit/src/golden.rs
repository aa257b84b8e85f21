//! A small YAML-driven table of expected compiled SQL, keyed by scenario
//! name and dialect. Dialect crates' contract tests build the AST from
//! [`crate::fixtures`], compile it with their own grammar, and assert the
//! result against the row this loader hands back — the same scenario
//! compiled five different ways without five copies of the expected string
//! baked into each crate.

use serde::Deserialize;
use sqlforge_core::Value;

/// One row of `fixtures/golden.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct GoldenCase {
    pub name: String,
    pub dialect: String,
    pub sql: String,
    #[serde(default)]
    pub bindings: Vec<GoldenValue>,
}

/// YAML can't carry `sqlforge_core::Value` directly (no `Deserialize`
/// impl, by design — bindings are produced by the query builder, never
/// parsed from config); this is the scalar subset golden fixtures need,
/// converted to `Value` for comparison.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GoldenValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl From<&GoldenValue> for Value {
    fn from(value: &GoldenValue) -> Self {
        match value {
            GoldenValue::Int(value) => Value::Int(*value),
            GoldenValue::Float(value) => Value::Float(*value),
            GoldenValue::Bool(value) => Value::Bool(*value),
            GoldenValue::Text(value) => Value::Text(value.clone()),
        }
    }
}

impl GoldenCase {
    pub fn expected_bindings(&self) -> Vec<Value> {
        self.bindings.iter().map(Value::from).collect()
    }

    /// Panics with a diff-friendly message rather than returning a bool;
    /// golden cases are meant to be asserted directly from `#[test]` fns.
    pub fn assert_sql(&self, actual: &str) {
        assert_eq!(actual, self.sql, "golden case `{}` ({}): SQL mismatch", self.name, self.dialect);
    }

    pub fn assert_bindings(&self, actual: &[Value]) {
        let expected = self.expected_bindings();
        assert_eq!(actual, expected.as_slice(), "golden case `{}` ({}): binding mismatch", self.name, self.dialect);
    }

    /// For `Blueprint::to_sql` results: statements are joined with `"; "`
    /// before comparison, so a multi-statement migration is one golden row.
    pub fn assert_statements(&self, actual: &[String]) {
        assert_eq!(actual.join("; "), self.sql, "golden case `{}` ({}): statement mismatch", self.name, self.dialect);
    }
}

/// Parses a YAML document of golden cases (see `fixtures/golden.yaml`).
pub fn load_cases(yaml: &str) -> Result<Vec<GoldenCase>, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}

/// Looks up the one case matching `name`/`dialect`, panicking with the
/// full set of known names if nothing (or more than one row) matches —
/// a missing fixture is a test-authoring bug, not a soft failure.
pub fn expect<'a>(cases: &'a [GoldenCase], name: &str, dialect: &str) -> &'a GoldenCase {
    let matches: Vec<&GoldenCase> = cases.iter().filter(|case| case.name == name && case.dialect == dialect).collect();
    match matches.as_slice() {
        [case] => case,
        [] => panic!(
            "no golden case named `{name}` for dialect `{dialect}`; known cases: {:?}",
            cases.iter().map(|c| format!("{}/{}", c.name, c.dialect)).collect::<Vec<_>>()
        ),
        _ => panic!("golden case `{name}`/`{dialect}` is ambiguous: {} rows matched", matches.len()),
    }
}

/// The bundled `fixtures/golden.yaml`, parsed once per call. Dialect
/// crates call this directly rather than re-embedding the file path.
pub fn bundled_cases() -> Vec<GoldenCase> {
    load_cases(include_str!("../fixtures/golden.yaml")).expect("fixtures/golden.yaml is valid")
}
