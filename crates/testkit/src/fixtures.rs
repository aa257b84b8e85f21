//! Dialect-agnostic builder ASTs shared by the dialect crates' contract
//! tests. Each fixture mirrors one of the end-to-end scenarios every
//! dialect is expected to compile; the expected SQL itself lives in
//! `fixtures/golden.yaml` since it differs per dialect.

use sqlforge_core::{Blueprint, ColumnDefinition, ColumnType, QueryBuilder};

/// `db.table('users').where('id', 1).get()`
pub fn basic_select_by_id() -> QueryBuilder {
    QueryBuilder::new().from("users").where_eq("id", 1i64)
}

/// `db.table('users').distinct('email').select('email', 'id').get()`
pub fn distinct_on_email() -> QueryBuilder {
    QueryBuilder::new().from("users").distinct_on(["email"]).select(["email", "id"])
}

/// `where('data->profile->age', '>', 30)`
pub fn json_path_age_greater_than_30() -> QueryBuilder {
    QueryBuilder::new().from("users").where_op("data->profile->age", ">", 30i64)
}

/// `create(); increments('id'); string('email'); string('name').collation('nb_NO.utf8')`
pub fn create_users_table() -> Blueprint {
    Blueprint::new("users")
        .create()
        .increments("id")
        .string("email")
        .column(ColumnDefinition::new("name", ColumnType::String { length: 255 }).collation("nb_NO.utf8"))
}

/// Same table, no `create()` — an `ALTER TABLE ... ADD COLUMN` migration.
pub fn add_columns_to_users_table() -> Blueprint {
    Blueprint::new("users").increments("id").string("email")
}

/// `create(); increments('id').startingValue(1000); string('email')`
pub fn create_users_table_with_starting_value() -> Blueprint {
    Blueprint::new("users")
        .create()
        .column(ColumnDefinition::new("id", ColumnType::Integer).auto_increment(true).unsigned(true).starting_value(1000))
        .string("email")
}

/// `string('email').comment('my first comment')` — exercised through
/// `SchemaGrammar::compile_column_comment` directly rather than a full
/// `Blueprint::to_sql`, since on a non-`create()` blueprint a commented
/// column also emits its own `add column` statement.
pub fn users_table_for_column_comment() -> Blueprint {
    Blueprint::new("users")
}
