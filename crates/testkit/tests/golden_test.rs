use sqlforge_core::{QueryGrammar, SchemaGrammar};
use sqlforge_dialect_mssql::MssqlGrammar;
use sqlforge_dialect_mysql::MysqlGrammar;
use sqlforge_dialect_postgres::PostgresGrammar;
use sqlforge_dialect_sqlite::SqliteGrammar;
use sqlforge_testkit::{bundled_cases, expect, fixtures};

#[test]
fn basic_select_by_id_matches_every_dialect() {
    let cases = bundled_cases();
    let query = fixtures::basic_select_by_id();

    let (mysql_sql, mysql_bindings) = MysqlGrammar::default().compile_select(&query).unwrap();
    expect(&cases, "basic_select_by_id", "mysql").assert_sql(&mysql_sql);
    expect(&cases, "basic_select_by_id", "mysql").assert_bindings(&mysql_bindings);

    let (pg_sql, pg_bindings) = PostgresGrammar::default().compile_select(&query).unwrap();
    expect(&cases, "basic_select_by_id", "postgres").assert_sql(&pg_sql);
    expect(&cases, "basic_select_by_id", "postgres").assert_bindings(&pg_bindings);

    let (sqlite_sql, sqlite_bindings) = SqliteGrammar::default().compile_select(&query).unwrap();
    expect(&cases, "basic_select_by_id", "sqlite").assert_sql(&sqlite_sql);
    expect(&cases, "basic_select_by_id", "sqlite").assert_bindings(&sqlite_bindings);

    let (mssql_sql, mssql_bindings) = MssqlGrammar::default().compile_select(&query).unwrap();
    expect(&cases, "basic_select_by_id", "sqlsrv").assert_sql(&mssql_sql);
    expect(&cases, "basic_select_by_id", "sqlsrv").assert_bindings(&mssql_bindings);
}

#[test]
fn distinct_on_is_postgres_specific() {
    let cases = bundled_cases();
    let query = fixtures::distinct_on_email();
    let (sql, _) = PostgresGrammar::default().compile_select(&query).unwrap();
    expect(&cases, "distinct_on_email", "postgres").assert_sql(&sql);
}

#[test]
fn json_path_operator_unwraps_through_json_unquote_on_mysql() {
    let cases = bundled_cases();
    let query = fixtures::json_path_age_greater_than_30();
    let (sql, bindings) = MysqlGrammar::default().compile_select(&query).unwrap();
    let case = expect(&cases, "json_path_age_greater_than_30", "mysql");
    case.assert_sql(&sql);
    case.assert_bindings(&bindings);
}

#[test]
fn create_table_and_migration_blueprints_match_postgres() {
    let cases = bundled_cases();
    let grammar = PostgresGrammar::default();

    let mut create = fixtures::create_users_table();
    let statements = create.to_sql(&grammar, None).unwrap();
    expect(&cases, "create_users_table", "postgres").assert_statements(&statements);

    let mut add_columns = fixtures::add_columns_to_users_table();
    let statements = add_columns.to_sql(&grammar, None).unwrap();
    expect(&cases, "add_columns_to_users_table", "postgres").assert_statements(&statements);

    let mut starting_value = fixtures::create_users_table_with_starting_value();
    let statements = starting_value.to_sql(&grammar, None).unwrap();
    expect(&cases, "create_users_table_with_starting_value", "postgres").assert_statements(&statements);
}

#[test]
fn column_comment_uses_comment_on_column_for_postgres() {
    let cases = bundled_cases();
    let grammar = PostgresGrammar::default();
    let blueprint = fixtures::users_table_for_column_comment();
    let statements = grammar.compile_column_comment(&blueprint, "email", "my first comment").unwrap();
    expect(&cases, "users_table_for_column_comment", "postgres").assert_statements(&statements);
}

#[test]
fn every_bundled_case_has_a_unique_name_and_dialect() {
    let cases = bundled_cases();
    let mut seen = std::collections::HashSet::new();
    for case in &cases {
        assert!(seen.insert((case.name.clone(), case.dialect.clone())), "duplicate golden case {}/{}", case.name, case.dialect);
    }
}
