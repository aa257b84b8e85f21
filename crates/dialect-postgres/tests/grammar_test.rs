use sqlforge_core::{Blueprint, ColumnType, FulltextMode, QueryBuilder, QueryGrammar, SchemaGrammar, Value};
use sqlforge_dialect_postgres::PostgresGrammar;

#[test]
fn select_with_json_contains_and_fulltext_compiles() {
    let grammar = PostgresGrammar::default();
    let query = QueryBuilder::new()
        .from("articles")
        .where_json_contains("tags", Value::from("rust"))
        .where_fulltext(vec!["body"], "schema tool", Default::default(), None);
    let (sql, bindings) = grammar.compile_select(&query).unwrap();

    assert!(sql.contains("\"tags\" @> ?"), "{sql}");
    assert!(sql.contains("to_tsvector('english', \"body\")"), "{sql}");
    assert_eq!(bindings.len(), 2);
}

#[test]
fn insert_or_ignore_appends_on_conflict_do_nothing() {
    let grammar = PostgresGrammar::default();
    let query = QueryBuilder::new().from("users");
    let columns = vec!["email".into()];
    let rows = vec![vec![Value::from("a@example.com")]];
    let (sql, _) = grammar.compile_insert_or_ignore(&query, &columns, &rows).unwrap();

    assert_eq!(sql, "insert into \"users\" (\"email\") values (?) on conflict do nothing");
}

#[test]
fn upsert_renders_on_conflict_do_update_set_excluded() {
    let grammar = PostgresGrammar::default();
    let query = QueryBuilder::new().from("users");
    let columns = vec!["email".into(), "name".into()];
    let rows = vec![vec![Value::from("a@example.com"), Value::from("Ada")]];
    let unique_by = vec!["email".into()];
    let update_columns = vec!["name".into()];
    let (sql, _) = grammar.compile_upsert(&query, &columns, &rows, &unique_by, &update_columns).unwrap();

    assert_eq!(
        sql,
        "insert into \"users\" (\"email\", \"name\") values (?, ?) on conflict (\"email\") do update set \"name\" = excluded.\"name\""
    );
}

#[test]
fn create_table_with_auto_increment_id_emits_serial_primary_key() {
    let grammar = PostgresGrammar::default();
    let mut blueprint = Blueprint::new("users").create().id("id").string("email");
    let statements = blueprint.to_sql(&grammar, None).unwrap();

    assert_eq!(
        statements[0],
        "create table \"users\" (\"id\" bigserial not null primary key, \"email\" varchar(255) not null)"
    );
}

#[test]
fn virtual_generated_column_is_rejected() {
    let grammar = PostgresGrammar::default();
    let mut blueprint = Blueprint::new("users");
    let mut column = sqlforge_core::ColumnDefinition::new("full_name", ColumnType::String { length: 255 });
    column.generated = Some(sqlforge_core::GeneratedExpression::Virtual("first || ' ' || last".to_string()));
    blueprint.columns.push(column);

    let error = grammar.compile_column_definition(&blueprint.columns[0], &blueprint).unwrap_err();
    assert!(error.to_string().contains("virtual"), "{error}");
}
