use sqlforge_core::{Blueprint, BlueprintState, ColumnDefinition, ColumnType, QueryBuilder, QueryGrammar, SchemaGrammar, Value};
use sqlforge_dialect_sqlite::SqliteGrammar;

#[test]
fn select_with_json_contains_compiles() {
    let grammar = SqliteGrammar::default();
    let query = QueryBuilder::new().from("articles").where_json_contains("tags", Value::from("rust"));
    let (sql, bindings) = grammar.compile_select(&query).unwrap();

    assert!(sql.contains("exists (select 1 from json_each(\"tags\") where json_each.value = ?)"), "{sql}");
    assert_eq!(bindings.len(), 1);
}

#[test]
fn fulltext_where_is_rejected() {
    let grammar = SqliteGrammar::default();
    let query = QueryBuilder::new().from("articles").where_fulltext(vec!["body"], "schema tool", Default::default(), None);
    let error = grammar.compile_select(&query).unwrap_err();
    assert!(error.to_string().contains("FTS5"), "{error}");
}

#[test]
fn create_table_with_auto_increment_id_emits_integer_primary_key() {
    let grammar = SqliteGrammar::default();
    let mut blueprint = Blueprint::new("users").create().id("id").string("email");
    let statements = blueprint.to_sql(&grammar, None).unwrap();

    assert_eq!(
        statements[0],
        "create table \"users\" (\"id\" integer not null primary key autoincrement, \"email\" varchar(255) not null)"
    );
}

#[test]
fn upsert_uses_on_conflict_do_update_set_excluded() {
    let grammar = SqliteGrammar::default();
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
fn changing_a_column_batches_into_a_table_rebuild() {
    let grammar = SqliteGrammar::default();
    let mut blueprint = Blueprint::new("users");
    let mut email = ColumnDefinition::new("email", ColumnType::String { length: 255 });
    email.change = true;
    blueprint.columns.push(email);

    let pre_image = BlueprintState {
        columns: vec![ColumnDefinition::new("email", ColumnType::String { length: 100 })],
        indexes: vec![],
        foreign_keys: vec![],
    };
    let statements = blueprint.to_sql(&grammar, Some(pre_image)).unwrap();

    assert!(statements[0].starts_with("create table \"__temp__users\""), "{statements:?}");
    assert!(statements.iter().any(|s| s.contains("insert into \"__temp__users\"")));
    assert!(statements.iter().any(|s| s == "drop table \"users\""));
    assert!(statements.iter().any(|s| s == "alter table \"__temp__users\" rename to \"users\""));
}
