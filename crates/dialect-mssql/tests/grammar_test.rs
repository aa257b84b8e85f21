use sqlforge_core::{Blueprint, ColumnType, QueryBuilder, QueryGrammar, SchemaGrammar, Value};
use sqlforge_dialect_mssql::MssqlGrammar;

#[test]
fn select_with_top_and_where_compiles() {
    let grammar = MssqlGrammar::default();
    let query = QueryBuilder::new().from("users").where_eq("active", Value::from(true)).limit(5);
    let (sql, bindings) = grammar.compile_select(&query).unwrap();

    assert_eq!(sql, "select top (5) * from [users] where [active] = ?");
    assert_eq!(bindings, vec![Value::from(true)]);
}

#[test]
fn create_table_with_identity_id_emits_bigint_identity() {
    let grammar = MssqlGrammar::default();
    let mut blueprint = Blueprint::new("users").create().id("id").string("email");
    let statements = blueprint.to_sql(&grammar, None).unwrap();

    assert_eq!(statements[0], "create table [users] ([id] bigint not null identity, [email] nvarchar(255) not null)");
}

#[test]
fn dropping_a_table_column_comment_uses_extended_property() {
    let grammar = MssqlGrammar::default();
    let blueprint = Blueprint::new("users");
    let statements = grammar.compile_column_comment(&blueprint, "email", "primary contact address").unwrap();

    assert_eq!(
        statements,
        vec!["exec sp_addextendedproperty 'MS_Description', 'primary contact address', 'SCHEMA', 'dbo', 'TABLE', 'users', 'COLUMN', [email]"]
    );
}

#[test]
fn upsert_emits_merge_with_update_assignments() {
    let grammar = MssqlGrammar::default();
    let query = QueryBuilder::new().from("users");
    let columns = vec!["email".into(), "name".into()];
    let rows = vec![vec![Value::from("a@example.com"), Value::from("Ada")]];
    let unique_by = vec!["email".into()];
    let update_columns = vec!["name".into()];
    let (sql, bindings) = grammar.compile_upsert(&query, &columns, &rows, &unique_by, &update_columns).unwrap();

    assert!(sql.starts_with("merge into [users] as target using (values (?, ?)) as source ([email], [name])"), "{sql}");
    assert!(sql.contains("when matched then update set [name] = source.[name]"), "{sql}");
    assert!(sql.contains("when not matched then insert ([email], [name]) values (source.[email], source.[name]);"), "{sql}");
    assert_eq!(bindings, vec![Value::from("a@example.com"), Value::from("Ada")]);
}

#[test]
fn enum_column_type_compiles_to_check_constraint() {
    let grammar = MssqlGrammar::default();
    let mut blueprint = Blueprint::new("users").create();
    blueprint = blueprint.column(sqlforge_core::ColumnDefinition::new(
        "role",
        ColumnType::Enum { allowed: vec!["admin".to_string(), "member".to_string()] },
    ));
    let statements = blueprint.to_sql(&grammar, None).unwrap();

    assert!(statements[0].contains("[role] nvarchar(255) check ([role] in ('admin', 'member')) not null"), "{}", statements[0]);
}
