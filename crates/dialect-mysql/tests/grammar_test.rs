use sqlforge_core::{Blueprint, QueryBuilder, QueryGrammar, SchemaGrammar, Value};
use sqlforge_dialect_mysql::MysqlGrammar;

#[test]
fn select_with_json_contains_compiles() {
    let grammar = MysqlGrammar::default();
    let query = QueryBuilder::new().from("articles").where_json_contains("tags", Value::from("rust"));
    let (sql, bindings) = grammar.compile_select(&query).unwrap();

    assert!(sql.contains("json_contains(`tags`, ?)"), "{sql}");
    assert_eq!(bindings.len(), 1);
}

#[test]
fn create_table_with_auto_increment_id() {
    let grammar = MysqlGrammar::default();
    let mut blueprint = Blueprint::new("users").create().id("id").string("email");
    let statements = blueprint.to_sql(&grammar, None).unwrap();

    assert_eq!(
        statements[0],
        "create table `users` (`id` bigint unsigned not null auto_increment primary key, `email` varchar(255) not null)"
    );
}
