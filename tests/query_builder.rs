mod common;

use common::{RecordingExecutor, text};
use pretty_assertions::assert_eq;
use rowmap::prelude::*;

#[derive(Debug, Default, PartialEq, Record)]
struct User {
    #[db("id,pk")]
    id: i64,
    #[db("name")]
    name: String,
    #[db("age")]
    age: i32,
    #[db("roles,serialize")]
    roles: Vec<String>,
}

#[derive(Debug, Default, Record)]
struct Orphan {
    #[db("id")]
    id: i64,
}

fn mapping(dialect: Dialect) -> (Mapping, RecordingExecutor) {
    let executor = RecordingExecutor::new();
    let mut m = Mapping::new(dialect, executor.clone());
    m.add_table::<User>("users").unwrap();
    (m, executor)
}

#[test]
fn test_full_positional_chain() {
    let (m, _) = mapping(Dialect::Positional);
    let q = m
        .query::<User>("*")
        .unwrap()
        .and_where("name", "bob")
        .limit(5)
        .order("id");

    assert_eq!(q.to_sql(), "SELECT * FROM users WHERE name = ? ORDER BY id LIMIT 5");
    assert_eq!(q.bindings(), &[text("bob")]);
}

#[test]
fn test_posts_chain() {
    #[derive(Debug, Default, Record)]
    struct Post {
        #[db("id,pk")]
        id: i64,
        #[db("title")]
        title: String,
    }

    let mut m = Mapping::positional(RecordingExecutor::new());
    m.add_table::<Post>("posts").unwrap();
    let sql = m
        .query::<Post>("*")
        .unwrap()
        .and_where("title", "hi")
        .order("id")
        .limit(5)
        .to_sql();
    assert_eq!(sql, "SELECT * FROM posts WHERE title = ? ORDER BY id LIMIT 5");
}

#[test]
fn test_bare_query() {
    let (m, _) = mapping(Dialect::Numbered);
    let q = m.query::<User>("id, name").unwrap();
    assert_eq!(q.to_string(), "SELECT id, name FROM users");
    assert!(q.bindings().is_empty());
}

#[test]
fn test_numbered_placeholders_run_across_clauses() {
    let (m, _) = mapping(Dialect::Numbered);
    let q = m
        .query::<User>("id")
        .unwrap()
        .and_where("age >=", 18)
        .where_in("id", [3_i64, 5, 8])
        .and_where("name LIKE", "b%");

    assert_eq!(
        q.to_sql(),
        "SELECT id FROM users WHERE age >= $1 AND id IN ($2, $3, $4) AND name LIKE $5"
    );
    assert_eq!(
        q.bindings(),
        &[
            Value::Int(18),
            Value::Int(3),
            Value::Int(5),
            Value::Int(8),
            text("b%"),
        ]
    );
}

#[test]
fn test_empty_in_matches_nothing() {
    let (m, _) = mapping(Dialect::Positional);
    let q = m
        .query::<User>("*")
        .unwrap()
        .where_in("id", Vec::<i64>::new())
        .and_where("name", "x");

    assert_eq!(q.to_sql(), "SELECT * FROM users WHERE 1 = 0 AND name = ?");
    assert_eq!(q.bindings(), &[text("x")]);
}

#[test]
fn test_last_order_and_limit_win() {
    let (m, _) = mapping(Dialect::Positional);
    let q = m
        .query::<User>("*")
        .unwrap()
        .order("name")
        .limit(100)
        .order("id DESC")
        .limit(1);

    assert_eq!(q.to_string(), "SELECT * FROM users ORDER BY id DESC LIMIT 1");
}

#[tokio::test]
async fn test_empty_condition_is_rejected() {
    let (m, executor) = mapping(Dialect::Positional);

    let q = m.query::<User>("*").unwrap().and_where("  ", 1);
    assert!(q.validate().is_err());
    let err = q.fetch().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let err = m
        .query::<User>("*")
        .unwrap()
        .where_in("", [1_i64])
        .fetch_one()
        .await
        .unwrap_err();
    assert!(matches!(err, MapError::InvalidColumn { ref table, .. } if table == "users"));

    assert!(executor.statements().is_empty());
    assert!(m.query::<User>("*").unwrap().and_where("age >", 1).validate().is_ok());
}

#[test]
fn test_unregistered_type() {
    let (m, _) = mapping(Dialect::Positional);
    let err = m.query::<Orphan>("*").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn test_fetch_runs_through_executor() {
    let (m, executor) = mapping(Dialect::Numbered);
    executor.respond(
        &["id", "name", "age", "roles"],
        vec![
            vec![Value::Int(1), text("ann"), Value::Int(31), text(r#"["admin"]"#)],
            vec![Value::Int(2), text("bob"), Value::Int(27), Value::Null],
        ],
    );

    let users = m
        .query::<User>("*")
        .unwrap()
        .and_where("age >", 20)
        .order("id")
        .fetch()
        .await
        .unwrap();

    assert_eq!(
        users,
        vec![
            User {
                id: 1,
                name: "ann".into(),
                age: 31,
                roles: vec!["admin".into()],
            },
            User {
                id: 2,
                name: "bob".into(),
                age: 27,
                roles: vec![],
            },
        ]
    );
    assert_eq!(
        executor.last(),
        (
            "SELECT * FROM users WHERE age > $1 ORDER BY id".to_string(),
            vec![Value::Int(20)]
        )
    );
}

#[tokio::test]
async fn test_fetch_one() {
    let (m, executor) = mapping(Dialect::Positional);

    let missing = m
        .query::<User>("*")
        .unwrap()
        .and_where("id", 9)
        .fetch_one()
        .await
        .unwrap();
    assert_eq!(missing, None);

    executor.respond(&["name"], vec![vec![text("cy")], vec![text("di")]]);
    let user = m
        .query::<User>("name")
        .unwrap()
        .limit(1)
        .fetch_one()
        .await
        .unwrap();
    assert_eq!(user.map(|u| u.name), Some("cy".to_string()));
}

#[tokio::test]
async fn test_fetch_surfaces_executor_error() {
    let (m, executor) = mapping(Dialect::Positional);
    executor.fail("no such table: users");

    let err = m.query::<User>("*").unwrap().fetch().await.unwrap_err();
    assert_eq!(err.to_string(), "Execution error: no such table: users");
}
