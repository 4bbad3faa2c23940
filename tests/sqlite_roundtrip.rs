//! End-to-end run against an in-memory SQLite database.

use pretty_assertions::assert_eq;
use rowmap::prelude::*;

#[derive(Debug, Default, Clone, PartialEq, Record)]
struct Note {
    #[db("id,pk")]
    id: i64,
    #[db("title")]
    title: String,
    #[db("rating")]
    rating: f64,
    #[db("summary")]
    summary: Option<String>,
    #[db("tags,serialize")]
    tags: Vec<String>,
}

async fn setup() -> Mapping {
    let executor = SqlxExecutor::connect("sqlite::memory:", 1).await.unwrap();
    let mut m = Mapping::positional(executor);
    m.add_table::<Note>("notes").unwrap();

    m.executor()
        .exec(
            "CREATE TABLE notes (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL DEFAULT '',
                rating REAL NOT NULL DEFAULT 0,
                summary TEXT,
                tags TEXT,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await
        .unwrap();
    m
}

#[tokio::test]
async fn test_insert_select_update() {
    let m = setup().await;
    let note = Note {
        id: 1,
        title: "groceries".into(),
        rating: 4.5,
        tags: vec!["home".into(), "weekly".into()],
        ..Default::default()
    };

    assert_eq!(m.insert(&note).await.unwrap(), 1);

    let loaded: Option<Note> = m
        .select_one("SELECT * FROM notes WHERE id = ?", &[Value::Int(1)])
        .await
        .unwrap();
    assert_eq!(loaded.as_ref(), Some(&note));

    let mut loaded = loaded.unwrap();
    m.update(
        &mut loaded,
        [
            ("summary", Value::from("eggs, milk")),
            ("tags", Value::Json(serde_json::json!(["home"]))),
        ],
    )
    .await
    .unwrap();

    let fetched = m
        .query::<Note>("*")
        .unwrap()
        .and_where("rating >", 4)
        .fetch()
        .await
        .unwrap();
    assert_eq!(fetched, vec![loaded.clone()]);
    assert_eq!(fetched[0].summary.as_deref(), Some("eggs, milk"));
    assert_eq!(fetched[0].tags, vec!["home".to_string()]);
}

#[tokio::test]
async fn test_query_in_list_and_order() {
    let m = setup().await;
    for (id, title) in [(1, "a"), (2, "b"), (3, "c")] {
        m.insert(&Note {
            id,
            title: title.into(),
            ..Default::default()
        })
        .await
        .unwrap();
    }

    let notes = m
        .query::<Note>("id, title")
        .unwrap()
        .where_in("id", [1_i64, 3])
        .order("id DESC")
        .fetch()
        .await
        .unwrap();
    let titles: Vec<&str> = notes.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["c", "a"]);

    let none = m
        .query::<Note>("*")
        .unwrap()
        .where_in("id", Vec::<i64>::new())
        .fetch()
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_duplicate_key_is_execution_error() {
    let m = setup().await;
    let note = Note {
        id: 9,
        title: "once".into(),
        ..Default::default()
    };
    m.insert(&note).await.unwrap();

    let err = m.insert(&note).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution);
}
