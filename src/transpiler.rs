//! SQL synthesis.
//!
//! Pure string builders turning column lists into parameterized INSERT,
//! UPDATE and SELECT text. Every builder starts a fresh placeholder count, so
//! `$n` numbering restarts at 1 per statement and runs on across its clauses.

use crate::dialect::{Dialect, Placeholders};

/// Trailing keywords that already act as a comparison operator.
const KEYWORD_OPERATORS: &[&str] = &["LIKE", "ILIKE", "GLOB", "IS", "REGEXP"];

/// A WHERE condition awaiting its placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `<fragment> <placeholder>`, one bound value.
    Compare(String),
    /// `<column> IN (<placeholders>)`, `count` bound values.
    In { column: String, count: usize },
}

impl Condition {
    /// A comparison; a bare column name compares for equality.
    ///
    /// The fragment is not checked here; `QueryBuilder` rejects empty ones.
    pub fn compare(fragment: &str) -> Self {
        let fragment = fragment.trim();
        if ends_with_operator(fragment) {
            Condition::Compare(fragment.to_string())
        } else {
            Condition::Compare(format!("{} =", fragment))
        }
    }

    pub fn in_list(column: &str, count: usize) -> Self {
        Condition::In {
            column: column.trim().to_string(),
            count,
        }
    }

    /// Number of values this condition binds.
    pub fn arity(&self) -> usize {
        match self {
            Condition::Compare(_) => 1,
            Condition::In { count, .. } => *count,
        }
    }

    fn to_sql(&self, placeholders: &mut Placeholders) -> String {
        match self {
            Condition::Compare(fragment) => format!("{} {}", fragment, placeholders.next()),
            // An empty IN list matches nothing
            Condition::In { count: 0, .. } => "1 = 0".to_string(),
            Condition::In { column, count } => {
                format!("{} IN ({})", column, placeholders.list(*count))
            }
        }
    }
}

fn ends_with_operator(fragment: &str) -> bool {
    if fragment.ends_with(['=', '<', '>']) {
        return true;
    }
    let mut words = fragment.split_whitespace().rev();
    match (words.next(), words.next()) {
        (Some(last), Some(_)) => KEYWORD_OPERATORS
            .iter()
            .any(|k| last.eq_ignore_ascii_case(k)),
        _ => false,
    }
}

/// Generate INSERT SQL.
///
/// `INSERT INTO posts (id, title) VALUES (?, ?)`
pub fn insert_sql(table: &str, columns: &[&str], dialect: Dialect) -> String {
    let mut placeholders = Placeholders::new(dialect);
    let mut sql = String::from("INSERT INTO ");
    sql.push_str(table);
    sql.push_str(" (");
    sql.push_str(&columns.join(", "));
    sql.push_str(") VALUES (");
    sql.push_str(&placeholders.list(columns.len()));
    sql.push(')');
    sql
}

/// Generate UPDATE SQL.
///
/// `UPDATE posts SET title = ? WHERE id = ?`
pub fn update_sql(table: &str, set: &[&str], keys: &[&str], dialect: Dialect) -> String {
    let mut placeholders = Placeholders::new(dialect);
    let mut sql = String::from("UPDATE ");
    sql.push_str(table);

    let set_clauses: Vec<String> = set
        .iter()
        .map(|c| format!("{} = {}", c, placeholders.next()))
        .collect();
    sql.push_str(" SET ");
    sql.push_str(&set_clauses.join(", "));

    if !keys.is_empty() {
        let where_clauses: Vec<String> = keys
            .iter()
            .map(|c| format!("{} = {}", c, placeholders.next()))
            .collect();
        sql.push_str(" WHERE ");
        sql.push_str(&where_clauses.join(" AND "));
    }

    sql
}

/// Generate SELECT SQL.
///
/// `SELECT * FROM posts WHERE title = ? ORDER BY id LIMIT 5`
pub fn select_sql(
    columns: &str,
    table: &str,
    conditions: &[Condition],
    order: Option<&str>,
    limit: Option<u64>,
    dialect: Dialect,
) -> String {
    let mut placeholders = Placeholders::new(dialect);
    let mut sql = String::from("SELECT ");
    sql.push_str(columns);
    sql.push_str(" FROM ");
    sql.push_str(table);

    // WHERE - conditions are joined with AND
    if !conditions.is_empty() {
        let rendered: Vec<String> = conditions
            .iter()
            .map(|c| c.to_sql(&mut placeholders))
            .collect();
        sql.push_str(" WHERE ");
        sql.push_str(&rendered.join(" AND "));
    }
    debug_assert_eq!(
        placeholders.count(),
        conditions.iter().map(Condition::arity).sum::<usize>()
    );

    // ORDER BY
    if let Some(order) = order {
        sql.push_str(" ORDER BY ");
        sql.push_str(order);
    }

    // LIMIT
    if let Some(n) = limit {
        sql.push_str(&format!(" LIMIT {}", n));
    }

    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_positional() {
        assert_eq!(
            insert_sql("posts", &["id", "title", "body"], Dialect::Positional),
            "INSERT INTO posts (id, title, body) VALUES (?, ?, ?)"
        );
    }

    #[test]
    fn test_insert_numbered() {
        assert_eq!(
            insert_sql("posts", &["id", "title"], Dialect::Numbered),
            "INSERT INTO posts (id, title) VALUES ($1, $2)"
        );
    }

    #[test]
    fn test_update() {
        assert_eq!(
            update_sql("posts", &["title"], &["id"], Dialect::Positional),
            "UPDATE posts SET title = ? WHERE id = ?"
        );
    }

    #[test]
    fn test_update_numbered_composite_key() {
        assert_eq!(
            update_sql("members", &["role", "since"], &["org_id", "user_id"], Dialect::Numbered),
            "UPDATE members SET role = $1, since = $2 WHERE org_id = $3 AND user_id = $4"
        );
    }

    #[test]
    fn test_simple_select() {
        assert_eq!(
            select_sql("*", "posts", &[], None, None, Dialect::Positional),
            "SELECT * FROM posts"
        );
    }

    #[test]
    fn test_select_complex() {
        let conditions = [Condition::compare("title"), Condition::compare("age >")];
        assert_eq!(
            select_sql("id, title", "posts", &conditions, Some("id DESC"), Some(10), Dialect::Numbered),
            "SELECT id, title FROM posts WHERE title = $1 AND age > $2 ORDER BY id DESC LIMIT 10"
        );
    }

    #[test]
    fn test_select_in_list_continues_numbering() {
        let conditions = [Condition::compare("active"), Condition::in_list("id", 3)];
        assert_eq!(
            select_sql("*", "posts", &conditions, None, None, Dialect::Numbered),
            "SELECT * FROM posts WHERE active = $1 AND id IN ($2, $3, $4)"
        );
    }

    #[test]
    fn test_empty_in_list() {
        let conditions = [Condition::in_list("id", 0), Condition::compare("title")];
        assert_eq!(
            select_sql("*", "posts", &conditions, None, None, Dialect::Numbered),
            "SELECT * FROM posts WHERE 1 = 0 AND title = $1"
        );
    }

    #[test]
    fn test_operator_detection() {
        assert_eq!(Condition::compare("title"), Condition::Compare("title =".into()));
        assert_eq!(Condition::compare("age >= "), Condition::Compare("age >=".into()));
        assert_eq!(Condition::compare("id <>"), Condition::Compare("id <>".into()));
        assert_eq!(
            Condition::compare("name like"),
            Condition::Compare("name like".into())
        );
        assert_eq!(
            Condition::compare("deleted_at IS"),
            Condition::Compare("deleted_at IS".into())
        );
        // a column that happens to be called `is`
        assert_eq!(Condition::compare("is"), Condition::Compare("is =".into()));
    }

    #[test]
    fn test_arity() {
        assert_eq!(Condition::compare("a").arity(), 1);
        assert_eq!(Condition::in_list("a", 4).arity(), 4);
    }
}
