//! Fluent SELECT builder.

use crate::error::{MapError, MapResult};
use crate::mapping::Mapping;
use crate::table::Table;
use crate::transpiler::{self, Condition};
use crate::value::Value;

/// A SELECT over one registered table, built up call by call.
///
/// ```rust,ignore
/// let posts: Vec<Post> = mapping
///     .query::<Post>("*")?
///     .and_where("title", "hi")
///     .and_where("views >", 10)
///     .where_in("author_id", [1, 2, 3])
///     .order("id DESC")
///     .limit(5)
///     .fetch()
///     .await?;
/// ```
#[derive(Debug)]
pub struct QueryBuilder<'m, T> {
    mapping: &'m Mapping,
    table: &'m Table<T>,
    columns: String,
    conditions: Vec<Condition>,
    values: Vec<Value>,
    order: Option<String>,
    limit: Option<u64>,
    invalid: Option<String>,
}

impl<'m, T> QueryBuilder<'m, T> {
    pub(crate) fn new(mapping: &'m Mapping, table: &'m Table<T>, columns: &str) -> Self {
        Self {
            mapping,
            table,
            columns: columns.to_string(),
            conditions: Vec::new(),
            values: Vec::new(),
            order: None,
            limit: None,
            invalid: None,
        }
    }

    /// Add a condition bound to `value`.
    ///
    /// A bare column name compares for equality; a fragment ending in an
    /// operator such as `"age >"` or `"name LIKE"` is used as written.
    /// An empty fragment makes [`fetch`](Self::fetch) fail.
    pub fn and_where(mut self, condition: &str, value: impl Into<Value>) -> Self {
        if condition.trim().is_empty() {
            self.reject("empty WHERE condition");
        }
        self.conditions.push(Condition::compare(condition));
        self.values.push(value.into());
        self
    }

    /// Add `column IN (...)` sized to `values`.
    pub fn where_in<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        if column.trim().is_empty() {
            self.reject("empty column in IN condition");
        }
        let before = self.values.len();
        self.values.extend(values.into_iter().map(Into::into));
        self.conditions
            .push(Condition::in_list(column, self.values.len() - before));
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set the ORDER BY clause, e.g. `"created_at DESC"`.
    pub fn order(mut self, clause: &str) -> Self {
        self.order = Some(clause.to_string());
        self
    }

    /// Render the statement.
    pub fn to_sql(&self) -> String {
        debug_assert_eq!(
            self.values.len(),
            self.conditions.iter().map(Condition::arity).sum::<usize>()
        );
        transpiler::select_sql(
            &self.columns,
            self.table.name(),
            &self.conditions,
            self.order.as_deref(),
            self.limit,
            self.mapping.dialect(),
        )
    }

    /// Values bound so far, in placeholder order.
    pub fn bindings(&self) -> &[Value] {
        &self.values
    }

    /// Fails when a condition was added without a column.
    pub fn validate(&self) -> MapResult<()> {
        match &self.invalid {
            Some(message) => Err(MapError::invalid_column(self.table.name(), message.as_str())),
            None => Ok(()),
        }
    }

    fn reject(&mut self, message: &str) {
        self.invalid.get_or_insert_with(|| message.to_string());
    }
}

impl<T> QueryBuilder<'_, T>
where
    T: Default + Send + Sync + 'static,
{
    /// Run the query and scatter every row into a new `T`.
    pub async fn fetch(self) -> MapResult<Vec<T>> {
        self.validate()?;
        let sql = self.to_sql();
        self.mapping.fetch(self.table, &sql, &self.values).await
    }

    /// Run the query and return the first row, if any.
    pub async fn fetch_one(self) -> MapResult<Option<T>> {
        Ok(self.fetch().await?.into_iter().next())
    }
}

impl<T> std::fmt::Display for QueryBuilder<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_sql())
    }
}
