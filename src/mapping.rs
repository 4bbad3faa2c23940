//! The type-to-table registry and its statement entry points.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::column::{Column, Record};
use crate::config::Config;
use crate::dialect::Dialect;
use crate::engine::{Executor, Rows, SqlxExecutor};
use crate::error::{MapError, MapResult};
use crate::query::QueryBuilder;
use crate::table::Table;
use crate::transpiler;
use crate::value::Value;

/// Binds record types to tables and runs statements through an [`Executor`].
///
/// Register every type up front with [`Mapping::add_table`]; once shared,
/// a mapping only needs `&self`.
///
/// ```rust,ignore
/// let mut m = Mapping::numbered(executor);
/// m.add_table::<Post>("posts")?;
///
/// m.insert(&post).await?;
/// let recent: Vec<Post> = m.query::<Post>("*")?.order("id DESC").limit(10).fetch().await?;
/// ```
pub struct Mapping {
    executor: Arc<dyn Executor>,
    dialect: Dialect,
    tables: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Mapping {
    pub fn new(dialect: Dialect, executor: impl Executor + 'static) -> Self {
        Self::with_executor(dialect, Arc::new(executor))
    }

    /// Build a mapping around an already shared executor.
    pub fn with_executor(dialect: Dialect, executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            dialect,
            tables: HashMap::new(),
        }
    }

    /// A mapping rendering `?` placeholders (MySQL, SQLite).
    pub fn positional(executor: impl Executor + 'static) -> Self {
        Self::new(Dialect::Positional, executor)
    }

    /// A mapping rendering `$n` placeholders (PostgreSQL).
    pub fn numbered(executor: impl Executor + 'static) -> Self {
        Self::new(Dialect::Numbered, executor)
    }

    /// Connect a sqlx pool described by `config`.
    pub async fn connect(config: &Config) -> MapResult<Self> {
        let dialect = config.dialect()?;
        let executor = SqlxExecutor::from_config(config).await?;
        Ok(Self::new(dialect, executor))
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn executor(&self) -> &dyn Executor {
        self.executor.as_ref()
    }

    /// Register `T` against table `name` using its derived columns.
    ///
    /// Registering a type again replaces its previous table.
    pub fn add_table<T: Record>(&mut self, name: &str) -> MapResult<()> {
        self.add_table_with(name, T::columns())
    }

    /// Register `T` against table `name` with an explicit column list.
    pub fn add_table_with<T>(&mut self, name: &str, columns: Vec<Column<T>>) -> MapResult<()>
    where
        T: Send + Sync + 'static,
    {
        let table = Table::new(name, columns)?;
        debug!(table = name, record = type_name::<T>(), columns = %table.column_list(), "registered table");

        if self
            .tables
            .insert(TypeId::of::<T>(), Box::new(table))
            .is_some()
        {
            debug!(table = name, record = type_name::<T>(), "replaced previous table");
        }
        Ok(())
    }

    /// The table registered for `T`.
    pub fn table<T: 'static>(&self) -> MapResult<&Table<T>> {
        self.tables
            .get(&TypeId::of::<T>())
            .and_then(|table| table.downcast_ref::<Table<T>>())
            .ok_or(MapError::UnregisteredType(type_name::<T>()))
    }

    /// Insert a record, leaving out unset fields.
    ///
    /// `None` options, empty byte strings and serialized fields that encode
    /// to `null`, `[]` or `{}` are not part of the statement.
    pub async fn insert<T>(&self, record: &T) -> MapResult<u64>
    where
        T: Send + Sync + 'static,
    {
        let table = self.table::<T>()?;

        let mut columns = Vec::new();
        let mut values = Vec::new();
        for column in table.columns() {
            if let Some(value) = column.read_sparse(record)? {
                columns.push(column.name());
                values.push(value);
            }
        }

        if columns.is_empty() {
            return Err(MapError::NothingToInsert {
                table: table.name().to_string(),
            });
        }

        let sql = transpiler::insert_sql(table.name(), &columns, self.dialect);
        self.exec(&sql, &values).await
    }

    /// Insert raw values without a registered type.
    pub async fn insert_values(
        &self,
        table: &str,
        columns: &[&str],
        values: Vec<Value>,
    ) -> MapResult<u64> {
        if columns.len() != values.len() {
            return Err(MapError::ValueCount {
                expected: columns.len(),
                got: values.len(),
            });
        }
        if columns.is_empty() {
            return Err(MapError::NothingToInsert {
                table: table.to_string(),
            });
        }

        let sql = transpiler::insert_sql(table, columns, self.dialect);
        self.exec(&sql, &values).await
    }

    /// Update the columns named in `data`, keyed by the primary key.
    ///
    /// The new values are written into `record` first, so the WHERE clause
    /// uses the record's key as it stands after the update, including a key
    /// column changed by `data`. Names that match no mapped column are
    /// ignored. When any value fails to convert, `record` is left untouched
    /// and nothing is executed.
    pub async fn update<T, I, K, V>(&self, record: &mut T, data: I) -> MapResult<u64>
    where
        T: Send + Sync + 'static,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let table = self.table::<T>()?;
        let mut data: HashMap<String, Value> = data
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let keys: Vec<&Column<T>> = table.primary_keys().collect();
        if keys.is_empty() {
            return Err(MapError::MissingPrimaryKey {
                table: table.name().to_string(),
            });
        }

        // Convert every value before the record is touched.
        let mut staged = Vec::new();
        for column in table.columns() {
            if let Some(value) = data.remove(column.name()) {
                staged.push((column, column.prepare(value)?));
            }
        }

        if staged.is_empty() {
            return Err(MapError::NothingToUpdate {
                table: table.name().to_string(),
            });
        }

        let mut written = Vec::with_capacity(staged.len());
        for (column, assign) in staged {
            assign(&mut *record);
            written.push(column);
        }

        let mut values = Vec::with_capacity(written.len() + keys.len());
        for column in written.iter().chain(keys.iter()) {
            values.push(column.read(record)?);
        }

        let set: Vec<&str> = written.iter().map(|c| c.name()).collect();
        let key_names: Vec<&str> = keys.iter().map(|c| c.name()).collect();
        let sql = transpiler::update_sql(table.name(), &set, &key_names, self.dialect);
        self.exec(&sql, &values).await
    }

    /// Run `sql` and scatter every row into a new `T`.
    ///
    /// Result columns are matched to the table by name; columns `T` does not
    /// map are discarded, so `SELECT *` works against partially mapped tables.
    pub async fn select<T>(&self, sql: &str, bindings: &[Value]) -> MapResult<Vec<T>>
    where
        T: Default + Send + Sync + 'static,
    {
        let table = self.table::<T>()?;
        self.fetch(table, sql, bindings).await
    }

    /// Like [`Mapping::select`], returning only the first row.
    ///
    /// Zero rows is `Ok(None)`, not an error.
    pub async fn select_one<T>(&self, sql: &str, bindings: &[Value]) -> MapResult<Option<T>>
    where
        T: Default + Send + Sync + 'static,
    {
        Ok(self.select(sql, bindings).await?.into_iter().next())
    }

    /// Start a SELECT over `T`'s table projecting `columns`.
    pub fn query<T>(&self, columns: &str) -> MapResult<QueryBuilder<'_, T>>
    where
        T: Default + Send + Sync + 'static,
    {
        let table = self.table::<T>()?;
        Ok(QueryBuilder::new(self, table, columns))
    }

    /// Run a raw query without mapping the rows.
    pub async fn fetch_rows(&self, sql: &str, bindings: &[Value]) -> MapResult<Rows> {
        debug!(sql, params = bindings.len(), "query");
        self.executor.query(sql, bindings).await
    }

    pub(crate) async fn fetch<T>(
        &self,
        table: &Table<T>,
        sql: &str,
        bindings: &[Value],
    ) -> MapResult<Vec<T>>
    where
        T: Default + Send + Sync + 'static,
    {
        let rows = self.fetch_rows(sql, bindings).await?;
        table.scatter(rows)
    }

    async fn exec(&self, sql: &str, args: &[Value]) -> MapResult<u64> {
        debug!(sql, params = args.len(), "exec");
        self.executor.exec(sql, args).await
    }
}

impl std::fmt::Debug for Mapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapping")
            .field("dialect", &self.dialect)
            .field("tables", &self.tables.len())
            .finish()
    }
}
