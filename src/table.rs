//! Table descriptors: one record type bound to one table.

use std::collections::HashSet;

use tracing::trace;

use crate::column::Column;
use crate::engine::Rows;
use crate::error::{MapError, MapResult};

/// The ordered column list of a registered record type.
#[derive(Debug)]
pub struct Table<T> {
    name: String,
    type_name: &'static str,
    columns: Vec<Column<T>>,
}

impl<T> Table<T> {
    /// Build and validate a descriptor.
    ///
    /// Columns keep the order they are given in. Names must be non-empty and
    /// unique, field indexes unique; a column without an explicit field index
    /// takes its list position.
    pub fn new(name: impl Into<String>, mut columns: Vec<Column<T>>) -> MapResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(MapError::invalid_column(name, "table name is empty"));
        }

        let mut names = HashSet::new();
        let mut indexes = HashSet::new();
        for (position, column) in columns.iter_mut().enumerate() {
            if column.name().trim().is_empty() {
                return Err(MapError::invalid_column(
                    &name,
                    format!("column at position {} has an empty name", position),
                ));
            }
            if !names.insert(column.name().to_string()) {
                return Err(MapError::invalid_column(
                    &name,
                    format!("duplicate column `{}`", column.name()),
                ));
            }
            let index = match column.field_index() {
                Some(index) => index,
                None => {
                    column.set_field_index(position);
                    position
                }
            };
            if !indexes.insert(index) {
                return Err(MapError::invalid_column(
                    &name,
                    format!("field index {} is mapped twice (`{}`)", index, column.name()),
                ));
            }
        }

        Ok(Self {
            name,
            type_name: std::any::type_name::<T>(),
            columns,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the record type this table maps.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    /// Look a column up by its exposed name.
    pub fn column(&self, name: &str) -> Option<&Column<T>> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &Column<T>> {
        self.columns.iter().filter(|c| c.is_primary_key())
    }

    /// Comma separated list of every mapped column.
    pub fn column_list(&self) -> String {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name()).collect();
        names.join(", ")
    }
}

impl<T: Default> Table<T> {
    /// Scatter result rows into fresh records.
    ///
    /// Columns are matched by name. Result columns the table does not map are
    /// discarded. Serialized columns are decoded after every plain column of
    /// the row has been written.
    pub fn scatter(&self, rows: Rows) -> MapResult<Vec<T>> {
        let targets: Vec<Option<&Column<T>>> = rows
            .columns
            .iter()
            .map(|name| {
                let target = self.column(name);
                if target.is_none() {
                    trace!(table = %self.name, column = %name, "discarding unmapped result column");
                }
                target
            })
            .collect();

        let mut records = Vec::with_capacity(rows.rows.len());
        for row in rows.rows {
            let mut record = T::default();
            let mut deferred = Vec::new();

            for (value, target) in row.into_iter().zip(&targets) {
                match target {
                    Some(column) if column.is_serialized() => deferred.push((*column, value)),
                    Some(column) => column.scatter_write(&mut record, value)?,
                    None => {}
                }
            }
            for (column, value) in deferred {
                column.scatter_write(&mut record, value)?;
            }

            records.push(record);
        }

        Ok(records)
    }
}
