//! Column descriptors.
//!
//! A [`Column`] ties one field of a record type to one table column. Instead
//! of inspecting the type at runtime, each column carries an accessor pair
//! supplied when the table is declared, either by hand or by
//! `#[derive(Record)]`.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{MapError, MapResult};
use crate::value::{FromValue, Mismatch, ToValue, Value};

/// A converted value waiting to be stored in its field.
pub(crate) type Assign<T> = Box<dyn FnOnce(&mut T) + Send>;

type ReadFn<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;
type PrepareFn<T> = Box<dyn Fn(Value) -> Result<Assign<T>, Mismatch> + Send + Sync>;
type EncodeFn<T> = Box<dyn Fn(&T) -> serde_json::Result<serde_json::Value> + Send + Sync>;
type DecodeFn<T> = Box<dyn Fn(serde_json::Value) -> serde_json::Result<Assign<T>> + Send + Sync>;

/// A record type whose columns are declared statically.
///
/// Usually implemented through `#[derive(Record)]`:
///
/// ```rust,ignore
/// #[derive(Default, Record)]
/// struct Post {
///     #[db("id,pk")]
///     id: i64,
///     #[db("title")]
///     title: String,
///     #[db("body,serialize")]
///     body: Vec<String>,
///     cached: bool, // not mapped
/// }
/// ```
pub trait Record: Default + Send + Sync + Sized + 'static {
    /// The mapped columns in field declaration order.
    fn columns() -> Vec<Column<Self>>;
}

/// Structured per-column options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnOptions {
    pub name: String,
    pub primary_key: bool,
    pub serialize: bool,
}

enum Access<T> {
    Plain { read: ReadFn<T>, prepare: PrepareFn<T> },
    Json { encode: EncodeFn<T>, decode: DecodeFn<T> },
}

/// Metadata and accessors for one mapped field.
pub struct Column<T> {
    name: String,
    primary_key: bool,
    field_index: Option<usize>,
    access: Access<T>,
}

impl<T: 'static> Column<T> {
    /// A column stored as a native scalar.
    pub fn new<F, G, M>(name: impl Into<String>, get: G, get_mut: M) -> Self
    where
        F: ToValue + FromValue + Send + 'static,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        let get_mut = Arc::new(get_mut);
        Self {
            name: name.into(),
            primary_key: false,
            field_index: None,
            access: Access::Plain {
                read: Box::new(move |record| get(record).to_value()),
                prepare: Box::new(move |value| {
                    let field = F::from_value(value)?;
                    let get_mut = Arc::clone(&get_mut);
                    Ok(Box::new(move |record: &mut T| *(*get_mut)(record) = field) as Assign<T>)
                }),
            },
        }
    }

    /// A column stored as a JSON document.
    pub fn serialized<F, G, M>(name: impl Into<String>, get: G, get_mut: M) -> Self
    where
        F: Serialize + DeserializeOwned + Send + 'static,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        let get_mut = Arc::new(get_mut);
        Self {
            name: name.into(),
            primary_key: false,
            field_index: None,
            access: Access::Json {
                encode: Box::new(move |record| serde_json::to_value(get(record))),
                decode: Box::new(move |json| {
                    let field: F = serde_json::from_value(json)?;
                    let get_mut = Arc::clone(&get_mut);
                    Ok(Box::new(move |record: &mut T| *(*get_mut)(record) = field) as Assign<T>)
                }),
            },
        }
    }

    /// Mark the column as part of the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Position of the field in the record type's declaration.
    pub fn at(mut self, field_index: usize) -> Self {
        self.field_index = Some(field_index);
        self
    }
}

impl<T> Column<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_serialized(&self) -> bool {
        matches!(self.access, Access::Json { .. })
    }

    /// Field index; assigned from the list position during registration when
    /// the declaration left it out.
    pub fn field_index(&self) -> Option<usize> {
        self.field_index
    }

    pub fn options(&self) -> ColumnOptions {
        ColumnOptions {
            name: self.name.clone(),
            primary_key: self.primary_key,
            serialize: self.is_serialized(),
        }
    }

    pub(crate) fn set_field_index(&mut self, index: usize) {
        self.field_index = Some(index);
    }

    /// The value to bind for this column.
    ///
    /// Serialized columns bind their JSON text; a JSON `null` binds SQL NULL.
    pub fn read(&self, record: &T) -> MapResult<Value> {
        match &self.access {
            Access::Plain { read, .. } => Ok(read(record)),
            Access::Json { .. } => Ok(self.encode(record)?.map_or(Value::Null, Value::Text)),
        }
    }

    /// Like [`Column::read`], but `None` when a sparse write should leave the
    /// column out: nulls, empty byte strings, and JSON `null`, `[]` or `{}`.
    pub fn read_sparse(&self, record: &T) -> MapResult<Option<Value>> {
        match &self.access {
            Access::Plain { read, .. } => {
                let value = read(record);
                Ok((!value.is_unset()).then_some(value))
            }
            Access::Json { encode, .. } => {
                let json = encode(record).map_err(|source| self.serialize_error(source))?;
                let empty = match &json {
                    serde_json::Value::Null => true,
                    serde_json::Value::Array(items) => items.is_empty(),
                    serde_json::Value::Object(fields) => fields.is_empty(),
                    _ => false,
                };
                Ok((!empty).then(|| Value::Text(json.to_string())))
            }
        }
    }

    /// Store `value` in the record's field.
    ///
    /// Serialized columns accept their stored JSON text (or bytes), a
    /// [`Value::Json`] document, or a plain scalar; SQL NULL decodes as JSON
    /// `null`.
    pub fn write(&self, record: &mut T, value: Value) -> MapResult<()> {
        let assign = self.prepare(value)?;
        assign(record);
        Ok(())
    }

    /// Convert `value` for this column without touching any record.
    pub(crate) fn prepare(&self, value: Value) -> MapResult<Assign<T>> {
        match &self.access {
            Access::Plain { prepare, .. } => prepare(value).map_err(|m| MapError::Conversion {
                column: self.name.clone(),
                expected: m.expected,
                found: m.found,
            }),
            Access::Json { decode, .. } => {
                let json: serde_json::Value = match value {
                    Value::Null => Ok(serde_json::Value::Null),
                    Value::Text(text) => serde_json::from_str(&text),
                    Value::Bytes(bytes) => serde_json::from_slice(&bytes),
                    Value::Json(json) => Ok(json),
                    Value::Bool(v) => Ok(serde_json::Value::from(v)),
                    Value::Int(v) => Ok(serde_json::Value::from(v)),
                    Value::Float(v) => Ok(serde_json::Value::from(v)),
                }
                .map_err(|source| self.deserialize_error(source))?;
                decode(json).map_err(|source| self.deserialize_error(source))
            }
        }
    }

    /// Store a result cell. A serialized column leaves its field at the
    /// default when the cell is NULL or an empty buffer.
    pub(crate) fn scatter_write(&self, record: &mut T, value: Value) -> MapResult<()> {
        let empty = match &value {
            Value::Null => true,
            Value::Text(text) => text.is_empty(),
            Value::Bytes(bytes) => bytes.is_empty(),
            _ => false,
        };
        if empty && self.is_serialized() {
            return Ok(());
        }
        self.write(record, value)
    }

    fn encode(&self, record: &T) -> MapResult<Option<String>> {
        let Access::Json { encode, .. } = &self.access else {
            return Ok(None);
        };
        let json = encode(record).map_err(|source| self.serialize_error(source))?;
        Ok((!json.is_null()).then(|| json.to_string()))
    }

    fn serialize_error(&self, source: serde_json::Error) -> MapError {
        MapError::Serialize {
            column: self.name.clone(),
            source,
        }
    }

    fn deserialize_error(&self, source: serde_json::Error) -> MapError {
        MapError::Deserialize {
            column: self.name.clone(),
            source,
        }
    }
}

impl<T> std::fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("primary_key", &self.primary_key)
            .field("serialize", &self.is_serialized())
            .field("field_index", &self.field_index)
            .finish()
    }
}
