#![forbid(unsafe_code)]
//! Core model and traits for blogly.
//! This crate is database-agnostic and should not contain any backend-specific logic.

pub use async_trait::async_trait;

pub mod user;

pub use user::{User, UserForm, DEFAULT_IMAGE_URL};

/// Compile-time table metadata used by the SQL builder.
pub trait Fetchable {
    const TABLE: &'static str;
    const SELECT_COLUMNS: &'static [&'static str];

    /// Column list for the default `ORDER BY` of `find_all`.
    const ORDER_BY: &'static str;
}

/// A backend-agnostic representation of a database parameter value.
/// Entities hand these to backend adapters so this crate stays independent of
/// any database driver.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    /// SQL NULL for a nullable text column.
    Null,
}

impl From<Option<String>> for ParamValue {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(s) => ParamValue::Text(s),
            None => ParamValue::Null,
        }
    }
}

/// Trait for entities that have an identifiable key.
pub trait Identifiable {
    /// The type of the primary key.
    type Key;

    /// The name of the primary key column in the database.
    const ID_COLUMN: &'static str;

    /// Returns a copy of the entity's ID, if it has one.
    fn id(&self) -> Option<Self::Key>;
}

/// Fields written by an INSERT statement.
pub trait Insertable {
    /// Columns excluding the database-generated key.
    const INSERT_COLUMNS: &'static [&'static str];

    /// Values in `INSERT_COLUMNS` order.
    fn insert_values(&self) -> Vec<ParamValue>;
}

/// Fields written by an UPDATE statement.
pub trait Updatable {
    /// Columns of the SET clause.
    const UPDATE_COLUMNS: &'static [&'static str];

    /// Values in `UPDATE_COLUMNS` order followed by the key for the WHERE clause.
    fn update_values(&self) -> RepoResult<Vec<ParamValue>>;
}

/// Lightweight, backend-agnostic error type for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// The entity was not found.
    #[error("entity not found")]
    NotFound,
    /// An operation that needs a persisted entity got one without an id.
    #[error("entity has no id")]
    MissingId,
    /// Error while mapping a backend row into an entity.
    #[error("mapping error")]
    Mapping {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Opaque backend error from the underlying driver or adapter.
    #[error("backend error")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl RepoError {
    /// Wrap a backend/driver error.
    pub fn backend<E>(e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RepoError::Backend {
            source: Box::new(e),
        }
    }
    /// Wrap a row-mapping error.
    pub fn mapping<E>(e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RepoError::Mapping {
            source: Box::new(e),
        }
    }
}

/// Convenience alias for results returned by repository methods.
pub type RepoResult<T> = Result<T, RepoError>;

/// Asynchronous CRUD interface for an entity `T`.
/// Concrete backends provide implementations; the web layer only sees this trait.
#[async_trait]
pub trait Repository<T: Identifiable> {
    /// Every stored entity in the entity's default order.
    async fn find_all(&self) -> RepoResult<Vec<T>>;

    /// Fetch an entity by its primary key. Returns Ok(None) if not found.
    async fn find_by_id(&self, id: &T::Key) -> RepoResult<Option<T>>;

    /// Insert a new entity and return it as stored, with its generated key.
    async fn insert(&self, entity: &T) -> RepoResult<T>;

    /// Overwrite an existing entity. Returns Ok(None) if no row has its key.
    async fn update(&self, entity: &T) -> RepoResult<Option<T>>;

    /// Delete an entity by key. Returns true if a row was affected.
    async fn delete_by_id(&self, id: &T::Key) -> RepoResult<bool>;
}

/// Maps a backend-specific row type into an entity `T`.
#[allow(clippy::wrong_self_convention)]
pub trait RowAdapter<T> {
    type Row;
    fn from_row(&self, row: &Self::Row) -> RepoResult<T>;
}
