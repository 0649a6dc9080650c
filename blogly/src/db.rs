//! Picks and opens the storage backend named by a database URL.

use std::sync::Arc;

use blogly_core::{RepoError, Repository, User};
use thiserror::Error;

/// The repository every handler talks to.
pub type UserRepo = Arc<dyn Repository<User> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Libsql,
    Postgres,
}

impl Backend {
    /// `postgres://` and `postgresql://` URLs go to Postgres, everything else
    /// is treated as a libsql path or URL.
    pub fn from_url(url: &str) -> Self {
        let lower = url.trim_start().to_ascii_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Backend::Postgres
        } else {
            Backend::Libsql
        }
    }

    pub fn feature(self) -> &'static str {
        match self {
            Backend::Libsql => "libsql-backend",
            Backend::Postgres => "postgres-backend",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("{backend:?} database requested but the `{}` feature is not enabled", .backend.feature())]
    BackendDisabled { backend: Backend },

    #[error("failed to open database")]
    Repo(#[from] RepoError),
}

/// Open (and migrate) the database behind `url`.
pub async fn connect(url: &str) -> Result<UserRepo, ConnectError> {
    match Backend::from_url(url) {
        Backend::Libsql => connect_libsql(url).await,
        Backend::Postgres => connect_postgres(url).await,
    }
}

#[cfg(feature = "libsql-backend")]
async fn connect_libsql(url: &str) -> Result<UserRepo, ConnectError> {
    use blogly_libsql::{LibsqlRepository, UserRowAdapter};

    let repo = LibsqlRepository::<User, _>::from_url(url, UserRowAdapter).await?;
    Ok(Arc::new(repo))
}

#[cfg(not(feature = "libsql-backend"))]
async fn connect_libsql(_url: &str) -> Result<UserRepo, ConnectError> {
    Err(ConnectError::BackendDisabled {
        backend: Backend::Libsql,
    })
}

#[cfg(feature = "postgres-backend")]
async fn connect_postgres(url: &str) -> Result<UserRepo, ConnectError> {
    use blogly_postgres::{PostgresRepository, UserRowAdapter};

    let repo = PostgresRepository::<User, _>::from_url(url, UserRowAdapter).await?;
    Ok(Arc::new(repo))
}

#[cfg(not(feature = "postgres-backend"))]
async fn connect_postgres(_url: &str) -> Result<UserRepo, ConnectError> {
    Err(ConnectError::BackendDisabled {
        backend: Backend::Postgres,
    })
}
