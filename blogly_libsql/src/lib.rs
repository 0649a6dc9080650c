#![forbid(unsafe_code)]
#![cfg_attr(
    not(feature = "libsql-backend"),
    doc = "Enable feature `libsql-backend` to use this adapter."
)]

/// Schema for the `users` table.
pub const USERS_SQL: &str = include_str!("../migrations/001_users.sql");

#[cfg(feature = "libsql-backend")]
mod backend {
    use async_trait::async_trait;
    use blogly_core::{
        Fetchable, Identifiable, Insertable, ParamValue, RepoError, RepoResult, Repository,
        RowAdapter, Updatable, User,
    };
    use blogly_sql::{Dialect, Statements};
    use libsql::{Connection, Database, Row, Value};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    #[cfg(feature = "tracing")]
    use tracing::info;

    /// How long a connection waits on a locked database before failing with `SQLITE_BUSY`.
    pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

    #[inline]
    #[allow(unused_variables)]
    fn obs_record(op: &str, table: &str, start: Instant, rows: usize, success: bool) {
        let elapsed = start.elapsed().as_millis() as u64;
        #[cfg(feature = "tracing")]
        {
            info!(
                backend = "libsql",
                table = table,
                op = op,
                rows = rows,
                elapsed_ms = elapsed,
                success = success,
                "repo op"
            );
        }
        #[cfg(feature = "metrics")]
        {
            metrics::counter!("repo_ops_total", 1, "op" => op.to_string(), "table" => table.to_string(), "success" => success.to_string());
            metrics::histogram!("repo_op_duration_ms", elapsed as f64, "op" => op.to_string(), "table" => table.to_string());
            if !success {
                metrics::counter!("repo_op_errors_total", 1, "op" => op.to_string(), "table" => table.to_string());
            }
        }
    }

    /// Rows touched and success flag reported for an operation result.
    fn outcome<R>(result: &RepoResult<R>, rows: impl FnOnce(&R) -> usize) -> (usize, bool) {
        match result {
            Ok(value) => (rows(value), true),
            Err(_) => (0, false),
        }
    }

    /// Record the outcome of `op`, failures included, and hand the result back.
    fn observed<R>(
        op: &str,
        table: &str,
        start: Instant,
        result: RepoResult<R>,
        rows: impl FnOnce(&R) -> usize,
    ) -> RepoResult<R> {
        let (n, success) = outcome(&result, rows);
        obs_record(op, table, start, n, success);
        result
    }

    fn to_libsql_value(p: ParamValue) -> Value {
        match p {
            ParamValue::Text(s) => Value::Text(s),
            ParamValue::Integer(i) => Value::Integer(i),
            ParamValue::Null => Value::Null,
        }
    }

    fn invalid_row(msg: String) -> RepoError {
        RepoError::mapping(std::io::Error::new(std::io::ErrorKind::InvalidData, msg))
    }

    /// Apply the schema on `conn`. Safe to run against an already migrated database.
    pub async fn migrate(conn: &Connection) -> RepoResult<()> {
        conn.execute(crate::USERS_SQL, ())
            .await
            .map_err(RepoError::backend)?;
        Ok(())
    }

    /// A connection that waits up to [`BUSY_TIMEOUT`] for locks held by others.
    pub fn connect(db: &Database) -> RepoResult<Connection> {
        let conn = db.connect().map_err(RepoError::backend)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(RepoError::backend)?;
        Ok(conn)
    }

    /// Switch a file database to write-ahead logging so readers never block
    /// the writer. In-memory databases keep their own mode. Returns the mode now in effect.
    pub async fn enable_wal(conn: &Connection) -> RepoResult<String> {
        let mut rows = conn
            .query("PRAGMA journal_mode = WAL", ())
            .await
            .map_err(RepoError::backend)?;
        let mode = match rows.next().await.map_err(RepoError::backend)? {
            Some(row) => row.get::<String>(0).map_err(RepoError::mapping)?,
            None => String::new(),
        };
        Ok(mode.to_ascii_lowercase())
    }

    /// Open the database at `url` (a file path or shared-cache URI), enable WAL
    /// and migrate it.
    ///
    /// A plain `:memory:` database is private to each connection; use
    /// `file::memory:?cache=shared` for a throwaway in-process database.
    pub async fn open(url: &str) -> RepoResult<Arc<Database>> {
        // Database::open is deprecated upstream; keep a narrow allow here until Builder migration
        #[allow(deprecated)]
        let db = Database::open(url).map_err(RepoError::backend)?;
        let conn = connect(&db)?;
        enable_wal(&conn).await?;
        migrate(&conn).await?;
        Ok(Arc::new(db))
    }

    /// Maps `SELECT id, first_name, last_name, image_url` rows into [`User`].
    #[derive(Debug, Clone, Copy, Default)]
    pub struct UserRowAdapter;

    impl RowAdapter<User> for UserRowAdapter {
        type Row = Row;

        fn from_row(&self, row: &Self::Row) -> RepoResult<User> {
            let id: i64 = row.get(0).map_err(RepoError::mapping)?;
            let first_name: String = row.get(1).map_err(RepoError::mapping)?;
            let last_name: String = row.get(2).map_err(RepoError::mapping)?;
            let image_url = match row.get_value(3).map_err(RepoError::mapping)? {
                Value::Null => None,
                Value::Text(s) => Some(s),
                other => return Err(invalid_row(format!("image_url: unexpected {other:?}"))),
            };
            Ok(User {
                id: Some(id),
                first_name,
                last_name,
                image_url,
            })
        }
    }

    /// A fully asynchronous, `libsql`-backed repository.
    pub struct LibsqlRepository<T, A>
    where
        A: RowAdapter<T, Row = Row>,
    {
        db: Arc<Database>,
        adapter: A,
        sql: Statements<T>,
    }

    impl<T, A> LibsqlRepository<T, A>
    where
        T: Fetchable + Identifiable + Insertable + Updatable,
        A: RowAdapter<T, Row = Row>,
    {
        /// Creates a new repository from an existing `libsql::Database` object.
        pub fn new(db: Arc<Database>, adapter: A) -> Self {
            Self {
                db,
                adapter,
                sql: Statements::new(Dialect::Question),
            }
        }

        /// Opens and migrates the database at `url`, see [`open`].
        pub async fn from_url(url: &str, adapter: A) -> RepoResult<Self> {
            let db = open(url).await?;
            Ok(Self::new(db, adapter))
        }

        async fn fetch_one(&self, conn: &Connection, key: Value) -> RepoResult<Option<T>> {
            let mut rows = conn
                .query(&self.sql.select_by_id, vec![key])
                .await
                .map_err(RepoError::backend)?;
            match rows.next().await.map_err(RepoError::backend)? {
                Some(row) => Ok(Some(self.adapter.from_row(&row)?)),
                None => Ok(None),
            }
        }
    }

    #[async_trait]
    impl<T, A> Repository<T> for LibsqlRepository<T, A>
    where
        T: Fetchable + Identifiable + Insertable + Updatable + Send + Sync + 'static,
        A: RowAdapter<T, Row = Row> + Send + Sync + 'static,
        T::Key: Clone + Send + Sync + From<i64> + Into<Value>,
    {
        async fn find_all(&self) -> RepoResult<Vec<T>> {
            let start = Instant::now();
            let result = async {
                let conn = connect(&self.db)?;
                let mut rows = conn
                    .query(&self.sql.select_all, ())
                    .await
                    .map_err(RepoError::backend)?;

                let mut entities = Vec::new();
                while let Some(row) = rows.next().await.map_err(RepoError::backend)? {
                    entities.push(self.adapter.from_row(&row)?);
                }
                Ok::<_, RepoError>(entities)
            }
            .await;
            observed("find_all", T::TABLE, start, result, Vec::len)
        }

        async fn find_by_id(&self, id: &T::Key) -> RepoResult<Option<T>> {
            let start = Instant::now();
            let result = async {
                let conn = connect(&self.db)?;
                self.fetch_one(&conn, id.clone().into()).await
            }
            .await;
            observed("find_by_id", T::TABLE, start, result, |found| {
                usize::from(found.is_some())
            })
        }

        async fn insert(&self, entity: &T) -> RepoResult<T> {
            let start = Instant::now();
            let result = async {
                let values: Vec<Value> = entity
                    .insert_values()
                    .into_iter()
                    .map(to_libsql_value)
                    .collect();
                let conn = connect(&self.db)?;
                conn.execute(&self.sql.insert, values)
                    .await
                    .map_err(RepoError::backend)?;

                // Re-read on the same connection so the new row is visible.
                let new_key = <T::Key as From<i64>>::from(conn.last_insert_rowid());
                self.fetch_one(&conn, new_key.into()).await?.ok_or_else(|| {
                    RepoError::backend(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "Failed to fetch entity after insert",
                    ))
                })
            }
            .await;
            observed("insert", T::TABLE, start, result, |_| 1)
        }

        async fn update(&self, entity: &T) -> RepoResult<Option<T>> {
            let start = Instant::now();
            let result = async {
                let key = entity.id().ok_or(RepoError::MissingId)?;
                let values: Vec<Value> = entity
                    .update_values()?
                    .into_iter()
                    .map(to_libsql_value)
                    .collect();
                let conn = connect(&self.db)?;
                let n = conn
                    .execute(&self.sql.update_by_id, values)
                    .await
                    .map_err(RepoError::backend)?;
                if n == 0 {
                    return Ok(None);
                }
                self.fetch_one(&conn, key.into()).await
            }
            .await;
            observed("update", T::TABLE, start, result, |stored| {
                usize::from(stored.is_some())
            })
        }

        async fn delete_by_id(&self, id: &T::Key) -> RepoResult<bool> {
            let start = Instant::now();
            let result = async {
                let conn = connect(&self.db)?;
                let key: Value = id.clone().into();
                let n = conn
                    .execute(&self.sql.delete_by_id, vec![key])
                    .await
                    .map_err(RepoError::backend)?;
                Ok::<_, RepoError>(n > 0)
            }
            .await;
            observed("delete_by_id", T::TABLE, start, result, |deleted| {
                usize::from(*deleted)
            })
        }
    }

}

#[cfg(feature = "libsql-backend")]
pub use backend::{
    connect, enable_wal, migrate, open, LibsqlRepository, UserRowAdapter, BUSY_TIMEOUT,
};
