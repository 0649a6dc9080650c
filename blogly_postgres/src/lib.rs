#![forbid(unsafe_code)]
#![cfg_attr(
    not(feature = "postgres-backend"),
    doc = "Enable feature `postgres-backend` to use this adapter."
)]

/// Schema for the `users` table.
pub const USERS_SQL: &str = include_str!("../migrations/001_users.sql");

#[cfg(feature = "postgres-backend")]
mod backend {
    use async_trait::async_trait;
    use blogly_core::{
        Fetchable, Identifiable, Insertable, ParamValue, RepoError, RepoResult, Repository,
        RowAdapter, Updatable, User,
    };
    use blogly_sql::{Dialect, Statements};
    use std::sync::Arc;
    use std::time::Instant;
    use tokio_postgres::{
        types::{FromSql, ToSql},
        Client, NoTls, Row,
    };

    #[inline]
    #[allow(unused_variables)]
    fn obs_record(op: &str, table: &str, start: Instant, rows: usize, success: bool) {
        let elapsed = start.elapsed().as_millis() as u64;
        #[cfg(feature = "tracing")]
        {
            tracing::info!(
                backend = "postgres",
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

    /// Connect to `conn_str`, drive the connection on a background task and migrate.
    pub async fn connect(conn_str: &str) -> RepoResult<Client> {
        let (client, connection) = tokio_postgres::connect(conn_str, NoTls)
            .await
            .map_err(RepoError::backend)?;
        // The connection object must be spawned to process network events.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                #[cfg(feature = "tracing")]
                tracing::error!(error = %e, "postgres connection error");
                #[cfg(not(feature = "tracing"))]
                eprintln!("Postgres connection error: {}", e);
            }
        });
        migrate(&client).await?;
        Ok(client)
    }

    /// Apply the schema. Safe to run against an already migrated database.
    pub async fn migrate(client: &Client) -> RepoResult<()> {
        client
            .batch_execute(crate::USERS_SQL)
            .await
            .map_err(RepoError::backend)
    }

    /// Converts `ParamValue`s into owned, boxed `ToSql` trait objects so the
    /// borrowed parameter slice can outlive the match.
    fn to_postgres_params(values: &[ParamValue]) -> Vec<Box<dyn ToSql + Sync + Send>> {
        values
            .iter()
            .map(|v| -> Box<dyn ToSql + Sync + Send> {
                match v {
                    ParamValue::Text(s) => Box::new(s.clone()),
                    ParamValue::Integer(i) => Box::new(*i),
                    // Nullable columns are all TEXT, so type the NULL accordingly.
                    ParamValue::Null => Box::new(Option::<String>::None),
                }
            })
            .collect()
    }

    /// Maps rows with `id, first_name, last_name, image_url` columns into [`User`].
    #[derive(Debug, Clone, Copy, Default)]
    pub struct UserRowAdapter;

    impl RowAdapter<User> for UserRowAdapter {
        type Row = Row;

        fn from_row(&self, row: &Self::Row) -> RepoResult<User> {
            Ok(User {
                id: Some(row.try_get("id").map_err(RepoError::mapping)?),
                first_name: row.try_get("first_name").map_err(RepoError::mapping)?,
                last_name: row.try_get("last_name").map_err(RepoError::mapping)?,
                image_url: row.try_get("image_url").map_err(RepoError::mapping)?,
            })
        }
    }

    /// A fully asynchronous, `tokio-postgres`-backed repository.
    pub struct PostgresRepository<T, A>
    where
        A: RowAdapter<T, Row = Row>,
    {
        client: Arc<Client>,
        adapter: A,
        sql: Statements<T>,
    }

    impl<T, A> PostgresRepository<T, A>
    where
        T: Fetchable + Identifiable + Insertable + Updatable,
        A: RowAdapter<T, Row = Row>,
    {
        /// Creates a new repository from an existing `tokio_postgres::Client`.
        pub fn new(client: Arc<Client>, adapter: A) -> Self {
            Self {
                client,
                adapter,
                sql: Statements::new(Dialect::Dollar),
            }
        }

        /// Connects to `conn_str` and migrates, see [`connect`].
        pub async fn from_url(conn_str: &str, adapter: A) -> RepoResult<Self> {
            let client = connect(conn_str).await?;
            Ok(Self::new(Arc::new(client), adapter))
        }

        async fn fetch_one(&self, key: &(dyn ToSql + Sync)) -> RepoResult<Option<T>> {
            let row = self
                .client
                .query_opt(&self.sql.select_by_id, &[key])
                .await
                .map_err(RepoError::backend)?;
            row.map(|r| self.adapter.from_row(&r)).transpose()
        }
    }

    #[async_trait]
    impl<T, A> Repository<T> for PostgresRepository<T, A>
    where
        T: Fetchable + Identifiable + Insertable + Updatable + Send + Sync + 'static,
        A: RowAdapter<T, Row = Row> + Send + Sync + 'static,
        T::Key: ToSql + for<'b> FromSql<'b> + Send + Sync + 'static,
    {
        async fn find_all(&self) -> RepoResult<Vec<T>> {
            let start = Instant::now();
            let result = async {
                let rows = self
                    .client
                    .query(&self.sql.select_all, &[])
                    .await
                    .map_err(RepoError::backend)?;
                rows.iter()
                    .map(|row| self.adapter.from_row(row))
                    .collect::<RepoResult<Vec<T>>>()
            }
            .await;
            observed("find_all", T::TABLE, start, result, Vec::len)
        }

        async fn find_by_id(&self, id: &T::Key) -> RepoResult<Option<T>> {
            let start = Instant::now();
            let result = self.fetch_one(id).await;
            observed("find_by_id", T::TABLE, start, result, |found| {
                usize::from(found.is_some())
            })
        }

        async fn insert(&self, entity: &T) -> RepoResult<T> {
            let start = Instant::now();
            let result = async {
                let owned_params = to_postgres_params(&entity.insert_values());
                let params: Vec<&(dyn ToSql + Sync)> = owned_params
                    .iter()
                    .map(|p| p.as_ref() as &(dyn ToSql + Sync))
                    .collect();

                let row = self
                    .client
                    .query_one(&self.sql.insert, &params[..])
                    .await
                    .map_err(RepoError::backend)?;
                let new_id: T::Key = row.try_get(0).map_err(RepoError::mapping)?;

                self.fetch_one(&new_id).await?.ok_or_else(|| {
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
                let owned_params = to_postgres_params(&entity.update_values()?);
                let params: Vec<&(dyn ToSql + Sync)> = owned_params
                    .iter()
                    .map(|p| p.as_ref() as &(dyn ToSql + Sync))
                    .collect();

                let n = self
                    .client
                    .execute(&self.sql.update_by_id, &params[..])
                    .await
                    .map_err(RepoError::backend)?;
                if n == 0 {
                    return Ok(None);
                }
                self.fetch_one(&key).await
            }
            .await;
            observed("update", T::TABLE, start, result, |stored| {
                usize::from(stored.is_some())
            })
        }

        async fn delete_by_id(&self, id: &T::Key) -> RepoResult<bool> {
            let start = Instant::now();
            let result = self
                .client
                .execute(&self.sql.delete_by_id, &[id])
                .await
                .map(|n| n > 0)
                .map_err(RepoError::backend);
            observed("delete_by_id", T::TABLE, start, result, |deleted| {
                usize::from(*deleted)
            })
        }
    }

}

#[cfg(feature = "postgres-backend")]
pub use backend::{connect, migrate, PostgresRepository, UserRowAdapter};
