#![forbid(unsafe_code)]
//! SQL builder helpers driven by the entity metadata traits of `blogly_core`.
//!
//! Every builder takes a [`Dialect`] selecting the placeholder style:
//! - `Dialect::Question`: ? (libsql / SQLite)
//! - `Dialect::Dollar`: $1, $2, ... (Postgres)

use std::marker::PhantomData;

use blogly_core::{Fetchable, Identifiable, Insertable, Updatable};

/// Placeholder style of a SQL backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Question, // ?
    Dollar,   // $1, $2, ...
}

impl Dialect {
    /// The `n`th (1-based) bind placeholder.
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::Question => "?".to_string(),
            Dialect::Dollar => format!("${}", n),
        }
    }

    /// `count` comma-separated placeholders starting at `start`.
    fn placeholders(self, start: usize, count: usize) -> String {
        (start..start + count)
            .map(|n| self.placeholder(n))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Build SELECT <cols> FROM <table>, ordered by `E::ORDER_BY`.
pub fn select_all<E>() -> String
where
    E: Fetchable,
{
    format!(
        "SELECT {cols} FROM {table} ORDER BY {order}",
        cols = E::SELECT_COLUMNS.join(", "),
        table = E::TABLE,
        order = E::ORDER_BY,
    )
}

/// Build SELECT ... WHERE <id> = <ph>
pub fn select_by_id<E>(dialect: Dialect) -> String
where
    E: Fetchable + Identifiable,
{
    format!(
        "SELECT {cols} FROM {table} WHERE {id} = {ph}",
        cols = E::SELECT_COLUMNS.join(", "),
        table = E::TABLE,
        id = E::ID_COLUMN,
        ph = dialect.placeholder(1),
    )
}

/// Build INSERT INTO <table> (<cols>) VALUES (<placeholders>)
/// `Dialect::Dollar` appends `RETURNING <id>` since Postgres has no last-insert-id call.
pub fn insert<E>(dialect: Dialect) -> String
where
    E: Fetchable + Identifiable + Insertable,
{
    let cols = E::INSERT_COLUMNS;
    let mut sql = format!(
        "INSERT INTO {table} ({cols}) VALUES ({vals})",
        table = E::TABLE,
        cols = cols.join(", "),
        vals = dialect.placeholders(1, cols.len()),
    );
    if dialect == Dialect::Dollar {
        sql.push_str(" RETURNING ");
        sql.push_str(E::ID_COLUMN);
    }
    sql
}

/// Build UPDATE <table> SET <col1> = <ph1>, ... WHERE <id> = <phN>
pub fn update_by_id<E>(dialect: Dialect) -> String
where
    E: Fetchable + Identifiable + Updatable,
{
    let cols = E::UPDATE_COLUMNS;
    let assignments = cols
        .iter()
        .enumerate()
        .map(|(i, col)| format!("{col} = {ph}", ph = dialect.placeholder(i + 1)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {table} SET {assignments} WHERE {id} = {ph}",
        table = E::TABLE,
        id = E::ID_COLUMN,
        ph = dialect.placeholder(cols.len() + 1),
    )
}

/// Build DELETE FROM <table> WHERE <id> = <ph>
pub fn delete_by_id<E>(dialect: Dialect) -> String
where
    E: Fetchable + Identifiable,
{
    format!(
        "DELETE FROM {table} WHERE {id} = {ph}",
        table = E::TABLE,
        id = E::ID_COLUMN,
        ph = dialect.placeholder(1),
    )
}

/// Prebuilt statements for one entity, computed once per repository instance.
#[derive(Debug, Clone)]
pub struct Statements<E> {
    pub select_all: String,
    pub select_by_id: String,
    pub insert: String,
    pub update_by_id: String,
    pub delete_by_id: String,
    _marker: PhantomData<fn() -> E>,
}

impl<E> Statements<E>
where
    E: Fetchable + Identifiable + Insertable + Updatable,
{
    pub fn new(dialect: Dialect) -> Self {
        Self {
            select_all: select_all::<E>(),
            select_by_id: select_by_id::<E>(dialect),
            insert: insert::<E>(dialect),
            update_by_id: update_by_id::<E>(dialect),
            delete_by_id: delete_by_id::<E>(dialect),
            _marker: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogly_core::User;

    #[test]
    fn select_all_is_ordered_by_name() {
        assert_eq!(
            select_all::<User>(),
            "SELECT id, first_name, last_name, image_url FROM users ORDER BY last_name, first_name, id"
        );
    }

    #[test]
    fn select_by_id_per_dialect() {
        assert_eq!(
            select_by_id::<User>(Dialect::Question),
            "SELECT id, first_name, last_name, image_url FROM users WHERE id = ?"
        );
        assert_eq!(
            select_by_id::<User>(Dialect::Dollar),
            "SELECT id, first_name, last_name, image_url FROM users WHERE id = $1"
        );
    }

    #[test]
    fn insert_returns_id_only_for_dollar() {
        assert_eq!(
            insert::<User>(Dialect::Question),
            "INSERT INTO users (first_name, last_name, image_url) VALUES (?, ?, ?)"
        );
        assert_eq!(
            insert::<User>(Dialect::Dollar),
            "INSERT INTO users (first_name, last_name, image_url) VALUES ($1, $2, $3) RETURNING id"
        );
    }

    #[test]
    fn update_puts_key_placeholder_last() {
        assert_eq!(
            update_by_id::<User>(Dialect::Dollar),
            "UPDATE users SET first_name = $1, last_name = $2, image_url = $3 WHERE id = $4"
        );
        assert_eq!(
            update_by_id::<User>(Dialect::Question),
            "UPDATE users SET first_name = ?, last_name = ?, image_url = ? WHERE id = ?"
        );
    }

    #[test]
    fn delete_statements() {
        assert_eq!(
            delete_by_id::<User>(Dialect::Question),
            "DELETE FROM users WHERE id = ?"
        );
    }

    #[test]
    fn statements_bundle_matches_builders() {
        let stmts = Statements::<User>::new(Dialect::Dollar);
        assert_eq!(stmts.insert, insert::<User>(Dialect::Dollar));
        assert_eq!(stmts.delete_by_id, delete_by_id::<User>(Dialect::Dollar));
        assert!(stmts.select_all.contains("ORDER BY"));
    }
}
