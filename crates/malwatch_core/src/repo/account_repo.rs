//! Account store contract and SQLite implementation.
//!
//! # Responsibility
//! - Own all reads and writes of `accounts` and `repositories`.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `list_unprocessed` always reads committed state; nothing is cached.
//! - Account and repository inserts are idempotent (`INSERT OR IGNORE`).
//! - Deleting an account leaves its repositories in place.

use crate::db::DbError;
use crate::model::account::{Account, AccountId, Repository};
use rusqlite::{params, Connection, Row};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const ACCOUNT_SELECT_SQL: &str = "SELECT
    id,
    name,
    is_processed,
    is_removed
FROM accounts";

/// Accounts that were known to be malicious when tracking started.
pub const DEFAULT_SEED_ACCOUNTS: &[&str] = &["lazysmock", "unkemptdefe", "ultimatepate"];

pub type StoreResult<T> = Result<T, StoreError>;

/// Store error for account/repository persistence.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted crawl data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Row totals reported by the `stats` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub accounts: u64,
    pub processed: u64,
    pub pending: u64,
    pub removed: u64,
    pub created_repositories: u64,
    pub forked_repositories: u64,
}

/// Persistence contract used by the crawl engine.
pub trait AccountStore {
    /// Returns the frontier: every account with `processed=false`.
    fn list_unprocessed(&self) -> StoreResult<HashSet<Account>>;
    /// Sets `removed=true`. No-op when already set or the id is unknown.
    fn mark_removed(&self, id: AccountId) -> StoreResult<()>;
    /// Sets `processed=true`. No-op when already set or the id is unknown.
    fn mark_processed(&self, id: AccountId) -> StoreResult<()>;
    /// Inserts a new unprocessed account. Returns `false` if the name exists.
    fn insert_account_if_absent(&self, name: &str) -> StoreResult<bool>;
    /// Deletes the account row by name. Returns `false` if nothing matched.
    fn delete_account_by_name(&self, name: &str) -> StoreResult<bool>;
    /// Records a repository for its owner. Returns `false` on duplicates.
    fn insert_repository_if_absent(
        &self,
        name: &str,
        owner_id: AccountId,
        is_fork: bool,
    ) -> StoreResult<bool>;
}

/// SQLite-backed account store borrowing the run's single connection.
pub struct SqliteAccountStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccountStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts bootstrap accounts, returning how many were new.
    pub fn seed_accounts<S: AsRef<str>>(&self, names: &[S]) -> StoreResult<usize> {
        let mut inserted = 0;
        for name in names {
            if self.insert_account_if_absent(name.as_ref())? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    pub fn get_account_by_name(&self, name: &str) -> StoreResult<Option<Account>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACCOUNT_SELECT_SQL} WHERE name = ?1;"))?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_account_row(row)?));
        }

        Ok(None)
    }

    /// Lists repositories recorded for one owner, sorted by name.
    pub fn list_repositories(&self, owner_id: AccountId) -> StoreResult<Vec<Repository>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, account_id, is_fork
             FROM repositories
             WHERE account_id = ?1
             ORDER BY name ASC, id ASC;",
        )?;
        let mut rows = stmt.query([owner_id])?;
        let mut repositories = Vec::new();

        while let Some(row) = rows.next()? {
            repositories.push(Repository {
                id: row.get("id")?,
                name: row.get("name")?,
                owner_id: row.get("account_id")?,
                is_fork: parse_flag(row, "is_fork")?,
            });
        }

        Ok(repositories)
    }

    pub fn stats(&self) -> StoreResult<StoreStats> {
        let (accounts, processed, removed) = self.conn.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(is_processed), 0),
                COALESCE(SUM(is_removed), 0)
             FROM accounts;",
            [],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?)),
        )?;
        let (created_repositories, forked_repositories) = self.conn.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN is_fork = 0 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN is_fork = 1 THEN 1 ELSE 0 END), 0)
             FROM repositories;",
            [],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )?;

        Ok(StoreStats {
            accounts: to_count(accounts),
            processed: to_count(processed),
            pending: to_count(accounts - processed),
            removed: to_count(removed),
            created_repositories: to_count(created_repositories),
            forked_repositories: to_count(forked_repositories),
        })
    }
}

impl AccountStore for SqliteAccountStore<'_> {
    fn list_unprocessed(&self) -> StoreResult<HashSet<Account>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACCOUNT_SELECT_SQL} WHERE is_processed = 0;"))?;
        let mut rows = stmt.query([])?;
        let mut accounts = HashSet::new();

        while let Some(row) = rows.next()? {
            accounts.insert(parse_account_row(row)?);
        }

        Ok(accounts)
    }

    fn mark_removed(&self, id: AccountId) -> StoreResult<()> {
        self.conn.execute(
            "UPDATE accounts SET is_removed = 1 WHERE id = ?1 AND is_removed = 0;",
            [id],
        )?;
        Ok(())
    }

    fn mark_processed(&self, id: AccountId) -> StoreResult<()> {
        self.conn.execute(
            "UPDATE accounts SET is_processed = 1 WHERE id = ?1 AND is_processed = 0;",
            [id],
        )?;
        Ok(())
    }

    fn insert_account_if_absent(&self, name: &str) -> StoreResult<bool> {
        let changed = self
            .conn
            .execute("INSERT OR IGNORE INTO accounts (name) VALUES (?1);", [name])?;
        Ok(changed > 0)
    }

    fn delete_account_by_name(&self, name: &str) -> StoreResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM accounts WHERE name = ?1;", [name])?;
        Ok(changed > 0)
    }

    fn insert_repository_if_absent(
        &self,
        name: &str,
        owner_id: AccountId,
        is_fork: bool,
    ) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO repositories (name, account_id, is_fork) VALUES (?1, ?2, ?3);",
            params![name, owner_id, bool_to_int(is_fork)],
        )?;
        Ok(changed > 0)
    }
}

fn parse_account_row(row: &Row<'_>) -> StoreResult<Account> {
    Ok(Account {
        id: row.get("id")?,
        name: row.get("name")?,
        processed: parse_flag(row, "is_processed")?,
        removed: parse_flag(row, "is_removed")?,
    })
}

fn parse_flag(row: &Row<'_>, column: &str) -> StoreResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(StoreError::InvalidData(format!(
            "invalid {column} value `{other}`"
        ))),
    }
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
