//! Credential store contract and SQLite implementation.
//!
//! # Responsibility
//! - Look up and insert `Account` records by handle.
//! - Offer an atomic insert-if-absent for the bootstrap path.
//!
//! # Invariants
//! - Handle uniqueness is not a storage constraint; `create` happily inserts
//!   duplicates.
//! - `create_if_handle_absent` checks and inserts in one statement under
//!   an immediate write lock.

use super::{
    bool_to_int, ensure_connection_ready, parse_bool, parse_uuid, RepoError, RepoResult,
};
use crate::model::account::Account;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;

const ACCOUNT_SELECT_SQL: &str = "SELECT
    id,
    handle,
    password_hash,
    first_name,
    last_name,
    email,
    email_confirmed_at,
    active,
    roles
FROM accounts";

const ACCOUNT_INSERT_COLUMNS: &str = "INSERT INTO accounts (
    id,
    handle,
    password_hash,
    first_name,
    last_name,
    email,
    email_confirmed_at,
    active,
    roles
)";

/// Identity/role lookup consulted by write paths and the admin bootstrap.
pub trait CredentialStore {
    /// Returns the oldest account with this handle, if any.
    fn find_by_handle(&self, handle: &str) -> RepoResult<Option<Account>>;
    /// Number of accounts sharing this handle.
    fn count_by_handle(&self, handle: &str) -> RepoResult<u64>;
    /// Inserts the account unconditionally.
    fn create(&self, account: &Account) -> RepoResult<()>;
    /// Inserts the account only when no account with its handle exists.
    ///
    /// Returns `false` when an account with the same handle was found.
    fn create_if_handle_absent(&self, account: &Account) -> RepoResult<bool>;
}

impl<S: CredentialStore + ?Sized> CredentialStore for &S {
    fn find_by_handle(&self, handle: &str) -> RepoResult<Option<Account>> {
        (**self).find_by_handle(handle)
    }

    fn count_by_handle(&self, handle: &str) -> RepoResult<u64> {
        (**self).count_by_handle(handle)
    }

    fn create(&self, account: &Account) -> RepoResult<()> {
        (**self).create(account)
    }

    fn create_if_handle_absent(&self, account: &Account) -> RepoResult<bool> {
        (**self).create_if_handle_absent(account)
    }
}

/// SQLite-backed credential store.
pub struct SqliteCredentialStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCredentialStore<'conn> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["accounts"])?;
        Ok(Self { conn })
    }
}

impl CredentialStore for SqliteCredentialStore<'_> {
    fn find_by_handle(&self, handle: &str) -> RepoResult<Option<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ACCOUNT_SELECT_SQL}
             WHERE handle = ?1
             ORDER BY created_at ASC, rowid ASC
             LIMIT 1;"
        ))?;

        let mut rows = stmt.query([handle])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_account_row(row)?));
        }

        Ok(None)
    }

    fn count_by_handle(&self, handle: &str) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE handle = ?1;",
            [handle],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn create(&self, account: &Account) -> RepoResult<()> {
        account.validate()?;
        let roles = encode_roles(&account.roles)?;

        self.conn.execute(
            &format!(
                "{ACCOUNT_INSERT_COLUMNS}
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);"
            ),
            params![
                account.id.to_string(),
                account.handle.as_str(),
                account.password_hash.as_deref(),
                account.first_name.as_str(),
                account.last_name.as_str(),
                account.email.as_str(),
                account.email_confirmed_at,
                bool_to_int(account.active),
                roles,
            ],
        )?;

        Ok(())
    }

    fn create_if_handle_absent(&self, account: &Account) -> RepoResult<bool> {
        account.validate()?;
        let roles = encode_roles(&account.roles)?;

        // Write lock first; concurrent callers wait on the busy timeout.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
            &format!(
                "{ACCOUNT_INSERT_COLUMNS}
                 SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9
                 WHERE NOT EXISTS (
                    SELECT 1 FROM accounts WHERE handle = ?2
                 );"
            ),
            params![
                account.id.to_string(),
                account.handle.as_str(),
                account.password_hash.as_deref(),
                account.first_name.as_str(),
                account.last_name.as_str(),
                account.email.as_str(),
                account.email_confirmed_at,
                bool_to_int(account.active),
                roles,
            ],
        )?;
        tx.commit()?;

        Ok(inserted == 1)
    }
}

fn encode_roles(roles: &BTreeSet<String>) -> RepoResult<String> {
    serde_json::to_string(roles)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode account roles: {err}")))
}

fn parse_account_row(row: &Row<'_>) -> RepoResult<Account> {
    let id_text: String = row.get("id")?;
    let roles_text: String = row.get("roles")?;
    let roles: BTreeSet<String> = serde_json::from_str(&roles_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid roles `{roles_text}` in accounts.roles"))
    })?;

    Ok(Account {
        id: parse_uuid(&id_text, "accounts.id")?,
        handle: row.get("handle")?,
        password_hash: row.get("password_hash")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        email_confirmed_at: row.get("email_confirmed_at")?,
        active: parse_bool(row.get("active")?, "accounts.active")?,
        roles,
    })
}
