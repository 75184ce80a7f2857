use safehavens_core::db::{open_db, open_db_in_memory};
use safehavens_core::{
    Account, AdminBootstrap, AdminCredentials, Argon2Hasher, BootstrapOutcome, BootstrapState,
    CredentialError, CredentialHasher, CredentialStore, SqliteCredentialStore, ADMIN_HANDLE,
    ROLE_ADMIN,
};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

/// Cheap stand-in so tests do not pay for Argon2 on every call.
struct PrefixHasher;

impl CredentialHasher for PrefixHasher {
    fn hash_credential(&self, plaintext: &str) -> Result<String, CredentialError> {
        if plaintext.is_empty() {
            return Err(CredentialError::MissingSecret);
        }
        Ok(format!("plain${plaintext}"))
    }

    fn verify_credential(&self, plaintext: &str, hash: &str) -> Result<bool, CredentialError> {
        Ok(hash == format!("plain${plaintext}"))
    }
}

fn credentials(secret: Option<&str>) -> AdminCredentials {
    AdminCredentials {
        email: Some("admin@example.org".to_string()),
        secret: secret.map(str::to_string),
    }
}

#[test]
fn first_call_creates_single_admin_with_admin_role() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteCredentialStore::try_new(&conn).unwrap();
    let bootstrap = AdminBootstrap::new(&store, Argon2Hasher::new(), credentials(Some("hunter2")));
    assert_eq!(bootstrap.state().unwrap(), BootstrapState::NoAdmin);

    let outcome = bootstrap.ensure_admin();
    assert_eq!(outcome.state(), BootstrapState::AdminExists);
    let created = match outcome {
        BootstrapOutcome::Created(account) => account,
        other => panic!("unexpected outcome: {other:?}"),
    };

    let stored = store.find_by_handle(ADMIN_HANDLE).unwrap().unwrap();
    assert_eq!(stored.id, created.id);
    assert!(stored.has_role(ROLE_ADMIN));
    assert!(stored.active);
    assert!(stored.email_confirmed_at.is_some());
    assert_eq!(stored.email, "admin@example.org");

    let hash = stored.password_hash.unwrap();
    assert_ne!(hash, "hunter2");
    assert!(Argon2Hasher::new().verify_credential("hunter2", &hash).unwrap());
    assert_eq!(store.count_by_handle(ADMIN_HANDLE).unwrap(), 1);
}

#[test]
fn repeated_calls_never_create_a_second_admin() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteCredentialStore::try_new(&conn).unwrap();
    let bootstrap = AdminBootstrap::new(&store, PrefixHasher, credentials(Some("pw")));

    assert!(matches!(bootstrap.ensure_admin(), BootstrapOutcome::Created(_)));
    for _ in 0..3 {
        assert!(matches!(
            bootstrap.ensure_admin(),
            BootstrapOutcome::AlreadyPresent
        ));
    }
    assert_eq!(store.count_by_handle(ADMIN_HANDLE).unwrap(), 1);
}

#[test]
fn missing_secret_fails_then_later_call_succeeds() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteCredentialStore::try_new(&conn).unwrap();

    let outcome = AdminBootstrap::new(&store, PrefixHasher, credentials(None)).ensure_admin();
    assert_eq!(outcome.state(), BootstrapState::NoAdmin);
    assert!(matches!(outcome, BootstrapOutcome::Failed(_)));
    assert_eq!(store.count_by_handle(ADMIN_HANDLE).unwrap(), 0);

    let retry = AdminBootstrap::new(&store, PrefixHasher, credentials(Some("pw"))).ensure_admin();
    assert!(matches!(retry, BootstrapOutcome::Created(_)));
    assert_eq!(store.count_by_handle(ADMIN_HANDLE).unwrap(), 1);
}

#[test]
fn conditional_insert_refuses_existing_handle() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteCredentialStore::try_new(&conn).unwrap();

    let mut first = Account::new(ADMIN_HANDLE);
    first.grant_role(ROLE_ADMIN);
    let mut second = Account::new(ADMIN_HANDLE);
    second.grant_role(ROLE_ADMIN);

    assert!(store.create_if_handle_absent(&first).unwrap());
    assert!(!store.create_if_handle_absent(&second).unwrap());
    assert_eq!(
        store.find_by_handle(ADMIN_HANDLE).unwrap().unwrap().id,
        first.id
    );
}

#[test]
fn separate_check_then_create_can_duplicate_the_handle() {
    // Two workers that each check before inserting both see "absent".
    let conn = open_db_in_memory().unwrap();
    let store = SqliteCredentialStore::try_new(&conn).unwrap();

    let worker_a_sees = store.find_by_handle(ADMIN_HANDLE).unwrap();
    let worker_b_sees = store.find_by_handle(ADMIN_HANDLE).unwrap();
    assert!(worker_a_sees.is_none() && worker_b_sees.is_none());

    store.create(&Account::new(ADMIN_HANDLE)).unwrap();
    store.create(&Account::new(ADMIN_HANDLE)).unwrap();

    assert_eq!(store.count_by_handle(ADMIN_HANDLE).unwrap(), 2);
}

#[test]
fn concurrent_bootstraps_on_one_database_create_exactly_one_admin() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("safehavens.db");
    drop(open_db(&db_path).unwrap());

    const WORKERS: usize = 6;
    let barrier = Arc::new(Barrier::new(WORKERS));
    let handles = (0..WORKERS)
        .map(|_| {
            let db_path = db_path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = open_db(&db_path).unwrap();
                let store = SqliteCredentialStore::try_new(&conn).unwrap();
                let bootstrap = AdminBootstrap::new(&store, PrefixHasher, credentials(Some("pw")));
                barrier.wait();
                matches!(bootstrap.ensure_admin(), BootstrapOutcome::Created(_))
            })
        })
        .collect::<Vec<_>>();

    let created = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|created| *created)
        .count();

    let conn = open_db(&db_path).unwrap();
    let store = SqliteCredentialStore::try_new(&conn).unwrap();
    assert_eq!(created, 1);
    assert_eq!(store.count_by_handle(ADMIN_HANDLE).unwrap(), 1);
}
