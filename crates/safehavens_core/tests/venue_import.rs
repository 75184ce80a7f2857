use safehavens_core::db::open_db_in_memory;
use safehavens_core::{
    ImportError, SqliteVenueRepository, VenueCategories, VenueImporter, VenueRepository,
    ADMIN_HANDLE,
};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn record(name: &str) -> Value {
    json!({
        "name": name,
        "venue_type": "Café",
        "address": "12 Quay Street",
        "post_code": "H91 ABCD",
        "city": "Galway",
        "country": "Ireland",
        "lat": "53.2707",
        "lng": "-9.0568",
        "link": "https://example.org/venue",
        "rating": 5
    })
}

fn dataset(count: usize) -> Value {
    Value::Array((1..=count).map(|i| record(&format!("Venue {i}"))).collect())
}

fn write_dataset(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("venues.json");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn imports_every_record_owned_by_admin() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVenueRepository::try_new(&conn).unwrap();
    let importer = VenueImporter::new(&repo, VenueCategories::default());

    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, &dataset(5).to_string());

    assert_eq!(importer.import_file(&path).unwrap(), 5);
    assert_eq!(repo.count_venues().unwrap(), 5);

    let page = repo.list_page(1, 10).unwrap();
    assert!(page.items.iter().all(|venue| venue.owner == ADMIN_HANDLE));
    assert_eq!(page.items[0].name, "Venue 1");
    assert_eq!(page.items[0].category.as_deref(), Some("Café"));
    assert_eq!(page.items[0].link, "https://example.org/venue");
}

#[test]
fn importing_twice_doubles_the_collection() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVenueRepository::try_new(&conn).unwrap();
    let importer = VenueImporter::new(&repo, VenueCategories::default());
    let raw = dataset(5).to_string();

    importer.import_str(&raw).unwrap();
    importer.import_str(&raw).unwrap();

    assert_eq!(repo.count_venues().unwrap(), 10);
}

#[test]
fn missing_required_field_aborts_whole_import() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVenueRepository::try_new(&conn).unwrap();
    let importer = VenueImporter::new(&repo, VenueCategories::default());

    let mut records = dataset(5);
    records[2].as_object_mut().unwrap().remove("name");

    let err = importer.import_str(&records.to_string()).unwrap_err();
    match err {
        ImportError::SchemaViolation { index, name, reason } => {
            assert_eq!(index, 2);
            assert_eq!(name, None);
            assert!(reason.contains("`name`"), "{reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(repo.count_venues().unwrap(), 0);
}

#[test]
fn wrongly_typed_field_names_the_record() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVenueRepository::try_new(&conn).unwrap();
    let importer = VenueImporter::new(&repo, VenueCategories::default());

    let mut records = dataset(3);
    records[1]["lat"] = json!(53.27);

    let err = importer.import_str(&records.to_string()).unwrap_err();
    assert_eq!(err.cause(), "schema_violation");
    assert!(err.to_string().starts_with("record 2 (`Venue 2`)"), "{err}");
    assert_eq!(repo.count_venues().unwrap(), 0);
}

#[test]
fn unknown_category_is_a_schema_violation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVenueRepository::try_new(&conn).unwrap();
    let importer = VenueImporter::new(&repo, VenueCategories::default());

    let mut records = dataset(2);
    records[0]["venue_type"] = json!("Spaceport");

    let err = importer.import_str(&records.to_string()).unwrap_err();
    assert!(matches!(err, ImportError::SchemaViolation { index: 0, .. }));
    assert_eq!(repo.count_venues().unwrap(), 0);
}

#[test]
fn blank_category_imports_as_absent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVenueRepository::try_new(&conn).unwrap();
    let importer = VenueImporter::new(&repo, VenueCategories::default());

    let mut records = dataset(1);
    records[0]["venue_type"] = json!("");

    importer.import_str(&records.to_string()).unwrap();
    let page = repo.list_page(1, 4).unwrap();
    assert_eq!(page.items[0].category, None);
}

#[test]
fn missing_file_is_source_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVenueRepository::try_new(&conn).unwrap();
    let importer = VenueImporter::new(&repo, VenueCategories::default());

    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.json");

    let err = importer.import_file(&missing).unwrap_err();
    assert!(matches!(&err, ImportError::SourceNotFound(path) if path == &missing));
    assert_eq!(err.cause(), "source_not_found");
}

#[test]
fn directory_path_is_source_unreadable() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVenueRepository::try_new(&conn).unwrap();
    let importer = VenueImporter::new(&repo, VenueCategories::default());

    let dir = TempDir::new().unwrap();
    let err = importer.import_file(dir.path()).unwrap_err();
    assert!(matches!(err, ImportError::SourceUnreadable { .. }), "{err:?}");
}

#[test]
fn malformed_json_and_non_array_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVenueRepository::try_new(&conn).unwrap();
    let importer = VenueImporter::new(&repo, VenueCategories::default());

    for body in ["[{\"name\": ", "{\"name\": \"solo\"}", "\"venues\""] {
        let err = importer.import_str(body).unwrap_err();
        assert!(matches!(err, ImportError::MalformedSource(_)), "{body}: {err:?}");
    }

    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, "not json at all");
    assert!(matches!(
        importer.import_file(Path::new(&path)),
        Err(ImportError::MalformedSource(_))
    ));
    assert_eq!(repo.count_venues().unwrap(), 0);
}

#[test]
fn empty_array_imports_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVenueRepository::try_new(&conn).unwrap();
    let importer = VenueImporter::new(&repo, VenueCategories::default());

    assert_eq!(importer.import_str("[]").unwrap(), 0);
    assert_eq!(repo.count_venues().unwrap(), 0);
}

#[test]
fn record_shape_is_checked_field_by_field() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVenueRepository::try_new(&conn).unwrap();
    let importer = VenueImporter::new(&repo, VenueCategories::default());

    // Positional arrays are not records, even with eight strings.
    let positional = json!([["a", "Café", "b", "c", "d", "e", "1", "2"]]);
    let err = importer.import_str(&positional.to_string()).unwrap_err();
    match err {
        ImportError::SchemaViolation { index, reason, .. } => {
            assert_eq!(index, 0);
            assert_eq!(reason, "record is not an object");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let mut null_link = dataset(1);
    null_link[0]["link"] = Value::Null;
    let err = importer.import_str(&null_link.to_string()).unwrap_err();
    assert!(matches!(err, ImportError::SchemaViolation { index: 0, .. }));
    assert_eq!(repo.count_venues().unwrap(), 0);

    let mut no_link = dataset(1);
    no_link[0].as_object_mut().unwrap().remove("link");
    assert_eq!(importer.import_str(&no_link.to_string()).unwrap(), 1);
    let page = repo.list_page(1, 4).unwrap();
    assert_eq!(page.items[0].link, "");
}
