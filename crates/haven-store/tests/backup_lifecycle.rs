//! End-to-end behaviour of saves, snapshots, rotation and restores.

use haven_crypto::{Algorithm, Cipher, Passphrase};
use haven_store::{
    Document, DocumentStore, ManualBackupFormat, ManualKind, ReadPolicy, StoreConfig,
};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cipher() -> Cipher {
    Cipher::new(&Passphrase::new("lifecycle-passphrase").unwrap(), Algorithm::Aes256Gcm)
}

fn open(dir: &Path) -> DocumentStore {
    DocumentStore::open(StoreConfig::new(dir), cipher()).unwrap()
}

fn auto_files(dir: &Path, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir.join("backups/auto"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|n| n.starts_with(prefix) && n.ends_with(".enc"))
        .collect();
    names.sort();
    names
}

#[test]
fn bookings_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());

    store
        .save(Document::Bookings, &json!([{"id": "b1", "status": "pending"}]))
        .unwrap();
    let loaded = store.load(Document::Bookings, json!([])).unwrap();
    assert_eq!(loaded, json!([{"id": "b1", "status": "pending"}]));

    // a second process with the same passphrase reads the same data
    drop(store);
    let reopened = open(dir.path());
    assert_eq!(reopened.load(Document::Bookings, json!([])).unwrap(), loaded);
}

#[test]
fn garbage_primary_falls_back_to_default() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());

    fs::write(dir.path().join("bookings.enc"), "not-an-envelope").unwrap();
    assert_eq!(store.load(Document::Bookings, json!([])).unwrap(), json!([]));

    fs::write(dir.path().join("clients.enc"), [0u8, 159, 146, 150, b':', b':']).unwrap();
    assert_eq!(store.load(Document::Clients, json!([])).unwrap(), json!([]));

    assert_eq!(store.load(Document::Leads, json!(["fallback"])).unwrap(), json!(["fallback"]));
}

#[test]
fn tampered_primary_never_yields_other_data() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());
    store.save(Document::Clients, &json!([{"id": "c1", "name": "Ada"}])).unwrap();

    let path = dir.path().join("clients.enc");
    let sealed = fs::read_to_string(&path).unwrap();
    let last = sealed.len() - 1;
    let flipped = if &sealed[last..] == "0" { "1" } else { "0" };
    fs::write(&path, format!("{}{}", &sealed[..last], flipped)).unwrap();

    assert_eq!(store.load(Document::Clients, json!([])).unwrap(), json!([]));
}

#[test]
fn wrong_passphrase_escalates_when_configured() {
    let dir = TempDir::new().unwrap();
    open(dir.path()).save(Document::Settings, &json!({"reminderHours": 12})).unwrap();

    let mut config = StoreConfig::new(dir.path());
    config.read_policy = ReadPolicy::Escalate;
    let other = Cipher::new(&Passphrase::new("rotated").unwrap(), Algorithm::Aes256Gcm);
    let store = DocumentStore::open(config, other).unwrap();

    assert!(store.load_value(Document::Settings).is_err());
    // listing still works without the right key
    assert_eq!(store.list_backups().unwrap().auto.len(), 1);
}

#[test]
fn fifty_one_saves_keep_fifty_snapshots() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());

    for i in 0..51 {
        store.save(Document::Settings, &json!({"revision": i})).unwrap();
    }

    let files = auto_files(dir.path(), "settings_");
    assert_eq!(files.len(), 50);

    // the oldest snapshot is gone; the newest one holds the last save
    let listing = store.list_backups().unwrap();
    let newest = &listing.auto[0].name;
    let (_, payload) = store.backups().read_auto(newest).unwrap();
    assert_eq!(payload["data"], json!({"revision": 50}));
    let oldest = files.first().unwrap();
    let (_, payload) = store.backups().read_auto(oldest).unwrap();
    assert_eq!(payload["data"], json!({"revision": 1}));
}

#[test]
fn rotation_respects_configured_retention() {
    let dir = TempDir::new().unwrap();
    let mut config = StoreConfig::new(dir.path());
    config.retention.max_auto_backups = 5;
    let store = DocumentStore::open(config, cipher()).unwrap();

    for i in 0..8 {
        store.save(Document::Clients, &json!([i])).unwrap();
        store.save(Document::ClientSessions, &json!({"n": i})).unwrap();
    }

    assert_eq!(auto_files(dir.path(), "clients_").len(), 5);
    assert_eq!(auto_files(dir.path(), "client_sessions_").len(), 5);
}

#[test]
fn twenty_five_manual_backups_keep_twenty() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());

    let names: Vec<String> = (0..25).map(|_| store.create_manual_backup().unwrap()).collect();

    let remaining: Vec<String> = store
        .list_backups()
        .unwrap()
        .manual
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(remaining.len(), 20);
    for deleted in &names[..5] {
        assert!(!remaining.contains(deleted));
    }
    for kept in &names[5..] {
        assert!(remaining.contains(kept));
    }
}

#[test]
fn save_survives_unwritable_backup_dir() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());

    let auto = dir.path().join("backups/auto");
    fs::remove_dir_all(&auto).unwrap();
    fs::write(&auto, "this is a file now").unwrap();

    store.save(Document::Inquiries, &json!([{"id": "q1"}])).unwrap();
    assert_eq!(
        store.load(Document::Inquiries, json!([])).unwrap(),
        json!([{"id": "q1"}])
    );
}

#[test]
fn restore_takes_safety_snapshot() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());

    store.save(Document::Bookings, &json!([{"id": "old"}])).unwrap();
    let old_file = auto_files(dir.path(), "bookings_").remove(0);
    store.save(Document::Bookings, &json!([{"id": "live"}])).unwrap();

    let report = store.restore_automatic(&old_file, Document::Bookings);
    assert!(report.success, "{}", report.message);
    assert_eq!(store.load_value(Document::Bookings).unwrap(), json!([{"id": "old"}]));

    let manual = store.list_backups().unwrap().manual;
    assert_eq!(manual.len(), 1);
    assert_eq!(manual[0].kind, ManualKind::BeforeRestore(Document::Bookings));
    assert!(manual[0].name.starts_with("backup-before-restore-bookings-"));
    let (_, safety) = store.backups().read_manual(&manual[0].name).unwrap();
    assert_eq!(safety, json!([{"id": "live"}]));
}

#[test]
fn uploaded_backup_retriggers_snapshots() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());
    store.save(Document::Campaigns, &json!([{"id": "c1"}])).unwrap();

    let exported: Value = store.export_backup().unwrap();
    store.save(Document::Campaigns, &json!([])).unwrap();
    let before = auto_files(dir.path(), "campaigns_").len();

    let report = store.restore_from_uploaded_backup(&exported);
    assert!(report.success, "{}", report.message);
    assert_eq!(report.restored.len(), Document::ALL.len());
    assert_eq!(store.load_value(Document::Campaigns).unwrap(), json!([{"id": "c1"}]));
    assert_eq!(auto_files(dir.path(), "campaigns_").len(), before + 1);
}

#[test]
fn plaintext_manual_backups_are_readable_json() {
    let dir = TempDir::new().unwrap();
    let mut config = StoreConfig::new(dir.path());
    config.manual_backup_format = ManualBackupFormat::Plaintext;
    let store = DocumentStore::open(config, cipher()).unwrap();
    store.save(Document::Workflows, &json!([{"id": "w1"}])).unwrap();

    let name = store.create_manual_backup().unwrap();
    let text = fs::read_to_string(dir.path().join("backups/manual").join(&name)).unwrap();
    let composite: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(composite["workflows"], json!([{"id": "w1"}]));
    assert_eq!(composite["version"], json!("1.0"));
}

#[test]
fn encrypted_manual_backups_hide_contents() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());
    store
        .save(Document::Clients, &json!([{"id": "c1", "email": "client@example.com"}]))
        .unwrap();

    let name = store.create_manual_backup().unwrap();
    let text = fs::read_to_string(dir.path().join("backups/manual").join(&name)).unwrap();
    assert!(!text.contains("client@example.com"));
    assert!(store.restore_manual(&name).success);
}
