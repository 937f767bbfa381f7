//! Command handlers

use anyhow::{bail, Context, Result};
use haven_crypto::Cipher;
use haven_store::config::passphrase_from_env;
use haven_store::{
    BackupListing, Document, DocumentStore, ManualKind, ReadOutcome, RestoreReport, StoreConfig,
};
use std::fs;
use std::path::{Path, PathBuf};

pub fn load_config(file: Option<&Path>, data_dir: Option<PathBuf>) -> Result<StoreConfig> {
    let mut config = StoreConfig::load(file).context("Failed to load configuration")?;
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    Ok(config)
}

fn open_store(config: StoreConfig) -> Result<DocumentStore> {
    let passphrase = passphrase_from_env()?;
    let cipher = Cipher::new(&passphrase, config.algorithm);
    DocumentStore::open(config, cipher).context("Failed to open document store")
}

pub fn init(config: StoreConfig) -> Result<()> {
    let store = open_store(config)?;
    let config = store.config();

    println!("🔐 Haven data directory ready");
    println!();
    println!("  data:           {}", config.data_dir.display());
    println!("  auto backups:   {}", config.auto_backup_dir().display());
    println!("  manual backups: {}", config.manual_backup_dir().display());
    println!("  algorithm:      {:?}", store.cipher().algorithm());
    println!("  key:            {}", store.cipher().fingerprint());
    println!();
    println!("Keep the passphrase safe: without it no document or backup can be read.");
    Ok(())
}

pub fn status(config: StoreConfig, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let statuses = store.status();

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    println!("{:<18} {:<14} {:>10}  {}", "DOCUMENT", "STATE", "SIZE", "DETAIL");
    for status in &statuses {
        let size = status.size.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{:<18} {:<14} {:>10}  {}",
            status.document.key(),
            status.state,
            size,
            status.detail.as_deref().unwrap_or("")
        );
    }

    let unhealthy = statuses
        .iter()
        .filter(|s| matches!(s.state, "corrupted" | "key-mismatch" | "unreadable"))
        .count();
    if unhealthy > 0 {
        println!();
        println!("⚠️  {} document(s) cannot be read; loads return defaults until restored", unhealthy);
    }
    Ok(())
}

pub fn show(config: StoreConfig, document: Document) -> Result<()> {
    let store = open_store(config)?;
    match store.read(document) {
        ReadOutcome::Loaded { value, .. } => {
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        ReadOutcome::NotFound => {
            eprintln!("{} has not been saved yet; showing the default", document);
            println!("{}", serde_json::to_string_pretty(&document.default_value())?);
        }
        ReadOutcome::Corrupted(reason) => bail!("{} is corrupted: {}", document, reason),
        ReadOutcome::Unreadable(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", store.path(document).display()))
        }
        other => bail!("{} could not be read ({})", document, other.label()),
    }
    Ok(())
}

pub fn backup_create(config: StoreConfig) -> Result<()> {
    let store = open_store(config)?;
    let name = store.create_manual_backup()?;
    println!("✅ Backup written: {}", name);
    Ok(())
}

pub fn backup_list(config: &StoreConfig, json: bool) -> Result<()> {
    let listing = scan(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("Automatic backups ({}):", listing.auto.len());
    for entry in &listing.auto {
        let document = entry.document.map_or("?", Document::key);
        println!(
            "  {:<60} {:<16} {:>8} B  {}",
            entry.name,
            document,
            entry.size,
            entry.modified.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!();
    println!("Manual backups ({}):", listing.manual.len());
    for entry in &listing.manual {
        let kind = match entry.kind {
            ManualKind::Full => "full".to_string(),
            ManualKind::BeforeRestore(document) => format!("before-restore {}", document),
        };
        println!("  {:<60} {:<16} {:>8} B", entry.name, kind, entry.size);
    }
    Ok(())
}

pub fn backup_stats(config: &StoreConfig) -> Result<()> {
    let stats = scan(config)?.stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn scan(config: &StoreConfig) -> Result<BackupListing> {
    BackupListing::scan(&config.auto_backup_dir(), &config.manual_backup_dir())
        .context("Failed to list backups")
}

pub fn backup_restore(config: StoreConfig, file: &str, document: Document) -> Result<()> {
    let store = open_store(config)?;
    report(store.restore_automatic(file, document))
}

pub fn backup_import(config: StoreConfig, file: &Path) -> Result<()> {
    let store = open_store(config)?;
    let text = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;

    // exported backups are plain JSON; copies of encrypted manual backups are envelopes
    let backup = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(_) => store
            .cipher()
            .open(&text)
            .with_context(|| format!("{} is neither JSON nor readable with this key", file.display()))?,
    };
    report(store.restore_from_uploaded_backup(&backup))
}

pub fn backup_restore_manual(config: StoreConfig, file: &str) -> Result<()> {
    let store = open_store(config)?;
    report(store.restore_manual(file))
}

pub fn backup_export(config: StoreConfig, out: Option<&Path>) -> Result<()> {
    let store = open_store(config)?;
    let composite = store.export_backup()?;
    let text = serde_json::to_string_pretty(&composite)?;

    match out {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::warn!(path = %path.display(), "export is unencrypted; store it somewhere safe");
            println!("✅ Exported {} documents to {}", Document::ALL.len(), path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn report(report: RestoreReport) -> Result<()> {
    if !report.success {
        bail!("{}", report.message);
    }
    println!("✅ {}", report.message);
    Ok(())
}
