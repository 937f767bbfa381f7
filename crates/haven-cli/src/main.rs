//! Haven CLI - operator tool for the encrypted document store
//!
//! Usage:
//!   haven init              - Create the data directory and show the key fingerprint
//!   haven status            - Check every document file
//!   haven show <document>   - Print a document as JSON
//!   haven backup <action>   - Create, list, restore and export backups
//!
//! The passphrase is read from HAVEN_PASSPHRASE (or ENCRYPTION_KEY).

mod commands;

use clap::{Parser, Subcommand};
use haven_store::Document;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "haven")]
#[command(version)]
#[command(about = "Encrypted document store with automatic backups", long_about = None)]
struct Cli {
    /// Config file (defaults to ./haven.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory, overrides the config file and HAVEN_DATA_DIR
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory layout
    Init,

    /// Report the state of every document file
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Print a decrypted document
    Show {
        /// Document name, e.g. bookings or invitationCodes
        document: Document,
    },

    /// Manage backups
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },
}

#[derive(Subcommand)]
enum BackupAction {
    /// Write a full manual backup of every document
    Create,

    /// List automatic and manual backups (no passphrase needed)
    List {
        #[arg(long)]
        json: bool,
    },

    /// Backup counts and sizes (no passphrase needed)
    Stats,

    /// Restore one document from an automatic backup
    Restore {
        /// Automatic backup file name, e.g. bookings_2024-05-01T09-30-00-123Z.enc
        file: String,
        /// Document to restore into
        document: Document,
    },

    /// Restore every document in an exported backup file
    Import {
        /// Path to a JSON backup produced by `haven backup export`
        file: PathBuf,
    },

    /// Restore from a manual backup in the backup directory
    RestoreManual {
        /// Manual backup file name, e.g. backup-2024-05-01T09-30-00-123Z.json
        file: String,
    },

    /// Print every document as one JSON object
    Export {
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    // stdout carries command output; logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref(), cli.data_dir)?;

    match cli.command {
        Commands::Init => commands::init(config),
        Commands::Status { json } => commands::status(config, json),
        Commands::Show { document } => commands::show(config, document),
        Commands::Backup { action } => match action {
            BackupAction::Create => commands::backup_create(config),
            BackupAction::List { json } => commands::backup_list(&config, json),
            BackupAction::Stats => commands::backup_stats(&config),
            BackupAction::Restore { file, document } => commands::backup_restore(config, &file, document),
            BackupAction::Import { file } => commands::backup_import(config, &file),
            BackupAction::RestoreManual { file } => commands::backup_restore_manual(config, &file),
            BackupAction::Export { out } => commands::backup_export(config, out.as_deref()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_document_names() {
        let cli = Cli::parse_from(["haven", "backup", "restore", "x.enc", "magic_links"]);
        match cli.command {
            Commands::Backup {
                action: BackupAction::Restore { document, .. },
            } => assert_eq!(document, Document::MagicLinks),
            _ => panic!("wrong command"),
        }

        assert!(Cli::try_parse_from(["haven", "show", "payments"]).is_err());
    }
}
