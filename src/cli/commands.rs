// trustsync — CLI Command Handlers
//
// Each function handles one CLI subcommand. They coordinate between the
// transport, sync, store, and export modules. Handlers open the catalog,
// do their work, and print a short human-readable result; structured
// detail goes to tracing.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::bundle::X509Decoder;
use crate::error::TrustsyncError;
use crate::export::{export_directory, write_bundle, FilenameMode, ManifestTarget};
use crate::store::{CertStore, Database, SqliteCertStore};
use crate::sync::Reconciler;
use crate::transport::Locator;

use super::{Cli, Commands, ExportTarget, SourceAction};

/// Default directory for trustsync data files.
fn data_dir() -> PathBuf {
    let base = dirs_next::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("trustsync")
}

/// Path to the catalog database, honoring the global `--db` override.
fn db_path(override_path: &Option<PathBuf>) -> PathBuf {
    override_path
        .clone()
        .unwrap_or_else(|| data_dir().join("trustsync.db"))
}

/// Execute the parsed CLI command.
pub async fn execute(cli: Cli) -> Result<(), TrustsyncError> {
    let path = db_path(&cli.db);

    match cli.command {
        Commands::Init => cmd_init(&path),
        Commands::Source { action } => match action {
            SourceAction::Add { id, locator } => cmd_source_add(&path, id, locator),
            SourceAction::List => cmd_source_list(&path),
            SourceAction::Remove { id } => cmd_source_remove(&path, id),
        },
        Commands::Sync {
            source_id,
            from,
            dir,
            force,
        } => cmd_sync(&path, source_id, from, dir, force).await,
        Commands::List => cmd_list(&path),
        Commands::Export { target } => match target {
            ExportTarget::Bundle { output } => cmd_export_bundle(&path, output).await,
            ExportTarget::Dir {
                output,
                format,
                manifest,
                prefix,
            } => cmd_export_dir(&path, output, format, manifest, prefix).await,
        },
        Commands::Clear => cmd_clear(&path),
    }
}

// ─── Init ────────────────────────────────────────────────────────────────────

fn cmd_init(path: &Path) -> Result<(), TrustsyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let _db = Database::open(path)?;

    println!("✓ trustsync initialized successfully");
    println!("  Database: {}", path.display());
    println!();
    println!("Next: declare a source with `trustsync source add <id> <locator>`");

    Ok(())
}

// ─── Sources ─────────────────────────────────────────────────────────────────

fn cmd_source_add(path: &Path, id: String, locator: String) -> Result<(), TrustsyncError> {
    if id.trim().is_empty() {
        return Err(TrustsyncError::Other("Source id must not be empty".to_string()));
    }

    let db = open_db(path)?;
    let store = SqliteCertStore::new(&db);

    store.upsert_source(&id, &locator, Utc::now())?;
    println!("✓ Source declared");
    println!("  Id:      {}", id);
    println!("  Locator: {}", locator);

    Ok(())
}

fn cmd_source_list(path: &Path) -> Result<(), TrustsyncError> {
    let db = open_db(path)?;
    let store = SqliteCertStore::new(&db);

    let sources = store.find_sources()?;

    if sources.is_empty() {
        println!("No sources declared yet.");
        println!("Declare one with: trustsync source add <id> <locator>");
        return Ok(());
    }

    println!("Declared sources ({}):\n", sources.len());
    for source in &sources {
        println!(
            "  {:16} │ {} │ declared {}",
            source.id,
            source.locator,
            source.last_updated.format("%Y-%m-%d %H:%M:%S UTC"),
        );
    }

    Ok(())
}

fn cmd_source_remove(path: &Path, id: String) -> Result<(), TrustsyncError> {
    let db = open_db(path)?;
    let store = SqliteCertStore::new(&db);

    if store.remove_source(&id)? {
        println!("✓ Source {} removed", id);
    } else {
        println!("Source not found: {}", id);
    }

    Ok(())
}

// ─── Sync ────────────────────────────────────────────────────────────────────

async fn cmd_sync(
    path: &Path,
    source_id: Option<String>,
    from: Option<String>,
    dir: Option<PathBuf>,
    force: bool,
) -> Result<(), TrustsyncError> {
    let db = open_db(path)?;
    let store = SqliteCertStore::new(&db);

    let origins: Vec<Locator> = if let Some(raw) = from {
        vec![Locator::parse(&raw)]
    } else if let Some(dir) = dir {
        pem_files_in(&dir).await?
    } else if let Some(id) = source_id {
        let source = store
            .find_source(&id)?
            .ok_or_else(|| crate::store::StoreError::SourceNotFound(id))?;
        vec![Locator::parse(&source.locator)]
    } else {
        let sources = store.find_sources()?;
        if sources.is_empty() {
            return Err(TrustsyncError::Other(
                "No sources declared — add one with `trustsync source add` or pass --from"
                    .to_string(),
            ));
        }
        sources
            .iter()
            .map(|source| Locator::parse(&source.locator))
            .collect()
    };

    let reconciler = Reconciler::new(&store, X509Decoder, force)?;
    let report = reconciler.run(&origins).await?;

    println!("✓ Reconciliation complete");
    println!("  Origins:  {}", report.origins);
    println!("  Scanned:  {}", report.scanned);
    println!("  Inserted: {}", report.inserted);
    println!("  Updated:  {}", report.updated);
    println!("  Removed:  {}", report.removed);

    Ok(())
}

/// Every .pem/.crt file in the directory, sorted by path so passes are
/// deterministic.
async fn pem_files_in(dir: &Path) -> Result<Vec<Locator>, TrustsyncError> {
    let mut paths = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str());
        if matches!(ext, Some("pem") | Some("crt")) {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(TrustsyncError::Other(format!(
            "No .pem or .crt files found in {}",
            dir.display()
        )));
    }

    Ok(paths.into_iter().map(Locator::Path).collect())
}

// ─── List ────────────────────────────────────────────────────────────────────

fn cmd_list(path: &Path) -> Result<(), TrustsyncError> {
    let db = open_db(path)?;
    let store = SqliteCertStore::new(&db);

    let summaries = store.list()?;

    if summaries.is_empty() {
        println!("No certificates stored yet.");
        println!("Run a pass with: trustsync sync");
        return Ok(());
    }

    println!("Stored certificates ({}):\n", summaries.len());
    for summary in &summaries {
        println!(
            "  {} │ {} – {} │ {}",
            summary.distinguished_name,
            summary.valid_from.format("%Y-%m-%d"),
            summary.valid_to.format("%Y-%m-%d"),
            summary.origin_locator,
        );
    }

    Ok(())
}

// ─── Export ──────────────────────────────────────────────────────────────────

async fn cmd_export_bundle(path: &Path, output: PathBuf) -> Result<(), TrustsyncError> {
    let db = open_db(path)?;
    let store = SqliteCertStore::new(&db);

    let records = store.find_all()?;
    let written = write_bundle(&output, &records, Utc::now()).await?;

    println!("✓ Bundle exported");
    println!("  File:         {}", output.display());
    println!("  Certificates: {}", written);

    Ok(())
}

async fn cmd_export_dir(
    path: &Path,
    output: PathBuf,
    format: String,
    manifest: Option<PathBuf>,
    prefix: String,
) -> Result<(), TrustsyncError> {
    let mode: FilenameMode = format.parse().map_err(TrustsyncError::Export)?;
    let target = manifest.map(|path| ManifestTarget { path, prefix });

    let db = open_db(path)?;
    let store = SqliteCertStore::new(&db);

    let records = store.find_all()?;
    let report = export_directory(&output, &records, mode, target.as_ref()).await?;

    println!("✓ Directory exported");
    println!("  Directory: {}", output.display());
    println!("  Written:   {}", report.written);
    println!("  Pruned:    {}", report.pruned);
    if let Some(target) = &target {
        println!("  Manifest:  {}", target.path.display());
    }

    Ok(())
}

// ─── Clear ───────────────────────────────────────────────────────────────────

fn cmd_clear(path: &Path) -> Result<(), TrustsyncError> {
    let db = open_db(path)?;
    let store = SqliteCertStore::new(&db);

    let removed = store.clear()?;
    println!("✓ Catalog cleared ({} certificates removed)", removed);

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Open the catalog database, failing with a hint if `init` never ran.
fn open_db(path: &Path) -> Result<Database, TrustsyncError> {
    if !path.exists() {
        return Err(TrustsyncError::Other(format!(
            "Database not found at {}. Run `trustsync init` first.",
            path.display()
        )));
    }

    Ok(Database::open(path)?)
}
