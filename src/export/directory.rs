// trustsync — Directory Export
//
// Writes one file per certificate into an output directory and, when asked,
// refreshes the managed reference list inside a caller-owned manifest file.
// The directory is pruned before writing; the manifest target never is —
// only its managed block gets rewritten.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use uuid::Uuid;

use crate::store::CertificateRecord;

use super::bundle::comment_block;
use super::manifest::inject_block;
use super::ExportError;

/// How per-certificate output files are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameMode {
    /// The raw distinguished name.
    DistinguishedName,
    /// A v5 UUID derived from the distinguished name — stable across runs
    /// as long as the record's identity does not change.
    Uuid,
}

impl FromStr for FilenameMode {
    type Err = ExportError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "dn" => Ok(FilenameMode::DistinguishedName),
            "uuid" => Ok(FilenameMode::Uuid),
            other => Err(ExportError::UnknownFilenameMode(other.to_string())),
        }
    }
}

/// Manifest file to refresh after the directory is written.
#[derive(Debug, Clone)]
pub struct ManifestTarget {
    pub path: PathBuf,
    /// Prepended verbatim to each filename reference line.
    pub prefix: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DirectoryReport {
    pub written: usize,
    pub pruned: usize,
    pub manifest_updated: bool,
}

/// Output filename for one record under the given mode.
pub fn filename_for(mode: FilenameMode, distinguished_name: &str) -> String {
    match mode {
        FilenameMode::DistinguishedName => format!("{distinguished_name}.pem"),
        FilenameMode::Uuid => {
            let id = Uuid::new_v5(&Uuid::NAMESPACE_X500, distinguished_name.as_bytes());
            format!("{id}.pem")
        }
    }
}

/// Export every record as `<dir>/<filename>` and optionally refresh the
/// manifest's managed block with one `# DN:` comment and one
/// `<prefix><filename>` reference per certificate.
pub async fn export_directory(
    dir: &Path,
    records: &[CertificateRecord],
    mode: FilenameMode,
    manifest: Option<&ManifestTarget>,
) -> Result<DirectoryReport, ExportError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| ExportError::Io {
            path: dir.display().to_string(),
            source,
        })?;

    let mut report = DirectoryReport {
        pruned: prune_directory(dir, manifest).await?,
        ..DirectoryReport::default()
    };

    let mut ordered: Vec<&CertificateRecord> = records.iter().collect();
    ordered.sort_by(|a, b| a.distinguished_name.cmp(&b.distinguished_name));

    let mut manifest_lines = Vec::with_capacity(ordered.len() * 2);
    for record in &ordered {
        let filename = filename_for(mode, &record.distinguished_name);
        let path = dir.join(&filename);

        let mut content = comment_block(record);
        content.push('\n');
        content.push_str(&record.pem_body);
        content.push('\n');

        tokio::fs::write(&path, content)
            .await
            .map_err(|source| ExportError::Io {
                path: path.display().to_string(),
                source,
            })?;
        report.written += 1;

        if let Some(target) = manifest {
            manifest_lines.push(format!("# DN: {}", record.distinguished_name));
            manifest_lines.push(format!("{}{}", target.prefix, filename));
        }
    }

    if let Some(target) = manifest {
        let existing = match tokio::fs::read_to_string(&target.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(source) => {
                return Err(ExportError::Io {
                    path: target.path.display().to_string(),
                    source,
                })
            }
        };

        let updated = inject_block(&existing, &manifest_lines)?;
        tokio::fs::write(&target.path, updated)
            .await
            .map_err(|source| ExportError::Io {
                path: target.path.display().to_string(),
                source,
            })?;
        report.manifest_updated = true;
    }

    tracing::info!(
        dir = %dir.display(),
        written = report.written,
        pruned = report.pruned,
        "Directory exported"
    );

    Ok(report)
}

/// Remove every regular file already in the output directory, except the
/// manifest target when it lives inside the directory.
async fn prune_directory(
    dir: &Path,
    manifest: Option<&ManifestTarget>,
) -> Result<usize, ExportError> {
    let manifest_abs = manifest.and_then(|m| std::fs::canonicalize(&m.path).ok());

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|source| ExportError::Io {
            path: dir.display().to_string(),
            source,
        })?;

    let mut pruned = 0usize;
    while let Some(entry) = entries.next_entry().await.map_err(|source| ExportError::Io {
        path: dir.display().to_string(),
        source,
    })? {
        let path = entry.path();
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }

        if let Some(manifest_abs) = &manifest_abs {
            if std::fs::canonicalize(&path).ok().as_ref() == Some(manifest_abs) {
                continue;
            }
        }

        tokio::fs::remove_file(&path)
            .await
            .map_err(|source| ExportError::Io {
                path: path.display().to_string(),
                source,
            })?;
        pruned += 1;
    }

    Ok(pruned)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
