// trustsync — Bundle Export
//
// Renders the whole catalog as one PEM bundle: a generated header comment,
// then one (comment block, blank line, PEM) group per certificate, ordered
// by distinguished name so re-exports diff cleanly.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::store::CertificateRecord;

use super::ExportError;

/// Per-certificate comment lines shared by the bundle and directory forms.
pub(crate) fn comment_block(record: &CertificateRecord) -> String {
    format!(
        "# Subject: {}\n# Issued:  {}\n# Expires: {}\n",
        record.distinguished_name,
        record.valid_from.to_rfc3339(),
        record.valid_to.to_rfc3339(),
    )
}

/// Render the full bundle text.
pub fn render_bundle(records: &[CertificateRecord], generated_at: DateTime<Utc>) -> String {
    let mut ordered: Vec<&CertificateRecord> = records.iter().collect();
    ordered.sort_by(|a, b| a.distinguished_name.cmp(&b.distinguished_name));

    let mut out = String::new();
    out.push_str("##\n## CA certificate bundle generated by trustsync.\n##\n");
    out.push_str(&format!("## Generated: {}\n", generated_at.to_rfc3339()));
    out.push_str(&format!("## Certificates: {}\n##\n", ordered.len()));

    for record in ordered {
        out.push('\n');
        out.push_str(&comment_block(record));
        out.push('\n');
        out.push_str(&record.pem_body);
        out.push('\n');
    }

    out
}

/// Write the bundle form to `path`. The content is rendered fully in memory
/// before a single write, so a destination failure never leaves a torn file
/// behind a partially written header.
pub async fn write_bundle(
    path: &Path,
    records: &[CertificateRecord],
    generated_at: DateTime<Utc>,
) -> Result<usize, ExportError> {
    let content = render_bundle(records, generated_at);
    tokio::fs::write(path, content)
        .await
        .map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })?;

    tracing::info!(path = %path.display(), certificates = records.len(), "Bundle exported");
    Ok(records.len())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
