// trustsync — PEM Bundle Scanner
//
// Extracts normalized single-certificate PEM blocks from arbitrary text.
// Source bundles in the wild carry comments, license prose, and indented or
// CRLF-framed blocks; the scanner tolerates all of that and yields each
// certificate re-wrapped in the canonical `BEGIN/END CERTIFICATE` frame.
// Text that matches no marker pair is skipped, not an error.

use regex::Regex;

use super::BundleError;

/// Marker families recognized in input. Whatever the original family,
/// scanned output is always framed as plain `CERTIFICATE` — the TRUSTED
/// and X509 framings are discarded, not preserved.
const MARKER_FAMILIES: [&str; 3] = ["CERTIFICATE", "X509 CERTIFICATE", "TRUSTED CERTIFICATE"];

/// Scans arbitrary text for certificate PEM blocks.
pub struct PemScanner {
    pattern: Regex,
}

impl PemScanner {
    pub fn new() -> Result<Self, BundleError> {
        // The regex crate has no backreferences, so each marker family is
        // spelled out as its own BEGIN..END alternative. `.*?` keeps every
        // match bounded by the nearest end marker of the same family.
        let alternatives: Vec<String> = MARKER_FAMILIES
            .iter()
            .map(|family| {
                format!(
                    "-----BEGIN {family}-----(?s:.*?)-----END {family}-----",
                    family = regex::escape(family)
                )
            })
            .collect();
        let pattern = Regex::new(&alternatives.join("|"))?;
        Ok(Self { pattern })
    }

    /// Lazily yield every normalized certificate block in `text`.
    /// The returned iterator is finite and can be recreated by calling
    /// `scan` again on the same input.
    pub fn scan<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        self.pattern
            .find_iter(text)
            .map(|m| normalize_block(m.as_str()))
    }
}

/// Re-wrap one matched block in the canonical frame: leading horizontal
/// whitespace and trailing whitespace stripped from every line, `\n` line
/// endings, plain `CERTIFICATE` markers.
fn normalize_block(block: &str) -> String {
    // Marker lines start with five dashes; Base64 body lines never do.
    let body = block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("-----"));

    let mut out = String::with_capacity(block.len());
    out.push_str("-----BEGIN CERTIFICATE-----\n");
    for line in body {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("-----END CERTIFICATE-----");
    out
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(text: &str) -> Vec<String> {
        PemScanner::new().unwrap().scan(text).collect()
    }

    #[test]
    fn test_two_certificates_separated_by_prose() {
        let blob = "\
Bundle of roots, updated weekly.

-----BEGIN CERTIFICATE-----
QWxwaGE=
-----END CERTIFICATE-----

Some commentary between entries. Nothing to see here.

-----BEGIN CERTIFICATE-----
QmV0YQ==
-----END CERTIFICATE-----
Trailing notes.
";
        let blocks = scan_all(blob);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("QWxwaGE="));
        assert!(blocks[1].contains("QmV0YQ=="));
    }

    #[test]
    fn test_no_markers_yields_zero_blocks() {
        let blocks = scan_all("just some prose, no certificates at all");
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_empty_input_yields_zero_blocks() {
        assert!(scan_all("").is_empty());
    }

    #[test]
    fn test_trusted_family_is_reframed_as_plain_certificate() {
        let blob = "\
-----BEGIN TRUSTED CERTIFICATE-----
VHJ1c3RlZA==
-----END TRUSTED CERTIFICATE-----
";
        let blocks = scan_all(blob);
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks[0],
            "-----BEGIN CERTIFICATE-----\nVHJ1c3RlZA==\n-----END CERTIFICATE-----"
        );
    }

    #[test]
    fn test_x509_family_is_reframed_as_plain_certificate() {
        let blob = "\
-----BEGIN X509 CERTIFICATE-----
WDUwOQ==
-----END X509 CERTIFICATE-----
";
        let blocks = scan_all(blob);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].starts_with("-----BEGIN CERTIFICATE-----"));
        assert!(blocks[0].ends_with("-----END CERTIFICATE-----"));
        assert!(!blocks[0].contains("X509"));
    }

    #[test]
    fn test_indented_block_is_normalized() {
        let blob = "\
    -----BEGIN CERTIFICATE-----
    SW5kZW50ZWQ=
    -----END CERTIFICATE-----
";
        let blocks = scan_all(blob);
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks[0],
            "-----BEGIN CERTIFICATE-----\nSW5kZW50ZWQ=\n-----END CERTIFICATE-----"
        );
    }

    #[test]
    fn test_crlf_line_endings_are_normalized() {
        let blob = "-----BEGIN CERTIFICATE-----\r\nQ1JMRg==\r\n-----END CERTIFICATE-----\r\n";
        let blocks = scan_all(blob);
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks[0],
            "-----BEGIN CERTIFICATE-----\nQ1JMRg==\n-----END CERTIFICATE-----"
        );
        assert!(!blocks[0].contains('\r'));
    }

    #[test]
    fn test_multi_line_body_is_preserved_in_order() {
        let blob = "\
-----BEGIN CERTIFICATE-----
TGluZU9uZQ==
TGluZVR3bw==
TGluZVRocmVl
-----END CERTIFICATE-----
";
        let blocks = scan_all(blob);
        assert_eq!(
            blocks[0],
            "-----BEGIN CERTIFICATE-----\nTGluZU9uZQ==\nTGluZVR3bw==\nTGluZVRocmVl\n-----END CERTIFICATE-----"
        );
    }

    #[test]
    fn test_dangling_begin_marker_is_ignored() {
        let blob = "\
-----BEGIN CERTIFICATE-----
T3JwaGFu
";
        assert!(scan_all(blob).is_empty());
    }

    #[test]
    fn test_scan_is_restartable() {
        let blob = "\
-----BEGIN CERTIFICATE-----
QWxwaGE=
-----END CERTIFICATE-----
";
        let scanner = PemScanner::new().unwrap();
        let first: Vec<String> = scanner.scan(blob).collect();
        let second: Vec<String> = scanner.scan(blob).collect();
        assert_eq!(first, second);
    }
}
