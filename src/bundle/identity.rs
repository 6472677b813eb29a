// trustsync — Identity Deriver
//
// Computes the canonical distinguished-name string and filesystem-safe slug
// for a decoded subject. The DN is the store's primary key, so the field
// priority order (CN, OU, O, L, C) must never change across releases.

use super::SubjectAttributes;

/// The dedup/primary-key identity of one certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub distinguished_name: String,
    pub slug: String,
}

/// Derive `(distinguished_name, slug)` from subject attributes.
///
/// Returns `None` when the subject carries none of the five recognized
/// fields — callers must treat that as an input error rather than persist
/// an empty key.
pub fn derive_identity(subject: &SubjectAttributes) -> Option<Identity> {
    let fields: [(&str, Option<&String>); 5] = [
        ("CN", subject.common_name.as_ref()),
        ("OU", subject.organizational_unit.as_ref()),
        ("O", subject.organization.as_ref()),
        ("L", subject.locality.as_ref()),
        ("C", subject.country.as_ref()),
    ];

    let mut dn_parts = Vec::new();
    let mut slug_parts = Vec::new();
    for (code, value) in fields {
        if let Some(value) = value {
            if !value.is_empty() {
                dn_parts.push(format!("{code}={value}"));
                slug_parts.push(sanitize(value));
            }
        }
    }

    if dn_parts.is_empty() {
        return None;
    }

    let slug = tidy_hyphens(&slug_parts.join("-"));
    if slug.is_empty() {
        return None;
    }

    Some(Identity {
        distinguished_name: dn_parts.join(", "),
        slug,
    })
}

/// Collapse every run of non-alphanumeric characters to a single hyphen.
fn sanitize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_run = false;
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }
    out
}

/// Collapse repeated hyphens and strip leading/trailing ones.
fn tidy_hyphens(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_run = false;
    for c in raw.chars() {
        if c == '-' {
            if !in_run && !out.is_empty() {
                out.push('-');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

// ─── Tests ───────────────────────────────────────────────────────────────────
