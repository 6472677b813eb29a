// trustsync — Certificate Decoder
//
// Seam between the sync engine and X.509 parsing. The reconciler only needs
// subject attributes and a validity window, so that capability sits behind a
// trait and the x509-parser implementation stays swappable (and mockable in
// reconciler tests).

use chrono::{DateTime, TimeZone, Utc};
use x509_parser::pem::parse_x509_pem;
use x509_parser::x509::X509Name;

use super::BundleError;

/// Subject attributes the identity deriver consumes, in their fixed
/// priority order: CN, OU, O, L, C.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectAttributes {
    pub common_name: Option<String>,
    pub organizational_unit: Option<String>,
    pub organization: Option<String>,
    pub locality: Option<String>,
    pub country: Option<String>,
}

/// One decoded certificate: subject plus validity window.
/// `valid_from <= valid_to` is guaranteed by the decoder.
#[derive(Debug, Clone)]
pub struct DecodedCertificate {
    pub subject: SubjectAttributes,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
}

/// Turns one normalized PEM block into subject attributes and a validity
/// window. Fails with a decode error on structurally malformed input.
pub trait CertificateDecoder {
    fn decode(&self, pem_block: &str) -> Result<DecodedCertificate, BundleError>;
}

/// Production decoder backed by x509-parser.
pub struct X509Decoder;

impl CertificateDecoder for X509Decoder {
    fn decode(&self, pem_block: &str) -> Result<DecodedCertificate, BundleError> {
        let (_, pem) = parse_x509_pem(pem_block.as_bytes())
            .map_err(|e| BundleError::Decode(format!("invalid PEM framing: {e}")))?;
        let cert = pem
            .parse_x509()
            .map_err(|e| BundleError::Decode(format!("invalid DER body: {e}")))?;

        let subject = extract_subject(cert.subject());

        let validity = cert.validity();
        let valid_from = asn1_time_to_utc(validity.not_before.timestamp())?;
        let valid_to = asn1_time_to_utc(validity.not_after.timestamp())?;

        Ok(DecodedCertificate {
            subject,
            valid_from,
            valid_to,
        })
    }
}

fn extract_subject(name: &X509Name<'_>) -> SubjectAttributes {
    SubjectAttributes {
        common_name: first_attribute(name.iter_common_name()),
        organizational_unit: first_attribute(name.iter_organizational_unit()),
        organization: first_attribute(name.iter_organization()),
        locality: first_attribute(name.iter_locality()),
        country: first_attribute(name.iter_country()),
    }
}

fn first_attribute<'a, 'b: 'a>(
    mut iter: impl Iterator<Item = &'a x509_parser::x509::AttributeTypeAndValue<'b>>,
) -> Option<String> {
    iter.next()
        .and_then(|attr| attr.as_str().ok())
        .map(|value| value.to_string())
}

fn asn1_time_to_utc(timestamp: i64) -> Result<DateTime<Utc>, BundleError> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .ok_or_else(|| BundleError::Decode(format!("validity timestamp {timestamp} out of range")))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
