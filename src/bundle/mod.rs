// trustsync — Bundle Module
//
// Everything between raw bundle text and a storable identity: the PEM
// scanner, the X.509 decoder seam, and the DN/slug deriver.

mod decoder;
mod error;
mod identity;
mod scanner;

pub use decoder::{CertificateDecoder, DecodedCertificate, SubjectAttributes, X509Decoder};
pub use error::BundleError;
pub use identity::{derive_identity, Identity};
pub use scanner::PemScanner;
