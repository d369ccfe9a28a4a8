//! TLS security profile resolution for Comprehensive
//!
//! Cluster policy may carry a TLS security profile that is unset, names
//! a preset (`Old`, `Intermediate`, `Modern`), or spells out a custom
//! cipher list and minimum protocol version. A server that terminates
//! TLS needs exactly one cipher list and one minimum version, always
//! valid. The [`profile`] module performs that resolution; it never fails
//! and falls back to the `Intermediate` preset for anything it cannot
//! resolve, so that a reconcile loop keeps going under policy schema skew.
//!
//! The remaining modules carry the result to where it is used:
//!
//! * [`config`] models the cluster `APIServer` policy document.
//! * [`openssl`] translates the policy's OpenSSL cipher names to IANA names.
//! * [`flags`] renders `--web.tls-*` command line flags for a consuming
//!   service.
//! * [`crypto_provider`] restricts a [`rustls`] `CryptoProvider` to a
//!   resolved profile.
//! * [`files`] is a [`comprehensive`] `Resource` which loads the policy
//!   document from disk and keeps the resolved profile current.
//!
//! # Feature Flags
//!
//! - `files` (default): the policy file `Resource`.
//! - `metrics` (default): Prometheus metrics for the policy file `Resource`;
//!   implies `files`.
//! - `rustls` (default): the rustls adapter.
//!
//! [`comprehensive`]: https://docs.rs/comprehensive/latest/comprehensive/
//! [`rustls`]: https://docs.rs/rustls/latest/rustls/

#![warn(missing_docs)]

use thiserror::Error;

pub mod config;
#[cfg(feature = "rustls")]
pub mod crypto_provider;
#[cfg(feature = "files")]
pub mod files;
pub mod flags;
pub mod openssl;
pub mod profile;

pub use config::ApiServer;
#[cfg(feature = "files")]
pub use files::TlsSecurityProfileFile;
pub use profile::{
    CustomTlsProfile, TlsProfileSpec, TlsProfileType, TlsProtocolVersion, TlsSecurityProfile,
    resolve_ciphers, resolve_min_tls_version,
};

/// Error type returned by comprehensive_tls_profile functions
///
/// Profile resolution itself cannot fail. These errors come from loading
/// policy documents, parsing version names, and building TLS
/// configurations from a resolved profile.
#[derive(Debug, Error)]
pub enum TlsProfileError {
    /// Wrapper for std::io::Error
    #[error("{0}")]
    IOError(#[from] std::io::Error),
    /// Wrapper for serde_json::Error
    #[error("{0}")]
    JsonError(#[from] serde_json::Error),
    /// A string that does not name a TLS protocol version.
    #[error("unknown TLS protocol version {0:?}")]
    UnknownTlsVersion(String),
    /// None of the profile's cipher suites are implemented for the
    /// protocol versions it allows.
    #[error("no usable cipher suites for TLS profile with minimum version {0}")]
    NoUsableCipherSuites(TlsProtocolVersion),
    /// Wrapper for rustls::Error
    #[cfg(feature = "rustls")]
    #[error("{0}")]
    TLSError(#[from] rustls::Error),
}
