//! Apply a resolved profile to a rustls [`CryptoProvider`].
//!
//! rustls implements only TLS 1.2 and 1.3 and a subset of the cipher
//! suites a profile may name. Suites it does not implement are ignored;
//! a minimum version below 1.2 therefore behaves like 1.2.

use rustls::crypto::CryptoProvider;
use rustls::{
    CipherSuite, ConfigBuilder, ServerConfig, SupportedCipherSuite, SupportedProtocolVersion,
    WantsVerifier,
};
use std::sync::Arc;

use crate::TlsProfileError;
use crate::openssl::openssl_to_iana_cipher_suites;
use crate::profile::{TlsProfileSpec, TlsProtocolVersion};

static TLS13_ONLY: &[&SupportedProtocolVersion] = &[&rustls::version::TLS13];

/// The process-global default [`CryptoProvider`] if there is one,
/// otherwise the aws-lc-rs one.
pub fn base_crypto_provider() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
}

/// The rustls cipher suite for an IANA cipher suite name, for those
/// suites rustls implements.
pub fn iana_to_rustls(name: &str) -> Option<CipherSuite> {
    Some(match name {
        "TLS_AES_128_GCM_SHA256" => CipherSuite::TLS13_AES_128_GCM_SHA256,
        "TLS_AES_256_GCM_SHA384" => CipherSuite::TLS13_AES_256_GCM_SHA384,
        "TLS_CHACHA20_POLY1305_SHA256" => CipherSuite::TLS13_CHACHA20_POLY1305_SHA256,
        "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256" => {
            CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256
        }
        "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256" => {
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256
        }
        "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384" => {
            CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384
        }
        "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384" => {
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384
        }
        "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256" => {
            CipherSuite::TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256
        }
        "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256" => {
            CipherSuite::TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256
        }
        _ => return None,
    })
}

/// Protocol versions at or above `min` that rustls implements, most
/// preferred first.
pub fn protocol_versions(min: TlsProtocolVersion) -> &'static [&'static SupportedProtocolVersion] {
    match min {
        TlsProtocolVersion::Tls13 => TLS13_ONLY,
        _ => rustls::ALL_VERSIONS,
    }
}

fn allowed_in(versions: &[&SupportedProtocolVersion], suite: &SupportedCipherSuite) -> bool {
    versions.iter().any(|v| v.version == suite.version().version)
}

/// A copy of `base` offering only the cipher suites `spec` allows and
/// that can be negotiated at or above its minimum version. The order of
/// preference of `base` is kept.
pub fn restrict_crypto_provider(
    base: &CryptoProvider,
    spec: &TlsProfileSpec,
) -> Result<CryptoProvider, TlsProfileError> {
    let allowed = openssl_to_iana_cipher_suites(&spec.ciphers)
        .into_iter()
        .filter_map(iana_to_rustls)
        .collect::<Vec<_>>();
    let versions = protocol_versions(spec.min_tls_version);
    let cipher_suites = base
        .cipher_suites
        .iter()
        .filter(|s| allowed.contains(&s.suite()) && allowed_in(versions, s))
        .copied()
        .collect::<Vec<_>>();
    if cipher_suites.is_empty() {
        return Err(TlsProfileError::NoUsableCipherSuites(spec.min_tls_version));
    }
    Ok(CryptoProvider {
        cipher_suites,
        ..base.clone()
    })
}

/// Protocol versions for which `provider` has at least one cipher suite,
/// at or above `min`.
pub fn usable_protocol_versions(
    provider: &CryptoProvider,
    min: TlsProtocolVersion,
) -> Vec<&'static SupportedProtocolVersion> {
    protocol_versions(min)
        .iter()
        .copied()
        .filter(|v| {
            provider
                .cipher_suites
                .iter()
                .any(|s| s.version().version == v.version)
        })
        .collect()
}

/// Start building a [`ServerConfig`] restricted to `spec`. The caller
/// continues with client verification and the server certificate.
pub fn server_config_builder(
    base: Arc<CryptoProvider>,
    spec: &TlsProfileSpec,
) -> Result<ConfigBuilder<ServerConfig, WantsVerifier>, TlsProfileError> {
    let provider = restrict_crypto_provider(&base, spec)?;
    let versions = usable_protocol_versions(&provider, spec.min_tls_version);
    Ok(ServerConfig::builder_with_provider(Arc::new(provider)).with_protocol_versions(&versions)?)
}
