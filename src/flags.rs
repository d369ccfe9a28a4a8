//! Command line flags carrying a resolved profile to a consuming service.
//!
//! The service (for example prometheus-operator's web listener) takes
//! the allowed cipher suites as a comma separated list of IANA names and
//! the minimum version by its schema name:
//!
//! ```text
//! --web.tls-cipher-suites=TLS_AES_128_GCM_SHA256,TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256
//! --web.tls-min-version=VersionTLS12
//! ```

use crate::openssl::openssl_to_iana_cipher_suites;
use crate::profile::{TlsProfileSpec, TlsProtocolVersion};

/// Prefix of the flag listing allowed cipher suites.
pub const WEB_TLS_CIPHER_SUITES_FLAG: &str = "--web.tls-cipher-suites=";
/// Prefix of the flag naming the minimum TLS version.
pub const WEB_TLS_MIN_VERSION_FLAG: &str = "--web.tls-min-version=";

/// Cipher suites flag for a list of OpenSSL cipher names.
pub fn cipher_suites_arg<S: AsRef<str>>(ciphers: &[S]) -> String {
    format!(
        "{}{}",
        WEB_TLS_CIPHER_SUITES_FLAG,
        openssl_to_iana_cipher_suites(ciphers).join(",")
    )
}

/// Minimum version flag.
pub fn min_version_arg(version: TlsProtocolVersion) -> String {
    format!("{}{}", WEB_TLS_MIN_VERSION_FLAG, version)
}

/// Both flags for `spec`, ciphers first.
pub fn web_tls_args(spec: &TlsProfileSpec) -> Vec<String> {
    vec![
        cipher_suites_arg(&spec.ciphers),
        min_version_arg(spec.min_tls_version),
    ]
}

/// Values of the cipher suites and minimum version flags currently
/// present in `args`. The last occurrence of each wins.
pub fn find_web_tls_args<'a, I, S>(args: I) -> (Option<&'a str>, Option<&'a str>)
where
    I: IntoIterator<Item = &'a S>,
    S: AsRef<str> + ?Sized + 'a,
{
    args.into_iter()
        .fold((None, None), |(ciphers, version), arg| {
            let arg = arg.as_ref();
            if let Some(v) = arg.strip_prefix(WEB_TLS_CIPHER_SUITES_FLAG) {
                (Some(v), version)
            } else if let Some(v) = arg.strip_prefix(WEB_TLS_MIN_VERSION_FLAG) {
                (ciphers, Some(v))
            } else {
                (ciphers, version)
            }
        })
}
