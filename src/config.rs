//! The cluster-scoped `APIServer` policy object.
//!
//! Only the parts needed to find the TLS security profile are modelled;
//! everything else in the document is ignored. The object is normally
//! rendered as JSON by whatever fetches it:
//!
//! ```
//! use comprehensive_tls_profile::{ApiServer, TlsProtocolVersion};
//!
//! let config = ApiServer::from_json(br#"{
//!     "apiVersion": "config.openshift.io/v1",
//!     "kind": "APIServer",
//!     "metadata": {"name": "cluster"},
//!     "spec": {"tlsSecurityProfile": {"type": "Modern", "modern": {}}}
//! }"#).unwrap();
//! assert_eq!(config.min_tls_version(), TlsProtocolVersion::Tls13);
//! ```

use serde::{Deserialize, Serialize};

use crate::TlsProfileError;
use crate::profile::{self, TlsProfileSpec, TlsProtocolVersion, TlsSecurityProfile};

/// Name of the one `APIServer` object that carries cluster policy.
pub const CLUSTER_API_SERVER_NAME: &str = "cluster";

/// Object metadata. Only the name is kept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ObjectMeta {
    /// Object name.
    #[serde(default)]
    pub name: String,
}

/// `spec` of the `APIServer` object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiServerSpec {
    /// The TLS security profile, if one is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_security_profile: Option<TlsSecurityProfile>,
}

/// The `APIServer` policy object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiServer {
    /// Object metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Object spec.
    #[serde(default)]
    pub spec: ApiServerSpec,
}

impl ApiServer {
    /// Wrap a profile in an otherwise empty `cluster` object.
    pub fn with_profile(profile: Option<TlsSecurityProfile>) -> Self {
        Self {
            metadata: ObjectMeta {
                name: String::from(CLUSTER_API_SERVER_NAME),
            },
            spec: ApiServerSpec {
                tls_security_profile: profile,
            },
        }
    }

    /// Parse the JSON rendering of the object.
    pub fn from_json(json: &[u8]) -> Result<Self, TlsProfileError> {
        Ok(serde_json::from_slice(json)?)
    }

    /// The configured profile, if any.
    pub fn tls_security_profile(&self) -> Option<&TlsSecurityProfile> {
        self.spec.tls_security_profile.as_ref()
    }

    /// Resolved cipher list. See [`profile::resolve_ciphers`].
    pub fn tls_ciphers(&self) -> &[String] {
        profile::resolve_ciphers(self.tls_security_profile())
    }

    /// Resolved minimum TLS version. See [`profile::resolve_min_tls_version`].
    pub fn min_tls_version(&self) -> TlsProtocolVersion {
        profile::resolve_min_tls_version(self.tls_security_profile())
    }

    /// Both resolved values.
    pub fn resolve(&self) -> TlsProfileSpec {
        profile::resolve(self.tls_security_profile())
    }
}

/// The profile configured in `config`, treating a missing object like a
/// missing profile.
pub fn tls_security_profile(config: Option<&ApiServer>) -> Option<&TlsSecurityProfile> {
    config.and_then(ApiServer::tls_security_profile)
}

/// Resolved cipher list for a possibly missing policy object.
pub fn tls_ciphers(config: Option<&ApiServer>) -> &[String] {
    profile::resolve_ciphers(tls_security_profile(config))
}

/// Resolved minimum TLS version for a possibly missing policy object.
pub fn min_tls_version(config: Option<&ApiServer>) -> TlsProtocolVersion {
    profile::resolve_min_tls_version(tls_security_profile(config))
}
