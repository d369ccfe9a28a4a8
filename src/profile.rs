//! TLS security profiles and their resolution into concrete parameters.
//!
//! A [`TlsSecurityProfile`] is the (possibly absent) declaration found in
//! cluster policy. It either names one of the built-in presets (`Old`,
//! `Intermediate`, `Modern`) or carries a [`CustomTlsProfile`] whose
//! cipher list and minimum version may each be left unset.
//!
//! [`resolve_ciphers`] and [`resolve_min_tls_version`] turn such a
//! declaration into values that can always be applied. Resolution never
//! fails: anything that cannot be resolved (no profile, an empty or
//! unrecognised type, a custom profile lacking a field) takes the
//! corresponding value from [`default_profile`], which is the
//! `Intermediate` preset.
//!
//! ```
//! use comprehensive_tls_profile::profile::{
//!     CustomTlsProfile, TlsProtocolVersion, TlsSecurityProfile, resolve_ciphers,
//!     resolve_min_tls_version,
//! };
//!
//! let profile = TlsSecurityProfile::custom(CustomTlsProfile {
//!     ciphers: vec!["ECDHE-RSA-AES128-GCM-SHA256".into()],
//!     min_tls_version: None,
//! });
//! assert_eq!(resolve_ciphers(Some(&profile)), ["ECDHE-RSA-AES128-GCM-SHA256"]);
//! assert_eq!(resolve_min_tls_version(Some(&profile)), TlsProtocolVersion::Tls12);
//! ```

use lazy_static::lazy_static;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::TlsProfileError;

/// Minimum TLS protocol version, named as in the policy schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum TlsProtocolVersion {
    /// TLS 1.0
    #[serde(rename = "VersionTLS10")]
    Tls10,
    /// TLS 1.1
    #[serde(rename = "VersionTLS11")]
    Tls11,
    /// TLS 1.2
    #[serde(rename = "VersionTLS12")]
    Tls12,
    /// TLS 1.3
    #[serde(rename = "VersionTLS13")]
    Tls13,
}

impl TlsProtocolVersion {
    /// The schema name of this version, e.g. `VersionTLS12`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tls10 => "VersionTLS10",
            Self::Tls11 => "VersionTLS11",
            Self::Tls12 => "VersionTLS12",
            Self::Tls13 => "VersionTLS13",
        }
    }
}

impl fmt::Display for TlsProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TlsProtocolVersion {
    type Err = TlsProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VersionTLS10" => Ok(Self::Tls10),
            "VersionTLS11" => Ok(Self::Tls11),
            "VersionTLS12" => Ok(Self::Tls12),
            "VersionTLS13" => Ok(Self::Tls13),
            _ => Err(TlsProfileError::UnknownTlsVersion(s.to_owned())),
        }
    }
}

/// Identifier of a TLS security profile.
///
/// Values this build does not know about are kept as
/// [`TlsProfileType::Unrecognized`] rather than rejected, so that policy
/// written against a newer schema still deserializes. They resolve to
/// the default profile.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum TlsProfileType {
    /// Compatible with a wide range of old clients.
    Old,
    /// The recommended general purpose configuration.
    Intermediate,
    /// TLS 1.3 only.
    Modern,
    /// Ciphers and minimum version supplied in a [`CustomTlsProfile`].
    Custom,
    /// A profile type not known to this build.
    Unrecognized(String),
}

impl TlsProfileType {
    /// The schema name of this profile type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Old => "Old",
            Self::Intermediate => "Intermediate",
            Self::Modern => "Modern",
            Self::Custom => "Custom",
            Self::Unrecognized(s) => s,
        }
    }

    /// Whether this is one of the profile types defined by the schema.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl From<&str> for TlsProfileType {
    fn from(s: &str) -> Self {
        match s {
            "Old" => Self::Old,
            "Intermediate" => Self::Intermediate,
            "Modern" => Self::Modern,
            "Custom" => Self::Custom,
            _ => Self::Unrecognized(s.to_owned()),
        }
    }
}

impl From<String> for TlsProfileType {
    fn from(s: String) -> Self {
        match Self::from(s.as_str()) {
            Self::Unrecognized(_) => Self::Unrecognized(s),
            known => known,
        }
    }
}

impl From<TlsProfileType> for String {
    fn from(t: TlsProfileType) -> Self {
        match t {
            TlsProfileType::Unrecognized(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for TlsProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete TLS configuration: every field is set.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TlsProfileSpec {
    /// Allowed cipher suites in order of preference, OpenSSL naming.
    pub ciphers: Vec<String>,
    /// Minimum protocol version.
    #[serde(rename = "minTLSVersion")]
    pub min_tls_version: TlsProtocolVersion,
}

impl TlsProfileSpec {
    /// Build a spec from any list of cipher names.
    pub fn new<I, S>(ciphers: I, min_tls_version: TlsProtocolVersion) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ciphers: ciphers.into_iter().map(Into::into).collect(),
            min_tls_version,
        }
    }
}

/// User-supplied profile parameters. Either field may be left unset, in
/// which case the default profile supplies it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CustomTlsProfile {
    /// Allowed cipher suites. Empty or null means unset.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_empty"
    )]
    pub ciphers: Vec<String>,
    /// Minimum protocol version.
    #[serde(
        rename = "minTLSVersion",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_tls_version"
    )]
    pub min_tls_version: Option<TlsProtocolVersion>,
}

/// The `tlsSecurityProfile` stanza of cluster policy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TlsSecurityProfile {
    /// Which profile is selected. An empty string is the same as unset.
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "non_empty_profile_type"
    )]
    pub profile_type: Option<TlsProfileType>,
    /// Parameters used when `profile_type` is [`TlsProfileType::Custom`].
    /// Ignored otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomTlsProfile>,
}

impl TlsSecurityProfile {
    /// A profile selecting a preset (or any other type) by identifier.
    pub fn named(profile_type: impl Into<TlsProfileType>) -> Self {
        Self {
            profile_type: Some(profile_type.into()),
            custom: None,
        }
    }

    /// A [`TlsProfileType::Custom`] profile.
    pub fn custom(custom: CustomTlsProfile) -> Self {
        Self {
            profile_type: Some(TlsProfileType::Custom),
            custom: Some(custom),
        }
    }
}

fn non_empty_profile_type<'de, D>(d: D) -> Result<Option<TlsProfileType>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?
        .filter(|s| !s.is_empty())
        .map(TlsProfileType::from))
}

fn null_as_empty<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(d)?.unwrap_or_default())
}

fn lenient_tls_version<'de, D>(d: D) -> Result<Option<TlsProtocolVersion>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?
        .filter(|s| !s.is_empty())
        .and_then(|s| match s.parse() {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("Ignoring custom TLS profile minimum version: {}", e);
                None
            }
        }))
}

const MODERN_CIPHERS: &[&str] = &[
    "TLS_AES_128_GCM_SHA256",
    "TLS_AES_256_GCM_SHA384",
    "TLS_CHACHA20_POLY1305_SHA256",
];

const INTERMEDIATE_CIPHERS: &[&str] = &[
    "TLS_AES_128_GCM_SHA256",
    "TLS_AES_256_GCM_SHA384",
    "TLS_CHACHA20_POLY1305_SHA256",
    "ECDHE-ECDSA-AES128-GCM-SHA256",
    "ECDHE-RSA-AES128-GCM-SHA256",
    "ECDHE-ECDSA-AES256-GCM-SHA384",
    "ECDHE-RSA-AES256-GCM-SHA384",
    "ECDHE-ECDSA-CHACHA20-POLY1305",
    "ECDHE-RSA-CHACHA20-POLY1305",
    "DHE-RSA-AES128-GCM-SHA256",
    "DHE-RSA-AES256-GCM-SHA384",
];

const OLD_CIPHERS: &[&str] = &[
    "TLS_AES_128_GCM_SHA256",
    "TLS_AES_256_GCM_SHA384",
    "TLS_CHACHA20_POLY1305_SHA256",
    "ECDHE-ECDSA-AES128-GCM-SHA256",
    "ECDHE-RSA-AES128-GCM-SHA256",
    "ECDHE-ECDSA-AES256-GCM-SHA384",
    "ECDHE-RSA-AES256-GCM-SHA384",
    "ECDHE-ECDSA-CHACHA20-POLY1305",
    "ECDHE-RSA-CHACHA20-POLY1305",
    "DHE-RSA-AES128-GCM-SHA256",
    "DHE-RSA-AES256-GCM-SHA384",
    "DHE-RSA-CHACHA20-POLY1305",
    "ECDHE-ECDSA-AES128-SHA256",
    "ECDHE-RSA-AES128-SHA256",
    "ECDHE-ECDSA-AES128-SHA",
    "ECDHE-RSA-AES128-SHA",
    "ECDHE-ECDSA-AES256-SHA384",
    "ECDHE-RSA-AES256-SHA384",
    "ECDHE-ECDSA-AES256-SHA",
    "ECDHE-RSA-AES256-SHA",
    "DHE-RSA-AES128-SHA256",
    "DHE-RSA-AES256-SHA256",
    "AES128-GCM-SHA256",
    "AES256-GCM-SHA384",
    "AES128-SHA256",
    "AES256-SHA256",
    "AES128-SHA",
    "AES256-SHA",
    "DES-CBC3-SHA",
];

lazy_static! {
    static ref TLS_PROFILES: HashMap<TlsProfileType, TlsProfileSpec> = [
        (
            TlsProfileType::Old,
            TlsProfileSpec::new(OLD_CIPHERS.iter().copied(), TlsProtocolVersion::Tls10),
        ),
        (
            TlsProfileType::Intermediate,
            TlsProfileSpec::new(
                INTERMEDIATE_CIPHERS.iter().copied(),
                TlsProtocolVersion::Tls12
            ),
        ),
        (
            TlsProfileType::Modern,
            TlsProfileSpec::new(MODERN_CIPHERS.iter().copied(), TlsProtocolVersion::Tls13),
        ),
    ]
    .into_iter()
    .collect();
}

/// The preset for `profile_type`, if it is one. Never returns anything
/// for [`TlsProfileType::Custom`].
pub fn named_profile(profile_type: &TlsProfileType) -> Option<&'static TlsProfileSpec> {
    TLS_PROFILES.get(profile_type)
}

/// The profile used whenever nothing more specific can be resolved: the
/// `Intermediate` preset.
pub fn default_profile() -> &'static TlsProfileSpec {
    &TLS_PROFILES[&TlsProfileType::Intermediate]
}

enum Selection<'a> {
    Default,
    Preset(&'static TlsProfileSpec),
    Custom(&'a CustomTlsProfile),
}

fn select(profile: Option<&TlsSecurityProfile>) -> Selection<'_> {
    let Some(profile) = profile else {
        return Selection::Default;
    };
    match profile.profile_type {
        None => Selection::Default,
        Some(TlsProfileType::Custom) => profile
            .custom
            .as_ref()
            .map_or(Selection::Default, Selection::Custom),
        Some(ref t) => named_profile(t).map_or(Selection::Default, Selection::Preset),
    }
}

/// Allowed cipher suites for `profile`.
///
/// Presets return the table entry and custom profiles return their own
/// list unmodified. An absent profile, an empty or unrecognised type, or
/// a custom profile with no ciphers all yield the default profile's list.
pub fn resolve_ciphers(profile: Option<&TlsSecurityProfile>) -> &[String] {
    match select(profile) {
        Selection::Preset(spec) => &spec.ciphers,
        Selection::Custom(custom) if !custom.ciphers.is_empty() => &custom.ciphers,
        _ => &default_profile().ciphers,
    }
}

/// Minimum TLS version for `profile`, following the same rules as
/// [`resolve_ciphers`]. The version of a custom profile is defaulted
/// independently of its cipher list.
pub fn resolve_min_tls_version(profile: Option<&TlsSecurityProfile>) -> TlsProtocolVersion {
    let default = default_profile().min_tls_version;
    match select(profile) {
        Selection::Default => default,
        Selection::Preset(spec) => spec.min_tls_version,
        Selection::Custom(custom) => custom.min_tls_version.unwrap_or(default),
    }
}

/// Both dimensions of `profile`, resolved into a freshly owned spec.
pub fn resolve(profile: Option<&TlsSecurityProfile>) -> TlsProfileSpec {
    TlsProfileSpec {
        ciphers: resolve_ciphers(profile).to_vec(),
        min_tls_version: resolve_min_tls_version(profile),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(ciphers: &[&str], min_tls_version: Option<TlsProtocolVersion>) -> TlsSecurityProfile {
        TlsSecurityProfile::custom(CustomTlsProfile {
            ciphers: ciphers.iter().map(|c| String::from(*c)).collect(),
            min_tls_version,
        })
    }

    #[test]
    fn default_is_intermediate() {
        let d = default_profile();
        assert_eq!(d.min_tls_version, TlsProtocolVersion::Tls12);
        assert_eq!(d.ciphers, INTERMEDIATE_CIPHERS);
        assert!(std::ptr::eq(
            d,
            named_profile(&TlsProfileType::Intermediate).unwrap()
        ));
    }

    #[test]
    fn no_profile() {
        assert_eq!(resolve_ciphers(None), default_profile().ciphers);
        assert_eq!(resolve_min_tls_version(None), TlsProtocolVersion::Tls12);
    }

    #[test]
    fn empty_type() {
        let p = TlsSecurityProfile::default();
        assert_eq!(resolve_ciphers(Some(&p)), default_profile().ciphers);
        assert_eq!(resolve_min_tls_version(Some(&p)), TlsProtocolVersion::Tls12);
    }

    #[test]
    fn empty_type_with_custom_is_ignored() {
        let p = TlsSecurityProfile {
            profile_type: None,
            custom: Some(CustomTlsProfile {
                ciphers: vec!["A".into()],
                min_tls_version: Some(TlsProtocolVersion::Tls13),
            }),
        };
        assert_eq!(resolve(Some(&p)), *default_profile());
    }

    #[test]
    fn presets() {
        for (t, v) in [
            (TlsProfileType::Old, TlsProtocolVersion::Tls10),
            (TlsProfileType::Intermediate, TlsProtocolVersion::Tls12),
            (TlsProfileType::Modern, TlsProtocolVersion::Tls13),
        ] {
            let p = TlsSecurityProfile::named(t.clone());
            let want = named_profile(&t).unwrap();
            assert!(std::ptr::eq(resolve_ciphers(Some(&p)), want.ciphers.as_slice()));
            assert_eq!(resolve_min_tls_version(Some(&p)), v);
        }
        assert_eq!(
            named_profile(&TlsProfileType::Old).unwrap().ciphers,
            OLD_CIPHERS
        );
        assert_eq!(
            named_profile(&TlsProfileType::Modern).unwrap().ciphers,
            MODERN_CIPHERS
        );
    }

    #[test]
    fn preset_ignores_custom_stanza() {
        let mut p = custom(&["A", "B"], Some(TlsProtocolVersion::Tls11));
        p.profile_type = Some(TlsProfileType::Modern);
        assert_eq!(resolve(Some(&p)), *named_profile(&TlsProfileType::Modern).unwrap());
    }

    #[test]
    fn unrecognized_type() {
        let p = TlsSecurityProfile::named("bogus-value");
        assert_eq!(
            p.profile_type,
            Some(TlsProfileType::Unrecognized("bogus-value".into()))
        );
        assert_eq!(resolve(Some(&p)), *default_profile());
    }

    #[test]
    fn custom_table_never_consulted() {
        assert!(named_profile(&TlsProfileType::Custom).is_none());
    }

    #[test]
    fn custom_without_stanza() {
        let p = TlsSecurityProfile::named(TlsProfileType::Custom);
        assert_eq!(resolve(Some(&p)), *default_profile());
    }

    #[test]
    fn custom_ciphers_only() {
        let p = custom(&["cipher-1", "cipher-2"], None);
        assert_eq!(resolve_ciphers(Some(&p)), ["cipher-1", "cipher-2"]);
        assert_eq!(resolve_min_tls_version(Some(&p)), TlsProtocolVersion::Tls12);
    }

    #[test]
    fn custom_version_only() {
        let p = custom(&[], Some(TlsProtocolVersion::Tls13));
        assert_eq!(resolve_ciphers(Some(&p)), default_profile().ciphers);
        assert_eq!(resolve_min_tls_version(Some(&p)), TlsProtocolVersion::Tls13);
    }

    #[test]
    fn custom_both() {
        let p = custom(&["A", "B"], Some(TlsProtocolVersion::Tls11));
        assert_eq!(
            resolve(Some(&p)),
            TlsProfileSpec::new(["A", "B"], TlsProtocolVersion::Tls11)
        );
    }

    #[test]
    fn custom_ciphers_verbatim() {
        let p = custom(&["B", "not-a-cipher", "A", "B"], None);
        let got = resolve_ciphers(Some(&p));
        assert_eq!(got, ["B", "not-a-cipher", "A", "B"]);
        assert!(std::ptr::eq(got, p.custom.as_ref().unwrap().ciphers.as_slice()));
    }

    #[test]
    fn idempotent() {
        let p = custom(&["A"], None);
        assert_eq!(resolve(Some(&p)), resolve(Some(&p)));
        assert_eq!(resolve(None), resolve(None));
    }

    #[test]
    fn version_names() {
        for v in [
            TlsProtocolVersion::Tls10,
            TlsProtocolVersion::Tls11,
            TlsProtocolVersion::Tls12,
            TlsProtocolVersion::Tls13,
        ] {
            assert_eq!(v.as_str().parse::<TlsProtocolVersion>().unwrap(), v);
        }
        assert!(matches!(
            "TLSv1.2".parse::<TlsProtocolVersion>(),
            Err(TlsProfileError::UnknownTlsVersion(_))
        ));
        assert!(TlsProtocolVersion::Tls10 < TlsProtocolVersion::Tls13);
    }

    #[test]
    fn deserialize_empty_type() {
        let p: TlsSecurityProfile = serde_json::from_str(r#"{"type": ""}"#).unwrap();
        assert_eq!(p.profile_type, None);
    }

    #[test]
    fn deserialize_custom() {
        let p: TlsSecurityProfile = serde_json::from_str(
            r#"{
                "type": "Custom",
                "custom": {
                    "ciphers": ["A", "B"],
                    "minTLSVersion": "VersionTLS11"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(p, custom(&["A", "B"], Some(TlsProtocolVersion::Tls11)));
    }

    #[test]
    fn deserialize_unknown_version_is_unset() {
        let p: TlsSecurityProfile = serde_json::from_str(
            r#"{"type": "Custom", "custom": {"minTLSVersion": "VersionTLS14"}}"#,
        )
        .unwrap();
        assert_eq!(p.custom.as_ref().unwrap().min_tls_version, None);
        assert_eq!(resolve_min_tls_version(Some(&p)), TlsProtocolVersion::Tls12);
    }

    #[test]
    fn deserialize_null_ciphers() {
        let p: TlsSecurityProfile = serde_json::from_str(
            r#"{"type": "Custom", "custom": {"ciphers": null, "minTLSVersion": "VersionTLS13"}}"#,
        )
        .unwrap();
        assert_eq!(p, custom(&[], Some(TlsProtocolVersion::Tls13)));
        assert_eq!(resolve_ciphers(Some(&p)), default_profile().ciphers.as_slice());
        assert_eq!(resolve_min_tls_version(Some(&p)), TlsProtocolVersion::Tls13);
    }

    #[test]
    fn deserialize_preset_marker_ignored() {
        let p: TlsSecurityProfile =
            serde_json::from_str(r#"{"type": "Old", "old": {}}"#).unwrap();
        assert_eq!(p, TlsSecurityProfile::named(TlsProfileType::Old));
    }

    #[test]
    fn serialize_unrecognized_type() {
        let p = TlsSecurityProfile::named("Future");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"type":"Future"}"#);
    }
}
