use comprehensive_tls_profile::flags::{find_web_tls_args, web_tls_args};
use comprehensive_tls_profile::openssl::openssl_to_iana_cipher_suites;
use comprehensive_tls_profile::profile::{default_profile, named_profile, resolve};
use comprehensive_tls_profile::{
    ApiServer, CustomTlsProfile, TlsProfileType, TlsProtocolVersion, TlsSecurityProfile,
    resolve_ciphers, resolve_min_tls_version,
};

struct Case {
    name: &'static str,
    profile: Option<TlsSecurityProfile>,
    ciphers: Vec<String>,
    min_tls_version: TlsProtocolVersion,
}

fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| String::from(*s)).collect()
}

fn cases() -> Vec<Case> {
    let default_ciphers = default_profile().ciphers.clone();
    vec![
        Case {
            name: "no profile",
            profile: None,
            ciphers: default_ciphers.clone(),
            min_tls_version: TlsProtocolVersion::Tls12,
        },
        Case {
            name: "old profile",
            profile: Some(TlsSecurityProfile::named(TlsProfileType::Old)),
            ciphers: named_profile(&TlsProfileType::Old).unwrap().ciphers.clone(),
            min_tls_version: TlsProtocolVersion::Tls10,
        },
        Case {
            name: "bogus profile",
            profile: Some(TlsSecurityProfile::named("bogus-value")),
            ciphers: default_ciphers.clone(),
            min_tls_version: TlsProtocolVersion::Tls12,
        },
        Case {
            name: "custom ciphers only",
            profile: Some(TlsSecurityProfile::custom(CustomTlsProfile {
                ciphers: strings(&["cipher-1", "cipher-2"]),
                min_tls_version: None,
            })),
            ciphers: strings(&["cipher-1", "cipher-2"]),
            min_tls_version: TlsProtocolVersion::Tls12,
        },
        Case {
            name: "custom ciphers and version",
            profile: Some(TlsSecurityProfile::custom(CustomTlsProfile {
                ciphers: strings(&["A", "B"]),
                min_tls_version: Some(TlsProtocolVersion::Tls11),
            })),
            ciphers: strings(&["A", "B"]),
            min_tls_version: TlsProtocolVersion::Tls11,
        },
        Case {
            name: "custom without stanza",
            profile: Some(TlsSecurityProfile::named(TlsProfileType::Custom)),
            ciphers: default_ciphers,
            min_tls_version: TlsProtocolVersion::Tls12,
        },
    ]
}

#[test]
fn scenarios() {
    for c in cases() {
        assert_eq!(resolve_ciphers(c.profile.as_ref()), c.ciphers, "{}", c.name);
        assert_eq!(
            resolve_min_tls_version(c.profile.as_ref()),
            c.min_tls_version,
            "{}",
            c.name
        );
    }
}

#[test]
fn container_args_follow_policy() {
    for c in cases() {
        let config = ApiServer::with_profile(c.profile);
        let args = web_tls_args(&config.resolve());
        let want_ciphers = openssl_to_iana_cipher_suites(&c.ciphers).join(",");
        let want_version = c.min_tls_version.to_string();
        assert_eq!(
            find_web_tls_args(&args),
            (Some(want_ciphers.as_str()), Some(want_version.as_str())),
            "{}",
            c.name
        );
    }
}

#[test]
fn resolved_values_are_owned() {
    let p = TlsSecurityProfile::custom(CustomTlsProfile {
        ciphers: strings(&["A"]),
        min_tls_version: None,
    });
    let mut spec = resolve(Some(&p));
    spec.ciphers.push(String::from("B"));
    assert_eq!(resolve_ciphers(Some(&p)), ["A"]);
    let mut spec = resolve(None);
    spec.ciphers.clear();
    assert!(!default_profile().ciphers.is_empty());
}
