//! A TLS security profile provider that reads cluster policy from disk.
//!
//! The file holds the JSON rendering of the cluster `APIServer` object,
//! as written for example by `kubectl get apiserver cluster -o json` or
//! by a sidecar that watches it. The resolved profile is checked for
//! changes periodically and is always available from
//! [`TlsSecurityProfileFile::current`].
//!
//! # Command line flags
//!
//! | Flag                          | Default | Meaning                 |
//! |-------------------------------|---------|-------------------------|
//! | `--tls-security-profile-path` | None    | Name of file containing the `APIServer` policy object in JSON. If unset, the default profile is used. |
//!
//! # Metrics
//!
//! With the `metrics` feature, `tls_security_profile_min_version` and
//! `tls_security_profile_reload_failures` are exported to the default
//! Prometheus registry.
use arc_swap::ArcSwap;
use async_stream::stream;
use comprehensive::v1::{AssemblyRuntime, Resource, resource};
use futures::{Stream, StreamExt};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::TlsProfileError;
use crate::config::ApiServer;
use crate::profile::{TlsProfileSpec, default_profile};

const RELOAD_INTERVAL: std::time::Duration = std::time::Duration::new(900, 0);

#[cfg(feature = "metrics")]
mod metrics {
    use lazy_static::lazy_static;
    use prometheus::{register_int_counter, register_int_gauge};

    use crate::profile::{TlsProfileSpec, TlsProtocolVersion};

    lazy_static! {
        static ref MIN_TLS_VERSION: prometheus::IntGauge = register_int_gauge!(
            "tls_security_profile_min_version",
            "Minimum TLS version of the resolved TLS security profile (10, 11, 12, or 13)"
        )
        .unwrap();
        static ref RELOAD_FAILURES: prometheus::IntCounter = register_int_counter!(
            "tls_security_profile_reload_failures",
            "Failed attempts to reload the TLS security profile file"
        )
        .unwrap();
    }

    pub(super) fn update(spec: &TlsProfileSpec) {
        MIN_TLS_VERSION.set(match spec.min_tls_version {
            TlsProtocolVersion::Tls10 => 10,
            TlsProtocolVersion::Tls11 => 11,
            TlsProtocolVersion::Tls12 => 12,
            TlsProtocolVersion::Tls13 => 13,
        });
    }

    pub(super) fn reload_failed() {
        RELOAD_FAILURES.inc();
    }
}

/// Command line arguments for the [`TlsSecurityProfileFile`] [`Resource`].
#[derive(clap::Args, Debug, Default)]
#[group(id = "comprehensive_tls_profile_args")]
pub struct Args {
    #[arg(
        long,
        help = "Path to the cluster APIServer policy object in JSON. If unset, the default TLS security profile is used."
    )]
    tls_security_profile_path: Option<PathBuf>,
}

fn reload_sentinel(md: std::io::Result<std::fs::Metadata>) -> Option<(u64, SystemTime)> {
    md.ok().and_then(|m| Some((m.len(), m.modified().ok()?)))
}

struct Loader {
    path: PathBuf,
    sentinel: Option<(u64, SystemTime)>,
}

impl Loader {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            sentinel: None,
        }
    }

    fn load(&mut self) -> Result<TlsProfileSpec, TlsProfileError> {
        let mut file = File::open(&self.path)?;
        let sentinel = reload_sentinel(file.metadata());
        let mut json = Vec::new();
        file.read_to_end(&mut json)?;
        let config = ApiServer::from_json(&json)?;
        if let Some(t) = config
            .tls_security_profile()
            .and_then(|p| p.profile_type.as_ref())
            .filter(|t| !t.is_recognized())
        {
            log::warn!(
                "Unrecognised TLS security profile type {:?} in {}; using the default profile",
                t.as_str(),
                self.path.display()
            );
        }
        self.sentinel = sentinel;
        Ok(config.resolve())
    }

    fn needs_reload(&self) -> bool {
        sentinel_mismatch(&self.sentinel, &self.path)
    }

    fn reload_loop(mut self) -> impl Stream<Item = TlsProfileSpec> {
        stream! {
            loop {
                tokio::time::sleep(RELOAD_INTERVAL).await;
                if self.needs_reload() {
                    match self.load() {
                        Ok(spec) => {
                            yield spec;
                        }
                        Err(e) => {
                            #[cfg(feature = "metrics")]
                            metrics::reload_failed();
                            log::warn!(
                                "Could not reload TLS security profile from {}: {}",
                                self.path.display(),
                                e
                            );
                        }
                    }
                }
            }
        }
    }
}

fn sentinel_mismatch(old: &Option<(u64, SystemTime)>, path: &Path) -> bool {
    match old {
        None => true,
        Some(old_md) => match reload_sentinel(path.metadata()) {
            None => true,
            Some(ref new_md) => old_md != new_md,
        },
    }
}

/// Resolved TLS security profile sourced from a policy file.
///
/// If no file is named on the command line, the default profile is
/// published and never changes.
pub struct TlsSecurityProfileFile {
    current: ArcSwap<TlsProfileSpec>,
}

impl TlsSecurityProfileFile {
    /// The most recently resolved profile.
    pub fn current(&self) -> Arc<TlsProfileSpec> {
        self.current.load_full()
    }

    /// Start building a [`rustls::ServerConfig`] restricted to the
    /// current profile, using the process-default crypto provider.
    #[cfg(feature = "rustls")]
    pub fn server_config_builder(
        &self,
    ) -> Result<rustls::ConfigBuilder<rustls::ServerConfig, rustls::WantsVerifier>, TlsProfileError>
    {
        crate::crypto_provider::server_config_builder(
            crate::crypto_provider::base_crypto_provider(),
            &self.current(),
        )
    }

    fn publish(&self, spec: TlsProfileSpec) {
        if **self.current.load() != spec {
            log::info!(
                "TLS security profile changed: minimum version {}, {} cipher suites",
                spec.min_tls_version,
                spec.ciphers.len()
            );
            #[cfg(feature = "metrics")]
            metrics::update(&spec);
            self.current.store(Arc::new(spec));
        }
    }
}

#[resource]
impl Resource for TlsSecurityProfileFile {
    fn new(
        _: comprehensive::NoDependencies,
        args: Args,
        api: &mut AssemblyRuntime<'_>,
    ) -> Result<Arc<Self>, TlsProfileError> {
        let Some(path) = args.tls_security_profile_path else {
            log::info!("No TLS security profile path given; using the default profile");
            #[cfg(feature = "metrics")]
            metrics::update(default_profile());
            return Ok(Arc::new(Self {
                current: ArcSwap::from_pointee(default_profile().clone()),
            }));
        };
        let mut loader = Loader::new(path);
        let spec = loader.load()?;
        log::info!(
            "TLS security profile from {}: minimum version {}, {} cipher suites",
            loader.path.display(),
            spec.min_tls_version,
            spec.ciphers.len()
        );
        #[cfg(feature = "metrics")]
        metrics::update(&spec);
        let shared = Arc::new(Self {
            current: ArcSwap::from_pointee(spec),
        });
        let shared2 = Arc::clone(&shared);
        api.set_task(async move {
            loader
                .reload_loop()
                .for_each(|spec| {
                    shared.publish(spec);
                    futures::future::ready(())
                })
                .await;
            Ok(())
        });
        Ok(shared2)
    }
}
