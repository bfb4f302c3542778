//! Command-line flags and the validated daemon configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;

use vigil_health::{PoolConfig, SchedulerConfig};
use vigil_registry::{format_duration, parse_duration};

/// Every flag can also be set through the matching `VIGIL_*` variable.
#[derive(Debug, Parser)]
#[command(name = "vigild", version, about = "Vigil daemon: periodic HTTP endpoint prober")]
pub struct Cli {
    /// Address the REST API listens on.
    #[arg(long, env = "VIGIL_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// TLS certificate chain (PEM).
    #[arg(long, env = "VIGIL_SSL_CERT", default_value = "cert.pem")]
    pub ssl_cert: PathBuf,

    /// TLS private key (PEM).
    #[arg(long, env = "VIGIL_SSL_KEY", default_value = "key.pem")]
    pub ssl_key: PathBuf,

    /// Serve the API over TLS.
    #[arg(long, env = "VIGIL_RUN_SSL")]
    pub run_ssl: bool,

    /// Interval between probe cycles (e.g. `3s`, `500ms`).
    #[arg(long, env = "VIGIL_CHECK_FREQUENCY", default_value = "3s")]
    pub check_frequency: String,

    /// Registry snapshot, loaded at startup and written on shutdown.
    #[arg(long, env = "VIGIL_DATA_FILE", default_value = "./data/targets.json")]
    pub data_file: PathBuf,

    /// Number of probe workers.
    #[arg(long, env = "VIGIL_WORKERS", default_value_t = 10)]
    pub workers: usize,

    /// Timeout for each periodic probe and the default for ad-hoc probes.
    #[arg(long, env = "VIGIL_PROBE_TIMEOUT", default_value = "1s")]
    pub probe_timeout: String,
}

/// Certificate and key for the TLS listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub bind: SocketAddr,
    /// Present only when TLS is enabled.
    pub tls: Option<TlsConfig>,
    pub check_frequency: Duration,
    pub data_file: PathBuf,
    pub workers: usize,
    pub probe_timeout: Duration,
}

impl DaemonConfig {
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let bind: SocketAddr = cli
            .bind
            .parse()
            .with_context(|| format!("invalid bind address {:?}", cli.bind))?;

        let check_frequency = positive_duration("check-frequency", &cli.check_frequency)?;
        let probe_timeout = positive_duration("probe-timeout", &cli.probe_timeout)?;

        if cli.workers == 0 {
            bail!("--workers must be at least 1");
        }

        let tls = cli.run_ssl.then(|| TlsConfig {
            cert: cli.ssl_cert.clone(),
            key: cli.ssl_key.clone(),
        });

        Ok(Self {
            bind,
            tls,
            check_frequency,
            data_file: cli.data_file.clone(),
            workers: cli.workers,
            probe_timeout,
        })
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: self.check_frequency,
            pool: PoolConfig {
                workers: self.workers,
                queue_capacity: self.workers,
                probe_timeout: self.probe_timeout,
            },
        }
    }

    /// One-line summary for the startup log.
    pub fn describe(&self) -> String {
        format!(
            "bind={} tls={} check_frequency={} probe_timeout={} workers={} data_file={}",
            self.bind,
            self.tls.is_some(),
            format_duration(self.check_frequency),
            format_duration(self.probe_timeout),
            self.workers,
            self.data_file.display(),
        )
    }
}

fn positive_duration(flag: &str, raw: &str) -> anyhow::Result<Duration> {
    let duration = parse_duration(raw).with_context(|| format!("invalid --{flag}"))?;
    if duration.is_zero() {
        bail!("--{flag} must be greater than zero");
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["vigild"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults() {
        let config = DaemonConfig::from_cli(&cli(&[])).unwrap();
        assert_eq!(config.bind, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.tls, None);
        assert_eq!(config.check_frequency, Duration::from_secs(3));
        assert_eq!(config.probe_timeout, Duration::from_secs(1));
        assert_eq!(config.workers, 10);
        assert_eq!(config.data_file, PathBuf::from("./data/targets.json"));
    }

    #[test]
    fn explicit_flags() {
        let config = DaemonConfig::from_cli(&cli(&[
            "--bind",
            "0.0.0.0:9000",
            "--check-frequency",
            "500ms",
            "--probe-timeout",
            "2s",
            "--workers",
            "4",
            "--data-file",
            "/tmp/vigil.json",
        ]))
        .unwrap();

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.check_frequency, Duration::from_millis(500));
        assert_eq!(config.probe_timeout, Duration::from_secs(2));
        assert_eq!(config.workers, 4);

        let scheduler = config.scheduler_config();
        assert_eq!(scheduler.interval, Duration::from_millis(500));
        assert_eq!(scheduler.pool.workers, 4);
        assert_eq!(scheduler.pool.probe_timeout, Duration::from_secs(2));
    }

    #[test]
    fn tls_only_when_enabled() {
        let config = DaemonConfig::from_cli(&cli(&["--ssl-cert", "a.pem"])).unwrap();
        assert!(config.tls.is_none());

        let config = DaemonConfig::from_cli(&cli(&[
            "--run-ssl",
            "--ssl-cert",
            "a.pem",
            "--ssl-key",
            "b.pem",
        ]))
        .unwrap();
        assert_eq!(
            config.tls,
            Some(TlsConfig {
                cert: PathBuf::from("a.pem"),
                key: PathBuf::from("b.pem"),
            })
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(DaemonConfig::from_cli(&cli(&["--bind", "localhost"])).is_err());
        assert!(DaemonConfig::from_cli(&cli(&["--check-frequency", "often"])).is_err());
        assert!(DaemonConfig::from_cli(&cli(&["--check-frequency", "0s"])).is_err());
        assert!(DaemonConfig::from_cli(&cli(&["--check-frequency", "10"])).is_err());
        assert!(DaemonConfig::from_cli(&cli(&["--probe-timeout", "0"])).is_err());
        assert!(DaemonConfig::from_cli(&cli(&["--workers", "0"])).is_err());
    }

    #[test]
    fn non_numeric_workers_fail_to_parse() {
        assert!(Cli::try_parse_from(["vigild", "--workers", "many"]).is_err());
    }

    #[test]
    fn describe_mentions_settings() {
        let config = DaemonConfig::from_cli(&cli(&[])).unwrap();
        let summary = config.describe();
        assert!(summary.contains("127.0.0.1:8080"));
        assert!(summary.contains("check_frequency=3s"));
    }
}
