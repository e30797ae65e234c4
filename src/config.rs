use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use ron::{extensions::Extensions, Options};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cli::{model::Cli, ports::PortSpec},
    collector::scheduler,
    endpoint::Target,
    store::LockWait,
};

pub const DEFAULT_DBPATH: &str = "/var/lib/stackcollector/db";
pub const DEFAULT_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("reading config file: {0}")]
    Io(#[from] io::Error),
    #[error("parsing config file: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("no hosts configured (use --host)")]
    NoHosts,
    #[error("no ports configured (use --ports)")]
    NoPorts,
    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),
    #[error("invalid log level `{0}`")]
    LogLevel(String),
}

/// Settings as they appear in a config file. Everything is optional.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FileConfig {
    pub dbpath: Option<PathBuf>,
    pub hosts: Vec<String>,
    pub ports: Option<PortSpec>,
    pub interval: Option<u64>,
    pub fetch_timeout: Option<u64>,
    pub lock: LockWait,
    pub log_level: Option<String>,
}

impl FileConfig {
    pub fn from_file(file_path: &Path) -> Result<Self, ConfigError> {
        Self::parse(&fs::read_to_string(file_path)?)
    }

    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let options = Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .with_default_extension(Extensions::UNWRAP_NEWTYPES);
        Ok(options.from_str(s)?)
    }
}

/// Resolved settings for one collector process
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorConfig {
    pub dbpath: PathBuf,
    pub hosts: Vec<String>,
    pub ports: Vec<u16>,
    pub interval: Duration,
    pub fetch_timeout: Duration,
    pub lock: LockWait,
    pub log_level: String,
}

impl CollectorConfig {
    /// Reads the config file named by `--config` (if any) and applies the
    /// command line on top of it
    pub fn load(cli: Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }

    pub fn resolve(cli: Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let hosts = match cli.hosts.is_empty() {
            true => file.hosts,
            false => cli.hosts,
        };
        if hosts.is_empty() {
            return Err(ConfigError::NoHosts);
        }

        let ports = cli.ports.or(file.ports).ok_or(ConfigError::NoPorts)?.ports();

        let fetch_timeout = cli
            .fetch_timeout
            .or(file.fetch_timeout)
            .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);
        if fetch_timeout == 0 {
            return Err(ConfigError::Zero("fetch_timeout"));
        }

        let interval = cli.interval.or(file.interval).unwrap_or(DEFAULT_INTERVAL_SECS);
        if interval == 0 {
            return Err(ConfigError::Zero("interval"));
        }

        let mut lock = file.lock;
        if let Some(secs) = cli.lock_timeout {
            lock.max_wait_ms = Some(secs.saturating_mul(1000));
        }
        if lock.max_wait_ms == Some(0) {
            return Err(ConfigError::Zero("lock_timeout"));
        }

        Ok(Self {
            dbpath: cli
                .dbpath
                .or(file.dbpath)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DBPATH)),
            hosts,
            ports,
            interval: Duration::from_secs(interval),
            fetch_timeout: Duration::from_secs(fetch_timeout),
            lock,
            log_level: cli
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }

    pub fn targets(&self) -> Vec<Target> {
        scheduler::targets(&self.hosts, &self.ports)
    }
}

#[cfg(test)]
mod test {
    use std::{path::PathBuf, time::Duration};

    use crate::{
        cli::{model::Cli, ports::PortSpec},
        store::LockWait,
    };

    use super::{CollectorConfig, ConfigError, FileConfig, DEFAULT_DBPATH};

    fn cli() -> Cli {
        Cli {
            hosts: vec!["a".to_string()],
            ports: Some(PortSpec::Single(9000)),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let cfg = CollectorConfig::resolve(cli(), FileConfig::default()).unwrap();
        assert_eq!(cfg.dbpath, PathBuf::from(DEFAULT_DBPATH));
        assert_eq!(cfg.interval, Duration::from_secs(600));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(30));
        assert_eq!(cfg.lock, LockWait::default());
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.ports, vec![9000]);
    }

    #[test]
    fn test_parse_file() {
        let file = FileConfig::parse(
            r#"(
                dbpath: "/srv/stacks.db",
                hosts: ["web1", "web2"],
                ports: "16384..16386",
                interval: 60,
                lock: (max_wait_ms: 2000),
            )"#,
        )
        .unwrap();

        let cfg = CollectorConfig::resolve(Cli::default(), file).unwrap();
        assert_eq!(cfg.dbpath, PathBuf::from("/srv/stacks.db"));
        assert_eq!(cfg.hosts, vec!["web1", "web2"]);
        assert_eq!(cfg.ports, vec![16384, 16385, 16386]);
        assert_eq!(cfg.interval, Duration::from_secs(60));
        assert_eq!(cfg.lock.max_wait_ms, Some(2000));
        assert_eq!(cfg.lock.initial_backoff_ms, LockWait::default().initial_backoff_ms);
        assert_eq!(cfg.targets().len(), 6);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig::parse(
            r#"(hosts: ["file-host"], ports: "1,2", interval: 60, log_level: "warn")"#,
        )
        .unwrap();
        let cli = Cli {
            interval: Some(5),
            lock_timeout: Some(3),
            ..cli()
        };

        let cfg = CollectorConfig::resolve(cli, file).unwrap();
        assert_eq!(cfg.hosts, vec!["a"]);
        assert_eq!(cfg.ports, vec![9000]);
        assert_eq!(cfg.interval, Duration::from_secs(5));
        assert_eq!(cfg.lock.max_wait_ms, Some(3000));
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn test_missing_targets() {
        let no_hosts = Cli {
            hosts: Vec::new(),
            ..cli()
        };
        assert!(matches!(
            CollectorConfig::resolve(no_hosts, FileConfig::default()),
            Err(ConfigError::NoHosts)
        ));

        let no_ports = Cli {
            ports: None,
            ..cli()
        };
        assert!(matches!(
            CollectorConfig::resolve(no_ports, FileConfig::default()),
            Err(ConfigError::NoPorts)
        ));
    }

    #[test]
    fn test_zero_durations_rejected() {
        let cli_zero_fetch = Cli {
            fetch_timeout: Some(0),
            ..cli()
        };
        assert!(matches!(
            CollectorConfig::resolve(cli_zero_fetch, FileConfig::default()),
            Err(ConfigError::Zero("fetch_timeout"))
        ));

        let cli_zero_interval = Cli {
            interval: Some(0),
            ..cli()
        };
        assert!(matches!(
            CollectorConfig::resolve(cli_zero_interval, FileConfig::default()),
            Err(ConfigError::Zero("interval"))
        ));

        let file = FileConfig::parse("(interval: 0)").unwrap();
        assert!(matches!(
            CollectorConfig::resolve(cli(), file),
            Err(ConfigError::Zero("interval"))
        ));
    }

    #[test]
    fn test_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            config: Some(dir.path().join("missing.ron")),
            ..cli()
        };

        let err = CollectorConfig::load(cli).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(err.to_string().starts_with("reading config file: "));
    }

    #[test]
    fn test_bad_ports_in_file() {
        assert!(matches!(
            FileConfig::parse(r#"(ports: "10..1")"#),
            Err(ConfigError::Ron(_))
        ));
    }
}
