use std::path::PathBuf;

use clap::ArgAction;
use clap::Parser;
use clap_derive::Parser;

use super::ports::PortSpec;

/// Polls stack sample endpoints and aggregates their samples on disk
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "stackcollector", author, version, long_about = None, disable_help_flag = true)]
pub struct Cli {
    /// RON config file. Flags given here override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Store path [default: /var/lib/stackcollector/db]
    #[arg(short, long)]
    pub dbpath: Option<PathBuf>,

    /// Host to poll, repeatable
    #[arg(short = 'h', long = "host")]
    pub hosts: Vec<String>,

    /// Ports to poll on every host: `A..B`, `A,B,C` or `A`
    #[arg(short, long)]
    pub ports: Option<PortSpec>,

    /// Seconds between sweeps [default: 600]
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Seconds before a fetch is abandoned [default: 30]
    #[arg(long)]
    pub fetch_timeout: Option<u64>,

    /// Seconds to wait for the store lock before dropping a batch
    /// [default: wait forever]
    #[arg(long)]
    pub lock_timeout: Option<u64>,

    /// trace, debug, info, warn, error, or a filter directive [default: info]
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use clap::Parser;

    use crate::cli::ports::PortSpec;

    use super::Cli;

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from([
            "stackcollector",
            "-d",
            "/tmp/db",
            "-h",
            "a",
            "-h",
            "b",
            "-p",
            "9000..9002",
            "-i",
            "60",
        ])
        .unwrap();

        assert_eq!(cli.dbpath, Some(PathBuf::from("/tmp/db")));
        assert_eq!(cli.hosts, vec!["a", "b"]);
        assert_eq!(cli.ports, Some(PortSpec::Range(9000, 9002)));
        assert_eq!(cli.interval, Some(60));
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_long_flags() {
        let cli = Cli::try_parse_from([
            "stackcollector",
            "--host",
            "a",
            "--ports",
            "80,81",
            "--fetch-timeout",
            "5",
            "--lock-timeout",
            "20",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.ports, Some(PortSpec::List(vec![80, 81])));
        assert_eq!(cli.fetch_timeout, Some(5));
        assert_eq!(cli.lock_timeout, Some(20));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_bad_port_spec_rejected() {
        assert!(Cli::try_parse_from(["stackcollector", "-p", "9..1"]).is_err());
    }

    #[test]
    fn test_help_is_long_only() {
        let err = Cli::try_parse_from(["stackcollector", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
