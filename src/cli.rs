use std::{fs, path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand};

use kpmatch::{catalog::kp::DEFAULT_API_BASE, resolver::DEFAULT_CONCURRENCY};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Match a list of releases to catalog records
    Resolve {
        /// JSON array of releases, or `-` for stdin
        #[arg(value_name = "RELEASES")]
        from: Source,
        /// JSON array of catalog records that are already known
        #[arg(long, value_name = "FILE")]
        known: Option<PathBuf>,
        /// Number of releases resolved at the same time
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
        #[command(flatten)]
        api: ApiArgs,
    },
    /// Fetch one catalog record by id or catalog URL
    Lookup {
        #[arg(value_name = "ID|URL")]
        id: String,
        #[command(flatten)]
        api: ApiArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ApiArgs {
    /// Catalog API key
    #[arg(long, env = "KP_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Catalog API base URL
    #[arg(long, env = "KP_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,
    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 15)]
    pub timeout: u64,
}

#[derive(Clone, Debug, PartialEq)]
/// Where releases are read from: a file, or standard input when given `-`.
pub enum Source {
    Stdin,
    File(PathBuf),
}

impl FromStr for Source {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            return Ok(Source::Stdin);
        }
        fs::canonicalize(s)
            .map(Source::File)
            .map_err(|e| format!("cannot open {s}: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn from_str_identifies_existing_file() {
        let tmp = NamedTempFile::new().expect("tmp file");
        let path = tmp.path().to_path_buf();
        let src = Source::from_str(path.to_str().unwrap()).expect("parse");
        assert_eq!(src, Source::File(std::fs::canonicalize(&path).unwrap()));
    }

    #[test]
    fn from_str_dash_is_stdin() {
        assert_eq!(Source::from_str("-").unwrap(), Source::Stdin);
    }

    #[test]
    fn from_str_rejects_missing_paths() {
        proptest::proptest!(|(s in "[A-Za-z0-9._]{1,32}")| {
            let path = PathBuf::from(&s);
            proptest::prop_assume!(!path.exists());
            let err = Source::from_str(&s).unwrap_err();
            proptest::prop_assert!(err.contains(&s));
        })
    }

    #[test]
    fn parses_resolve_defaults() {
        let cli = Cli::try_parse_from(["kpmatch", "resolve", "-"]).unwrap();
        match cli.command {
            Command::Resolve {
                from,
                known,
                concurrency,
                api,
            } => {
                assert_eq!(from, Source::Stdin);
                assert!(known.is_none());
                assert_eq!(concurrency, DEFAULT_CONCURRENCY);
                assert_eq!(api.timeout, 15);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
