use std::{
    fs,
    io::{self, Read},
    path::Path,
    time::Duration,
};

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::{Serialize, de::DeserializeOwned};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use kpmatch::{
    CatalogRecord, KnownRecords, MatchSource, Release, Resolver, ResolverConfig,
    catalog::{
        Catalog,
        kp::{KpClient, KpClientConfig},
        page::HttpPages,
    },
    identifier::kp::{self, DEFAULT_CATALOG_HOST},
};

use crate::cli::{ApiArgs, Cli, Command, Source};

mod cli;

#[derive(Serialize)]
struct Matched<'a> {
    release: &'a Release,
    record: &'a CatalogRecord,
    source: MatchSource,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Cli::parse();
    match args.command {
        Command::Resolve {
            from,
            known,
            concurrency,
            api,
        } => {
            let releases: Vec<Release> = read_json(&from)?;
            let known: KnownRecords = match known {
                Some(path) => read_json::<Vec<CatalogRecord>>(&Source::File(path))?
                    .into_iter()
                    .collect(),
                None => KnownRecords::default(),
            };

            let progress = ProgressBar::new(releases.len() as u64);
            progress.set_style(ProgressStyle::with_template(
                "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len}",
            )?);

            let timeout = Duration::from_secs(api.timeout);
            let pages = HttpPages::new(timeout.min(Duration::from_secs(5)), timeout);
            let resolver = Resolver::new(
                pages,
                client(&api)?,
                ResolverConfig {
                    concurrency,
                    ..ResolverConfig::default()
                },
            )?
            .with_progress(progress.clone());
            let result = resolver.resolve_all(&releases, &known);
            progress.finish_and_clear();

            let mut matched: Vec<Matched> = result
                .iter()
                .map(|(release, r)| Matched {
                    release,
                    record: &r.record,
                    source: r.source,
                })
                .collect();
            matched.sort_by(|a, b| a.release.link.cmp(&b.release.link));
            println!("{}", serde_json::to_string_pretty(&matched)?);

            let unresolved = releases.iter().filter(|r| !result.contains(r)).count();
            summary(releases.len() - unresolved, unresolved);
        }
        Command::Lookup { id, api } => {
            let Some(id) = kp::parse(&id, DEFAULT_CATALOG_HOST) else {
                eprintln!("unrecognised catalog id: {id}");
                summary(0, 1);
                return Ok(());
            };
            match client(&api)?.fetch_record(id) {
                Ok(record) => {
                    println!("{}", serde_json::to_string_pretty(&record)?);
                    summary(1, 0);
                }
                Err(e) => {
                    eprintln!("{e}");
                    summary(0, 1);
                }
            }
        }
    }
    Ok(())
}

fn client(api: &ApiArgs) -> anyhow::Result<KpClient> {
    let client = KpClient::new(KpClientConfig {
        base_url: api.api_base.clone(),
        api_key: api.api_key.clone(),
        global_timeout: Duration::from_secs(api.timeout),
        ..KpClientConfig::default()
    })
    .with_context(|| format!("bad catalog API base {}", api.api_base))?;
    Ok(client)
}

fn read_json<T: DeserializeOwned>(from: &Source) -> anyhow::Result<T> {
    let raw = match from {
        Source::Stdin => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("read releases from stdin")?;
            buf
        }
        Source::File(path) => read_file(path)?,
    };
    serde_json::from_str(&raw).context("parse JSON input")
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

fn summary(ok: usize, failed: usize) {
    if std::env::var_os("NO_COLOR").is_some() {
        eprintln!("✓ {ok}  ✗ {failed}");
    } else {
        eprintln!(
            "{}  {}",
            format!("✓ {ok}").green(),
            format!("✗ {failed}").red()
        );
    }
}
