use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum, error::ErrorKind};

use crate::config::{AppConfig, BackendKind, SourceSpec};
use crate::data::Identifier;
use crate::ingestion::RecordCache;
use crate::workflow::{ArticleCard, Workflow};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Local,
    Blob,
}

impl From<BackendArg> for BackendKind {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Local => BackendKind::Local,
            BackendArg::Blob => BackendKind::Blob,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "recommend_demo",
    disable_help_subcommand = true,
    about = "Request article recommendations for one user",
    long_about = "Load user interactions and article metadata, then request recommendations for one user and print them as article cards.",
    after_help = "Settings not given on the command line are read from RECS_* environment variables, then project defaults."
)]
/// CLI for `recommend_demo`.
///
/// Common usage:
/// - List selectable users: `--list-users`
/// - Recommend for the first user: no arguments
/// - Recommend for one user: `--user 42 --count 10`
/// - Read fixtures from another directory: `--data-dir /tmp/fixtures`
struct RecommendDemoCli {
    #[arg(long = "list-users", help = "Print selectable user ids and exit")]
    list_users: bool,
    #[arg(
        long,
        value_parser = parse_identifier,
        help = "User id to recommend for (defaults to the first user)"
    )]
    user: Option<Identifier>,
    #[arg(
        long,
        value_parser = parse_positive_usize,
        help = "Number of recommendations to request"
    )]
    count: Option<usize>,
    #[arg(long, value_enum, help = "Backend serving both record sources")]
    backend: Option<BackendArg>,
    #[arg(
        long = "data-dir",
        value_name = "DIR",
        help = "Base directory for relative local source paths"
    )]
    data_dir: Option<PathBuf>,
    #[arg(
        long = "interactions",
        value_name = "PATH_OR_BLOB",
        help = "User interaction source override"
    )]
    interactions: Option<String>,
    #[arg(
        long = "articles",
        value_name = "PATH_OR_BLOB",
        help = "Article metadata source override"
    )]
    articles: Option<String>,
    #[arg(long, value_name = "URL", help = "Recommendation endpoint override")]
    endpoint: Option<String>,
    #[arg(
        long = "timeout-secs",
        value_name = "SECS",
        help = "Request timeout override in whole seconds"
    )]
    timeout_secs: Option<u64>,
}

impl RecommendDemoCli {
    fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(backend) = self.backend {
            config = config.with_backend(backend.into());
        }
        if let Some(dir) = &self.data_dir {
            config = config.with_data_dir(dir);
        }
        if let Some(name) = &self.interactions {
            let format = config.interactions.format;
            config = config.with_interactions(SourceSpec::new(name, format));
        }
        if let Some(name) = &self.articles {
            let format = config.articles.format;
            config = config.with_articles(SourceSpec::new(name, format));
        }
        if let Some(endpoint) = &self.endpoint {
            config.client.endpoint = endpoint.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.client.timeout = Duration::from_secs(secs);
        }
        if let Some(count) = self.count {
            config = config.with_recommendation_count(count);
        }
        config
    }
}

/// Run the recommendation demo with configuration from the environment.
pub fn run_recommend_demo<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let base = AppConfig::from_env()?;
    let stdout = io::stdout();
    run_recommend_demo_with(args_iter, base, &mut stdout.lock())
}

/// Run the recommendation demo over `base`, writing cards to `out`.
pub fn run_recommend_demo_with<I, W>(
    args_iter: I,
    base: AppConfig,
    out: &mut W,
) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
    W: Write,
{
    let Some(cli) = parse_cli::<RecommendDemoCli, _>(
        std::iter::once("recommend_demo".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let config = cli.apply(base);
    let cache = RecordCache::new();
    let workflow = Workflow::new(config, &cache);
    let prepared = match workflow.prepare() {
        Ok(prepared) => prepared,
        Err(halt) => {
            writeln!(out, "Cannot proceed: {halt}")?;
            return Err(halt.into());
        }
    };

    if cli.list_users {
        for user in prepared.directory().users() {
            writeln!(out, "{user}")?;
        }
        return Ok(());
    }

    if !prepared.has_metadata() {
        writeln!(
            out,
            "No article metadata found. Recommendations will not show full details."
        )?;
    }

    let user = match cli.user {
        Some(user) => match prepared.directory().resolve(&user) {
            Some(stored) => stored.clone(),
            None => return Err(format!("unknown user id '{user}'").into()),
        },
        None => match prepared.directory().first() {
            Some(user) => user.clone(),
            None => return Err("no user ids available".into()),
        },
    };
    let count = prepared.default_count();

    writeln!(out, "Recommendations for user {user} (count {count}):")?;
    let cards = match prepared.recommend_cards(&user, count) {
        Ok(cards) => cards,
        Err(err) => {
            writeln!(out, "Failed to retrieve recommendations: {err}")?;
            return Err(err.into());
        }
    };
    if cards.is_empty() {
        writeln!(out, "No recommendations returned for this user.")?;
        return Ok(());
    }
    for (rank, card) in cards.iter().enumerate() {
        write_card(out, rank + 1, card)?;
    }
    Ok(())
}

fn write_card<W: Write>(out: &mut W, rank: usize, card: &ArticleCard) -> io::Result<()> {
    writeln!(out, "---")?;
    writeln!(out, "#{rank} article {}", card.article_id())?;
    writeln!(out, "{card}")
}

fn parse_identifier(raw: &str) -> Result<Identifier, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("--user must not be empty".to_string());
    }
    trimmed
        .parse::<Identifier>()
        .map_err(|err| err.to_string())
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw.parse::<usize>().map_err(|_| {
        format!(
            "Could not parse --count value '{}' as a positive integer",
            raw
        )
    })?;
    if parsed == 0 {
        return Err("--count must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}
