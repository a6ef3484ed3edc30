//! Command-line entry point.
//!
//! # Responsibility
//! - Load credentials and flags, then run a crawl or print store totals.
//! - Turn every fatal startup or store failure into a non-zero exit.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{debug, info};
use malwatch_core::config::{DEFAULT_API_BASE_URL, DEFAULT_DATABASE_PATH, DEFAULT_PER_PAGE};
use malwatch_core::db::{open_db, open_existing_db};
use malwatch_core::{
    default_log_level, init_logging, CrawlConfig, CrawlEngine, CrawlReport, GitHubGateway,
    SqliteAccountStore, StoreStats,
};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "malwatch",
    version,
    about = "Track a network of suspicious GitHub accounts starting from known seeds"
)]
struct Cli {
    /// SQLite database holding crawl state.
    #[arg(long, global = true, env = "MALWATCH_DB", default_value = DEFAULT_DATABASE_PATH)]
    db: PathBuf,

    /// trace|debug|info|warn|error
    #[arg(long, global = true, env = "MALWATCH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files, in addition to stderr.
    #[arg(long, global = true, env = "MALWATCH_LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    crawl: CrawlArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Expand the tracked set until no unprocessed account remains (default).
    Crawl(CrawlArgs),
    /// Print account and repository totals.
    Stats,
}

#[derive(Debug, Args)]
struct CrawlArgs {
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Extra seed account, in addition to the built-in list. Repeatable.
    #[arg(long = "seed", value_name = "LOGIN")]
    seeds: Vec<String>,

    #[arg(long, default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// Events requested per feed page (1-100).
    #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
    per_page: u32,

    /// Stop after this many passes; the rest is resumed by the next run.
    #[arg(long)]
    max_passes: Option<u32>,

    /// Fetch activity of removed accounts with the token instead of anonymously.
    #[arg(long)]
    no_anonymous_fallback: bool,
}

fn main() -> Result<()> {
    let dotenv_path = dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, cli.log_dir.as_deref())
        .map_err(anyhow::Error::msg)
        .context("failed to initialize logging")?;
    if let Some(path) = dotenv_path {
        debug!("event=dotenv_load module=cli status=ok path={}", path.display());
    }

    match cli.command {
        Some(Command::Stats) => print_stats(&cli.db),
        Some(Command::Crawl(args)) => crawl(&cli.db, args),
        None => crawl(&cli.db, cli.crawl),
    }
}

fn crawl(db: &Path, args: CrawlArgs) -> Result<()> {
    let token = args
        .github_token
        .filter(|token| !token.trim().is_empty())
        .context("GITHUB_TOKEN environment variable is not set")?;

    let mut config = CrawlConfig::new(token).with_extra_seeds(args.seeds);
    config.database_path = db.to_path_buf();
    config.gateway.api_base_url = args.api_base_url;
    config.gateway.per_page = args.per_page;
    config.options.max_passes = args.max_passes;
    config.options.anonymous_fallback = !args.no_anonymous_fallback;
    config.validate().context("invalid crawl configuration")?;

    let conn = open_db(&config.database_path).with_context(|| {
        format!(
            "failed to open crawl database `{}`",
            config.database_path.display()
        )
    })?;
    let store = SqliteAccountStore::new(&conn);
    let seeded = store
        .seed_accounts(config.seeds.as_slice())
        .context("failed to insert seed accounts")?;
    info!(
        "event=seed_accounts module=cli status=ok listed={} inserted={}",
        config.seeds.len(),
        seeded
    );

    let gateway = GitHubGateway::new(&config.gateway).context("failed to build GitHub client")?;
    let engine = CrawlEngine::new(store, gateway, config.options);
    let report = engine.run().context("crawl aborted")?;
    print_report(&report);

    let stats = engine.store().stats().context("failed to read store totals")?;
    print_totals(&stats);
    Ok(())
}

fn print_stats(db: &Path) -> Result<()> {
    let conn = open_existing_db(db)
        .with_context(|| format!("failed to open crawl database `{}`", db.display()))?;
    let stats = SqliteAccountStore::new(&conn)
        .stats()
        .context("failed to read store totals")?;
    print_totals(&stats);
    Ok(())
}

fn print_report(report: &CrawlReport) {
    println!(
        "crawl passes={} processed={} deferred={} removed={} discovered={} untracked={} repositories={}",
        report.passes,
        report.processed,
        report.deferred,
        report.removed,
        report.accounts_discovered,
        report.accounts_untracked,
        report.repositories_inserted
    );
    if report.stalled {
        println!("crawl stopped: every pending account failed to fetch; rerun later to retry");
    } else if report.pass_limit_reached {
        println!("crawl stopped: pass limit reached; rerun to continue");
    }
}

fn print_totals(stats: &StoreStats) {
    println!(
        "accounts total={} processed={} pending={} removed={}",
        stats.accounts, stats.processed, stats.pending, stats.removed
    );
    println!(
        "repositories created={} forked={}",
        stats.created_repositories, stats.forked_repositories
    );
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_invocation_runs_crawl_with_flags() {
        let cli = Cli::try_parse_from([
            "malwatch",
            "--github-token",
            "t",
            "--seed",
            "newbot",
            "--max-passes",
            "3",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.crawl.github_token.as_deref(), Some("t"));
        assert_eq!(cli.crawl.seeds, vec!["newbot"]);
        assert_eq!(cli.crawl.max_passes, Some(3));
        assert!(!cli.crawl.no_anonymous_fallback);
    }

    #[test]
    fn stats_subcommand_accepts_global_db_flag() {
        let cli = Cli::try_parse_from(["malwatch", "stats", "--db", "/tmp/x.sqlite"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Stats)));
        assert_eq!(cli.db.to_str(), Some("/tmp/x.sqlite"));
    }

    #[test]
    fn global_flags_may_precede_subcommands() {
        let cli = Cli::try_parse_from(["malwatch", "--db", "/tmp/x.sqlite", "stats"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Stats)));
        assert_eq!(cli.db.to_str(), Some("/tmp/x.sqlite"));

        let cli = Cli::try_parse_from([
            "malwatch",
            "--log-level",
            "info",
            "crawl",
            "--github-token",
            "t",
            "--no-anonymous-fallback",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("info"));
        let Some(Command::Crawl(args)) = cli.command else {
            panic!("expected crawl subcommand");
        };
        assert_eq!(args.github_token.as_deref(), Some("t"));
        assert!(args.no_anonymous_fallback);
    }
}
