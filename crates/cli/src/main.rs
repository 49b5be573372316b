//! git-ipfs-mirror - copy a git reference's object graph into IPFS

use anyhow::{Context, Result};
use clap::Parser;
use mirror_cli::{config, mirror_reference, MirrorOutcome, SpinnerProgress};
use mirror_core::ContentId;
use mirror_git::GitRepository;
use mirror_ipfs::IpfsClient;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Mirror every object reachable from a git reference into an IPFS node
#[derive(Parser)]
#[command(name = "git-ipfs-mirror")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the git repository
    repository: PathBuf,
    /// Reference to mirror, e.g. refs/heads/main
    reference: String,
    /// Existing aggregate root to extend (defaults to an empty directory)
    existing_root: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load()?;

    let existing_root = cli
        .existing_root
        .as_deref()
        .map(ContentId::parse)
        .transpose()
        .context("Invalid existing root")?;

    let repo = GitRepository::open(&cli.repository)?;
    let ipfs = IpfsClient::discover(config.ipfs.api_url.as_deref(), config.timeout())?;
    tracing::debug!("Using IPFS API at {}", ipfs.base_url());

    let mut progress = SpinnerProgress::new();
    let result = mirror_reference(
        &repo,
        &ipfs,
        &cli.reference,
        existing_root,
        &config,
        &mut progress,
    );
    progress.finish();

    print_summary(&result?);
    Ok(())
}

fn print_summary(outcome: &MirrorOutcome) {
    let report = &outcome.report;
    println!("{} Mirrored {}", "✓".green(), outcome.reference.bold());
    println!("  {:<8} {}", "head".dimmed(), outcome.head);
    println!("  {:<8} {}", "object".dimmed(), outcome.object);
    println!("  {:<8} {}", "root".dimmed(), outcome.new_root.cyan());
    println!(
        "  {:<8} {} {}",
        "pushed".dimmed(),
        report.objects,
        format!(
            "({} commits, {} trees, {} blobs, {} tags, {} bytes)",
            report.commits, report.trees, report.blobs, report.tags, report.bytes
        )
        .dimmed()
    );
}
