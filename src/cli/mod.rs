// src/cli/mod.rs
// Command surface: ingest a project, evaluate the detector catalogue,
// import the commit-metrics feed.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;

use crate::config::Config;
use crate::github::ApiClient;
use crate::impact::{calc_impact, BugSignal, ImpactReport};
use crate::ingest::Ingestor;
use crate::smells::Detector;
use crate::store::Store;

#[derive(Parser)]
#[command(name = "prospector")]
#[command(about = "Mines pull-request history for code review smells")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download pull requests and bug-labeled issues into the store
    Ingest {
        /// Repository full name (owner/name); defaults to the configured list
        project: Option<String>,
    },

    /// Run the detector catalogue and the impact calculation
    Evaluate {
        /// Repository full name (owner/name)
        project: String,

        /// Walk this many subsequent changes per file instead of only the
        /// nearest one (inverse-distance-weighted bugginess)
        #[arg(long)]
        depth: Option<u32>,
    },

    /// Print review-window metrics over the considered pull requests
    Metrics {
        /// Repository full name (owner/name)
        project: String,
    },

    /// Import the commit-metrics CSV feed
    ImportCsv {
        /// Feed path; defaults to the configured one
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env();
    // A store that cannot be reached is process-fatal; committed state from
    // earlier runs stays committed, ingestion resumes rather than rolls back.
    let store = Store::connect(&config.database_url).await?;

    match cli.command {
        Commands::Ingest { project } => {
            let projects = match project {
                Some(p) => vec![p],
                None => config.projects.clone(),
            };
            if projects.is_empty() {
                bail!("No project given and none configured (PROSPECTOR_PROJECTS)");
            }
            let client = ApiClient::new(config.api_base_url.clone(), config.github_tokens.clone())?;
            let ingestor = Ingestor::new(store, client);
            for project in &projects {
                ingestor.ingest_project(project).await?;
                // Issue ingestion needs the repository row the pull probe seeded.
                ingestor.ingest_bug_issues(project).await?;
            }
        }
        Commands::Evaluate { project, depth } => {
            run_evaluate(&store, &project, depth).await?;
        }
        Commands::Metrics { project } => {
            run_metrics(&store, &project).await?;
        }
        Commands::ImportCsv { path } => {
            let path = path
                .or_else(|| config.csv_path.clone().map(PathBuf::from))
                .ok_or_else(|| {
                    anyhow::anyhow!("No feed path given and none configured (PROSPECTOR_CSV_PATH)")
                })?;
            crate::csv_import::import_file(&store, &path).await?;
        }
    }

    Ok(())
}

async fn run_evaluate(store: &Store, project: &str, depth: Option<u32>) -> Result<()> {
    let Some(repo) = store.repository_by_full_name(project).await? else {
        error!(project, "Specified repository does not exist in the store");
        return Ok(());
    };

    let signal = match depth {
        Some(depth) => BugSignal::Bugginess { depth },
        None => BugSignal::NextChange,
    };

    println!("Smell occurrence across considered pull requests:");
    println!("{:<30}\tSMELLY", "");
    for detector in Detector::catalogue() {
        let evaluation = detector.apply(store, &repo).await?;
        if evaluation.considered_count() == 0 {
            println!("{:<30}\t(no considered pull requests)", evaluation.name);
            continue;
        }
        let percentage = evaluation.percentage()?;
        println!("{:<30}\t{:.2}%", evaluation.name, percentage * 100.0);
    }

    println!();
    println!("Probability that the next edit to a file touched by a pull request is a bug-solving one:");
    println!("{:<30}OK    \t SMELLY\t IMPACT", "");
    for detector in Detector::catalogue() {
        let report = calc_impact(store, &repo, &detector, signal).await?;
        print_impact_line(&detector.name(), &report);
    }

    let review_related = Detector::review_related();
    let union = calc_impact(
        store,
        &repo,
        &Detector::Union(review_related.clone()),
        signal,
    )
    .await?;
    print_impact_line("One of review related", &union);

    let intersection =
        calc_impact(store, &repo, &Detector::Intersection(review_related), signal).await?;
    print_impact_line("All of review related", &intersection);

    Ok(())
}

async fn run_metrics(store: &Store, project: &str) -> Result<()> {
    let Some(repo) = store.repository_by_full_name(project).await? else {
        error!(project, "Specified repository does not exist in the store");
        return Ok(());
    };

    let reports = vec![
        crate::metrics::review_window(store, &repo).await?,
        crate::metrics::review_window_per_line(store, &repo).await?,
    ];
    for report in reports {
        println!("{}:", report.name);
        for (pull_id, value) in &report.values {
            println!("  {pull_id}\t{value}");
        }
    }
    Ok(())
}

fn print_impact_line(label: &str, report: &ImpactReport) {
    let delta = report.delta();
    let sign = if delta > 0.0 { "+" } else { "" };
    println!(
        "{:<30}{}\t {}\t {}{}",
        label,
        fmt_rate(report.ok_rate),
        fmt_rate(report.smelly_rate),
        sign,
        fmt_rate(delta),
    );
}

/// Empty partitions carry a NaN rate by design; show it as n/a rather than
/// pretending it is a number.
fn fmt_rate(rate: f64) -> String {
    if rate.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.2}%", rate * 100.0)
    }
}
