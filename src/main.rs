mod config;
mod llm;
mod model;
mod pdf;
mod publish;
mod report;
mod stages;
mod throttle;
mod workdir;

use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::config::{Config, DATA_DIR, OUTPUT_BASE};
use crate::llm::LlmClient;
use crate::workdir::WorkDir;

#[derive(Parser)]
#[command(name = "agent_papers", about = "Daily agent-papers pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: scrape, filter, retrieve, crop, report, publish
    Run {
        /// Target date (default: yesterday)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Write the report but skip the git push
        #[arg(long)]
        skip_publish: bool,
    },
    /// Preview the listing candidates for a date without calling any model
    Fetch {
        /// Target date (default: yesterday)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { date, skip_publish } => {
            run_pipeline(date.unwrap_or_else(yesterday), skip_publish).await
        }
        Commands::Fetch { date } => {
            let cfg = Config::default();
            let http = listing_client()?;
            let target = date.unwrap_or_else(yesterday);
            let papers = stages::fetch::fetch_candidates(&http, &cfg, target).await?;
            if papers.is_empty() {
                println!("No papers dated {target} on the listing.");
                return Ok(());
            }
            for (i, paper) in papers.iter().enumerate() {
                println!("{:>3}. {}  ({})", i + 1, paper.title, paper.source_link);
            }
            println!("\n{} candidates for {target}", papers.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run_pipeline(target: NaiveDate, skip_publish: bool) -> Result<()> {
    let cfg = Config::default();
    let http = listing_client()?;
    let llm = LlmClient::from_env()?;
    let work = WorkDir::create(DATA_DIR, target)?;

    println!("DAILY AGENT PAPERS PIPELINE - {target}");

    println!("\n[1/7] Scraping papers listing...");
    let candidates = stages::fetch::fetch_candidates(&http, &cfg, target).await?;
    println!("Found {} papers dated {target}", candidates.len());

    println!("\n[2/7] Applying strict agent-only filtering...");
    let mut papers = stages::classify::classify_papers(&llm, &cfg, candidates).await;
    println!("Filtered to {} verified agent papers", papers.len());

    if papers.is_empty() {
        println!("\nNo agent papers found for {target}. Exiting.");
        return Ok(());
    }

    println!("\n[3/7] Downloading PDFs...");
    stages::retrieve::retrieve_documents(&http, &cfg, &work, &mut papers).await;
    println!(
        "Downloaded {} PDFs",
        papers.iter().filter(|p| p.arxiv_id.is_some()).count()
    );

    println!("\n[4/7] Identifying main diagrams...");
    stages::locate::locate_diagrams(&llm, &cfg, &mut papers).await;
    println!(
        "Found {} main diagrams",
        papers.iter().filter(|p| p.main_diagram.is_some()).count()
    );

    println!("\n[5/7] Generating Medium-style content...");
    stages::narrative::generate_narratives(&llm, &cfg, &mut papers).await;
    println!(
        "Generated content for {} papers",
        papers.iter().filter(|p| p.narrative.is_some()).count()
    );

    println!("\n[6/7] Smart cropping diagrams...");
    stages::crop::crop_diagrams(&llm, &work, &mut papers).await;
    println!(
        "Cropped {} diagrams",
        papers.iter().filter(|p| p.cropped.is_some()).count()
    );

    println!("\n[7/7] Writing report and publishing...");
    let output = report::write_output(OUTPUT_BASE, target, &papers)?;
    println!("Report: {}", output.markdown_path.display());

    if skip_publish {
        println!("Skipping publish (--skip-publish).");
    } else {
        publish::publish(target, &output, papers.len());
    }

    println!("\nPipeline complete: {} papers", papers.len());
    Ok(())
}

fn listing_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?)
}

fn yesterday() -> NaiveDate {
    Local::now().date_naive() - chrono::Days::new(1)
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
