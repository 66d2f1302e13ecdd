//! blog-material-gen - CLI entry point.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use git2::Repository;
use tracing_subscriber::EnvFilter;

use blog_material_gen::config::{self, UserConfig};
use blog_material_gen::git::{current_branch, get_recent_daily_branches};
use blog_material_gen::notify::SlackNotifier;
use blog_material_gen::pipeline::{
    Pipeline, PipelineConfig, PipelineResult, RunLog, RunLogEntry, workspace_name,
};

/// Turn a day's merged branches into blog material on Notion.
#[derive(Parser, Debug)]
#[command(name = "blog-material-gen")]
#[command(about = "Turn a day's merged branches into blog material on Notion")]
#[command(version)]
struct Cli {
    /// Daily branch to analyze (defaults to the most recent daily/* branch)
    daily_branch: Option<String>,

    /// Repository to analyze (defaults to the current directory)
    working_directory: Option<PathBuf>,

    /// Analyze only the checked-out branch against its base branch
    #[arg(long)]
    current_branch: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "blog_material_gen=debug"
    } else {
        "blog_material_gen=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let started = Instant::now();

    let user_config = match UserConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ 설정이 완료되지 않았습니다. ({})", e);
            if let Ok(path) = config::config_path() {
                eprintln!("   설정 파일: {}", path.display());
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    let working_directory = match cli.working_directory {
        Some(dir) => dir,
        None => std::env::current_dir().context("Could not determine the current directory")?,
    };

    let target_branch = if cli.current_branch {
        Repository::discover(&working_directory)
            .map(|repo| current_branch(&repo))
            .unwrap_or_else(|_| "main".to_string())
    } else {
        match cli.daily_branch {
            Some(branch) => branch,
            None => default_daily_branch(&working_directory),
        }
    };

    let pipeline = Pipeline::new(PipelineConfig {
        working_directory: working_directory.clone(),
        daily_branch: target_branch.clone(),
        notion_api_key: user_config.api_key.clone(),
        notion_database_id: user_config.database_id.clone(),
        llm: user_config.llm_config(),
    });

    let result = if cli.current_branch {
        pipeline.run_current_branch().await
    } else {
        pipeline.run_daily().await
    };

    let workspace = workspace_name(&working_directory);
    let duration = started.elapsed();
    print_summary(&result, cli.current_branch, duration.as_secs_f64());

    let log_path = write_run_log(&result, &target_branch, &workspace, duration.as_millis() as u64);
    if let Some(path) = &log_path {
        println!("   Log saved: {}", path.display());
    }

    if let Some(webhook) = user_config.slack_webhook() {
        let notifier = SlackNotifier::new(webhook);
        if result.success {
            notifier
                .notify_success(&result, &workspace, &target_branch)
                .await;
        } else {
            notifier
                .notify_failure(&result, &workspace, &target_branch, log_path.as_deref())
                .await;
        }
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Most recent `daily/*` branch, else the checked-out branch.
fn default_daily_branch(working_directory: &Path) -> String {
    println!("No daily branch specified. Looking for recent daily branches...");
    let Ok(repo) = Repository::discover(working_directory) else {
        return "main".to_string();
    };

    match get_recent_daily_branches(&repo).into_iter().next() {
        Some(branch) => {
            println!("   Using most recent: {}", branch);
            branch
        }
        None => {
            let branch = current_branch(&repo);
            println!("   Using current branch: {}", branch);
            branch
        }
    }
}

fn print_summary(result: &PipelineResult, current_branch_mode: bool, seconds: f64) {
    println!("\n📊 Pipeline Result:");
    println!("   Success: {}", result.success);
    println!(
        "   Analysis: {}",
        if current_branch_mode { "current branch" } else { "daily branch" }
    );
    println!(
        "   Mode: {}",
        if result.appended == Some(true) {
            "Appended to existing page"
        } else {
            "Created new page"
        }
    );
    println!("   Branches Analyzed: {}", result.branches_analyzed);
    println!("   Blog Ideas Generated: {}", result.blog_ideas_generated);
    println!("   Duration: {:.2}s", seconds);

    if let Some(url) = &result.notion_url {
        println!("   Notion URL: {}", url);
    }
    if !result.errors.is_empty() {
        println!("   Errors: {}", result.errors.join(", "));
    }
}

/// Persist the run; a logging failure only warns.
fn write_run_log(
    result: &PipelineResult,
    branch: &str,
    workspace: &str,
    duration_ms: u64,
) -> Option<PathBuf> {
    let entry = RunLogEntry {
        timestamp: chrono::Local::now(),
        success: result.success,
        daily_branch: branch.to_string(),
        workspace_name: workspace.to_string(),
        result: result.clone(),
        duration: duration_ms,
    };

    let written = config::log_dir()
        .map_err(anyhow::Error::from)
        .and_then(|dir| RunLog::new(dir).append(&entry).map_err(anyhow::Error::from));

    match written {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!("Could not write run log: {:#}", e);
            None
        }
    }
}
