use std::io::IsTerminal;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{miette, Context, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use quorum_core::{OutputFormat, QuorumConfig};
use quorum_review::github::{parse_pr_reference, GitHubClient};
use quorum_review::pipeline::ReviewPipeline;

#[derive(Parser)]
#[command(
    name = "quorum",
    version,
    about = "Multi-agent AI code review for git diffs",
    long_about = "Quorum reviews a diff with four focused agents — logic, security,\n\
                   performance, and readability — running concurrently, then merges\n\
                   their findings into one deduplicated, severity-ranked report.\n\n\
                   Examples:\n  \
                     git diff | quorum review             Review a diff from stdin\n  \
                     quorum review --file changes.patch   Review a patch file\n  \
                     quorum review --pr owner/repo#42     Review a GitHub pull request\n  \
                     quorum init                          Write a starter .quorum.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .quorum.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Review a diff with all four agents
    #[command(long_about = "Review a diff with all four agents.\n\n\
        Accepts a diff from stdin, a file, or a GitHub PR reference.\n\
        Agent failures degrade the report instead of failing the run;\n\
        only a malformed diff is fatal.\n\n\
        Examples:\n  git diff main | quorum review\n  quorum review --pr owner/repo#42 --format json")]
    Review {
        /// Read diff from a file instead of stdin
        #[arg(long, conflicts_with = "pr")]
        file: Option<PathBuf>,

        /// Review a GitHub pull request (owner/repo#number or URL)
        #[arg(long)]
        pr: Option<String>,

        /// GitHub token (default: GITHUB_TOKEN env var)
        #[arg(long)]
        github_token: Option<String>,
    },
    /// Write a starter .quorum.toml in the current directory
    Init,
}

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Quorum configuration

[llm]
provider = "openai"
model = "gpt-4o-mini"
# api_key = "sk-..."          # or set OPENAI_API_KEY via base provider
# base_url = "http://localhost:11434"

[dispatch]
agent_timeout_secs = 60
# request_timeout_secs = 120
max_retries = 1
retry_backoff_ms = 500

[dedup]
line_tolerance = 1
similarity_threshold = 0.8

# "empty" returns a zero-comment report when every agent fails;
# "error" fails the run instead.
on_all_agents_failed = "empty"

# [prompts]
# security = "Custom security reviewer instructions"
"#;

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Review {
            file,
            pr,
            github_token,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let diff_text = read_diff(file.as_deref(), pr.as_deref(), github_token.as_deref())
                .await?;
            run_review(&diff_text, config, cli.format).await
        }
        Command::Init => run_init(),
    }
}

fn load_config(path: Option<&Path>) -> Result<QuorumConfig> {
    match path {
        Some(p) => QuorumConfig::from_file(p)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to load config from {}", p.display())),
        None => {
            let default = Path::new(".quorum.toml");
            if default.exists() {
                QuorumConfig::from_file(default)
                    .into_diagnostic()
                    .wrap_err("failed to load .quorum.toml")
            } else {
                Ok(QuorumConfig::default())
            }
        }
    }
}

async fn read_diff(
    file: Option<&Path>,
    pr: Option<&str>,
    github_token: Option<&str>,
) -> Result<String> {
    if let Some(reference) = pr {
        let (owner, repo, number) = parse_pr_reference(reference).into_diagnostic()?;
        let client = GitHubClient::new(github_token);
        return client
            .get_pr_diff(&owner, &repo, number)
            .await
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to fetch {reference}"));
    }

    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read {}", path.display()));
    }

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(miette!(
            "no diff provided: pipe one in, or use --file / --pr\n\n  git diff | quorum review"
        ));
    }
    let mut buf = String::new();
    stdin
        .read_to_string(&mut buf)
        .into_diagnostic()
        .wrap_err("failed to read diff from stdin")?;
    Ok(buf)
}

async fn run_review(diff_text: &str, config: QuorumConfig, format: OutputFormat) -> Result<()> {
    let pipeline = ReviewPipeline::from_config(config).into_diagnostic()?;
    let outcome = pipeline.review(diff_text).await.into_diagnostic()?;

    match format {
        OutputFormat::Text => print!("{outcome}"),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&outcome).into_diagnostic()?;
            println!("{json}");
        }
        OutputFormat::Markdown => print!("{}", outcome.to_markdown()),
    }
    Ok(())
}

fn run_init() -> Result<()> {
    let path = Path::new(".quorum.toml");
    if path.exists() {
        return Err(miette!(
            ".quorum.toml already exists; remove it first to re-initialize"
        ));
    }
    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .into_diagnostic()
        .wrap_err("failed to write .quorum.toml")?;
    println!("Wrote .quorum.toml");
    Ok(())
}
