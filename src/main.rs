use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use revdiff::areas::git::{DEFAULT_GIT_BINARY, DEFAULT_GIT_TIMEOUT_SECS, GitConfig};
use revdiff::areas::repository::Repository;
use revdiff::artifacts::core::{Output, page};
use revdiff::artifacts::diff::change_record::StateFilter;
use revdiff::artifacts::diff::classifier::UntrackedMode;
use revdiff::commands::porcelain::diff::{DEFAULT_FROM, DiffOptions, DiffOutcome, OutputFormat};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "REVDIFF_LOG";

#[derive(Parser)]
#[command(
    name = "revdiff",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "Report changes between git revisions and the working tree",
    long_about = "Reports added, modified, deleted and untracked content between two revisions, \
    or between a revision and the working tree. Fully untracked directories are reported \
    as a single entry unless asked otherwise.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase log verbosity (-v info, -vv debug, -vvv trace)"
    )]
    verbose: u8,
    #[arg(
        long,
        global = true,
        env = "REVDIFF_GIT",
        default_value = DEFAULT_GIT_BINARY,
        help = "The git binary to run"
    )]
    git_binary: PathBuf,
    #[arg(
        long,
        global = true,
        env = "REVDIFF_GIT_TIMEOUT",
        default_value_t = DEFAULT_GIT_TIMEOUT_SECS,
        help = "Seconds a single git invocation may take"
    )]
    git_timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "diff",
        about = "Report changes between revisions or against the working tree",
        long_about = "This command compares the FROM revision with the TO revision, or with the \
        working tree when TO is omitted, and prints one record per changed path."
    )]
    Diff {
        #[arg(
            short = 'd',
            long,
            help = "The repository to report on (defaults to the one containing the current directory)"
        )]
        dataset: Option<PathBuf>,
        #[arg(short, long, default_value = DEFAULT_FROM, help = "The revision to compare from")]
        from: String,
        #[arg(
            short,
            long,
            help = "The revision to compare to (defaults to the working tree)"
        )]
        to: Option<String>,
        #[arg(
            long,
            value_enum,
            default_value_t = UntrackedMode::Normal,
            help = "How untracked content is reported"
        )]
        untracked: UntrackedMode,
        #[arg(long, help = "Also report unchanged tracked paths as clean")]
        report_clean: bool,
        #[arg(
            long,
            value_parser = parse_state_filter,
            help = "Only report the given states: (A)dded, (M)odified, (D)eleted, (U)ntracked, (C)lean"
        )]
        diff_filter: Option<StateFilter>,
        #[arg(
            long,
            value_enum,
            default_value_t = OutputFormat::Tailored,
            help = "How records are printed"
        )]
        output_format: OutputFormat,
        #[arg(index = 1, help = "Only report changes at or underneath these paths")]
        paths: Vec<PathBuf>,
    },
}

fn parse_state_filter(letters: &str) -> Result<StateFilter, String> {
    StateFilter::try_parse(letters).ok_or_else(|| {
        format!("unknown state in '{letters}', expected a combination of A, M, D, U and C")
    })
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = GitConfig::new(cli.git_binary, Duration::from_secs(cli.git_timeout));

    match cli.command {
        Commands::Diff {
            dataset,
            from,
            to,
            untracked,
            report_clean,
            diff_filter,
            output_format,
            paths,
        } => {
            let pwd = std::env::current_dir()?
                .canonicalize()
                .context("unable to resolve the current directory")?;
            let dataset = dataset.map_or_else(|| pwd.clone(), |dataset| pwd.join(dataset));

            let (writer, pager) = Output::detect().into_parts();
            let repository = Repository::discover(&dataset, writer, config).await?;

            let options = DiffOptions {
                from,
                to,
                paths,
                untracked,
                report_clean,
                state_filter: diff_filter.unwrap_or_default(),
                output_format,
            };
            let outcome = repository.diff(&options, &pwd).await?;
            page(pager)?;

            if let DiffOutcome::Impossible(message) = outcome {
                eprintln!("diff(impossible): {message}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
