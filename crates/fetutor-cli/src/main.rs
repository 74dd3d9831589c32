//! The `fetutor` binary: tutoring sessions, grading and reports from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

use commands::OracleArgs;

#[derive(Parser)]
#[command(name = "fetutor", version, about = "Socratic engineering tutor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive tutoring session
    Session {
        /// Problem ID (prompted for when omitted)
        #[arg(long)]
        problem: Option<String>,

        /// Problem bank file or directory (overrides config)
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Student name used in the report
        #[arg(long, default_value = "Student")]
        user: String,

        #[command(flatten)]
        oracle: OracleArgs,
    },

    /// Check an answer against an expected value or a problem's targets
    Check {
        /// The student's answer text
        answer: String,

        /// Expected value
        #[arg(long, conflicts_with = "problem")]
        expected: Option<f64>,

        /// Problem ID whose targets to check against
        #[arg(long, required_unless_present = "expected")]
        problem: Option<String>,

        /// Problem bank file or directory (overrides config)
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Relative tolerance (default from config, else 0.05)
        #[arg(long)]
        tolerance: Option<f64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score a saved transcript on the 0-10 mastery rubric
    Score {
        /// Transcript text file
        #[arg(long)]
        transcript: PathBuf,

        #[command(flatten)]
        oracle: OracleArgs,
    },

    /// Compose (and optionally send) a report for a saved transcript
    Report {
        /// Transcript text file
        #[arg(long)]
        transcript: PathBuf,

        /// Student name
        #[arg(long, default_value = "Student")]
        user: String,

        /// Session topic
        #[arg(long)]
        topic: String,

        /// Student feedback appended under the feedback marker
        #[arg(long)]
        feedback: Option<String>,

        /// Deliver through the configured notifier
        #[arg(long)]
        send: bool,

        /// Write the report as JSON to this path
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        oracle: OracleArgs,
    },

    /// List problems in the bank
    Problems {
        /// Problem bank file or directory (overrides config)
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Filter by category
        #[arg(long)]
        category: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate problem bank files
    Validate {
        /// Path to bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Create starter config and example problem bank
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "fetutor=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Session {
            problem,
            bank,
            user,
            oracle,
        } => commands::session::execute(problem, bank, user, oracle).await,
        Commands::Check {
            answer,
            expected,
            problem,
            bank,
            tolerance,
            config,
        } => commands::check::execute(answer, expected, problem, bank, tolerance, config),
        Commands::Score { transcript, oracle } => {
            commands::score::execute(transcript, oracle).await
        }
        Commands::Report {
            transcript,
            user,
            topic,
            feedback,
            send,
            output,
            oracle,
        } => {
            commands::report::execute(transcript, user, topic, feedback, send, output, oracle)
                .await
        }
        Commands::Problems {
            bank,
            category,
            config,
        } => commands::problems::execute(bank, category, config),
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
