//! assessor CLI: timed quizzes and assessments in the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "assessor", version, about = "Adaptive timed assessment engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take an interactive timed session
    Take {
        /// Question bank file or directory (overrides the configured source)
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Session mode: practice, assessment, adaptive
        #[arg(long, default_value = "practice")]
        mode: String,

        /// Restrict questions to one topic
        #[arg(long)]
        topic: Option<String>,

        /// Output directory (defaults to the configured one)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Report formats: json, html, md, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Grade a prepared answers file without a clock
    Grade {
        /// Question bank file or directory
        #[arg(long)]
        bank: PathBuf,

        /// TOML file with an [answers] table keyed by question ID
        #[arg(long)]
        answers: PathBuf,

        /// Session mode: practice, assessment, adaptive
        #[arg(long, default_value = "assessment")]
        mode: String,

        /// Restrict questions to one topic
        #[arg(long)]
        topic: Option<String>,

        /// Output directory; nothing is written when omitted
        #[arg(long)]
        output: Option<PathBuf>,

        /// Report formats: json, html, md, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate question bank TOML files
    Validate {
        /// Path to a bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// List the topics of a question bank
    Topics {
        /// Path to a bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Compare two assessment reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Minimum mastery change that counts
        #[arg(long, default_value = "0.05")]
        threshold: f64,

        /// Exit code 1 if any topic regressed
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create a starter config and example question bank
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "assessor=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            bank,
            mode,
            topic,
            output,
            format,
            config,
        } => commands::take::execute(bank, mode, topic, output, format, config).await,
        Commands::Grade {
            bank,
            answers,
            mode,
            topic,
            output,
            format,
            config,
        } => commands::grade::execute(bank, answers, mode, topic, output, format, config).await,
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Topics { bank } => commands::topics::execute(bank),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
