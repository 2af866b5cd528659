use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use pdfscan::{
    report::{render_analysis_report, render_search_report, render_summary, ReportFormat},
    BatchSummary, ConfigOverrides, Engine, ScanConfig, ScanError,
};
use std::{fs, num::NonZeroUsize, path::PathBuf, process::ExitCode};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type Result<T> = std::result::Result<T, ScanError>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Number of extraction workers
    #[arg(short = 'j', long, global = true)]
    threads: Option<NonZeroUsize>,

    /// Log filter used when RUST_LOG is not set (e.g. info, debug)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Show a progress bar
    #[arg(long, global = true)]
    progress: bool,

    /// Allow only one extraction at a time
    #[arg(long, global = true)]
    serialize_extraction: bool,

    /// Keep whatever text survives decoding instead of failing the file
    #[arg(long, global = true)]
    lossy: bool,

    /// Reuse extracted text stored in this directory
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for ReportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => ReportFormat::Text,
            Format::Json => ReportFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the text of every PDF into one annotated file
    Extract {
        /// File to write the extracted text to
        output_file: PathBuf,

        /// PDF files or directories to extract
        #[arg(required = true)]
        input_paths: Vec<PathBuf>,
    },

    /// Search PDFs for a phrase
    Search {
        /// Phrase to look for (case-insensitive)
        #[arg(short = 's', long)]
        search_phrase: String,

        /// Directories to search (default: home directory)
        #[arg(short = 'd', long, num_args = 1..)]
        directories: Vec<PathBuf>,

        /// Bundle matching files into a zip archive
        #[arg(short = 'z', long)]
        zip: bool,

        /// Archive path (default: search_results_<timestamp>.zip)
        #[arg(long, requires = "zip")]
        zip_output: Option<PathBuf>,

        /// Treat the phrase as a regular expression
        #[arg(long)]
        regex: bool,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Correlate keywords across PDFs and rank documents by relevance
    Analyze {
        /// Keywords to analyze
        #[arg(short = 'k', long, required = true, num_args = 1..)]
        keywords: Vec<String>,

        /// PDF files or directories to analyze
        #[arg(short = 'i', long, required = true, num_args = 1..)]
        input_paths: Vec<PathBuf>,

        /// Where to write the report
        #[arg(short = 'o', long, default_value = "pdf_analysis_report.txt")]
        output_file: PathBuf,

        /// Report keyword pairs with |correlation| at or above this value (0.0 to 1.0) [default: 0.1]
        #[arg(short = 't', long)]
        threshold: Option<f64>,

        /// Rank by raw keyword frequency only
        #[arg(long)]
        frequency_only: bool,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let (threshold, frequency_only) = match &cli.command {
        Commands::Analyze {
            threshold,
            frequency_only,
            ..
        } => (*threshold, *frequency_only),
        _ => (None, false),
    };

    let config = ScanConfig::load_from(cli.config.as_deref())?.merge_with_cli(ConfigOverrides {
        thread_count: cli.threads,
        threshold,
        cache_dir: cli.cache_dir,
        serialize_extraction: cli.serialize_extraction,
        lossy_encoding: cli.lossy,
        frequency_only,
        show_progress: cli.progress,
        log_level: cli.log_level,
    });
    init_logging(&config.log_level);
    debug!("Effective configuration: {:?}", config);

    let max_ranked = config.max_ranked;
    let engine = Engine::new(config)?;

    match cli.command {
        Commands::Extract {
            output_file,
            input_paths,
        } => {
            let summary = engine.extract_to_file(&input_paths, &output_file)?;
            print_summary(&summary);
            println!(
                "Extracted text from {} PDF files into '{}'",
                summary.succeeded,
                output_file.display()
            );
        }
        Commands::Search {
            search_phrase,
            directories,
            zip,
            zip_output,
            regex,
            format,
        } => {
            let report = engine.search(&search_phrase, &directories, regex)?;
            print!("{}", render_search_report(&report, format.into())?);
            print_summary(&report.summary);

            if zip {
                match engine.bundle(&report, zip_output.as_deref())? {
                    Some(path) => println!(
                        "Search results have been zipped to: {}",
                        path.display().to_string().blue()
                    ),
                    None => println!("No matching files to zip"),
                }
            }
        }
        Commands::Analyze {
            keywords,
            input_paths,
            output_file,
            format,
            ..
        } => {
            let report = engine.analyze(&input_paths, &keywords)?;
            fs::write(
                &output_file,
                render_analysis_report(&report, max_ranked, format.into())?,
            )?;
            print_summary(&report.summary);
            println!(
                "Successfully generated statistical analysis report in '{}'",
                output_file.display()
            );
        }
    }

    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Per-file failures go to stderr; they never change the exit status
fn print_summary(summary: &BatchSummary) {
    for failure in summary.failures.iter().filter(|f| !f.is_skipped()) {
        eprintln!("{} {}", "failed:".yellow(), failure);
    }
    let line = render_summary(summary);
    if summary.failed > 0 {
        eprintln!("{}", line.yellow());
    } else {
        eprintln!("{}", line.green());
    }
}
