use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use residue_annotator::app::App;
use residue_annotator::config::{ConfigLoader, Overrides};
use residue_annotator::domain::OutputFormat;
use residue_annotator::error::AnnotatorError;
use residue_annotator::output::{self, OutputMode};
use residue_annotator::tui::Viewer;
use residue_annotator::uniprot::UniprotHttpClient;

#[derive(Parser)]
#[command(name = "residue-annotator")]
#[command(about = "Per-residue annotation table for a UniProtKB protein")]
#[command(version, author)]
struct Cli {
    #[arg(help = "UniProtKB accession or entry name, e.g. P01308")]
    accession: Option<String>,

    #[arg(long)]
    non_interactive: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Tsv)]
    format: OutputFormat,

    #[arg(long, help = "Write the table to this file instead of stdout")]
    output: Option<Utf8PathBuf>,

    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    base_url: Option<String>,

    #[arg(long, help = "Request timeout in seconds")]
    timeout: Option<u64>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<AnnotatorError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &AnnotatorError) -> u8 {
    match error {
        AnnotatorError::NotFound { .. } | AnnotatorError::InvalidAccession(_) => 2,
        AnnotatorError::Retrieval { .. } => 3,
        AnnotatorError::MalformedRecord { .. } => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive || cli.output.is_some() {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let resolved = ConfigLoader::resolve(
        cli.config.as_deref(),
        Overrides {
            base_url: cli.base_url,
            timeout_secs: cli.timeout,
        },
    )?;
    let client = UniprotHttpClient::new(resolved.client.clone())?;
    let app = App::new(client, resolved.policy);

    match output_mode {
        OutputMode::NonInteractive => {
            let accession = cli.accession.ok_or_else(|| {
                miette::Report::msg("an accession is required with --non-interactive")
            })?;
            let report = app.build_annotation_table(&accession)?;
            match cli.output {
                Some(path) => output::save(&report, cli.format, &path)?,
                None => output::print(&report, cli.format)?,
            }
            Ok(())
        }
        OutputMode::Interactive => Viewer::new(app).run(cli.accession),
    }
}
