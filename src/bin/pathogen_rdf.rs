use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use pathogen_rdf::app::{App, BatchOptions, BatchResult, RowPipeline, convert_rows};
use pathogen_rdf::classify::ChatClassifier;
use pathogen_rdf::config::{ConfigLoader, Overrides, ResolvedConfig};
use pathogen_rdf::domain::{PathogenClass, TaxonContext, TaxonId};
use pathogen_rdf::ena::{EnaHttpClient, parse_read_runs};
use pathogen_rdf::error::PathogenError;
use pathogen_rdf::output::{
    JsonOutput, OutputMode, TextProgress, print_batch_summary, print_search_summary,
};
use pathogen_rdf::rdf::Converter;
use pathogen_rdf::search::{DEFAULT_QUERIES, EbiSearchHttpClient, export_query};
use pathogen_rdf::sink::OutputSink;
use pathogen_rdf::template::SchemaTemplate;
use pathogen_rdf::uniprot::UniprotHttpClient;

#[derive(Parser)]
#[command(name = "pathogen-rdf")]
#[command(about = "Convert ENA read_run records of pathogen taxa into canonical N-Triples")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch runs for each taxon and write one .nt file per run")]
    Run(RunArgs),
    #[command(about = "Convert a local read_run TSV without calling upstream services")]
    ConvertTsv(ConvertArgs),
    #[command(about = "Export EBI Search hits across categories to TSV")]
    Search(SearchArgs),
}

#[derive(Args, Clone, Default)]
struct RunArgs {
    #[arg(long)]
    config: Option<String>,

    /// Taxon id; repeatable. Replaces the taxa of the config file.
    #[arg(long = "taxon")]
    taxa: Vec<String>,

    #[arg(long)]
    limit: Option<usize>,

    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct ConvertArgs {
    /// TSV with run_accession, experiment_title, tax_id, country, description.
    input: PathBuf,

    #[arg(long)]
    taxon: String,

    #[arg(long)]
    name: String,

    #[arg(long = "class")]
    pathogen_class: String,

    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct SearchArgs {
    /// Query string; repeatable. Defaults to the built-in query list.
    #[arg(long = "query")]
    queries: Vec<String>,

    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{report:?}");
            if let Some(error) = report.downcast_ref::<PathogenError>() {
                return ExitCode::from(map_exit_code(error));
            }
            ExitCode::from(1)
        }
    }
}

fn map_exit_code(error: &PathogenError) -> u8 {
    match error {
        PathogenError::InvalidTaxonId(_)
        | PathogenError::MissingConfig
        | PathogenError::ConfigRead(_)
        | PathogenError::ConfigParse(_)
        | PathogenError::TemplateRead(_)
        | PathogenError::TemplateShape(_) => 2,
        PathogenError::EnaHttp(_)
        | PathogenError::EnaStatus { .. }
        | PathogenError::UniprotHttp(_)
        | PathogenError::UniprotStatus { .. }
        | PathogenError::OracleHttp(_)
        | PathogenError::OracleStatus { .. }
        | PathogenError::OracleResponse(_)
        | PathogenError::SearchHttp(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => run_batch(args, output_mode),
        Commands::ConvertTsv(args) => run_convert(args, output_mode),
        Commands::Search(args) => run_search(args, output_mode),
    }
}

fn build_pipeline(config: &ResolvedConfig) -> Result<RowPipeline, PathogenError> {
    let template =
        SchemaTemplate::load(&config.template)?.with_disease_base(config.disease_base.clone());
    let converter = Converter::new(config.skolem_authority.clone());
    Ok(RowPipeline::new(template, converter))
}

fn run_batch(args: RunArgs, output_mode: OutputMode) -> miette::Result<ExitCode> {
    let RunArgs {
        config,
        taxa,
        limit,
        output_dir,
        dry_run,
    } = args;
    let overrides = Overrides {
        taxa,
        row_limit: limit,
        output_dir,
    };
    let config = ConfigLoader::resolve(config.as_deref(), overrides)?;
    if config.taxa.is_empty() {
        return Err(miette::Report::msg(
            "no taxa to process (add `taxa` to pathogen-rdf.json or pass --taxon)",
        ));
    }

    let pipeline = build_pipeline(&config)?;
    let ena = EnaHttpClient::with_base_url(config.ena_base.clone())?;
    let taxonomy = UniprotHttpClient::with_base_url(config.uniprot_base.clone())?;
    let classifier = ChatClassifier::new(
        config.oracle.base_url.clone(),
        config.oracle.model.clone(),
        config.oracle.api_key(),
        taxonomy.clone(),
    )?;
    let app = App::new(ena, taxonomy, classifier, pipeline);

    let output = OutputSink::new(&config.output_dir)?;
    let options = BatchOptions {
        row_limit: config.row_limit,
        dry_run,
    };

    let result = match output_mode {
        OutputMode::NonInteractive => app.run_batch(&config.taxa, &options, &output, &JsonOutput)?,
        OutputMode::Interactive => app.run_batch(&config.taxa, &options, &output, &TextProgress)?,
    };
    report_batch(&result, output_mode)
}

fn run_convert(args: ConvertArgs, output_mode: OutputMode) -> miette::Result<ExitCode> {
    let taxon: TaxonId = args.taxon.parse()?;
    let overrides = Overrides {
        taxa: vec![taxon.to_string()],
        row_limit: None,
        output_dir: args.output_dir,
    };
    let config = ConfigLoader::resolve(args.config.as_deref(), overrides)?;
    let pipeline = build_pipeline(&config)?;

    let body = std::fs::read_to_string(&args.input).into_diagnostic()?;
    let rows = parse_read_runs(&taxon, &body)?;
    let Ok(pathogen_class) = args.pathogen_class.parse::<PathogenClass>();
    let context = TaxonContext::new(taxon, args.name, pathogen_class);

    let output = OutputSink::new(&config.output_dir)?;
    let options = BatchOptions {
        row_limit: rows.len(),
        dry_run: args.dry_run,
    };
    let result = match output_mode {
        OutputMode::NonInteractive => {
            convert_rows(&pipeline, &context, &rows, &options, &output, &JsonOutput)?
        }
        OutputMode::Interactive => {
            convert_rows(&pipeline, &context, &rows, &options, &output, &TextProgress)?
        }
    };
    report_batch(&result, output_mode)
}

fn report_batch(result: &BatchResult, output_mode: OutputMode) -> miette::Result<ExitCode> {
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_batch(result).into_diagnostic()?,
        OutputMode::Interactive => print_batch_summary(result),
    }
    if result.summary.failed > 0 {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_search(args: SearchArgs, output_mode: OutputMode) -> miette::Result<ExitCode> {
    let queries = if args.queries.is_empty() {
        DEFAULT_QUERIES.iter().map(|query| query.to_string()).collect()
    } else {
        args.queries
    };
    let client = EbiSearchHttpClient::new()?;
    let mut exports = Vec::with_capacity(queries.len());
    for query in &queries {
        exports.push(export_query(&client, query, &args.output_dir)?);
    }
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_search(&exports).into_diagnostic()?,
        OutputMode::Interactive => print_search_summary(&exports),
    }
    Ok(ExitCode::SUCCESS)
}
