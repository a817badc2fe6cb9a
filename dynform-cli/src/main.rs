use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use color_eyre::eyre::{Report, Result, eyre};
use tracing_subscriber::EnvFilter;

use dynform::{
    ConfigCache, ConfigSource, DocumentFormat, DynFormUI, EmitOptions, RecordSink, Submission,
    UiOptions, emit_record,
};

#[derive(Debug, Parser)]
#[command(
    name = "dynform",
    version,
    about = "Render per-company form configurations as interactive TUIs"
)]
struct Cli {
    /// Configuration spec: file path, inline payload, or "-" for stdin
    #[arg(short = 'c', long = "config", value_name = "SPEC")]
    config: String,

    /// Preselect a company instead of starting at the selector
    #[arg(long = "company", value_name = "KEY")]
    company: Option<String>,

    /// Title shown at the top of the UI
    #[arg(long = "title", value_name = "TEXT")]
    title: Option<String>,

    /// Output destinations for the submitted record ("-" writes to stdout).
    /// Accepts multiple values per flag use.
    #[arg(short = 'o', long = "output", value_name = "DEST", num_args = 1.., action = ArgAction::Append)]
    outputs: Vec<String>,

    /// Validate on every keystroke instead of only on submit
    #[arg(long = "live-validate")]
    live_validate: bool,

    /// Emit compact JSON rather than pretty formatting
    #[arg(long = "no-pretty")]
    no_pretty: bool,

    /// Wrap the emitted record in an envelope naming the company
    #[arg(long = "envelope")]
    envelope: bool,

    /// Print the configured company keys as JSON and exit
    #[arg(long = "list-companies")]
    list_companies: bool,

    /// Overwrite output files even if they already exist
    #[arg(short = 'f', long = "force", short_alias = 'y', alias = "yes")]
    force: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (source, format) = resolve_config_source(&cli.config);
    let mut cache = ConfigCache::new(source, format);
    let config = cache
        .get()
        .map_err(|err| Report::msg(format!("could not load the company configuration: {err:#}")))?
        .clone();

    if cli.list_companies {
        let keys: Vec<&str> = config.keys().collect();
        println!("{}", serde_json::to_string_pretty(&keys).map_err(Report::msg)?);
        return Ok(());
    }

    let sinks = resolve_sinks(&cli.outputs, cli.force)?;

    let mut ui = DynFormUI::new(config).with_options(
        UiOptions::default().with_auto_validate(cli.live_validate),
    );
    if let Some(title) = cli.title {
        ui = ui.with_title(title);
    }
    if let Some(company) = cli.company {
        ui = ui.with_company(company);
    }

    match ui.run().map_err(Report::msg)? {
        Some(submission) => hand_off(&submission, &sinks, !cli.no_pretty, cli.envelope),
        None => {
            eprintln!("exited without submitting");
            Ok(())
        }
    }
}

/// A spec is a file when it points at an existing path, stdin when it is
/// "-", and an inline payload otherwise.
fn resolve_config_source(spec: &str) -> (ConfigSource, DocumentFormat) {
    if spec == "-" {
        return (ConfigSource::Stdin, DocumentFormat::Json);
    }
    let path = Path::new(spec);
    if path.exists() {
        let format = DocumentFormat::from_path(path);
        return (ConfigSource::file(path), format);
    }
    (ConfigSource::Inline(spec.to_string()), DocumentFormat::Json)
}

fn resolve_sinks(outputs: &[String], force: bool) -> Result<Vec<RecordSink>> {
    let mut sinks = Vec::new();
    for output in outputs {
        if output == "-" {
            sinks.push(RecordSink::Stdout);
            continue;
        }
        let path = PathBuf::from(output);
        if path.exists() && !force {
            return Err(eyre!(
                "output file {} already exists (pass --force to overwrite)",
                path.display()
            ));
        }
        sinks.push(RecordSink::File(path));
    }
    if sinks.is_empty() {
        sinks.push(RecordSink::Stdout);
    }
    Ok(sinks)
}

fn hand_off(
    submission: &Submission,
    sinks: &[RecordSink],
    pretty: bool,
    envelope: bool,
) -> Result<()> {
    let options = EmitOptions::default()
        .with_pretty(pretty)
        .with_envelope(envelope);
    emit_record(&submission.company, &submission.record, sinks, &options).map_err(Report::msg)?;
    eprintln!("submitted record for {}", submission.company);
    Ok(())
}
