use clap::Parser;
use hyperify_rune::config::{self, Overrides};
use hyperify_rune::output::{self, OutputFormat};
use hyperify_rune::pipeline;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Placeholder output name used to anchor relative asset URLs when the
/// document goes to stdout.
const STDOUT_ANCHOR: &str = "rune-output";

#[derive(Parser)]
#[command(name = "rune")]
#[command(about = "Merge YAML, HTML and Markdown content into one JSON or YAML document")]
#[command(long_about = "\
Merge YAML, HTML and Markdown content into one JSON or YAML document

Every .yml, .html and .md file directly inside DIRECTORY is normalized into
one sequence of nodes. Images referenced by `image`, `src`, `*Image` and
`Image*` fields are embedded as data URLs, or extracted into a
content-addressed assets directory with --assets-dir. Translation files
(`<name>.<lang>.json|yml`) are appended as a final `i18n` node.

Content structure:

  site/
  ├── rune.toml                # Optional config (see --print-config)
  ├── 010-header.yml           # List of nodes, spliced in as-is
  ├── footer.html              # One node per top-level element
  ├── about.md                 # { type: View, name: about, body: [...] }
  ├── card.component.md        # { type: Component, name: card, body: [...] }
  ├── logo.png
  └── translations/
      ├── app.en.json
      └── app.fi.json

Diagnostics go to stderr; set RUST_LOG or pass -v for more detail.")]
#[command(version)]
struct Cli {
    /// Directory containing the source files
    directory: PathBuf,

    /// Output format
    #[arg(value_enum)]
    output_type: OutputFormat,

    /// Directory containing translation files [default: DIRECTORY/translations]
    #[arg(long)]
    language_dir: Option<PathBuf>,

    /// Extract assets into this directory instead of embedding them
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// Public URL prefix for extracted assets (default: path relative to the output)
    #[arg(long)]
    assets_prefix: Option<String>,

    /// Write the document to this file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Increase diagnostic verbosity (-v info, -vv debug)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let overrides = Overrides {
        translations_dir: cli.language_dir,
        assets_dir: cli.assets_dir,
        assets_prefix: cli.assets_prefix,
    };
    let config = config::load_config(&cli.directory, &overrides)?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let output_path = match &cli.output {
        Some(path) => path.clone(),
        None => PathBuf::from(STDOUT_ANCHOR),
    };

    let build = pipeline::build(&cli.directory, &config, &output_path)?;
    let rendered = output::render(&build.document, cli.output_type)?;
    output::write_document(&rendered, cli.output.as_deref())?;
    output::print_summary(&build);

    Ok(())
}

/// Diagnostics to stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
