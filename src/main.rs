use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use fire_variants::api::{CalculateRequest, run_http_server};
use fire_variants::core::Variant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fire-variants", about = "Deterministic multi-variant FIRE projections")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Run one scenario from a request file and print the results.
    Calculate {
        /// JSON file shaped like the `/api/calculate` body.
        #[arg(long)]
        input: PathBuf,
        /// Overrides the variant named in the file.
        #[arg(long, value_enum)]
        variant: Option<CliVariant>,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliVariant {
    Standard,
    Lean,
    Fat,
    Coast,
    Barista,
    Couples,
}

impl From<CliVariant> for Variant {
    fn from(value: CliVariant) -> Self {
        match value {
            CliVariant::Standard => Variant::Standard,
            CliVariant::Lean => Variant::Lean,
            CliVariant::Fat => Variant::Fat,
            CliVariant::Coast => Variant::Coast,
            CliVariant::Barista => Variant::Barista,
            CliVariant::Couples => Variant::Couples,
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fire_variants=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_calculate(input: PathBuf, variant: Option<CliVariant>) -> Result<String, String> {
    let body = fs::read_to_string(&input)
        .map_err(|e| format!("Failed to read {}: {e}", input.display()))?;
    let mut request = serde_json::from_str::<CalculateRequest>(&body)
        .map_err(|e| format!("Invalid request JSON in {}: {e}", input.display()))?;
    if let Some(variant) = variant {
        request.variant = variant.into();
    }

    info!(variant = request.variant.as_str(), path = %input.display(), "calculating scenario");
    let results = request.run().map_err(|e| e.to_string())?;
    serde_json::to_string_pretty(&results).map_err(|e| format!("Failed to encode results: {e}"))
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port } => {
            if let Err(e) = run_http_server(port).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Calculate { input, variant } => match run_calculate(input, variant) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
    }
}
