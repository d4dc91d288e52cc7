use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gatepass_core::{
    Classifier, Config, CredentialMapping, DeliveryOutcome, FixedClassifier, MappingSource,
    ResolutionResult,
};
use gatepass_net::{run_event, DeliveryClient, PipelineOutcome};

#[derive(Parser)]
#[command(name = "gatepass", about = "Resolve classifier labels to credentials and deliver them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look a label up in the credential mapping
    Resolve {
        /// Classifier label, matched exactly (e.g. "0 Jeff_bezos")
        label: String,
        /// Also print the access code
        #[arg(long)]
        show_code: bool,
    },
    /// Resolve a label and deliver its credentials once
    Send {
        /// Classifier label, matched exactly
        label: String,
    },
    /// List mapped labels and identity ids
    List,
    /// Validate configuration and mapping
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve { label, show_code } => {
            let mapping = load_mapping(&mapping_source()?)?;
            match mapping.resolve(&label) {
                ResolutionResult::Resolved(pair) if show_code => {
                    println!("{label}: person_id={} person_code={}", pair.identity_id, pair.access_code);
                }
                ResolutionResult::Resolved(pair) => {
                    println!("{label}: person_id={}", pair.identity_id);
                }
                ResolutionResult::Unresolved(label) => {
                    bail!("label {label:?} is not in the credential mapping");
                }
            }
        }
        Commands::Send { label } => {
            let config = load_config()?;
            let mapping = load_mapping(&config.mapping)?;
            let client = DeliveryClient::from_config(&config)?;
            let event = FixedClassifier::new(label).classify(&[]);
            match run_event(&mapping, &client, event).await {
                PipelineOutcome::Delivered(DeliveryOutcome::Success { status }) => {
                    println!("sent to {} (HTTP {status})", config.endpoint);
                }
                PipelineOutcome::Delivered(DeliveryOutcome::Failure { reason }) => {
                    bail!("delivery failed: {reason}");
                }
                PipelineOutcome::Unresolved(label) => {
                    bail!("label {label:?} is not in the credential mapping; nothing sent");
                }
                PipelineOutcome::ClassifierFailed(reason) => {
                    bail!("classification failed: {reason}");
                }
            }
        }
        Commands::List => {
            let mapping = load_mapping(&mapping_source()?)?;
            if mapping.is_empty() {
                println!("No labels mapped");
            }
            for (label, pair) in mapping.iter() {
                println!("{:<8} {label}", pair.identity_id);
            }
        }
        Commands::Check => {
            let config = load_config()?;
            let mapping = load_mapping(&config.mapping)?;
            let source = match &config.mapping {
                MappingSource::Path(path) => path.display().to_string(),
                MappingSource::Inline(_) => "inline".to_string(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "version": env!("CARGO_PKG_VERSION"),
                    "endpoint": config.endpoint.as_str(),
                    "timeout_secs": config.timeout_secs,
                    "strict_status": config.strict_status,
                    "allow_insecure_http": config.allow_insecure_http,
                    "mapping_source": source,
                    "labels": mapping.len(),
                }))?
            );
        }
    }

    Ok(())
}

fn load_config() -> Result<Config> {
    Config::from_env().context("failed to load configuration")
}

/// `resolve` and `list` never touch the network, so they need no endpoint.
fn mapping_source() -> Result<MappingSource> {
    MappingSource::from_env().context("failed to load mapping configuration")
}

fn load_mapping(source: &MappingSource) -> Result<CredentialMapping> {
    source.load().context("failed to load credential mapping")
}
