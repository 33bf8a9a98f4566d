//! Protocol Signer CLI
//!
//! Inspection tooling for signature requests: decode and validate protocol
//! URIs, sniff container formats, classify CMS signatures and manage the
//! handler configuration.

use clap::{Parser, Subcommand, ValueEnum};
use miette::{Context, IntoDiagnostic, Result};
use protocol_signer::{
    adapters::desktop::{open_certificate, UnsupportedDesktop},
    adapters::interaction::DirectorySaveTarget,
    adapters::registry::InMemorySignerRegistry,
    classify_cms, classify_container,
    domain::certificate,
    infra::config::{ConfigManager, ExportFormat},
    parse_query,
    services::ContainerSniffer,
    CryptoOperation, ParameterValidator,
};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Parser)]
#[command(name = "protocol-signer")]
#[command(about = "Signature-request orchestration for protocol-invoked signing")]
#[command(long_about = "
Protocol Signer - inspect and validate signature requests

EXAMPLES:
    # Validate a protocol URI and show the typed request
    protocol-signer parse 'afirma://sign?cop=sign&format=AUTO&algorithm=SHA256withRSA'

    # Show the format AUTO would resolve to
    protocol-signer sniff contract.pdf

    # Tell plain CMS from CAdES
    protocol-signer classify signature.p7s

    # Inspect a signing certificate and hand it to the desktop viewer
    protocol-signer cert signer.cer --open

ENVIRONMENT VARIABLES:
    RUST_LOG        Logging level (debug, info, warn, error)
")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode and validate a protocol URI or query string
    Parse {
        /// `afirma://sign?...` URI or bare query string
        #[arg(value_name = "URI")]
        uri: String,
    },

    /// Show the container classification and the format AUTO resolves to
    Sniff {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Operation the data would be used for
        #[arg(short, long, value_enum, default_value = "sign")]
        operation: OperationArg,
    },

    /// Classify a signature as plain CMS, CAdES or neither
    Classify {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show a DER certificate's subject, fingerprint and validity
    Cert {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Open the certificate with the desktop viewer
        #[arg(long)]
        open: bool,

        /// Where the certificate is saved when the desktop cannot open it
        #[arg(long, value_name = "DIR", default_value = ".")]
        save_dir: PathBuf,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Create default configuration file
    Init,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Export configuration
    Export {
        /// Export format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ExportFormat,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import configuration
    Import {
        /// Configuration file to import
        file: PathBuf,
        /// Import format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ExportFormat,
    },
}

#[derive(ValueEnum, Clone, Copy)]
enum OperationArg {
    Sign,
    Cosign,
    Countersign,
}

impl From<OperationArg> for CryptoOperation {
    fn from(arg: OperationArg) -> Self {
        match arg {
            OperationArg::Sign => CryptoOperation::Sign,
            OperationArg::Cosign => CryptoOperation::Cosign,
            OperationArg::Countersign => CryptoOperation::Countersign,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { uri } => handle_parse_command(&uri)?,
        Commands::Sniff { file, operation } => handle_sniff_command(&file, operation.into())?,
        Commands::Classify { file } => handle_classify_command(&file)?,
        Commands::Cert {
            file,
            open,
            save_dir,
        } => handle_cert_command(&file, open, &save_dir)?,
        Commands::Config(config_cmd) => handle_config_command(config_cmd)?,
    }

    Ok(())
}

fn handle_parse_command(uri: &str) -> Result<()> {
    let config = ConfigManager::new().load().unwrap_or_default();
    let params = parse_query(uri)?;
    let report = ParameterValidator::new(&config).validate(&params);

    if !report.unrecognized.is_empty() {
        println!("Unrecognized parameters:");
        for (key, value) in &report.unrecognized {
            println!("  {key} = {value}");
        }
    }

    match report.outcome {
        Ok(request) => {
            let json = serde_json::to_string_pretty(&request)
                .into_diagnostic()
                .context("failed to render the request")?;
            println!("{json}");
            Ok(())
        }
        Err(e) => {
            println!("Rejected with code {}", e.code());
            Err(e.into())
        }
    }
}

fn handle_sniff_command(file: &Path, operation: CryptoOperation) -> Result<()> {
    let data = read_input(file)?;
    println!("Container: {}", classify_container(&data));

    // The CLI has no signer engines, so multisign input falls back to CMS detection.
    let registry = InMemorySignerRegistry::new();
    match ContainerSniffer::new(&registry).sniff(&data, operation) {
        Ok(format) => println!("Format for {operation}: {format}"),
        Err(e) => println!("Format for {operation}: none ({e})"),
    }
    Ok(())
}

fn handle_classify_command(file: &Path) -> Result<()> {
    let data = read_input(file)?;
    println!("{}", classify_cms(&data));
    Ok(())
}

fn handle_cert_command(file: &Path, open: bool, save_dir: &Path) -> Result<()> {
    let der = read_input(file)?;
    let cert = certificate::decode_der(&der)?;
    println!("Subject: {}", certificate::subject_name(&cert));
    println!("SHA-256: {}", certificate::fingerprint(&der));
    if certificate::is_expired(&cert, SystemTime::now()) {
        println!("Status: expired or not yet valid");
    } else {
        println!("Status: valid");
    }

    if open {
        let save_target = DirectorySaveTarget::new(save_dir);
        open_certificate(&der, &UnsupportedDesktop, &save_target)
            .into_diagnostic()
            .context("failed to open the certificate")?;
    }
    Ok(())
}

fn read_input(file: &Path) -> Result<Vec<u8>> {
    std::fs::read(file)
        .into_diagnostic()
        .with_context(|| format!("failed to read {}", file.display()))
}

fn handle_config_command(config_cmd: ConfigCommands) -> Result<()> {
    let config_manager = ConfigManager::new();

    match config_cmd {
        ConfigCommands::Show => match config_manager.load() {
            Ok(config) => {
                println!("Current Configuration:");
                println!("  Max protocol version: {}", config.max_protocol_version);
                println!("  Client version: {}", config.client_version);
                println!("  Default keystore: {}", config.default_keystore);
                println!("  Check signatures: {}", config.check_signatures);
                println!(
                    "  Allow local storage URLs: {}",
                    config.allow_local_storage_urls
                );
                println!("  Log level: {}", config.log_level);
                println!(
                    "  Configuration file: {}",
                    config_manager.config_path().display()
                );
            }
            Err(_) => {
                println!("No configuration file found. Use 'config init' to create one.");
            }
        },

        ConfigCommands::Init => {
            config_manager.load_or_create_default()?;
            println!(
                "Configuration initialized: {}",
                config_manager.config_path().display()
            );
        }

        ConfigCommands::Set { key, value } => {
            config_manager.update_value(&key, &value)?;
            println!("Configuration updated: {key} = {value}");
        }

        ConfigCommands::Export { format, output } => {
            let content = config_manager.export_config(format)?;

            if let Some(output_path) = output {
                std::fs::write(&output_path, content).into_diagnostic()?;
                println!("Configuration exported to: {}", output_path.display());
            } else {
                println!("{content}");
            }
        }

        ConfigCommands::Import { file, format } => {
            let content = std::fs::read_to_string(&file).into_diagnostic()?;
            config_manager.import_config(&content, format)?;
            println!("Configuration imported from: {}", file.display());
        }
    }

    Ok(())
}
