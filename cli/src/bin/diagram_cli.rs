use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use diagram::Analyzer;
use diagram_cli::{config_schema, emit_result, load_config};
use diagram_server::ServerConfig;
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a diagram image and print the result as JSON
    Analyze {
        /// Path to the diagram image (png, jpg)
        #[arg(short, long)]
        image: PathBuf,
        /// Analyzer configuration (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the JSON result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Serve the analyzer over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:5000")]
        bind: String,
        /// Directory for uploaded diagrams
        #[arg(long, default_value = "uploads")]
        upload_dir: PathBuf,
        /// Analyzer configuration (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Keep uploads on disk after analysis
        #[arg(long)]
        keep_uploads: bool,
    },
    /// Print the JSON schema of the analyzer configuration
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { image, config, output } => {
            let analyzer = Analyzer::from_config(&load_config(config.as_deref())?)?;
            let result = tokio::task::spawn_blocking(move || analyzer.analyze(&image)).await??;

            if let Some(json) = emit_result(&result, output.as_deref())? {
                println!("{json}");
            } else if let Some(path) = &output {
                info!("Result saved to: {:?}", path);
            }
        }
        Commands::Serve { bind, upload_dir, config, keep_uploads } => {
            let analyzer = Analyzer::from_config(&load_config(config.as_deref())?)?;
            let server_config = ServerConfig {
                bind_addr: bind,
                upload_dir,
                keep_uploads,
                ..Default::default()
            };
            diagram_server::serve(server_config, analyzer).await?;
        }
        Commands::Schema => {
            println!("{}", config_schema()?);
        }
    }

    Ok(())
}
