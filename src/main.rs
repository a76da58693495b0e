use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

mod config;
mod error;
mod services;

use config::AppConfig;
use error::AppError;

#[derive(Parser)]
#[command(name = "treeshare", about = "Share a photo tree through a single link")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "treeshare.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload photos and print a share link
    Share {
        /// Photos to place on the tree, in display order
        photos: Vec<PathBuf>,
        /// Copy the finished link to the clipboard
        #[arg(long)]
        copy: bool,
    },
    /// Print the photo URLs contained in a share link
    Open {
        /// Share link or bare token
        link: String,
    },
}

async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Commands::Share { photos, copy } => {
            let config = AppConfig::load(&cli.config)?;
            let interactive = std::io::stdin().is_terminal();
            let link = services::run_share(&config, &photos, interactive).await?;

            println!("{}", link);
            if copy {
                match services::copy_to_clipboard(link.as_str()) {
                    Ok(()) => eprintln!("Link copied to clipboard"),
                    Err(e) => {
                        log::warn!("{}", e);
                        eprintln!("{}", e.user_message());
                    }
                }
            }
        }
        Commands::Open { link } => {
            for url in services::open_link(&link)? {
                println!("{}", url);
            }
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
