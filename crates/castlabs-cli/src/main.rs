//! castlabs CLI: upload source media to the Content Platform, encode it and follow
//! the encoding.
//!
//! Set ORGANIZATION_URN, USER_URN, API_ACCESS_KEY_ID and API_SECRET_ACCESS_KEY
//! (a `.env` file is read if present).

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use castlabs_api_client::{ContentPlatform, EncodeRequest};
use castlabs_cli::{error_report, init_tracing, log_error, print_json, status_query};
use castlabs_core::constants::{DEFAULT_FORMAT_SPECIFIC_DATA, DEFAULT_GROUP, DEFAULT_TEMPLATE};
use castlabs_core::PlatformConfig;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "castlabs", about = "castLabs Content Platform CLI")]
struct Cli {
    /// Write uploads below this directory instead of the storage bucket
    #[arg(long, global = true, env = "CASTLABS_LOCAL_UPLOAD_DIR")]
    local_dir: Option<PathBuf>,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a local file
    Upload {
        file: PathBuf,
        /// Remote folder; defaults to the file name with `.` replaced by `_`
        #[arg(long)]
        remote_path: Option<String>,
    },
    /// Print a shareable upload URL for a remote folder
    UploadUrl { remote_path: String },
    /// Print presigned POST credentials for a remote folder
    Credentials { remote_path: String },
    /// List the contents of a remote folder
    Ls { remote_path: String },
    /// Encode the files of a remote folder
    Encode {
        remote_path: String,
        #[arg(long, default_value = DEFAULT_GROUP)]
        group: String,
        /// Encode name; defaults to the last segment of the remote path
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = DEFAULT_TEMPLATE)]
        template: String,
        /// Extra workflow parameters as JSON
        #[arg(long, default_value = DEFAULT_FORMAT_SPECIFIC_DATA)]
        format_data: String,
        /// Notified when encoding and publishing finish
        #[arg(long)]
        webhook_url: Option<String>,
    },
    /// Show the status of an encoding
    Status(Selector),
    /// Wait until an encoding is complete
    Wait {
        #[command(flatten)]
        selector: Selector,
        /// Seconds between status checks
        #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
        /// Seconds before giving up
        #[arg(long, default_value = "3600")]
        timeout: u64,
    },
    /// List encoding groups
    Groups,
}

#[derive(Args)]
struct Selector {
    remote_path: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    group: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log_error(&err);
            eprintln!("{}", error_report(&err));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = PlatformConfig::from_env().context(
        "Failed to load configuration. Set ORGANIZATION_URN, USER_URN, API_ACCESS_KEY_ID and API_SECRET_ACCESS_KEY",
    )?;
    let mut platform = ContentPlatform::connect(config)
        .await
        .context("Failed to authenticate with the Content Platform")?;
    if let Some(dir) = cli.local_dir {
        platform = platform.with_local_upload_dir(dir);
    }

    match cli.command {
        Commands::Upload { file, remote_path } => {
            let remote_path = platform
                .upload_file(&file, remote_path.as_deref())
                .await
                .with_context(|| format!("Failed to upload {}", file.display()))?;
            print_json(&serde_json::json!({ "remote_path": remote_path }))?;
        }
        Commands::UploadUrl { remote_path } => {
            let url = platform.upload_url(&remote_path).await?;
            print_json(&serde_json::json!({ "upload_url": url }))?;
        }
        Commands::Credentials { remote_path } => {
            let credentials = platform.upload_credentials(&remote_path).await?;
            print_json(&credentials)?;
        }
        Commands::Ls { remote_path } => {
            let names = platform.list_files(&remote_path).await?;
            print_json(&names)?;
        }
        Commands::Encode {
            remote_path,
            group,
            name,
            template,
            format_data,
            webhook_url,
        } => {
            let request = EncodeRequest {
                group_name: group,
                encode_name: name,
                template,
                format_specific_data: format_data,
                webhook_url,
            };
            let encoding = platform
                .start_encoding(&remote_path, &request)
                .await
                .with_context(|| format!("Failed to start encoding of {}", remote_path))?;
            print_json(&encoding)?;
        }
        Commands::Status(selector) => {
            let query = status_query(selector.remote_path, selector.name, selector.group)?;
            let encoding = platform.status(&query).await?;
            print_json(&encoding)?;
        }
        Commands::Wait {
            selector,
            interval,
            timeout,
        } => {
            let query = status_query(selector.remote_path, selector.name, selector.group)?;
            let encoding = platform
                .wait_for_completion(
                    &query,
                    Duration::from_secs(interval),
                    Duration::from_secs(timeout),
                )
                .await?;
            print_json(&encoding)?;
        }
        Commands::Groups => {
            let groups = platform.groups().await?;
            print_json(&groups)?;
        }
    }

    Ok(())
}
