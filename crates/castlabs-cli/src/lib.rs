use anyhow::Context;
use castlabs_api_client::StatusQuery;
use castlabs_core::constants::DEFAULT_GROUP;
use castlabs_core::{ErrorMetadata, LogLevel, PlatformError};
use serde::Serialize;
use serde_json::{json, Value};

/// Initialize tracing for the CLI.
///
/// Logs go to stderr so stdout stays parseable JSON. `RUST_LOG` overrides the
/// default `info` filter; `json` switches to JSON log lines.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Build a status selector from command-line arguments.
pub fn status_query(
    remote_path: Option<String>,
    encode_name: Option<String>,
    group_name: Option<String>,
) -> anyhow::Result<StatusQuery> {
    if remote_path.is_none() && encode_name.is_none() {
        anyhow::bail!("Pass a remote path or --name");
    }
    Ok(StatusQuery {
        remote_path,
        group_name: group_name.unwrap_or_else(|| DEFAULT_GROUP.to_string()),
        encode_name,
    })
}

/// Machine-readable summary of a failed command
pub fn error_report(err: &anyhow::Error) -> Value {
    match err.downcast_ref::<PlatformError>() {
        Some(platform_error) => json!({
            "error": format!("{:#}", err),
            "code": platform_error.error_code(),
            "recoverable": platform_error.is_recoverable(),
        }),
        None => json!({ "error": format!("{:#}", err) }),
    }
}

/// Log a failed command at the level its error calls for.
pub fn log_error(err: &anyhow::Error) {
    let Some(platform_error) = err.downcast_ref::<PlatformError>() else {
        tracing::error!(error = %format!("{:#}", err), "Command failed");
        return;
    };

    let code = platform_error.error_code();
    let recoverable = platform_error.is_recoverable();
    match platform_error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %format!("{:#}", err), code, recoverable, "Command failed")
        }
        LogLevel::Warn => {
            tracing::warn!(error = %format!("{:#}", err), code, recoverable, "Command failed")
        }
        LogLevel::Error => {
            tracing::error!(error = %format!("{:#}", err), code, recoverable, "Command failed")
        }
    }
}
