use anyhow::{Context, Result};
use bonsai_api::Cancellation;
use bonsai_config::Config;
use clap::Parser;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands};
use connection::ConnectionManager;
use error::BonsaiCtlError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Load configuration from specified path or default location
    let (config, config_path) = if let Some(config_file) = &cli.config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        let config = Config::load_from_path(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        (config, Some(path))
    } else {
        debug!("Loading config from default location");
        let config = Config::load().context("Failed to load config")?;
        (config, None)
    };

    let cancel = Cancellation::new();
    cancel_on_interrupt(cancel.clone());
    let conn_mgr =
        ConnectionManager::with_config_path(config, config_path).with_cancellation(cancel);

    if let Err(e) = execute_command(&cli, &conn_mgr).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    // RUST_LOG wins over the verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "bonsaictl=warn,bonsai_api=warn,bonsai_config=warn",
            1 => "bonsaictl=info,bonsai_api=info,bonsai_config=info",
            2 => "bonsaictl=debug,bonsai_api=debug,bonsai_config=debug",
            _ => "bonsaictl=trace,bonsai_api=trace,bonsai_config=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

/// Ctrl-C cancels in-flight requests, rate limiter waits and retry sleeps.
fn cancel_on_interrupt(cancel: Cancellation) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling outstanding requests");
            cancel.cancel();
        }
    });
}

async fn execute_command(
    cli: &Cli,
    conn_mgr: &ConnectionManager,
) -> Result<(), BonsaiCtlError> {
    trace!("Executing command: {:?}", format_command(&cli.command));
    info!("Command: {}", format_command(&cli.command));

    let profile = cli.profile.as_deref();
    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => print_version(cli.output),
        Commands::Profile(cmd) => {
            commands::profile::handle_profile_command(cmd, conn_mgr, cli.output).await
        }
        Commands::Cluster(cmd) => {
            commands::cluster::handle_cluster_command(cmd, conn_mgr, profile, cli.output).await
        }
        Commands::Plan(cmd) => {
            commands::catalog::handle_plan_command(cmd, conn_mgr, profile, cli.output).await
        }
        Commands::Release(cmd) => {
            commands::catalog::handle_release_command(cmd, conn_mgr, profile, cli.output).await
        }
        Commands::Space(cmd) => {
            commands::catalog::handle_space_command(cmd, conn_mgr, profile, cli.output).await
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

fn print_version(format: output::OutputFormat) -> Result<(), BonsaiCtlError> {
    if format.is_structured() {
        let data = serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "api_client": bonsai_api::USER_AGENT,
        });
        output::print_output(data, format)?;
    } else {
        println!("bonsaictl {}", env!("CARGO_PKG_VERSION"));
    }
    Ok(())
}

/// Command summary for logs, without credentials
fn format_command(command: &Commands) -> String {
    use cli::ProfileCommands;

    match command {
        Commands::Version => "version".to_string(),
        Commands::Profile(cmd) => match cmd {
            ProfileCommands::List => "profile list".to_string(),
            ProfileCommands::Path => "profile path".to_string(),
            ProfileCommands::Show { name } => format!("profile show {:?}", name),
            ProfileCommands::Set { name, .. } => {
                format!("profile set {} [credentials redacted]", name)
            }
            ProfileCommands::Remove { name, .. } => format!("profile remove {}", name),
        },
        Commands::Cluster(cmd) => format!("cluster {:?}", cmd),
        Commands::Plan(cmd) => format!("plan {:?}", cmd),
        Commands::Release(cmd) => format!("release {:?}", cmd),
        Commands::Space(cmd) => format!("space {:?}", cmd),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_format_command_redacts_credentials() {
        let cli = Cli::parse_from([
            "bonsaictl",
            "profile",
            "set",
            "prod",
            "--api-key",
            "secret-key",
            "--api-token",
            "secret-token",
        ]);
        let summary = format_command(&cli.command);
        assert!(!summary.contains("secret"));
        assert!(summary.contains("prod"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["bonsaictl", "cluster", "list", "-o", "json", "-vv"]);
        assert_eq!(cli.output, output::OutputFormat::Json);
        assert_eq!(cli.verbose, 2);
    }
}
