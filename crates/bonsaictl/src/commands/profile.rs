//! Profile management command implementations

use bonsai_config::{Config, CredentialStore, Profile};
use serde_json::{Value, json};
use tracing::{debug, trace, warn};

use crate::cli::ProfileCommands;
use crate::commands::confirm;
use crate::connection::ConnectionManager;
use crate::error::{BonsaiCtlError, Result as CliResult};
use crate::output::{self, OutputFormat};

pub async fn handle_profile_command(
    cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> CliResult<()> {
    use ProfileCommands::*;

    match cmd {
        List => handle_list(conn_mgr, output_format),
        Path => handle_path(conn_mgr, output_format),
        Show { name } => handle_show(conn_mgr, name.as_deref(), output_format),
        Set {
            name,
            api_key,
            api_token,
            api_url,
            default,
            use_keyring,
        } => handle_set(
            conn_mgr,
            name,
            api_key,
            api_token.as_deref(),
            api_url,
            *default,
            *use_keyring,
        ),
        Remove { name, yes } => handle_remove(conn_mgr, name, *yes),
    }
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let profiles = conn_mgr.config.list_profiles();
    trace!("Found {} profiles", profiles.len());

    if profiles.is_empty() && !output_format.is_structured() {
        println!("No profiles configured.");
        println!("Use 'bonsaictl profile set <name> --api-key <key>' to create one.");
        return Ok(());
    }

    let rows: Vec<Value> = profiles
        .iter()
        .map(|(name, profile)| summary(&conn_mgr.config, name, profile))
        .collect();
    output::print_output(rows, output_format)?;
    Ok(())
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let path = conn_mgr.config_file()?;
    if output_format.is_structured() {
        let data = json!({ "config_path": path.display().to_string() });
        output::print_output(data, output_format)?;
    } else {
        println!("{}", path.display());
    }
    Ok(())
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let config = &conn_mgr.config;
    let name = config.resolve_profile(name)?;
    let profile = config.profile(&name)?;

    let mut details = summary(config, &name, profile);
    let (burst, interval) = profile.rate_limit().default_limit();
    let (provision_burst, provision_interval) = profile.rate_limit().provision_limit();
    let token_storage = if CredentialStore::is_keyring_reference(&profile.api_token) {
        "keyring"
    } else {
        "plaintext"
    };
    details["token_storage"] = json!(token_storage);
    details["rate_limit"] = json!(format!("{burst} per {}s", interval.as_secs()));
    details["provision_rate_limit"] =
        json!(format!("{provision_burst} per {}s", provision_interval.as_secs()));

    output::print_output(details, output_format)?;
    Ok(())
}

fn handle_set(
    conn_mgr: &ConnectionManager,
    name: &str,
    api_key: &str,
    api_token: Option<&str>,
    api_url: &str,
    make_default: bool,
    use_keyring: bool,
) -> CliResult<()> {
    debug!("Setting profile: {}", name);

    if api_key.trim().is_empty() {
        return Err(BonsaiCtlError::invalid_input("--api-key can't be empty"));
    }

    let token = match api_token {
        Some(token) => token.to_string(),
        None => rpassword::prompt_password("API token: ")?,
    };

    let token = if use_keyring {
        CredentialStore::new().store(&format!("{name}-api-token"), &token)?
    } else {
        token
    };

    let mut config = conn_mgr.config.clone();
    let mut profile = Profile::new(api_key, token).with_api_url(api_url);
    // Keep hand-edited limits when credentials are rotated
    if let Some(existing) = config.profiles.get(name) {
        profile.rate_limit = existing.rate_limit.clone();
    }
    config.set_profile(name, profile);

    if make_default {
        config.set_default_profile(name)?;
    }

    conn_mgr.save_config(&config)?;

    println!("Profile '{}' saved.", name);
    if make_default {
        println!("Default profile set to '{}'.", name);
    }
    Ok(())
}

fn handle_remove(conn_mgr: &ConnectionManager, name: &str, yes: bool) -> CliResult<()> {
    debug!("Removing profile: {}", name);

    let mut config = conn_mgr.config.clone();
    config.profile(name)?;

    if !yes && !confirm(&format!("Remove profile '{name}'?"))? {
        println!("Profile removal cancelled.");
        return Ok(());
    }

    let was_default = config.default_profile.as_deref() == Some(name);
    if let Some(removed) = config.remove_profile(name)
        && let Err(e) = CredentialStore::new().forget(&removed.api_token)
    {
        warn!("Could not remove keyring entry for '{}': {}", name, e);
    }

    conn_mgr.save_config(&config)?;

    println!("Profile '{}' removed.", name);
    if was_default {
        println!("Default profile cleared.");
    }
    Ok(())
}

fn summary(config: &Config, name: &str, profile: &Profile) -> Value {
    json!({
        "name": name,
        "api_key": profile.api_key_preview(),
        "api_url": profile.api_url,
        "default": config.default_profile.as_deref() == Some(name),
    })
}
