//! CLI structure and command definitions

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

pub mod resources;

pub use resources::*;

/// Manage Bonsai search clusters from the command line
#[derive(Parser, Debug)]
#[command(name = "bonsaictl")]
#[command(version, about = "Bonsai cluster provisioning CLI")]
#[command(long_about = "
Bonsai cluster provisioning CLI

EXAMPLES:
    # Save credentials once
    bonsaictl profile set production --api-key KEY --default

    # List clusters as a table
    bonsaictl cluster list

    # Provision a cluster and print the full response as JSON
    bonsaictl cluster create --name logs --plan sandbox-aws-us-east-1 -o json

    # Inspect the catalog
    bonsaictl plan list
    bonsaictl space get omc/bonsai/us-east-1/common

Credentials come from BONSAI_API_KEY and BONSAI_API_TOKEN when both are set,
otherwise from the selected profile.
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "BONSAI_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file (environment credentials are ignored)
    #[arg(long, global = true, env = "BONSAI_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Enable verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cluster provisioning and inspection
    #[command(subcommand, visible_alias = "clusters")]
    Cluster(ClusterCommands),

    /// Subscription plans
    #[command(subcommand, visible_alias = "plans")]
    Plan(PlanCommands),

    /// Search engine releases
    #[command(subcommand, visible_alias = "releases")]
    Release(ReleaseCommands),

    /// Deployment spaces
    #[command(subcommand, visible_alias = "spaces")]
    Space(SpaceCommands),

    /// Profile management
    #[command(subcommand, visible_alias = "prof")]
    Profile(ProfileCommands),

    /// Show version information
    #[command(visible_alias = "ver")]
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a profile (the default profile when no name is given)
    #[command(visible_alias = "get")]
    Show {
        /// Profile name to show
        name: Option<String>,
    },

    /// Set or create a profile
    #[command(visible_alias = "add")]
    #[command(after_help = "EXAMPLES:
    # Create a profile (the token is prompted for)
    bonsaictl profile set production --api-key KEY --default

    # Point a profile at another endpoint
    bonsaictl profile set staging --api-key KEY --api-token TOKEN \\
        --api-url https://staging-api.example.com
")]
    Set {
        /// Profile name
        name: String,

        /// Access key
        #[arg(long)]
        api_key: String,

        /// Access token (prompted for when omitted)
        #[arg(long)]
        api_token: Option<String>,

        /// API endpoint
        #[arg(long, default_value = bonsai_api::BASE_ENDPOINT)]
        api_url: String,

        /// Make this the default profile
        #[arg(long)]
        default: bool,

        /// Store the token in the OS keyring (requires the secure-storage feature)
        #[arg(long)]
        use_keyring: bool,
    },

    /// Remove a profile
    #[command(visible_alias = "rm")]
    Remove {
        /// Profile name
        name: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}
