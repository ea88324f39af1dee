//! Resource command definitions

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum ClusterCommands {
    /// List clusters, following every page
    #[command(visible_alias = "ls")]
    List {
        /// Fuzzy match against cluster name
        #[arg(long, short)]
        query: Option<String>,

        /// Tenancy filter: parent or child
        #[arg(long)]
        tenancy: Option<String>,

        /// Account, region, space or cluster path prefix
        #[arg(long)]
        location: Option<String>,
    },

    /// Show one cluster
    Get {
        /// Cluster slug
        slug: String,
    },

    /// Provision a new cluster
    #[command(after_help = "EXAMPLES:
    bonsaictl cluster create --name logs
    bonsaictl cluster create --name logs --plan standard-sm \\
        --space omc/bonsai/us-east-1/common --release elasticsearch-7.2.0
")]
    Create {
        /// Cluster name
        #[arg(long)]
        name: String,

        /// Plan slug
        #[arg(long)]
        plan: Option<String>,

        /// Space path
        #[arg(long)]
        space: Option<String>,

        /// Release slug
        #[arg(long)]
        release: Option<String>,
    },

    /// Rename a cluster or move it to another plan
    Update {
        /// Cluster slug
        slug: String,

        /// New cluster name
        #[arg(long)]
        name: String,

        /// New plan slug
        #[arg(long)]
        plan: Option<String>,
    },

    /// Deprovision a cluster
    #[command(visible_alias = "rm")]
    Destroy {
        /// Cluster slug
        slug: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum PlanCommands {
    /// List plans available to the account
    #[command(visible_alias = "ls")]
    List,

    /// Show one plan
    Get {
        /// Plan slug
        slug: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReleaseCommands {
    /// List available releases
    #[command(visible_alias = "ls")]
    List,

    /// Show one release
    Get {
        /// Release slug
        slug: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SpaceCommands {
    /// List deployment spaces
    #[command(visible_alias = "ls")]
    List,

    /// Show one space
    Get {
        /// Space path, e.g. omc/bonsai/us-east-1/common
        path: String,
    },
}
