//! Cluster command implementations

use bonsai_api::{Cluster, ClusterAllOpts, ClusterCreateOpts, ClusterUpdateOpts};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::cli::ClusterCommands;
use crate::commands::confirm;
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::{self, OutputFormat};

pub async fn handle_cluster_command(
    cmd: &ClusterCommands,
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    use ClusterCommands::*;

    let client = conn_mgr.create_client(profile)?;
    let clusters = client.clusters();

    match cmd {
        List {
            query,
            tenancy,
            location,
        } => {
            let filter = ClusterAllOpts {
                query: query.clone(),
                tenancy: tenancy.clone(),
                location: location.clone(),
            };
            debug!("Listing clusters with {:?}", filter);
            let all = clusters.all(filter).await?;
            info!("Found {} clusters", all.len());
            output::print_list(&all, output_format, summary_row)?;
        }
        Get { slug } => {
            let cluster = clusters.get(slug).await?;
            output::print_item(&cluster, output_format, detail)?;
        }
        Create {
            name,
            plan,
            space,
            release,
        } => {
            let mut opts = ClusterCreateOpts::new(name);
            opts.plan = plan.clone();
            opts.space = space.clone();
            opts.release = release.clone();

            let result = clusters.create(&opts).await?;
            info!("Cluster '{}' requested: {}", name, result.message);
            output::print_output(&result, output_format)?;
        }
        Update { slug, name, plan } => {
            let mut opts = ClusterUpdateOpts::new(name);
            opts.plan = plan.clone();

            let result = clusters.update(slug, &opts).await?;
            output::print_output(&result, output_format)?;
        }
        Destroy { slug, yes } => {
            let question = format!("Destroy cluster '{slug}'? This deletes all of its data.");
            if !yes && !confirm(&question)? {
                println!("Cluster destruction cancelled.");
                return Ok(());
            }
            let result = clusters.destroy(slug).await?;
            output::print_output(&result, output_format)?;
        }
    }

    Ok(())
}

fn summary_row(cluster: &Cluster) -> Value {
    json!({
        "slug": cluster.slug,
        "name": cluster.name,
        "state": cluster.state.to_string(),
        "plan": cluster.plan.slug,
        "region": cluster.space.region,
        "docs": cluster.stats.docs,
    })
}

fn detail(cluster: &Cluster) -> Value {
    json!({
        "slug": cluster.slug,
        "name": cluster.name,
        "state": cluster.state.to_string(),
        "uri": cluster.uri,
        "plan": cluster.plan.slug,
        "release": cluster.release.slug,
        "space": cluster.space.path,
        "region": cluster.space.region,
        "docs": cluster.stats.docs,
        "shards_used": cluster.stats.shards_used,
        "data_bytes_used": cluster.stats.data_bytes_used,
        "host": cluster.access.host,
        "port": cluster.access.port,
    })
}
