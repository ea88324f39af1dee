//! Plan, release and space lookups

use bonsai_api::{Plan, Release, Space};
use serde_json::{Value, json};

use crate::cli::{PlanCommands, ReleaseCommands, SpaceCommands};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::{self, OutputFormat};

pub async fn handle_plan_command(
    cmd: &PlanCommands,
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let client = conn_mgr.create_client(profile)?;
    match cmd {
        PlanCommands::List => {
            let plans = client.plans().all().await?;
            output::print_list(&plans, output_format, plan_row)?;
        }
        PlanCommands::Get { slug } => {
            let plan = client.plans().get(slug).await?;
            output::print_item(&plan, output_format, plan_row)?;
        }
    }
    Ok(())
}

pub async fn handle_release_command(
    cmd: &ReleaseCommands,
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let client = conn_mgr.create_client(profile)?;
    match cmd {
        ReleaseCommands::List => {
            let releases = client.releases().all().await?;
            output::print_list(&releases, output_format, release_row)?;
        }
        ReleaseCommands::Get { slug } => {
            let release = client.releases().get(slug).await?;
            output::print_item(&release, output_format, release_row)?;
        }
    }
    Ok(())
}

pub async fn handle_space_command(
    cmd: &SpaceCommands,
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let client = conn_mgr.create_client(profile)?;
    match cmd {
        SpaceCommands::List => {
            let spaces = client.spaces().all().await?;
            output::print_list(&spaces, output_format, space_row)?;
        }
        SpaceCommands::Get { path } => {
            let space = client.spaces().get(path).await?;
            output::print_item(&space, output_format, space_row)?;
        }
    }
    Ok(())
}

fn plan_row(plan: &Plan) -> Value {
    json!({
        "slug": plan.slug,
        "name": plan.name,
        "price": format!("${:.2}", plan.price_in_cents as f64 / 100.0),
        "billing_months": plan.billing_interval_in_months,
        "single_tenant": plan.single_tenant.unwrap_or(false),
        "releases": plan.available_releases.iter().map(|r| r.slug.as_str()).collect::<Vec<_>>(),
    })
}

fn release_row(release: &Release) -> Value {
    json!({
        "slug": release.slug,
        "service_type": release.service_type,
        "version": release.version,
        "multitenant": release.multi_tenant,
    })
}

fn space_row(space: &Space) -> Value {
    json!({
        "path": space.path,
        "provider": space.cloud.provider,
        "region": space.cloud.region,
        "private_network": space.private_network,
    })
}
