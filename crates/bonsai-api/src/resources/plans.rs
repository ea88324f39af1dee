//! Plans API (`/plans`)

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::Result;
use crate::pagination::ListOpts;
use crate::response::Response;

use super::{Release, Space, collect_all, get_json, list_path, segment};

const BASE_PATH: &str = "/plans";

/// A subscription plan clusters can be provisioned on.
///
/// The API lists a plan's releases and spaces by slug and path only; those
/// are exposed here as [`Release`] and [`Space`] values with just that
/// field set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PlanWire", into = "PlanWire")]
pub struct Plan {
    pub slug: String,
    pub name: String,
    pub price_in_cents: i64,
    pub billing_interval_in_months: i32,
    pub single_tenant: Option<bool>,
    pub private_network: Option<bool>,
    pub available_releases: Vec<Release>,
    pub available_spaces: Vec<Space>,
    pub uri: String,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct PlanWire {
    slug: String,
    name: String,
    price_in_cents: i64,
    billing_interval_in_months: i32,
    single_tenant: Option<bool>,
    private_network: Option<bool>,
    available_releases: Vec<String>,
    available_spaces: Vec<String>,
    uri: String,
}

impl From<PlanWire> for Plan {
    fn from(wire: PlanWire) -> Self {
        Plan {
            slug: wire.slug,
            name: wire.name,
            price_in_cents: wire.price_in_cents,
            billing_interval_in_months: wire.billing_interval_in_months,
            single_tenant: wire.single_tenant,
            private_network: wire.private_network,
            available_releases: wire
                .available_releases
                .into_iter()
                .map(Release::from_slug)
                .collect(),
            available_spaces: wire
                .available_spaces
                .into_iter()
                .map(Space::from_path)
                .collect(),
            uri: wire.uri,
        }
    }
}

impl From<Plan> for PlanWire {
    fn from(plan: Plan) -> Self {
        PlanWire {
            slug: plan.slug,
            name: plan.name,
            price_in_cents: plan.price_in_cents,
            billing_interval_in_months: plan.billing_interval_in_months,
            single_tenant: plan.single_tenant,
            private_network: plan.private_network,
            available_releases: plan.available_releases.into_iter().map(|r| r.slug).collect(),
            available_spaces: plan.available_spaces.into_iter().map(|s| s.path).collect(),
            uri: plan.uri,
        }
    }
}

#[derive(Deserialize)]
struct PlanList {
    #[serde(default)]
    plans: Vec<Plan>,
}

/// Client for the `/plans` endpoints.
#[derive(Debug, Clone, Copy)]
pub struct PlanClient<'c> {
    client: &'c Client,
}

impl<'c> PlanClient<'c> {
    pub(crate) fn new(client: &'c Client) -> Self {
        Self { client }
    }

    pub async fn list(&self, opts: ListOpts) -> Result<(Vec<Plan>, Response)> {
        let path = list_path(BASE_PATH, &opts)?;
        let (page, response): (PlanList, _) = get_json(self.client, "list plans", &path).await?;
        Ok((page.plans, response))
    }

    pub async fn all(&self) -> Result<Vec<Plan>> {
        collect_all(self.client, move |opts| self.list(opts)).await
    }

    pub async fn get(&self, slug: &str) -> Result<Plan> {
        let path = format!("{BASE_PATH}/{}", segment(slug));
        let (plan, _) = get_json(self.client, "get plan", &path).await?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_expands_release_and_space_references() {
        let plan: Plan = serde_json::from_str(
            r#"{
                "slug": "sandbox-aws-us-east-1",
                "name": "Sandbox",
                "price_in_cents": 0,
                "billing_interval_in_months": 1,
                "single_tenant": false,
                "private_network": false,
                "available_releases": ["elasticsearch-7.2.0"],
                "available_spaces": ["omc/bonsai/us-east-1/common", "omc/bonsai/eu-west-1/common"],
                "uri": "https://api.bonsai.io/plans/sandbox-aws-us-east-1"
            }"#,
        )
        .unwrap();

        assert_eq!(plan.billing_interval_in_months, 1);
        assert_eq!(plan.single_tenant, Some(false));
        assert_eq!(
            plan.available_releases,
            vec![Release::from_slug("elasticsearch-7.2.0")]
        );
        assert_eq!(plan.available_spaces.len(), 2);
        assert_eq!(plan.available_spaces[1].path, "omc/bonsai/eu-west-1/common");
    }

    #[test]
    fn test_plan_serializes_in_wire_shape() {
        let plan = Plan {
            slug: "standard-sm".into(),
            available_releases: vec![Release::from_slug("elasticsearch-7.2.0")],
            ..Default::default()
        };

        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["available_releases"], serde_json::json!(["elasticsearch-7.2.0"]));

        let back: Plan = serde_json::from_value(value).unwrap();
        assert_eq!(back, plan);
    }

    #[test]
    fn test_plan_reference_without_lists() {
        let plan: Plan = serde_json::from_str(r#"{"slug": "standard-sm"}"#).unwrap();
        assert_eq!(plan.slug, "standard-sm");
        assert!(plan.available_releases.is_empty());
        assert_eq!(plan.single_tenant, None);
    }
}
