//! Clusters API (`/clusters`)
//!
//! Listing, inspecting and provisioning search clusters. Cluster creation is
//! additionally throttled by the provisioning rate limiter.

use std::fmt;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::pagination::ListOpts;
use crate::response::Response;
use crate::transport::HttpRequest;

use super::{Plan, Release, Space, collect_all, get_json, segment, with_query};

const BASE_PATH: &str = "/clusters";

/// Usage statistics reported for a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterStats {
    pub docs: i64,
    pub shards_used: i64,
    pub data_bytes_used: i64,
}

/// Connection details for a cluster.
///
/// `user`, `pass` and `url` are only returned once, in the creation result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterAccess {
    pub host: String,
    pub port: u16,
    pub scheme: String,
    #[serde(rename = "user", skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(rename = "pass", skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
}

/// What a cluster is doing right now.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClusterState {
    Deprovisioned,
    Deprovisioning,
    Disabled,
    Maintenance,
    Provisioned,
    Provisioning,
    ReadOnly,
    UpdatingPlan,
    /// A state this client does not know about yet.
    Unknown(String),
}

impl ClusterState {
    pub fn as_str(&self) -> &str {
        match self {
            ClusterState::Deprovisioned => "DEPROVISIONED",
            ClusterState::Deprovisioning => "DEPROVISIONING",
            ClusterState::Disabled => "DISABLED",
            ClusterState::Maintenance => "MAINTENANCE",
            ClusterState::Provisioned => "PROVISIONED",
            ClusterState::Provisioning => "PROVISIONING",
            ClusterState::ReadOnly => "READONLY",
            ClusterState::UpdatingPlan => "UPDATING PLAN",
            ClusterState::Unknown(other) => other,
        }
    }
}

impl Default for ClusterState {
    fn default() -> Self {
        ClusterState::Unknown(String::new())
    }
}

impl From<String> for ClusterState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "DEPROVISIONED" => ClusterState::Deprovisioned,
            "DEPROVISIONING" => ClusterState::Deprovisioning,
            "DISABLED" => ClusterState::Disabled,
            "MAINTENANCE" => ClusterState::Maintenance,
            "PROVISIONED" => ClusterState::Provisioned,
            "PROVISIONING" => ClusterState::Provisioning,
            "READONLY" => ClusterState::ReadOnly,
            "UPDATING PLAN" => ClusterState::UpdatingPlan,
            _ => ClusterState::Unknown(raw),
        }
    }
}

impl From<ClusterState> for String {
    fn from(state: ClusterState) -> Self {
        match state {
            ClusterState::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A search cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cluster {
    /// Machine-readable name: the creation name plus a random suffix.
    pub slug: String,
    pub name: String,
    pub uri: String,
    pub plan: Plan,
    pub release: Release,
    pub space: Space,
    pub stats: ClusterStats,
    pub access: ClusterAccess,
    pub state: ClusterState,
}

/// Result of `POST /clusters`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterCreateResult {
    pub message: String,
    /// Overview page for the new cluster.
    pub monitor: String,
    pub access: ClusterAccess,
}

/// Result of `PUT /clusters/{slug}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterUpdateResult {
    pub message: String,
    pub monitor: String,
}

/// Result of `DELETE /clusters/{slug}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterDestroyResult {
    pub message: String,
    pub monitor: String,
}

/// Filters for cluster listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusterAllOpts {
    /// Matches against cluster names.
    #[serde(rename = "q", skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// `parent` or `child`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenancy: Option<String>,
    /// Account, region, space or cluster path prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ClusterAllOpts {
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn tenancy(mut self, tenancy: impl Into<String>) -> Self {
        self.tenancy = Some(tenancy.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// One page of a filtered cluster listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterListOpts {
    pub list: ListOpts,
    pub filter: ClusterAllOpts,
}

impl ClusterListOpts {
    fn to_query(&self) -> Result<String> {
        let paging = self.list.to_query()?;
        let filter = serde_urlencoded::to_string(&self.filter)?;
        Ok(match (paging.is_empty(), filter.is_empty()) {
            (true, _) => filter,
            (false, true) => paging,
            (false, false) => format!("{paging}&{filter}"),
        })
    }
}

/// Body of `POST /clusters`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusterCreateOpts {
    pub name: String,
    /// Plan slug; see [`PlanClient::all`](super::PlanClient::all).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    /// Space path; see [`SpaceClient::all`](super::SpaceClient::all).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space: Option<String>,
    /// Release slug; see [`ReleaseClient::all`](super::ReleaseClient::all).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
}

impl ClusterCreateOpts {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn plan(mut self, plan: impl Into<String>) -> Self {
        self.plan = Some(plan.into());
        self
    }

    pub fn space(mut self, space: impl Into<String>) -> Self {
        self.space = Some(space.into());
        self
    }

    pub fn release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_name(&self.name)
    }
}

/// Body of `PUT /clusters/{slug}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusterUpdateOpts {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
}

impl ClusterUpdateOpts {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plan: None,
        }
    }

    pub fn plan(mut self, plan: impl Into<String>) -> Self {
        self.plan = Some(plan.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_name(&self.name)
    }
}

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("name can't be empty".to_string()));
    }
    Ok(())
}

#[derive(Deserialize)]
struct ClusterList {
    #[serde(default)]
    clusters: Vec<Cluster>,
}

#[derive(Deserialize)]
struct ClusterEnvelope {
    cluster: Cluster,
}

/// Client for the `/clusters` endpoints.
#[derive(Debug, Clone, Copy)]
pub struct ClusterClient<'c> {
    client: &'c Client,
}

impl<'c> ClusterClient<'c> {
    pub(crate) fn new(client: &'c Client) -> Self {
        Self { client }
    }

    /// Execute a request, holding `POST`s to the provisioning limit as well.
    pub async fn execute(&self, request: HttpRequest) -> Result<Response> {
        if request.method == Method::POST {
            self.client
                .rate_limiter()
                .provision
                .wait(self.client.cancellation())
                .await?;
        }
        self.client.execute(request).await
    }

    /// Fetch one page of clusters.
    pub async fn list(&self, opts: &ClusterListOpts) -> Result<(Vec<Cluster>, Response)> {
        let path = with_query(BASE_PATH, &opts.to_query()?);
        let (page, response): (ClusterList, _) =
            get_json(self.client, "list clusters", &path).await?;
        Ok((page.clusters, response))
    }

    /// Every cluster matching `filter`, across all pages.
    pub async fn all(&self, filter: ClusterAllOpts) -> Result<Vec<Cluster>> {
        let clusters = collect_all(self.client, move |list| {
            let opts = ClusterListOpts {
                list,
                filter: filter.clone(),
            };
            async move { self.list(&opts).await }
        })
        .await?;
        debug!(count = clusters.len(), "Listed clusters");
        Ok(clusters)
    }

    pub async fn get(&self, slug: &str) -> Result<Cluster> {
        let path = format!("{BASE_PATH}/{}", segment(slug));
        let (envelope, _): (ClusterEnvelope, _) =
            get_json(self.client, "get cluster", &path).await?;
        Ok(envelope.cluster)
    }

    /// Provision a new cluster. Fails before any request when `name` is empty.
    pub async fn create(&self, opts: &ClusterCreateOpts) -> Result<ClusterCreateResult> {
        opts.validate()?;
        let result: ClusterCreateResult = self
            .send_json(Method::POST, BASE_PATH, Some(opts), "create cluster")
            .await?;
        info!(name = %opts.name, monitor = %result.monitor, "Cluster creation requested");
        Ok(result)
    }

    pub async fn update(
        &self,
        slug: &str,
        opts: &ClusterUpdateOpts,
    ) -> Result<ClusterUpdateResult> {
        opts.validate()?;
        let path = format!("{BASE_PATH}/{}", segment(slug));
        self.send_json(Method::PUT, &path, Some(opts), "update cluster")
            .await
    }

    pub async fn destroy(&self, slug: &str) -> Result<ClusterDestroyResult> {
        let path = format!("{BASE_PATH}/{}", segment(slug));
        self.send_json::<(), _>(Method::DELETE, &path, None, "destroy cluster")
            .await
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        operation: &str,
    ) -> Result<T>
    where
        B: Serialize,
        T: serde::de::DeserializeOwned,
    {
        let request = match body {
            Some(body) => self.client.new_json_request(method, path, body),
            None => self.client.new_request(method, path, None),
        }
        .map_err(|e| e.with_context(operation, path))?;
        let url = request.url.to_string();

        let response = self
            .execute(request)
            .await
            .map_err(|e| e.with_context(operation, &url))?;
        response
            .json(operation)
            .map_err(|e| e.with_context(operation, &url))
    }
}
