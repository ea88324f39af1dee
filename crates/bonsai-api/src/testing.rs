//! Mock Bonsai API server for downstream tests.
//!
//! Enabled with the `test-support` feature.
//!
//! ```rust,ignore
//! use bonsai_api::testing::{ClusterFixture, MockBonsaiServer};
//!
//! let server = MockBonsaiServer::start().await;
//! server
//!     .mock_clusters_list(vec![ClusterFixture::new("logs-1234", "logs").build()])
//!     .await;
//!
//! let clusters = server.client().clusters().all(Default::default()).await?;
//! ```

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::Client;
use crate::credential::CredentialPair;

pub const TEST_ACCESS_KEY: &str = "test-key";
pub const TEST_ACCESS_TOKEN: &str = "test-token";

/// A wiremock server answering like the Bonsai API.
pub struct MockBonsaiServer {
    server: MockServer,
}

impl MockBonsaiServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    /// Client pointed at this server with the test credentials.
    pub fn client(&self) -> Client {
        let credentials = CredentialPair::from_raw(TEST_ACCESS_KEY, TEST_ACCESS_TOKEN)
            .expect("test credentials are valid header values");
        Client::builder()
            .endpoint(self.uri())
            .credentials(credentials)
            .build()
            .expect("mock server URI is a valid endpoint")
    }

    /// Every request the server has received so far.
    pub async fn received_requests(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    async fn mount_json(&self, http_method: &str, route: &str, status: u16, body: Value) {
        Mock::given(method(http_method))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    // Clusters

    /// Single-page cluster listing.
    pub async fn mock_clusters_list(&self, clusters: Vec<Value>) {
        let total = clusters.len();
        self.mount_json(
            "GET",
            "/clusters",
            200,
            json!({
                "pagination": {"page_number": 1, "page_size": total.max(1), "total_records": total},
                "clusters": clusters,
            }),
        )
        .await;
    }

    /// One page of a multi-page cluster listing, matched on `page`.
    pub async fn mock_clusters_page(
        &self,
        page: u32,
        page_size: u32,
        total: u32,
        clusters: Vec<Value>,
    ) {
        let matcher = Mock::given(method("GET")).and(path("/clusters"));
        let matcher = if page == 1 {
            matcher
        } else {
            matcher.and(query_param("page", page.to_string()))
        };
        // Higher pages must win over the unqualified first-page mock
        let priority = if page == 1 { 10 } else { 1 };

        matcher
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pagination": {"page_number": page, "page_size": page_size, "total_records": total},
                "clusters": clusters,
            })))
            .with_priority(priority)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_cluster_get(&self, slug: &str, cluster: Value) {
        self.mount_json("GET", &format!("/clusters/{slug}"), 200, json!({ "cluster": cluster }))
            .await;
    }

    pub async fn mock_cluster_create(&self, result: Value) {
        self.mount_json("POST", "/clusters", 202, result).await;
    }

    pub async fn mock_cluster_update(&self, slug: &str, result: Value) {
        self.mount_json("PUT", &format!("/clusters/{slug}"), 202, result)
            .await;
    }

    pub async fn mock_cluster_destroy(&self, slug: &str, result: Value) {
        self.mount_json("DELETE", &format!("/clusters/{slug}"), 202, result)
            .await;
    }

    // Plans, releases, spaces

    pub async fn mock_plans_list(&self, plans: Vec<Value>) {
        self.mount_json("GET", "/plans", 200, json!({ "plans": plans }))
            .await;
    }

    pub async fn mock_plan_get(&self, slug: &str, plan: Value) {
        self.mount_json("GET", &format!("/plans/{slug}"), 200, plan)
            .await;
    }

    pub async fn mock_releases_list(&self, releases: Vec<Value>) {
        self.mount_json("GET", "/releases", 200, json!({ "releases": releases }))
            .await;
    }

    pub async fn mock_release_get(&self, slug: &str, release: Value) {
        self.mount_json("GET", &format!("/releases/{slug}"), 200, release)
            .await;
    }

    pub async fn mock_spaces_list(&self, spaces: Vec<Value>) {
        self.mount_json("GET", "/spaces", 200, json!({ "spaces": spaces }))
            .await;
    }

    pub async fn mock_space_get(&self, space_path: &str, space: Value) {
        self.mount_json("GET", &format!("/spaces/{space_path}"), 200, space)
            .await;
    }

    /// Respond to `http_method route` with a Bonsai error body.
    pub async fn mock_error(&self, http_method: &str, route: &str, status: u16, errors: &[&str]) {
        self.mount_json(
            http_method,
            route,
            status,
            json!({ "errors": errors, "status": status }),
        )
        .await;
    }
}

/// Builder for cluster JSON.
#[derive(Debug, Clone)]
pub struct ClusterFixture {
    value: Value,
}

impl ClusterFixture {
    pub fn new(slug: &str, name: &str) -> Self {
        Self {
            value: json!({
                "slug": slug,
                "name": name,
                "uri": format!("https://api.bonsai.io/clusters/{slug}"),
                "plan": {
                    "slug": "sandbox-aws-us-east-1",
                    "uri": "https://api.bonsai.io/plans/sandbox-aws-us-east-1"
                },
                "release": {
                    "version": "7.2.0",
                    "slug": "elasticsearch-7.2.0",
                    "package_name": "7.2.0",
                    "service_type": "elasticsearch",
                    "uri": "https://api.bonsai.io/releases/elasticsearch-7.2.0"
                },
                "space": {
                    "path": "omc/bonsai/us-east-1/common",
                    "region": "aws-us-east-1",
                    "uri": "https://api.bonsai.io/spaces/omc/bonsai/us-east-1/common"
                },
                "stats": {"docs": 0, "shards_used": 0, "data_bytes_used": 0},
                "access": {
                    "host": format!("{slug}.us-east-1.bonsaisearch.net"),
                    "port": 443,
                    "scheme": "https"
                },
                "state": "PROVISIONED"
            }),
        }
    }

    pub fn state(mut self, state: &str) -> Self {
        self.value["state"] = json!(state);
        self
    }

    pub fn plan(mut self, slug: &str) -> Self {
        self.value["plan"] = json!({
            "slug": slug,
            "uri": format!("https://api.bonsai.io/plans/{slug}")
        });
        self
    }

    pub fn space(mut self, space_path: &str, region: &str) -> Self {
        self.value["space"] = json!({
            "path": space_path,
            "region": region,
            "uri": format!("https://api.bonsai.io/spaces/{space_path}")
        });
        self
    }

    pub fn docs(mut self, docs: i64) -> Self {
        self.value["stats"]["docs"] = json!(docs);
        self
    }

    pub fn build(self) -> Value {
        self.value
    }
}

/// Builder for plan JSON in the API's wire shape.
#[derive(Debug, Clone)]
pub struct PlanFixture {
    value: Value,
}

impl PlanFixture {
    pub fn new(slug: &str, name: &str) -> Self {
        Self {
            value: json!({
                "slug": slug,
                "name": name,
                "price_in_cents": 0,
                "billing_interval_in_months": 1,
                "single_tenant": false,
                "private_network": false,
                "available_releases": [],
                "available_spaces": [],
                "uri": format!("https://api.bonsai.io/plans/{slug}")
            }),
        }
    }

    pub fn price_in_cents(mut self, price: i64) -> Self {
        self.value["price_in_cents"] = json!(price);
        self
    }

    pub fn releases(mut self, slugs: &[&str]) -> Self {
        self.value["available_releases"] = json!(slugs);
        self
    }

    pub fn spaces(mut self, paths: &[&str]) -> Self {
        self.value["available_spaces"] = json!(paths);
        self
    }

    pub fn build(self) -> Value {
        self.value
    }
}

/// Builder for release JSON.
#[derive(Debug, Clone)]
pub struct ReleaseFixture {
    value: Value,
}

impl ReleaseFixture {
    pub fn new(slug: &str, version: &str) -> Self {
        Self {
            value: json!({
                "name": format!("Elasticsearch {version}"),
                "slug": slug,
                "service_type": "elasticsearch",
                "version": version,
                "multitenant": true
            }),
        }
    }

    pub fn service_type(mut self, service_type: &str) -> Self {
        self.value["service_type"] = json!(service_type);
        self
    }

    pub fn multitenant(mut self, multitenant: bool) -> Self {
        self.value["multitenant"] = json!(multitenant);
        self
    }

    pub fn build(self) -> Value {
        self.value
    }
}

/// Builder for space JSON.
#[derive(Debug, Clone)]
pub struct SpaceFixture {
    value: Value,
}

impl SpaceFixture {
    pub fn new(space_path: &str, provider: &str, region: &str) -> Self {
        Self {
            value: json!({
                "path": space_path,
                "private_network": false,
                "cloud": {"provider": provider, "region": region}
            }),
        }
    }

    pub fn private_network(mut self, private_network: bool) -> Self {
        self.value["private_network"] = json!(private_network);
        self
    }

    pub fn build(self) -> Value {
        self.value
    }
}
