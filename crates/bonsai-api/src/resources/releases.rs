//! Releases API (`/releases`)
//!
//! Search engine versions available for new clusters.

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::Result;
use crate::pagination::ListOpts;
use crate::response::Response;

use super::{collect_all, get_json, list_path, segment};

const BASE_PATH: &str = "/releases";

/// A search service release, e.g. `elasticsearch-7.2.0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Release {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub service_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(rename = "multitenant", alias = "multi_tenant")]
    pub multi_tenant: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub package_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uri: String,
}

impl Release {
    /// A release known only by its slug.
    pub fn from_slug(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            ..Default::default()
        }
    }
}

#[derive(Deserialize)]
struct ReleaseList {
    #[serde(default)]
    releases: Vec<Release>,
}

/// Client for the `/releases` endpoints.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseClient<'c> {
    client: &'c Client,
}

impl<'c> ReleaseClient<'c> {
    pub(crate) fn new(client: &'c Client) -> Self {
        Self { client }
    }

    pub async fn list(&self, opts: ListOpts) -> Result<(Vec<Release>, Response)> {
        let path = list_path(BASE_PATH, &opts)?;
        let (page, response): (ReleaseList, _) =
            get_json(self.client, "list releases", &path).await?;
        Ok((page.releases, response))
    }

    pub async fn all(&self) -> Result<Vec<Release>> {
        collect_all(self.client, move |opts| self.list(opts)).await
    }

    pub async fn get(&self, slug: &str) -> Result<Release> {
        let path = format!("{BASE_PATH}/{}", segment(slug));
        let (release, _) = get_json(self.client, "get release", &path).await?;
        Ok(release)
    }
}
