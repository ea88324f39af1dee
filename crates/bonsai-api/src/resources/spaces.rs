//! Spaces API (`/spaces`)
//!
//! Spaces are the server groups and regions clusters can be deployed to.
//! They are addressed by path, e.g. `omc/bonsai/us-east-1/common`.

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::Result;
use crate::pagination::ListOpts;
use crate::response::Response;

use super::{collect_all, get_json, list_path, segments};

const BASE_PATH: &str = "/spaces";

/// Cloud hosting a space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudProvider {
    pub provider: String,
    pub region: String,
}

/// A deployment location for clusters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Space {
    pub path: String,
    pub private_network: bool,
    pub cloud: CloudProvider,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub region: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uri: String,
}

impl Space {
    /// A space known only by its path.
    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

#[derive(Deserialize)]
struct SpaceList {
    #[serde(default)]
    spaces: Vec<Space>,
}

/// Client for the `/spaces` endpoints.
#[derive(Debug, Clone, Copy)]
pub struct SpaceClient<'c> {
    client: &'c Client,
}

impl<'c> SpaceClient<'c> {
    pub(crate) fn new(client: &'c Client) -> Self {
        Self { client }
    }

    pub async fn list(&self, opts: ListOpts) -> Result<(Vec<Space>, Response)> {
        let path = list_path(BASE_PATH, &opts)?;
        let (page, response): (SpaceList, _) = get_json(self.client, "list spaces", &path).await?;
        Ok((page.spaces, response))
    }

    pub async fn all(&self) -> Result<Vec<Space>> {
        collect_all(self.client, move |opts| self.list(opts)).await
    }

    /// Fetch a space by path. Slashes in `path` are kept as separators.
    pub async fn get(&self, path: &str) -> Result<Space> {
        let path = format!("{BASE_PATH}/{}", segments(path));
        let (space, _) = get_json(self.client, "get space", &path).await?;
        Ok(space)
    }
}
