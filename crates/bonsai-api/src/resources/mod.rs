//! Resource clients for the Bonsai API endpoints.
//!
//! Each client borrows the [`Client`] it was created from and adds nothing
//! but paths, query parameters and response shapes on top of the shared
//! request pipeline.

pub mod clusters;
pub mod plans;
pub mod releases;
pub mod spaces;

pub use clusters::{
    Cluster, ClusterAccess, ClusterAllOpts, ClusterClient, ClusterCreateOpts, ClusterCreateResult,
    ClusterDestroyResult, ClusterListOpts, ClusterState, ClusterStats, ClusterUpdateOpts,
    ClusterUpdateResult,
};
pub use plans::{Plan, PlanClient};
pub use releases::{Release, ReleaseClient};
pub use spaces::{CloudProvider, Space, SpaceClient};

use std::cell::RefCell;

use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::pagination::ListOpts;
use crate::response::Response;

/// Percent-encode a single path segment.
pub(crate) fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Percent-encode each segment of a `/`-separated path, keeping the
/// separators.
pub(crate) fn segments(raw: &str) -> String {
    raw.trim_matches('/')
        .split('/')
        .map(segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// `base?query`, or `base` alone when the query is empty.
pub(crate) fn with_query(base: &str, query: &str) -> String {
    if query.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{query}")
    }
}

/// `base` with list pagination applied.
pub(crate) fn list_path(base: &str, opts: &ListOpts) -> Result<String> {
    Ok(with_query(base, &opts.to_query()?))
}

/// GET `path` and decode the body as `T`, tagging failures with `operation`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    operation: &str,
    path: &str,
) -> Result<(T, Response)> {
    let request = client
        .new_request(Method::GET, path, None)
        .map_err(|e| e.with_context(operation, path))?;
    let url = request.url.to_string();

    let response = client
        .execute(request)
        .await
        .map_err(|e| e.with_context(operation, &url))?;
    let decoded = response
        .json(operation)
        .map_err(|e| e.with_context(operation, &url))?;

    Ok((decoded, response))
}

/// Collect every item of a paginated listing.
///
/// `fetch_page` returns one page of items plus the response it came from;
/// traversal stops once `total_records` items have been gathered.
pub(crate) async fn collect_all<T, F, Fut>(client: &Client, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(ListOpts) -> Fut,
    Fut: std::future::Future<Output = Result<(Vec<T>, Response)>>,
{
    let results = RefCell::new(Vec::new());

    client
        .for_each_page(ListOpts::default(), |opts| {
            let page = fetch_page(opts);
            let results = &results;
            async move {
                let (items, mut response) = page.await?;
                let mut results = results.borrow_mut();
                results.extend(items);
                if results.len() as i64 >= response.pagination().total_records {
                    response.mark_pagination_complete();
                }
                Ok::<_, Error>(response)
            }
        })
        .await?;

    Ok(results.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("my-cluster-123"), "my-cluster-123");
        assert_eq!(segment("a b/c"), "a%20b%2Fc");
    }

    #[test]
    fn test_space_path_keeps_separators() {
        assert_eq!(
            segments("omc/bonsai/us-east-1/common"),
            "omc/bonsai/us-east-1/common"
        );
        assert_eq!(segments("/omc/bonsai gcp/"), "omc/bonsai%20gcp");
    }

    #[test]
    fn test_with_query() {
        assert_eq!(with_query("/clusters", ""), "/clusters");
        assert_eq!(with_query("/clusters", "page=2"), "/clusters?page=2");
    }

    #[test]
    fn test_list_path() {
        assert_eq!(list_path("/plans", &ListOpts::default()).unwrap(), "/plans");
        assert_eq!(
            list_path("/plans", &ListOpts::new(2, 50)).unwrap(),
            "/plans?page=2&size=50"
        );
    }

    #[tokio::test]
    async fn test_collect_all_gathers_until_total() {
        use crate::response::Pagination;
        use bytes::Bytes;
        use reqwest::StatusCode;
        use reqwest::header::HeaderMap;

        let client = Client::builder().endpoint("http://localhost").build().unwrap();
        let mut requested = Vec::new();

        let items = collect_all(&client, |opts| {
            requested.push(opts);
            let page_number = requested.len() as i64;
            async move {
                let mut response = Response::new(StatusCode::OK, HeaderMap::new(), Bytes::new());
                response.set_pagination(Pagination {
                    page_number,
                    page_size: 2,
                    total_records: 3,
                });
                let items = if page_number == 1 { vec![1, 2] } else { vec![3] };
                Ok((items, response))
            }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(requested, vec![ListOpts::default(), ListOpts::new(2, 2)]);
    }
}
