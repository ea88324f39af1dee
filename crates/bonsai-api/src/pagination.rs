//! Page-numbered list traversal.

use std::future::Future;

use serde::Serialize;
use tracing::{debug, warn};

use crate::client::Client;
use crate::error::Result;
use crate::response::Response;

/// Largest page the API serves.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// `page` / `size` query parameters for list endpoints.
///
/// The zero value requests no pagination at all; it is not the same as
/// asking for page 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListOpts {
    #[serde(skip_serializing_if = "is_zero")]
    pub page: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub size: u32,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl ListOpts {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// Page 1 at the maximum page size.
    pub fn first_page() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }

    pub fn is_zero(&self) -> bool {
        self.page == 0 && self.size == 0
    }

    /// `page=3&size=100`; parameters that are zero are left out.
    pub fn to_query(&self) -> Result<String> {
        Ok(serde_urlencoded::to_string(self)?)
    }
}

impl Client {
    /// Call `fetch` for successive pages, starting from `opts`.
    ///
    /// Traversal ends when a response carries no pagination block (or one
    /// whose page number is not positive), when the server repeats a page
    /// number or sends one past `u32::MAX - 1`, or when `fetch` fails.
    /// `fetch` ends it early by calling
    /// [`Response::mark_pagination_complete`] on the page it returns.
    pub async fn for_each_page<F, Fut>(&self, opts: ListOpts, mut fetch: F) -> Result<()>
    where
        F: FnMut(ListOpts) -> Fut,
        Fut: Future<Output = Result<Response>>,
    {
        let mut opts = opts;
        let mut last_page: i64 = 0;

        loop {
            self.cancellation().check()?;

            let response = fetch(opts).await?;
            let pagination = response.pagination();

            if pagination.is_zero() || pagination.page_number <= 0 {
                return Ok(());
            }
            if pagination.page_number <= last_page {
                warn!(
                    page_number = pagination.page_number,
                    last_page, "Server repeated a page, stopping traversal"
                );
                return Ok(());
            }
            last_page = pagination.page_number;

            let Some(page) = u32::try_from(pagination.page_number)
                .ok()
                .and_then(|p| p.checked_add(1))
            else {
                warn!(
                    page_number = pagination.page_number,
                    "Page number out of range, stopping traversal"
                );
                return Ok(());
            };
            let size = u32::try_from(pagination.page_size).unwrap_or(0);
            opts = ListOpts::new(page, size);
            debug!(page, size, "Fetching next page");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::{CancelReason, Cancellation};
    use crate::error::Error;
    use crate::response::Pagination;
    use bytes::Bytes;
    use reqwest::StatusCode;
    use reqwest::header::HeaderMap;

    fn page(page_number: i64, page_size: i64, total_records: i64) -> Response {
        let mut response = Response::new(StatusCode::OK, HeaderMap::new(), Bytes::new());
        response.set_pagination(Pagination {
            page_number,
            page_size,
            total_records,
        });
        response
    }

    fn client() -> Client {
        Client::builder().endpoint("http://localhost").build().unwrap()
    }

    #[test]
    fn test_query_encoding() {
        assert_eq!(ListOpts::default().to_query().unwrap(), "");
        assert_eq!(ListOpts::new(3, 100).to_query().unwrap(), "page=3&size=100");
        assert_eq!(ListOpts::new(2, 0).to_query().unwrap(), "page=2");
        assert_eq!(ListOpts::new(0, 25).to_query().unwrap(), "size=25");
    }

    #[test]
    fn test_zero_opts_differ_from_first_page() {
        assert!(ListOpts::default().is_zero());
        assert!(!ListOpts::first_page().is_zero());
        assert_eq!(ListOpts::first_page(), ListOpts::new(1, DEFAULT_PAGE_SIZE));
    }

    #[tokio::test]
    async fn test_walks_until_marked_complete() {
        let client = client();
        let mut seen = Vec::new();

        client
            .for_each_page(ListOpts::default(), |opts| {
                seen.push(opts);
                let count = seen.len() as i64;
                async move {
                    let mut response = page(count, 1, 3);
                    if count >= 3 {
                        response.mark_pagination_complete();
                    }
                    Ok(response)
                }
            })
            .await
            .unwrap();

        assert_eq!(
            seen,
            vec![ListOpts::default(), ListOpts::new(2, 1), ListOpts::new(3, 1)]
        );
    }

    #[tokio::test]
    async fn test_stops_on_unpaginated_response() {
        let client = client();
        let mut calls = 0;

        client
            .for_each_page(ListOpts::default(), |_| {
                calls += 1;
                async { Ok(page(0, 0, 0)) }
            })
            .await
            .unwrap();

        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_stops_on_negative_page_number() {
        let client = client();
        let mut calls = 0;

        client
            .for_each_page(ListOpts::default(), |_| {
                calls += 1;
                async { Ok(page(-1, 10, 50)) }
            })
            .await
            .unwrap();

        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_stops_when_server_repeats_page() {
        let client = client();
        let mut calls = 0;

        client
            .for_each_page(ListOpts::default(), |_| {
                calls += 1;
                async { Ok(page(1, 10, 50)) }
            })
            .await
            .unwrap();

        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_stops_on_out_of_range_page_number() {
        for page_number in [i64::MAX, i64::from(u32::MAX)] {
            let client = client();
            let mut calls = 0;

            client
                .for_each_page(ListOpts::default(), |_| {
                    calls += 1;
                    async move { Ok(page(page_number, 1, 10)) }
                })
                .await
                .unwrap();

            assert_eq!(calls, 1);
        }
    }

    #[tokio::test]
    async fn test_propagates_fetch_error() {
        let client = client();

        let err = client
            .for_each_page(ListOpts::default(), |_| async {
                Err(Error::InvalidInput("boom".into()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_checks_cancellation_between_pages() {
        let cancel = Cancellation::new();
        let client = client().with_cancellation(cancel.clone());
        let mut calls = 0;

        let err = client
            .for_each_page(ListOpts::default(), |_| {
                calls += 1;
                cancel.cancel();
                async { Ok(page(1, 1, 10)) }
            })
            .await
            .unwrap_err();

        assert_eq!(calls, 1);
        assert!(matches!(err, Error::Cancelled(CancelReason::Cancelled)));
    }
}
