//! Buffered API responses and pagination metadata.

use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, RETRY_AFTER};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::client::CONTENT_TYPE_JSON;
use crate::error::{Error, ResponseError, Result};

/// Page metadata attached to list responses.
///
/// The zero value means the response is not paginated, or that traversal is
/// complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page_number: i64,
    pub page_size: i64,
    pub total_records: i64,
}

impl Pagination {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Deserialize)]
struct PaginationEnvelope {
    #[serde(default)]
    pagination: Option<Pagination>,
}

/// A completed HTTP exchange with its body held in memory.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    pagination: Pagination,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
            pagination: Pagination::default(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Stop a [`for_each_page`](crate::Client::for_each_page) traversal after
    /// this page.
    pub fn mark_pagination_complete(&mut self) {
        self.pagination = Pagination::default();
    }

    pub(crate) fn set_pagination(&mut self, pagination: Pagination) {
        self.pagination = pagination;
    }

    pub fn is_json(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with(CONTENT_TYPE_JSON))
    }

    /// Decode the body into `T`; `context` names the target in errors.
    pub fn json<T: DeserializeOwned>(&self, context: &str) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|source| Error::Decode {
            context: context.to_string(),
            source,
        })
    }

    /// `Retry-After` in whole seconds.
    ///
    /// `None` when the header is absent or not a non-negative integer.
    pub fn retry_after(&self) -> Option<Duration> {
        self.headers
            .get(RETRY_AFTER)?
            .to_str()
            .ok()?
            .trim()
            .parse::<u64>()
            .ok()
            .map(Duration::from_secs)
    }

    /// The error described by this response.
    ///
    /// The body is only inspected when it is JSON; a missing `status` falls
    /// back to the HTTP status.
    pub fn api_error(&self) -> ResponseError {
        let http_status = self.status.as_u16();
        let mut error = if self.is_json() {
            serde_json::from_slice::<ResponseError>(&self.body).unwrap_or_default()
        } else {
            ResponseError::default()
        };
        if error.status == 0 {
            error.status = http_status;
        }
        error
    }

    /// Read the `pagination` block, if any, from a JSON body.
    pub(crate) fn decode_pagination(&self) -> Result<Pagination> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Pagination::default());
        }
        let envelope: PaginationEnvelope = self.json("pagination")?;
        Ok(envelope.pagination.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn json_response(status: u16, body: &str) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        Response::new(
            StatusCode::from_u16(status).unwrap(),
            headers,
            Bytes::from(body.to_string()),
        )
    }

    #[test]
    fn test_api_error_from_json() {
        let response = json_response(404, r#"{"errors":["Cluster x not found."],"status":404}"#);
        let err = response.api_error();
        assert_eq!(err.errors, vec!["Cluster x not found."]);
        assert_eq!(err.status, 404);
    }

    #[test]
    fn test_api_error_defaults_status() {
        let response = json_response(422, r#"{"errors":["name is required"]}"#);
        assert_eq!(response.api_error().status, 422);
    }

    #[test]
    fn test_api_error_ignores_non_json_body() {
        let response = Response::new(
            StatusCode::BAD_GATEWAY,
            HeaderMap::new(),
            Bytes::from_static(br#"{"errors":["hidden"],"status":418}"#),
        );
        let err = response.api_error();
        assert!(err.errors.is_empty());
        assert_eq!(err.status, 502);
    }

    #[test]
    fn test_api_error_tolerates_garbage_json() {
        let response = json_response(500, "<html>oops</html>");
        assert_eq!(response.api_error(), ResponseError::new(500));
    }

    #[test]
    fn test_retry_after() {
        let mut response = json_response(429, "{}");
        assert_eq!(response.retry_after(), None);

        response
            .headers
            .insert(RETRY_AFTER, HeaderValue::from_static("2"));
        assert_eq!(response.retry_after(), Some(Duration::from_secs(2)));

        response.headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(response.retry_after(), None);
    }

    #[test]
    fn test_decode_pagination() {
        let response = json_response(
            200,
            r#"{"pagination":{"page_number":2,"page_size":1,"total_records":3},"clusters":[]}"#,
        );
        assert_eq!(
            response.decode_pagination().unwrap(),
            Pagination {
                page_number: 2,
                page_size: 1,
                total_records: 3
            }
        );
    }

    #[test]
    fn test_decode_pagination_absent_or_empty() {
        assert!(
            json_response(200, r#"{"plans":[]}"#)
                .decode_pagination()
                .unwrap()
                .is_zero()
        );
        assert!(json_response(204, "").decode_pagination().unwrap().is_zero());
        assert!(
            json_response(200, r#"{"pagination":null}"#)
                .decode_pagination()
                .unwrap()
                .is_zero()
        );
    }

    #[test]
    fn test_decode_pagination_malformed() {
        let err = json_response(200, "{not json").decode_pagination().unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_mark_pagination_complete() {
        let mut response = json_response(200, "{}");
        response.set_pagination(Pagination {
            page_number: 1,
            page_size: 100,
            total_records: 1,
        });
        response.mark_pagination_complete();
        assert!(response.pagination().is_zero());
    }
}
