//! # bonsai-api
//!
//! Typed client for the [Bonsai](https://bonsai.io) cluster provisioning API.
//!
//! Every resource call flows through the same pipeline:
//!
//! 1. [`Client::new_request`] builds the request (endpoint, user agent,
//!    Basic credentials, JSON headers)
//! 2. [`Client::execute`] waits on the default rate limiter, sends the
//!    request, buffers the body and maps `>= 400` statuses into
//!    [`ResponseError`]s, sleeping and retrying on `429 Too Many Requests`
//! 3. [`Client::for_each_page`] walks paginated listings using the
//!    `pagination` block returned by the API
//!
//! ## Example
//!
//! ```rust,no_run
//! use bonsai_api::{AccessKey, AccessToken, Client, CredentialPair};
//!
//! # async fn run() -> bonsai_api::Result<()> {
//! let credentials = CredentialPair::new(
//!     AccessKey::new("my-key")?,
//!     AccessToken::new("my-token")?,
//! );
//!
//! let client = Client::builder().credentials(credentials).build()?;
//!
//! for cluster in client.clusters().all(Default::default()).await? {
//!     println!("{} ({})", cluster.name, cluster.state);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Cancellation
//!
//! Every suspension point (rate limiter waits, the network call and
//! `Retry-After` sleeps) observes the client's [`Cancellation`]. Scope a
//! clone of the client with [`Client::with_cancellation`] to bound a group
//! of operations by a deadline or an external cancel signal.

pub mod cancel;
pub mod client;
pub mod credential;
pub mod error;
pub mod pagination;
pub mod rate_limit;
pub mod resources;
pub mod response;
pub mod transport;

#[cfg(feature = "test-support")]
pub mod testing;

pub use cancel::{CancelReason, Cancellation};
pub use client::{
    Application, BASE_ENDPOINT, Client, ClientBuilder, CONTENT_TYPE_JSON, USER_AGENT, VERSION,
};
pub use credential::{AccessKey, AccessToken, CredentialError, CredentialPair};
pub use error::{ApiStatus, Error, RateLimitError, ResponseError, Result};
pub use pagination::{DEFAULT_PAGE_SIZE, ListOpts};
pub use rate_limit::{
    ClientLimiter, DEFAULT_BURST_ALLOWANCE, DEFAULT_BURST_INTERVAL, PROVISION_BURST_ALLOWANCE,
    PROVISION_BURST_INTERVAL, RateLimiter,
};
pub use resources::{
    CloudProvider, Cluster, ClusterAccess, ClusterAllOpts, ClusterClient, ClusterCreateOpts,
    ClusterCreateResult, ClusterDestroyResult, ClusterListOpts, ClusterState, ClusterStats,
    ClusterUpdateOpts, ClusterUpdateResult, Plan, PlanClient, Release, ReleaseClient, Space,
    SpaceClient,
};
pub use response::{Pagination, Response};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
