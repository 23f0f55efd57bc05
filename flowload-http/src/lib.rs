//! HTTP client functionality for flowload
//!
//! A thin, token-aware JSON client over `reqwest` with a swappable
//! transport. The scripted mock transport keeps the engine testable
//! without a live orchestration API.

pub mod client;
pub mod contract;
pub mod errors;
pub mod mock;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use contract::StatusContract;
pub use errors::HttpError;
pub use mock::MockTransport;
pub use transport::{ApiTransport, ReqwestTransport};
pub use types::{ApiResponse, HttpMethod};
