pub mod api;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod session;

pub use api::HimmelClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::dispatcher::{ApiRequest, ApiResponse, Dispatcher};
pub use http::transport::{ReqwestTransport, Transport};
