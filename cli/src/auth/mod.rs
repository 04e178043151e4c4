//! Authentication module for infrapilot.
//!
//! This module drives the OAuth device authorization grant against GitHub and
//! resolves the resulting token to an [`Identity`](crate::credentials::Identity).

pub mod device_flow;
pub mod error;
pub mod github;
pub mod tokens;
pub mod transport;

pub use device_flow::{open_browser, DeviceAuthFlow};
pub use error::DeviceFlowError;
pub use github::{GitHubApi, GitHubClient};
pub use transport::{DeviceFlowTransport, HttpDeviceFlowTransport};
