//! Deploy the Confluence, GitHub and GitLab MCP servers to Cloud Run with `gcloud run deploy`.
pub mod config;
pub mod error;
pub mod invoker;
pub mod request;
pub mod service;

pub use error::DeployError;
pub use invoker::{DeployOptions, Deployer, GcloudDeployer, Invocation, deploy, plan};
pub use request::DeploymentRequest;
pub use service::Variant;
