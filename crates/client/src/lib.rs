pub mod client;
pub mod error;

pub use client::{ApiVersion, CdmClient, Credentials, HttpCdmClient};
pub use error::ClientError;
