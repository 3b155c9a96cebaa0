//! Azure Storage authentication for reqexec
//!
//! This crate provides the authentication strategies for Azure Storage services:
//! - Shared Key authentication (Shared Key, Shared Key Lite and the Queue flavour)
//! - SAS (Shared Access Signature) token authentication
//! - Bearer token authentication (OAuth) with refresh
//!
//! # Example
//!
//! ```rust,no_run
//! use reqexec_azure_storage::{AuthScheme, DefaultCredentialProvider, RequestSigner};
//! use reqexec_core::{Context, Executor, OsSecretStore, RateLimiter, RequestDescriptor, Signer};
//! use reqexec_http_send_reqwest::ReqwestHttpSend;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> reqexec_core::Result<()> {
//!     // Create context with a real transport and the process environment as secret store.
//!     let ctx = Context::new()
//!         .with_http_send(ReqwestHttpSend::default())
//!         .with_secret_store(OsSecretStore);
//!
//!     // Try connection string first, then named secrets.
//!     let provider = DefaultCredentialProvider::new();
//!     let signer = Signer::new(ctx, provider, RequestSigner::new(AuthScheme::SharedKey));
//!
//!     let executor = Executor::new(signer).with_rate_limit(RateLimiter::new(10.0)?);
//!
//!     let resp = executor
//!         .execute_within(
//!             || {
//!                 let mut req = RequestDescriptor::new(
//!                     http::Method::GET,
//!                     "https://account.blob.core.windows.net/container?restype=container&comp=list",
//!                 )?;
//!                 req.header_set("x-ms-version", "2023-01-03")?;
//!                 Ok(req)
//!             },
//!             Duration::from_secs(30),
//!         )
//!         .await?;
//!     println!("Response: {}", resp.status());
//!
//!     Ok(())
//! }
//! ```

mod constants;

mod canonical;
pub use canonical::{string_to_sign, SharedKeyVariant};

mod connection_string;
pub use connection_string::ConnectionString;

mod credential;
pub use credential::Credential;

mod sign_request;
pub use sign_request::{AuthScheme, RequestSigner};

mod provide_credential;
pub use provide_credential::*;
