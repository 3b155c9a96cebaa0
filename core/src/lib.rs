//! Core components for executing authenticated API requests.
//!
//! This crate provides the foundational types and traits for the reqexec ecosystem.
//! It defines the abstractions that turn a request description into an
//! authenticated, rate limited and throttle aware HTTP exchange.
//!
//! ## Overview
//!
//! The crate is built around several key concepts:
//!
//! - **Context**: A container that holds implementations for HTTP sending, secret lookup and time
//! - **Traits**: Abstract interfaces for credential loading (`ProvideCredential`) and request signing (`SignRequest`)
//! - **Signer**: Caches the credential and applies the signing strategy to a request
//! - **Executor**: Drives `BUILD -> SIGN -> SEND` and retries throttled attempts until a deadline
//!
//! ## Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use reqexec_core::time::DateTime;
//! use reqexec_core::{
//!     Context, Executor, ProvideCredential, RequestDescriptor, Result, SignRequest, Signer,
//!     SigningCredential,
//! };
//! use std::time::Duration;
//!
//! // Define your credential type
//! #[derive(Clone, Debug)]
//! struct MyToken {
//!     token: String,
//!     expires_at: DateTime,
//! }
//!
//! impl SigningCredential for MyToken {
//!     fn is_valid(&self, now: DateTime) -> bool {
//!         now < self.expires_at
//!     }
//! }
//!
//! // Implement credential provider
//! #[derive(Debug)]
//! struct MyProvider;
//!
//! #[async_trait]
//! impl ProvideCredential for MyProvider {
//!     type Credential = MyToken;
//!
//!     async fn provide_credential(
//!         &self,
//!         ctx: &Context,
//!         _: Option<&Self::Credential>,
//!     ) -> Result<Option<Self::Credential>> {
//!         Ok(ctx.secret("MY_TOKEN").map(|token| MyToken {
//!             token,
//!             expires_at: ctx.now() + chrono::TimeDelta::minutes(10),
//!         }))
//!     }
//! }
//!
//! // Implement request signer
//! #[derive(Debug)]
//! struct MyBuilder;
//!
//! #[async_trait]
//! impl SignRequest for MyBuilder {
//!     type Credential = MyToken;
//!
//!     async fn sign_request(
//!         &self,
//!         _: &Context,
//!         req: &mut RequestDescriptor,
//!         cred: Option<&Self::Credential>,
//!     ) -> Result<()> {
//!         if let Some(cred) = cred {
//!             req.header_set("authorization", &format!("Bearer {}", cred.token))?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let ctx = Context::new();
//! let executor = Executor::new(Signer::new(ctx, MyProvider, MyBuilder));
//!
//! let resp = executor
//!     .execute_within(
//!         || RequestDescriptor::new(http::Method::GET, "https://example.com/object"),
//!         Duration::from_secs(30),
//!     )
//!     .await?;
//! println!("{}", resp.status());
//! # Ok(())
//! # }
//! ```
//!
//! ## Traits
//!
//! This crate defines several important traits:
//!
//! - [`HttpSend`]: For sending HTTP requests
//! - [`SecretStore`]: For resolving named secrets
//! - [`Clock`]: For reading the time and suspending between attempts
//! - [`ProvideCredential`]: For loading credentials from various sources
//! - [`SignRequest`]: For applying service-specific authentication
//! - [`SigningCredential`]: For validating credentials
//! - [`RateLimit`]: For spacing outgoing requests
//!
//! ## Utilities
//!
//! The crate also provides utility modules:
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time formatting and parsing utilities
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::{
    Clock, Context, HttpSend, ManualClock, NoopHttpSend, NoopSecretStore, OsSecretStore,
    SecretStore, StaticSecretStore, SystemClock,
};
mod error;
pub use error::{Error, ErrorKind, Result};

mod api;
pub use api::{ProvideCredential, SignRequest, SigningCredential};
mod chain;
pub use chain::ProvideCredentialChain;
mod request;
pub use request::{Body, RequestDescriptor, RequestTimeout, QUERY_ENCODE_SET};
mod signer;
pub use signer::Signer;
mod rate_limit;
pub use rate_limit::{NoopRateLimit, RateLimit, RateLimiter};
mod execute;
pub use execute::{parse_retry_after, Executor, Throttle, ThrottleRegistry};
