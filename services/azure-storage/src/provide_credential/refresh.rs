use std::fmt::{self, Debug};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use reqexec_core::{Context, ProvideCredential, Result};

use crate::credential::Credential;

type RefreshFuture = Pin<Box<dyn Future<Output = Result<Option<Credential>>> + Send>>;
type RefreshFn = dyn Fn(Option<Credential>) -> RefreshFuture + Send + Sync;

/// RefreshCredentialProvider asks an injected callback for a fresh credential.
///
/// The callback receives the credential being replaced, if any, so it can
/// exchange a refresh token or renew a SAS. It's used for bearer token refresh
/// and SAS token supply; the signer only calls it once the cached credential
/// expired.
#[derive(Clone)]
pub struct RefreshCredentialProvider {
    refresh: Arc<RefreshFn>,
}

impl Debug for RefreshCredentialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshCredentialProvider").finish_non_exhaustive()
    }
}

impl RefreshCredentialProvider {
    /// Create a provider from an async refresh callback.
    ///
    /// ```
    /// use reqexec_azure_storage::{Credential, RefreshCredentialProvider};
    ///
    /// let provider = RefreshCredentialProvider::new(|previous: Option<Credential>| async move {
    ///     // Exchange the previous token for a new one here.
    ///     let _ = previous;
    ///     Ok(Some(Credential::with_bearer_token("token", None)))
    /// });
    /// ```
    pub fn new<F, Fut>(refresh: F) -> Self
    where
        F: Fn(Option<Credential>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Credential>>> + Send + 'static,
    {
        Self {
            refresh: Arc::new(move |previous| Box::pin(refresh(previous))),
        }
    }
}

#[async_trait]
impl ProvideCredential for RefreshCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(
        &self,
        _: &Context,
        previous: Option<&Self::Credential>,
    ) -> Result<Option<Self::Credential>> {
        (self.refresh)(previous.cloned()).await
    }
}
