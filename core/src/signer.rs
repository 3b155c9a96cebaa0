use crate::{Context, ProvideCredential, RequestDescriptor, Result, SignRequest, SigningCredential};
use log::debug;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Signer is the authentication strategy applied to every request attempt.
///
/// It owns a single-slot credential cache. When the cached credential is
/// absent or no longer valid, the provider is asked for a fresh one and the
/// cache is replaced with the result, even when that result is `None`.
///
/// The check-and-refresh runs under an async mutex scoped to this signer (and
/// its clones), so concurrent callers never refresh twice for one expiry.
#[derive(Clone, Debug)]
pub struct Signer<K: SigningCredential> {
    ctx: Context,
    provider: Arc<dyn ProvideCredential<Credential = K>>,
    builder: Arc<dyn SignRequest<Credential = K>>,
    credential: Arc<Mutex<Option<K>>>,
}

impl<K: SigningCredential> Signer<K> {
    /// Create a new signer.
    pub fn new(
        ctx: Context,
        provider: impl ProvideCredential<Credential = K>,
        builder: impl SignRequest<Credential = K>,
    ) -> Self {
        Self {
            ctx,

            provider: Arc::new(provider),
            builder: Arc::new(builder),
            credential: Arc::new(Mutex::new(None)),
        }
    }

    /// Get the context used by this signer.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Get a usable credential, refreshing the cache if needed.
    pub async fn credential(&self) -> Result<Option<K>> {
        let mut cached = self.credential.lock().await;
        if cached.is_valid(self.ctx.now()) {
            return Ok(cached.clone());
        }

        debug!("credential is absent or expired, asking provider for a fresh one");
        let fresh = self
            .provider
            .provide_credential(&self.ctx, cached.as_ref())
            .await?;
        *cached = fresh.clone();
        Ok(fresh)
    }

    /// Signing request.
    pub async fn sign(&self, req: &mut RequestDescriptor) -> Result<()> {
        let credential = self.credential().await?;

        self.builder
            .sign_request(&self.ctx, req, credential.as_ref())
            .await
    }
}
