use crate::time::DateTime;
use crate::{Context, RequestDescriptor, Result};
use std::fmt::Debug;

/// SigningCredential is the trait used by signer as the signing credential.
pub trait SigningCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Check if the credential is still usable at `now`.
    fn is_valid(&self, now: DateTime) -> bool;
}

impl<T: SigningCredential> SigningCredential for Option<T> {
    fn is_valid(&self, now: DateTime) -> bool {
        let Some(cred) = self else {
            return false;
        };

        cred.is_valid(now)
    }
}

/// ProvideCredential is the trait used by signer to load or refresh the credential.
///
/// Service may require different credential to sign the request, for example,
/// shared key signing requires an account key, while bearer authorization
/// requires a token.
#[async_trait::async_trait]
pub trait ProvideCredential: Debug + Send + Sync + Unpin + 'static {
    /// Credential returned by this provider.
    type Credential: Send + Sync + Unpin + 'static;

    /// Provide a fresh credential.
    ///
    /// `previous` is the credential currently cached by the caller, if any.
    /// Refreshing providers can use it (e.g. its refresh token); loaders that
    /// read static material ignore it.
    ///
    /// Returning `Ok(None)` means no credential is available, which is not an
    /// error by itself.
    async fn provide_credential(
        &self,
        ctx: &Context,
        previous: Option<&Self::Credential>,
    ) -> Result<Option<Self::Credential>>;
}

/// SignRequest is the trait used by signer to apply authentication to a request.
///
/// Implementations may add or replace headers and query parameters, but must
/// not remove headers set by the caller other than `Authorization` and `Date`.
#[async_trait::async_trait]
pub trait SignRequest: Debug + Send + Sync + Unpin + 'static {
    /// Credential used by this builder.
    type Credential: Send + Sync + Unpin + 'static;

    /// Apply authentication to the request.
    ///
    /// ## Credential
    ///
    /// The `credential` parameter is the credential required by the signer to
    /// sign the request. It's `None` when the provider has nothing to offer;
    /// implementations decide whether that is fatal.
    async fn sign_request(
        &self,
        ctx: &Context,
        req: &mut RequestDescriptor,
        credential: Option<&Self::Credential>,
    ) -> Result<()>;
}
