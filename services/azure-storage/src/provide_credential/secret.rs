use async_trait::async_trait;
use log::debug;
use reqexec_core::{Context, ProvideCredential, Result};

use crate::constants::*;
use crate::credential::Credential;

/// SecretCredentialProvider loads credentials from the secret store of the
/// context.
///
/// Looked up in order:
///
/// - `AZBLOB_ACCOUNT_NAME` / `AZURE_STORAGE_ACCOUNT_NAME` with
///   `AZBLOB_ACCOUNT_KEY` / `AZURE_STORAGE_ACCOUNT_KEY`
/// - `AZURE_STORAGE_SAS_TOKEN`
/// - `AZURE_STORAGE_BEARER_TOKEN`
#[derive(Clone, Debug, Default)]
pub struct SecretCredentialProvider {}

impl SecretCredentialProvider {
    /// Create a new secret credential provider.
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl ProvideCredential for SecretCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(
        &self,
        ctx: &Context,
        _: Option<&Self::Credential>,
    ) -> Result<Option<Self::Credential>> {
        let account_name = ctx
            .secret(AZBLOB_ACCOUNT_NAME)
            .or_else(|| ctx.secret(AZURE_STORAGE_ACCOUNT_NAME));
        let account_key = ctx
            .secret(AZBLOB_ACCOUNT_KEY)
            .or_else(|| ctx.secret(AZURE_STORAGE_ACCOUNT_KEY));

        if let (Some(account_name), Some(account_key)) = (account_name, account_key) {
            debug!("loaded shared key of {account_name} from secret store");
            return Credential::with_shared_key(&account_name, &account_key).map(Some);
        }

        if let Some(sas_token) = ctx.secret(AZURE_STORAGE_SAS_TOKEN) {
            debug!("loaded sas token from secret store");
            return Ok(Some(Credential::with_sas_token(&sas_token)));
        }

        if let Some(bearer_token) = ctx.secret(AZURE_STORAGE_BEARER_TOKEN) {
            debug!("loaded bearer token from secret store");
            return Ok(Some(Credential::with_bearer_token(&bearer_token, None)));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqexec_core::StaticSecretStore;

    fn ctx(pairs: &[(&str, &str)]) -> Context {
        Context::new().with_secret_store(StaticSecretStore::from_pairs(pairs.iter().copied()))
    }

    #[tokio::test]
    async fn test_secret_credential_provider_account_key() {
        let ctx = ctx(&[
            ("AZBLOB_ACCOUNT_NAME", "myaccount"),
            ("AZURE_STORAGE_ACCOUNT_KEY", "a2V5"),
        ]);

        let cred = SecretCredentialProvider::new()
            .provide_credential(&ctx, None)
            .await
            .unwrap();

        match cred {
            Some(Credential::SharedKey {
                account_name,
                account_key,
            }) => {
                assert_eq!(account_name, "myaccount");
                assert_eq!(account_key, b"key");
            }
            _ => panic!("Expected SharedKey credential"),
        }
    }

    #[tokio::test]
    async fn test_secret_credential_provider_invalid_key() {
        let ctx = ctx(&[
            ("AZURE_STORAGE_ACCOUNT_NAME", "myaccount"),
            ("AZURE_STORAGE_ACCOUNT_KEY", "not-base64!"),
        ]);

        let err = SecretCredentialProvider::new()
            .provide_credential(&ctx, None)
            .await
            .unwrap_err();
        assert!(err.is_authentication_error());
    }

    #[tokio::test]
    async fn test_secret_credential_provider_sas_token() {
        let ctx = ctx(&[
            // A name without key is not enough for shared key.
            ("AZURE_STORAGE_ACCOUNT_NAME", "myaccount"),
            ("AZURE_STORAGE_SAS_TOKEN", "mysastoken"),
        ]);

        let cred = SecretCredentialProvider::new()
            .provide_credential(&ctx, None)
            .await
            .unwrap();

        match cred {
            Some(Credential::SasToken { token, .. }) => assert_eq!(token, "mysastoken"),
            _ => panic!("Expected SasToken credential"),
        }
    }

    #[tokio::test]
    async fn test_secret_credential_provider_bearer_token() {
        let ctx = ctx(&[("AZURE_STORAGE_BEARER_TOKEN", "mytoken")]);

        let cred = SecretCredentialProvider::new()
            .provide_credential(&ctx, None)
            .await
            .unwrap();

        match cred {
            Some(Credential::BearerToken { access_token, .. }) => {
                assert_eq!(access_token, "mytoken")
            }
            _ => panic!("Expected BearerToken credential"),
        }
    }

    #[tokio::test]
    async fn test_secret_credential_provider_none() {
        let cred = SecretCredentialProvider::new()
            .provide_credential(&Context::new(), None)
            .await
            .unwrap();

        assert!(cred.is_none());
    }
}
