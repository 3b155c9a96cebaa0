use crate::provide_credential::{ConnectionStringCredentialProvider, SecretCredentialProvider};
use crate::Credential;
use async_trait::async_trait;
use reqexec_core::{Context, ProvideCredential, ProvideCredentialChain, Result};

/// Default loader that tries multiple credential sources in order.
///
/// The default loader attempts to load credentials from the following sources in order:
/// 1. Connection string (`AZURE_STORAGE_CONNECTION_STRING`)
/// 2. Named secrets (account key, SAS token, bearer token)
#[derive(Debug)]
pub struct DefaultCredentialProvider {
    chain: ProvideCredentialChain<Credential>,
}

impl Default for DefaultCredentialProvider {
    fn default() -> Self {
        let chain = ProvideCredentialChain::new()
            .push(ConnectionStringCredentialProvider::new())
            .push(SecretCredentialProvider::new());

        Self { chain }
    }
}

impl DefaultCredentialProvider {
    /// Create a new default loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Try `provider` before the default sources.
    pub fn push_front(self, provider: impl ProvideCredential<Credential = Credential>) -> Self {
        let chain = ProvideCredentialChain::new()
            .push(provider)
            .push(self.chain);

        Self { chain }
    }
}

#[async_trait]
impl ProvideCredential for DefaultCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(
        &self,
        ctx: &Context,
        previous: Option<&Self::Credential>,
    ) -> Result<Option<Self::Credential>> {
        self.chain.provide_credential(ctx, previous).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provide_credential::StaticCredentialProvider;
    use reqexec_core::StaticSecretStore;

    #[tokio::test]
    async fn test_default_prefers_connection_string() {
        let ctx = Context::new().with_secret_store(StaticSecretStore::from_pairs([
            (
                "AZURE_STORAGE_CONNECTION_STRING",
                "AccountName=fromconn;AccountKey=a2V5",
            ),
            ("AZURE_STORAGE_ACCOUNT_NAME", "fromsecret"),
            ("AZURE_STORAGE_ACCOUNT_KEY", "a2V5"),
        ]));

        let cred = DefaultCredentialProvider::new()
            .provide_credential(&ctx, None)
            .await
            .unwrap();
        match cred {
            Some(Credential::SharedKey { account_name, .. }) => {
                assert_eq!(account_name, "fromconn")
            }
            _ => panic!("Expected SharedKey credential"),
        }
    }

    #[tokio::test]
    async fn test_default_falls_back_to_secrets() {
        let ctx = Context::new().with_secret_store(StaticSecretStore::from_pairs([(
            "AZURE_STORAGE_SAS_TOKEN",
            "sv=2021-01-01&sig=abc",
        )]));

        let cred = DefaultCredentialProvider::new()
            .provide_credential(&ctx, None)
            .await
            .unwrap();
        assert_eq!(cred, Some(Credential::with_sas_token("sv=2021-01-01&sig=abc")));
    }

    #[tokio::test]
    async fn test_default_push_front() {
        let ctx = Context::new().with_secret_store(StaticSecretStore::from_pairs([(
            "AZURE_STORAGE_SAS_TOKEN",
            "sv=2021-01-01&sig=abc",
        )]));

        let cred = DefaultCredentialProvider::new()
            .push_front(StaticCredentialProvider::new_bearer_token("token", None))
            .provide_credential(&ctx, None)
            .await
            .unwrap();
        assert_eq!(cred, Some(Credential::with_bearer_token("token", None)));
    }

    #[tokio::test]
    async fn test_default_none() {
        let cred = DefaultCredentialProvider::new()
            .provide_credential(&Context::new(), None)
            .await
            .unwrap();
        assert!(cred.is_none());
    }
}
