use async_trait::async_trait;
use log::debug;
use reqexec_core::{Context, ProvideCredential, Result};

use crate::connection_string::ConnectionString;
use crate::constants::AZURE_STORAGE_CONNECTION_STRING;
use crate::credential::Credential;

/// ConnectionStringCredentialProvider loads credentials from an Azure
/// storage connection string.
///
/// The connection string is either given explicitly or read from the
/// `AZURE_STORAGE_CONNECTION_STRING` secret.
#[derive(Clone, Debug, Default)]
pub struct ConnectionStringCredentialProvider {
    connection_string: Option<ConnectionString>,
}

impl ConnectionStringCredentialProvider {
    /// Create a provider reading `AZURE_STORAGE_CONNECTION_STRING` from the
    /// secret store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider for the given connection string.
    pub fn with_connection_string(conn_str: &str) -> Result<Self> {
        Ok(Self {
            connection_string: Some(ConnectionString::parse(conn_str)?),
        })
    }
}

#[async_trait]
impl ProvideCredential for ConnectionStringCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(
        &self,
        ctx: &Context,
        _: Option<&Self::Credential>,
    ) -> Result<Option<Self::Credential>> {
        let conn_str = match &self.connection_string {
            Some(v) => v.clone(),
            None => match ctx.secret(AZURE_STORAGE_CONNECTION_STRING) {
                Some(v) => ConnectionString::parse(&v)?,
                None => return Ok(None),
            },
        };

        let cred = conn_str.credential()?;
        if cred.is_some() {
            debug!("loaded credential from connection string: {conn_str:?}");
        }
        Ok(cred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqexec_core::{ErrorKind, StaticSecretStore};

    #[tokio::test]
    async fn test_connection_string_explicit() {
        let provider = ConnectionStringCredentialProvider::with_connection_string(
            "DefaultEndpointsProtocol=https;AccountName=myaccount;AccountKey=a2V5;EndpointSuffix=core.windows.net",
        )
        .unwrap();

        let cred = provider
            .provide_credential(&Context::new(), None)
            .await
            .unwrap();
        assert_eq!(
            cred,
            Some(Credential::with_shared_key("myaccount", "a2V5").unwrap())
        );
    }

    #[tokio::test]
    async fn test_connection_string_from_secret() {
        let ctx = Context::new().with_secret_store(StaticSecretStore::from_pairs([(
            "AZURE_STORAGE_CONNECTION_STRING",
            "BlobEndpoint=https://myaccount.blob.core.windows.net;SharedAccessSignature=sv=2021-01-01&sig=abc",
        )]));

        let cred = ConnectionStringCredentialProvider::new()
            .provide_credential(&ctx, None)
            .await
            .unwrap();
        assert_eq!(cred, Some(Credential::with_sas_token("sv=2021-01-01&sig=abc")));
    }

    #[tokio::test]
    async fn test_connection_string_absent_or_invalid() {
        let cred = ConnectionStringCredentialProvider::new()
            .provide_credential(&Context::new(), None)
            .await
            .unwrap();
        assert!(cred.is_none());

        let ctx = Context::new().with_secret_store(StaticSecretStore::from_pairs([(
            "AZURE_STORAGE_CONNECTION_STRING",
            "AccountName",
        )]));
        let err = ConnectionStringCredentialProvider::new()
            .provide_credential(&ctx, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }
}
