// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use async_trait::async_trait;
use reqexec_core::time::DateTime;
use reqexec_core::{Context, ProvideCredential, Result};

use crate::credential::Credential;

/// StaticCredentialProvider always returns the credential it was built with.
#[derive(Clone, Debug)]
pub struct StaticCredentialProvider {
    credential: Credential,
}

impl StaticCredentialProvider {
    /// Create a provider from an existing credential.
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    /// Create a provider for shared key authentication.
    ///
    /// Fails if `account_key` is not valid base64.
    pub fn new_shared_key(account_name: &str, account_key: &str) -> Result<Self> {
        Ok(Self::new(Credential::with_shared_key(
            account_name,
            account_key,
        )?))
    }

    /// Create a provider for SAS token authentication.
    pub fn new_sas_token(sas_token: &str) -> Self {
        Self::new(Credential::with_sas_token(sas_token))
    }

    /// Create a provider for bearer token authentication.
    pub fn new_bearer_token(bearer_token: &str, expires_at: Option<DateTime>) -> Self {
        Self::new(Credential::with_bearer_token(bearer_token, expires_at))
    }
}

#[async_trait]
impl ProvideCredential for StaticCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(
        &self,
        _: &Context,
        _: Option<&Self::Credential>,
    ) -> Result<Option<Self::Credential>> {
        Ok(Some(self.credential.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_credential_provider_shared_key() {
        let provider = StaticCredentialProvider::new_shared_key("myaccount", "a2V5").unwrap();
        let cred = provider
            .provide_credential(&Context::new(), None)
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
    async fn test_static_credential_provider_sas_token() {
        let provider = StaticCredentialProvider::new_sas_token("mysastoken");
        let cred = provider
            .provide_credential(&Context::new(), None)
            .await
            .unwrap();

        match cred {
            Some(Credential::SasToken { token, .. }) => {
                assert_eq!(token, "mysastoken");
            }
            _ => panic!("Expected SasToken credential"),
        }
    }

    #[tokio::test]
    async fn test_static_credential_provider_bearer_token() {
        let provider = StaticCredentialProvider::new_bearer_token("mybearertoken", None);
        let cred = provider
            .provide_credential(&Context::new(), None)
            .await
            .unwrap();

        match cred {
            Some(Credential::BearerToken { access_token, .. }) => {
                assert_eq!(access_token, "mybearertoken");
            }
            _ => panic!("Expected BearerToken credential"),
        }
    }

    #[test]
    fn test_static_credential_provider_invalid_key() {
        let err = StaticCredentialProvider::new_shared_key("myaccount", "mykey!").unwrap_err();
        assert!(err.is_authentication_error());
    }
}
