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

use log::debug;
use reqexec_core::hash::base64_decode;
use reqexec_core::time::{parse_rfc3339, DateTime};
use reqexec_core::utils::Redact;
use reqexec_core::{Error, Result, SigningCredential};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

/// Credential enum for different Azure Storage authentication methods.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Shared Key authentication with account name and key
    SharedKey {
        /// Azure storage account name.
        account_name: String,
        /// Raw account key, already decoded from base64.
        account_key: Vec<u8>,
    },
    /// SAS (Shared Access Signature) token authentication
    SasToken {
        /// SAS token in query string form, appended to requests verbatim.
        token: String,
        /// Expiration time for this token, `None` means it never expires.
        expires_at: Option<DateTime>,
    },
    /// Bearer token for OAuth authentication
    BearerToken {
        /// Access token.
        access_token: String,
        /// Expiration time for this token, `None` means it never expires.
        expires_at: Option<DateTime>,
        /// Scope the token was issued for.
        scope: Option<String>,
        /// Claims attached to the token.
        claims: HashMap<String, String>,
    },
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::SharedKey {
                account_name,
                account_key,
            } => f
                .debug_struct("Credential::SharedKey")
                .field("account_name", &account_name)
                .field("account_key", &Redact::from(account_key))
                .finish(),
            Credential::SasToken { token, expires_at } => f
                .debug_struct("Credential::SasToken")
                .field("token", &Redact::from(token))
                .field("expires_at", expires_at)
                .finish(),
            Credential::BearerToken {
                access_token,
                expires_at,
                scope,
                claims,
            } => f
                .debug_struct("Credential::BearerToken")
                .field("access_token", &Redact::from(access_token))
                .field("expires_at", expires_at)
                .field("scope", scope)
                .field("claims", &claims.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

impl SigningCredential for Credential {
    fn is_valid(&self, now: DateTime) -> bool {
        match self {
            Credential::SharedKey {
                account_name,
                account_key,
            } => !account_name.is_empty() && !account_key.is_empty(),
            Credential::SasToken { token, expires_at } => {
                !token.is_empty() && expires_at.map_or(true, |at| now < at)
            }
            Credential::BearerToken {
                access_token,
                expires_at,
                ..
            } => !access_token.is_empty() && expires_at.map_or(true, |at| now < at),
        }
    }
}

impl Credential {
    /// Create a new credential with shared key authentication.
    ///
    /// `account_key` is the base64 encoded key as shown in the Azure portal.
    /// It's decoded once here; a malformed key is an authentication error.
    pub fn with_shared_key(account_name: &str, account_key: &str) -> Result<Self> {
        if account_name.is_empty() {
            return Err(Error::authentication("account name of shared key is empty"));
        }

        let account_key = base64_decode(account_key.trim()).map_err(|e| {
            Error::authentication(format!(
                "account key of {account_name} is not valid base64"
            ))
            .with_source(e)
        })?;
        if account_key.is_empty() {
            return Err(Error::authentication(format!(
                "account key of {account_name} is empty"
            )));
        }

        Ok(Self::SharedKey {
            account_name: account_name.to_string(),
            account_key,
        })
    }

    /// Create a new credential with SAS token authentication.
    ///
    /// The expiry is taken from the token's `se` parameter when present.
    pub fn with_sas_token(sas_token: &str) -> Self {
        let token = sas_token.trim().trim_start_matches('?').to_string();
        let expires_at = sas_token_expiry(&token);

        Self::SasToken { token, expires_at }
    }

    /// Create a new credential with bearer token authentication.
    pub fn with_bearer_token(access_token: &str, expires_at: Option<DateTime>) -> Self {
        Self::BearerToken {
            access_token: access_token.to_string(),
            expires_at,
            scope: None,
            claims: HashMap::new(),
        }
    }

    /// Get the expiration time of this credential if it has one.
    pub fn expires_at(&self) -> Option<DateTime> {
        match self {
            Credential::SharedKey { .. } => None,
            Credential::SasToken { expires_at, .. } => *expires_at,
            Credential::BearerToken { expires_at, .. } => *expires_at,
        }
    }
}

/// Extract the signed expiry (`se`) of a SAS token.
fn sas_token_expiry(token: &str) -> Option<DateTime> {
    let (_, se) = form_urlencoded::parse(token.as_bytes()).find(|(k, _)| k == "se")?;

    match parse_rfc3339(&se) {
        Ok(at) => Some(at),
        Err(err) => {
            debug!("ignore sas token expiry that is not rfc3339: {err}");
            None
        }
    }
}
