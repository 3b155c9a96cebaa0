use std::collections::HashMap;

use reqexec_core::{Error, Result};

use crate::constants::{AZURITE_ACCOUNT_KEY, AZURITE_ACCOUNT_NAME};
use crate::Credential;

/// A parsed [Azure storage connection string][1].
///
/// [1]: https://learn.microsoft.com/en-us/azure/storage/common/storage-configure-connection-string
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionString {
    key_values: HashMap<String, String>,
}

impl std::fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.key_values.keys().collect();
        keys.sort();
        f.debug_struct("ConnectionString")
            .field("account_name", &self.account_name())
            .field("keys", &keys)
            .finish()
    }
}

impl ConnectionString {
    /// Parse a connection string like `AccountName=a;AccountKey=k`.
    ///
    /// Unknown keys are kept and ignored; a field without `=` is a
    /// configuration error.
    pub fn parse(conn_str: &str) -> Result<Self> {
        let key_values = conn_str
            .trim()
            .replace('\n', "")
            .split(';')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(|field| {
                let (key, value) = field.split_once('=').ok_or_else(|| {
                    Error::config_invalid(format!(
                        "invalid connection string, expected '=' in field: {field}"
                    ))
                })?;
                Ok((key.trim().to_string(), value.trim().to_string()))
            })
            .collect::<Result<_>>()?;

        Ok(Self { key_values })
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.key_values.get(key).map(String::as_str)
    }

    fn is_development_storage(&self) -> bool {
        self.get("UseDevelopmentStorage") == Some("true")
    }

    /// Account name, falling back to the Azurite account for development storage.
    pub fn account_name(&self) -> Option<&str> {
        match self.get("AccountName") {
            Some(v) => Some(v),
            None if self.is_development_storage() => Some(AZURITE_ACCOUNT_NAME),
            None => None,
        }
    }

    /// Base64 encoded account key, falling back to the Azurite key for
    /// development storage.
    pub fn account_key(&self) -> Option<&str> {
        match self.get("AccountKey") {
            Some(v) => Some(v),
            None if self.is_development_storage() => Some(AZURITE_ACCOUNT_KEY),
            None => None,
        }
    }

    /// SAS token.
    pub fn sas_token(&self) -> Option<&str> {
        self.get("SharedAccessSignature")
    }

    /// Credential carried by this connection string.
    ///
    /// A SAS token is preferred over an account key. Returns `None` when the
    /// connection string carries neither.
    pub fn credential(&self) -> Result<Option<Credential>> {
        if let Some(token) = self.sas_token() {
            return Ok(Some(Credential::with_sas_token(token)));
        }

        match (self.account_name(), self.account_key()) {
            (Some(name), Some(key)) => Credential::with_shared_key(name, key).map(Some),
            _ => Ok(None),
        }
    }
}
