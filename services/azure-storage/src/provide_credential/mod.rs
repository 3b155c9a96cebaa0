mod static_provider;
pub use static_provider::StaticCredentialProvider;

mod secret;
pub use secret::SecretCredentialProvider;

mod refresh;
pub use refresh::RefreshCredentialProvider;

mod connection_string;
pub use connection_string::ConnectionStringCredentialProvider;

mod default;
pub use default::DefaultCredentialProvider;
