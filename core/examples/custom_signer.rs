use async_trait::async_trait;
use bytes::Bytes;
use reqexec_core::hash::base64_hmac_sha256;
use reqexec_core::time::{format_http_date, DateTime};
use reqexec_core::{
    Context, Error, Executor, HttpSend, OsSecretStore, ProvideCredential, RateLimiter,
    RequestDescriptor, Result, SignRequest, Signer, SigningCredential,
};
use std::time::Duration;

// Define a custom credential type
#[derive(Clone, Debug)]
struct MyCredential {
    api_key: String,
    api_secret: String,
    expires_at: DateTime,
}

impl SigningCredential for MyCredential {
    fn is_valid(&self, now: DateTime) -> bool {
        !self.api_key.is_empty() && now < self.expires_at
    }
}

// Implement a credential loader that loads from the secret store
#[derive(Debug)]
struct MyCredentialLoader;

#[async_trait]
impl ProvideCredential for MyCredentialLoader {
    type Credential = MyCredential;

    async fn provide_credential(
        &self,
        ctx: &Context,
        _: Option<&Self::Credential>,
    ) -> Result<Option<Self::Credential>> {
        let api_key = ctx.secret("MY_API_KEY").unwrap_or_default();
        let api_secret = ctx.secret("MY_API_SECRET").unwrap_or_default();

        // For demo purposes, use dummy credentials if none are provided
        if api_key.is_empty() || api_secret.is_empty() {
            println!("No credentials found in environment, using demo credentials");
            return Ok(Some(MyCredential {
                api_key: "demo-api-key".to_string(),
                api_secret: "demo-api-secret".to_string(),
                expires_at: ctx.now() + chrono::TimeDelta::minutes(15),
            }));
        }

        Ok(Some(MyCredential {
            api_key,
            api_secret,
            expires_at: ctx.now() + chrono::TimeDelta::minutes(15),
        }))
    }
}

// Implement a request signer
#[derive(Debug)]
struct MyRequestSigner;

#[async_trait]
impl SignRequest for MyRequestSigner {
    type Credential = MyCredential;

    async fn sign_request(
        &self,
        ctx: &Context,
        req: &mut RequestDescriptor,
        credential: Option<&Self::Credential>,
    ) -> Result<()> {
        let cred = credential.ok_or_else(|| Error::authentication("no credential provided"))?;

        let date = format_http_date(ctx.now());
        let string_to_sign = format!("{}\n{}\n{}", req.method, req.path, date);
        let signature = base64_hmac_sha256(cred.api_secret.as_bytes(), string_to_sign.as_bytes())?;

        req.header_set("date", &date)?;
        req.header_set("x-api-key", &cred.api_key)?;
        req.header_set("x-api-signature", &signature)?;

        Ok(())
    }
}

// A transport that prints the request instead of sending it
#[derive(Debug)]
struct PrintHttpSend;

#[async_trait]
impl HttpSend for PrintHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        println!("{} {}", req.method(), req.uri());
        for (name, value) in req.headers() {
            println!("  {name}: {value:?}");
        }

        Ok(http::Response::new(Bytes::new()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let ctx = Context::new()
        .with_http_send(PrintHttpSend)
        .with_secret_store(OsSecretStore);

    let signer = Signer::new(ctx, MyCredentialLoader, MyRequestSigner);
    let executor = Executor::new(signer).with_rate_limit(RateLimiter::new(5.0)?);

    for _ in 0..3 {
        let resp = executor
            .execute_within(
                || RequestDescriptor::new(http::Method::GET, "https://api.example.com/v1/users"),
                Duration::from_secs(10),
            )
            .await?;
        println!("Response status: {}", resp.status());
    }

    Ok(())
}
