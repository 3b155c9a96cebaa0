use bytes::Bytes;
use reqexec_core::{Context, RequestDescriptor, Result};
use reqexec_http_send_reqwest::ReqwestHttpSend;
use reqwest::Client;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Create a custom reqwest client with specific configuration
    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(10)
        .user_agent("reqexec-example/1.0")
        .build()
        .map_err(|e| reqexec_core::Error::config_invalid("failed to build client").with_source(e))?;

    let ctx = Context::new().with_http_send(ReqwestHttpSend::new(client));

    // The per-request timeout overrides the client's one.
    let mut req = RequestDescriptor::new(http::Method::GET, "https://httpbin.org/get")?
        .with_timeout(Duration::from_secs(5));
    req.header_set("x-test-header", "reqexec-example")?;

    match ctx.http_send(req.into_http_request()?).await {
        Ok(resp) => {
            println!("Response status: {}", resp.status());
            for (name, value) in resp.headers() {
                println!("  {name}: {value:?}");
            }

            let body: &Bytes = resp.body();
            if let Ok(text) = std::str::from_utf8(body) {
                println!("\n{text}");
            }
        }
        Err(e) => {
            eprintln!("Request failed: {e}");
        }
    }

    Ok(())
}
