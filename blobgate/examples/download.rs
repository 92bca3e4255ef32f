use anyhow::Result;
use blobgate::{default_context, BlobOperation, BlobOutcome, Gateway, OperationResult};
use std::env;

/// Download a blob through the gateway.
///
/// ```shell
/// BLOBGATE_TOKEN=eyJ... cargo run --example download -- /photos/cat.png
/// ```
///
/// Configuration is read from the environment or a `.env` file.
#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    env_logger::init();

    let path = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: download <path>"))?;
    let token = env::var("BLOBGATE_TOKEN")?;

    let gateway = Gateway::from_env(default_context()).await?;
    let result = gateway.handle(&token, BlobOperation::download(path)).await;

    match &result {
        OperationResult::Succeeded(BlobOutcome::Downloaded { body, properties }) => {
            println!(
                "downloaded {} bytes ({})",
                body.len(),
                properties.content_type.as_deref().unwrap_or("unknown type")
            );
        }
        _ => println!("{} {result}", result.status_code()),
    }

    Ok(())
}
