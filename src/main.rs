use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    conclave::cli::run().await
}
