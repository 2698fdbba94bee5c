use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    puzlog_cli::cli::app::run().await
}
