#[tokio::main]
async fn main() -> anyhow::Result<()> {
    identity_api::app::run().await
}
