#[tokio::main]
async fn main() -> anyhow::Result<()> {
    aquifer_server::start().await
}
