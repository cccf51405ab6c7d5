#[tokio::main]
async fn main() -> anyhow::Result<()> {
    terminology_proxy_lib::run().await
}
