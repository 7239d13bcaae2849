#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();
    fishledger_api::server::init_tracing();

    let config = fishledger_api::config::config().clone();
    fishledger_api::server::run(config).await
}
