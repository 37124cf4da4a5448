use pledge_admin::api::server;
use pledge_admin::DashboardConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DashboardConfig::from_env();
    log::info!("Starting pledge admin console on {}", config.bind_address);

    server::start_server(config).await?;
    Ok(())
}
