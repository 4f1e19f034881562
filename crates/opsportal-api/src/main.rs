use opsportal_core::Config;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    // Initialize the application (telemetry, database, services, routes)
    let (_state, router) = opsportal_api::setup::initialize_app(config.clone()).await?;

    opsportal_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
