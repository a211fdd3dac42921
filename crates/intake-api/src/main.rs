use intake_api::setup;
use intake_core::Config;

// Use mimalloc as the global allocator for better performance and lower fragmentation,
// especially when running on musl-based systems inside containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (state, router) = setup::initialize_app(config.clone()).await?;

    let sweeper = state.sweeper.clone().start(config.sweep_interval());

    let result = setup::server::start_server(&config, router).await;

    sweeper.abort();

    result
}
