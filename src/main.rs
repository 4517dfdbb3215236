use video_range_server::config::{self, Config};
use video_range_server::error::ServerError;
use video_range_server::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional first argument: config file path (extension optional)
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path).map_err(ServerError::from)?;

    logger::init(&cfg).map_err(ServerError::Logger)?;

    // Create the Tokio runtime, sized by the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(server::run(cfg))?;
    Ok(())
}
