mod args;

use anyhow::Result;

use prism_engine::logging::{LoggingConfig, init_logging};
use prism_engine::window::{Runtime, RuntimeConfig};

fn main() -> Result<()> {
    let config = args::parse(std::env::args().skip(1), |key| std::env::var(key).ok())?;

    init_logging(LoggingConfig {
        env_filter: config.log_filter.clone(),
        ..LoggingConfig::default()
    });

    log::info!("starting prism-viewer ({} mode)", config.renderer.mode.name());

    Runtime::run(RuntimeConfig::default(), config.gpu, config.renderer)
}
