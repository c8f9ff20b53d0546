use tessera::logger::*;

fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    trace!("bootstrap trace log");
    debug!("bootstrap debug log");
    info!("bootstrap info log");
    info!(filter = %logger.current_filter()?, "bootstrap filter");

    let config = LogConfig {
        filter: "debug,tessera::infra_memory=trace".to_string(),
    };
    logger.reload_from_config(&config)?;
    trace!("application trace log");
    debug!("application debug log");
    info!("application info log");
    info!(filter = %logger.current_filter()?, "reloaded filter");

    Ok(())
}
