use rgen_anim::{logger, server, Config};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file first
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = Config::from_env();

    let mut logger_config = if config.log_json {
        logger::LoggerConfig::production()
    } else {
        logger::LoggerConfig::development()
    };
    if let Some(path) = &config.log_file {
        logger_config = logger_config.with_file_output(path);
    }
    logger::init_with_config(logger_config)?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    logger::log_startup_info(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        &config.host,
        config.port.unwrap_or(server::DEFAULT_PORT),
    );
    logger::log_config_info(&config);

    server::run(config).await?;
    Ok(())
}
