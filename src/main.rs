use clap::Parser;
use interactive_llm::cli::{Args, InterfaceType};
use interactive_llm::config::AppConfig;
use interactive_llm::core::conversation::DirectoryStore;
use interactive_llm::core::interface::Interface;
use interactive_llm::interfaces::terminal::TerminalInterface;
use interactive_llm::interfaces::web::WebInterface;
use std::io;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = AppConfig::from_file(&args.config)?;
    args.apply_to(&mut config);
    config.validate()?;
    info!(
        "Loaded {} model(s) from {}",
        config.llms.len(),
        args.config.display()
    );

    let config = Arc::new(config);
    let store = DirectoryStore::new(config.export.directory.clone());

    let mut interface: Box<dyn Interface> = match args.interface {
        InterfaceType::Terminal => Box::new(TerminalInterface::new(
            config.clone(),
            args.model.clone(),
            Box::new(store),
            tokio::io::BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        )),
        InterfaceType::Web => Box::new(WebInterface::new(config.clone(), Arc::new(store))),
    };

    info!("Starting {} interface", interface.name());
    interface.init().await?;
    let result = interface.run().await;
    interface.cleanup().await?;
    result
}
