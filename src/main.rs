use clap::Parser;
use rotor::cli::{
    fetch, handle_completions, handle_config_init, handle_config_validate, load_config, proxies,
    resolve, Cli, Commands, ConfigCommands,
};
use rotor::rotation::Rotator;
use rotor::transport::HttpTransport;
use std::path::Path;
use std::sync::Arc;

fn build_rotator(path: &Path) -> anyhow::Result<Rotator> {
    let config = load_config(path)?;
    let transport = Arc::new(HttpTransport::new(config.transport.clone()));
    Ok(Rotator::new(&config, transport))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result: anyhow::Result<()> = match cli.command {
        Commands::Fetch(args) => fetch::run_fetch(args).await,
        Commands::Proxies(args) => build_rotator(&args.config)
            .and_then(|rotator| proxies::handle_proxies(&args, &rotator))
            .map(|output| println!("{}", output)),
        Commands::Resolve(args) => build_rotator(&args.config)
            .map(|rotator| println!("{}", resolve::handle_resolve(&args, &rotator))),
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
            ConfigCommands::Validate(args) => {
                handle_config_validate(&args).map(|message| println!("{}", message))
            }
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
