mod cli;

use youtube_fetch_lib::{build_service, check_tool, config, server};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "youtube_fetch=debug,tower_http=info".to_string()
        } else {
            "youtube_fetch=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    let mut config = config::load_config_or_default(cli.config.as_deref())?;
    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            rt.block_on(server::start_server(config))
        }
        Commands::CheckTool => rt.block_on(run_check_tool(&config)),
        Commands::Info { url } => rt.block_on(run_info(&config, &url)),
    }
}

async fn run_check_tool(config: &config::Config) -> Result<()> {
    let info = check_tool(config).await;

    if info.is_available {
        print!("✓ {}", info.name);
        if let Some(ref version) = info.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }
        if let Some(ref path) = info.path {
            print!(" - {}", path);
        }
        println!();
        Ok(())
    } else {
        println!("✗ {}", info.name);
        anyhow::bail!("{} is not available; install it or set tool.binary in the config", info.name)
    }
}

async fn run_info(config: &config::Config, url: &str) -> Result<()> {
    let record = build_service(config).fetch_info(url).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
