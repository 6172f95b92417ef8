use clap::Parser;
use portal_nav::cli::commands::{cmd_graph, cmd_run};
use portal_nav::cli::config::{Cli, Commands, load_config};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Run {
            site,
            spec,
            base_url,
            output,
        } => {
            let all_passed = cmd_run(&site, &spec, base_url.as_deref(), output.as_deref(), &config)?;
            if !all_passed {
                std::process::exit(1);
            }
        }
        Commands::Graph { site } => cmd_graph(&site)?,
    }

    Ok(())
}
