//! Antkeeper binary entry point.

use antkeeper::cli::{Cli, Commands, builtin_app, execute_run};
use clap::Parser as _;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    // Deployments register their handlers here, next to the built-ins.
    let app = Arc::new(builtin_app()?);

    match cli.command {
        Commands::Run {
            workflow_name,
            prompt_files,
            initial_state,
            model,
        } => {
            match execute_run(
                app,
                &workflow_name,
                &prompt_files,
                &initial_state,
                model.as_deref(),
            ) {
                Ok(state) => {
                    println!("{}", serde_json::to_string_pretty(&state)?);
                    Ok(())
                }
                Err(error) if error.is_expected() => {
                    eprintln!("{error}");
                    std::process::exit(1);
                }
                Err(error) => Err(error.into()),
            }
        }
        Commands::Serve { host, port } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(antkeeper::server::serve(app, &host, port))
        }
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::new("info")
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();
}
