use anyhow::Result;
use std::sync::Arc;

use openvisa_backend::SimBackend;

use crate::cli::{Cli, Commands};

pub mod info;
pub mod shell;

/// Dispatch command to appropriate handler
pub async fn dispatch(cli: Cli) -> Result<()> {
    let backend = if cli.resources.is_empty() {
        Arc::new(SimBackend::new(&cli.backend))
    } else {
        Arc::new(SimBackend::with_resources(&cli.backend, &cli.resources)?)
    };

    match cli.command {
        Commands::Info { json } => info::execute(backend, json).await,
        Commands::Shell => shell::execute(backend).await,
    }
}
