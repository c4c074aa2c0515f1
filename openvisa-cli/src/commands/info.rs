//! Info command implementation

use anyhow::{Context, Result};
use std::sync::Arc;

use openvisa_backend::SimBackend;
use openvisa_manager::ResourceManager;

pub async fn execute(backend: Arc<SimBackend>, json: bool) -> Result<()> {
    tracing::info!("Collecting environment information");

    let rm = ResourceManager::acquire(backend)
        .await
        .context("Failed to acquire resource manager")?;

    let host = nix::unistd::gethostname()
        .context("Failed to read hostname")?
        .to_string_lossy()
        .into_owned();
    let resources = rm
        .list_resources(Some("?*"))
        .await
        .context("Failed to list resources")?;

    if json {
        let report = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "host": host,
            "backend": rm.identity(),
            "resources": resources,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n🔎 OpenVISA Environment");
        println!("{:-<60}", "");
        println!("Version:  {}", env!("CARGO_PKG_VERSION"));
        println!("Host:     {host}");
        println!("Backend:  {rm}");
        println!("{:-<60}", "");

        if resources.is_empty() {
            println!("No resources found");
        } else {
            println!("Resources:");
            for resource in &resources {
                println!("  • {resource}");
            }
            println!("{:-<60}", "");
            println!("Total: {} resource(s)", resources.len());
        }
    }

    rm.close().await.context("Failed to close resource manager")?;

    Ok(())
}
