use clap::Parser;
use std::path::PathBuf;

use crate::config::{AppConfig, StoreBackend};

#[derive(Debug, Parser)]
#[command(name = "car-doctor-api")]
#[command(about = "Car Doctor booking API server")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "Address to bind (defaults to HOST or 0.0.0.0)")]
    pub host: Option<String>,

    #[arg(long, help = "Port to listen on (defaults to PORT or 5000)")]
    pub port: Option<u16>,

    #[arg(long, value_enum, help = "Document store backend")]
    pub store: Option<StoreBackend>,

    #[arg(long, help = "JSON file of documents to preload (memory store only)")]
    pub seed: Option<PathBuf>,
}

impl Cli {
    /// Command-line flags win over environment configuration
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(store) = self.store {
            config.store.backend = store;
        }
    }
}
