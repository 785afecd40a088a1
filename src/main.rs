//! jsonapi-router mock server.
//!
//! Serves a `widgets` resource backed by mock storage, with a to-one
//! `owner`, a to-many `parts`, a `publish` action and a top-level `ping`
//! action, for exploring routing behavior by hand:
//!
//! ```text
//! curl -i -X OPTIONS localhost:8080/api/widgets/1
//! curl -i localhost:8080/api/widgets/1/relationships/parts
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;

use jsonapi_router::config::{load_config, AppConfig};
use jsonapi_router::lifecycle::Shutdown;
use jsonapi_router::observability::{logging, metrics};
use jsonapi_router::store::{self, MockStorage, MockToManyStorage, MockToOneStorage};
use jsonapi_router::{Api, HttpServer, Object, Resource, ResourceOptions};

#[derive(Parser)]
#[command(name = "jsonapi-router")]
#[command(about = "Mock JSON:API server", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

fn mock_api(config: &AppConfig) -> Api {
    let mut widgets = Resource::with_options("widgets", ResourceOptions::from(&config.api));
    widgets
        .crud(Arc::new(MockStorage::new("widgets", 3, json!({ "name": "gear" }))))
        .to_one("owner", Arc::new(MockToOneStorage::new("users", json!({ "name": "ada" }))))
        .to_many("parts", Arc::new(MockToManyStorage::new("parts", json!({ "size": 4 }))))
        .action(
            "publish",
            store::action(|_request| async {
                Ok(Object::new("widgets").with_id("1"))
            }),
            true,
        );

    let mut api = Api::new(&config.api.prefix);
    api.add(widgets).action(
        "ping",
        store::action(|_request| async { Ok(Object::new("pongs").with_id("1")) }),
    );
    api
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("jsonapi-router v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let api = mock_api(&config);
    tracing::debug!("Routes:\n{}", api.route_tree());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        prefix = %api.prefix(),
        request_timeout_secs = config.timeouts.request_secs,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config, &api);
    server.run(listener, shutdown.signalled()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
