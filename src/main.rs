use replica_admin::config::AgentConfig;
use replica_admin::node::{self, InMemoryAdminNode};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AgentConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_level)?)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut bind_addr: Option<SocketAddr> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" if i + 1 < args.len() => {
                bind_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let bind_addr =
        bind_addr.unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], config.admin_port)));

    let node = Arc::new(InMemoryAdminNode::new(tracing::info_span!(
        "admin_node",
        cluster = %config.cluster,
        addr = %bind_addr
    )));

    // Stats reporter:
    let stats_node = node.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));

        loop {
            interval.tick().await;
            tracing::info!(
                "Node stats: {} databases, {} admin requests served",
                stats_node.database_count(),
                stats_node.request_count()
            );
        }
    });

    tracing::info!("Admin node listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    node::serve(listener, node).await?;

    Ok(())
}
