use std::net::{IpAddr, SocketAddr};

use anyhow::Result;
use dotenvy::dotenv;
use taskhub::{
    config::config::Config, core::server::create_server, services::snapshot::SnapshotJob,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv().ok();

    let config = Config::load_envs().expect("Failed to load envs");

    let port: u16 = config.port;
    let server_ip_str: String = config.server_ip.clone();
    let server_ip: IpAddr = server_ip_str.parse().unwrap_or(IpAddr::from([0, 0, 0, 0]));
    let addr = SocketAddr::new(server_ip, port);

    let (server, db_conn) = create_server(config.clone()).await?;

    let snapshot_job = SnapshotJob::new(
        db_conn.clone(),
        config.snapshot_hour,
        config.snapshot_minute,
    );
    info!(
        "Starting snapshot job, scheduled daily at {:02}:{:02} UTC",
        config.snapshot_hour, config.snapshot_minute
    );
    snapshot_job.start();

    let server = axum_server::bind(addr).serve(server.into_make_service());
    info!("Server starting on {}", addr);

    if let Err(e) = server.await {
        error!("Server failed: {}", e);
    }

    Ok(())
}
