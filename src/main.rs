// lightlink binary
// Parses the endpoint configuration, brings up the selected interface
// and dispatches the supervisor's cooperative task queue forever.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lightlink::config::{EndpointConfig, SocketKind, TransportScheme, DEFAULT_LIGHT_CONTROL_GROUP};
use lightlink::runtime::{RuntimeContext, SimulatedLed, Task};
use lightlink::supervisor::ConnectionSupervisor;
use lightlink::transport::{CellularConfig, CellularInterface, EthernetInterface, NetworkInterface};

/// Maintain a LightControl echo session over the configured transport.
#[derive(Debug, Parser)]
#[command(name = "lightlink", version, about)]
struct Args {
    /// Network transport carrying the session
    #[arg(long, value_enum, default_value_t = TransportScheme::Ethernet)]
    scheme: TransportScheme,

    /// Socket kind used for the exchange
    #[arg(long = "socket", value_enum, default_value_t = SocketKind::Udp)]
    kind: SocketKind,

    /// Echo server hostname or literal address
    #[arg(long, default_value = "echo.mbedcloudtesting.com")]
    host: String,

    /// Echo server port
    #[arg(long, default_value_t = 7)]
    port: u16,

    /// Local light control group (0-999)
    #[arg(long, default_value_t = DEFAULT_LIGHT_CONTROL_GROUP)]
    group: u16,

    /// Blocking socket timeout in milliseconds
    #[arg(long, default_value_t = 60_000)]
    timeout_ms: u64,

    /// Delay between exchange rounds in milliseconds (0 disables pacing)
    #[arg(long, default_value_t = 1_000)]
    pacing_ms: u64,

    /// Cellular access point name
    #[arg(long, default_value = "internet")]
    apn: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        scheme = %args.scheme,
        socket = %args.kind,
        host = %args.host,
        port = args.port,
        "lightlink starting"
    );

    let config = EndpointConfig::new(&args.host, args.port, args.scheme, args.kind)
        .with_group(args.group)
        .with_socket_timeout(Duration::from_millis(args.timeout_ms))
        .with_pacing(Duration::from_millis(args.pacing_ms));

    let interface: Arc<dyn NetworkInterface> = match args.scheme {
        TransportScheme::Cellular4gLte => {
            Arc::new(CellularInterface::new(CellularConfig::new(&args.apn)))
        }
        // Mesh schemes fail configuration validation below, before any
        // interface is touched.
        _ => Arc::new(EthernetInterface::new()),
    };

    let ctx = Arc::new(RuntimeContext::new(Box::new(SimulatedLed)));
    let mut supervisor = match ConnectionSupervisor::new(config, interface, ctx) {
        Ok(supervisor) => supervisor,
        Err(e) => {
            error!(error = %e, "invalid configuration; refusing to start");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = supervisor.scheduler();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.post(Task::Shutdown);
        }
    });

    supervisor.setup().await;
    supervisor.run().await;

    info!("lightlink exiting");
    ExitCode::SUCCESS
}
