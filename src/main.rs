//! CLI for connlb
//!
//! Subcommands:
//! - `server`: run one or more sibling instances on consecutive ports,
//!   sharing an in-process broker
//! - `client`: connect to an instance, optionally send one message, and
//!   print everything received (useful for smoke tests)

use std::sync::Arc;

use clap::Parser;
use connlb::broker::{MemoryBroker, MessageBroker};
use connlb::concept::{ConceptContext, LoadBalanceConcept};
use connlb::config::{Settings, load_config};
use connlb::monitor::HeartbeatMonitor;
use connlb::server::ServerIdentity;
use connlb::transport::{ClientMessage, RoutingListener, start_websocket_server};
use connlb::verifier::WindowedVerifier;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "connlb")]
enum Command {
    /// Start the WebSocket server
    Server {
        /// Number of sibling instances to run (overrides `cluster.instances`)
        #[arg(long)]
        instances: Option<usize>,
    },
    /// Run the example client
    Client {
        /// WebSocket server URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:8080")]
        url: String,
        /// Connection id to send `payload` to
        #[arg(long, requires = "payload")]
        to: Option<String>,
        /// Text to send
        #[arg(long, requires = "to")]
        payload: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cmd = Command::parse();

    match cmd {
        Command::Server { instances } => {
            if let Err(e) = run_server(instances).await {
                // Config may have failed before the subscriber was installed
                connlb::utils::logging::init("info");
                error!("Server failed: {}", e);
            }
        }
        Command::Client { url, to, payload } => {
            connlb::utils::logging::init("info");
            if let Err(e) = run_client(&url, to.zip(payload)).await {
                error!("Client failed: {}", e);
            }
        }
    }
}

async fn run_server(instances: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config()?;
    if let Some(instances) = instances {
        config.cluster.instances = instances;
        connlb::config::validate(&config)?;
    }
    connlb::utils::logging::init(&config.logging.level);

    let broker: Arc<dyn MessageBroker> =
        Arc::new(MemoryBroker::with_deliveries(config.broker.deliveries));

    let mut servers = Vec::new();
    for index in 0..config.cluster.instances {
        let concept = build_instance(&config, index, broker.clone())?;

        HeartbeatMonitor::new(
            concept.clone(),
            config.heartbeat.period(),
            config.heartbeat.timeout(),
        )
        .with_logger(config.heartbeat.logger)
        .with_ping(config.heartbeat.ping)
        .spawn();

        let port = u16::try_from(index)
            .ok()
            .and_then(|offset| config.server.port.checked_add(offset))
            .ok_or("not enough ports for the requested instances")?;
        let addr = format!("{}:{}", config.server.host, port);
        servers.push(start_websocket_server(addr, concept));
    }

    tokio::select! {
        result = futures::future::try_join_all(servers) => {
            if let Err(e) = result {
                error!("WebSocket server exited unexpectedly: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

fn build_instance(
    config: &Settings,
    index: usize,
    broker: Arc<dyn MessageBroker>,
) -> Result<Arc<LoadBalanceConcept>, Box<dyn std::error::Error>> {
    let instance_id = match (&config.identity.instance_id, index) {
        (Some(id), 0) => id.clone(),
        (Some(id), n) => format!("{id}-{n}"),
        (None, _) => uuid::Uuid::new_v4().to_string(),
    };
    let identity = ServerIdentity::new(config.identity.service_id.clone(), Some(instance_id));

    let mut context = ConceptContext::new(identity, broker);
    context.verifier = Arc::new(WindowedVerifier::new(
        config.verifier.capacity,
        config.verifier.ttl(),
    ));

    let concept = LoadBalanceConcept::new(context);
    concept.add_listener(RoutingListener);
    concept.start()?;
    Ok(concept)
}

async fn run_client(
    url: &str,
    request: Option<(String, String)>,
) -> Result<(), Box<dyn std::error::Error>> {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    let (mut ws_stream, _response) = connect_async(url).await?;

    // 1. Read the welcome carrying our connection id
    if let Some(Ok(WsMessage::Text(msg))) = ws_stream.next().await {
        println!("Welcome: {msg}");
    }

    // 2. Optionally send one message
    if let Some((to, payload)) = request {
        let send = ClientMessage::Send { to, payload };
        ws_stream
            .send(WsMessage::Text(serde_json::to_string(&send)?.into()))
            .await?;
    }

    // 3. Print everything else until interrupted
    loop {
        tokio::select! {
            incoming = ws_stream.next() => match incoming {
                Some(Ok(WsMessage::Text(msg))) => println!("Incoming: {msg}"),
                Some(Ok(WsMessage::Close(frame))) => {
                    println!("Closed by server: {frame:?}");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}
