//! Kotatsu chat relay server.
//!
//! Clients connect to `/ws`, send their name as the first message, then chat.
//! Every queued message is broadcast to all participants as an HTML fragment.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kotatsu-server
//! cargo run --bin kotatsu-server -- --host 0.0.0.0 --port 8000 --queue-capacity 64
//! ```

use std::time::Duration;

use clap::Parser;
use kotatsu_server::{
    ui::Server,
    usecase::{ChatRoom, RoomConfig},
};
use kotatsu_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "kotatsu-server")]
#[command(about = "WebSocket chat relay broadcasting to a single room", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8000")]
    port: u16,

    /// Pending messages held before senders are blocked
    #[arg(long, default_value = "256")]
    queue_capacity: usize,

    /// Drop a message after waiting this long on a full queue (default: wait forever)
    #[arg(long)]
    enqueue_timeout_ms: Option<u64>,

    /// Give up on a slow client write after this long (0 disables the limit)
    #[arg(long, default_value = "5000")]
    send_timeout_ms: u64,

    /// Keep clients in the room when a write to them fails
    #[arg(long)]
    keep_on_send_failure: bool,

    /// Default log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn room_config(&self) -> RoomConfig {
        RoomConfig {
            queue_capacity: self.queue_capacity,
            enqueue_timeout: self.enqueue_timeout_ms.map(Duration::from_millis),
            send_timeout: (self.send_timeout_ms > 0)
                .then(|| Duration::from_millis(self.send_timeout_ms)),
            evict_on_send_failure: !self.keep_on_send_failure,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = args.room_config();
    tracing::debug!("Room config: {:?}", config);

    let (room, broadcaster) = ChatRoom::start(config);

    let server = Server::new(room);
    let result = server.run(args.host, args.port).await;
    broadcaster.abort();

    if let Err(e) = result {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
