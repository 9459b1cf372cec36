//! Backend CRI connection handling.
//!
//! The daemon starts serving before containerd's CRI plugin is reachable,
//! so the connection is established lazily: a binder task retries in the
//! background and publishes the client handle exactly once. Until then
//! every incoming call observes an unbound handle and fails with the
//! not-initialized condition.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use hyper_util::rt::TokioIo;
use nixbox_grpc::ImageServiceClient;
use tokio::net::UnixStream;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tonic::transport::{Channel, Endpoint, Uri};
use tower::service_fn;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Shared handle to the upstream CRI image service client.
///
/// Single writer (the binder), many readers (the facade). The transition
/// from unbound to bound happens at most once and never reverts; the lock
/// is held only long enough to clone the client.
#[derive(Clone)]
pub struct Backend {
    inner: Arc<BackendInner>,
}

struct BackendInner {
    client: Mutex<Option<ImageServiceClient<Channel>>>,
    bound_tx: watch::Sender<bool>,
}

impl Backend {
    /// Creates an unbound handle.
    #[must_use]
    pub fn new() -> Self {
        let (bound_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(BackendInner {
                client: Mutex::new(None),
                bound_tx,
            }),
        }
    }

    /// Returns the bound client, if any.
    pub async fn client(&self) -> Option<ImageServiceClient<Channel>> {
        self.inner.client.lock().await.clone()
    }

    /// Publishes the client handle. The first publish wins; later calls
    /// are ignored.
    pub async fn publish(&self, client: ImageServiceClient<Channel>) {
        let mut slot = self.inner.client.lock().await;
        if slot.is_none() {
            *slot = Some(client);
            let _ = self.inner.bound_tx.send(true);
        }
    }

    /// Waits until a client has been published.
    pub async fn bound(&self) {
        let mut rx = self.inner.bound_tx.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Returns whether a client has been published.
    pub async fn is_bound(&self) -> bool {
        self.inner.client.lock().await.is_some()
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::new()
    }
}

/// Connection retry policy for the backend binder.
#[derive(Debug, Clone)]
pub struct BinderConfig {
    /// Address of the backend CRI endpoint. Absolute paths and `unix://`
    /// URIs are dialed as Unix sockets, anything else as TCP.
    pub address: String,
    /// Maximum number of connection attempts before giving up.
    pub attempts: u32,
    /// Delay between attempts.
    pub delay: Duration,
}

impl BinderConfig {
    /// Creates the default policy for `address`: 100 attempts, 10 seconds
    /// apart.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            attempts: 100,
            delay: Duration::from_secs(10),
        }
    }
}

/// Spawns the background task that binds `backend` to the CRI endpoint.
///
/// On the first successful connection the client is published and the task
/// exits. Once the attempt budget is exhausted the task exits with the
/// handle unbound permanently; there are no further retries.
pub fn spawn_binder(backend: Backend, config: BinderConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(address = %config.address, "waiting for backend CRI service");
        for attempt in 1..=config.attempts {
            match connect(&config.address).await {
                Ok(client) => {
                    backend.publish(client).await;
                    info!(address = %config.address, "connected to backend CRI service");
                    return;
                }
                Err(err) => {
                    warn!(attempt, error = %err, "failed to connect to backend CRI service");
                }
            }
            tokio::time::sleep(config.delay).await;
        }
        warn!(address = %config.address, "no connection is available to the backend CRI service");
    })
}

/// Connects to a CRI endpoint over a Unix socket or TCP.
pub async fn connect(address: &str) -> Result<ImageServiceClient<Channel>> {
    let channel = if let Some(path) = unix_socket_path(address) {
        let path = path.to_owned();
        // The URI is required by the endpoint builder but never resolved;
        // the connector dials the socket path instead.
        Endpoint::try_from("http://[::]:50051")?
            .connect_with_connector(service_fn(move |_: Uri| {
                let path = path.clone();
                async move {
                    let stream = UnixStream::connect(path).await?;
                    Ok::<_, std::io::Error>(TokioIo::new(stream))
                }
            }))
            .await?
    } else {
        Endpoint::try_from(format!("http://{address}"))?.connect().await?
    };
    Ok(ImageServiceClient::new(channel))
}

fn unix_socket_path(address: &str) -> Option<&str> {
    if let Some(path) = address.strip_prefix("unix://") {
        Some(path)
    } else if Path::new(address).is_absolute() {
        Some(address)
    } else {
        None
    }
}
