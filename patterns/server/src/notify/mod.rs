//! Live notifications pushed to every open WebSocket.
//!
//! The [`ConnectionRegistry`] is created when the server starts, shared
//! through the application state and drained on shutdown.

use askama::Template;
use std::collections::HashSet;
use tokio::sync::{Notify, RwLock, broadcast, watch};
use uuid::Uuid;

pub mod web;

#[derive(Template)]
#[template(path = "partials/notification.html")]
struct NotificationTemplate<'a> {
    message: &'a str,
}

/// A registered connection's view of the registry.
#[derive(Debug)]
pub struct Connection {
    id: Uuid,
    notifications: broadcast::Receiver<String>,
    shutdown: watch::Receiver<bool>,
}

impl Connection {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Waits for the next notification.
    pub async fn next_notification(&mut self) -> Result<String, broadcast::error::RecvError> {
        self.notifications.recv().await
    }

    /// Resolves once the registry starts draining.
    pub async fn draining(&mut self) {
        until_draining(&mut self.shutdown).await
    }
}

async fn until_draining(shutdown: &mut watch::Receiver<bool>) {
    // a dropped sender means the registry is gone, which is just as final
    let _ = shutdown.wait_for(|draining| *draining).await;
}

/// Tracks open WebSocket connections and fans notifications out to them.
#[derive(Debug)]
pub struct ConnectionRegistry {
    connections: RwLock<HashSet<Uuid>>,
    notifications: broadcast::Sender<String>,
    shutdown: watch::Sender<bool>,
    drained: Notify,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    ///
    /// # Arguments
    ///
    /// * `capacity` - How many notifications a slow connection may fall
    ///   behind before it starts skipping them.
    pub fn new(capacity: usize) -> Self {
        let (notifications, _) = broadcast::channel(capacity.max(1));
        let (shutdown, _) = watch::channel(false);
        Self {
            connections: RwLock::new(HashSet::new()),
            notifications,
            shutdown,
            drained: Notify::new(),
        }
    }

    /// Registers a new connection.
    ///
    /// # Returns
    ///
    /// `None` once draining has started.
    pub async fn register(&self) -> Option<Connection> {
        let mut connections = self.connections.write().await;
        if self.is_draining() {
            return None;
        }
        let id = Uuid::new_v4();
        connections.insert(id);
        tracing::debug!(%id, "Registered connection");
        Some(Connection {
            id,
            notifications: self.notifications.subscribe(),
            shutdown: self.shutdown.subscribe(),
        })
    }

    pub async fn unregister(&self, id: Uuid) {
        let mut connections = self.connections.write().await;
        if connections.remove(&id) {
            tracing::debug!(%id, "Unregistered connection");
        }
        if connections.is_empty() {
            self.drained.notify_waiters();
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub fn is_draining(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Sends raw markup to every connection.
    ///
    /// # Returns
    ///
    /// How many connections will receive it.
    pub fn broadcast(&self, html: String) -> usize {
        self.notifications.send(html).unwrap_or(0)
    }

    /// Renders a notification message and broadcasts it.
    pub fn notify(&self, message: &str) -> usize {
        match (NotificationTemplate { message }).render() {
            Ok(html) => self.broadcast(html),
            Err(err) => {
                tracing::error!("Failed to render notification: {}", err);
                0
            }
        }
    }

    /// Refuses new connections, asks open ones to close and waits until every
    /// one of them has unregistered.
    pub async fn drain(&self) {
        self.shutdown.send_replace(true);
        loop {
            let drained = self.drained.notified();
            tokio::pin!(drained);
            drained.as_mut().enable();

            let remaining = self.connection_count().await;
            if remaining == 0 {
                break;
            }
            tracing::info!("Waiting for {} connection(s) to close", remaining);
            drained.await;
        }
        tracing::info!("All connections closed");
    }
}
