//! Push subscription.
//!
//! One WebSocket connection to the notification hub, authenticated with the
//! access token. Incoming `notification` invocations are turned into typed
//! events and sent over a channel; the receiving side is the single consumer
//! that merges them into client state. Reconnects are handled here with a
//! fixed delay.

pub mod protocol;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::errors::ClientError;
use crate::models::Notification;
use protocol::HubMessage;

/// Hub method name carrying notifications.
pub const NOTIFICATION_TARGET: &str = "notification";

/// How often to send keep-alive pings.
const PING_INTERVAL: Duration = Duration::from_secs(15);

/// How long `close` waits for the connection task before aborting it.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

const EVENT_BUFFER: usize = 256;

/// A server-initiated event.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Notification(Notification),
}

impl PushEvent {
    /// Map a hub invocation to an event. The first argument is the payload and
    /// is kept as sent. Unknown targets and invocations without arguments
    /// yield `None`.
    pub fn from_invocation(target: &str, arguments: Vec<Value>) -> Option<Self> {
        if !target.eq_ignore_ascii_case(NOTIFICATION_TARGET) {
            tracing::debug!("Ignoring hub invocation {}", target);
            return None;
        }
        match arguments.into_iter().next() {
            Some(payload) => Some(PushEvent::Notification(Notification::new(payload))),
            None => {
                tracing::warn!("Notification invocation carried no payload");
                None
            }
        }
    }
}

/// Hub URL with the access token attached as query parameter.
pub fn hub_url(push_url: &str, access_token: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(push_url)
        .map_err(|e| ClientError::Push(format!("Invalid push URL {}: {}", push_url, e)))?;
    url.query_pairs_mut().append_pair("access_token", access_token);
    Ok(url)
}

/// Why a single connection ended.
#[derive(Debug)]
enum Disconnect {
    Shutdown,
    Closed {
        error: Option<String>,
        allow_reconnect: bool,
    },
    Ended,
}

/// A running push subscription.
pub struct PushSubscription {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PushSubscription {
    /// Start the connection task. Events arrive on the returned receiver in
    /// arrival order.
    pub fn open(
        push_url: &str,
        access_token: &str,
        reconnect_delay: Duration,
    ) -> Result<(Self, mpsc::Receiver<PushEvent>), ClientError> {
        let url = hub_url(push_url, access_token)?;
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(run(url, reconnect_delay, events_tx, shutdown_rx));

        Ok((
            Self {
                shutdown: shutdown_tx,
                task: Some(task),
            },
            events_rx,
        ))
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the connection and wait for the task to exit.
    pub async fn close(mut self) {
        self.shutdown.send_replace(true);
        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(CLOSE_TIMEOUT, &mut task).await.is_err() {
                tracing::warn!("Push task did not stop in time; aborting");
                task.abort();
            }
        }
    }
}

impl Drop for PushSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(
    url: Url,
    reconnect_delay: Duration,
    events: mpsc::Sender<PushEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            return;
        }

        match connection(&url, &events, &mut shutdown).await {
            Ok(Disconnect::Shutdown) => return,
            Ok(Disconnect::Closed {
                error,
                allow_reconnect: false,
            }) => {
                tracing::info!(
                    "Push channel closed by server: {}",
                    error.as_deref().unwrap_or("no reason given")
                );
                return;
            }
            Ok(Disconnect::Closed { error, .. }) => {
                tracing::info!(
                    "Push channel closed by server, reconnecting: {}",
                    error.as_deref().unwrap_or("no reason given")
                );
            }
            Ok(Disconnect::Ended) => tracing::info!("Push channel dropped, reconnecting"),
            Err(ClientError::Unauthorized(msg)) => {
                tracing::warn!("Push channel not authorized: {}", msg);
                return;
            }
            Err(e) => tracing::warn!("Push channel error: {}", e),
        }

        if events.is_closed() {
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(reconnect_delay) => {}
            _ = shutdown.changed() => return,
        }
    }
}

async fn connection(
    url: &Url,
    events: &mpsc::Sender<PushEvent>,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<Disconnect, ClientError> {
    let (socket, _) = connect_async(url.as_str()).await?;
    let (mut sink, mut stream) = socket.split();

    sink.send(Message::text(protocol::handshake_request()))
        .await?;

    let mut handshake_done = false;
    let mut ping = tokio::time::interval(PING_INTERVAL);
    ping.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if let Err(e) = sink.send(Message::Close(None)).await {
                    tracing::debug!("Could not send close frame: {}", e);
                }
                return Ok(Disconnect::Shutdown);
            }
            _ = ping.tick() => {
                if handshake_done {
                    sink.send(Message::text(protocol::ping_record())).await?;
                }
            }
            frame = stream.next() => {
                let Some(frame) = frame else {
                    return Ok(Disconnect::Ended);
                };
                let text = match frame? {
                    Message::Text(text) => text,
                    Message::Close(_) => return Ok(Disconnect::Ended),
                    _ => continue,
                };

                for record in protocol::split_records(text.as_str()) {
                    if !handshake_done {
                        protocol::check_handshake(record)?;
                        handshake_done = true;
                        tracing::info!("Push channel connected");
                        continue;
                    }

                    match protocol::parse_message(record) {
                        Ok(HubMessage::Invocation { target, arguments }) => {
                            if let Some(event) = PushEvent::from_invocation(&target, arguments) {
                                if events.send(event).await.is_err() {
                                    return Ok(Disconnect::Shutdown);
                                }
                            }
                        }
                        Ok(HubMessage::Close { error, allow_reconnect }) => {
                            return Ok(Disconnect::Closed { error, allow_reconnect });
                        }
                        Ok(_) => {}
                        Err(e) => tracing::warn!("Skipping hub record: {}", e),
                    }
                }
            }
        }
    }
}
