//! Live update channel over a WebSocket.
//!
//! A [`LiveChannel`] owns one socket at a time, driven by a background task.
//! The handle and the task share three things:
//!
//! - the [`EventLog`] of every received frame, parsed into a [`LiveEvent`]
//!   (frames that are not JSON are kept as `raw` events, never dropped),
//! - the [`ChannelState`] (`Connecting`, `Open`, `Closed`), published on a
//!   `watch` channel,
//! - the sequence number of the latest event, also on a `watch` channel, so
//!   consumers can wake on new events without polling.
//!
//! Outbound messages go through an unbounded queue. [`LiveChannel::send`]
//! refuses them unless the socket is open, and anything still queued when the
//! socket drops is discarded.
//!
//! Dropping the handle aborts the task and with it the socket.

use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use matsya_common::events::LiveEvent;

use crate::error::ClientResult;
use crate::transport::{chat_path, HttpTransport, UPDATES_PATH};

mod event_log;
mod reconnect;

pub use self::event_log::{EventLog, Observed};
pub use self::reconnect::ReconnectPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// Events retained in memory; `None` keeps all of them.
    pub capacity: Option<usize>,
    pub reconnect: ReconnectPolicy,
    /// How long [`LiveChannel::close`] waits for a clean close handshake.
    pub close_timeout: Duration,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            capacity: Some(500),
            reconnect: ReconnectPolicy::Never,
            close_timeout: Duration::from_secs(2),
        }
    }
}

struct Shared {
    log: Mutex<EventLog>,
    state: watch::Sender<ChannelState>,
    latest_seq: watch::Sender<u64>,
}

impl Shared {
    fn record_frame(&self, text: &str) {
        let event = LiveEvent::from_frame(text);
        if let LiveEvent::Raw { .. } = event {
            debug!("Non-JSON frame kept as raw event ({} bytes)", text.len());
        }
        let seq = self.log.lock().push(event);
        self.latest_seq.send_replace(seq);
    }

    fn set_state(&self, state: ChannelState) {
        self.state.send_replace(state);
    }
}

/// Read access to a channel's events that can be moved into another task.
#[derive(Clone)]
pub struct EventFeed {
    shared: Arc<Shared>,
    latest_seq: watch::Receiver<u64>,
}

impl EventFeed {
    /// Wait until at least one event newer than the last wake-up arrives.
    pub async fn changed(&mut self) {
        // The sender lives in `shared`, which this feed keeps alive.
        if self.latest_seq.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    pub fn latest_seq(&self) -> u64 {
        *self.latest_seq.borrow()
    }

    pub fn since(&self, seq: u64) -> Vec<Observed> {
        self.shared.log.lock().since(seq)
    }
}

pub struct LiveChannel {
    url: Url,
    shared: Arc<Shared>,
    outbound: Option<mpsc::UnboundedSender<Message>>,
    task: Option<JoinHandle<()>>,
    close_timeout: Duration,
}

impl LiveChannel {
    /// Open a channel to `url` and start its driver task.
    ///
    /// Must be called from within a Tokio runtime. The channel starts in
    /// `Connecting`; connection failures are reported through the state, not
    /// returned.
    pub fn connect(url: Url, options: ChannelOptions) -> Self {
        let (state, _) = watch::channel(ChannelState::Connecting);
        let (latest_seq, _) = watch::channel(0);
        let shared = Arc::new(Shared {
            log: Mutex::new(EventLog::new(options.capacity)),
            state,
            latest_seq,
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(drive(
            url.clone(),
            Arc::clone(&shared),
            rx,
            options.reconnect,
        ));
        Self {
            url,
            shared,
            outbound: Some(tx),
            task: Some(task),
            close_timeout: options.close_timeout,
        }
    }

    /// The server's broadcast channel, `/ws/updates`.
    pub fn updates(transport: &HttpTransport, options: ChannelOptions) -> ClientResult<Self> {
        Ok(Self::connect(transport.ws_url(UPDATES_PATH)?, options))
    }

    /// A per-user chat channel, `/ws/chat/{user_id}`.
    pub fn chat(
        transport: &HttpTransport,
        user_id: &str,
        options: ChannelOptions,
    ) -> ClientResult<Self> {
        Ok(Self::connect(transport.ws_url(&chat_path(user_id))?, options))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn state(&self) -> ChannelState {
        *self.shared.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ChannelState::Open
    }

    pub fn state_changes(&self) -> watch::Receiver<ChannelState> {
        self.shared.state.subscribe()
    }

    pub fn feed(&self) -> EventFeed {
        EventFeed {
            shared: Arc::clone(&self.shared),
            latest_seq: self.shared.latest_seq.subscribe(),
        }
    }

    /// Every retained event, oldest first.
    pub fn events(&self) -> Vec<Observed> {
        self.shared.log.lock().snapshot()
    }

    pub fn events_since(&self, seq: u64) -> Vec<Observed> {
        self.shared.log.lock().since(seq)
    }

    pub fn latest(&self) -> Option<Observed> {
        self.shared.log.lock().latest().cloned()
    }

    /// Queue a JSON message. Returns `false`, and drops the message, unless
    /// the socket is open. Delivery is not confirmed either way.
    pub fn send(&self, message: &Value) -> bool {
        if !self.is_connected() {
            debug!("Dropping outbound message, channel is not open");
            return false;
        }
        match &self.outbound {
            Some(tx) => tx.send(Message::Text(message.to_string())).is_ok(),
            None => false,
        }
    }

    /// Close the socket and wait for the driver to finish.
    ///
    /// The driver gets `close_timeout` to complete the close handshake before
    /// it is aborted. The channel ends `Closed` in both cases.
    pub async fn close(&mut self) {
        self.outbound.take();
        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(self.close_timeout, &mut task)
                .await
                .is_err()
            {
                warn!("Live channel {} did not close in time, aborting", self.url);
                task.abort();
            }
        }
        self.shared.set_state(ChannelState::Closed);
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

enum Disconnect {
    Remote,
    Requested,
}

async fn drive(
    url: Url,
    shared: Arc<Shared>,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    policy: ReconnectPolicy,
) {
    let mut attempt = 0u32;
    loop {
        shared.set_state(ChannelState::Connecting);
        match connect_async(url.as_str()).await {
            Ok((stream, _)) => {
                attempt = 0;
                info!("Live channel open: {url}");
                shared.set_state(ChannelState::Open);
                let reason = pump(stream, &shared, &mut outbound).await;
                shared.set_state(ChannelState::Closed);
                let mut discarded = 0;
                while outbound.try_recv().is_ok() {
                    discarded += 1;
                }
                if discarded > 0 {
                    debug!("Discarded {discarded} unsent messages for {url}");
                }
                if let Disconnect::Requested = reason {
                    info!("Live channel closed by client: {url}");
                    return;
                }
                info!("Live channel closed: {url}");
            }
            Err(e) => {
                warn!("Live channel could not connect to {url}: {e}");
                shared.set_state(ChannelState::Closed);
            }
        }

        attempt += 1;
        let Some(delay) = policy.delay(attempt) else {
            return;
        };
        debug!("Reconnecting to {url} in {delay:?} (attempt {attempt})");
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => break,
                message = outbound.recv() => {
                    if message.is_none() {
                        return;
                    }
                }
            }
        }
    }
}

async fn pump(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    shared: &Shared,
    outbound: &mut mpsc::UnboundedReceiver<Message>,
) -> Disconnect {
    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => shared.record_frame(&text),
                Some(Ok(Message::Binary(bytes))) => {
                    shared.record_frame(&String::from_utf8_lossy(&bytes));
                }
                Some(Ok(Message::Close(_))) | None => return Disconnect::Remote,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Live channel read failed: {e}");
                    return Disconnect::Remote;
                }
            },
            message = outbound.recv() => match message {
                Some(message) => {
                    if let Err(e) = sink.send(message).await {
                        warn!("Live channel write failed: {e}");
                        return Disconnect::Remote;
                    }
                }
                None => {
                    if let Err(e) = sink.close().await {
                        debug!("Close handshake failed: {e}");
                    }
                    return Disconnect::Requested;
                }
            },
        }
    }
}
