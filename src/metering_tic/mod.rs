use crate::config::TicConfig;
use crate::transport::{SerialSettings, TicTransport, TransportError};
use frame_reader::{FrameLine, FrameReader};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use structs::{DecodedField, SessionState, TicValue, WireMode};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;

pub mod structs;
pub mod utils;
pub mod parser;
pub mod frame_reader;
pub mod tag_definitions;

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum TicParseError {
    #[error("{count} fields detected in {mode} mode")]
    FieldCount { mode: WireMode, count: usize },
    #[error("the {field} field is not 7-bit ASCII")]
    NotAscii { field: &'static str },
    #[error("{0}")]
    InvalidChecksum(#[from] InvalidChecksum),
}

/// Everything needed to replay a checksum failure from the logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidChecksum {
    pub tag: String,
    pub timestamp: Option<String>,
    pub value: String,
    pub s1: u32,
    pub truncated: u32,
    pub computed: u32,
    pub expected: u8,
}

impl fmt::Display for InvalidChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({}) | s1 {} {:#b} | truncated {} {:#b} {:?} | computed {} {:#b} {:?} | expected {} {:#b} {:?}",
            self.tag,
            self.value,
            self.timestamp.as_deref().unwrap_or("None"),
            self.s1,
            self.s1,
            self.truncated,
            self.truncated,
            char::from_u32(self.truncated).unwrap_or('?'),
            self.computed,
            self.computed,
            char::from_u32(self.computed).unwrap_or('?'),
            self.expected,
            self.expected,
            self.expected as char,
        )
    }
}

impl std::error::Error for InvalidChecksum {}

struct SessionShared {
    state: RwLock<SessionState>,
    values: RwLock<HashMap<String, TicValue>>,
    stop: watch::Sender<bool>,
}

/// Keeps a TIC serial connection alive and stores the last value of every tag.
///
/// Clones share the same session: one clone drives `run`, the others query
/// values or call `stop` from anywhere.
pub struct ReaderSession<T: TicTransport> {
    settings: SerialSettings,
    mode: WireMode,
    reconnect_delay: Duration,
    transport: Arc<T>,
    shared: Arc<SessionShared>,
}

impl<T: TicTransport> Clone for ReaderSession<T> {
    fn clone(&self) -> Self {
        ReaderSession {
            settings: self.settings.clone(),
            mode: self.mode,
            reconnect_delay: self.reconnect_delay,
            transport: self.transport.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<T: TicTransport> ReaderSession<T> {
    pub fn new(port: &str, mode: WireMode, transport: T) -> Self {
        let (stop, _) = watch::channel(false);

        ReaderSession {
            settings: SerialSettings::for_mode(port, mode),
            mode,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            transport: Arc::new(transport),
            shared: Arc::new(SessionShared {
                state: RwLock::new(SessionState::Disconnected),
                values: RwLock::new(HashMap::new()),
                stop,
            }),
        }
    }

    pub fn from_config(config: &TicConfig, transport: T) -> Self {
        Self::new(&config.port, WireMode::from_standard_flag(config.standard_mode), transport)
            .with_reconnect_delay(Duration::from_secs(config.reconnect_delay))
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn mode(&self) -> WireMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    /// Last (value, timestamp) of a tag, both absent while not connected
    pub fn current_value(&self, tag: &str) -> (Option<String>, Option<String>) {
        if !self.is_connected() {
            warn!("{} requested while the serial connection is not ready", tag);
            return (None, None);
        }

        let values = self.shared.values.read().unwrap_or_else(PoisonError::into_inner);
        match values.get(tag) {
            Some(v) => (Some(v.value.clone()), v.timestamp.clone()),
            None => {
                warn!("No value received for {} yet (it could be normal if the serial connection was just opened)", tag);
                (None, None)
            }
        }
    }

    pub fn snapshot(&self) -> HashMap<String, TicValue> {
        self.shared.values.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Requests the read loop to close the connection and exit. Never reconnects afterwards.
    pub fn stop(&self) {
        let was_stopped = self.shared.stop.send_replace(true);
        if was_stopped {
            debug!("Stop already requested for {}", self.settings.port);
        } else {
            info!("Stop received: closing the serial connection to {}", self.settings.port);
        }

        self.transition(SessionState::Stopped);
    }

    fn stop_requested(&self) -> bool {
        *self.shared.stop.borrow()
    }

    /// Moves to `next`, clearing the values unless connected. Nothing leaves `Stopped`.
    fn transition(&self, next: SessionState) -> bool {
        let mut state = self.shared.state.write().unwrap_or_else(PoisonError::into_inner);
        if *state == SessionState::Stopped && next != SessionState::Stopped {
            return false;
        }

        if *state != next {
            debug!("TIC session {} -> {}", state.to_string(), next.to_string());
        }
        *state = next;

        if next != SessionState::Connected {
            self.shared.values.write().unwrap_or_else(PoisonError::into_inner).clear();
        }

        true
    }

    /// The main working loop, returns once the session is stopped
    pub async fn run(&self) {
        let mut stop_rx = self.shared.stop.subscribe();

        info!("Starting TIC reader on {} in {} mode", self.settings.port, self.mode);
        loop {
            if self.stop_requested() {
                break;
            }

            info!("Connecting to serial device {}", self.settings.connection_info());
            let opened = tokio::select! {
                biased;
                _ = stop_rx.wait_for(|stop| *stop) => break,
                opened = self.transport.open(&self.settings) => opened,
            };
            let stream = match opened {
                Ok(stream) => stream,
                Err(e) => {
                    error!("{}. Will retry in {}s", e, self.reconnect_delay.as_secs());
                    self.transition(SessionState::Disconnected);
                    if !self.wait_before_reconnect(&mut stop_rx).await {
                        break;
                    }
                    continue;
                }
            };

            if !self.transition(SessionState::AwaitingFirstLine) {
                break;
            }
            info!("Serial device {} open, waiting for the first complete line", self.settings.port);

            match self.read_stream(stream, &mut stop_rx).await {
                Ok(()) => break,
                Err(e) => {
                    error!(
                        "Error while reading serial device {}: {}. Will retry in {}s",
                        self.settings.port,
                        e,
                        self.reconnect_delay.as_secs()
                    );
                    self.transition(SessionState::Disconnected);
                    if !self.wait_before_reconnect(&mut stop_rx).await {
                        break;
                    }
                }
            }
        }

        self.transition(SessionState::Stopped);
        debug!("exiting read loop");
    }

    /// Reads lines until the stream fails or a stop is requested (`Ok`)
    async fn read_stream(&self, stream: T::Stream, stop_rx: &mut watch::Receiver<bool>) -> Result<(), TransportError> {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut frames = FrameReader::new(reader);

        loop {
            let next = tokio::select! {
                biased;
                _ = stop_rx.wait_for(|stop| *stop) => None,
                line = frames.next_line() => Some(line),
            };

            match next {
                None => {
                    if let Err(e) = writer.shutdown().await {
                        debug!("Closing serial device {} failed: {}", self.settings.port, e);
                    }
                    frames.discard();
                    return Ok(());
                }
                Some(Ok(FrameLine::Partial(line))) => {
                    debug!("skipping first line: {:?}", line.escape_ascii().to_string());
                    self.transition(SessionState::Connected);
                }
                Some(Ok(FrameLine::Aligned(line))) => self.handle_line(&line),
                Some(Err(e)) => {
                    if let Err(close_err) = writer.shutdown().await {
                        debug!("Closing serial device {} failed: {}", self.settings.port, close_err);
                    }
                    return Err(e);
                }
            }
        }
    }

    fn handle_line(&self, line: &[u8]) {
        let printable = line.escape_ascii().to_string();
        debug!("line to parse: {:?}", printable);

        match parser::parse_line(line, self.mode) {
            Ok(field) => self.store(field),
            Err(TicParseError::InvalidChecksum(ic)) => {
                error!("failed to validate the checksum of line {:?}: {}", printable, ic);
            }
            Err(e) => {
                error!("failed to parse the following line in {} mode: {:?}: {}", self.mode, printable, e);
            }
        }
    }

    fn store(&self, field: DecodedField) {
        let state = self.shared.state.read().unwrap_or_else(PoisonError::into_inner);
        if *state != SessionState::Connected {
            debug!("dropping {} received while {}", field.tag, state.to_string());
            return;
        }

        debug!("read the following values: {} -> {} ({:?})", field.tag, field.value, field.timestamp);
        let mut values = self.shared.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(field.tag.clone(), TicValue::from_field(field));
    }

    async fn wait_before_reconnect(&self, stop_rx: &mut watch::Receiver<bool>) -> bool {
        debug!("reseting TIC reader state and wait {}s", self.reconnect_delay.as_secs());
        tokio::select! {
            biased;
            _ = stop_rx.wait_for(|stop| *stop) => false,
            _ = tokio::time::sleep(self.reconnect_delay) => true,
        }
    }
}
