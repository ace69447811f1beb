//! A playout server as seen by the application.
//!
//! `Device` owns the connection and the session and turns replies into
//! [`DeviceEvent`]s. It is driven from a single task: call
//! [`submit`](Device::submit) for each operation and
//! [`process_next`](Device::process_next) to consume replies.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dispatch::{self, Dispatch};
use crate::encoder::{EncodedCommand, encode};
use crate::error::AmcpError;
use crate::event::DeviceEvent;
use crate::network::{AmcpConnection, ConnectionInfo};
use crate::operation::{Operation, OperationKind};
use crate::state::Session;

pub type EventSender = mpsc::UnboundedSender<DeviceEvent>;

#[derive(Debug)]
pub struct Device {
    connection: AmcpConnection,
    session: Session,
    events: EventSender,
    connected: bool,
}

impl Device {
    /// Connect to the server and report the new connection state.
    pub async fn connect(info: &ConnectionInfo, events: EventSender) -> Result<Self, AmcpError> {
        let connection = AmcpConnection::connect(info).await?;
        info!(server = %info, "connected to playout server");
        Ok(Self::with_connection(connection, events))
    }

    /// Use an already established connection.
    pub fn with_connection(connection: AmcpConnection, events: EventSender) -> Self {
        let mut device = Self {
            connection,
            session: Session::new(),
            events,
            connected: true,
        };
        device.report_connection();
        device
    }

    /// Validate and encode `op`, then queue it. Writes straight away when
    /// nothing is in flight.
    pub async fn submit(&mut self, op: &Operation) -> Result<(), AmcpError> {
        if !self.connected {
            return Err(AmcpError::ChannelClosed);
        }
        op.validate()?;
        for command in encode(op) {
            if let Some(ready) = self.session.enqueue(command)? {
                self.write(ready).await?;
            }
        }
        Ok(())
    }

    /// Wait for one reply and emit its events.
    ///
    /// Returns `Ok(false)` once the server has closed the connection.
    pub async fn process_next(&mut self) -> Result<bool, AmcpError> {
        let Some(frame) = self.connection.recv().await else {
            if self.connected {
                warn!(
                    pending = self.session.pending_count(),
                    "connection closed by server"
                );
                self.connected = false;
                self.session.reset();
                self.report_connection();
            }
            return Ok(false);
        };

        let (dispatch, next) = self.session.complete(&frame)?;
        self.emit(dispatch);
        if let Some(next) = next {
            self.write(next).await?;
        }
        Ok(true)
    }

    /// `true` when nothing is in flight and nothing is queued.
    pub fn is_idle(&self) -> bool {
        self.session.is_idle()
    }

    /// Commands waiting behind the one in flight.
    pub fn pending_count(&self) -> usize {
        self.session.pending_count()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Hand a command to the writer. A failed hand-off drops the session so
    /// no reply is awaited for a command that never left.
    async fn write(&mut self, command: EncodedCommand) -> Result<(), AmcpError> {
        if let Err(e) = self.connection.send(command).await {
            warn!(error = %e, pending = self.session.pending_count(), "command not sent");
            self.session.reset();
            return Err(e);
        }
        Ok(())
    }

    fn report_connection(&mut self) {
        let frame = dispatch::connection_frame(self.connected);
        self.emit(dispatch::dispatch(OperationKind::ConnectionState, &frame));
    }

    fn emit(&self, dispatch: Dispatch) {
        for fault in &dispatch.faults {
            warn!(%fault, "skipped response row");
        }
        for event in dispatch.events {
            debug!(event = event.name(), "event");
            if self.events.send(event).is_err() {
                debug!("event receiver dropped");
                break;
            }
        }
    }
}
