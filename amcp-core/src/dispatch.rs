//! Response dispatcher.
//!
//! A reply does not say which command it answers, so the reader is chosen
//! by the kind of the command still outstanding on the connection:
//!
//! ```text
//!   Idle ──begin(kind)──► AwaitingResponse(kind)
//!    ▲                            │
//!    └──────dispatch(frame)───────┘
//! ```

use tracing::debug;

use crate::error::{AmcpError, RowFault};
use crate::event::DeviceEvent;
use crate::operation::OperationKind;
use crate::parser::{self, Parsed};
use crate::response::ResponseFrame;

/// Header of the synthetic frame that reports an established connection.
pub const CONNECTED: &str = "CONNECTED";
/// Header of the synthetic frame that reports a lost connection.
pub const DISCONNECTED: &str = "DISCONNECTED";

/// Everything decoded from one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub events: Vec<DeviceEvent>,
    /// Rows that were skipped.
    pub faults: Vec<RowFault>,
}

impl Dispatch {
    fn push(&mut self, event: DeviceEvent) {
        self.events.push(event);
    }

    fn header(&mut self, frame: &ResponseFrame) {
        if let Some(header) = frame.header() {
            self.push(DeviceEvent::ResponseReceived(header.to_string()));
        }
    }

    fn list<T>(&mut self, parsed: Parsed<T>, event: fn(Vec<T>) -> DeviceEvent) {
        self.faults.extend(parsed.faults);
        self.push(event(parsed.items));
    }

    fn single_line(&mut self, frame: &ResponseFrame, event: fn(String) -> DeviceEvent) {
        let line = parser::parse_single_line(frame.body()).unwrap_or_else(|fault| {
            self.faults.push(fault);
            String::new()
        });
        self.push(event(line));
    }
}

/// Synthetic frame fed through [`dispatch`] with
/// [`OperationKind::ConnectionState`].
pub fn connection_frame(connected: bool) -> ResponseFrame {
    let header = if connected { CONNECTED } else { DISCONNECTED };
    ResponseFrame::from_lines([header])
}

/// Decode `frame` as the reply to a command of type `kind`.
pub fn dispatch(kind: OperationKind, frame: &ResponseFrame) -> Dispatch {
    let mut out = Dispatch::default();
    let body = frame.body();

    match kind {
        OperationKind::RefreshMedia => {
            out.header(frame);
            out.list(parser::parse_media(body), DeviceEvent::MediaListChanged);
        }
        OperationKind::RefreshTemplates => {
            out.header(frame);
            out.list(parser::parse_templates(body), DeviceEvent::TemplateListChanged);
        }
        OperationKind::RefreshData => {
            out.header(frame);
            out.list(parser::parse_data(body), DeviceEvent::DataListChanged);
        }
        OperationKind::RefreshThumbnails => {
            out.header(frame);
            out.list(parser::parse_thumbnails(body), DeviceEvent::ThumbnailListChanged);
        }
        OperationKind::RefreshChannels => out.push(DeviceEvent::InfoReceived(body.to_vec())),
        OperationKind::RefreshSystemInfo => {
            out.push(DeviceEvent::SystemInfoReceived(body.to_vec()))
        }
        OperationKind::RetrieveThumbnail => {
            out.single_line(frame, DeviceEvent::ThumbnailPayloadReceived)
        }
        kind if kind.is_version() => out.single_line(frame, DeviceEvent::VersionReceived),
        OperationKind::ConnectionState => out.push(DeviceEvent::ConnectionStateChanged {
            connected: frame.header() == Some(CONNECTED),
        }),
        _ => out.header(frame),
    }

    out
}

// ── ResponseDispatcher ───────────────────────────────────────────

/// Where the dispatcher is in the request/response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    #[default]
    Idle,
    AwaitingResponse(OperationKind),
}

/// Holds the kind of the one outstanding command.
#[derive(Debug, Default)]
pub struct ResponseDispatcher {
    state: DispatchState,
}

impl ResponseDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == DispatchState::Idle
    }

    /// The kind waiting for a reply, if any.
    pub fn outstanding(&self) -> Option<OperationKind> {
        match self.state {
            DispatchState::Idle => None,
            DispatchState::AwaitingResponse(kind) => Some(kind),
        }
    }

    /// Record that a command of `kind` has been written.
    pub fn begin(&mut self, kind: OperationKind) -> Result<(), AmcpError> {
        match self.state {
            DispatchState::Idle => {
                self.state = DispatchState::AwaitingResponse(kind);
                Ok(())
            }
            DispatchState::AwaitingResponse(_) => Err(AmcpError::ProtocolState(
                "a command is already awaiting its response",
            )),
        }
    }

    /// Decode the reply to the outstanding command and return to idle.
    pub fn dispatch(&mut self, frame: &ResponseFrame) -> Result<Dispatch, AmcpError> {
        let kind = self
            .outstanding()
            .ok_or(AmcpError::ProtocolState("response received with no command outstanding"))?;
        self.state = DispatchState::Idle;

        debug!(%kind, lines = frame.lines().len(), "dispatching response");
        Ok(dispatch(kind, frame))
    }

    /// Forget the outstanding command, e.g. after the connection dropped.
    pub fn reset(&mut self) {
        self.state = DispatchState::Idle;
    }
}
