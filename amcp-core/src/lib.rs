//! # amcp-core
//!
//! Client-side protocol library for AMCP, the text command protocol of
//! CasparCG-style playout servers.
//!
//! This crate contains:
//! - **Operations**: `Operation`, `OperationKind` and the parameter groups they share
//! - **Encoder**: `encode` turns an operation into wire-ready `EncodedCommand`s
//! - **Parsers**: media, template, data and thumbnail list rows
//! - **Dispatcher**: `ResponseDispatcher` routes a reply by the outstanding command kind
//! - **Timecode**: `FrameRate` and `Timecode` for `HH:MM:SS:FF` durations
//! - **Codec**: `AmcpCodec` for framed TCP I/O via `tokio_util`
//! - **Network**: `AmcpConnection` and host resolution
//! - **State**: `Session`, the in-flight slot plus FIFO queue
//! - **Device**: `Device` ties it all together and emits `DeviceEvent`s
//! - **Error**: `AmcpError`, typed, `thiserror`-based

pub mod codec;
pub mod device;
pub mod dispatch;
pub mod encoder;
pub mod error;
pub mod event;
pub mod network;
pub mod operation;
pub mod parser;
pub mod response;
pub mod state;
pub mod timecode;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use codec::{AmcpCodec, MAX_LINE_LENGTH};
pub use device::{Device, EventSender};
pub use dispatch::{Dispatch, DispatchState, ResponseDispatcher, dispatch};
pub use encoder::{CLIENT_ADDRESS_PLACEHOLDER, EncodedCommand, encode, escape_label};
pub use error::{AmcpError, RowFault};
pub use event::DeviceEvent;
pub use network::{AmcpConnection, ConnectionInfo, DEFAULT_PORT, resolve_ip_address};
pub use operation::{
    Chroma, Levels, Locator, MixerValue, Operation, OperationKind, Point, Quad, Rect, Transition,
    Tween,
};
pub use parser::{DataItem, MediaItem, Parsed, TemplateItem, ThumbnailItem};
pub use response::{BodyRule, ResponseFrame, StatusLine};
pub use state::Session;
pub use timecode::{FrameRate, Timecode};
