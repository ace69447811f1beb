//! Events delivered to the application.

use serde::{Deserialize, Serialize};

use crate::parser::{DataItem, MediaItem, TemplateItem, ThumbnailItem};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// The raw status line of a reply, e.g. `202 PLAY OK`.
    ResponseReceived(String),
    MediaListChanged(Vec<MediaItem>),
    TemplateListChanged(Vec<TemplateItem>),
    DataListChanged(Vec<DataItem>),
    ThumbnailListChanged(Vec<ThumbnailItem>),
    /// Base64 image data of one thumbnail.
    ThumbnailPayloadReceived(String),
    InfoReceived(Vec<String>),
    SystemInfoReceived(Vec<String>),
    VersionReceived(String),
    ConnectionStateChanged { connected: bool },
}

impl DeviceEvent {
    /// Short name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ResponseReceived(_) => "response",
            Self::MediaListChanged(_) => "media-list",
            Self::TemplateListChanged(_) => "template-list",
            Self::DataListChanged(_) => "data-list",
            Self::ThumbnailListChanged(_) => "thumbnail-list",
            Self::ThumbnailPayloadReceived(_) => "thumbnail",
            Self::InfoReceived(_) => "info",
            Self::SystemInfoReceived(_) => "system-info",
            Self::VersionReceived(_) => "version",
            Self::ConnectionStateChanged { .. } => "connection-state",
        }
    }
}
