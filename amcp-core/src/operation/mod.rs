//! Every command the client can issue.
//!
//! An [`Operation`] carries only the parameters its verb needs. Its
//! [`OperationKind`] is recorded next to the encoded line and later tells
//! the dispatcher how to read the server's reply.

pub mod params;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::encoder::encode;
use crate::error::AmcpError;

pub use params::{Chroma, Levels, Locator, MixerValue, Point, Quad, Rect, Transition, Tween};

// ── Operation ────────────────────────────────────────────────────

/// A structured request to the playout server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    // ── Queries ──────────────────────────────────────────────────
    /// List media files (`CLS`).
    RefreshMedia,
    /// List templates (`TLS`).
    RefreshTemplates,
    /// List stored template data sets.
    RefreshData,
    /// Channel information (`INFO`).
    RefreshChannels,
    /// Host system information.
    RefreshSystemInfo,
    /// List generated thumbnails.
    RefreshThumbnails,
    /// Fetch one thumbnail as base64 text.
    RetrieveThumbnail { name: String },
    ServerVersion,
    FlashVersion,
    TemplateHostVersion,
    /// Send a pre-formatted command line verbatim.
    Raw { command: String },

    // ── Channel ──────────────────────────────────────────────────
    /// Clear a channel or a single layer.
    Clear { at: Locator },
    /// Reset all mixer settings of a channel or layer.
    ClearMixer { at: Locator },
    MasterVolume { channel: u32, volume: f32 },

    // ── Templates ────────────────────────────────────────────────
    AddTemplate {
        at: Locator,
        flash_layer: u32,
        name: String,
        play_on_load: bool,
        data: Option<String>,
    },
    /// Invoke a label or method on a running template.
    InvokeTemplate {
        at: Locator,
        flash_layer: u32,
        label: String,
    },
    NextTemplate { at: Locator, flash_layer: u32 },
    /// Play a loaded template, or add-and-play when `name` is set.
    PlayTemplate {
        at: Locator,
        flash_layer: u32,
        name: Option<String>,
        data: Option<String>,
    },
    StopTemplate { at: Locator, flash_layer: u32 },
    RemoveTemplate { at: Locator, flash_layer: u32 },
    UpdateTemplate {
        at: Locator,
        flash_layer: u32,
        data: String,
    },

    // ── Loaded producers ─────────────────────────────────────────
    Pause { at: Locator },
    Resume { at: Locator },
    /// Start whatever is loaded in the background of a layer.
    Play { at: Locator },
    Stop { at: Locator },

    // ── Video / audio / colour / image ──────────────────────────
    PlayVideo {
        at: Locator,
        name: String,
        transition: Transition,
        seek: u32,
        length: u32,
        looping: bool,
        auto: bool,
    },
    LoadVideo {
        at: Locator,
        name: String,
        transition: Transition,
        seek: u32,
        length: u32,
        looping: bool,
        /// `LOAD` (show first frame now) instead of `LOADBG`.
        freeze_on_load: bool,
        auto: bool,
    },
    PlayAudio {
        at: Locator,
        name: String,
        transition: Transition,
        looping: bool,
        auto: bool,
    },
    LoadAudio {
        at: Locator,
        name: String,
        transition: Transition,
        looping: bool,
        auto: bool,
    },
    PlayColor {
        at: Locator,
        color: String,
        transition: Transition,
        auto: bool,
    },
    LoadColor {
        at: Locator,
        color: String,
        transition: Transition,
        auto: bool,
    },
    PlayImage {
        at: Locator,
        name: String,
        transition: Transition,
        auto: bool,
    },
    LoadImage {
        at: Locator,
        name: String,
        transition: Transition,
        auto: bool,
    },
    PlayImageScroll {
        at: Locator,
        name: String,
        blur: i32,
        speed: i32,
        premultiply: bool,
        progressive: bool,
    },
    LoadImageScroll {
        at: Locator,
        name: String,
        blur: i32,
        speed: i32,
        premultiply: bool,
        progressive: bool,
    },
    PlayDeviceInput {
        at: Locator,
        device: u32,
        format: String,
    },
    LoadDeviceInput {
        at: Locator,
        device: u32,
        format: String,
    },

    // ── Consumers ────────────────────────────────────────────────
    StartRecording {
        channel: u32,
        filename: String,
        codec: String,
        preset: String,
        tune: String,
        with_alpha: bool,
    },
    StopRecording { channel: u32 },
    StartStream {
        channel: u32,
        port: u16,
        quality: u32,
        key: bool,
        width: u32,
        height: u32,
    },
    StopStream { channel: u32, port: u16 },
    /// Save the current channel output as a still.
    Print { channel: u32, output: String },

    // ── Mixer ────────────────────────────────────────────────────
    Commit { channel: u32 },
    Chroma { at: Locator, chroma: Chroma },
    BlendMode { at: Locator, mode: String },
    Grid {
        channel: u32,
        grid: u32,
        duration: u32,
        easing: String,
        defer: bool,
    },
    Keyer { at: Locator, keyer: u32, defer: bool },
    Volume(MixerValue),
    Opacity(MixerValue),
    Brightness(MixerValue),
    Contrast(MixerValue),
    Saturation(MixerValue),
    Rotation(MixerValue),
    Levels {
        at: Locator,
        levels: Levels,
        tween: Option<Tween>,
        defer: bool,
    },
    /// `FILL`, preceded by a `MIPMAP` toggle.
    Geometry {
        at: Locator,
        rect: Rect,
        tween: Option<Tween>,
        defer: bool,
        mipmap: bool,
    },
    Clipping {
        at: Locator,
        rect: Rect,
        tween: Option<Tween>,
        defer: bool,
    },
    /// Corner-pin transform, preceded by a `MIPMAP` toggle.
    Perspective {
        at: Locator,
        corners: Quad,
        tween: Option<Tween>,
        defer: bool,
        mipmap: bool,
    },
}

impl Operation {
    /// The correlation key recorded with the encoded command.
    pub fn kind(&self) -> OperationKind {
        use Operation as O;
        use OperationKind as K;
        match self {
            O::RefreshMedia => K::RefreshMedia,
            O::RefreshTemplates => K::RefreshTemplates,
            O::RefreshData => K::RefreshData,
            O::RefreshChannels => K::RefreshChannels,
            O::RefreshSystemInfo => K::RefreshSystemInfo,
            O::RefreshThumbnails => K::RefreshThumbnails,
            O::RetrieveThumbnail { .. } => K::RetrieveThumbnail,
            O::ServerVersion => K::ServerVersion,
            O::FlashVersion => K::FlashVersion,
            O::TemplateHostVersion => K::TemplateHostVersion,
            O::Raw { .. } => K::Raw,
            O::Clear { .. } => K::Clear,
            O::ClearMixer { .. } => K::ClearMixer,
            O::MasterVolume { .. } => K::MasterVolume,
            O::AddTemplate { .. } => K::AddTemplate,
            O::InvokeTemplate { .. } => K::InvokeTemplate,
            O::NextTemplate { .. } => K::NextTemplate,
            O::PlayTemplate { .. } => K::PlayTemplate,
            O::StopTemplate { .. } => K::StopTemplate,
            O::RemoveTemplate { .. } => K::RemoveTemplate,
            O::UpdateTemplate { .. } => K::UpdateTemplate,
            O::Pause { .. } => K::Pause,
            O::Resume { .. } => K::Resume,
            O::Play { .. } => K::Play,
            O::Stop { .. } => K::Stop,
            O::PlayVideo { .. } => K::PlayVideo,
            O::LoadVideo { .. } => K::LoadVideo,
            O::PlayAudio { .. } => K::PlayAudio,
            O::LoadAudio { .. } => K::LoadAudio,
            O::PlayColor { .. } => K::PlayColor,
            O::LoadColor { .. } => K::LoadColor,
            O::PlayImage { .. } => K::PlayImage,
            O::LoadImage { .. } => K::LoadImage,
            O::PlayImageScroll { .. } => K::PlayImageScroll,
            O::LoadImageScroll { .. } => K::LoadImageScroll,
            O::PlayDeviceInput { .. } => K::PlayDeviceInput,
            O::LoadDeviceInput { .. } => K::LoadDeviceInput,
            O::StartRecording { .. } => K::StartRecording,
            O::StopRecording { .. } => K::StopRecording,
            O::StartStream { .. } => K::StartStream,
            O::StopStream { .. } => K::StopStream,
            O::Print { .. } => K::Print,
            O::Commit { .. } => K::Commit,
            O::Chroma { .. } => K::Chroma,
            O::BlendMode { .. } => K::BlendMode,
            O::Grid { .. } => K::Grid,
            O::Keyer { .. } => K::Keyer,
            O::Volume(_) => K::Volume,
            O::Opacity(_) => K::Opacity,
            O::Brightness(_) => K::Brightness,
            O::Contrast(_) => K::Contrast,
            O::Saturation(_) => K::Saturation,
            O::Rotation(_) => K::Rotation,
            O::Levels { .. } => K::Levels,
            O::Geometry { .. } => K::Geometry,
            O::Clipping { .. } => K::Clipping,
            O::Perspective { .. } => K::Perspective,
        }
    }

    /// Check the preconditions the encoder relies on.
    ///
    /// Channels are numbered from 1 and quoted names must not contain a
    /// double quote. Template data goes out verbatim, so its quotes must
    /// already be backslash-escaped; invoke labels are escaped by the
    /// encoder. Mixer numbers must be finite, and no parameter may carry a
    /// line break into the command line.
    pub fn validate(&self) -> Result<(), AmcpError> {
        if let Some(channel) = self.channel() {
            if channel == 0 {
                return Err(AmcpError::Encoding(format!(
                    "{}: channel ids start at 1",
                    self.kind()
                )));
            }
        }

        for name in self.quoted_strings() {
            if name.contains('"') {
                return Err(AmcpError::Encoding(format!(
                    "{}: quoted parameter contains '\"': {name}",
                    self.kind()
                )));
            }
        }

        if self.template_data().is_some_and(has_bare_quote) {
            return Err(AmcpError::Encoding(format!(
                "{}: template data has an unescaped '\"'",
                self.kind()
            )));
        }

        if let Operation::Raw { command } = self {
            if command.trim().is_empty() || command.contains(['\r', '\n']) {
                return Err(AmcpError::Encoding(
                    "Raw: command must be one non-empty line".into(),
                ));
            }
        }

        if encode(self)
            .iter()
            .any(|command| command.line().contains(['\r', '\n']))
        {
            return Err(AmcpError::Encoding(format!(
                "{}: parameter contains a line break",
                self.kind()
            )));
        }

        if self.numbers().iter().any(|v| !v.is_finite()) {
            return Err(AmcpError::Encoding(format!(
                "{}: mixer value is not finite",
                self.kind()
            )));
        }

        Ok(())
    }

    fn channel(&self) -> Option<u32> {
        use Operation as O;
        match self {
            O::Clear { at }
            | O::ClearMixer { at }
            | O::AddTemplate { at, .. }
            | O::InvokeTemplate { at, .. }
            | O::NextTemplate { at, .. }
            | O::PlayTemplate { at, .. }
            | O::StopTemplate { at, .. }
            | O::RemoveTemplate { at, .. }
            | O::UpdateTemplate { at, .. }
            | O::Pause { at }
            | O::Resume { at }
            | O::Play { at }
            | O::Stop { at }
            | O::PlayVideo { at, .. }
            | O::LoadVideo { at, .. }
            | O::PlayAudio { at, .. }
            | O::LoadAudio { at, .. }
            | O::PlayColor { at, .. }
            | O::LoadColor { at, .. }
            | O::PlayImage { at, .. }
            | O::LoadImage { at, .. }
            | O::PlayImageScroll { at, .. }
            | O::LoadImageScroll { at, .. }
            | O::PlayDeviceInput { at, .. }
            | O::LoadDeviceInput { at, .. }
            | O::Chroma { at, .. }
            | O::BlendMode { at, .. }
            | O::Keyer { at, .. }
            | O::Levels { at, .. }
            | O::Geometry { at, .. }
            | O::Clipping { at, .. }
            | O::Perspective { at, .. } => Some(at.channel),
            O::Volume(m)
            | O::Opacity(m)
            | O::Brightness(m)
            | O::Contrast(m)
            | O::Saturation(m)
            | O::Rotation(m) => Some(m.at.channel),
            O::MasterVolume { channel, .. }
            | O::StartRecording { channel, .. }
            | O::StopRecording { channel }
            | O::StartStream { channel, .. }
            | O::StopStream { channel, .. }
            | O::Print { channel, .. }
            | O::Commit { channel }
            | O::Grid { channel, .. } => Some(*channel),
            _ => None,
        }
    }

    fn quoted_strings(&self) -> Vec<&str> {
        use Operation as O;
        match self {
            O::RetrieveThumbnail { name }
            | O::PlayVideo { name, .. }
            | O::LoadVideo { name, .. }
            | O::PlayAudio { name, .. }
            | O::LoadAudio { name, .. }
            | O::PlayImage { name, .. }
            | O::LoadImage { name, .. }
            | O::PlayImageScroll { name, .. }
            | O::LoadImageScroll { name, .. } => vec![name.as_str()],
            O::PlayColor { color, .. } | O::LoadColor { color, .. } => vec![color.as_str()],
            O::StartRecording { filename, .. } => vec![filename.as_str()],
            O::Print { output, .. } => vec![output.as_str()],
            O::AddTemplate { name, .. } => vec![name.as_str()],
            O::PlayTemplate { name, .. } => name.as_deref().into_iter().collect(),
            _ => Vec::new(),
        }
    }

    fn template_data(&self) -> Option<&str> {
        use Operation as O;
        match self {
            O::AddTemplate { data, .. } | O::PlayTemplate { data, .. } => data.as_deref(),
            O::UpdateTemplate { data, .. } => Some(data),
            _ => None,
        }
    }

    fn numbers(&self) -> Vec<f32> {
        use Operation as O;
        match self {
            O::MasterVolume { volume, .. } => vec![*volume],
            O::Volume(m)
            | O::Opacity(m)
            | O::Brightness(m)
            | O::Contrast(m)
            | O::Saturation(m)
            | O::Rotation(m) => vec![m.value],
            O::Chroma { chroma, .. } => chroma.values().to_vec(),
            O::Levels { levels, .. } => levels.values().to_vec(),
            O::Geometry { rect, .. } | O::Clipping { rect, .. } => rect.values().to_vec(),
            O::Perspective { corners, .. } => corners.values().to_vec(),
            _ => Vec::new(),
        }
    }
}

/// `true` when `s` holds a `"` that is not backslash-escaped.
fn has_bare_quote(s: &str) -> bool {
    let mut escaped = false;
    for c in s.chars() {
        match c {
            '"' if !escaped => return true,
            '\\' => escaped = !escaped,
            _ => escaped = false,
        }
    }
    false
}

// ── OperationKind ────────────────────────────────────────────────

/// Fieldless tag for every [`Operation`] variant, plus the synthetic
/// `ConnectionState` kind used to report socket state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    RefreshMedia,
    RefreshTemplates,
    RefreshData,
    RefreshChannels,
    RefreshSystemInfo,
    RefreshThumbnails,
    RetrieveThumbnail,
    ServerVersion,
    FlashVersion,
    TemplateHostVersion,
    Raw,
    Clear,
    ClearMixer,
    MasterVolume,
    AddTemplate,
    InvokeTemplate,
    NextTemplate,
    PlayTemplate,
    StopTemplate,
    RemoveTemplate,
    UpdateTemplate,
    Pause,
    Resume,
    Play,
    Stop,
    PlayVideo,
    LoadVideo,
    PlayAudio,
    LoadAudio,
    PlayColor,
    LoadColor,
    PlayImage,
    LoadImage,
    PlayImageScroll,
    LoadImageScroll,
    PlayDeviceInput,
    LoadDeviceInput,
    StartRecording,
    StopRecording,
    StartStream,
    StopStream,
    Print,
    Commit,
    Chroma,
    BlendMode,
    Grid,
    Keyer,
    Volume,
    Opacity,
    Brightness,
    Contrast,
    Saturation,
    Rotation,
    Levels,
    /// Emitted for the `MIPMAP` toggle that precedes FILL and PERSPECTIVE.
    Mipmap,
    Geometry,
    Clipping,
    Perspective,
    ConnectionState,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl OperationKind {
    /// Returns `true` for the version queries, which share one reply shape.
    pub fn is_version(&self) -> bool {
        matches!(
            self,
            OperationKind::ServerVersion
                | OperationKind::FlashVersion
                | OperationKind::TemplateHostVersion
        )
    }
}
