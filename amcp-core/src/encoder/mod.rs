//! Operation → wire command encoding.
//!
//! Every command is assembled by a [`CommandLine`]: a fixed, ordered list
//! of tokens where optional tokens are appended only when their condition
//! holds. Empty tokens are dropped and the rest are joined with single
//! spaces, so the token order of each verb can be read straight off its
//! builder chain.
//!
//! `encode` is total. Range checks live in [`Operation::validate`].

pub mod consumer;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::operation::{Locator, MixerValue, Operation, OperationKind, Transition, Tween};

pub use consumer::CLIENT_ADDRESS_PLACEHOLDER;

// ── EncodedCommand ───────────────────────────────────────────────

/// One protocol line plus the kind of operation that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedCommand {
    kind: OperationKind,
    line: String,
}

impl EncodedCommand {
    pub fn new(kind: OperationKind, line: impl Into<String>) -> Self {
        Self {
            kind,
            line: line.into(),
        }
    }

    /// The correlation key used to interpret the reply.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// The command text, without line terminator.
    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn into_line(self) -> String {
        self.line
    }

    /// Replace the client address placeholder used by streaming commands.
    pub fn with_client_address(mut self, address: &str) -> Self {
        if self.line.contains(CLIENT_ADDRESS_PLACEHOLDER) {
            self.line = self.line.replace(CLIENT_ADDRESS_PLACEHOLDER, address);
        }
        self
    }
}

impl fmt::Display for EncodedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

// ── CommandLine ──────────────────────────────────────────────────

/// Ordered token builder for a single command.
#[derive(Debug, Default)]
pub(crate) struct CommandLine {
    tokens: Vec<String>,
}

impl CommandLine {
    pub(crate) fn new(verb: &str) -> Self {
        Self::default().token(verb)
    }

    /// Append a token; empty tokens are skipped.
    pub(crate) fn token(mut self, token: impl fmt::Display) -> Self {
        let token = token.to_string();
        if !token.is_empty() {
            self.tokens.push(token);
        }
        self
    }

    /// Append `"value"` verbatim, even when empty.
    pub(crate) fn quoted(mut self, value: &str) -> Self {
        self.tokens.push(format!("\"{value}\""));
        self
    }

    pub(crate) fn quoted_opt(self, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.quoted(v),
            None => self,
        }
    }

    /// Append `"value"` with backslashes and quotes escaped.
    pub(crate) fn escaped(mut self, value: &str) -> Self {
        self.tokens.push(format!("\"{}\"", escape_label(value)));
        self
    }

    pub(crate) fn token_if(self, condition: bool, token: &str) -> Self {
        if condition { self.token(token) } else { self }
    }

    /// Append `key value` when `condition` holds.
    pub(crate) fn pair_if(self, condition: bool, key: &str, value: impl fmt::Display) -> Self {
        if condition {
            self.token(key).token(value)
        } else {
            self
        }
    }

    /// `kind duration easing direction`.
    pub(crate) fn transition(self, transition: &Transition) -> Self {
        self.token(&transition.kind)
            .token(transition.duration)
            .token(&transition.easing)
            .token(&transition.direction)
    }

    /// `duration easing` when a tween is present.
    pub(crate) fn tween(self, tween: Option<&Tween>) -> Self {
        match tween {
            Some(t) => self.token(t.duration).token(&t.easing),
            None => self,
        }
    }

    pub(crate) fn defer(self, defer: bool) -> Self {
        self.token_if(defer, "DEFER")
    }

    pub(crate) fn flag(self, value: bool) -> Self {
        self.token(if value { "1" } else { "0" })
    }

    pub(crate) fn finish(self) -> String {
        self.tokens.join(" ")
    }
}

/// Escape a template label: backslashes are doubled first, then double
/// quotes are backslash-escaped.
pub fn escape_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

// ── Encoding ─────────────────────────────────────────────────────

/// Encode an operation into the command line(s) that carry it.
///
/// Returns two commands for `Geometry` and `Perspective` (the `MIPMAP`
/// toggle first), one for everything else.
pub fn encode(op: &Operation) -> Vec<EncodedCommand> {
    let command = EncodedCommand::new(op.kind(), encode_line(op));
    match op {
        Operation::Geometry { at, mipmap, .. } | Operation::Perspective { at, mipmap, .. } => {
            vec![mipmap_command(at, *mipmap), command]
        }
        _ => vec![command],
    }
}

impl Operation {
    /// Shorthand for [`encode`].
    pub fn encode(&self) -> Vec<EncodedCommand> {
        encode(self)
    }
}

fn mipmap_command(at: &Locator, enabled: bool) -> EncodedCommand {
    EncodedCommand::new(
        OperationKind::Mipmap,
        mixer(at, "MIPMAP").flag(enabled).finish(),
    )
}

fn encode_line(op: &Operation) -> String {
    use Operation as O;
    match op {
        // ── Queries ──────────────────────────────────────────────
        O::RefreshMedia => "CLS".into(),
        O::RefreshTemplates => "TLS".into(),
        O::RefreshData => "DATA LIST".into(),
        O::RefreshChannels => "INFO".into(),
        O::RefreshSystemInfo => "INFO SYSTEM".into(),
        O::RefreshThumbnails => "THUMBNAIL LIST".into(),
        O::RetrieveThumbnail { name } => CommandLine::new("THUMBNAIL")
            .token("RETRIEVE")
            .quoted(name)
            .finish(),
        O::ServerVersion => "VERSION SERVER".into(),
        O::FlashVersion => "VERSION FLASH".into(),
        O::TemplateHostVersion => "VERSION TEMPLATEHOST".into(),
        O::Raw { command } => command.clone(),

        // ── Channel ──────────────────────────────────────────────
        O::Clear { at } => CommandLine::new("CLEAR").token(at).finish(),
        O::ClearMixer { at } => mixer(at, "CLEAR").finish(),
        O::MasterVolume { channel, volume } => mixer(&Locator::channel(*channel), "MASTERVOLUME")
            .token(volume)
            .finish(),

        // ── Templates ────────────────────────────────────────────
        O::AddTemplate {
            at,
            flash_layer,
            name,
            play_on_load,
            data,
        } => cg(at, "ADD", *flash_layer)
            .quoted(name)
            .flag(*play_on_load)
            .quoted_opt(data.as_deref())
            .finish(),
        O::InvokeTemplate {
            at,
            flash_layer,
            label,
        } => cg(at, "INVOKE", *flash_layer).escaped(label).finish(),
        O::NextTemplate { at, flash_layer } => cg(at, "NEXT", *flash_layer).finish(),
        O::PlayTemplate {
            at,
            flash_layer,
            name: Some(name),
            data,
        } => cg(at, "ADD", *flash_layer)
            .quoted(name)
            .flag(true)
            .quoted_opt(data.as_deref())
            .finish(),
        O::PlayTemplate {
            at,
            flash_layer,
            name: None,
            ..
        } => cg(at, "PLAY", *flash_layer).finish(),
        O::StopTemplate { at, flash_layer } => cg(at, "STOP", *flash_layer).finish(),
        O::RemoveTemplate { at, flash_layer } => cg(at, "REMOVE", *flash_layer).finish(),
        O::UpdateTemplate {
            at,
            flash_layer,
            data,
        } => cg(at, "UPDATE", *flash_layer).quoted(data).finish(),

        // ── Loaded producers ─────────────────────────────────────
        O::Pause { at } => CommandLine::new("PAUSE").token(at).finish(),
        O::Resume { at } => CommandLine::new("RESUME").token(at).finish(),
        O::Play { at } => CommandLine::new("PLAY").token(at).finish(),
        O::Stop { at } => CommandLine::new("STOP").token(at).finish(),

        // ── Video / audio / colour / image ──────────────────────
        O::PlayVideo {
            at,
            name,
            transition,
            seek,
            length,
            looping,
            auto: true,
        } => load_video(at, name, transition, *seek, *length, *looping, false, true),
        O::PlayVideo {
            at,
            name,
            transition,
            seek,
            length,
            looping,
            auto: false,
        } => video("PLAY", at, name, transition, *seek, *length, *looping).finish(),
        O::LoadVideo {
            at,
            name,
            transition,
            seek,
            length,
            looping,
            freeze_on_load,
            auto,
        } => load_video(
            at,
            name,
            transition,
            *seek,
            *length,
            *looping,
            *freeze_on_load,
            *auto,
        ),
        O::PlayAudio {
            at,
            name,
            transition,
            looping,
            auto: true,
        } => load_audio(at, name, transition, *looping, true),
        O::PlayAudio {
            at,
            name,
            transition,
            looping,
            auto: false,
        } => producer("PLAY", at, name, transition)
            .token_if(*looping, "LOOP")
            .finish(),
        O::LoadAudio {
            at,
            name,
            transition,
            looping,
            auto,
        } => load_audio(at, name, transition, *looping, *auto),
        O::PlayColor {
            at,
            color: name,
            transition,
            auto: true,
        }
        | O::PlayImage {
            at,
            name,
            transition,
            auto: true,
        } => load_producer(at, name, transition, true),
        O::PlayColor {
            at,
            color: name,
            transition,
            auto: false,
        }
        | O::PlayImage {
            at,
            name,
            transition,
            auto: false,
        } => producer("PLAY", at, name, transition).finish(),
        O::LoadColor {
            at,
            color: name,
            transition,
            auto,
        }
        | O::LoadImage {
            at,
            name,
            transition,
            auto,
        } => load_producer(at, name, transition, *auto),
        O::PlayImageScroll {
            at,
            name,
            blur,
            speed,
            premultiply,
            progressive,
        } => image_scroll("PLAY", at, name, *blur, *speed, *premultiply, *progressive),
        O::LoadImageScroll {
            at,
            name,
            blur,
            speed,
            premultiply,
            progressive,
        } => image_scroll("LOADBG", at, name, *blur, *speed, *premultiply, *progressive),
        O::PlayDeviceInput { at, device, format } => device_input("PLAY", at, *device, format),
        O::LoadDeviceInput { at, device, format } => device_input("LOADBG", at, *device, format),

        // ── Consumers ────────────────────────────────────────────
        O::StartRecording {
            channel,
            filename,
            codec,
            preset,
            tune,
            with_alpha,
        } => consumer::start_recording(*channel, filename, codec, preset, tune, *with_alpha),
        O::StopRecording { channel } => consumer::stop_recording(*channel),
        O::StartStream {
            channel,
            port,
            quality,
            key,
            width,
            height,
        } => consumer::start_stream(*channel, *port, *quality, *key, *width, *height),
        O::StopStream { channel, port } => consumer::stop_stream(*channel, *port),
        O::Print { channel, output } => CommandLine::new("ADD")
            .token(channel)
            .token("IMAGE")
            .quoted(output)
            .finish(),

        // ── Mixer ────────────────────────────────────────────────
        O::Commit { channel } => mixer(&Locator::channel(*channel), "COMMIT").finish(),
        O::Chroma { at, chroma } => {
            let [threshold, spread, spill, blur] = chroma.values();
            mixer(at, "CHROMA")
                .token(&chroma.key)
                .token(threshold)
                .token(spread)
                .token(spill)
                .token(blur)
                .flag(chroma.mask)
                .finish()
        }
        O::BlendMode { at, mode } => mixer(at, "BLEND").token(mode).finish(),
        O::Grid {
            channel,
            grid,
            duration,
            easing,
            defer,
        } => mixer(&Locator::channel(*channel), "GRID")
            .token(grid)
            .token(duration)
            .token(easing)
            .defer(*defer)
            .finish(),
        O::Keyer { at, keyer, defer } => mixer(at, "KEYER").token(keyer).defer(*defer).finish(),
        O::Volume(m) => mixer_value("VOLUME", m),
        O::Opacity(m) => mixer_value("OPACITY", m),
        O::Brightness(m) => mixer_value("BRIGHTNESS", m),
        O::Contrast(m) => mixer_value("CONTRAST", m),
        O::Saturation(m) => mixer_value("SATURATION", m),
        O::Rotation(m) => mixer_value("ROTATION", m),
        O::Levels {
            at,
            levels,
            tween,
            defer,
        } => levels
            .values()
            .iter()
            .fold(mixer(at, "LEVELS"), |line, v| line.token(v))
            .tween(tween.as_ref())
            .defer(*defer)
            .finish(),
        O::Clipping {
            at,
            rect,
            tween,
            defer,
        } => rect
            .values()
            .iter()
            .fold(mixer(at, "CLIP"), |line, v| line.token(v))
            .tween(tween.as_ref())
            .defer(*defer)
            .finish(),
        O::Geometry {
            at,
            rect,
            tween,
            defer,
            ..
        } => rect
            .values()
            .iter()
            .fold(mixer(at, "FILL"), |line, v| line.token(v))
            .tween(tween.as_ref())
            .defer(*defer)
            .finish(),
        O::Perspective {
            at,
            corners,
            tween,
            defer,
            ..
        } => corners
            .values()
            .iter()
            .fold(mixer(at, "PERSPECTIVE"), |line, v| line.token(v))
            .tween(tween.as_ref())
            .defer(*defer)
            .finish(),
    }
}

// ── Verb helpers ─────────────────────────────────────────────────

fn cg(at: &Locator, sub: &str, flash_layer: u32) -> CommandLine {
    CommandLine::new("CG").token(at).token(sub).token(flash_layer)
}

fn mixer(at: &Locator, verb: &str) -> CommandLine {
    CommandLine::new("MIXER").token(at).token(verb)
}

fn mixer_value(verb: &str, m: &MixerValue) -> String {
    mixer(&m.at, verb)
        .token(m.value)
        .tween(m.tween.as_ref())
        .defer(m.defer)
        .finish()
}

fn producer(verb: &str, at: &Locator, name: &str, transition: &Transition) -> CommandLine {
    CommandLine::new(verb)
        .token(at)
        .quoted(name)
        .transition(transition)
}

fn video(
    verb: &str,
    at: &Locator,
    name: &str,
    transition: &Transition,
    seek: u32,
    length: u32,
    looping: bool,
) -> CommandLine {
    producer(verb, at, name, transition)
        .pair_if(seek > 0, "SEEK", seek)
        .pair_if(length > 0, "LENGTH", length)
        .token_if(looping, "LOOP")
}

// Background loads. Auto-play variants of the PLAY verbs encode through these.

#[allow(clippy::too_many_arguments)]
fn load_video(
    at: &Locator,
    name: &str,
    transition: &Transition,
    seek: u32,
    length: u32,
    looping: bool,
    freeze_on_load: bool,
    auto: bool,
) -> String {
    let verb = if freeze_on_load { "LOAD" } else { "LOADBG" };
    video(verb, at, name, transition, seek, length, looping)
        .token_if(auto, "AUTO")
        .finish()
}

fn load_audio(
    at: &Locator,
    name: &str,
    transition: &Transition,
    looping: bool,
    auto: bool,
) -> String {
    producer("LOADBG", at, name, transition)
        .token_if(looping, "LOOP")
        .token_if(auto, "AUTO")
        .finish()
}

fn load_producer(at: &Locator, name: &str, transition: &Transition, auto: bool) -> String {
    producer("LOADBG", at, name, transition)
        .token_if(auto, "AUTO")
        .finish()
}

fn image_scroll(
    verb: &str,
    at: &Locator,
    name: &str,
    blur: i32,
    speed: i32,
    premultiply: bool,
    progressive: bool,
) -> String {
    CommandLine::new(verb)
        .token(at)
        .quoted(name)
        .token("BLUR")
        .token(blur)
        .token("SPEED")
        .token(speed)
        .token_if(premultiply, "PREMULTIPLY")
        .token_if(progressive, "PROGRESSIVE")
        .finish()
}

fn device_input(verb: &str, at: &Locator, device: u32, format: &str) -> String {
    CommandLine::new(verb)
        .token(at)
        .token("DECKLINK")
        .token("DEVICE")
        .token(device)
        .token("FORMAT")
        .token(format)
        .finish()
}

// ── Tests ────────────────────────────────────────────────────────
