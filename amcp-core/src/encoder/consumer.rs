//! Recording and streaming consumer commands.
//!
//! These verbs carry ffmpeg-style option strings. Flags whose value is
//! empty or zero are left out entirely.

use super::CommandLine;

/// Stand-in for the client's own address in `udp://` stream targets.
///
/// The connection replaces it with its local socket address right before
/// the line is written.
pub const CLIENT_ADDRESS_PLACEHOLDER: &str = "<client_ip_address>";

/// `ADD ch FILE "name" [-vcodec c] [-preset p] [-tune t] [SEPARATE_KEY]`
pub(crate) fn start_recording(
    channel: u32,
    filename: &str,
    codec: &str,
    preset: &str,
    tune: &str,
    with_alpha: bool,
) -> String {
    CommandLine::new("ADD")
        .token(channel)
        .token("FILE")
        .quoted(filename)
        .pair_if(!codec.is_empty(), "-vcodec", codec)
        .pair_if(!preset.is_empty(), "-preset", preset)
        .pair_if(!tune.is_empty(), "-tune", tune)
        .token_if(with_alpha, "SEPARATE_KEY")
        .finish()
}

pub(crate) fn stop_recording(channel: u32) -> String {
    CommandLine::new("REMOVE")
        .token(channel)
        .token("FILE")
        .finish()
}

/// Low-latency MPEG-TS stream back to the client.
pub(crate) fn start_stream(
    channel: u32,
    port: u16,
    quality: u32,
    key: bool,
    width: u32,
    height: u32,
) -> String {
    let line = CommandLine::new("ADD")
        .token(channel)
        .token("STREAM")
        .token(stream_target(port))
        .token("-format mpegts")
        .token("-vcodec libx264")
        .token(format_args!("-crf {quality}"))
        .token("-tune zerolatency")
        .token("-preset ultrafast");

    match video_filter(key, width, height) {
        Some(filter) => line.token("-vf").token(filter).finish(),
        None => line.finish(),
    }
}

pub(crate) fn stop_stream(channel: u32, port: u16) -> String {
    CommandLine::new("REMOVE")
        .token(channel)
        .token("STREAM")
        .token(stream_target(port))
        .finish()
}

fn stream_target(port: u16) -> String {
    format!("udp://{CLIENT_ADDRESS_PLACEHOLDER}:{port}")
}

/// Scale when both dimensions are set, prefixed by alpha extraction when
/// keyed; alpha extraction alone when keyed without a size.
fn video_filter(key: bool, width: u32, height: u32) -> Option<String> {
    match (key, width > 0 && height > 0) {
        (true, true) => Some(format!("alphaextract,scale={width}:{height}")),
        (false, true) => Some(format!("scale={width}:{height}")),
        (true, false) => Some("alphaextract".into()),
        (false, false) => None,
    }
}
