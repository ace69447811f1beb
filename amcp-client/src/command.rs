//! Subcommands and their mapping onto operations.

use amcp_core::{DeviceEvent, Locator, MixerValue, Operation, Transition, Tween};
use clap::{Args, Subcommand};

use crate::config::DefaultsConfig;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List media files.
    Media,
    /// List templates.
    Templates,
    /// List stored template data.
    Data,
    /// List generated thumbnails.
    Thumbnails,
    /// Fetch one thumbnail as base64.
    Thumbnail { name: String },
    /// Channel information.
    Info,
    /// Host system information.
    SystemInfo,
    /// Server version.
    Version,
    /// Play a clip.
    Play {
        name: String,
        #[command(flatten)]
        target: Target,
        /// CUT, MIX, PUSH, WIPE or SLIDE.
        #[arg(short, long)]
        transition: Option<String>,
        /// Transition length in frames.
        #[arg(short, long)]
        duration: Option<u32>,
        #[arg(long = "loop")]
        looping: bool,
        /// Load in the background and start when the current clip ends.
        #[arg(long)]
        auto: bool,
    },
    /// Stop the layer.
    Stop {
        #[command(flatten)]
        target: Target,
    },
    /// Clear a layer, or the whole channel when no layer is given.
    Clear {
        #[arg(short, long)]
        channel: Option<u32>,
        #[arg(short, long)]
        layer: Option<u32>,
    },
    /// Set layer volume.
    Volume {
        value: f32,
        #[command(flatten)]
        target: Target,
        /// Tween length in frames.
        #[arg(short, long)]
        duration: Option<u32>,
        #[arg(short, long)]
        easing: Option<String>,
        /// Stage until the next commit.
        #[arg(long)]
        defer: bool,
    },
    /// Send a command line verbatim.
    Raw {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        line: Vec<String>,
    },
}

/// Channel and layer, falling back to the configured defaults.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct Target {
    #[arg(short, long)]
    pub channel: Option<u32>,
    #[arg(short, long)]
    pub layer: Option<u32>,
}

impl Target {
    fn locate(&self, defaults: &DefaultsConfig) -> Locator {
        Locator::layer(
            self.channel.unwrap_or(defaults.channel),
            self.layer.unwrap_or(defaults.layer),
        )
    }
}

impl Command {
    pub fn to_operation(&self, defaults: &DefaultsConfig) -> Operation {
        match self {
            Self::Media => Operation::RefreshMedia,
            Self::Templates => Operation::RefreshTemplates,
            Self::Data => Operation::RefreshData,
            Self::Thumbnails => Operation::RefreshThumbnails,
            Self::Thumbnail { name } => Operation::RetrieveThumbnail { name: name.clone() },
            Self::Info => Operation::RefreshChannels,
            Self::SystemInfo => Operation::RefreshSystemInfo,
            Self::Version => Operation::ServerVersion,
            Self::Play {
                name,
                target,
                transition,
                duration,
                looping,
                auto,
            } => Operation::PlayVideo {
                at: target.locate(defaults),
                name: name.clone(),
                transition: Transition::new(
                    transition.as_deref().unwrap_or(&defaults.transition),
                    duration.unwrap_or(defaults.duration),
                )
                .with_easing(&defaults.easing),
                seek: 0,
                length: 0,
                looping: *looping,
                auto: *auto,
            },
            Self::Stop { target } => Operation::Stop {
                at: target.locate(defaults),
            },
            Self::Clear { channel, layer } => {
                let channel = channel.unwrap_or(defaults.channel);
                let at = match layer {
                    Some(layer) => Locator::layer(channel, *layer),
                    None => Locator::channel(channel),
                };
                Operation::Clear { at }
            }
            Self::Volume {
                value,
                target,
                duration,
                easing,
                defer,
            } => {
                let mut volume = MixerValue::new(target.locate(defaults), *value);
                if let Some(duration) = duration {
                    let easing = easing.as_deref().unwrap_or(&defaults.easing);
                    volume = volume.with_tween(Tween::new(*duration, easing));
                }
                if *defer {
                    volume = volume.deferred();
                }
                Operation::Volume(volume)
            }
            Self::Raw { line } => Operation::Raw {
                command: line.join(" "),
            },
        }
    }
}

/// One event as printed on stdout.
pub fn render(event: &DeviceEvent, json: bool) -> Result<String, serde_json::Error> {
    if json {
        return serde_json::to_string(event);
    }
    Ok(match event {
        DeviceEvent::ResponseReceived(header) => header.clone(),
        DeviceEvent::MediaListChanged(items) => items
            .iter()
            .map(|m| format!("{:<40} {:<6} {}", m.name, m.media_type, m.timecode))
            .collect::<Vec<_>>()
            .join("\n"),
        DeviceEvent::TemplateListChanged(items) => join(items.iter().map(|t| t.name.as_str())),
        DeviceEvent::DataListChanged(items) => join(items.iter().map(|d| d.name.as_str())),
        DeviceEvent::ThumbnailListChanged(items) => items
            .iter()
            .map(|t| format!("{:<40} {} {}", t.name, t.timestamp, t.size))
            .collect::<Vec<_>>()
            .join("\n"),
        DeviceEvent::InfoReceived(lines) | DeviceEvent::SystemInfoReceived(lines) => {
            lines.join("\n")
        }
        DeviceEvent::ThumbnailPayloadReceived(line) | DeviceEvent::VersionReceived(line) => {
            line.clone()
        }
        DeviceEvent::ConnectionStateChanged { connected: true } => "connected".into(),
        DeviceEvent::ConnectionStateChanged { connected: false } => "disconnected".into(),
    })
}

fn join<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use amcp_core::{MediaItem, encode};

    fn defaults() -> DefaultsConfig {
        DefaultsConfig::default()
    }

    fn line(cmd: Command) -> String {
        encode(&cmd.to_operation(&defaults()))
            .into_iter()
            .map(|c| c.into_line())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    #[test]
    fn queries() {
        assert_eq!(line(Command::Media), "CLS");
        assert_eq!(line(Command::Templates), "TLS");
        assert_eq!(line(Command::Version), "VERSION SERVER");
        assert_eq!(line(Command::Info), "INFO");
    }

    #[test]
    fn play_uses_defaults() {
        let cmd = Command::Play {
            name: "AMB".into(),
            target: Target::default(),
            transition: None,
            duration: None,
            looping: false,
            auto: false,
        };
        assert_eq!(line(cmd), "PLAY 1-10 \"AMB\" CUT 0 Linear RIGHT");
    }

    #[test]
    fn play_with_overrides() {
        let cmd = Command::Play {
            name: "AMB".into(),
            target: Target {
                channel: Some(2),
                layer: Some(20),
            },
            transition: Some("MIX".into()),
            duration: Some(25),
            looping: true,
            auto: false,
        };
        assert_eq!(line(cmd), "PLAY 2-20 \"AMB\" MIX 25 Linear RIGHT LOOP");
    }

    #[test]
    fn clear_without_layer_clears_channel() {
        let cmd = Command::Clear {
            channel: None,
            layer: None,
        };
        assert_eq!(line(cmd), "CLEAR 1");
        let cmd = Command::Clear {
            channel: Some(2),
            layer: Some(5),
        };
        assert_eq!(line(cmd), "CLEAR 2-5");
    }

    #[test]
    fn volume_with_tween() {
        let cmd = Command::Volume {
            value: 0.5,
            target: Target::default(),
            duration: None,
            easing: None,
            defer: true,
        };
        assert_eq!(line(cmd), "MIXER 1-10 VOLUME 0.5 DEFER");

        let op = Command::Volume {
            value: 0.5,
            target: Target::default(),
            duration: Some(25),
            easing: Some("EaseInSine".into()),
            defer: false,
        }
        .to_operation(&defaults());
        let Operation::Volume(m) = op else {
            panic!("expected volume, got {op:?}");
        };
        assert_eq!(m.tween, Some(Tween::new(25, "EaseInSine")));
    }

    #[test]
    fn raw_joins_words() {
        let cmd = Command::Raw {
            line: vec!["INFO".into(), "1".into()],
        };
        assert_eq!(line(cmd), "INFO 1");
    }

    #[test]
    fn render_plain_and_json() {
        let event = DeviceEvent::MediaListChanged(vec![MediaItem {
            name: "AMB".into(),
            media_type: "MOVIE".into(),
            timecode: "00:00:10:43".into(),
        }]);
        let plain = render(&event, false).unwrap();
        assert!(plain.starts_with("AMB"));
        assert!(plain.ends_with("MOVIE  00:00:10:43"));

        let json = render(&event, true).unwrap();
        assert!(json.starts_with(r#"{"event":"media_list_changed""#));
    }
}
