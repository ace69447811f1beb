//! Entity parsers for list replies.
//!
//! List rows start with a quoted name followed by space-separated
//! metadata:
//!
//! ```text
//! "AMB"  MOVIE  6445960 20121101160514 643 1/60
//! "CG/LOWER-THIRD" 38572 20130101120000
//! "AMB" 20230101120000 12345
//! ```
//!
//! Rows are decoded independently. A row that cannot be decoded becomes a
//! [`RowFault`] and decoding carries on with the next one.

use serde::{Deserialize, Serialize};

use crate::error::RowFault;
use crate::timecode::{FrameRate, Timecode};

/// Separates the quoted name from the metadata that follows it.
const NAME_BOUNDARY: &str = "\" ";

// ── Records ──────────────────────────────────────────────────────

/// One entry of the media library (`CLS`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub name: String,
    /// `MOVIE`, `STILL` or `AUDIO`.
    pub media_type: String,
    /// `HH:MM:SS:FF`, empty when the server reported no duration.
    pub timecode: String,
}

/// One entry of the template library (`TLS`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateItem {
    pub name: String,
}

/// One stored template data set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataItem {
    pub name: String,
}

/// One generated thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailItem {
    pub name: String,
    /// Modification time as reported, e.g. `20230101120000`.
    pub timestamp: String,
    /// Size in bytes as reported.
    pub size: String,
}

/// Decoded rows plus the rows that were skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<T> {
    pub items: Vec<T>,
    pub faults: Vec<RowFault>,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            faults: Vec::new(),
        }
    }
}

// ── Parsers ──────────────────────────────────────────────────────

pub fn parse_media(lines: &[String]) -> Parsed<MediaItem> {
    parse_rows(lines, media_row)
}

pub fn parse_templates(lines: &[String]) -> Parsed<TemplateItem> {
    parse_rows(lines, |line| {
        Ok(TemplateItem {
            name: leading_name(line),
        })
    })
}

pub fn parse_data(lines: &[String]) -> Parsed<DataItem> {
    parse_rows(lines, |line| {
        Ok(DataItem {
            name: leading_name(line),
        })
    })
}

pub fn parse_thumbnails(lines: &[String]) -> Parsed<ThumbnailItem> {
    parse_rows(lines, thumbnail_row)
}

/// The single data line of a `201` reply (version string, base64
/// thumbnail).
pub fn parse_single_line(lines: &[String]) -> Result<String, RowFault> {
    lines
        .first()
        .cloned()
        .ok_or_else(|| RowFault::new("", "expected one data line"))
}

fn parse_rows<T, F>(lines: &[String], mut row: F) -> Parsed<T>
where
    F: FnMut(&str) -> Result<T, RowFault>,
{
    let mut parsed = Parsed::default();
    for line in lines.iter().filter(|l| !l.trim().is_empty()) {
        match row(line) {
            Ok(item) => parsed.items.push(item),
            Err(fault) => parsed.faults.push(fault),
        }
    }
    parsed
}

fn media_row(line: &str) -> Result<MediaItem, RowFault> {
    let (name, rest) = split_name(line)?;

    // Fields are separated by single spaces; the server pads the type
    // column, so an empty field between two spaces still counts.
    let fields: Vec<&str> = rest.trim().split(' ').collect();
    let media_type = fields[0];
    if media_type.is_empty() {
        return Err(RowFault::new(line, "missing media type"));
    }

    let timecode = if fields.len() > 5 {
        duration(fields[4], fields[5])
            .map(|tc| tc.to_string())
            .unwrap_or_default()
    } else {
        String::new()
    };

    Ok(MediaItem {
        name,
        media_type: media_type.to_string(),
        timecode,
    })
}

fn duration(frames: &str, timebase: &str) -> Option<Timecode> {
    let frames = frames.parse().ok()?;
    let rate = FrameRate::from_timebase(timebase).ok()?;
    Some(Timecode::from_frames(frames, rate))
}

fn thumbnail_row(line: &str) -> Result<ThumbnailItem, RowFault> {
    let (name, rest) = split_name(line)?;
    let mut fields = rest.split_whitespace();
    match (fields.next(), fields.next()) {
        (Some(timestamp), Some(size)) => Ok(ThumbnailItem {
            name,
            timestamp: timestamp.to_string(),
            size: size.to_string(),
        }),
        _ => Err(RowFault::new(line, "missing timestamp or size")),
    }
}

/// Split a row at the first `" ` into a normalised name and the rest.
fn split_name(line: &str) -> Result<(String, &str), RowFault> {
    let (name, rest) = line
        .split_once(NAME_BOUNDARY)
        .ok_or_else(|| RowFault::new(line, "missing quote boundary"))?;
    Ok((normalize_name(name), rest))
}

/// The name part of a row; rows without metadata are all name.
fn leading_name(line: &str) -> String {
    let name = line.split(NAME_BOUNDARY).next().unwrap_or(line);
    normalize_name(name)
}

/// Strip one surrounding quote on each side and show paths with `/`.
fn normalize_name(raw: &str) -> String {
    let name = raw.strip_prefix('"').unwrap_or(raw);
    let name = name.strip_suffix('"').unwrap_or(name);
    name.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn media_with_duration() {
        let parsed = parse_media(&rows(&[
            "\"AMB\"  MOVIE  6445960 20121101160514 643 1/60",
            "\"CG1080I50\"  MOVIE  6159792 20121101150514 264 1/25",
        ]));
        assert!(parsed.faults.is_empty());
        assert_eq!(
            parsed.items[0],
            MediaItem {
                name: "AMB".into(),
                media_type: "MOVIE".into(),
                timecode: "00:00:10:43".into(),
            }
        );
        assert_eq!(parsed.items[1].timecode, "00:00:10:14");
    }

    #[test]
    fn media_without_duration() {
        let parsed = parse_media(&rows(&["\"LOGO\"  STILL  1024 20121101150514"]));
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].media_type, "STILL");
        assert!(parsed.items[0].timecode.is_empty());
    }

    #[test]
    fn media_with_bad_timebase_keeps_row() {
        let parsed = parse_media(&rows(&["\"X\"  MOVIE  1 2 100 1/0"]));
        assert_eq!(parsed.items.len(), 1);
        assert!(parsed.items[0].timecode.is_empty());
    }

    #[test]
    fn media_paths_use_forward_slashes() {
        let parsed = parse_media(&rows(&["\"FOLDER\\SUB\\CLIP\"  MOVIE  1 2 3 1/25"]));
        assert_eq!(parsed.items[0].name, "FOLDER/SUB/CLIP");
    }

    #[test]
    fn malformed_media_row_does_not_abort() {
        let parsed = parse_media(&rows(&[
            "garbage without quotes",
            "\"AMB\"  MOVIE  6445960 20121101160514 643 1/60",
        ]));
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.faults.len(), 1);
        assert_eq!(parsed.faults[0].reason, "missing quote boundary");
    }

    #[test]
    fn media_row_without_type_is_a_fault() {
        let parsed = parse_media(&rows(&["\"AMB\" "]));
        assert!(parsed.items.is_empty());
        assert_eq!(parsed.faults[0].reason, "missing media type");
    }

    #[test]
    fn templates_and_data() {
        let templates = parse_templates(&rows(&[
            "\"CG\\LOWER-THIRD\" 38572 20130101120000",
            "\"bug\"",
        ]));
        let names: Vec<&str> = templates.items.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["CG/LOWER-THIRD", "bug"]);

        let data = parse_data(&rows(&["\"show-1\" 123 20130101120000", "plain"]));
        assert_eq!(data.items[0].name, "show-1");
        assert_eq!(data.items[1].name, "plain");
        assert!(data.faults.is_empty());
    }

    #[test]
    fn thumbnails() {
        let parsed = parse_thumbnails(&rows(&["\"NAME\" 20230101120000 12345"]));
        assert_eq!(
            parsed.items,
            [ThumbnailItem {
                name: "NAME".into(),
                timestamp: "20230101120000".into(),
                size: "12345".into(),
            }]
        );
    }

    #[test]
    fn thumbnail_missing_size_is_a_fault() {
        let parsed = parse_thumbnails(&rows(&["\"NAME\" 20230101120000", "\"B\" 1 2"]));
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.faults[0].reason, "missing timestamp or size");
    }

    #[test]
    fn blank_rows_are_ignored() {
        let parsed = parse_templates(&rows(&["", "  "]));
        assert!(parsed.items.is_empty());
        assert!(parsed.faults.is_empty());
    }

    #[test]
    fn single_line() {
        assert_eq!(parse_single_line(&rows(&["2.0.7.e9fc25a Stable"])).unwrap(), "2.0.7.e9fc25a Stable");
        assert!(parse_single_line(&[]).is_err());
    }
}
