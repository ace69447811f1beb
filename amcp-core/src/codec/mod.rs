//! Line codec for AMCP over TCP.
//!
//! Commands go out as one line terminated by CRLF. Replies come back as
//! frames whose length depends on the status code:
//!
//! | Code  | Frame                                   |
//! |-------|-----------------------------------------|
//! | `200` | header, body lines, blank line          |
//! | `201` | header, exactly one data line           |
//! | other | header only                             |

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::encoder::EncodedCommand;
use crate::error::AmcpError;
use crate::response::{BodyRule, ResponseFrame, StatusLine};

/// Longest line accepted from the server, terminator included.
pub const MAX_LINE_LENGTH: usize = 1024 * 1024;

#[derive(Debug, Default)]
pub struct AmcpCodec {
    /// Frame whose body is still arriving.
    pending: Option<(ResponseFrame, BodyRule)>,
    /// Bytes of `src` already searched for a newline.
    scanned: usize,
}

impl AmcpCodec {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_line(&mut self, src: &mut BytesMut) -> Result<Option<String>, AmcpError> {
        let Some(offset) = src[self.scanned..].iter().position(|b| *b == b'\n') else {
            if src.len() > MAX_LINE_LENGTH {
                return Err(AmcpError::LineTooLong {
                    size: src.len(),
                    max: MAX_LINE_LENGTH,
                });
            }
            self.scanned = src.len();
            return Ok(None);
        };

        let end = self.scanned + offset;
        self.scanned = 0;
        if end + 1 > MAX_LINE_LENGTH {
            return Err(AmcpError::LineTooLong {
                size: end + 1,
                max: MAX_LINE_LENGTH,
            });
        }

        let raw = src.split_to(end + 1);
        let mut line = &raw[..end];
        if let Some(stripped) = line.strip_suffix(b"\r") {
            line = stripped;
        }
        Ok(Some(String::from_utf8(line.to_vec())?))
    }
}

impl Decoder for AmcpCodec {
    type Item = ResponseFrame;
    type Error = AmcpError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while let Some(line) = self.next_line(src)? {
            match self.pending.take() {
                None => {
                    // Stray blank lines between frames carry nothing.
                    if line.is_empty() {
                        continue;
                    }
                    let rule = StatusLine::parse(&line)
                        .map(|status| status.body_rule())
                        .unwrap_or(BodyRule::None);
                    let frame = ResponseFrame::from_lines([line]);
                    match rule {
                        BodyRule::None => return Ok(Some(frame)),
                        rule => self.pending = Some((frame, rule)),
                    }
                }
                Some((mut frame, BodyRule::UntilBlank)) => {
                    if line.is_empty() {
                        return Ok(Some(frame));
                    }
                    frame.push(line);
                    self.pending = Some((frame, BodyRule::UntilBlank));
                }
                Some((mut frame, _)) => {
                    frame.push(line);
                    return Ok(Some(frame));
                }
            }
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        // Whatever is left never got its terminator.
        src.clear();
        self.scanned = 0;
        Ok(self.pending.take().map(|(frame, _)| frame))
    }
}

impl Encoder<EncodedCommand> for AmcpCodec {
    type Error = AmcpError;

    fn encode(&mut self, item: EncodedCommand, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let line = item.line();
        if line.contains(['\r', '\n']) {
            return Err(AmcpError::Encoding(format!(
                "command line contains a line break: {line:?}"
            )));
        }
        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationKind;

    fn decode_all(codec: &mut AmcpCodec, buf: &mut BytesMut) -> Vec<ResponseFrame> {
        let mut frames = Vec::new();
        while let Some(frame) = codec.decode(buf).unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn header_only_reply() {
        let mut codec = AmcpCodec::new();
        let mut buf = BytesMut::from("202 PLAY OK\r\n");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.lines(), ["202 PLAY OK"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn list_reply_ends_at_blank_line() {
        let mut codec = AmcpCodec::new();
        let mut buf = BytesMut::from("200 CLS OK\r\n\"A\"  MOVIE\r\n\"B\"  STILL\r\n\r\n202 PLAY OK\r\n");
        let frames = decode_all(&mut codec, &mut buf);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].lines(), ["200 CLS OK", "\"A\"  MOVIE", "\"B\"  STILL"]);
        assert_eq!(frames[1].header(), Some("202 PLAY OK"));
    }

    #[test]
    fn empty_list_reply() {
        let mut codec = AmcpCodec::new();
        let mut buf = BytesMut::from("200 TLS OK\r\n\r\n");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.lines(), ["200 TLS OK"]);
    }

    #[test]
    fn single_line_reply() {
        let mut codec = AmcpCodec::new();
        let mut buf = BytesMut::from("201 VERSION OK\r\n2.0.7.e9fc25a Stable\r\n");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.body(), ["2.0.7.e9fc25a Stable"]);
    }

    #[test]
    fn error_reply_has_no_body() {
        let mut codec = AmcpCodec::new();
        let mut buf = BytesMut::from("404 LOADBG FAILED\r\n202 STOP OK\r\n");
        let frames = decode_all(&mut codec, &mut buf);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].lines(), ["404 LOADBG FAILED"]);
    }

    #[test]
    fn split_reads() {
        let mut codec = AmcpCodec::new();
        let mut buf = BytesMut::new();
        let mut frames = Vec::new();
        for chunk in ["200 CL", "S OK\r", "\n\"A\"  MO", "VIE\n", "\r", "\n"] {
            buf.extend_from_slice(chunk.as_bytes());
            frames.extend(decode_all(&mut codec, &mut buf));
        }
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].lines(), ["200 CLS OK", "\"A\"  MOVIE"]);
    }

    #[test]
    fn bare_newlines_are_accepted() {
        let mut codec = AmcpCodec::new();
        let mut buf = BytesMut::from("201 VERSION OK\n2.0.7\n");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.lines(), ["201 VERSION OK", "2.0.7"]);
    }

    #[test]
    fn overlong_line_is_rejected() {
        let mut codec = AmcpCodec::new();
        let mut buf = BytesMut::from(vec![b'x'; MAX_LINE_LENGTH + 1].as_slice());
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, AmcpError::LineTooLong { .. }));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut codec = AmcpCodec::new();
        let mut buf = BytesMut::from(&b"202 \xff\r\n"[..]);
        assert!(matches!(
            codec.decode(&mut buf).unwrap_err(),
            AmcpError::InvalidUtf8(_)
        ));
    }

    #[test]
    fn eof_flushes_unterminated_list() {
        let mut codec = AmcpCodec::new();
        let mut buf = BytesMut::from("200 CLS OK\r\n\"A\"  MOVIE\r\n");
        assert!(codec.decode(&mut buf).unwrap().is_none());
        let frame = codec.decode_eof(&mut buf).unwrap().unwrap();
        assert_eq!(frame.lines().len(), 2);
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn encode_appends_crlf() {
        let mut codec = AmcpCodec::new();
        let mut buf = BytesMut::new();
        codec
            .encode(EncodedCommand::new(OperationKind::Raw, "VERSION"), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"VERSION\r\n");
    }

    #[test]
    fn encode_rejects_embedded_newline() {
        let mut codec = AmcpCodec::new();
        let mut buf = BytesMut::new();
        let err = codec
            .encode(EncodedCommand::new(OperationKind::Raw, "CLS\r\nKILL"), &mut buf)
            .unwrap_err();
        assert!(matches!(err, AmcpError::Encoding(_)));
        assert!(buf.is_empty());
    }
}
