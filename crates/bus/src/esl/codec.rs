//! Framing for the event socket protocol.
//!
//! A frame is a block of `Key: Value` lines closed by a blank line, followed by
//! exactly `Content-Length` body bytes when that header is present.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::EslError;

/// Upper bound for one header block.
pub const MAX_HEADER_BYTES: usize = 64 * 1024;

/// One decoded frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    /// Value of the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    pub fn reply_text(&self) -> Option<&str> {
        self.header("Reply-Text")
    }
}

#[derive(Debug)]
enum State {
    Idle,
    ReadingHeaders,
    ReadingBody {
        headers: Vec<(String, String)>,
        length: usize,
    },
}

/// Codec turning the byte stream into [`Frame`]s and commands into
/// `cmd\n\n` writes.
#[derive(Debug)]
pub struct EslCodec {
    state: State,
}

impl EslCodec {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }
}

impl Default for EslCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for EslCodec {
    type Item = Frame;
    type Error = EslError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, EslError> {
        loop {
            match std::mem::replace(&mut self.state, State::Idle) {
                State::Idle => {
                    // Stray line breaks between frames are not frames.
                    let skip = src
                        .iter()
                        .take_while(|b| **b == b'\n' || **b == b'\r')
                        .count();
                    src.advance(skip);
                    if src.is_empty() {
                        return Ok(None);
                    }
                    self.state = State::ReadingHeaders;
                }
                State::ReadingHeaders => {
                    let Some((block_end, consumed)) = find_blank_line(src) else {
                        if src.len() > MAX_HEADER_BYTES {
                            return Err(EslError::Protocol(format!(
                                "header block exceeds {} bytes",
                                MAX_HEADER_BYTES
                            )));
                        }
                        self.state = State::ReadingHeaders;
                        return Ok(None);
                    };
                    if block_end > MAX_HEADER_BYTES {
                        return Err(EslError::Protocol(format!(
                            "header block exceeds {} bytes",
                            MAX_HEADER_BYTES
                        )));
                    }

                    let block = src.split_to(consumed);
                    let headers = parse_headers(&block[..block_end])?;
                    match content_length(&headers)? {
                        None | Some(0) => {
                            return Ok(Some(Frame {
                                headers,
                                body: String::new(),
                            }));
                        }
                        Some(length) => {
                            self.state = State::ReadingBody { headers, length };
                        }
                    }
                }
                State::ReadingBody { headers, length } => {
                    if src.len() < length {
                        src.reserve(length - src.len());
                        self.state = State::ReadingBody { headers, length };
                        return Ok(None);
                    }
                    let body = src.split_to(length);
                    return Ok(Some(Frame {
                        headers,
                        body: String::from_utf8_lossy(&body).into_owned(),
                    }));
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, EslError> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() && matches!(self.state, State::Idle) => Ok(None),
            None => Err(EslError::Protocol(
                "connection closed in the middle of a frame".to_string(),
            )),
        }
    }
}

impl<'a> Encoder<&'a str> for EslCodec {
    type Error = EslError;

    fn encode(&mut self, command: &'a str, dst: &mut BytesMut) -> Result<(), EslError> {
        dst.reserve(command.len() + 2);
        dst.extend_from_slice(command.as_bytes());
        dst.extend_from_slice(b"\n\n");
        Ok(())
    }
}

/// Finds the blank line closing a header block.
///
/// Returns the end of the block and the number of bytes to consume including
/// the blank line.
fn find_blank_line(buf: &[u8]) -> Option<(usize, usize)> {
    let mut start = 0;
    while let Some(offset) = buf[start..].iter().position(|b| *b == b'\n') {
        let end = start + offset;
        let line = &buf[start..end];
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            return Some((start, end + 1));
        }
        start = end + 1;
    }
    None
}

fn parse_headers(block: &[u8]) -> Result<Vec<(String, String)>, EslError> {
    let text = std::str::from_utf8(block)
        .map_err(|_| EslError::Protocol("header block is not valid UTF-8".to_string()))?;

    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.split_once(':')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .ok_or_else(|| EslError::Protocol(format!("header line without ':': {:?}", line)))
        })
        .collect()
}

fn content_length(headers: &[(String, String)]) -> Result<Option<usize>, EslError> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
        .map(|(_, v)| {
            v.parse::<usize>()
                .map_err(|_| EslError::Protocol(format!("non-numeric Content-Length: {:?}", v)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &[u8]) -> Result<Vec<Frame>, EslError> {
        let mut codec = EslCodec::new();
        let mut buf = BytesMut::from(input);
        let mut frames = Vec::new();
        while let Some(frame) = codec.decode(&mut buf)? {
            frames.push(frame);
        }
        Ok(frames)
    }

    #[test]
    fn test_headers_only_frame() {
        let frames = decode_all(b"Content-Type: auth/request\n\n").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].content_type(), Some("auth/request"));
        assert!(frames[0].body.is_empty());
    }

    #[test]
    fn test_frame_with_body() {
        let frames =
            decode_all(b"Content-Type: api/response\nContent-Length: 11\n\n+OK uuid-42").unwrap();
        assert_eq!(frames[0].body, "+OK uuid-42");
    }

    #[test]
    fn test_zero_content_length_is_empty_body() {
        let frames = decode_all(
            b"Content-Type: api/response\nContent-Length: 0\n\nContent-Type: command/reply\nReply-Text: +OK\n\n",
        )
        .unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].body, "");
        assert_eq!(frames[1].reply_text(), Some("+OK"));
    }

    #[test]
    fn test_body_split_across_reads() {
        let body = "x".repeat(100_000);
        let wire = format!("Content-Type: api/response\nContent-Length: {}\n\n{}", body.len(), body);
        let bytes = wire.as_bytes();

        let mut codec = EslCodec::new();
        let mut buf = BytesMut::new();
        let mut decoded = None;
        for chunk in bytes.chunks(4096) {
            buf.extend_from_slice(chunk);
            if let Some(frame) = codec.decode(&mut buf).unwrap() {
                decoded = Some(frame);
            }
        }

        let frame = decoded.expect("frame should complete on the last chunk");
        assert_eq!(frame.body.len(), 100_000);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_partial_header_waits() {
        let mut codec = EslCodec::new();
        let mut buf = BytesMut::from(&b"Content-Type: auth/"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"request\n\n");
        assert!(codec.decode(&mut buf).unwrap().is_some());
    }

    #[test]
    fn test_crlf_and_leading_newlines() {
        let frames = decode_all(b"\n\nContent-Type: command/reply\r\nReply-Text: +OK\r\n\r\n").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].reply_text(), Some("+OK"));
    }

    #[test]
    fn test_rejects_line_without_colon() {
        let err = decode_all(b"Content-Type auth/request\n\n").unwrap_err();
        assert!(matches!(err, EslError::Protocol(_)));
    }

    #[test]
    fn test_rejects_non_numeric_length() {
        let err = decode_all(b"Content-Type: api/response\nContent-Length: ten\n\n").unwrap_err();
        assert!(matches!(err, EslError::Protocol(_)));
    }

    #[test]
    fn test_rejects_oversized_header_block() {
        let mut input = Vec::new();
        while input.len() <= MAX_HEADER_BYTES {
            input.extend_from_slice(b"X-Filler: aaaaaaaaaaaaaaaaaaaaaaaa\n");
        }
        let err = decode_all(&input).unwrap_err();
        assert!(matches!(err, EslError::Protocol(_)));
    }

    #[test]
    fn test_eof_mid_frame_is_protocol_error() {
        let mut codec = EslCodec::new();
        let mut buf = BytesMut::from(&b"Content-Length: 10\n\nabc"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(matches!(
            codec.decode_eof(&mut buf),
            Err(EslError::Protocol(_))
        ));
    }

    #[test]
    fn test_encode_appends_blank_line() {
        let mut codec = EslCodec::new();
        let mut dst = BytesMut::new();
        codec.encode("auth ClueCon", &mut dst).unwrap();
        assert_eq!(&dst[..], b"auth ClueCon\n\n");
    }
}
