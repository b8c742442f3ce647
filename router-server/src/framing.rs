//! Newline-delimited line framing, with `\r` stripped and an
//! oversize-line guard against unbounded buffering.

use crate::error::ConnectionError;
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// A `tokio_util` codec for the line protocol: input lines are
/// terminated by `\n`, with an optional preceding `\r` stripped;
/// output lines are written with a trailing `\r\n` per the
/// traditional telnet-style line ending clients expect.
pub struct LineCodec {
    max_line_len: usize,
}

impl LineCodec {
    /// Builds a codec that rejects any line exceeding `max_line_len`
    /// bytes before a newline is found. This is the driver's guard
    /// against a peer streaming unbounded data with no newline to
    /// force unbounded buffer growth.
    pub fn new(max_line_len: usize) -> Self {
        LineCodec { max_line_len }
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ConnectionError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, ConnectionError> {
        let Some(newline_pos) = src.iter().position(|b| *b == b'\n') else {
            if src.len() > self.max_line_len {
                return Err(ConnectionError::LineTooLong(self.max_line_len));
            }
            return Ok(None);
        };

        let mut line = src.split_to(newline_pos + 1);
        line.truncate(line.len() - 1); // drop '\n'
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }

        String::from_utf8(line.to_vec()).map(Some).map_err(|_| ConnectionError::InvalidUtf8)
    }
}

impl Encoder<String> for LineCodec {
    type Error = ConnectionError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), ConnectionError> {
        dst.reserve(item.len() + 2);
        dst.put_slice(item.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_strips_trailing_cr() {
        let mut codec = LineCodec::new(4096);
        let mut buf = BytesMut::from(&b"hello\r\n"[..]);
        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(line, "hello");
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_without_cr_still_works() {
        let mut codec = LineCodec::new(4096);
        let mut buf = BytesMut::from(&b"hello\n"[..]);
        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(line, "hello");
    }

    #[test]
    fn decode_returns_none_when_no_newline_yet() {
        let mut codec = LineCodec::new(4096);
        let mut buf = BytesMut::from(&b"partial"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.remaining(), 7);
    }

    #[test]
    fn decode_rejects_oversize_line_without_newline() {
        let mut codec = LineCodec::new(8);
        let mut buf = BytesMut::from(&b"123456789"[..]);
        assert!(matches!(codec.decode(&mut buf), Err(ConnectionError::LineTooLong(8))));
    }

    #[test]
    fn decode_handles_multiple_lines_in_one_buffer() {
        let mut codec = LineCodec::new(4096);
        let mut buf = BytesMut::from(&b"first\r\nsecond\r\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "first");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "second");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }
}
