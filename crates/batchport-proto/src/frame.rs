//! Length-delimited framing for lists of encoded messages.

use bytes::{Buf, Bytes, BytesMut};

use crate::WireError;

pub fn encode_frames<I, B>(frames: I) -> Result<Bytes, WireError>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut out = BytesMut::new();
    for frame in frames {
        let frame = frame.as_ref();
        out.reserve(prost::length_delimiter_len(frame.len()) + frame.len());
        prost::encode_length_delimiter(frame.len(), &mut out)?;
        out.extend_from_slice(frame);
    }
    Ok(out.freeze())
}

pub fn split_frames(mut buf: Bytes) -> Result<Vec<Bytes>, WireError> {
    let mut frames = Vec::new();
    while buf.has_remaining() {
        let len = prost::decode_length_delimiter(&mut buf)?;
        if len > buf.remaining() {
            return Err(WireError::TruncatedFrame {
                needed: len,
                remaining: buf.remaining(),
            });
        }
        frames.push(buf.split_to(len));
    }
    Ok(frames)
}
