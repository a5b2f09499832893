//! Fixed-size preamble that precedes every event frame
//!
//! Layout (big-endian, 8 bytes):
//!
//! | offset | size | field      |
//! |--------|------|------------|
//! | 0      | 2    | magic      |
//! | 2      | 1    | version    |
//! | 3      | 1    | flags      |
//! | 4      | 4    | session id |

use bytes::{Buf, BufMut};

use super::error::{DecodeError, Result};

pub const TAGS_LEN: usize = 8;
pub const TAGS_MAGIC: u16 = 0xCAFE;
pub const TAGS_VERSION: u8 = 1;

/// Out-of-band routing metadata. Opaque to the relay beyond validation;
/// the dispatcher echoes it back on the response frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventHeaderTags {
    pub flags: u8,
    pub session_id: u32,
}

impl EventHeaderTags {
    pub fn new(session_id: u32) -> Self {
        Self {
            flags: 0,
            session_id,
        }
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u16(TAGS_MAGIC);
        buf.put_u8(TAGS_VERSION);
        buf.put_u8(self.flags);
        buf.put_u32(self.session_id);
    }

    pub fn decode(buf: &mut impl Buf) -> Result<Self> {
        if buf.remaining() < TAGS_LEN {
            return Err(DecodeError::Truncated {
                what: "header tags",
                needed: TAGS_LEN,
                available: buf.remaining(),
            });
        }

        let magic = buf.get_u16();
        if magic != TAGS_MAGIC {
            return Err(DecodeError::BadMagic(magic));
        }
        let version = buf.get_u8();
        if version != TAGS_VERSION {
            return Err(DecodeError::UnsupportedTagsVersion(version));
        }

        Ok(Self {
            flags: buf.get_u8(),
            session_id: buf.get_u32(),
        })
    }
}

/// Decode the tags at the front of `input`, returning them with the rest of
/// the buffer.
pub fn decode_tags(input: &[u8]) -> Result<(EventHeaderTags, &[u8])> {
    let mut buf = input;
    let tags = EventHeaderTags::decode(&mut buf)?;
    Ok((tags, buf))
}
