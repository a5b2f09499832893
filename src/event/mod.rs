//! Event wire protocol
//!
//! Every message exchanged with the relay is a binary frame made of a fixed
//! header-tag preamble followed by one typed event:
//!
//! - [`EventHeaderTags`] - fixed 8-byte routing/version preamble
//! - [`RequestEvent`] - HTTP request to perform on behalf of the caller
//! - [`ResponseEvent`] - HTTP response handed back to the caller
//!
//! ## Usage
//!
//! ```rust
//! use relaybox::event::{decode_frame, encode_frame, Envelope, EventHeaderTags, RequestEvent};
//!
//! let request = RequestEvent::new("GET", "http://example.com/");
//! let frame = encode_frame(&EventHeaderTags::new(1), &Envelope::new(7, request.clone()));
//!
//! let (tags, envelope) = decode_frame(&frame).unwrap();
//! assert_eq!(tags.session_id, 1);
//! assert_eq!(envelope.hash, 7);
//! ```

mod codec;
mod error;
mod tags;
mod types;

pub use codec::{
    BODY_VERSION, EVENT_HEADER_LEN, EventKind, decode_event, decode_frame, encode_event,
    encode_frame,
};
pub use error::DecodeError;
pub use tags::{EventHeaderTags, TAGS_LEN, TAGS_MAGIC, TAGS_VERSION, decode_tags};
pub use types::{
    CONTENT_LENGTH, CONTENT_TYPE, Envelope, Event, HeaderEntry, RequestEvent, ResponseEvent,
};
