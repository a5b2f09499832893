//! Event frame codec
//!
//! A frame is `[tags][type:u16][body version:u16][hash:u32][body]`, where the
//! body is a length-delimited protobuf message of the type named by the
//! discriminant. Decoding is two-phase (tags, then event) and all-or-nothing.

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use prost::Message;

use super::error::{DecodeError, Result};
use super::tags::{EventHeaderTags, TAGS_LEN};
use super::types::{Envelope, Event, RequestEvent, ResponseEvent};

pub const EVENT_HEADER_LEN: usize = 8;
pub const BODY_VERSION: u16 = 1;

/// Wire discriminant of an event body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Request,
    Response,
}

impl EventKind {
    pub const fn code(self) -> u16 {
        match self {
            EventKind::Request => 1000,
            EventKind::Response => 1001,
        }
    }

    pub fn from_code(code: u16) -> Result<Self> {
        match code {
            1000 => Ok(EventKind::Request),
            1001 => Ok(EventKind::Response),
            other => Err(DecodeError::UnknownEventType(other)),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Request => f.write_str("request"),
            EventKind::Response => f.write_str("response"),
        }
    }
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Request(_) => EventKind::Request,
            Event::Response(_) => EventKind::Response,
        }
    }
}

/// Append the frame for `envelope` (without tags) to `buf`.
pub fn encode_event(envelope: &Envelope, buf: &mut impl BufMut) {
    buf.put_u16(envelope.event.kind().code());
    buf.put_u16(BODY_VERSION);
    buf.put_u32(envelope.hash);

    let body = match &envelope.event {
        Event::Request(request) => request.encode_length_delimited_to_vec(),
        Event::Response(response) => response.encode_length_delimited_to_vec(),
    };
    buf.put_slice(&body);
}

/// Decode one event from the front of `input`, returning it with the bytes
/// that follow the body.
pub fn decode_event(input: &[u8]) -> Result<(Envelope, &[u8])> {
    let mut buf = input;
    let envelope = read_envelope(&mut buf)?;
    Ok((envelope, buf))
}

/// Encode tags followed by the event frame.
pub fn encode_frame(tags: &EventHeaderTags, envelope: &Envelope) -> Bytes {
    let mut buf = BytesMut::with_capacity(TAGS_LEN + EVENT_HEADER_LEN + 64);
    tags.encode(&mut buf);
    encode_event(envelope, &mut buf);
    buf.freeze()
}

/// Decode tags then the event. Trailing bytes after the body are ignored.
pub fn decode_frame(input: &[u8]) -> Result<(EventHeaderTags, Envelope)> {
    let mut buf = input;
    let tags = EventHeaderTags::decode(&mut buf)?;
    let envelope = read_envelope(&mut buf)?;
    if buf.has_remaining() {
        tracing::debug!(trailing = buf.remaining(), "Ignoring bytes after event body");
    }
    Ok((tags, envelope))
}

fn read_envelope(buf: &mut &[u8]) -> Result<Envelope> {
    if buf.remaining() < EVENT_HEADER_LEN {
        return Err(DecodeError::Truncated {
            what: "event header",
            needed: EVENT_HEADER_LEN,
            available: buf.remaining(),
        });
    }

    let kind = EventKind::from_code(buf.get_u16())?;
    let version = buf.get_u16();
    let hash = buf.get_u32();
    if version != BODY_VERSION {
        return Err(DecodeError::UnsupportedBodyVersion { kind, version });
    }

    let event = match kind {
        EventKind::Request => {
            let request = RequestEvent::decode_length_delimited(&mut *buf)?;
            validate_request(&request)?;
            Event::Request(request)
        }
        EventKind::Response => {
            let response = ResponseEvent::decode_length_delimited(&mut *buf)?;
            validate_response(&response)?;
            Event::Response(response)
        }
    };

    Ok(Envelope { hash, event })
}

fn validate_request(request: &RequestEvent) -> Result<()> {
    if request.method.is_empty() {
        return Err(DecodeError::Invalid("request method is empty".into()));
    }
    if request.url.is_empty() {
        return Err(DecodeError::Invalid("request url is empty".into()));
    }
    check_content_length(request.declared_content_length(), request.content.len())
}

fn validate_response(response: &ResponseEvent) -> Result<()> {
    if !(100..=599).contains(&response.status) {
        return Err(DecodeError::Invalid(format!(
            "response status {} is not a valid HTTP status",
            response.status
        )));
    }
    check_content_length(response.declared_content_length(), response.content.len())
}

fn check_content_length(declared: Option<usize>, actual: usize) -> Result<()> {
    match declared {
        Some(declared) if declared != actual => Err(DecodeError::Invalid(format!(
            "Content-Length {declared} does not match {actual} content bytes"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::types::HeaderEntry;

    fn sample_request() -> RequestEvent {
        let mut request = RequestEvent::new("POST", "http://example.com/upload?x=1");
        request.add_header("Host", "example.com");
        request.add_header("Cookie", "a=1");
        request.add_header("Cookie", "b=2");
        request.add_header("Content-Length", "4");
        request.content = Bytes::from_static(&[0, 159, 146, 150]);
        request
    }

    fn sample_response() -> ResponseEvent {
        let mut response = ResponseEvent::new(206);
        response.add_header("Set-Cookie", "a=1");
        response.add_header("Content-Range", "bytes 0-2/10");
        response.add_header("Set-Cookie", "b=2");
        response.set_content(Bytes::from_static(b"\x00\xffz"));
        response
    }

    fn encoded(envelope: &Envelope) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_event(envelope, &mut buf);
        buf
    }

    #[test]
    fn test_request_roundtrip_preserves_headers_and_content() {
        let envelope = Envelope::new(99, sample_request());
        let bytes = encoded(&envelope);

        let (decoded, rest) = decode_event(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, envelope);

        let Event::Request(request) = decoded.extract() else {
            panic!("expected request event");
        };
        assert_eq!(
            request.headers,
            vec![
                HeaderEntry::new("Host", "example.com"),
                HeaderEntry::new("Cookie", "a=1"),
                HeaderEntry::new("Cookie", "b=2"),
                HeaderEntry::new("Content-Length", "4"),
            ]
        );
    }

    #[test]
    fn test_response_roundtrip() {
        let envelope = Envelope::new(0, sample_response());
        let bytes = encoded(&envelope);
        let (decoded, _) = decode_event(&bytes).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_frame_roundtrip_with_tags() {
        let tags = EventHeaderTags {
            flags: 1,
            session_id: 7,
        };
        let envelope = Envelope::new(3, sample_request());
        let frame = encode_frame(&tags, &envelope);

        let (decoded_tags, decoded) = decode_frame(&frame).unwrap();
        assert_eq!(decoded_tags, tags);
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_decode_event_returns_trailing_bytes() {
        let mut bytes = encoded(&Envelope::new(1, sample_response()));
        bytes.extend_from_slice(b"next");

        let (_, rest) = decode_event(&bytes).unwrap();
        assert_eq!(rest, b"next");
    }

    #[test]
    fn test_unknown_discriminant_is_an_error() {
        let mut bytes = encoded(&Envelope::new(1, sample_response()));
        bytes[0..2].copy_from_slice(&0u16.to_be_bytes());
        assert_eq!(decode_event(&bytes).unwrap_err(), DecodeError::UnknownEventType(0));

        bytes[0..2].copy_from_slice(&1002u16.to_be_bytes());
        assert_eq!(
            decode_event(&bytes).unwrap_err(),
            DecodeError::UnknownEventType(1002)
        );
    }

    #[test]
    fn test_unsupported_body_version() {
        let mut bytes = encoded(&Envelope::new(1, sample_request()));
        bytes[2..4].copy_from_slice(&2u16.to_be_bytes());
        assert!(matches!(
            decode_event(&bytes),
            Err(DecodeError::UnsupportedBodyVersion {
                kind: EventKind::Request,
                version: 2
            })
        ));
    }

    #[test]
    fn test_truncated_body_is_an_error() {
        let bytes = encoded(&Envelope::new(1, sample_request()));
        let cut = &bytes[..bytes.len() - 2];
        assert!(matches!(decode_event(cut), Err(DecodeError::Body(_))));
    }

    #[test]
    fn test_truncated_event_header() {
        assert!(matches!(
            decode_event(&[0x03, 0xE8, 0x00]),
            Err(DecodeError::Truncated { available: 3, .. })
        ));
    }

    #[test]
    fn test_request_requires_method_and_url() {
        let bytes = encoded(&Envelope::new(1, RequestEvent::new("", "http://a/")));
        assert!(matches!(decode_event(&bytes), Err(DecodeError::Invalid(_))));

        let bytes = encoded(&Envelope::new(1, RequestEvent::new("GET", "")));
        assert!(matches!(decode_event(&bytes), Err(DecodeError::Invalid(_))));
    }

    #[test]
    fn test_content_length_mismatch_is_rejected() {
        let mut request = sample_request();
        request.set_header("Content-Length", "5");
        let bytes = encoded(&Envelope::new(1, request));
        assert!(matches!(decode_event(&bytes), Err(DecodeError::Invalid(_))));
    }

    #[test]
    fn test_response_status_must_be_valid() {
        let bytes = encoded(&Envelope::new(1, ResponseEvent::new(0)));
        assert!(matches!(decode_event(&bytes), Err(DecodeError::Invalid(_))));

        let bytes = encoded(&Envelope::new(1, ResponseEvent::new(600)));
        assert!(matches!(decode_event(&bytes), Err(DecodeError::Invalid(_))));
    }

    #[test]
    fn test_decode_frame_fails_on_bad_tags_before_payload() {
        let mut frame = encode_frame(&EventHeaderTags::default(), &Envelope::new(1, sample_request()))
            .to_vec();
        frame[0] = 0;
        assert!(matches!(decode_frame(&frame), Err(DecodeError::BadMagic(_))));
    }
}
