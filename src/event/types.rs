//! Event payload types
//!
//! The structs double as the protobuf body messages of the wire format, so the
//! field tags below are part of the protocol and must not be renumbered.

use bytes::Bytes;

pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_TYPE: &str = "Content-Type";

/// One `(name, value)` header. Order and duplicates are significant.
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct HeaderEntry {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

impl HeaderEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// HTTP request the caller wants relayed
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct RequestEvent {
    #[prost(string, tag = "1")]
    pub method: String,
    #[prost(string, tag = "2")]
    pub url: String,
    #[prost(message, repeated, tag = "3")]
    pub headers: Vec<HeaderEntry>,
    #[prost(bytes = "bytes", tag = "4")]
    pub content: Bytes,
}

/// HTTP response handed back to the caller
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct ResponseEvent {
    #[prost(uint32, tag = "1")]
    pub status: u32,
    #[prost(message, repeated, tag = "2")]
    pub headers: Vec<HeaderEntry>,
    #[prost(bytes = "bytes", tag = "3")]
    pub content: Bytes,
}

/// Closed set of events carried on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Request(RequestEvent),
    Response(ResponseEvent),
}

impl From<RequestEvent> for Event {
    fn from(value: RequestEvent) -> Self {
        Event::Request(value)
    }
}

impl From<ResponseEvent> for Event {
    fn from(value: ResponseEvent) -> Self {
        Event::Response(value)
    }
}

/// Decoded event together with the correlation hash from its frame header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub hash: u32,
    pub event: Event,
}

impl Envelope {
    pub fn new(hash: u32, event: impl Into<Event>) -> Self {
        Self {
            hash,
            event: event.into(),
        }
    }

    /// Strip the envelope, leaving the typed event for the dispatcher.
    pub fn extract(self) -> Event {
        self.event
    }
}

// Header lookups are ASCII case-insensitive, like HTTP field names.
macro_rules! impl_header_access {
    ($ty:ty) => {
        impl $ty {
            /// First value of `name`, if present
            pub fn header(&self, name: &str) -> Option<&str> {
                self.headers
                    .iter()
                    .find(|h| h.name.eq_ignore_ascii_case(name))
                    .map(|h| h.value.as_str())
            }

            /// Append a header, keeping any existing ones with the same name
            pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
                self.headers.push(HeaderEntry::new(name, value));
            }

            /// Replace the first `name` header in place and drop the rest,
            /// or append when absent.
            pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
                let value = value.into();
                match self
                    .headers
                    .iter()
                    .position(|h| h.name.eq_ignore_ascii_case(name))
                {
                    Some(first) => {
                        self.headers[first].value = value;
                        let mut index = 0;
                        self.headers.retain(|h| {
                            let keep = index <= first || !h.name.eq_ignore_ascii_case(name);
                            index += 1;
                            keep
                        });
                    }
                    None => self.headers.push(HeaderEntry::new(name, value)),
                }
            }

            /// Remove every `name` header, returning how many were dropped
            pub fn remove_header(&mut self, name: &str) -> usize {
                let before = self.headers.len();
                self.headers.retain(|h| !h.name.eq_ignore_ascii_case(name));
                before - self.headers.len()
            }

            /// Declared `Content-Length`, when present and numeric
            pub fn declared_content_length(&self) -> Option<usize> {
                self.header(CONTENT_LENGTH)
                    .and_then(|v| v.trim().parse::<usize>().ok())
            }
        }
    };
}

impl_header_access!(RequestEvent);
impl_header_access!(ResponseEvent);

impl RequestEvent {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            content: Bytes::new(),
        }
    }
}

impl ResponseEvent {
    pub fn new(status: u32) -> Self {
        Self {
            status,
            headers: Vec::new(),
            content: Bytes::new(),
        }
    }

    /// `text/plain` response whose `Content-Length` matches `body` exactly
    pub fn plain_text(status: u32, body: impl Into<String>) -> Self {
        let mut response = Self::new(status);
        response.set_header(CONTENT_TYPE, mime::TEXT_PLAIN.essence_str());
        response.set_content(Bytes::from(body.into()));
        response
    }

    /// Replace the buffered body and keep `Content-Length` consistent with it.
    pub fn set_content(&mut self, content: Bytes) {
        self.set_header(CONTENT_LENGTH, content.len().to_string());
        self.content = content;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut request = RequestEvent::new("GET", "http://example.com/");
        request.add_header("Host", "example.com");

        assert_eq!(request.header("host"), Some("example.com"));
        assert_eq!(request.header("HOST"), Some("example.com"));
        assert_eq!(request.header("Range"), None);
    }

    #[test]
    fn test_add_header_keeps_duplicates() {
        let mut response = ResponseEvent::new(200);
        response.add_header("Set-Cookie", "a=1");
        response.add_header("Set-Cookie", "b=2");

        assert_eq!(response.headers.len(), 2);
        assert_eq!(response.header("set-cookie"), Some("a=1"));
    }

    #[test]
    fn test_set_header_replaces_in_place() {
        let mut request = RequestEvent::new("GET", "http://example.com/");
        request.add_header("Accept", "*/*");
        request.add_header("Range", "bytes=0-");
        request.add_header("User-Agent", "test");
        request.add_header("range", "bytes=5-");

        request.set_header("Range", "bytes=0-99");

        let names: Vec<&str> = request.headers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Accept", "Range", "User-Agent"]);
        assert_eq!(request.header("Range"), Some("bytes=0-99"));
    }

    #[test]
    fn test_set_header_appends_when_absent() {
        let mut response = ResponseEvent::new(302);
        response.set_header("X-Range", "bytes=50-99");
        assert_eq!(response.headers, vec![HeaderEntry::new("X-Range", "bytes=50-99")]);
    }

    #[test]
    fn test_remove_header() {
        let mut response = ResponseEvent::new(200);
        response.add_header("Transfer-Encoding", "chunked");
        response.add_header("Server", "x");
        response.add_header("transfer-encoding", "gzip");

        assert_eq!(response.remove_header("Transfer-Encoding"), 2);
        assert_eq!(response.headers.len(), 1);
    }

    #[test]
    fn test_plain_text_sets_exact_content_length() {
        let response = ResponseEvent::plain_text(408, "Fetch timeout");
        assert_eq!(response.status, 408);
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
        assert_eq!(response.declared_content_length(), Some(13));
        assert_eq!(&response.content[..], b"Fetch timeout");
    }

    #[test]
    fn test_extract_strips_envelope() {
        let request = RequestEvent::new("GET", "http://example.com/");
        let envelope = Envelope::new(7, request.clone());
        assert_eq!(envelope.extract(), Event::Request(request));
    }
}
