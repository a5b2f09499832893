//! Frame in, frame out: decode, route by event type, encode, hand to a sink.

use bytes::Bytes;
use tracing::{Instrument, debug, error, info_span};

use super::fetcher::Fetcher;
use crate::event::{
    Envelope, Event, EventHeaderTags, EventKind, ResponseEvent, decode_frame, encode_frame,
};

/// Whatever carries encoded response frames back to the caller
pub trait ResponseSink: Send {
    /// Largest single write the sink accepts; zero or negative means unlimited.
    fn max_package_size(&self) -> i64;

    fn send(&mut self, chunk: Bytes);
}

pub struct Dispatcher {
    fetcher: Fetcher,
}

impl Dispatcher {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// Handle one inbound frame. Exactly one encoded response frame is
    /// written to `sink` for every call, including undecodable input.
    pub async fn dispatch(&self, raw: &[u8], sink: &mut dyn ResponseSink) {
        let (tags, envelope) = match decode_frame(raw) {
            Ok(decoded) => decoded,
            Err(err) => {
                error!(error = %err, size = raw.len(), "Failed to decode event");
                let response =
                    ResponseEvent::plain_text(400, format!("Failed to decode event: {err}"));
                deliver(&EventHeaderTags::default(), &Envelope::new(0, response), sink);
                return;
            }
        };

        let hash = envelope.hash;
        let span = info_span!("dispatch", session_id = tags.session_id, hash);
        let response = self.route(envelope.extract()).instrument(span).await;

        deliver(&tags, &Envelope::new(hash, response), sink);
    }

    async fn route(&self, event: Event) -> ResponseEvent {
        match event {
            Event::Request(request) => {
                debug!(method = %request.method, url = %request.url, "Routing request event");
                self.fetcher.fetch(&request).await
            }
            Event::Response(_) => ResponseEvent::plain_text(
                400,
                format!("Unsupported event type: {}", EventKind::Response),
            ),
        }
    }
}

fn deliver(tags: &EventHeaderTags, envelope: &Envelope, sink: &mut dyn ResponseSink) {
    let mut frame = encode_frame(tags, envelope);

    let limit = sink.max_package_size();
    if limit <= 0 {
        sink.send(frame);
        return;
    }

    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    while frame.len() > limit {
        sink.send(frame.split_to(limit));
    }
    if !frame.is_empty() {
        sink.send(frame);
    }
}
