use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::StreamExt;

use crate::error::ProviderError;
use crate::http::HttpBodyStream;
use crate::provider::DeltaStream;

use super::types::OpenAiStreamChunk;

pub(crate) fn create_delta_stream(body: HttpBodyStream) -> DeltaStream {
    Box::pin(OpenAiDeltaStream::new(body))
}

/// Buffers a failed streaming response's body so the vendor error can be parsed.
pub(crate) async fn collect_stream_text(mut body: HttpBodyStream) -> Result<String, ProviderError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = body.next().await {
        bytes.extend_from_slice(&chunk?);
    }
    String::from_utf8(bytes)
        .map_err(|err| ProviderError::malformed("openai", format!("failed to decode stream error body: {err}")))
}

/// Decodes the Chat Completions SSE feed into plain text deltas.
///
/// Fragments are yielded strictly in arrival order with no buffering beyond
/// the current SSE event; the stream ends after the `[DONE]` marker or when
/// the connection closes.
struct OpenAiDeltaStream {
    body: HttpBodyStream,
    buffer: Vec<u8>,
    data_lines: Vec<Vec<u8>>,
    pending: VecDeque<Result<String, ProviderError>>,
    stream_closed: bool,
    done_received: bool,
}

impl OpenAiDeltaStream {
    fn new(body: HttpBodyStream) -> Self {
        Self {
            body,
            buffer: Vec::new(),
            data_lines: Vec::new(),
            pending: VecDeque::new(),
            stream_closed: false,
            done_received: false,
        }
    }

    fn handle_line(&mut self, line: Vec<u8>) {
        if line.starts_with(b"data:") {
            let mut data = line[5..].to_vec();
            if data.first() == Some(&b' ') {
                data.remove(0);
            }
            self.data_lines.push(data);
        }
    }

    fn flush_event(&mut self) -> Result<(), ProviderError> {
        if self.data_lines.is_empty() {
            return Ok(());
        }

        let mut joined = Vec::new();
        for (idx, mut segment) in self.data_lines.drain(..).enumerate() {
            if idx > 0 {
                joined.push(b'\n');
            }
            joined.append(&mut segment);
        }
        if joined.is_empty() {
            return Ok(());
        }

        let data = String::from_utf8(joined)
            .map_err(|err| ProviderError::malformed("openai", format!("invalid UTF-8 in stream chunk: {err}")))?;

        if data.trim() == "[DONE]" {
            self.done_received = true;
            return Ok(());
        }

        let chunk: OpenAiStreamChunk = serde_json::from_str(&data)
            .map_err(|err| ProviderError::malformed("openai", format!("failed to parse stream chunk: {err}")))?;
        for choice in chunk.choices {
            if let Some(content) = choice.delta.and_then(|delta| delta.content) {
                if !content.is_empty() {
                    self.pending.push_back(Ok(content));
                }
            }
        }
        Ok(())
    }

    fn drain_line(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
        buffer.iter().position(|b| *b == b'\n').map(|pos| {
            let mut line: Vec<u8> = buffer.drain(..=pos).collect();
            if line.last() == Some(&b'\n') {
                line.pop();
            }
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            line
        })
    }
}

impl Stream for OpenAiDeltaStream {
    type Item = Result<String, ProviderError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let Some(item) = this.pending.pop_front() {
            return Poll::Ready(Some(item));
        }
        if this.done_received {
            return Poll::Ready(None);
        }

        loop {
            if this.stream_closed {
                if !this.buffer.is_empty() {
                    let line = this.buffer.drain(..).collect::<Vec<u8>>();
                    this.handle_line(line);
                }
                if let Err(err) = this.flush_event() {
                    return Poll::Ready(Some(Err(err)));
                }
                return this
                    .pending
                    .pop_front()
                    .map_or(Poll::Ready(None), |item| Poll::Ready(Some(item)));
            }

            match this.body.as_mut().poll_next(cx) {
                Poll::Ready(Some(chunk_result)) => match chunk_result {
                    Ok(bytes) => {
                        this.buffer.extend_from_slice(&bytes);
                        while let Some(line) = Self::drain_line(&mut this.buffer) {
                            if line.is_empty() {
                                if let Err(err) = this.flush_event() {
                                    return Poll::Ready(Some(Err(err)));
                                }
                            } else {
                                this.handle_line(line);
                            }
                        }
                        if let Some(item) = this.pending.pop_front() {
                            return Poll::Ready(Some(item));
                        }
                        if this.done_received {
                            return Poll::Ready(None);
                        }
                    }
                    Err(err) => return Poll::Ready(Some(Err(err))),
                },
                Poll::Ready(None) => {
                    this.stream_closed = true;
                    continue;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures_util::stream;

    use super::*;

    fn build_body(chunks: Vec<Result<Vec<u8>, ProviderError>>) -> HttpBodyStream {
        Box::pin(stream::iter(chunks))
    }

    fn delta_chunk(text: &str) -> Vec<u8> {
        format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":\"{text}\"}}}}]}}\n\n"
        )
        .into_bytes()
    }

    #[tokio::test]
    async fn yields_deltas_in_arrival_order_then_ends_on_done() {
        let chunks = vec![
            Ok(delta_chunk("Hel")),
            Ok(delta_chunk("lo")),
            Ok(b"data: [DONE]\n\n".to_vec()),
        ];
        let mut deltas = create_delta_stream(build_body(chunks));

        assert_eq!(deltas.next().await.expect("delta").expect("ok"), "Hel");
        assert_eq!(deltas.next().await.expect("delta").expect("ok"), "lo");
        assert!(deltas.next().await.is_none());
    }

    #[tokio::test]
    async fn empty_deltas_are_skipped() {
        let chunks = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n\n".to_vec()),
            Ok(delta_chunk("only")),
            Ok(b"data: [DONE]\n\n".to_vec()),
        ];
        let mut deltas = create_delta_stream(build_body(chunks));
        assert_eq!(deltas.next().await.expect("delta").expect("ok"), "only");
        assert!(deltas.next().await.is_none());
    }

    #[tokio::test]
    async fn malformed_chunk_surfaces_as_error() {
        let chunks = vec![Ok(b"data: not json\n\n".to_vec())];
        let mut deltas = create_delta_stream(build_body(chunks));
        let err = deltas.next().await.expect("item").expect_err("should fail");
        assert!(matches!(err, ProviderError::Malformed { provider: "openai", .. }));
    }

    #[tokio::test]
    async fn ends_cleanly_when_connection_closes_without_done() {
        let chunks = vec![Ok(delta_chunk("partial"))];
        let mut deltas = create_delta_stream(build_body(chunks));
        assert_eq!(deltas.next().await.expect("delta").expect("ok"), "partial");
        assert!(deltas.next().await.is_none());
    }
}
