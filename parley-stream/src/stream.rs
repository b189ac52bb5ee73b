//! Async adapter: byte stream in, [`AssemblyEvent`]s out.

use futures::{Stream, StreamExt};

use crate::assembler::{AssemblyEvent, StreamAssembler};

/// Drive a [`StreamAssembler`] over a chunk stream.
///
/// Chunks are processed strictly in arrival order and nothing is read ahead.
/// A read error ends consumption with [`AssemblyEvent::TransportError`]; in
/// every case the stream closes with exactly one
/// [`AssemblyEvent::Complete`].
pub fn assemble<S, B, E>(chunks: S) -> impl Stream<Item = AssemblyEvent> + Send + 'static
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    async_stream::stream! {
        let mut assembler = StreamAssembler::new();
        let mut chunks = std::pin::pin!(chunks);

        while let Some(chunk_result) = chunks.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "stream read error, finishing with partial response"
                    );
                    yield AssemblyEvent::TransportError(e.to_string());
                    break;
                }
            };

            if chunk.as_ref().is_empty() {
                continue;
            }

            for event in assembler.push_chunk(chunk.as_ref()) {
                yield event;
            }
        }

        for event in assembler.finish_events() {
            yield event;
        }
    }
}
