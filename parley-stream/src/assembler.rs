//! Sans-IO response assembler.
//!
//! Feed raw chunks with [`StreamAssembler::push_chunk`] and close the stream
//! with [`StreamAssembler::finish`]. The assembler owns three buffers: the
//! bytes of a UTF-8 sequence cut by a chunk boundary, the text of the line
//! that has not seen its newline yet, and the assembled response.

/// Marker that may precede an event line.
pub const DATA_PREFIX: &str = "data:";

/// Content-level end marker.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Text delivered when a stream produced no fragment at all.
pub const FALLBACK_TEXT: &str = "No response from the assistant";

/// One text increment plus the response assembled so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// The new piece of text.
    pub delta: String,
    /// Concatenation of every fragment of this stream, `delta` included.
    pub assembled: String,
}

/// Why a piece of input did not contribute to the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Chunk bytes were not valid UTF-8. The chunk was dropped.
    Decode {
        /// Decoder message.
        error: String,
    },
    /// Line was not valid JSON.
    Parse {
        /// The offending line, prefix stripped.
        line: String,
        /// Parser message.
        error: String,
    },
    /// Line was JSON but carried no string `data` field.
    MissingData {
        /// The offending line, prefix stripped.
        line: String,
    },
}

/// Terminal value of one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledResponse {
    text: String,
    fallback: bool,
}

impl AssembledResponse {
    /// Wrap assembled text, substituting [`FALLBACK_TEXT`] when it is empty.
    pub fn from_text(text: String) -> Self {
        if text.is_empty() {
            Self::fallback()
        } else {
            Self {
                text,
                fallback: false,
            }
        }
    }

    /// The response used when nothing was received.
    pub fn fallback() -> Self {
        Self {
            text: FALLBACK_TEXT.to_string(),
            fallback: true,
        }
    }

    /// Final text to display and store.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether [`FALLBACK_TEXT`] was substituted.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Consume into the final text.
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Output of the assembler, in stream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyEvent {
    /// A fragment was appended.
    Fragment(Fragment),
    /// The `[DONE]` line was seen. Transport reading continues.
    Sentinel,
    /// Some input was dropped; the stream goes on.
    Skipped(SkipReason),
    /// Reading the transport failed; no more chunks will arrive.
    TransportError(String),
    /// End of stream. Always the last event.
    Complete(AssembledResponse),
}

/// Rebuilds event lines from chunks and concatenates their fragments.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    text: String,
    line_buf: String,
    pending_bytes: Vec<u8>,
    /// A dropped chunk cut a line; discard text up to the next newline.
    resync: bool,
}

impl StreamAssembler {
    /// Create an assembler for a new stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// The response assembled so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Process one transport chunk and return the events it completes.
    ///
    /// Only newline-terminated lines are handled; the remainder waits for
    /// the next chunk or for [`finish`](Self::finish).
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<AssemblyEvent> {
        let mut events = Vec::new();

        match self.decode(chunk) {
            Ok(text) => self.accept(&text),
            Err(reason) => {
                // The line around the dropped bytes cannot be rebuilt.
                self.line_buf.clear();
                self.resync = !chunk.ends_with(b"\n");
                events.push(AssemblyEvent::Skipped(reason));
                return events;
            }
        }

        while let Some(newline_pos) = self.line_buf.find('\n') {
            let line: String = self.line_buf.drain(..=newline_pos).collect();
            self.process_line(&line, &mut events);
        }

        events
    }

    /// Close the stream: handle the unterminated last line, apply the
    /// fallback and reset for the next stream.
    pub fn finish(&mut self) -> AssembledResponse {
        let mut discarded = Vec::new();
        self.flush(&mut discarded);
        self.take_response()
    }

    /// Like [`finish`](Self::finish), returning the flushed events followed
    /// by [`AssemblyEvent::Complete`].
    pub fn finish_events(&mut self) -> Vec<AssemblyEvent> {
        let mut events = Vec::new();
        self.flush(&mut events);
        events.push(AssemblyEvent::Complete(self.take_response()));
        events
    }

    fn flush(&mut self, events: &mut Vec<AssemblyEvent>) {
        if !self.pending_bytes.is_empty() {
            let error = format!(
                "stream ended inside a UTF-8 sequence ({} bytes)",
                self.pending_bytes.len()
            );
            tracing::warn!(%error, "dropping incomplete trailing bytes");
            self.pending_bytes.clear();
            events.push(AssemblyEvent::Skipped(SkipReason::Decode { error }));
        }

        self.resync = false;
        let rest = std::mem::take(&mut self.line_buf);
        self.process_line(&rest, events);
    }

    /// Append decoded text to the line buffer, skipping the tail of a line
    /// broken by a dropped chunk.
    fn accept(&mut self, text: &str) {
        if !self.resync {
            self.line_buf.push_str(text);
            return;
        }
        if let Some(newline_pos) = text.find('\n') {
            tracing::debug!(dropped = newline_pos, "resynchronized after dropped chunk");
            self.resync = false;
            self.line_buf.push_str(&text[newline_pos + 1..]);
        }
    }

    fn take_response(&mut self) -> AssembledResponse {
        AssembledResponse::from_text(std::mem::take(&mut self.text))
    }

    /// Decode `chunk`, keeping a UTF-8 sequence split at the chunk end for
    /// the next call.
    fn decode(&mut self, chunk: &[u8]) -> Result<String, SkipReason> {
        let mut bytes = std::mem::take(&mut self.pending_bytes);
        bytes.extend_from_slice(chunk);

        match std::str::from_utf8(&bytes) {
            Ok(text) => Ok(text.to_owned()),
            // error_len() == None: the input ends mid-sequence.
            Err(e) if e.error_len().is_none() => {
                let valid = e.valid_up_to();
                self.pending_bytes = bytes[valid..].to_vec();
                std::str::from_utf8(&bytes[..valid])
                    .map(str::to_owned)
                    .map_err(|e| SkipReason::Decode {
                        error: e.to_string(),
                    })
            }
            Err(e) => {
                tracing::warn!(error = %e, len = chunk.len(), "skipping chunk with invalid UTF-8");
                Err(SkipReason::Decode {
                    error: e.to_string(),
                })
            }
        }
    }

    fn process_line(&mut self, raw: &str, events: &mut Vec<AssemblyEvent>) {
        let line = raw.trim();
        let line = line
            .strip_prefix(DATA_PREFIX)
            .map(str::trim_start)
            .unwrap_or(line);
        if line.is_empty() {
            return;
        }

        if line == DONE_SENTINEL {
            events.push(AssemblyEvent::Sentinel);
            return;
        }

        let value: serde_json::Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(line, error = %e, "skipping event line that is not JSON");
                events.push(AssemblyEvent::Skipped(SkipReason::Parse {
                    line: line.to_string(),
                    error: e.to_string(),
                }));
                return;
            }
        };

        let Some(delta) = value.get("data").and_then(serde_json::Value::as_str) else {
            tracing::debug!(line, "skipping event line without a data field");
            events.push(AssemblyEvent::Skipped(SkipReason::MissingData {
                line: line.to_string(),
            }));
            return;
        };

        if delta.is_empty() {
            return;
        }

        self.text.push_str(delta);
        events.push(AssemblyEvent::Fragment(Fragment {
            delta: delta.to_string(),
            assembled: self.text.clone(),
        }));
    }
}

/// Run a finite sequence of chunks through a fresh assembler.
pub fn assemble_all<I, B>(chunks: I) -> AssembledResponse
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut assembler = StreamAssembler::new();
    for chunk in chunks {
        assembler.push_chunk(chunk.as_ref());
    }
    assembler.finish()
}
