//! Terminal rendering of streamed replies.

use std::io::Write;

use parley_session::{Presenter, RenderError};

/// Streaming cursor drawn after partial text.
pub const CURSOR: &str = "▌";

/// Moves back over the cursor, blanks it and moves back again.
const ERASE_CURSOR: &str = "\u{8} \u{8}";

/// Writes a reply as it grows.
///
/// Partial text is written append-only: only the part not yet on screen is
/// printed, followed by the cursor. When a partial is not a continuation of
/// what is shown, the reply restarts on a fresh line.
pub struct TerminalPresenter<W: Write> {
    out: W,
    cursor: bool,
    shown: String,
    cursor_drawn: bool,
}

impl<W: Write> TerminalPresenter<W> {
    /// Render to `out`. With `cursor` off, partials are written without the
    /// trailing cursor; use that when `out` is not a terminal.
    pub fn new(out: W, cursor: bool) -> Self {
        Self {
            out,
            cursor,
            shown: String::new(),
            cursor_drawn: false,
        }
    }

    /// The writer, for output between turns.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_text(&mut self, text: &str) -> std::io::Result<()> {
        if self.cursor_drawn {
            self.out.write_all(ERASE_CURSOR.as_bytes())?;
            self.cursor_drawn = false;
        }
        match text.strip_prefix(self.shown.as_str()) {
            Some(rest) => self.out.write_all(rest.as_bytes())?,
            None => {
                self.out.write_all(b"\r\n")?;
                self.out.write_all(text.as_bytes())?;
            }
        }
        self.shown.clear();
        self.shown.push_str(text);
        Ok(())
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn show_partial(&mut self, text: &str) -> Result<(), RenderError> {
        if text.is_empty() {
            return Err(RenderError::Nothing);
        }
        self.write_text(text)?;
        if self.cursor {
            self.out.write_all(CURSOR.as_bytes())?;
            self.cursor_drawn = true;
        }
        self.out.flush()?;
        Ok(())
    }

    fn show_final(&mut self, text: &str) -> Result<(), RenderError> {
        let result = if text.is_empty() {
            Err(RenderError::Nothing)
        } else {
            self.write_text(text)
                .and_then(|()| self.out.write_all(b"\n"))
                .and_then(|()| self.out.flush())
                .map_err(RenderError::from)
        };
        // Next turn starts from a clean line either way.
        self.shown.clear();
        self.cursor_drawn = false;
        result
    }
}

impl<W: Write> std::fmt::Debug for TerminalPresenter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalPresenter")
            .field("cursor", &self.cursor)
            .field("shown", &self.shown.len())
            .finish()
    }
}
