//! Fixed-size line windows with overlap.

use crate::error::IndexError;

pub const DEFAULT_WINDOW: usize = 30;

/// Window size and optional overlap, both in lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub window: usize,
    /// Lines shared by consecutive windows. `None` means half the window.
    pub overlap: Option<usize>,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            overlap: None,
        }
    }
}

impl ChunkerConfig {
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            window,
            overlap: None,
        }
    }

    /// Distance in lines between consecutive window starts.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Config` for a zero window or an overlap that is not smaller
    /// than the window.
    pub fn stride(&self) -> Result<usize, IndexError> {
        if self.window == 0 {
            return Err(IndexError::Config("chunk size must be greater than 0".into()));
        }
        match self.overlap {
            None => Ok((self.window / 2).max(1)),
            Some(overlap) if overlap >= self.window => Err(IndexError::Config(format!(
                "chunk overlap ({overlap}) must be smaller than chunk size ({})",
                self.window
            ))),
            Some(overlap) => Ok(self.window - overlap),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// 1-based line number of the first line in `text`.
    pub start_line: usize,
}

/// Lazy iterator over the windows of one text. Cloning restarts from the clone point.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    lines: Vec<&'a str>,
    window: usize,
    stride: usize,
    next: usize,
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.next >= self.lines.len() {
            return None;
        }
        let start = self.next;
        let end = (start + self.window).min(self.lines.len());
        self.next = start + self.stride;
        Some(Chunk {
            text: self.lines[start..end].join("\n"),
            start_line: start + 1,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.lines.len().saturating_sub(self.next).div_ceil(self.stride);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

/// Split `text` on `'\n'` into windows of `config.window` lines.
///
/// A window starts every stride lines while the start is still inside the text, so the
/// last windows may be shorter. Empty text yields a single empty chunk at line 1.
///
/// # Errors
///
/// Returns `IndexError::Config` if the configuration is invalid.
pub fn chunk_text<'a>(text: &'a str, config: &ChunkerConfig) -> Result<Chunks<'a>, IndexError> {
    let stride = config.stride()?;
    Ok(Chunks {
        lines: text.split('\n').collect(),
        window: config.window,
        stride,
        next: 0,
    })
}
