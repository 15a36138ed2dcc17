//! Append-only output of cleaned sentences.
//!
//! Text is split on `.`, each fragment is trimmed, empty fragments are
//! dropped, and what remains is written one fragment per line. The writer
//! is line-buffered so every completed line reaches the file before the
//! next browser interaction.

use crate::models::ExtractedArticle;
use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::Path;
use tracing::{debug, instrument};

pub const SENTENCE_TERMINATOR: char = '.';

/// Split `text` into trimmed, non-empty sentence fragments.
///
/// # Examples
///
/// ```ignore
/// let lines: Vec<_> = sentences("A. B. ").collect();
/// assert_eq!(lines, vec!["A", "B"]);
/// ```
pub fn sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(SENTENCE_TERMINATOR)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
}

/// Owns the output resource for the lifetime of a run.
pub struct TextSink<W: Write> {
    out: LineWriter<W>,
    lines: usize,
}

impl TextSink<File> {
    /// Open `path` for appending, creating it if needed.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn append_to<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self::new(file))
    }
}

impl<W: Write> TextSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            out: LineWriter::new(writer),
            lines: 0,
        }
    }

    /// Append the sentences of `text`, returning how many lines were written.
    pub fn write(&mut self, text: &str) -> io::Result<usize> {
        let mut written = 0;
        for sentence in sentences(text) {
            self.out.write_all(sentence.as_bytes())?;
            self.out.write_all(b"\n")?;
            written += 1;
        }
        self.lines += written;
        Ok(written)
    }

    /// Append title, category and body of an article, in that order.
    pub fn write_article(&mut self, article: &ExtractedArticle) -> io::Result<usize> {
        let mut written = self.write(&article.title)?;
        written += self.write(&article.category)?;
        for line in &article.body_lines {
            written += self.write(line)?;
        }
        debug!(lines = written, "Wrote article");
        Ok(written)
    }

    /// Total lines appended through this sink.
    pub fn lines_written(&self) -> usize {
        self.lines
    }

    /// Flush and release the underlying writer.
    pub fn close(mut self) -> io::Result<()> {
        self.out.flush()
    }
}
