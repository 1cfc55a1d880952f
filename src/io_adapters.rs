use log::warn;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, Write};

/// Where the interpreter gets its command lines from.
pub trait LineSource {
    /// Show `prompt` and block for one line.
    ///
    /// Returns `Ok(None)` at end of input. The returned line has its line
    /// terminator removed; an empty string means the user just pressed enter.
    fn next_line(&mut self, prompt: &str, out: &mut dyn Write) -> io::Result<Option<String>>;
}

/// Plain buffered reader, used for pipes, files and tests.
///
/// The prompt is written to the `out` given to each call.
pub struct StreamSource<R> {
    reader: R,
    max_line_bytes: usize,
}

impl<R: BufRead> StreamSource<R> {
    pub fn new(reader: R, max_line_bytes: usize) -> Self {
        Self {
            reader,
            max_line_bytes,
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead> LineSource for StreamSource<R> {
    fn next_line(&mut self, prompt: &str, out: &mut dyn Write) -> io::Result<Option<String>> {
        out.write_all(prompt.as_bytes())?;
        out.flush()?;

        let Some(raw) = self.read_bounded()? else {
            return Ok(None);
        };
        let line = String::from_utf8_lossy(&raw).into_owned();
        Ok(Some(truncate_line(line, self.max_line_bytes)))
    }
}

impl<R: BufRead> StreamSource<R> {
    /// One line without its terminator. At most `max_line_bytes` are kept; the
    /// rest of the line is consumed and dropped. `None` at end of input.
    fn read_bounded(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        let mut seen_input = false;
        loop {
            let available = self.reader.fill_buf()?;
            if available.is_empty() {
                return Ok(seen_input.then_some(line));
            }
            seen_input = true;

            let newline = available.iter().position(|&b| b == b'\n');
            let end = newline.unwrap_or(available.len());
            let room = self.max_line_bytes.saturating_sub(line.len());
            line.extend_from_slice(&available[..end.min(room)]);
            let consumed = newline.map_or(end, |at| at + 1);
            self.reader.consume(consumed);

            if newline.is_some() {
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(Some(line));
            }
        }
    }
}

/// Interactive line editor with in-session history, used when stdin is a terminal.
///
/// Ctrl-C abandons the current line; Ctrl-D ends the input.
pub struct EditorSource {
    editor: DefaultEditor,
    max_line_bytes: usize,
}

impl EditorSource {
    pub fn new(max_line_bytes: usize) -> rustyline::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            max_line_bytes,
        })
    }
}

impl LineSource for EditorSource {
    fn next_line(&mut self, prompt: &str, _out: &mut dyn Write) -> io::Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                        warn!("could not record history entry: {e}");
                    }
                }
                Ok(Some(truncate_line(line, self.max_line_bytes)))
            }
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Io(e)) => Err(e),
            Err(e) => Err(io::Error::other(e)),
        }
    }
}

/// Cut `line` to at most `max_bytes`, backing off to a character boundary.
fn truncate_line(mut line: String, max_bytes: usize) -> String {
    if line.len() > max_bytes {
        let mut cut = max_bytes;
        while !line.is_char_boundary(cut) {
            cut -= 1;
        }
        line.truncate(cut);
    }
    line
}
