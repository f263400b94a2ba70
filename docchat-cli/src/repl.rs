//! Line input for the interactive commands.

use std::io::IsTerminal;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

/// Reads one question at a time: a line editor with history on a terminal,
/// plain lines when stdin is piped.
pub enum LineReader {
    Editor(DefaultEditor),
    Piped(Lines<Box<dyn AsyncBufRead + Unpin + Send>>),
}

impl LineReader {
    pub fn new() -> Result<Self> {
        if std::io::stdin().is_terminal() {
            Ok(Self::Editor(DefaultEditor::new()?))
        } else {
            Ok(Self::from_reader(BufReader::new(tokio::io::stdin())))
        }
    }

    /// Plain line input from any buffered reader.
    pub fn from_reader(reader: impl AsyncBufRead + Unpin + Send + 'static) -> Self {
        Self::Piped((Box::new(reader) as Box<dyn AsyncBufRead + Unpin + Send>).lines())
    }

    /// Next line, or `None` on end of input or Ctrl-C/Ctrl-D.
    pub async fn next_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self {
            // The editor blocks on the terminal; keep the runtime's other tasks moving.
            Self::Editor(editor) => match tokio::task::block_in_place(|| editor.readline(prompt)) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        editor.add_history_entry(line.as_str())?;
                    }
                    Ok(Some(line))
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
                Err(e) => Err(e.into()),
            },
            Self::Piped(lines) => Ok(lines.next_line().await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn piped_input_yields_lines_then_ends() {
        let mut input = LineReader::from_reader(&b"first\n\nsecond\n"[..]);
        assert_eq!(input.next_line("> ").await.unwrap().as_deref(), Some("first"));
        assert_eq!(input.next_line("> ").await.unwrap().as_deref(), Some(""));
        assert_eq!(input.next_line("> ").await.unwrap().as_deref(), Some("second"));
        assert_eq!(input.next_line("> ").await.unwrap(), None);
    }
}
