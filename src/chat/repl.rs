//! Read-dispatch-print loop

use crate::chat::error::ChatResult;
use crate::prompt::QuestionPrompt;
use async_trait::async_trait;
use nu_ansi_term::Color;
use reedline::{FileBackedHistory, Reedline, Signal};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

const HISTORY_SIZE: usize = 1000;

/// One read from the input source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Ctrl-C: discard the current line and prompt again
    Interrupted,
    /// Ctrl-D or closed input
    Eof,
}

pub trait LineReader {
    fn read_line(&mut self) -> io::Result<ReadOutcome>;
}

/// Interactive reader with line editing and persistent history
pub struct ReedlineReader {
    editor: Reedline,
    prompt: QuestionPrompt,
}

impl ReedlineReader {
    pub fn new(history_path: Option<PathBuf>) -> Self {
        let history = match history_path {
            Some(path) => FileBackedHistory::with_file(HISTORY_SIZE, path).unwrap_or_else(|e| {
                warn!("History file unavailable, keeping history in memory: {}", e);
                FileBackedHistory::default()
            }),
            None => FileBackedHistory::default(),
        };

        Self {
            editor: Reedline::create().with_history(Box::new(history)),
            prompt: QuestionPrompt::default(),
        }
    }
}

impl LineReader for ReedlineReader {
    fn read_line(&mut self) -> io::Result<ReadOutcome> {
        match self.editor.read_line(&self.prompt)? {
            Signal::Success(buffer) => Ok(ReadOutcome::Line(buffer)),
            Signal::CtrlC => Ok(ReadOutcome::Interrupted),
            Signal::CtrlD => Ok(ReadOutcome::Eof),
        }
    }
}

/// Anything that turns one line of input into an answer
#[async_trait]
pub trait Responder {
    async fn respond(&mut self, input: &str) -> ChatResult<String>;

    /// Drop any cached schema so the next request reads the catalog
    fn refresh(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// `exit` or `quit`, any case, surrounding whitespace ignored
pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

pub fn is_refresh_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("refresh")
}

pub struct RequestLoop<R, W> {
    reader: R,
    out: W,
    state: LoopState,
}

impl<R: LineReader, W: Write> RequestLoop<R, W> {
    pub fn new(reader: R, out: W) -> Self {
        Self {
            reader,
            out,
            state: LoopState::Running,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run until `exit`/`quit` or end of input. Request failures are printed
    /// and the loop keeps going; only I/O failures on the terminal end it.
    pub async fn run(&mut self, responder: &mut (dyn Responder + Send)) -> io::Result<()> {
        while self.state == LoopState::Running {
            self.step(responder).await?;
        }
        Ok(())
    }

    async fn step(&mut self, responder: &mut (dyn Responder + Send)) -> io::Result<()> {
        let line = match self.reader.read_line()? {
            ReadOutcome::Line(line) => line,
            ReadOutcome::Interrupted => return Ok(()),
            ReadOutcome::Eof => {
                debug!("End of input");
                self.state = LoopState::Stopped;
                return Ok(());
            }
        };

        if is_exit_command(&line) {
            self.state = LoopState::Stopped;
            return Ok(());
        }
        if is_refresh_command(&line) {
            responder.refresh();
            writeln!(self.out, "Schema cache cleared.")?;
            return self.out.flush();
        }
        let question = line.trim();
        if question.is_empty() {
            return Ok(());
        }

        match responder.respond(question).await {
            Ok(answer) => writeln!(self.out, "{answer}")?,
            Err(e) => writeln!(self.out, "{}", Color::Red.paint(e.user_message()))?,
        }
        self.out.flush()
    }
}
