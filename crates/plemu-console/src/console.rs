//! Stdin/stdout operator.
//!
//! A reader thread forwards stdin lines over a channel, so prompts can block
//! while the scheduler's cancel poll stays non-blocking. Any line entered
//! during a run is the cancel key; so is SIGINT.

use crate::signals::SignalHandler;
use plemu_common::error::{EmuError, EmuResult};
use plemu_runtime::Operator;
use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;
use tracing::{debug, warn};

/// How often a blocked prompt checks for signals.
const PROMPT_SIGNAL_POLL: Duration = Duration::from_millis(100);

/// Operator backed by the process's stdin and stdout.
pub struct StdioOperator {
    lines: Receiver<String>,
    signals: SignalHandler,
    echo: bool,
}

impl StdioOperator {
    /// Start the stdin reader thread.
    pub fn new(signals: SignalHandler) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        std::thread::Builder::new()
            .name("plemu-stdin".into())
            .spawn(move || {
                for line in std::io::stdin().lock().lines() {
                    match line {
                        Ok(line) => {
                            if tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "Failed to read stdin");
                            break;
                        }
                    }
                }
                debug!("Stdin closed");
            })?;
        Ok(Self::from_channel(rx, signals))
    }

    /// Build an operator reading lines from `lines`.
    pub fn from_channel(lines: Receiver<String>, signals: SignalHandler) -> Self {
        Self {
            lines,
            signals,
            echo: true,
        }
    }

    /// Suppress reports on stdout (prompts are still shown).
    #[must_use]
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    /// Block for the next input line, giving up on interrupt or shutdown.
    fn next_line(&mut self) -> EmuResult<String> {
        loop {
            if self.signals.take_interrupt() {
                // Ctrl+C at an idle prompt leaves the console.
                self.signals.request_shutdown();
                return Err(EmuError::InputClosed);
            }
            if self.signals.shutdown_requested() {
                return Err(EmuError::InputClosed);
            }
            match self.lines.recv_timeout(PROMPT_SIGNAL_POLL) {
                Ok(line) => return Ok(line),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Err(EmuError::InputClosed),
            }
        }
    }
}

/// Parse decimal or `0x`-prefixed hexadecimal input.
pub fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -value } else { value })
}

impl Operator for StdioOperator {
    fn prompt_int(&mut self, label: &str) -> EmuResult<i64> {
        loop {
            let mut out = std::io::stdout().lock();
            write!(out, "{label}").map_err(|e| EmuError::IoError(e.to_string()))?;
            out.flush().map_err(|e| EmuError::IoError(e.to_string()))?;
            drop(out);

            let line = self.next_line()?;
            match parse_int(&line) {
                Some(value) => return Ok(value),
                None => println!("'{}' is not a number, try again.", line.trim()),
            }
        }
    }

    fn report(&mut self, text: &str) {
        if self.echo {
            println!("{text}");
        }
    }

    fn report_inline(&mut self, text: &str) {
        if self.echo {
            let mut out = std::io::stdout().lock();
            let _ = write!(out, "{text}");
            let _ = out.flush();
        }
    }

    fn poll_cancel(&mut self) -> bool {
        if self.signals.take_interrupt() || self.signals.shutdown_requested() {
            return true;
        }
        match self.lines.try_recv() {
            Ok(_) => true,
            // Closed stdin is not a cancel request.
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operator() -> (StdioOperator, mpsc::Sender<String>, SignalHandler) {
        let (tx, rx) = mpsc::channel();
        let signals = SignalHandler::detached();
        let op = StdioOperator::from_channel(rx, signals.clone()).quiet();
        (op, tx, signals)
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("  -7\n"), Some(-7));
        assert_eq!(parse_int("0x2710"), Some(10_000));
        assert_eq!(parse_int("0X1f"), Some(31));
        assert_eq!(parse_int("ten"), None);
        assert_eq!(parse_int(""), None);
    }

    #[test]
    fn test_prompt_reads_channel() {
        let (mut op, tx, _signals) = operator();
        tx.send("oops".into()).unwrap();
        tx.send("1000".into()).unwrap();
        assert_eq!(op.prompt_int("period: "), Ok(1000));
    }

    #[test]
    fn test_prompt_closed_input() {
        let (mut op, tx, _signals) = operator();
        drop(tx);
        assert_eq!(op.prompt_int("period: "), Err(EmuError::InputClosed));
    }

    #[test]
    fn test_interrupt_at_prompt_requests_shutdown() {
        let (mut op, _tx, signals) = operator();
        signals.request_interrupt();
        assert_eq!(op.prompt_int("period: "), Err(EmuError::InputClosed));
        assert!(signals.shutdown_requested());
    }

    #[test]
    fn test_poll_cancel_on_line_or_interrupt() {
        let (mut op, tx, signals) = operator();
        assert!(!op.poll_cancel());

        tx.send(String::new()).unwrap();
        assert!(op.poll_cancel());
        assert!(!op.poll_cancel());

        signals.request_interrupt();
        assert!(op.poll_cancel());
        assert!(!signals.shutdown_requested());
    }

    #[test]
    fn test_closed_stdin_does_not_cancel() {
        let (mut op, tx, _signals) = operator();
        drop(tx);
        assert!(!op.poll_cancel());
    }
}
