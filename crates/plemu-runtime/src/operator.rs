//! Operator I/O port.
//!
//! Settings prompts, reports, progress marks, and the cancel key all go
//! through [`Operator`], so the scheduler and settings logic never know
//! whether they are talking to a serial terminal, stdin/stdout, or a test.

use plemu_common::error::EmuResult;

/// Operator-facing I/O services.
pub trait Operator {
    /// Show `label` and block until the operator enters an integer.
    fn prompt_int(&mut self, label: &str) -> EmuResult<i64>;

    /// Emit one line of text.
    fn report(&mut self, text: &str);

    /// Emit text without a line break (progress marks).
    fn report_inline(&mut self, text: &str);

    /// Non-blocking check for an operator cancel request.
    fn poll_cancel(&mut self) -> bool;
}

#[cfg(feature = "simulated")]
pub use scripted::ScriptedOperator;

#[cfg(feature = "simulated")]
mod scripted {
    use super::Operator;
    use plemu_common::error::{EmuError, EmuResult};
    use std::collections::VecDeque;

    /// Operator with pre-loaded answers and a captured transcript.
    #[derive(Debug, Default, Clone)]
    pub struct ScriptedOperator {
        inputs: VecDeque<i64>,
        transcript: String,
        prompts: Vec<String>,
        cancel_after_polls: Option<u64>,
        polls: u64,
    }

    impl ScriptedOperator {
        /// Create an operator with no queued answers that never cancels.
        pub fn new() -> Self {
            Self::default()
        }

        /// Create an operator answering prompts with `inputs` in order.
        pub fn with_inputs(inputs: impl IntoIterator<Item = i64>) -> Self {
            Self {
                inputs: inputs.into_iter().collect(),
                ..Self::default()
            }
        }

        /// Press the cancel key on the poll after `polls` polls.
        #[must_use]
        pub fn cancel_after(mut self, polls: u64) -> Self {
            self.cancel_after_polls = Some(polls);
            self
        }

        /// Everything reported so far.
        pub fn transcript(&self) -> &str {
            &self.transcript
        }

        /// Labels of every prompt shown, in order.
        pub fn prompts(&self) -> &[String] {
            &self.prompts
        }

        /// Number of cancel polls seen.
        pub fn polls(&self) -> u64 {
            self.polls
        }

        /// Answers not yet consumed.
        pub fn remaining_inputs(&self) -> usize {
            self.inputs.len()
        }
    }

    impl Operator for ScriptedOperator {
        fn prompt_int(&mut self, label: &str) -> EmuResult<i64> {
            self.prompts.push(label.to_string());
            self.transcript.push_str(label);
            let value = self.inputs.pop_front().ok_or(EmuError::InputClosed)?;
            self.transcript.push_str(&format!("{value}\n"));
            Ok(value)
        }

        fn report(&mut self, text: &str) {
            self.transcript.push_str(text);
            self.transcript.push('\n');
        }

        fn report_inline(&mut self, text: &str) {
            self.transcript.push_str(text);
        }

        fn poll_cancel(&mut self) -> bool {
            self.polls += 1;
            self.cancel_after_polls
                .is_some_and(|limit| self.polls > limit)
        }
    }

}
