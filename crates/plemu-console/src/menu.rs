//! Text menu dispatcher.

use crate::signals::SignalHandler;
use plemu_common::config::WorkloadConfig;
use plemu_common::error::EmuError;
use plemu_runtime::{Clock, Command, CommandStatus, Emulator, Operator, PulseOutput};
use tracing::{info, warn};

const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Why the menu loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuExit {
    /// The operator selected 0.
    Quit,
    /// Operator input closed.
    InputClosed,
    /// A shutdown was requested by signal.
    Shutdown,
}

/// Print the startup banner.
pub fn splash<O: Operator>(operator: &mut O) {
    operator.report(&format!(
        "{RED}Power Loss Emulator v{}{RESET}",
        env!("CARGO_PKG_VERSION")
    ));
    operator.report(&format!(
        "{RED}Waveform-modulated power loss pulse generator{RESET}"
    ));
    operator.report("");
}

/// Print the numbered command list.
pub fn render<O: Operator>(operator: &mut O) {
    operator.report("");
    for (i, command) in Command::ALL.iter().enumerate() {
        operator.report(&format!(
            "{:>2}) {:<18} {}",
            i + 1,
            command.name(),
            command.description()
        ));
    }
    operator.report(&format!("{:>2}) {:<18} {}", 0, "Exit", "Leave the emulator"));
}

/// Command selected by menu number `choice`, if any.
pub fn command_for(choice: i64) -> Option<Command> {
    let index = usize::try_from(choice).ok()?.checked_sub(1)?;
    Command::ALL.get(index).copied()
}

/// Run the menu until the operator exits.
///
/// Pending reload requests are applied before each selection with the
/// configuration returned by `reload`.
pub fn run<C, P, O, R>(
    emulator: &mut Emulator<C, P>,
    operator: &mut O,
    signals: &SignalHandler,
    mut reload: R,
) -> Result<MenuExit, EmuError>
where
    C: Clock,
    P: PulseOutput,
    O: Operator,
    R: FnMut() -> anyhow::Result<WorkloadConfig>,
{
    loop {
        if signals.shutdown_requested() {
            return Ok(MenuExit::Shutdown);
        }
        if signals.take_reload_request() {
            apply_reload(emulator, operator, &mut reload);
        }

        render(operator);
        let choice = match operator.prompt_int("Select: ") {
            Ok(choice) => choice,
            Err(EmuError::InputClosed) if signals.shutdown_requested() => {
                return Ok(MenuExit::Shutdown)
            }
            Err(EmuError::InputClosed) => return Ok(MenuExit::InputClosed),
            Err(e) => return Err(e),
        };

        if choice == 0 {
            info!("Operator exit");
            return Ok(MenuExit::Quit);
        }

        match command_for(choice) {
            Some(command) => {
                if emulator.dispatch(command, operator) == CommandStatus::Failure {
                    operator.report(&format!("{command} failed."));
                }
            }
            None => operator.report(&format!("No menu entry {choice}.")),
        }
    }
}

fn apply_reload<C, P, O, R>(emulator: &mut Emulator<C, P>, operator: &mut O, reload: &mut R)
where
    C: Clock,
    P: PulseOutput,
    O: Operator,
    R: FnMut() -> anyhow::Result<WorkloadConfig>,
{
    match reload() {
        Ok(config) => match emulator.replace_config(config) {
            Ok(()) => operator.report("Configuration reloaded."),
            Err(e) => {
                warn!(error = %e, "Reloaded configuration rejected");
                operator.report(&format!("Reload rejected: {e}."));
            }
        },
        Err(e) => {
            warn!(error = format!("{e:#}"), "Configuration reload failed");
            operator.report(&format!("Reload failed: {e:#}."));
        }
    }
}
