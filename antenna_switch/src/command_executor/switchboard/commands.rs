use ticcmd::{Status, TicError};
use utilities::command_executor::Command;

use crate::{command_executor::switchboard::SwitchboardHandler, models::Panel};

pub enum SwitchboardCommand {
    Panel,
    Switch { label: String },
    Calibrate,
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchResult {
    Ignored,
    Done { errors: Vec<String> },
}

#[derive(Debug)]
pub enum CommandResponse {
    Panel(Panel),
    Switch(SwitchResult),
    Calibrate(Vec<String>),
    Status(Result<Status, TicError>),
}

impl Command for SwitchboardCommand {
    type Response = CommandResponse;
    type Handler = SwitchboardHandler;

    fn execute(self, handler: &mut Self::Handler) -> Self::Response {
        match self {
            SwitchboardCommand::Panel => handler.panel(),
            SwitchboardCommand::Switch { label } => handler.switch_to(&label),
            SwitchboardCommand::Calibrate => handler.calibrate(),
            SwitchboardCommand::Status => handler.status(),
        }
    }
}
