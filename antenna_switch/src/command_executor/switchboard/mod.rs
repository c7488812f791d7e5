use ticcmd::TicClient;
use utilities::{command_executor::DeviceHandler, motor_controller::MoveReport};

use crate::{
    command_executor::switchboard::commands::{CommandResponse, SwitchResult, SwitchboardCommand},
    controllers::switchboard::{SwitchOutcome, Switchboard},
};

pub mod command_sender;
pub mod commands;

pub struct SwitchboardHandler {
    switchboard: Switchboard<TicClient>,
}

impl DeviceHandler for SwitchboardHandler {
    type Command = SwitchboardCommand;
}

fn error_messages<E: std::fmt::Display>(report: &MoveReport<E>) -> Vec<String> {
    report
        .failures
        .iter()
        .map(|failure| failure.error.to_string())
        .collect()
}

impl SwitchboardHandler {
    pub fn new(switchboard: Switchboard<TicClient>) -> Self {
        Self { switchboard }
    }

    pub fn panel(&self) -> CommandResponse {
        CommandResponse::Panel(self.switchboard.panel())
    }

    pub fn switch_to(&mut self, label: &str) -> CommandResponse {
        let result = match self.switchboard.switch_to(label) {
            SwitchOutcome::UnknownPort => SwitchResult::Ignored,
            SwitchOutcome::Moved(report) => SwitchResult::Done {
                errors: error_messages(&report),
            },
        };
        CommandResponse::Switch(result)
    }

    pub fn calibrate(&mut self) -> CommandResponse {
        let report = self.switchboard.calibrate();
        CommandResponse::Calibrate(error_messages(&report))
    }

    pub fn status(&self) -> CommandResponse {
        CommandResponse::Status(self.switchboard.motor().status())
    }
}
