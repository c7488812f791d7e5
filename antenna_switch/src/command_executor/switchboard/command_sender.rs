use ticcmd::{Status, TicError};
use utilities::command_executor::{CommandSender, ExecutorError};

use crate::{
    command_executor::switchboard::commands::{CommandResponse, SwitchResult, SwitchboardCommand},
    models::Panel,
};

#[derive(Debug, thiserror::Error)]
pub enum SwitchboardError {
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Device(#[from] TicError),

    #[error("Unexpected response type")]
    UnexpectedResponse,
}

#[derive(Clone)]
pub struct SwitchboardCommandSender {
    sender: CommandSender<SwitchboardCommand>,
}

impl SwitchboardCommandSender {
    pub fn new(sender: CommandSender<SwitchboardCommand>) -> Self {
        Self { sender }
    }

    pub async fn panel(&self) -> Result<Panel, SwitchboardError> {
        let response = self.sender.send_command(SwitchboardCommand::Panel).await?;

        match response {
            CommandResponse::Panel(panel) => Ok(panel),
            _ => Err(SwitchboardError::UnexpectedResponse),
        }
    }

    pub async fn switch_to(&self, label: String) -> Result<SwitchResult, SwitchboardError> {
        let response = self
            .sender
            .send_command(SwitchboardCommand::Switch { label })
            .await?;

        match response {
            CommandResponse::Switch(result) => Ok(result),
            _ => Err(SwitchboardError::UnexpectedResponse),
        }
    }

    pub async fn calibrate(&self) -> Result<Vec<String>, SwitchboardError> {
        let response = self
            .sender
            .send_command(SwitchboardCommand::Calibrate)
            .await?;

        match response {
            CommandResponse::Calibrate(errors) => Ok(errors),
            _ => Err(SwitchboardError::UnexpectedResponse),
        }
    }

    pub async fn status(&self) -> Result<Status, SwitchboardError> {
        let response = self.sender.send_command(SwitchboardCommand::Status).await?;

        match response {
            CommandResponse::Status(status) => Ok(status?),
            _ => Err(SwitchboardError::UnexpectedResponse),
        }
    }
}
