use std::sync::mpsc::{Receiver, Sender};

use tokio::sync::oneshot;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("Failed to send command")]
    SendFailed,

    #[error("Failed to receive response")]
    ReceiveFailed,

    #[error("Response receiver dropped")]
    ReceiverDropped,
}

pub trait Command: Send {
    type Response: Send;
    type Handler: DeviceHandler<Command = Self>;

    fn execute(self, handler: &mut Self::Handler) -> Self::Response;
}

pub trait DeviceHandler {
    type Command: Command<Handler = Self>;
}

pub struct GenericCommand<C: Command> {
    command: C,
    response_ch: oneshot::Sender<C::Response>,
}

impl<C: Command> GenericCommand<C> {
    pub fn new(command: C, response_ch: oneshot::Sender<C::Response>) -> Self {
        Self {
            command,
            response_ch,
        }
    }

    pub fn execute(self, handler: &mut C::Handler) -> Result<(), ExecutorError> {
        let result = self.command.execute(handler);

        self.response_ch
            .send(result)
            .map_err(|_| ExecutorError::ReceiverDropped)
    }
}

/// Owns a device handler and runs the commands sent to it one at a time, in
/// arrival order, on a single blocking thread.
pub struct CommandExecutor<H: DeviceHandler + Send + 'static> {
    handler: H,
    commands_ch: Receiver<GenericCommand<H::Command>>,
    sender: Sender<GenericCommand<H::Command>>,
}

impl<H: DeviceHandler + Send + 'static> CommandExecutor<H> {
    pub fn new(handler: H) -> Self {
        let (sender, commands_ch) = std::sync::mpsc::channel();

        Self {
            handler,
            commands_ch,
            sender,
        }
    }

    pub fn sender(&self) -> CommandSender<H::Command> {
        CommandSender::new(self.sender.clone())
    }

    /// Runs until every [`CommandSender`] is gone.
    pub fn run(self) -> H {
        let Self {
            mut handler,
            commands_ch,
            sender,
        } = self;
        drop(sender);

        while let Ok(command) = commands_ch.recv() {
            if let Err(e) = command.execute(&mut handler) {
                warn!(error = %e, "command response was not delivered");
            }
        }

        debug!("command channel closed, executor stopping");
        handler
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<H> {
        tokio::task::spawn_blocking(move || self.run())
    }
}

pub struct CommandSender<T: Command> {
    commands_ch: Sender<GenericCommand<T>>,
}

impl<C: Command> Clone for CommandSender<C> {
    fn clone(&self) -> Self {
        Self {
            commands_ch: self.commands_ch.clone(),
        }
    }
}

impl<C: Command> CommandSender<C> {
    pub fn new(commands_ch: Sender<GenericCommand<C>>) -> Self {
        Self { commands_ch }
    }

    pub async fn send_command(&self, command: C) -> Result<C::Response, ExecutorError> {
        let (response_ch, response_rx) = oneshot::channel();
        let command = GenericCommand::new(command, response_ch);

        self.commands_ch
            .send(command)
            .map_err(|_| ExecutorError::SendFailed)?;

        response_rx.await.map_err(|_| ExecutorError::ReceiveFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        value: i32,
        history: Vec<i32>,
    }

    enum CounterCommand {
        Add(i32),
        Get,
    }

    impl DeviceHandler for Counter {
        type Command = CounterCommand;
    }

    impl Command for CounterCommand {
        type Response = i32;
        type Handler = Counter;

        fn execute(self, handler: &mut Counter) -> i32 {
            match self {
                CounterCommand::Add(n) => {
                    handler.value += n;
                    handler.history.push(handler.value);
                    handler.value
                }
                CounterCommand::Get => handler.value,
            }
        }
    }

    #[tokio::test]
    async fn commands_run_in_order() {
        let executor = CommandExecutor::new(Counter {
            value: 0,
            history: Vec::new(),
        });
        let sender = executor.sender();
        let handle = executor.spawn();

        assert_eq!(sender.send_command(CounterCommand::Add(2)).await.unwrap(), 2);
        assert_eq!(sender.send_command(CounterCommand::Add(3)).await.unwrap(), 5);
        assert_eq!(sender.send_command(CounterCommand::Get).await.unwrap(), 5);

        drop(sender);
        let counter = handle.await.unwrap();
        assert_eq!(counter.history, vec![2, 5]);
    }

    #[tokio::test]
    async fn concurrent_senders_are_serialized() {
        let executor = CommandExecutor::new(Counter {
            value: 0,
            history: Vec::new(),
        });
        let sender = executor.sender();
        let handle = executor.spawn();

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let sender = sender.clone();
                tokio::spawn(async move { sender.send_command(CounterCommand::Add(1)).await })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        drop(sender);
        let counter = handle.await.unwrap();
        assert_eq!(counter.value, 20);
        assert_eq!(counter.history, (1..=20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn send_fails_once_executor_is_gone() {
        let executor = CommandExecutor::new(Counter {
            value: 0,
            history: Vec::new(),
        });
        let sender = executor.sender();
        drop(executor);

        let err = sender.send_command(CounterCommand::Get).await.unwrap_err();
        assert!(matches!(err, ExecutorError::SendFailed));
    }
}
