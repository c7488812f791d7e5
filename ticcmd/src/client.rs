use std::{
    thread,
    time::{Duration, Instant},
};

use tracing::debug;
use utilities::motor_controller::PositionMotor;

use crate::{
    error::TicError,
    runner::{CommandRunner, ProcessRunner},
    status::{Status, parse_status},
};

const POLLS_PER_TIMEOUT: u32 = 10;

pub struct TicClient {
    runner: Box<dyn CommandRunner>,
}

impl TicClient {
    pub fn new(bin: &str, debug: bool) -> Result<Self, TicError> {
        let mut runner = ProcessRunner::new(bin)?;
        runner.set_debug(debug);
        Ok(Self::with_runner(runner))
    }

    pub fn with_runner(runner: impl CommandRunner + 'static) -> Self {
        Self {
            runner: Box::new(runner),
        }
    }

    fn run(&self, action: &'static str, args: &[&str]) -> Result<Vec<u8>, TicError> {
        self.runner.run(args).map_err(TicError::command(action))
    }

    pub fn status(&self) -> Result<Status, TicError> {
        let output = self.run("retrieving status", &["--status"])?;
        Ok(parse_status(&output)?)
    }

    /// Issues a move to `target` without waiting for arrival.
    ///
    /// Safe start is exited first. The move is refused with
    /// [`TicError::NotEnergized`] when the driver is off.
    pub fn set_position(&self, target: i32) -> Result<(), TicError> {
        self.exit_safe_start()?;

        if !self.status()?.energized {
            return Err(TicError::NotEnergized);
        }

        self.run("setting position", &["--position", &target.to_string()])?;
        Ok(())
    }

    /// Blocks until the reported position equals `target`, polling every
    /// `timeout / 10`. A failed status read ends the wait immediately.
    pub fn wait_for_position(&self, target: i32, timeout: Duration) -> Result<(), TicError> {
        let deadline = Instant::now() + timeout;
        let interval = timeout / POLLS_PER_TIMEOUT;

        loop {
            let status = self.status()?;
            debug!(
                target,
                current = status.current_position,
                commanded = status.target_position,
                "waiting for position"
            );

            if status.current_position == target {
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(TicError::Timeout { target, timeout });
            }

            thread::sleep(interval.min(deadline - now));
        }
    }

    pub fn set_known_position(&self, position: i32) -> Result<(), TicError> {
        self.run(
            "setting known position",
            &["--halt-and-set-position", &position.to_string()],
        )?;
        Ok(())
    }

    pub fn exit_safe_start(&self) -> Result<(), TicError> {
        self.run("exiting safe start", &["--exit-safe-start"])?;
        Ok(())
    }

    pub fn energize(&self) -> Result<(), TicError> {
        self.run("energizing", &["--energize"])?;
        Ok(())
    }

    pub fn deenergize(&self) -> Result<(), TicError> {
        self.run("de-energizing", &["--deenergize"])?;
        Ok(())
    }
}

impl PositionMotor for TicClient {
    type Error = TicError;

    fn current_position(&self) -> Result<i32, TicError> {
        Ok(self.status()?.current_position)
    }

    fn energize(&self) -> Result<(), TicError> {
        TicClient::energize(self)
    }

    fn deenergize(&self) -> Result<(), TicError> {
        TicClient::deenergize(self)
    }

    fn set_position(&self, target: i32) -> Result<(), TicError> {
        TicClient::set_position(self, target)
    }

    fn wait_for_position(&self, target: i32, timeout: Duration) -> Result<(), TicError> {
        TicClient::wait_for_position(self, target, timeout)
    }

    fn set_known_position(&self, position: i32) -> Result<(), TicError> {
        TicClient::set_known_position(self, position)
    }
}
