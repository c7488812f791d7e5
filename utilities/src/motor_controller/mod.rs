use std::{fmt, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStage {
    Energize,
    SetPosition,
    WaitForPosition,
    SetKnownPosition,
    Deenergize,
}

impl fmt::Display for MoveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            MoveStage::Energize => "energize",
            MoveStage::SetPosition => "set position",
            MoveStage::WaitForPosition => "wait for position",
            MoveStage::SetKnownPosition => "set known position",
            MoveStage::Deenergize => "de-energize",
        };
        f.write_str(stage)
    }
}

#[derive(Debug)]
pub struct MoveFailure<E> {
    pub stage: MoveStage,
    pub error: E,
}

/// Outcome of an energized sequence. Failures are collected, not raised, so
/// the sequence always reaches its de-energize step.
#[derive(Debug)]
pub struct MoveReport<E> {
    pub failures: Vec<MoveFailure<E>>,
}

impl<E> Default for MoveReport<E> {
    fn default() -> Self {
        Self {
            failures: Vec::new(),
        }
    }
}

impl<E> MoveReport<E> {
    pub fn record(&mut self, stage: MoveStage, result: Result<(), E>) -> bool {
        match result {
            Ok(()) => true,
            Err(error) => {
                self.failures.push(MoveFailure { stage, error });
                false
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, stage: MoveStage) -> bool {
        self.failures.iter().any(|failure| failure.stage == stage)
    }
}

pub trait PositionMotor {
    type Error: fmt::Display;

    fn current_position(&self) -> Result<i32, Self::Error>;
    fn energize(&self) -> Result<(), Self::Error>;
    fn deenergize(&self) -> Result<(), Self::Error>;
    fn set_position(&self, target: i32) -> Result<(), Self::Error>;
    fn wait_for_position(&self, target: i32, timeout: Duration) -> Result<(), Self::Error>;
    fn set_known_position(&self, position: i32) -> Result<(), Self::Error>;

    /// Energizes, runs `steps`, then de-energizes no matter what happened in
    /// between.
    fn run_energized<F>(&self, steps: F) -> MoveReport<Self::Error>
    where
        F: FnOnce(&Self, &mut MoveReport<Self::Error>),
    {
        let mut report = MoveReport::default();

        report.record(MoveStage::Energize, self.energize());
        steps(self, &mut report);
        report.record(MoveStage::Deenergize, self.deenergize());

        report
    }

    fn move_to(&self, target: i32, timeout: Duration) -> MoveReport<Self::Error> {
        self.run_energized(|motor, report| {
            if report.record(MoveStage::SetPosition, motor.set_position(target)) {
                report.record(
                    MoveStage::WaitForPosition,
                    motor.wait_for_position(target, timeout),
                );
            }
        })
    }
}
