use std::{
    collections::HashSet,
    fmt::Write as _,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{error::InvocationError, runner::CommandRunner};

#[derive(Debug)]
struct MockTicState {
    energized: bool,
    safe_start: bool,
    current_position: i32,
    target_position: i32,
    step: i32,
    failing: HashSet<String>,
    invocations: Vec<Vec<String>>,
}

/// In-memory stand-in for a Tic controller and its `ticcmd` binary.
///
/// Clones share the same simulated device, so a test can hand one clone to a
/// client and inspect the other. Each `--status` query advances the motor
/// `step` counts towards its target while energized (`step == 0` never
/// moves, a negative step jumps straight to the target).
#[derive(Debug, Clone)]
pub struct MockTic {
    state: Arc<Mutex<MockTicState>>,
}

impl MockTic {
    pub fn new(position: i32) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockTicState {
                energized: false,
                safe_start: true,
                current_position: position,
                target_position: position,
                step: -1,
                failing: HashSet::new(),
                invocations: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockTicState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn fail_on(&self, flag: &str) {
        self.lock().failing.insert(flag.to_string());
    }

    pub fn recover(&self, flag: &str) {
        self.lock().failing.remove(flag);
    }

    pub fn set_step(&self, step: i32) {
        self.lock().step = step;
    }

    pub fn current_position(&self) -> i32 {
        self.lock().current_position
    }

    pub fn target_position(&self) -> i32 {
        self.lock().target_position
    }

    pub fn is_energized(&self) -> bool {
        self.lock().energized
    }

    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.lock().invocations.clone()
    }

    pub fn was_invoked(&self, flag: &str) -> bool {
        self.lock()
            .invocations
            .iter()
            .any(|args| args.first().is_some_and(|first| first == flag))
    }

    pub fn clear_invocations(&self) {
        self.lock().invocations.clear();
    }
}

impl MockTicState {
    fn advance(&mut self) {
        if !self.energized || self.step == 0 {
            return;
        }

        let remaining = self.target_position - self.current_position;
        if self.step < 0 || remaining.abs() <= self.step {
            self.current_position = self.target_position;
        } else {
            self.current_position += self.step * remaining.signum();
        }
    }

    fn report(&self) -> String {
        let yes_no = |flag: bool| if flag { "Yes" } else { "No" };
        let operation_state = if self.energized {
            "Normal"
        } else {
            "De-energized"
        };

        let mut report = String::new();
        let _ = writeln!(report, "Name:                         Simulated Tic");
        let _ = writeln!(report, "Serial number:                00000000");
        let _ = writeln!(report, "Firmware version:             1.06");
        let _ = writeln!(report, "Last reset:                   Power-on reset");
        let _ = writeln!(report, "Up time:                      0:00:01");
        let _ = writeln!(report);
        let _ = writeln!(report, "Encoder position:             0");
        let _ = writeln!(report, "Forward limit active:         No");
        let _ = writeln!(report, "Reverse limit active:         No");
        let _ = writeln!(report);
        let _ = writeln!(report, "VIN voltage:                  12.0 V");
        let _ = writeln!(report, "Operation state:              {operation_state}");
        let _ = writeln!(report, "Energized:                    {}", yes_no(self.energized));
        let _ = writeln!(report, "Homing active:                No");
        let _ = writeln!(report);
        let _ = writeln!(report, "Target position:              {}", self.target_position);
        let _ = writeln!(report, "Current position:             {}", self.current_position);
        let _ = writeln!(report, "Position uncertain:           No");
        let _ = writeln!(report, "Current velocity:             0");
        let _ = writeln!(report);

        let _ = writeln!(report, "Errors currently stopping the motor:");
        if !self.energized {
            let _ = writeln!(report, "  - Intentionally de-energized");
        }
        if self.safe_start {
            let _ = writeln!(report, "  - Safe start violation");
        }
        let _ = writeln!(report, "Errors that occurred since last check:");

        report
    }
}

impl CommandRunner for MockTic {
    fn run(&self, args: &[&str]) -> Result<Vec<u8>, InvocationError> {
        let mut state = self.lock();
        state
            .invocations
            .push(args.iter().map(|arg| arg.to_string()).collect());

        let Some(&flag) = args.first() else {
            return Err(InvocationError::Simulated("no command given".to_string()));
        };

        if state.failing.contains(flag) {
            return Err(InvocationError::Exit {
                code: Some(1),
                output: String::new(),
                stderr: format!("simulated failure for {flag}"),
            });
        }

        let value = || {
            args.get(1)
                .and_then(|value| value.parse::<i32>().ok())
                .ok_or_else(|| InvocationError::Simulated(format!("{flag} needs an integer")))
        };

        match flag {
            "--status" => {
                state.advance();
                return Ok(state.report().into_bytes());
            }
            "--energize" => state.energized = true,
            "--deenergize" => state.energized = false,
            "--exit-safe-start" => state.safe_start = false,
            "--position" => {
                if state.safe_start {
                    return Err(InvocationError::Simulated(
                        "safe start violation".to_string(),
                    ));
                }
                state.target_position = value()?;
            }
            "--halt-and-set-position" => {
                let position = value()?;
                state.current_position = position;
                state.target_position = position;
            }
            other => {
                return Err(InvocationError::Simulated(format!(
                    "unsupported option {other}"
                )));
            }
        }

        Ok(Vec::new())
    }
}
