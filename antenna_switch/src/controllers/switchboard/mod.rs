pub mod port_map;

use std::time::Duration;

use tracing::{debug, info, warn};
use utilities::motor_controller::{MoveReport, MoveStage, PositionMotor};

use crate::{
    controllers::switchboard::port_map::PortMap,
    models::{MessageLog, Panel, Port, PortOption},
};

pub const MOVE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub enum SwitchOutcome<E> {
    UnknownPort,
    Moved(MoveReport<E>),
}

/// Owns the motor, the port map, the active selection and the message log.
/// Callers must serialize access; in the service it lives on the device
/// worker thread.
pub struct Switchboard<M: PositionMotor> {
    motor: M,
    ports: PortMap,
    current: usize,
    messages: MessageLog,
    move_timeout: Duration,
}

impl<M: PositionMotor> Switchboard<M> {
    pub fn new(motor: M, ports: PortMap) -> Result<Self, M::Error> {
        let position = motor.current_position()?;
        let current = ports.nearest(position);

        if let Some(port) = ports.get(current) {
            info!(position, port = %port.label, "selected nearest port");
        }

        Ok(Self {
            motor,
            ports,
            current,
            messages: MessageLog::default(),
            move_timeout: MOVE_TIMEOUT,
        })
    }

    pub fn with_move_timeout(mut self, timeout: Duration) -> Self {
        self.move_timeout = timeout;
        self
    }

    pub fn motor(&self) -> &M {
        &self.motor
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_port(&self) -> Option<&Port> {
        self.ports.get(self.current)
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    pub fn panel(&self) -> Panel {
        Panel {
            ports: self
                .ports
                .ports()
                .iter()
                .enumerate()
                .map(|(index, port)| PortOption {
                    label: port.label.clone(),
                    position: port.position,
                    selected: index == self.current,
                })
                .collect(),
            messages: self
                .messages
                .newest_first()
                .map(str::to_string)
                .collect(),
        }
    }

    /// Moves to the port labelled `label`.
    ///
    /// The port becomes the active selection as soon as it is found, whatever
    /// the move outcome. Failures are written to the message log and returned
    /// in the report; the motor is de-energized on every path.
    pub fn switch_to(&mut self, label: &str) -> SwitchOutcome<M::Error> {
        let Some(index) = self.ports.find(label) else {
            debug!(label, "ignoring switch to unknown port");
            return SwitchOutcome::UnknownPort;
        };
        let position = self.ports.ports()[index].position;

        self.current = index;
        self.messages.push(format!("switching to {label}"));
        info!(label, position, "switching port");

        let report = self.motor.move_to(position, self.move_timeout);
        self.log_failures(&report);

        SwitchOutcome::Moved(report)
    }

    pub fn calibrate(&mut self) -> MoveReport<M::Error> {
        self.messages.push("Calibrating");

        let index = self.ports.highest();
        let highest = self.ports.ports()[index].position;
        let overshoot = highest.saturating_mul(2);
        let timeout = self.move_timeout;
        info!(highest, overshoot, "calibrating against travel limit");

        let report = self.motor.run_energized(|motor, report| {
            if !report.record(MoveStage::SetPosition, motor.set_position(overshoot)) {
                return;
            }
            report.record(
                MoveStage::WaitForPosition,
                motor.wait_for_position(overshoot, timeout),
            );
            report.record(
                MoveStage::SetKnownPosition,
                motor.set_known_position(highest),
            );
        });

        self.current = index;
        self.log_failures(&report);

        if report.is_ok() {
            self.messages.push("Calibration complete");
        } else {
            self.messages.push(format!(
                "Calibration finished with {} error(s)",
                report.failures.len()
            ));
        }

        report
    }

    fn log_failures(&mut self, report: &MoveReport<M::Error>) {
        for failure in &report.failures {
            warn!(stage = %failure.stage, error = %failure.error, "motor sequence step failed");
            self.messages.push(failure.error.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use ticcmd::{MockTic, TicClient, TicError};

    use super::*;

    fn band_ports() -> PortMap {
        PortMap::new(vec![
            Port::new("40m", 32),
            Port::new("20m", 16),
            Port::new("Ground", 0),
        ])
        .unwrap()
    }

    fn switchboard(mock: &MockTic) -> Switchboard<TicClient> {
        Switchboard::new(TicClient::with_runner(mock.clone()), band_ports())
            .unwrap()
            .with_move_timeout(Duration::from_millis(200))
    }

    fn flags(mock: &MockTic) -> Vec<String> {
        mock.invocations()
            .into_iter()
            .map(|args| args.join(" "))
            .collect()
    }

    #[test]
    fn starts_at_port_nearest_device_position() {
        let mock = MockTic::new(2);
        let board = switchboard(&mock);

        assert_eq!(board.current(), 2);
        assert_eq!(board.current_port().unwrap().label, "Ground");
    }

    #[test]
    fn startup_fails_when_status_fails() {
        let mock = MockTic::new(2);
        mock.fail_on("--status");

        let result = Switchboard::new(TicClient::with_runner(mock.clone()), band_ports());
        assert!(matches!(result, Err(TicError::Command { .. })));
    }

    #[test]
    fn switch_runs_energized_move() {
        let mock = MockTic::new(2);
        let mut board = switchboard(&mock);
        mock.clear_invocations();

        let outcome = board.switch_to("40m");

        let SwitchOutcome::Moved(report) = outcome else {
            panic!("expected a move");
        };
        assert!(report.is_ok());
        assert_eq!(board.current(), 0);
        assert_eq!(mock.current_position(), 32);
        assert!(!mock.is_energized());

        let flags = flags(&mock);
        assert_eq!(
            &flags[..4],
            &[
                "--energize",
                "--exit-safe-start",
                "--status",
                "--position 32"
            ]
        );
        assert_eq!(flags.last().map(String::as_str), Some("--deenergize"));
        assert!(flags[4..flags.len() - 1].iter().all(|f| f == "--status"));
    }

    #[test]
    fn switch_selects_port_even_when_wait_times_out() {
        let mock = MockTic::new(2);
        mock.set_step(0);
        let mut board = switchboard(&mock);

        let SwitchOutcome::Moved(report) = board.switch_to("40m") else {
            panic!("expected a move");
        };

        assert!(report.failed(MoveStage::WaitForPosition));
        assert_eq!(board.current(), 0);
        assert!(!mock.is_energized());
        assert!(
            board
                .messages()
                .newest_first()
                .next()
                .unwrap()
                .contains("wait time expired")
        );
    }

    #[test]
    fn switch_deenergizes_after_energize_failure() {
        let mock = MockTic::new(2);
        mock.fail_on("--energize");
        let mut board = switchboard(&mock);

        let SwitchOutcome::Moved(report) = board.switch_to("20m") else {
            panic!("expected a move");
        };

        assert!(report.failed(MoveStage::Energize));
        assert!(report.failed(MoveStage::SetPosition));
        assert!(!mock.was_invoked("--position"));
        assert_eq!(
            flags(&mock).last().map(String::as_str),
            Some("--deenergize")
        );

        let messages: Vec<_> = board.messages().newest_first().collect();
        assert!(messages.iter().any(|m| m.contains("error energizing")));
        assert!(messages.iter().any(|m| m.contains("motor not energized")));
    }

    #[test]
    fn unknown_port_is_a_no_op() {
        let mock = MockTic::new(2);
        let mut board = switchboard(&mock);
        mock.clear_invocations();

        let outcome = board.switch_to("nonexistent");

        assert!(matches!(outcome, SwitchOutcome::UnknownPort));
        assert_eq!(board.current(), 2);
        assert!(mock.invocations().is_empty());
        assert!(board.messages().is_empty());
    }

    #[test]
    fn calibrate_overshoots_then_redefines_position() {
        let mock = MockTic::new(5);
        let mut board = switchboard(&mock);
        mock.clear_invocations();

        let report = board.calibrate();

        assert!(report.is_ok());
        assert_eq!(board.current(), 0);
        assert_eq!(mock.current_position(), 32);
        assert!(!mock.is_energized());

        let flags = flags(&mock);
        assert!(flags.contains(&"--position 64".to_string()));
        let known = flags
            .iter()
            .position(|f| f == "--halt-and-set-position 32")
            .unwrap();
        assert_eq!(&flags[known + 1..], &["--deenergize"]);

        let messages: Vec<_> = board.messages().newest_first().collect();
        assert!(messages[0].ends_with("Calibration complete"));
        assert!(messages[1].ends_with("Calibrating"));
    }

    #[test]
    fn calibrate_skips_redefinition_when_move_refused() {
        let mock = MockTic::new(5);
        mock.fail_on("--position");
        let mut board = switchboard(&mock);

        let report = board.calibrate();

        assert!(report.failed(MoveStage::SetPosition));
        assert!(!mock.was_invoked("--halt-and-set-position"));
        assert!(!mock.is_energized());
        assert!(
            board
                .messages()
                .newest_first()
                .next()
                .unwrap()
                .ends_with("Calibration finished with 1 error(s)")
        );
    }

    #[test]
    fn calibrate_redefines_position_after_wait_timeout() {
        let mock = MockTic::new(5);
        mock.set_step(0);
        let mut board = switchboard(&mock);

        let report = board.calibrate();

        assert!(report.failed(MoveStage::WaitForPosition));
        assert!(!report.failed(MoveStage::SetKnownPosition));
        assert!(mock.was_invoked("--halt-and-set-position"));
        assert_eq!(mock.current_position(), 32);
        assert_eq!(board.current(), 0);
        assert!(!mock.is_energized());
    }

    #[test]
    fn switch_succeeds_after_failed_attempt() {
        let mock = MockTic::new(2);
        mock.fail_on("--position");
        let mut board = switchboard(&mock);

        let SwitchOutcome::Moved(report) = board.switch_to("20m") else {
            panic!("expected a move");
        };
        assert!(report.failed(MoveStage::SetPosition));
        assert_eq!(mock.current_position(), 2);
        assert!(!mock.is_energized());

        mock.recover("--position");
        let SwitchOutcome::Moved(report) = board.switch_to("20m") else {
            panic!("expected a move");
        };
        assert!(report.is_ok());
        assert_eq!(mock.current_position(), 16);
        assert_eq!(board.current(), 1);
        assert!(!mock.is_energized());
    }

    #[test]
    fn panel_flags_active_port() {
        let mock = MockTic::new(15);
        let board = switchboard(&mock);

        let panel = board.panel();
        let selected: Vec<_> = panel
            .ports
            .iter()
            .filter(|p| p.selected)
            .map(|p| p.label.as_str())
            .collect();
        assert_eq!(selected, vec!["20m"]);
        assert!(panel.messages.is_empty());
    }
}
