use std::num::ParseIntError;

use serde::Serialize;
use tracing::{debug, warn};

const SINCE_LAST_CHECK_HEADER: &str = "Errors that occurred since last check:";
const DRIVER_ERRORS_HEADER: &str = "Last motor driver errors:";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Status {
    pub name: String,
    pub serial: String,
    pub firmware_version: String,
    pub last_reset: String,
    pub up_time: String,

    pub encoder_position: i32,
    pub input_state: String,
    pub input_after_averaging: String,
    pub input_after_hysteresis: String,
    pub input_before_scaling: String,
    pub input_after_scaling: String,
    pub forward_limit_active: bool,
    pub reverse_limit_active: bool,

    pub vin_voltage: String,
    pub operation_state: String,
    pub energized: bool,
    pub homing_active: bool,

    pub target: String,
    pub current_position: i32,
    pub target_position: i32,
    pub position_uncertain: bool,
    pub current_velocity: i32,
    pub target_velocity: i32,

    pub errors_stopping_motor: Vec<String>,
    pub errors_since_last_check: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: error parsing {field} {value:?}: {source}")]
    Integer {
        line: usize,
        field: String,
        value: String,
        source: ParseIntError,
    },

    #[error("line {line}: error parsing {field} {value:?} as boolean")]
    Boolean {
        line: usize,
        field: String,
        value: String,
    },

    #[error("line {line}: unexpected error format: {text}")]
    ErrorList { line: usize, text: String },
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
enum ErrorList {
    StoppingMotor,
    SinceLastCheck,
}

struct Field<'a> {
    line: usize,
    name: &'a str,
    value: &'a str,
}

impl Field<'_> {
    fn integer(&self) -> Result<i32, ParseError> {
        self.value
            .parse::<i32>()
            .map_err(|source| ParseError::Integer {
                line: self.line,
                field: self.name.to_string(),
                value: self.value.to_string(),
                source,
            })
    }

    fn boolean(&self) -> Result<bool, ParseError> {
        parse_bool(self.value).ok_or_else(|| ParseError::Boolean {
            line: self.line,
            field: self.name.to_string(),
            value: self.value.to_string(),
        })
    }

    fn text(&self) -> String {
        self.value.to_string()
    }
}

/// Decodes a status report.
///
/// Unknown field names and lines without a colon are logged and skipped so
/// that newer firmware revisions keep working. Malformed values under a known
/// field name, and list items that do not start with `-`, are errors.
///
/// An "Errors currently stopping the motor" line starts a list of `- message`
/// items. The "Errors that occurred since last check:" and "Last motor driver
/// errors:" headers redirect the following items into
/// [`Status::errors_since_last_check`]. A blank line ends the list.
pub fn parse_status(report: &[u8]) -> Result<Status, ParseError> {
    let text = String::from_utf8_lossy(report);
    let mut status = Status::default();
    let mut error_list: Option<ErrorList> = None;

    for (index, raw_line) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();

        if let Some(list) = error_list {
            if line.is_empty() {
                error_list = None;
                continue;
            }
            if line.starts_with(SINCE_LAST_CHECK_HEADER) || line.starts_with(DRIVER_ERRORS_HEADER)
            {
                error_list = Some(ErrorList::SinceLastCheck);
                continue;
            }

            let Some(message) = line.strip_prefix('-') else {
                return Err(ParseError::ErrorList {
                    line: line_number,
                    text: line.to_string(),
                });
            };
            let message = message.trim_start().to_string();

            match list {
                ErrorList::StoppingMotor => status.errors_stopping_motor.push(message),
                ErrorList::SinceLastCheck => status.errors_since_last_check.push(message),
            }
            continue;
        }

        if line.is_empty() {
            continue;
        }

        let Some((name, value)) = line.split_once(':') else {
            warn!(line = %line, "unexpected line in status");
            continue;
        };

        let field = Field {
            line: line_number,
            name: name.trim(),
            value: value.trim(),
        };

        match field.name {
            "Label" | "Name" => status.name = field.text(),
            "Serial number" => status.serial = field.text(),
            "Firmware version" => status.firmware_version = field.text(),
            "Last reset" => status.last_reset = field.text(),
            "Up time" => status.up_time = field.text(),

            "Encoder position" => status.encoder_position = field.integer()?,
            "Input state" => status.input_state = field.text(),
            "Input after averaging" => status.input_after_averaging = field.text(),
            "Input after hysteresis" => status.input_after_hysteresis = field.text(),
            "Input before scaling" => status.input_before_scaling = field.text(),
            "Input after scaling" => status.input_after_scaling = field.text(),
            "Forward limit active" => status.forward_limit_active = field.boolean()?,
            "Reverse limit active" => status.reverse_limit_active = field.boolean()?,

            "VIN voltage" => status.vin_voltage = field.text(),
            "Operation state" => status.operation_state = field.text(),
            "Energized" => status.energized = field.boolean()?,
            "Homing active" => status.homing_active = field.boolean()?,

            "Target" => status.target = field.text(),
            "Current position" => status.current_position = field.integer()?,
            "Target position" => status.target_position = field.integer()?,
            "Position uncertain" => status.position_uncertain = field.boolean()?,
            "Current velocity" => status.current_velocity = field.integer()?,
            "Target velocity" => status.target_velocity = field.integer()?,

            "Errors currently stopping the motor" => {
                error_list = Some(ErrorList::StoppingMotor);
            }
            "Errors that occurred since last check" | "Last motor driver errors" => {
                error_list = Some(ErrorList::SinceLastCheck);
            }

            _ => debug!(field = field.name, value = field.value, "unsupported field"),
        }
    }

    Ok(status)
}
