pub mod command_executor;
pub mod motor_controller;
pub mod paths;
