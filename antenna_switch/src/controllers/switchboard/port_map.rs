use std::{cmp::Reverse, collections::HashSet};

use crate::models::Port;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortMapError {
    #[error("no ports configured")]
    Empty,

    #[error("duplicate port label {0:?}")]
    DuplicateLabel(String),
}

#[derive(Debug, Clone)]
pub struct PortMap {
    ports: Vec<Port>,
}

impl PortMap {
    pub fn new(ports: Vec<Port>) -> Result<Self, PortMapError> {
        if ports.is_empty() {
            return Err(PortMapError::Empty);
        }

        let mut labels = HashSet::new();
        for port in &ports {
            if !labels.insert(port.label.as_str()) {
                return Err(PortMapError::DuplicateLabel(port.label.clone()));
            }
        }

        Ok(Self { ports })
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn get(&self, index: usize) -> Option<&Port> {
        self.ports.get(index)
    }

    pub fn find(&self, label: &str) -> Option<usize> {
        self.ports.iter().position(|port| port.label == label)
    }

    /// Index of the port closest to `position`; the first one wins a tie.
    pub fn nearest(&self, position: i32) -> usize {
        self.ports
            .iter()
            .enumerate()
            .min_by_key(|(_, port)| port.position.abs_diff(position))
            .map(|(index, _)| index)
            .unwrap_or_default()
    }

    /// Index of the port with the largest position; the first one wins a tie.
    pub fn highest(&self) -> usize {
        self.ports
            .iter()
            .enumerate()
            .min_by_key(|(_, port)| Reverse(port.position))
            .map(|(index, _)| index)
            .unwrap_or_default()
    }
}
