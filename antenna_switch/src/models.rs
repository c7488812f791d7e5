use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

pub const MAX_MESSAGES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Port {
    pub label: String,
    pub position: i32,
}

impl Port {
    pub fn new(label: impl Into<String>, position: i32) -> Self {
        Self {
            label: label.into(),
            position,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: VecDeque<String>,
}

impl MessageLog {
    pub fn push(&mut self, message: impl AsRef<str>) {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        self.entries
            .push_back(format!("[{stamp}] {}", message.as_ref()));

        while self.entries.len() > MAX_MESSAGES {
            self.entries.pop_front();
        }
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().rev().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortOption {
    pub label: String,
    pub position: i32,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel {
    pub ports: Vec<PortOption>,
    pub messages: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_uses_pascal_case_keys() {
        let port: Port = serde_json::from_str(r#"{"Label": "40m", "Position": 32}"#).unwrap();
        assert_eq!(port, Port::new("40m", 32));
    }

    #[test]
    fn messages_are_stamped_and_newest_first() {
        let mut log = MessageLog::default();
        log.push("first");
        log.push("second");

        let messages: Vec<_> = log.newest_first().collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].ends_with("] second"));
        assert!(messages[1].ends_with("] first"));
        assert!(messages[0].starts_with('['));
        assert_eq!(messages[0].find(']'), Some(9));
    }

    #[test]
    fn log_keeps_only_latest_entries() {
        let mut log = MessageLog::default();
        for i in 0..15 {
            log.push(format!("message {i}"));
        }

        assert_eq!(log.len(), MAX_MESSAGES);
        let messages: Vec<_> = log.newest_first().collect();
        assert!(messages[0].ends_with("message 14"));
        assert!(messages[MAX_MESSAGES - 1].ends_with("message 5"));
    }
}
