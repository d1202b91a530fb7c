//! Structured event emission.
//!
//! The engine never owns log retention; it reports through an injected
//! `EventSink` and the host decides what to keep. `LogSink` forwards to the
//! `log` facade; `MemorySink` keeps a bounded rolling buffer for hosts that
//! surface recent activity to an operator.

use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct EngineEvent {
    /// Epoch milliseconds.
    pub at: i64,
    pub level: EventLevel,
    pub message: String,
}

pub trait EventSink {
    fn emit(&self, level: EventLevel, message: &str);
}

/// Forwards engine events to the `log` facade.
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, level: EventLevel, message: &str) {
        match level {
            EventLevel::Info => log::info!("{}", message),
            EventLevel::Warn => log::warn!("{}", message),
            EventLevel::Error => log::error!("{}", message),
        }
    }
}

/// Bounded rolling buffer of recent events with an optional change listener.
pub struct MemorySink {
    entries: Mutex<VecDeque<EngineEvent>>,
    capacity: usize,
    listener: Option<Box<dyn Fn() + Send + Sync>>,
}

impl MemorySink {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity,
            listener: None,
        }
    }

    pub fn with_listener<F>(capacity: usize, listener: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity,
            listener: Some(Box::new(listener)),
        }
    }

    pub fn entries(&self) -> Vec<EngineEvent> {
        self.entries.lock().unwrap().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
        if let Some(listener) = &self.listener {
            listener();
        }
    }
}

impl EventSink for MemorySink {
    fn emit(&self, level: EventLevel, message: &str) {
        {
            let mut entries = self.entries.lock().unwrap();
            if entries.len() == self.capacity {
                entries.pop_front();
            }
            entries.push_back(EngineEvent {
                at: Utc::now().timestamp_millis(),
                level,
                message: message.to_string(),
            });
        }
        if let Some(listener) = &self.listener {
            listener();
        }
    }
}
