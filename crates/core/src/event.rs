//! Domain event system — decoupled observation of query processing.
//!
//! The orchestrator publishes events as a query moves through the loop.
//! Subscribers (the CLI's verbose mode, tests) react without coupling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A top-level query entered the loop
    QueryStarted {
        query_preview: String,
        timestamp: DateTime<Utc>,
    },

    /// The planner was asked for a plan or an action
    PlannerInvoked {
        planner: String,
        protocol: String,
        iteration: u32,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A plan step finished
    StepExecuted {
        step_number: u32,
        tool_name: Option<String>,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The query left the loop
    QueryCompleted {
        success: bool,
        iterations: u32,
        termination: String,
        timestamp: DateTime<Utc>,
    },

    /// An error occurred
    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
