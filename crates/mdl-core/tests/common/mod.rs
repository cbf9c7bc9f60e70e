//! Shared helpers for mdl-core integration tests.
#![allow(dead_code)]

pub mod fake_downloader;
pub mod http_server;
pub mod scripted;

use mdl_core::events::EventReceiver;
use mdl_core::JobEvent;

/// Everything currently buffered on `rx`.
pub fn drain(rx: &mut EventReceiver) -> Vec<JobEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Compact event kinds, e.g. `["started:1", "retry:1", "started:2", "completed"]`.
pub fn kinds(events: &[JobEvent]) -> Vec<String> {
    events
        .iter()
        .filter(|e| !matches!(e, JobEvent::Progress { .. } | JobEvent::Log { .. }))
        .map(|e| match e {
            JobEvent::Started { attempt, .. } => format!("started:{attempt}"),
            JobEvent::Retry { attempt, .. } => format!("retry:{attempt}"),
            JobEvent::Completed { .. } => "completed".to_string(),
            JobEvent::Failed { .. } => "failed".to_string(),
            JobEvent::Progress { .. } | JobEvent::Log { .. } => unreachable!(),
        })
        .collect()
}
