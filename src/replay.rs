//! Recorded tab events, one JSON object per line.
//!
//! ```text
//! {"tab": 7, "event": "navigated", "url": "https://example.com/"}
//! {"tab": 7, "event": "report", "payload": {"type": "activity", "eventLoopBusyTime": 420}}
//! {"tab": 7, "event": "closed"}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, SentinelError};
use crate::state::TabId;
use crate::telemetry::TelemetryPayload;

/// One event addressed to a tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabEvent {
    pub tab: TabId,
    #[serde(flatten)]
    pub kind: TabEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TabEventKind {
    /// Telemetry from the page or network observer.
    Report { payload: TelemetryPayload },
    /// The tab finished loading a page.
    Navigated {
        #[serde(default)]
        url: Option<String>,
    },
    /// The tab was closed.
    Closed,
}

/// Parse a JSON-lines event log. Blank lines and `#` comments are skipped.
pub fn parse_events(input: &str) -> Result<Vec<TabEvent>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| SentinelError::InvalidEvent {
                line: index + 1,
                message: e.to_string(),
            })
        })
        .collect()
}
