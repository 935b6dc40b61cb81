//! Work items handed out by the control-plane.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Kind of work carried by a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkItemType {
    /// Discover URLs to scrape later.
    Crawl,
    /// Extract content from a single target.
    Scrape,
    /// Long-running feed; may never finish.
    Stream,
    /// Report the health of the scraped source.
    HealthCheck,
    /// Nothing to do, poll again later.
    Noop,
}

impl WorkItemType {
    pub const ALL: [WorkItemType; 5] = [
        WorkItemType::Crawl,
        WorkItemType::Scrape,
        WorkItemType::Stream,
        WorkItemType::HealthCheck,
        WorkItemType::Noop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkItemType::Crawl => "CRAWL",
            WorkItemType::Scrape => "SCRAPE",
            WorkItemType::Stream => "STREAM",
            WorkItemType::HealthCheck => "HEALTHCHECK",
            WorkItemType::Noop => "NOOP",
        }
    }
}

impl fmt::Display for WorkItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkItemType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Work item identifier.
///
/// The control-plane sends ids either as JSON strings or numbers; both are
/// kept as their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WorkItemId(String);

impl WorkItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for WorkItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Self(s)),
            Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(D::Error::custom(format!(
                "work item id must be a string or number, got {}",
                other
            ))),
        }
    }
}

/// Work item exactly as returned by `getNextWorkItem`.
///
/// The type is kept as a raw string so unknown types can be reported by name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemEnvelope {
    #[serde(default)]
    pub id: Option<WorkItemId>,
    pub work_item_type: String,
    #[serde(default)]
    pub task: Value,
}

/// A work item that carries actual work (never NOOP).
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub work_item_type: WorkItemType,
    /// Opaque payload; its shape depends on the work item type.
    pub task: Value,
}

/// Result of classifying a polled work item.
#[derive(Debug, Clone)]
pub enum Assignment {
    /// Idle cycle.
    Noop,
    /// Work to dispatch to a handler.
    Work(WorkItem),
    /// Type the worker does not know about.
    Unsupported { work_item_type: String },
    /// Known type but no id to report against.
    MissingId { work_item_type: WorkItemType },
}

impl WorkItemEnvelope {
    pub fn classify(self) -> Assignment {
        let work_item_type = match self.work_item_type.parse::<WorkItemType>() {
            Ok(t) => t,
            Err(raw) => return Assignment::Unsupported { work_item_type: raw },
        };

        match (work_item_type, self.id) {
            (WorkItemType::Noop, _) => Assignment::Noop,
            (work_item_type, Some(id)) => Assignment::Work(WorkItem {
                id,
                work_item_type,
                task: self.task,
            }),
            (work_item_type, None) => Assignment::MissingId { work_item_type },
        }
    }
}
