use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{domain::NavSequence, error::NavFailure};

/// JSON body returned by the content origin for a logical location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPayload {
    #[serde(default)]
    pub content: Value,
}

impl ContentPayload {
    pub fn new(content: Value) -> Self {
        Self { content }
    }
}

/// Construction options. Only `initial_model` is recognized; other keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavOptions {
    #[serde(default, alias = "initialModel")]
    pub initial_model: Option<ContentPayload>,
}

impl NavOptions {
    pub fn with_initial_model(payload: ContentPayload) -> Self {
        Self {
            initial_model: Some(payload),
        }
    }
}

/// Notification delivered by a history façade. Handlers must not trust
/// `url` as the current location; it is informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationChange {
    pub url: String,
    pub title: Option<String>,
}

/// Outcome of one reconciliation pass, broadcast to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum NavEvent {
    InitialRendered {
        url: String,
    },
    ExternalNavigation {
        url: String,
    },
    Synced {
        seq: NavSequence,
        url: String,
    },
    Discarded {
        seq: NavSequence,
        url: String,
    },
    CycleFailed {
        seq: NavSequence,
        failure: NavFailure,
    },
}
