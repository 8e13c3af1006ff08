//! Story document format.
//!
//! Documents are plain JSON: a start node id plus a flat node list. Field
//! names are camelCase on the wire.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub start: String,
    pub nodes: Vec<StoryNode>,
}

impl StoryDocument {
    pub fn node(&self, id: &str) -> Option<&StoryNode> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryNode {
    pub id: String,
    #[serde(default)]
    pub speaker: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<StoryOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<StoryReward>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<StoryNodeEvent>,
}

impl StoryNode {
    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryOption {
    pub text: String,
    pub target: String,
}

/// One-time item grant attached to a node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryReward {
    pub gid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    /// Inventory cap for this gid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_message: Option<String>,
}

/// Side effect emitted onto the event bus when its node is displayed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoryNodeEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}
