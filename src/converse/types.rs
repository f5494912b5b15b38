//! Wire and domain types for the converse protocol

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Entities extracted by the service, keyed by entity name
pub type Entities = Map<String, Value>;

/// Conversation state carried between steps and turns.
///
/// Opaque to the driver: only action callbacks give it meaning. Serialized
/// as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(Map<String, Value>);

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Context {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Context> for Map<String, Value> {
    fn from(context: Context) -> Self {
        context.0
    }
}

/// Raw `/converse` response body.
///
/// Every field is optional on the wire; [`ConverseResponse::into_decision`]
/// enforces which ones each decision type needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConverseResponse {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(
        rename = "quickreplies",
        alias = "quick_replies",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub quick_replies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Entities>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ConverseResponse {
    fn of_kind(kind: &str) -> Self {
        Self {
            kind: Some(kind.to_string()),
            ..Default::default()
        }
    }

    pub fn msg(text: impl Into<String>) -> Self {
        Self {
            msg: Some(text.into()),
            ..Self::of_kind("msg")
        }
    }

    pub fn action(name: impl Into<String>) -> Self {
        Self {
            action: Some(name.into()),
            ..Self::of_kind("action")
        }
    }

    pub fn merge() -> Self {
        Self::of_kind("merge")
    }

    pub fn stop() -> Self {
        Self::of_kind("stop")
    }

    pub fn error() -> Self {
        Self::of_kind("error")
    }

    #[must_use]
    pub fn with_quick_replies(mut self, replies: Vec<String>) -> Self {
        self.quick_replies = Some(replies);
        self
    }

    #[must_use]
    pub fn with_entities(mut self, entities: Entities) -> Self {
        self.entities = Some(entities);
        self
    }

    /// Validate the wire shape into a [`Decision`]
    pub fn into_decision(self) -> Result<Decision, MalformedDecision> {
        let Some(kind) = self.kind else {
            return Err(MalformedDecision::new("couldn't find type in converse response"));
        };

        let kind = match kind.as_str() {
            "msg" => DecisionKind::Message {
                text: self
                    .msg
                    .ok_or_else(|| MalformedDecision::new("msg decision without text"))?,
                quick_replies: self.quick_replies.unwrap_or_default(),
            },
            "action" => DecisionKind::Action {
                name: self
                    .action
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| MalformedDecision::new("action decision without action name"))?,
            },
            "merge" => DecisionKind::Merge,
            "stop" => DecisionKind::Stop,
            "error" => DecisionKind::Error,
            other => {
                return Err(MalformedDecision::new(format!("unknown type: {other}")));
            }
        };

        Ok(Decision {
            kind,
            entities: self.entities,
            confidence: self.confidence,
        })
    }
}

/// What the service wants the client to do next
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub kind: DecisionKind,
    pub entities: Option<Entities>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionKind {
    Message {
        text: String,
        quick_replies: Vec<String>,
    },
    Action {
        name: String,
    },
    /// Pre-20160516 protocol; equivalent to `Action { name: "merge" }`
    Merge,
    Stop,
    Error,
}

impl DecisionKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            DecisionKind::Message { .. } => "msg",
            DecisionKind::Action { .. } => "action",
            DecisionKind::Merge => "merge",
            DecisionKind::Stop => "stop",
            DecisionKind::Error => "error",
        }
    }
}

impl Decision {
    /// Rewrite legacy `merge` decisions as `action("merge")`
    #[must_use]
    pub fn normalized(self) -> Self {
        match self.kind {
            DecisionKind::Merge => Self {
                kind: DecisionKind::Action {
                    name: "merge".to_string(),
                },
                ..self
            },
            _ => self,
        }
    }
}

/// The service returned something that is not a usable decision
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct MalformedDecision(pub String);

impl MalformedDecision {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// `/message` response: intent and entities for a single utterance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub msg_id: Option<String>,
    #[serde(rename = "_text", default)]
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Entities,
}
