//! Conversation target value object.
//!
//! Messages and typing indicators belong either to a server channel or to a
//! direct message. The two share one id space in storage, so the kind is
//! carried explicitly next to the id.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discriminator stored in the `target_kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Channel,
    DirectMessage,
}

impl TargetKind {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::DirectMessage => "direct_message",
        }
    }

    /// Convert from database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "channel" => Some(Self::Channel),
            "direct_message" | "dm" => Some(Self::DirectMessage),
            _ => None,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A channel or a direct message.
///
/// Serialized as `{"kind": "channel", "id": "123"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ConversationTarget {
    Channel(#[serde(with = "id_string")] i64),
    DirectMessage(#[serde(with = "id_string")] i64),
}

impl ConversationTarget {
    pub fn kind(&self) -> TargetKind {
        match self {
            Self::Channel(_) => TargetKind::Channel,
            Self::DirectMessage(_) => TargetKind::DirectMessage,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Self::Channel(id) | Self::DirectMessage(id) => *id,
        }
    }

    pub fn from_parts(kind: TargetKind, id: i64) -> Self {
        match kind {
            TargetKind::Channel => Self::Channel(id),
            TargetKind::DirectMessage => Self::DirectMessage(id),
        }
    }

    /// Rebuild a target from its stored `(kind, id)` columns.
    pub fn from_columns(kind: &str, id: i64) -> Option<Self> {
        TargetKind::parse(kind).map(|k| Self::from_parts(k, id))
    }
}

impl fmt::Display for ConversationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// Ids travel as strings in JSON so that JavaScript clients keep all 64 bits.
mod id_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            Num(i64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Str(s) => s.parse().map_err(de::Error::custom),
            Raw::Num(n) => Ok(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serializes_as_tagged_object() {
        let json = serde_json::to_value(ConversationTarget::Channel(42)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "channel", "id": "42"}));
    }

    #[test]
    fn test_accepts_numeric_ids() {
        let target: ConversationTarget =
            serde_json::from_str(r#"{"kind": "direct_message", "id": 7}"#).unwrap();
        assert_eq!(target, ConversationTarget::DirectMessage(7));
    }

    #[test]
    fn test_from_columns() {
        assert_eq!(
            ConversationTarget::from_columns("channel", 5),
            Some(ConversationTarget::Channel(5))
        );
        assert_eq!(ConversationTarget::from_columns("voice", 5), None);
    }
}
