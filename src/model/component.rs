//! Page components.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::ComponentId;
use super::fields;

/// Fields owned by the record envelope rather than the payload.
const ENVELOPE_FIELDS: [&str; 5] = ["type", "id", "order", "deleted", "deletedAt"];

/// The fixed palette of component types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    #[serde(rename = "h1")]
    Heading,
    #[serde(rename = "p")]
    Paragraph,
    #[serde(rename = "img")]
    Image,
    #[serde(rename = "avatar")]
    Avatar,
    #[serde(rename = "link")]
    Link,
    #[serde(rename = "spacer")]
    Spacer,
    #[serde(rename = "code")]
    Code,
    #[serde(rename = "audio")]
    Audio,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 8] = [
        ComponentKind::Heading,
        ComponentKind::Paragraph,
        ComponentKind::Image,
        ComponentKind::Avatar,
        ComponentKind::Link,
        ComponentKind::Spacer,
        ComponentKind::Code,
        ComponentKind::Audio,
    ];

    /// Wire name stored in the `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Heading => "h1",
            ComponentKind::Paragraph => "p",
            ComponentKind::Image => "img",
            ComponentKind::Avatar => "avatar",
            ComponentKind::Link => "link",
            ComponentKind::Spacer => "spacer",
            ComponentKind::Code => "code",
            ComponentKind::Audio => "audio",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Payload fields the renderer reads for this type.
    pub fn payload_fields(self) -> &'static [&'static str] {
        match self {
            ComponentKind::Heading | ComponentKind::Paragraph => &["content", "alignment"],
            ComponentKind::Image => &["src", "description"],
            ComponentKind::Avatar => &["avatar", "name", "description"],
            ComponentKind::Link => &["title", "url", "icon"],
            ComponentKind::Spacer => &["height"],
            ComponentKind::Code => &["template", "html", "css", "js"],
            ComponentKind::Audio => &["audioUrl", "title"],
        }
    }

    /// Payload a freshly added block starts with.
    pub fn default_payload(self) -> Map<String, Value> {
        let defaults = match self {
            ComponentKind::Heading => json!({"alignment": "center", "content": ""}),
            ComponentKind::Paragraph => json!({"alignment": "justify", "content": ""}),
            ComponentKind::Spacer => json!({"height": "16px"}),
            _ => json!({}),
        };
        defaults.as_object().cloned().unwrap_or_default()
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text alignment for headings and paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "left" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }
}

/// One block of a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    pub id: ComponentId,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub order: i64,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

/// How a delivered component record is classified.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Structured, typed and not tombstoned.
    Live(Component),
    /// Carries a truthy `deleted` flag.
    Tombstone,
    /// Null, primitive, or without a recognised `type`.
    Malformed,
}

impl Component {
    /// New block with a fresh id and the type's default payload.
    pub fn new(kind: ComponentKind, order: i64) -> Self {
        Self {
            id: ComponentId::generate(),
            kind,
            order,
            payload: kind.default_payload(),
        }
    }

    /// Assemble a component, dropping envelope fields from `payload`.
    pub fn from_parts(
        id: ComponentId,
        kind: ComponentKind,
        order: i64,
        mut payload: Map<String, Value>,
    ) -> Self {
        payload.retain(|name, _| !ENVELOPE_FIELDS.contains(&name.as_str()));
        Self {
            id,
            kind,
            order,
            payload,
        }
    }

    /// Classify a record delivered under `key`.
    ///
    /// The key is the component's identity; an `id` field inside the record
    /// is not trusted over it.
    pub fn classify(key: &str, value: &Value) -> Delivery {
        let Some(fields) = value.as_object() else {
            return Delivery::Malformed;
        };
        if fields::deleted(fields) {
            return Delivery::Tombstone;
        }
        let Some(kind) = fields
            .get("type")
            .and_then(Value::as_str)
            .and_then(ComponentKind::parse)
        else {
            return Delivery::Malformed;
        };
        if key.is_empty() {
            return Delivery::Malformed;
        }

        let payload = fields
            .iter()
            .filter(|(name, _)| !ENVELOPE_FIELDS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Delivery::Live(Self {
            id: ComponentId::from(key),
            kind,
            order: fields::integer(fields, "order").unwrap_or(0),
            payload,
        })
    }

    /// Full replacement value written to the store.
    pub fn to_record(&self) -> Value {
        let mut record = self.payload.clone();
        record.insert("type".to_string(), json!(self.kind.as_str()));
        record.insert("id".to_string(), json!(self.id.as_str()));
        record.insert("order".to_string(), json!(self.order));
        record.insert("deleted".to_string(), json!(false));
        record.insert("deletedAt".to_string(), Value::Null);
        Value::Object(record)
    }

    /// String payload field.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(Value::as_str)
    }

    /// Parsed `alignment`, or `Err` with the raw value when it is unknown.
    pub fn alignment(&self) -> Option<Result<Alignment, String>> {
        let raw = self.payload.get("alignment")?;
        Some(
            raw.as_str()
                .and_then(Alignment::parse)
                .ok_or_else(|| raw.to_string()),
        )
    }
}

/// Tombstone value for a removed component.
pub fn tombstone(deleted_at: i64) -> Value {
    json!({"deleted": true, "deletedAt": deleted_at})
}
