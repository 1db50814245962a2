use serde::{Deserialize, Serialize};

/// Layout block of a chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<TextObject>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fields: Option<Vec<TextObject>>,
    },
    Header {
        text: TextObject,
    },
}

impl Block {
    pub fn section(text: TextObject) -> Self {
        Block::Section {
            text: Some(text),
            fields: None,
        }
    }

    pub fn fields(fields: Vec<TextObject>) -> Self {
        Block::Section {
            text: None,
            fields: Some(fields),
        }
    }

    /// Header blocks only accept plain text
    pub fn header(text: impl Into<String>) -> Self {
        Block::Header {
            text: TextObject::plain(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Mrkdwn { text: String },
    PlainText { text: String },
}

impl TextObject {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        TextObject::Mrkdwn { text: text.into() }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        TextObject::PlainText { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            TextObject::Mrkdwn { text } | TextObject::PlainText { text } => text,
        }
    }
}
