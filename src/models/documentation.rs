use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Database row for documentation_widgets. One widget exists per
/// (owner_kind, owner_id) pair and anchors that entity's ordered content
/// blocks.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentationWidget {
    pub id: i64,
    pub owner_kind: String,
    pub owner_id: i64,
    #[sqlx(rename = "display_order")]
    #[serde(rename = "order")]
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for documentation_items: one content block. The payload is
/// exclusive by type — TEXT items carry `text_content`, IMAGE items carry
/// `image_ref` (an opaque blob-store reference).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentationItem {
    pub id: i64,
    pub widget_id: i64,
    pub item_type: String,
    pub text_content: Option<String>,
    pub image_ref: Option<String>,
    #[sqlx(rename = "display_order")]
    #[serde(rename = "order")]
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ItemType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemType {
    Text,
    Image,
}

impl ItemType {
    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "TEXT" => Some(ItemType::Text),
            "IMAGE" => Some(ItemType::Image),
            _ => None,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Text => write!(f, "TEXT"),
            ItemType::Image => write!(f, "IMAGE"),
        }
    }
}
