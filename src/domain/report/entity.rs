//! Mountain conditions report entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Owner id meaning "no real owner"
pub const SENTINEL_OWNER_ID: &str = "0";

/// Entry of an upstream node list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(deserialize_with = "id")]
    pub nid: String,
    #[serde(deserialize_with = "id")]
    pub uid: String,
    #[serde(default, deserialize_with = "opt_id")]
    pub updated: Option<String>,
}

impl RawNode {
    pub fn has_sentinel_owner(&self) -> bool {
        self.uid == SENTINEL_OWNER_ID
    }
}

/// Report detail as served by the upstream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReport {
    #[serde(default, deserialize_with = "opt_id")]
    pub nid: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    pub uid: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    /// Dates as strings (`YYYY-MM-DD`, RFC 3339) or unix seconds
    #[serde(default)]
    pub dates: Vec<Value>,
    #[serde(default)]
    pub location_desc: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub permalink: Option<String>,
}

/// Report owner as served by the upstream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawUser {
    #[serde(default, deserialize_with = "opt_id")]
    pub uid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub realname: Option<String>,
    /// Either a URL string or an object with a `url` field
    #[serde(default)]
    pub picture: Option<Value>,
}

/// User-facing report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedReport {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Associated dates, earliest first
    pub dates: Vec<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_desc: Option<String>,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
    pub user: ReportUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportUser {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Id {
    Text(String),
    Number(i64),
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        match id {
            Id::Text(text) => text,
            Id::Number(n) => n.to_string(),
        }
    }
}

fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Id::deserialize(deserializer).map(String::from)
}

fn opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<Id>::deserialize(deserializer).map(|id| id.map(String::from))
}
