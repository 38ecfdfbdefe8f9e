use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Server-assigned row id; integer or text depending on the table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{id}"),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

/// Row of the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    // rows written outside this service may lack either
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub office_mail: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    // stored as plaintext by the table design; never sent back to callers
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, rename = "createdby")]
    pub created_by: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

/// Insert payload; `id` and `created_at` come from column defaults.
#[derive(Serialize)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub office_mail: Option<&'a str>,
    pub password: &'a str,
    pub role: &'a str,
    pub mobile: &'a str,
    #[serde(rename = "createdby")]
    pub created_by: Option<&'a str>,
}
