use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::Record;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub connected: bool,
    pub uptime_secs: u64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IndexResponse {
    pub datetime: DateTime<Utc>,
    pub name: String,
    pub version: String,
    pub routes: Vec<RouteDoc>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RouteDoc {
    pub method: String,
    pub path: String,
    pub description: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UsersResponse {
    pub datetime: DateTime<Utc>,
    pub all_users: Vec<Record>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserResponse {
    pub datetime: DateTime<Utc>,
    pub user: Option<Record>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SucceedResponse {
    pub datetime: DateTime<Utc>,
    pub succeed: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdatedResponse {
    pub datetime: DateTime<Utc>,
    pub updated: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeletedResponse {
    pub datetime: DateTime<Utc>,
    pub deleted: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    pub datetime: DateTime<Utc>,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            datetime: Utc::now(),
            error: error.into(),
        }
    }
}
