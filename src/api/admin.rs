//! Admin dashboard endpoints: user listing, role changes, removal.
//!
//! All of these answer 403 for non-admin sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::{HimmelClient, Page};
use crate::error::ApiError;
use crate::http::dispatcher::ApiRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Reader,
    Publisher,
    Moderator,
    Admin,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl HimmelClient {
    pub async fn list_users(&self, page: u32) -> Result<Page<UserSummary>, ApiError> {
        self.send(ApiRequest::get(
            self.url(&format!("/admin/users?page={page}")),
        ))
        .await?
        .payload()
    }

    pub async fn set_role(&self, user_id: u64, role: Role) -> Result<UserSummary, ApiError> {
        let req = ApiRequest::patch(self.url(&format!("/admin/users/{user_id}/role")))
            .json(json!({ "role": role }));
        self.send(req).await?.payload()
    }

    pub async fn delete_user(&self, user_id: u64) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(
            self.url(&format!("/admin/users/{user_id}")),
        ))
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_lowercase() {
        assert_eq!(
            serde_json::to_value(Role::Moderator).unwrap(),
            serde_json::json!("moderator")
        );
        let role: Role = serde_json::from_str(r#""admin""#).unwrap();
        assert_eq!(role, Role::Admin);
    }
}
