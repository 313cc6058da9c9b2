//! Comments on fictions.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::api::{HimmelClient, Page};
use crate::error::ApiError;
use crate::http::dispatcher::ApiRequest;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: u64,
    pub fiction_id: u64,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl HimmelClient {
    pub async fn comments(
        &self,
        fiction_id: u64,
        page: u32,
    ) -> Result<Page<Comment>, ApiError> {
        self.send(ApiRequest::get(self.url(&format!(
            "/fictions/{fiction_id}/comments?page={page}"
        ))))
        .await?
        .payload()
    }

    pub async fn post_comment(&self, fiction_id: u64, content: &str) -> Result<Comment, ApiError> {
        let req = ApiRequest::post(self.url(&format!("/fictions/{fiction_id}/comments")))
            .json(json!({ "content": content }));
        self.send(req).await?.payload()
    }

    /// Delete own comment (or any comment, for moderators).
    pub async fn delete_comment(&self, comment_id: u64) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(
            self.url(&format!("/comments/{comment_id}")),
        ))
        .await?;
        Ok(())
    }
}
