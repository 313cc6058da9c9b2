//! Chapter content and reading progress.
//!
//! A chapter is an ordered list of page image URLs; the reader walks them in
//! sequence. Progress writes are explicit calls here — the embedder decides
//! how often to record (the web reader debounces them; the CLI records once
//! per chapter).

use serde::Deserialize;
use serde_json::json;

use crate::api::HimmelClient;
use crate::error::ApiError;
use crate::http::dispatcher::ApiRequest;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub fiction_id: u64,
    pub number: u32,
    pub title: Option<String>,
    /// Page image URLs in reading order.
    pub pages: Vec<String>,
    pub previous: Option<u32>,
    pub next: Option<u32>,
}

impl HimmelClient {
    pub async fn chapter(&self, fiction_id: u64, number: u32) -> Result<Chapter, ApiError> {
        self.send(ApiRequest::get(
            self.url(&format!("/fictions/{fiction_id}/chapters/{number}")),
        ))
        .await?
        .payload()
    }

    /// Record that the reader reached `page` of this chapter.
    pub async fn record_progress(
        &self,
        fiction_id: u64,
        number: u32,
        page: u32,
    ) -> Result<(), ApiError> {
        let req = ApiRequest::post(
            self.url(&format!("/fictions/{fiction_id}/chapters/{number}/progress")),
        )
        .json(json!({ "page": page }));
        self.send(req).await?;
        Ok(())
    }
}
