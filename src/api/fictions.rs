//! Fiction catalogue: browse, read metadata, publish, rate, bookmark.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::{HimmelClient, Page};
use crate::error::ApiError;
use crate::http::dispatcher::ApiRequest;

// ─── Wire models ──────────────────────────────────────────────────────────────

/// Catalogue entry as returned by the browse listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FictionSummary {
    pub id: u64,
    pub title: String,
    pub cover_url: Option<String>,
    pub tags: Vec<String>,
    pub average_rating: Option<f64>,
    pub chapter_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fiction {
    pub id: u64,
    pub title: String,
    pub synopsis: String,
    pub author: String,
    pub tags: Vec<String>,
    pub average_rating: Option<f64>,
    pub rating_count: u64,
    pub chapter_count: u32,
    /// Whether the current account has bookmarked this fiction.
    pub bookmarked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFiction {
    pub title: String,
    pub synopsis: String,
    pub tags: Vec<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FictionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Latest,
    Rating,
    Popularity,
}

impl SortKey {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Rating => "rating",
            Self::Popularity => "popularity",
        }
    }
}

/// Browse filter. `Default` is page 1 of the whole catalogue, newest first.
#[derive(Debug, Clone, Default)]
pub struct FictionQuery {
    pub keyword: Option<String>,
    pub tags: Vec<String>,
    pub sort: Option<SortKey>,
    pub page: u32,
}

impl FictionQuery {
    /// Render as a query string (leading `?`), empty when nothing is set.
    fn to_query_string(&self) -> String {
        let mut params: Vec<String> = Vec::new();
        if let Some(keyword) = &self.keyword {
            params.push(format!("keyword={}", urlencoding::encode(keyword)));
        }
        for tag in &self.tags {
            params.push(format!("tag={}", urlencoding::encode(tag)));
        }
        if let Some(sort) = &self.sort {
            params.push(format!("sort={}", sort.as_str()));
        }
        if self.page > 0 {
            params.push(format!("page={}", self.page));
        }
        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }
}

// ─── Endpoints ────────────────────────────────────────────────────────────────

impl HimmelClient {
    pub async fn browse_fictions(
        &self,
        query: &FictionQuery,
    ) -> Result<Page<FictionSummary>, ApiError> {
        let url = format!("{}{}", self.url("/fictions"), query.to_query_string());
        self.send(ApiRequest::get(url)).await?.payload()
    }

    pub async fn fiction(&self, id: u64) -> Result<Fiction, ApiError> {
        self.send(ApiRequest::get(self.url(&format!("/fictions/{id}"))))
            .await?
            .payload()
    }

    pub async fn create_fiction(&self, new_fiction: &NewFiction) -> Result<Fiction, ApiError> {
        let req = ApiRequest::post(self.url("/fictions"))
            .json(serde_json::to_value(new_fiction)?);
        self.send(req).await?.payload()
    }

    pub async fn update_fiction(
        &self,
        id: u64,
        patch: &FictionPatch,
    ) -> Result<Fiction, ApiError> {
        let req = ApiRequest::patch(self.url(&format!("/fictions/{id}")))
            .json(serde_json::to_value(patch)?);
        self.send(req).await?.payload()
    }

    /// Rate a fiction 1-5. The backend validates the range.
    pub async fn rate_fiction(&self, id: u64, score: u8) -> Result<(), ApiError> {
        let req = ApiRequest::post(self.url(&format!("/fictions/{id}/rating")))
            .json(json!({ "score": score }));
        self.send(req).await?;
        Ok(())
    }

    pub async fn bookmark_fiction(&self, id: u64) -> Result<(), ApiError> {
        let req = ApiRequest::post(self.url(&format!("/fictions/{id}/bookmark"))).json(json!({}));
        self.send(req).await?;
        Ok(())
    }

    pub async fn unbookmark_fiction(&self, id: u64) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(
            self.url(&format!("/fictions/{id}/bookmark")),
        ))
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_encodes_and_joins() {
        let query = FictionQuery {
            keyword: Some("sky castle".to_string()),
            tags: vec!["isekai".to_string(), "slice of life".to_string()],
            sort: Some(SortKey::Rating),
            page: 3,
        };
        assert_eq!(
            query.to_query_string(),
            "?keyword=sky%20castle&tag=isekai&tag=slice%20of%20life&sort=rating&page=3"
        );
    }

    #[test]
    fn empty_query_renders_nothing() {
        assert_eq!(FictionQuery::default().to_query_string(), "");
    }

    #[test]
    fn patch_skips_absent_fields() {
        let patch = FictionPatch {
            synopsis: Some("rewritten".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({ "synopsis": "rewritten" })
        );
    }
}
