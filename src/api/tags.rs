//! Tag catalogue. Creation and deletion are admin operations; a 403 from
//! them flows through the dispatcher's forbidden handling.

use serde::Deserialize;
use serde_json::json;

use crate::api::HimmelClient;
use crate::error::ApiError;
use crate::http::dispatcher::ApiRequest;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: u64,
    pub name: String,
    pub fiction_count: u64,
}

impl HimmelClient {
    pub async fn tags(&self) -> Result<Vec<Tag>, ApiError> {
        self.send(ApiRequest::get(self.url("/tags")))
            .await?
            .payload()
    }

    pub async fn create_tag(&self, name: &str) -> Result<Tag, ApiError> {
        let req = ApiRequest::post(self.url("/tags")).json(json!({ "name": name }));
        self.send(req).await?.payload()
    }

    pub async fn delete_tag(&self, id: u64) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(self.url(&format!("/tags/{id}"))))
            .await?;
        Ok(())
    }
}
