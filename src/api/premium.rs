//! Premium subscription: plan listing and checkout.
//!
//! Checkout only starts the purchase; the backend answers with a payment
//! URL the embedder opens in a browser. No payment state lives client-side.

use serde::Deserialize;
use serde_json::json;

use crate::api::HimmelClient;
use crate::error::ApiError;
use crate::http::dispatcher::ApiRequest;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub price_cents: u32,
    pub period_days: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub payment_url: String,
}

impl HimmelClient {
    pub async fn plans(&self) -> Result<Vec<Plan>, ApiError> {
        self.send(ApiRequest::get(self.url("/premium/plans")))
            .await?
            .payload()
    }

    pub async fn checkout(&self, plan_id: &str) -> Result<Checkout, ApiError> {
        let req = ApiRequest::post(self.url("/premium/checkout"))
            .json(json!({ "planId": plan_id }));
        self.send(req).await?.payload()
    }
}
