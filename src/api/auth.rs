//! Account endpoints: sign-up, sign-in, sign-out, current account.
//!
//! Sign-in answers with a `Set-Cookie` session header. The in-process cookie
//! store picks it up automatically; [`SignIn::cookies`] additionally exposes
//! the collapsed cookie line for embedders that persist the session across
//! processes (the CLI does).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::HimmelClient;
use crate::error::ApiError;
use crate::http::cookie_line;
use crate::http::dispatcher::ApiRequest;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: u64,
    pub email: String,
    pub username: String,
    pub role: String,
    /// End of the current premium subscription, if any.
    pub premium_until: Option<DateTime<Utc>>,
}

/// Result of a successful sign-in.
#[derive(Debug)]
pub struct SignIn {
    pub account: Account,
    /// Collapsed `Cookie` line from the response, for persistence.
    pub cookies: Option<String>,
}

impl HimmelClient {
    pub async fn sign_up(&self, new_account: &NewAccount) -> Result<Account, ApiError> {
        let req = ApiRequest::post(self.url("/auth/signup"))
            .json(serde_json::to_value(new_account)?);
        self.send(req).await?.payload()
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<SignIn, ApiError> {
        let req = ApiRequest::post(self.url("/auth/signin"))
            .json(serde_json::to_value(credentials)?);
        let resp = self.send(req).await?;
        let cookies = cookie_line(resp.headers());
        let account = resp.payload()?;
        Ok(SignIn { account, cookies })
    }

    pub async fn sign_out(&self) -> Result<(), ApiError> {
        let req = ApiRequest::post(self.url("/auth/signout")).json(json!({}));
        self.send(req).await?;
        Ok(())
    }

    /// The account behind the current session.
    pub async fn me(&self) -> Result<Account, ApiError> {
        self.send(ApiRequest::get(self.url("/users/me")))
            .await?
            .payload()
    }
}
