//! Bearer-token HTTP client for downstream data APIs
//!
//! Attaches `Authorization: Bearer <token>` from the session manager to each
//! request and treats a 401 answer as a signal to sign out.

use crate::session::SessionLifecycleManager;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid access token; the caller should show the sign-in entry point
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The API refused the token; the session has been signed out unless a
    /// renewal had already replaced that token
    #[error("Unauthorized: access token refused")]
    Unauthorized,

    #[error("Request failed with status: {0}")]
    Status(u16),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// HTTP client bound to one session
#[derive(Debug, Clone)]
pub struct BearerClient {
    http: Client,
    manager: SessionLifecycleManager,
}

impl BearerClient {
    #[must_use]
    pub fn new(manager: SessionLifecycleManager) -> Self {
        Self::with_http_client(Client::new(), manager)
    }

    #[must_use]
    pub fn with_http_client(http: Client, manager: SessionLifecycleManager) -> Self {
        Self { http, manager }
    }

    /// GET `url` with the current access token and decode the JSON body
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - There is no valid access token (no request is sent)
    /// - The API answers 401 (the session is signed out first, unless the
    ///   token sent has since been renewed)
    /// - The API answers any other non-success status
    /// - The request fails or the body is not the expected JSON
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let token = self
            .manager
            .get_valid_access_token()
            .await
            .ok_or(ApiError::NotAuthenticated)?;

        let response = self
            .http
            .get(url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;

        if let Err(err) = check_status(response.status()) {
            if matches!(err, ApiError::Unauthorized) {
                if self.manager.sign_out_if_current(&token).await {
                    log::warn!("API rejected access token for {url}, signed out");
                } else {
                    log::debug!("API rejected a superseded access token for {url}");
                }
            }
            return Err(err);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    #[must_use]
    pub fn manager(&self) -> &SessionLifecycleManager {
        &self.manager
    }
}

fn check_status(status: StatusCode) -> Result<(), ApiError> {
    if status == StatusCode::UNAUTHORIZED {
        Err(ApiError::Unauthorized)
    } else if status.is_success() {
        Ok(())
    } else {
        Err(ApiError::Status(status.as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockOidcClient, TestFixtures};
    use std::sync::Arc;

    #[test]
    fn test_check_status() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            check_status(StatusCode::INTERNAL_SERVER_ERROR),
            Err(ApiError::Status(500))
        ));
    }

    #[tokio::test]
    async fn test_no_session_sends_no_request() {
        let client = Arc::new(MockOidcClient::new());
        let manager = TestFixtures::manager(client.clone());
        manager.initialize().await.unwrap();

        let api = BearerClient::new(manager);
        let result = api
            .get_json::<serde_json::Value>("http://127.0.0.1:9/weather")
            .await;

        assert!(matches!(result, Err(ApiError::NotAuthenticated)));
        assert_eq!(client.renew_calls(), 0);
    }
}
