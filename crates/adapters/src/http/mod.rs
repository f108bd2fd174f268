use std::time::Duration;

use card_binder_application::{ApplicationError, CardSource, SelectionStore};
use card_binder_domain::{Card, SelectionChange};
use reqwest::blocking::{Client, Response};
use tracing::debug;

/// Blocking client for the collection backend (`/api/cards`,
/// `/api/update-selection`).
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApplicationError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApplicationError::InvalidInput(
                "backend url must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ApplicationError::Network(error.to_string()))?;
        Ok(Self { client, base_url })
    }

    pub fn cards_url(&self) -> String {
        format!("{}/api/cards", self.base_url)
    }

    pub fn selection_url(&self) -> String {
        format!("{}/api/update-selection", self.base_url)
    }
}

impl CardSource for HttpBackend {
    fn fetch_cards(&self) -> Result<Vec<Card>, ApplicationError> {
        let url = self.cards_url();
        debug!(%url, "fetching collection");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|error| ApplicationError::Network(error.to_string()))?;
        let body = ensure_success(response, &url)?
            .text()
            .map_err(|error| ApplicationError::Network(error.to_string()))?;
        decode_cards(&body)
    }
}

impl SelectionStore for HttpBackend {
    fn persist_selection(&self, change: &SelectionChange) -> Result<(), ApplicationError> {
        let url = self.selection_url();
        debug!(%url, card = %change.name, checked = change.checked, "persisting selection");
        let response = self
            .client
            .post(&url)
            .json(change)
            .send()
            .map_err(|error| ApplicationError::Network(error.to_string()))?;
        ensure_success(response, &url).map(|_| ())
    }
}

pub fn decode_cards(body: &str) -> Result<Vec<Card>, ApplicationError> {
    serde_json::from_str(body).map_err(|error| ApplicationError::Decode(error.to_string()))
}

pub(crate) fn ensure_success(response: Response, url: &str) -> Result<Response, ApplicationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(ApplicationError::Http {
        status: status.as_u16(),
        url: url.to_string(),
    })
}
