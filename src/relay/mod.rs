//! Validator duty resolution against the relay's registry.
//!
//! A slot with no registered validator is an expected, common condition:
//! `resolve` answers `Ok(None)`, never an error, for it.

pub mod types;

pub use types::{BlsPubkey, ValidatorMsg};

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::relay::types::RegisteredValidator;

/// Errors from duty-registry lookups.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Request, response status, or body decoding failed.
    #[error("relay request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Looks up which validator is assigned to propose at a slot.
#[derive(Debug, Clone)]
pub struct ValidatorDutyResolver {
    http: reqwest::Client,
    relay_url: Url,
}

impl ValidatorDutyResolver {
    pub fn new(relay_url: Url, request_timeout: Duration) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self { http, relay_url })
    }

    /// Resolve the validator registered for `slot`, if any.
    pub async fn resolve(&self, slot: u64) -> Result<Option<ValidatorMsg>, RelayError> {
        let registrations: Vec<RegisteredValidator> = self
            .http
            .get(self.registrations_url())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(duty_for_slot(registrations, slot))
    }

    fn registrations_url(&self) -> Url {
        let mut url = self.relay_url.clone();
        url.set_path("/relay/v1/builder/validators");
        url
    }
}

fn duty_for_slot(registrations: Vec<RegisteredValidator>, slot: u64) -> Option<ValidatorMsg> {
    registrations
        .into_iter()
        .find(|registered| registered.slot == slot)
        .map(ValidatorMsg::from)
}
