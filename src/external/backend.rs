use async_trait::async_trait;
use reqwest::StatusCode;
use std::env;
use uuid::Uuid;

use crate::api::TripAPI;
use crate::entities::{IssueTicket, Trip};
use crate::error::{
    invalid_input_error, invalid_invocation_error, unauthorized_error, upstream_error, Error,
};
use crate::session::Session;

/// HTTP client for the ride-hailing backend. Base host and API key come
/// from the environment; the session's bearer token authenticates the user.
pub struct RideBackend {
    client: reqwest::Client,
}

impl RideBackend {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn post_action(&self, session: &Session, id: Uuid, action: &str) -> Result<Trip, Error> {
        let api_base = env::var("RIDE_API_BASE")?;
        let url = format!("https://{}/trips/{}/{}", api_base, id, action);
        let key = env::var("RIDE_API_KEY")?;

        let res = self
            .client
            .post(url)
            .query(&[("key", key)])
            .bearer_auth(&session.auth_token)
            .send()
            .await?;

        check_status(res.status())?;

        Ok(res.json().await?)
    }
}

impl Default for RideBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn check_status(status: StatusCode) -> Result<(), Error> {
    let code = status.as_u16();

    match code {
        200..=299 => Ok(()),
        401 | 403 => Err(unauthorized_error()),
        // The trip is no longer in a state that permits the action; the
        // caller should resync rather than retry.
        409 => Err(invalid_invocation_error()),
        400..=499 => Err(invalid_input_error()),
        _ => Err(upstream_error()),
    }
}

#[async_trait]
impl TripAPI for RideBackend {
    #[tracing::instrument(skip_all)]
    async fn current_trip(&self, session: Session) -> Result<Option<Trip>, Error> {
        let api_base = env::var("RIDE_API_BASE")?;
        let url = format!("https://{}/trips/current", api_base);
        let key = env::var("RIDE_API_KEY")?;

        let res = self
            .client
            .get(url)
            .query(&[("key", key)])
            .bearer_auth(&session.auth_token)
            .send()
            .await?;

        if res.status() == StatusCode::NOT_FOUND || res.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        check_status(res.status())?;

        Ok(Some(res.json().await?))
    }

    #[tracing::instrument(skip_all, fields(%id))]
    async fn confirm_driver(&self, session: Session, id: Uuid) -> Result<Trip, Error> {
        self.post_action(&session, id, "confirm_driver").await
    }

    #[tracing::instrument(skip_all, fields(%id))]
    async fn mark_picked_up(&self, session: Session, id: Uuid) -> Result<Trip, Error> {
        self.post_action(&session, id, "pickup").await
    }

    #[tracing::instrument(skip_all, fields(%id))]
    async fn complete_trip(&self, session: Session, id: Uuid) -> Result<Trip, Error> {
        self.post_action(&session, id, "complete").await
    }

    #[tracing::instrument(skip_all, fields(%id))]
    async fn cancel_trip(&self, session: Session, id: Uuid) -> Result<Trip, Error> {
        self.post_action(&session, id, "cancel").await
    }

    #[tracing::instrument(skip_all, fields(%id))]
    async fn report_issue(
        &self,
        session: Session,
        id: Uuid,
        description: String,
    ) -> Result<IssueTicket, Error> {
        let api_base = env::var("RIDE_API_BASE")?;
        let url = format!("https://{}/trips/{}/issues", api_base, id);
        let key = env::var("RIDE_API_KEY")?;

        let res = self
            .client
            .post(url)
            .query(&[("key", key)])
            .bearer_auth(&session.auth_token)
            .json(&serde_json::json!({ "description": description }))
            .send()
            .await?;

        check_status(res.status())?;

        Ok(res.json().await?)
    }
}
