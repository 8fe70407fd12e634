//! HTTP client for the progress/content backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use kidquest_domain::{
    ChildId, ChildProfile, ProgressId, ProgressUpdate, Quest, QuestId, QuestProgress,
    QuestWithProgress, RewardCeremony,
};
use kidquest_shared::{routes, ApiErrorResponse, StartQuestRequest, UpdateProgressRequest};

use crate::infrastructure::config::{EngineConfig, DEFAULT_API_URL, DEFAULT_HTTP_TIMEOUT_SECS};
use crate::infrastructure::ports::{ApiError, ProfileRepo, ProgressRepo, QuestRepo};

/// Client for the KidQuest REST API. One instance serves all three repo ports.
#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self::with_timeout(base_url, token, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, token: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_timeout(&config.api_url, config.api_token.clone(), config.http_timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        entity_type: &'static str,
        id: &str,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| ApiError::network(operation, e))?;

        let response = check_status(operation, entity_type, id, response).await?;

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::serialization(format!("{}: {}", operation, e)))
    }
}

impl Default for HttpApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, None)
    }
}

async fn check_status(
    operation: &'static str,
    entity_type: &'static str,
    id: &str,
    response: Response,
) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .map_err(|e| ApiError::network(operation, e))?;
    let detail = ApiErrorResponse::from_body(&body).detail;

    tracing::debug!(operation, status = %status, detail = %detail, "API request failed");

    Err(match status {
        StatusCode::NOT_FOUND => ApiError::not_found(entity_type, id),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(detail),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            ApiError::constraint(detail)
        }
        other => ApiError::http(operation, other.as_u16(), detail),
    })
}

#[async_trait]
impl QuestRepo for HttpApiClient {
    async fn get_quest(&self, quest_id: QuestId) -> Result<Quest, ApiError> {
        let id = quest_id.to_string();
        let request = self.client.get(self.url(&routes::quest(quest_id)));
        self.send("get_quest", "Quest", &id, request).await
    }

    async fn list_for_child(&self, child_id: ChildId) -> Result<Vec<QuestWithProgress>, ApiError> {
        let id = child_id.to_string();
        let request = self.client.get(self.url(&routes::quests_for_child(child_id)));
        self.send("list_quests_for_child", "Child", &id, request).await
    }
}

#[async_trait]
impl ProgressRepo for HttpApiClient {
    async fn start_quest(
        &self,
        child_id: ChildId,
        quest_id: QuestId,
    ) -> Result<QuestProgress, ApiError> {
        let id = quest_id.to_string();
        let request = self
            .client
            .post(self.url(routes::START_QUEST))
            .json(&StartQuestRequest::new(child_id, quest_id));
        self.send("start_quest", "Quest", &id, request).await
    }

    async fn update_progress(
        &self,
        progress_id: ProgressId,
        update: ProgressUpdate,
    ) -> Result<QuestProgress, ApiError> {
        let id = progress_id.to_string();
        let request = self
            .client
            .patch(self.url(&routes::update_progress(progress_id)))
            .json(&UpdateProgressRequest::from(update));
        self.send("update_progress", "QuestProgress", &id, request)
            .await
    }

    async fn complete_quest(&self, progress_id: ProgressId) -> Result<RewardCeremony, ApiError> {
        let id = progress_id.to_string();
        let request = self
            .client
            .post(self.url(&routes::complete_quest(progress_id)));
        self.send("complete_quest", "QuestProgress", &id, request)
            .await
    }
}

#[async_trait]
impl ProfileRepo for HttpApiClient {
    async fn get_child(&self, child_id: ChildId) -> Result<ChildProfile, ApiError> {
        let id = child_id.to_string();
        let request = self.client.get(self.url(&routes::child(child_id)));
        self.send("get_child", "Child", &id, request).await
    }
}
