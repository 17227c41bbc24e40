use crate::error::ProviderError;
use crate::models::{ImageRef, Proposal, StoryEntry, TimeInfo};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

pub const PROPOSALS_PATH: &str = "/proposals";
pub const STORY_HISTORY_PATH: &str = "/story-history";
pub const TIME_REMAINING_PATH: &str = "/vote-time-remaining";
pub const GENERATE_IMAGE_PATH: &str = "/generate-image";

/// The four read operations the poller issues once per tick. Each one is
/// safe to repeat and independent of the others.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn proposals(&self) -> Result<Vec<Proposal>, ProviderError>;

    async fn story_history(&self) -> Result<Vec<StoryEntry>, ProviderError>;

    // `None` while no vote is running
    async fn time_info(&self) -> Result<Option<TimeInfo>, ProviderError>;

    // Best effort; `None` when the backend has nothing to show yet
    async fn generate_image(&self) -> Result<Option<ImageRef>, ProviderError>;
}

pub struct HttpProvider {
    client: Client,
    base_url: String,
}

impl HttpProvider {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_body(&self, resource: &'static str, path: &str) -> Result<String, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                resource,
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        path: &str,
    ) -> Result<T, ProviderError> {
        let body = self.get_body(resource, path).await?;
        serde_json::from_str(&body).map_err(|source| ProviderError::Decode { resource, source })
    }
}

#[async_trait]
impl DataProvider for HttpProvider {
    async fn proposals(&self) -> Result<Vec<Proposal>, ProviderError> {
        self.get_json("proposals", PROPOSALS_PATH).await
    }

    async fn story_history(&self) -> Result<Vec<StoryEntry>, ProviderError> {
        self.get_json("story history", STORY_HISTORY_PATH).await
    }

    async fn time_info(&self) -> Result<Option<TimeInfo>, ProviderError> {
        let info: Option<TimeInfo> = self.get_json("time remaining", TIME_REMAINING_PATH).await?;
        if let Some(info) = &info {
            info.validate().map_err(|reason| ProviderError::Malformed {
                resource: "time remaining",
                reason,
            })?;
        }
        Ok(info)
    }

    async fn generate_image(&self) -> Result<Option<ImageRef>, ProviderError> {
        let body = self.get_body("generated image", GENERATE_IMAGE_PATH).await?;
        Ok(parse_image_body(&body))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImageBody {
    Reference(String),
    Object {
        #[serde(alias = "url")]
        image_url: Option<String>,
    },
}

// Accepts a JSON string, an object carrying `image_url`/`url`, or a bare body
fn parse_image_body(body: &str) -> Option<ImageRef> {
    let body = body.trim();
    let reference = match serde_json::from_str::<Option<ImageBody>>(body) {
        Ok(Some(ImageBody::Reference(reference))) => Some(reference),
        Ok(Some(ImageBody::Object { image_url })) => image_url,
        Ok(None) => None,
        Err(_) => Some(body.to_string()),
    };
    reference
        .map(|reference| reference.trim().to_string())
        .filter(|reference| !reference.is_empty())
        .map(ImageRef)
}
