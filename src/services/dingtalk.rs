use crate::error::RelayError;
use crate::models::dingtalk::{MarkdownMessage, RobotAck, RobotMessage};
use std::time::Duration;
use log::{debug, error, info};

pub struct DingTalkClient {
    client: reqwest::Client,
    base_url: String,
}

impl DingTalkClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    pub async fn send(&self, message: &MarkdownMessage, access_token: &str) -> Result<(), RelayError> {
        if access_token.is_empty() {
            return Err(RelayError::validation("missing access token"));
        }

        debug!("POST {} title={}", self.base_url, message.title);

        let response = self
            .client
            .post(&self.base_url)
            .query(&[("access_token", access_token)])
            .json(&RobotMessage::markdown(message))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("DingTalk API error {}: {}", status, error_text);
            return Err(RelayError::network(format!("DingTalk API error: {}", status)));
        }

        let response_text = response.text().await?;
        let ack: RobotAck = serde_json::from_str(&response_text).map_err(|e| {
            error!("Failed to parse DingTalk response: {}. Body was: {}", e, response_text);
            RelayError::decode(format!("Failed to parse DingTalk response: {}", e))
        })?;

        match ack.code() {
            Some(0) => {
                info!("DingTalk message delivered: {}", message.title);
                Ok(())
            }
            code => Err(RelayError::Delivery {
                code: code.unwrap_or(-1),
                message: ack.errmsg.unwrap_or_default(),
            }),
        }
    }
}
