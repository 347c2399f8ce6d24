use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::timeout;

use crate::sources::errors::SourceError;

pub fn build_client(timeout_duration: Duration) -> Result<reqwest::Client, SourceError> {
    let client = reqwest::Client::builder()
        .timeout(timeout_duration)
        .user_agent(concat!("price-tracker/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

// GETs `url` and decodes a JSON body. Anything but 200 OK, a timeout, or a body that does not
// decode into `T` is an error; callers decide how to degrade.
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
    timeout_duration: Duration,
) -> Result<T, SourceError> {
    let request = async {
        let response = client.get(url).query(query).send().await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(SourceError::Status(response.status()));
        }

        let body = response.text().await?;
        log::trace!("Response from {}: {}", url, body);
        let parsed = serde_json::from_str::<T>(&body)?;
        Ok::<T, SourceError>(parsed)
    };

    timeout(timeout_duration, request)
        .await
        .map_err(|_| SourceError::Timeout(timeout_duration))?
}
