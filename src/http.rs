//! Shared HTTP plumbing for upstream providers
//!
//! Every provider call is a single attempt bounded by the client timeout. Failures
//! are returned as [`WeatherHubError::Api`] so callers can fall back.

use crate::{Result, WeatherHubError};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Build an HTTP client with a bounded timeout
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| WeatherHubError::config(format!("Failed to create HTTP client: {e}")))
}

/// URL without its query string, safe to log when the query carries an API key
pub fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// Send a GET request and decode a JSON body
///
/// Non-2xx statuses, transport errors, timeouts and undecodable bodies are all errors.
pub async fn get_json<T: DeserializeOwned>(client: &Client, url: &str, provider: &str) -> Result<T> {
    let response = send(client, url, provider).await?;

    let parse_start = Instant::now();
    let body = response.json::<T>().await.map_err(|e| {
        warn!(provider, "Failed to parse response: {}", e);
        WeatherHubError::api(format!("Invalid response from {provider}: {e}"))
    })?;
    debug!(
        provider,
        "Parsed response in {:.3}s",
        parse_start.elapsed().as_secs_f64()
    );

    Ok(body)
}

async fn send(client: &Client, url: &str, provider: &str) -> Result<Response> {
    let request_start = Instant::now();
    debug!(provider, url = redact(url), "Making HTTP request");

    let response = client.get(url).send().await.map_err(|e| {
        warn!(
            provider,
            "Request failed after {:.3}s: {}",
            request_start.elapsed().as_secs_f64(),
            e
        );
        WeatherHubError::from(e)
    })?;

    let status = response.status();
    let elapsed = request_start.elapsed();
    debug!(
        provider,
        "HTTP response received: {} in {:.3}s",
        status,
        elapsed.as_secs_f64()
    );

    if elapsed.as_secs() > 5 {
        warn!(provider, "Slow API response detected: {:.3}s", elapsed.as_secs_f64());
    }

    if status.is_success() {
        return Ok(response);
    }

    let message = match status.as_u16() {
        401 | 403 => format!("{provider} rejected the API key (HTTP {})", status.as_u16()),
        429 => format!("{provider} rate limit exceeded"),
        _ => format!(
            "{provider} request failed with status: {} - {}",
            status,
            status.canonical_reason().unwrap_or("Unknown error")
        ),
    };
    warn!(provider, "{}", message);
    Err(WeatherHubError::api(message))
}
