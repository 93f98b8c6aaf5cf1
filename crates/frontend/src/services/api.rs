//! Thin JSON helpers over `gloo_net`.
//!
//! The session cookie rides along on every same-origin request, so nothing
//! here deals with tokens.

use std::fmt;

use gloo_net::http::{Request, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared_types::ErrorResponse;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiFailure {
    /// The session is missing or expired.
    Unauthorized,
    Failed(String),
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::Unauthorized => f.write_str("Please log in again"),
            ApiFailure::Failed(message) => f.write_str(message),
        }
    }
}

fn network(e: gloo_net::Error) -> ApiFailure {
    ApiFailure::Failed(format!("Network error: {}", e))
}

async fn check(response: Response) -> Result<Response, ApiFailure> {
    if response.status() == 401 {
        return Err(ApiFailure::Unauthorized);
    }
    if response.ok() {
        return Ok(response);
    }

    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => match body.details {
            Some(details) => format!("{}: {}", body.error, details),
            None => body.error,
        },
        Err(_) => format!("API error: {}", response.status()),
    };
    Err(ApiFailure::Failed(message))
}

async fn read<T: DeserializeOwned>(response: Response) -> Result<T, ApiFailure> {
    let response = check(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| ApiFailure::Failed(format!("Failed to parse response: {}", e)))
}

pub async fn get<T: DeserializeOwned>(url: &str) -> Result<T, ApiFailure> {
    let response = Request::get(url).send().await.map_err(network)?;
    read(response).await
}

pub async fn post<B: Serialize, T: DeserializeOwned>(url: &str, body: &B) -> Result<T, ApiFailure> {
    let response = Request::post(url)
        .json(body)
        .map_err(network)?
        .send()
        .await
        .map_err(network)?;
    read(response).await
}

/// POST without a request or response body.
pub async fn post_empty(url: &str) -> Result<(), ApiFailure> {
    let response = Request::post(url).send().await.map_err(network)?;
    check(response).await.map(|_| ())
}

pub async fn delete(url: &str) -> Result<(), ApiFailure> {
    let response = Request::delete(url).send().await.map_err(network)?;
    check(response).await.map(|_| ())
}
