//! HTTP helpers shared by the release host and chat clients.

use crate::error::{Error, Result};
use reqwest::{Client, Response};

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("build-server/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client used for one run.
pub fn client() -> Result<Client> {
    Ok(Client::builder().user_agent(USER_AGENT).build()?)
}

/// Passes successful responses through and turns the rest into [`Error::Api`].
pub async fn check(service: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
    Err(Error::Api {
        service,
        status: status.as_u16(),
        body,
    })
}
