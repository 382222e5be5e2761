//! HTTP transport: one binary POST per call.
//!
//! Carries no protocol semantics. The request body goes out as
//! `application/octet-stream` and the response body comes back as raw
//! bytes for the caller to decode.

use reqwest::header::CONTENT_TYPE;

use crate::error::{ClientError, Result};
use crate::RequestOptions;

pub(crate) async fn post_binary(
    http: &reqwest::Client,
    url: &str,
    body: Vec<u8>,
    options: &RequestOptions,
) -> Result<Vec<u8>> {
    let mut request = http
        .post(url)
        .header(CONTENT_TYPE, "application/octet-stream")
        .body(body);
    if let Some(timeout) = options.timeout {
        request = request.timeout(timeout);
    }
    for (name, value) in &options.headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Server {
            status: status.as_u16(),
            message: response.text().await.unwrap_or_default(),
        });
    }
    Ok(response.bytes().await?.to_vec())
}
