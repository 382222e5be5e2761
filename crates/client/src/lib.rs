//! GraphPipe Client
//!
//! Async client for GraphPipe array-computation services: encodes native
//! arrays into the binary wire format, POSTs them over HTTP, and decodes
//! the binary response back into typed arrays.
//!
//! # Example
//!
//! ```no_run
//! use graphpipe_client::{infer, metadata};
//! use graphpipe_protocol::NdArray;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let meta = metadata("http://localhost:9000/metadata").await?;
//!     println!("service: {} ({})", meta.name, meta.server);
//!
//!     let input = NdArray::from_f32(&[1.0, 2.0, 3.0, 4.0], vec![2, 2])?;
//!     let outputs = infer("http://localhost:9000/infer", input).await?;
//!     println!("outputs: {}", outputs.len());
//!     Ok(())
//! }
//! ```

mod error;
mod transport;

pub use error::{ClientError, Result};

use std::time::Duration;

use graphpipe_protocol::{InferRequest, InferResponse, MetadataResponse, NdArray, Request};

/// Transport knobs for a single call, passed through to the HTTP request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
    pub headers: Vec<(String, String)>,
}

/// Options for an inference call. Name lists and config default to empty,
/// matching what servers expect from a bare call.
#[derive(Debug, Clone, Default)]
pub struct InferOptions {
    pub input_names: Vec<String>,
    pub output_names: Vec<String>,
    pub config: String,
    pub transport: RequestOptions,
}

impl InferOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_names(mut self, names: impl IntoNames) -> Self {
        self.input_names = names.into_names();
        self
    }

    pub fn output_names(mut self, names: impl IntoNames) -> Self {
        self.output_names = names.into_names();
        self
    }

    pub fn config(mut self, config: impl Into<String>) -> Self {
        self.config = config.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.transport.timeout = Some(timeout);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.transport.headers.push((name.into(), value.into()));
        self
    }
}

/// Inputs accepted by [`infer`]: one array or a sequence of arrays. A
/// single array is normalized to a one-element sequence at the boundary.
pub trait IntoTensors {
    fn into_tensors(self) -> Vec<NdArray>;
}

impl IntoTensors for NdArray {
    fn into_tensors(self) -> Vec<NdArray> {
        vec![self]
    }
}

impl IntoTensors for Vec<NdArray> {
    fn into_tensors(self) -> Vec<NdArray> {
        self
    }
}

impl IntoTensors for &[NdArray] {
    fn into_tensors(self) -> Vec<NdArray> {
        self.to_vec()
    }
}

impl<const N: usize> IntoTensors for [NdArray; N] {
    fn into_tensors(self) -> Vec<NdArray> {
        self.into()
    }
}

/// Name lists accepted by [`InferOptions`]: one name or a sequence of
/// names, normalized the same way as tensors.
pub trait IntoNames {
    fn into_names(self) -> Vec<String>;
}

impl IntoNames for &str {
    fn into_names(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoNames for String {
    fn into_names(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoNames for Vec<String> {
    fn into_names(self) -> Vec<String> {
        self
    }
}

impl IntoNames for &[&str] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> IntoNames for [&str; N] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

/// GraphPipe client. Holds only the HTTP client; every call is an
/// independent request/response exchange.
pub struct Client {
    http: reqwest::Client,
}

impl Client {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Wraps a preconfigured HTTP client. Pooling, default timeouts, and
    /// TLS setup stay with the caller.
    pub fn with_http(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Fetches the service's self-description.
    pub async fn metadata(&self, url: &str) -> Result<MetadataResponse> {
        let body = Request::Metadata.encode();
        tracing::debug!(url, "sending metadata request");
        let bytes = transport::post_binary(&self.http, url, body, &RequestOptions::default()).await?;
        let meta = MetadataResponse::decode(&bytes)?;
        tracing::debug!(
            inputs = meta.inputs.len(),
            outputs = meta.outputs.len(),
            "decoded metadata response"
        );
        Ok(meta)
    }

    /// Runs inference and returns the output arrays in the service's
    /// declared output order.
    pub async fn infer(
        &self,
        url: &str,
        inputs: impl IntoTensors,
        options: InferOptions,
    ) -> Result<Vec<NdArray>> {
        let InferOptions {
            input_names,
            output_names,
            config,
            transport: transport_options,
        } = options;
        let request = Request::Infer(InferRequest {
            input_tensors: inputs.into_tensors(),
            input_names,
            output_names,
            config,
        });
        let body = request.encode();
        tracing::debug!(url, bytes = body.len(), "sending infer request");
        let bytes = transport::post_binary(&self.http, url, body, &transport_options).await?;
        let response = InferResponse::decode(&bytes)?;
        tracing::debug!(
            outputs = response.output_tensors.len(),
            "decoded infer response"
        );
        Ok(response.output_tensors)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

/// Stateless convenience wrapper around [`Client::metadata`].
pub async fn metadata(url: &str) -> Result<MetadataResponse> {
    Client::new().metadata(url).await
}

/// Stateless convenience wrapper around [`Client::infer`] with default
/// options.
pub async fn infer(url: &str, inputs: impl IntoTensors) -> Result<Vec<NdArray>> {
    Client::new().infer(url, inputs, InferOptions::default()).await
}

/// Like [`infer`], with explicit options.
pub async fn infer_with(
    url: &str,
    inputs: impl IntoTensors,
    options: InferOptions,
) -> Result<Vec<NdArray>> {
    Client::new().infer(url, inputs, options).await
}
