use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Streaming GET over a reusable session.
///
/// Implementations follow redirects and keep whatever session state (cookies,
/// pooled connections) the host needs between requests. A non-success status
/// must be reported as an error from [`HttpClient::stream`], never as a body.
pub trait HttpClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open `url` and return its body as a finite, non-restartable sequence
    /// of chunks.
    fn stream(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<BoxStream<'static, Result<Bytes, Self::Error>>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use futures_util::StreamExt;

    use super::*;

    /// Session configuration for [`ReqwestClient`].
    #[derive(Debug, Clone)]
    pub struct ClientSettings {
        pub user_agent:      String,
        pub connect_timeout: Option<Duration>,
        /// Longest silence tolerated between two body reads.
        pub read_timeout:    Option<Duration>,
        pub proxy:           Option<String>,
    }

    impl Default for ClientSettings {
        fn default() -> Self {
            Self {
                user_agent:      concat!("modelfetch/", env!("CARGO_PKG_VERSION")).to_string(),
                connect_timeout: Some(Duration::from_secs(30)),
                read_timeout:    Some(Duration::from_secs(60)),
                proxy:           None,
            }
        }
    }

    impl ClientSettings {
        pub fn build(self) -> Result<ReqwestClient, reqwest::Error> {
            let mut builder = reqwest::Client::builder()
                .user_agent(self.user_agent)
                .cookie_store(true);
            if let Some(timeout) = self.connect_timeout {
                builder = builder.connect_timeout(timeout);
            }
            if let Some(timeout) = self.read_timeout {
                builder = builder.read_timeout(timeout);
            }
            if let Some(proxy) = self.proxy {
                builder = builder.proxy(reqwest::Proxy::all(proxy)?);
            }
            Ok(ReqwestClient {
                client: builder.build()?,
            })
        }
    }

    /// Production client: one `reqwest::Client` with a cookie jar, shared by
    /// every request of a run.
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        pub fn new() -> Result<Self, reqwest::Error> { ClientSettings::default().build() }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn stream(&self, url: &str) -> Result<BoxStream<'static, Result<Bytes, Self::Error>>, Self::Error> {
            let response = self.client.get(url).send().await?.error_for_status()?;
            tracing::debug!(status = %response.status(), len = ?response.content_length(), "response opened");
            Ok(response.bytes_stream().boxed())
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::{ClientSettings, ReqwestClient};
