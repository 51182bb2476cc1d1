use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use std::time::Duration;

/// Network seam for revocation lookups. One call per check.
pub trait Transport {
    fn get(&self, url: &str) -> Result<Vec<u8>>;
    fn post(&self, url: &str, content_type: &str, body: &[u8]) -> Result<Vec<u8>>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tls-trust/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.client.get(url).send().with_context(|| format!("GET {} failed", url))?;
        if !resp.status().is_success() {
            bail!("{}: HTTP {}", url, resp.status());
        }
        Ok(resp.bytes()?.to_vec())
    }

    fn post(&self, url: &str, content_type: &str, body: &[u8]) -> Result<Vec<u8>> {
        let resp = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body.to_vec())
            .send()
            .with_context(|| format!("POST {} failed", url))?;
        if !resp.status().is_success() {
            bail!("{}: HTTP {}", url, resp.status());
        }
        Ok(resp.bytes()?.to_vec())
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        (**self).get(url)
    }

    fn post(&self, url: &str, content_type: &str, body: &[u8]) -> Result<Vec<u8>> {
        (**self).post(url, content_type, body)
    }
}
