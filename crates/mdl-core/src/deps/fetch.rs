//! Blocking HTTP fetches for bootstrap.

use std::io::Write;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// HTTP GET abstraction so resolution can be tested without a network.
pub trait Fetcher: Send + Sync {
    /// Whole response body; for small metadata documents.
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;

    /// Stream the response body into `out`, returning bytes written.
    fn fetch_to(&self, url: &str, out: &mut dyn Write) -> Result<u64>;
}

/// libcurl-backed fetcher. Follows redirects, fails on non-2xx.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    user_agent: String,
    connect_timeout: Duration,
    timeout: Duration,
}

impl Default for CurlFetcher {
    fn default() -> Self {
        Self {
            user_agent: concat!("mdl/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(600),
        }
    }
}

impl CurlFetcher {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn easy(&self, url: &str) -> Result<curl::easy::Easy> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url).context("invalid URL")?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.useragent(&self.user_agent)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;
        easy.fail_on_error(false)?;
        Ok(easy)
    }
}

fn check_status(easy: &mut curl::easy::Easy, url: &str) -> Result<()> {
    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        bail!("GET {} returned HTTP {}", url, code);
    }
    Ok(())
}

impl Fetcher for CurlFetcher {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        let mut easy = self.easy(url)?;
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer
                .perform()
                .with_context(|| format!("GET {url} failed"))?;
        }
        check_status(&mut easy, url)?;
        Ok(body)
    }

    fn fetch_to(&self, url: &str, out: &mut dyn Write) -> Result<u64> {
        let mut written = 0u64;
        let mut write_err: Option<std::io::Error> = None;
        let mut easy = self.easy(url)?;
        // Error bodies must not end up in the output file.
        easy.fail_on_error(true)?;
        let performed = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match out.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    write_err = Some(e);
                    Ok(0)
                }
            })?;
            transfer.perform()
        };
        if let Some(e) = write_err {
            return Err(e).with_context(|| format!("writing body of {url}"));
        }
        if let Err(e) = performed {
            if e.is_http_returned_error() {
                check_status(&mut easy, url)?;
            }
            return Err(e).with_context(|| format!("GET {url} failed"));
        }
        check_status(&mut easy, url)?;
        Ok(written)
    }
}
