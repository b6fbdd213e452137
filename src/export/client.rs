use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use super::{normalize_export_csv, DownloadRequest, ExportError};

/// Endpoint serving the CSV, relative to the site root.
pub const EXPORT_PATH: &str = "/pl/Pfm/HistoryApi/GetPfmTransactionsSummary";

/// Join browser cookies into a `Cookie` header value.
pub fn cookie_header<I, N, V>(cookies: I) -> SecretString
where
    I: IntoIterator<Item = (N, V)>,
    N: AsRef<str>,
    V: AsRef<str>,
{
    let header = cookies
        .into_iter()
        .map(|(name, value)| format!("{}={}", name.as_ref(), value.as_ref()))
        .collect::<Vec<_>>()
        .join("; ");
    SecretString::from(header)
}

/// Export client using cookie-based authentication.
pub struct ExportClient {
    client: Client,
    base_url: String,
    cookies: SecretString,
}

impl ExportClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://online.mbank.pl";

    pub fn new(base_url: impl Into<String>, cookies: SecretString) -> Result<Self, ExportError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/145.0.0.0 Safari/537.36")
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            cookies,
        })
    }

    /// Download the export exactly as served.
    pub async fn fetch_raw(&self, request: &DownloadRequest) -> Result<Vec<u8>, ExportError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), EXPORT_PATH);
        tracing::info!(
            %url,
            from = %request.pfm_filters.date_from,
            to = %request.pfm_filters.date_to,
            "requesting CSV export"
        );

        let response = self
            .client
            .post(&url)
            .header("accept", "*/*")
            .header("cookie", self.cookies.expose_secret())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.bytes().await?;
        tracing::debug!(bytes = body.len(), "export downloaded");
        Ok(body.to_vec())
    }

    /// Download the export and normalize it to UTF-8.
    pub async fn fetch_csv(&self, request: &DownloadRequest) -> Result<String, ExportError> {
        let raw = self.fetch_raw(request).await?;
        normalize_export_csv(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_header_joins_pairs() {
        let header = cookie_header([("HOST", "example.com"), ("sid", "abc")]);
        assert_eq!(header.expose_secret(), "HOST=example.com; sid=abc");
    }

    #[test]
    fn test_empty_cookie_jar() {
        let header = cookie_header(Vec::<(String, String)>::new());
        assert_eq!(header.expose_secret(), "");
    }
}
