//! HTTP utilities for OCI REST API calls

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use uuid::Uuid;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Pagination header on list responses: a non-empty value means more pages exist.
pub const NEXT_PAGE_HEADER: &str = "opc-next-page";

/// Correlation id header, echoed back by the API.
pub const REQUEST_ID_HEADER: &str = "opc-request-id";

/// Sanitize response body for logging
/// Truncates long responses and masks potentially sensitive patterns
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        format!(
            "{}... [truncated, {} bytes total]",
            &body[..MAX_LOG_BODY_LENGTH],
            body.len()
        )
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// A decoded API response plus the OCI envelope headers the caller needs.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub body: Value,
    /// Token for the next page, taken from `opc-next-page`.
    pub next_page: Option<String>,
    /// Correlation id echoed by the service.
    pub request_id: Option<String>,
}

/// HTTP client wrapper for OCI API calls
#[derive(Clone)]
pub struct OciHttpClient {
    client: Client,
}

impl OciHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent("ociprov/0.1.0")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request to an OCI API
    pub async fn get(&self, url: &str, token: &str) -> Result<ApiResponse> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    /// Make a POST request to an OCI API
    pub async fn post(&self, url: &str, token: &str, body: Option<&Value>) -> Result<ApiResponse> {
        tracing::debug!("POST {}", url);

        let mut request = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.context("Failed to send request")?;
        Self::decode(response).await
    }

    /// Make a DELETE request to an OCI API
    pub async fn delete(&self, url: &str, token: &str) -> Result<ApiResponse> {
        tracing::debug!("DELETE {}", url);

        let response = self
            .client
            .delete(url)
            .bearer_auth(token)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    /// Capture envelope headers, check status, and parse the body.
    async fn decode(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status();
        let next_page = header_value(&response, NEXT_PAGE_HEADER);
        let request_id = header_value(&response, REQUEST_ID_HEADER);

        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(anyhow::anyhow!(
                "API request failed: {} (opc-request-id: {})",
                status,
                request_id.as_deref().unwrap_or("none")
            ));
        }

        // Handle empty response (204 on deletes)
        let body = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).context("Failed to parse response JSON")?
        };

        Ok(ApiResponse {
            body,
            next_page,
            request_id,
        })
    }
}

fn header_value(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

impl Default for OciHttpClient {
    fn default() -> Self {
        Self::new().expect("Failed to create default HTTP client")
    }
}

/// Whether an error from this client reports an HTTP 404.
///
/// The sweeper treats 404 on a get as "resource already gone"; everything
/// else stays an error for the caller to interpret.
pub fn is_not_found(error: &anyhow::Error) -> bool {
    error.to_string().contains("404")
}

/// Format an OCI API error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_oci_error(error: &anyhow::Error) -> String {
    let error_str = error.to_string();

    // Clean up common error patterns with user-friendly messages
    // Security: These generic messages avoid leaking API structure details
    if error_str.contains("403") {
        return "Permission denied. Check your IAM policies for this compartment.".to_string();
    }
    if error_str.contains("401") {
        return "Authentication failed. Run 'oci session authenticate'.".to_string();
    }
    if error_str.contains("404") {
        return "Resource not found.".to_string();
    }
    if error_str.contains("429") {
        return "Rate limit exceeded. Please try again later.".to_string();
    }
    if error_str.contains("400") {
        return "Invalid request. Check your parameters.".to_string();
    }
    if error_str.contains("500") || error_str.contains("503") {
        return "OCI service temporarily unavailable. Please try again.".to_string();
    }
    if error_str.contains("409") {
        return "Resource conflict. The resource may already exist or be in use.".to_string();
    }

    if error_str.contains("API request failed") {
        return "Request failed. Check your network connection and try again.".to_string();
    }

    // Truncate long error messages and remove potential sensitive data
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(80)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        let err = anyhow::anyhow!("API request failed: 404 Not Found (opc-request-id: abc)");
        assert!(is_not_found(&err));

        let err = anyhow::anyhow!("API request failed: 401 Unauthorized (opc-request-id: abc)");
        assert!(!is_not_found(&err));
    }

    #[test]
    fn test_error_formatting_by_status_class() {
        let err = anyhow::anyhow!("API request failed: 401 Unauthorized");
        assert!(format_oci_error(&err).contains("oci session authenticate"));

        let err = anyhow::anyhow!("API request failed: 404 Not Found");
        assert_eq!(format_oci_error(&err), "Resource not found.");
    }
}
