use fantoccini::{Client, ClientBuilder};
use tracing::{debug, trace};

use crate::error::ServiceError;
use crate::render::config;

/// Creates a fresh WebDriver session configured for untrusted-HTML
/// rendering: JavaScript disabled, egress locked to `data:` URIs, a fixed
/// viewport and device scale factor, and a `pageLoadStrategy` approximating
/// the caller's requested `wait_until` (see `render::config::page_load_strategy`).
pub async fn create_client(
    webdriver_url: &str,
    viewport_size: (u32, u32),
    headless: bool,
    scale: f64,
    page_load_strategy: &str,
) -> Result<Client, ServiceError> {
    trace!("creating WebDriver session against {}", webdriver_url);

    let mut caps = serde_json::map::Map::new();
    let mut chrome_opts = serde_json::map::Map::new();

    let mut args = config::chrome_arguments(headless);
    args.push(config::chrome_device_scale_argument(scale));
    chrome_opts.insert(
        "args".to_string(),
        serde_json::Value::Array(args.into_iter().map(serde_json::Value::String).collect()),
    );
    chrome_opts.insert(
        "prefs".to_string(),
        serde_json::Value::Object(config::chrome_preferences()),
    );

    caps.insert("goog:chromeOptions".to_string(), serde_json::Value::Object(chrome_opts));
    caps.insert("pageLoadStrategy".to_string(), page_load_strategy.into());

    debug!("connecting to WebDriver at {}", webdriver_url);
    let client = tokio::time::timeout(
        config::CONNECTION_TIMEOUT,
        ClientBuilder::native().capabilities(caps).connect(webdriver_url),
    )
    .await
    .map_err(|_| ServiceError::BrowserError(format!("timed out connecting to WebDriver at {}", webdriver_url)))?
    .map_err(|e| ServiceError::BrowserError(format!("failed to start browser session: {}", e)))?;

    let (width, height) = viewport_size;
    if let Err(e) = client.set_window_size(width, height).await {
        return Err(ServiceError::BrowserError(format!("failed to set viewport {}x{}: {}", width, height, e)));
    }

    Ok(client)
}
