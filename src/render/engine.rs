use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use fantoccini::Locator;
use image::{GenericImageView, ImageOutputFormat};
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::config::AppConfig;
use crate::dimensions;
use crate::error::ServiceError;
use crate::model::{ImageType, ResolvedParams, ScreenshotResult, WaitUntil};
use crate::render::{client, config as render_config, style};

/// Owns the semaphore gating concurrent renders and the parameters needed
/// to stand up a fresh WebDriver session per request. Sessions are never
/// reused across renders: the per-request isolation invariant requires the
/// context be destroyed on every exit path, so each call creates, uses,
/// and tears down its own session.
pub struct RenderEngine {
    webdriver_url: String,
    headless: bool,
    semaphore: Arc<Semaphore>,
    wait_for_selector_timeout: Duration,
}

impl RenderEngine {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            webdriver_url: config.webdriver_url.clone(),
            headless: config.headless,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_screenshots)),
            wait_for_selector_timeout: Duration::from_millis(config.default_wait_for_selector_timeout),
        }
    }

    #[instrument(skip(self, params), fields(image_type = ?params.image_type))]
    pub async fn render(&self, params: &ResolvedParams) -> Result<ScreenshotResult, ServiceError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| ServiceError::Internal(format!("render semaphore closed: {}", e)))?;

        let raw_bytes = self.render_with_retries(params).await?;
        let encoded = self.encode(&raw_bytes, params)?;
        let (width, height) = dimensions::parse(&encoded, params.image_type);
        let size_bytes = encoded.len();

        info!(width, height, size_bytes, "render complete");
        Ok(ScreenshotResult {
            image: Some(BASE64.encode(&encoded)),
            image_type: Some(image_type_label(params.image_type).to_string()),
            width: Some(width),
            height: Some(height),
            size_bytes: Some(size_bytes),
            error: None,
        })
    }

    /// Retries transient browser failures (a crashed session, a momentarily
    /// unreachable WebDriver endpoint) with a fresh session per attempt,
    /// never reusing one that just failed.
    async fn render_with_retries(&self, params: &ResolvedParams) -> Result<Vec<u8>, ServiceError> {
        let page_load_strategy = render_config::page_load_strategy(params.wait_until);
        let viewport = (params.viewport.width, params.viewport.height);

        let mut last_error = None;
        for attempt in 0..render_config::MAX_RETRIES {
            debug!(attempt = attempt + 1, max = render_config::MAX_RETRIES, "starting fresh WebDriver session for render");
            let session = match client::create_client(
                &self.webdriver_url,
                viewport,
                self.headless,
                params.scale,
                page_load_strategy,
            )
            .await
            {
                Ok(session) => session,
                Err(e) => {
                    warn!("failed to start WebDriver session: {}", e);
                    last_error = Some(e);
                    if attempt + 1 < render_config::MAX_RETRIES {
                        sleep(render_config::RETRY_DELAY).await;
                    }
                    continue;
                }
            };

            let outcome = self.render_with_session(&session, params).await;

            if let Err(e) = session.close().await {
                warn!("error closing WebDriver session: {}", e);
            }

            match outcome {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    warn!("render attempt {}/{} failed: {}", attempt + 1, render_config::MAX_RETRIES, e);
                    let retryable = !matches!(e, ServiceError::SelectorNotFound(_) | ServiceError::Timeout(_));
                    last_error = Some(e);
                    if !retryable || attempt + 1 >= render_config::MAX_RETRIES {
                        break;
                    }
                    sleep(render_config::RETRY_DELAY).await;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ServiceError::Internal("render failed with no recorded error".to_string())))
    }

    async fn render_with_session(
        &self,
        client: &fantoccini::Client,
        params: &ResolvedParams,
    ) -> Result<Vec<u8>, ServiceError> {
        let css = combined_style_overrides(params);
        let html = style::inject_styles(&params.html, css.as_deref());
        let data_url = format!("data:text/html;base64,{}", BASE64.encode(html.as_bytes()));

        debug!(wait_until = ?params.wait_until, timeout_ms = params.timeout_ms, "loading document content");
        match tokio::time::timeout(Duration::from_millis(params.timeout_ms), client.goto(&data_url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(ServiceError::from(e)),
            Err(_) => return Err(ServiceError::Timeout(format!("navigation exceeded {}ms", params.timeout_ms))),
        }

        if params.wait_until == WaitUntil::Networkidle {
            // Egress is locked to data: URIs, so there is no real network to
            // settle; a short grace period stands in for network-idle.
            sleep(Duration::from_millis(250)).await;
        }

        if let Some(selector) = &params.wait_for_selector {
            if client
                .wait()
                .at_most(self.wait_for_selector_timeout)
                .for_element(Locator::Css(selector))
                .await
                .is_err()
            {
                return Err(ServiceError::SelectorNotFound(selector.clone()));
            }
        }

        self.capture(client, params).await
    }

    async fn capture(&self, client: &fantoccini::Client, params: &ResolvedParams) -> Result<Vec<u8>, ServiceError> {
        if params.clip.is_some() {
            return client.screenshot().await.map_err(ServiceError::from);
        }

        if let Some(selector) = &params.selector {
            let element = client
                .find(Locator::Css(selector))
                .await
                .map_err(|_| ServiceError::SelectorNotFound(selector.clone()))?;
            return element.screenshot().await.map_err(ServiceError::from);
        }

        if params.full_page {
            if let Ok(html_element) = client.find(Locator::Css("html")).await {
                if let Ok((_, _, _, content_height)) = html_element.rectangle().await {
                    let target_height = (content_height as u32).max(params.viewport.height);
                    if let Err(e) = client.set_window_size(params.viewport.width, target_height).await {
                        warn!("could not resize window for full-page capture: {}", e);
                    }
                }
            }
        }

        client.screenshot().await.map_err(ServiceError::from)
    }

    fn encode(&self, raw_png: &[u8], params: &ResolvedParams) -> Result<Vec<u8>, ServiceError> {
        let needs_reencode = params.clip.is_some() || params.image_type == ImageType::Jpeg;
        if !needs_reencode {
            return Ok(raw_png.to_vec());
        }

        let mut image = image::load_from_memory(raw_png)
            .map_err(|e| ServiceError::ScreenshotFailed(format!("failed to decode capture: {}", e)))?;

        if let Some(clip) = &params.clip {
            let (img_width, img_height) = image.dimensions();
            let x = (clip.x.max(0) as u32).min(img_width);
            let y = (clip.y.max(0) as u32).min(img_height);
            let width = (clip.width as u32).min(img_width.saturating_sub(x)).max(1);
            let height = (clip.height as u32).min(img_height.saturating_sub(y)).max(1);
            image = image.crop_imm(x, y, width, height);
        }

        let mut buf = Vec::new();
        let mut cursor = Cursor::new(&mut buf);
        match params.image_type {
            ImageType::Png => image
                .write_to(&mut cursor, ImageOutputFormat::Png)
                .map_err(|e| ServiceError::ScreenshotFailed(format!("failed to encode PNG: {}", e)))?,
            ImageType::Jpeg => image
                .to_rgb8()
                .write_to(&mut cursor, ImageOutputFormat::Jpeg(params.quality))
                .map_err(|e| ServiceError::ScreenshotFailed(format!("failed to encode JPEG: {}", e)))?,
        }

        Ok(buf)
    }
}

fn combined_style_overrides(params: &ResolvedParams) -> Option<String> {
    let mut css = params.style_overrides.clone().unwrap_or_default();
    if params.omit_background && params.image_type == ImageType::Png {
        css.push_str("\nhtml, body { background: transparent !important; }");
    }
    if css.trim().is_empty() {
        None
    } else {
        Some(css)
    }
}

fn image_type_label(image_type: ImageType) -> &'static str {
    match image_type {
        ImageType::Png => "png",
        ImageType::Jpeg => "jpeg",
    }
}
