use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    Load,
    Domcontentloaded,
    Networkidle,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Png,
    Jpeg,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Base64,
    Binary,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClipRegion {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Wire-level screenshot parameters, as received over JSON-RPC. Every field
/// is optional on the wire, including `html` — its absence is reported as
/// a validation detail by [`resolve`] rather than a deserialization failure,
/// so a missing/empty `html` always surfaces as `-32602 INVALID_PARAMS`
/// with a `"html: ..."` detail instead of a generic parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotParams {
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub clip: Option<ClipRegion>,
    #[serde(default)]
    pub full_page: bool,
    #[serde(default)]
    pub viewport: Option<Viewport>,
    #[serde(default)]
    pub wait_until: Option<WaitUntil>,
    #[serde(default)]
    pub wait_for_selector: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub extra_http_headers: HashMap<String, String>,
    #[serde(default)]
    pub style_overrides: Option<String>,
    #[serde(default)]
    pub image_type: Option<ImageType>,
    #[serde(default)]
    pub quality: Option<u8>,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub omit_background: bool,
    #[serde(default)]
    pub encoding: Option<Encoding>,
}

/// `ScreenshotParams` after defaulting and bounds-checking. This is what the
/// render engine consumes; it can never describe an out-of-range request.
#[derive(Debug, Clone)]
pub struct ResolvedParams {
    pub html: String,
    pub selector: Option<String>,
    pub clip: Option<ClipRegion>,
    pub full_page: bool,
    pub viewport: Viewport,
    pub wait_until: WaitUntil,
    pub wait_for_selector: Option<String>,
    pub timeout_ms: u64,
    pub extra_http_headers: HashMap<String, String>,
    pub style_overrides: Option<String>,
    pub image_type: ImageType,
    pub quality: u8,
    pub scale: f64,
    pub omit_background: bool,
}

impl ScreenshotParams {
    /// Validates and resolves defaults. On failure, returns the list of
    /// `"loc: msg"` strings that populate `error.data.details` at the
    /// gateway.
    pub fn resolve(self, defaults: &AppConfig) -> Result<ResolvedParams, Vec<String>> {
        let mut errors = Vec::new();

        let html = self.html.as_deref().unwrap_or("").trim().to_string();
        if html.is_empty() {
            errors.push("html: field required and must not be empty".to_string());
        }

        let viewport = self.viewport.unwrap_or(Viewport {
            width: defaults.viewport_width,
            height: defaults.viewport_height,
        });
        if !(1..=7680).contains(&viewport.width) {
            errors.push("viewport.width: ensure this value is between 1 and 7680".to_string());
        }
        if !(1..=4320).contains(&viewport.height) {
            errors.push("viewport.height: ensure this value is between 1 and 4320".to_string());
        }

        if let Some(clip) = &self.clip {
            if clip.x < 0 {
                errors.push("clip.x: ensure this value is greater than or equal to 0".to_string());
            }
            if clip.y < 0 {
                errors.push("clip.y: ensure this value is greater than or equal to 0".to_string());
            }
            if clip.width <= 0 {
                errors.push("clip.width: ensure this value is greater than 0".to_string());
            }
            if clip.height <= 0 {
                errors.push("clip.height: ensure this value is greater than 0".to_string());
            }
        }

        let timeout_ms = self.timeout_ms.unwrap_or(defaults.default_timeout_ms);
        if timeout_ms > 120_000 {
            errors.push("timeout_ms: ensure this value is less than or equal to 120000".to_string());
        }

        let quality = self.quality.unwrap_or(defaults.default_image_quality);
        if !(1..=100).contains(&quality) {
            errors.push("quality: ensure this value is between 1 and 100".to_string());
        }

        let scale = self.scale.unwrap_or(1.0);
        if !(0.1..=4.0).contains(&scale) {
            errors.push("scale: ensure this value is between 0.1 and 4.0".to_string());
        }

        let image_type = self.image_type.unwrap_or(match defaults.default_image_type.as_str() {
            "jpeg" => ImageType::Jpeg,
            _ => ImageType::Png,
        });

        let wait_until = self.wait_until.unwrap_or(match defaults.default_wait_until.as_str() {
            "load" => WaitUntil::Load,
            "domcontentloaded" => WaitUntil::Domcontentloaded,
            _ => WaitUntil::Networkidle,
        });

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ResolvedParams {
            html,
            selector: self.selector,
            clip: self.clip,
            full_page: self.full_page,
            viewport,
            wait_until,
            wait_for_selector: self.wait_for_selector,
            timeout_ms,
            extra_http_headers: self.extra_http_headers,
            style_overrides: self.style_overrides,
            image_type,
            quality,
            scale,
            omit_background: self.omit_background,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Success,
    Failed,
}

/// Outcome of a render. `image` is nulled out once it has been delivered
/// through the result mailbox — it never survives on the long-lived
/// status key. Fields are always serialized, even when `None`: a caller
/// checking for key presence (rather than value) must see the same shape
/// on every path, e.g. `"image": null` while a job is still pending.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScreenshotResult {
    pub image: Option<String>,
    pub image_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub size_bytes: Option<usize>,
    pub error: Option<String>,
}

impl ScreenshotResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    /// Returns a copy with `image` nulled — the "use once, then forget"
    /// transform applied before the status key is persisted.
    pub fn without_image(&self) -> Self {
        Self {
            image: None,
            ..self.clone()
        }
    }
}

/// The persisted record for one job, keyed by `job_id`. `result` is always
/// serialized, even as `null` while a job is `pending`/`processing`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: String,
    pub status: JobStatus,
    pub created_at: f64,
    pub updated_at: f64,
    pub result: Option<ScreenshotResult>,
}

/// The queue entry a worker pops: the job identity plus the raw (still
/// wire-shaped) params it must re-validate defensively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub job_id: String,
    pub params: ScreenshotParams,
}
