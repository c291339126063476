use std::time::Duration;

pub const MAX_RETRIES: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_secs(1);
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Chrome CLI flags: a standard headless-hardening set, plus
/// `--host-resolver-rules` pinning every hostname to an unroutable address —
/// the closest approximation WebDriver's capability surface offers to a
/// CDP-native per-request network hook, since the render engine must refuse
/// outbound fetches beyond `data:` URIs.
pub fn chrome_arguments(headless: bool) -> Vec<String> {
    vec![
        "--no-sandbox",
        "--disable-gpu",
        "--disable-dev-shm-usage",
        "--disable-extensions",
        "--disable-notifications",
        "--disable-infobars",
        "--disable-popup-blocking",
        "--disable-background-networking",
        "--disable-background-timer-throttling",
        "--disable-backgrounding-occluded-windows",
        "--disable-breakpad",
        "--disable-component-extensions-with-background-pages",
        "--disable-features=TranslateUI",
        "--disable-ipc-flooding-protection",
        "--disable-renderer-backgrounding",
        "--enable-features=NetworkService,NetworkServiceInProcess",
        "--force-color-profile=srgb",
        "--metrics-recording-only",
        "--mute-audio",
        "--host-resolver-rules=MAP * 0.0.0.0",
        if headless { "--headless=new" } else { "" },
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .map(String::from)
    .collect()
}

pub fn chrome_device_scale_argument(scale: f64) -> String {
    format!("--force-device-scale-factor={}", scale)
}

/// Content settings. `javascript` is forced to `2` (block) — untrusted HTML
/// is never allowed to execute script.
pub fn chrome_preferences() -> serde_json::Map<String, serde_json::Value> {
    let mut prefs = serde_json::Map::new();
    prefs.insert("profile.default_content_setting_values.images".to_string(), 1.into());
    prefs.insert("profile.managed_default_content_settings.javascript".to_string(), 2.into());
    prefs.insert("profile.managed_default_content_settings.plugins".to_string(), 2.into());
    prefs.insert("profile.managed_default_content_settings.popups".to_string(), 2.into());
    prefs.insert("profile.managed_default_content_settings.geolocation".to_string(), 2.into());
    prefs.insert("profile.managed_default_content_settings.media_stream".to_string(), 2.into());
    prefs
}

/// Maps `wait_until` to Chrome's `pageLoadStrategy` session capability.
/// WebDriver has no native `networkidle` concept; since egress is already
/// locked to `data:` URIs there is no live network to go idle on, so it
/// collapses to `normal` (full `load` event) — see DESIGN.md.
pub fn page_load_strategy(wait_until: crate::model::WaitUntil) -> &'static str {
    use crate::model::WaitUntil::*;
    match wait_until {
        Domcontentloaded => "eager",
        Load | Networkidle => "normal",
    }
}
