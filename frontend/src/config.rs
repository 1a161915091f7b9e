use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Placeholder left in place until the spreadsheet script is deployed.
pub const SCRIPT_URL_PLACEHOLDER: &str = "YOUR_GOOGLE_APPS_SCRIPT_URL_HERE";

const SCRIPT_URL_ENV: &str = "VACATION_MANAGER_SCRIPT_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub script_url: Option<String>,
}

static SCRIPT_URL: OnceLock<String> = OnceLock::new();

fn compiled_default() -> String {
    option_env!("VACATION_MANAGER_SCRIPT_URL")
        .unwrap_or(SCRIPT_URL_PLACEHOLDER)
        .to_string()
}

pub fn is_configured(url: &str) -> bool {
    let url = url.trim();
    !url.is_empty() && !url.contains(SCRIPT_URL_PLACEHOLDER)
}

fn cache_script_url(value: &str) -> String {
    let value = value.to_string();
    let _ = SCRIPT_URL.set(value.clone());
    value
}

#[cfg(target_arch = "wasm32")]
fn read_global(global: &str, keys: &[&str]) -> Option<String> {
    let w = web_sys::window()?;
    let any = js_sys::Reflect::get(&w, &global.into()).ok()?;
    if any.is_undefined() || any.is_null() {
        return None;
    }
    let obj = js_sys::Object::from(any);
    keys.iter().find_map(|key| {
        js_sys::Reflect::get(&obj, &(*key).into())
            .ok()
            .filter(|v| !v.is_undefined() && !v.is_null())
            .and_then(|v| v.as_string())
    })
}

#[cfg(target_arch = "wasm32")]
fn snapshot_from_globals() -> Option<String> {
    // window.__VACATION_MANAGER_ENV = { SCRIPT_URL: "..." } (env.js) wins over
    // window.__VACATION_MANAGER_CONFIG = { script_url: "..." }.
    read_global("__VACATION_MANAGER_ENV", &["SCRIPT_URL", "script_url"])
        .or_else(|| read_global("__VACATION_MANAGER_CONFIG", &["script_url", "SCRIPT_URL"]))
}

#[cfg(target_arch = "wasm32")]
async fn fetch_runtime_config() -> Option<RuntimeConfig> {
    let origin = web_sys::window()?.location().origin().ok()?;
    let resp = reqwest::get(format!("{}/config.json", origin)).await.ok()?;
    if !resp.status().is_success() {
        return None;
    }
    resp.json::<RuntimeConfig>().await.ok()
}

#[cfg(not(target_arch = "wasm32"))]
fn snapshot_from_globals() -> Option<String> {
    std::env::var(SCRIPT_URL_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[cfg(not(target_arch = "wasm32"))]
async fn fetch_runtime_config() -> Option<RuntimeConfig> {
    None
}

pub async fn await_script_url() -> String {
    if let Some(cached) = SCRIPT_URL.get() {
        return cached.clone();
    }
    if let Some(existing) = snapshot_from_globals() {
        return cache_script_url(&existing);
    }
    if let Some(url) = fetch_runtime_config().await.and_then(|cfg| cfg.script_url) {
        return cache_script_url(&url);
    }
    log::debug!(
        "{} not provided at runtime, using the compiled-in endpoint",
        SCRIPT_URL_ENV
    );
    cache_script_url(&compiled_default())
}

pub async fn init() {
    let url = await_script_url().await;
    if !is_configured(&url) {
        log::warn!("Spreadsheet script URL is not configured");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_and_blank_urls_are_not_configured() {
        assert!(!is_configured(""));
        assert!(!is_configured("   "));
        assert!(!is_configured(SCRIPT_URL_PLACEHOLDER));
        assert!(!is_configured(&format!(
            "https://script.google.com/{}",
            SCRIPT_URL_PLACEHOLDER
        )));
        assert!(is_configured("https://script.google.com/macros/s/abc/exec"));
    }

    #[test]
    fn runtime_config_reads_optional_script_url() {
        let cfg: RuntimeConfig =
            serde_json::from_str(r#"{"script_url":"https://example.test/exec"}"#).unwrap();
        assert_eq!(cfg.script_url.as_deref(), Some("https://example.test/exec"));
        let empty: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert!(empty.script_url.is_none());
    }
}
