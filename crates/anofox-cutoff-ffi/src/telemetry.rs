//! PostHog telemetry integration for anonymous usage tracking.
//!
//! Opt-out telemetry recording which forecaster models are constructed.
//! Users can disable telemetry via:
//! - Environment variable: DATAZOO_DISABLE_TELEMETRY=1
//! - Calling `anofox_cutoff_telemetry_init(false, NULL)`
//!
//! Telemetry is automatically disabled in CI environments (detected via common CI
//! environment variables like CI, GITHUB_ACTIONS, GITLAB_CI, etc.).

use crate::conversion::c_str_to_str;
use std::env;
use std::ffi::c_char;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

#[cfg(feature = "telemetry")]
use std::thread;

/// Global telemetry enabled flag
static TELEMETRY_ENABLED: AtomicBool = AtomicBool::new(true);

/// PostHog API key
static TELEMETRY_KEY: OnceLock<String> = OnceLock::new();

/// Anonymous distinct ID (generated once per session)
#[cfg(feature = "telemetry")]
static DISTINCT_ID: OnceLock<String> = OnceLock::new();

/// Environment variables set by common CI systems.
const CI_ENV_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "TRAVIS",
    "JENKINS_URL",
    "BUILDKITE",
    "TEAMCITY_VERSION",
    "TF_BUILD",
    "CODEBUILD_BUILD_ID",
];

/// Detects if the code is running in a CI environment.
pub fn is_ci_environment() -> bool {
    CI_ENV_VARS.iter().any(|var| env::var(var).is_ok())
}

/// Initialize telemetry with the given settings.
///
/// # Arguments
/// * `enabled` - Whether telemetry is enabled
/// * `api_key` - Optional PostHog API key
pub fn init_telemetry(enabled: bool, api_key: Option<&str>) {
    if env::var("DATAZOO_DISABLE_TELEMETRY").is_ok() || is_ci_environment() {
        TELEMETRY_ENABLED.store(false, Ordering::SeqCst);
        return;
    }

    TELEMETRY_ENABLED.store(enabled, Ordering::SeqCst);

    if let Some(key) = api_key.filter(|k| !k.is_empty()) {
        let _ = TELEMETRY_KEY.set(key.to_string());
    }

    #[cfg(feature = "telemetry")]
    {
        let _ = DISTINCT_ID.set(uuid::Uuid::new_v4().to_string());
    }
}

/// Check if telemetry is enabled.
pub fn is_enabled() -> bool {
    TELEMETRY_ENABLED.load(Ordering::SeqCst)
}

/// Capture a telemetry event.
///
/// Events are sent from a background thread; without an API key nothing is sent.
#[cfg(feature = "telemetry")]
pub fn capture_event(event: &str, properties: serde_json::Value) {
    if !is_enabled() {
        return;
    }

    let api_key = match TELEMETRY_KEY.get() {
        Some(key) if !key.is_empty() => key.clone(),
        _ => return,
    };

    let distinct_id = DISTINCT_ID.get().cloned().unwrap_or_default();
    let event_name = event.to_string();

    thread::spawn(move || {
        let mut props = serde_json::Map::new();
        props.insert("$lib".into(), "anofox-cutoff-rust".into());
        props.insert("$lib_version".into(), env!("CARGO_PKG_VERSION").into());
        if let serde_json::Value::Object(extra) = properties {
            props.extend(extra);
        }

        let payload = serde_json::json!({
            "api_key": api_key,
            "event": event_name,
            "properties": props,
            "distinct_id": distinct_id,
        });

        let _ = ureq::post("https://app.posthog.com/capture")
            .set("Content-Type", "application/json")
            .send_json(payload);
    });
}

/// No-op capture when telemetry feature is disabled.
#[cfg(not(feature = "telemetry"))]
pub fn capture_event<T>(_event: &str, _properties: T) {}

/// Capture construction of a forecaster.
pub fn capture_forecaster_created(model: &str) {
    #[cfg(feature = "telemetry")]
    {
        let properties = serde_json::json!({
            "model": model,
            "platform": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        });
        capture_event("forecaster_created", properties);
    }
    #[cfg(not(feature = "telemetry"))]
    let _ = model;
}

// ============================================================================
// FFI Exports
// ============================================================================

/// Initialize telemetry from C/C++.
///
/// # Safety
/// The api_key pointer must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn anofox_cutoff_telemetry_init(enabled: bool, api_key: *const c_char) {
    let key = c_str_to_str(api_key, "");
    init_telemetry(enabled, Some(key));
}

/// Check if telemetry is enabled.
#[no_mangle]
pub extern "C" fn anofox_cutoff_telemetry_is_enabled() -> bool {
    is_enabled()
}
