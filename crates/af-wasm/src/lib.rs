//! WebAssembly bindings for AutoFill
//!
//! `start_content_script` runs inside every page, `start_background` in the
//! extension's background page. The remaining exports are pure helpers the
//! popup uses for URL checks and rule file import/export.

mod background;
mod chrome;
mod clock;
mod content;
mod dom;
mod logger;

use std::sync::atomic::{AtomicBool, Ordering};

use af_core::url::matching_pattern;
use af_core::{EngineConfig, Rule};
use af_rules::{backup_file_name, build_bundle, dedupe_rules, parse_rule_bundle, validate_rules};
use js_sys::{Array, Object, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use clock::BrowserClock;
pub use dom::{WebDocument, WebElement};

static CONTENT_STARTED: AtomicBool = AtomicBool::new(false);
static BACKGROUND_STARTED: AtomicBool = AtomicBool::new(false);

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value
        .serialize(&serializer)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize: {}", e)))
}

fn read_config(config: JsValue) -> Result<EngineConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(EngineConfig::default());
    }
    serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))
}

/// Start the per-page engine. Later calls are ignored.
#[wasm_bindgen]
pub fn start_content_script(config: JsValue) -> Result<(), JsValue> {
    let config = read_config(config)?;
    if CONTENT_STARTED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    console_error_panic_hook::set_once();
    logger::init(config.log_level_filter());

    content::start(config).map_err(|e| {
        CONTENT_STARTED.store(false, Ordering::SeqCst);
        e
    })
}

#[wasm_bindgen]
pub fn start_background() -> Result<(), JsValue> {
    if BACKGROUND_STARTED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    console_error_panic_hook::set_once();
    logger::init(log::LevelFilter::Info);

    background::start().map_err(|e| {
        BACKGROUND_STARTED.store(false, Ordering::SeqCst);
        e
    })
}

#[wasm_bindgen]
pub fn normalize_url(url: &str) -> String {
    af_core::normalize(url).into_owned()
}

#[wasm_bindgen]
pub fn matches_url(current_url: &str, pattern: &str) -> bool {
    af_core::matches(current_url, pattern)
}

/// First of the rule's patterns matching `current_url`, or `undefined`.
#[wasm_bindgen]
pub fn rule_matches_url(rule: JsValue, current_url: &str) -> Result<Option<String>, JsValue> {
    let rule: Rule = serde_wasm_bindgen::from_value(rule)
        .map_err(|e| JsValue::from_str(&format!("Invalid rule: {}", e)))?;
    Ok(matching_pattern(&rule, current_url).map(str::to_string))
}

/// Parse an imported rule file.
///
/// Returns `{ rules, issues, deduped }`. Unreadable records and rule problems
/// are reported as issue strings and never reject the import; duplicate ids
/// keep their first record.
#[wasm_bindgen]
pub fn parse_rule_file(text: &str) -> Result<JsValue, JsValue> {
    let imported = parse_rule_bundle(text).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let issues = Array::new();
    for skipped in &imported.skipped {
        issues.push(&JsValue::from_str(&skipped.to_string()));
    }
    for issue in validate_rules(&imported.bundle.rules) {
        issues.push(&JsValue::from_str(&issue.to_string()));
    }

    let mut rules = imported.bundle.rules;
    let stats = dedupe_rules(&mut rules);

    let result = Object::new();
    Reflect::set(&result, &"rules".into(), &to_js(&rules)?)?;
    Reflect::set(&result, &"issues".into(), &issues)?;
    Reflect::set(&result, &"deduped".into(), &JsValue::from(stats.deduped as u32))?;
    Ok(result.into())
}

/// Build a backup download: `{ fileName, json }`.
#[wasm_bindgen]
pub fn export_rule_file(rules: JsValue, exported_at: &str) -> Result<JsValue, JsValue> {
    let rules: Vec<Rule> = serde_wasm_bindgen::from_value(rules)
        .map_err(|e| JsValue::from_str(&format!("Invalid rules: {}", e)))?;

    let bundle = build_bundle(&rules, exported_at);
    let json = serde_json::to_string_pretty(&bundle)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize: {}", e)))?;

    let result = Object::new();
    Reflect::set(&result, &"fileName".into(), &JsValue::from_str(&backup_file_name(exported_at)))?;
    Reflect::set(&result, &"json".into(), &JsValue::from_str(&json))?;
    Ok(result.into())
}
