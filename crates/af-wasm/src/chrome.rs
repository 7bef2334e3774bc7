//! Access to the `chrome.*` extension APIs through `js_sys::Reflect`

use af_core::store::{storage_keys, RuleStore, StoredValues};
use af_core::{RuleSet, StoreError};
use async_trait::async_trait;
use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

/// Best-effort message of a thrown JS value.
pub fn js_error_message(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// Walk a property path from the global object, e.g. `chrome.storage.local`.
pub fn lookup(path: &[&str]) -> Result<JsValue, JsValue> {
    let mut current: JsValue = js_sys::global().into();
    for key in path {
        current = Reflect::get(&current, &JsValue::from_str(key))?;
        if current.is_undefined() || current.is_null() {
            return Err(JsValue::from_str(&format!("'{}' is not available", path.join("."))));
        }
    }
    Ok(current)
}

/// Call `target[method](...args)`.
pub fn call_method(target: &JsValue, method: &str, args: &Array) -> Result<JsValue, JsValue> {
    let function: Function = Reflect::get(target, &JsValue::from_str(method))?.dyn_into()?;
    function.apply(target, args)
}

/// `event.addListener(callback)` for a `chrome.*` event object.
pub fn add_listener(path: &[&str], callback: &Function) -> Result<(), JsValue> {
    let event = lookup(path)?;
    call_method(&event, "addListener", &Array::of1(callback))?;
    Ok(())
}

/// `chrome.storage.local`, read as one batched `get`.
pub struct ChromeStore;

impl ChromeStore {
    async fn fetch(&self) -> Result<JsValue, JsValue> {
        let local = lookup(&["chrome", "storage", "local"])?;
        let keys: Array = storage_keys().iter().map(|key| JsValue::from_str(key)).collect();
        let promise: Promise = call_method(&local, "get", &Array::of1(&keys))?.dyn_into()?;
        JsFuture::from(promise).await
    }
}

#[async_trait(?Send)]
impl RuleStore for ChromeStore {
    async fn load(&self) -> Result<RuleSet, StoreError> {
        let raw = self
            .fetch()
            .await
            .map_err(|e| StoreError::Unavailable(js_error_message(&e)))?;
        let values: StoredValues = serde_wasm_bindgen::from_value(raw)
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        values.into_rule_set()
    }
}

/// Whether a `chrome.storage.onChanged` notification touches our keys.
pub fn is_rule_change(changes: &JsValue, area_name: &str) -> bool {
    area_name == "local"
        && storage_keys()
            .iter()
            .any(|key| Reflect::has(changes, &JsValue::from_str(key)).unwrap_or(false))
}
