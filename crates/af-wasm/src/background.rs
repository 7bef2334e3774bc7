//! Background page: nudge the content script after each full page load

use js_sys::{Array, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};

use crate::chrome::{add_listener, call_method, js_error_message, lookup};

const RUN_ALL_ACTION: &str = "executeAllAutoRules";

pub fn start() -> Result<(), JsValue> {
    let callback = Closure::wrap(Box::new(|tab_id: JsValue, change_info: JsValue, tab: JsValue| {
        if !is_complete_load(&change_info, &tab) {
            return;
        }
        if let Err(e) = relay_run(&tab_id) {
            log::debug!("Could not message tab: {}", js_error_message(&e));
        }
    }) as Box<dyn FnMut(JsValue, JsValue, JsValue)>);

    add_listener(&["chrome", "tabs", "onUpdated"], callback.as_ref().unchecked_ref())?;
    callback.forget();
    log::debug!("Background relay started");
    Ok(())
}

fn is_complete_load(change_info: &JsValue, tab: &JsValue) -> bool {
    let status = Reflect::get(change_info, &"status".into()).ok().and_then(|v| v.as_string());
    let has_url = Reflect::get(tab, &"url".into())
        .ok()
        .and_then(|v| v.as_string())
        .map_or(false, |url| !url.is_empty());
    status.as_deref() == Some("complete") && has_url
}

fn relay_run(tab_id: &JsValue) -> Result<(), JsValue> {
    let tabs = lookup(&["chrome", "tabs"])?;
    let message = js_sys::Object::new();
    Reflect::set(&message, &"action".into(), &JsValue::from_str(RUN_ALL_ACTION))?;

    let sent = call_method(&tabs, "sendMessage", &Array::of2(tab_id, &message))?;
    // Pages without the content script reject; nothing to do about it
    if let Ok(promise) = sent.dyn_into::<js_sys::Promise>() {
        spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                log::trace!("Tab did not answer: {}", js_error_message(&e));
            }
        });
    }
    Ok(())
}
