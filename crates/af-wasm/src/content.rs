//! Content-script wiring
//!
//! One engine per page. Four things can start a pass:
//!
//! - the initial run, once the document has been parsed
//! - an `executeAllAutoRules` message (sent by the background page after a full load)
//! - an `executeRule` message from the popup
//! - a settled in-page URL change seen by the mutation observer

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use af_core::watcher::{run_settled, NavigationWatcher, Trigger};
use af_core::{decode_message, Document, Engine, EngineConfig, EngineError, Inbound, Reply, RunStatus, RunSummary};
use js_sys::{Array, Function, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{MutationObserver, MutationObserverInit, Window};

use crate::chrome::{add_listener, is_rule_change, ChromeStore};
use crate::clock::{to_timeout_ms, BrowserClock};
use crate::dom::WebDocument;

pub type ContentEngine = Engine<WebDocument, ChromeStore, BrowserClock>;

pub fn start(config: EngineConfig) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("No document"))?;

    let engine = Rc::new(Engine::new(
        WebDocument::new(window.clone(), document.clone()),
        ChromeStore,
        BrowserClock,
        config,
    ));

    listen_for_commands(Rc::clone(&engine))?;
    listen_for_rule_changes(Rc::clone(&engine))?;
    watch_navigation(&window, &document, Rc::clone(&engine))?;
    schedule_initial_run(&document, engine)?;

    log::debug!("Content script started");
    Ok(())
}

/// Log the outcome of a pass nobody else is waiting on.
fn report(origin: &str, result: Result<RunSummary, EngineError>) {
    match result {
        Ok(summary) if summary.status == RunStatus::Completed => {
            log::info!("{}: ran {} rule(s)", origin, summary.executed);
            for execution in summary.results.iter().filter(|r| !r.success || r.failed > 0) {
                log::warn!(
                    "{}: rule {} found={} executed={} failed={} {}",
                    origin,
                    execution.rule_id,
                    execution.found,
                    execution.executed,
                    execution.failed,
                    execution.error.as_deref().unwrap_or("")
                );
            }
        }
        Ok(summary) => log::debug!("{}: {}", origin, summary.message.unwrap_or_default()),
        Err(e) => log::error!("{}: {}", origin, e),
    }
}

fn run_in_background(engine: Rc<ContentEngine>, origin: &'static str) {
    spawn_local(async move {
        report(origin, engine.run_matching_rules().await);
    });
}

// =============================================================================
// Messages
// =============================================================================

fn send_reply(send_response: &Function, reply: &Reply) {
    if let Some(error) = &reply.error {
        log::warn!("Command failed: {}", error);
    }
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    let payload = reply.serialize(&serializer).unwrap_or(JsValue::UNDEFINED);
    let _ = send_response.call1(&JsValue::UNDEFINED, &payload);
}

fn listen_for_commands(engine: Rc<ContentEngine>) -> Result<(), JsValue> {
    let callback = Closure::wrap(Box::new(
        move |message: JsValue, _sender: JsValue, send_response: Function| -> JsValue {
            let message: serde_json::Value = match serde_wasm_bindgen::from_value(message) {
                Ok(message) => message,
                Err(_) => return JsValue::FALSE,
            };
            let command = match decode_message(message) {
                Inbound::Command(command) => command,
                Inbound::Rejected(reply) => {
                    send_reply(&send_response, &reply);
                    return JsValue::FALSE;
                }
                // Not ours; let other listeners answer
                Inbound::Foreign => return JsValue::FALSE,
            };

            let engine = Rc::clone(&engine);
            spawn_local(async move {
                let reply = engine.handle_command(command).await;
                send_reply(&send_response, &reply);
            });

            // Keep the channel open for the async reply
            JsValue::TRUE
        },
    ) as Box<dyn FnMut(JsValue, JsValue, Function) -> JsValue>);

    add_listener(&["chrome", "runtime", "onMessage"], callback.as_ref().unchecked_ref())?;
    // Lives as long as the page
    callback.forget();
    Ok(())
}

fn listen_for_rule_changes(engine: Rc<ContentEngine>) -> Result<(), JsValue> {
    let callback = Closure::wrap(Box::new(move |changes: JsValue, area_name: JsValue| {
        let area = area_name.as_string().unwrap_or_default();
        if is_rule_change(&changes, &area) {
            log::debug!("Stored rules changed, dropping cache");
            engine.invalidate_cache();
        }
    }) as Box<dyn FnMut(JsValue, JsValue)>);

    add_listener(&["chrome", "storage", "onChanged"], callback.as_ref().unchecked_ref())?;
    callback.forget();
    Ok(())
}

// =============================================================================
// Navigation
// =============================================================================

fn watch_navigation(
    window: &Window,
    document: &web_sys::Document,
    engine: Rc<ContentEngine>,
) -> Result<(), JsValue> {
    let watcher = Rc::new(RefCell::new(NavigationWatcher::new(
        engine.document().current_url(),
        engine.config().debounce(),
    )));
    let armed: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
    let timer_window = window.clone();

    let callback = Closure::wrap(Box::new(move || {
        let url = engine.document().current_url();
        let trigger = watcher.borrow_mut().on_mutation(&url);
        let (generation, delay) = match trigger {
            Trigger::Arm { generation, delay } => (generation, delay),
            Trigger::Unchanged => return,
        };

        if let Some(handle) = armed.take() {
            timer_window.clear_timeout_with_handle(handle);
        }

        let engine = Rc::clone(&engine);
        let watcher = Rc::clone(&watcher);
        let fire = Closure::once_into_js(move || {
            spawn_local(async move {
                if let Some(result) = run_settled(&watcher, &engine, generation).await {
                    report("navigation", result);
                }
            });
        });

        match timer_window.set_timeout_with_callback_and_timeout_and_arguments_0(
            fire.unchecked_ref(),
            to_timeout_ms(delay),
        ) {
            Ok(handle) => armed.set(Some(handle)),
            Err(e) => log::error!("Failed to arm navigation timer: {:?}", e),
        }
    }) as Box<dyn FnMut()>);

    let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
    // Direct children of the document only
    let options = MutationObserverInit::new();
    options.set_child_list(true);
    options.set_subtree(false);
    observer.observe_with_options(document, &options)?;

    callback.forget();
    Ok(())
}

fn schedule_initial_run(document: &web_sys::Document, engine: Rc<ContentEngine>) -> Result<(), JsValue> {
    if document.ready_state() != "loading" {
        run_in_background(engine, "page load");
        return Ok(());
    }

    let on_ready = Closure::once_into_js(move || run_in_background(engine, "page load"));
    let options = js_sys::Object::new();
    Reflect::set(&options, &"once".into(), &JsValue::TRUE)?;
    crate::chrome::call_method(
        document,
        "addEventListener",
        &Array::of3(&JsValue::from_str("DOMContentLoaded"), &on_ready, &options),
    )?;
    Ok(())
}
