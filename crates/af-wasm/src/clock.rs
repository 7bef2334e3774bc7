use std::time::Duration;

use af_core::Clock;
use async_trait::async_trait;
use js_sys::{Function, Promise};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

/// `performance.now()` and `setTimeout` based clock.
///
/// `performance.now()` is monotonic, so deadlines survive wall-clock changes.
/// Without a window (no `Performance`) it falls back to `Date.now()`.
pub struct BrowserClock;

pub fn to_timeout_ms(duration: Duration) -> i32 {
    i32::try_from(duration.as_millis()).unwrap_or(i32::MAX)
}

#[async_trait(?Send)]
impl Clock for BrowserClock {
    fn now(&self) -> Duration {
        let millis = web_sys::window()
            .and_then(|window| window.performance())
            .map(|performance| performance.now())
            .unwrap_or_else(js_sys::Date::now);
        Duration::from_secs_f64(millis.max(0.0) / 1000.0)
    }

    async fn sleep(&self, duration: Duration) {
        let millis = to_timeout_ms(duration);
        let promise = Promise::new(&mut |resolve: Function, _reject: Function| {
            let scheduled = web_sys::window().map(|window| {
                window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
            });
            if !matches!(scheduled, Some(Ok(_))) {
                let _ = resolve.call0(&JsValue::UNDEFINED);
            }
        });
        let _ = JsFuture::from(promise).await;
    }
}
