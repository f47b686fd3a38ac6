use std::{cell::RefCell, collections::HashMap, rc::Rc};

use distance_tracker_lib::{
    error::KeepAwakeError,
    providers::{KeepAwake, KeepAwakeHandle},
    status::StatusMessage,
};
use gloo_console::{error, info};
use gloo_utils::window;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::js_sys::{Function, Promise, Reflect};
use yew::Callback;

use crate::web_location::js_has;

/// Pending requests map to None until the browser hands out the sentinel.
type Sentinels = Rc<RefCell<HashMap<u64, Option<JsValue>>>>;

/// Screen Wake Lock API. The browser answers `request` with a promise, so a
/// denial usually arrives after `acquire` has returned. It is then reported
/// through `on_denied` instead of as an `acquire` error.
pub struct WebWakeLock {
    next_id: u64,
    sentinels: Sentinels,
    on_denied: Callback<StatusMessage>,
}

impl WebWakeLock {
    pub fn new(on_denied: Callback<StatusMessage>) -> Self {
        Self {
            next_id: 0,
            sentinels: Rc::new(RefCell::new(HashMap::new())),
            on_denied,
        }
    }
}

impl KeepAwake for WebWakeLock {
    fn acquire(&mut self) -> Result<KeepAwakeHandle, KeepAwakeError> {
        let navigator = window().navigator();
        if !js_has(&navigator, "wakeLock") {
            return Err(KeepAwakeError::Unsupported);
        }

        let promise = request_screen_lock(&navigator).map_err(|err| KeepAwakeError::Denied(describe(&err)))?;

        self.next_id += 1;
        let id = self.next_id;
        self.sentinels.borrow_mut().insert(id, None);

        let sentinels = self.sentinels.clone();
        let on_denied = self.on_denied.clone();
        spawn_local(async move {
            match JsFuture::from(promise).await {
                Ok(sentinel) => {
                    let mut sentinels = sentinels.borrow_mut();
                    match sentinels.get_mut(&id) {
                        Some(slot) => {
                            info!("Screen wake lock acquired");
                            *slot = Some(sentinel);
                        }
                        // Released while the request was in flight
                        None => release_sentinel(&sentinel),
                    }
                }
                Err(err) => {
                    error!(format!("Screen wake lock denied: {}", describe(&err)));
                    let message = rejected(&mut sentinels.borrow_mut(), id);
                    if let Some(message) = message {
                        on_denied.emit(message);
                    }
                }
            }
        });

        Ok(KeepAwakeHandle(id))
    }

    fn release(&mut self, handle: KeepAwakeHandle) {
        if let Some(Some(sentinel)) = self.sentinels.borrow_mut().remove(&handle.0) {
            release_sentinel(&sentinel);
        }
    }
}

/// Forgets request `id`. The user only hears about the denial while the lock
/// is still wanted, not after it was released in the meantime.
fn rejected(sentinels: &mut HashMap<u64, Option<JsValue>>, id: u64) -> Option<StatusMessage> {
    sentinels.remove(&id).map(|_| StatusMessage::KeepAwakeUnavailable)
}

fn request_screen_lock(navigator: &JsValue) -> Result<Promise, JsValue> {
    let wake_lock = Reflect::get(navigator, &"wakeLock".into())?;
    let request: Function = Reflect::get(&wake_lock, &"request".into())?.dyn_into()?;
    request.call1(&wake_lock, &"screen".into())?.dyn_into()
}

fn release_sentinel(sentinel: &JsValue) {
    let released = Reflect::get(sentinel, &"release".into())
        .and_then(|release| release.dyn_into::<Function>().map_err(JsValue::from))
        .and_then(|release| release.call0(sentinel));

    if let Err(err) = released {
        error!(format!("Failed to release screen wake lock: {}", describe(&err)));
    }
}

fn describe(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| Reflect::get(err, &"name".into()).ok().and_then(|name| name.as_string()))
        .unwrap_or_else(|| format!("{err:?}"))
}
