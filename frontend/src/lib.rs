use leptos::*;

pub mod api;
pub mod config;
pub mod state;
pub mod utils;

use state::{auth::AuthProvider, requests::RequestProvider};

/// Session and request contexts, in the order the request context needs them.
#[component]
pub fn VacationManagerProvider(children: Children) -> impl IntoView {
    view! {
        <AuthProvider>
            <RequestProvider>{children()}</RequestProvider>
        </AuthProvider>
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Debug).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Starting vacation manager (wasm)");

    // window.__VACATION_MANAGER_ENV (env.js) takes precedence over ./config.json.
    wasm_bindgen_futures::spawn_local(async move {
        config::init().await;
        log::debug!("Runtime config initialized");
    });
}
