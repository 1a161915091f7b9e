/// Shows a blocking alert in the browser. On the host there is no one to
/// block, so the message goes to the log instead.
pub fn alert(message: &str) {
    #[cfg(target_arch = "wasm32")]
    {
        match web_sys::window() {
            Some(window) => {
                if window.alert_with_message(message).is_err() {
                    log::error!("Failed to show alert: {}", message);
                }
            }
            None => log::error!("{}", message),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    log::warn!("alert: {}", message);
}
