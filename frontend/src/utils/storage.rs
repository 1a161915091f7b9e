//! Browser session storage, with an in-memory stand-in when running on the
//! host (server rendering and tests).

#[cfg(not(target_arch = "wasm32"))]
use std::{cell::RefCell, collections::HashMap, rc::Rc};

#[cfg(target_arch = "wasm32")]
use web_sys::{Storage, Window};

#[cfg(target_arch = "wasm32")]
pub fn window() -> Result<Window, String> {
    web_sys::window().ok_or_else(|| "No window object".to_string())
}

#[cfg(target_arch = "wasm32")]
pub fn session_storage() -> Result<Storage, String> {
    window()?
        .session_storage()
        .map_err(|_| "No sessionStorage".to_string())?
        .ok_or_else(|| "No sessionStorage".to_string())
}

#[derive(Clone, Default)]
pub struct SessionStorage {
    #[cfg(not(target_arch = "wasm32"))]
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl SessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(target_arch = "wasm32")]
    pub fn get_item(&self, key: &str) -> Result<Option<String>, String> {
        session_storage()?
            .get_item(key)
            .map_err(|_| format!("Failed to read {}", key))
    }

    #[cfg(target_arch = "wasm32")]
    pub fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        session_storage()?
            .set_item(key, value)
            .map_err(|_| format!("Failed to store {}", key))
    }

    #[cfg(target_arch = "wasm32")]
    pub fn clear(&self) -> Result<(), String> {
        session_storage()?
            .clear()
            .map_err(|_| "Failed to clear sessionStorage".to_string())
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn get_item(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn clear(&self) -> Result<(), String> {
        self.entries.borrow_mut().clear();
        Ok(())
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_entries() {
        let storage = SessionStorage::new();
        let other = storage.clone();
        storage.set_item("k", "v").unwrap();
        assert_eq!(other.get_item("k").unwrap().as_deref(), Some("v"));

        other.clear().unwrap();
        assert!(storage.get_item("k").unwrap().is_none());
    }
}
