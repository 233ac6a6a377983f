use parking_lot::RwLock;
use std::sync::Arc;

/// Slot for the upstream session correlation token.
///
/// Read before every request; written only by the stream consumer when a
/// response carries a new or rotated token. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    token: Arc<RwLock<Option<String>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(Some(token.into()))),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Store `token` if it differs from the current one. Returns whether the
    /// slot changed.
    pub(crate) fn update(&self, token: String) -> bool {
        let mut slot = self.token.write();
        if slot.as_deref() == Some(token.as_str()) {
            return false;
        }
        *slot = Some(token);
        true
    }

    pub fn clear(&self) {
        self.token.write().take();
    }
}
