use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

/// Per-user context handed to the components that need it: the reconciler
/// reads the online flag before every poll tick, the backend client sends
/// the bearer token with every call.
#[derive(Clone, Debug)]
pub struct Session {
    pub user_id: Uuid,
    pub auth_token: String,
    online: Arc<AtomicBool>,
}

impl Session {
    pub fn new(user_id: Uuid, auth_token: String) -> Self {
        Self {
            user_id,
            auth_token,
            online: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }
}
