use std::sync::{Arc, Mutex, PoisonError};

/// Per-request holder of a token renewed while serving the request.
/// Created empty for every inbound request and read once when the response is finalized.
#[derive(Clone, Default)]
pub struct RefreshSlot {
  inner: Arc<Mutex<Option<String>>>,
}

impl RefreshSlot {
  /// Last write wins
  pub fn set(&self, token: String) {
    let mut lock = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    lock.replace(token);
  }

  pub fn get(&self) -> Option<String> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }

  pub fn is_set(&self) -> bool {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner).is_some()
  }
}

impl std::fmt::Debug for RefreshSlot {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RefreshSlot").field("is_set", &self.is_set()).finish()
  }
}
