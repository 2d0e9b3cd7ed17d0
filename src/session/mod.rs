mod policy;
mod refresher;
mod slot;
mod validator;

pub use policy::with_session_refresh;
pub use refresher::{RefreshResult, SessionRefresher};
pub use slot::RefreshSlot;
pub use validator::{PermissiveValidator, SessionValidator, StrictValidator};
