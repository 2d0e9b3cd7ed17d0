mod codec;
mod payload;

pub use codec::TokenCodec;
pub(crate) use payload::is_present;
pub use payload::{MobileSession, Principal, TokenPayload, UpstreamSession};
