//! Chat transport: wire model, message transformation and the Telegram adapter.

pub mod html;
pub mod telegram;
pub mod traits;
pub mod transform;
pub mod wire;

pub use telegram::TelegramTransport;
pub use traits::{ChatTransport, OutboundMessage, UpdateStream};
pub use transform::{ban_username, transform};
