//! Responders and the dispatcher that fans messages out to them.

pub mod dispatcher;
pub mod ping;
pub mod superuser;

pub use dispatcher::Dispatcher;
pub use ping::Ping;
pub use superuser::SuperUsers;

use crate::{Message, Response};

use async_trait::async_trait;

/// A chat plugin: one message in, one response out.
///
/// Most responders are not interested in most messages and return [`Response::none`].
/// Responders are driven from the single listener loop, never concurrently, so
/// they may keep mutable state.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Short name used in logs and help output.
    fn name(&self) -> &str;

    async fn on_message(&mut self, message: &Message) -> Response;

    /// Commands or prefixes the responder reacts to, for help output.
    fn react_on(&self) -> Vec<String> {
        Vec::new()
    }
}
