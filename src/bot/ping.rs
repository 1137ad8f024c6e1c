//! Liveness responder.

use crate::bot::Responder;
use crate::{Message, Response};

use async_trait::async_trait;

/// Answers `ping` with `pong`, replying to the triggering message.
#[derive(Debug, Default)]
pub struct Ping;

#[async_trait]
impl Responder for Ping {
    fn name(&self) -> &str {
        "ping"
    }

    async fn on_message(&mut self, message: &Message) -> Response {
        let text = message.text.trim().to_lowercase();
        if text != "ping" && text != "ping!" {
            return Response::none();
        }
        Response {
            reply_to: (message.id != 0).then_some(message.id),
            ..Response::text("pong")
        }
    }

    fn react_on(&self) -> Vec<String> {
        vec!["ping".into(), "ping!".into()]
    }
}
