//! Dispatcher: fan-out to every registered responder and merge the answers.

use crate::bot::Responder;
use crate::{Message, Response};

use async_trait::async_trait;

const HELP_COMMANDS: &[&str] = &["help", "/help", "help!"];

/// Calls every responder in registration order and merges their responses.
///
/// Merge rules:
/// - texts of sending responders are joined with a newline
/// - pin and preview are set if any sending responder asks
/// - the last non-empty reply target wins
/// - the first explicit parse mode wins
/// - the longest ban wins
pub struct Dispatcher {
    responders: Vec<Box<dyn Responder>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field(
                "responders",
                &self.responders.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Dispatcher {
    pub fn new(responders: Vec<Box<dyn Responder>>) -> Self {
        Self { responders }
    }

    /// Register another responder after the existing ones.
    pub fn register(&mut self, responder: impl Responder + 'static) {
        self.responders.push(Box::new(responder));
    }

    pub fn len(&self) -> usize {
        self.responders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responders.is_empty()
    }

    fn help(&self) -> Response {
        let lines: Vec<String> = self
            .responders
            .iter()
            .filter_map(|responder| {
                let keys = responder.react_on();
                (!keys.is_empty()).then(|| format!("{}: {}", responder.name(), keys.join(", ")))
            })
            .collect();
        if lines.is_empty() {
            return Response::none();
        }
        Response::text(lines.join("\n"))
    }
}

#[async_trait]
impl Responder for Dispatcher {
    fn name(&self) -> &str {
        "dispatcher"
    }

    async fn on_message(&mut self, message: &Message) -> Response {
        if HELP_COMMANDS.contains(&message.text.trim().to_lowercase().as_str()) {
            return self.help();
        }

        let mut merged = Response::none();
        let mut lines = Vec::new();

        for responder in &mut self.responders {
            let response = responder.on_message(message).await;
            if !response.send {
                continue;
            }
            tracing::debug!(responder = responder.name(), text = %response.text, "responder answered");

            if !response.text.is_empty() {
                lines.push(response.text);
            }
            merged.pin |= response.pin;
            merged.preview |= response.preview;
            if response.reply_to.is_some() {
                merged.reply_to = response.reply_to;
            }
            if merged.parse_mode.is_none() {
                merged.parse_mode = response.parse_mode;
            }
            if let Some(ban) = response.ban {
                let longer = merged
                    .ban
                    .as_ref()
                    .is_none_or(|current| ban.duration > current.duration);
                if longer {
                    merged.ban = Some(ban);
                }
            }
            merged.send = true;
        }

        merged.text = lines.join("\n");
        merged
    }

    fn react_on(&self) -> Vec<String> {
        self.responders.iter().flat_map(|r| r.react_on()).collect()
    }
}
