use tracing::{debug, warn};

use crate::command::Outcome;
use crate::context::SimContext;
use crate::protocol::Message;
use crate::registry::CommandRegistry;

/// Turns request payloads into command outcomes.
///
/// Never fails: decoding, lookup, argument and execution errors all become
/// a ready response carrying the error text.
#[derive(Debug)]
pub struct Dispatcher {
    registry: CommandRegistry,
}

impl Dispatcher {
    pub const fn new(registry: CommandRegistry) -> Self {
        Self { registry }
    }

    pub const fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    pub fn handle(&self, payload: &[u8], ctx: &mut SimContext) -> Outcome {
        let message = match Message::from_slice(payload) {
            Ok(message) => message,
            Err(err) => {
                warn!(%err, "rejected request");
                return Outcome::Ready(err.to_string());
            }
        };
        self.dispatch(message, ctx)
    }

    pub fn dispatch(&self, message: Message, ctx: &mut SimContext) -> Outcome {
        let Message { kind, kwargs } = message;
        debug!(command = %kind, "dispatching");
        let result = self
            .registry
            .build(&kind, kwargs)
            .and_then(|command| command.execute(ctx));
        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(command = %kind, %err, "command failed");
                Outcome::Ready(err.to_string())
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(CommandRegistry::with_builtins())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn text(outcome: Outcome) -> String {
        match outcome {
            Outcome::Ready(text) => text,
            Outcome::Deferred(_) => panic!("expected ready"),
        }
    }

    fn send(dispatcher: &Dispatcher, ctx: &mut SimContext, request: &serde_json::Value) -> String {
        text(dispatcher.handle(&serde_json::to_vec(request).unwrap(), ctx))
    }

    #[test]
    fn unknown_command_names_the_type() {
        let dispatcher = Dispatcher::default();
        let mut ctx = SimContext::headless();
        assert_eq!(
            send(&dispatcher, &mut ctx, &json!({"type": "Teleport"})),
            "Unknown command: Teleport"
        );
    }

    #[test]
    fn missing_type_and_bad_json() {
        let dispatcher = Dispatcher::default();
        let mut ctx = SimContext::headless();
        assert_eq!(
            send(&dispatcher, &mut ctx, &json!({"contents": "{}"})),
            "Command doesn't contain type"
        );
        assert!(text(dispatcher.handle(b"{oops", &mut ctx)).starts_with("Invalid arguments"));
    }

    #[test]
    fn echo_in_every_envelope_form() {
        let dispatcher = Dispatcher::default();
        let mut ctx = SimContext::headless();
        for request in [
            json!({"type": "Echo", "contents": "{\"message\": \"hi\"}"}),
            json!({"type": "Echo", "contents": {"message": "hi"}}),
            json!({"type": "Echo", "message": "hi"}),
        ] {
            assert_eq!(send(&dispatcher, &mut ctx, &request), "hi");
        }
    }

    #[test]
    fn argument_errors_are_reported() {
        let dispatcher = Dispatcher::default();
        let mut ctx = SimContext::headless();
        let reply = send(&dispatcher, &mut ctx, &json!({"type": "AddForce", "name": "cube"}));
        assert!(reply.starts_with("Invalid arguments for AddForce"), "{reply}");
        assert!(reply.contains("force"));
    }

    #[test]
    fn initialize_is_deferred() {
        let dispatcher = Dispatcher::default();
        let mut ctx = SimContext::headless();
        let outcome = dispatcher.handle(br#"{"type": "Initialize", "b64bytes": ""}"#, &mut ctx);
        assert!(matches!(outcome, Outcome::Deferred(_)));
    }
}
