use std::sync::Arc;
use std::sync::mpsc::{self, TryRecvError};
use std::task::Poll;
use std::thread;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::{Map, Value};
use simulate_core::description::SceneDescription;
use simulate_sim::SceneLoader;
use tracing::{debug, info};

use crate::command::{Command, Deferred, Outcome};
use crate::context::SimContext;
use crate::error::CommandError;
use crate::protocol::EMPTY_RESPONSE;

/// Load a scene from base64-encoded bytes.
///
/// Decoding and parsing run on a worker thread. The scene is loaded, and
/// the remaining keyword arguments applied as configuration, back on the
/// simulation thread once parsing finishes.
#[derive(Debug, Deserialize)]
pub struct Initialize {
    b64bytes: String,
    #[serde(flatten)]
    kwargs: Map<String, Value>,
}

impl Command for Initialize {
    fn execute(self: Box<Self>, ctx: &mut SimContext) -> Result<Outcome, CommandError> {
        let Self { b64bytes, kwargs } = *self;
        ctx.simulator.begin_loading()?;

        let (tx, rx) = mpsc::channel();
        let loader = Arc::clone(&ctx.loader);
        let spawned = thread::Builder::new()
            .name("scene-loader".into())
            .spawn(move || {
                let result = parse_scene(loader.as_ref(), &b64bytes);
                if tx.send(result).is_err() {
                    debug!("scene parsed after the request was dropped");
                }
            });
        if let Err(e) = spawned {
            ctx.simulator.abort_loading();
            return Err(CommandError::InvalidState(format!(
                "failed to start scene loader: {e}"
            )));
        }

        let mut kwargs = Some(kwargs);
        Ok(Outcome::Deferred(Deferred::new(move |ctx: &mut SimContext| {
            let parsed = match rx.try_recv() {
                Err(TryRecvError::Empty) => return Poll::Pending,
                Err(TryRecvError::Disconnected) => Err(CommandError::InvalidState(
                    "scene loader exited without a result".into(),
                )),
                Ok(parsed) => parsed,
            };
            let result = parsed.and_then(|description| {
                let kwargs = kwargs.take().unwrap_or_default();
                ctx.simulator.load(&description, &kwargs)?;
                info!(scene = %description.name, "scene ready");
                Ok(EMPTY_RESPONSE.to_string())
            });
            if result.is_err() {
                ctx.simulator.abort_loading();
            }
            Poll::Ready(result)
        })))
    }
}

fn parse_scene(
    loader: &dyn SceneLoader,
    b64bytes: &str,
) -> Result<SceneDescription, CommandError> {
    let bytes = STANDARD
        .decode(b64bytes.trim())
        .map_err(|e| CommandError::argument("Initialize", format!("invalid base64: {e}")))?;
    debug!(bytes = bytes.len(), "scene bytes decoded");
    Ok(loader.parse(&bytes)?)
}
