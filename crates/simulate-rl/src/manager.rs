//! Per-scene agent registry and the batched reward/done/observation
//! aggregation.
//!
//! Agents are keyed and iterated by id, so every batched result lists
//! agents in the same lexicographic order regardless of scene declaration
//! order.

use std::collections::BTreeMap;

use serde_json::Value;
use simulate_core::description::SceneDescription;
use simulate_core::error::{ActionError, SimulateError};
use simulate_core::scene::SceneEngine;
use tracing::info;

use crate::actions::MovementAxes;
use crate::agent::Agent;
use crate::observation::Observation;

#[derive(Debug, Default)]
pub struct AgentManager {
    agents: BTreeMap<String, Agent>,
}

impl AgentManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one agent per agent node of `description`.
    ///
    /// Every agent is reset once built so distance-tracking rewards start
    /// from the loaded positions.
    pub fn build(
        description: &SceneDescription,
        scene: &mut dyn SceneEngine,
    ) -> Result<Self, SimulateError> {
        let mut agents = BTreeMap::new();
        for (id, desc) in description.agents() {
            let mut agent = Agent::build(id, desc, scene)?;
            agent.reset(scene);
            agents.insert(id.to_string(), agent);
        }
        info!(count = agents.len(), "agents built");
        Ok(Self { agents })
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.agents.keys().map(String::as_str)
    }

    pub fn agent(&self, id: &str) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn clear(&mut self) {
        self.agents.clear();
    }

    pub fn set_action(&mut self, id: &str, values: &[f32]) -> Result<(), ActionError> {
        self.agents
            .get_mut(id)
            .ok_or_else(|| ActionError::UnknownAgent(id.to_string()))?
            .set_action(values)
    }

    /// Parse and apply a `Step` action payload.
    ///
    /// Accepted forms: `null` (keep current actions), a map of agent id to
    /// values, a list with one entry per agent in id order, or for a single
    /// agent a bare vector or scalar. All entries are validated before any
    /// agent's action changes.
    pub fn set_actions(&mut self, payload: &Value) -> Result<(), ActionError> {
        let resolved = self.resolve_payload(payload)?;
        for (id, movement) in resolved {
            if let Some(agent) = self.agents.get_mut(&id) {
                agent.set_movement(movement);
            }
        }
        Ok(())
    }

    fn resolve_payload(&self, payload: &Value) -> Result<Vec<(String, MovementAxes)>, ActionError> {
        match payload {
            Value::Null => Ok(Vec::new()),
            Value::Object(map) => map
                .iter()
                .map(|(id, entry)| {
                    let agent = self
                        .agents
                        .get(id)
                        .ok_or_else(|| ActionError::UnknownAgent(id.clone()))?;
                    Ok((id.clone(), agent.resolve(&values(entry)?)?))
                })
                .collect(),
            Value::Number(_) => {
                let agent = self.single_agent(payload)?;
                Ok(vec![(agent.id().to_string(), agent.resolve(&values(payload)?)?)])
            }
            Value::Array(entries) => {
                let flat = entries.iter().all(Value::is_number);
                if self.agents.len() == 1 && (flat || entries.is_empty()) {
                    let agent = self.single_agent(payload)?;
                    return Ok(vec![(
                        agent.id().to_string(),
                        agent.resolve(&values(payload)?)?,
                    )]);
                }
                if entries.len() != self.agents.len() {
                    return Err(ActionError::InvalidPayload(format!(
                        "expected {} per-agent actions, got {}",
                        self.agents.len(),
                        entries.len()
                    )));
                }
                self.agents
                    .values()
                    .zip(entries)
                    .map(|(agent, entry)| {
                        Ok((agent.id().to_string(), agent.resolve(&values(entry)?)?))
                    })
                    .collect()
            }
            other => Err(ActionError::InvalidPayload(format!(
                "unsupported action payload: {other}"
            ))),
        }
    }

    fn single_agent(&self, payload: &Value) -> Result<&Agent, ActionError> {
        match self.agents.values().next() {
            Some(agent) if self.agents.len() == 1 => Ok(agent),
            _ => Err(ActionError::InvalidPayload(format!(
                "bare action {payload} needs exactly one agent, scene has {}",
                self.agents.len()
            ))),
        }
    }

    pub fn apply_movement(&self, scene: &mut dyn SceneEngine, dt: f32) {
        for agent in self.agents.values() {
            agent.apply_movement(scene, dt);
        }
    }

    pub fn update_rewards(&mut self, scene: &mut dyn SceneEngine) {
        for agent in self.agents.values_mut() {
            agent.update_reward(scene);
        }
    }

    /// Accumulated reward per agent, zeroing each accumulator.
    pub fn get_reward(&mut self) -> Vec<f32> {
        self.agents.values_mut().map(Agent::take_reward).collect()
    }

    pub fn get_done(&self) -> Vec<bool> {
        self.agents.values().map(Agent::is_done).collect()
    }

    pub fn get_observation(&self, scene: &mut dyn SceneEngine) -> Vec<Observation> {
        self.agents.values().map(|a| a.observe(scene)).collect()
    }

    pub fn reset(&mut self, scene: &mut dyn SceneEngine) {
        for agent in self.agents.values_mut() {
            agent.reset(scene);
        }
    }
}

/// Action values from a JSON scalar or array of numbers.
#[allow(clippy::cast_possible_truncation)]
fn values(entry: &Value) -> Result<Vec<f32>, ActionError> {
    let number = |v: &Value| {
        v.as_f64()
            .map(|n| n as f32)
            .ok_or_else(|| ActionError::InvalidPayload(format!("expected a number, got {v}")))
    };
    match entry {
        Value::Array(items) => items.iter().map(number).collect(),
        other => number(other).map(|n| vec![n]),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
