//! # Cross-Engine Consensus
//! Groups issue detections by `id` and classifies how many independent
//! engines agree on each.
//!
//! Tier comes strictly from the number of *known* engines confirming an
//! issue (3 → unanimous, 2 → majority, otherwise weak). Unknown engine
//! labels are listed for information but add no weight and never promote
//! the tier. Output order is the order in which ids were first seen.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::engines::{normalize, Engine, EngineWeights};
use crate::score::clamp01;

/// One detection event: engine `engine` reported issue `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueHit {
    pub id: String,
    pub engine: String,
}

impl IssueHit {
    pub fn new(id: impl Into<String>, engine: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            engine: engine.into(),
        }
    }
}

/// Agreement summary for one issue id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub id: String,
    /// Distinct engines that reported the issue (known ones canonicalised).
    pub engines: Vec<String>,
    pub unanimous: bool,
    pub majority: bool,
    pub weak: bool,
    /// Sum of confirming engines' importance weights, in [0,1].
    pub weight: f64,
}

impl ConsensusResult {
    pub fn tier(&self) -> &'static str {
        if self.unanimous {
            "unanimous"
        } else if self.majority {
            "majority"
        } else {
            "weak"
        }
    }
}

#[derive(Debug, Default)]
struct Group {
    known: Vec<Engine>,
    engines: Vec<String>,
}

/// Consensus with the built-in engine weights.
pub fn consensus(hits: &[IssueHit]) -> Vec<ConsensusResult> {
    consensus_with(hits, &EngineWeights::DEFAULT)
}

/// Consensus with an injected engine weight table.
pub fn consensus_with(hits: &[IssueHit], weights: &EngineWeights) -> Vec<ConsensusResult> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Group> = HashMap::new();

    for hit in hits {
        let group = groups.entry(hit.id.clone()).or_insert_with(|| {
            order.push(hit.id.clone());
            Group::default()
        });

        match Engine::parse(&hit.engine) {
            Some(engine) => {
                if !group.known.contains(&engine) {
                    group.known.push(engine);
                    group.engines.push(engine.as_str().to_string());
                }
            }
            None => {
                let label = normalize(&hit.engine);
                tracing::debug!(id = %hit.id, engine = %label, "unknown engine in consensus input");
                if !group.engines.contains(&label) {
                    group.engines.push(label);
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|id| groups.remove(&id).map(|g| classify(id, g, weights)))
        .collect()
}

fn classify(id: String, group: Group, weights: &EngineWeights) -> ConsensusResult {
    let known = group.known.len();
    // Fixed engine order keeps the float sum reproducible.
    let weight: f64 = Engine::ALL
        .iter()
        .copied()
        .filter(|e| group.known.contains(e))
        .map(|e| weights.weight_for(e))
        .sum();

    ConsensusResult {
        id,
        engines: group.engines,
        unanimous: known == Engine::ALL.len(),
        majority: known == 2,
        weak: known < 2,
        weight: clamp01(weight),
    }
}
