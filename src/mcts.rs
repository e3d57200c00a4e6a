//! Monte-Carlo tree search over a live environment.
//!
//! The environment is stochastic, so the tree is open-loop: a node stands
//! for an action sequence from the root, not for a dealt hand. Every
//! iteration clones the root environment, reseeds its chance source from
//! the search RNG and replays the selected actions on that copy. Whether a
//! node is terminal is read from the copy, so one future may bust on a hit
//! while another does not.
//!
//! Nodes live in an arena (`Vec<Node>`) and refer to each other by index.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cancel::CancelFlag;
use crate::config::SearchConfig;
use crate::env::Environment;
use crate::error::{BjError, BjResult};
use crate::state::{Action, Observation};

/// Longest playout before the rollout is declared runaway.
pub const MAX_ROLLOUT_STEPS: usize = 64;

#[derive(Debug, Clone)]
struct Node {
    parent: Option<usize>,
    /// Action taken from the parent; `None` at the root.
    action: Option<Action>,
    /// Observation seen when the node was first expanded.
    observation: Observation,
    /// Whether the first expansion ended the episode.
    terminal: bool,
    children: Vec<usize>,
    /// Filled from the live environment on the first non-terminal visit.
    untried: Option<Vec<Action>>,
    visits: u32,
    value: f64,
}

impl Node {
    fn new(
        parent: Option<usize>,
        action: Option<Action>,
        observation: Observation,
        terminal: bool,
    ) -> Self {
        Node {
            parent,
            action,
            observation,
            terminal,
            children: Vec::new(),
            untried: None,
            visits: 0,
            value: 0.0,
        }
    }

    fn mean(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.value / self.visits as f64
        }
    }
}

/// Visit statistics of one root action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionStats {
    pub action: Action,
    pub visits: u32,
    pub mean: f64,
    /// First sampled observation after taking the action.
    pub observation: Observation,
    /// The first sampled outcome of this action ended the episode.
    pub terminal: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub action: Action,
    pub root: Observation,
    pub children: Vec<ActionStats>,
    pub iterations: usize,
    pub nodes: usize,
}

impl SearchOutcome {
    pub fn stats(&self, action: Action) -> Option<&ActionStats> {
        self.children.iter().find(|c| c.action == action)
    }
}

pub struct TreeSearchSolver {
    config: SearchConfig,
    rng: StdRng,
    cancel: Option<CancelFlag>,
}

impl TreeSearchSolver {
    pub fn new(config: SearchConfig) -> BjResult<Self> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(TreeSearchSolver {
            config,
            rng,
            cancel: None,
        })
    }

    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Best action for the current position of `env`, observed as `root`.
    pub fn decide<E: Environment>(&mut self, env: &E, root: Observation) -> BjResult<Action> {
        Ok(self.search(env, root)?.action)
    }

    /// Run the configured number of iterations from `env`. `env` itself is
    /// never stepped.
    pub fn search<E: Environment>(&mut self, env: &E, root: Observation) -> BjResult<SearchOutcome> {
        let mut nodes = vec![Node::new(None, None, root, false)];

        for _ in 0..self.config.iterations {
            if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                return Err(BjError::Cancelled);
            }
            self.iterate(&mut nodes, env)?;
        }

        let children: Vec<ActionStats> = nodes[0]
            .children
            .iter()
            .map(|&c| {
                let node = &nodes[c];
                ActionStats {
                    // Every non-root node carries its action.
                    action: node.action.unwrap_or(Action::Stand),
                    visits: node.visits,
                    mean: node.mean(),
                    observation: node.observation,
                    terminal: node.terminal,
                }
            })
            .collect();

        let action = best_mean(&children).ok_or(BjError::NoExpansion { depth: 0 })?;

        Ok(SearchOutcome {
            action,
            root: nodes[0].observation,
            children,
            iterations: self.config.iterations,
            nodes: nodes.len(),
        })
    }

    fn iterate<E: Environment>(&mut self, nodes: &mut Vec<Node>, env: &E) -> BjResult<()> {
        let mut sim = env.clone();
        sim.reseed(self.rng.gen());

        let mut node = 0;
        let mut depth = 0;

        // Selection and expansion. `sim` is positioned at `node` and has
        // not terminated at the top of every pass.
        let finished = loop {
            if nodes[node].untried.is_none() {
                let legal = sim.legal_actions();
                if legal.is_empty() {
                    return Err(BjError::NoExpansion { depth });
                }
                nodes[node].untried = Some(legal);
            }

            if let Some(action) = nodes[node].untried.as_mut().and_then(|u| u.pop()) {
                let step = sim.step(action);
                let child = nodes.len();
                nodes.push(Node::new(
                    Some(node),
                    Some(action),
                    step.observation,
                    step.terminated,
                ));
                nodes[node].children.push(child);
                node = child;
                break step.terminated.then_some(step.reward);
            }

            if nodes[node].children.is_empty() {
                return Err(BjError::NoExpansion { depth });
            }

            node = self.select_child(nodes, node);
            depth += 1;
            let action = nodes[node].action.ok_or(BjError::NoExpansion { depth })?;
            let step = sim.step(action);
            if step.terminated {
                break Some(step.reward);
            }
        };

        let reward = match finished {
            Some(reward) => reward,
            None => self.rollout(&mut sim, depth + 1)?,
        };

        let mut cursor = Some(node);
        while let Some(i) = cursor {
            nodes[i].visits += 1;
            nodes[i].value += reward;
            cursor = nodes[i].parent;
        }
        Ok(())
    }

    /// UCT choice among the children of `parent`; exact ties are broken at
    /// random over insertion order.
    fn select_child(&mut self, nodes: &[Node], parent: usize) -> usize {
        let ln_n = (nodes[parent].visits.max(1) as f64).ln();
        let c = self.config.exploration;

        let mut best = f64::NEG_INFINITY;
        let mut tied: Vec<usize> = Vec::new();
        for &child in &nodes[parent].children {
            let n = &nodes[child];
            let score = if n.visits == 0 {
                f64::INFINITY
            } else {
                n.mean() + c * (2.0 * ln_n / n.visits as f64).sqrt()
            };
            if score > best {
                best = score;
                tied.clear();
                tied.push(child);
            } else if score == best {
                tied.push(child);
            }
        }

        if tied.len() == 1 {
            tied[0]
        } else {
            tied[self.rng.gen_range(0..tied.len())]
        }
    }

    /// Uniformly random playout to the end of the episode.
    fn rollout<E: Environment>(&mut self, sim: &mut E, depth: usize) -> BjResult<f64> {
        for step_no in 0..MAX_ROLLOUT_STEPS {
            let legal = sim.legal_actions();
            if legal.is_empty() {
                return Err(BjError::NoExpansion {
                    depth: depth + step_no,
                });
            }
            let action = legal[self.rng.gen_range(0..legal.len())];
            let step = sim.step(action);
            if step.terminated {
                return Ok(step.reward);
            }
        }
        Err(BjError::RolloutLimit(MAX_ROLLOUT_STEPS))
    }
}

/// Root action with the highest mean value; ties go to Stand.
fn best_mean(children: &[ActionStats]) -> Option<Action> {
    children
        .iter()
        .max_by(|a, b| {
            a.mean
                .total_cmp(&b.mean)
                .then_with(|| b.action.cmp(&a.action))
        })
        .map(|s| s.action)
}
