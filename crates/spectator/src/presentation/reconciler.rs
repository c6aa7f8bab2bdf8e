//! Render reconciler.
//!
//! Every fetch cycle rebuilds the whole timeline. The reconciler compares
//! the rebuilt ids with what the message list already shows and turns the
//! difference into the fewest display operations: usually an append of the
//! new suffix, and a clear plus full re-render only when nothing shown is
//! still present. Matching is by id only.

use std::time::Duration;

use arena_domain::{Message, MessageId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStrategy {
    /// Everything in the rebuild is already shown.
    Unchanged,
    /// The rebuild is empty.
    Clear,
    /// Append after `anchor`, the latest shown id still present.
    Append { anchor: MessageId },
    /// Render the whole rebuild from scratch.
    Rerender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOp {
    Clear,
    /// Append `messages[index]` after waiting `delay` from the start of the plan.
    Append { index: usize, delay: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPlan {
    pub strategy: RenderStrategy,
    pub ops: Vec<RenderOp>,
}

impl RenderPlan {
    fn unchanged() -> Self {
        Self {
            strategy: RenderStrategy::Unchanged,
            ops: Vec::new(),
        }
    }

    /// Indices of `messages` this plan appends, in order.
    pub fn appended(&self) -> impl Iterator<Item = usize> + '_ {
        self.ops.iter().filter_map(|op| match op {
            RenderOp::Append { index, .. } => Some(*index),
            RenderOp::Clear => None,
        })
    }
}

fn staggered(step: usize, stagger: Duration) -> Duration {
    stagger.saturating_mul(u32::try_from(step).unwrap_or(u32::MAX))
}

fn full_render(next: &[MessageId], stagger: Duration, clear_first: bool) -> RenderPlan {
    let mut ops = Vec::with_capacity(next.len() + 1);
    if clear_first {
        ops.push(RenderOp::Clear);
    }
    ops.extend((0..next.len()).map(|index| RenderOp::Append {
        index,
        delay: staggered(index, stagger),
    }));
    RenderPlan {
        strategy: RenderStrategy::Rerender,
        ops,
    }
}

/// Plan the operations that turn `displayed` into `next`.
pub fn plan(displayed: &[MessageId], next: &[MessageId], stagger: Duration) -> RenderPlan {
    if next.is_empty() {
        if displayed.is_empty() {
            return RenderPlan::unchanged();
        }
        return RenderPlan {
            strategy: RenderStrategy::Clear,
            ops: vec![RenderOp::Clear],
        };
    }

    if displayed.is_empty() {
        return full_render(next, stagger, false);
    }

    // Latest displayed id that survives in the rebuild.
    let anchor = displayed
        .iter()
        .rev()
        .find_map(|id| next.iter().position(|n| n == id).map(|pos| (*id, pos)));

    let Some((anchor, position)) = anchor else {
        return full_render(next, stagger, true);
    };

    if position + 1 == next.len() {
        return RenderPlan::unchanged();
    }

    RenderPlan {
        strategy: RenderStrategy::Append { anchor },
        ops: (position + 1..next.len())
            .map(|index| RenderOp::Append {
                index,
                delay: staggered(index - position, stagger),
            })
            .collect(),
    }
}

/// Tracks what the message list shows between cycles.
#[derive(Debug, Clone)]
pub struct RenderReconciler {
    displayed: Vec<MessageId>,
    stagger: Duration,
}

impl RenderReconciler {
    pub fn new(stagger: Duration) -> Self {
        Self {
            displayed: Vec::new(),
            stagger,
        }
    }

    pub fn displayed(&self) -> &[MessageId] {
        &self.displayed
    }

    /// Plan against `messages` and record the result as displayed.
    pub fn reconcile(&mut self, messages: &[Message]) -> RenderPlan {
        let next: Vec<MessageId> = messages.iter().map(|m| m.id).collect();
        let plan = plan(&self.displayed, &next, self.stagger);

        match plan.strategy {
            RenderStrategy::Unchanged => {}
            RenderStrategy::Clear => self.displayed.clear(),
            RenderStrategy::Append { .. } => {
                let appended: Vec<MessageId> = plan.appended().map(|i| next[i]).collect();
                self.displayed.extend(appended);
            }
            RenderStrategy::Rerender => self.displayed = next,
        }
        plan
    }

    pub fn reset(&mut self) {
        self.displayed.clear();
    }
}
