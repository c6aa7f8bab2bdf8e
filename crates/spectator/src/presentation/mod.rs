//! Presentation: turning rebuilt timelines into display operations.

pub mod reconciler;
pub mod spectator_view;

pub use reconciler::{plan, RenderOp, RenderPlan, RenderReconciler, RenderStrategy};
pub use spectator_view::{CycleOutcome, SkipReason, SpectatorView, ViewSettings};
