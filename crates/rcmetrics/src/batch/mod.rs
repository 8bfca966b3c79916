mod plan;
mod runner;

pub use self::plan::{BatchJob, BatchPlan, plan, render_path};
pub use self::runner::{CancelToken, PairOutcome, run};
