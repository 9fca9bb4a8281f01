//! ra2flac core: trigger parsing and the pure run state machine.
mod effect;
mod msg;
mod state;
mod summary;
mod trigger;
mod update;

pub use effect::Effect;
pub use msg::{Msg, PreparePlan};
pub use state::{
    normalize_url_for_dedupe, Job, JobId, JobResultKind, PublishOutcome, RunPhase, RunState, Stage,
};
pub use summary::{JobFailure, RunSummary};
pub use trigger::ManualUrls;
pub use update::update;
