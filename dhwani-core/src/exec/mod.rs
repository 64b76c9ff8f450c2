pub mod job;
pub mod pool;
pub mod supervisor;

pub use job::{Job, JobState, WorkerInvocation};
pub use pool::{JobHandle, WorkerPool};
pub use supervisor::{Outcome, SupervisorOptions};
