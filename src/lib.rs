pub mod cli;
pub mod error;
pub mod executor;
pub mod job;
pub mod logging;
pub mod payload;
pub mod ssh;

pub use error::{Error, Result};
pub use executor::{Executor, Outcome, Phase};
pub use job::Job;
pub use ssh::{CommandOutput, ExitStatus};
