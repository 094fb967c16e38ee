pub mod config;
mod helpers;
mod orchestrator;
mod types;
mod worker;

pub use helpers::{
    all_compatible_sizes, all_of_type, group_file_name, mean_exposure_and_temperature,
    most_common_filter_name,
};
pub use orchestrator::run_session;
pub use types::{CancelFlag, SessionOutcome, SessionState};
pub use worker::spawn_session;
