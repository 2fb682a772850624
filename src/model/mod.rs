pub mod config;
pub mod level;
pub mod record;
pub mod state;
pub mod task;

pub use config::*;
pub use level::*;
pub use record::*;
pub use state::*;
pub use task::*;
