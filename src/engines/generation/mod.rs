pub mod agent;
pub mod genome;
pub mod operators;
pub mod population;
pub mod progress;

pub use agent::{Agent, AgentState};
pub use genome::{Genome, OFF_TRACK_FITNESS};
pub use operators::MutationSettings;
pub use population::Population;
pub use progress::{ChannelProgressCallback, ConsoleProgressCallback, ProgressCallback, ProgressMessage};
