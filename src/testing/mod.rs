pub mod collaborators;
pub mod exchange;
pub mod fixtures;
pub mod scenarios;

pub use collaborators::RecordingCollaborators;
pub use exchange::InMemoryExchange;
pub use fixtures::{base_time, OrderBuilder};
pub use scenarios::TestScenario;
