pub mod artifact;
pub mod error;
pub mod exec;
pub mod request;
pub mod resources;
pub mod service;
pub mod settings;

// Public library API - the server crate builds everything it needs from
// these types; the rest is public for tests and tooling.
pub use artifact::ArtifactStore;
pub use error::SynthesisError;
pub use request::SynthesisRequest;
pub use resources::ResourceChecker;
pub use service::{SynthesisOutput, SynthesisService};
pub use settings::Config;
