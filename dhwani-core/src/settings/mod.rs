pub mod config;


pub use config::{ArtifactConfig, Config, PoolConfig, ServerConfig, WorkerConfig};
