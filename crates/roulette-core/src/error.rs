//! Error types for the roulette engine.

/// Errors raised by a [`PhysicsEngine`](crate::physics::PhysicsEngine).
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("physics engine is not initialized")]
    NotInitialized,
    #[error("marble {0} already exists")]
    DuplicateMarble(u32),
    #[error("unsupported stage entity: {0}")]
    UnsupportedEntity(String),
    #[error("physics backend failure: {0}")]
    Backend(String),
}

/// Errors raised while loading or validating an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value {field} = {value}: {reason}")]
    InvalidValue {
        field: &'static str,
        value: f32,
        reason: &'static str,
    },
}

/// Errors raised by the [`Roulette`](crate::roulette::Roulette) public API.
#[derive(Debug, thiserror::Error)]
pub enum RouletteError {
    #[error("speed multiplier must be larger than 0, got {0}")]
    InvalidSpeed(f32),
    #[error("unknown theme: {0}")]
    UnknownTheme(String),
    #[error("roulette is not initialized")]
    NotInitialized,
    #[error("roulette has been destroyed")]
    Destroyed,
    #[error("too many marbles: {count} (max {max})")]
    TooManyMarbles { count: usize, max: u32 },
    #[error("no stage has been selected")]
    NoStage,
    #[error("invalid stage definition: {0}")]
    Stage(#[from] serde_json::Error),
    #[error(transparent)]
    Physics(#[from] PhysicsError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
