use thiserror::Error;

/// Error types for the engine module
#[derive(Error, Debug)]
pub enum EngineError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The requested row does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    /// The row exists but belongs to another user
    #[error("{entity} {id} does not belong to user {user_id}")]
    Ownership {
        entity: &'static str,
        id: i32,
        user_id: i32,
    },

    /// A per-user cap would be exceeded
    #[error("Limit reached: {0}")]
    LimitReached(String),

    /// The operation clashes with existing state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input rejected before touching the database
    #[error("Validation error: {0}")]
    Validation(String),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        EngineError::NotFound { entity, id }
    }

    pub fn ownership(entity: &'static str, id: i32, user_id: i32) -> Self {
        EngineError::Ownership {
            entity,
            id,
            user_id,
        }
    }
}

/// Type alias for Result with EngineError
pub type Result<T> = std::result::Result<T, EngineError>;
