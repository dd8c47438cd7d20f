pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod prompt;
pub mod providers;
pub mod router;
pub mod telemetry;

pub use config::{BedrockConfig, PollinationsConfig, RouterConfig, StabilityConfig};
pub use error::{Error, ErrorCode, GenerationError, Result, RouterError, RouterErrorKind};
pub use models::*;
pub use prompt::{build_prompts, PromptBuilder, PromptPair};
pub use providers::{BedrockProvider, ImageProvider, PollinationsProvider, StabilityProvider};
pub use router::GenerationRouter;
pub use telemetry::{
    FailureType, LogTelemetrySink, MemoryTelemetrySink, TelemetryEvent, TelemetrySink,
    TelemetryStatus, TelemetrySummary,
};
