//! Logging targets for Horizon MVVM.
//!
//! Horizon MVVM uses the `tracing` crate for instrumentation. The library
//! never installs a subscriber; applications do:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_mvvm::model=trace")
//!     .init();
//! ```

/// Span names used throughout Horizon MVVM for tracing.
pub mod span_names {
    /// Signal emission span, the name `Signal::emit` is instrumented with.
    pub const SIGNAL: &str = "horizon_mvvm::signal";
    /// Structural model mutation span.
    pub const MODEL_MUTATION: &str = "horizon_mvvm::model::mutation";
    /// View-model rebuild span.
    pub const VIEWMODEL_REBUILD: &str = "horizon_mvvm::viewmodel::rebuild";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_mvvm::signal";
    /// Item model target.
    pub const MODEL: &str = "horizon_mvvm::model";
    /// Mapper and listener target.
    pub const MAPPER: &str = "horizon_mvvm::mapper";
    /// Undo stack target.
    pub const UNDO: &str = "horizon_mvvm::undo";
    /// View-model projection target.
    pub const VIEWMODEL: &str = "horizon_mvvm::viewmodel";
    /// Plot controller target.
    pub const PLOTTING: &str = "horizon_mvvm::plotting";
    /// JSON serialization target.
    pub const SERIALIZATION: &str = "horizon_mvvm::serialization";
}
