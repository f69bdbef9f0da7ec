use thiserror::Error;

/// Library error type for gallery operations.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// `attach` was called outside a Tokio runtime, so there is nothing to drive the timer.
    #[error("gallery must be attached from within a Tokio runtime")]
    NoRuntime,

    /// The gallery has been stopped; its scheduler no longer accepts commands.
    #[error("gallery has been stopped")]
    Stopped,

    #[error("slide {slide} is out of range (gallery has {total} slides)")]
    SlideOutOfRange { slide: usize, total: usize },

    /// Configuration rejected by validation.
    #[error("invalid gallery configuration: {0:#}")]
    Config(anyhow::Error),
}
