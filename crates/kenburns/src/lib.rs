pub mod config;
pub mod error;
pub mod gallery;
pub mod geometry;
pub mod probe;
pub mod surface;
pub mod transition;

pub use config::{EasingCurve, GalleryConfig, SlideAdvanceHook};
pub use error::GalleryError;
pub use gallery::{GalleryHandle, GalleryStatus, attach};
pub use geometry::{Corner, CornerPair, Rect, Size, choose_corner};
pub use probe::{CapabilityProbe, StaticProbe};
pub use surface::{Easing, StyleProp, Surface, Target, Transform};
pub use transition::TransitionStrategy;
