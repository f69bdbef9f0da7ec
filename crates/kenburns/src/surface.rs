pub mod headless;

use std::fmt;
use std::time::Duration;

use crate::config::EasingCurve;
use crate::geometry::{Rect, Size};

/// Marker class added to every slide wrapper.
pub const SLIDE_CLASS: &str = "kb-slide";
/// Marker class added to the image inside each wrapper.
pub const IMAGE_CLASS: &str = "kb-slide-img";

/// Stacking value of a slide that is not the incoming one.
pub const BASE_LAYER: i32 = 1;
/// Stacking value of the incoming slide while it fades in.
pub const RAISED_LAYER: i32 = 3;

/// A node the gallery styles: a slide wrapper or the image inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Slide(usize),
    Image(usize),
}

impl Target {
    pub fn slide_index(&self) -> usize {
        match *self {
            Target::Slide(index) | Target::Image(index) => index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Transform {
    pub const fn new(scale: f64, translate_x: f64, translate_y: f64) -> Self {
        Self {
            scale,
            translate_x,
            translate_y,
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scale({}) translate3d({}px,{}px,0)",
            self.scale, self.translate_x, self.translate_y
        )
    }
}

/// Engine-driven transition attached to the transform property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEasing {
    pub duration: Duration,
    pub curve: EasingCurve,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StyleProp {
    Opacity(f64),
    Layer(i32),
    Left(f64),
    Top(f64),
    Width(f64),
    Height(f64),
    Transform(Transform),
    /// Fractions of the node's box; (0, 0) is the left/top corner.
    TransformOrigin { x: f64, y: f64 },
    /// `None` clears any transition so the next transform applies instantly.
    TransformTransition(Option<TimedEasing>),
}

impl StyleProp {
    pub fn size(size: Size) -> [StyleProp; 2] {
        [StyleProp::Width(size.width), StyleProp::Height(size.height)]
    }

    pub fn rect(rect: Rect) -> [StyleProp; 4] {
        [
            StyleProp::Left(rect.left),
            StyleProp::Top(rect.top),
            StyleProp::Width(rect.width),
            StyleProp::Height(rect.height),
        ]
    }
}

/// Interpolation used by [`Surface::animate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    /// The host's default easing.
    Swing,
}

/// The rendering engine the gallery drives.
///
/// Implementations own measurement, styling and time-stepped animation; the gallery
/// only decides what to set and when. Animations are fire-and-forget: the gallery never
/// waits on one, it schedules its own follow-up work.
pub trait Surface {
    /// Current size of the container box.
    fn container_size(&self) -> Size;

    /// Number of slide wrappers matching `selector`. Slides are addressed by position
    /// in that result from then on.
    fn query_slides(&mut self, selector: &str) -> usize;

    /// Natural size of the slide's image, or `None` while it has not loaded.
    fn natural_size(&self, slide: usize) -> Option<Size>;

    fn add_class(&mut self, target: Target, class: &str);

    /// Apply properties immediately.
    fn set_style(&mut self, target: Target, props: &[StyleProp]);

    /// Interpolate from the current values to `props` over `duration`.
    fn animate(&mut self, target: Target, props: &[StyleProp], duration: Duration, easing: Easing);

    /// Cancel any in-flight animation on `target`, leaving it where it is.
    fn stop_animations(&mut self, target: Target);
}
