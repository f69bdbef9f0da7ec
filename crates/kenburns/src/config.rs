use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, ensure};
use serde::Deserialize;
use serde::de::{self, Deserializer, Visitor};

pub const DEFAULT_STEP_DURATION_MS: u64 = 400;
pub const DEFAULT_FADE_DURATION_MS: u64 = 500;
pub const DEFAULT_ZOOM_SCALE: f64 = 1.0;
pub const DEFAULT_SLIDE_SELECTOR: &str = ".kb-slide";

/// Cubic bezier timing curve with fixed end points (0,0) and (1,1), written the CSS way:
/// `cubic-bezier(x1, y1, x2, y2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EasingCurve {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl EasingCurve {
    pub const DEFAULT: EasingCurve = EasingCurve::new(0.81, 0.0, 0.26, 1.0);
    pub const LINEAR: EasingCurve = EasingCurve::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    fn keyword(name: &str) -> Option<Self> {
        let curve = match name {
            "linear" => Self::LINEAR,
            "ease" => Self::new(0.25, 0.1, 0.25, 1.0),
            "ease-in" => Self::new(0.42, 0.0, 1.0, 1.0),
            "ease-out" => Self::new(0.0, 0.0, 0.58, 1.0),
            "ease-in-out" => Self::new(0.42, 0.0, 0.58, 1.0),
            _ => return None,
        };
        Some(curve)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            [self.x1, self.y1, self.x2, self.y2]
                .iter()
                .all(|v| v.is_finite()),
            "easing-curve control points must be finite"
        );
        ensure!(
            (0.0..=1.0).contains(&self.x1) && (0.0..=1.0).contains(&self.x2),
            "easing-curve x control points must lie within [0, 1], got {self}"
        );
        Ok(())
    }
}

impl Default for EasingCurve {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for EasingCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cubic-bezier({}, {}, {}, {})",
            self.x1, self.y1, self.x2, self.y2
        )
    }
}

impl FromStr for EasingCurve {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(curve) = Self::keyword(trimmed) {
            return Ok(curve);
        }
        let inner = trimmed
            .strip_prefix("cubic-bezier(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| anyhow!("expected cubic-bezier(x1, y1, x2, y2), got {s:?}"))?;
        let points = inner
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .with_context(|| format!("bad control point {:?} in {s:?}", part.trim()))
            })
            .collect::<Result<Vec<_>>>()?;
        let [x1, y1, x2, y2] = points[..] else {
            return Err(anyhow!(
                "cubic-bezier takes 4 control values, got {} in {s:?}",
                points.len()
            ));
        };
        Ok(Self { x1, y1, x2, y2 })
    }
}

impl<'de> Deserialize<'de> for EasingCurve {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CurveVisitor;

        impl<'de> Visitor<'de> for CurveVisitor {
            type Value = EasingCurve;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a CSS timing function such as \"cubic-bezier(.81, 0, .26, 1)\"")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value.parse().map_err(|err| E::custom(format!("{err:#}")))
            }
        }

        deserializer.deserialize_str(CurveVisitor)
    }
}

/// Callback fired with the new slide index every time a transition is issued.
#[derive(Clone)]
pub struct SlideAdvanceHook(Arc<dyn Fn(usize) + Send + Sync>);

impl SlideAdvanceHook {
    pub fn new(f: impl Fn(usize) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, index: usize) {
        (self.0)(index)
    }
}

impl Default for SlideAdvanceHook {
    fn default() -> Self {
        Self::new(|_| {})
    }
}

impl fmt::Debug for SlideAdvanceHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SlideAdvanceHook(..)")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Time between slide advances, in ms.
    pub step_duration_ms: u64,
    /// Length of each fade in and fade out, in ms.
    pub fade_duration_ms: u64,
    /// How far the image is oversized at the start of a pan.
    pub zoom_scale: f64,
    /// Timing curve for the accelerated transform path.
    pub easing_curve: EasingCurve,
    /// Selector the surface uses to find slide wrappers.
    pub slide_selector: String,
    /// Optional deterministic seed for corner selection.
    pub seed: Option<u64>,
    #[serde(skip)]
    pub on_slide_advance: SlideAdvanceHook,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            step_duration_ms: DEFAULT_STEP_DURATION_MS,
            fade_duration_ms: DEFAULT_FADE_DURATION_MS,
            zoom_scale: DEFAULT_ZOOM_SCALE,
            easing_curve: EasingCurve::DEFAULT,
            slide_selector: DEFAULT_SLIDE_SELECTOR.to_string(),
            seed: None,
            on_slide_advance: SlideAdvanceHook::default(),
        }
    }
}

impl GalleryConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_yaml_str(&s)
    }

    pub fn with_on_slide_advance(mut self, f: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_slide_advance = SlideAdvanceHook::new(f);
        self
    }

    pub fn step_duration(&self) -> Duration {
        Duration::from_millis(self.step_duration_ms)
    }

    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_duration_ms)
    }

    /// Full length of one pan: the slide keeps moving while it fades out.
    pub fn pan_duration(&self) -> Duration {
        self.step_duration() + self.fade_duration()
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            self.step_duration_ms > 0,
            "step-duration-ms must be greater than zero"
        );
        ensure!(
            self.zoom_scale.is_finite() && self.zoom_scale > 0.0,
            "zoom-scale must be a positive number, got {}",
            self.zoom_scale
        );
        ensure!(
            !self.slide_selector.trim().is_empty(),
            "slide-selector must not be empty"
        );
        self.easing_curve
            .validate()
            .context("invalid easing-curve")?;
        Ok(self)
    }
}
