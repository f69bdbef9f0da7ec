use std::fmt;
use std::time::Duration;

use crate::config::GalleryConfig;
use crate::geometry::CornerPair;
use crate::surface::{
    BASE_LAYER, Easing, RAISED_LAYER, StyleProp, Surface, Target, TimedEasing, Transform,
};

/// How a slide's pan is expressed to the surface. Chosen once per gallery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionStrategy {
    /// One transform (scale + translate) animated by the engine itself.
    Accelerated,
    /// left/top/width/height stepped by the surface's animation primitive.
    Animated,
}

impl TransitionStrategy {
    fn as_str(&self) -> &'static str {
        match self {
            TransitionStrategy::Accelerated => "accelerated",
            TransitionStrategy::Animated => "animated",
        }
    }

    /// Initial image styling applied while a slide is prepared.
    pub fn prepare_image<S: Surface + ?Sized>(&self, surface: &mut S, slide: usize, scale: f64) {
        if *self == TransitionStrategy::Accelerated {
            surface.set_style(
                Target::Image(slide),
                &[
                    StyleProp::TransformOrigin { x: 0.0, y: 0.0 },
                    StyleProp::Transform(Transform::new(scale, 0.0, 0.0)),
                ],
            );
        }
    }

    /// Issue the pan from `pair.start` to `pair.end` and the fade-in of the wrapper.
    pub fn issue<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        slide: usize,
        pair: &CornerPair,
        config: &GalleryConfig,
    ) {
        let image = Target::Image(slide);
        match self {
            TransitionStrategy::Accelerated => {
                surface.set_style(
                    image,
                    &[
                        StyleProp::TransformTransition(None),
                        StyleProp::Transform(Transform::new(
                            pair.scale,
                            pair.start_x,
                            pair.start_y,
                        )),
                    ],
                );
                fade_in(surface, slide, config.fade_duration());
                // The engine picks the change up once the transition is back in place.
                surface.set_style(
                    image,
                    &[
                        StyleProp::TransformTransition(Some(TimedEasing {
                            duration: config.pan_duration(),
                            curve: config.easing_curve,
                        })),
                        StyleProp::Transform(Transform::new(1.0, pair.end_x, pair.end_y)),
                    ],
                );
            }
            TransitionStrategy::Animated => {
                surface.set_style(image, &StyleProp::rect(pair.start_rect()));
                surface.animate(
                    image,
                    &StyleProp::rect(pair.end_rect()),
                    config.pan_duration(),
                    Easing::Swing,
                );
                fade_in(surface, slide, config.fade_duration());
            }
        }
    }
}

impl fmt::Display for TransitionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Put the wrapper on top, transparent, and bring it in.
pub fn fade_in<S: Surface + ?Sized>(surface: &mut S, slide: usize, fade: Duration) {
    let wrapper = Target::Slide(slide);
    surface.set_style(
        wrapper,
        &[StyleProp::Opacity(0.0), StyleProp::Layer(RAISED_LAYER)],
    );
    surface.animate(wrapper, &[StyleProp::Opacity(1.0)], fade, Easing::Swing);
}

pub fn fade_out<S: Surface + ?Sized>(surface: &mut S, slide: usize, fade: Duration) {
    surface.animate(
        Target::Slide(slide),
        &[StyleProp::Opacity(0.0)],
        fade,
        Easing::Swing,
    );
}

/// Drop a faded-out slide back under the next incoming one.
pub fn lower<S: Surface + ?Sized>(surface: &mut S, slide: usize) {
    surface.set_style(Target::Slide(slide), &[StyleProp::Layer(BASE_LAYER)]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Corner, Size};
    use crate::surface::headless::HeadlessSurface;

    fn pair() -> CornerPair {
        CornerPair {
            start: Corner::TopLeft,
            end: Corner::BottomRight,
            start_x: 0.0,
            start_y: 0.0,
            end_x: 160.0,
            end_y: 120.0,
            image_width: 640.0,
            image_height: 480.0,
            scale: 1.25,
        }
    }

    fn surface() -> HeadlessSurface {
        HeadlessSurface::new(Size::new(800.0, 600.0), vec![Some(Size::new(4.0, 3.0))])
    }

    #[tokio::test(start_paused = true)]
    async fn accelerated_ends_on_unit_scale_transform() {
        let mut s = surface();
        let cfg = GalleryConfig::default();
        TransitionStrategy::Accelerated.issue(&mut s, 0, &pair(), &cfg);

        let image = s.node(Target::Image(0)).unwrap();
        assert_eq!(image.transform, Some(Transform::new(1.0, 160.0, 120.0)));
        assert_eq!(
            image.transform_transition,
            Some(TimedEasing {
                duration: Duration::from_millis(900),
                curve: cfg.easing_curve,
            })
        );
        assert_eq!(image.left, None);

        let wrapper = s.node(Target::Slide(0)).unwrap();
        assert_eq!(wrapper.opacity, Some(1.0));
        assert_eq!(wrapper.layer, Some(RAISED_LAYER));
        // Pan and fade-in, same as the animated path.
        assert_eq!(s.in_flight(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn animated_moves_box_to_end_rect() {
        let mut s = surface();
        let cfg = GalleryConfig::default();
        TransitionStrategy::Animated.issue(&mut s, 0, &pair(), &cfg);

        let image = s.node(Target::Image(0)).unwrap();
        assert_eq!(image.left, Some(160.0));
        assert_eq!(image.top, Some(120.0));
        assert_eq!(image.width, Some(640.0));
        assert_eq!(image.height, Some(480.0));
        assert_eq!(image.transform, None);
        assert_eq!(s.in_flight(), 2);
    }

    #[test]
    fn only_accelerated_prepares_a_transform() {
        let mut s = surface();
        TransitionStrategy::Animated.prepare_image(&mut s, 0, 1.5);
        assert!(s.node(Target::Image(0)).is_none());

        TransitionStrategy::Accelerated.prepare_image(&mut s, 0, 1.5);
        let image = s.node(Target::Image(0)).unwrap();
        assert_eq!(image.transform, Some(Transform::new(1.5, 0.0, 0.0)));
        assert_eq!(image.transform_origin, Some((0.0, 0.0)));
    }

    #[test]
    fn fade_out_then_lower() {
        let mut s = surface();
        fade_in(&mut s, 0, Duration::ZERO);
        fade_out(&mut s, 0, Duration::ZERO);
        lower(&mut s, 0);
        let wrapper = s.node(Target::Slide(0)).unwrap();
        assert_eq!(wrapper.opacity, Some(0.0));
        assert_eq!(wrapper.layer, Some(BASE_LAYER));
    }
}
