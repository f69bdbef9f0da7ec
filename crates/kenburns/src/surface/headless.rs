use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use super::{Easing, StyleProp, Surface, Target, TimedEasing, Transform};
use crate::geometry::Size;

/// Last applied value of every property the gallery touches on one node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeState {
    pub classes: Vec<String>,
    pub opacity: Option<f64>,
    pub layer: Option<i32>,
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub transform: Option<Transform>,
    pub transform_origin: Option<(f64, f64)>,
    pub transform_transition: Option<TimedEasing>,
    animating_until: Option<Instant>,
}

impl NodeState {
    fn apply(&mut self, prop: &StyleProp) {
        match *prop {
            StyleProp::Opacity(v) => self.opacity = Some(v),
            StyleProp::Layer(v) => self.layer = Some(v),
            StyleProp::Left(v) => self.left = Some(v),
            StyleProp::Top(v) => self.top = Some(v),
            StyleProp::Width(v) => self.width = Some(v),
            StyleProp::Height(v) => self.height = Some(v),
            StyleProp::Transform(t) => self.transform = Some(t),
            StyleProp::TransformOrigin { x, y } => self.transform_origin = Some((x, y)),
            StyleProp::TransformTransition(t) => self.transform_transition = t,
        }
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.animating_until.is_some_and(|until| until > now)
    }
}

/// In-memory surface with no renderer behind it.
///
/// Styles land immediately; an animation jumps to its end values and is only
/// remembered as "in flight" until its duration has passed. Every command is logged,
/// which makes this the surface of choice for previews and dry runs.
#[derive(Debug)]
pub struct HeadlessSurface {
    container: Size,
    images: Vec<Option<Size>>,
    nodes: HashMap<Target, NodeState>,
    commands: u64,
}

impl HeadlessSurface {
    pub fn new(container: Size, images: Vec<Option<Size>>) -> Self {
        Self {
            container,
            images,
            nodes: HashMap::new(),
            commands: 0,
        }
    }

    pub fn node(&self, target: Target) -> Option<&NodeState> {
        self.nodes.get(&target)
    }

    pub fn commands_issued(&self) -> u64 {
        self.commands
    }

    pub fn in_flight(&self) -> usize {
        let now = Instant::now();
        self.nodes.values().filter(|n| n.is_animating(now)).count()
    }

    /// Report a late image load, as a browser would once the bytes arrive.
    pub fn set_natural_size(&mut self, slide: usize, size: Size) {
        if let Some(entry) = self.images.get_mut(slide) {
            *entry = Some(size);
        }
    }

    fn node_mut(&mut self, target: Target) -> &mut NodeState {
        self.commands += 1;
        self.nodes.entry(target).or_default()
    }
}

impl Surface for HeadlessSurface {
    fn container_size(&self) -> Size {
        self.container
    }

    fn query_slides(&mut self, selector: &str) -> usize {
        debug!(selector, count = self.images.len(), "slides queried");
        self.images.len()
    }

    fn natural_size(&self, slide: usize) -> Option<Size> {
        self.images.get(slide).copied().flatten()
    }

    fn add_class(&mut self, target: Target, class: &str) {
        let node = self.node_mut(target);
        if !node.classes.iter().any(|c| c == class) {
            node.classes.push(class.to_string());
        }
    }

    fn set_style(&mut self, target: Target, props: &[StyleProp]) {
        trace!(node = ?target, ?props, "set style");
        let node = self.node_mut(target);
        for prop in props {
            node.apply(prop);
            // The engine runs transform transitions itself; track them like animations.
            match prop {
                StyleProp::TransformTransition(Some(timed)) => {
                    node.animating_until = Some(Instant::now() + timed.duration);
                }
                StyleProp::TransformTransition(None) => node.animating_until = None,
                _ => {}
            }
        }
    }

    fn animate(&mut self, target: Target, props: &[StyleProp], duration: Duration, easing: Easing) {
        debug!(
            node = ?target,
            slide = target.slide_index(),
            ?props,
            duration_ms = duration.as_millis() as u64,
            ?easing,
            "animate"
        );
        let node = self.node_mut(target);
        for prop in props {
            node.apply(prop);
        }
        node.animating_until = Some(Instant::now() + duration);
    }

    fn stop_animations(&mut self, target: Target) {
        if let Some(node) = self.nodes.get_mut(&target) {
            if node.animating_until.take().is_some() {
                trace!(node = ?target, "animation stopped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EasingCurve;
    use crate::surface::{IMAGE_CLASS, SLIDE_CLASS};

    fn surface() -> HeadlessSurface {
        HeadlessSurface::new(
            Size::new(800.0, 600.0),
            vec![Some(Size::new(1600.0, 1200.0)), None],
        )
    }

    #[test]
    fn reports_measurements() {
        let mut s = surface();
        assert_eq!(s.query_slides(".kb-slide"), 2);
        assert_eq!(s.container_size(), Size::new(800.0, 600.0));
        assert_eq!(s.natural_size(0), Some(Size::new(1600.0, 1200.0)));
        assert_eq!(s.natural_size(1), None);
        assert_eq!(s.natural_size(9), None);

        s.set_natural_size(1, Size::new(10.0, 20.0));
        assert_eq!(s.natural_size(1), Some(Size::new(10.0, 20.0)));
    }

    #[test]
    fn classes_are_not_duplicated() {
        let mut s = surface();
        s.add_class(Target::Slide(0), SLIDE_CLASS);
        s.add_class(Target::Slide(0), SLIDE_CLASS);
        s.add_class(Target::Image(0), IMAGE_CLASS);
        assert_eq!(s.node(Target::Slide(0)).unwrap().classes, vec![SLIDE_CLASS]);
        assert_eq!(s.node(Target::Image(0)).unwrap().classes, vec![IMAGE_CLASS]);
        assert_eq!(s.commands_issued(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn animations_land_on_end_values_and_expire() {
        let mut s = surface();
        s.set_style(Target::Slide(0), &[StyleProp::Opacity(0.0), StyleProp::Layer(3)]);
        s.animate(
            Target::Slide(0),
            &[StyleProp::Opacity(1.0)],
            Duration::from_millis(500),
            Easing::Swing,
        );
        let node = s.node(Target::Slide(0)).unwrap();
        assert_eq!(node.opacity, Some(1.0));
        assert_eq!(node.layer, Some(3));
        assert_eq!(s.in_flight(), 1);

        tokio::time::advance(Duration::from_millis(501)).await;
        assert_eq!(s.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn transform_transition_counts_as_in_flight() {
        let mut s = surface();
        let image = Target::Image(0);
        s.set_style(
            image,
            &[
                StyleProp::TransformTransition(None),
                StyleProp::Transform(Transform::new(1.25, 0.0, 0.0)),
            ],
        );
        assert_eq!(s.in_flight(), 0);

        s.set_style(
            image,
            &[
                StyleProp::TransformTransition(Some(TimedEasing {
                    duration: Duration::from_millis(900),
                    curve: EasingCurve::DEFAULT,
                })),
                StyleProp::Transform(Transform::new(1.0, -40.0, -30.0)),
            ],
        );
        assert_eq!(s.in_flight(), 1);
        assert_eq!(
            s.node(image).unwrap().transform,
            Some(Transform::new(1.0, -40.0, -30.0))
        );

        tokio::time::advance(Duration::from_millis(899)).await;
        assert_eq!(s.in_flight(), 1);
        tokio::time::advance(Duration::from_millis(2)).await;
        assert_eq!(s.in_flight(), 0);

        // Clearing the transition snaps the transform and ends tracking.
        s.set_style(
            image,
            &[StyleProp::TransformTransition(Some(TimedEasing {
                duration: Duration::from_millis(900),
                curve: EasingCurve::DEFAULT,
            }))],
        );
        s.set_style(image, &[StyleProp::TransformTransition(None)]);
        assert_eq!(s.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_in_flight_animation() {
        let mut s = surface();
        s.animate(
            Target::Image(1),
            &StyleProp::size(Size::new(100.0, 50.0)),
            Duration::from_secs(1),
            Easing::Swing,
        );
        assert_eq!(s.in_flight(), 1);
        s.stop_animations(Target::Image(1));
        assert_eq!(s.in_flight(), 0);
        let node = s.node(Target::Image(1)).unwrap();
        assert_eq!((node.width, node.height), (Some(100.0), Some(50.0)));
    }
}
