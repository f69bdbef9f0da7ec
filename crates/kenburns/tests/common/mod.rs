#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use kenburns_gallery::{Easing, Size, StyleProp, Surface, Target};
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Query(String),
    AddClass(Target, String),
    Set(Target, Vec<StyleProp>),
    Animate(Target, Vec<StyleProp>, Duration, Easing),
    Stop(Target),
    Advanced(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub at_ms: u128,
    pub op: Op,
}

/// Shared, time-stamped record of everything a gallery did.
#[derive(Clone)]
pub struct Log {
    start: Instant,
    events: Arc<Mutex<Vec<Event>>>,
}

impl Log {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn push(&self, op: Op) {
        let at_ms = self.start.elapsed().as_millis();
        self.events.lock().unwrap().push(Event { at_ms, op });
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// `(at_ms, index)` for every `on_slide_advance` call.
    pub fn advances(&self) -> Vec<(u128, usize)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e.op {
                Op::Advanced(index) => Some((e.at_ms, index)),
                _ => None,
            })
            .collect()
    }

    pub fn hook(&self) -> impl Fn(usize) + Send + Sync + 'static {
        let log = self.clone();
        move |index| log.push(Op::Advanced(index))
    }
}

pub struct RecordingSurface {
    container: Size,
    images: Vec<Option<Size>>,
    log: Log,
}

impl RecordingSurface {
    pub fn new(container: Size, images: Vec<Option<Size>>, log: &Log) -> Self {
        Self {
            container,
            images,
            log: log.clone(),
        }
    }

    /// `count` loaded 4:3 images in an 800x600 container.
    pub fn with_slides(count: usize, log: &Log) -> Self {
        Self::new(
            Size::new(800.0, 600.0),
            vec![Some(Size::new(1600.0, 1200.0)); count],
            log,
        )
    }
}

impl Surface for RecordingSurface {
    fn container_size(&self) -> Size {
        self.container
    }

    fn query_slides(&mut self, selector: &str) -> usize {
        self.log.push(Op::Query(selector.to_string()));
        self.images.len()
    }

    fn natural_size(&self, slide: usize) -> Option<Size> {
        self.images.get(slide).copied().flatten()
    }

    fn add_class(&mut self, target: Target, class: &str) {
        self.log.push(Op::AddClass(target, class.to_string()));
    }

    fn set_style(&mut self, target: Target, props: &[StyleProp]) {
        self.log.push(Op::Set(target, props.to_vec()));
    }

    fn animate(&mut self, target: Target, props: &[StyleProp], duration: Duration, easing: Easing) {
        self.log
            .push(Op::Animate(target, props.to_vec(), duration, easing));
    }

    fn stop_animations(&mut self, target: Target) {
        self.log.push(Op::Stop(target));
    }
}

/// Let spawned tasks run without moving the paused clock.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// Move the paused clock forward by `ms`, firing every timer on the way.
pub async fn run_for(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    settle().await;
}

pub fn fade_in(slide: usize, fade_ms: u64) -> Op {
    Op::Animate(
        Target::Slide(slide),
        vec![StyleProp::Opacity(1.0)],
        Duration::from_millis(fade_ms),
        Easing::Swing,
    )
}

pub fn fade_out(slide: usize, fade_ms: u64) -> Op {
    Op::Animate(
        Target::Slide(slide),
        vec![StyleProp::Opacity(0.0)],
        Duration::from_millis(fade_ms),
        Easing::Swing,
    )
}
