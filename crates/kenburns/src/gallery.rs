use futures::StreamExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::time::{DelayQueue, delay_queue};
use tracing::{debug, error, info, trace, warn};

use crate::config::GalleryConfig;
use crate::error::GalleryError;
use crate::geometry::{Size, choose_corner};
use crate::probe::{self, CapabilityProbe};
use crate::surface::{IMAGE_CLASS, SLIDE_CLASS, StyleProp, Surface, Target};
use crate::transition::{self, TransitionStrategy};

const COMMAND_BUFFER: usize = 16;

/// Snapshot of a running gallery, republished after every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GalleryStatus {
    pub current_index: usize,
    pub total_slides: usize,
    /// Timer fires since attach; the opening transition is not counted.
    pub ticks: u64,
    pub strategy: TransitionStrategy,
    pub running: bool,
}

#[derive(Debug)]
enum GalleryCommand {
    ImageLoaded { slide: usize, natural: Size },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingAction {
    FadeOut(usize),
    Lower(usize),
}

#[derive(Debug, Clone)]
struct Slide {
    aspect_ratio: f64,
    loaded: bool,
    current_size: Option<Size>,
    /// The slide's queued fade-out or lower, if any. At most one is outstanding.
    pending: Option<delay_queue::Key>,
}

impl Slide {
    fn measure(index: usize, natural: Option<Size>, container: Size) -> Self {
        match natural.and_then(|size| size.aspect_ratio()) {
            Some(aspect_ratio) => Self {
                aspect_ratio,
                loaded: true,
                current_size: None,
                pending: None,
            },
            None => {
                // Sized to the container until the real ratio arrives.
                let aspect_ratio = container.aspect_ratio().unwrap_or(1.0);
                debug!(slide = index, aspect_ratio, "image not loaded yet; using container ratio");
                Self {
                    aspect_ratio,
                    loaded: false,
                    current_size: None,
                    pending: None,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct CycleState {
    current_index: usize,
    total_slides: usize,
    ticks: u64,
}

impl CycleState {
    fn current(&self) -> Option<usize> {
        (self.total_slides > 0).then_some(self.current_index)
    }

    fn advance(&mut self) -> Option<usize> {
        self.ticks += 1;
        if self.total_slides == 0 {
            return None;
        }
        self.current_index = (self.current_index + 1) % self.total_slides;
        Some(self.current_index)
    }
}

struct Controller<S> {
    surface: S,
    config: GalleryConfig,
    strategy: TransitionStrategy,
    slides: Vec<Slide>,
    cycle: CycleState,
    rng: StdRng,
    pending: DelayQueue<PendingAction>,
    status: watch::Sender<GalleryStatus>,
}

/// Prepare every slide the surface finds and start cycling through them.
///
/// The probe is consulted exactly once, here; the strategy it picks is kept until the
/// gallery stops. Must be called from within a Tokio runtime. An empty container is not
/// an error: the gallery idles and never calls `on_slide_advance`.
pub fn attach<S, P>(
    mut surface: S,
    mut probe: P,
    config: GalleryConfig,
) -> Result<GalleryHandle<S>, GalleryError>
where
    S: Surface + Send + 'static,
    P: CapabilityProbe,
{
    let runtime = Handle::try_current().map_err(|_| GalleryError::NoRuntime)?;
    let config = config.validated().map_err(GalleryError::Config)?;

    let strategy = probe::select_strategy(&mut probe);
    let slides = prepare_slides(&mut surface, &config, strategy);
    if slides.is_empty() {
        warn!(
            selector = %config.slide_selector,
            "no slides matched; gallery will idle"
        );
    }

    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let cycle = CycleState {
        current_index: 0,
        total_slides: slides.len(),
        ticks: 0,
    };
    let (status_tx, status_rx) = watch::channel(GalleryStatus {
        current_index: 0,
        total_slides: slides.len(),
        ticks: 0,
        strategy,
        running: true,
    });
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let cancel = CancellationToken::new();

    info!(
        slides = slides.len(),
        %strategy,
        step_ms = config.step_duration_ms,
        fade_ms = config.fade_duration_ms,
        zoom = config.zoom_scale,
        "gallery attached"
    );

    let controller = Controller {
        surface,
        config,
        strategy,
        slides,
        cycle,
        rng,
        pending: DelayQueue::new(),
        status: status_tx,
    };
    let origin = Instant::now();
    let task = runtime.spawn(controller.run(origin, command_rx, cancel.clone()));

    Ok(GalleryHandle {
        cancel,
        commands: command_tx,
        status: status_rx,
        task: Some(task),
    })
}

fn prepare_slides<S: Surface>(
    surface: &mut S,
    config: &GalleryConfig,
    strategy: TransitionStrategy,
) -> Vec<Slide> {
    let container = surface.container_size();
    let count = surface.query_slides(&config.slide_selector);
    (0..count)
        .map(|index| {
            surface.add_class(Target::Slide(index), SLIDE_CLASS);
            surface.set_style(Target::Slide(index), &[StyleProp::Opacity(0.0)]);
            surface.add_class(Target::Image(index), IMAGE_CLASS);
            strategy.prepare_image(surface, index, config.zoom_scale);
            Slide::measure(index, surface.natural_size(index), container)
        })
        .collect()
}

impl<S: Surface> Controller<S> {
    /// Drives the gallery until cancelled, then hands the surface back.
    ///
    /// Overrun policy: missed ticks are skipped, not replayed. After a stall one tick
    /// fires right away and the rest of the schedule stays on the `origin + k * step`
    /// grid.
    async fn run(
        mut self,
        origin: Instant,
        mut commands: mpsc::Receiver<GalleryCommand>,
        cancel: CancellationToken,
    ) -> S {
        let step = self.config.step_duration();
        self.transition();

        let mut ticker = time::interval_at(origin + step, step);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                // Before the tick, so an outgoing slide starts fading ahead of its successor.
                Some(expired) = self.pending.next(), if !self.pending.is_empty() => {
                    self.run_pending(expired.into_inner());
                }
                _ = ticker.tick() => self.on_tick(),
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
            }
        }

        self.shutdown();
        self.surface
    }

    fn on_tick(&mut self) {
        match self.cycle.advance() {
            Some(index) => {
                debug!(index, ticks = self.cycle.ticks, "advancing slide");
                self.transition();
            }
            None => {
                trace!(ticks = self.cycle.ticks, "tick with no slides");
                self.publish();
            }
        }
    }

    /// Issue the pan and fade-in for the current slide, schedule its fade-out, and
    /// report the index.
    fn transition(&mut self) {
        let Some(index) = self.cycle.current() else {
            return;
        };
        let container = self.surface.container_size();
        let Some(slide) = self.slides.get_mut(index) else {
            return;
        };

        // Back before its last fade finished: drop the stale follow-up and settle the
        // wrapper so the new fade-in starts clean.
        if let Some(key) = slide.pending.take() {
            let stale = self.pending.remove(&key).into_inner();
            debug!(index, ?stale, "slide re-entered; cancelling queued action");
            self.surface.stop_animations(Target::Slide(index));
            self.surface.stop_animations(Target::Image(index));
        }

        let pair = choose_corner(
            container,
            slide.aspect_ratio,
            self.config.zoom_scale,
            &mut self.rng,
        );
        slide.current_size = Some(pair.image_size());
        trace!(
            index,
            start = ?pair.start,
            end = ?pair.end,
            width = pair.image_width,
            height = pair.image_height,
            "corner pair chosen"
        );

        self.surface
            .set_style(Target::Image(index), &StyleProp::size(pair.image_size()));
        self.strategy
            .issue(&mut self.surface, index, &pair, &self.config);
        slide.pending = Some(
            self.pending
                .insert(PendingAction::FadeOut(index), self.config.step_duration()),
        );

        self.config.on_slide_advance.call(index);
        self.publish();
    }

    fn run_pending(&mut self, action: PendingAction) {
        trace!(?action, "pending action due");
        match action {
            PendingAction::FadeOut(index) => {
                let fade = self.config.fade_duration();
                transition::fade_out(&mut self.surface, index, fade);
                let key = self.pending.insert(PendingAction::Lower(index), fade);
                if let Some(slide) = self.slides.get_mut(index) {
                    slide.pending = Some(key);
                }
            }
            PendingAction::Lower(index) => {
                if let Some(slide) = self.slides.get_mut(index) {
                    slide.pending = None;
                }
                transition::lower(&mut self.surface, index);
            }
        }
    }

    fn on_command(&mut self, command: GalleryCommand) {
        match command {
            GalleryCommand::ImageLoaded { slide, natural } => {
                let Some(entry) = self.slides.get_mut(slide) else {
                    warn!(slide, total = self.slides.len(), "load reported for unknown slide");
                    return;
                };
                match natural.aspect_ratio() {
                    Some(aspect_ratio) => {
                        debug!(
                            slide,
                            aspect_ratio,
                            was_loaded = entry.loaded,
                            last_size = ?entry.current_size,
                            "image loaded; aspect ratio updated"
                        );
                        entry.aspect_ratio = aspect_ratio;
                        entry.loaded = true;
                    }
                    None => warn!(slide, %natural, "ignoring load with unusable dimensions"),
                }
            }
        }
    }

    fn shutdown(&mut self) {
        let dropped = self.pending.len();
        self.pending.clear();
        for slide in &mut self.slides {
            slide.pending = None;
        }
        for index in 0..self.slides.len() {
            self.surface.stop_animations(Target::Slide(index));
            self.surface.stop_animations(Target::Image(index));
        }
        info!(
            dropped_actions = dropped,
            ticks = self.cycle.ticks,
            "gallery stopped"
        );
        let mut status = self.snapshot();
        status.running = false;
        self.status.send_replace(status);
    }

    fn snapshot(&self) -> GalleryStatus {
        GalleryStatus {
            current_index: self.cycle.current_index,
            total_slides: self.cycle.total_slides,
            ticks: self.cycle.ticks,
            strategy: self.strategy,
            running: true,
        }
    }

    fn publish(&self) {
        self.status.send_replace(self.snapshot());
    }
}

/// Owner of a running gallery. Dropping it stops the gallery.
pub struct GalleryHandle<S> {
    cancel: CancellationToken,
    commands: mpsc::Sender<GalleryCommand>,
    status: watch::Receiver<GalleryStatus>,
    task: Option<JoinHandle<S>>,
}

impl<S> GalleryHandle<S> {
    pub fn status(&self) -> GalleryStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<GalleryStatus> {
        self.status.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && self.status.borrow().running
    }

    /// Report that a slide's image finished loading so later pans use its real ratio.
    pub async fn image_loaded(&self, slide: usize, natural: Size) -> Result<(), GalleryError> {
        if self.cancel.is_cancelled() {
            return Err(GalleryError::Stopped);
        }
        let total = self.status.borrow().total_slides;
        if slide >= total {
            return Err(GalleryError::SlideOutOfRange { slide, total });
        }
        self.commands
            .send(GalleryCommand::ImageLoaded { slide, natural })
            .await
            .map_err(|_| GalleryError::Stopped)
    }

    /// Ask the scheduler to stop without waiting for it.
    pub fn dispose(&self) {
        self.cancel.cancel();
    }

    /// Stop the scheduler, wait for it to release its timer and animations, and take the
    /// surface back.
    pub async fn stop(mut self) -> Option<S> {
        self.cancel.cancel();
        let task = self.task.take()?;
        match task.await {
            Ok(surface) => Some(surface),
            Err(err) => {
                error!(error = %err, "gallery task failed");
                None
            }
        }
    }
}

impl<S> Drop for GalleryHandle<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
