//! Scroll and entrance effects for the portfolio pages.
//!
//! [`Animator`] bundles a [`RenderSurface`] with an [`AnimationEngine`] and
//! exposes one method per effect. Every effect follows the same contract:
//!
//! - on a non-interactive surface it returns `Ok(None)` and touches nothing;
//! - options are validated before any work happens;
//! - a target that matches no node logs a warning and returns `Ok(None)`;
//! - otherwise scaffolding is built, a [`Timeline`] is handed to the engine,
//!   and a handle comes back so the caller can kill it later.
//!
//! Effects share no state with each other.

use tracing::{debug, warn};

use crate::{
    render::{NodeId, RenderSurface, Target},
    timeline::{
        AnimationEngine, AnimationHandle, Easing, Property, Repeat, ScrollTrigger, Timeline, Tween,
    },
    Result,
};

mod options;
mod text_fill;
mod typewriter;

pub use options::{
    CascadeInOptions, FadeUpOptions, ParallaxScrollOptions, PulseOptions, RotateInfiniteOptions,
    TextFillOptions, TypewriterOptions,
};
pub use text_fill::TextFillEntry;
pub use typewriter::TypewriterHandle;

pub struct Animator<S, E> {
    surface: S,
    engine: E,
}

impl<S, E> Animator<S, E>
where
    S: RenderSurface,
    E: AnimationEngine,
{
    pub fn new(surface: S, engine: E) -> Self {
        Self { surface, engine }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn into_parts(self) -> (S, E) {
        (self.surface, self.engine)
    }

    /// Animates elements in from an offset, faded state, one after another.
    pub fn cascade_in(
        &mut self,
        targets: impl Into<Target>,
        options: CascadeInOptions,
    ) -> Result<Option<AnimationHandle>> {
        if !self.surface.is_interactive() {
            return Ok(None);
        }
        options.validate()?;
        let Some(nodes) = self.resolve("cascade_in", &targets.into()) else {
            return Ok(None);
        };

        let tween = Tween::from_props(
            nodes,
            vec![
                Property::Opacity(options.opacity),
                Property::Y(options.y),
                Property::X(options.x),
                Property::Scale(options.scale),
                Property::Rotation(options.rotation),
            ],
        )
        .duration(options.duration)
        .stagger(options.stagger)
        .delay(options.delay)
        .ease(options.ease);

        Ok(Some(self.launch(Timeline::single(tween))))
    }

    /// Spins elements around their centre forever.
    pub fn rotate_infinite(
        &mut self,
        target: impl Into<Target>,
        options: RotateInfiniteOptions,
    ) -> Result<Option<AnimationHandle>> {
        if !self.surface.is_interactive() {
            return Ok(None);
        }
        options.validate()?;
        let Some(nodes) = self.resolve("rotate_infinite", &target.into()) else {
            return Ok(None);
        };

        let turn = if options.clockwise { 360.0 } else { -360.0 };
        let tween = Tween::to(
            nodes,
            vec![
                Property::Rotation(turn),
                Property::TransformOrigin("center".to_string()),
            ],
        )
        .duration(options.duration)
        .repeat(Repeat::Infinite)
        .ease(options.ease);

        Ok(Some(self.launch(Timeline::single(tween))))
    }

    /// Grows and shrinks elements forever, or swings an attribute when one is
    /// configured.
    pub fn pulse(
        &mut self,
        target: impl Into<Target>,
        options: PulseOptions,
    ) -> Result<Option<AnimationHandle>> {
        if !self.surface.is_interactive() {
            return Ok(None);
        }
        options.validate()?;
        let Some(nodes) = self.resolve("pulse", &target.into()) else {
            return Ok(None);
        };

        let property = match options.attribute_pulse() {
            Some((name, value)) => Property::Attr(name.to_string(), value),
            None => Property::Scale(options.scale),
        };
        let tween = Tween::to(nodes, vec![property])
            .duration(options.duration)
            .repeat(Repeat::Infinite)
            .yoyo(true)
            .ease(options.ease);

        Ok(Some(self.launch(Timeline::single(tween))))
    }

    /// Moves elements at a different rate than the page while the trigger
    /// scrolls through the viewport.
    pub fn parallax_scroll(
        &mut self,
        target: impl Into<Target>,
        options: ParallaxScrollOptions,
    ) -> Result<Option<AnimationHandle>> {
        if !self.surface.is_interactive() {
            return Ok(None);
        }
        options.validate()?;
        let Some(nodes) = self.resolve("parallax_scroll", &target.into()) else {
            return Ok(None);
        };
        let trigger = self.resolve_trigger("parallax_scroll", options.trigger.as_ref(), &nodes);
        let Some(trigger) = trigger else {
            return Ok(None);
        };

        let tween = Tween::to(
            nodes,
            vec![
                Property::Y(options.y),
                Property::X(options.x),
                Property::Rotation(options.rotation),
            ],
        )
        .ease(Easing::None);
        let timeline = Timeline::single(tween).with_scroll_trigger(ScrollTrigger::scrubbed(
            trigger,
            options.start,
            options.end,
            options.scrub,
        ));

        Ok(Some(self.launch(timeline)))
    }

    /// Fades elements up into place, either straight away or when they scroll
    /// into view.
    pub fn fade_up(
        &mut self,
        target: impl Into<Target>,
        options: FadeUpOptions,
    ) -> Result<Option<AnimationHandle>> {
        if !self.surface.is_interactive() {
            return Ok(None);
        }
        options.validate()?;
        let Some(nodes) = self.resolve("fade_up", &target.into()) else {
            return Ok(None);
        };
        let trigger = if options.immediate {
            None
        } else {
            match self.resolve_trigger("fade_up", options.trigger.as_ref(), &nodes) {
                Some(trigger) => Some(trigger),
                None => return Ok(None),
            }
        };

        // The start state is applied now, outside the timeline, so elements
        // stay hidden until their trigger fires.
        self.engine.play(Timeline::single(Tween::set(
            nodes.clone(),
            vec![Property::Y(options.y), Property::Opacity(options.opacity)],
        )));

        let reveal = Tween::to(nodes, vec![Property::Y(0.0), Property::Opacity(1.0)])
            .duration(options.duration)
            .ease(options.ease)
            .stagger(options.stagger);

        let timeline = match trigger {
            Some(trigger) => Timeline::single(reveal).with_scroll_trigger(ScrollTrigger::toggled(
                trigger,
                options.start,
                options.end,
                options.toggle_actions,
            )),
            None => {
                let mut timeline = Timeline::single(reveal);
                timeline.delay = options.delay;
                timeline
            }
        };

        Ok(Some(self.launch(timeline)))
    }

    /// Registers the site-wide fade-up presets: the hero plays on load, the
    /// remaining groups wait for their scroll trigger.
    pub fn init_fade_up_animations(&mut self) -> Result<Vec<AnimationHandle>> {
        let presets = [
            (
                ".hero-content, .first-section",
                FadeUpOptions {
                    immediate: true,
                    delay: 0.3,
                    duration: 1.2,
                    ..Default::default()
                },
            ),
            (
                ".fade-up:not(.hero-content):not(.first-section)",
                FadeUpOptions::default(),
            ),
            (
                ".section-content",
                FadeUpOptions {
                    y: 80.0,
                    duration: 1.2,
                    start: "top 70%".parse()?,
                    ..Default::default()
                },
            ),
            (
                ".card-item",
                FadeUpOptions {
                    y: 60.0,
                    stagger: 0.15,
                    start: "top 85%".parse()?,
                    ..Default::default()
                },
            ),
        ];

        let mut handles = Vec::new();
        for (selector, options) in presets {
            if let Some(handle) = self.fade_up(selector, options)? {
                handles.push(handle);
            }
        }
        Ok(handles)
    }

    /// Kills every scroll trigger the engine knows about. Returns how many
    /// were removed.
    pub fn kill_all_scroll_triggers(&mut self) -> usize {
        if !self.surface.is_interactive() {
            return 0;
        }
        let killed = self.engine.kill_scroll_triggers();
        debug!(killed, "killed scroll triggers");
        killed
    }

    /// Hands a caller-built timeline to the engine.
    pub fn create_timeline(&mut self, timeline: Timeline) -> Option<AnimationHandle> {
        if !self.surface.is_interactive() {
            return None;
        }
        Some(self.launch(timeline))
    }

    fn resolve(&self, operation: &'static str, target: &Target) -> Option<Vec<NodeId>> {
        let nodes = self.surface.resolve(target);
        if nodes.is_empty() {
            warn!(operation, %target, "animation target not found");
            return None;
        }
        Some(nodes)
    }

    fn resolve_trigger(
        &self,
        operation: &'static str,
        trigger: Option<&Target>,
        fallback: &[NodeId],
    ) -> Option<Vec<NodeId>> {
        match trigger {
            Some(trigger) => self.resolve(operation, trigger),
            None => Some(fallback.to_vec()),
        }
    }

    fn launch(&mut self, timeline: Timeline) -> AnimationHandle {
        let id = self.engine.play(timeline.clone());
        AnimationHandle { id, timeline }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::{
        collections::BTreeSet,
        io,
        sync::{Arc, Mutex},
    };

    use tracing_subscriber::fmt::MakeWriter;

    use crate::timeline::{AnimationEngine, AnimationId, Timeline};

    /// In-memory sink for formatted log lines.
    #[derive(Debug, Clone, Default)]
    pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Runs `f` with a thread-local subscriber and returns what it logged.
    pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let value = tracing::subscriber::with_default(subscriber, f);
        (value, logs.contents())
    }

    /// Engine that records what it is asked to do.
    #[derive(Debug, Default)]
    pub struct RecordingEngine {
        pub played: Vec<Timeline>,
        pub killed: Vec<AnimationId>,
        live_triggers: BTreeSet<u64>,
    }

    impl AnimationEngine for RecordingEngine {
        fn play(&mut self, timeline: Timeline) -> AnimationId {
            let id = self.played.len() as u64;
            if timeline.scroll_trigger.is_some() {
                self.live_triggers.insert(id);
            }
            self.played.push(timeline);
            AnimationId(id)
        }

        fn kill(&mut self, id: AnimationId) {
            self.live_triggers.remove(&id.0);
            self.killed.push(id);
        }

        fn kill_scroll_triggers(&mut self) -> usize {
            let count = self.live_triggers.len();
            self.live_triggers.clear();
            count
        }
    }
}
