//! Declarative animation descriptors handed to an [`AnimationEngine`].
//!
//! Nothing here interpolates. A [`Timeline`] states start/end properties,
//! durations and scroll bindings; the engine owns playback.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{render::NodeId, PortfolioError, Result};

mod scroll;

pub use scroll::{Anchor, ScrollPosition, ScrollTrigger, Scrub, ToggleAction, ToggleActions};

/// Direction variant of a named easing curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EaseDirection {
    In,
    Out,
    InOut,
}

/// Easing curves understood by the engine, written the way the engine spells
/// them (`power2.out`, `steps(1)`, `none`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Easing {
    None,
    Power(u8, EaseDirection),
    Sine(EaseDirection),
    Steps(u32),
}

impl Default for Easing {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = |d: &EaseDirection| match d {
            EaseDirection::In => "in",
            EaseDirection::Out => "out",
            EaseDirection::InOut => "inOut",
        };
        match self {
            Easing::None => write!(f, "none"),
            Easing::Power(level, d) => write!(f, "power{level}.{}", direction(d)),
            Easing::Sine(d) => write!(f, "sine.{}", direction(d)),
            Easing::Steps(n) => write!(f, "steps({n})"),
        }
    }
}

impl FromStr for Easing {
    type Err = PortfolioError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || PortfolioError::invalid_option("ease", format!("unknown easing `{s}`"));
        let s = s.trim();

        if s == "none" || s == "linear" {
            return Ok(Easing::None);
        }
        if let Some(count) = s.strip_prefix("steps(").and_then(|r| r.strip_suffix(')')) {
            return count.trim().parse().map(Easing::Steps).map_err(|_| invalid());
        }

        let (name, direction) = s.split_once('.').unwrap_or((s, "out"));
        let direction = match direction {
            "in" => EaseDirection::In,
            "out" => EaseDirection::Out,
            "inOut" => EaseDirection::InOut,
            _ => return Err(invalid()),
        };
        match name {
            "sine" => Ok(Easing::Sine(direction)),
            _ => match name.strip_prefix("power").map(str::parse::<u8>) {
                Some(Ok(level)) if (1..=4).contains(&level) => Ok(Easing::Power(level, direction)),
                _ => Err(invalid()),
            },
        }
    }
}

impl TryFrom<String> for Easing {
    type Error = PortfolioError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Easing> for String {
    fn from(value: Easing) -> Self {
        value.to_string()
    }
}

/// A single tweenable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    Opacity(f32),
    X(f32),
    Y(f32),
    Scale(f32),
    Rotation(f32),
    /// Replaces the target's text, revealing it character by character.
    Text(String),
    ClipPath(String),
    Attr(String, f32),
    TransformOrigin(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TweenKind {
    /// Animate from the current state to the given properties.
    To,
    /// Animate from the given properties to the current state.
    From,
    /// Apply the properties immediately.
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Repeat {
    Times(u32),
    Infinite,
}

impl Default for Repeat {
    fn default() -> Self {
        Self::Times(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    pub kind: TweenKind,
    pub targets: Vec<NodeId>,
    pub properties: Vec<Property>,
    pub duration: f32,
    pub delay: f32,
    pub ease: Easing,
    pub stagger: f32,
    pub repeat: Repeat,
    pub yoyo: bool,
}

impl Tween {
    pub fn to(targets: Vec<NodeId>, properties: Vec<Property>) -> Self {
        Self::new(TweenKind::To, targets, properties)
    }

    pub fn from_props(targets: Vec<NodeId>, properties: Vec<Property>) -> Self {
        Self::new(TweenKind::From, targets, properties)
    }

    pub fn set(targets: Vec<NodeId>, properties: Vec<Property>) -> Self {
        let mut tween = Self::new(TweenKind::Set, targets, properties);
        tween.duration = 0.0;
        tween
    }

    fn new(kind: TweenKind, targets: Vec<NodeId>, properties: Vec<Property>) -> Self {
        Self {
            kind,
            targets,
            properties,
            duration: 0.5,
            delay: 0.0,
            ease: Easing::None,
            stagger: 0.0,
            repeat: Repeat::default(),
            yoyo: false,
        }
    }

    pub fn duration(mut self, seconds: f32) -> Self {
        self.duration = seconds;
        self
    }

    pub fn delay(mut self, seconds: f32) -> Self {
        self.delay = seconds;
        self
    }

    pub fn ease(mut self, ease: Easing) -> Self {
        self.ease = ease;
        self
    }

    pub fn stagger(mut self, seconds: f32) -> Self {
        self.stagger = seconds;
        self
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    /// Seconds the tween occupies on its timeline, ignoring repeats.
    pub fn span(&self) -> f32 {
        let staggered = self.stagger * self.targets.len().saturating_sub(1) as f32;
        self.delay + self.duration + staggered
    }
}

/// Side effects the engine runs when the playhead reaches a [`Step::Call`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Callback {
    /// Start an independent tween that outlives the step (a blinking cursor).
    SpawnTween(Tween),
    /// Kill tweens started by [`Callback::SpawnTween`] on `target` and apply
    /// `reset` to it.
    KillSpawned {
        target: NodeId,
        reset: Vec<Property>,
    },
}

/// Where a step is placed on its timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Position {
    /// After the previous step ends.
    Sequential,
    /// At an absolute offset in seconds.
    At(f32),
    /// At a previously added label.
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    Tween { tween: Tween, position: Position },
    Label(String),
    Pause(f32),
    Call { callback: Callback, position: Position },
}

/// Ordered set of steps with optional scroll binding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub repeat: Repeat,
    pub delay: f32,
    pub scroll_trigger: Option<ScrollTrigger>,
    pub steps: Vec<Step>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeline wrapping a single tween.
    pub fn single(tween: Tween) -> Self {
        let mut timeline = Self::new();
        timeline.push(tween);
        timeline
    }

    pub fn with_scroll_trigger(mut self, trigger: ScrollTrigger) -> Self {
        self.scroll_trigger = Some(trigger);
        self
    }

    pub fn push(&mut self, tween: Tween) -> &mut Self {
        self.push_at(tween, Position::Sequential)
    }

    pub fn push_at(&mut self, tween: Tween, position: Position) -> &mut Self {
        self.steps.push(Step::Tween { tween, position });
        self
    }

    pub fn label(&mut self, name: impl Into<String>) -> &mut Self {
        self.steps.push(Step::Label(name.into()));
        self
    }

    pub fn pause(&mut self, seconds: f32) -> &mut Self {
        self.steps.push(Step::Pause(seconds));
        self
    }

    pub fn call(&mut self, callback: Callback, position: Position) -> &mut Self {
        self.steps.push(Step::Call { callback, position });
        self
    }

    pub fn tweens(&self) -> impl Iterator<Item = &Tween> {
        self.steps.iter().filter_map(|step| match step {
            Step::Tween { tween, .. } => Some(tween),
            _ => None,
        })
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.steps
            .iter()
            .any(|step| matches!(step, Step::Label(label) if label == name))
    }

    /// Length of one pass through the timeline, in seconds. Steps placed at
    /// labels or absolute offsets overlap and do not extend it.
    pub fn duration(&self) -> f32 {
        self.steps
            .iter()
            .map(|step| match step {
                Step::Tween {
                    tween,
                    position: Position::Sequential,
                } => tween.span(),
                Step::Pause(seconds) => *seconds,
                _ => 0.0,
            })
            .sum()
    }
}

/// Identifier the engine assigns to a playing timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimationId(pub u64);

/// External animation engine. Implementations interpolate, schedule and bind
/// scroll triggers; this crate only describes what should happen.
pub trait AnimationEngine {
    fn play(&mut self, timeline: Timeline) -> AnimationId;

    /// Stops a timeline and everything it spawned. Unknown ids are ignored.
    fn kill(&mut self, id: AnimationId);

    /// Kills every registered scroll trigger and returns how many were live.
    fn kill_scroll_triggers(&mut self) -> usize;
}

/// A timeline that has been handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationHandle {
    pub id: AnimationId,
    pub timeline: Timeline,
}

impl AnimationHandle {
    pub fn kill<E: AnimationEngine + ?Sized>(&self, engine: &mut E) {
        engine.kill(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_prints_easings() {
        for spelled in ["none", "power2.out", "power1.inOut", "sine.in", "steps(1)"] {
            let ease: Easing = spelled.parse().unwrap();
            assert_eq!(ease.to_string(), spelled);
        }
        assert_eq!("power3".parse::<Easing>().unwrap(), Easing::Power(3, EaseDirection::Out));
        assert_eq!("linear".parse::<Easing>().unwrap(), Easing::None);
    }

    #[test]
    fn rejects_unknown_easings() {
        for bad in ["bounce.out", "power9.in", "power2.sideways", "steps(x)"] {
            assert!(bad.parse::<Easing>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn easing_serializes_as_engine_string() {
        let json = serde_json::to_string(&Easing::Power(2, EaseDirection::Out)).unwrap();
        assert_eq!(json, "\"power2.out\"");
    }

    #[test]
    fn sequential_steps_extend_duration() {
        let nodes = vec![NodeId(1), NodeId(2), NodeId(3)];
        let mut timeline = Timeline::new();
        timeline
            .push(Tween::to(nodes.clone(), vec![Property::Opacity(1.0)]).duration(1.0).stagger(0.5))
            .label("rest")
            .pause(2.0)
            .push_at(
                Tween::to(nodes, vec![Property::Y(0.0)]).duration(10.0),
                Position::Label("rest".into()),
            );

        assert_eq!(timeline.duration(), 4.0);
        assert!(timeline.has_label("rest"));
        assert_eq!(timeline.tweens().count(), 2);
    }

    #[test]
    fn set_tweens_are_instant() {
        let tween = Tween::set(vec![NodeId(0)], vec![Property::Opacity(1.0)]);
        assert_eq!(tween.kind, TweenKind::Set);
        assert_eq!(tween.span(), 0.0);
    }
}
