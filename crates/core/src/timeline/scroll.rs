use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{render::NodeId, PortfolioError, Result};

/// One side of a scroll boundary, measured on the trigger element or on the
/// viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Anchor {
    Top,
    Center,
    Bottom,
    Percent(f32),
    Pixels(f32),
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::Top => write!(f, "top"),
            Anchor::Center => write!(f, "center"),
            Anchor::Bottom => write!(f, "bottom"),
            Anchor::Percent(value) => write!(f, "{value}%"),
            Anchor::Pixels(value) => write!(f, "{value}px"),
        }
    }
}

impl FromStr for Anchor {
    type Err = PortfolioError;

    fn from_str(s: &str) -> Result<Self> {
        let number = |raw: &str| {
            raw.parse::<f32>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| {
                    PortfolioError::invalid_option("scroll position", format!("bad anchor `{s}`"))
                })
        };
        match s {
            "top" => Ok(Anchor::Top),
            "center" => Ok(Anchor::Center),
            "bottom" => Ok(Anchor::Bottom),
            _ => match (s.strip_suffix('%'), s.strip_suffix("px")) {
                (Some(raw), _) => number(raw).map(Anchor::Percent),
                (_, Some(raw)) => number(raw).map(Anchor::Pixels),
                _ => number(s).map(Anchor::Pixels),
            },
        }
    }
}

/// A `"<element> <viewport>"` boundary such as `top 80%`: the trigger fires
/// when the element's anchor meets the viewport's anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScrollPosition {
    pub element: Anchor,
    pub viewport: Anchor,
}

impl ScrollPosition {
    pub const fn new(element: Anchor, viewport: Anchor) -> Self {
        Self { element, viewport }
    }
}

impl fmt::Display for ScrollPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element, self.viewport)
    }
}

impl FromStr for ScrollPosition {
    type Err = PortfolioError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(element), Some(viewport), None) => Ok(Self {
                element: element.parse()?,
                viewport: viewport.parse()?,
            }),
            // A lone anchor applies to the element, against the viewport top.
            (Some(element), None, None) => Ok(Self {
                element: element.parse()?,
                viewport: Anchor::Top,
            }),
            _ => Err(PortfolioError::invalid_option(
                "scroll position",
                format!("expected `<element> <viewport>`, got `{s}`"),
            )),
        }
    }
}

impl TryFrom<String> for ScrollPosition {
    type Error = PortfolioError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ScrollPosition> for String {
    fn from(value: ScrollPosition) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToggleAction {
    Play,
    Pause,
    Resume,
    Reset,
    Restart,
    Complete,
    Reverse,
    None,
}

impl FromStr for ToggleAction {
    type Err = PortfolioError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "play" => Self::Play,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "reset" => Self::Reset,
            "restart" => Self::Restart,
            "complete" => Self::Complete,
            "reverse" => Self::Reverse,
            "none" => Self::None,
            other => {
                return Err(PortfolioError::invalid_option(
                    "toggle actions",
                    format!("unknown action `{other}`"),
                ))
            }
        })
    }
}

/// What a toggle-style trigger does on each boundary crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleActions {
    pub on_enter: ToggleAction,
    pub on_leave: ToggleAction,
    pub on_enter_back: ToggleAction,
    pub on_leave_back: ToggleAction,
}

impl Default for ToggleActions {
    /// `play none none reverse`: play once on entry, rewind when scrolled back
    /// above the start.
    fn default() -> Self {
        Self {
            on_enter: ToggleAction::Play,
            on_leave: ToggleAction::None,
            on_enter_back: ToggleAction::None,
            on_leave_back: ToggleAction::Reverse,
        }
    }
}

impl ToggleActions {
    /// Plays on entry and never rewinds.
    pub fn play_once() -> Self {
        Self {
            on_leave_back: ToggleAction::None,
            ..Self::default()
        }
    }

    pub fn reverses(&self) -> bool {
        [
            self.on_enter,
            self.on_leave,
            self.on_enter_back,
            self.on_leave_back,
        ]
        .contains(&ToggleAction::Reverse)
    }
}

impl FromStr for ToggleActions {
    type Err = PortfolioError;

    fn from_str(s: &str) -> Result<Self> {
        let actions = s
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<Vec<ToggleAction>>>()?;
        match actions.as_slice() {
            [on_enter, on_leave, on_enter_back, on_leave_back] => Ok(Self {
                on_enter: *on_enter,
                on_leave: *on_leave,
                on_enter_back: *on_enter_back,
                on_leave_back: *on_leave_back,
            }),
            _ => Err(PortfolioError::invalid_option(
                "toggle actions",
                "expected four actions",
            )),
        }
    }
}

/// How animation progress follows the scrollbar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Scrub {
    /// Progress runs on wall-clock time once triggered.
    Off,
    /// Progress is locked to the scroll position.
    Linked,
    /// Progress catches up with the scroll position over this many seconds.
    Smoothed(f32),
}

/// Binding between a timeline and the viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollTrigger {
    pub trigger: Vec<NodeId>,
    pub start: ScrollPosition,
    pub end: ScrollPosition,
    pub scrub: Scrub,
    pub toggle_actions: Option<ToggleActions>,
}

impl ScrollTrigger {
    pub fn scrubbed(
        trigger: Vec<NodeId>,
        start: ScrollPosition,
        end: ScrollPosition,
        scrub: Scrub,
    ) -> Self {
        Self {
            trigger,
            start,
            end,
            scrub,
            toggle_actions: None,
        }
    }

    pub fn toggled(
        trigger: Vec<NodeId>,
        start: ScrollPosition,
        end: ScrollPosition,
        actions: ToggleActions,
    ) -> Self {
        Self {
            trigger,
            start,
            end,
            scrub: Scrub::Off,
            toggle_actions: Some(actions),
        }
    }
}
