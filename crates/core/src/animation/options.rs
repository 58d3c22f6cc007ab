use crate::{
    render::Target,
    timeline::{Anchor, EaseDirection, Easing, ScrollPosition, Scrub, ToggleActions},
    PortfolioError, Result,
};

fn finite(option: &'static str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PortfolioError::invalid_option(option, format!("{value} is not a finite number")))
    }
}

fn non_negative(option: &'static str, value: f32) -> Result<()> {
    finite(option, value)?;
    if value < 0.0 {
        return Err(PortfolioError::invalid_option(option, format!("{value} is negative")));
    }
    Ok(())
}

fn scrub(value: Scrub) -> Result<()> {
    match value {
        Scrub::Smoothed(seconds) => non_negative("scrub", seconds),
        Scrub::Off | Scrub::Linked => Ok(()),
    }
}

fn not_blank(option: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PortfolioError::invalid_option(option, "must not be empty"));
    }
    Ok(())
}

/// Options for [`Animator::typewriter`](super::Animator::typewriter).
#[derive(Debug, Clone, PartialEq)]
pub struct TypewriterOptions {
    /// Seconds to type the whole text. Erasing takes half as long.
    pub duration: f32,
    pub delay: f32,
    pub ease: Easing,
    /// Type, pause, erase, repeat forever.
    pub looping: bool,
    /// Pause between typing and erasing when looping.
    pub loop_delay: f32,
    pub cursor: bool,
    pub cursor_char: String,
    /// Reserve the element's current width so surrounding layout does not
    /// shift while the text grows.
    pub preserve_space: bool,
}

impl Default for TypewriterOptions {
    fn default() -> Self {
        Self {
            duration: 2.0,
            delay: 0.0,
            ease: Easing::None,
            looping: false,
            loop_delay: 1.0,
            cursor: true,
            cursor_char: "|".to_string(),
            preserve_space: true,
        }
    }
}

impl TypewriterOptions {
    pub fn validate(&self) -> Result<()> {
        non_negative("duration", self.duration)?;
        non_negative("delay", self.delay)?;
        non_negative("loop_delay", self.loop_delay)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CascadeInOptions {
    /// Starting opacity; elements animate from here to their rendered state.
    pub opacity: f32,
    pub y: f32,
    pub x: f32,
    pub scale: f32,
    pub rotation: f32,
    pub duration: f32,
    /// Seconds between consecutive elements.
    pub stagger: f32,
    pub delay: f32,
    pub ease: Easing,
}

impl Default for CascadeInOptions {
    fn default() -> Self {
        Self {
            opacity: 0.0,
            y: 20.0,
            x: 0.0,
            scale: 1.0,
            rotation: 0.0,
            duration: 0.6,
            stagger: 0.1,
            delay: 0.0,
            ease: Easing::Power(2, EaseDirection::Out),
        }
    }
}

impl CascadeInOptions {
    pub fn validate(&self) -> Result<()> {
        finite("opacity", self.opacity)?;
        finite("y", self.y)?;
        finite("x", self.x)?;
        finite("scale", self.scale)?;
        finite("rotation", self.rotation)?;
        non_negative("duration", self.duration)?;
        non_negative("stagger", self.stagger)?;
        non_negative("delay", self.delay)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RotateInfiniteOptions {
    /// Seconds per full turn.
    pub duration: f32,
    pub clockwise: bool,
    pub ease: Easing,
}

impl Default for RotateInfiniteOptions {
    fn default() -> Self {
        Self {
            duration: 20.0,
            clockwise: true,
            ease: Easing::None,
        }
    }
}

impl RotateInfiniteOptions {
    pub fn validate(&self) -> Result<()> {
        non_negative("duration", self.duration)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PulseOptions {
    pub scale: f32,
    pub duration: f32,
    pub ease: Easing,
    /// Pulse an attribute (an SVG radius, say) instead of the scale. Used only
    /// when `attribute_value` is also set.
    pub attribute: Option<String>,
    pub attribute_value: Option<f32>,
}

impl Default for PulseOptions {
    fn default() -> Self {
        Self {
            scale: 1.1,
            duration: 1.0,
            ease: Easing::Power(1, EaseDirection::InOut),
            attribute: None,
            attribute_value: None,
        }
    }
}

impl PulseOptions {
    pub fn validate(&self) -> Result<()> {
        finite("scale", self.scale)?;
        non_negative("duration", self.duration)?;
        if let Some(name) = &self.attribute {
            not_blank("attribute", name)?;
        }
        if let Some(value) = self.attribute_value {
            finite("attribute_value", value)?;
        }
        Ok(())
    }

    pub(crate) fn attribute_pulse(&self) -> Option<(&str, f32)> {
        self.attribute.as_deref().zip(self.attribute_value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParallaxScrollOptions {
    pub y: f32,
    pub x: f32,
    pub rotation: f32,
    /// Element whose position drives the effect; the animated target itself
    /// when unset.
    pub trigger: Option<Target>,
    pub start: ScrollPosition,
    pub end: ScrollPosition,
    pub scrub: Scrub,
}

impl Default for ParallaxScrollOptions {
    fn default() -> Self {
        Self {
            y: 100.0,
            x: 0.0,
            rotation: 0.0,
            trigger: None,
            start: ScrollPosition::new(Anchor::Top, Anchor::Top),
            end: ScrollPosition::new(Anchor::Bottom, Anchor::Top),
            scrub: Scrub::Smoothed(1.0),
        }
    }
}

impl ParallaxScrollOptions {
    pub fn validate(&self) -> Result<()> {
        finite("y", self.y)?;
        finite("x", self.x)?;
        finite("rotation", self.rotation)?;
        scrub(self.scrub)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FadeUpOptions {
    pub duration: f32,
    /// Starting vertical offset; elements rise to `y = 0`.
    pub y: f32,
    /// Starting opacity; elements fade to 1.
    pub opacity: f32,
    pub ease: Easing,
    pub stagger: f32,
    pub trigger: Option<Target>,
    pub start: ScrollPosition,
    pub end: ScrollPosition,
    /// Use [`ToggleActions::play_once`] to keep elements visible when the
    /// reader scrolls back up.
    pub toggle_actions: ToggleActions,
    /// Play straight away, without waiting for the element to scroll into
    /// view. Meant for above-the-fold content.
    pub immediate: bool,
    /// Delay before an immediate animation starts.
    pub delay: f32,
}

impl Default for FadeUpOptions {
    fn default() -> Self {
        Self {
            duration: 1.0,
            y: 50.0,
            opacity: 0.0,
            ease: Easing::Power(2, EaseDirection::Out),
            stagger: 0.2,
            trigger: None,
            start: ScrollPosition::new(Anchor::Top, Anchor::Percent(80.0)),
            end: ScrollPosition::new(Anchor::Bottom, Anchor::Percent(20.0)),
            toggle_actions: ToggleActions::default(),
            immediate: false,
            delay: 0.0,
        }
    }
}

impl FadeUpOptions {
    pub fn validate(&self) -> Result<()> {
        non_negative("duration", self.duration)?;
        finite("y", self.y)?;
        finite("opacity", self.opacity)?;
        non_negative("stagger", self.stagger)?;
        non_negative("delay", self.delay)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextFillOptions {
    pub fill_color: String,
    pub empty_color: String,
    pub trigger: Option<Target>,
    pub start: ScrollPosition,
    pub end: ScrollPosition,
    pub scrub: Scrub,
    /// Build one background/foreground pair per rendered line and fill the
    /// lines one after another.
    pub split_by_lines: bool,
    /// Seconds between the start of consecutive line fills.
    pub stagger: f32,
    /// Extra spacing between lines, in pixels.
    pub gap: f32,
    pub duration: f32,
    pub ease: Easing,
}

impl Default for TextFillOptions {
    fn default() -> Self {
        Self {
            fill_color: "#ffffff".to_string(),
            empty_color: "rgba(255, 255, 255, 0.2)".to_string(),
            trigger: None,
            start: ScrollPosition::new(Anchor::Top, Anchor::Percent(80.0)),
            end: ScrollPosition::new(Anchor::Bottom, Anchor::Percent(20.0)),
            scrub: Scrub::Smoothed(1.0),
            split_by_lines: false,
            stagger: 0.5,
            gap: 0.0,
            duration: 1.0,
            ease: Easing::None,
        }
    }
}

impl TextFillOptions {
    pub fn validate(&self) -> Result<()> {
        not_blank("fill_color", &self.fill_color)?;
        not_blank("empty_color", &self.empty_color)?;
        scrub(self.scrub)?;
        non_negative("stagger", self.stagger)?;
        non_negative("gap", self.gap)?;
        non_negative("duration", self.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        TypewriterOptions::default().validate().unwrap();
        CascadeInOptions::default().validate().unwrap();
        RotateInfiniteOptions::default().validate().unwrap();
        PulseOptions::default().validate().unwrap();
        ParallaxScrollOptions::default().validate().unwrap();
        FadeUpOptions::default().validate().unwrap();
        TextFillOptions::default().validate().unwrap();
    }

    #[test]
    fn rejects_negative_durations() {
        let options = TypewriterOptions {
            duration: -1.0,
            ..Default::default()
        };
        let err = options.validate().unwrap_err();
        assert!(matches!(
            err,
            PortfolioError::InvalidOption {
                option: "duration",
                ..
            }
        ));
    }

    #[test]
    fn rejects_non_finite_offsets() {
        let options = CascadeInOptions {
            y: f32::NAN,
            ..Default::default()
        };
        assert!(options.validate().is_err());

        let options = ParallaxScrollOptions {
            scrub: Scrub::Smoothed(f32::INFINITY),
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn negative_offsets_are_allowed() {
        let options = CascadeInOptions {
            y: -40.0,
            rotation: -15.0,
            ..Default::default()
        };
        options.validate().unwrap();
    }

    #[test]
    fn pulse_attribute_needs_both_halves() {
        let named_only = PulseOptions {
            attribute: Some("r".into()),
            ..Default::default()
        };
        assert_eq!(named_only.attribute_pulse(), None);

        let complete = PulseOptions {
            attribute: Some("r".into()),
            attribute_value: Some(12.0),
            ..Default::default()
        };
        assert_eq!(complete.attribute_pulse(), Some(("r", 12.0)));
    }

    #[test]
    fn text_fill_requires_colours() {
        let options = TextFillOptions {
            empty_color: "  ".into(),
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }
}
