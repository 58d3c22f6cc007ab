use tracing::debug;

use crate::{
    render::{Layer, NodeId, RenderSurface, Target},
    timeline::{
        AnimationEngine, AnimationHandle, Position, Property, ScrollTrigger, Scrub, Timeline,
        Tween,
    },
    Result,
};

use super::{Animator, TextFillOptions};

const WRAPPER_CLASS: &str = "text-fill";
const LINE_CLASS: &str = "text-fill-line";
const BACKGROUND_CLASS: &str = "text-fill-bg";
const FOREGROUND_CLASS: &str = "text-fill-fg";

const HIDDEN_CLIP: &str = "inset(0 100% 0 0)";
const REVEALED_CLIP: &str = "inset(0 0% 0 0)";

const HEADING_FILL: &str = "#ffffff";
const MUTED_TEXT: &str = "oklch(55.4% 0.046 257.417)";
const DIM_TEXT: &str = "oklch(20.8% 0.042 265.755)";

/// One element of a [`Animator::text_fill_sequence`] with its own colours.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFillEntry {
    pub target: Target,
    pub fill_color: String,
    pub empty_color: String,
}

impl TextFillEntry {
    pub fn new(
        target: impl Into<Target>,
        fill_color: impl Into<String>,
        empty_color: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            fill_color: fill_color.into(),
            empty_color: empty_color.into(),
        }
    }
}

impl<S, E> Animator<S, E>
where
    S: RenderSurface,
    E: AnimationEngine,
{
    /// Fills text with colour as it scrolls through the viewport.
    ///
    /// Each matched element gets its own scroll-scrubbed timeline, so the
    /// returned handles line up with the matched nodes.
    pub fn text_fill(
        &mut self,
        target: impl Into<Target>,
        options: TextFillOptions,
    ) -> Result<Option<Vec<AnimationHandle>>> {
        if !self.surface.is_interactive() {
            return Ok(None);
        }
        options.validate()?;
        let Some(nodes) = self.resolve("text_fill", &target.into()) else {
            return Ok(None);
        };
        let shared_trigger = match &options.trigger {
            Some(trigger) => match self.resolve("text_fill", trigger) {
                Some(trigger) => Some(trigger),
                None => return Ok(None),
            },
            None => None,
        };

        let handles: Vec<AnimationHandle> = nodes
            .into_iter()
            .map(|node| {
                let trigger = shared_trigger.clone().unwrap_or_else(|| vec![node]);
                self.fill_node(node, trigger, &options)
            })
            .collect();
        Ok(Some(handles))
    }

    /// Applies [`Animator::text_fill`] to several elements that share timing
    /// but not colours, such as a section's titles and descriptions. Entries
    /// whose target is missing are skipped.
    ///
    /// Every entry's options are validated before the first element is
    /// touched, so an invalid entry leaves the page unchanged.
    pub fn text_fill_sequence(
        &mut self,
        entries: Vec<TextFillEntry>,
        options: TextFillOptions,
    ) -> Result<Option<Vec<AnimationHandle>>> {
        if !self.surface.is_interactive() {
            return Ok(None);
        }

        let prepared = entries
            .into_iter()
            .map(|entry| {
                let options = TextFillOptions {
                    fill_color: entry.fill_color,
                    empty_color: entry.empty_color,
                    ..options.clone()
                };
                options.validate()?;
                Ok((entry.target, options))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut handles = Vec::new();
        for (target, options) in prepared {
            if let Some(filled) = self.text_fill(target, options)? {
                handles.extend(filled);
            }
        }
        Ok(Some(handles))
    }

    /// Registers the site-wide section preset: in every `section[id]`, titles
    /// and descriptions fill line by line as the section scrolls past.
    /// Sections with neither are left alone.
    pub fn init_section_text_animations(&mut self) -> Result<Vec<AnimationHandle>> {
        if !self.surface.is_interactive() {
            return Ok(Vec::new());
        }

        let options = TextFillOptions {
            split_by_lines: true,
            start: "top 80%".parse()?,
            end: "bottom 40%".parse()?,
            stagger: 0.8,
            scrub: Scrub::Smoothed(3.0),
            gap: 8.0,
            ..Default::default()
        };

        let mut handles = Vec::new();
        for section in self.surface.query_all("section[id]") {
            let titles = self.surface.query_within(section, ".title");
            let descriptions = self.surface.query_within(section, ".description");
            if titles.is_empty() && descriptions.is_empty() {
                continue;
            }

            let entries = titles
                .into_iter()
                .map(|title| TextFillEntry::new(title, HEADING_FILL, MUTED_TEXT))
                .chain(
                    descriptions
                        .into_iter()
                        .map(|description| TextFillEntry::new(description, MUTED_TEXT, DIM_TEXT)),
                )
                .collect();
            if let Some(filled) = self.text_fill_sequence(entries, options.clone())? {
                handles.extend(filled);
            }
        }
        Ok(handles)
    }

    fn fill_node(
        &mut self,
        node: NodeId,
        trigger: Vec<NodeId>,
        options: &TextFillOptions,
    ) -> AnimationHandle {
        let lines = if options.split_by_lines {
            let lines = self.surface.visual_lines(node);
            if lines.is_empty() {
                vec![self.surface.text_content(node)]
            } else {
                lines
            }
        } else {
            vec![self.surface.text_content(node)]
        };
        debug!(node = node.0, lines = lines.len(), "building text fill scaffold");

        self.surface.set_text_content(node, "");
        let last = lines.len().saturating_sub(1);
        let mut timeline = Timeline::new().with_scroll_trigger(ScrollTrigger::scrubbed(
            trigger,
            options.start,
            options.end,
            options.scrub,
        ));

        for (index, line) in lines.iter().enumerate() {
            let (class, display) = if options.split_by_lines {
                (LINE_CLASS, "block")
            } else {
                (WRAPPER_CLASS, "inline-block")
            };
            let mut wrapper = Layer::span(class)
                .with_style("display", display)
                .with_style("position", "relative");
            if options.split_by_lines && index < last && options.gap > 0.0 {
                wrapper = wrapper.with_style("margin-bottom", format!("{}px", options.gap));
            }
            let wrapper = self.surface.append_layer(node, wrapper);

            self.surface.append_layer(
                wrapper,
                Layer::span(BACKGROUND_CLASS)
                    .with_text(line.as_str())
                    .with_style("color", options.empty_color.as_str()),
            );
            let foreground = self.surface.append_layer(
                wrapper,
                Layer::span(FOREGROUND_CLASS)
                    .with_text(line.as_str())
                    .with_style("color", options.fill_color.as_str())
                    .with_style("position", "absolute")
                    .with_style("top", "0")
                    .with_style("left", "0")
                    .with_style("clip-path", HIDDEN_CLIP),
            );

            // Lines start `stagger` seconds apart on the scrubbed timeline.
            timeline.push_at(
                Tween::to(
                    vec![foreground],
                    vec![Property::ClipPath(REVEALED_CLIP.to_string())],
                )
                .duration(options.duration)
                .ease(options.ease),
                Position::At(index as f32 * options.stagger),
            );
        }

        self.launch(timeline)
    }
}
