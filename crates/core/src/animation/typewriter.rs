use crate::{
    render::{Layer, NodeId, RenderSurface, Target},
    timeline::{
        AnimationEngine, AnimationHandle, Callback, Easing, Position, Property, Repeat, Timeline,
        Tween,
    },
    Result,
};

use super::{Animator, TypewriterOptions};

const TEXT_CLASS: &str = "typewriter-text";
const CURSOR_CLASS: &str = "typewriter-cursor";
const PAUSE_LABEL: &str = "pauseStart";
const ERASE_LABEL: &str = "eraseStart";

/// Inline styles the effect may overwrite on the host element.
const RESERVED_STYLES: [&str; 2] = ["min-width", "display"];

/// A running typewriter effect. Dropping it leaves the effect running; call
/// [`TypewriterHandle::cleanup`] to stop it and put the element back.
#[derive(Debug, Clone, PartialEq)]
pub struct TypewriterHandle {
    pub animation: AnimationHandle,
    node: NodeId,
    original_text: String,
    saved_styles: Option<Vec<(&'static str, Option<String>)>>,
    cursor: Option<NodeId>,
}

impl TypewriterHandle {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn cursor(&self) -> Option<NodeId> {
        self.cursor
    }

    /// Kills the timeline (and the cursor blink), restores the original text
    /// and the inline styles that were in place before the effect started.
    pub fn cleanup<S, E>(self, animator: &mut Animator<S, E>)
    where
        S: RenderSurface,
        E: AnimationEngine,
    {
        self.animation.kill(&mut animator.engine);
        animator
            .surface
            .set_text_content(self.node, &self.original_text);
        for (property, previous) in self.saved_styles.into_iter().flatten() {
            animator
                .surface
                .set_style(self.node, property, previous.as_deref().unwrap_or_default());
        }
    }
}

impl<S, E> Animator<S, E>
where
    S: RenderSurface,
    E: AnimationEngine,
{
    /// Types the element's text out character by character behind an
    /// optional cursor. Only the first matching node is animated.
    pub fn typewriter(
        &mut self,
        target: impl Into<Target>,
        options: TypewriterOptions,
    ) -> Result<Option<TypewriterHandle>> {
        if !self.surface.is_interactive() {
            return Ok(None);
        }
        options.validate()?;
        let Some(node) = self
            .resolve("typewriter", &target.into())
            .and_then(|nodes| nodes.first().copied())
        else {
            return Ok(None);
        };

        let original_text = self.surface.text_content(node);
        let saved_styles = options.preserve_space.then(|| self.reserve_space(node));

        self.surface.set_text_content(node, "");
        let text = self.surface.append_layer(node, Layer::span(TEXT_CLASS));
        let cursor = options.cursor.then(|| {
            self.surface.append_layer(
                node,
                Layer::span(CURSOR_CLASS)
                    .with_text(options.cursor_char.clone())
                    .with_style("display", "inline-block"),
            )
        });

        let timeline = typing_timeline(&options, text, cursor, &original_text);
        let animation = self.launch(timeline);

        Ok(Some(TypewriterHandle {
            animation,
            node,
            original_text,
            saved_styles,
            cursor,
        }))
    }

    fn reserve_space(&mut self, node: NodeId) -> Vec<(&'static str, Option<String>)> {
        let saved = RESERVED_STYLES
            .iter()
            .map(|property| (*property, self.surface.style(node, property)))
            .collect();
        let width = self.surface.offset_width(node);
        self.surface.set_style(node, "min-width", &format!("{width}px"));
        self.surface.set_style(node, "display", "inline-block");
        saved
    }
}

fn typing_timeline(
    options: &TypewriterOptions,
    text: NodeId,
    cursor: Option<NodeId>,
    original_text: &str,
) -> Timeline {
    let mut timeline = Timeline::new();
    if options.looping {
        timeline.repeat = Repeat::Infinite;
    }

    if let Some(cursor) = cursor {
        timeline.push_at(
            Tween::set(vec![cursor], vec![Property::Opacity(1.0)]),
            Position::At(0.0),
        );
    }

    timeline.push(
        Tween::to(vec![text], vec![Property::Text(original_text.to_string())])
            .duration(options.duration)
            .delay(options.delay)
            .ease(options.ease),
    );

    if !options.looping {
        return timeline;
    }

    timeline.label(PAUSE_LABEL).pause(options.loop_delay);
    timeline.label(ERASE_LABEL).push(
        Tween::to(vec![text], vec![Property::Text(String::new())])
            .duration(options.duration * 0.5)
            .ease(options.ease),
    );

    // The cursor blinks only while the text sits still.
    if let Some(cursor) = cursor {
        let blink = Tween::to(vec![cursor], vec![Property::Opacity(0.0)])
            .duration(0.5)
            .repeat(Repeat::Infinite)
            .yoyo(true)
            .ease(Easing::Steps(1));
        timeline.call(
            Callback::SpawnTween(blink),
            Position::Label(PAUSE_LABEL.to_string()),
        );
        timeline.call(
            Callback::KillSpawned {
                target: cursor,
                reset: vec![Property::Opacity(1.0)],
            },
            Position::Label(ERASE_LABEL.to_string()),
        );
    }

    timeline
}
