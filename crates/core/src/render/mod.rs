//! Rendering surface abstraction.
//!
//! Animation operations never touch a DOM directly. They go through
//! [`RenderSurface`], which exposes the handful of capabilities the effects
//! need: replacing content, stacking text layers, reading and writing inline
//! styles, and measuring.

use std::fmt;

use serde::{Deserialize, Serialize};

mod memory;

pub use memory::MemoryDocument;

/// Opaque handle to a node owned by a [`RenderSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// What an animation operation is aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// CSS selector resolved against the whole surface.
    Selector(String),
    Node(NodeId),
    Nodes(Vec<NodeId>),
}

impl From<&str> for Target {
    fn from(value: &str) -> Self {
        Self::Selector(value.to_string())
    }
}

impl From<String> for Target {
    fn from(value: String) -> Self {
        Self::Selector(value)
    }
}

impl From<NodeId> for Target {
    fn from(value: NodeId) -> Self {
        Self::Node(value)
    }
}

impl From<Vec<NodeId>> for Target {
    fn from(value: Vec<NodeId>) -> Self {
        Self::Nodes(value)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Selector(selector) => write!(f, "{selector}"),
            Target::Node(node) => write!(f, "node#{}", node.0),
            Target::Nodes(nodes) => write!(f, "{} nodes", nodes.len()),
        }
    }
}

/// A child element created by an effect, typically an inline span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layer {
    pub tag: String,
    pub class: String,
    pub text: String,
    pub styles: Vec<(String, String)>,
}

impl Layer {
    pub fn span(class: impl Into<String>) -> Self {
        Self {
            tag: "span".to_string(),
            class: class.into(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.push((property.into(), value.into()));
        self
    }
}

/// Capabilities an animation needs from the page it runs on.
pub trait RenderSurface {
    /// Whether the surface is a live, interactive page. Server-side rendering
    /// passes report `false` and every animation becomes a no-op.
    fn is_interactive(&self) -> bool;

    fn query_all(&self, selector: &str) -> Vec<NodeId>;

    /// Like [`RenderSurface::query_all`], restricted to descendants of `scope`.
    fn query_within(&self, scope: NodeId, selector: &str) -> Vec<NodeId>;

    fn text_content(&self, node: NodeId) -> String;

    /// Replaces every child of `node` with a single text run.
    fn set_text_content(&mut self, node: NodeId, text: &str);

    fn append_layer(&mut self, parent: NodeId, layer: Layer) -> NodeId;

    fn style(&self, node: NodeId, property: &str) -> Option<String>;

    /// Writes an inline style. An empty value removes the property.
    fn set_style(&mut self, node: NodeId, property: &str, value: &str);

    fn offset_width(&self, node: NodeId) -> f32;

    /// Text of each rendered line of `node`, in order.
    fn visual_lines(&self, node: NodeId) -> Vec<String>;

    fn resolve(&self, target: &Target) -> Vec<NodeId> {
        match target {
            Target::Selector(selector) => self.query_all(selector),
            Target::Node(node) => vec![*node],
            Target::Nodes(nodes) => nodes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_layers() {
        let layer = Layer::span("text-fill-fg")
            .with_text("Hello")
            .with_style("color", "#fff");

        assert_eq!(layer.tag, "span");
        assert_eq!(layer.text, "Hello");
        assert_eq!(layer.styles, vec![("color".to_string(), "#fff".to_string())]);
    }

    #[test]
    fn resolves_direct_targets_without_querying() {
        let doc = MemoryDocument::browser();
        let nodes = vec![NodeId(4), NodeId(9)];

        assert_eq!(doc.resolve(&Target::Node(NodeId(3))), vec![NodeId(3)]);
        assert_eq!(doc.resolve(&nodes.clone().into()), nodes);
        assert!(doc.resolve(&".missing".into()).is_empty());
    }
}
