use std::collections::BTreeMap;

use super::{Layer, NodeId, RenderSurface};

/// Approximate glyph width used when a node has no explicit width.
const CHAR_WIDTH_PX: f32 = 8.0;

#[derive(Debug, Clone, Default)]
struct MemoryNode {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    styles: BTreeMap<String, String>,
    width: Option<f32>,
}

/// In-process node tree implementing [`RenderSurface`].
///
/// Serves server-side rendering passes (non-interactive) and tests. Lines are
/// delimited by `\n` in the node text.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    interactive: bool,
    nodes: Vec<MemoryNode>,
    mutations: usize,
}

impl MemoryDocument {
    /// A live page: animations run against it.
    pub fn browser() -> Self {
        Self::with_interactivity(true)
    }

    /// A server rendering pass: animations must leave it untouched.
    pub fn server() -> Self {
        Self::with_interactivity(false)
    }

    fn with_interactivity(interactive: bool) -> Self {
        let root = MemoryNode {
            tag: "body".to_string(),
            ..Default::default()
        };
        Self {
            interactive,
            nodes: vec![root],
            mutations: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Appends an element described as `tag.class#id` under `parent`.
    pub fn append_element(&mut self, parent: NodeId, descriptor: &str, text: &str) -> NodeId {
        let compound = Compound::parse(descriptor).unwrap_or_default();
        let node = MemoryNode {
            tag: compound.tag.unwrap_or_else(|| "div".to_string()),
            id: compound.id,
            classes: compound.classes,
            text: text.to_string(),
            parent: Some(parent),
            ..Default::default()
        };
        self.push_child(parent, node)
    }

    pub fn set_width(&mut self, node: NodeId, width: f32) {
        if let Some(entry) = self.nodes.get_mut(node.0) {
            entry.width = Some(width);
        }
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|entry| entry.children.as_slice())
            .unwrap_or_default()
    }

    pub fn classes(&self, node: NodeId) -> &[String] {
        self.nodes
            .get(node.0)
            .map(|entry| entry.classes.as_slice())
            .unwrap_or_default()
    }

    pub fn styles(&self, node: NodeId) -> BTreeMap<String, String> {
        self.nodes
            .get(node.0)
            .map(|entry| entry.styles.clone())
            .unwrap_or_default()
    }

    /// Number of writes performed through the [`RenderSurface`] interface.
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    fn push_child(&mut self, parent: NodeId, node: MemoryNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        if let Some(entry) = self.nodes.get_mut(parent.0) {
            entry.children.push(id);
        }
        id
    }

    fn matches_chain(&self, node: NodeId, chain: &[Compound]) -> bool {
        let Some((last, ancestors)) = chain.split_last() else {
            return false;
        };
        if !self.matches_compound(node, last) {
            return false;
        }

        let mut remaining = ancestors;
        let mut cursor = self.nodes[node.0].parent;
        while let Some((wanted, rest)) = remaining.split_last() {
            match cursor {
                Some(ancestor) => {
                    if self.matches_compound(ancestor, wanted) {
                        remaining = rest;
                    }
                    cursor = self.nodes[ancestor.0].parent;
                }
                None => return false,
            }
        }
        true
    }

    fn matches_compound(&self, node: NodeId, compound: &Compound) -> bool {
        let entry = &self.nodes[node.0];
        compound.tag.as_ref().map_or(true, |tag| *tag == entry.tag)
            && compound
                .id
                .as_ref()
                .map_or(true, |id| entry.id.as_ref() == Some(id))
            && compound
                .classes
                .iter()
                .all(|class| entry.classes.contains(class))
            && (!compound.require_id || entry.id.is_some())
    }
}

impl RenderSurface for MemoryDocument {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.query_within(self.root(), selector)
    }

    fn query_within(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        let groups: Vec<Vec<Compound>> = selector
            .split(',')
            .filter_map(|group| {
                group
                    .split_whitespace()
                    .map(Compound::parse)
                    .collect::<Option<Vec<_>>>()
            })
            .filter(|chain| !chain.is_empty())
            .collect();

        let mut matches = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if groups.iter().any(|chain| self.matches_chain(node, chain)) {
                matches.push(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        matches
    }

    fn text_content(&self, node: NodeId) -> String {
        let Some(entry) = self.nodes.get(node.0) else {
            return String::new();
        };
        if entry.children.is_empty() {
            return entry.text.clone();
        }
        entry
            .children
            .iter()
            .map(|child| self.text_content(*child))
            .collect()
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) {
        let detached = match self.nodes.get_mut(node.0) {
            Some(entry) => {
                entry.text = text.to_string();
                std::mem::take(&mut entry.children)
            }
            None => return,
        };
        for child in detached {
            self.nodes[child.0].parent = None;
        }
        self.mutations += 1;
    }

    fn append_layer(&mut self, parent: NodeId, layer: Layer) -> NodeId {
        let classes = layer
            .class
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let node = MemoryNode {
            tag: layer.tag,
            classes,
            text: layer.text,
            parent: Some(parent),
            styles: layer.styles.into_iter().collect(),
            ..Default::default()
        };
        // A node holds either text or children, never both.
        if let Some(entry) = self.nodes.get_mut(parent.0) {
            entry.text.clear();
        }
        self.mutations += 1;
        self.push_child(parent, node)
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.nodes
            .get(node.0)
            .and_then(|entry| entry.styles.get(property).cloned())
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        let Some(entry) = self.nodes.get_mut(node.0) else {
            return;
        };
        if value.is_empty() {
            entry.styles.remove(property);
        } else {
            entry
                .styles
                .insert(property.to_string(), value.to_string());
        }
        self.mutations += 1;
    }

    fn offset_width(&self, node: NodeId) -> f32 {
        let Some(entry) = self.nodes.get(node.0) else {
            return 0.0;
        };
        entry
            .width
            .unwrap_or_else(|| self.text_content(node).chars().count() as f32 * CHAR_WIDTH_PX)
    }

    fn visual_lines(&self, node: NodeId) -> Vec<String> {
        self.text_content(node)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// One compound selector: `tag.class#id`, optionally followed by `[id]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    /// `[id]`: the element must carry an id, whatever its value.
    require_id: bool,
}

impl Compound {
    /// Returns `None` for syntax outside the supported subset (attributes
    /// other than `[id]`, pseudo-classes, combinators other than descendant).
    fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() || input.contains([':', '>', '+', '~']) {
            return None;
        }

        let mut compound = Compound::default();
        let input = match input.split_once('[') {
            Some((head, "id]")) => {
                compound.require_id = true;
                head
            }
            Some(_) => return None,
            None => input,
        };
        let mut kind = '\0';
        let mut current = String::new();
        let flush = |kind: char, value: &mut String, compound: &mut Compound| {
            if value.is_empty() {
                return;
            }
            let value = std::mem::take(value);
            match kind {
                '.' => compound.classes.push(value),
                '#' => compound.id = Some(value),
                '*' => {}
                _ => compound.tag = Some(value),
            }
        };

        for ch in input.chars() {
            if ch == '.' || ch == '#' {
                flush(kind, &mut current, &mut compound);
                kind = ch;
            } else if ch == '*' && current.is_empty() && kind == '\0' {
                kind = '*';
            } else {
                current.push(ch);
            }
        }
        flush(kind, &mut current, &mut compound);
        Some(compound)
    }
}
