//! Style inlining: bake an element's cascade into a self-contained tree.
//!
//! The transform is pure: it reads the source element and a
//! [`StyleResolver`](crate::style::StyleResolver) and constructs a new tree,
//! never mutating the source document. After the pass, the result's visual
//! appearance does not depend on any external stylesheet, ambient cascade,
//! or pseudo-element rule.

use crate::style::{Declaration, PseudoElement, StyleResolver};
use scraper::{ElementRef, Html};

/// A node in the self-contained tree: its tag, the baked declarations, and
/// its children in order
#[derive(Debug, Clone)]
pub struct InlinedNode {
    pub tag: String,
    pub declarations: Vec<Declaration>,
    pub children: Vec<InlinedChild>,
}

#[derive(Debug, Clone)]
pub enum InlinedChild {
    Element(InlinedNode),
    Text(String),
}

impl InlinedNode {
    /// Value of a baked declaration, if present
    pub fn declared(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|d| d.property == property)
            .map(|d| d.value.as_str())
    }

    /// Concatenated text of direct text children
    pub fn own_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                InlinedChild::Text(text) => Some(text.as_str()),
                InlinedChild::Element(_) => None,
            })
            .collect()
    }
}

/// Build a self-contained copy of `element` with every effective declaration
/// set explicitly, resolved against the **original** element (a detached
/// copy has no computed style of its own).
///
/// Generated `::before`/`::after` content is synthesized as concrete `div`
/// children: first child for `before`, last child for `after`, carrying the
/// pseudo-element's declarations plus `position: absolute` and the literal
/// content string.
pub fn inline_subtree(
    doc: &Html,
    element: ElementRef<'_>,
    resolver: &dyn StyleResolver,
) -> InlinedNode {
    let declarations = resolver.computed_style(doc, element);

    let mut children = Vec::new();
    for child in element.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            children.push(InlinedChild::Element(inline_subtree(doc, child_el, resolver)));
        } else if let Some(text) = child.value().as_text() {
            let text = text.to_string();
            if !text.trim().is_empty() {
                children.push(InlinedChild::Text(text));
            }
        }
    }

    if let Some(before) = resolver.pseudo_style(doc, element, PseudoElement::Before) {
        children.insert(
            0,
            InlinedChild::Element(generated_child(before.declarations, before.content)),
        );
    }
    if let Some(after) = resolver.pseudo_style(doc, element, PseudoElement::After) {
        children.push(InlinedChild::Element(generated_child(
            after.declarations,
            after.content,
        )));
    }

    InlinedNode {
        tag: element.value().name().to_string(),
        declarations,
        children,
    }
}

fn generated_child(mut declarations: Vec<Declaration>, content: String) -> InlinedNode {
    declarations.push(Declaration::new("position", "absolute"));
    declarations.push(Declaration::new("content", format!("\"{content}\"")));
    let children = if content.is_empty() {
        Vec::new()
    } else {
        vec![InlinedChild::Text(content)]
    };
    InlinedNode {
        tag: "div".to_string(),
        declarations,
        children,
    }
}
