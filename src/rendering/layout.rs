//! Block layout over an inlined tree.
//!
//! Deliberately simple: declared pixel sizes are honored, children stack
//! vertically inside the padding box, text wraps at a fixed-metric estimate,
//! and absolutely-positioned children overlay the parent origin without
//! advancing flow. Everything here is in CSS pixels; supersampling happens
//! at paint time.

use crate::inline::{InlinedChild, InlinedNode};
use crate::style::parse_color;

pub(crate) const DEFAULT_FONT_SIZE: u32 = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxModel {
    pub margin: u32,
    pub border: u32,
    pub padding: u32,
}

/// A wrapped text block ready to paint
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub color: [u8; 4],
    pub font_size: u32,
    pub line_height: u32,
}

/// One positioned box in paint order (parents precede children)
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub rect: Rect,
    pub background: Option<[u8; 4]>,
    pub text: Option<TextBlock>,
}

/// Result of laying out a whole tree: the buffer size in CSS pixels plus the
/// boxes in paint order
#[derive(Debug, Clone)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub nodes: Vec<LayoutNode>,
}

/// Lay out `root` against `fallback_width` (used when the tree declares no
/// width). The buffer size is the root's border box.
pub fn layout_tree(root: &InlinedNode, fallback_width: u32) -> Layout {
    let mut nodes = Vec::new();
    let width = declared_px(root, "width").unwrap_or(fallback_width).max(1);
    let height = place(root, 0, 0, width, &mut nodes);
    Layout {
        width,
        height: height.max(1),
        nodes,
    }
}

/// Place `node` with its border box at (x, y) and the given width; returns
/// the border-box height.
fn place(node: &InlinedNode, x: i32, y: i32, width: u32, out: &mut Vec<LayoutNode>) -> u32 {
    let self_box = box_model(node);
    let edge = self_box.border + self_box.padding;
    let content_width = width.saturating_sub(edge * 2).max(1);
    let content_x = x + edge as i32;
    let content_y = y + edge as i32;

    let slot = out.len();
    out.push(LayoutNode {
        rect: Rect {
            x,
            y,
            width,
            height: 0,
        },
        background: node
            .declared("background-color")
            .or_else(|| node.declared("background"))
            .and_then(parse_color),
        text: None,
    });

    let font_size = declared_px(node, "font-size").unwrap_or(DEFAULT_FONT_SIZE).max(1);
    let line_height = declared_px(node, "line-height").unwrap_or(font_size + font_size / 4);
    let color = node
        .declared("color")
        .and_then(parse_color)
        .unwrap_or([0, 0, 0, 0xff]);

    let mut cursor = content_y;
    for child in &node.children {
        match child {
            InlinedChild::Text(text) => {
                let lines = wrap_text(text, content_width, font_size);
                let block_height = lines.len() as u32 * line_height;
                out.push(LayoutNode {
                    rect: Rect {
                        x: content_x,
                        y: cursor,
                        width: content_width,
                        height: block_height,
                    },
                    background: None,
                    text: Some(TextBlock {
                        lines,
                        color,
                        font_size,
                        line_height,
                    }),
                });
                cursor += block_height as i32;
            }
            InlinedChild::Element(child_el) => {
                if child_el.declared("position") == Some("absolute") {
                    let left = declared_px(child_el, "left").unwrap_or(0) as i32;
                    let top = declared_px(child_el, "top").unwrap_or(0) as i32;
                    let child_width =
                        declared_px(child_el, "width").unwrap_or(content_width).max(1);
                    place(child_el, content_x + left, content_y + top, child_width, out);
                } else {
                    let child_box = box_model(child_el);
                    let child_width = declared_px(child_el, "width")
                        .unwrap_or(content_width.saturating_sub(child_box.margin * 2))
                        .max(1);
                    cursor += child_box.margin as i32;
                    let child_height = place(
                        child_el,
                        content_x + child_box.margin as i32,
                        cursor,
                        child_width,
                        out,
                    );
                    cursor += (child_height + child_box.margin) as i32;
                }
            }
        }
    }

    let content_height = (cursor - content_y).max(0) as u32;
    let height = declared_px(node, "height")
        .unwrap_or(content_height + edge * 2)
        .max(1);
    out[slot].rect.height = height;
    height
}

fn box_model(node: &InlinedNode) -> BoxModel {
    BoxModel {
        margin: declared_px(node, "margin").unwrap_or(0),
        border: declared_px(node, "border-width")
            .or_else(|| node.declared("border").and_then(first_px))
            .unwrap_or(0),
        padding: declared_px(node, "padding").unwrap_or(0),
    }
}

/// First pixel length of a declared value, e.g. `12px` or `12`
fn declared_px(node: &InlinedNode, property: &str) -> Option<u32> {
    node.declared(property).and_then(first_px)
}

fn first_px(value: &str) -> Option<u32> {
    let token = value.split_whitespace().next()?;
    let digits = token.strip_suffix("px").unwrap_or(token);
    let parsed: f32 = digits.parse().ok()?;
    if parsed.is_sign_negative() {
        return None;
    }
    Some(parsed.round() as u32)
}

/// Greedy word wrap at a fixed-metric character estimate
fn wrap_text(text: &str, content_width: u32, font_size: u32) -> Vec<String> {
    let char_width = (font_size / 2).max(1);
    let chars_per_line = (content_width / char_width).max(1) as usize;

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + word.chars().count() + 1 > chars_per_line
        {
            lines.push(current);
            current = word.to_string();
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Declaration;

    fn node(decls: &[(&str, &str)], children: Vec<InlinedChild>) -> InlinedNode {
        InlinedNode {
            tag: "div".to_string(),
            declarations: decls
                .iter()
                .map(|(p, v)| Declaration::new(*p, *v))
                .collect(),
            children,
        }
    }

    #[test]
    fn declared_sizes_win_over_content() {
        let tree = node(
            &[("width", "300px"), ("height", "120px")],
            vec![InlinedChild::Text("hello world".into())],
        );
        let layout = layout_tree(&tree, 1080);
        assert_eq!(layout.width, 300);
        assert_eq!(layout.height, 120);
    }

    #[test]
    fn children_stack_vertically_inside_padding() {
        let child_a = node(&[("height", "40px")], vec![]);
        let child_b = node(&[("height", "60px")], vec![]);
        let tree = node(
            &[("width", "200px"), ("padding", "10px")],
            vec![
                InlinedChild::Element(child_a),
                InlinedChild::Element(child_b),
            ],
        );
        let layout = layout_tree(&tree, 1080);
        assert_eq!(layout.height, 40 + 60 + 20);
        // root first, then children in order
        assert_eq!(layout.nodes[1].rect.y, 10);
        assert_eq!(layout.nodes[2].rect.y, 50);
    }

    #[test]
    fn absolute_children_do_not_advance_flow() {
        let overlay = node(
            &[("position", "absolute"), ("height", "500px"), ("width", "10px")],
            vec![],
        );
        let block = node(&[("height", "30px")], vec![]);
        let tree = node(
            &[("width", "100px")],
            vec![InlinedChild::Element(overlay), InlinedChild::Element(block)],
        );
        let layout = layout_tree(&tree, 1080);
        assert_eq!(layout.height, 30);
    }

    #[test]
    fn text_wraps_to_content_width() {
        let lines = wrap_text("aaaa bbbb cccc", 40, 16);
        // 40px / 8px per char => 5 chars per line
        assert_eq!(lines, vec!["aaaa", "bbbb", "cccc"]);
    }

    #[test]
    fn background_color_is_parsed() {
        let tree = node(
            &[("width", "10px"), ("height", "10px"), ("background-color", "#102030")],
            vec![],
        );
        let layout = layout_tree(&tree, 1080);
        assert_eq!(layout.nodes[0].background, Some([0x10, 0x20, 0x30, 0xff]));
    }
}
