//! Display-list construction from a computed layout.

use crate::rendering::layout::Layout;

/// Paint commands in back-to-front order
#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: [u8; 4],
    },
    Text {
        x: i32,
        y: i32,
        lines: Vec<String>,
        rgba: [u8; 4],
        font_size: u32,
        line_height: u32,
    },
}

/// Flatten a layout into paint commands: backgrounds as the box is reached,
/// text on top of its own box
pub fn build_display_list(layout: &Layout) -> Vec<PaintCommand> {
    let mut commands = Vec::new();
    for node in &layout.nodes {
        if let Some(rgba) = node.background {
            if rgba[3] > 0 {
                commands.push(PaintCommand::SolidRect {
                    x: node.rect.x,
                    y: node.rect.y,
                    width: node.rect.width,
                    height: node.rect.height,
                    rgba,
                });
            }
        }
        if let Some(text) = &node.text {
            commands.push(PaintCommand::Text {
                x: node.rect.x,
                y: node.rect.y,
                lines: text.lines.clone(),
                rgba: text.color,
                font_size: text.font_size,
                line_height: text.line_height,
            });
        }
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::layout::{LayoutNode, Rect, TextBlock};

    #[test]
    fn transparent_backgrounds_are_skipped() {
        let layout = Layout {
            width: 10,
            height: 10,
            nodes: vec![
                LayoutNode {
                    rect: Rect {
                        x: 0,
                        y: 0,
                        width: 10,
                        height: 10,
                    },
                    background: Some([0, 0, 0, 0]),
                    text: None,
                },
                LayoutNode {
                    rect: Rect {
                        x: 0,
                        y: 0,
                        width: 10,
                        height: 5,
                    },
                    background: None,
                    text: Some(TextBlock {
                        lines: vec!["hi".into()],
                        color: [0, 0, 0, 255],
                        font_size: 16,
                        line_height: 20,
                    }),
                },
            ],
        };
        let commands = build_display_list(&layout);
        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], PaintCommand::Text { .. }));
    }
}
