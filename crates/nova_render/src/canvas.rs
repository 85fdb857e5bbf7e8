//! Per-frame list of draw commands.
//!
//! Game code records into a `Canvas`; the mesh builder turns the geometric
//! commands into GPU quads and the egui overlay paints the text commands.
//! A `Fill` wipes everything recorded before it.

use glam::Vec2;
use nova_core::{Color, Rect};

#[derive(Debug, Clone, PartialEq)]
pub struct TextCommand {
    pub text: String,
    pub pos: Vec2,
    pub size: f32,
    pub color: Color,
    /// `pos` is the text center instead of its top-left corner.
    pub centered: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Fill(Color),
    /// Image stretched over `rect`, rotated `angle` degrees counterclockwise
    /// about the rect center.
    Image {
        path: String,
        rect: Rect,
        angle: f32,
        tint: Color,
    },
    /// `border` of 0 fills the rect; otherwise an outline that thick.
    Rect {
        rect: Rect,
        color: Color,
        border: f32,
    },
    Line {
        from: Vec2,
        to: Vec2,
        color: Color,
        width: f32,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Color,
    },
    Text(TextCommand),
}

#[derive(Debug, Clone, Default)]
pub struct Canvas {
    commands: Vec<DrawCommand>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn push(&mut self, command: DrawCommand) {
        if matches!(command, DrawCommand::Fill(_)) {
            self.commands.clear();
        }
        self.commands.push(command);
    }

    pub fn fill(&mut self, color: Color) {
        self.push(DrawCommand::Fill(color));
    }

    pub fn image(&mut self, path: &str, rect: Rect, angle: f32) {
        self.push(DrawCommand::Image {
            path: path.to_string(),
            rect,
            angle,
            tint: Color::WHITE,
        });
    }

    pub fn rect(&mut self, rect: Rect, color: Color) {
        self.push(DrawCommand::Rect {
            rect,
            color,
            border: 0.0,
        });
    }

    pub fn rect_outline(&mut self, rect: Rect, color: Color, border: f32) {
        self.push(DrawCommand::Rect {
            rect,
            color,
            border: border.max(0.0),
        });
    }

    pub fn line(&mut self, from: Vec2, to: Vec2, color: Color, width: f32) {
        self.push(DrawCommand::Line {
            from,
            to,
            color,
            width,
        });
    }

    pub fn circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    pub fn text(&mut self, text: impl Into<String>, pos: Vec2, size: f32, color: Color) {
        self.push(DrawCommand::Text(TextCommand {
            text: text.into(),
            pos,
            size,
            color,
            centered: false,
        }));
    }

    pub fn text_centered(&mut self, text: impl Into<String>, center: Vec2, size: f32, color: Color) {
        self.push(DrawCommand::Text(TextCommand {
            text: text.into(),
            pos: center,
            size,
            color,
            centered: true,
        }));
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextCommand> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text(t) => Some(t),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_discards_earlier_commands() {
        let mut canvas = Canvas::new();
        canvas.rect(Rect::new(0.0, 0.0, 5.0, 5.0), Color::RED);
        canvas.text("gone", Vec2::ZERO, 12.0, Color::BLACK);
        canvas.fill(Color::WHITE);
        canvas.text("kept", Vec2::ZERO, 12.0, Color::BLACK);

        assert_eq!(canvas.len(), 2);
        assert_eq!(canvas.commands()[0], DrawCommand::Fill(Color::WHITE));
        let texts: Vec<_> = canvas.texts().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["kept"]);
    }

    #[test]
    fn outline_border_is_never_negative() {
        let mut canvas = Canvas::new();
        canvas.rect_outline(Rect::new(0.0, 0.0, 5.0, 5.0), Color::RED, -3.0);
        assert!(matches!(
            canvas.commands()[0],
            DrawCommand::Rect { border, .. } if border == 0.0
        ));
    }

    #[test]
    fn centered_text_is_flagged() {
        let mut canvas = Canvas::new();
        canvas.text_centered("Play", Vec2::new(50.0, 20.0), 20.0, Color::BLACK);
        let t = canvas.texts().next().expect("text command");
        assert!(t.centered);
        assert_eq!(t.pos, Vec2::new(50.0, 20.0));
    }
}
