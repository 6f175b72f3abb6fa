//! 2D drawing surface abstraction
//!
//! Mirrors the subset of a canvas context the engine draws with. Hosts provide
//! the real target; `RecordingSurface` captures commands for headless runs.

use std::cell::RefCell;
use std::rc::Rc;

/// RGBA color, components in 0-1
pub type Rgba = [f32; 4];

/// Any 2D target supporting state save/restore, transforms and paths
pub trait DrawSurface {
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f32, y: f32);
    /// Rotation in radians
    fn rotate(&mut self, angle: f32);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn arc(&mut self, x: f32, y: f32, radius: f32, start_angle: f32, end_angle: f32);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn set_fill_color(&mut self, color: Rgba);
    fn set_stroke_color(&mut self, color: Rgba);
    fn set_line_width(&mut self, width: f32);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32);
}

/// A recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Save,
    Restore,
    Translate(f32, f32),
    Rotate(f32),
    BeginPath,
    MoveTo(f32, f32),
    LineTo(f32, f32),
    Arc { x: f32, y: f32, radius: f32 },
    ClosePath,
    Fill,
    Stroke,
    FillColor(Rgba),
    StrokeColor(Rgba),
    LineWidth(f32),
    FillRect(f32, f32, f32, f32),
}

/// Surface that records commands instead of drawing.
///
/// Clones share the same command log so a test can keep a handle after the
/// surface is handed to the engine.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    commands: Rc<RefCell<Vec<DrawCommand>>>,
    /// Keep at most this many commands (0 = unbounded)
    limit: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only keep the most recent `limit` commands (for long headless runs)
    pub fn bounded(limit: usize) -> Self {
        Self {
            commands: Rc::default(),
            limit,
        }
    }

    pub fn commands(&self) -> Vec<DrawCommand> {
        self.commands.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.commands.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.commands.borrow_mut().clear();
    }

    /// Number of save/restore pairs still open
    pub fn save_depth(&self) -> i32 {
        self.commands.borrow().iter().fold(0, |depth, cmd| match cmd {
            DrawCommand::Save => depth + 1,
            DrawCommand::Restore => depth - 1,
            _ => depth,
        })
    }

    fn push(&mut self, cmd: DrawCommand) {
        let mut commands = self.commands.borrow_mut();
        if self.limit > 0 && commands.len() >= self.limit {
            commands.remove(0);
        }
        commands.push(cmd);
    }
}

impl DrawSurface for RecordingSurface {
    fn save(&mut self) {
        self.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.push(DrawCommand::Restore);
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.push(DrawCommand::Translate(x, y));
    }

    fn rotate(&mut self, angle: f32) {
        self.push(DrawCommand::Rotate(angle));
    }

    fn begin_path(&mut self) {
        self.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.push(DrawCommand::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.push(DrawCommand::LineTo(x, y));
    }

    fn arc(&mut self, x: f32, y: f32, radius: f32, _start_angle: f32, _end_angle: f32) {
        self.push(DrawCommand::Arc { x, y, radius });
    }

    fn close_path(&mut self) {
        self.push(DrawCommand::ClosePath);
    }

    fn fill(&mut self) {
        self.push(DrawCommand::Fill);
    }

    fn stroke(&mut self) {
        self.push(DrawCommand::Stroke);
    }

    fn set_fill_color(&mut self, color: Rgba) {
        self.push(DrawCommand::FillColor(color));
    }

    fn set_stroke_color(&mut self, color: Rgba) {
        self.push(DrawCommand::StrokeColor(color));
    }

    fn set_line_width(&mut self, width: f32) {
        self.push(DrawCommand::LineWidth(width));
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.push(DrawCommand::FillRect(x, y, w, h));
    }
}

/// CSS color string for canvas style setters
pub fn css_rgba(color: Rgba) -> String {
    let [r, g, b, a] = color;
    format!(
        "rgba({},{},{},{})",
        (r.clamp(0.0, 1.0) * 255.0).round() as u8,
        (g.clamp(0.0, 1.0) * 255.0).round() as u8,
        (b.clamp(0.0, 1.0) * 255.0).round() as u8,
        a.clamp(0.0, 1.0)
    )
}
