mod halfblock;

pub use halfblock::HalfBlockRenderer;

use std::io::Write;

/// One frame handed to the terminal renderer: an RGBA pixel buffer sized to
/// the visual area plus a single HUD line below it.
pub struct Frame<'a> {
    pub term_cols: u16,
    pub visual_rows: u16,
    pub pixel_width: usize,
    pub pixel_height: usize,
    pub pixels_rgba: &'a [u8],
    pub hud: &'a str,
    pub sync_updates: bool,
}

pub trait Renderer {
    fn name(&self) -> &'static str;
    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()>;
}
