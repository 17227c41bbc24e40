use super::{render_text, FollowTarget, RenderSurface, View};
use log::error;
use std::io::Write;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

// Redraws the whole view on every render. A terminal has no scroll
// position to move, so following the newest item prints a marker line.
pub struct TerminalSurface<W: Write> {
    out: W,
    clear: bool,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, clear: bool) -> Self {
        Self { out, clear }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_all(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            error!("Failed to write to terminal: {}", e);
        }
    }
}

impl<W: Write> RenderSurface for TerminalSurface<W> {
    fn render(&mut self, view: &View) {
        let mut text = String::new();
        if self.clear {
            text.push_str(CLEAR_SCREEN);
        }
        text.push_str(&render_text(view));
        self.write_all(&text);
    }

    fn scroll_to_newest(&mut self, target: FollowTarget) {
        self.write_all(&format!(">> new {} entry\n", target));
    }
}
