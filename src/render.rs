use std::sync::OnceLock;

use streamdeck_lib::Context;
use streamdeck_render::{Canvas, FontHandle, FontRegistry, TextOptions, WrapOptions, wrap_text};

// Stream Deck starts the plugin with the bundle directory as its cwd.
const FONT_PATH: &str = "fonts/UAV-OSD-Sans-Mono.ttf";

// Loaded once; without it keys stay blank but counting still runs.
static FONT: OnceLock<Option<FontHandle>> = OnceLock::new();

fn font() -> Option<&'static FontHandle> {
    FONT.get_or_init(|| {
        let bytes = std::fs::read(FONT_PATH)
            .map_err(|e| tracing::error!("cannot read {FONT_PATH}: {e}"))
            .ok()?;
        // The registry keeps a borrow for the life of the process.
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        let mut reg = FontRegistry::new();
        reg.load_bytes("mono", bytes)
            .map_err(|e| tracing::error!("font failed to load: {e:?}"))
            .ok()
    })
    .as_ref()
}

/// Shown while a key has no usable target.
pub const PLACEHOLDER: &str = "--";

/// Render the counter's current value onto its key (144×144 PNG).
///
/// Large targets get a smaller font so every digit stays on the key.
pub fn render_number(cx: &Context, ctx_id: &str, value: u64) {
    render_centered_text(cx, ctx_id, &value.to_string());
}

pub fn render_placeholder(cx: &Context, ctx_id: &str) {
    render_centered_text(cx, ctx_id, PLACEHOLDER);
}

// Key images are 144px square; text keeps 4px clear on each side.
const TEXT_WIDTH: f32 = 136.0;
const FONT_SIZES: [f32; 5] = [56.0, 44.0, 36.0, 28.0, 20.0];

fn one_line() -> WrapOptions {
    WrapOptions { max_width: TEXT_WIDTH, max_lines: 1 }
}

fn fits(font: &FontHandle, size: f32, text: &str) -> bool {
    let lines = wrap_text(font, size, text, &one_line());
    lines.len() == 1 && lines[0].width_px <= TEXT_WIDTH
}

/// Draw `text` in the middle of a key at the biggest size that fits.
///
/// Text too wide for every size is drawn at the smallest one.
fn render_centered_text(cx: &Context, ctx_id: &str, text: &str) {
    let Some(font) = font() else {
        return;
    };

    let size = FONT_SIZES
        .into_iter()
        .find(|&size| fits(font, size, text))
        .unwrap_or(FONT_SIZES[FONT_SIZES.len() - 1]);
    let lines = wrap_text(font, size, text, &one_line());

    let mut canvas = Canvas::key_icon();
    if !lines.is_empty() {
        canvas.draw_text(&lines, &TextOptions::new(font.clone(), size)).ok();
    }

    if let Ok(data_url) = canvas.finish().to_data_url() {
        cx.sd().set_image(ctx_id, Some(data_url), None, None);
    }
}
