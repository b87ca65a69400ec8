use std::io::Write;

use crate::color::Rgb;

/// Drawing surface the simulation paints into once per frame.
pub trait Canvas {
    /// Paints a translucent background-colored veil over the whole surface,
    /// leaving fading afterimages of earlier frames.
    fn clear_with_fade(&mut self, amount: f32);

    /// Composites a filled circle over the surface at the given opacity.
    fn draw_circle(&mut self, x: f32, y: f32, radius: f32, color: Rgb, alpha: f32);
}

/// Framebuffer of half-block pixels (two per terminal cell) holding linear
/// RGB in 0..=255, composited the way a 2D canvas does source-over blending.
pub struct TerminalCanvas {
    width: usize,
    height: usize,
    scale: f32,
    bg_color: Rgb,
    pixels: Vec<[f32; 3]>,
    output_buf: Vec<u8>,
}

impl TerminalCanvas {
    /// `world_height` is the logical height of the viewport drawn into this canvas.
    pub fn new(cols: usize, rows: usize, world_height: f32, bg_color: Rgb) -> Self {
        let width = cols.max(1);
        let height = rows.max(1) * 2;
        let bg = [bg_color.r as f32, bg_color.g as f32, bg_color.b as f32];
        Self {
            width,
            height,
            scale: height as f32 / world_height,
            bg_color,
            pixels: vec![bg; width * height],
            output_buf: Vec::with_capacity(width * height * 25),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Logical width matching this canvas's aspect at the configured world height.
    pub fn world_width(&self) -> f32 {
        self.width as f32 / self.scale
    }

    pub fn world_height(&self) -> f32 {
        self.height as f32 / self.scale
    }

    /// Maps a terminal cell to the world position at its center.
    pub fn cell_to_world(&self, col: u16, row: u16) -> (f32, f32) {
        let px = col as f32 + 0.5;
        let py = row as f32 * 2.0 + 1.0;
        (px / self.scale, py / self.scale)
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        let [r, g, b] = self.pixels[y * self.width + x];
        Rgb::new(r.round() as u8, g.round() as u8, b.round() as u8)
    }

    fn blend(&mut self, x: usize, y: usize, color: Rgb, alpha: f32) {
        let px = &mut self.pixels[y * self.width + x];
        let src = [color.r as f32, color.g as f32, color.b as f32];
        for (dst, s) in px.iter_mut().zip(src) {
            *dst = *dst * (1.0 - alpha) + s * alpha;
        }
    }

    pub fn present<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        self.output_buf.clear();
        self.output_buf.extend_from_slice(b"\x1b[H");

        let mut prev_top_color = Rgb::new(255, 255, 255);
        let mut prev_bot_color = Rgb::new(255, 255, 255);

        // Render using half-blocks
        for y in (0..self.height).step_by(2) {
            for x in 0..self.width {
                let top_color = self.pixel(x, y);
                let bot_color = if y + 1 < self.height {
                    self.pixel(x, y + 1)
                } else {
                    top_color
                };

                if top_color != prev_top_color {
                    write!(
                        self.output_buf,
                        "\x1b[48;2;{};{};{}m",
                        top_color.r, top_color.g, top_color.b
                    )?;
                    prev_top_color = top_color;
                }
                if bot_color != prev_bot_color {
                    write!(
                        self.output_buf,
                        "\x1b[38;2;{};{};{}m",
                        bot_color.r, bot_color.g, bot_color.b
                    )?;
                    prev_bot_color = bot_color;
                }

                self.output_buf.extend_from_slice("▄".as_bytes());
            }
            self.output_buf.extend_from_slice(b"\x1b[0m");
            prev_top_color = Rgb::new(255, 255, 255);
            prev_bot_color = Rgb::new(255, 255, 255);
            if y + 2 < self.height {
                self.output_buf.extend_from_slice(b"\r\n");
            }
        }

        out.write_all(&self.output_buf)?;
        out.flush()?;
        Ok(())
    }
}

impl Canvas for TerminalCanvas {
    fn clear_with_fade(&mut self, amount: f32) {
        let amount = amount.clamp(0.0, 1.0);
        let bg = self.bg_color;
        for y in 0..self.height {
            for x in 0..self.width {
                self.blend(x, y, bg, amount);
            }
        }
    }

    fn draw_circle(&mut self, x: f32, y: f32, radius: f32, color: Rgb, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }

        let cx = x * self.scale;
        let cy = y * self.scale;
        let r = radius * self.scale;

        // Sub-pixel circles still light the pixel they land on
        if r < 0.75 {
            let (px, py) = (cx.floor(), cy.floor());
            if px >= 0.0 && py >= 0.0 && (px as usize) < self.width && (py as usize) < self.height {
                self.blend(px as usize, py as usize, color, alpha);
            }
            return;
        }

        let x0 = (cx - r).floor().max(0.0) as usize;
        let y0 = (cy - r).floor().max(0.0) as usize;
        let x1 = ((cx + r).ceil().max(0.0) as usize).min(self.width);
        let y1 = ((cy + r).ceil().max(0.0) as usize).min(self.height);

        for py in y0..y1 {
            for px in x0..x1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r * r {
                    self.blend(px, py, color, alpha);
                }
            }
        }
    }
}
