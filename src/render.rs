//! Canvas2D presentation
//!
//! Letters render as colored blocks with their glyph on top, particles as
//! colored discs. Which color a letter currently shows (base vs flash) is
//! tracked here in `Visuals`; the reward engine only issues the swaps.

use std::collections::HashMap;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::consts::FLASH_COLOR;
use crate::layout::LetterPlacement;
use crate::world::ParticleView;

/// Current display colors of the letter obstacles.
pub struct Visuals {
    base: HashMap<char, String>,
    current: HashMap<char, String>,
}

impl Visuals {
    pub fn new(placements: &[LetterPlacement]) -> Self {
        let base: HashMap<char, String> = placements
            .iter()
            .map(|p| (p.letter, format!("hsl({}, 70%, 75%)", p.hue_deg)))
            .collect();
        Self {
            current: base.clone(),
            base,
        }
    }

    /// Swap a letter to the highlight color.
    pub fn flash(&mut self, letter: char) {
        self.current.insert(letter, FLASH_COLOR.to_string());
    }

    /// Restore a letter's base color.
    pub fn restore(&mut self, letter: char) {
        if let Some(color) = self.base.get(&letter) {
            self.current.insert(letter, color.clone());
        }
    }

    fn color(&self, letter: char) -> &str {
        self.current
            .get(&letter)
            .map(String::as_str)
            .unwrap_or(FLASH_COLOR)
    }
}

pub struct Renderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn new(canvas: HtmlCanvasElement) -> Option<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()??
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self { canvas, ctx })
    }

    /// Draw one frame.
    pub fn draw(
        &self,
        letters: &[LetterPlacement],
        visuals: &Visuals,
        particles: &[ParticleView],
    ) {
        let w = self.canvas.width() as f64;
        let h = self.canvas.height() as f64;

        self.ctx.set_fill_style_str("#000000");
        self.ctx.fill_rect(0.0, 0.0, w, h);

        for p in letters {
            let x = (p.center.x - p.half_extents.x) as f64;
            let y = (p.center.y - p.half_extents.y) as f64;
            let lw = (p.half_extents.x * 2.0) as f64;
            let lh = (p.half_extents.y * 2.0) as f64;

            self.ctx.set_fill_style_str(visuals.color(p.letter));
            self.ctx.fill_rect(x, y, lw, lh);

            let font_px = (p.half_extents.x * 1.4).round();
            self.ctx.set_font(&format!("bold {font_px}px sans-serif"));
            self.ctx.set_text_align("center");
            self.ctx.set_text_baseline("middle");
            self.ctx.set_fill_style_str("#101010");
            self.ctx
                .fill_text(&p.letter.to_string(), p.center.x as f64, p.center.y as f64)
                .ok();
        }

        for particle in particles {
            self.ctx.begin_path();
            self.ctx
                .arc(
                    particle.pos.x as f64,
                    particle.pos.y as f64,
                    particle.radius as f64,
                    0.0,
                    std::f64::consts::TAU,
                )
                .ok();
            self.ctx
                .set_fill_style_str(&format!("hsl({}, 85%, 60%)", particle.hue_deg));
            self.ctx.fill();
        }
    }
}
