//! One-time placement of the letter obstacles
//!
//! Letters sit on a horizontal band in the upper part of the viewport. Width
//! follows the screen with min/max clamps; when letters plus their minimum
//! spacing would overflow, widths shrink before spacing does.

use glam::Vec2;

/// Placement knobs. Defaults match the shipped layout.
#[derive(Debug, Clone, Copy)]
pub struct LayoutParams {
    /// Vertical position of the letter band, as a fraction of view height.
    pub y_pos_ratio: f32,
    /// Base letter width as a fraction of view width.
    pub base_width_ratio: f32,
    pub max_width: f32,
    pub min_width: f32,
    /// Height = width * aspect_ratio.
    pub aspect_ratio: f32,
    /// Minimum gap between letters, as a fraction of letter width.
    pub min_spacing_ratio: f32,
    /// Fraction of view width usable by the whole band.
    pub usable_width_ratio: f32,
    /// Horizontal inset of the band, as a fraction of view width.
    pub x_inset_ratio: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            y_pos_ratio: 0.28,
            base_width_ratio: 0.1,
            max_width: 60.0,
            min_width: 25.0,
            aspect_ratio: 1.5,
            min_spacing_ratio: 0.4,
            usable_width_ratio: 0.95,
            x_inset_ratio: 0.025,
        }
    }
}

/// A placed letter obstacle: identity, static bounds, base display hue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterPlacement {
    pub letter: char,
    pub center: Vec2,
    pub half_extents: Vec2,
    /// Base display hue in degrees; saturation/lightness are fixed.
    pub hue_deg: f32,
}

/// Compute placements for `letters` inside a `view_w` x `view_h` viewport.
pub fn place_letters(
    letters: &[char],
    view_w: f32,
    view_h: f32,
    params: &LayoutParams,
) -> Vec<LetterPlacement> {
    let count = letters.len();
    if count == 0 {
        return Vec::new();
    }
    let count_f = count as f32;

    let mut width = (view_w * params.base_width_ratio).min(params.max_width);
    width = width.max(params.min_width);

    // Shrink letters (partially) when the band would overflow the viewport.
    let available = view_w * params.usable_width_ratio;
    let block = count_f * width;
    let min_spacing = (count_f + 1.0) * (width * params.min_spacing_ratio);
    if block + min_spacing > available {
        let excess = (block + min_spacing) - available;
        width -= (excess / count_f) * 0.8;
        width = width.max(params.min_width);
    }

    let height = width * params.aspect_ratio;
    let total = count_f * width;
    let spacing = (available - total) / (count_f + 1.0);
    let y = view_h * params.y_pos_ratio;
    let inset = view_w * params.x_inset_ratio;

    letters
        .iter()
        .enumerate()
        .map(|(i, &letter)| {
            let i_f = i as f32;
            let x = spacing * (i_f + 1.0) + width * i_f + width / 2.0 + inset;
            LetterPlacement {
                letter,
                center: Vec2::new(x, y),
                half_extents: Vec2::new(width / 2.0, height / 2.0),
                hue_deg: i_f * (360.0 / count_f),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTERS: [char; 5] = ['I', 'W', 'L', 'Y', 'F'];

    #[test]
    fn test_letters_ordered_and_non_overlapping() {
        let placed = place_letters(&LETTERS, 800.0, 600.0, &LayoutParams::default());
        assert_eq!(placed.len(), 5);
        for pair in placed.windows(2) {
            let right_edge = pair[0].center.x + pair[0].half_extents.x;
            let left_edge = pair[1].center.x - pair[1].half_extents.x;
            assert!(right_edge < left_edge, "letters must not overlap");
        }
    }

    #[test]
    fn test_band_stays_inside_viewport() {
        for view_w in [320.0, 800.0, 2560.0] {
            let placed = place_letters(&LETTERS, view_w, 600.0, &LayoutParams::default());
            let first = placed.first().unwrap();
            let last = placed.last().unwrap();
            assert!(first.center.x - first.half_extents.x > 0.0);
            assert!(last.center.x + last.half_extents.x < view_w);
        }
    }

    #[test]
    fn test_min_width_respected_on_narrow_screens() {
        let params = LayoutParams::default();
        let placed = place_letters(&LETTERS, 200.0, 600.0, &params);
        for p in &placed {
            assert!(p.half_extents.x * 2.0 >= params.min_width - 1e-3);
        }
    }

    #[test]
    fn test_width_clamped_on_wide_screens() {
        let params = LayoutParams::default();
        let placed = place_letters(&LETTERS, 4000.0, 600.0, &params);
        for p in &placed {
            assert!(p.half_extents.x * 2.0 <= params.max_width + 1e-3);
        }
    }

    #[test]
    fn test_hues_spread_evenly() {
        let placed = place_letters(&LETTERS, 800.0, 600.0, &LayoutParams::default());
        let hues: Vec<f32> = placed.iter().map(|p| p.hue_deg).collect();
        assert_eq!(hues, vec![0.0, 72.0, 144.0, 216.0, 288.0]);
    }
}
