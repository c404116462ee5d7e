//! Masked normalized cross-correlation between screen captures and templates.
//!
//! Both images are brought to a common layout before comparison: colour
//! images become four channels with a constant opaque alpha, grayscale stays
//! single-channel. The template's own alpha, when present, is the match
//! mask, so transparent template pixels never influence the score.
//!
//! The correlation is `Σ T·I·M² / sqrt(Σ (T·M)² · Σ (I·M)²)` and the engine
//! reports `1 - correlation` as the *difference*: 0 is a perfect match.
//!
//! Edge maps are single-channel, so edge search goes through imageproc's
//! template matching; the colour path above needs four channels and a mask.

use super::bitmap::Bitmap;
use super::config::MatchConfig;
use super::template::Template;
use crate::geometry::{Point, Rect};
use image::GrayImage;
use imageproc::template_matching::{
    MatchTemplateMethod, find_extremes, match_template, match_template_with_mask,
};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

/// Failures inside the correlation. Never leave the engine: they are
/// logged and reported as a maximal difference.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("channel layouts differ: scene has {scene}, template has {template}")]
    ChannelMismatch { scene: usize, template: usize },

    #[error("template {template_width}x{template_height} at ({x}, {y}) exceeds scene {scene_width}x{scene_height}")]
    TemplateTooLarge {
        x: usize,
        y: usize,
        template_width: usize,
        template_height: usize,
        scene_width: usize,
        scene_height: usize,
    },

    #[error("mask has {mask} entries for {pixels} template pixels")]
    MaskSize { mask: usize, pixels: usize },

    #[error("mask excludes every template pixel")]
    EmptyMask,
}

type MatchOutcome<T> = Result<T, MatchError>;

/// Outcome of scoring a template against a scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    /// `1 - correlation`, in `[0, 1]`.
    pub difference: f64,
    /// Center of the best-matching box, only for positional searches.
    pub location: Option<Point>,
}

impl MatchResult {
    pub const NO_MATCH: MatchResult = MatchResult {
        difference: 1.0,
        location: None,
    };

    pub fn is_match(&self, threshold: f64) -> bool {
        self.difference <= threshold
    }
}

/// Interleaved f32 samples in the comparison layout (1 or 4 channels).
struct Planes {
    width: usize,
    height: usize,
    channels: usize,
    samples: Vec<f32>,
}

impl Planes {
    fn from_bitmap(bitmap: &Bitmap) -> Self {
        let samples = match bitmap.channels() {
            1 => bitmap.data().iter().map(|&v| v as f32).collect(),
            c => bitmap
                .data()
                .chunks_exact(c as usize)
                .flat_map(|px| [px[0] as f32, px[1] as f32, px[2] as f32, 255.0])
                .collect(),
        };
        Self {
            width: bitmap.width() as usize,
            height: bitmap.height() as usize,
            channels: if bitmap.channels() == 1 { 1 } else { 4 },
            samples,
        }
    }
}

/// A template pixel that takes part in the correlation.
struct Tap {
    dx: usize,
    dy: usize,
    /// Squared mask weight.
    weight: f64,
}

/// Template reduced to its contributing pixels with `T·M²` precomputed.
struct PreparedTemplate {
    width: usize,
    height: usize,
    channels: usize,
    taps: Vec<Tap>,
    weighted: Vec<f64>,
    energy: f64,
}

impl PreparedTemplate {
    fn new(template: &Bitmap, mask: Option<&[u8]>) -> MatchOutcome<Self> {
        let planes = Planes::from_bitmap(template);
        let pixels = planes.width * planes.height;
        if let Some(mask) = mask
            && mask.len() != pixels
        {
            return Err(MatchError::MaskSize {
                mask: mask.len(),
                pixels,
            });
        }

        let c = planes.channels;
        let mut taps = Vec::new();
        let mut weighted = Vec::new();
        let mut energy = 0.0f64;
        for idx in 0..pixels {
            let m = mask.map_or(1.0, |mask| mask[idx] as f64 / 255.0);
            if m <= 0.0 {
                continue;
            }
            let weight = m * m;
            for &t in &planes.samples[idx * c..(idx + 1) * c] {
                let t = t as f64;
                weighted.push(t * weight);
                energy += t * t * weight;
            }
            taps.push(Tap {
                dx: idx % planes.width,
                dy: idx / planes.width,
                weight,
            });
        }
        if taps.is_empty() {
            return Err(MatchError::EmptyMask);
        }

        Ok(Self {
            width: planes.width,
            height: planes.height,
            channels: c,
            taps,
            weighted,
            energy,
        })
    }

    /// The template placed with its top-left corner at `(x, y)` must lie inside the scene.
    fn check_fits(&self, scene: &Planes, x: usize, y: usize) -> MatchOutcome<()> {
        if scene.channels != self.channels {
            return Err(MatchError::ChannelMismatch {
                scene: scene.channels,
                template: self.channels,
            });
        }
        if x + self.width > scene.width || y + self.height > scene.height {
            return Err(MatchError::TemplateTooLarge {
                x,
                y,
                template_width: self.width,
                template_height: self.height,
                scene_width: scene.width,
                scene_height: scene.height,
            });
        }
        Ok(())
    }

    /// Correlation with the template's top-left corner at `(x, y)`.
    fn correlate_at(&self, scene: &Planes, x: usize, y: usize) -> f64 {
        let c = self.channels;
        let mut cross = 0.0f64;
        let mut scene_energy = 0.0f64;
        for (k, tap) in self.taps.iter().enumerate() {
            let base = ((y + tap.dy) * scene.width + x + tap.dx) * c;
            let samples = &scene.samples[base..base + c];
            let weighted = &self.weighted[k * c..(k + 1) * c];
            for (&i, &tw) in samples.iter().zip(weighted) {
                let i = i as f64;
                cross += tw * i;
                scene_energy += tap.weight * i * i;
            }
        }
        let denom = (self.energy * scene_energy).sqrt();
        if denom <= f64::EPSILON {
            // Nothing but black under the mask: correlation is undefined
            return 0.0;
        }
        (cross / denom).clamp(0.0, 1.0)
    }
}

/// Scores and locates templates in screen captures.
#[derive(Debug, Clone, Default)]
pub struct MatchEngine {
    config: MatchConfig,
}

impl MatchEngine {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Difference between `scene` and `template` anchored at the scene's
    /// top-left corner, masked by the template's alpha.
    pub fn score(&self, scene: &Bitmap, template: &Bitmap) -> f64 {
        self.score_at(scene, template, Point::default())
    }

    /// Difference with the template's top-left corner placed at `at`.
    pub fn score_at(&self, scene: &Bitmap, template: &Bitmap, at: Point) -> f64 {
        let mask = template.alpha_mask();
        self.score_masked(scene, template, mask.as_deref(), at)
    }

    /// Score a [`Template`] at the screen position it was cut from.
    pub fn score_template(&self, scene: &Bitmap, template: &Template) -> f64 {
        self.score_at(scene, template.image(), template.origin())
    }

    /// Like [`score`](Self::score) with an explicit per-pixel mask
    /// (0 ignores a pixel, 255 counts it fully).
    pub fn score_with_mask(&self, scene: &Bitmap, template: &Bitmap, mask: &[u8]) -> f64 {
        self.score_masked(scene, template, Some(mask), Point::default())
    }

    fn score_masked(&self, scene: &Bitmap, template: &Bitmap, mask: Option<&[u8]>, at: Point) -> f64 {
        if scene.is_empty() || template.is_empty() {
            return MatchResult::NO_MATCH.difference;
        }
        let (x, y) = at.to_device();
        let (x, y) = (x as usize, y as usize);
        let outcome = PreparedTemplate::new(template, mask).and_then(|tpl| {
            let scene = Planes::from_bitmap(scene);
            tpl.check_fits(&scene, x, y)?;
            Ok(1.0 - tpl.correlate_at(&scene, x, y))
        });
        match outcome {
            Ok(difference) => difference.max(0.0),
            Err(e) => {
                log::warn!("Error in matching: {e}");
                MatchResult::NO_MATCH.difference
            }
        }
    }

    /// Best position of `template` anywhere inside `scene`.
    pub fn locate(&self, scene: &Bitmap, template: &Bitmap) -> MatchResult {
        let mask = template.alpha_mask();
        self.locate_masked(scene, template, mask.as_deref())
    }

    /// [`locate`](Self::locate) on edge maps, for anti-aliased or animated
    /// elements where raw pixels drift. A single-channel template is taken to
    /// be an edge map already; colour templates are edge-filtered here.
    pub fn locate_edges(&self, scene: &Bitmap, template: &Bitmap) -> MatchResult {
        if scene.is_empty() || template.is_empty() {
            return MatchResult::NO_MATCH;
        }
        let MatchConfig {
            blur_sigma,
            canny_low,
            canny_high,
            ..
        } = self.config;
        let scene_edges = scene.edges(blur_sigma, canny_low, canny_high);
        let template_edges = if template.channels() == 1 {
            template.to_luma()
        } else {
            template.edges(blur_sigma, canny_low, canny_high).to_luma()
        };
        match Self::match_edge_maps(&scene_edges.to_luma(), &template_edges, template.alpha_mask()) {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Error in edge locating: {e}");
                MatchResult::NO_MATCH
            }
        }
    }

    /// Normalized cross-correlation of two grayscale edge maps over every offset.
    fn match_edge_maps(
        scene: &GrayImage,
        template: &GrayImage,
        mask: Option<Vec<u8>>,
    ) -> MatchOutcome<MatchResult> {
        let (tw, th) = template.dimensions();
        let (sw, sh) = scene.dimensions();
        if tw > sw || th > sh {
            return Err(MatchError::TemplateTooLarge {
                x: 0,
                y: 0,
                template_width: tw as usize,
                template_height: th as usize,
                scene_width: sw as usize,
                scene_height: sh as usize,
            });
        }

        let method = MatchTemplateMethod::CrossCorrelationNormalized;
        let mut scores = match mask {
            Some(mask) => {
                if mask.iter().all(|&m| m == 0) {
                    return Err(MatchError::EmptyMask);
                }
                let pixels = (tw * th) as usize;
                let len = mask.len();
                let mask = GrayImage::from_raw(tw, th, mask)
                    .ok_or(MatchError::MaskSize { mask: len, pixels })?;
                match_template_with_mask(scene, template, method, &mask)
            }
            None => match_template(scene, template, method),
        };
        // Offsets with no edges under the template have no defined correlation
        for score in scores.pixels_mut() {
            if !score[0].is_finite() {
                score[0] = 0.0;
            }
        }

        let extremes = find_extremes(&scores);
        let (x, y) = extremes.max_value_location;
        let correlation = (extremes.max_value as f64).clamp(0.0, 1.0);
        let bounds = Rect::new(x as i32, y as i32, tw as i32, th as i32);
        Ok(MatchResult {
            difference: 1.0 - correlation,
            location: Some(bounds.center()),
        })
    }

    fn locate_masked(&self, scene: &Bitmap, template: &Bitmap, mask: Option<&[u8]>) -> MatchResult {
        if scene.is_empty() || template.is_empty() {
            return MatchResult::NO_MATCH;
        }
        match Self::scan(scene, template, mask) {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Error in locating: {e}");
                MatchResult::NO_MATCH
            }
        }
    }

    fn scan(scene: &Bitmap, template: &Bitmap, mask: Option<&[u8]>) -> MatchOutcome<MatchResult> {
        let tpl = PreparedTemplate::new(template, mask)?;
        let scene = Planes::from_bitmap(scene);
        tpl.check_fits(&scene, 0, 0)?;

        let max_x = scene.width - tpl.width;
        let max_y = scene.height - tpl.height;

        // Best (score, x) per row in parallel, then the first maximum in raster order
        let row_best: Vec<(f64, usize)> = (0..=max_y)
            .into_par_iter()
            .map(|y| {
                let mut best = (f64::NEG_INFINITY, 0);
                for x in 0..=max_x {
                    let score = tpl.correlate_at(&scene, x, y);
                    if score > best.0 {
                        best = (score, x);
                    }
                }
                best
            })
            .collect();

        let mut best = (f64::NEG_INFINITY, 0, 0);
        for (y, &(score, x)) in row_best.iter().enumerate() {
            if score > best.0 {
                best = (score, x, y);
            }
        }
        let (score, x, y) = best;
        let bounds = Rect::new(x as i32, y as i32, tpl.width as i32, tpl.height as i32);
        Ok(MatchResult {
            difference: (1.0 - score).max(0.0),
            location: Some(bounds.center()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic textured RGB image.
    fn textured(width: u32, height: u32, seed: u32) -> Bitmap {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = (x * 37 + y * 91 + seed * 53) ^ (x * y + seed);
                data.extend_from_slice(&[(v % 251) as u8, (v * 7 % 241) as u8, (v * 13 % 239) as u8]);
            }
        }
        Bitmap::from_raw(width, height, 3, data).unwrap()
    }

    fn with_alpha(bitmap: &Bitmap, alpha: impl Fn(u32, u32) -> u8) -> Bitmap {
        let mut data = Vec::new();
        for y in 0..bitmap.height() {
            for x in 0..bitmap.width() {
                let px = bitmap.pixel(x, y);
                data.extend_from_slice(&[px[0], px[1], px[2], alpha(x, y)]);
            }
        }
        Bitmap::from_raw(bitmap.width(), bitmap.height(), 4, data).unwrap()
    }

    #[test]
    fn test_self_match_is_perfect() {
        let engine = MatchEngine::default();
        for seed in 0..4 {
            let img = textured(24, 16, seed);
            assert!(engine.score(&img, &img) < 1e-9, "seed {seed}");
            let rgba = with_alpha(&img, |_, _| 255);
            assert!(engine.score(&rgba, &rgba) < 1e-9);
        }
    }

    #[test]
    fn test_gray_self_match_is_perfect() {
        let engine = MatchEngine::default();
        let data = (0..64u32).map(|i| (i * 3 + 1) as u8).collect();
        let gray = Bitmap::from_raw(8, 8, 1, data).unwrap();
        assert!(engine.score(&gray, &gray) < 1e-9);
    }

    #[test]
    fn test_transparent_pixels_do_not_count() {
        let engine = MatchEngine::default();
        let scene = textured(20, 20, 1);
        let other = textured(20, 20, 9);
        // Template: scene content on the left half, garbage on the transparent right half
        let mut data = Vec::new();
        for y in 0..20 {
            for x in 0..20 {
                let (px, a) = if x < 10 {
                    (scene.pixel(x, y), 255)
                } else {
                    (other.pixel(x, y), 0)
                };
                data.extend_from_slice(&[px[0], px[1], px[2], a]);
            }
        }
        let template = Bitmap::from_raw(20, 20, 4, data).unwrap();
        assert!(engine.score(&scene, &template) < 1e-9);

        let opaque = with_alpha(&template, |_, _| 255);
        assert!(engine.score(&scene, &opaque) > 1e-3);
    }

    #[test]
    fn test_explicit_mask() {
        let engine = MatchEngine::default();
        let scene = textured(10, 10, 2);
        let mut template = scene.data().to_vec();
        // Corrupt the bottom row, then mask it away
        for b in &mut template[90 * 3..] {
            *b = 255 - *b;
        }
        let template = Bitmap::from_raw(10, 10, 3, template).unwrap();
        let mask: Vec<u8> = (0..100).map(|i| if i < 90 { 255 } else { 0 }).collect();
        assert!(engine.score_with_mask(&scene, &template, &mask) < 1e-9);
        assert!(engine.score(&scene, &template) > 1e-4);
    }

    #[test]
    fn test_difference_is_never_negative() {
        let engine = MatchEngine::default();
        let a = textured(12, 12, 3);
        let b = textured(12, 12, 4);
        for (scene, template) in [(&a, &a), (&a, &b), (&b, &a)] {
            let d = engine.score(scene, template);
            assert!((0.0..=1.0).contains(&d), "difference {d}");
            assert!(!MatchResult { difference: d, location: None }.is_match(-0.01));
        }
    }

    #[test]
    fn test_degenerate_inputs_are_no_match() {
        let engine = MatchEngine::default();
        let scene = textured(8, 8, 0);
        let empty = Bitmap::from_raw(0, 0, 3, Vec::new()).unwrap();
        assert_eq!(engine.score(&scene, &empty), 1.0);
        assert_eq!(engine.score(&empty, &scene), 1.0);
        assert_eq!(engine.locate(&scene, &empty), MatchResult::NO_MATCH);

        // Fully transparent template
        let invisible = with_alpha(&scene, |_, _| 0);
        assert_eq!(engine.score(&scene, &invisible), 1.0);
    }

    #[test]
    fn test_internal_failures_are_no_match() {
        let engine = MatchEngine::default();
        let scene = textured(8, 8, 0);
        let larger = textured(9, 8, 0);
        assert_eq!(engine.score(&scene, &larger), 1.0);
        assert_eq!(engine.locate(&scene, &larger), MatchResult::NO_MATCH);

        let gray = Bitmap::from_raw(8, 8, 1, vec![10; 64]).unwrap();
        assert_eq!(engine.score(&scene, &gray), 1.0);

        let mask = vec![255u8; 3];
        assert_eq!(engine.score_with_mask(&scene, &scene, &mask), 1.0);
    }

    #[test]
    fn test_locate_returns_center_of_best_box() {
        let engine = MatchEngine::default();
        let scene = textured(40, 30, 5);
        let template = scene.crop(Rect::new(17, 9, 8, 6)).unwrap();
        let result = engine.locate(&scene, &template);
        assert!(result.difference < 1e-9);
        // Top-left (17, 9), 8x6 box -> center (21, 12)
        assert_eq!(result.location, Some(Point::new(21, 12)));
    }

    #[test]
    fn test_locate_with_masked_template() {
        let engine = MatchEngine::default();
        let scene = textured(30, 30, 6);
        let patch = scene.crop(Rect::new(4, 11, 6, 6)).unwrap();
        // Only a ring of the patch is opaque
        let template = with_alpha(&patch, |x, y| {
            if x == 0 || y == 0 || x == 5 || y == 5 { 255 } else { 0 }
        });
        let result = engine.locate(&scene, &template);
        assert!(result.difference < 1e-9);
        assert_eq!(result.location, Some(Point::new(7, 14)));
    }

    #[test]
    fn test_score_at_offset() {
        let engine = MatchEngine::default();
        let scene = textured(30, 20, 7);
        let patch = scene.crop(Rect::new(12, 5, 9, 7)).unwrap();
        assert!(engine.score_at(&scene, &patch, Point::new(12, 5)) < 1e-9);
        assert!(engine.score(&scene, &patch) > 1e-3);
        // Placed so that it would hang over the right edge
        assert_eq!(engine.score_at(&scene, &patch, Point::new(25, 5)), 1.0);
    }

    #[test]
    fn test_locate_edges_with_colour_template() {
        let engine = MatchEngine::default();
        let (w, h) = (48u32, 36u32);
        let mut data = Vec::new();
        for y in 0..h {
            for x in 0..w {
                let inside = (30..40).contains(&x) && (8..18).contains(&y);
                data.extend_from_slice(&if inside { [230, 200, 40] } else { [20, 30, 60] });
            }
        }
        let scene = Bitmap::from_raw(w, h, 3, data).unwrap();
        // Square plus a 5 pixel margin, fully opaque
        let template = with_alpha(&scene.crop(Rect::new(25, 3, 20, 20)).unwrap(), |_, _| 255);
        let result = engine.locate_edges(&scene, &template);
        assert!(result.difference < 0.3, "difference {}", result.difference);
        assert_eq!(result.location, Some(Point::new(35, 13)));

        let invisible = with_alpha(&template, |_, _| 0);
        assert_eq!(engine.locate_edges(&scene, &invisible), MatchResult::NO_MATCH);
    }

    #[test]
    fn test_locate_edges_finds_shape() {
        let engine = MatchEngine::default();
        // Dark scene with a bright square; brightness differs between scene and
        // template, which the edge maps do not care about
        let square = |w: u32, h: u32, x0: u32, y0: u32, level: u8| {
            let data = (0..w * h)
                .map(|i| {
                    let (x, y) = (i % w, i / w);
                    if (x0..x0 + 8).contains(&x) && (y0..y0 + 8).contains(&y) { level } else { 0 }
                })
                .collect();
            Bitmap::from_raw(w, h, 1, data).unwrap()
        };
        let scene = square(40, 40, 22, 6, 250);
        let template = square(16, 16, 4, 4, 180).edges(1.0, 255.0 / 3.0, 255.0);
        let result = engine.locate_edges(&scene, &template);
        assert!(result.difference < 0.3, "difference {}", result.difference);
        // Square at (22, 6) in the scene, (4, 4) in the template -> box top-left (18, 2)
        assert_eq!(result.location, Some(Point::new(26, 10)));
    }
}
