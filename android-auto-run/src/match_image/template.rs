//! Named reference images and loading them from asset directories

use super::bitmap::Bitmap;
use super::config::MatchConfig;
use crate::geometry::{Point, Rect};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub type TemplateResult<T> = Result<T, TemplateError>;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load template {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Template {name} is not a decodable image")]
    InvalidImage { name: String },

    #[error("Template crop region [{x},{y},{width},{height}] exceeds image bounds ({image_width}x{image_height})")]
    CropOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },
}

/// A named reference image with its acceptance threshold.
///
/// Equality is by name. The pixels are shared, so cloning is cheap.
/// `origin` is where the image sits on the screen it was cut from;
/// full-screen templates sit at `(0, 0)`.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    threshold: f64,
    image: Arc<Bitmap>,
    origin: Point,
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Template {}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Template {
    pub fn new(name: impl Into<String>, threshold: f64, image: Bitmap) -> Self {
        Self {
            name: name.into(),
            threshold,
            image: Arc::new(image),
            origin: Point::default(),
        }
    }

    pub fn with_origin(self, origin: Point) -> Self {
        Self { origin, ..self }
    }

    pub fn from_png_bytes(name: impl Into<String>, threshold: f64, bytes: &[u8]) -> TemplateResult<Self> {
        let name = name.into();
        match Bitmap::decode(bytes) {
            Some(image) => Ok(Self::new(name, threshold, image)),
            None => Err(TemplateError::InvalidImage { name }),
        }
    }

    /// Load an image file as a template named after its file stem.
    ///
    /// A `[x,y,w,h]` region in the file name crops the template out of a
    /// full screenshot, e.g. `ok_button[420,1800,240,96].png`.
    pub fn open(path: impl AsRef<Path>, threshold: f64) -> TemplateResult<Self> {
        let path = path.as_ref();
        let image = Bitmap::open(path).map_err(|source| TemplateError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        match region_from_name(&name) {
            Some((x, y, width, height)) => {
                let region = Rect::new(x as i32, y as i32, width as i32, height as i32);
                let cropped = image.crop(region).ok_or(TemplateError::CropOutOfBounds {
                    x,
                    y,
                    width,
                    height,
                    image_width: image.width(),
                    image_height: image.height(),
                })?;
                Ok(Self::new(name, threshold, cropped).with_origin(region.origin))
            }
            None => Ok(Self::new(name, threshold, image)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn image(&self) -> &Bitmap {
        &self.image
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn with_threshold(&self, threshold: f64) -> Self {
        Self {
            threshold,
            ..self.clone()
        }
    }
}

/// Region coordinates `[x,y,w,h]` embedded in a template file name
fn region_from_name(name: &str) -> Option<(u32, u32, u32, u32)> {
    if let Some(start) = name.find('[')
        && let Some(end) = name.find(']')
        && end > start
    {
        let parts: Vec<&str> = name[start + 1..end].split(',').collect();
        if parts.len() == 4
            && let (Ok(x), Ok(y), Ok(width), Ok(height)) = (
                parts[0].trim().parse::<u32>(),
                parts[1].trim().parse::<u32>(),
                parts[2].trim().parse::<u32>(),
                parts[3].trim().parse::<u32>(),
            )
        {
            return Some((x, y, width, height));
        }
    }
    None
}

/// Templates loaded from a directory of PNG assets
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: Vec<Template>,
}

impl TemplateLibrary {
    /// Load every `*.png` in `dir` with the configured default threshold.
    /// Files that fail to load are skipped with a warning.
    pub fn load_dir(dir: impl AsRef<Path>, config: &MatchConfig) -> TemplateResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(TemplateError::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }
        let entries = std::fs::read_dir(dir).map_err(|source| TemplateError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut templates = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("png") {
                continue;
            }
            match Template::open(&path, config.default_threshold) {
                Ok(template) => {
                    log::debug!("Loaded template {} from {}", template, path.display());
                    templates.push(template);
                }
                Err(e) => log::warn!("Skipping template {}: {e}", path.display()),
            }
        }
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        log::info!("Loaded {} templates from {}", templates.len(), dir.display());
        Ok(Self { templates })
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
