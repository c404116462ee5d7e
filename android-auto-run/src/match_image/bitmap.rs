//! Decoded pixel grids used for matching.

use crate::geometry::Rect;
use image::codecs::png::PngEncoder;
use image::{
    DynamicImage, ExtendedColorType, GrayImage, ImageEncoder, ImageResult, RgbImage, RgbaImage,
};
use std::fmt;
use std::path::Path;

/// An immutable 8-bit pixel grid with 1 (gray), 3 (RGB) or 4 (RGBA) interleaved channels.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

impl Bitmap {
    /// Wrap raw interleaved pixels. Returns `None` for unsupported channel
    /// counts or when `data` does not hold exactly `width * height * channels` bytes.
    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Option<Self> {
        if !matches!(channels, 1 | 3 | 4) {
            return None;
        }
        let expected = width as usize * height as usize * channels as usize;
        (data.len() == expected).then_some(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Decode PNG/JPEG bytes. Empty or undecodable input yields `None`.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        match image::load_from_memory(bytes) {
            Ok(img) => Some(Self::from_dynamic(img)),
            Err(e) => {
                log::warn!("Failed to decode {} byte image: {e}", bytes.len());
                None
            }
        }
    }

    pub fn open(path: impl AsRef<Path>) -> ImageResult<Self> {
        Ok(Self::from_dynamic(image::open(path)?))
    }

    pub fn from_dynamic(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        let (channels, data) = match img {
            DynamicImage::ImageLuma8(gray) => (1, gray.into_raw()),
            DynamicImage::ImageRgb8(rgb) => (3, rgb.into_raw()),
            DynamicImage::ImageRgba8(rgba) => (4, rgba.into_raw()),
            other if other.color().has_alpha() => (4, other.to_rgba8().into_raw()),
            other if other.color().channel_count() == 1 => (1, other.to_luma8().into_raw()),
            other => (3, other.to_rgb8().into_raw()),
        };
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    pub fn encode_png(&self) -> ImageResult<Vec<u8>> {
        let color = match self.channels {
            1 => ExtendedColorType::L8,
            3 => ExtendedColorType::Rgb8,
            _ => ExtendedColorType::Rgba8,
        };
        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(&self.data, self.width, self.height, color)?;
        Ok(png)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    /// Zero-area images carry nothing to match.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let c = self.channels as usize;
        let start = (y as usize * self.width as usize + x as usize) * c;
        &self.data[start..start + c]
    }

    /// The alpha channel as a per-pixel mask, if the image has one.
    pub fn alpha_mask(&self) -> Option<Vec<u8>> {
        self.has_alpha()
            .then(|| self.data.chunks_exact(4).map(|px| px[3]).collect())
    }

    /// Copy out a sub-rectangle. `None` when the rectangle leaves the image.
    pub fn crop(&self, rect: Rect) -> Option<Bitmap> {
        let Rect { origin, size } = rect;
        if origin.x < 0 || origin.y < 0 || size.width < 0 || size.height < 0 {
            return None;
        }
        let (x, y) = (origin.x as u32, origin.y as u32);
        let (w, h) = (size.width as u32, size.height as u32);
        if x + w > self.width || y + h > self.height {
            return None;
        }
        let c = self.channels as usize;
        let mut data = Vec::with_capacity(w as usize * h as usize * c);
        for row in y..y + h {
            let start = (row as usize * self.width as usize + x as usize) * c;
            data.extend_from_slice(&self.data[start..start + w as usize * c]);
        }
        Some(Bitmap {
            width: w,
            height: h,
            channels: self.channels,
            data,
        })
    }

    /// The pixels as an `image` buffer of the matching colour type.
    pub fn to_dynamic(&self) -> Option<DynamicImage> {
        let (w, h, data) = (self.width, self.height, self.data.clone());
        match self.channels {
            1 => GrayImage::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
            3 => RgbImage::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
            _ => RgbaImage::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
        }
    }

    /// Rec. 709 luma, alpha ignored.
    pub fn to_luma(&self) -> GrayImage {
        self.to_dynamic()
            .map_or_else(|| GrayImage::new(self.width, self.height), |img| img.to_luma8())
    }

    /// Single-channel Canny edge map of the Gaussian-blurred luma.
    pub fn edges(&self, blur_sigma: f32, low_threshold: f32, high_threshold: f32) -> Bitmap {
        let gray = self.to_luma();
        let blurred = if blur_sigma > 0.0 {
            imageproc::filter::gaussian_blur_f32(&gray, blur_sigma)
        } else {
            gray
        };
        let edges = imageproc::edges::canny(&blurred, low_threshold, high_threshold);
        Bitmap {
            width: self.width,
            height: self.height,
            channels: 1,
            data: edges.into_raw(),
        }
    }
}
