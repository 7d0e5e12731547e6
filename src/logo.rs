//! Logo Module
//!
//! Loads a caller-supplied logo, bounds it to [`LOGO_MAX`] points on one
//! dimension while keeping its aspect ratio, and re-encodes it as JPEG for
//! embedding.

use crate::error::ReportError;
use image::imageops::FilterType;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use log::debug;
use std::io::Cursor;
use std::path::Path;

/// Cap on the anchored dimension, in points.
pub const LOGO_MAX: f32 = 150.0;

const JPEG_QUALITY: u8 = 90;

/// Which dimension is capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoAnchor {
    /// Inline logo of the failure list: width is capped, height follows.
    Width,
    /// Header logo of the compliance table: height is capped, width follows.
    Height,
}

/// A scaled logo ready to be placed on a page.
#[derive(Debug, Clone)]
pub struct LogoSpec {
    /// JPEG bytes of the resampled raster.
    pub jpeg: Vec<u8>,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Drawn size in points. Not rounded.
    pub width: f32,
    pub height: f32,
}

impl LogoSpec {
    /// Drawn size shrunk proportionally until it fits `max_width` x
    /// `max_height`. Never enlarges.
    pub fn fitted(&self, max_width: f32, max_height: f32) -> (f32, f32) {
        let scale = (max_width / self.width)
            .min(max_height / self.height)
            .min(1.0)
            .max(0.0);
        (self.width * scale, self.height * scale)
    }
}

/// Computes the drawn size for a `width` x `height` source.
pub fn target_size(width: u32, height: u32, anchor: LogoAnchor) -> (f32, f32) {
    let (w, h) = (width as f32, height as f32);
    match anchor {
        LogoAnchor::Width => {
            let aspect_ratio = w / h;
            let target_width = LOGO_MAX.min(w);
            (target_width, target_width / aspect_ratio)
        }
        LogoAnchor::Height => {
            let target_height = LOGO_MAX.min(h);
            (w * target_height / h, target_height)
        }
    }
}

/// Opens `path` and scales it for `anchor`.
pub fn load_logo(path: &Path, anchor: LogoAnchor) -> Result<LogoSpec, ReportError> {
    let img = image::open(path).map_err(|source| ReportError::Logo {
        path: path.to_path_buf(),
        source,
    })?;
    scale_logo(&img, anchor).map_err(|e| match e {
        ScaleError::Empty => ReportError::EmptyLogo {
            path: path.to_path_buf(),
        },
        ScaleError::Encode(source) => ReportError::Logo {
            path: path.to_path_buf(),
            source,
        },
    })
}

#[derive(Debug)]
pub enum ScaleError {
    Empty,
    Encode(image::ImageError),
}

/// Resamples an already decoded image.
pub fn scale_logo(img: &DynamicImage, anchor: LogoAnchor) -> Result<LogoSpec, ScaleError> {
    let (src_w, src_h) = (img.width(), img.height());
    if src_w == 0 || src_h == 0 {
        return Err(ScaleError::Empty);
    }

    let (width, height) = target_size(src_w, src_h, anchor);
    let pixel_width = (width.round() as u32).max(1);
    let pixel_height = (height.round() as u32).max(1);

    let resized = img.resize_exact(pixel_width, pixel_height, FilterType::Lanczos3);
    let flattened = flatten_on_white(&resized);

    let mut jpeg = Vec::new();
    flattened
        .write_to(&mut Cursor::new(&mut jpeg), ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .map_err(ScaleError::Encode)?;

    debug!(
        "Scaled logo {}x{} -> {}x{} pt ({:?} anchored)",
        src_w, src_h, width, height, anchor
    );

    Ok(LogoSpec {
        jpeg,
        pixel_width,
        pixel_height,
        width,
        height,
    })
}

/// JPEG has no alpha channel, so transparent areas are blended onto white.
fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let p = rgba.get_pixel(x, y).0;
        let alpha = p[3] as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        Rgb([blend(p[0]), blend(p[1]), blend(p[2])])
    })
}
