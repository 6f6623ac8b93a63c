//! Image file loading and saving.

use std::io::{BufWriter, Write};
use std::path::Path;

use common::Buffer2;
use image::{ImageFormat, RgbImage};

use crate::error::{Error, Result};
use crate::Image;

/// Output formats that store 8-bit RGB without loss.
pub const LOSSLESS_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Pnm,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
];

/// Extension of files written when no output name is given.
pub const RESULT_EXTENSION: &str = "ppm";

/// `"{name}.ppm"`, or `"result.ppm"` without a name.
pub fn result_file_name(name: Option<&str>) -> String {
    format!("{}.{}", name.unwrap_or("result"), RESULT_EXTENSION)
}

/// Decodes any supported raster file into 8-bit RGB.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Image> {
    let path = path.as_ref();
    let decoded = image::open(path)
        .map_err(|source| Error::Image {
            path: path.to_path_buf(),
            source,
        })?
        .into_rgb8();

    let (width, height) = decoded.dimensions();
    let pixels = decoded.pixels().map(|p| p.0).collect();

    Ok(Buffer2::new(width as usize, height as usize, pixels))
}

/// Encodes `image` in the lossless format implied by the file extension.
///
/// The file is encoded next to `path` and renamed into place, so a failed
/// save never leaves a partial file at `path`.
pub fn save_image<P: AsRef<Path>>(image: &Image, path: P) -> Result<()> {
    let path = path.as_ref();
    let unsupported = |reason: String| Error::UnsupportedFormat {
        path: path.to_path_buf(),
        reason,
    };
    let io_failure = |source: std::io::Error| Error::Io {
        path: path.to_path_buf(),
        source,
    };

    let format = ImageFormat::from_path(path).map_err(|e| unsupported(e.to_string()))?;
    if !LOSSLESS_FORMATS.contains(&format) {
        return Err(unsupported(format!("{:?} is not lossless", format)));
    }

    let width = u32::try_from(image.width()).map_err(|_| unsupported("image too wide".into()))?;
    let height =
        u32::try_from(image.height()).map_err(|_| unsupported("image too tall".into()))?;
    let bytes: Vec<u8> = image.iter().flatten().copied().collect();
    let buffer = RgbImage::from_raw(width, height, bytes)
        .ok_or_else(|| unsupported("pixel buffer does not match dimensions".into()))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = tempfile::Builder::new()
        .prefix(".haloconv-")
        .tempfile_in(dir)
        .map_err(io_failure)?;

    let mut writer = BufWriter::new(staged.as_file_mut());
    buffer
        .write_to(&mut writer, format)
        .map_err(|source| Error::Image {
            path: path.to_path_buf(),
            source,
        })?;
    writer.flush().map_err(io_failure)?;
    drop(writer);

    // Dropping `staged` on any earlier return deletes the temporary file.
    staged.persist(path).map_err(|e| io_failure(e.error))?;
    Ok(())
}
