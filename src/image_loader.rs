use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use image::{DynamicImage, ImageFormat};
use url::Url;

use crate::error::{LightboxError, Result};
use crate::models::Bitmap;

/// Local path behind a `file://` URL.
pub fn path_for_url(url: &Url) -> Result<PathBuf> {
    if url.scheme() != "file" {
        return Err(LightboxError::UnsupportedScheme(url.scheme().to_string()));
    }
    url.to_file_path()
        .map_err(|()| LightboxError::UnsupportedScheme(url.to_string()))
}

/// Decode an image file. Animated GIFs yield their first frame.
pub fn open_image(path: &Path) -> Result<DynamicImage> {
    let bytes = std::fs::read(path).map_err(|source| LightboxError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_bytes(path, bytes)
}

pub fn load_bitmap(path: &Path) -> Result<Bitmap> {
    open_image(path).map(Bitmap::from_dynamic)
}

fn decode_bytes(path: &Path, bytes: Vec<u8>) -> Result<DynamicImage> {
    let decode_err = |source| LightboxError::Decode {
        path: path.to_path_buf(),
        source,
    };
    let format = image::guess_format(&bytes).ok();

    if format == Some(ImageFormat::Gif) {
        let decoder = GifDecoder::new(Cursor::new(bytes)).map_err(decode_err)?;
        let mut frames = decoder.into_frames();
        return match frames.next() {
            Some(frame) => {
                let frame = frame.map_err(decode_err)?;
                Ok(DynamicImage::ImageRgba8(frame.into_buffer()))
            }
            None => Err(LightboxError::EmptyAnimation(path.to_path_buf())),
        };
    }

    match format {
        Some(fmt) => image::load_from_memory_with_format(&bytes, fmt),
        None => image::load_from_memory(&bytes),
    }
    .map_err(decode_err)
}
