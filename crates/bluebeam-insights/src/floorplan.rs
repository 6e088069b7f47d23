use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;

use crate::error::InsightsError;

/// Background raster for the density map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Floorplan {
    width: u32,
    height: u32,
    mime: &'static str,
    bytes: Vec<u8>,
}

impl Floorplan {
    /// Decodes a PNG or JPEG upload and keeps its bytes for embedding.
    pub fn decode(bytes: Vec<u8>) -> Result<Self, InsightsError> {
        let format = image::guess_format(&bytes)?;
        let mime = match format {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            other => {
                return Err(InsightsError::UnsupportedFloorplan(format!(
                    "{other:?}; expected PNG or JPEG"
                )));
            }
        };

        let image = image::load_from_memory_with_format(&bytes, format)?;
        Ok(Self {
            width: image.width(),
            height: image.height(),
            mime,
            bytes,
        })
    }

    pub fn open(path: &Path) -> Result<Self, InsightsError> {
        Self::decode(std::fs::read(path)?)
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn mime(&self) -> &'static str {
        self.mime
    }

    #[must_use]
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

#[cfg(test)]
pub(crate) fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::RgbaImage::new(width, height)
        .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("PNG fixture should encode");
    bytes
}

#[cfg(test)]
mod tests {
    use super::{Floorplan, png_fixture};
    use crate::error::InsightsError;

    #[test]
    fn decodes_png_dimensions() {
        let floorplan = Floorplan::decode(png_fixture(64, 48)).expect("PNG should decode");
        assert_eq!((floorplan.width(), floorplan.height()), (64, 48));
        assert_eq!(floorplan.mime(), "image/png");
        assert!(floorplan.data_uri().starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn rejects_non_images() {
        let err = Floorplan::decode(b"%PDF-1.7 not an image".to_vec()).expect_err("should fail");
        assert!(matches!(err, InsightsError::Image(_)));
    }
}
