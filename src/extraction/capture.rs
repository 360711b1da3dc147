use std::collections::BTreeMap;
use std::io::Cursor;

use tracing::debug;

/// Flatten embedded EXIF into `tag name -> displayed value`.
///
/// Missing or unparseable metadata is normal and yields an empty map. When a
/// tag appears in more than one IFD the first occurrence wins.
#[must_use]
pub fn read_capture_metadata(bytes: &[u8]) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();

    let exif = match ::exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            debug!("No capture metadata: {e}");
            return tags;
        }
    };

    for field in exif.fields() {
        tags.entry(field.tag.to_string())
            .or_insert_with(|| field.display_value().with_unit(&exif).to_string());
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_image_bytes_yield_empty_map() {
        assert!(read_capture_metadata(b"plain text").is_empty());
        assert!(read_capture_metadata(&[]).is_empty());
    }

    #[test]
    fn test_png_without_exif_yields_empty_map() {
        let mut bytes = Vec::new();
        image::RgbImage::new(4, 4)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        assert!(read_capture_metadata(&bytes).is_empty());
    }
}
