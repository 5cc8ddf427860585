use anyhow::{anyhow, Context, Result};
use image::RgbImage;

/// Extension allow-list check on the upload name. The suffix after the last
/// `.` is compared case-insensitively; content is not sniffed here.
pub fn is_allowed_file(name: &str, allowed: &[String]) -> bool {
    match name.rsplit_once('.') {
        Some((_, ext)) => allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Decodes an uploaded byte stream into an 8-bit RGB bitmap.
pub fn decode_rgb(bytes: &[u8], max_bytes: u64) -> Result<RgbImage> {
    if bytes.is_empty() {
        return Err(anyhow!("empty upload"));
    }
    if max_bytes > 0 && bytes.len() as u64 > max_bytes {
        return Err(anyhow!(
            "upload exceeds max_file_bytes ({} > {})",
            bytes.len(),
            max_bytes
        ));
    }
    let img = image::load_from_memory(bytes).with_context(|| "decoding image")?;
    Ok(img.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn exts() -> Vec<String> {
        vec!["jpg".into(), "jpeg".into(), "png".into(), "webp".into()]
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(is_allowed_file("front.JPG", &exts()));
        assert!(is_allowed_file("a.b.webp", &exts()));
        assert!(!is_allowed_file("scan.gif", &exts()));
        assert!(!is_allowed_file("png", &exts()));
    }

    #[test]
    fn decodes_png_to_rgb() {
        let src = image::RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(src)
            .write_to(&mut buf, image::ImageOutputFormat::Png)
            .unwrap();
        let rgb = decode_rgb(buf.get_ref(), 0).unwrap();
        assert_eq!(rgb.dimensions(), (4, 3));
        assert_eq!(rgb.get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn rejects_garbage_and_oversize() {
        assert!(decode_rgb(b"not an image", 0).is_err());
        assert!(decode_rgb(&[], 0).is_err());
        assert!(decode_rgb(&[0u8; 32], 16).is_err());
    }
}
