//! Raw PNG/JPEG dimension sniffing, independent of any imaging crate.
//!
//! Mirrors the byte-level layout both formats guarantee: a PNG IHDR chunk
//! always sits at a fixed offset, and a JPEG SOF marker always precedes its
//! height/width pair. Malformed input never panics or propagates — it is
//! worth a `warn!` and a `(0, 0)`, nothing more.

use tracing::warn;

use crate::model::ImageType;

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub fn parse(data: &[u8], image_type: ImageType) -> (u32, u32) {
    let dims = match image_type {
        ImageType::Png => png_dimensions(data),
        ImageType::Jpeg => jpeg_dimensions(data),
    };
    if dims == (0, 0) {
        warn!("could not determine image dimensions from {} bytes", data.len());
    }
    dims
}

fn png_dimensions(data: &[u8]) -> (u32, u32) {
    if data.len() < 24 || data[0..8] != PNG_SIGNATURE {
        return (0, 0);
    }
    let width = u32::from_be_bytes(data[16..20].try_into().unwrap());
    let height = u32::from_be_bytes(data[20..24].try_into().unwrap());
    (width, height)
}

fn jpeg_dimensions(data: &[u8]) -> (u32, u32) {
    if data.len() < 4 || data[0..2] != [0xFF, 0xD8] {
        return (0, 0);
    }

    let mut pos = 2;
    while pos + 4 <= data.len() {
        let marker = u16::from_be_bytes([data[pos], data[pos + 1]]);
        let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;

        if matches!(marker, 0xFFC0 | 0xFFC1 | 0xFFC2) {
            let sof_start = pos + 4;
            if sof_start + 5 > data.len() {
                break;
            }
            // one precision byte, then height, then width (JPEG order)
            let height = u16::from_be_bytes([data[sof_start + 1], data[sof_start + 2]]);
            let width = u16::from_be_bytes([data[sof_start + 3], data[sof_start + 4]]);
            return (width as u32, height as u32);
        }

        if length < 2 {
            break;
        }
        pos += 2 + length;
    }

    (0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_png(width: u32, height: u32) -> Vec<u8> {
        let mut buf = PNG_SIGNATURE.to_vec();
        buf.extend_from_slice(&13u32.to_be_bytes()); // IHDR length
        buf.extend_from_slice(b"IHDR");
        buf.extend_from_slice(&width.to_be_bytes());
        buf.extend_from_slice(&height.to_be_bytes());
        buf.extend_from_slice(&[0u8; 5]); // bit depth, color type, compression, filter, interlace
        buf
    }

    #[test]
    fn parses_well_formed_png() {
        let data = make_png(800, 600);
        assert_eq!(parse(&data, ImageType::Png), (800, 600));
    }

    #[test]
    fn rejects_bad_png_signature() {
        let mut data = make_png(800, 600);
        data[0] = 0x00;
        assert_eq!(parse(&data, ImageType::Png), (0, 0));
    }

    #[test]
    fn rejects_truncated_png() {
        assert_eq!(parse(&[0x89, 0x50, 0x4E], ImageType::Png), (0, 0));
    }

    #[test]
    fn parses_well_formed_jpeg() {
        let mut data = vec![0xFF, 0xD8]; // SOI
        // a harmless APP0 segment before SOF0
        data.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x04, 0x4A, 0x46]);
        // SOF0: length=17 (2 len + 1 precision + 2 height + 2 width + 1 ncomp*3)
        data.extend_from_slice(&[0xFF, 0xC0]);
        data.extend_from_slice(&17u16.to_be_bytes());
        data.push(8); // precision
        data.extend_from_slice(&480u16.to_be_bytes()); // height
        data.extend_from_slice(&640u16.to_be_bytes()); // width
        data.extend_from_slice(&[0u8; 9]);
        assert_eq!(parse(&data, ImageType::Jpeg), (640, 480));
    }

    #[test]
    fn rejects_garbage_jpeg() {
        assert_eq!(parse(&[0x00, 0x01, 0x02, 0x03], ImageType::Jpeg), (0, 0));
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(parse(&[], ImageType::Png), (0, 0));
        assert_eq!(parse(&[], ImageType::Jpeg), (0, 0));
    }
}
