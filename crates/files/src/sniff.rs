//! Content sniffing by byte signature.
//!
//! The declared MIME type of an upload is client-controlled, so the pipeline decides what a
//! file is from its leading bytes. Detection walks a fixed signature table in order; the
//! first match wins. Two formats without a fixed magic number (WBMP and XBM) are recognised
//! structurally after the table has been exhausted.

use crate::constants::SNIFF_LEN;
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

/// Image formats the sniffer can recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    Gif,
    Jpeg,
    Png,
    Swf,
    Psd,
    Bmp,
    Tiff,
    Jpc,
    Jp2,
    Jpx,
    Jb2,
    Swc,
    Iff,
    Wbmp,
    Xbm,
    Ico,
}

impl ImageType {
    /// Every recognised type, in signature-table order.
    pub const ALL: [ImageType; 16] = [
        Self::Gif,
        Self::Jpeg,
        Self::Png,
        Self::Swf,
        Self::Psd,
        Self::Bmp,
        Self::Tiff,
        Self::Jpc,
        Self::Jp2,
        Self::Jpx,
        Self::Jb2,
        Self::Swc,
        Self::Iff,
        Self::Wbmp,
        Self::Xbm,
        Self::Ico,
    ];

    /// Canonical short name, also used as the stored file's extension.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Swf => "swf",
            Self::Psd => "psd",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Jpc => "jpc",
            Self::Jp2 => "jp2",
            Self::Jpx => "jpx",
            Self::Jb2 => "jb2",
            Self::Swc => "swc",
            Self::Iff => "iff",
            Self::Wbmp => "wbmp",
            Self::Xbm => "xbm",
            Self::Ico => "ico",
        }
    }

    /// MIME type conventionally served for this format.
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Gif => "image/gif",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Swf | Self::Swc => "application/x-shockwave-flash",
            Self::Psd => "image/psd",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::Jpc => "application/octet-stream",
            Self::Jp2 => "image/jp2",
            Self::Jpx => "image/jpx",
            Self::Jb2 => "image/jb2",
            Self::Iff => "image/iff",
            Self::Wbmp => "image/vnd.wap.wbmp",
            Self::Xbm => "image/xbm",
            Self::Ico => "image/vnd.microsoft.icon",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown image type: '{0}'")]
pub struct UnknownImageType(pub String);

impl FromStr for ImageType {
    type Err = UnknownImageType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownImageType(s.to_owned()))
    }
}

impl serde::Serialize for ImageType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// A fixed byte sequence at the start of a file.
struct Signature {
    image_type: ImageType,
    magic: &'static [u8],
}

const JP2_SIGNATURE: &[u8] = &[
    0x00, 0x00, 0x00, 0x0c, b'j', b'P', b' ', b' ', 0x0d, 0x0a, 0x87, 0x0a,
];

/// Offset of the brand field in the `ftyp` box that follows the JP2 signature box.
const JP2_BRAND_OFFSET: usize = 20;

static SIGNATURES: &[Signature] = &[
    Signature {
        image_type: ImageType::Gif,
        magic: b"GIF",
    },
    Signature {
        image_type: ImageType::Jpeg,
        magic: &[0xff, 0xd8, 0xff],
    },
    Signature {
        image_type: ImageType::Png,
        magic: &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a],
    },
    Signature {
        image_type: ImageType::Swf,
        magic: b"FWS",
    },
    Signature {
        image_type: ImageType::Swc,
        magic: b"CWS",
    },
    Signature {
        image_type: ImageType::Psd,
        magic: b"8BPS",
    },
    Signature {
        image_type: ImageType::Bmp,
        magic: b"BM",
    },
    Signature {
        image_type: ImageType::Jpc,
        magic: &[0xff, 0x4f, 0xff],
    },
    Signature {
        image_type: ImageType::Iff,
        magic: b"FORM",
    },
    Signature {
        image_type: ImageType::Tiff,
        magic: b"II\x2a\x00",
    },
    Signature {
        image_type: ImageType::Tiff,
        magic: b"MM\x00\x2a",
    },
    Signature {
        image_type: ImageType::Ico,
        magic: &[0x00, 0x00, 0x01, 0x00],
    },
    Signature {
        image_type: ImageType::Jb2,
        magic: &[0x97, b'J', b'B', b'2', 0x0d, 0x0a, 0x1a, 0x0a],
    },
];

/// Identifies the image type of `bytes`, which should hold the start of a file.
///
/// Returns `None` when no signature matches.
pub fn sniff_bytes(bytes: &[u8]) -> Option<ImageType> {
    if let Some(sig) = SIGNATURES.iter().find(|sig| bytes.starts_with(sig.magic)) {
        return Some(sig.image_type);
    }

    if bytes.starts_with(JP2_SIGNATURE) {
        let brand = bytes.get(JP2_BRAND_OFFSET..JP2_BRAND_OFFSET + 4);
        return Some(if brand == Some(b"jpx ".as_slice()) {
            ImageType::Jpx
        } else {
            ImageType::Jp2
        });
    }

    if is_wbmp(bytes) {
        return Some(ImageType::Wbmp);
    }

    if is_xbm(bytes) {
        return Some(ImageType::Xbm);
    }

    None
}

/// Reads the first [`SNIFF_LEN`] bytes of the file at `path` and identifies its type.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be opened or read.
pub fn sniff_path(path: &Path) -> io::Result<Option<ImageType>> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    fs::File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    Ok(sniff_bytes(&head))
}

/// Largest width or height accepted for a WBMP header.
const WBMP_MAX_DIMENSION: u32 = 2048;

/// WBMP type 0: a zero type field, a header of continuation bytes, then non-zero width and
/// height as multi-byte integers.
fn is_wbmp(bytes: &[u8]) -> bool {
    let mut iter = bytes.iter().copied();

    if iter.next() != Some(0) {
        return false;
    }

    // fixed header: skip until a byte without the continuation bit
    loop {
        match iter.next() {
            Some(b) if b & 0x80 != 0 => continue,
            Some(_) => break,
            None => return false,
        }
    }

    let mut read_dimension = || -> Option<u32> {
        let mut value: u32 = 0;
        loop {
            let b = iter.next()?;
            value = (value << 7) | u32::from(b & 0x7f);
            if value > WBMP_MAX_DIMENSION {
                return None;
            }
            if b & 0x80 == 0 {
                return Some(value);
            }
        }
    };

    match (read_dimension(), read_dimension()) {
        (Some(width), Some(height)) => width > 0 && height > 0,
        _ => false,
    }
}

/// XBM is C source: `#define <name>_width <n>` and `#define <name>_height <n>`.
fn is_xbm(bytes: &[u8]) -> bool {
    let text = String::from_utf8_lossy(bytes);
    let mut width = false;
    let mut height = false;

    for line in text.lines() {
        let mut parts = line.split_whitespace();
        if parts.next() != Some("#define") {
            continue;
        }
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let positive = value.parse::<u32>().is_ok_and(|v| v > 0);
        if key.ends_with("_width") && positive {
            width = true;
        } else if key.ends_with("_height") && positive {
            height = true;
        }
        if width && height {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn padded(magic: &[u8]) -> Vec<u8> {
        let mut bytes = magic.to_vec();
        bytes.resize(32, 0);
        bytes
    }

    #[test]
    fn test_sniff_fixed_signatures() {
        let cases: Vec<(&[u8], ImageType)> = vec![
            (&b"GIF89a"[..], ImageType::Gif),
            (&[0xff, 0xd8, 0xff, 0xe0][..], ImageType::Jpeg),
            (
                &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a][..],
                ImageType::Png,
            ),
            (&b"FWS\x09"[..], ImageType::Swf),
            (&b"CWS\x09"[..], ImageType::Swc),
            (&b"8BPS\x00\x01"[..], ImageType::Psd),
            (&b"BM\x36\x00"[..], ImageType::Bmp),
            (&[0xff, 0x4f, 0xff, 0x51][..], ImageType::Jpc),
            (&b"FORM\x00\x00\x00\x10ILBM"[..], ImageType::Iff),
            (&b"II\x2a\x00\x08\x00"[..], ImageType::Tiff),
            (&b"MM\x00\x2a\x00\x00"[..], ImageType::Tiff),
            (&[0x00, 0x00, 0x01, 0x00, 0x01, 0x00][..], ImageType::Ico),
            (
                &[0x97, b'J', b'B', b'2', 0x0d, 0x0a, 0x1a, 0x0a][..],
                ImageType::Jb2,
            ),
        ];

        for (magic, expected) in cases {
            assert_eq!(sniff_bytes(&padded(magic)), Some(expected), "{}", expected);
        }
    }

    #[test]
    fn test_sniff_jp2_and_jpx_by_brand() {
        let mut jp2 = JP2_SIGNATURE.to_vec();
        jp2.extend_from_slice(&[0x00, 0x00, 0x00, 0x14]);
        jp2.extend_from_slice(b"ftypjp2 ");
        assert_eq!(sniff_bytes(&jp2), Some(ImageType::Jp2));

        let mut jpx = JP2_SIGNATURE.to_vec();
        jpx.extend_from_slice(&[0x00, 0x00, 0x00, 0x14]);
        jpx.extend_from_slice(b"ftypjpx ");
        assert_eq!(sniff_bytes(&jpx), Some(ImageType::Jpx));

        // signature box alone, no brand to read
        assert_eq!(sniff_bytes(JP2_SIGNATURE), Some(ImageType::Jp2));
    }

    #[test]
    fn test_sniff_wbmp() {
        // type 0, header 0, width 16, height 8, then pixel data
        let wbmp = [0x00, 0x00, 0x10, 0x08, 0xff, 0xff];
        assert_eq!(sniff_bytes(&wbmp), Some(ImageType::Wbmp));

        // multi-byte width: 0x81 0x00 = 128
        let wide = [0x00, 0x00, 0x81, 0x00, 0x08];
        assert_eq!(sniff_bytes(&wide), Some(ImageType::Wbmp));
    }

    #[test]
    fn test_wbmp_rejects_zero_or_oversized_dimensions() {
        assert!(!is_wbmp(&[0x00, 0x00, 0x00, 0x08]));
        assert!(!is_wbmp(&[0x00, 0x00, 0x10, 0x00]));
        // 0x90 0x81 = (16 << 7) | 1 = 2049
        assert!(!is_wbmp(&[0x00, 0x00, 0x90, 0x81, 0x00, 0x08]));
        // truncated
        assert!(!is_wbmp(&[0x00, 0x00, 0x10]));
        assert!(!is_wbmp(&[]));
    }

    #[test]
    fn test_sniff_xbm() {
        let xbm = b"#define test_width 16\n#define test_height 7\nstatic char test_bits[] = {\n";
        assert_eq!(sniff_bytes(xbm), Some(ImageType::Xbm));
    }

    #[test]
    fn test_xbm_needs_both_dimensions() {
        assert!(!is_xbm(b"#define test_width 16\n"));
        assert!(!is_xbm(b"#define test_width 0\n#define test_height 7\n"));
    }

    #[test]
    fn test_sniff_unrecognized() {
        assert_eq!(sniff_bytes(b"hello world"), None);
        assert_eq!(sniff_bytes(b"<?xml version=\"1.0\"?><svg/>"), None);
        assert_eq!(sniff_bytes(b"RIFF\x24\x00\x00\x00WEBPVP8 "), None);
        assert_eq!(sniff_bytes(&[]), None);
    }

    #[test]
    fn test_sniff_path_reads_file_head() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("upload.tmp");
        let mut bytes = vec![0xff, 0xd8, 0xff, 0xe1];
        bytes.resize(SNIFF_LEN * 3, 0xab);
        fs::write(&path, &bytes).unwrap();

        assert_eq!(sniff_path(&path).unwrap(), Some(ImageType::Jpeg));
    }

    #[test]
    fn test_sniff_path_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = sniff_path(&temp.path().join("missing"));

        assert!(result.is_err());
    }

    #[test]
    fn test_agrees_with_infer_for_common_formats() {
        let cases: Vec<(&[u8], ImageType)> = vec![
            (&[0xff, 0xd8, 0xff, 0xe0][..], ImageType::Jpeg),
            (
                &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a][..],
                ImageType::Png,
            ),
            (&b"GIF89a"[..], ImageType::Gif),
            (&b"BM\x36\x00"[..], ImageType::Bmp),
            (&b"II\x2a\x00\x08\x00"[..], ImageType::Tiff),
            (&[0x00, 0x00, 0x01, 0x00, 0x01, 0x00][..], ImageType::Ico),
        ];

        for (magic, expected) in cases {
            let bytes = padded(magic);
            let kind = infer::get(&bytes).expect("infer recognises the sample");
            let infer_name = match kind.extension() {
                "jpg" => "jpeg",
                "tif" => "tiff",
                other => other,
            };

            assert_eq!(infer_name, expected.as_str());
            assert_eq!(sniff_bytes(&bytes), Some(expected));
        }
    }

    #[test]
    fn test_image_type_parse() {
        assert_eq!("jpeg".parse::<ImageType>(), Ok(ImageType::Jpeg));
        assert_eq!("PNG".parse::<ImageType>(), Ok(ImageType::Png));
        assert_eq!(
            "jpg".parse::<ImageType>(),
            Err(UnknownImageType("jpg".into()))
        );
    }

    #[test]
    fn test_image_type_names_are_unique() {
        let mut names: Vec<&str> = ImageType::ALL.iter().map(|t| t.as_str()).collect();
        names.sort_unstable();
        names.dedup();

        assert_eq!(names.len(), ImageType::ALL.len());
    }
}
