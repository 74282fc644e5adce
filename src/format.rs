//! Container format identification and the static codec table.

use std::fmt;

use crate::capability::Version;
use crate::codecs::table;
use crate::decode::DecodeContext;
use crate::encode::EncodeContext;
use crate::error::SurfaceError;
use crate::surface::PixelBuffer;

pub(crate) type DecodeFn = fn(&[u8], &DecodeContext<'_>) -> Result<PixelBuffer, SurfaceError>;
pub(crate) type EncodeFn = fn(&PixelBuffer, &EncodeContext<'_>) -> Result<Vec<u8>, SurfaceError>;

/// Image container formats known to this crate.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Bmp,
    Png,
    Jpeg,
    Gif,
    Tga,
    Qoi,
    Pnm,
    Svg,
}

/// One row of the codec table.
pub(crate) struct CodecEntry {
    pub format: ImageFormat,
    pub extensions: &'static [&'static str],
    /// `None` for formats without a leading signature.
    pub sniff: Option<fn(&[u8]) -> bool>,
    pub decode: Option<DecodeFn>,
    /// Decodable by `load_basic` without the extended capability.
    pub basic_decode: bool,
    pub decode_min: Version,
    pub encode: Option<EncodeFn>,
    /// Accepted by `save` without the extended capability.
    pub basic_encode: bool,
    /// Accepted by `save_extended`.
    pub extended_encode: bool,
    pub encode_min: Version,
}

const V0_1: Version = Version::new(0, 1, 0);

static CODECS: [CodecEntry; 8] = [
    CodecEntry {
        format: ImageFormat::Bmp,
        extensions: &["bmp", "dib"],
        sniff: Some(sniff_bmp),
        decode: Some(crate::bmp::decode),
        basic_decode: true,
        decode_min: V0_1,
        encode: Some(crate::bmp::encode),
        basic_encode: true,
        extended_encode: false,
        encode_min: V0_1,
    },
    CodecEntry {
        format: ImageFormat::Png,
        extensions: &["png"],
        sniff: Some(sniff_png),
        decode: Some(crate::codecs::png::decode),
        basic_decode: false,
        decode_min: V0_1,
        encode: Some(crate::codecs::png::encode),
        basic_encode: true,
        extended_encode: true,
        encode_min: V0_1,
    },
    CodecEntry {
        format: ImageFormat::Jpeg,
        extensions: &["jpg", "jpeg", "jpe", "jfif"],
        sniff: Some(sniff_jpeg),
        decode: table::JPEG_DECODE,
        basic_decode: false,
        decode_min: V0_1,
        encode: table::JPEG_ENCODE,
        basic_encode: false,
        extended_encode: true,
        encode_min: V0_1,
    },
    CodecEntry {
        format: ImageFormat::Gif,
        extensions: &["gif"],
        sniff: Some(sniff_gif),
        decode: table::GIF_DECODE,
        basic_decode: false,
        decode_min: V0_1,
        encode: None,
        basic_encode: false,
        extended_encode: false,
        encode_min: V0_1,
    },
    CodecEntry {
        format: ImageFormat::Tga,
        extensions: &["tga", "icb", "vda", "vst"],
        sniff: None,
        decode: Some(crate::tga::decode),
        basic_decode: false,
        decode_min: V0_1,
        encode: Some(crate::tga::encode),
        basic_encode: true,
        extended_encode: false,
        encode_min: V0_1,
    },
    CodecEntry {
        format: ImageFormat::Qoi,
        extensions: &["qoi"],
        sniff: Some(sniff_qoi),
        decode: table::QOI_DECODE,
        basic_decode: false,
        decode_min: V0_1,
        encode: None,
        basic_encode: false,
        extended_encode: false,
        encode_min: V0_1,
    },
    CodecEntry {
        format: ImageFormat::Pnm,
        extensions: &["pnm", "ppm", "pgm"],
        sniff: Some(sniff_pnm),
        decode: Some(crate::pnm::decode),
        basic_decode: false,
        decode_min: V0_1,
        encode: None,
        basic_encode: false,
        extended_encode: false,
        encode_min: V0_1,
    },
    CodecEntry {
        format: ImageFormat::Svg,
        extensions: &["svg"],
        sniff: Some(sniff_svg),
        decode: table::SVG_DECODE,
        basic_decode: false,
        decode_min: V0_1,
        encode: None,
        basic_encode: false,
        extended_encode: false,
        encode_min: V0_1,
    },
];

impl ImageFormat {
    pub(crate) fn entry(self) -> &'static CodecEntry {
        // The table is ordered by variant.
        &CODECS[self as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bmp => "bmp",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Tga => "tga",
            Self::Qoi => "qoi",
            Self::Pnm => "pnm",
            Self::Svg => "svg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Bmp => "image/bmp",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Tga => "image/x-tga",
            Self::Qoi => "image/qoi",
            Self::Pnm => "image/x-portable-anymap",
            Self::Svg => "image/svg+xml",
        }
    }

    /// File extensions, lowercase without the dot. The first is preferred.
    pub fn extensions(self) -> &'static [&'static str] {
        self.entry().extensions
    }

    /// Identify a format from leading bytes.
    ///
    /// Formats without a signature (TGA) are never detected here.
    pub fn detect(data: &[u8]) -> Option<Self> {
        CODECS
            .iter()
            .find(|c| c.sniff.is_some_and(|sniff| sniff(data)))
            .map(|c| c.format)
    }

    /// Look up a format by file extension, with or without a leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        CODECS
            .iter()
            .find(|c| c.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .map(|c| c.format)
    }

    /// Resolve a name hint: a file name, an extension, or a format name.
    ///
    /// `png8` resolves to PNG.
    pub fn from_name_hint(hint: &str) -> Option<Self> {
        parse_hint(hint).map(|(format, _)| format)
    }

    /// Whether `load_basic` decodes this format.
    pub fn is_basic_decodable(self) -> bool {
        self.entry().basic_decode
    }

    /// Whether this build carries a decoder for this format.
    pub fn can_decode(self) -> bool {
        self.entry().decode.is_some()
    }

    /// Whether this build carries an encoder for this format.
    pub fn can_encode(self) -> bool {
        self.entry().encode.is_some()
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Split a hint into its format and whether it asks for indexed output.
pub(crate) fn parse_hint(hint: &str) -> Option<(ImageFormat, bool)> {
    let hint = hint.trim();
    let tail = match hint.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => hint,
    };
    if tail.eq_ignore_ascii_case("png8") {
        return Some((ImageFormat::Png, true));
    }
    ImageFormat::from_extension(tail)
        .or_else(|| {
            CODECS
                .iter()
                .find(|c| c.format.name().eq_ignore_ascii_case(tail))
                .map(|c| c.format)
        })
        .map(|f| (f, false))
}

fn sniff_bmp(data: &[u8]) -> bool {
    data.len() >= 14 && data.starts_with(b"BM")
}

fn sniff_png(data: &[u8]) -> bool {
    data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
}

fn sniff_jpeg(data: &[u8]) -> bool {
    data.starts_with(&[0xFF, 0xD8, 0xFF])
}

fn sniff_gif(data: &[u8]) -> bool {
    data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a")
}

fn sniff_qoi(data: &[u8]) -> bool {
    data.starts_with(b"qoif")
}

fn sniff_pnm(data: &[u8]) -> bool {
    matches!(data, [b'P', b'5' | b'6', ws, ..] if ws.is_ascii_whitespace())
}

fn sniff_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(1024)];
    let head = head.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(head);
    let start = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(head.len());
    let head = &head[start..];
    if head.starts_with(b"<svg") {
        return true;
    }
    (head.starts_with(b"<?xml") || head.starts_with(b"<!")) && contains(head, b"<svg")
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
