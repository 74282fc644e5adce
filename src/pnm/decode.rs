use enough::Stop;

use super::{PnmHeader, PnmKind};
use crate::error::SurfaceError;

/// Parse a P5/P6 header: magic, width, height, maxval, then exactly one
/// whitespace byte before the samples. `#` comments run to end of line.
pub(crate) fn parse_header(data: &[u8]) -> Result<PnmHeader, SurfaceError> {
    let kind = match data {
        [b'P', b'5', ..] => PnmKind::Pgm,
        [b'P', b'6', ..] => PnmKind::Ppm,
        [_, _, ..] => return Err(SurfaceError::UnrecognizedFormat),
        _ => return Err(SurfaceError::UnexpectedEof),
    };
    let mut pos = 2;
    let width = read_number(data, &mut pos)?;
    let height = read_number(data, &mut pos)?;
    let maxval = read_number(data, &mut pos)?;

    // Single whitespace separator before binary data.
    match data.get(pos) {
        Some(b) if b.is_ascii_whitespace() => pos += 1,
        Some(_) => {
            return Err(SurfaceError::InvalidHeader(
                "expected whitespace after PNM maxval".into(),
            ));
        }
        None => return Err(SurfaceError::UnexpectedEof),
    }

    if width == 0 || height == 0 {
        return Err(SurfaceError::InvalidHeader(format!(
            "PNM dimensions {width}x{height}"
        )));
    }
    if maxval == 0 || maxval > 65535 {
        return Err(SurfaceError::InvalidHeader(format!(
            "PNM maxval {maxval} out of range 1..=65535"
        )));
    }
    Ok(PnmHeader {
        kind,
        width,
        height,
        maxval,
        data_offset: pos,
    })
}

fn skip_whitespace_and_comments(data: &[u8], pos: &mut usize) {
    while let Some(&b) = data.get(*pos) {
        if b == b'#' {
            while data.get(*pos).is_some_and(|&b| b != b'\n') {
                *pos += 1;
            }
        } else if b.is_ascii_whitespace() {
            *pos += 1;
        } else {
            break;
        }
    }
}

fn read_number(data: &[u8], pos: &mut usize) -> Result<u32, SurfaceError> {
    skip_whitespace_and_comments(data, pos);
    let start = *pos;
    let mut value: u32 = 0;
    while let Some(&b) = data.get(*pos) {
        if !b.is_ascii_digit() {
            break;
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u32::from(b - b'0')))
            .ok_or_else(|| SurfaceError::InvalidHeader("PNM header number overflows".into()))?;
        *pos += 1;
    }
    if *pos == start {
        return Err(match data.get(*pos) {
            None => SurfaceError::UnexpectedEof,
            Some(&b) => SurfaceError::InvalidHeader(format!(
                "expected a number in PNM header, found byte 0x{b:02x}"
            )),
        });
    }
    Ok(value)
}

/// Scale samples to 8 bits. `maxval > 255` means two big-endian bytes per
/// sample.
pub(crate) fn decode_samples(
    pixel_data: &[u8],
    header: &PnmHeader,
    stop: &dyn Stop,
) -> Result<Vec<u8>, SurfaceError> {
    let (width, height) = (header.width, header.height);
    let row_samples = (width as usize)
        .checked_mul(header.kind.channels())
        .ok_or(SurfaceError::DimensionsTooLarge { width, height })?;
    let bytes_per_sample = if header.maxval > 255 { 2 } else { 1 };
    let row_bytes = row_samples * bytes_per_sample;
    let expected = row_bytes
        .checked_mul(height as usize)
        .ok_or(SurfaceError::DimensionsTooLarge { width, height })?;
    let src = pixel_data.get(..expected).ok_or(SurfaceError::UnexpectedEof)?;

    // Fast path: already 8-bit full range.
    if header.maxval == 255 {
        stop.check()?;
        return Ok(src.to_vec());
    }

    let max = header.maxval;
    let scale = |v: u32| ((v.min(max) * 255 + max / 2) / max) as u8;
    let mut out = Vec::with_capacity(row_samples * height as usize);
    for (y, row) in src.chunks_exact(row_bytes).enumerate() {
        if y % 16 == 0 {
            stop.check()?;
        }
        if bytes_per_sample == 2 {
            out.extend(
                row.chunks_exact(2)
                    .map(|p| scale(u32::from(u16::from_be_bytes([p[0], p[1]])))),
            );
        } else {
            out.extend(row.iter().map(|&v| scale(u32::from(v))));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_with_comments() {
        let data = b"P6\n# made by hand\n3 # width\n2\n255\n";
        let h = parse_header(data).unwrap();
        assert_eq!(h.kind, PnmKind::Ppm);
        assert_eq!((h.width, h.height, h.maxval), (3, 2, 255));
        assert_eq!(h.data_offset, data.len());
    }

    #[test]
    fn rejects_bad_headers() {
        assert!(matches!(parse_header(b"P3\n1 1\n255\n"), Err(SurfaceError::UnrecognizedFormat)));
        assert!(matches!(parse_header(b"P5\n1 1\n0\n"), Err(SurfaceError::InvalidHeader(_))));
        assert!(matches!(parse_header(b"P5\n0 1\n255\n"), Err(SurfaceError::InvalidHeader(_))));
        assert!(matches!(parse_header(b"P5\n1 1"), Err(SurfaceError::UnexpectedEof)));
    }

    #[test]
    fn sixteen_bit_scaling() {
        let data = [b"P5\n2 1\n65535\n".as_slice(), &[0xff, 0xff, 0x80, 0x00]].concat();
        let h = parse_header(&data).unwrap();
        let out = decode_samples(&data[h.data_offset..], &h, &enough::Unstoppable).unwrap();
        assert_eq!(out, [255, 128]);
    }

    #[test]
    fn low_maxval_scaling() {
        let data = [b"P5\n3 1\n15\n".as_slice(), &[0, 15, 7]].concat();
        let h = parse_header(&data).unwrap();
        let out = decode_samples(&data[h.data_offset..], &h, &enough::Unstoppable).unwrap();
        assert_eq!(out, [0, 255, 119]);
    }
}
