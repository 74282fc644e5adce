use enough::Stop;

use super::{DESC_RIGHT_TO_LEFT, DESC_TOP_DOWN, HEADER_SIZE};
use crate::error::SurfaceError;
use crate::palette::{MAX_PALETTE_ENTRIES, Palette, check_indices};
use crate::pixel::{Color, PixelFormat, expand_to_u8};
use crate::surface::PixelBuffer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    ColorMapped,
    TrueColor,
    Gray,
}

#[derive(Debug)]
pub(crate) struct TgaHeader {
    id_len: usize,
    has_color_map: bool,
    kind: Kind,
    rle: bool,
    cmap_first: u16,
    cmap_len: u16,
    cmap_entry_bits: u8,
    pub(crate) width: u16,
    pub(crate) height: u16,
    depth: u8,
    descriptor: u8,
}

impl TgaHeader {
    pub(crate) fn parse(data: &[u8]) -> Result<Self, SurfaceError> {
        let h: &[u8; HEADER_SIZE] = data
            .get(..HEADER_SIZE)
            .and_then(|h| h.try_into().ok())
            .ok_or(SurfaceError::UnexpectedEof)?;
        let le = |i: usize| u16::from_le_bytes([h[i], h[i + 1]]);

        let (kind, rle) = match h[2] {
            1 => (Kind::ColorMapped, false),
            2 => (Kind::TrueColor, false),
            3 => (Kind::Gray, false),
            9 => (Kind::ColorMapped, true),
            10 => (Kind::TrueColor, true),
            11 => (Kind::Gray, true),
            t => {
                return Err(SurfaceError::InvalidHeader(format!(
                    "unsupported TGA image type {t}"
                )));
            }
        };
        let header = Self {
            id_len: usize::from(h[0]),
            has_color_map: h[1] == 1,
            kind,
            rle,
            cmap_first: le(3),
            cmap_len: le(5),
            cmap_entry_bits: h[7],
            width: le(12),
            height: le(14),
            depth: h[16],
            descriptor: h[17],
        };
        if h[1] > 1 {
            return Err(SurfaceError::InvalidHeader(format!(
                "invalid TGA color map type {}",
                h[1]
            )));
        }
        if header.width == 0 || header.height == 0 {
            return Err(SurfaceError::InvalidHeader(format!(
                "TGA dimensions {}x{}",
                header.width, header.height
            )));
        }
        let depth_ok = match kind {
            Kind::ColorMapped => {
                header.has_color_map
                    && header.depth == 8
                    && header.cmap_len > 0
                    && matches!(header.cmap_entry_bits, 15 | 16 | 24 | 32)
                    && usize::from(header.cmap_first) + usize::from(header.cmap_len)
                        <= MAX_PALETTE_ENTRIES
            }
            Kind::TrueColor => matches!(header.depth, 15 | 16 | 24 | 32),
            Kind::Gray => matches!(header.depth, 8 | 16),
        };
        if !depth_ok {
            return Err(SurfaceError::InvalidHeader(format!(
                "unsupported TGA {:?} image: {}-bit, color map {}x{}-bit",
                kind, header.depth, header.cmap_len, header.cmap_entry_bits
            )));
        }
        Ok(header)
    }

    fn alpha_bits(&self) -> u8 {
        self.descriptor & 0x0f
    }

    fn bytes_per_pixel(&self) -> usize {
        usize::from(self.depth).div_ceil(8)
    }

    pub(crate) fn output_format(&self) -> PixelFormat {
        match (self.kind, self.depth) {
            (Kind::ColorMapped, _) | (Kind::Gray, 8) => PixelFormat::Index8,
            (Kind::Gray, _) => PixelFormat::Argb8888,
            (Kind::TrueColor, 15) => PixelFormat::Rgb555,
            (Kind::TrueColor, 16) if self.alpha_bits() > 0 => PixelFormat::Argb1555,
            (Kind::TrueColor, 16) => PixelFormat::Rgb555,
            (Kind::TrueColor, 24) => PixelFormat::Rgb24,
            (Kind::TrueColor, _) if self.alpha_bits() > 0 => PixelFormat::Argb8888,
            (Kind::TrueColor, _) => PixelFormat::Xrgb8888,
        }
    }
}

/// Sequential pixel reader over raw or run-length packets.
///
/// Run-length packets may span row boundaries; the pending run carries
/// over to the next row.
struct PixelStream<'a> {
    data: &'a [u8],
    pos: usize,
    bpp: usize,
    rle: bool,
    run_left: usize,
    run_repeat: bool,
    run_pixel: [u8; 4],
}

impl<'a> PixelStream<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], SurfaceError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(SurfaceError::UnexpectedEof)?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Fill `out` with whole pixels in file order.
    fn read_row(&mut self, out: &mut [u8]) -> Result<(), SurfaceError> {
        if !self.rle {
            out.copy_from_slice(self.take(out.len())?);
            return Ok(());
        }
        let bpp = self.bpp;
        for px in out.chunks_exact_mut(bpp) {
            if self.run_left == 0 {
                let packet = self.take(1)?[0];
                self.run_left = usize::from(packet & 0x7f) + 1;
                self.run_repeat = packet & 0x80 != 0;
                if self.run_repeat {
                    let value = self.take(bpp)?;
                    self.run_pixel[..bpp].copy_from_slice(value);
                }
            }
            if self.run_repeat {
                px.copy_from_slice(&self.run_pixel[..bpp]);
            } else {
                px.copy_from_slice(self.take(bpp)?);
            }
            self.run_left -= 1;
        }
        Ok(())
    }
}

pub(crate) fn decode_tga(
    data: &[u8],
    header: &TgaHeader,
    stop: &dyn Stop,
) -> Result<PixelBuffer, SurfaceError> {
    let mut pos = HEADER_SIZE + header.id_len;
    let palette = if header.has_color_map {
        let entry_bytes = usize::from(header.cmap_entry_bits).div_ceil(8);
        let len = usize::from(header.cmap_len) * entry_bytes;
        let table = data.get(pos..pos + len).ok_or(SurfaceError::UnexpectedEof)?;
        pos += len;
        (header.kind == Kind::ColorMapped)
            .then(|| read_color_map(table, header.cmap_first, header.cmap_entry_bits))
            .transpose()?
    } else {
        None
    };
    let palette = match header.kind {
        Kind::Gray if header.depth == 8 => Some(Palette::grayscale()),
        _ => palette,
    };

    let width = u32::from(header.width);
    let height = u32::from(header.height);
    let format = header.output_format();
    let map_len = palette
        .as_ref()
        .filter(|_| header.kind == Kind::ColorMapped)
        .map(Palette::len);
    let mut buffer = PixelBuffer::new(width, height, format)?;
    if let Some(palette) = palette {
        buffer.replace_palette(palette)?;
    }

    let bpp = header.bytes_per_pixel();
    let mut stream = PixelStream {
        data,
        pos,
        bpp,
        rle: header.rle,
        run_left: 0,
        run_repeat: false,
        run_pixel: [0; 4],
    };
    let top_down = header.descriptor & DESC_TOP_DOWN != 0;
    let mirrored = header.descriptor & DESC_RIGHT_TO_LEFT != 0;
    let mut row = vec![0u8; width as usize * bpp];
    let gray_alpha = header.kind == Kind::Gray && header.depth == 16;

    for i in 0..height {
        if i % 16 == 0 {
            stop.check()?;
        }
        stream.read_row(&mut row)?;
        if let Some(len) = map_len {
            check_indices(&row, len)?;
        }
        if mirrored {
            reverse_pixels(&mut row, bpp);
        }
        let y = if top_down { i } else { height - 1 - i };
        let dst = buffer.row_mut(y);
        if gray_alpha {
            // Stored as gray, alpha.
            for (d, s) in dst.chunks_exact_mut(4).zip(row.chunks_exact(2)) {
                d.copy_from_slice(&[s[0], s[0], s[0], s[1]]);
            }
        } else {
            dst.copy_from_slice(&row);
        }
    }
    Ok(buffer)
}

/// Color map entries are stored starting at index `first`; the slots below
/// it stay black so stored indices can be used as-is.
fn read_color_map(table: &[u8], first: u16, bits: u8) -> Result<Palette, SurfaceError> {
    let entry_bytes = usize::from(bits).div_ceil(8);
    let mut entries = vec![Color::new(0, 0, 0, 255); usize::from(first)];
    for e in table.chunks_exact(entry_bytes) {
        let color = match bits {
            15 | 16 => {
                let v = u32::from(u16::from_le_bytes([e[0], e[1]]));
                Color::new(
                    expand_to_u8((v >> 10) & 0x1f, 5),
                    expand_to_u8((v >> 5) & 0x1f, 5),
                    expand_to_u8(v & 0x1f, 5),
                    255,
                )
            }
            _ => Color::new(e[2], e[1], e[0], 255),
        };
        entries.push(color);
    }
    Palette::new(entries)
}

fn reverse_pixels(row: &mut [u8], bpp: usize) {
    let n = row.len() / bpp;
    for i in 0..n / 2 {
        let j = n - 1 - i;
        for b in 0..bpp {
            row.swap(i * bpp + b, j * bpp + b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(image_type: u8, depth: u8, descriptor: u8, w: u16, h: u16) -> Vec<u8> {
        let mut v = vec![0u8; HEADER_SIZE];
        v[2] = image_type;
        v[12..14].copy_from_slice(&w.to_le_bytes());
        v[14..16].copy_from_slice(&h.to_le_bytes());
        v[16] = depth;
        v[17] = descriptor;
        v
    }

    fn decode_bytes(data: &[u8]) -> Result<PixelBuffer, SurfaceError> {
        let header = TgaHeader::parse(data)?;
        decode_tga(data, &header, &enough::Unstoppable)
    }

    #[test]
    fn bottom_up_truecolor() {
        let mut data = header(2, 24, 0, 2, 2);
        // bottom row first: blue, green; then top row: red, white
        data.extend_from_slice(&[255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255]);
        let buf = decode_bytes(&data).unwrap();
        assert_eq!(buf.format(), PixelFormat::Rgb24);
        assert_eq!(buf.get_pixel(0, 0).unwrap(), Color::new(255, 0, 0, 255));
        assert_eq!(buf.get_pixel(1, 0).unwrap(), Color::new(255, 255, 255, 255));
        assert_eq!(buf.get_pixel(0, 1).unwrap(), Color::new(0, 0, 255, 255));
        assert_eq!(buf.get_pixel(1, 1).unwrap(), Color::new(0, 255, 0, 255));
    }

    #[test]
    fn rle_run_crosses_rows() {
        let mut data = header(10, 32, 0x28, 3, 2);
        // one run of 5 red pixels, then one raw green pixel
        data.extend_from_slice(&[0x84, 0, 0, 255, 255, 0x00, 0, 255, 0, 128]);
        let buf = decode_bytes(&data).unwrap();
        assert_eq!(buf.format(), PixelFormat::Argb8888);
        assert_eq!(buf.get_pixel(2, 1).unwrap(), Color::new(0, 255, 0, 128));
        assert_eq!(buf.get_pixel(0, 1).unwrap(), Color::new(255, 0, 0, 255));
    }

    #[test]
    fn color_mapped_with_offset() {
        let mut data = header(1, 8, DESC_TOP_DOWN, 2, 1);
        data[1] = 1;
        data[3..5].copy_from_slice(&2u16.to_le_bytes());
        data[5..7].copy_from_slice(&2u16.to_le_bytes());
        data[7] = 24;
        data.extend_from_slice(&[0, 0, 200, 0, 100, 0]);
        data.extend_from_slice(&[3, 2]);
        let buf = decode_bytes(&data).unwrap();
        assert!(buf.is_indexed());
        assert_eq!(buf.get_pixel(0, 0).unwrap(), Color::new(0, 100, 0, 255));
        assert_eq!(buf.get_pixel(1, 0).unwrap(), Color::new(200, 0, 0, 255));
    }

    #[test]
    fn color_mapped_index_past_map() {
        let mut data = header(1, 8, DESC_TOP_DOWN, 2, 1);
        data[1] = 1;
        data[5..7].copy_from_slice(&2u16.to_le_bytes());
        data[7] = 24;
        data.extend_from_slice(&[0, 0, 200, 0, 100, 0]);
        data.extend_from_slice(&[1, 7]);
        let err = decode_bytes(&data).unwrap_err();
        assert!(matches!(err, SurfaceError::InvalidData(ref m) if m.contains("index 7")));
    }

    #[test]
    fn mirrored_gray() {
        let data = [header(3, 8, DESC_TOP_DOWN | DESC_RIGHT_TO_LEFT, 3, 1), vec![10, 20, 30]].concat();
        let buf = decode_bytes(&data).unwrap();
        assert_eq!(buf.row(0), &[30, 20, 10]);
    }

    #[test]
    fn truncated_is_eof() {
        let mut data = header(2, 24, 0, 4, 4);
        data.extend_from_slice(&[0; 5]);
        assert!(matches!(decode_bytes(&data), Err(SurfaceError::UnexpectedEof)));
    }

    #[test]
    fn rejects_unknown_type() {
        let data = header(32, 8, 0, 1, 1);
        assert!(matches!(TgaHeader::parse(&data), Err(SurfaceError::InvalidHeader(_))));
    }
}
