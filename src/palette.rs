use crate::error::SurfaceError;
use crate::pixel::Color;

/// Maximum number of palette entries.
pub const MAX_PALETTE_ENTRIES: usize = 256;

/// Ordered color table for 8-bit indexed buffers.
///
/// The entry count is fixed at construction; entries are rewritten in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<Color>,
}

impl Palette {
    /// Build a palette from up to 256 entries.
    pub fn new(entries: Vec<Color>) -> Result<Self, SurfaceError> {
        if entries.is_empty() || entries.len() > MAX_PALETTE_ENTRIES {
            return Err(SurfaceError::InvalidArgument(format!(
                "palette must have 1..=256 entries, got {}",
                entries.len()
            )));
        }
        Ok(Self { entries })
    }

    /// 256 opaque black entries. Used where the caller supplies colors later.
    pub fn black() -> Self {
        Self {
            entries: vec![Color::new(0, 0, 0, 255); MAX_PALETTE_ENTRIES],
        }
    }

    /// 256-step gray ramp, entry `i` is `(i, i, i)`.
    pub fn grayscale() -> Self {
        Self {
            entries: (0..=255u8).map(|v| Color::new(v, v, v, 255)).collect(),
        }
    }

    /// Fixed 3-3-2 palette: index bits `rrrgggbb`.
    ///
    /// This is the palette freshly allocated 8-bit buffers start with and
    /// the target of the indexed-output quantizer.
    pub fn rgb332() -> Self {
        let entries = (0..MAX_PALETTE_ENTRIES as u32)
            .map(|i| {
                let r = (i >> 5) & 0x07;
                let g = (i >> 2) & 0x07;
                let b = i & 0x03;
                Color::new(
                    ((r * 255 + 3) / 7) as u8,
                    ((g * 255 + 3) / 7) as u8,
                    (b * 85) as u8,
                    255,
                )
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Color] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<Color> {
        self.entries.get(index).copied()
    }

    /// Overwrite one entry.
    pub fn set(&mut self, index: usize, color: Color) -> Result<(), SurfaceError> {
        let len = self.entries.len();
        let slot = self.entries.get_mut(index).ok_or_else(|| {
            SurfaceError::InvalidArgument(format!("palette index {index} out of range 0..{len}"))
        })?;
        *slot = color;
        Ok(())
    }

    /// Overwrite entries starting at `first`.
    pub fn set_range(&mut self, first: usize, colors: &[Color]) -> Result<(), SurfaceError> {
        let end = first
            .checked_add(colors.len())
            .filter(|&end| end <= self.entries.len())
            .ok_or_else(|| {
                SurfaceError::InvalidArgument(format!(
                    "{} palette entries at {first} exceed palette size {}",
                    colors.len(),
                    self.entries.len()
                ))
            })?;
        self.entries[first..end].copy_from_slice(colors);
        Ok(())
    }

    /// Index of the entry closest to `color` by squared RGB distance.
    ///
    /// Ties resolve to the lowest index. Alpha is ignored.
    pub fn nearest(&self, color: Color) -> u8 {
        let mut best = 0usize;
        let mut best_dist = u32::MAX;
        for (i, e) in self.entries.iter().enumerate() {
            let dr = i32::from(e.r) - i32::from(color.r);
            let dg = i32::from(e.g) - i32::from(color.g);
            let db = i32::from(e.b) - i32::from(color.b);
            let dist = (dr * dr + dg * dg + db * db) as u32;
            if dist < best_dist {
                best = i;
                best_dist = dist;
                if dist == 0 {
                    break;
                }
            }
        }
        best as u8
    }
}

/// Reject decoded indices that point past a `len`-entry palette.
pub(crate) fn check_indices(indices: &[u8], len: usize) -> Result<(), SurfaceError> {
    match indices.iter().find(|&&i| usize::from(i) >= len) {
        Some(i) => Err(SurfaceError::InvalidData(format!(
            "palette index {i} out of range (palette has {len} entries)"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb332_corners() {
        let p = Palette::rgb332();
        assert_eq!(p.len(), 256);
        assert_eq!(p.get(0), Some(Color::new(0, 0, 0, 255)));
        assert_eq!(p.get(255), Some(Color::new(255, 255, 255, 255)));
        assert_eq!(p.get(0b111_000_00), Some(Color::new(255, 0, 0, 255)));
        assert_eq!(p.get(0b000_000_11), Some(Color::new(0, 0, 255, 255)));
    }

    #[test]
    fn nearest_exact_and_tie() {
        let p = Palette::new(vec![
            Color::new(10, 10, 10, 255),
            Color::new(20, 20, 20, 255),
            Color::new(10, 10, 10, 255),
        ])
        .unwrap();
        assert_eq!(p.nearest(Color::new(10, 10, 10, 0)), 0);
        assert_eq!(p.nearest(Color::new(15, 15, 15, 255)), 0);
        assert_eq!(p.nearest(Color::new(19, 19, 19, 255)), 1);
    }

    #[test]
    fn set_range_bounds() {
        let mut p = Palette::black();
        let c = [Color::new(1, 2, 3, 255); 2];
        assert!(p.set_range(254, &c).is_ok());
        assert!(p.set_range(255, &c).is_err());
        assert!(Palette::new(Vec::new()).is_err());
    }

    #[test]
    fn indices_past_palette_end() {
        assert!(check_indices(&[0, 1, 1, 0], 2).is_ok());
        let err = check_indices(&[0, 5, 1], 2).unwrap_err();
        assert!(matches!(err, SurfaceError::InvalidData(ref m) if m.contains("index 5")));
    }
}
