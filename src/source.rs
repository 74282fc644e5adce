//! Where encoded bytes come from and where they go.

use std::borrow::Cow;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::SurfaceError;

/// An encoded image input.
///
/// Caller-supplied readers are read to the end and never closed; files
/// opened from a path are closed before the call returns.
pub enum ImageSource<'a> {
    Path(Cow<'a, Path>),
    Bytes(&'a [u8]),
    Reader(&'a mut dyn Read),
}

impl<'a> ImageSource<'a> {
    /// Name hint derived from the source itself (a path's file name).
    pub(crate) fn name(&self) -> Option<String> {
        match self {
            Self::Path(p) => p.file_name().map(|n| n.to_string_lossy().into_owned()),
            _ => None,
        }
    }

    pub(crate) fn read_all(self) -> Result<Cow<'a, [u8]>, SurfaceError> {
        match self {
            Self::Path(p) => Ok(Cow::Owned(fs::read(&*p)?)),
            Self::Bytes(b) => Ok(Cow::Borrowed(b)),
            Self::Reader(r) => {
                let mut buf = Vec::new();
                r.read_to_end(&mut buf)?;
                Ok(Cow::Owned(buf))
            }
        }
    }
}

impl<'a> From<&'a Path> for ImageSource<'a> {
    fn from(p: &'a Path) -> Self {
        Self::Path(Cow::Borrowed(p))
    }
}

impl<'a> From<&'a PathBuf> for ImageSource<'a> {
    fn from(p: &'a PathBuf) -> Self {
        Self::Path(Cow::Borrowed(p.as_path()))
    }
}

impl From<PathBuf> for ImageSource<'_> {
    fn from(p: PathBuf) -> Self {
        Self::Path(Cow::Owned(p))
    }
}

impl<'a> From<&'a str> for ImageSource<'a> {
    fn from(p: &'a str) -> Self {
        Self::Path(Cow::Borrowed(Path::new(p)))
    }
}

impl<'a> From<&'a [u8]> for ImageSource<'a> {
    fn from(b: &'a [u8]) -> Self {
        Self::Bytes(b)
    }
}

impl<'a> From<&'a Vec<u8>> for ImageSource<'a> {
    fn from(b: &'a Vec<u8>) -> Self {
        Self::Bytes(b.as_slice())
    }
}

impl<'a, R: Read + 'a> From<&'a mut R> for ImageSource<'a> {
    fn from(r: &'a mut R) -> Self {
        Self::Reader(r)
    }
}

/// An encoded image output.
pub enum ImageDestination<'a> {
    Path(Cow<'a, Path>),
    /// Caller-owned stream. Written in one piece and never closed.
    Writer(&'a mut dyn Write),
}

impl ImageDestination<'_> {
    pub(crate) fn name(&self) -> Option<String> {
        match self {
            Self::Path(p) => p.file_name().map(|n| n.to_string_lossy().into_owned()),
            Self::Writer(_) => None,
        }
    }

    /// Write fully encoded bytes.
    ///
    /// Paths are written through a sibling temporary file and renamed into
    /// place, so a failure never leaves a partial destination behind.
    pub(crate) fn write_all(self, bytes: &[u8]) -> Result<(), SurfaceError> {
        match self {
            Self::Writer(w) => {
                w.write_all(bytes)?;
                w.flush()?;
                Ok(())
            }
            Self::Path(p) => write_atomically(&p, bytes),
        }
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), SurfaceError> {
    let tmp = temp_sibling(path);
    let result = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path));
    if let Err(e) = result {
        if let Err(cleanup) = fs::remove_file(&tmp)
            && cleanup.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(
                path = %tmp.display(),
                error = %cleanup,
                "failed to remove temporary file after failed save"
            );
        }
        return Err(e.into());
    }
    Ok(())
}

/// Distinguishes concurrent saves to the same path within one process.
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(".{name}.{}.{seq}.tmp", std::process::id());
    match path.parent() {
        Some(dir) => dir.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

impl<'a> From<&'a Path> for ImageDestination<'a> {
    fn from(p: &'a Path) -> Self {
        Self::Path(Cow::Borrowed(p))
    }
}

impl<'a> From<&'a PathBuf> for ImageDestination<'a> {
    fn from(p: &'a PathBuf) -> Self {
        Self::Path(Cow::Borrowed(p.as_path()))
    }
}

impl From<PathBuf> for ImageDestination<'_> {
    fn from(p: PathBuf) -> Self {
        Self::Path(Cow::Owned(p))
    }
}

impl<'a> From<&'a str> for ImageDestination<'a> {
    fn from(p: &'a str) -> Self {
        Self::Path(Cow::Borrowed(Path::new(p)))
    }
}

impl<'a, W: Write + 'a> From<&'a mut W> for ImageDestination<'a> {
    fn from(w: &'a mut W) -> Self {
        Self::Writer(w)
    }
}
