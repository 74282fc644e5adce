//! The process-wide capability registry. Kept to a single test because the
//! registry is global state shared by every test in this binary.

use enough::Unstoppable;
use zensurface::capability::{self, Capability, Version};
use zensurface::{ErrorKind, EncodeRequest, ImageFormat, PixelBuffer, PixelFormat};

#[test]
fn registry_lifecycle() {
    let first = capability::initialize();
    assert_eq!(first.is_available(), cfg!(feature = "extended"));
    assert_eq!(capability::initialize(), first);
    assert_eq!(zensurface::is_extended_available(), first.is_available());
    if first.is_available() {
        assert_eq!(zensurface::extended_version(), first.version());
        assert!(first.satisfies(capability::EXTENDED_MIN_VERSION));
    }

    let mut buffer = PixelBuffer::new(8, 8, PixelFormat::Rgb24).unwrap();
    buffer.fill(zensurface::Color::new(9, 8, 7, 255));
    let png = EncodeRequest::new(ImageFormat::Png)
        .encode(&buffer, Unstoppable)
        .unwrap();

    // Simulate the extended codecs going away.
    capability::install(Capability::unavailable());
    assert!(!zensurface::is_extended_available());
    assert_eq!(zensurface::extended_version(), None);
    let err = zensurface::load(&png, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CapabilityUnavailable);
    let bmp = EncodeRequest::new(ImageFormat::Bmp)
        .encode(&buffer, Unstoppable)
        .unwrap();
    assert_eq!(zensurface::load(&bmp, None).unwrap().size(), (8, 8));

    // A version below the minimum behaves like no capability.
    capability::install(Capability::available(Version::new(0, 0, 1)));
    let err = zensurface::load_extended(&png, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CapabilityUnavailable);

    // Re-probing restores the compiled-in state.
    let again = capability::reinitialize();
    assert_eq!(again, first);
    if again.is_available() {
        assert_eq!(zensurface::load(&png, None).unwrap().size(), (8, 8));
    }
}
