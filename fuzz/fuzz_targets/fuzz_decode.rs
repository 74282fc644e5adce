#![no_main]
use libfuzzer_sys::fuzz_target;
use zensurface::{DecodeRequest, Limits};

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(1 << 22),
        ..Default::default()
    };

    // Signature dispatch over every codec — must never panic
    let _ = DecodeRequest::new(data)
        .with_limits(&limits)
        .decode(enough::Unstoppable);

    // TGA has no signature, so force it through the hint
    let _ = DecodeRequest::new(data)
        .with_name_hint("tga")
        .with_limits(&limits)
        .decode(enough::Unstoppable);

    let _ = DecodeRequest::new(data)
        .with_limits(&limits)
        .decode_basic(enough::Unstoppable);
});
