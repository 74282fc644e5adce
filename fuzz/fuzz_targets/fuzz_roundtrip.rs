#![no_main]
use libfuzzer_sys::fuzz_target;
use zensurface::*;

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(1 << 20),
        ..Default::default()
    };
    let Ok(decoded) = DecodeRequest::new(data)
        .with_limits(&limits)
        .decode(enough::Unstoppable)
    else {
        return;
    };

    // Every lossless container must reproduce the decoded pixels exactly
    for (format, hint) in [
        (ImageFormat::Bmp, "bmp"),
        (ImageFormat::Tga, "tga"),
        (ImageFormat::Png, "png"),
    ] {
        let Ok(encoded) = EncodeRequest::new(format).encode(&decoded, enough::Unstoppable) else {
            continue;
        };
        let Ok(decoded2) = DecodeRequest::new(&encoded)
            .with_name_hint(hint)
            .decode(enough::Unstoppable)
        else {
            panic!("re-encoded {format} failed to decode");
        };
        assert_eq!(decoded.size(), decoded2.size());
        assert_eq!(decoded.to_rgba(), decoded2.to_rgba(), "{format} roundtrip pixel mismatch");
    }
});
