#![no_main]
use libfuzzer_sys::fuzz_target;
use zensurface::*;

const LAYOUTS: &[&str] = &[
    "RGBA", "BGRA", "ARGB", "ABGR", "GBAR", "RGB", "BGR", "GRB", "RGBX", "XBGR", "RGBA_PREMULT",
    "P",
];

fuzz_target!(|data: &[u8]| {
    let [sel, w, h, pad, rest @ ..] = data else {
        return;
    };
    let layout = LAYOUTS[*sel as usize % LAYOUTS.len()];
    let (width, height) = (u32::from(*w % 64) + 1, u32::from(*h % 64) + 1);
    let channels = layout.trim_end_matches("_PREMULT").len();
    let pitch = width as usize * channels + usize::from(*pad % 8);

    // Arbitrary bytes must either decode or fail cleanly
    let Ok(buffer) = decode_from_layout(rest, width, height, layout, Some(pitch)) else {
        return;
    };
    let encoded = encode_to_layout(&buffer, layout, Some(pitch)).expect("decoded buffer re-encodes");
    let again = decode_from_layout(&encoded, width, height, layout, Some(pitch))
        .expect("encoded bytes decode");
    if !layout.ends_with("_PREMULT") {
        assert_eq!(buffer.to_rgba(), again.to_rgba());
    }
});
