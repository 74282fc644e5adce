#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_decode";
    fs::create_dir_all(dir).unwrap();

    // PPM 2x2
    let ppm = b"P6\n2 2\n255\n\xff\x00\x00\x00\xff\x00\x00\x00\xff\x80\x80\x80";
    fs::write(format!("{dir}/ppm_2x2.ppm"), ppm).unwrap();

    // PGM 3x2, 16-bit
    let pgm = b"P5\n3 2\n65535\n\x00\x00\x40\x00\x80\x00\xc0\x00\xff\xff\x64\x00";
    fs::write(format!("{dir}/pgm16_3x2.pgm"), pgm).unwrap();

    // Minimal BMP 1x1 24-bit
    let mut bmp = vec![0u8; 58]; // 54 header + 4 pixel (3 + 1 padding)
    bmp[0] = b'B'; bmp[1] = b'M';
    bmp[2..6].copy_from_slice(&58u32.to_le_bytes()); // file size
    bmp[10..14].copy_from_slice(&54u32.to_le_bytes()); // data offset
    bmp[14..18].copy_from_slice(&40u32.to_le_bytes()); // DIB header size
    bmp[18..22].copy_from_slice(&1i32.to_le_bytes()); // width
    bmp[22..26].copy_from_slice(&1i32.to_le_bytes()); // height
    bmp[26..28].copy_from_slice(&1u16.to_le_bytes()); // planes
    bmp[28..30].copy_from_slice(&24u16.to_le_bytes()); // bpp
    bmp[54] = 0xff; bmp[55] = 0x00; bmp[56] = 0x00; // BGR
    fs::write(format!("{dir}/bmp_1x1.bmp"), bmp).unwrap();

    // TGA 2x1 RLE truecolor: one run packet of two pixels
    let mut tga = vec![0u8; 18];
    tga[2] = 10; // RLE truecolor
    tga[12..14].copy_from_slice(&2u16.to_le_bytes());
    tga[14..16].copy_from_slice(&1u16.to_le_bytes());
    tga[16] = 24;
    tga[17] = 0x20; // top-down
    tga.extend_from_slice(&[0x81, 0x10, 0x20, 0x30]);
    fs::write(format!("{dir}/tga_rle_2x1.tga"), tga).unwrap();

    // QOI 1x1 RGB
    let mut qoi = b"qoif".to_vec();
    qoi.extend_from_slice(&1u32.to_be_bytes());
    qoi.extend_from_slice(&1u32.to_be_bytes());
    qoi.extend_from_slice(&[3, 0, 0xfe, 12, 34, 56, 0, 0, 0, 0, 0, 0, 0, 1]);
    fs::write(format!("{dir}/qoi_1x1.qoi"), qoi).unwrap();

    // SVG
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"><rect width="4" height="4" fill="#f00"/></svg>"##;
    fs::write(format!("{dir}/rect.svg"), svg).unwrap();

    // Truncated/malformed seeds for edge coverage
    fs::write(format!("{dir}/empty.bin"), b"").unwrap();
    fs::write(format!("{dir}/just_p6.bin"), b"P6").unwrap();
    fs::write(format!("{dir}/bm_short.bin"), b"BM\x00\x00").unwrap();
    fs::write(format!("{dir}/png_sig_only.bin"), b"\x89PNG\r\n\x1a\n").unwrap();

    println!("Generated seed corpus in {dir}/");
}
