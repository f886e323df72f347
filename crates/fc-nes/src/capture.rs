//! Headless capture: PNG screenshots and frame dumps.

use std::error::Error;
use std::fs;
use std::io::BufWriter;
use std::path::Path;

use crate::Nes;

/// Save the current framebuffer as a PNG file.
///
/// The framebuffer is ARGB32; the encoder wants RGBA bytes.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_screenshot(nes: &Nes, path: &Path) -> Result<(), Box<dyn Error>> {
    let width = nes.framebuffer_width();
    let height = nes.framebuffer_height();
    let fb = nes.framebuffer();

    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    let mut encoder = png::Encoder::new(writer, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;

    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for &pixel in fb {
        rgba.push(((pixel >> 16) & 0xFF) as u8);
        rgba.push(((pixel >> 8) & 0xFF) as u8);
        rgba.push((pixel & 0xFF) as u8);
        rgba.push(0xFF);
    }

    writer.write_image_data(&rgba)?;
    Ok(())
}

/// Run `num_frames` frames, dumping each as a numbered PNG under
/// `dir/frames/`.
///
/// # Errors
///
/// Returns an error if a frame cannot be saved.
pub fn record(nes: &mut Nes, dir: &Path, num_frames: u32) -> Result<(), Box<dyn Error>> {
    let frames_dir = dir.join("frames");
    fs::create_dir_all(&frames_dir)?;

    for i in 1..=num_frames {
        nes.run_frame();
        let filename = frames_dir.join(format!("{i:06}.png"));
        save_screenshot(nes, &filename)?;
    }

    eprintln!("Captured {num_frames} frames to {}", frames_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NesConfig;

    fn minimal_rom() -> Vec<u8> {
        let mut rom = vec![0u8; 16 + 32768 + 8192];
        rom[0..4].copy_from_slice(b"NES\x1a");
        rom[4] = 2;
        rom[5] = 1;
        for byte in &mut rom[16..16 + 32768] {
            *byte = 0xEA;
        }
        rom[16 + 0x7FFC] = 0x00;
        rom[16 + 0x7FFD] = 0x80;
        rom
    }

    #[test]
    fn screenshot_writes_a_decodable_png() {
        let mut nes = Nes::new(&NesConfig {
            rom_data: minimal_rom(),
        })
        .unwrap();
        nes.run_frame();

        let path = std::env::temp_dir().join("fc_nes_capture_test.png");
        save_screenshot(&nes, &path).unwrap();

        let file = fs::File::open(&path).unwrap();
        let decoder = png::Decoder::new(file);
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!(info.width, 256);
        assert_eq!(info.height, 240);

        fs::remove_file(&path).ok();
    }
}
