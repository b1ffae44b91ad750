//! Binary PPM (P6) output of a mapped RGBA frame buffer

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Bytes per native pixel; the fourth (alpha) byte is dropped
const NATIVE_PIXEL: usize = 4;

/// Write `width * height` RGBA pixels as a P6 image.
///
/// Native row 0 is the bottom of the image, so rows are emitted last to
/// first. The file ends with a single newline after the pixel data.
pub fn write_ppm<W: Write>(
    mut out: W,
    width: usize,
    height: usize,
    rgba: &[u8],
) -> io::Result<()> {
    check_len(width, height, rgba)?;
    let stride = width * NATIVE_PIXEL;

    write!(out, "P6\n{} {}\n255\n", width, height)?;

    let mut row = Vec::with_capacity(width * 3);
    for y in (0..height).rev() {
        row.clear();
        for pixel in rgba[y * stride..(y + 1) * stride].chunks_exact(NATIVE_PIXEL) {
            row.extend_from_slice(&pixel[..3]);
        }
        out.write_all(&row)?;
    }

    out.write_all(b"\n")?;
    out.flush()
}

/// Create (or truncate) `path` and write the image into it.
///
/// A buffer too short for the image is rejected before `path` is touched.
pub fn save_ppm(path: &Path, width: usize, height: usize, rgba: &[u8]) -> io::Result<()> {
    check_len(width, height, rgba)?;
    let file = File::create(path)?;
    write_ppm(BufWriter::new(file), width, height, rgba)
}

fn check_len(width: usize, height: usize, rgba: &[u8]) -> io::Result<()> {
    let needed = width * height * NATIVE_PIXEL;
    if rgba.len() < needed {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "pixel buffer holds {} bytes, {}x{} needs {}",
                rgba.len(),
                width,
                height,
                needed
            ),
        ));
    }
    Ok(())
}
