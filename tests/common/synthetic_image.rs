use block_disparity::image::ImageF32;
use block_disparity::interpolation::resample_translated;

/// Deterministic high-frequency texture in [0, 255]; every block of 3×3 or
/// more is unique in practice.
pub fn hashed_texture(width: usize, height: usize, seed: u32) -> ImageF32 {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    ImageF32::from_fn(width, height, |x, y| {
        let mut h = (x as u32)
            .wrapping_mul(73_856_093)
            ^ (y as u32).wrapping_mul(19_349_663)
            ^ seed.wrapping_mul(83_492_791);
        h ^= h >> 13;
        h = h.wrapping_mul(0x5bd1_e995);
        h ^= h >> 15;
        (h % 256) as f32
    })
}

/// Smooth 2D texture made of low-frequency sinusoids, evaluated at
/// continuous coordinates so that exact sub-pixel shifts can be generated.
pub fn smooth_texture_at(x: f64, y: f64) -> f32 {
    let v = 100.0
        + 40.0 * (0.23 * x + 0.11 * y).sin()
        + 30.0 * (0.17 * x - 0.19 * y).cos()
        + 20.0 * (0.29 * x).sin() * (0.07 * y).cos();
    v as f32
}

/// Left/right pair where `right(x, y) = left(x - shift_x, y)` exactly.
pub fn smooth_pair(width: usize, height: usize, shift_x: f64) -> (ImageF32, ImageF32) {
    let left = ImageF32::from_fn(width, height, |x, y| smooth_texture_at(x as f64, y as f64));
    let right = ImageF32::from_fn(width, height, |x, y| {
        smooth_texture_at(x as f64 - shift_x, y as f64)
    });
    (left, right)
}

/// Left/right pair where the right image is the left content moved by an
/// integer offset; uncovered pixels are 0.
pub fn shifted_pair(
    width: usize,
    height: usize,
    dx: i32,
    dy: i32,
    seed: u32,
) -> (ImageF32, ImageF32) {
    let left = hashed_texture(width, height, seed);
    let right = resample_translated(&left, dx as f64, dy as f64, 0.0);
    (left, right)
}

/// Dark image with a bright `side × side` square whose top-left corner is
/// `(x0, y0)`.
pub fn bright_square(width: usize, height: usize, x0: usize, y0: usize, side: usize) -> ImageF32 {
    ImageF32::from_fn(width, height, |x, y| {
        let inside = (x0..x0 + side).contains(&x) && (y0..y0 + side).contains(&y);
        if inside {
            200.0
        } else {
            10.0
        }
    })
}
