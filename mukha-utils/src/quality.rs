//! Focus and detail measures.
//!
//! The blur score is the variance of a 3x3 Laplacian response over the BT.601
//! grayscale image. Borders are handled by reflecting about the edge pixel
//! (`dcb|abcd|cba`), so every pixel contributes a response and the score is
//! comparable with OpenCV's `Laplacian(gray, CV_64F).var()`. Low variance means
//! few sharp edges: the frame is blurred, flat, or poorly lit.
//!
//! The image is never downscaled first; the rule thresholds were tuned on
//! native-resolution responses.

use image::GrayImage;
use ndarray::Array2;

/// Mirror an out-of-range index back into `0..len` (reflect-101).
#[inline]
fn reflect(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = index;
    if i < 0 {
        i = -i;
    }
    if i > last {
        i = 2 * last - i;
    }
    i.clamp(0, last) as usize
}

/// Compute the Laplacian response of a grayscale image.
pub fn laplacian(gray: &GrayImage) -> Array2<f64> {
    let (w, h) = gray.dimensions();
    let (w, h) = (w as usize, h as usize);
    let mut lap = Array2::<f64>::zeros((h, w));
    if w == 0 || h == 0 {
        return lap;
    }

    let px = |x: isize, y: isize| -> f64 {
        gray.get_pixel(reflect(x, w) as u32, reflect(y, h) as u32)[0] as f64
    };

    for y in 0..h as isize {
        for x in 0..w as isize {
            lap[[y as usize, x as usize]] =
                px(x, y - 1) + px(x - 1, y) + px(x + 1, y) + px(x, y + 1) - 4.0 * px(x, y);
        }
    }
    lap
}

/// Variance of the Laplacian response for a grayscale image. Higher values
/// mean the image is sharper.
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let lap = laplacian(gray);
    if lap.is_empty() {
        return 0.0;
    }
    let n = lap.len() as f64;
    let mean = lap.sum() / n;
    lap.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}
