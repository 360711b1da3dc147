//! Zero-mean normalized cross-correlation of a template over an image.
//!
//! The score at each placement is
//!
//! ```text
//!            sum( T'(x', y') * I(x + x', y + y') )
//! R(x, y) = ---------------------------------------------------
//!           sqrt( sum(T'(x', y')^2) * sum(I'(x + x', y + y')^2) )
//! ```
//!
//! where `T'` and `I'` are the template and the covered window with their
//! per-channel means removed. Sums run over all three RGB channels, so a
//! placement only scores 1.0 when color structure agrees too.
//!
//! The numerator is computed in the frequency domain, one tile of the image
//! at a time, so memory stays bounded by the tile size. Window energies come
//! from integer summed-area tables over the same tile and are exact, which
//! makes flat-window detection exact as well.
//!
//! A flat template scores 1.0 at every placement; a flat window scores 0.0.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::cmp::Ordering;
use std::sync::Arc;
use thiserror::Error;

use image::RgbImage;

/// Smallest FFT edge used for tiling
const MIN_TILE: usize = 256;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorrelationError {
    #[error("template is empty")]
    EmptyTemplate,

    #[error(
        "template {template_width}x{template_height} does not fit in image {image_width}x{image_height}"
    )]
    TemplateTooLarge {
        template_width: u32,
        template_height: u32,
        image_width: u32,
        image_height: u32,
    },
}

/// Best placement found for a template
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationPeak {
    /// Normalized correlation in [-1.0, 1.0]
    pub score: f64,
    /// Column of the template's top-left corner
    pub x: u32,
    /// Row of the template's top-left corner
    pub y: u32,
}

impl CorrelationPeak {
    /// True if this peak should replace `other`: higher score, or the same
    /// score earlier in row-major order
    fn beats(&self, other: &Self) -> bool {
        match self.score.partial_cmp(&other.score) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Equal) => (self.y, self.x) < (other.y, other.x),
            _ => false,
        }
    }
}

#[inline]
fn count_to_f64(count: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Zero-mean energy `sum((v - mean)^2)` from exact channel sums, or `None`
/// when every channel is constant
fn centered_energy(n: u64, sums: [u64; 3], squares: [u64; 3]) -> Option<f64> {
    let n_wide = u128::from(n);
    let scaled: u128 = (0..3)
        .map(|c| {
            let s = u128::from(sums[c]);
            (n_wide * u128::from(squares[c])).saturating_sub(s * s)
        })
        .sum();
    if scaled == 0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let scaled = scaled as f64;
    Some(scaled / count_to_f64(n))
}

/// Per-channel integer summed-area tables of values and squared values
struct SummedArea {
    stride: usize,
    sums: Vec<[u64; 3]>,
    squares: Vec<[u64; 3]>,
}

impl SummedArea {
    /// Tables over the `width` x `height` region of `image` starting at
    /// `(x0, y0)`
    fn over(image: &RgbImage, x0: usize, y0: usize, width: usize, height: usize) -> Self {
        let raw = image.as_raw();
        let image_width = image.width() as usize;
        let stride = width + 1;
        let mut sums = vec![[0u64; 3]; stride * (height + 1)];
        let mut squares = vec![[0u64; 3]; stride * (height + 1)];

        for y in 0..height {
            let mut row_sum = [0u64; 3];
            let mut row_square = [0u64; 3];
            let row = &raw[((y0 + y) * image_width + x0) * 3..][..width * 3];
            for (x, px) in row.chunks_exact(3).enumerate() {
                let idx = (y + 1) * stride + x + 1;
                let above = y * stride + x + 1;
                for c in 0..3 {
                    let v = u64::from(px[c]);
                    row_sum[c] += v;
                    row_square[c] += v * v;
                    sums[idx][c] = sums[above][c] + row_sum[c];
                    squares[idx][c] = squares[above][c] + row_square[c];
                }
            }
        }

        Self {
            stride,
            sums,
            squares,
        }
    }

    /// Channel sums and channel sums of squares over a `w` x `h` window
    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> ([u64; 3], [u64; 3]) {
        let a = y * self.stride + x;
        let b = y * self.stride + x + w;
        let c = (y + h) * self.stride + x;
        let d = (y + h) * self.stride + x + w;

        let mut sums = [0; 3];
        let mut squares = [0; 3];
        for ch in 0..3 {
            sums[ch] = self.sums[d][ch] + self.sums[a][ch] - self.sums[b][ch] - self.sums[c][ch];
            squares[ch] =
                self.squares[d][ch] + self.squares[a][ch] - self.squares[b][ch] - self.squares[c][ch];
        }
        (sums, squares)
    }
}

/// Forward and inverse plans for one 2-D transform size
struct Plan2d {
    width: usize,
    height: usize,
    row_forward: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}

impl Plan2d {
    fn new(planner: &mut FftPlanner<f64>, width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            row_forward: planner.plan_fft_forward(width),
            col_forward: planner.plan_fft_forward(height),
            row_inverse: planner.plan_fft_inverse(width),
            col_inverse: planner.plan_fft_inverse(height),
        }
    }

    fn len(&self) -> usize {
        self.width * self.height
    }

    fn forward(&self, buffer: &mut [Complex<f64>], scratch: &mut Vec<Complex<f64>>) {
        self.run(buffer, scratch, &self.row_forward, &self.col_forward);
    }

    /// Unnormalized inverse; callers divide by [`Plan2d::len`]
    fn inverse(&self, buffer: &mut [Complex<f64>], scratch: &mut Vec<Complex<f64>>) {
        self.run(buffer, scratch, &self.row_inverse, &self.col_inverse);
    }

    fn run(
        &self,
        buffer: &mut [Complex<f64>],
        scratch: &mut Vec<Complex<f64>>,
        rows: &Arc<dyn Fft<f64>>,
        cols: &Arc<dyn Fft<f64>>,
    ) {
        scratch.resize(buffer.len(), Complex::default());
        rows.process(buffer);
        transpose(buffer, scratch, self.width, self.height);
        cols.process(scratch);
        transpose(scratch, buffer, self.height, self.width);
    }
}

/// Write the transpose of the row-major `width` x `height` matrix `src` into `dst`
fn transpose(src: &[Complex<f64>], dst: &mut [Complex<f64>], width: usize, height: usize) {
    for y in 0..height {
        for x in 0..width {
            dst[x * height + y] = src[y * width + x];
        }
    }
}

/// FFT edge for an image extent searched with a template extent
fn transform_len(extent: usize, template: usize) -> usize {
    let tile = MIN_TILE.max((2 * template).next_power_of_two());
    tile.min(extent.next_power_of_two())
}

/// A template ready for frequency-domain search
struct Kernel {
    index: usize,
    width: usize,
    height: usize,
    /// Channel-planar, mean-removed samples
    centered: [Vec<f64>; 3],
    energy: f64,
}

impl Kernel {
    /// Conjugated channel spectra at the plan's size
    fn spectra(&self, plan: &Plan2d, scratch: &mut Vec<Complex<f64>>) -> [Vec<Complex<f64>>; 3] {
        std::array::from_fn(|c| {
            let mut buffer = vec![Complex::default(); plan.len()];
            for y in 0..self.height {
                for x in 0..self.width {
                    buffer[y * plan.width + x].re = self.centered[c][y * self.width + x];
                }
            }
            plan.forward(&mut buffer, scratch);
            for v in &mut buffer {
                *v = v.conj();
            }
            buffer
        })
    }
}

enum Prepared {
    Kernel(Kernel),
    /// Every placement scores 1.0
    Flat,
}

/// Validate a template and strip its channel means
fn prepare(index: usize, image: &RgbImage, template: &RgbImage) -> Result<Prepared, CorrelationError> {
    let (image_width, image_height) = image.dimensions();
    let (template_width, template_height) = template.dimensions();

    if template_width == 0 || template_height == 0 {
        return Err(CorrelationError::EmptyTemplate);
    }
    if template_width > image_width || template_height > image_height {
        return Err(CorrelationError::TemplateTooLarge {
            template_width,
            template_height,
            image_width,
            image_height,
        });
    }

    let n = u64::from(template_width) * u64::from(template_height);
    let mut sums = [0u64; 3];
    let mut squares = [0u64; 3];
    for px in template.as_raw().chunks_exact(3) {
        for c in 0..3 {
            let v = u64::from(px[c]);
            sums[c] += v;
            squares[c] += v * v;
        }
    }

    let Some(energy) = centered_energy(n, sums, squares) else {
        return Ok(Prepared::Flat);
    };

    let means = sums.map(|s| count_to_f64(s) / count_to_f64(n));
    let centered = std::array::from_fn(|c| {
        template
            .as_raw()
            .chunks_exact(3)
            .map(|px| f64::from(px[c]) - means[c])
            .collect()
    });

    Ok(Prepared::Kernel(Kernel {
        index,
        width: template_width as usize,
        height: template_height as usize,
        centered,
        energy,
    }))
}

/// Slide `template` over every placement fully inside `image` and return the
/// highest-scoring one. Ties keep the first placement in row-major order.
///
/// # Errors
///
/// Returns an error if the template is empty or larger than the image in
/// either dimension.
pub fn best_match(image: &RgbImage, template: &RgbImage) -> Result<CorrelationPeak, CorrelationError> {
    best_matches(image, std::slice::from_ref(template))
        .pop()
        .unwrap_or(Err(CorrelationError::EmptyTemplate))
}

/// [`best_match`] for several templates at once, in input order. Templates
/// of equal size share each image tile's transform.
#[must_use]
pub fn best_matches(
    image: &RgbImage,
    templates: &[RgbImage],
) -> Vec<Result<CorrelationPeak, CorrelationError>> {
    let mut results: Vec<Result<CorrelationPeak, CorrelationError>> =
        Vec::with_capacity(templates.len());
    let mut kernels = Vec::new();

    for (index, template) in templates.iter().enumerate() {
        match prepare(index, image, template) {
            Ok(Prepared::Kernel(kernel)) => {
                results.push(Ok(CorrelationPeak {
                    score: f64::NEG_INFINITY,
                    x: 0,
                    y: 0,
                }));
                kernels.push(kernel);
            }
            Ok(Prepared::Flat) => results.push(Ok(CorrelationPeak {
                score: 1.0,
                x: 0,
                y: 0,
            })),
            Err(e) => results.push(Err(e)),
        }
    }

    let mut sizes: Vec<(usize, usize)> = kernels.iter().map(|k| (k.width, k.height)).collect();
    sizes.sort_unstable();
    sizes.dedup();

    let mut planner = FftPlanner::new();
    for (width, height) in sizes {
        let group: Vec<&Kernel> = kernels
            .iter()
            .filter(|k| k.width == width && k.height == height)
            .collect();
        for (kernel, peak) in search(&mut planner, image, &group) {
            results[kernel] = Ok(peak);
        }
    }

    results
}

/// Tiled search of equally sized kernels; returns `(template index, peak)`
fn search(
    planner: &mut FftPlanner<f64>,
    image: &RgbImage,
    kernels: &[&Kernel],
) -> Vec<(usize, CorrelationPeak)> {
    let Some(first) = kernels.first() else {
        return Vec::new();
    };
    let (tw, th) = (first.width, first.height);
    let (iw, ih) = (image.width() as usize, image.height() as usize);
    let n = (tw * th) as u64;

    let plan = Plan2d::new(planner, transform_len(iw, tw), transform_len(ih, th));
    let step_x = plan.width - tw + 1;
    let step_y = plan.height - th + 1;
    let norm = count_to_f64(plan.len() as u64);

    let mut scratch = Vec::new();
    let spectra: Vec<[Vec<Complex<f64>>; 3]> =
        kernels.iter().map(|k| k.spectra(&plan, &mut scratch)).collect();
    let mut best = vec![
        CorrelationPeak {
            score: f64::NEG_INFINITY,
            x: 0,
            y: 0,
        };
        kernels.len()
    ];

    let raw = image.as_raw();
    let mut product = vec![Complex::default(); plan.len()];

    for y0 in (0..=ih - th).step_by(step_y) {
        for x0 in (0..=iw - tw).step_by(step_x) {
            let rw = plan.width.min(iw - x0);
            let rh = plan.height.min(ih - y0);
            let table = SummedArea::over(image, x0, y0, rw, rh);
            let (totals, _) = table.window(0, 0, rw, rh);
            let area = count_to_f64((rw * rh) as u64);

            let tile: [Vec<Complex<f64>>; 3] = std::array::from_fn(|c| {
                let mean = count_to_f64(totals[c]) / area;
                let mut buffer = vec![Complex::default(); plan.len()];
                for y in 0..rh {
                    let row = &raw[((y0 + y) * iw + x0) * 3..][..rw * 3];
                    for (x, px) in row.chunks_exact(3).enumerate() {
                        buffer[y * plan.width + x].re = f64::from(px[c]) - mean;
                    }
                }
                plan.forward(&mut buffer, &mut scratch);
                buffer
            });

            for ((kernel, spectrum), peak) in kernels.iter().zip(&spectra).zip(&mut best) {
                for (i, p) in product.iter_mut().enumerate() {
                    *p = tile[0][i] * spectrum[0][i]
                        + tile[1][i] * spectrum[1][i]
                        + tile[2][i] * spectrum[2][i];
                }
                plan.inverse(&mut product, &mut scratch);

                for v in 0..=(rh - th) {
                    for u in 0..=(rw - tw) {
                        let (sums, squares) = table.window(u, v, tw, th);
                        let score = centered_energy(n, sums, squares).map_or(0.0, |window| {
                            let numerator = product[v * plan.width + u].re / norm;
                            (numerator / (kernel.energy * window).sqrt()).clamp(-1.0, 1.0)
                        });

                        #[allow(clippy::cast_possible_truncation)] // bounded by image dimensions
                        let candidate = CorrelationPeak {
                            score,
                            x: (x0 + u) as u32,
                            y: (y0 + v) as u32,
                        };
                        if candidate.beats(peak) {
                            *peak = candidate;
                        }
                    }
                }
            }
        }
    }

    kernels.iter().map(|k| k.index).zip(best).collect()
}
