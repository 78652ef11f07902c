// Min/max bucket downsampling

use crate::core::format::DownsampledSeries;

/// Reduces `(x, y)` to at most `target_points` points.
///
/// Inputs that already fit are returned as-is with empty error vectors.
/// Otherwise indices are split into consecutive buckets of
/// `ceil(len / target_points)`; each bucket yields its mean `x`, mean `y`,
/// and the max/min `y` as the upper/lower envelope. Mean and extrema are
/// accumulated in the same pass over the bucket.
///
/// The last bucket may hold fewer samples than the others; its mean is
/// taken over the samples it actually holds.
///
/// A `target_points` of zero is treated as one.
pub fn downsample(x: &[f64], y: &[f64], target_points: usize) -> DownsampledSeries {
    let len = x.len().min(y.len());
    let (x, y) = (&x[..len], &y[..len]);
    let target_points = target_points.max(1);

    if len <= target_points {
        return DownsampledSeries {
            x: x.to_vec(),
            y: y.to_vec(),
            upper_error: Vec::new(),
            lower_error: Vec::new(),
        };
    }

    let bucket_size = len.div_ceil(target_points);
    let buckets = len.div_ceil(bucket_size);

    let mut out = DownsampledSeries {
        x: Vec::with_capacity(buckets),
        y: Vec::with_capacity(buckets),
        upper_error: Vec::with_capacity(buckets),
        lower_error: Vec::with_capacity(buckets),
    };

    for (xs, ys) in x.chunks(bucket_size).zip(y.chunks(bucket_size)) {
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut min = ys[0];
        let mut max = ys[0];

        for (&xv, &yv) in xs.iter().zip(ys) {
            sum_x += xv;
            sum_y += yv;
            // NaN never replaces a bound once the first sample set it
            if yv > max {
                max = yv;
            }
            if yv < min {
                min = yv;
            }
        }

        let count = xs.len() as f64;
        out.x.push(sum_x / count);
        out.y.push(sum_y / count);
        out.upper_error.push(max);
        out.lower_error.push(min);
    }

    out
}
