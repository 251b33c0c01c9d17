//! Rolling-window primitives shared by the analyzers.
//!
//! Window convention: a window of size `w` ending at position `t` covers
//! `[t+1-w, t]`, inclusive of the current position. A rolling result is
//! defined only when all `w` inputs in the window are defined; the first
//! `w-1` positions are always undefined.

/// Standard deviations at or below this are treated as zero.
pub const MIN_STD: f64 = 1e-12;

/// Trailing window ending at `t`, or `None` when it would reach before 0
/// or any input inside it is undefined.
fn full_window(values: &[Option<f64>], t: usize, w: usize) -> Option<Vec<f64>> {
    if w == 0 || t + 1 < w {
        return None;
    }
    values[t + 1 - w..=t].iter().copied().collect()
}

fn mean(window: &[f64]) -> f64 {
    window.iter().sum::<f64>() / window.len() as f64
}

/// Sample (n-1) standard deviation. Zero for fewer than two samples.
fn sample_std(window: &[f64]) -> f64 {
    if window.len() < 2 {
        return 0.0;
    }
    let m = mean(window);
    let var = window.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (window.len() - 1) as f64;
    var.sqrt()
}

pub fn rolling_sum(values: &[Option<f64>], w: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| full_window(values, t, w).map(|win| win.iter().sum()))
        .collect()
}

pub fn rolling_mean(values: &[Option<f64>], w: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| full_window(values, t, w).map(|win| mean(&win)))
        .collect()
}

pub fn rolling_max(values: &[Option<f64>], w: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| full_window(values, t, w).map(|win| win.into_iter().fold(f64::MIN, f64::max)))
        .collect()
}

pub fn rolling_min(values: &[Option<f64>], w: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| full_window(values, t, w).map(|win| win.into_iter().fold(f64::MAX, f64::min)))
        .collect()
}

/// `(x_t - mean) / std` over the trailing window (current value included).
///
/// Undefined during warm-up and wherever the window's standard deviation is
/// zero, so a flat window never yields an unbounded score.
pub fn rolling_zscore(values: &[Option<f64>], w: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| {
            let win = full_window(values, t, w)?;
            let std = sample_std(&win);
            if std <= MIN_STD {
                return None;
            }
            Some((win[win.len() - 1] - mean(&win)) / std)
        })
        .collect()
}

/// `x_t / x_{t-1} - 1`; undefined at 0 and when the previous value is zero.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    change_over(values, 1)
}

/// `x_t / x_{t-k} - 1`; undefined for `t < k` and when `x_{t-k}` is zero.
pub fn change_over(values: &[f64], k: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| {
            if k == 0 || t < k || values[t - k] == 0.0 {
                None
            } else {
                Some(values[t] / values[t - k] - 1.0)
            }
        })
        .collect()
}

/// Pearson correlation of paired samples. `None` for fewer than two pairs
/// or when either side has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mx = mean(xs);
    let my = mean(ys);
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        vx += (x - mx) * (x - mx);
        vy += (y - my) * (y - my);
    }
    let denom = (vx * vy).sqrt();
    if denom <= MIN_STD {
        return None;
    }
    Some((cov / denom).clamp(-1.0, 1.0))
}

/// -1, 0 or 1. Zero and NaN map to 0.
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
