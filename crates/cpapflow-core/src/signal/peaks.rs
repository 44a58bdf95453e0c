//! Peak search with height and prominence thresholds
//!
//! A peak is a sample strictly higher than its left neighbour and higher
//! than the first differing sample to its right. Flat tops report the middle
//! sample (rounded down). The first and last samples are never peaks.
//!
//! Prominence is measured against the higher of the two "bases": on each
//! side, the lowest value between the peak and the nearest sample that is
//! strictly higher than the peak (or the end of the signal).

/// Indices of local maxima, plateau midpoints included
pub fn local_maxima(values: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if values.len() < 3 {
        return peaks;
    }

    let last = values.len() - 1;
    let mut i = 1;
    while i < last {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < last && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Prominence of the peak at `peak`
pub fn prominence(values: &[f64], peak: usize) -> f64 {
    let height = values[peak];

    let mut left_min = height;
    for &v in values[..=peak].iter().rev() {
        if v > height {
            break;
        }
        left_min = left_min.min(v);
    }

    let mut right_min = height;
    for &v in &values[peak..] {
        if v > height {
            break;
        }
        right_min = right_min.min(v);
    }

    height - left_min.max(right_min)
}

/// Peak-search thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCriteria {
    /// Minimum peak value (inclusive)
    pub min_height: f64,
    /// Minimum prominence (inclusive)
    pub min_prominence: f64,
}

/// Indices of peaks meeting both thresholds, in ascending order
///
/// # Example
/// ```
/// use cpapflow_core::signal::peaks::{find_peaks, PeakCriteria};
///
/// let signal = [0.0, 1.0, 0.0, 0.1, 0.05, 2.0, 2.0, 0.0];
/// let criteria = PeakCriteria { min_height: 0.05, min_prominence: 0.18 };
/// assert_eq!(find_peaks(&signal, &criteria), vec![1, 5]);
/// ```
pub fn find_peaks(values: &[f64], criteria: &PeakCriteria) -> Vec<usize> {
    local_maxima(values)
        .into_iter()
        .filter(|&p| values[p] >= criteria.min_height)
        .filter(|&p| prominence(values, p) >= criteria.min_prominence)
        .collect()
}
