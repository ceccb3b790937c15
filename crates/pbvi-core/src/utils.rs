//! Numeric helpers shared by the solver components

/// Index and element with the strictly greatest score
///
/// The scan keeps the incumbent on ties, so the first maximum wins. NaN
/// scores are never selected. Returns `None` for an empty input or when
/// every score is NaN.
pub fn argmax_first<I, T, F>(items: I, mut score: F) -> Option<(usize, T, f64)>
where
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> f64,
{
    let mut best: Option<(usize, T, f64)> = None;
    for (index, item) in items.into_iter().enumerate() {
        let value = score(&item);
        let replace = match &best {
            None => !value.is_nan(),
            Some((_, _, incumbent)) => value > *incumbent,
        };
        if replace {
            best = Some((index, item, value));
        }
    }
    best
}

/// Round to a fixed number of decimal places
#[must_use]
pub fn round_to(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(i32::try_from(places).unwrap_or(i32::MAX));
    if !scale.is_finite() {
        return value;
    }
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    let rounded = scaled.round() / scale;
    // collapse -0.0 so equal values hash equally
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
