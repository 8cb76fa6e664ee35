use std::f64::consts::PI;

/// Polsby-Popper score `4π·area / perimeter²` of each part; zero when the perimeter is zero.
pub(super) fn polsby_popper(areas: &[f64], perimeters: &[f64]) -> Vec<f64> {
    areas.iter().zip(perimeters).map(|(&area, &perimeter)| {
        if perimeter == 0.0 { 0.0 } else { 4.0 * PI * area / (perimeter * perimeter) }
    }).collect()
}
