//! Combined axial/shear buckling interaction.
//!
//! ```text
//! f = (x + sqrt(x^2 + 4 y^2)) / 2,   x = N1/N1crit,  y = N12/N12crit
//! ```
//!
//! `f > 1` whenever the load point lies outside the parabolic interaction
//! curve `x + y^2 = 1`.

/// Buckling envelope of an axial load `n1` and a shear load `n12`.
pub fn buckling_envelope(n1: f64, n1crit: f64, n12: f64, n12crit: f64) -> f64 {
    let x = n1 / n1crit;
    let y = n12 / n12crit;
    0.5 * (x + (x * x + 4.0 * y * y).sqrt())
}

/// Envelope value and partials ordered `(n1, n1crit, n12, n12crit)`.
pub fn buckling_envelope_sens(n1: f64, n1crit: f64, n12: f64, n12crit: f64) -> (f64, [f64; 4]) {
    let x = n1 / n1crit;
    let y = n12 / n12crit;
    let root = (x * x + 4.0 * y * y).sqrt();
    let value = 0.5 * (x + root);

    // the unloaded point is a kink; take the one-sided slope of the axial branch
    let (df_dx, df_dy) = if root > 0.0 {
        (0.5 * (1.0 + x / root), 2.0 * y / root)
    } else {
        (0.5, 0.0)
    };

    (
        value,
        [
            df_dx / n1crit,
            -df_dx * x / n1crit,
            df_dy / n12crit,
            -df_dy * y / n12crit,
        ],
    )
}
