//! # Laminate Materials
//!
//! Ply-stacking stiffness and strain-based material failure for the panel
//! skin and the stiffener.
//!
//! Ply stiffness matrices are consumed already rotated into the laminate
//! axes; this module only sums them with their volume fractions:
//!
//! ```text
//! A = t * sum_i f_i Q_i        D = t^3 / 12 * sum_i f_i Q_i
//! ```
//!
//! Symmetric 3x3 blocks are packed as `[X11, X12, X16, X22, X26, X66]`.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "plies": [
//!     { "q": [1.3e11, 3.2e9, 0.0, 9.7e9, 0.0, 5.0e9], "fraction": 0.5, "angle_deg": 0.0 },
//!     { "q": [3.8e10, 2.9e10, 0.0, 3.8e10, 0.0, 3.1e10], "fraction": 0.5, "angle_deg": 45.0 }
//!   ],
//!   "allowables": {
//!     "tension_1": 0.011, "compression_1": 0.009,
//!     "tension_2": 0.006, "compression_2": 0.02, "shear": 0.015
//!   }
//! }
//! ```

pub mod laminate;
pub mod max_strain;

pub use laminate::{Layup, LayupPly, PlateStiffness, PlateStiffnessSens, STIFFNESS_ENTRIES};
pub use max_strain::{rotate_strain, rotate_strain_sens, PlyStrainAllowables};
