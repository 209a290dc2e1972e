//! # panel_core - Stiffened-Panel Failure Engine
//!
//! `panel_core` evaluates the failure of a blade-stiffened composite panel
//! under a shell strain state and differentiates the result. All inputs and
//! outputs are JSON-serializable, so a panel definition can be stored,
//! shipped to a worker and evaluated without any other context.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions of the panel definition and the strain
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Bad inputs, failed solves and non-finite results are distinct errors
//! - **Exact Derivatives**: Every forward quantity has an analytic `*_sens` twin
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use panel_core::file_io::load_panel;
//! use std::path::Path;
//!
//! let file = load_panel(Path::new("wing_cover.json"))?;
//! let values = file.panel.compute_failure_values(&file.strain)?;
//! let (_, strain_sens) = file.panel.eval_failure_strain_sens(&file.strain)?;
//!
//! let mut dfdx = vec![0.0; file.panel.num_design_vars()];
//! file.panel.add_failure_dv_sens(&file.strain, 1.0, &mut dfdx)?;
//! println!("{:?} {:?} {:?}", values, strain_sens, dfdx);
//! # Ok::<(), panel_core::errors::PanelError>(())
//! ```
//!
//! ## Modules
//!
//! - [`panel`] - The stiffened panel, its design variables and failure evaluation
//! - [`buckling`] - Critical buckling loads, closed form and surrogate
//! - [`gaussian_process`] - GP mean prediction with axial, shear and crippling kernels
//! - [`nondim`] - Nondimensional plate-buckling parameters
//! - [`materials`] - Smeared laminates and max-strain ply failure
//! - [`math`] - Smooth max/min aggregation and soft activation functions
//! - [`verification`] - Finite-difference checks of every sensitivity
//! - [`errors`] - Structured error types
//! - [`file_io`] - Panel files with atomic saves

pub mod buckling;
pub mod errors;
pub mod file_io;
pub mod gaussian_process;
pub mod materials;
pub mod math;
pub mod nondim;
pub mod panel;
pub mod verification;

// Re-export commonly used types at crate root for convenience
pub use buckling::{BucklingModel, BucklingSurrogates, NewtonSettings};
pub use errors::{PanelError, PanelResult};
pub use file_io::{load_panel, save_panel, PanelFile, SCHEMA_VERSION};
pub use panel::{DesignField, DesignVariable, FailureMode, FailureValues, StiffenedPanel};
pub use verification::{DerivativeCheck, SelfTestReport};
