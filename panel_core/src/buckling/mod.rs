//! # Critical Buckling Loads
//!
//! Critical in-plane loads for the five buckling modes of a stiffened panel:
//!
//! | Mode          | Length scale      | Module        |
//! |---------------|-------------------|---------------|
//! | global axial  | panel width `b`   | [`axial`]     |
//! | local axial   | stiffener pitch   | [`axial`]     |
//! | global shear  | panel width `b`   | [`shear`]     |
//! | local shear   | stiffener pitch   | [`shear`]     |
//! | crippling     | stiffener height  | [`crippling`] |
//!
//! Each load is a dimensional prefactor built from the bending stiffnesses
//! times a nondimensional knock-down. The knock-down comes from a trained
//! Gaussian Process when [`BucklingSurrogates`] carries one for the mode, and
//! from classical plate theory otherwise. Both paths share the same
//! derivative contract: every `*_sens(seed, inputs)` method returns the load
//! and the seeded partials w.r.t. every input, in the same struct shape as
//! the inputs.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "ks_weight": 100.0,
//!   "num_modes": 50,
//!   "newton": { "tolerance": 1e-10, "max_iterations": 50 },
//!   "surrogates": { "axial": null, "shear": null, "crippling": null }
//! }
//! ```

pub mod axial;
pub mod crippling;
pub mod envelope;
pub mod shear;

pub use envelope::{buckling_envelope, buckling_envelope_sens};
pub use shear::{shear_mode_shape, shear_mode_shape_sens, ModeShapePartials, ShearModeShape};

use serde::{Deserialize, Serialize};

use crate::errors::{ensure_non_negative, ensure_positive, PanelError, PanelResult};
use crate::gaussian_process::{AxialKernel, CripplingKernel, GaussianProcess, ShearKernel};

/// Optional trained surrogates, one per load family.
///
/// The axial model serves both the global and local axial modes, the shear
/// model both shear modes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucklingSurrogates {
    #[serde(default)]
    pub axial: Option<GaussianProcess<AxialKernel>>,
    #[serde(default)]
    pub shear: Option<GaussianProcess<ShearKernel>>,
    #[serde(default)]
    pub crippling: Option<GaussianProcess<CripplingKernel>>,
}

impl BucklingSurrogates {
    pub fn validate(&self) -> PanelResult<()> {
        if let Some(gp) = &self.axial {
            gp.training.validate()?;
        }
        if let Some(gp) = &self.shear {
            gp.training.validate()?;
        }
        if let Some(gp) = &self.crippling {
            gp.training.validate()?;
        }
        Ok(())
    }
}

/// Stopping rule for the shear mode-shape solve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonSettings {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for NewtonSettings {
    fn default() -> Self {
        NewtonSettings {
            tolerance: 1e-10,
            max_iterations: 50,
        }
    }
}

/// Critical-load evaluator: settings plus optional surrogates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucklingModel {
    pub surrogates: BucklingSurrogates,
    /// KS weight of the mode sums and of the failure aggregate
    pub ks_weight: f64,
    /// Number of axial half-waves summed on the closed-form path
    pub num_modes: usize,
    pub newton: NewtonSettings,
}

impl Default for BucklingModel {
    fn default() -> Self {
        BucklingModel {
            surrogates: BucklingSurrogates::default(),
            ks_weight: 100.0,
            num_modes: 50,
            newton: NewtonSettings::default(),
        }
    }
}

impl BucklingModel {
    /// Closed-form model with default settings
    pub fn closed_form() -> Self {
        BucklingModel::default()
    }

    pub fn with_surrogates(surrogates: BucklingSurrogates) -> Self {
        BucklingModel {
            surrogates,
            ..BucklingModel::default()
        }
    }

    pub fn validate(&self) -> PanelResult<()> {
        ensure_positive("ks_weight", self.ks_weight)?;
        if self.num_modes == 0 {
            return Err(PanelError::invalid_input(
                "num_modes",
                "0",
                "At least one buckling mode is required",
            ));
        }
        ensure_positive("newton.tolerance", self.newton.tolerance)?;
        if self.newton.max_iterations == 0 {
            return Err(PanelError::invalid_input(
                "newton.max_iterations",
                "0",
                "Newton solve needs at least one iteration",
            ));
        }
        self.surrogates.validate()
    }
}


/// Inputs of the global axial and global shear loads.
///
/// Also used for the partials returned by the matching `*_sens` methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalBucklingInputs {
    pub d11: f64,
    pub d22: f64,
    /// Panel width
    pub b: f64,
    pub delta: f64,
    pub rho0: f64,
    pub xi: f64,
    pub gamma: f64,
    pub zeta: f64,
}

impl GlobalBucklingInputs {
    pub const LEN: usize = 8;

    pub fn validate(&self) -> PanelResult<()> {
        ensure_positive("d11", self.d11)?;
        ensure_positive("d22", self.d22)?;
        ensure_positive("panel_width", self.b)?;
        ensure_positive("rho0", self.rho0)?;
        ensure_positive("xi", self.xi)?;
        ensure_positive("zeta", self.zeta)?;
        ensure_non_negative("delta", self.delta)?;
        ensure_non_negative("gamma", self.gamma)?;
        Ok(())
    }

    pub fn to_array(&self) -> [f64; 8] {
        [
            self.d11, self.d22, self.b, self.delta, self.rho0, self.xi, self.gamma, self.zeta,
        ]
    }

    pub fn from_array(x: &[f64; 8]) -> Self {
        GlobalBucklingInputs {
            d11: x[0],
            d22: x[1],
            b: x[2],
            delta: x[3],
            rho0: x[4],
            xi: x[5],
            gamma: x[6],
            zeta: x[7],
        }
    }
}

/// Inputs of the local (between-stiffener) axial and shear loads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalBucklingInputs {
    pub d11: f64,
    pub d22: f64,
    /// Stiffener pitch
    pub pitch: f64,
    pub rho0: f64,
    pub xi: f64,
    pub zeta: f64,
}

impl LocalBucklingInputs {
    pub const LEN: usize = 6;

    pub fn validate(&self) -> PanelResult<()> {
        ensure_positive("d11", self.d11)?;
        ensure_positive("d22", self.d22)?;
        ensure_positive("stiffener_pitch", self.pitch)?;
        ensure_positive("rho0", self.rho0)?;
        ensure_positive("xi", self.xi)?;
        ensure_positive("zeta", self.zeta)?;
        Ok(())
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.d11, self.d22, self.pitch, self.rho0, self.xi, self.zeta]
    }

    pub fn from_array(x: &[f64; 6]) -> Self {
        LocalBucklingInputs {
            d11: x[0],
            d22: x[1],
            pitch: x[2],
            rho0: x[3],
            xi: x[4],
            zeta: x[5],
        }
    }
}

/// Inputs of the stiffener crippling load (stiffener web as a plate).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CripplingInputs {
    pub d11: f64,
    pub d22: f64,
    /// Stiffener height
    pub height: f64,
    pub xi: f64,
    pub rho0: f64,
    pub gen_poisson: f64,
    pub zeta: f64,
}

impl CripplingInputs {
    pub const LEN: usize = 7;

    pub fn validate(&self) -> PanelResult<()> {
        ensure_positive("d11", self.d11)?;
        ensure_positive("d22", self.d22)?;
        ensure_positive("stiffener_height", self.height)?;
        ensure_positive("xi", self.xi)?;
        ensure_positive("rho0", self.rho0)?;
        ensure_positive("gen_poisson", self.gen_poisson)?;
        ensure_positive("zeta", self.zeta)?;
        Ok(())
    }

    pub fn to_array(&self) -> [f64; 7] {
        [
            self.d11,
            self.d22,
            self.height,
            self.xi,
            self.rho0,
            self.gen_poisson,
            self.zeta,
        ]
    }

    pub fn from_array(x: &[f64; 7]) -> Self {
        CripplingInputs {
            d11: x[0],
            d22: x[1],
            height: x[2],
            xi: x[3],
            rho0: x[4],
            gen_poisson: x[5],
            zeta: x[6],
        }
    }
}
