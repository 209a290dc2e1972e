//! # Blade-Stiffened Panel
//!
//! A skin of thickness `tp` with blade stiffeners at pitch `sp`, evaluated
//! against five failure modes for a given shell strain state
//! `[e11, e22, g12, k11, k22, k12]`:
//!
//! | index | mode                      |
//! |-------|---------------------------|
//! | 0     | panel material failure    |
//! | 1     | stiffener material failure|
//! | 2     | global buckling           |
//! | 3     | local buckling            |
//! | 4     | stiffener crippling       |
//!
//! The five ratios are KS-aggregated into one failure value. The panel
//! composes a geometry (six design variables plus the flange fraction), two
//! layups and a [`BucklingModel`]; the optional surrogates inside the model
//! decide per load family whether the GP or the closed-form path runs.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "panel_length": { "value": 0.6 },
//!   "stiffener_pitch": { "value": 0.15, "dv_num": 0, "lower_bound": 0.05, "upper_bound": 0.5 },
//!   "panel_thickness": { "value": 0.005, "dv_num": 1, "lower_bound": 0.001, "upper_bound": 0.05 },
//!   "stiffener_height": { "value": 0.04 },
//!   "stiffener_thickness": { "value": 0.004 },
//!   "panel_width": { "value": 0.8 },
//!   "flange_fraction": 0.5,
//!   "panel_layup": { "plies": [], "allowables": {} },
//!   "stiffener_layup": { "plies": [], "allowables": {} },
//!   "buckling": { "ks_weight": 100.0 }
//! }
//! ```

pub mod design_vars;
pub mod failure;
pub mod geometry;

pub use design_vars::{DesignVariable, GeometrySens, NUM_GEOMETRIC_VARIABLES};
pub use failure::{FailureMode, FailureValues, PanelBucklingInputs, NUM_FAILURES};
pub use geometry::{blade_section, BladeSection};

use serde::{Deserialize, Serialize};

use crate::buckling::BucklingModel;
use crate::errors::{PanelError, PanelResult};
use crate::materials::{Layup, PlateStiffness};

/// Reportable field values of the panel, see
/// [`StiffenedPanel::eval_design_field_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DesignField {
    /// Skin thickness plus smeared stiffener area
    EffectiveThickness,
    /// Thickness of a solid plate with the smeared bending stiffness
    EffectiveBendingThickness,
    PanelLength,
    StiffenerPitch,
    PanelThickness,
    StiffenerHeight,
    StiffenerThickness,
    PanelWidth,
}

impl DesignField {
    pub const ALL: [DesignField; 8] = [
        DesignField::EffectiveThickness,
        DesignField::EffectiveBendingThickness,
        DesignField::PanelLength,
        DesignField::StiffenerPitch,
        DesignField::PanelThickness,
        DesignField::StiffenerHeight,
        DesignField::StiffenerThickness,
        DesignField::PanelWidth,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DesignField::EffectiveThickness => "effective_thickness",
            DesignField::EffectiveBendingThickness => "effective_bending_thickness",
            DesignField::PanelLength => "panel_length",
            DesignField::StiffenerPitch => "stiffener_pitch",
            DesignField::PanelThickness => "panel_thickness",
            DesignField::StiffenerHeight => "stiffener_height",
            DesignField::StiffenerThickness => "stiffener_thickness",
            DesignField::PanelWidth => "panel_width",
        }
    }
}

impl TryFrom<usize> for DesignField {
    type Error = PanelError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        DesignField::ALL.get(index).copied().ok_or_else(|| {
            PanelError::invalid_input(
                "design field index",
                index.to_string(),
                "Valid field indices are 0 to 7",
            )
        })
    }
}

/// Blade-stiffened panel failure model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StiffenedPanel {
    pub panel_length: DesignVariable,
    pub stiffener_pitch: DesignVariable,
    pub panel_thickness: DesignVariable,
    pub stiffener_height: DesignVariable,
    pub stiffener_thickness: DesignVariable,
    pub panel_width: DesignVariable,
    /// Flange width as a fraction of the stiffener height
    pub flange_fraction: f64,
    pub panel_layup: Layup,
    pub stiffener_layup: Layup,
    #[serde(default)]
    pub buckling: BucklingModel,
}

impl StiffenedPanel {
    pub fn validate(&self) -> PanelResult<()> {
        const NAMES: [&str; NUM_GEOMETRIC_VARIABLES] = [
            "panel_length",
            "stiffener_pitch",
            "panel_thickness",
            "stiffener_height",
            "stiffener_thickness",
            "panel_width",
        ];
        for (variable, name) in self.geometric_variables().iter().zip(NAMES) {
            variable.validate(name)?;
        }
        if !(self.flange_fraction >= 0.0 && self.flange_fraction.is_finite()) {
            return Err(PanelError::invalid_input(
                "flange_fraction",
                self.flange_fraction.to_string(),
                "Flange fraction must be zero or positive",
            ));
        }
        if self.stiffener_pitch.value > self.panel_width.value {
            return Err(PanelError::invalid_input(
                "stiffener_pitch",
                self.stiffener_pitch.value.to_string(),
                "Stiffener pitch cannot exceed the panel width",
            ));
        }
        self.panel_layup.validate()?;
        self.stiffener_layup.validate()?;
        self.buckling.validate()
    }

    /// Skin A/D blocks at the current skin thickness
    pub fn panel_stiffness(&self) -> PlateStiffness {
        self.panel_layup.plate_stiffness(self.panel_thickness.value)
    }

    /// Stiffener laminate A/D blocks at the current stiffener thickness
    pub fn stiffener_stiffness(&self) -> PlateStiffness {
        self.stiffener_layup
            .plate_stiffness(self.stiffener_thickness.value)
    }

    pub fn stiffener_section(&self) -> BladeSection {
        blade_section(
            self.stiffener_height.value,
            self.stiffener_thickness.value,
            self.flange_fraction,
        )
    }

    /// Offset of the stiffener centroid from the skin mid-plane (negative z)
    pub fn stiffener_offset(&self) -> f64 {
        -(0.5 * self.panel_thickness.value + self.stiffener_section().centroid)
    }

    /// Read-only value of one of the eight reportable fields
    pub fn eval_design_field_value(&self, field: DesignField) -> f64 {
        match field {
            DesignField::EffectiveThickness => {
                self.panel_thickness.value + self.stiffener_section().area / self.stiffener_pitch.value
            }
            DesignField::EffectiveBendingThickness => {
                let tp = self.panel_thickness.value;
                let section = self.stiffener_section();
                let offset = self.stiffener_offset();
                let smeared = tp.powi(3) / 12.0
                    + (section.inertia + section.area * offset * offset) / self.stiffener_pitch.value;
                (12.0 * smeared).cbrt()
            }
            DesignField::PanelLength => self.panel_length.value,
            DesignField::StiffenerPitch => self.stiffener_pitch.value,
            DesignField::PanelThickness => self.panel_thickness.value,
            DesignField::StiffenerHeight => self.stiffener_height.value,
            DesignField::StiffenerThickness => self.stiffener_thickness.value,
            DesignField::PanelWidth => self.panel_width.value,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_sample_panel_is_valid() {
        assert!(sample_panel().validate().is_ok());
        assert!(gp_panel().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_geometry() {
        let mut panel = sample_panel();
        panel.panel_thickness.value = 0.0;
        assert!(panel.validate().is_err());

        let mut panel = sample_panel();
        panel.stiffener_pitch.value = 1.0;
        assert!(panel.validate().is_err());

        let mut panel = sample_panel();
        panel.flange_fraction = -0.1;
        assert!(panel.validate().is_err());
    }

    #[test]
    fn test_design_field_index() {
        for (i, field) in DesignField::ALL.iter().enumerate() {
            assert_eq!(DesignField::try_from(i).unwrap(), *field);
        }
        assert!(DesignField::try_from(8).is_err());
    }

    #[test]
    fn test_design_field_values() {
        let panel = sample_panel();
        assert_eq!(panel.eval_design_field_value(DesignField::PanelLength), 0.6);
        assert_eq!(panel.eval_design_field_value(DesignField::StiffenerPitch), 0.15);
        assert_eq!(panel.eval_design_field_value(DesignField::PanelWidth), 0.8);

        // (1 + 0.5) * 0.04 * 0.004 / 0.15 = 0.0016
        let effective = panel.eval_design_field_value(DesignField::EffectiveThickness);
        assert!((effective - 0.0066).abs() < 1e-12);

        // stiffeners add bending stiffness well beyond the skin alone
        let bending = panel.eval_design_field_value(DesignField::EffectiveBendingThickness);
        assert!(bending > 0.005);
        assert!(bending.is_finite());
    }

    #[test]
    fn test_stiffener_offset_below_skin() {
        let panel = sample_panel();
        let offset = panel.stiffener_offset();
        assert!(offset < -0.0025);
        assert!(offset > -(0.0025 + 0.004 + 0.04));
    }

    #[test]
    fn test_panel_json_roundtrip() {
        let panel = gp_panel();
        let json = serde_json::to_string(&panel).unwrap();
        let back: StiffenedPanel = serde_json::from_str(&json).unwrap();
        assert_eq!(panel, back);
    }
}
