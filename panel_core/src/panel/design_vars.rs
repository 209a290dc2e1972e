//! Geometric design variables of the stiffened panel.
//!
//! Six scalars, always in this local order:
//!
//! | local slot | variable            |
//! |------------|---------------------|
//! | 0          | panel length        |
//! | 1          | stiffener pitch     |
//! | 2          | panel thickness     |
//! | 3          | stiffener height    |
//! | 4          | stiffener thickness |
//! | 5          | panel width         |
//!
//! A variable with a `dv_num` is active. Active variables are numbered
//! consecutively in slot order; those local indices address the design
//! vectors and sensitivity buffers of [`super::StiffenedPanel`].

use serde::{Deserialize, Serialize};

use super::StiffenedPanel;
use crate::errors::{PanelError, PanelResult};

pub const NUM_GEOMETRIC_VARIABLES: usize = 6;

/// One scalar design variable with its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignVariable {
    pub value: f64,
    /// Global design variable number; `None` keeps the value fixed
    #[serde(default)]
    pub dv_num: Option<usize>,
    #[serde(default)]
    pub lower_bound: f64,
    #[serde(default = "unbounded")]
    pub upper_bound: f64,
}

fn unbounded() -> f64 {
    f64::MAX
}

impl DesignVariable {
    /// A value that is not a design variable
    pub fn fixed(value: f64) -> Self {
        DesignVariable {
            value,
            dv_num: None,
            lower_bound: 0.0,
            upper_bound: f64::MAX,
        }
    }

    pub fn active(value: f64, dv_num: usize, lower_bound: f64, upper_bound: f64) -> Self {
        DesignVariable {
            value,
            dv_num: Some(dv_num),
            lower_bound,
            upper_bound,
        }
    }

    pub fn is_active(&self) -> bool {
        self.dv_num.is_some()
    }

    pub fn validate(&self, name: &str) -> PanelResult<()> {
        if !(self.value > 0.0 && self.value.is_finite()) {
            return Err(PanelError::invalid_input(
                name,
                self.value.to_string(),
                "Must be positive and finite",
            ));
        }
        if self.is_active() && self.lower_bound > self.upper_bound {
            return Err(PanelError::invalid_input(
                name,
                format!("[{}, {}]", self.lower_bound, self.upper_bound),
                "Lower bound exceeds upper bound",
            ));
        }
        Ok(())
    }
}

/// Geometric partials in local slot order; accumulates additively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometrySens {
    pub panel_length: f64,
    pub stiffener_pitch: f64,
    pub panel_thickness: f64,
    pub stiffener_height: f64,
    pub stiffener_thickness: f64,
    pub panel_width: f64,
}

impl GeometrySens {
    pub fn to_array(&self) -> [f64; NUM_GEOMETRIC_VARIABLES] {
        [
            self.panel_length,
            self.stiffener_pitch,
            self.panel_thickness,
            self.stiffener_height,
            self.stiffener_thickness,
            self.panel_width,
        ]
    }
}

impl std::ops::AddAssign for GeometrySens {
    fn add_assign(&mut self, rhs: Self) {
        self.panel_length += rhs.panel_length;
        self.stiffener_pitch += rhs.stiffener_pitch;
        self.panel_thickness += rhs.panel_thickness;
        self.stiffener_height += rhs.stiffener_height;
        self.stiffener_thickness += rhs.stiffener_thickness;
        self.panel_width += rhs.panel_width;
    }
}

impl StiffenedPanel {
    pub(crate) fn geometric_variables(&self) -> [&DesignVariable; NUM_GEOMETRIC_VARIABLES] {
        [
            &self.panel_length,
            &self.stiffener_pitch,
            &self.panel_thickness,
            &self.stiffener_height,
            &self.stiffener_thickness,
            &self.panel_width,
        ]
    }

    fn geometric_variables_mut(&mut self) -> [&mut DesignVariable; NUM_GEOMETRIC_VARIABLES] {
        [
            &mut self.panel_length,
            &mut self.stiffener_pitch,
            &mut self.panel_thickness,
            &mut self.stiffener_height,
            &mut self.stiffener_thickness,
            &mut self.panel_width,
        ]
    }

    fn active_variables(&self) -> impl Iterator<Item = &DesignVariable> {
        self.geometric_variables().into_iter().filter(|v| v.is_active())
    }

    /// Number of active design variables
    pub fn num_design_vars(&self) -> usize {
        self.active_variables().count()
    }

    /// Global numbers of the active variables, by local index
    pub fn design_var_nums(&self) -> Vec<usize> {
        self.active_variables().filter_map(|v| v.dv_num).collect()
    }

    /// Current values of the active variables, by local index
    pub fn design_vars(&self) -> Vec<f64> {
        self.active_variables().map(|v| v.value).collect()
    }

    /// Lower and upper bounds of the active variables, by local index
    pub fn design_var_range(&self) -> (Vec<f64>, Vec<f64>) {
        self.active_variables()
            .map(|v| (v.lower_bound, v.upper_bound))
            .unzip()
    }

    /// Overwrite the active variables from a local design vector.
    pub fn set_design_vars(&mut self, values: &[f64]) -> PanelResult<()> {
        let expected = self.num_design_vars();
        if values.len() != expected {
            return Err(PanelError::dimension_mismatch(
                "design vector",
                expected,
                values.len(),
            ));
        }
        if let Some(bad) = values.iter().find(|v| !(**v > 0.0 && v.is_finite())) {
            return Err(PanelError::invalid_input(
                "design vector",
                bad.to_string(),
                "Geometric design variables must be positive and finite",
            ));
        }
        let mut values = values.iter();
        for variable in self.geometric_variables_mut() {
            if variable.is_active() {
                if let Some(value) = values.next() {
                    variable.value = *value;
                }
            }
        }
        Ok(())
    }

    /// Add `scale * sens` into the local DV buffer (never overwrites).
    pub(crate) fn scatter_geometry_sens(
        &self,
        scale: f64,
        sens: &GeometrySens,
        dfdx: &mut [f64],
    ) -> PanelResult<()> {
        let expected = self.num_design_vars();
        if dfdx.len() < expected {
            return Err(PanelError::dimension_mismatch(
                "design sensitivity buffer",
                expected,
                dfdx.len(),
            ));
        }
        let partials = sens.to_array();
        let mut local = 0;
        for (variable, partial) in self.geometric_variables().iter().zip(partials) {
            if variable.is_active() {
                dfdx[local] += scale * partial;
                local += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::test_support::sample_panel;

    #[test]
    fn test_local_numbering() {
        let panel = sample_panel();
        // pitch, panel thickness, stiffener height and panel width are active
        assert_eq!(panel.num_design_vars(), 4);
        assert_eq!(panel.design_var_nums(), vec![10, 11, 12, 13]);
        let (lower, upper) = panel.design_var_range();
        assert_eq!(lower.len(), 4);
        assert!(lower.iter().zip(&upper).all(|(l, u)| l < u));
    }

    #[test]
    fn test_set_design_vars() {
        let mut panel = sample_panel();
        panel.set_design_vars(&[0.2, 0.006, 0.05, 0.9]).unwrap();
        assert_eq!(panel.stiffener_pitch.value, 0.2);
        assert_eq!(panel.panel_thickness.value, 0.006);
        assert_eq!(panel.stiffener_height.value, 0.05);
        assert_eq!(panel.panel_width.value, 0.9);
        assert_eq!(panel.design_vars(), vec![0.2, 0.006, 0.05, 0.9]);
    }

    #[test]
    fn test_set_design_vars_rejects_bad_vectors() {
        let mut panel = sample_panel();
        assert!(matches!(
            panel.set_design_vars(&[0.2, 0.006]),
            Err(PanelError::DimensionMismatch { .. })
        ));
        assert!(panel.set_design_vars(&[0.2, -0.006, 0.05, 0.9]).is_err());
    }

    #[test]
    fn test_scatter_accumulates() {
        let panel = sample_panel();
        let sens = GeometrySens {
            panel_length: 100.0,
            stiffener_pitch: 1.0,
            panel_thickness: 2.0,
            stiffener_height: 3.0,
            stiffener_thickness: 100.0,
            panel_width: 4.0,
        };
        let mut dfdx = vec![0.5; 4];
        panel.scatter_geometry_sens(2.0, &sens, &mut dfdx).unwrap();
        assert_eq!(dfdx, vec![2.5, 4.5, 6.5, 8.5]);
        let mut short = vec![0.0; 2];
        assert!(panel.scatter_geometry_sens(1.0, &sens, &mut short).is_err());
    }

    #[test]
    fn test_fixed_variable_json_defaults() {
        let variable: DesignVariable = serde_json::from_str(r#"{"value": 0.6}"#).unwrap();
        assert_eq!(variable, DesignVariable::fixed(0.6));
    }
}
