//! Sample panel written by `panel_cli demo`.

use panel_core::buckling::BucklingModel;
use panel_core::file_io::PanelFile;
use panel_core::materials::{Layup, LayupPly, PlyStrainAllowables};
use panel_core::panel::{DesignVariable, StiffenedPanel};

/// Carbon/epoxy allowables
fn allowables() -> PlyStrainAllowables {
    PlyStrainAllowables {
        tension_1: 0.011,
        compression_1: 0.009,
        tension_2: 0.006,
        compression_2: 0.02,
        shear: 0.015,
    }
}

/// Rotated reduced stiffness of a carbon/epoxy ply at 0, +-45 and 90 degrees
fn layup(fractions: [f64; 4]) -> Layup {
    let q = [
        ([1.30e11, 3.2e9, 0.0, 9.7e9, 0.0, 5.0e9], 0.0),
        ([3.8e10, 2.8e10, 3.0e10, 3.8e10, 3.0e10, 3.0e10], 45.0),
        ([3.8e10, 2.8e10, -3.0e10, 3.8e10, -3.0e10, 3.0e10], -45.0),
        ([9.7e9, 3.2e9, 0.0, 1.30e11, 0.0, 5.0e9], 90.0),
    ];
    Layup {
        plies: q
            .iter()
            .zip(fractions)
            .map(|((q, angle_deg), fraction)| LayupPly {
                q: *q,
                fraction,
                angle_deg: *angle_deg,
            })
            .collect(),
        allowables: allowables(),
    }
}

pub fn demo_file() -> PanelFile {
    let panel = StiffenedPanel {
        panel_length: DesignVariable::fixed(0.6),
        stiffener_pitch: DesignVariable::active(0.15, 0, 0.05, 0.5),
        panel_thickness: DesignVariable::active(0.005, 1, 0.001, 0.05),
        stiffener_height: DesignVariable::active(0.04, 2, 0.005, 0.2),
        stiffener_thickness: DesignVariable::active(0.004, 3, 0.001, 0.05),
        panel_width: DesignVariable::fixed(0.8),
        flange_fraction: 0.5,
        panel_layup: layup([0.4, 0.2, 0.2, 0.2]),
        stiffener_layup: layup([0.6, 0.15, 0.15, 0.1]),
        buckling: BucklingModel::closed_form(),
    };
    PanelFile::new(
        "demo wing cover",
        panel,
        [-1.5e-3, 3.0e-4, 8.0e-4, 2.0e-3, -5.0e-4, 1.0e-3],
    )
}
