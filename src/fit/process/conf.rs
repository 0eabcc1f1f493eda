/*
    Helixfit, Kalman filter track fitting in uniform magnetic fields
    Copyright (C) 2024-onwards the helixfit developers

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::fit::gate::GateConfig;
use crate::fit::kalman::SeedingMode;
use crate::fit::scattering::ScatteringModel;
use crate::io::{ConfigError, ConfigRepr, InvalidConfigSnafu};
use serde_derive::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fmt;
use typed_builder::TypedBuilder;

/// Configuration of a track fit, as exposed to the embedding system.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
pub struct FitConfig {
    /// Magnetic field along z, in kG
    pub field: f64,
    /// Points whose predicted chi square exceeds this value are skipped by the fitting process. The filter itself never applies it.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub max_chi2: Option<f64>,
    #[builder(default)]
    #[serde(default)]
    pub gate: GateConfig,
    #[builder(default)]
    #[serde(default)]
    pub scattering: ScatteringModel,
    #[builder(default)]
    #[serde(default)]
    pub seeding: SeedingMode,
}

impl FitConfig {
    /// Checks that every threshold is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure!(
            self.field.is_finite(),
            InvalidConfigSnafu {
                msg: format!("field must be finite, got {}", self.field)
            }
        );
        ensure!(
            self.gate.curvature_floor > 0.0,
            InvalidConfigSnafu {
                msg: format!(
                    "curvature floor must be positive, got {}",
                    self.gate.curvature_floor
                )
            }
        );
        ensure!(
            self.gate.max_dip_angle > 0.0,
            InvalidConfigSnafu {
                msg: format!(
                    "maximum dip angle must be positive, got {}",
                    self.gate.max_dip_angle
                )
            }
        );
        if let Some(max_chi2) = self.max_chi2 {
            ensure!(
                max_chi2 > 0.0,
                InvalidConfigSnafu {
                    msg: format!("maximum chi2 must be positive, got {max_chi2}")
                }
            );
        }
        Ok(())
    }
}

impl ConfigRepr for FitConfig {}

impl fmt::Display for FitConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "B = {} kG, {}, {}, {}",
            self.field, self.gate, self.scattering, self.seeding
        )?;
        match self.max_chi2 {
            Some(max_chi2) => write!(f, ", chi2 cut at {max_chi2}"),
            None => write!(f, ", no chi2 cut"),
        }
    }
}

#[test]
fn serde_fitconfig() {
    use crate::fit::scattering::ThinLayer;
    use crate::track::PriorTrajectory;
    use serde_yaml;

    // Test the default config
    let cfg = FitConfig::builder().field(5.0).build();
    let serialized = serde_yaml::to_string(&cfg).unwrap();
    let deserd: FitConfig = serde_yaml::from_str(&serialized).unwrap();
    assert_eq!(deserd, cfg);

    // Scattering and seeding from a prior
    let cfg = FitConfig::builder()
        .field(-2.0)
        .max_chi2(30.0)
        .scattering(ScatteringModel::ThinLayer(ThinLayer::argon_pion()))
        .seeding(SeedingMode::Prior(PriorTrajectory {
            x0: 85.0,
            phi0: 0.05,
            tan_dip: -0.3,
            charge: -1,
            pt: 0.8,
        }))
        .build();
    let serialized = serde_yaml::to_string(&cfg).unwrap();
    println!("{serialized}");
    let deserd: FitConfig = serde_yaml::from_str(&serialized).unwrap();
    assert_eq!(deserd, cfg);
}

#[test]
fn load_fitconfig() {
    let yaml = r#"
field: 5.0
max_chi2: 25.0
gate:
  curvature_floor: 0.02
scattering:
  model: ThinLayer
  radiation_length: 19.55
  density: 0.00166
  mass: 0.13957
"#;
    let cfg = FitConfig::loads(yaml).unwrap();
    assert_eq!(cfg.field, 5.0);
    assert_eq!(cfg.max_chi2, Some(25.0));
    assert_eq!(cfg.gate.curvature_floor, 0.02);
    assert_eq!(cfg.gate.max_dip_angle, 1.2);
    assert_eq!(cfg.seeding, SeedingMode::ThreePoints);
    assert!(matches!(cfg.scattering, ScatteringModel::ThinLayer(_)));
    assert!(cfg.validate().is_ok());

    let bad = FitConfig::loads("field: 5.0\nmax_chi2: -1.0\n").unwrap();
    assert!(matches!(
        bad.validate(),
        Err(ConfigError::InvalidConfig { .. })
    ));

    assert!(matches!(
        FitConfig::loads("max_chi2: 3.0\n"),
        Err(ConfigError::ParseError { .. })
    ));
}

#[test]
fn load_fitconfig_files() {
    use std::fs;

    let single = "field: -2.0\nmax_chi2: 12.0\nseeding:\n  method: ThreePoints\n";
    let many = r#"
- field: 5.0
- field: 2.0
  gate:
    max_dip_angle: 0.8
- field: 0.5
  seeding:
    method: Prior
    x0: 0.0
    phi0: 0.1
    tan_dip: 0.2
    charge: -1
    pt: 0.5
"#;

    let dir = std::env::temp_dir();
    let single_path = dir.join(format!("helixfit_fitconfig_{}.yaml", std::process::id()));
    let many_path = dir.join(format!("helixfit_fitconfigs_{}.yaml", std::process::id()));
    fs::write(&single_path, single).unwrap();
    fs::write(&many_path, many).unwrap();

    let cfg = FitConfig::load(&single_path).unwrap();
    assert_eq!(cfg, FitConfig::loads(single).unwrap());
    assert_eq!(cfg.field, -2.0);
    assert_eq!(cfg.max_chi2, Some(12.0));

    let cfgs = FitConfig::load_many(&many_path).unwrap();
    assert_eq!(cfgs, FitConfig::loads_many(many).unwrap());
    assert_eq!(cfgs.len(), 3);
    assert_eq!(cfgs[1].gate.max_dip_angle, 0.8);
    assert_eq!(cfgs[1].gate.curvature_floor, 0.05);
    assert!(matches!(cfgs[2].seeding, SeedingMode::Prior(prior) if prior.charge == -1));

    // A single configuration is not a list
    assert!(matches!(
        FitConfig::load_many(&single_path),
        Err(ConfigError::ParseError { .. })
    ));

    fs::remove_file(&single_path).unwrap();
    fs::remove_file(&many_path).unwrap();

    assert!(matches!(
        FitConfig::load(&single_path),
        Err(ConfigError::ReadError { .. })
    ));
}
