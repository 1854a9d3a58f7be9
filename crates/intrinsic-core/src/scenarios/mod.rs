pub mod sensitivity;

pub use sensitivity::{
    run_sensitivity, sensitivity, SensitivityAxes, SensitivityCell, SensitivityTable, StepConfig,
};
