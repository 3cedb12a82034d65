/// コアシステムモジュール（ハードウェア非依存）
pub mod calibration;
pub mod config;
pub mod config_validation;
pub mod ph_sensor;
pub mod reading;

pub use calibration::{
    CalibrationError, CalibrationModel, CalibrationPoint, CalibrationSet, CalibrationState,
    PhCalibration, PhConverter,
};
pub use config::{AppConfig, ConfigError};
pub use ph_sensor::PhSensor;
pub use reading::Reading;
