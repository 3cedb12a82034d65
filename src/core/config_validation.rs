use log::warn;

use crate::core::calibration::CalibrationPoint;
use crate::core::config::ConfigError;
use crate::hardware::adc::{Attenuation, AttenuationMode, AveragingMode};

/// 未使用チャンネルを表す設定値
pub const CHANNEL_UNSET: u8 = 255;

pub fn parse_channel(value: u8) -> Option<u8> {
    if value == CHANNEL_UNSET {
        None
    } else {
        Some(value)
    }
}

/// 減衰レベルの文字列をパース
///
/// `"11db"` は `"12db"` の旧名として受け付け、警告を出します。
pub fn parse_attenuation(value: &str) -> Result<AttenuationMode, ConfigError> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "auto" => Ok(AttenuationMode::Auto),
        "0db" => Ok(AttenuationMode::Fixed(Attenuation::Db0)),
        #[cfg(not(esp32c2))]
        "2.5db" => Ok(AttenuationMode::Fixed(Attenuation::Db2_5)),
        #[cfg(not(esp32c2))]
        "6db" => Ok(AttenuationMode::Fixed(Attenuation::Db6)),
        "12db" => Ok(AttenuationMode::Fixed(Attenuation::Db12)),
        "11db" => {
            warn!("`attenuation: 11db` は非推奨です。`attenuation: 12db` を使用してください");
            Ok(AttenuationMode::Fixed(Attenuation::Db12))
        }
        _ => Err(ConfigError::InvalidAttenuation(value.to_string())),
    }
}

pub fn parse_sample_count(value: u8) -> Result<u8, ConfigError> {
    if value == 0 {
        Err(ConfigError::ZeroSampleCount)
    } else {
        Ok(value)
    }
}

pub fn parse_averaging_mode(mode: &str, rolling_window: u8) -> Result<AveragingMode, ConfigError> {
    match mode.trim().to_ascii_lowercase().as_str() {
        "oneshot" => Ok(AveragingMode::OneShot),
        "rolling" => {
            // u8 なので上限 (SAMPLE_BUFFER_CAPACITY = 255) は型で保証される
            if rolling_window == 0 {
                return Err(ConfigError::InvalidRollingWindow(rolling_window));
            }
            Ok(AveragingMode::Rolling {
                window: rolling_window,
            })
        }
        _ => Err(ConfigError::InvalidAveragingMode(mode.to_string())),
    }
}

/// 校正点の文字列 `"電圧:pH,電圧:pH,..."` をパース
///
/// 点数（2点以上）の検証は [`crate::core::calibration::CalibrationSet`] で行います。
pub fn parse_calibration_values(value: &str) -> Result<Vec<CalibrationPoint>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_calibration_point)
        .collect()
}

fn parse_calibration_point(entry: &str) -> Result<CalibrationPoint, ConfigError> {
    let invalid = || ConfigError::InvalidCalibrationValues(entry.to_string());

    let (voltage, ph) = entry.split_once(':').ok_or_else(invalid)?;
    let voltage: f32 = voltage.trim().parse().map_err(|_| invalid())?;
    let ph: f32 = ph.trim().parse().map_err(|_| invalid())?;

    Ok(CalibrationPoint::new(voltage, ph))
}
