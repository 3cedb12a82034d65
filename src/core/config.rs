use crate::core::calibration::{CalibrationPoint, CalibrationSet};
use crate::core::config_validation::{
    parse_attenuation, parse_averaging_mode, parse_calibration_values, parse_channel,
    parse_sample_count,
};
use crate::hardware::adc::{AcquisitionConfig, ChannelSelector};

/// アプリケーション設定
///
/// この構造体はビルド時に`cfg.toml`ファイルから読み込まれた設定を保持します。
/// `cfg.toml` がない場合は `#[default]` の値が使用されます。
#[toml_cfg::toml_config]
pub struct Config {
    // ADCチャンネル設定（255 = 未使用）
    #[default(0)]
    adc1_channel: u8,

    #[default(255)]
    adc2_channel: u8,

    // 0dB のフルスケールは 950mV で、デフォルトの校正点 (2.50V / 3.05V) の電圧では飽和する。
    // 実測では cfg.toml で "auto" を指定する（12dB で 2450mV まで）
    #[default("0db")]
    attenuation: &'static str,

    // サンプリング設定
    #[default(1)]
    sample_count: u8,

    #[default("oneshot")]
    averaging_mode: &'static str,

    #[default(10)]
    rolling_window: u8,

    #[default(0)] // デフォルトは外れ値除外なし
    outlier_trim: u8,

    #[default(false)]
    output_raw: bool,

    // 校正点 "電圧:pH" のカンマ区切り
    #[default("2.50:7.00,3.05:4.00")]
    calibration_values: &'static str,

    #[default(3000)]
    signal_voltage_mv: u16,

    #[default(60)]
    update_interval_seconds: u64,
}

/// 設定エラー
///
/// いずれもセットアップ時に致命的なエラーとして扱います。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("校正点が不足しています (2点以上必要): {0}点")]
    TooFewCalibrationPoints(usize),
    #[error("校正点 {0} に有限でない値が含まれています")]
    NonFiniteCalibrationPoint(usize),
    #[error("無効な校正点の指定です: {0}")]
    InvalidCalibrationValues(String),
    #[error("ADC1 (CH{0}) と ADC2 (CH{1}) のチャンネルが同時に設定されています")]
    ConflictingChannels(u8, u8),
    #[error("ADCチャンネルが設定されていません")]
    MissingChannel,
    #[error("sample_count は1以上である必要があります")]
    ZeroSampleCount,
    #[error("無効な減衰レベルです: {0}")]
    InvalidAttenuation(String),
    #[error("無効な平均化モードです: {0}")]
    InvalidAveragingMode(String),
    #[error("rolling_window の値が無効です (1-255): {0}")]
    InvalidRollingWindow(u8),
    #[error("{0} はこのボードに配線されていません (ADC1_CH0 / GPIO1 のみ)")]
    UnwiredChannel(ChannelSelector),
}

/// アプリケーション設定を表す構造体
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// ADC取得設定（チャンネル、減衰レベル、サンプル数、平均化）
    pub acquisition: AcquisitionConfig,

    /// 校正点
    pub calibration_points: Vec<CalibrationPoint>,

    /// pH ではなく電圧を出力する
    pub output_raw: bool,

    /// プローブの信号電圧（V）
    pub signal_voltage: f32,

    /// 測定間隔（秒）
    pub update_interval_seconds: u64,
}

impl AppConfig {
    /// 設定ファイルから設定をロードします
    pub fn load() -> Result<Self, ConfigError> {
        // toml_cfg によって生成された定数
        let config = CONFIG;

        let channel = ChannelSelector::from_options(
            parse_channel(config.adc1_channel),
            parse_channel(config.adc2_channel),
        )?;
        let attenuation = parse_attenuation(config.attenuation)?;
        let sample_count = parse_sample_count(config.sample_count)?;
        let averaging = parse_averaging_mode(config.averaging_mode, config.rolling_window)?;

        let acquisition = AcquisitionConfig::new(channel, attenuation)
            .with_sample_count(sample_count)?
            .with_averaging(averaging)
            .with_outlier_trim(config.outlier_trim);

        // 校正点は読み込み時点で点数と値を検証する
        let calibration_points = parse_calibration_values(config.calibration_values)?;
        CalibrationSet::new(calibration_points.clone())?;

        Ok(AppConfig {
            acquisition,
            calibration_points,
            output_raw: config.output_raw,
            signal_voltage: config.signal_voltage_mv as f32 / 1000.0,
            update_interval_seconds: config.update_interval_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::adc::{Attenuation, AttenuationMode, AveragingMode};

    #[test]
    fn test_default_attenuation_range_is_below_default_calibration_voltages() {
        // デフォルトの 0dB では校正点の電圧まで届かない（cfg.toml で auto を指定する）
        let config = AppConfig::load().unwrap();
        let full_scale_v = Attenuation::Db0.full_scale_mv() as f32 / 1000.0;

        assert!(config
            .calibration_points
            .iter()
            .all(|p| p.voltage > full_scale_v));
        assert!(Attenuation::widest().full_scale_mv() > Attenuation::Db0.full_scale_mv());
    }

    #[test]
    fn test_load_defaults() {
        // cfg.toml がないテスト環境ではデフォルト値が使われる
        let config = AppConfig::load().unwrap();

        assert_eq!(config.acquisition.channel, ChannelSelector::Adc1(0));
        assert_eq!(
            config.acquisition.attenuation,
            AttenuationMode::Fixed(Attenuation::Db0)
        );
        assert_eq!(config.acquisition.averaging, AveragingMode::OneShot);
        assert!(config.calibration_points.len() >= 2);
        assert!(config.signal_voltage > 0.0);
        assert!(config.update_interval_seconds > 0);
    }

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::TooFewCalibrationPoints(1).to_string(),
            "校正点が不足しています (2点以上必要): 1点"
        );
        assert_eq!(
            ConfigError::ConflictingChannels(0, 3).to_string(),
            "ADC1 (CH0) と ADC2 (CH3) のチャンネルが同時に設定されています"
        );
    }
}
