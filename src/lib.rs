/*!
 * # PH-4502C pH Sensor Library
 *
 * PH-4502C アナログ pH プローブの電圧を ESP32 の ADC で測定し、
 * 多点校正による一次近似で pH 値に変換するためのライブラリ
 *
 * ## モジュール構成
 * - `core`: ハードウェア非依存の機能（設定、校正、測定結果、pH センサー）
 * - `hardware`: ADC取得（減衰レベル、オートレンジ、平均化、特性テーブル、Mock）
 */

pub mod core;
pub mod hardware;

// 内部で使用する型をまとめてエクスポート
pub use self::core::{
    AppConfig, CalibrationError, CalibrationPoint, ConfigError, PhCalibration, PhConverter,
    PhSensor, Reading,
};
pub use hardware::adc::{
    AcquisitionConfig, AcquisitionEngine, AdcReader, Attenuation, AttenuationMode, AveragingMode,
    ChannelSelector, FactoryCalibration, NoFactoryCalibration,
};

/// ライブラリのバージョン情報
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
