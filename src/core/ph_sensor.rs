use log::{info, warn};

use crate::core::calibration::{PhCalibration, PhConverter};
use crate::core::config::ConfigError;
use crate::core::reading::Reading;
use crate::hardware::adc::{AcquisitionEngine, AdcReader, FactoryCalibration};

/// 信号電圧のデフォルト値（V）
pub const DEFAULT_SIGNAL_VOLTAGE: f32 = 3.0;

/// pH センサー（PH-4502C）
///
/// ADC取得エンジンで測定した電圧を校正エンジンで pH に変換します。
/// `output_raw` が有効な場合は校正エンジンを使わずに電圧をそのまま出力します。
pub struct PhSensor<R: AdcReader, C: PhConverter = PhCalibration> {
    engine: AcquisitionEngine<R>,
    converter: C,
    output_raw: bool,
    signal_voltage: f32,
}

impl<R: AdcReader, C: PhConverter> PhSensor<R, C> {
    pub fn new(engine: AcquisitionEngine<R>, converter: C, output_raw: bool) -> Self {
        Self {
            engine,
            converter,
            output_raw,
            signal_voltage: DEFAULT_SIGNAL_VOLTAGE,
        }
    }

    /// プローブの信号電圧（V）を設定（妥当性チェックの上限）
    pub fn with_signal_voltage(mut self, signal_voltage: f32) -> Self {
        self.signal_voltage = signal_voltage;
        self
    }

    pub fn engine(&self) -> &AcquisitionEngine<R> {
        &self.engine
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    pub fn converter_mut(&mut self) -> &mut C {
        &mut self.converter
    }

    pub fn is_output_raw(&self) -> bool {
        self.output_raw
    }

    /// ADC特性テーブルの構築と校正モデルの計算
    ///
    /// # Errors
    /// 校正点が不正な場合は [`ConfigError`]（設定ミスのセンサーで不正な値を出さないため致命的）
    pub fn setup<F: FactoryCalibration + ?Sized>(&mut self, factory: &mut F) -> Result<(), ConfigError> {
        info!("pH センサーをセットアップしています...");
        self.engine.setup(factory);
        self.converter.fit()?;
        info!("✓ pH センサーのセットアップ完了");
        Ok(())
    }

    /// 外部に公開する値を取得（電圧出力モードでは電圧、それ以外は pH）
    pub fn sample(&mut self) -> anyhow::Result<f32> {
        let voltage = self.engine.acquire_averaged_sample()?;
        if self.output_raw {
            return Ok(voltage);
        }
        Ok(self.converter.to_ph(voltage)?)
    }

    /// 電圧と pH を含む測定結果を取得
    pub fn read(&mut self) -> anyhow::Result<Reading> {
        let voltage = self.engine.acquire_averaged_sample()?;
        let ph = if self.output_raw {
            None
        } else {
            Some(self.converter.to_ph(voltage)?)
        };
        Ok(Reading::new(voltage, ph).validated(self.signal_voltage))
    }

    /// 定期ポーリング1回分の処理（測定してログに出力）
    pub fn update(&mut self) -> anyhow::Result<Reading> {
        let reading = self.read()?;

        info!("🧪 pH 測定完了: {}", reading.summary());
        if !reading.is_reliable {
            if let Some(ref msg) = reading.warning_message {
                warn!("pH 測定警告: {}", msg);
            }
        }

        Ok(reading)
    }

    /// 設定情報を取得
    pub fn describe(&self) -> String {
        let config = self.engine.config();
        format!(
            "pH センサー ({}, 減衰: {}, サンプル数: {}, 平均化: {}, 外れ値除外: {}, 出力: {}, 信号電圧: {:.2}V, {})",
            config.channel,
            config.attenuation,
            config.sample_count,
            config.averaging,
            config.outlier_trim,
            if self.output_raw { "電圧" } else { "pH" },
            self.signal_voltage,
            self.converter.describe()
        )
    }
}
