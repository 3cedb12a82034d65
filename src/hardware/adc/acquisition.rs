use anyhow::{anyhow, Context};
use log::{debug, info, warn};

use super::autorange::{is_saturated, select_attenuation};
use super::characterization::{CharacterizationTable, FactoryCalibration};
use super::sample_buffer::SampleBuffer;
use super::{AdcReader, Attenuation, AttenuationMode, ChannelSelector};
use crate::core::config::ConfigError;

/// 平均化モード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AveragingMode {
    /// サンプルごとにバッファをクリアし、`sample_count` 回の読み取りを平均
    OneShot,
    /// 直近 `window` 個の読み取りをサンプル間で保持して平均
    Rolling { window: u8 },
}

impl core::fmt::Display for AveragingMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AveragingMode::OneShot => write!(f, "oneshot"),
            AveragingMode::Rolling { window } => write!(f, "rolling({})", window),
        }
    }
}

/// ADC取得設定
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionConfig {
    pub channel: ChannelSelector,
    pub attenuation: AttenuationMode,
    /// 1サンプルあたりの読み取り回数（1以上）
    pub sample_count: u8,
    pub averaging: AveragingMode,
    /// 平均化の前に両端から除外する読み取り数
    pub outlier_trim: u8,
}

impl AcquisitionConfig {
    /// 平均化なし（1回読み取り）の設定を作成
    pub fn new(channel: ChannelSelector, attenuation: AttenuationMode) -> Self {
        Self {
            channel,
            attenuation,
            sample_count: 1,
            averaging: AveragingMode::OneShot,
            outlier_trim: 0,
        }
    }

    /// チャンネル指定・減衰レベル・サンプル数から設定を検証して作成
    ///
    /// # Errors
    /// - ADC1/ADC2 のチャンネルが両方、またはどちらも設定されていない場合
    /// - `sample_count` が0の場合
    pub fn configure(
        adc1_channel: Option<u8>,
        adc2_channel: Option<u8>,
        attenuation: AttenuationMode,
        sample_count: u8,
    ) -> Result<Self, ConfigError> {
        let channel = ChannelSelector::from_options(adc1_channel, adc2_channel)?;
        Self::new(channel, attenuation).with_sample_count(sample_count)
    }

    pub fn with_sample_count(mut self, sample_count: u8) -> Result<Self, ConfigError> {
        if sample_count == 0 {
            return Err(ConfigError::ZeroSampleCount);
        }
        self.sample_count = sample_count;
        Ok(self)
    }

    pub fn with_averaging(mut self, averaging: AveragingMode) -> Self {
        self.averaging = averaging;
        self
    }

    pub fn with_outlier_trim(mut self, outlier_trim: u8) -> Self {
        self.outlier_trim = outlier_trim;
        self
    }

    /// 特性テーブルを構築する必要がある減衰レベル
    pub fn attenuation_levels(&self) -> &'static [Attenuation] {
        match self.attenuation {
            AttenuationMode::Auto => Attenuation::SUPPORTED,
            AttenuationMode::Fixed(atten) => {
                let index = atten.index();
                &Attenuation::SUPPORTED[index..=index]
            }
        }
    }

    fn buffer_window(&self) -> usize {
        match self.averaging {
            AveragingMode::OneShot => self.sample_count as usize,
            AveragingMode::Rolling { window } => window as usize,
        }
    }
}

/// ADC取得エンジン
///
/// 1回の変換（オートレンジ時は減衰レベルの選択を含む）と、
/// 複数回の読み取りの平均化を行います。サンプルバッファと特性テーブルは
/// このエンジンだけが所有します。
pub struct AcquisitionEngine<R: AdcReader> {
    reader: R,
    config: AcquisitionConfig,
    table: Option<CharacterizationTable>,
    buffer: SampleBuffer,
}

impl<R: AdcReader> AcquisitionEngine<R> {
    pub fn new(reader: R, config: AcquisitionConfig) -> Self {
        let buffer = SampleBuffer::new(config.buffer_window());
        Self {
            reader,
            config,
            table: None,
            buffer,
        }
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    pub fn characterization_table(&self) -> Option<&CharacterizationTable> {
        self.table.as_ref()
    }

    /// 使用する減衰レベルの特性テーブルを構築
    ///
    /// 工場特性がないレベルはデフォルト特性になるため、失敗しません。
    pub fn setup<F: FactoryCalibration + ?Sized>(&mut self, factory: &mut F) {
        let levels = self.config.attenuation_levels();
        info!(
            "ADC特性テーブルを構築しています ({}, 減衰: {}, {}レベル)",
            self.config.channel,
            self.config.attenuation,
            levels.len()
        );
        self.table = Some(CharacterizationTable::build(
            self.config.channel,
            levels,
            factory,
        ));
    }

    /// 1回変換して電圧（V）を返す
    ///
    /// オートレンジ時は最も広い減衰レベルで読み取った電圧から減衰レベルを選び直し、
    /// 選んだレベルで飽和した場合は一段ずつ広いレベルで読み直します。
    /// すべて飽和した場合は最も広い減衰レベルの値を返します。
    pub fn acquire_raw_sample(&mut self) -> anyhow::Result<f32> {
        let mv = match self.config.attenuation {
            AttenuationMode::Fixed(atten) => self.read_mv(atten)?.1,
            AttenuationMode::Auto => self.read_autorange_mv()?,
        };
        Ok(mv as f32 / 1000.0)
    }

    /// `sample_count` 回読み取って平均した電圧（V）を返す
    pub fn acquire_averaged_sample(&mut self) -> anyhow::Result<f32> {
        if self.config.averaging == AveragingMode::OneShot {
            self.buffer.clear();
        }

        for _ in 0..self.config.sample_count {
            let voltage = self.acquire_raw_sample()?;
            self.buffer.push(voltage);
        }

        let voltage = self
            .buffer
            .mean(self.config.outlier_trim as usize)
            .ok_or_else(|| anyhow!("サンプルバッファが空です"))?;
        debug!(
            "平均電圧: {:.4}V ({}個の読み取り, {})",
            voltage,
            self.buffer.len(),
            self.config.averaging
        );
        Ok(voltage)
    }

    fn read_mv(&mut self, atten: Attenuation) -> anyhow::Result<(u16, u32)> {
        let table = self
            .table
            .as_ref()
            .ok_or_else(|| anyhow!("ADC特性テーブルが未構築です (setup 前に取得が呼ばれました)"))?;
        let characterization = table.lookup(atten);

        let raw = self
            .reader
            .read_raw(self.config.channel, atten)
            .with_context(|| format!("ADC読み取りエラー ({}, {})", self.config.channel, atten))?;
        let mv = characterization.raw_to_mv(raw);
        debug!("ADC生値: {} -> {}mV ({})", raw, mv, atten);

        Ok((raw, mv))
    }

    fn read_autorange_mv(&mut self) -> anyhow::Result<u32> {
        let widest = Attenuation::widest();
        let (raw, widest_mv) = self.read_mv(widest)?;
        if is_saturated(raw) {
            warn!("最大減衰 ({}) でも飽和しています: {}mV", widest, widest_mv);
            return Ok(widest_mv);
        }

        let mut candidate = select_attenuation(widest_mv);
        while candidate != widest {
            let (raw, mv) = self.read_mv(candidate)?;
            if !is_saturated(raw) {
                return Ok(mv);
            }
            debug!("{} で飽和したため、一段広い減衰レベルで読み直します", candidate);
            candidate = candidate.next_wider().unwrap_or(widest);
        }

        Ok(widest_mv)
    }
}
