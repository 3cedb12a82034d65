/// ADCアナログ入力の取得モジュール
///
/// 減衰レベル（アッテネーション）ごとの特性テーブル、オートレンジ選択、
/// 複数回読み取りの平均化を提供します。ADCハードウェアへのアクセスは
/// [`AdcReader`] トレイトの実装（実機用 / テスト用Mock）に委譲します。
pub mod acquisition;
pub mod autorange;
pub mod characterization;
#[cfg(any(target_arch = "riscv32", target_arch = "xtensa"))]
pub mod esp;
pub mod sample_buffer;

pub use acquisition::{AcquisitionConfig, AcquisitionEngine, AveragingMode};
pub use characterization::{
    CalibrationScheme, Characterization, CharacterizationOrigin, CharacterizationTable,
    FactoryCalibration, NoFactoryCalibration,
};
pub use sample_buffer::SampleBuffer;

use crate::core::config::ConfigError;

/// 12bit ADCの最大生値（この値以上は飽和とみなす）
pub const ADC_MAX_RAW: u16 = 4095;

/// ADCの減衰レベル
///
/// 減衰を大きくすると入力電圧範囲が広がる代わりに分解能が下がります。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attenuation {
    /// 0dB（〜950mV）
    Db0,
    /// 2.5dB（〜1250mV）
    #[cfg(not(esp32c2))]
    Db2_5,
    /// 6dB（〜1750mV）
    #[cfg(not(esp32c2))]
    Db6,
    /// 12dB（〜2450mV）
    Db12,
}

impl Attenuation {
    /// ターゲットで使用可能な減衰レベル（フルスケールの狭い順）
    #[cfg(not(esp32c2))]
    pub const SUPPORTED: &'static [Attenuation] = &[
        Attenuation::Db0,
        Attenuation::Db2_5,
        Attenuation::Db6,
        Attenuation::Db12,
    ];

    /// ターゲットで使用可能な減衰レベル（フルスケールの狭い順）
    #[cfg(esp32c2)]
    pub const SUPPORTED: &'static [Attenuation] = &[Attenuation::Db0, Attenuation::Db12];

    /// 使用可能な減衰レベルの数
    pub const COUNT: usize = Self::SUPPORTED.len();

    /// 公称フルスケール電圧（mV）
    pub fn full_scale_mv(self) -> u32 {
        match self {
            Attenuation::Db0 => 950,
            #[cfg(not(esp32c2))]
            Attenuation::Db2_5 => 1250,
            #[cfg(not(esp32c2))]
            Attenuation::Db6 => 1750,
            Attenuation::Db12 => 2450,
        }
    }

    /// 最も入力範囲の広い減衰レベル
    pub fn widest() -> Self {
        Attenuation::Db12
    }

    /// `SUPPORTED` 内での位置（特性テーブルのインデックス）
    pub fn index(self) -> usize {
        Self::SUPPORTED
            .iter()
            .position(|&a| a == self)
            .unwrap_or(Self::COUNT - 1)
    }

    /// 一段広い減衰レベル（最大の場合は `None`）
    pub fn next_wider(self) -> Option<Self> {
        Self::SUPPORTED.get(self.index() + 1).copied()
    }
}

impl core::fmt::Display for Attenuation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Attenuation::Db0 => write!(f, "0dB"),
            #[cfg(not(esp32c2))]
            Attenuation::Db2_5 => write!(f, "2.5dB"),
            #[cfg(not(esp32c2))]
            Attenuation::Db6 => write!(f, "6dB"),
            Attenuation::Db12 => write!(f, "12dB"),
        }
    }
}

/// 減衰レベルの設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttenuationMode {
    /// 固定の減衰レベル
    Fixed(Attenuation),
    /// 読み取りごとに最適な減衰レベルを選択
    Auto,
}

impl core::fmt::Display for AttenuationMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AttenuationMode::Fixed(atten) => write!(f, "{}", atten),
            AttenuationMode::Auto => write!(f, "auto"),
        }
    }
}

/// 物理的に1つのADC変換器を指す2通りのアドレス指定
///
/// ADC1とADC2のチャンネルは同じ入力ピンの別名であり、同時には設定できません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelSelector {
    Adc1(u8),
    Adc2(u8),
}

impl ChannelSelector {
    /// 2つの任意設定値から排他的なチャンネル指定を作成
    ///
    /// # Errors
    /// - 両方が設定されている場合: [`ConfigError::ConflictingChannels`]
    /// - どちらも設定されていない場合: [`ConfigError::MissingChannel`]
    pub fn from_options(adc1: Option<u8>, adc2: Option<u8>) -> Result<Self, ConfigError> {
        match (adc1, adc2) {
            (Some(ch1), None) => Ok(ChannelSelector::Adc1(ch1)),
            (None, Some(ch2)) => Ok(ChannelSelector::Adc2(ch2)),
            (Some(ch1), Some(ch2)) => Err(ConfigError::ConflictingChannels(ch1, ch2)),
            (None, None) => Err(ConfigError::MissingChannel),
        }
    }

    /// ADCユニット番号（1 または 2）
    pub fn unit(&self) -> u8 {
        match self {
            ChannelSelector::Adc1(_) => 1,
            ChannelSelector::Adc2(_) => 2,
        }
    }

    /// ユニット内のチャンネル番号
    pub fn channel(&self) -> u8 {
        match self {
            ChannelSelector::Adc1(ch) | ChannelSelector::Adc2(ch) => *ch,
        }
    }
}

impl core::fmt::Display for ChannelSelector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ADC{}_CH{}", self.unit(), self.channel())
    }
}

/// ADC生値読み取りのトレイト
///
/// このトレイトを実装することで、実機用とテスト用(Mock)の
/// 実装を切り替えることができます。
pub trait AdcReader {
    /// 指定チャンネルを指定減衰レベルで1回変換し、生値を返す
    fn read_raw(&mut self, channel: ChannelSelector, attenuation: Attenuation)
        -> anyhow::Result<u16>;
}

impl<R: AdcReader + ?Sized> AdcReader for &mut R {
    fn read_raw(
        &mut self,
        channel: ChannelSelector,
        attenuation: Attenuation,
    ) -> anyhow::Result<u16> {
        (**self).read_raw(channel, attenuation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_levels_are_ordered_by_full_scale() {
        let scales: Vec<u32> = Attenuation::SUPPORTED
            .iter()
            .map(|a| a.full_scale_mv())
            .collect();
        assert!(scales.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*Attenuation::SUPPORTED.last().unwrap(), Attenuation::widest());
    }

    #[test]
    fn test_next_wider() {
        assert_eq!(Attenuation::Db0.next_wider(), Some(Attenuation::Db2_5));
        assert_eq!(Attenuation::Db6.next_wider(), Some(Attenuation::Db12));
        assert_eq!(Attenuation::Db12.next_wider(), None);
    }

    #[test]
    fn test_index_matches_supported_position() {
        for (i, atten) in Attenuation::SUPPORTED.iter().enumerate() {
            assert_eq!(atten.index(), i);
        }
    }

    #[test]
    fn test_channel_selector_adc1_only() {
        let selector = ChannelSelector::from_options(Some(3), None).unwrap();
        assert_eq!(selector, ChannelSelector::Adc1(3));
        assert_eq!(selector.unit(), 1);
        assert_eq!(selector.channel(), 3);
    }

    #[test]
    fn test_channel_selector_adc2_only() {
        let selector = ChannelSelector::from_options(None, Some(7)).unwrap();
        assert_eq!(selector, ChannelSelector::Adc2(7));
        assert_eq!(selector.to_string(), "ADC2_CH7");
    }

    #[test]
    fn test_channel_selector_both_set_is_error() {
        let result = ChannelSelector::from_options(Some(0), Some(1));
        assert!(matches!(result, Err(ConfigError::ConflictingChannels(0, 1))));
    }

    #[test]
    fn test_channel_selector_neither_set_is_error() {
        let result = ChannelSelector::from_options(None, None);
        assert!(matches!(result, Err(ConfigError::MissingChannel)));
    }

    #[test]
    fn test_attenuation_display() {
        assert_eq!(Attenuation::Db2_5.to_string(), "2.5dB");
        assert_eq!(AttenuationMode::Auto.to_string(), "auto");
        assert_eq!(AttenuationMode::Fixed(Attenuation::Db12).to_string(), "12dB");
    }
}
