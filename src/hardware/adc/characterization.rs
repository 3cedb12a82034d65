//! 減衰レベルごとのADC特性（生値 → 電圧変換）
//!
//! 特性は固定小数点の直線で表現します:
//! `mV = (coeff_a * raw + GAIN_SCALE / 2) / GAIN_SCALE + coeff_b`
//!
//! 工場出荷時の校正データ（eFuse）が取得できない減衰レベルは、
//! 公称フルスケールに基づくデフォルト特性で代替します。

use log::{info, warn};

use super::{Attenuation, ChannelSelector, ADC_MAX_RAW};

/// 係数の固定小数点スケール
pub const GAIN_SCALE: u32 = 1 << 16;

/// 特性データの出所
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterizationOrigin {
    /// 工場出荷時の校正データ
    Factory,
    /// 公称フルスケールから求めたデフォルト値
    Default,
}

/// 1つの減衰レベルに対するADC特性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Characterization {
    /// 傾き（mV/count、GAIN_SCALE倍）
    pub coeff_a: u32,
    /// オフセット（mV）
    pub coeff_b: u32,
    pub origin: CharacterizationOrigin,
}

impl Characterization {
    /// 公称フルスケールに基づくデフォルト特性
    ///
    /// 生値0を0mV、生値4095をフルスケール電圧とする直線です。
    pub fn default_for(attenuation: Attenuation) -> Self {
        let full_scale = attenuation.full_scale_mv() as u64;
        let max_raw = ADC_MAX_RAW as u64;
        let coeff_a = (full_scale * GAIN_SCALE as u64 + max_raw / 2) / max_raw;

        Self {
            coeff_a: coeff_a as u32,
            coeff_b: 0,
            origin: CharacterizationOrigin::Default,
        }
    }

    /// 2つの参照点 (生値, mV) を通る工場特性を作成
    ///
    /// 生値が同じ、または電圧が減少する参照点からは特性を作れないため `None` を返します。
    pub fn from_reference_points(low: (u16, u32), high: (u16, u32)) -> Option<Self> {
        let (raw_lo, mv_lo) = low;
        let (raw_hi, mv_hi) = high;
        if raw_hi <= raw_lo || mv_hi < mv_lo {
            return None;
        }

        let span_raw = (raw_hi - raw_lo) as u64;
        let span_mv = (mv_hi - mv_lo) as u64;
        let coeff_a = (span_mv * GAIN_SCALE as u64 + span_raw / 2) / span_raw;

        // 直線を生値0まで延長したときのオフセット（負にはしない）
        let offset_at_lo = (coeff_a * raw_lo as u64 + (GAIN_SCALE / 2) as u64) / GAIN_SCALE as u64;
        let coeff_b = (mv_lo as u64).saturating_sub(offset_at_lo);

        Some(Self {
            coeff_a: coeff_a as u32,
            coeff_b: coeff_b as u32,
            origin: CharacterizationOrigin::Factory,
        })
    }

    /// 生値を電圧（mV）に変換
    pub fn raw_to_mv(&self, raw: u16) -> u32 {
        let scaled = (self.coeff_a as u64 * raw as u64 + (GAIN_SCALE / 2) as u64) / GAIN_SCALE as u64;
        scaled as u32 + self.coeff_b
    }
}

/// ESP-IDF の工場校正スキーム
///
/// チップごとに使えるスキームが1つだけ決まっています。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationScheme {
    /// 直線近似（esp32 / esp32s2 / esp32c2）
    LineFitting,
    /// 曲線近似（esp32s3 / esp32c3 / esp32c6 / esp32h2 / esp32p4）
    CurveFitting,
}

impl CalibrationScheme {
    /// ビルド対象チップのスキーム
    #[cfg(any(esp32, esp32s2, esp32c2))]
    pub const TARGET: Self = CalibrationScheme::LineFitting;

    /// ビルド対象チップのスキーム
    #[cfg(not(any(esp32, esp32s2, esp32c2)))]
    pub const TARGET: Self = CalibrationScheme::CurveFitting;

    /// チップ名からスキームを判定（未知のチップは `None`）
    pub fn for_chip(chip: &str) -> Option<Self> {
        match chip {
            "esp32" | "esp32s2" | "esp32c2" => Some(CalibrationScheme::LineFitting),
            "esp32s3" | "esp32c3" | "esp32c6" | "esp32h2" | "esp32p4" => {
                Some(CalibrationScheme::CurveFitting)
            }
            _ => None,
        }
    }
}

/// 工場出荷時の特性データを提供するトレイト
///
/// 実機では ESP-IDF の校正スキームから、ホストでは [`NoFactoryCalibration`] を使用します。
pub trait FactoryCalibration {
    /// 指定チャンネル・減衰レベルの工場特性を返す（データがない場合は `None`）
    fn characterize(
        &mut self,
        channel: ChannelSelector,
        attenuation: Attenuation,
    ) -> Option<Characterization>;
}

/// 工場特性データを持たないプラットフォーム用
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFactoryCalibration;

impl FactoryCalibration for NoFactoryCalibration {
    fn characterize(&mut self, _: ChannelSelector, _: Attenuation) -> Option<Characterization> {
        None
    }
}

/// 減衰レベル → 特性のテーブル
///
/// セットアップ時に一度だけ構築され、以降は読み取り専用です。
#[derive(Debug, Clone)]
pub struct CharacterizationTable {
    entries: [Option<Characterization>; Attenuation::COUNT],
}

impl CharacterizationTable {
    /// 指定された減衰レベルの特性を構築
    ///
    /// 工場特性がない減衰レベルはデフォルト特性で代替します（エラーにはしません）。
    pub fn build<F: FactoryCalibration + ?Sized>(
        channel: ChannelSelector,
        levels: &[Attenuation],
        factory: &mut F,
    ) -> Self {
        let mut entries = [None; Attenuation::COUNT];

        for &atten in levels {
            let characterization = match factory.characterize(channel, atten) {
                Some(cal) => {
                    info!(
                        "✓ 工場特性を使用します ({}, {}): a={}, b={}mV",
                        channel, atten, cal.coeff_a, cal.coeff_b
                    );
                    cal
                }
                None => {
                    warn!(
                        "工場特性が見つかりません ({}, {})。デフォルト特性を使用します",
                        channel, atten
                    );
                    Characterization::default_for(atten)
                }
            };
            entries[atten.index()] = Some(characterization);
        }

        Self { entries }
    }

    /// 構築済みの特性を取得
    pub fn get(&self, attenuation: Attenuation) -> Option<&Characterization> {
        self.entries[attenuation.index()].as_ref()
    }

    /// 特性を取得（未構築の減衰レベルはデフォルト特性）
    pub fn lookup(&self, attenuation: Attenuation) -> Characterization {
        self.get(attenuation)
            .copied()
            .unwrap_or_else(|| Characterization::default_for(attenuation))
    }

    /// 構築済みの減衰レベル数
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
