//! オートレンジの減衰レベル選択（ハードウェア非依存の純粋関数）
//!
//! 選択規則: 観測電圧以上の公称フルスケールを持つ減衰レベルのうち、
//! フルスケールが最小のものを選ぶ（クリップせずに分解能を最大化）。
//! 該当するレベルがない場合は最も広い減衰レベルを返す。
//! 選択は読み取りごとに独立しており、前回の選択は引き継がない。

use super::{Attenuation, ADC_MAX_RAW};

/// 観測電圧（mV）に対して最適な減衰レベルを選択
pub fn select_attenuation(observed_mv: u32) -> Attenuation {
    Attenuation::SUPPORTED
        .iter()
        .copied()
        .find(|atten| atten.full_scale_mv() >= observed_mv)
        .unwrap_or_else(Attenuation::widest)
}

/// 生値が飽和しているか
pub fn is_saturated(raw: u16) -> bool {
    raw >= ADC_MAX_RAW
}
