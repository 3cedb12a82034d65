//! pH 校正エンジン（ハードウェア非依存）
//!
//! 校正点 (電圧, pH) に最小二乗法で直線を当てはめ、測定電圧を pH に変換します。
//! モデルは常に校正点の重心 (平均電圧, 平均pH) を通ります。
//!
//! 校正電圧がすべて同じ場合は傾きを0とし、出力は平均pHで一定になります。
//! 変換結果のクランプは行いません。

use log::{info, warn};

use crate::core::config::ConfigError;

/// 校正点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    /// 電圧（V）
    pub voltage: f32,
    pub ph: f32,
}

impl CalibrationPoint {
    pub fn new(voltage: f32, ph: f32) -> Self {
        Self { voltage, ph }
    }
}

/// 検証済みの校正点の集合（2点以上、順序不問、重複可）
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSet {
    points: Vec<CalibrationPoint>,
}

impl CalibrationSet {
    pub fn new(points: Vec<CalibrationPoint>) -> Result<Self, ConfigError> {
        if points.len() < 2 {
            return Err(ConfigError::TooFewCalibrationPoints(points.len()));
        }

        if let Some(index) = points
            .iter()
            .position(|p| !p.voltage.is_finite() || !p.ph.is_finite())
        {
            return Err(ConfigError::NonFiniteCalibrationPoint(index));
        }

        Ok(Self { points })
    }

    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// 校正モデル（直線 pH = slope * voltage + intercept）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationModel {
    pub slope: f32,
    pub intercept: f32,
    pub mean_voltage: f32,
    pub mean_ph: f32,
}

impl CalibrationModel {
    /// 校正点集合に直線を当てはめる
    pub fn fit(set: &CalibrationSet) -> Self {
        let points = set.points();
        let n = points.len() as f64;

        let mean_voltage = points.iter().map(|p| p.voltage as f64).sum::<f64>() / n;
        let mean_ph = points.iter().map(|p| p.ph as f64).sum::<f64>() / n;

        let (numerator, denominator) = points.iter().fold((0.0f64, 0.0f64), |(num, den), p| {
            let dv = p.voltage as f64 - mean_voltage;
            let dph = p.ph as f64 - mean_ph;
            (num + dv * dph, den + dv * dv)
        });

        let slope = if denominator == 0.0 {
            warn!(
                "校正電圧がすべて同じです ({:.3}V)。pH は平均値 {:.2} で一定になります",
                mean_voltage, mean_ph
            );
            0.0
        } else {
            numerator / denominator
        };
        let intercept = mean_ph - slope * mean_voltage;

        Self {
            slope: slope as f32,
            intercept: intercept as f32,
            mean_voltage: mean_voltage as f32,
            mean_ph: mean_ph as f32,
        }
    }

    /// 電圧から pH を計算（クランプなし）
    pub fn evaluate(&self, voltage: f32) -> f32 {
        (self.slope as f64 * voltage as f64 + self.intercept as f64) as f32
    }

    /// 傾きが0（全校正電圧が同一）のモデルか
    pub fn is_flat(&self) -> bool {
        self.slope == 0.0
    }
}

/// 校正点の集合から直線モデルを作成
///
/// # Errors
/// 校正点が2点未満、または有限でない値を含む場合は [`ConfigError`]
pub fn fit(points: &[CalibrationPoint]) -> Result<CalibrationModel, ConfigError> {
    let set = CalibrationSet::new(points.to_vec())?;
    Ok(CalibrationModel::fit(&set))
}

/// 校正モデルで電圧を pH に変換
pub fn evaluate(model: &CalibrationModel, voltage: f32) -> f32 {
    model.evaluate(voltage)
}

/// 校正エラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalibrationError {
    #[error("校正モデルが未計算です (setup 前に評価されました)")]
    NotFitted,
}

/// 校正モデルの状態
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationState {
    /// モデル未計算（評価不可）
    Unfit,
    /// モデル計算済み
    Fit(CalibrationModel),
}

/// 電圧 → pH 変換のトレイト
///
/// センサーと校正エンジンの境界です。テストでは呼び出しを記録する実装に差し替えます。
pub trait PhConverter {
    /// 校正モデルを計算する（セットアップ時に1回）
    fn fit(&mut self) -> Result<(), ConfigError>;

    /// 電圧を pH に変換する
    fn to_ph(&self, voltage: f32) -> Result<f32, CalibrationError>;

    /// 設定表示用の説明
    fn describe(&self) -> String;
}

/// 校正点と校正モデルの状態を保持する pH 校正器
#[derive(Debug, Clone)]
pub struct PhCalibration {
    points: Vec<CalibrationPoint>,
    state: CalibrationState,
}

impl PhCalibration {
    /// 未計算状態で作成（モデルは `fit` で計算）
    pub fn new(points: Vec<CalibrationPoint>) -> Self {
        Self {
            points,
            state: CalibrationState::Unfit,
        }
    }

    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn model(&self) -> Option<&CalibrationModel> {
        match &self.state {
            CalibrationState::Fit(model) => Some(model),
            CalibrationState::Unfit => None,
        }
    }

    /// 校正点を丸ごと置き換えてモデルを再計算
    ///
    /// 新しい校正点が無効な場合はエラーを返し、以前の校正点とモデルを保持します。
    pub fn replace_points(&mut self, points: Vec<CalibrationPoint>) -> Result<(), ConfigError> {
        let set = CalibrationSet::new(points)?;
        let model = CalibrationModel::fit(&set);
        info!(
            "校正点を置き換えました ({}点): slope={:.4}, intercept={:.4}",
            set.len(),
            model.slope,
            model.intercept
        );

        self.points = set.points().to_vec();
        self.state = CalibrationState::Fit(model);
        Ok(())
    }
}

impl PhConverter for PhCalibration {
    fn fit(&mut self) -> Result<(), ConfigError> {
        let model = fit(&self.points)?;
        info!(
            "✓ 校正モデルを計算しました ({}点): slope={:.4}, intercept={:.4}",
            self.points.len(),
            model.slope,
            model.intercept
        );
        self.state = CalibrationState::Fit(model);
        Ok(())
    }

    fn to_ph(&self, voltage: f32) -> Result<f32, CalibrationError> {
        self.model()
            .map(|model| model.evaluate(voltage))
            .ok_or(CalibrationError::NotFitted)
    }

    fn describe(&self) -> String {
        match self.model() {
            Some(model) => format!(
                "校正点:{}点, 傾き:{:.4}, 切片:{:.4}{}",
                self.points.len(),
                model.slope,
                model.intercept,
                if model.is_flat() { " (一定)" } else { "" }
            ),
            None => format!("校正点:{}点, 未計算", self.points.len()),
        }
    }
}
