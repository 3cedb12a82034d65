use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::bail;

use super::adc::{
    AdcReader, Attenuation, Characterization, ChannelSelector, FactoryCalibration, ADC_MAX_RAW,
};

/// テスト用のADCモック実装
///
/// 実際のADCハードウェアを使わずに変換をシミュレートします。
/// 読み取り要求（チャンネル、減衰レベル）を記録し、テストで検証できます。
///
/// 生値は以下の優先順で決まります:
/// 1. `queue_raw` でキューに積まれた値（先頭から取り出される）
/// 2. `set_input_mv` で設定した入力電圧を、減衰レベルの公称フルスケールで変換した値
#[derive(Debug, Clone, Default)]
pub struct MockAdc {
    /// 読み取り用の生値キュー
    pub raw_queue: Arc<Mutex<VecDeque<u16>>>,
    /// シミュレートする入力電圧（mV）
    pub input_mv: Arc<Mutex<u32>>,
    /// 読み取り要求の記録
    pub reads: Arc<Mutex<Vec<(ChannelSelector, Attenuation)>>>,
    /// エラーシミュレーション用のフラグ
    pub simulate_read_error: Arc<Mutex<bool>>,
}

impl MockAdc {
    /// 新しいMockAdcインスタンスを作成します
    pub fn new() -> Self {
        Self::default()
    }

    /// 入力電圧を指定して作成
    pub fn with_input_mv(input_mv: u32) -> Self {
        let mock = Self::new();
        mock.set_input_mv(input_mv);
        mock
    }

    /// テスト用: 読み取り用の生値をキューに追加
    pub fn queue_raw(&self, raw: u16) {
        self.raw_queue.lock().unwrap().push_back(raw);
    }

    /// テスト用: 入力電圧を設定
    pub fn set_input_mv(&self, input_mv: u32) {
        *self.input_mv.lock().unwrap() = input_mv;
    }

    /// テスト用: 読み取り要求の記録を取得
    pub fn get_reads(&self) -> Vec<(ChannelSelector, Attenuation)> {
        self.reads.lock().unwrap().clone()
    }

    /// テスト用: 読み取り回数を取得
    pub fn read_count(&self) -> usize {
        self.reads.lock().unwrap().len()
    }

    /// テスト用: 読み取り記録をクリア
    pub fn clear_reads(&self) {
        self.reads.lock().unwrap().clear();
    }

    /// テスト用: 読み取りエラーをシミュレート
    pub fn set_read_error(&self, enable: bool) {
        *self.simulate_read_error.lock().unwrap() = enable;
    }

    /// 入力電圧を公称フルスケールで生値に変換（範囲外は飽和）
    pub fn raw_for(input_mv: u32, attenuation: Attenuation) -> u16 {
        let full_scale = attenuation.full_scale_mv() as u64;
        let max_raw = ADC_MAX_RAW as u64;
        let raw = (input_mv as u64 * max_raw + full_scale / 2) / full_scale;
        raw.min(max_raw) as u16
    }
}

impl AdcReader for MockAdc {
    fn read_raw(
        &mut self,
        channel: ChannelSelector,
        attenuation: Attenuation,
    ) -> anyhow::Result<u16> {
        if *self.simulate_read_error.lock().unwrap() {
            bail!("Simulated read error");
        }

        self.reads.lock().unwrap().push((channel, attenuation));

        if let Some(raw) = self.raw_queue.lock().unwrap().pop_front() {
            return Ok(raw);
        }

        let input_mv = *self.input_mv.lock().unwrap();
        Ok(Self::raw_for(input_mv, attenuation))
    }
}

/// テスト用の工場特性モック
///
/// 登録された減衰レベルだけ特性を返し、要求された減衰レベルを記録します。
#[derive(Debug, Clone, Default)]
pub struct MockFactoryCalibration {
    pub entries: Arc<Mutex<HashMap<Attenuation, Characterization>>>,
    pub requests: Arc<Mutex<Vec<(ChannelSelector, Attenuation)>>>,
}

impl MockFactoryCalibration {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト用: 減衰レベルの工場特性を登録
    pub fn insert(&self, attenuation: Attenuation, characterization: Characterization) {
        self.entries
            .lock()
            .unwrap()
            .insert(attenuation, characterization);
    }

    /// テスト用: 要求された減衰レベルの記録を取得
    pub fn get_requests(&self) -> Vec<(ChannelSelector, Attenuation)> {
        self.requests.lock().unwrap().clone()
    }
}

impl FactoryCalibration for MockFactoryCalibration {
    fn characterize(
        &mut self,
        channel: ChannelSelector,
        attenuation: Attenuation,
    ) -> Option<Characterization> {
        self.requests.lock().unwrap().push((channel, attenuation));
        self.entries.lock().unwrap().get(&attenuation).copied()
    }
}
