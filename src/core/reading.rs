/// pH の物理的な範囲（妥当性チェック用、クランプはしない）
pub const PH_MIN: f32 = 0.0;
pub const PH_MAX: f32 = 14.0;

/// 1回の測定結果（ハードウェア非依存）
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// 平均化後の電圧（V）
    pub voltage: f32,
    /// 校正後の pH（電圧出力モードでは `None`）
    pub ph: Option<f32>,
    /// 測定の信頼性（true: 正常、false: 警告あり）
    pub is_reliable: bool,
    /// 警告メッセージ（ある場合）
    pub warning_message: Option<String>,
}

impl Reading {
    pub fn new(voltage: f32, ph: Option<f32>) -> Self {
        Self {
            voltage,
            ph,
            is_reliable: true,
            warning_message: None,
        }
    }

    /// 外部に公開する値（pH、電圧出力モードでは電圧）
    pub fn value(&self) -> f32 {
        self.ph.unwrap_or(self.voltage)
    }

    /// 測定値の妥当性を検証して結果を反映
    ///
    /// 値そのものは変更しません。範囲外の値は警告として記録するだけです。
    pub fn validated(mut self, signal_voltage: f32) -> Self {
        let (is_reliable, warning) = self.check(signal_voltage);
        self.is_reliable = is_reliable;
        self.warning_message = warning;
        self
    }

    fn check(&self, signal_voltage: f32) -> (bool, Option<String>) {
        if !self.voltage.is_finite() {
            return (false, Some("電圧が数値ではありません".to_string()));
        }

        if self.voltage < 0.0 {
            return (false, Some(format!("電圧が負の値です: {:.3}V", self.voltage)));
        }

        if self.voltage > signal_voltage {
            return (
                false,
                Some(format!(
                    "電圧が信号電圧を超えています: {:.3}V > {:.3}V",
                    self.voltage, signal_voltage
                )),
            );
        }

        if let Some(ph) = self.ph {
            if !(PH_MIN..=PH_MAX).contains(&ph) {
                return (
                    false,
                    Some(format!("pH値が範囲外です: {:.2} - 校正点を確認してください", ph)),
                );
            }
        }

        (true, None)
    }

    /// 測定データのサマリを取得
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("電圧:{:.3}V", self.voltage)];

        if let Some(ph) = self.ph {
            parts.push(format!("pH:{:.2}", ph));
        }

        if let Some(ref msg) = self.warning_message {
            parts.push(format!("警告:{}", msg));
        }

        parts.join(", ")
    }
}
