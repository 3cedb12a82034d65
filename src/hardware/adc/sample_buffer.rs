/// 直近の電圧読み取りを保持する固定長リングバッファ
///
/// 動的確保は行わず、固定長配列とカーソルで管理します。
/// `window` を超えて追加すると最も古い値から上書きされます。
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    values: [f32; SAMPLE_BUFFER_CAPACITY],
    window: usize,
    len: usize,
    cursor: usize,
}

/// バッファの最大長（sample_count の上限 255 と同じ）
pub const SAMPLE_BUFFER_CAPACITY: usize = 255;

/// ローリング平均のデフォルト窓長
pub const DEFAULT_ROLLING_WINDOW: u8 = 10;

impl SampleBuffer {
    /// 窓長を指定してバッファを作成（1..=SAMPLE_BUFFER_CAPACITY に丸める）
    pub fn new(window: usize) -> Self {
        Self {
            values: [0.0; SAMPLE_BUFFER_CAPACITY],
            window: window.clamp(1, SAMPLE_BUFFER_CAPACITY),
            len: 0,
            cursor: 0,
        }
    }

    pub fn push(&mut self, value: f32) {
        self.values[self.cursor] = value;
        self.cursor = (self.cursor + 1) % self.window;
        self.len = (self.len + 1).min(self.window);
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// 保持中の値（順序は保証しない）
    pub fn as_slice(&self) -> &[f32] {
        &self.values[..self.len]
    }

    /// 外れ値を除いた平均
    ///
    /// 値が `2 * trim` 個より多い場合は、昇順に並べて両端から `trim` 個ずつ除外します。
    /// それ以外は単純平均です。空の場合は `None`。
    pub fn mean(&self, trim: usize) -> Option<f32> {
        if self.is_empty() {
            return None;
        }

        if trim == 0 || self.len <= trim * 2 {
            return Some(offset_mean(self.as_slice()));
        }

        let mut sorted = [0.0f32; SAMPLE_BUFFER_CAPACITY];
        let sorted = &mut sorted[..self.len];
        sorted.copy_from_slice(self.as_slice());
        sorted.sort_unstable_by(f32::total_cmp);

        Some(offset_mean(&sorted[trim..self.len - trim]))
    }
}

/// 先頭値からの差分で平均を計算
///
/// 同じ値が並ぶ場合は差分がすべて0になるため、入力値がそのまま返ります。
fn offset_mean(values: &[f32]) -> f32 {
    let first = values[0];
    let deviation: f32 = values[1..].iter().map(|v| v - first).sum();
    first + deviation / values.len() as f32
}
