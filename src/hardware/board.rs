//! ボード配線（XIAO ESP32S3）

use crate::core::config::ConfigError;
use crate::hardware::adc::ChannelSelector;

/// pH プローブの信号線が接続されているチャンネル（A0 = GPIO1 = ADC1_CH0）
pub const PH_SIGNAL_CHANNEL: ChannelSelector = ChannelSelector::Adc1(0);

/// 設定されたチャンネルがボードに配線されているか確認
pub fn ensure_wired(channel: ChannelSelector) -> Result<(), ConfigError> {
    if channel == PH_SIGNAL_CHANNEL {
        Ok(())
    } else {
        Err(ConfigError::UnwiredChannel(channel))
    }
}
