/// ハードウェア制御モジュール
pub mod adc;
pub mod board;

// Mock実装（テストとホストでの動作確認で使用可能）
pub mod mock;

pub use adc::{AcquisitionEngine, AdcReader, Attenuation, AttenuationMode, ChannelSelector};
