//! ESP-IDF のワンショットADCドライバを使った実機実装

use anyhow::bail;
use esp_idf_svc::hal::{
    adc::{
        attenuation::{DB_0, DB_12},
        oneshot::{
            config::{AdcChannelConfig, Calibration},
            AdcChannelDriver, AdcDriver,
        },
    },
    gpio::ADCPin,
    peripheral::Peripheral,
};
#[cfg(not(esp32c2))]
use esp_idf_svc::hal::adc::attenuation::{DB_2_5, DB_6};
use esp_idf_svc::sys::{self, adc_atten_t, esp};
use log::{debug, warn};

use super::{
    AdcReader, Attenuation, CalibrationScheme, Characterization, ChannelSelector,
    FactoryCalibration, ADC_MAX_RAW,
};

fn to_idf_attenuation(attenuation: Attenuation) -> adc_atten_t {
    match attenuation {
        Attenuation::Db0 => DB_0,
        #[cfg(not(esp32c2))]
        Attenuation::Db2_5 => DB_2_5,
        #[cfg(not(esp32c2))]
        Attenuation::Db6 => DB_6,
        Attenuation::Db12 => DB_12,
    }
}

/// 1本のアナログピンを読み取るADCリーダー
///
/// 減衰レベルは読み取りごとに変わるため、チャンネルドライバは毎回作り直します。
/// 生値のみを返し、電圧への変換は特性テーブル側で行います。
pub struct EspAdcReader<'d, P: ADCPin> {
    adc: AdcDriver<'d, P::Adc>,
    pin: P,
    channel: ChannelSelector,
}

impl<'d, P: ADCPin> EspAdcReader<'d, P> {
    pub fn new(
        adc: impl Peripheral<P = P::Adc> + 'd,
        pin: P,
        channel: ChannelSelector,
    ) -> anyhow::Result<Self> {
        let adc = AdcDriver::new(adc)?;
        Ok(Self { adc, pin, channel })
    }
}

impl<P: ADCPin> AdcReader for EspAdcReader<'_, P> {
    fn read_raw(&mut self, channel: ChannelSelector, attenuation: Attenuation) -> anyhow::Result<u16> {
        if channel != self.channel {
            bail!("このリーダーは {} 専用です (要求: {})", self.channel, channel);
        }

        let config = AdcChannelConfig {
            attenuation: to_idf_attenuation(attenuation),
            calibration: Calibration::None,
            ..Default::default()
        };
        let mut driver = AdcChannelDriver::new(&self.adc, &mut self.pin, &config)?;
        let raw = driver.read_raw()?;

        Ok(raw.min(ADC_MAX_RAW))
    }
}

/// eFuse の工場出荷時校正データから特性を求める
///
/// ESP-IDF の校正スキーム（[`CalibrationScheme::TARGET`]）で2つの生値を電圧に変換し、
/// その2点を通る直線を特性とします。
#[derive(Debug, Clone, Copy, Default)]
pub struct EspFactoryCalibration;

/// 特性を求めるときに使う参照生値
const REFERENCE_RAW_LOW: u16 = 0;
const REFERENCE_RAW_HIGH: u16 = ADC_MAX_RAW;

impl EspFactoryCalibration {
    #[cfg(not(any(esp32, esp32s2, esp32c2)))]
    fn create_scheme(
        channel: ChannelSelector,
        attenuation: Attenuation,
    ) -> Result<sys::adc_cali_handle_t, sys::EspError> {
        let config = sys::adc_cali_curve_fitting_config_t {
            unit_id: unit_id(channel),
            chan: channel.channel() as sys::adc_channel_t,
            atten: to_idf_attenuation(attenuation),
            bitwidth: sys::adc_bitwidth_t_ADC_BITWIDTH_DEFAULT,
            ..Default::default()
        };
        let mut handle: sys::adc_cali_handle_t = core::ptr::null_mut();
        esp!(unsafe { sys::adc_cali_create_scheme_curve_fitting(&config, &mut handle) })?;
        Ok(handle)
    }

    #[cfg(not(any(esp32, esp32s2, esp32c2)))]
    fn delete_scheme(handle: sys::adc_cali_handle_t) {
        if let Err(e) = esp!(unsafe { sys::adc_cali_delete_scheme_curve_fitting(handle) }) {
            warn!("ADC校正スキームの解放に失敗しました: {:?}", e);
        }
    }

    #[cfg(any(esp32, esp32s2, esp32c2))]
    fn create_scheme(
        channel: ChannelSelector,
        attenuation: Attenuation,
    ) -> Result<sys::adc_cali_handle_t, sys::EspError> {
        #[allow(unused_mut)]
        let mut config = sys::adc_cali_line_fitting_config_t {
            unit_id: unit_id(channel),
            atten: to_idf_attenuation(attenuation),
            bitwidth: sys::adc_bitwidth_t_ADC_BITWIDTH_DEFAULT,
            ..Default::default()
        };
        // eFuse に Vref がない esp32 用（他のチップにはこのフィールドがない）
        #[cfg(esp32)]
        {
            config.default_vref = 1100;
        }
        let mut handle: sys::adc_cali_handle_t = core::ptr::null_mut();
        esp!(unsafe { sys::adc_cali_create_scheme_line_fitting(&config, &mut handle) })?;
        Ok(handle)
    }

    #[cfg(any(esp32, esp32s2, esp32c2))]
    fn delete_scheme(handle: sys::adc_cali_handle_t) {
        if let Err(e) = esp!(unsafe { sys::adc_cali_delete_scheme_line_fitting(handle) }) {
            warn!("ADC校正スキームの解放に失敗しました: {:?}", e);
        }
    }

    fn raw_to_mv(handle: sys::adc_cali_handle_t, raw: u16) -> Result<u32, sys::EspError> {
        let mut mv: i32 = 0;
        esp!(unsafe { sys::adc_cali_raw_to_voltage(handle, raw as i32, &mut mv) })?;
        Ok(mv.max(0) as u32)
    }
}

fn unit_id(channel: ChannelSelector) -> sys::adc_unit_t {
    match channel {
        ChannelSelector::Adc1(_) => sys::adc_unit_t_ADC_UNIT_1,
        ChannelSelector::Adc2(_) => sys::adc_unit_t_ADC_UNIT_2,
    }
}

impl FactoryCalibration for EspFactoryCalibration {
    fn characterize(
        &mut self,
        channel: ChannelSelector,
        attenuation: Attenuation,
    ) -> Option<Characterization> {
        let handle = match Self::create_scheme(channel, attenuation) {
            Ok(handle) => handle,
            Err(e) => {
                debug!(
                    "工場校正データがありません ({}, {}, {:?}): {:?}",
                    channel,
                    attenuation,
                    CalibrationScheme::TARGET,
                    e
                );
                return None;
            }
        };

        let points = Self::raw_to_mv(handle, REFERENCE_RAW_LOW)
            .and_then(|low| Ok((low, Self::raw_to_mv(handle, REFERENCE_RAW_HIGH)?)));
        Self::delete_scheme(handle);

        match points {
            Ok((low_mv, high_mv)) => Characterization::from_reference_points(
                (REFERENCE_RAW_LOW, low_mv),
                (REFERENCE_RAW_HIGH, high_mv),
            ),
            Err(e) => {
                warn!("工場校正データの変換に失敗しました ({}, {}): {:?}", channel, attenuation, e);
                None
            }
        }
    }
}
