#[cfg(any(target_arch = "riscv32", target_arch = "xtensa"))]
fn main() -> anyhow::Result<()> {
    use esp_idf_svc::hal::{delay::FreeRtos, peripherals::Peripherals};
    use log::{error, info};
    use ph4502c_sensor::hardware::adc::esp::{EspAdcReader, EspFactoryCalibration};
    use ph4502c_sensor::hardware::board::ensure_wired;
    use ph4502c_sensor::{AcquisitionEngine, AppConfig, PhCalibration, PhSensor};

    // ESP-IDFの基本初期化
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("PH-4502C pH センサー v{}", ph4502c_sensor::VERSION);

    // 設定ファイル読み込み
    let app_config = AppConfig::load().map_err(|e| {
        error!("設定ファイルの読み込みに失敗しました: {}", e);
        anyhow::anyhow!("設定ファイルの読み込みエラー: {}", e)
    })?;

    info!("ペリフェラルを初期化しています");
    let peripherals = Peripherals::take()?;

    // XIAO ESP32S3 の A0 (GPIO1) = ADC1_CH0
    let channel = app_config.acquisition.channel;
    ensure_wired(channel).map_err(|e| {
        error!("{}", e);
        anyhow::anyhow!("チャンネル設定エラー: {}", e)
    })?;
    let reader = EspAdcReader::new(peripherals.adc1, peripherals.pins.gpio1, channel)?;

    let engine = AcquisitionEngine::new(reader, app_config.acquisition.clone());
    let calibration = PhCalibration::new(app_config.calibration_points.clone());
    let mut sensor = PhSensor::new(engine, calibration, app_config.output_raw)
        .with_signal_voltage(app_config.signal_voltage);

    sensor.setup(&mut EspFactoryCalibration).map_err(|e| {
        error!("pH センサーのセットアップに失敗しました: {}", e);
        anyhow::anyhow!("セットアップエラー: {}", e)
    })?;
    info!("{}", sensor.describe());

    let interval_ms = app_config.update_interval_seconds.saturating_mul(1000);
    let interval_ms = u32::try_from(interval_ms).unwrap_or(u32::MAX);

    info!("=== 測定ループを開始します ({}秒間隔) ===", app_config.update_interval_seconds);
    loop {
        if let Err(e) = sensor.update() {
            error!("pH 測定に失敗しました: {:?}", e);
        }
        FreeRtos::delay_ms(interval_ms);
    }
}

#[cfg(not(any(target_arch = "riscv32", target_arch = "xtensa")))]
fn main() {
    eprintln!(
        "ph4502c_sensor v{} は ESP32 ターゲット専用です。ホストでは `cargo test` でロジックを検証してください。",
        ph4502c_sensor::VERSION
    );
}
