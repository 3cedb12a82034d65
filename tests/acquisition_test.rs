// ADC取得パイプラインの統合テスト（MockAdc を使用）

use ph4502c_sensor::hardware::adc::{
    AcquisitionConfig, AcquisitionEngine, Attenuation, AttenuationMode, AveragingMode,
    Characterization, CharacterizationOrigin, ChannelSelector, NoFactoryCalibration,
};
use ph4502c_sensor::hardware::mock::{MockAdc, MockFactoryCalibration};

fn ready_engine(mock: &MockAdc, config: AcquisitionConfig) -> AcquisitionEngine<MockAdc> {
    let mut engine = AcquisitionEngine::new(mock.clone(), config);
    engine.setup(&mut NoFactoryCalibration);
    engine
}

fn fixed(atten: Attenuation) -> AcquisitionConfig {
    AcquisitionConfig::new(ChannelSelector::Adc1(0), AttenuationMode::Fixed(atten))
}

fn auto() -> AcquisitionConfig {
    AcquisitionConfig::new(ChannelSelector::Adc1(0), AttenuationMode::Auto)
}

/// デフォルト特性で widest レベルを読んだときの電圧（mV）
fn widest_mv(input_mv: u32) -> u32 {
    let widest = Attenuation::widest();
    Characterization::default_for(widest).raw_to_mv(MockAdc::raw_for(input_mv, widest))
}

#[test]
fn test_single_sample_returns_raw_reading_unchanged() {
    let reference = MockAdc::with_input_mv(1234);
    let mut reference_engine = ready_engine(&reference, fixed(Attenuation::Db12));
    let raw_voltage = reference_engine.acquire_raw_sample().unwrap();

    let mock = MockAdc::with_input_mv(1234);
    let mut engine = ready_engine(&mock, fixed(Attenuation::Db12));
    let averaged = engine.acquire_averaged_sample().unwrap();

    assert_eq!(averaged, raw_voltage);
    assert_eq!(mock.read_count(), 1);
}

#[test]
fn test_identical_readings_average_without_drift() {
    let reference = MockAdc::with_input_mv(1777);
    let mut reference_engine = ready_engine(&reference, fixed(Attenuation::Db12));
    let x = reference_engine.acquire_raw_sample().unwrap();

    for n in [2u8, 3, 7, 10, 64, 255] {
        let mock = MockAdc::with_input_mv(1777);
        let config = fixed(Attenuation::Db12).with_sample_count(n).unwrap();
        let mut engine = ready_engine(&mock, config);

        assert_eq!(engine.acquire_averaged_sample().unwrap(), x, "sample_count={}", n);
        assert_eq!(mock.read_count(), n as usize);
    }
}

#[test]
fn test_averaged_sample_is_arithmetic_mean() {
    let mock = MockAdc::new();
    let config = fixed(Attenuation::Db12).with_sample_count(4).unwrap();
    let mut engine = ready_engine(&mock, config);

    // 0, 4095 を2回ずつ → (0 + 2.45 + 0 + 2.45) / 4
    for raw in [0, 4095, 0, 4095] {
        mock.queue_raw(raw);
    }
    let voltage = engine.acquire_averaged_sample().unwrap();
    assert!((voltage - 1.225).abs() < 1e-6);
}

#[test]
fn test_oneshot_mode_does_not_carry_previous_samples() {
    let mock = MockAdc::new();
    let config = fixed(Attenuation::Db12).with_sample_count(2).unwrap();
    let mut engine = ready_engine(&mock, config);

    for raw in [4095, 4095] {
        mock.queue_raw(raw);
    }
    assert_eq!(engine.acquire_averaged_sample().unwrap(), 2.45);

    for raw in [0, 0] {
        mock.queue_raw(raw);
    }
    assert_eq!(engine.acquire_averaged_sample().unwrap(), 0.0);
}

#[test]
fn test_rolling_mode_averages_over_window() {
    let mock = MockAdc::new();
    let config = fixed(Attenuation::Db12).with_averaging(AveragingMode::Rolling { window: 2 });
    let mut engine = ready_engine(&mock, config);

    mock.queue_raw(4095);
    assert_eq!(engine.acquire_averaged_sample().unwrap(), 2.45);

    mock.queue_raw(0);
    let voltage = engine.acquire_averaged_sample().unwrap();
    assert!((voltage - 1.225).abs() < 1e-6);

    // 最も古い 2.45V が押し出される
    mock.queue_raw(0);
    assert_eq!(engine.acquire_averaged_sample().unwrap(), 0.0);
}

#[test]
fn test_outlier_trim_discards_spikes() {
    let mock = MockAdc::new();
    let config = fixed(Attenuation::Db12)
        .with_sample_count(5)
        .unwrap()
        .with_outlier_trim(1);
    let mut engine = ready_engine(&mock, config);

    let steady = MockAdc::raw_for(1500, Attenuation::Db12);
    for raw in [steady, 0, steady, 4095, steady] {
        mock.queue_raw(raw);
    }

    let expected = Characterization::default_for(Attenuation::Db12).raw_to_mv(steady) as f32 / 1000.0;
    assert_eq!(engine.acquire_averaged_sample().unwrap(), expected);
}

#[test]
fn test_autorange_never_selects_full_scale_below_observed_voltage() {
    for input_mv in [50, 500, 900, 950, 1000, 1249, 1300, 1700, 1751, 2000, 2400] {
        let mock = MockAdc::with_input_mv(input_mv);
        let mut engine = ready_engine(&mock, auto());

        engine.acquire_raw_sample().unwrap();

        let reads = mock.get_reads();
        let (_, first) = reads[0];
        let (_, last) = reads[reads.len() - 1];
        assert_eq!(first, Attenuation::widest());
        assert!(
            last.full_scale_mv() >= widest_mv(input_mv),
            "input={}mV, selected={}",
            input_mv,
            last
        );
    }
}

#[test]
fn test_autorange_prefers_smallest_sufficient_range() {
    let mock = MockAdc::with_input_mv(500);
    let mut engine = ready_engine(&mock, auto());

    let voltage = engine.acquire_raw_sample().unwrap();

    let reads: Vec<Attenuation> = mock.get_reads().into_iter().map(|(_, a)| a).collect();
    assert_eq!(reads, vec![Attenuation::Db12, Attenuation::Db0]);
    assert!((voltage - 0.5).abs() < 0.001);
}

#[test]
fn test_autorange_all_levels_saturated_falls_back_to_widest() {
    let mock = MockAdc::with_input_mv(3300);
    let mut engine = ready_engine(&mock, auto());

    let voltage = engine.acquire_raw_sample().unwrap();

    assert_eq!(voltage, Attenuation::widest().full_scale_mv() as f32 / 1000.0);
    assert_eq!(mock.read_count(), 1);
}

#[test]
fn test_autorange_steps_wider_on_saturation() {
    let mock = MockAdc::new();
    let mut engine = ready_engine(&mock, auto());

    // 最大減衰では 900mV → 0dB を選択するが、0dB で飽和
    mock.queue_raw(MockAdc::raw_for(900, Attenuation::Db12));
    mock.queue_raw(4095);
    let next = Attenuation::Db0.next_wider().unwrap();
    mock.queue_raw(MockAdc::raw_for(930, next));

    let voltage = engine.acquire_raw_sample().unwrap();

    let reads: Vec<Attenuation> = mock.get_reads().into_iter().map(|(_, a)| a).collect();
    assert_eq!(reads, vec![Attenuation::Db12, Attenuation::Db0, next]);
    assert!((voltage - 0.93).abs() < 0.001);
}

#[test]
fn test_autorange_choice_is_not_persisted() {
    let mock = MockAdc::with_input_mv(2000);
    let mut engine = ready_engine(&mock, auto());
    engine.acquire_raw_sample().unwrap();

    mock.clear_reads();
    mock.set_input_mv(300);
    engine.acquire_raw_sample().unwrap();

    let reads: Vec<Attenuation> = mock.get_reads().into_iter().map(|(_, a)| a).collect();
    assert_eq!(reads, vec![Attenuation::Db12, Attenuation::Db0]);
}

#[test]
fn test_missing_factory_data_falls_back_to_default() {
    let mock = MockAdc::new();
    let factory = MockFactoryCalibration::new();
    let factory_cal = Characterization::from_reference_points((0, 60), (4095, 2600)).unwrap();
    factory.insert(Attenuation::Db12, factory_cal);

    let mut engine = AcquisitionEngine::new(mock.clone(), auto());
    let mut factory_handle = factory.clone();
    engine.setup(&mut factory_handle);

    let table = engine.characterization_table().unwrap();
    assert_eq!(table.len(), Attenuation::COUNT);
    assert_eq!(table.get(Attenuation::Db12).unwrap().origin, CharacterizationOrigin::Factory);
    assert_eq!(table.get(Attenuation::Db0).unwrap().origin, CharacterizationOrigin::Default);
    assert_eq!(factory.get_requests().len(), Attenuation::COUNT);

    // 飽和した読み取りは工場特性で変換される
    mock.queue_raw(4095);
    let voltage = engine.acquire_raw_sample().unwrap();
    assert_eq!(voltage, factory_cal.raw_to_mv(4095) as f32 / 1000.0);
}

#[test]
fn test_fixed_attenuation_builds_single_level() {
    let mock = MockAdc::new();
    let factory = MockFactoryCalibration::new();
    let mut engine = AcquisitionEngine::new(mock, fixed(Attenuation::Db0));
    let mut factory_handle = factory.clone();
    engine.setup(&mut factory_handle);

    assert_eq!(engine.characterization_table().unwrap().len(), 1);
    assert_eq!(
        factory.get_requests(),
        vec![(ChannelSelector::Adc1(0), Attenuation::Db0)]
    );
}

#[test]
fn test_read_error_propagates() {
    let mock = MockAdc::new();
    let config = fixed(Attenuation::Db12).with_sample_count(3).unwrap();
    let mut engine = ready_engine(&mock, config);

    mock.set_read_error(true);
    assert!(engine.acquire_averaged_sample().is_err());
}

#[test]
fn test_adc2_channel_is_forwarded_to_reader() {
    let mock = MockAdc::with_input_mv(1000);
    let config = AcquisitionConfig::configure(
        None,
        Some(3),
        AttenuationMode::Fixed(Attenuation::Db12),
        1,
    )
    .unwrap();
    let mut engine = ready_engine(&mock, config);

    engine.acquire_raw_sample().unwrap();
    assert_eq!(mock.get_reads(), vec![(ChannelSelector::Adc2(3), Attenuation::Db12)]);
}
