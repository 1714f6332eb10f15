use super::*;

#[test]
fn editing_a_band_switches_flat_to_custom() {
    let mut eq = EqualizerSettings::default();
    assert_eq!(eq.preset, EqPreset::Flat);

    assert!(eq.set_gain(2, 6.0));
    assert_eq!(eq.preset, EqPreset::Custom);
    assert_eq!(eq.gains, [0.0, 0.0, 6.0, 0.0, 0.0]);
}

#[test]
fn bass_boost_preset_sets_its_gains() {
    let mut eq = EqualizerSettings::default();
    eq.set_preset(EqPreset::BassBoost);
    assert_eq!(eq.preset, EqPreset::BassBoost);
    assert_eq!(eq.gains, [10.0, 6.0, 2.0, 0.0, 0.0]);
    assert_eq!(eq.preset.to_string(), "Bass Boost");
}

#[test]
fn custom_preset_keeps_current_gains() {
    let mut eq = EqualizerSettings::default();
    eq.set_preset(EqPreset::Rock);
    eq.set_preset(EqPreset::Custom);
    assert_eq!(eq.preset, EqPreset::Custom);
    assert_eq!(eq.gains, [5.0, 3.0, -2.0, 4.0, 6.0]);
}

#[test]
fn gains_are_clamped_and_bad_input_rejected() {
    let mut eq = EqualizerSettings::default();
    assert!(eq.set_gain(0, 40.0));
    assert_eq!(eq.gain(0), Some(MAX_GAIN_DB));
    assert!(eq.nudge_gain(4, -30.0));
    assert_eq!(eq.gain(4), Some(MIN_GAIN_DB));

    let before = eq.clone();
    assert!(!eq.set_gain(1, f32::NAN));
    assert!(!eq.set_gain(BAND_COUNT, 1.0));
    assert_eq!(eq, before);
}

#[test]
fn normalized_applies_named_preset_gains_and_sanitizes_custom() {
    let named = EqualizerSettings {
        preset: EqPreset::Treble,
        gains: [1.0; BAND_COUNT],
    }
    .normalized();
    assert_eq!(named.gains, [0.0, 0.0, 2.0, 6.0, 8.0]);

    let custom = EqualizerSettings {
        preset: EqPreset::Custom,
        gains: [f32::NAN, 99.0, -99.0, 3.0, 0.0],
    }
    .normalized();
    assert_eq!(custom.gains, [0.0, 12.0, -12.0, 3.0, 0.0]);
}

#[test]
fn preset_next_cycles_through_all() {
    let mut p = EqPreset::Flat;
    for _ in 0..EqPreset::ALL.len() {
        p = p.next();
    }
    assert_eq!(p, EqPreset::Flat);
    assert_eq!(EqPreset::Pop.next(), EqPreset::Custom);
}

#[test]
fn band_layout_is_fixed() {
    let freqs: Vec<f32> = BANDS.iter().map(|b| b.frequency_hz).collect();
    assert_eq!(freqs, vec![60.0, 250.0, 1_000.0, 4_000.0, 12_000.0]);
    assert_eq!(BANDS[0].kind, BandKind::LowShelf);
    assert_eq!(BANDS[4].kind, BandKind::HighShelf);
    assert!(BANDS[1..4].iter().all(|b| b.kind == BandKind::Peaking));
}
