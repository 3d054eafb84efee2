use edgefx::{CpuBackend, FilterSettings, Host, ImageSequenceHost, params::Pass};
use image::{Rgba, RgbaImage};

mod common;
use common::{Counters, MockBackend, MockHost, square_frame};

fn outline_settings() -> FilterSettings {
    let mut settings = FilterSettings::default();
    settings.outline.enabled = true;
    settings.outline.color = 0x0000_00FF;
    settings.outline.width = 4.0;
    settings.outline.offset = 0.0;
    settings.outline.sharpness = 50.0;
    settings
}

/// Run `ticks` tick + render cycles and return the last presented frame.
fn run_ticks(filter: &mut edgefx::FilterInstance, host: &mut MockHost, ticks: usize) -> RgbaImage {
    for _ in 0..ticks {
        filter.on_tick(&*host, 1.0 / 60.0);
        filter.on_render(host, None);
    }
    host.output.clone().unwrap()
}

#[test]
fn second_render_in_a_tick_reuses_the_frame() {
    common::try_init_logger_for_default_harness();
    let counters = Counters::default();
    let backend = MockBackend::new(&counters);
    let mut filter = edgefx::create(&outline_settings(), &backend);
    let mut host = MockHost::new(square_frame(32, 8, 24), &counters);

    filter.on_tick(&host, 0.016);
    filter.on_render(&mut host, None);
    let first = host.output.clone().unwrap();
    filter.on_render(&mut host, None);
    let second = host.output.clone().unwrap();

    assert_eq!(first, second);
    assert_eq!(counters.captures.get(), 1);
    assert_eq!(counters.advances.get(), 1);
    assert_eq!(counters.presents.get(), 2);

    filter.on_tick(&host, 0.016);
    filter.on_render(&mut host, None);
    assert_eq!(counters.captures.get(), 2);
    assert_eq!(counters.advances.get(), 2);
    assert_eq!(counters.bypasses.get(), 0);
}

#[test]
fn disabled_effect_matches_never_enabled() {
    let frame = square_frame(48, 12, 36);
    let counters = Counters::default();

    let baseline = outline_settings();
    let mut toggled_off = outline_settings();
    toggled_off.outer_glow.enabled = false;
    toggled_off.outer_glow.color = 0x00AB_CDEF;
    toggled_off.outer_glow.alpha = 73.0;
    toggled_off.outer_glow.width = 11.0;
    toggled_off.outer_glow.sharpness = 99.0;
    toggled_off.inner_shadow.enabled = false;
    toggled_off.inner_shadow.range_min = -3.0;
    toggled_off.inner_shadow.offset_x = 40.0;

    let mut outputs = Vec::new();
    for settings in [&baseline, &toggled_off] {
        let backend = MockBackend::new(&counters);
        let mut filter = edgefx::create(settings, &backend);
        let mut host = MockHost::new(frame.clone(), &counters);
        outputs.push(run_ticks(&mut filter, &mut host, 6));
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn zero_alpha_is_a_disabled_effect() {
    let frame = square_frame(32, 8, 24);
    let counters = Counters::default();
    let mut settings = FilterSettings::default();
    settings.outer_glow.enabled = true;
    settings.outer_glow.alpha = 0.0;
    let backend = MockBackend::new(&counters);
    let mut filter = edgefx::create(&settings, &backend);
    let mut host = MockHost::new(frame.clone(), &counters);
    assert_eq!(run_ticks(&mut filter, &mut host, 4), frame);
}

#[test]
fn missing_producer_bypasses_every_frame() {
    let counters = Counters::default();
    let backend = MockBackend {
        fail_producer: true,
        ..MockBackend::new(&counters)
    };
    let mut filter = edgefx::create(&outline_settings(), &backend);
    let frame = square_frame(32, 8, 24);
    let mut host = MockHost::new(frame.clone(), &counters);

    let out = run_ticks(&mut filter, &mut host, 3);
    assert_eq!(out, frame);
    assert_eq!(counters.bypasses.get(), 3);
    assert_eq!(counters.presents.get(), 0);
}

#[test]
fn missing_consumer_shows_the_uncomposited_source() {
    let counters = Counters::default();
    let backend = MockBackend {
        fail_consumer: true,
        ..MockBackend::new(&counters)
    };
    let mut filter = edgefx::create(&outline_settings(), &backend);
    let frame = square_frame(32, 8, 24);
    let mut host = MockHost::new(frame.clone(), &counters);

    let out = run_ticks(&mut filter, &mut host, 3);
    assert_eq!(out, frame);
    assert_eq!(counters.bypasses.get(), 0);
    assert_eq!(counters.presents.get(), 3);
}

#[test]
fn missing_pass_aborts_only_compositing() {
    let frame = square_frame(32, 8, 24);

    let counters = Counters::default();
    let backend = MockBackend {
        missing_pass: Some(Pass::Outline),
        ..MockBackend::new(&counters)
    };
    let mut filter = edgefx::create(&outline_settings(), &backend);
    let mut host = MockHost::new(frame.clone(), &counters);
    assert_eq!(run_ticks(&mut filter, &mut host, 4), frame);
    assert_eq!(counters.bypasses.get(), 0);

    // Passes the program does have still render.
    let mut settings = FilterSettings::default();
    settings.outer_glow.enabled = true;
    let mut filter = edgefx::create(&settings, &backend);
    let mut host = MockHost::new(frame.clone(), &counters);
    assert_ne!(run_ticks(&mut filter, &mut host, 4), frame);
}

#[test]
fn settings_update_replaces_record_and_params() {
    let counters = Counters::default();
    let backend = MockBackend::new(&counters);
    let mut filter = edgefx::create(&FilterSettings::default(), &backend);
    let other = edgefx::create(&FilterSettings::default(), &backend);
    assert_ne!(filter.id(), other.id());
    assert_eq!(filter.params().enabled_passes().count(), 0);

    filter.on_settings_update(&outline_settings());
    assert_eq!(filter.settings(), &outline_settings());
    let enabled: Vec<Pass> = filter.params().enabled_passes().map(|(pass, _)| pass).collect();
    assert_eq!(enabled, vec![Pass::Outline]);

    filter.load(&FilterSettings::default());
    assert_eq!(filter.settings(), &FilterSettings::default());
    assert_eq!(filter.params().enabled_passes().count(), 0);
}

#[test]
fn no_target_bypasses_and_keeps_the_cache() {
    let counters = Counters::default();
    let backend = MockBackend::new(&counters);
    let mut filter = edgefx::create(&outline_settings(), &backend);
    let mut host = MockHost::new(square_frame(16, 4, 12), &counters);

    run_ticks(&mut filter, &mut host, 1);
    assert!(filter.cache().source_captured());

    host.has_target = false;
    filter.on_tick(&host, 0.016);
    assert!(filter.cache().source_captured());
    filter.on_render(&mut host, None);
    assert_eq!(counters.bypasses.get(), 1);
    assert_eq!(counters.captures.get(), 1);
}

#[test]
fn released_targets_bypass_until_recreated() {
    let counters = Counters::default();
    let backend = MockBackend::new(&counters);
    let mut filter = edgefx::create(&outline_settings(), &backend);
    let frame = square_frame(32, 8, 24);
    let mut host = MockHost::new(frame.clone(), &counters);

    let before = run_ticks(&mut filter, &mut host, 1);
    assert_eq!(counters.presents.get(), 1);
    filter.release_targets();
    filter.on_render(&mut host, None);
    assert_eq!(counters.bypasses.get(), 1);

    // Later ticks capture again but never guess a field.
    let out = run_ticks(&mut filter, &mut host, 3);
    assert_eq!(out, frame);
    assert_eq!(counters.bypasses.get(), 4);
    assert_eq!(counters.presents.get(), 1);
    assert_eq!(counters.advances.get(), 1);
    assert!(filter.generator().field().is_none());
    edgefx::destroy(filter);

    // A new instance starts over from an empty field.
    let mut filter = edgefx::create(&outline_settings(), &backend);
    let after = run_ticks(&mut filter, &mut host, 1);
    assert_eq!(before, after);
    assert_eq!(counters.presents.get(), 2);
}

#[test]
fn tiny_scale_still_renders() {
    let counters = Counters::default();
    let backend = MockBackend::new(&counters);
    let mut settings = outline_settings();
    settings.scale = 0.1;
    let mut filter = edgefx::create(&settings, &backend);
    let mut host = MockHost::new(square_frame(64, 16, 48), &counters);

    run_ticks(&mut filter, &mut host, 3);
    assert_eq!(filter.generator().field().unwrap().dimensions(), (1, 1));
    assert_eq!(counters.bypasses.get(), 0);
    assert_eq!(counters.presents.get(), 3);
}

#[test]
fn outline_straddles_the_square_edges() {
    common::try_init_logger_for_default_harness();
    let frame = square_frame(200, 50, 150);
    let mut filter = edgefx::create(&outline_settings(), &CpuBackend);
    let mut host = ImageSequenceHost::new();
    host.set_frame(frame);

    for _ in 0..12 {
        filter.on_tick(&host, 1.0 / 60.0);
        filter.on_render(&mut host, None);
    }
    assert!(!host.bypassed());
    let out = host.output().unwrap();
    assert_eq!(host.target_size(), Some((200, 200)));

    let red: Vec<u32> = (0..200).filter(|&x| out.get_pixel(x, 100)[0] > 0).collect();
    assert_eq!(red, vec![48, 49, 50, 51, 148, 149, 150, 151]);

    for x in [49, 50, 149, 150] {
        assert_eq!(out.get_pixel(x, 100), &Rgba([255, 0, 0, 255]), "x = {}", x);
    }
    for x in [48, 151] {
        let p = out.get_pixel(x, 100);
        assert!((120..=135).contains(&p[0]) && (120..=135).contains(&p[3]), "x = {}: {:?}", x, p);
    }
    for x in [51, 148] {
        let p = out.get_pixel(x, 100);
        assert!((120..=135).contains(&p[0]) && p[3] == 255, "x = {}: {:?}", x, p);
    }
    assert_eq!(out.get_pixel(100, 100), &Rgba([0, 0, 255, 255]));
    assert_eq!(out.get_pixel(10, 100), &Rgba([0, 0, 0, 0]));

    edgefx::destroy(filter);
}
