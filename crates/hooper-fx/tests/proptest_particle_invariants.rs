//! Property-based invariant tests for the particle field and frame kernel.
//!
//! These hold for **any** raster and any valid configuration:
//!
//! 1. Builder exactness: the field is exactly the stride-sampled pixels that
//!    pass both the brightness and alpha tests, in raster-scan order
//! 2. Threshold monotonicity: move thresholds never increase toward the
//!    travel side's far edge
//! 3. Rest state: at progress 0 every particle sits on its origin, opaque
//! 4. Done state: at progress 1 with fade >= 1 every particle is invisible
//!    and has travelled exactly its effective reach
//! 5. Kernel ranges: opacity and local progress stay in [0, 1], y never moves
//! 6. Travel monotonicity: displacement magnitude never shrinks as progress
//!    grows
//! 7. Checksum determinism: same raster, config and progress hash the same
//! 8. Viewport progress: clamped to [0, 1] and monotonic as the element
//!    scrolls up

use hooper_fx::kernel::{effective_max, local_progress};
use hooper_fx::particle::{brightness, move_threshold};
use hooper_fx::*;
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────────

fn raster_strategy() -> impl Strategy<Value = Raster> {
    (1u32..20, 1u32..12).prop_flat_map(|(w, h)| {
        prop::collection::vec(any::<u8>(), (w * h * 4) as usize)
            .prop_map(move |pixels| Raster::from_rgba(w, h, pixels))
    })
}

fn config_strategy() -> impl Strategy<Value = DissolveConfig> {
    (
        1u32..5,
        any::<u8>(),
        -500.0f64..500.0,
        0.0f64..6.0,
        0.1f64..4.0,
        0.0f64..10.0,
        0.1f64..4.0,
        prop_oneof![Just(BrightnessChannel::Red), Just(BrightnessChannel::Luma)],
    )
        .prop_map(|(density, threshold, max, fade, accel, spread, curve, channel)| {
            DissolveConfig::default()
                .with_sampling_density(density)
                .with_brightness_threshold(threshold)
                .with_brightness_channel(channel)
                .with_max_displacement(max)
                .with_fade_intensity(fade)
                .with_acceleration_power(accel)
                .with_spread_factor(spread)
                .with_curve_power(curve)
        })
}

// ── 1. Builder exactness ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn field_matches_brute_force_sampling(
        raster in raster_strategy(),
        config in config_strategy(),
    ) {
        let field = ParticleField::build(&raster, &config);
        let stride = config.particle_sampling_density as usize;

        let mut expected = Vec::new();
        for y in (0..raster.height()).step_by(stride) {
            for x in (0..raster.width()).step_by(stride) {
                let px = raster.pixel(x, y).unwrap();
                if brightness(px, config.brightness_channel) > config.brightness_threshold
                    && px[3] > ALPHA_FLOOR
                {
                    expected.push((f64::from(x), f64::from(y)));
                }
            }
        }

        let actual: Vec<_> = field.particles().iter().map(Particle::origin).collect();
        prop_assert_eq!(actual, expected);
    }
}

// ── 2. Threshold monotonicity ───────────────────────────────────────────────

proptest! {
    #[test]
    fn thresholds_are_monotonic_in_x(
        width in 1u32..2000,
        a in 0u32..2000,
        b in 0u32..2000,
        curve in 0.1f64..5.0,
    ) {
        let (lo, hi) = (a.min(b) % width, a.max(b) % width);
        let (lo, hi) = (lo.min(hi), lo.max(hi));

        let right_lo = move_threshold(lo, width, true, curve);
        let right_hi = move_threshold(hi, width, true, curve);
        prop_assert!(right_lo >= right_hi, "rightward: t({lo})={right_lo} < t({hi})={right_hi}");

        let left_lo = move_threshold(lo, width, false, curve);
        let left_hi = move_threshold(hi, width, false, curve);
        prop_assert!(left_lo <= left_hi, "leftward: t({lo})={left_lo} > t({hi})={left_hi}");

        for t in [right_lo, right_hi, left_lo, left_hi] {
            prop_assert!((0.0..=1.0).contains(&t));
        }
    }
}

// ── 3 & 4. Endpoint states ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn zero_progress_is_rest_state(
        raster in raster_strategy(),
        config in config_strategy(),
    ) {
        let field = ParticleField::build(&raster, &config);
        for p in field.particles() {
            let first = particle_state(p, &config, 0.0);
            let again = particle_state(p, &config, 0.0);
            prop_assert_eq!(first, again);
            prop_assert_eq!((first.x, first.y), p.origin());
            prop_assert_eq!(first.opacity, 1.0);
            prop_assert!(!first.transitioning);
        }
    }

    #[test]
    fn full_progress_is_done_state(
        raster in raster_strategy(),
        config in config_strategy(),
        fade in 1.0f64..8.0,
    ) {
        let config = config.with_fade_intensity(fade);
        let field = ParticleField::build(&raster, &config);
        for p in field.particles() {
            let s = particle_state(p, &config, 1.0);
            prop_assert_eq!(s.opacity, 0.0);
            prop_assert!(!s.visible);
            let travelled = s.x - p.origin().0;
            let reach = effective_max(&config, p.move_threshold());
            prop_assert!((travelled - reach).abs() < 1e-6, "travelled {travelled}, reach {reach}");
        }
    }
}

// ── 5 & 6. Kernel ranges and monotonic travel ───────────────────────────────

proptest! {
    #[test]
    fn kernel_outputs_stay_in_range(
        raster in raster_strategy(),
        config in config_strategy(),
        progress in 0.0f64..=1.0,
    ) {
        let field = ParticleField::build(&raster, &config);
        for p in field.particles() {
            let s = particle_state(p, &config, progress);
            prop_assert!((0.0..=1.0).contains(&s.opacity));
            prop_assert!((0.0..=1.0).contains(&s.local_progress));
            prop_assert_eq!(s.y, p.origin().1);
            if s.transitioning {
                prop_assert!(s.visible);
            }
        }
    }

    #[test]
    fn travel_never_shrinks(
        t in 0.0f64..=1.0,
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
        accel in 0.1f64..4.0,
    ) {
        let (lo, hi) = (a.min(b), a.max(b));
        let l_lo = local_progress(lo, t);
        let l_hi = local_progress(hi, t);
        prop_assert!(l_lo <= l_hi);
        prop_assert!(l_lo.powf(accel) <= l_hi.powf(accel));
    }
}

// ── 7. Checksum determinism ─────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn surface_checksum_is_deterministic(
        raster in raster_strategy(),
        progress in 0.0f64..=1.0,
        detour in 0.0f64..=1.0,
    ) {
        let config = DissolveConfig::default()
            .with_max_displacement(-60.0)
            .with_padding(0, PaddingMode::Directional);
        let field = ParticleField::build(&raster, &config);

        let mut a = DissolveRenderer::new(field.clone(), config.clone());
        let mut b = DissolveRenderer::new(field, config);
        let mut sa = a.new_surface();
        let mut sb = b.new_surface();
        a.render(detour, &mut sa);
        a.render(progress, &mut sa);
        b.render(progress, &mut sb);
        prop_assert_eq!(sa.checksum(), sb.checksum());
    }
}

// ── 8. Viewport progress ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn viewport_progress_is_clamped_and_monotonic(
        height in 0.0f64..2000.0,
        viewport in -10.0f64..2000.0,
        bottom_a in -3000.0f64..3000.0,
        bottom_b in -3000.0f64..3000.0,
    ) {
        let pa = viewport_progress(bottom_a, height, viewport);
        let pb = viewport_progress(bottom_b, height, viewport);
        prop_assert!((0.0..=1.0).contains(&pa));
        prop_assert!((0.0..=1.0).contains(&pb));
        // Scrolling up moves the rect bottom up (smaller), never lowering progress.
        if bottom_a <= bottom_b {
            prop_assert!(pa >= pb);
        } else {
            prop_assert!(pa <= pb);
        }
    }
}
