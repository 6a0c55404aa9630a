use particle_field::{SimulationConfig, SimulationState};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn particles_stay_inside_inset_viewport(
        seed in any::<u64>(),
        count in 0i64..40,
        radius in 0.5f32..8.0,
        width in 20.0f32..600.0,
        height in 20.0f32..600.0,
        gravity in -2.0f32..2.0,
        restitution in 0.0f32..1.2,
        strength in -5.0f32..5.0,
        pointer in (-100.0f32..700.0, -100.0f32..700.0),
        steps in 1usize..120,
    ) {
        let config = SimulationConfig {
            point_count: count,
            point_radius: radius,
            gravity,
            restitution,
            attraction_strength: strength,
            initial_speed: 4.0,
            ..SimulationConfig::default()
        };
        let mut state =
            SimulationState::initialize_with_rng(&config, width, height, &mut StdRng::seed_from_u64(seed))
                .unwrap();
        state.on_pointer_move(pointer.0, pointer.1);

        let inside = |state: &SimulationState| {
            state.particles.iter().all(|p| {
                p.position.x >= radius
                    && p.position.x <= width - radius
                    && p.position.y >= radius
                    && p.position.y <= height - radius
            })
        };

        prop_assert!(inside(&state));
        for _ in 0..steps {
            state.step(&config);
            prop_assert!(inside(&state));
        }
    }

    #[test]
    fn resize_twice_matches_resize_once(
        seed in any::<u64>(),
        width in 1.0f32..2000.0,
        height in 1.0f32..2000.0,
    ) {
        let config = SimulationConfig::default();
        let mut once =
            SimulationState::initialize_with_rng(&config, 800.0, 600.0, &mut StdRng::seed_from_u64(seed))
                .unwrap();
        let mut twice = once.clone();

        once.on_resize(width, height);
        twice.on_resize(width, height);
        twice.on_resize(width, height);

        prop_assert_eq!(once, twice);
    }
}
