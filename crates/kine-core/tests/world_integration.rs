use kine_core::{
    FoodField, FrameSummary, KineConfig, Pacing, Position, Tick, World, Worm, cell_of,
    speed_weight,
};
use rand::{SeedableRng, rngs::SmallRng};

fn config_with_seed(population: usize, seed: u64) -> KineConfig {
    KineConfig {
        population,
        rng_seed: Some(seed),
        ..KineConfig::default()
    }
}

#[test]
fn full_cell_scenario_matches_reference_behavior() {
    // 10x10 field at maximum food, one worm parked on cell (5, 5).
    let field = FoodField::new(10, 10, 1.0).expect("field");
    let mut world = World::new(config_with_seed(1, 99), field).expect("world");

    {
        let field = world.field();
        assert_eq!(field.get(5, 5), Some(1.0));
        let worm = Worm {
            position: Position::new(0.55, 0.55),
            ..Worm::default()
        };
        assert_eq!(cell_of(worm.position.x, field.width()), 5);
        assert_eq!(cell_of(worm.position.y, field.height()), 5);
    }

    let mut worm = Worm {
        position: Position::new(0.55, 0.55),
        ..Worm::default()
    };
    let mut rng = SmallRng::seed_from_u64(99);
    let grazed = worm.step(world.field_mut(), 1.0, &mut rng);

    // Full cell: comfort mirrors the sample, the hunger weight is exactly
    // zero, and the cell loses exactly one quantum.
    assert!(grazed);
    assert_eq!(worm.comfort, 1.0);
    assert_eq!(speed_weight(worm.comfort), 0.0);
    assert_eq!(world.field().get(5, 5), Some(255.0 / 256.0));
}

#[test]
fn empty_single_cell_field_still_walks() {
    let field = FoodField::new(1, 1, 0.0).expect("field");
    let mut world = World::new(config_with_seed(1, 4), field).expect("world");

    let before = world.worms()[0];
    let events = world.step_frame(1.0);

    assert_eq!(events.depletions, 0);
    assert_eq!(world.field().get(0, 0), Some(0.0));

    let after = world.worms()[0];
    assert_ne!(before.heading, after.heading, "heading must be re-rolled");
    assert!((0.0..1.0).contains(&after.position.x));
    assert!((0.0..1.0).contains(&after.position.y));
    assert_eq!(after.comfort, 0.0);
}

#[test]
fn positions_stay_clamped_over_long_runs() {
    let field = FoodField::new(16, 16, 0.1).expect("field");
    let mut world = World::new(config_with_seed(20, 12345), field).expect("world");
    world.pacing_mut().set_level(2);

    for _ in 0..200 {
        world.step_frame(1.5);
        for worm in world.worms() {
            assert!(
                (0.0..1.0).contains(&worm.position.x),
                "x escaped: {}",
                worm.position.x
            );
            assert!(
                (0.0..1.0).contains(&worm.position.y),
                "y escaped: {}",
                worm.position.y
            );
        }
    }
}

#[test]
fn grazing_only_lowers_field_values() {
    let field = FoodField::new(8, 8, 1.0).expect("field");
    let mut world = World::new(config_with_seed(10, 77), field).expect("world");

    let mut previous = world.field().cells().to_vec();
    for _ in 0..50 {
        world.step_frame(1.0);
        let current = world.field().cells();
        for (before, after) in previous.iter().zip(current) {
            assert!(after <= before, "cell value rose: {before} -> {after}");
            assert!(*after >= 0.0);
        }
        previous = current.to_vec();
    }
}

#[test]
fn headings_show_no_directional_persistence() {
    let field = FoodField::new(32, 32, 0.3).expect("field");
    let mut world = World::new(config_with_seed(1, 2024), field).expect("world");

    let mut previous_heading = world.worms()[0].heading;
    let mut correlation_sum = 0.0f64;
    let steps = 4000;
    for _ in 0..steps {
        world.step_frame(0.5);
        let heading = world.worms()[0].heading;
        correlation_sum += f64::from((heading - previous_heading).cos());
        previous_heading = heading;
    }

    // Uniform independent headings: successive-step correlation hovers
    // near zero. Tolerance is generous next to the ~0.011 standard error.
    let correlation = correlation_sum / f64::from(steps);
    assert!(
        correlation.abs() < 0.1,
        "headings look correlated: {correlation}"
    );
}

#[test]
fn replacing_the_field_preserves_worm_state() {
    let field = FoodField::new(10, 10, 1.0).expect("field");
    let mut world = World::new(config_with_seed(5, 8), field).expect("world");
    world.step_frame(1.0);

    let before: Vec<Worm> = world.worms().to_vec();
    let replacement = FoodField::new(20, 4, 0.0).expect("field");
    world.replace_field(replacement);

    assert_eq!(world.worms(), &before[..]);
    assert_eq!(world.field().width(), 20);
    assert_eq!(world.field().height(), 4);

    // Future sampling resolves against the new (empty) field.
    let events = world.step_frame(1.0);
    assert_eq!(events.depletions, 0);
    for worm in world.worms() {
        assert_eq!(worm.comfort, 0.0);
    }
}

#[test]
fn seeded_worlds_advance_identically() {
    let make_world = || {
        let field = FoodField::new(24, 24, 0.6).expect("field");
        World::new(config_with_seed(16, 0xDEAD_BEEF), field).expect("world")
    };
    let mut world_a = make_world();
    let mut world_b = make_world();
    world_a.pacing_mut().set_level(1);
    world_b.pacing_mut().set_level(1);

    for _ in 0..40 {
        let events_a = world_a.step_frame(0.75);
        let events_b = world_b.step_frame(0.75);
        assert_eq!(events_a, events_b);
    }

    assert_eq!(world_a.tick(), Tick(40));
    assert_eq!(world_a.worms(), world_b.worms());
    assert_eq!(world_a.field().cells(), world_b.field().cells());

    let summaries_a: Vec<FrameSummary> = world_a.history().copied().collect();
    let summaries_b: Vec<FrameSummary> = world_b.history().copied().collect();
    assert_eq!(summaries_a, summaries_b);
}

#[test]
fn pacing_scales_substeps_per_frame() {
    let field = FoodField::new(6, 6, 1.0).expect("field");
    let mut world = World::new(config_with_seed(1, 31), field).expect("world");

    world.pacing_mut().set_level(3);
    assert_eq!(world.pacing(), {
        let mut pacing = Pacing::new();
        pacing.set_level(3);
        pacing
    });

    let events = world.step_frame(1.0);
    assert_eq!(events.iterations, 10);
    // One worm grazing a saturated field ten times in a row: every
    // sub-step finds quantized food above zero.
    assert_eq!(events.depletions, 10);
}
