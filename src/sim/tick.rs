//! Frame stepper
//!
//! Advances a rider by one frame: verlet integration, then a fixed number of
//! relaxation passes (every bone in body order, then every line against every
//! point), then the cosmetic scarf.

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::bone::BoneOutcome;
use super::collision::Contact;
use super::geometry::perpendicular_right;
use super::line::{Line, LineId};
use super::point::SimulationPoint;
use super::state::{Rider, RiderBody, RiderState};
use crate::consts::{SCARF_AIR_FRICTION, SCARF_FLUTTER_SCALE, SCARF_FLUTTER_SPEED};
use crate::settings::PhysicsConfig;

/// Result of one frame step
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub rider: Rider,
    /// Trigger-carrying lines that caught a point this frame, first hit first
    pub triggers: Vec<LineId>,
    /// Interaction-test lines whose capture zone a point entered
    pub diagnostics: Vec<LineId>,
    /// The rider crashed during this frame
    pub crashed_now: bool,
}

/// Advance `rider` by one frame against `lines`.
///
/// `frame` is the index of the frame being produced; it only seeds the scarf
/// flutter so the result stays a pure function of its inputs.
pub fn tick(
    body: &RiderBody,
    rider: &Rider,
    lines: &[&Line],
    physics: &PhysicsConfig,
    frame: usize,
) -> StepOutcome {
    let mut points: Vec<SimulationPoint> = rider
        .points
        .iter()
        .map(|p| p.step_momentum(physics.gravity))
        .collect();

    let was_crashed = rider.state.is_crashed();
    let mut crashed = was_crashed;
    let mut triggers = Vec::new();
    let mut diagnostics = Vec::new();

    for _ in 0..physics.iterations {
        for bone in body.bones() {
            if bone.apply(&mut points, crashed) == BoneOutcome::Broke {
                crashed = true;
            }
        }

        for point in points.iter_mut() {
            for line in lines {
                match line.interact(point) {
                    Contact::Collided(moved) => {
                        *point = moved;
                        if line.trigger().is_some() && !triggers.contains(&line.id()) {
                            triggers.push(line.id());
                        }
                    }
                    Contact::DiagnosticHit => {
                        if !diagnostics.contains(&line.id()) {
                            diagnostics.push(line.id());
                        }
                    }
                    Contact::NoHit => {}
                }
            }
        }
    }

    let crashed_now = crashed && !was_crashed;
    if crashed_now {
        log::debug!("Rider crashed at frame {}", frame);
    }

    let scarf = match body.scarf() {
        Some(scarf) if !rider.scarf.is_empty() => {
            let anchor = points[scarf.anchor()].location;
            let mut scarf_points: Vec<SimulationPoint> = rider
                .scarf
                .iter()
                .map(|p| p.step_with_air_friction(physics.gravity, SCARF_AIR_FRICTION))
                .collect();
            flutter(&mut scarf_points, rider.speed(), frame);
            for _ in 0..physics.iterations {
                scarf.relax(anchor, &mut scarf_points);
            }
            scarf_points
        }
        _ => rider.scarf.clone(),
    };

    StepOutcome {
        rider: Rider {
            points,
            scarf,
            state: if crashed {
                RiderState::Crashed
            } else {
                RiderState::Alive
            },
        },
        triggers,
        diagnostics,
        crashed_now,
    }
}

/// Jitter scarf points sideways when the rider is fast. Seeded by frame index.
fn flutter(points: &mut [SimulationPoint], speed: f64, frame: usize) {
    if speed <= SCARF_FLUTTER_SPEED {
        return;
    }
    let mut rng = Pcg32::seed_from_u64(frame as u64);
    for point in points.iter_mut() {
        let direction = point.velocity().normalize_or_zero();
        if direction == DVec2::ZERO {
            continue;
        }
        let jitter = rng.random_range(-1.0..=1.0) * speed * SCARF_FLUTTER_SCALE;
        *point = point.with_location(point.location + perpendicular_right(direction) * jitter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::ENDURANCE_FACTOR;
    use crate::sim::bone::BoneSpec;

    fn single_point_body() -> RiderBody {
        RiderBody::new(
            vec![SimulationPoint::at_rest(DVec2::ZERO, 0.5)],
            &[],
            ENDURANCE_FACTOR,
        )
        .unwrap()
    }

    #[test]
    fn test_single_point_lands_on_line() {
        let body = single_point_body();
        let floor = Line::standard(1, DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0)).unwrap();
        let physics = PhysicsConfig::default();

        // Falling at (5, -1) with downward (and slight sideways) momentum
        let rider = body.spawn(DVec2::new(5.0, -1.0), DVec2::new(0.5, 2.0));
        let out = tick(&body, &rider, &[&floor], &physics, 1);
        let p = out.rider.points[0];

        assert_eq!(p.location.y, 0.0);
        assert!((p.location.x - 5.5).abs() < 1e-12);
        // Friction pushed `previous` along the direction of travel
        assert!(p.previous.x > 5.0);
        assert!(p.previous.x <= p.location.x);
        assert_eq!(out.rider.state, RiderState::Alive);
    }

    #[test]
    fn test_free_fall_without_lines() {
        let body = single_point_body();
        let physics = PhysicsConfig::default();
        let rider = body.spawn(DVec2::ZERO, DVec2::ZERO);

        let one = tick(&body, &rider, &[], &physics, 1).rider;
        assert_eq!(one.points[0].location, physics.gravity);
        let two = tick(&body, &one, &[], &physics, 2).rider;
        assert!((two.points[0].location - physics.gravity * 3.0).length() < 1e-12);
    }

    #[test]
    fn test_crash_is_permanent() {
        let body = RiderBody::new(
            vec![
                SimulationPoint::at_rest(DVec2::ZERO, 0.0),
                SimulationPoint::at_rest(DVec2::new(10.0, 0.0), 0.0),
            ],
            &[BoneSpec::breakable(0, 1)],
            ENDURANCE_FACTOR,
        )
        .unwrap();
        let physics = PhysicsConfig::default();

        // Pull the points far apart
        let mut rider = body.spawn(DVec2::ZERO, DVec2::ZERO);
        rider.points[1] = SimulationPoint::at_rest(DVec2::new(100.0, 0.0), 0.0);

        let out = tick(&body, &rider, &[], &physics, 1);
        assert!(out.crashed_now);
        assert_eq!(out.rider.state, RiderState::Crashed);

        // Put them back at rest length: still crashed, bone stays inert
        let mut rider = out.rider;
        rider.points[1] = SimulationPoint::at_rest(rider.points[0].location + DVec2::new(10.0, 0.0), 0.0);
        for frame in 2..20 {
            let out = tick(&body, &rider, &[], &physics, frame);
            assert!(!out.crashed_now);
            assert_eq!(out.rider.state, RiderState::Crashed);
            rider = out.rider;
        }
    }

    #[test]
    fn test_default_rider_rides_a_slope() {
        let body = RiderBody::default_rider(ENDURANCE_FACTOR, true).unwrap();
        let physics = PhysicsConfig::default();
        let slope = Line::standard(1, DVec2::new(-20.0, 10.0), DVec2::new(400.0, 110.0)).unwrap();
        let lines = [&slope];

        let mut rider = body.spawn(DVec2::ZERO, physics.start_velocity);
        for frame in 1..60 {
            rider = tick(&body, &rider, &lines, &physics, frame).rider;
        }
        assert_eq!(rider.state, RiderState::Alive);
        // Moving down and to the right along the slope
        assert!(rider.center().x > 20.0);
        assert!(rider.momentum().x > 0.0);
        // No point fell through the slope
        for p in &rider.points {
            let side = (p.location - slope.start()).dot(slope.normal());
            assert!(side < 1.0, "point below slope: {side}");
        }
        assert_eq!(rider.scarf.len(), body.scarf().map(|s| s.segments()).unwrap_or(0));
    }

    #[test]
    fn test_head_on_wall_crashes_default_rider() {
        let body = RiderBody::default_rider(ENDURANCE_FACTOR, false).unwrap();
        let physics = PhysicsConfig::default();
        let floor = Line::standard(1, DVec2::new(-50.0, 5.5), DVec2::new(500.0, 5.5)).unwrap();
        // Knee-high wall: stops the sled, the upper body flies over it
        let wall = Line::standard(2, DVec2::new(60.0, 10.0), DVec2::new(60.0, -1.0)).unwrap();
        let lines = [&floor, &wall];

        let mut rider = body.spawn(DVec2::ZERO, DVec2::new(8.0, 0.0));
        let mut crashed_at = None;
        for frame in 1..120 {
            let out = tick(&body, &rider, &lines, &physics, frame);
            if out.crashed_now {
                crashed_at = Some(frame);
            }
            rider = out.rider;
        }
        assert!(crashed_at.is_some());
        assert!(rider.is_crashed());
    }

    #[test]
    fn test_triggers_and_diagnostics_reported() {
        use crate::sim::line::TriggerDescriptor;

        let body = single_point_body();
        let physics = PhysicsConfig::default();
        let mut boost = Line::accelerant(7, DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0), 1).unwrap();
        boost
            .set_trigger(Some(TriggerDescriptor {
                target_zoom: 2.0,
                frame_count: 10,
            }))
            .unwrap();
        let probe = Line::interaction_test(8, DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0)).unwrap();

        let rider = body.spawn(DVec2::new(5.0, -1.0), DVec2::new(0.0, 2.0));
        let out = tick(&body, &rider, &[&probe, &boost], &physics, 1);
        assert_eq!(out.triggers, vec![LineId(7)]);
        assert_eq!(out.diagnostics, vec![LineId(8)]);
    }

    #[test]
    fn test_flutter_is_deterministic() {
        let body = RiderBody::default_rider(ENDURANCE_FACTOR, true).unwrap();
        let physics = PhysicsConfig::default();
        let rider = body.spawn(DVec2::ZERO, DVec2::new(6.0, 0.0));
        let a = tick(&body, &rider, &[], &physics, 5);
        let b = tick(&body, &rider, &[], &physics, 5);
        assert_eq!(a, b);
    }
}
