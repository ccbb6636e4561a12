// g_deatomizer.rs: misc_deatomizer_control and misc_deatomizer_target markers
//
// A control glides toward its target marker once used, then idles there
// and re-measures every cycle until it is used again.

use tracing::debug;

use crate::g_local::*;
use crate::g_utils::{g_find, FindField};
use crate::game_import::*;

/// `teleport_time` value meaning the control has nowhere to go.
const NO_TARGET: f32 = -1.0;
const DEFAULT_CYCLE: f32 = 3.0;
const MARKER_SPRITE: &str = "sprites/s_deatom1.sp2";

/// Deatomizer travel states.
pub const DEATOM_IDLE: i32 = 0;
pub const DEATOM_MEASURE: i32 = 1;
pub const DEATOM_TRAVEL: i32 = 2;
pub const DEATOM_ARRIVED: i32 = 3;

/// Shared marker setup: invisible, non-solid, zero sized.
fn init_marker(ctx: &mut GameContext, self_idx: usize) {
    let ent = &mut ctx.edicts[self_idx];
    ent.solid = Solid::Not;
    ent.movetype = MoveType::FlyMissile;
    ent.svflags = SVF_NOCLIENT;
    ent.mins = VEC3_ORIGIN;
    ent.maxs = VEC3_ORIGIN;

    if ent.targetname.is_empty() {
        gi_bprintf(PRINT_HIGH, &format!("{} with no targetname\n", ent.classname));
        ent.targetname = "unused".to_string();
    }

    ent.s.modelindex = gi_modelindex(MARKER_SPRITE);
}

/// One tick of the control's travel state machine. Returns false once the
/// control has stopped.
pub fn deatomizer_step(ctx: &mut GameContext, self_idx: usize) -> bool {
    let target = ctx.ent(ctx.edicts[self_idx].deatom.target);
    let ent = &mut ctx.edicts[self_idx];

    match ent.deatom.state {
        DEATOM_TRAVEL => {
            let speed = if ent.speed <= 0.0 { 1.0 } else { ent.speed };
            let travel = (speed * FRAMETIME).min(ent.deatom.distance);
            if travel > 0.0 {
                ent.s.origin = vector_ma(&ent.s.origin, travel, &ent.deatom.direction);
                ent.deatom.distance -= travel;
            }

            if ent.deatom.distance <= 0.0 {
                ent.deatom.distance = 0.0;
                ent.deatom.state = DEATOM_ARRIVED;
                ent.deatom.accumulator = 0.0;
                ent.deatom.accumulator += FRAMETIME;
            }
            gi_linkentity(self_idx as i32);
            true
        }
        DEATOM_ARRIVED => {
            if ent.teleport_time != NO_TARGET {
                ent.deatom.state = DEATOM_MEASURE;
                ent.teleport_time = 0.0;
                ent.deatom.accumulator += FRAMETIME;
            } else {
                ent.deatom.accumulator = 0.0;
                ent.deatom.state = DEATOM_IDLE;
            }
            true
        }
        // idle and measure
        _ => {
            let Some(target) = target else {
                ent.deatom.accumulator = 0.0;
                ent.teleport_time = NO_TARGET;
                return false;
            };

            let origin = ent.s.origin;
            let diff = vector_subtract(&ctx.edicts[target].s.origin, &origin);
            let ent = &mut ctx.edicts[self_idx];
            ent.deatom.distance = vector_length(&diff);
            ent.deatom.direction = vector_normalized(&diff);
            ent.deatom.state = DEATOM_TRAVEL;

            if ent.deatom.distance <= 0.0 {
                gi_bprintf(PRINT_HIGH, "no main move\n");
            }
            ent.deatom.accumulator += FRAMETIME;
            true
        }
    }
}

pub fn deatomizer_think(ctx: &mut GameContext, self_idx: usize) {
    if !ctx.edicts[self_idx].deatom.active {
        return;
    }

    let ent = &mut ctx.edicts[self_idx];
    ent.nextthink = 0.0;
    if deatomizer_step(ctx, self_idx) {
        ctx.edicts[self_idx].nextthink = ctx.level.time + FRAMETIME;
    } else {
        ctx.edicts[self_idx].deatom.active = false;
    }
}

/// Toggle the control. Switching on locks onto its target marker.
pub fn deatomizer_control_use(ctx: &mut GameContext, self_idx: usize, _other_idx: usize, _activator_idx: usize) {
    if ctx.edicts[self_idx].deatom.active {
        let ent = &mut ctx.edicts[self_idx];
        ent.deatom.active = false;
        ent.nextthink = 0.0;
        debug!(ent = self_idx, "deatomizer control off");
        return;
    }

    let target_name = ctx.edicts[self_idx].target.clone();
    let target = if target_name.is_empty() {
        None
    } else {
        g_find(ctx, 1, FindField::Targetname, &target_name)
    };

    let time = ctx.level.time;
    let ent = &mut ctx.edicts[self_idx];
    ent.deatom.active = true;
    ent.deatom.state = DEATOM_IDLE;
    ent.deatom.target = target.map_or(-1, |t| t as i32);
    ent.think_fn = Some(deatomizer_think);
    ent.nextthink = time + FRAMETIME;
    debug!(ent = self_idx, ?target, "deatomizer control on");
}

pub fn sp_misc_deatomizer_control(ctx: &mut GameContext, self_idx: usize) {
    init_marker(ctx, self_idx);

    let ent = &mut ctx.edicts[self_idx];
    if ent.teleport_time < 0.0 {
        ent.teleport_time = DEFAULT_CYCLE;
    }
    ent.use_fn = Some(deatomizer_control_use);
    gi_linkentity(self_idx as i32);
}

pub fn sp_misc_deatomizer_target(ctx: &mut GameContext, self_idx: usize) {
    init_marker(ctx, self_idx);

    let ent = &mut ctx.edicts[self_idx];
    ent.deatom.active = false;
    ent.deatom.target = -1;
    gi_linkentity(self_idx as i32);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{call_think, call_use};
    use crate::g_utils::g_spawn;
    use crate::game_import::testing;

    fn make_ctx() -> GameContext {
        testing::install();
        GameCtx::with_capacity(16, 1)
    }

    fn spawn_pair(ctx: &mut GameContext, speed: f32) -> (usize, usize) {
        let control = g_spawn(ctx).unwrap();
        {
            let c = &mut ctx.edicts[control];
            c.classname = "misc_deatomizer_control".into();
            c.targetname = "ctl".into();
            c.target = "dest".into();
            c.speed = speed;
        }
        sp_misc_deatomizer_control(ctx, control);

        let target = g_spawn(ctx).unwrap();
        {
            let t = &mut ctx.edicts[target];
            t.classname = "misc_deatomizer_target".into();
            t.targetname = "dest".into();
            t.s.origin = [20.0, 0.0, 0.0];
        }
        sp_misc_deatomizer_target(ctx, target);
        (control, target)
    }

    #[test]
    fn test_marker_setup() {
        let mut ctx = make_ctx();
        let control = g_spawn(&mut ctx).unwrap();
        ctx.edicts[control].classname = "misc_deatomizer_control".into();
        ctx.edicts[control].teleport_time = -5.0;
        sp_misc_deatomizer_control(&mut ctx, control);

        let c = &ctx.edicts[control];
        assert_eq!(c.solid, Solid::Not);
        assert_eq!(c.svflags, SVF_NOCLIENT);
        assert_eq!(c.targetname, "unused");
        assert_eq!(c.teleport_time, 3.0);
        assert_eq!(c.s.modelindex, testing::index(MARKER_SPRITE));
        assert_eq!(testing::bprints(), vec!["misc_deatomizer_control with no targetname\n".to_string()]);
    }

    #[test]
    fn test_use_acquires_target_and_travels() {
        let mut ctx = make_ctx();
        let (control, target) = spawn_pair(&mut ctx, 100.0);
        call_use(&mut ctx, control, 0, 0);
        assert!(ctx.edicts[control].deatom.active);
        assert_eq!(ctx.edicts[control].deatom.target, target as i32);

        // measure
        call_think(&mut ctx, control);
        let d = ctx.edicts[control].deatom;
        assert_eq!(d.state, DEATOM_TRAVEL);
        assert_eq!(d.distance, 20.0);
        assert_eq!(d.direction, [1.0, 0.0, 0.0]);

        // 10 units per tick
        call_think(&mut ctx, control);
        assert_eq!(ctx.edicts[control].s.origin, [10.0, 0.0, 0.0]);
        assert_eq!(ctx.edicts[control].deatom.state, DEATOM_TRAVEL);
        call_think(&mut ctx, control);
        assert_eq!(ctx.edicts[control].s.origin, [20.0, 0.0, 0.0]);
        assert_eq!(ctx.edicts[control].deatom.state, DEATOM_ARRIVED);

        // cycle back to measuring
        call_think(&mut ctx, control);
        assert_eq!(ctx.edicts[control].deatom.state, DEATOM_MEASURE);
        assert_eq!(ctx.edicts[control].teleport_time, 0.0);
    }

    #[test]
    fn test_accumulator_holds_while_travelling() {
        let mut ctx = make_ctx();
        let (control, _) = spawn_pair(&mut ctx, 100.0);
        call_use(&mut ctx, control, 0, 0);
        call_think(&mut ctx, control);
        let measured = ctx.edicts[control].deatom.accumulator;

        call_think(&mut ctx, control);
        let d = ctx.edicts[control].deatom;
        assert_eq!(d.distance, 10.0);
        assert_eq!(d.accumulator, measured);

        // arrival resets, then counts one frame
        call_think(&mut ctx, control);
        let d = ctx.edicts[control].deatom;
        assert_eq!(d.state, DEATOM_ARRIVED);
        assert!((d.accumulator - FRAMETIME).abs() < 1e-6);
    }

    #[test]
    fn test_no_target_stops() {
        let mut ctx = make_ctx();
        let control = g_spawn(&mut ctx).unwrap();
        ctx.edicts[control].targetname = "ctl".into();
        sp_misc_deatomizer_control(&mut ctx, control);
        call_use(&mut ctx, control, 0, 0);
        call_think(&mut ctx, control);

        let c = &ctx.edicts[control];
        assert!(!c.deatom.active);
        assert_eq!(c.teleport_time, NO_TARGET);
        assert_eq!(c.deatom.accumulator, 0.0);
        assert_eq!(c.nextthink, 0.0);
    }

    #[test]
    fn test_arrived_without_target_goes_idle() {
        let mut ctx = make_ctx();
        let control = g_spawn(&mut ctx).unwrap();
        let ent = &mut ctx.edicts[control];
        ent.deatom.state = DEATOM_ARRIVED;
        ent.deatom.accumulator = 0.7;
        ent.teleport_time = NO_TARGET;
        assert!(deatomizer_step(&mut ctx, control));
        assert_eq!(ctx.edicts[control].deatom.state, DEATOM_IDLE);
        assert_eq!(ctx.edicts[control].deatom.accumulator, 0.0);
    }

    #[test]
    fn test_zero_distance_reports_no_main_move() {
        let mut ctx = make_ctx();
        let (control, target) = spawn_pair(&mut ctx, 0.0);
        ctx.edicts[target].s.origin = VEC3_ORIGIN;
        testing::clear();
        call_use(&mut ctx, control, 0, 0);
        call_think(&mut ctx, control);
        assert_eq!(testing::bprints(), vec!["no main move\n".to_string()]);
        call_think(&mut ctx, control);
        assert_eq!(ctx.edicts[control].deatom.state, DEATOM_ARRIVED);
    }

    #[test]
    fn test_second_use_switches_off() {
        let mut ctx = make_ctx();
        let (control, _) = spawn_pair(&mut ctx, 100.0);
        call_use(&mut ctx, control, 0, 0);
        call_use(&mut ctx, control, 0, 0);
        assert!(!ctx.edicts[control].deatom.active);
        assert_eq!(ctx.edicts[control].nextthink, 0.0);
        call_think(&mut ctx, control);
        assert_eq!(ctx.edicts[control].deatom.state, DEATOM_IDLE);
    }
}
