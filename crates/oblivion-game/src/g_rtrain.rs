// g_rtrain.rs: func_rotate_train, a path_corner train that also turns

use tracing::{debug, warn};

use crate::dispatch::{call_move_endfunc, ThinkFn};
use crate::g_combat::t_damage;
use crate::g_local::*;
use crate::g_misc::{become_explosion1, PATH_CORNER_TELEPORT};
use crate::g_utils::{g_pick_target, g_use_targets, vtos};
use crate::game_import::*;

pub const RTRAIN_START_ON: i32 = 1;
pub const RTRAIN_TOGGLE: i32 = 2;
pub const RTRAIN_BLOCK_STOPS: i32 = 4;

const STATE_TOP: i32 = 0;

const CRUSH_DAMAGE: i32 = 100_000;
const BLOCK_DEBOUNCE: f32 = 0.5;

// ============================================================
// Corner settings and rotation
// ============================================================

/// Take speed, duration and rotation from the corner just reached.
/// `set_speed` copies the corner speed even when it is zero.
fn apply_corner_settings(ctx: &mut GameContext, self_idx: usize, corner_idx: usize, set_speed: bool) {
    let corner = &ctx.edicts[corner_idx];
    let (duration, speed, rotate, rotate_speed) = (corner.duration, corner.speed, corner.rotate, corner.rotate_speed);

    let ent = &mut ctx.edicts[self_idx];
    ent.duration = duration.max(0.0);
    if set_speed || speed != 0.0 {
        ent.moveinfo.speed = speed;
    }
    ent.rotate = rotate;
    ent.rotate_speed = rotate_speed;
}

/// Start and end angles for the coming leg. Returns whether the leg turns.
fn set_angle_targets(ent: &mut Edict) -> bool {
    let angles = ent.s.angles;
    ent.moveinfo.start_angles = angles;
    ent.moveinfo.end_angles = angles;

    let mut accum = VEC3_ORIGIN;
    let mut has_rotate = false;
    for axis in 0..3 {
        if ent.rotate[axis] != 0.0 {
            let mut turned = angles;
            turned[axis] += ent.rotate[axis];
            accum = vector_add(&accum, &turned);
            has_rotate = true;
        }
    }

    if has_rotate {
        ent.moveinfo.end_angles = accum;
    }
    has_rotate
}

/// Continuous spin when the leg has no fixed rotation.
fn set_rotate_speed(ent: &mut Edict) {
    if !vector_compare(&ent.rotate, &VEC3_ORIGIN) {
        return;
    }
    if !vector_compare(&ent.rotate_speed, &VEC3_ORIGIN) {
        ent.avelocity = ent.rotate_speed;
    }
}

/// Angular velocity that covers the leg's rotation in whole frames.
fn update_angular_velocity(ent: &mut Edict) {
    let delta = vector_subtract(&ent.moveinfo.end_angles, &ent.moveinfo.start_angles);
    let angle_dist = vector_length(&delta);
    if angle_dist <= 0.0 {
        ent.avelocity = VEC3_ORIGIN;
        return;
    }

    let move_time = if ent.duration > 0.0 {
        ent.duration
    } else if ent.moveinfo.speed > 0.0 {
        angle_dist / ent.moveinfo.speed
    } else {
        0.0
    };
    if move_time <= 0.0 {
        ent.avelocity = VEC3_ORIGIN;
        return;
    }

    let frames = (move_time / FRAMETIME).floor().max(1.0);
    ent.avelocity = vector_scale(&delta, 1.0 / (frames * FRAMETIME));
}

/// Whole-degree wrap, truncating toward zero.
fn wrap_angle(angle: f32) -> f32 {
    ((angle as i32) % 360) as f32
}

// ============================================================
// Movement
// ============================================================

fn rotate_train_move_done(ctx: &mut GameContext, self_idx: usize) {
    let ent = &mut ctx.edicts[self_idx];
    ent.velocity = VEC3_ORIGIN;
    ent.avelocity = VEC3_ORIGIN;
    for a in ent.s.angles.iter_mut() {
        *a = wrap_angle(*a);
    }
    call_move_endfunc(ctx, self_idx);
}

fn rotate_train_move_final(ctx: &mut GameContext, self_idx: usize) {
    if ctx.edicts[self_idx].moveinfo.remaining_distance == 0.0 {
        rotate_train_move_done(ctx, self_idx);
        return;
    }

    let time = ctx.level.time;
    let ent = &mut ctx.edicts[self_idx];
    ent.velocity = vector_scale(&ent.moveinfo.dir, ent.moveinfo.remaining_distance / FRAMETIME);

    // land exactly on the end angles
    if !vector_compare(&ent.rotate, &VEC3_ORIGIN) {
        let rest = vector_subtract(&ent.moveinfo.end_angles, &ent.s.angles);
        ent.avelocity = if vector_compare(&rest, &VEC3_ORIGIN) {
            VEC3_ORIGIN
        } else {
            vector_scale(&rest, 1.0 / FRAMETIME)
        };
    }

    ent.think_fn = Some(rotate_train_move_done);
    ent.nextthink = time + FRAMETIME;
}

fn rotate_train_move_begin(ctx: &mut GameContext, self_idx: usize) {
    let speed = ctx.edicts[self_idx].moveinfo.speed;
    if speed * FRAMETIME >= ctx.edicts[self_idx].moveinfo.remaining_distance {
        rotate_train_move_final(ctx, self_idx);
        return;
    }

    let time = ctx.level.time;
    let ent = &mut ctx.edicts[self_idx];
    ent.velocity = vector_scale(&ent.moveinfo.dir, speed);
    let frames = (ent.moveinfo.remaining_distance / speed / FRAMETIME).floor();
    ent.moveinfo.remaining_distance -= frames * speed * FRAMETIME;
    ent.nextthink = time + frames * FRAMETIME;
    ent.think_fn = Some(rotate_train_move_final);

    if !vector_compare(&ent.rotate, &VEC3_ORIGIN) {
        update_angular_velocity(ent);
    }
}

fn rotate_train_move_calc(ctx: &mut GameContext, self_idx: usize, dest: Vec3, endfunc: ThinkFn) {
    let ent = &mut ctx.edicts[self_idx];
    ent.velocity = VEC3_ORIGIN;
    let mut dir = vector_subtract(&dest, &ent.s.origin);
    ent.moveinfo.remaining_distance = vector_normalize(&mut dir);
    ent.moveinfo.dir = dir;
    ent.moveinfo.distance = ent.moveinfo.remaining_distance;
    ent.moveinfo.endfunc = Some(endfunc);

    if ent.duration > 0.0 {
        ent.moveinfo.speed = ent.moveinfo.distance / ent.duration;
    }

    set_angle_targets(ent);
    set_rotate_speed(ent);

    let leader = if ent.flags.intersects(FL_TEAMSLAVE) { ent.teammaster } else { self_idx as i32 };
    if ctx.level.current_entity == leader {
        rotate_train_move_begin(ctx, self_idx);
    } else {
        let time = ctx.level.time;
        let ent = &mut ctx.edicts[self_idx];
        ent.nextthink = time + FRAMETIME;
        ent.think_fn = Some(rotate_train_move_begin);
    }
}

// ============================================================
// Train behaviour
// ============================================================

pub fn rotate_train_blocked(ctx: &mut GameContext, self_idx: usize, other_idx: usize) {
    let origin = ctx.edicts[other_idx].s.origin;

    if !ctx.edicts[other_idx].is_monster() && !ctx.is_client(other_idx) {
        // give it a chance to go away on its own terms (like gibs)
        t_damage(ctx, other_idx, self_idx, self_idx, VEC3_ORIGIN, origin, VEC3_ORIGIN, CRUSH_DAMAGE, 1, DamageFlags::empty(), MOD_CRUSH);
        // if it's still there, nuke it
        if ctx.edicts[other_idx].inuse {
            become_explosion1(ctx, other_idx);
        }
        return;
    }

    let time = ctx.level.time;
    let ent = &mut ctx.edicts[self_idx];
    if time < ent.touch_debounce_time || ent.dmg == 0 {
        return;
    }
    ent.touch_debounce_time = time + BLOCK_DEBOUNCE;
    let dmg = ent.dmg;
    t_damage(ctx, other_idx, self_idx, self_idx, VEC3_ORIGIN, origin, VEC3_ORIGIN, dmg, 1, DamageFlags::empty(), MOD_CRUSH);
}

/// Arrived at a corner: fire its pathtarget, then wait or carry on.
fn rotate_train_wait(ctx: &mut GameContext, self_idx: usize) {
    if let Some(corner) = ctx.ent(ctx.edicts[self_idx].target_ent) {
        if !ctx.edicts[corner].pathtarget.is_empty() {
            let savetarget = ctx.edicts[corner].target.clone();
            ctx.edicts[corner].target = ctx.edicts[corner].pathtarget.clone();
            let activator = ctx.ent(ctx.edicts[self_idx].activator).unwrap_or(self_idx);
            g_use_targets(ctx, corner, activator);
            ctx.edicts[corner].target = savetarget;

            // a killtarget may have removed us
            if !ctx.edicts[self_idx].inuse {
                return;
            }
        }
    }

    let wait = ctx.edicts[self_idx].moveinfo.wait;
    if wait == 0.0 {
        rotate_train_next(ctx, self_idx);
        return;
    }

    if wait > 0.0 {
        let time = ctx.level.time;
        let ent = &mut ctx.edicts[self_idx];
        ent.nextthink = time + wait;
        ent.think_fn = Some(rotate_train_next);
    } else if ctx.edicts[self_idx].spawnflags & RTRAIN_TOGGLE != 0 {
        rotate_train_next(ctx, self_idx);
        let ent = &mut ctx.edicts[self_idx];
        ent.spawnflags &= !RTRAIN_START_ON;
        ent.velocity = VEC3_ORIGIN;
        ent.nextthink = 0.0;
    }

    let ent = &mut ctx.edicts[self_idx];
    if !ent.flags.intersects(FL_TEAMSLAVE) {
        if ent.moveinfo.sound_end != 0 {
            gi_sound(self_idx as i32, CHAN_NO_PHS_ADD + CHAN_VOICE, ent.moveinfo.sound_end, 1.0, ATTN_STATIC, 0.0);
        }
        ent.s.sound = 0;
    }
}

/// Head for the next corner, jumping straight through teleport corners.
pub fn rotate_train_next(ctx: &mut GameContext, self_idx: usize) {
    let mut first = true;

    let corner = loop {
        let target = ctx.edicts[self_idx].target.clone();
        if target.is_empty() {
            return;
        }

        let Some(corner) = g_pick_target(ctx, &target) else {
            warn!("train_next: bad target {}", target);
            return;
        };

        ctx.edicts[self_idx].target = ctx.edicts[corner].target.clone();

        if ctx.edicts[corner].spawnflags & PATH_CORNER_TELEPORT == 0 {
            break corner;
        }

        if !first {
            let c = &ctx.edicts[corner];
            warn!("connected teleport path_corners, see {} at {}", c.classname, vtos(&c.s.origin));
            return;
        }
        first = false;

        let origin = ctx.edicts[corner].s.origin;
        let ent = &mut ctx.edicts[self_idx];
        ent.s.origin = origin;
        ent.s.old_origin = origin;
        ent.s.event = EV_OTHER_TELEPORT;
        gi_linkentity(self_idx as i32);
    };

    let wait = ctx.edicts[corner].wait;
    let ent = &mut ctx.edicts[self_idx];
    ent.moveinfo.wait = wait;
    ent.target_ent = corner as i32;

    if !ent.flags.intersects(FL_TEAMSLAVE) {
        if ent.moveinfo.sound_start != 0 {
            gi_sound(self_idx as i32, CHAN_NO_PHS_ADD + CHAN_VOICE, ent.moveinfo.sound_start, 1.0, ATTN_STATIC, 0.0);
        }
        ent.s.sound = ent.moveinfo.sound_middle;
    }

    apply_corner_settings(ctx, self_idx, corner, false);
    rotate_train_head_for(ctx, self_idx, corner);
}

/// Set up the leg toward `corner` and mark the train running.
fn rotate_train_head_for(ctx: &mut GameContext, self_idx: usize, corner: usize) {
    let dest = ctx.edicts[corner].s.origin;
    let ent = &mut ctx.edicts[self_idx];
    ent.moveinfo.state = STATE_TOP;
    ent.moveinfo.start_origin = ent.s.origin;
    ent.moveinfo.end_origin = dest;

    rotate_train_move_calc(ctx, self_idx, dest, rotate_train_wait);
    ctx.edicts[self_idx].spawnflags |= RTRAIN_START_ON;
}

fn rotate_train_resume(ctx: &mut GameContext, self_idx: usize) {
    if let Some(corner) = ctx.ent(ctx.edicts[self_idx].target_ent) {
        rotate_train_head_for(ctx, self_idx, corner);
    }
}

/// Place the train on its first corner once every entity has spawned.
pub fn rotate_train_find(ctx: &mut GameContext, self_idx: usize) {
    let target = ctx.edicts[self_idx].target.clone();
    if target.is_empty() {
        warn!("train_find: no target");
        return;
    }
    let Some(corner) = g_pick_target(ctx, &target) else {
        warn!("train_find: target {} not found", target);
        return;
    };
    ctx.edicts[self_idx].target = ctx.edicts[corner].target.clone();

    apply_corner_settings(ctx, self_idx, corner, true);

    ctx.edicts[self_idx].s.origin = ctx.edicts[corner].s.origin;
    gi_linkentity(self_idx as i32);

    let time = ctx.level.time;
    let ent = &mut ctx.edicts[self_idx];
    // if not triggered, start immediately
    if ent.targetname.is_empty() {
        ent.spawnflags |= RTRAIN_START_ON;
    }

    if ent.spawnflags & RTRAIN_START_ON != 0 {
        ent.nextthink = time + FRAMETIME;
        ent.think_fn = Some(rotate_train_next);
        ent.activator = self_idx as i32;
    }
}

pub fn rotate_train_use(ctx: &mut GameContext, self_idx: usize, _other_idx: usize, activator_idx: usize) {
    let ent = &mut ctx.edicts[self_idx];
    ent.activator = activator_idx as i32;

    if ent.spawnflags & RTRAIN_START_ON != 0 {
        if ent.spawnflags & RTRAIN_TOGGLE == 0 {
            return;
        }
        ent.spawnflags &= !RTRAIN_START_ON;
        ent.velocity = VEC3_ORIGIN;
        ent.nextthink = 0.0;
        debug!(ent = self_idx, "rotate train stopped");
    } else if ent.target_ent >= 0 {
        rotate_train_resume(ctx, self_idx);
    } else {
        rotate_train_next(ctx, self_idx);
    }
}

pub fn sp_func_rotate_train(ctx: &mut GameContext, self_idx: usize) {
    let noise = ctx.st.noise.clone();
    let time = ctx.level.time;
    let ent = &mut ctx.edicts[self_idx];
    ent.movetype = MoveType::Push;
    ent.s.angles = VEC3_ORIGIN;
    ent.blocked_fn = Some(rotate_train_blocked);

    if ent.spawnflags & RTRAIN_BLOCK_STOPS != 0 {
        ent.dmg = 0;
    } else if ent.dmg == 0 {
        ent.dmg = 100;
    }

    ent.solid = Solid::Bsp;
    gi_setmodel(self_idx as i32, &ent.model);

    if !noise.is_empty() {
        ent.moveinfo.sound_middle = gi_soundindex(&noise);
    }

    if ent.speed == 0.0 {
        ent.speed = 100.0;
    }
    ent.moveinfo.speed = ent.speed;
    ent.moveinfo.accel = ent.speed;
    ent.moveinfo.decel = ent.speed;

    ent.use_fn = Some(rotate_train_use);
    gi_linkentity(self_idx as i32);

    if ent.target.is_empty() {
        warn!("func_rotate_train without a target at {}", vtos(&ent.absmin));
    } else {
        ent.nextthink = time + FRAMETIME;
        ent.think_fn = Some(rotate_train_find);
    }
}
