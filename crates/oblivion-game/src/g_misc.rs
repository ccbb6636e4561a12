// g_misc.rs: gibs, explosions and path corners

use tracing::warn;

use crate::dispatch::call_stand;
use crate::g_local::*;
use crate::g_utils::{g_free_edict, g_free_edict_think, g_pick_target, g_spawn, g_use_targets, vtos};
use crate::game_import::*;

const SM_MEAT_MODEL: &str = "models/objects/gibs/sm_meat/tris.md2";

/// path_corner spawnflag: jump straight to the next corner.
pub const PATH_CORNER_TELEPORT: i32 = 1;

// ============================================================
// Gibs
// ============================================================

/// Random toss velocity for a gib, stronger for heavy hits.
pub fn velocity_for_damage(ctx: &mut GameContext, damage: i32) -> Vec3 {
    let v = [
        100.0 * ctx.crandom(),
        100.0 * ctx.crandom(),
        200.0 + 100.0 * ctx.random(),
    ];

    if damage < 50 {
        vector_scale(&v, 0.7)
    } else {
        vector_scale(&v, 1.2)
    }
}

/// Clamp gib velocity; gibs always fly somewhat upwards.
pub fn clip_gib_velocity(ent: &mut Edict) {
    ent.velocity[0] = ent.velocity[0].clamp(-300.0, 300.0);
    ent.velocity[1] = ent.velocity[1].clamp(-300.0, 300.0);
    ent.velocity[2] = ent.velocity[2].clamp(200.0, 500.0);
}

pub fn gib_think(ctx: &mut GameContext, self_idx: usize) {
    let time = ctx.level.time;
    let ent = &mut ctx.edicts[self_idx];
    ent.s.frame += 1;
    ent.nextthink = time + FRAMETIME;

    if ent.s.frame == 10 {
        ent.think_fn = Some(g_free_edict_think);
        let delay = 8.0 + ctx.random() * 10.0;
        ctx.edicts[self_idx].nextthink = time + delay;
    }
}

pub fn gib_touch(
    ctx: &mut GameContext,
    self_idx: usize,
    _other_idx: usize,
    plane: Option<&CPlane>,
    _surf: Option<&CSurface>,
) {
    if ctx.edicts[self_idx].groundentity < 0 {
        return;
    }
    ctx.edicts[self_idx].touch_fn = None;

    let Some(plane) = plane else {
        return;
    };

    gi_sound(self_idx as i32, CHAN_VOICE, gi_soundindex("misc/fhit3.wav"), 1.0, ATTN_NORM, 0.0);

    let normal_angles = vectoangles(&plane.normal);
    let (_, right, _) = angle_vectors_tuple(&normal_angles);
    ctx.edicts[self_idx].s.angles = vectoangles(&right);

    if ctx.edicts[self_idx].s.modelindex == gi_modelindex(SM_MEAT_MODEL) {
        let time = ctx.level.time;
        let ent = &mut ctx.edicts[self_idx];
        ent.s.frame += 1;
        ent.think_fn = Some(gib_think);
        ent.nextthink = time + FRAMETIME;
    }
}

pub fn gib_die(ctx: &mut GameContext, self_idx: usize, _inflictor: usize, _attacker: usize, _damage: i32, _point: Vec3) {
    g_free_edict(ctx, self_idx);
}

/// Organic gibs tumble and stick, metallic ones bounce at full speed.
fn gib_motion(ent: &mut Edict, gib_type: i32) -> f32 {
    if gib_type == GIB_ORGANIC {
        ent.movetype = MoveType::Toss;
        ent.touch_fn = Some(gib_touch);
        0.5
    } else {
        ent.movetype = MoveType::Bounce;
        1.0
    }
}

/// Spawn a gib chunk somewhere inside `self`'s bounding box.
pub fn throw_gib(ctx: &mut GameContext, self_idx: usize, gibname: &str, damage: i32, gib_type: i32) {
    let Some(gib_idx) = g_spawn(ctx) else {
        return;
    };

    let src = &ctx.edicts[self_idx];
    let center = src.bbox_center();
    let half = vector_scale(&vector_subtract(&src.maxs, &src.mins), 0.5);
    let self_vel = src.velocity;

    let jitter = [ctx.crandom(), ctx.crandom(), ctx.crandom()];
    let vd = velocity_for_damage(ctx, damage);
    let avel = [ctx.random() * 600.0, ctx.random() * 600.0, ctx.random() * 600.0];
    let life = 10.0 + ctx.random() * 10.0;
    let time = ctx.level.time;

    let gib = &mut ctx.edicts[gib_idx];
    for i in 0..3 {
        gib.s.origin[i] = center[i] + jitter[i] * half[i];
    }
    gib.classname = "gib".to_string();
    gib.model = gibname.to_string();
    gib.s.modelindex = gi_modelindex(gibname);
    gib.solid = Solid::Not;
    gib.s.effects |= EF_GIB;
    gib.flags.insert(FL_NO_KNOCKBACK);
    gib.takedamage = Damage::Yes as i32;
    gib.die_fn = Some(gib_die);

    let vscale = gib_motion(gib, gib_type);
    gib.velocity = vector_ma(&self_vel, vscale, &vd);
    clip_gib_velocity(gib);
    gib.avelocity = avel;

    gib.think_fn = Some(g_free_edict_think);
    gib.nextthink = time + life;

    gi_setmodel(gib_idx as i32, gibname);
    gi_linkentity(gib_idx as i32);
}

/// Turn `self` itself into a flying head gib.
pub fn throw_head(ctx: &mut GameContext, self_idx: usize, gibname: &str, damage: i32, gib_type: i32) {
    let vd = velocity_for_damage(ctx, damage);
    let yaw_spin = ctx.crandom() * 600.0;
    let life = 10.0 + ctx.random() * 10.0;
    let time = ctx.level.time;

    let ent = &mut ctx.edicts[self_idx];
    ent.s.skinnum = 0;
    ent.s.frame = 0;
    ent.mins = VEC3_ORIGIN;
    ent.maxs = VEC3_ORIGIN;
    ent.s.modelindex2 = 0;
    ent.model = gibname.to_string();
    ent.s.modelindex = gi_modelindex(gibname);
    ent.solid = Solid::Not;
    ent.s.effects |= EF_GIB;
    ent.s.sound = 0;
    ent.flags.insert(FL_NO_KNOCKBACK);
    ent.svflags &= !SVF_MONSTER;
    ent.takedamage = Damage::Yes as i32;
    ent.die_fn = Some(gib_die);
    ent.monsterinfo.currentmove = None;

    let vscale = gib_motion(ent, gib_type);
    ent.velocity = vector_ma(&ent.velocity, vscale, &vd);
    clip_gib_velocity(ent);
    ent.avelocity[YAW] = yaw_spin;

    ent.think_fn = Some(g_free_edict_think);
    ent.nextthink = time + life;

    gi_setmodel(self_idx as i32, gibname);
    gi_linkentity(self_idx as i32);
}

// ============================================================
// Explosions
// ============================================================

/// Replace the entity with an explosion temp entity.
pub fn become_explosion1(ctx: &mut GameContext, self_idx: usize) {
    let origin = ctx.edicts[self_idx].s.origin;
    gi_write_byte(SVC_TEMP_ENTITY);
    gi_write_byte(TE_EXPLOSION1);
    gi_write_position(&origin);
    gi_multicast(&origin, Multicast::Pvs);

    g_free_edict(ctx, self_idx);
}

// ============================================================
// path_corner
// ============================================================

/// A monster walking a path reached this corner: fire its pathtarget and
/// head for the next one.
pub fn path_corner_touch(
    ctx: &mut GameContext,
    self_idx: usize,
    other_idx: usize,
    _plane: Option<&CPlane>,
    _surf: Option<&CSurface>,
) {
    if ctx.edicts[other_idx].movetarget != self_idx as i32 || ctx.edicts[other_idx].enemy >= 0 {
        return;
    }

    if !ctx.edicts[self_idx].pathtarget.is_empty() {
        let savetarget = std::mem::take(&mut ctx.edicts[self_idx].target);
        ctx.edicts[self_idx].target = ctx.edicts[self_idx].pathtarget.clone();
        g_use_targets(ctx, self_idx, other_idx);
        if !ctx.edicts[self_idx].inuse {
            return;
        }
        ctx.edicts[self_idx].target = savetarget;
    }

    let target = ctx.edicts[self_idx].target.clone();
    let mut next = if target.is_empty() { None } else { g_pick_target(ctx, &target) };

    if let Some(next_idx) = next {
        if ctx.edicts[next_idx].spawnflags & PATH_CORNER_TELEPORT != 0 {
            let mut v = ctx.edicts[next_idx].s.origin;
            v[2] += ctx.edicts[next_idx].mins[2];
            v[2] -= ctx.edicts[other_idx].mins[2];
            ctx.edicts[other_idx].s.origin = v;
            ctx.edicts[other_idx].s.event = EV_OTHER_TELEPORT;
            let next_target = ctx.edicts[next_idx].target.clone();
            next = if next_target.is_empty() { None } else { g_pick_target(ctx, &next_target) };
        }
    }

    let next_ref = next.map_or(-1, |n| n as i32);
    ctx.edicts[other_idx].goalentity = next_ref;
    ctx.edicts[other_idx].movetarget = next_ref;

    let wait = ctx.edicts[self_idx].wait;
    if wait != 0.0 {
        ctx.edicts[other_idx].monsterinfo.pausetime = ctx.level.time + wait;
        call_stand(ctx, other_idx);
        return;
    }

    match next {
        None => {
            ctx.edicts[other_idx].monsterinfo.pausetime = ctx.level.time + 100_000_000.0;
            call_stand(ctx, other_idx);
        }
        Some(goal_idx) => {
            let v = vector_subtract(&ctx.edicts[goal_idx].s.origin, &ctx.edicts[other_idx].s.origin);
            ctx.edicts[other_idx].ideal_yaw = vectoyaw(&v);
        }
    }
}

pub fn sp_path_corner(ctx: &mut GameContext, self_idx: usize) {
    if ctx.edicts[self_idx].targetname.is_empty() {
        warn!("path_corner with no targetname at {}", vtos(&ctx.edicts[self_idx].s.origin));
        g_free_edict(ctx, self_idx);
        return;
    }

    let ent = &mut ctx.edicts[self_idx];
    ent.solid = Solid::Trigger;
    ent.touch_fn = Some(path_corner_touch);
    ent.mins = [-8.0, -8.0, -8.0];
    ent.maxs = [8.0, 8.0, 8.0];
    ent.svflags |= SVF_NOCLIENT;
    gi_linkentity(self_idx as i32);
}

// ============================================================
// info_null / info_notnull
// ============================================================

/// Spotlight target only; removed right away.
pub fn sp_info_null(ctx: &mut GameContext, self_idx: usize) {
    g_free_edict(ctx, self_idx);
}

/// Positional target that stays in the world.
pub fn sp_info_notnull(ctx: &mut GameContext, self_idx: usize) {
    let ent = &mut ctx.edicts[self_idx];
    ent.absmin = ent.s.origin;
    ent.absmax = ent.s.origin;
}
