// g_oblivion_monster.rs: deatom bolt fired by the cyborg

use crate::dispatch::call_touch;
use crate::g_combat::t_damage;
use crate::g_local::*;
use crate::g_monster::muzzleflash2;
use crate::g_utils::{g_free_edict, g_spawn};
use crate::game_import::*;

const DEATOM_LIFETIME: f32 = 2.0;
const DEATOM_LAST_FRAME: i32 = 14;

pub fn deatom_think(ctx: &mut GameContext, self_idx: usize) {
    let time = ctx.level.time;
    if time >= ctx.edicts[self_idx].timestamp {
        g_free_edict(ctx, self_idx);
        return;
    }

    let ent = &mut ctx.edicts[self_idx];
    ent.s.frame += 1;
    if ent.s.frame > DEATOM_LAST_FRAME {
        ent.s.frame = 0;
    }
    ent.nextthink = time + FRAMETIME;
}

pub fn deatom_touch(
    ctx: &mut GameContext,
    self_idx: usize,
    other_idx: usize,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    if ctx.edicts[self_idx].owner == other_idx as i32 {
        return;
    }

    if surf.is_some_and(CSurface::is_sky) {
        g_free_edict(ctx, self_idx);
        return;
    }

    gi_sound(self_idx as i32, CHAN_WEAPON, gi_soundindex("deatom/dimpact.wav"), 1.0, ATTN_NORM, 0.0);

    let origin = ctx.edicts[self_idx].s.origin;
    let normal = plane.map_or(VEC3_ORIGIN, |p| p.normal);

    if ctx.edicts[other_idx].takes_damage() {
        let attacker = ctx.ent(ctx.edicts[self_idx].owner).unwrap_or(self_idx);
        let (velocity, dmg) = (ctx.edicts[self_idx].velocity, ctx.edicts[self_idx].dmg);
        t_damage(ctx, other_idx, self_idx, attacker, velocity, origin, normal, dmg, 1, DAMAGE_ENERGY, MOD_DISINTEGRATOR);

        // killed outright: nothing is left behind
        if ctx.edicts[other_idx].inuse && ctx.edicts[other_idx].health <= 0 {
            let victim_origin = ctx.edicts[other_idx].s.origin;
            gi_write_byte(SVC_TEMP_ENTITY);
            gi_write_byte(TE_TELEPORT_EFFECT);
            gi_write_position(&victim_origin);
            gi_multicast(&victim_origin, Multicast::Pvs);
            g_free_edict(ctx, other_idx);
        }
    } else {
        gi_write_byte(SVC_TEMP_ENTITY);
        gi_write_byte(TE_BLUEHYPERBLASTER);
        gi_write_position(&origin);
        gi_write_dir(&normal);
        gi_multicast(&origin, Multicast::Phs);
    }

    g_free_edict(ctx, self_idx);
}

/// Launch a deatom bolt. If the muzzle is already inside something the bolt
/// hits it straight away.
pub fn fire_deatom(ctx: &mut GameContext, self_idx: usize, start: Vec3, dir: Vec3, damage: i32, speed: i32) {
    gi_sound(self_idx as i32, CHAN_WEAPON, gi_soundindex("deatom/dfire.wav"), 1.0, ATTN_NORM, 0.0);

    let Some(bolt) = g_spawn(ctx) else {
        return;
    };
    let time = ctx.level.time;

    let ent = &mut ctx.edicts[bolt];
    ent.s.origin = start;
    ent.s.old_origin = start;
    ent.s.angles = vectoangles(&dir);
    ent.velocity = vector_scale(&dir, speed as f32);
    ent.svflags |= SVF_PROJECTILE;
    ent.movetype = MoveType::FlyMissile;
    ent.clipmask = MASK_PROJECTILE;
    ent.flags |= FL_DODGE;
    ent.solid = Solid::Bbox;
    ent.s.effects |= EF_DUALFIRE;
    ent.dmg_radius = 128.0;
    ent.s.modelindex = gi_modelindex("models/objects/deatom/tris.md2");
    ent.s.scale = 0.75;
    ent.touch_fn = Some(deatom_touch);
    ent.s.sound = gi_soundindex("deatom/dfly.wav");
    ent.owner = self_idx as i32;
    ent.dmg = damage;
    ent.classname = "deatom".to_string();
    ent.timestamp = time + DEATOM_LIFETIME;
    ent.think_fn = Some(deatom_think);
    ent.nextthink = time + FRAMETIME;
    gi_linkentity(bolt as i32);

    let shooter_origin = ctx.edicts[self_idx].s.origin;
    let tr = gi_traceline(&shooter_origin, &start, bolt as i32, MASK_PROJECTILE);
    if tr.fraction < 1.0 {
        ctx.edicts[bolt].s.origin = vector_add(&tr.endpos, &tr.plane.normal);
        let other = ctx.ent(tr.ent_index).unwrap_or(0);
        call_touch(ctx, bolt, other, Some(&tr.plane), tr.surface.as_ref());
    }
}

pub fn monster_fire_deatom(
    ctx: &mut GameContext,
    self_idx: usize,
    start: Vec3,
    dir: Vec3,
    damage: i32,
    speed: i32,
    flashtype: i32,
) {
    fire_deatom(ctx, self_idx, start, dir, damage, speed);
    muzzleflash2(self_idx, &start, flashtype);
}
