// g_combat.rs: combat and damage functions

use rayon::prelude::*;
use tracing::trace;

use crate::dispatch::{call_die, call_pain};
use crate::g_ai::{found_target, visible};
use crate::g_local::*;
use crate::game_import::*;

/// Find all entities within a radius using parallel iteration.
///
/// Distance is measured to the centre of each entity's bounding box and
/// compared squared. Non-solid and free slots are skipped, as is the world.
///
/// # Returns
/// Indices of entities within the radius, sorted by index for deterministic ordering.
pub fn findradius(origin: Vec3, radius: f32, edicts: &[Edict]) -> Vec<usize> {
    if edicts.len() <= 1 {
        return Vec::new();
    }

    let radius_sq = radius * radius;

    let mut result: Vec<usize> = edicts[1..]
        .par_iter()
        .enumerate()
        .filter_map(|(rel_idx, ent)| {
            if !ent.inuse || ent.solid == Solid::Not {
                return None;
            }
            let eorg = vector_subtract(&origin, &ent.bbox_center());
            if dot_product(&eorg, &eorg) < radius_sq {
                Some(rel_idx + 1)
            } else {
                None
            }
        })
        .collect();

    // parallel collect doesn't preserve order
    result.sort_unstable();
    result
}

/// Returns true if the inflictor can directly damage the target. Used for
/// explosions and melee attacks.
pub fn can_damage(ctx: &GameContext, targ_idx: usize, inflictor_idx: usize) -> bool {
    let targ = &ctx.edicts[targ_idx];
    let start = ctx.edicts[inflictor_idx].s.origin;
    let pass = inflictor_idx as i32;

    // bmodels need special checking because their origin is 0,0,0
    if targ.movetype == MoveType::Push {
        let dest = vector_scale(&vector_add(&targ.absmin, &targ.absmax), 0.5);
        let trace = gi_traceline(&start, &dest, pass, MASK_SOLID);
        return trace.fraction == 1.0 || trace.ent_index == targ_idx as i32;
    }

    let origin = targ.s.origin;
    let probes: [Vec3; 5] = [
        origin,
        [origin[0] + 15.0, origin[1] + 15.0, origin[2]],
        [origin[0] + 15.0, origin[1] - 15.0, origin[2]],
        [origin[0] - 15.0, origin[1] + 15.0, origin[2]],
        [origin[0] - 15.0, origin[1] - 15.0, origin[2]],
    ];

    probes
        .iter()
        .any(|dest| gi_traceline(&start, dest, pass, MASK_SOLID).fraction == 1.0)
}

/// Called when an entity's health drops to zero or below.
pub fn killed(
    ctx: &mut GameContext,
    targ_idx: usize,
    inflictor_idx: usize,
    attacker_idx: usize,
    damage: i32,
    point: Vec3,
) {
    let targ = &mut ctx.edicts[targ_idx];
    if targ.health < -999 {
        targ.health = -999;
    }
    targ.enemy = attacker_idx as i32;

    let live_monster = targ.is_monster() && targ.deadflag != DEAD_DEAD;
    if live_monster && !targ.monsterinfo.aiflags.intersects(AI_GOOD_GUY) {
        ctx.level.killed_monsters += 1;
    }

    let movetype = ctx.edicts[targ_idx].movetype;
    if matches!(movetype, MoveType::Push | MoveType::Stop | MoveType::None) {
        // doors, triggers, etc
        call_die(ctx, targ_idx, inflictor_idx, attacker_idx, damage, point);
        return;
    }

    if live_monster {
        ctx.edicts[targ_idx].touch_fn = None;
    }

    call_die(ctx, targ_idx, inflictor_idx, attacker_idx, damage, point);
}

/// Blood, sparks and other impact puffs.
pub fn spawn_damage(te_type: i32, origin: Vec3, normal: Vec3) {
    gi_write_byte(SVC_TEMP_ENTITY);
    gi_write_byte(te_type);
    gi_write_position(&origin);
    gi_write_dir(&normal);
    gi_multicast(&origin, Multicast::Pvs);
}

/// Power armour absorption for monsters. Returns the amount saved.
fn check_power_armor(
    ctx: &mut GameContext,
    ent_idx: usize,
    point: Vec3,
    normal: Vec3,
    damage: i32,
    dflags: DamageFlags,
) -> i32 {
    if damage == 0 || dflags.intersects(DAMAGE_NO_ARMOR) {
        return 0;
    }

    let ent = &ctx.edicts[ent_idx];
    if !ent.is_monster() {
        return 0;
    }

    let power = ent.monsterinfo.power_armor_power;
    let (damage_per_cell, te_type, damage) = match ent.monsterinfo.power_armor_type {
        POWER_ARMOR_SCREEN => {
            // only works if damage point is in front
            let (forward, _, _) = angle_vectors_tuple(&ent.s.angles);
            let vec = vector_normalized(&vector_subtract(&point, &ent.s.origin));
            if dot_product(&vec, &forward) <= 0.3 {
                return 0;
            }
            (1, TE_SCREEN_SPARKS, damage / 3)
        }
        POWER_ARMOR_SHIELD => (2, TE_SHIELD_SPARKS, (2 * damage) / 3),
        _ => return 0,
    };

    if power <= 0 {
        return 0;
    }

    let save = (power * damage_per_cell).min(damage);
    if save == 0 {
        return 0;
    }

    spawn_damage(te_type, point, normal);
    ctx.edicts[ent_idx].monsterinfo.power_armor_power -= save / damage_per_cell;
    save
}

/// A damaged monster turns on whoever hurt it.
pub fn m_react_to_damage(ctx: &mut GameContext, targ_idx: usize, attacker_idx: usize) {
    if attacker_idx == targ_idx {
        return;
    }
    let attacker = &ctx.edicts[attacker_idx];
    if attacker.client.is_none() && !attacker.is_monster() {
        return;
    }

    let targ_enemy = ctx.edicts[targ_idx].enemy;
    if attacker_idx as i32 == targ_enemy {
        return;
    }

    // good guy monsters don't get mad at players or other good guys
    if ctx.edicts[targ_idx].monsterinfo.aiflags.intersects(AI_GOOD_GUY)
        && (attacker.client.is_some() || attacker.monsterinfo.aiflags.intersects(AI_GOOD_GUY))
    {
        return;
    }

    let enemy_is_client = ctx.ent(targ_enemy).is_some_and(|e| ctx.is_client(e));

    if attacker.client.is_some() {
        ctx.edicts[targ_idx].monsterinfo.aiflags.remove(AI_SOUND_TARGET);

        // coop: only switch clients if the current one is out of sight
        if enemy_is_client {
            if visible(ctx, targ_idx, targ_enemy as usize) {
                ctx.edicts[targ_idx].oldenemy = attacker_idx as i32;
                return;
            }
            ctx.edicts[targ_idx].oldenemy = targ_enemy;
        }
        get_mad_at(ctx, targ_idx, attacker_idx as i32);
        return;
    }

    let move_kind = EntityFlags::FLY | EntityFlags::SWIM;
    let same_kind = ctx.edicts[targ_idx].flags & move_kind == attacker.flags & move_kind;
    let new_enemy = if same_kind && ctx.edicts[targ_idx].classname != attacker.classname {
        Some(attacker_idx as i32)
    } else if attacker.enemy == targ_idx as i32 {
        // they meant to shoot us
        Some(attacker_idx as i32)
    } else if attacker.enemy >= 0 && attacker.enemy != targ_idx as i32 {
        // help our buddy
        Some(attacker.enemy)
    } else {
        None
    };

    if let Some(enemy) = new_enemy {
        if enemy_is_client {
            ctx.edicts[targ_idx].oldenemy = targ_enemy;
        }
        get_mad_at(ctx, targ_idx, enemy);
    }
}

fn get_mad_at(ctx: &mut GameContext, targ_idx: usize, enemy: i32) {
    ctx.edicts[targ_idx].enemy = enemy;
    if !ctx.edicts[targ_idx].monsterinfo.aiflags.intersects(AI_DUCKED) {
        found_target(ctx, targ_idx);
    }
}

/// Main damage function.
///
/// `dir` is the direction of the attack, `point` where the damage is being
/// inflicted, `normal` the surface normal at that point. `knockback` is
/// the force to be applied against the target.
pub fn t_damage(
    ctx: &mut GameContext,
    targ_idx: usize,
    inflictor_idx: usize,
    attacker_idx: usize,
    dir: Vec3,
    point: Vec3,
    normal: Vec3,
    damage: i32,
    knockback: i32,
    dflags: DamageFlags,
    mod_type: i32,
) {
    if targ_idx >= ctx.edicts.len() || !ctx.edicts[targ_idx].takes_damage() {
        return;
    }

    ctx.means_of_death = mod_type;
    let mut damage = damage;

    // easy mode takes half damage
    if ctx.skill == 0.0 && ctx.deathmatch == 0.0 && ctx.is_client(targ_idx) {
        damage = ((damage as f32 * 0.5) as i32).max(1);
    }

    let dir = vector_normalized(&dir);

    // bonus damage for surprising a monster
    if !dflags.intersects(DAMAGE_RADIUS)
        && ctx.edicts[targ_idx].is_monster()
        && ctx.is_client(attacker_idx)
        && ctx.edicts[targ_idx].enemy < 0
        && ctx.edicts[targ_idx].health > 0
    {
        damage *= 2;
    }

    let mut knockback = knockback;
    if ctx.edicts[targ_idx].flags.intersects(FL_NO_KNOCKBACK) {
        knockback = 0;
    }

    // figure momentum add
    if !dflags.intersects(DAMAGE_NO_KNOCKBACK) && knockback != 0 {
        let targ = &mut ctx.edicts[targ_idx];
        if !matches!(
            targ.movetype,
            MoveType::None | MoveType::Bounce | MoveType::Push | MoveType::Stop
        ) {
            let mass = targ.mass.max(50) as f32;
            let kvel = vector_scale(&dir, 500.0 * knockback as f32 / mass);
            targ.velocity = vector_add(&targ.velocity, &kvel);
        }
    }

    let mut take = damage;

    // check for godmode
    if ctx.edicts[targ_idx].flags.intersects(FL_GODMODE) && !dflags.intersects(DAMAGE_NO_PROTECTION) {
        take = 0;
        spawn_damage(TE_SPARKS, point, normal);
    }

    take -= check_power_armor(ctx, targ_idx, point, normal, take, dflags);

    let bleeds = ctx.edicts[targ_idx].is_monster() || ctx.is_client(targ_idx);

    if take != 0 {
        spawn_damage(if bleeds { TE_BLOOD } else { TE_SPARKS }, point, normal);

        ctx.edicts[targ_idx].health -= take;
        trace!(target_idx = targ_idx, take, mod_type, "damage");

        if ctx.edicts[targ_idx].health <= 0 {
            if bleeds {
                ctx.edicts[targ_idx].flags.insert(FL_NO_KNOCKBACK);
            }
            killed(ctx, targ_idx, inflictor_idx, attacker_idx, take, point);
            return;
        }
    }

    if ctx.edicts[targ_idx].is_monster() {
        m_react_to_damage(ctx, targ_idx, attacker_idx);
        if !ctx.edicts[targ_idx].monsterinfo.aiflags.intersects(AI_DUCKED) && take != 0 {
            call_pain(ctx, targ_idx, attacker_idx, knockback as f32, take);
            // nightmare mode monsters don't go into pain frames often
            if ctx.skill == 3.0 {
                ctx.edicts[targ_idx].pain_debounce_time = ctx.level.time + 5.0;
            }
        }
    } else if take != 0 {
        call_pain(ctx, targ_idx, attacker_idx, knockback as f32, take);
    }
}

/// Damage falling off with distance from the inflictor.
///
/// Candidates and their damage are computed in parallel; the damage itself is
/// applied sequentially since traces and callbacks go through the host.
pub fn t_radius_damage(
    ctx: &mut GameContext,
    inflictor_idx: usize,
    attacker_idx: usize,
    damage: f32,
    ignore_idx: Option<usize>,
    radius: f32,
    mod_type: i32,
) {
    let inflictor_origin = ctx.edicts[inflictor_idx].s.origin;

    let candidates = findradius(inflictor_origin, radius, &ctx.edicts);

    let hits: Vec<(usize, Vec3, i32)> = candidates
        .par_iter()
        .filter_map(|&ent_idx| {
            if Some(ent_idx) == ignore_idx {
                return None;
            }
            let ent = &ctx.edicts[ent_idx];
            if !ent.takes_damage() {
                return None;
            }

            let to_center = vector_subtract(&inflictor_origin, &ent.bbox_center());
            let mut points = damage - 0.5 * vector_length(&to_center);
            if ent_idx == attacker_idx {
                points *= 0.5;
            }
            if points <= 0.0 {
                return None;
            }

            let dir = vector_subtract(&ent.s.origin, &inflictor_origin);
            Some((ent_idx, dir, points as i32))
        })
        .collect();

    for (ent_idx, dir, points) in hits {
        if !ctx.edicts[ent_idx].inuse || !can_damage(ctx, ent_idx, inflictor_idx) {
            continue;
        }
        t_damage(
            ctx,
            ent_idx,
            inflictor_idx,
            attacker_idx,
            dir,
            inflictor_origin,
            VEC3_ORIGIN,
            points,
            points,
            DAMAGE_RADIUS,
            mod_type,
        );
    }
}
