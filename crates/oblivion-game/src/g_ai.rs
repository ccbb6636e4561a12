// g_ai.rs: monster AI functions

use tracing::trace;

use crate::dispatch::{call_attack, call_melee, call_run, call_search, call_idle, call_sight, call_stand, call_walk};
use crate::g_local::*;
use crate::game_import::*;
use crate::m_move::{m_change_yaw, m_move_to_goal, m_walkmove};

/// Called once each frame to set `level.sight_client` to the next live
/// player, so monsters only check one client per frame.
pub fn ai_set_sight_client(ctx: &mut GameContext) {
    let max = (ctx.maxclients as i32).min(ctx.edicts.len() as i32 - 1);
    if max < 1 {
        ctx.level.sight_client = -1;
        return;
    }

    let start = if ctx.level.sight_client < 1 { max } else { ctx.level.sight_client.min(max) };
    let mut check = start;
    loop {
        check += 1;
        if check > max {
            check = 1;
        }
        let ent = &ctx.edicts[check as usize];
        if ent.inuse && ent.health > 0 && !ent.flags.intersects(FL_NOTARGET) {
            ctx.level.sight_client = check;
            return;
        }
        if check == start {
            ctx.level.sight_client = -1;
            return;
        }
    }
}

// ============================================================================

/// Move the specified distance at the current facing.
pub fn ai_move(ctx: &mut GameContext, self_idx: usize, dist: f32) {
    let yaw = ctx.edicts[self_idx].s.angles[YAW];
    m_walkmove(ctx, self_idx, yaw, dist);
}

/// Used for standing around and looking for players.
/// Distance is for slight position adjustments needed by the animations.
pub fn ai_stand(ctx: &mut GameContext, self_idx: usize, dist: f32) {
    if dist != 0.0 {
        ai_move(ctx, self_idx, dist);
    }

    if ctx.edicts[self_idx].monsterinfo.aiflags.intersects(AI_STAND_GROUND) {
        match ctx.ent(ctx.edicts[self_idx].enemy) {
            Some(enemy_idx) => {
                let ideal = yaw_to(ctx, self_idx, enemy_idx);
                let ent = &mut ctx.edicts[self_idx];
                ent.ideal_yaw = ideal;
                if ent.s.angles[YAW] != ideal
                    && ent.monsterinfo.aiflags.intersects(AI_TEMP_STAND_GROUND)
                {
                    ent.monsterinfo.aiflags.remove(AI_STAND_GROUND | AI_TEMP_STAND_GROUND);
                    call_run(ctx, self_idx);
                }
                m_change_yaw(ctx, self_idx);
                ai_checkattack(ctx, self_idx, 0.0);
            }
            None => {
                find_target(ctx, self_idx);
            }
        }
        return;
    }

    if find_target(ctx, self_idx) {
        return;
    }

    let time = ctx.level.time;
    if time > ctx.edicts[self_idx].monsterinfo.pausetime {
        call_walk(ctx, self_idx);
        return;
    }

    let ent = &ctx.edicts[self_idx];
    if ent.spawnflags & 1 == 0 && ent.monsterinfo.idle_fn.is_some() && time > ent.monsterinfo.idle_time {
        if ent.monsterinfo.idle_time != 0.0 {
            call_idle(ctx, self_idx);
            let r = ctx.random();
            ctx.edicts[self_idx].monsterinfo.idle_time = time + 15.0 + r * 15.0;
        } else {
            let r = ctx.random();
            ctx.edicts[self_idx].monsterinfo.idle_time = time + r * 15.0;
        }
    }
}

/// The monster is walking its beat.
pub fn ai_walk(ctx: &mut GameContext, self_idx: usize, dist: f32) {
    m_move_to_goal(ctx, self_idx, dist);

    // check for noticing a player
    if find_target(ctx, self_idx) {
        return;
    }

    let time = ctx.level.time;
    let ent = &ctx.edicts[self_idx];
    if ent.monsterinfo.search_fn.is_some() && time > ent.monsterinfo.idle_time {
        if ent.monsterinfo.idle_time != 0.0 {
            call_search(ctx, self_idx);
            let r = ctx.random();
            ctx.edicts[self_idx].monsterinfo.idle_time = time + 15.0 + r * 15.0;
        } else {
            let r = ctx.random();
            ctx.edicts[self_idx].monsterinfo.idle_time = time + r * 15.0;
        }
    }
}

/// Turns towards target and advances.
/// Use this call with a distance of 0 to replace ai_face.
pub fn ai_charge(ctx: &mut GameContext, self_idx: usize, dist: f32) {
    if let Some(enemy_idx) = ctx.ent(ctx.edicts[self_idx].enemy) {
        ctx.edicts[self_idx].ideal_yaw = yaw_to(ctx, self_idx, enemy_idx);
    }
    m_change_yaw(ctx, self_idx);

    if dist != 0.0 {
        ai_move(ctx, self_idx, dist);
    }
}

/// Don't move, but turn towards ideal_yaw.
/// Distance is for slight position adjustments needed by the animations.
pub fn ai_turn(ctx: &mut GameContext, self_idx: usize, dist: f32) {
    if dist != 0.0 {
        ai_move(ctx, self_idx, dist);
    }

    if find_target(ctx, self_idx) {
        return;
    }

    m_change_yaw(ctx, self_idx);
}

/// The monster has an enemy it is trying to kill.
pub fn ai_run(ctx: &mut GameContext, self_idx: usize, dist: f32) {
    if ai_checkattack(ctx, self_idx, dist) {
        return;
    }

    if ctx.edicts[self_idx].monsterinfo.attack_state == AS_SLIDING {
        ai_run_slide(ctx, self_idx, dist);
        return;
    }

    let enemy = ctx.edicts[self_idx].enemy;
    if ctx.ai.enemy_vis {
        if let Some(enemy_idx) = ctx.ent(enemy) {
            let enemy_origin = ctx.edicts[enemy_idx].s.origin;
            let ent = &mut ctx.edicts[self_idx];
            ent.monsterinfo.aiflags.remove(AI_LOST_SIGHT);
            ent.monsterinfo.last_sighting = enemy_origin;
        }
        m_move_to_goal(ctx, self_idx, dist);
        return;
    }

    // out of sight: keep closing on the enemy
    let ent = &mut ctx.edicts[self_idx];
    if !ent.monsterinfo.aiflags.intersects(AI_LOST_SIGHT) {
        trace!(self_idx, "lost sight of enemy");
        ent.monsterinfo.aiflags.insert(AI_LOST_SIGHT);
    }
    ent.goalentity = enemy;
    m_move_to_goal(ctx, self_idx, dist);
}

// ============================================================================

/// Returns the range categorization of an entity relative to self.
/// 0 melee range, 1 near, 2 mid, 3 far
pub fn range(self_ent: &Edict, other: &Edict) -> i32 {
    let len = vector_length(&vector_subtract(&self_ent.s.origin, &other.s.origin));

    if len < MELEE_DISTANCE {
        RANGE_MELEE
    } else if len < 500.0 {
        RANGE_NEAR
    } else if len < 1000.0 {
        RANGE_MID
    } else {
        RANGE_FAR
    }
}

/// Returns true if the entity is visible to self, even if not infront().
pub fn visible(ctx: &GameContext, self_idx: usize, other_idx: usize) -> bool {
    let self_ent = &ctx.edicts[self_idx];
    let other = &ctx.edicts[other_idx];

    let mut spot1 = self_ent.s.origin;
    spot1[2] += self_ent.viewheight as f32;
    let mut spot2 = other.s.origin;
    spot2[2] += other.viewheight as f32;

    gi_traceline(&spot1, &spot2, self_idx as i32, MASK_OPAQUE).fraction == 1.0
}

/// Returns true if the entity is in front (in sight) of self.
pub fn infront(self_ent: &Edict, other: &Edict) -> bool {
    let (forward, _, _) = angle_vectors_tuple(&self_ent.s.angles);
    let vec = vector_normalized(&vector_subtract(&other.s.origin, &self_ent.s.origin));
    dot_product(&vec, &forward) > 0.3
}

pub fn facing_ideal(self_ent: &Edict) -> bool {
    let delta = anglemod(self_ent.s.angles[YAW] - self_ent.ideal_yaw);
    !(delta > 45.0 && delta < 315.0)
}

fn yaw_to(ctx: &GameContext, self_idx: usize, other_idx: usize) -> f32 {
    vectoyaw(&vector_subtract(&ctx.edicts[other_idx].s.origin, &ctx.edicts[self_idx].s.origin))
}

// ============================================================================

pub fn hunt_target(ctx: &mut GameContext, self_idx: usize) {
    let ent = &mut ctx.edicts[self_idx];
    ent.goalentity = ent.enemy;
    let stand_ground = ent.monsterinfo.aiflags.intersects(AI_STAND_GROUND);

    if stand_ground {
        call_stand(ctx, self_idx);
    } else {
        call_run(ctx, self_idx);
    }

    if let Some(enemy_idx) = ctx.ent(ctx.edicts[self_idx].enemy) {
        ctx.edicts[self_idx].ideal_yaw = yaw_to(ctx, self_idx, enemy_idx);
    }

    // wait a while before first attack
    if !stand_ground {
        ctx.edicts[self_idx].monsterinfo.attack_finished = ctx.level.time + 1.0;
    }
}

/// The monster has just acquired `enemy`: remember where it was seen and
/// start hunting it.
pub fn found_target(ctx: &mut GameContext, self_idx: usize) {
    if let Some(enemy_idx) = ctx.ent(ctx.edicts[self_idx].enemy) {
        let origin = ctx.edicts[enemy_idx].s.origin;
        ctx.edicts[self_idx].monsterinfo.last_sighting = origin;
    }
    hunt_target(ctx, self_idx);
}

/// Self is currently not attacking anything, so try to find a target.
///
/// Returns true if an enemy was sighted. Only `level.sight_client` is checked
/// each frame.
pub fn find_target(ctx: &mut GameContext, self_idx: usize) -> bool {
    if ctx.edicts[self_idx].monsterinfo.aiflags.intersects(AI_GOOD_GUY) {
        return false;
    }

    let Some(client_idx) = ctx.ent(ctx.level.sight_client) else {
        return false;
    };

    if client_idx as i32 == ctx.edicts[self_idx].enemy {
        return true;
    }

    let client = &ctx.edicts[client_idx];
    if client.flags.intersects(FL_NOTARGET) || client.health <= 0 {
        return false;
    }

    let r = range(&ctx.edicts[self_idx], client);
    if r == RANGE_FAR {
        return false;
    }
    if !visible(ctx, self_idx, client_idx) {
        return false;
    }
    if r == RANGE_MID && !infront(&ctx.edicts[self_idx], &ctx.edicts[client_idx]) {
        return false;
    }

    ctx.edicts[self_idx].enemy = client_idx as i32;
    trace!(self_idx, client_idx, "target acquired");

    found_target(ctx, self_idx);
    if !ctx.edicts[self_idx].monsterinfo.aiflags.intersects(AI_SOUND_TARGET) {
        call_sight(ctx, self_idx, client_idx);
    }
    true
}

// =============================================================================

/// Default attack check: melee when close enough, otherwise a missile attack
/// on a chance that falls off with range.
pub fn m_check_attack(ctx: &mut GameContext, self_idx: usize) -> bool {
    let Some(enemy_idx) = ctx.ent(ctx.edicts[self_idx].enemy) else {
        return false;
    };

    if ctx.edicts[enemy_idx].health > 0 {
        // see if any entities are in the way of the shot
        let mut spot1 = ctx.edicts[self_idx].s.origin;
        spot1[2] += ctx.edicts[self_idx].viewheight as f32;
        let mut spot2 = ctx.edicts[enemy_idx].s.origin;
        spot2[2] += ctx.edicts[enemy_idx].viewheight as f32;

        let tr = gi_traceline(
            &spot1,
            &spot2,
            self_idx as i32,
            CONTENTS_SOLID | CONTENTS_MONSTER | CONTENTS_SLIME | CONTENTS_LAVA | CONTENTS_WINDOW,
        );

        // do we have a clear shot?
        if tr.fraction < 1.0 && tr.ent_index != enemy_idx as i32 {
            return false;
        }
    }

    // melee attack
    if ctx.ai.enemy_range == RANGE_MELEE {
        // don't always melee in easy mode
        if ctx.skill == 0.0 && (ctx.rand_int() & 3) != 0 {
            return false;
        }
        let info = &mut ctx.edicts[self_idx].monsterinfo;
        info.attack_state = if info.melee_fn.is_some() { AS_MELEE } else { AS_MISSILE };
        return true;
    }

    // missile attack
    let info = &ctx.edicts[self_idx].monsterinfo;
    if info.attack_fn.is_none()
        || ctx.level.time < info.attack_finished
        || ctx.ai.enemy_range == RANGE_FAR
    {
        return false;
    }

    let mut chance = if info.aiflags.intersects(AI_STAND_GROUND) {
        0.4
    } else {
        match ctx.ai.enemy_range {
            RANGE_NEAR => 0.1,
            RANGE_MID => 0.02,
            _ => return false,
        }
    };

    if ctx.skill == 0.0 {
        chance *= 0.5;
    } else if ctx.skill >= 2.0 {
        chance *= 2.0;
    }

    if ctx.random() < chance {
        let r = ctx.random();
        let info = &mut ctx.edicts[self_idx].monsterinfo;
        info.attack_state = AS_MISSILE;
        info.attack_finished = ctx.level.time + 2.0 * r;
        return true;
    }

    if ctx.edicts[self_idx].flags.intersects(FL_FLY) {
        let r = ctx.random();
        ctx.edicts[self_idx].monsterinfo.attack_state = if r < 0.3 { AS_SLIDING } else { AS_STRAIGHT };
    }

    false
}

/// Turn and close until within an angle to launch a melee attack.
pub fn ai_run_melee(ctx: &mut GameContext, self_idx: usize) {
    ctx.edicts[self_idx].ideal_yaw = ctx.ai.enemy_yaw;
    m_change_yaw(ctx, self_idx);

    if facing_ideal(&ctx.edicts[self_idx]) {
        call_melee(ctx, self_idx);
        ctx.edicts[self_idx].monsterinfo.attack_state = AS_STRAIGHT;
    }
}

/// Turn in place until within an angle to launch a missile attack.
pub fn ai_run_missile(ctx: &mut GameContext, self_idx: usize) {
    ctx.edicts[self_idx].ideal_yaw = ctx.ai.enemy_yaw;
    m_change_yaw(ctx, self_idx);

    if facing_ideal(&ctx.edicts[self_idx]) {
        call_attack(ctx, self_idx);
        ctx.edicts[self_idx].monsterinfo.attack_state = AS_STRAIGHT;
    }
}

/// Strafe sideways, but stay at approximately the same range.
pub fn ai_run_slide(ctx: &mut GameContext, self_idx: usize, distance: f32) {
    ctx.edicts[self_idx].ideal_yaw = ctx.ai.enemy_yaw;
    m_change_yaw(ctx, self_idx);

    let ideal_yaw = ctx.edicts[self_idx].ideal_yaw;
    let ofs = if ctx.edicts[self_idx].monsterinfo.lefty != 0 { 90.0 } else { -90.0 };

    if m_walkmove(ctx, self_idx, ideal_yaw + ofs, distance) {
        return;
    }

    let info = &mut ctx.edicts[self_idx].monsterinfo;
    info.lefty = 1 - info.lefty;
    m_walkmove(ctx, self_idx, ideal_yaw - ofs, distance);
}

/// Decides if we're going to attack or do something else.
/// Used by ai_run and ai_stand.
pub fn ai_checkattack(ctx: &mut GameContext, self_idx: usize, _dist: f32) -> bool {
    ctx.ai.enemy_vis = false;

    let enemy_idx = ctx
        .ent(ctx.edicts[self_idx].enemy)
        .filter(|&e| ctx.edicts[e].health > 0);

    let Some(enemy_idx) = enemy_idx else {
        enemy_gone(ctx, self_idx);
        return true;
    };

    ctx.ai.enemy_vis = visible(ctx, self_idx, enemy_idx);
    if ctx.ai.enemy_vis {
        let origin = ctx.edicts[enemy_idx].s.origin;
        ctx.edicts[self_idx].monsterinfo.last_sighting = origin;
    }

    ctx.ai.enemy_infront = infront(&ctx.edicts[self_idx], &ctx.edicts[enemy_idx]);
    ctx.ai.enemy_range = range(&ctx.edicts[self_idx], &ctx.edicts[enemy_idx]);
    ctx.ai.enemy_yaw = yaw_to(ctx, self_idx, enemy_idx);

    match ctx.edicts[self_idx].monsterinfo.attack_state {
        AS_MISSILE => {
            ai_run_missile(ctx, self_idx);
            return true;
        }
        AS_MELEE => {
            ai_run_melee(ctx, self_idx);
            return true;
        }
        _ => {}
    }

    if !ctx.ai.enemy_vis {
        return false;
    }

    m_check_attack(ctx, self_idx)
}

/// The enemy died or went away: fall back to the old enemy, the patrol
/// path, or standing around.
fn enemy_gone(ctx: &mut GameContext, self_idx: usize) {
    let ent = &mut ctx.edicts[self_idx];
    ent.enemy = -1;
    let oldenemy = ent.oldenemy;
    ent.oldenemy = -1;

    if let Some(old) = ctx.ent(oldenemy) {
        if ctx.edicts[old].health > 0 {
            ctx.edicts[self_idx].enemy = old as i32;
            hunt_target(ctx, self_idx);
            return;
        }
    }

    if ctx.ent(ctx.edicts[self_idx].movetarget).is_some() {
        let ent = &mut ctx.edicts[self_idx];
        ent.goalentity = ent.movetarget;
        call_walk(ctx, self_idx);
    } else {
        ctx.edicts[self_idx].monsterinfo.pausetime = ctx.level.time + 100_000_000.0;
        call_stand(ctx, self_idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_import::testing;

    const MONSTER: usize = 2;
    const PLAYER: usize = 1;

    fn count_run(ctx: &mut GameContext, self_idx: usize) {
        ctx.edicts[self_idx].dmg += 1;
    }

    fn count_stand(ctx: &mut GameContext, self_idx: usize) {
        ctx.edicts[self_idx].dmg += 100;
    }

    fn count_attack(ctx: &mut GameContext, self_idx: usize) {
        ctx.edicts[self_idx].radius_dmg += 1;
    }

    fn record_sight(ctx: &mut GameContext, self_idx: usize, other: usize) {
        ctx.edicts[self_idx].activator = other as i32;
    }

    fn make_ctx() -> GameContext {
        testing::install();
        let mut ctx = GameCtx::with_capacity(16, 1);
        ctx.edicts[PLAYER].inuse = true;
        ctx.edicts[PLAYER].health = 100;
        ctx.edicts[PLAYER].s.origin = [200.0, 0.0, 0.0];

        let mut m = Edict::default();
        m.inuse = true;
        m.svflags = SVF_MONSTER;
        m.health = 50;
        m.yaw_speed = 360.0;
        m.monsterinfo.run_fn = Some(count_run);
        m.monsterinfo.stand_fn = Some(count_stand);
        m.monsterinfo.attack_fn = Some(count_attack);
        m.monsterinfo.sight_fn = Some(record_sight);
        ctx.edicts.push(m);
        ctx.num_edicts = ctx.edicts.len() as i32;
        ctx
    }

    #[test]
    fn test_range_buckets() {
        let mut a = Edict::default();
        let mut b = Edict::default();
        b.s.origin = [79.0, 0.0, 0.0];
        assert_eq!(range(&a, &b), RANGE_MELEE);
        b.s.origin = [499.0, 0.0, 0.0];
        assert_eq!(range(&a, &b), RANGE_NEAR);
        b.s.origin = [999.0, 0.0, 0.0];
        assert_eq!(range(&a, &b), RANGE_MID);
        a.s.origin = [-10.0, 0.0, 0.0];
        assert_eq!(range(&a, &b), RANGE_FAR);
    }

    #[test]
    fn test_infront_uses_cone() {
        let a = Edict::default();
        let mut b = Edict::default();
        b.s.origin = [100.0, 20.0, 0.0];
        assert!(infront(&a, &b));
        b.s.origin = [0.0, 100.0, 0.0];
        assert!(!infront(&a, &b));
    }

    #[test]
    fn test_visible_follows_trace() {
        let ctx = make_ctx();
        assert!(visible(&ctx, MONSTER, PLAYER));
        testing::push_trace(Trace { fraction: 0.3, ..Trace::default() });
        assert!(!visible(&ctx, MONSTER, PLAYER));
    }

    #[test]
    fn test_set_sight_client_skips_dead() {
        let mut ctx = make_ctx();
        ai_set_sight_client(&mut ctx);
        assert_eq!(ctx.level.sight_client, PLAYER as i32);
        ctx.edicts[PLAYER].health = 0;
        ai_set_sight_client(&mut ctx);
        assert_eq!(ctx.level.sight_client, -1);
    }

    #[test]
    fn test_find_target_acquires_visible_player() {
        let mut ctx = make_ctx();
        ai_set_sight_client(&mut ctx);
        assert!(find_target(&mut ctx, MONSTER));
        let m = &ctx.edicts[MONSTER];
        assert_eq!(m.enemy, PLAYER as i32);
        assert_eq!(m.goalentity, PLAYER as i32);
        assert_eq!(m.activator, PLAYER as i32);
        assert_eq!(m.dmg, 1); // ran
        assert_eq!(m.monsterinfo.last_sighting, [200.0, 0.0, 0.0]);
        assert_eq!(m.monsterinfo.attack_finished, 1.0);
    }

    #[test]
    fn test_find_target_ignores_notarget_and_far() {
        let mut ctx = make_ctx();
        ai_set_sight_client(&mut ctx);
        ctx.edicts[PLAYER].flags.insert(FL_NOTARGET);
        assert!(!find_target(&mut ctx, MONSTER));
        ctx.edicts[PLAYER].flags.remove(FL_NOTARGET);
        ctx.edicts[PLAYER].s.origin = [5000.0, 0.0, 0.0];
        assert!(!find_target(&mut ctx, MONSTER));
        assert_eq!(ctx.edicts[MONSTER].enemy, -1);
    }

    #[test]
    fn test_checkattack_dead_enemy_stands() {
        let mut ctx = make_ctx();
        ctx.edicts[MONSTER].enemy = PLAYER as i32;
        ctx.edicts[PLAYER].health = -5;
        assert!(ai_checkattack(&mut ctx, MONSTER, 0.0));
        assert_eq!(ctx.edicts[MONSTER].enemy, -1);
        assert_eq!(ctx.edicts[MONSTER].dmg, 100);
    }

    #[test]
    fn test_checkattack_missile_state_fires() {
        let mut ctx = make_ctx();
        ctx.edicts[MONSTER].enemy = PLAYER as i32;
        ctx.edicts[MONSTER].monsterinfo.attack_state = AS_MISSILE;
        assert!(ai_checkattack(&mut ctx, MONSTER, 0.0));
        assert_eq!(ctx.edicts[MONSTER].radius_dmg, 1);
        assert_eq!(ctx.edicts[MONSTER].monsterinfo.attack_state, AS_STRAIGHT);
        assert_eq!(ctx.ai.enemy_range, RANGE_NEAR);
    }

    #[test]
    fn test_check_attack_melee_without_slot_falls_back_to_missile() {
        let mut ctx = make_ctx();
        ctx.edicts[PLAYER].s.origin = [40.0, 0.0, 0.0];
        ctx.edicts[MONSTER].enemy = PLAYER as i32;
        ctx.ai.enemy_range = RANGE_MELEE;
        assert!(m_check_attack(&mut ctx, MONSTER));
        assert_eq!(ctx.edicts[MONSTER].monsterinfo.attack_state, AS_MISSILE);
    }

    #[test]
    fn test_check_attack_respects_attack_finished() {
        let mut ctx = make_ctx();
        ctx.edicts[MONSTER].enemy = PLAYER as i32;
        ctx.edicts[MONSTER].monsterinfo.attack_finished = 10.0;
        ctx.ai.enemy_range = RANGE_NEAR;
        assert!(!m_check_attack(&mut ctx, MONSTER));
    }

    #[test]
    fn test_facing_ideal() {
        let mut e = Edict::default();
        e.ideal_yaw = 30.0;
        assert!(facing_ideal(&e));
        e.ideal_yaw = 90.0;
        assert!(!facing_ideal(&e));
    }
}
