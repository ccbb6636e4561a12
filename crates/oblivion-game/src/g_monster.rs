// g_monster.rs: monster frame scheduler and start-up

use tracing::{trace, warn};

use crate::dispatch::{call_stand, call_walk, AiFn, ThinkFn};
use crate::g_ai::found_target;
use crate::g_local::*;
use crate::g_utils::{g_free_edict, g_pick_target, vtos};
use crate::g_weapon::{fire_plasma_bolt, BoltKind};
use crate::game_import::*;
use crate::m_move::m_droptofloor;

/// Pause time that means "wait forever".
const PAUSE_FOREVER: f32 = 100_000_000.0;

//
// frame tables
//

/// `N` frames sharing one ai function and distance.
pub const fn frames<const N: usize>(ai_fn: AiFn, dist: f32) -> [MFrame; N] {
    [MFrame { ai_fn, dist, think_fn: None }; N]
}

/// One frame per entry of `dists`.
pub const fn frames_dist<const N: usize>(ai_fn: AiFn, dists: [f32; N]) -> [MFrame; N] {
    let mut table = [MFrame { ai_fn, dist: 0.0, think_fn: None }; N];
    let mut i = 0;
    while i < N {
        table[i].dist = dists[i];
        i += 1;
    }
    table
}

/// Attach `think` to each frame index in `at`.
pub const fn with_think<const N: usize>(mut table: [MFrame; N], at: &[usize], think: ThinkFn) -> [MFrame; N] {
    let mut i = 0;
    while i < at.len() {
        table[at[i]].think_fn = Some(think);
        i += 1;
    }
    table
}

//
// monster weapons
//

/// Muzzle flash event for a monster weapon, multicast to the PVS of `start`.
pub fn muzzleflash2(self_idx: usize, start: &Vec3, flashtype: i32) {
    gi_write_byte(SVC_MUZZLEFLASH2);
    gi_write_short(self_idx as i32);
    gi_write_byte(flashtype);
    gi_multicast(start, Multicast::Pvs);
}

pub fn monster_fire_plasma(
    ctx: &mut GameContext,
    self_idx: usize,
    start: Vec3,
    dir: Vec3,
    damage: i32,
    speed: i32,
    flashtype: i32,
) {
    fire_plasma_bolt(ctx, self_idx, start, dir, damage, speed, BoltKind::Plasma);
    muzzleflash2(self_idx, &start, flashtype);
}

//
// Monster utility functions
//

pub fn m_set_effects(ctx: &mut GameContext, ent_idx: usize) {
    let ent = &mut ctx.edicts[ent_idx];
    ent.s.effects &= !EF_POWERSCREEN;

    if ent.health <= 0 {
        return;
    }

    if ent.monsterinfo.power_armor_type == POWER_ARMOR_SCREEN && ent.monsterinfo.power_armor_power > 0 {
        ent.s.effects |= EF_POWERSCREEN;
    }
}

/// Advance the monster one animation frame and run that frame's callbacks.
pub fn m_move_frame(ctx: &mut GameContext, self_idx: usize) {
    let time = ctx.level.time;
    let Some(mut mv) = ctx.edicts[self_idx].monsterinfo.currentmove else {
        return;
    };
    ctx.edicts[self_idx].nextthink = time + FRAMETIME;

    let nextframe = ctx.edicts[self_idx].monsterinfo.nextframe;
    if nextframe != 0 && nextframe >= mv.firstframe && nextframe <= mv.lastframe {
        let ent = &mut ctx.edicts[self_idx];
        ent.s.frame = nextframe;
        ent.monsterinfo.nextframe = 0;
    } else {
        if ctx.edicts[self_idx].s.frame == mv.lastframe {
            if let Some(endfunc) = mv.endfunc {
                endfunc(ctx, self_idx);

                // regrab move, endfunc is very likely to change it
                let ent = &ctx.edicts[self_idx];
                if !ent.inuse || ent.svflags & SVF_DEADMONSTER != 0 {
                    return;
                }
                match ent.monsterinfo.currentmove {
                    Some(m) => mv = m,
                    None => return,
                }
            }
        }

        let ent = &mut ctx.edicts[self_idx];
        if ent.s.frame < mv.firstframe || ent.s.frame > mv.lastframe {
            ent.monsterinfo.aiflags.remove(AI_HOLD_FRAME);
            ent.s.frame = mv.firstframe;
        } else if !ent.monsterinfo.aiflags.intersects(AI_HOLD_FRAME) {
            ent.s.frame += 1;
            if ent.s.frame > mv.lastframe {
                ent.s.frame = mv.firstframe;
            }
        }
    }

    let ent = &ctx.edicts[self_idx];
    let index = (ent.s.frame - mv.firstframe) as usize;
    let Some(frame) = mv.frames.get(index).copied() else {
        warn!("{}: frame {} outside its move table", ent.classname, ent.s.frame);
        return;
    };

    let dist = if ent.monsterinfo.aiflags.intersects(AI_HOLD_FRAME) {
        0.0
    } else {
        frame.dist * ent.monsterinfo.scale
    };
    (frame.ai_fn)(ctx, self_idx, dist);

    if let Some(think) = frame.think_fn {
        if ctx.edicts[self_idx].inuse {
            think(ctx, self_idx);
        }
    }
}

pub fn monster_think(ctx: &mut GameContext, self_idx: usize) {
    m_move_frame(ctx, self_idx);
    if ctx.edicts[self_idx].inuse {
        m_set_effects(ctx, self_idx);
    }
}

/// Using a monster makes it angry at the current activator.
pub fn monster_use(ctx: &mut GameContext, self_idx: usize, _other_idx: usize, activator_idx: usize) {
    let ent = &ctx.edicts[self_idx];
    if ent.enemy >= 0 || ent.health <= 0 {
        return;
    }

    let Some(activator) = ctx.edicts.get(activator_idx) else {
        return;
    };
    if activator.flags.intersects(FL_NOTARGET) {
        return;
    }
    if activator.client.is_none() && !activator.monsterinfo.aiflags.intersects(AI_GOOD_GUY) {
        return;
    }

    ctx.edicts[self_idx].enemy = activator_idx as i32;
    found_target(ctx, self_idx);
}

/// Common monster set-up. Returns false when the monster was removed
/// (monsters do not exist in deathmatch).
pub fn monster_start(ctx: &mut GameContext, self_idx: usize) -> bool {
    if ctx.deathmatch != 0.0 {
        g_free_edict(ctx, self_idx);
        return false;
    }

    if !ctx.edicts[self_idx].monsterinfo.aiflags.intersects(AI_GOOD_GUY) {
        ctx.level.total_monsters += 1;
    }

    let time = ctx.level.time;
    let ent = &mut ctx.edicts[self_idx];
    ent.nextthink = time + FRAMETIME;
    ent.svflags |= SVF_MONSTER;
    ent.takedamage = Damage::Aim as i32;
    ent.use_fn = Some(monster_use);
    ent.max_health = ent.health;
    ent.clipmask = MASK_MONSTERSOLID;

    ent.s.skinnum = 0;
    ent.deadflag = DEAD_NO;
    ent.svflags &= !SVF_DEADMONSTER;
    ent.s.old_origin = ent.s.origin;

    if ent.monsterinfo.scale == 0.0 {
        ent.monsterinfo.scale = 1.0;
    }

    // randomize what frame they start on
    if let Some(mv) = ctx.edicts[self_idx].monsterinfo.currentmove {
        let count = mv.frame_count() as i32;
        let frame = mv.firstframe + ctx.rand_int() % count.max(1);
        ctx.edicts[self_idx].s.frame = frame;
    }

    true
}

pub fn monster_start_go(ctx: &mut GameContext, self_idx: usize) {
    if ctx.edicts[self_idx].health <= 0 {
        return;
    }

    let target = ctx.edicts[self_idx].target.clone();
    if target.is_empty() {
        ctx.edicts[self_idx].monsterinfo.pausetime = PAUSE_FOREVER;
        call_stand(ctx, self_idx);
    } else {
        match g_pick_target(ctx, &target) {
            None => {
                let ent = &mut ctx.edicts[self_idx];
                warn!("{} can't find target {} at {}", ent.classname, target, vtos(&ent.s.origin));
                ent.target.clear();
                ent.monsterinfo.pausetime = PAUSE_FOREVER;
                call_stand(ctx, self_idx);
            }
            Some(goal) if ctx.edicts[goal].classname == "path_corner" => {
                let v = vector_subtract(&ctx.edicts[goal].s.origin, &ctx.edicts[self_idx].s.origin);
                let ent = &mut ctx.edicts[self_idx];
                ent.goalentity = goal as i32;
                ent.movetarget = goal as i32;
                ent.ideal_yaw = vectoyaw(&v);
                ent.s.angles[YAW] = ent.ideal_yaw;
                call_walk(ctx, self_idx);
                ctx.edicts[self_idx].target.clear();
            }
            Some(_) => {
                let ent = &mut ctx.edicts[self_idx];
                ent.goalentity = -1;
                ent.movetarget = -1;
                ent.monsterinfo.pausetime = PAUSE_FOREVER;
                call_stand(ctx, self_idx);
            }
        }
    }

    let time = ctx.level.time;
    let ent = &mut ctx.edicts[self_idx];
    ent.think_fn = Some(monster_think);
    ent.nextthink = time + FRAMETIME;
    trace!(idx = self_idx, classname = %ent.classname, "monster started");
}

pub fn walkmonster_start_go(ctx: &mut GameContext, self_idx: usize) {
    m_droptofloor(ctx, self_idx);

    let ent = &mut ctx.edicts[self_idx];
    if ent.yaw_speed == 0.0 {
        ent.yaw_speed = 20.0;
    }
    ent.viewheight = 25;

    monster_start_go(ctx, self_idx);
}

pub fn walkmonster_start(ctx: &mut GameContext, self_idx: usize) {
    ctx.edicts[self_idx].think_fn = Some(walkmonster_start_go);
    monster_start(ctx, self_idx);
}

pub fn flymonster_start_go(ctx: &mut GameContext, self_idx: usize) {
    let ent = &mut ctx.edicts[self_idx];
    if ent.yaw_speed == 0.0 {
        ent.yaw_speed = 10.0;
    }
    if ent.viewheight == 0 {
        ent.viewheight = 25;
    }

    monster_start_go(ctx, self_idx);
}

pub fn flymonster_start(ctx: &mut GameContext, self_idx: usize) {
    let ent = &mut ctx.edicts[self_idx];
    ent.flags.insert(FL_FLY);
    ent.think_fn = Some(flymonster_start_go);
    monster_start(ctx, self_idx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_import::testing;

    // ============================================================
    // Scheduler fixtures
    // ============================================================

    fn count_ai(ctx: &mut GameContext, self_idx: usize, dist: f32) {
        ctx.edicts[self_idx].dmg += 1;
        ctx.edicts[self_idx].dmg_radius = dist;
    }

    fn count_think(ctx: &mut GameContext, self_idx: usize) {
        ctx.edicts[self_idx].radius_dmg += 1;
    }

    fn switch_to_other(ctx: &mut GameContext, self_idx: usize) {
        ctx.edicts[self_idx].monsterinfo.currentmove = Some(&OTHER_MOVE);
    }

    fn go_dead(ctx: &mut GameContext, self_idx: usize) {
        ctx.edicts[self_idx].svflags |= SVF_DEADMONSTER;
    }

    fn stand_cb(ctx: &mut GameContext, self_idx: usize) {
        ctx.edicts[self_idx].monsterinfo.currentmove = Some(&TEST_MOVE);
    }

    fn walk_cb(ctx: &mut GameContext, self_idx: usize) {
        ctx.edicts[self_idx].monsterinfo.currentmove = Some(&OTHER_MOVE);
    }

    static TEST_FRAMES: [MFrame; 3] = [
        MFrame { ai_fn: count_ai, dist: 2.0, think_fn: None },
        MFrame { ai_fn: count_ai, dist: 4.0, think_fn: Some(count_think) },
        MFrame { ai_fn: count_ai, dist: 6.0, think_fn: None },
    ];
    static TEST_MOVE: MMove = MMove { firstframe: 10, lastframe: 12, frames: &TEST_FRAMES, endfunc: None };
    static SWITCH_MOVE: MMove = MMove { firstframe: 10, lastframe: 12, frames: &TEST_FRAMES, endfunc: Some(switch_to_other) };
    static DYING_MOVE: MMove = MMove { firstframe: 10, lastframe: 12, frames: &TEST_FRAMES, endfunc: Some(go_dead) };
    static OTHER_MOVE: MMove = MMove { firstframe: 20, lastframe: 22, frames: &TEST_FRAMES, endfunc: None };

    fn make_monster(mv: &'static MMove) -> (GameContext, usize) {
        testing::install();
        let mut ctx = GameCtx::with_capacity(32, 1);
        let idx = crate::g_utils::g_spawn(&mut ctx).unwrap();
        let ent = &mut ctx.edicts[idx];
        ent.monsterinfo.currentmove = Some(mv);
        ent.monsterinfo.scale = 1.0;
        ent.s.frame = mv.firstframe;
        ent.health = 100;
        (ctx, idx)
    }

    // ============================================================
    // m_move_frame
    // ============================================================

    #[test]
    fn test_move_frame_advances_and_calls_frame_callbacks() {
        let (mut ctx, idx) = make_monster(&TEST_MOVE);
        ctx.level.time = 1.0;
        m_move_frame(&mut ctx, idx);
        let ent = &ctx.edicts[idx];
        assert_eq!(ent.s.frame, 11);
        assert_eq!(ent.dmg, 1);
        assert_eq!(ent.dmg_radius, 4.0);
        assert_eq!(ent.radius_dmg, 1);
        assert!((ent.nextthink - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_move_frame_wraps_at_last_frame() {
        let (mut ctx, idx) = make_monster(&TEST_MOVE);
        ctx.edicts[idx].s.frame = 12;
        m_move_frame(&mut ctx, idx);
        assert_eq!(ctx.edicts[idx].s.frame, 10);
    }

    #[test]
    fn test_move_frame_endfunc_switches_move() {
        let (mut ctx, idx) = make_monster(&SWITCH_MOVE);
        ctx.edicts[idx].s.frame = 12;
        m_move_frame(&mut ctx, idx);
        // out of range of the new move: reset to its first frame
        assert_eq!(ctx.edicts[idx].s.frame, 20);
        assert!(is_move(ctx.edicts[idx].monsterinfo.currentmove, &OTHER_MOVE));
    }

    #[test]
    fn test_move_frame_stops_after_death_endfunc() {
        let (mut ctx, idx) = make_monster(&DYING_MOVE);
        ctx.edicts[idx].s.frame = 12;
        m_move_frame(&mut ctx, idx);
        assert_eq!(ctx.edicts[idx].s.frame, 12);
        assert_eq!(ctx.edicts[idx].dmg, 0);
    }

    #[test]
    fn test_move_frame_hold_frame() {
        let (mut ctx, idx) = make_monster(&TEST_MOVE);
        ctx.edicts[idx].monsterinfo.aiflags.insert(AI_HOLD_FRAME);
        m_move_frame(&mut ctx, idx);
        assert_eq!(ctx.edicts[idx].s.frame, 10);
        assert_eq!(ctx.edicts[idx].dmg_radius, 0.0);
    }

    #[test]
    fn test_move_frame_honours_nextframe() {
        let (mut ctx, idx) = make_monster(&TEST_MOVE);
        ctx.edicts[idx].monsterinfo.nextframe = 12;
        m_move_frame(&mut ctx, idx);
        assert_eq!(ctx.edicts[idx].s.frame, 12);
        assert_eq!(ctx.edicts[idx].monsterinfo.nextframe, 0);
        assert_eq!(ctx.edicts[idx].dmg_radius, 6.0);
    }

    #[test]
    fn test_move_frame_scales_distance() {
        let (mut ctx, idx) = make_monster(&TEST_MOVE);
        ctx.edicts[idx].monsterinfo.scale = 0.5;
        m_move_frame(&mut ctx, idx);
        assert_eq!(ctx.edicts[idx].dmg_radius, 2.0);
    }

    // ============================================================
    // Start-up
    // ============================================================

    #[test]
    fn test_monster_start_sets_up_monster() {
        let (mut ctx, idx) = make_monster(&TEST_MOVE);
        assert!(monster_start(&mut ctx, idx));
        let ent = &ctx.edicts[idx];
        assert!(ent.is_monster());
        assert_eq!(ent.takedamage, Damage::Aim as i32);
        assert_eq!(ent.max_health, 100);
        assert_eq!(ent.clipmask, MASK_MONSTERSOLID);
        assert!((10..=12).contains(&ent.s.frame));
        assert_eq!(ctx.level.total_monsters, 1);
    }

    #[test]
    fn test_monster_start_deathmatch_frees() {
        let (mut ctx, idx) = make_monster(&TEST_MOVE);
        ctx.deathmatch = 1.0;
        assert!(!monster_start(&mut ctx, idx));
        assert!(!ctx.edicts[idx].inuse);
    }

    #[test]
    fn test_monster_start_go_stands_without_target() {
        let (mut ctx, idx) = make_monster(&OTHER_MOVE);
        ctx.edicts[idx].monsterinfo.stand_fn = Some(stand_cb);
        monster_start_go(&mut ctx, idx);
        let ent = &ctx.edicts[idx];
        assert!(is_move(ent.monsterinfo.currentmove, &TEST_MOVE));
        assert_eq!(ent.monsterinfo.pausetime, PAUSE_FOREVER);
        assert!(ent.think_fn.is_some());
    }

    #[test]
    fn test_monster_start_go_walks_to_path_corner() {
        let (mut ctx, idx) = make_monster(&TEST_MOVE);
        let corner = crate::g_utils::g_spawn(&mut ctx).unwrap();
        ctx.edicts[corner].classname = "path_corner".into();
        ctx.edicts[corner].targetname = "p1".into();
        ctx.edicts[corner].s.origin = [0.0, 100.0, 0.0];
        ctx.edicts[idx].target = "p1".into();
        ctx.edicts[idx].monsterinfo.walk_fn = Some(walk_cb);

        monster_start_go(&mut ctx, idx);
        let ent = &ctx.edicts[idx];
        assert_eq!(ent.movetarget, corner as i32);
        assert_eq!(ent.goalentity, corner as i32);
        assert_eq!(ent.ideal_yaw, 90.0);
        assert!(ent.target.is_empty());
        assert!(is_move(ent.monsterinfo.currentmove, &OTHER_MOVE));
    }

    #[test]
    fn test_flymonster_keeps_custom_viewheight() {
        let (mut ctx, idx) = make_monster(&TEST_MOVE);
        ctx.edicts[idx].viewheight = 90;
        flymonster_start(&mut ctx, idx);
        assert!(ctx.edicts[idx].flags.intersects(FL_FLY));
        flymonster_start_go(&mut ctx, idx);
        assert_eq!(ctx.edicts[idx].viewheight, 90);
        assert_eq!(ctx.edicts[idx].yaw_speed, 10.0);
    }

    #[test]
    fn test_monster_use_requires_client_activator() {
        let (mut ctx, idx) = make_monster(&TEST_MOVE);
        let other = crate::g_utils::g_spawn(&mut ctx).unwrap();
        monster_use(&mut ctx, idx, other, other);
        assert_eq!(ctx.edicts[idx].enemy, -1);

        ctx.edicts[1].inuse = true;
        ctx.edicts[1].health = 100;
        monster_use(&mut ctx, idx, 1, 1);
        assert_eq!(ctx.edicts[idx].enemy, 1);
    }

    #[test]
    fn test_power_screen_effect() {
        let (mut ctx, idx) = make_monster(&TEST_MOVE);
        ctx.edicts[idx].monsterinfo.power_armor_type = POWER_ARMOR_SCREEN;
        ctx.edicts[idx].monsterinfo.power_armor_power = 10;
        m_set_effects(&mut ctx, idx);
        assert_ne!(ctx.edicts[idx].s.effects & EF_POWERSCREEN, 0);
        ctx.edicts[idx].health = 0;
        m_set_effects(&mut ctx, idx);
        assert_eq!(ctx.edicts[idx].s.effects & EF_POWERSCREEN, 0);
    }

    #[test]
    fn test_muzzleflash2_message() {
        testing::install();
        muzzleflash2(7, &[1.0, 2.0, 3.0], 4);
        assert_eq!(
            testing::writes(),
            vec![
                testing::Write::Byte(SVC_MUZZLEFLASH2),
                testing::Write::Short(7),
                testing::Write::Byte(4),
            ]
        );
        assert_eq!(testing::multicasts(), vec![([1.0, 2.0, 3.0], Multicast::Pvs)]);
    }
    #[test]
    fn test_frame_table_builders() {
        static TABLE: [MFrame; 4] = with_think(frames_dist(count_ai, [1.0, 2.0, 3.0, 4.0]), &[1, 3], count_think);
        static FLAT: [MFrame; 3] = frames(count_ai, 5.0);
        assert_eq!(TABLE.map(|f| f.dist), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(TABLE.map(|f| f.think_fn.is_some()), [false, true, false, true]);
        assert!(FLAT.iter().all(|f| f.dist == 5.0 && f.think_fn.is_none()));
    }
}
