// m_spider.rs: spider tank, a close-range brawler with claw combos

use crate::g_ai::{ai_charge, ai_move, ai_run, ai_stand, ai_walk, range};
use crate::g_combat::t_damage;
use crate::g_local::*;
use crate::g_misc::{throw_gib, throw_head};
use crate::g_monster::{frames, frames_dist, walkmonster_start, with_think};
use crate::g_utils::g_free_edict;
use crate::game_import::*;

// ============================================================
// Frame definitions
// ============================================================

pub const FRAME_STAND_START: i32 = 0;
pub const FRAME_STAND_END: i32 = 54;
pub const FRAME_WALK_START: i32 = 55;
pub const FRAME_WALK_END: i32 = 64;
pub const FRAME_ATTACKA_START: i32 = 65;
pub const FRAME_ATTACKA_END: i32 = 74;
pub const FRAME_ATTACKB_START: i32 = 75;
pub const FRAME_ATTACKB_END: i32 = 80;
pub const FRAME_RUN_START: i32 = 81;
pub const FRAME_RUN_END: i32 = 85;
pub const FRAME_PAIN_START: i32 = 91;
pub const FRAME_PAIN_END: i32 = 98;
pub const FRAME_FINISH_START: i32 = 99;
pub const FRAME_FINISH_END: i32 = 103;
pub const FRAME_RECOVER_START: i32 = 104;
pub const FRAME_RECOVER_END: i32 = 110;
pub const FRAME_DEATH_START: i32 = 111;
pub const FRAME_DEATH_END: i32 = 124;

const CLAW_DAMAGE: i32 = 30;
const PAIN_DELAY: f32 = 1.5;

const SOUND_SIGHT: &str = "spider/sight.wav";
const SOUND_SEARCH: &str = "gladiator/gldsrch1.wav";
const SOUND_IDLE: &str = "gladiator/gldidle1.wav";
const SOUND_PAIN: &str = "gladiator/pain.wav";
const SOUND_DEATH: &str = "mutant/thud1.wav";
const SOUND_THUD: &str = "mutant/thud1.wav";
const SOUND_MELEE: [&str; 3] = ["gladiator/melee1.wav", "gladiator/melee2.wav", "gladiator/melee3.wav"];

// ============================================================
// Move tables
// ============================================================

static FRAMES_STAND: [MFrame; 55] =
    with_think(frames(ai_stand, 0.0), &[0, 8, 16, 24, 32, 40, 48], spider_idle);
static FRAMES_WALK: [MFrame; 10] = with_think(
    frames_dist(ai_walk, [10.0, 4.0, 12.0, 4.0, 10.0, 4.0, 12.0, 4.0, 10.0, 0.0]),
    &[0, 2, 4, 6, 8],
    spider_step,
);
static FRAMES_RUN: [MFrame; 5] =
    with_think(frames_dist(ai_run, [24.0, 10.0, 24.0, 10.0, 24.0]), &[0, 2, 4], spider_step);
static FRAMES_ATTACKA: [MFrame; 10] = with_think(frames(ai_charge, 0.0), &[1, 3, 5, 8], spider_claw);
static FRAMES_ATTACKB: [MFrame; 6] = with_think(frames(ai_charge, 0.0), &[1, 3, 5], spider_claw);
static FRAMES_FINISH: [MFrame; 5] = with_think(frames(ai_charge, 0.0), &[1, 3], spider_claw);
static FRAMES_RECOVER: [MFrame; 7] = frames(ai_move, 0.0);
static FRAMES_PAIN: [MFrame; 8] = frames(ai_move, 0.0);
static FRAMES_DEATH: [MFrame; 14] = with_think(frames(ai_move, 0.0), &[8, 9, 10, 11, 12, 13], spider_dead);

pub static MOVE_STAND: MMove = MMove {
    firstframe: FRAME_STAND_START,
    lastframe: FRAME_STAND_END,
    frames: &FRAMES_STAND,
    endfunc: Some(spider_stand),
};
pub static MOVE_WALK: MMove = MMove {
    firstframe: FRAME_WALK_START,
    lastframe: FRAME_WALK_END,
    frames: &FRAMES_WALK,
    endfunc: Some(spider_select_locomotion),
};
pub static MOVE_RUN: MMove = MMove {
    firstframe: FRAME_RUN_START,
    lastframe: FRAME_RUN_END,
    frames: &FRAMES_RUN,
    endfunc: Some(spider_select_locomotion),
};
pub static MOVE_ATTACKA: MMove = MMove {
    firstframe: FRAME_ATTACKA_START,
    lastframe: FRAME_ATTACKA_END,
    frames: &FRAMES_ATTACKA,
    endfunc: Some(spider_attack_link),
};
pub static MOVE_ATTACKB: MMove = MMove {
    firstframe: FRAME_ATTACKB_START,
    lastframe: FRAME_ATTACKB_END,
    frames: &FRAMES_ATTACKB,
    endfunc: Some(spider_attack_link),
};
pub static MOVE_FINISH: MMove = MMove {
    firstframe: FRAME_FINISH_START,
    lastframe: FRAME_FINISH_END,
    frames: &FRAMES_FINISH,
    endfunc: Some(spider_begin_recover),
};
pub static MOVE_RECOVER: MMove = MMove {
    firstframe: FRAME_RECOVER_START,
    lastframe: FRAME_RECOVER_END,
    frames: &FRAMES_RECOVER,
    endfunc: Some(spider_attack_recover_end),
};
pub static MOVE_PAIN: MMove = MMove {
    firstframe: FRAME_PAIN_START,
    lastframe: FRAME_PAIN_END,
    frames: &FRAMES_PAIN,
    endfunc: Some(spider_run),
};
pub static MOVE_DEATH: MMove = MMove {
    firstframe: FRAME_DEATH_START,
    lastframe: FRAME_DEATH_END,
    frames: &FRAMES_DEATH,
    endfunc: Some(spider_dead),
};

// ============================================================
// Sounds and strikes
// ============================================================

pub fn spider_idle(ctx: &mut GameContext, self_idx: usize) {
    if ctx.random() < 0.25 {
        gi_sound(self_idx as i32, CHAN_VOICE, gi_soundindex(SOUND_IDLE), 1.0, ATTN_IDLE, 0.0);
    }
}

pub fn spider_sight(_ctx: &mut GameContext, self_idx: usize, _other_idx: usize) {
    gi_sound(self_idx as i32, CHAN_VOICE, gi_soundindex(SOUND_SIGHT), 1.0, ATTN_NORM, 0.0);
}

pub fn spider_search(_ctx: &mut GameContext, self_idx: usize) {
    gi_sound(self_idx as i32, CHAN_VOICE, gi_soundindex(SOUND_SEARCH), 1.0, ATTN_IDLE, 0.0);
}

pub fn spider_step(_ctx: &mut GameContext, self_idx: usize) {
    gi_sound(self_idx as i32, CHAN_BODY, gi_soundindex(SOUND_THUD), 1.0, ATTN_NORM, 0.0);
}

/// Claw swipe, only when the enemy is in melee range.
pub fn spider_claw(ctx: &mut GameContext, self_idx: usize) {
    let Some(enemy_idx) = ctx.ent(ctx.edicts[self_idx].enemy) else {
        return;
    };
    if range(&ctx.edicts[self_idx], &ctx.edicts[enemy_idx]) > RANGE_MELEE {
        return;
    }

    let pick = (ctx.rand_int() % 3) as usize;
    gi_sound(self_idx as i32, CHAN_WEAPON, gi_soundindex(SOUND_MELEE[pick]), 1.0, ATTN_NORM, 0.0);

    let (forward, _, _) = angle_vectors_tuple(&ctx.edicts[self_idx].s.angles);
    let point = ctx.edicts[enemy_idx].s.origin;
    t_damage(
        ctx,
        enemy_idx,
        self_idx,
        self_idx,
        forward,
        point,
        VEC3_ORIGIN,
        CLAW_DAMAGE,
        CLAW_DAMAGE,
        DamageFlags::empty(),
        MOD_HIT,
    );
}

// ============================================================
// Move selection
// ============================================================

fn in_melee(ctx: &GameContext, self_idx: usize) -> Option<bool> {
    let enemy_idx = ctx.ent(ctx.edicts[self_idx].enemy)?;
    Some(range(&ctx.edicts[self_idx], &ctx.edicts[enemy_idx]) <= RANGE_MELEE)
}

/// Stand without an enemy, close in when out of reach, otherwise claw.
fn locomotion_move(ctx: &GameContext, self_idx: usize, roll: f32) -> &'static MMove {
    if ctx.edicts[self_idx].monsterinfo.aiflags.intersects(AI_STAND_GROUND) {
        return &MOVE_STAND;
    }
    match in_melee(ctx, self_idx) {
        None => &MOVE_STAND,
        Some(false) if roll > 0.35 => &MOVE_RUN,
        Some(false) => &MOVE_WALK,
        Some(true) if roll > 0.5 => &MOVE_ATTACKA,
        Some(true) => &MOVE_ATTACKB,
    }
}

/// Follow-up once an opening attack ends.
fn link_move(ctx: &GameContext, self_idx: usize, roll: f32) -> &'static MMove {
    if in_melee(ctx, self_idx) == Some(true) && roll > 0.4 {
        &MOVE_FINISH
    } else {
        &MOVE_RECOVER
    }
}

fn recover_move(ctx: &GameContext, self_idx: usize, roll: f32, locomotion_roll: f32) -> &'static MMove {
    if ctx.edicts[self_idx].monsterinfo.aiflags.intersects(AI_STAND_GROUND) {
        return &MOVE_STAND;
    }
    if in_melee(ctx, self_idx) == Some(true) && roll > 0.6 {
        return &MOVE_ATTACKB;
    }
    locomotion_move(ctx, self_idx, locomotion_roll)
}

// ============================================================
// Monster callbacks
// ============================================================

pub fn spider_stand(ctx: &mut GameContext, self_idx: usize) {
    ctx.edicts[self_idx].monsterinfo.currentmove = Some(&MOVE_STAND);
}

pub fn spider_select_locomotion(ctx: &mut GameContext, self_idx: usize) {
    let roll = ctx.random();
    let mv = locomotion_move(ctx, self_idx, roll);
    ctx.edicts[self_idx].monsterinfo.currentmove = Some(mv);
}

pub fn spider_walk(ctx: &mut GameContext, self_idx: usize) {
    spider_select_locomotion(ctx, self_idx);
}

pub fn spider_run(ctx: &mut GameContext, self_idx: usize) {
    spider_select_locomotion(ctx, self_idx);
}

/// Opening of a combo, or its finisher when one is already running.
pub fn spider_attack(ctx: &mut GameContext, self_idx: usize) {
    if ctx.ent(ctx.edicts[self_idx].enemy).is_none() {
        spider_stand(ctx, self_idx);
        return;
    }

    if ctx.edicts[self_idx].monsterinfo.lefty > 0 {
        ctx.edicts[self_idx].monsterinfo.currentmove = Some(&MOVE_FINISH);
        return;
    }

    let roll = ctx.random();
    let ent = &mut ctx.edicts[self_idx];
    ent.monsterinfo.currentmove = Some(if roll > 0.5 { &MOVE_ATTACKA } else { &MOVE_ATTACKB });
    ent.monsterinfo.lefty = 1;
}

pub fn spider_attack_link(ctx: &mut GameContext, self_idx: usize) {
    let roll = ctx.random();
    let mv = link_move(ctx, self_idx, roll);
    ctx.edicts[self_idx].monsterinfo.currentmove = Some(mv);
}

pub fn spider_begin_recover(ctx: &mut GameContext, self_idx: usize) {
    ctx.edicts[self_idx].monsterinfo.currentmove = Some(&MOVE_RECOVER);
}

/// Combo over: cool down before the next attack.
pub fn spider_attack_recover_end(ctx: &mut GameContext, self_idx: usize) {
    let cooldown = 1.0 + ctx.random() * 0.4;
    let roll = ctx.random();
    let locomotion_roll = ctx.random();

    let time = ctx.level.time;
    let ent = &mut ctx.edicts[self_idx];
    ent.monsterinfo.lefty = 0;
    ent.monsterinfo.attack_finished = time + cooldown;

    let mv = recover_move(ctx, self_idx, roll, locomotion_roll);
    ctx.edicts[self_idx].monsterinfo.currentmove = Some(mv);
}

pub fn spider_pain(ctx: &mut GameContext, self_idx: usize, _other_idx: usize, _kick: f32, _damage: i32) {
    let time = ctx.level.time;
    if time < ctx.edicts[self_idx].pain_debounce_time {
        return;
    }

    let ent = &mut ctx.edicts[self_idx];
    ent.pain_debounce_time = time + PAIN_DELAY;
    ent.monsterinfo.currentmove = Some(&MOVE_PAIN);
    gi_sound(self_idx as i32, CHAN_VOICE, gi_soundindex(SOUND_PAIN), 1.0, ATTN_NORM, 0.0);
}

pub fn spider_dead(ctx: &mut GameContext, self_idx: usize) {
    let ent = &mut ctx.edicts[self_idx];
    ent.deadflag = DEAD_DEAD;
    ent.takedamage = Damage::Yes as i32;
}

pub fn spider_die(ctx: &mut GameContext, self_idx: usize, _inflictor_idx: usize, _attacker_idx: usize, damage: i32, _point: Vec3) {
    // already collapsing: further hits don't restart the animation
    let ent = &ctx.edicts[self_idx];
    if ent.deadflag == DEAD_DEAD || is_move(ent.monsterinfo.currentmove, &MOVE_DEATH) {
        return;
    }

    gi_sound(self_idx as i32, CHAN_VOICE, gi_soundindex(SOUND_DEATH), 1.0, ATTN_NORM, 0.0);

    if ctx.edicts[self_idx].health <= ctx.edicts[self_idx].gib_health {
        gi_sound(self_idx as i32, CHAN_VOICE, gi_soundindex("misc/udeath.wav"), 1.0, ATTN_NORM, 0.0);
        throw_gib(ctx, self_idx, "models/objects/gibs/sm_metal/tris.md2", damage, GIB_METALLIC);
        throw_gib(ctx, self_idx, "models/objects/gibs/chest/tris.md2", damage, GIB_METALLIC);
        throw_head(ctx, self_idx, "models/objects/gibs/head2/tris.md2", damage, GIB_ORGANIC);
        ctx.edicts[self_idx].deadflag = DEAD_DEAD;
        return;
    }

    let ent = &mut ctx.edicts[self_idx];
    ent.deadflag = DEAD_DYING;
    ent.takedamage = Damage::Yes as i32;
    ent.monsterinfo.currentmove = Some(&MOVE_DEATH);
}

// ============================================================
// Spawn function
// ============================================================

pub fn sp_monster_spider(ctx: &mut GameContext, self_idx: usize) {
    if ctx.deathmatch != 0.0 {
        g_free_edict(ctx, self_idx);
        return;
    }

    for name in [SOUND_SIGHT, SOUND_SEARCH, SOUND_PAIN, SOUND_DEATH, SOUND_THUD] {
        gi_soundindex(name);
    }
    for name in SOUND_MELEE {
        gi_soundindex(name);
    }

    let ent = &mut ctx.edicts[self_idx];
    ent.s.modelindex = gi_modelindex("models/monsters/spider/tris.md2");
    ent.mins = [-32.0, -32.0, -32.0];
    ent.maxs = [32.0, 32.0, 32.0];
    ent.movetype = MoveType::Step;
    ent.solid = Solid::Bbox;
    ent.mass = 300;
    ent.s.sound = gi_soundindex(SOUND_IDLE);

    ent.health = 400;
    ent.gib_health = -120;

    ent.pain_fn = Some(spider_pain);
    ent.die_fn = Some(spider_die);

    ent.monsterinfo.stand_fn = Some(spider_stand);
    ent.monsterinfo.idle_fn = Some(spider_stand);
    ent.monsterinfo.walk_fn = Some(spider_walk);
    ent.monsterinfo.run_fn = Some(spider_run);
    ent.monsterinfo.attack_fn = Some(spider_attack);
    ent.monsterinfo.melee_fn = Some(spider_attack);
    ent.monsterinfo.sight_fn = Some(spider_sight);
    ent.monsterinfo.search_fn = Some(spider_search);

    spider_stand(ctx, self_idx);
    walkmonster_start(ctx, self_idx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::g_monster::m_move_frame;
    use crate::g_utils::g_spawn;
    use crate::game_import::testing;

    fn make_ctx() -> GameContext {
        testing::install();
        let mut ctx = GameCtx::with_capacity(32, 1);
        ctx.level.time = 2.0;
        ctx
    }

    fn spawn_spider(ctx: &mut GameContext) -> usize {
        let idx = g_spawn(ctx).unwrap();
        ctx.edicts[idx].classname = "monster_spider".into();
        sp_monster_spider(ctx, idx);
        idx
    }

    fn give_enemy(ctx: &mut GameContext, spider: usize, distance: f32) -> usize {
        let idx = g_spawn(ctx).unwrap();
        let e = &mut ctx.edicts[idx];
        e.classname = "enemy".into();
        e.s.origin = [distance, 0.0, 0.0];
        e.health = 100;
        e.takedamage = Damage::Aim as i32;
        ctx.edicts[spider].enemy = idx as i32;
        idx
    }

    fn current(ctx: &GameContext, idx: usize) -> Option<&'static MMove> {
        ctx.edicts[idx].monsterinfo.currentmove
    }

    #[test]
    fn test_spawn_defaults() {
        let mut ctx = make_ctx();
        let s = spawn_spider(&mut ctx);
        let e = &ctx.edicts[s];
        assert_eq!(e.health, 400);
        assert_eq!(e.gib_health, -120);
        assert_eq!(e.mass, 300);
        assert_eq!(e.mins, [-32.0, -32.0, -32.0]);
        assert_eq!(e.s.sound, testing::index(SOUND_IDLE));
        assert!(e.is_monster());
        assert!(is_move(current(&ctx, s), &MOVE_STAND));
    }

    #[test]
    fn test_locomotion_choice() {
        let mut ctx = make_ctx();
        let s = spawn_spider(&mut ctx);
        assert!(std::ptr::eq(locomotion_move(&ctx, s, 0.9), &MOVE_STAND));

        let enemy = give_enemy(&mut ctx, s, 300.0);
        assert!(std::ptr::eq(locomotion_move(&ctx, s, 0.9), &MOVE_RUN));
        assert!(std::ptr::eq(locomotion_move(&ctx, s, 0.2), &MOVE_WALK));

        ctx.edicts[enemy].s.origin = [40.0, 0.0, 0.0];
        assert!(std::ptr::eq(locomotion_move(&ctx, s, 0.9), &MOVE_ATTACKA));
        assert!(std::ptr::eq(locomotion_move(&ctx, s, 0.3), &MOVE_ATTACKB));

        ctx.edicts[s].monsterinfo.aiflags.insert(AI_STAND_GROUND);
        assert!(std::ptr::eq(locomotion_move(&ctx, s, 0.9), &MOVE_STAND));
    }

    #[test]
    fn test_combo_entry_marks_and_finishes() {
        let mut ctx = make_ctx();
        let s = spawn_spider(&mut ctx);
        spider_attack(&mut ctx, s);
        assert!(is_move(current(&ctx, s), &MOVE_STAND));
        assert_eq!(ctx.edicts[s].monsterinfo.lefty, 0);

        give_enemy(&mut ctx, s, 40.0);
        spider_attack(&mut ctx, s);
        let mv = current(&ctx, s);
        assert!(is_move(mv, &MOVE_ATTACKA) || is_move(mv, &MOVE_ATTACKB));
        assert_eq!(ctx.edicts[s].monsterinfo.lefty, 1);

        spider_attack(&mut ctx, s);
        assert!(is_move(current(&ctx, s), &MOVE_FINISH));
    }

    #[test]
    fn test_link_and_recover() {
        let mut ctx = make_ctx();
        let s = spawn_spider(&mut ctx);
        let enemy = give_enemy(&mut ctx, s, 40.0);
        assert!(std::ptr::eq(link_move(&ctx, s, 0.5), &MOVE_FINISH));
        assert!(std::ptr::eq(link_move(&ctx, s, 0.3), &MOVE_RECOVER));
        assert!(std::ptr::eq(recover_move(&ctx, s, 0.7, 0.9), &MOVE_ATTACKB));
        assert!(std::ptr::eq(recover_move(&ctx, s, 0.5, 0.9), &MOVE_ATTACKA));

        ctx.edicts[enemy].s.origin = [400.0, 0.0, 0.0];
        assert!(std::ptr::eq(link_move(&ctx, s, 0.9), &MOVE_RECOVER));
        assert!(std::ptr::eq(recover_move(&ctx, s, 0.9, 0.9), &MOVE_RUN));
    }

    #[test]
    fn test_recover_end_clears_combo_and_cools_down() {
        let mut ctx = make_ctx();
        let s = spawn_spider(&mut ctx);
        ctx.edicts[s].monsterinfo.lefty = 1;
        spider_attack_recover_end(&mut ctx, s);
        let info = &ctx.edicts[s].monsterinfo;
        assert_eq!(info.lefty, 0);
        assert!(info.attack_finished >= 3.0 && info.attack_finished <= 3.4);
        assert!(is_move(info.currentmove, &MOVE_STAND));
    }

    #[test]
    fn test_claw_only_in_reach() {
        let mut ctx = make_ctx();
        let s = spawn_spider(&mut ctx);
        let enemy = give_enemy(&mut ctx, s, 200.0);
        spider_claw(&mut ctx, s);
        assert_eq!(ctx.edicts[enemy].health, 100);

        ctx.edicts[enemy].s.origin = [40.0, 0.0, 0.0];
        spider_claw(&mut ctx, s);
        assert_eq!(ctx.edicts[enemy].health, 70);
        assert_eq!(ctx.means_of_death, MOD_HIT);
        assert!(SOUND_MELEE.iter().any(|s| testing::sound_played(s)));
    }

    #[test]
    fn test_walk_frames_thud() {
        let mut ctx = make_ctx();
        let s = spawn_spider(&mut ctx);
        ctx.edicts[s].monsterinfo.currentmove = Some(&MOVE_WALK);
        ctx.edicts[s].s.frame = FRAME_WALK_END;
        // wrapping past the end re-selects locomotion; with no enemy that is stand
        m_move_frame(&mut ctx, s);
        assert!(is_move(current(&ctx, s), &MOVE_STAND));

        ctx.edicts[s].monsterinfo.currentmove = Some(&MOVE_RUN);
        ctx.edicts[s].s.frame = FRAME_RUN_START + 1;
        testing::clear();
        m_move_frame(&mut ctx, s);
        assert!(testing::sound_played(SOUND_THUD));
    }

    #[test]
    fn test_pain_debounce() {
        let mut ctx = make_ctx();
        let s = spawn_spider(&mut ctx);
        spider_pain(&mut ctx, s, 0, 0.0, 5);
        assert!(is_move(current(&ctx, s), &MOVE_PAIN));
        assert_eq!(ctx.edicts[s].pain_debounce_time, 3.5);

        spider_stand(&mut ctx, s);
        ctx.level.time = 3.0;
        spider_pain(&mut ctx, s, 0, 0.0, 5);
        assert!(is_move(current(&ctx, s), &MOVE_STAND));
    }

    #[test]
    fn test_death_does_not_restart() {
        let mut ctx = make_ctx();
        let s = spawn_spider(&mut ctx);
        ctx.edicts[s].health = -10;
        spider_die(&mut ctx, s, 0, 0, 20, VEC3_ORIGIN);
        assert!(is_move(current(&ctx, s), &MOVE_DEATH));
        ctx.edicts[s].s.frame = FRAME_DEATH_START + 5;

        spider_die(&mut ctx, s, 0, 0, 20, VEC3_ORIGIN);
        assert_eq!(ctx.edicts[s].s.frame, FRAME_DEATH_START + 5);

        ctx.edicts[s].s.frame = FRAME_DEATH_START + 7;
        m_move_frame(&mut ctx, s);
        assert_eq!(ctx.edicts[s].deadflag, DEAD_DEAD);
    }

    #[test]
    fn test_gib_death() {
        let mut ctx = make_ctx();
        let s = spawn_spider(&mut ctx);
        ctx.edicts[s].health = -200;
        spider_die(&mut ctx, s, 0, 0, 200, VEC3_ORIGIN);
        assert_eq!(ctx.edicts.iter().filter(|e| e.inuse && e.classname == "gib").count(), 2);
        assert_eq!(ctx.edicts[s].deadflag, DEAD_DEAD);
        assert!(ctx.edicts[s].monsterinfo.currentmove.is_none());
    }
}
