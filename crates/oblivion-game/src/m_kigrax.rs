// m_kigrax.rs: Kigrax hovering plasma sentry

use tracing::debug;

use crate::g_ai::{ai_charge, ai_move, ai_run, ai_stand, ai_walk, range};
use crate::g_local::*;
use crate::g_misc::{become_explosion1, throw_gib, throw_head};
use crate::g_monster::{flymonster_start, frames, monster_fire_plasma, with_think};
use crate::g_utils::{g_free_edict, g_project_source};
use crate::g_weapon::fire_hit;
use crate::game_import::*;

// ============================================================
// Frame definitions
// ============================================================

pub const FRAME_STAND_FIRST: i32 = 0;
pub const FRAME_STAND_LAST: i32 = 27;
pub const FRAME_SCAN_FIRST: i32 = 28;
pub const FRAME_SCAN_LAST: i32 = 48;
pub const FRAME_WALK1_FIRST: i32 = 61;
pub const FRAME_WALK1_LAST: i32 = 82;
pub const FRAME_WALK2_FIRST: i32 = 83;
pub const FRAME_WALK2_LAST: i32 = 104;
pub const FRAME_SIGHT_FIRST: i32 = 105;
pub const FRAME_SIGHT_LAST: i32 = 121;
pub const FRAME_RUN_FIRST: i32 = 122;
pub const FRAME_RUN_LAST: i32 = 138;
pub const FRAME_PAIN_FIRST: i32 = 139;
pub const FRAME_PAIN_LAST: i32 = 149;
pub const FRAME_DEATH_FIRST: i32 = 150;
pub const FRAME_DEATH_LAST: i32 = 168;
pub const FRAME_MELEE1_FIRST: i32 = 169;
pub const FRAME_MELEE1_LAST: i32 = 183;
pub const FRAME_MELEE2_FIRST: i32 = 184;
pub const FRAME_MELEE2_LAST: i32 = 194;
pub const FRAME_ATTACK_FIRST: i32 = 195;
pub const FRAME_ATTACK_LAST: i32 = 204;

const FRAME_DEATH_THINK: i32 = 163;
const FRAME_MELEE1_FIRE1: i32 = 176;
const FRAME_MELEE1_FIRE2: i32 = 180;
const FRAME_MELEE2_FIRE: i32 = 188;
const FRAME_ATTACK_FIRE: i32 = 198;

const STAND_CHANCE: f32 = 1.0 / 3.0;
const SEARCH_CHANCE: f32 = 0.5;
const MELEE_SKIP_CHANCE: f32 = 0.1;
const MELEE_ALT_CHANCE: f32 = 0.9;
const PAIN_DELAY: f32 = 3.0;
/// A corpse that never lands blows up after this long.
const CORPSE_FUSE: f32 = 15.0;

const MELEE_KICK: i32 = 100;
const PLASMA_DAMAGE: i32 = 10;
const PLASMA_SPEED: i32 = 1000;
const PLASMA_FLASH: i32 = 1;
const PLASMA_OFFSET: Vec3 = [16.0, 0.0, -16.0];

const SOUND_PAIN: &str = "hover/hovpain1.wav";
const SOUND_DEATH: &str = "hover/hovdeth1.wav";
const SOUND_SIGHT: &str = "hover/hovsght1.wav";
const SOUND_SEARCH1: &str = "hover/hovsrch1.wav";
const SOUND_SEARCH2: &str = "hover/hovsrch2.wav";
const SOUND_ATTACK: &str = "chick/chkatck3.wav";
const SOUND_PLASMA: &str = "kigrax/hovatck1.wav";
const SOUND_IDLE: &str = "kigrax/hovidle1.wav";

// ============================================================
// Move tables
// ============================================================

const fn offset(frame: i32, first: i32) -> usize {
    (frame - first) as usize
}

static FRAMES_STAND: [MFrame; 28] = frames(ai_stand, 0.0);
static FRAMES_SCAN: [MFrame; 21] = frames(ai_stand, 0.0);
static FRAMES_WALK1: [MFrame; 22] = frames(ai_walk, 4.0);
static FRAMES_WALK2: [MFrame; 22] = frames(ai_walk, 4.0);
static FRAMES_SIGHT: [MFrame; 17] = frames(ai_run, 10.0);
static FRAMES_RUN: [MFrame; 17] = frames(ai_run, 15.0);
static FRAMES_PAIN: [MFrame; 11] = frames(ai_move, 0.0);
static FRAMES_DEATH: [MFrame; 19] = with_think(
    frames(ai_move, 0.0),
    &[offset(FRAME_DEATH_THINK, FRAME_DEATH_FIRST)],
    kigrax_dead,
);
static FRAMES_MELEE1: [MFrame; 15] = with_think(
    frames(ai_charge, 1.0),
    &[
        offset(FRAME_MELEE1_FIRE1, FRAME_MELEE1_FIRST),
        offset(FRAME_MELEE1_FIRE2, FRAME_MELEE1_FIRST),
    ],
    kigrax_strike1,
);
static FRAMES_MELEE2: [MFrame; 11] = with_think(
    frames(ai_charge, 1.0),
    &[offset(FRAME_MELEE2_FIRE, FRAME_MELEE2_FIRST)],
    kigrax_strike2,
);
static FRAMES_ATTACK: [MFrame; 10] = with_think(
    frames(ai_charge, 0.0),
    &[offset(FRAME_ATTACK_FIRE, FRAME_ATTACK_FIRST)],
    kigrax_fire_plasma,
);

pub static MOVE_STAND: MMove = MMove {
    firstframe: FRAME_STAND_FIRST,
    lastframe: FRAME_STAND_LAST,
    frames: &FRAMES_STAND,
    endfunc: None,
};
pub static MOVE_SCAN: MMove = MMove {
    firstframe: FRAME_SCAN_FIRST,
    lastframe: FRAME_SCAN_LAST,
    frames: &FRAMES_SCAN,
    endfunc: None,
};
pub static MOVE_WALK1: MMove = MMove {
    firstframe: FRAME_WALK1_FIRST,
    lastframe: FRAME_WALK1_LAST,
    frames: &FRAMES_WALK1,
    endfunc: None,
};
pub static MOVE_WALK2: MMove = MMove {
    firstframe: FRAME_WALK2_FIRST,
    lastframe: FRAME_WALK2_LAST,
    frames: &FRAMES_WALK2,
    endfunc: None,
};
pub static MOVE_SIGHT: MMove = MMove {
    firstframe: FRAME_SIGHT_FIRST,
    lastframe: FRAME_SIGHT_LAST,
    frames: &FRAMES_SIGHT,
    endfunc: None,
};
pub static MOVE_RUN: MMove = MMove {
    firstframe: FRAME_RUN_FIRST,
    lastframe: FRAME_RUN_LAST,
    frames: &FRAMES_RUN,
    endfunc: None,
};
pub static MOVE_PAIN: MMove = MMove {
    firstframe: FRAME_PAIN_FIRST,
    lastframe: FRAME_PAIN_LAST,
    frames: &FRAMES_PAIN,
    endfunc: Some(kigrax_run),
};
pub static MOVE_DEATH: MMove = MMove {
    firstframe: FRAME_DEATH_FIRST,
    lastframe: FRAME_DEATH_LAST,
    frames: &FRAMES_DEATH,
    endfunc: Some(kigrax_dead),
};
pub static MOVE_MELEE1: MMove = MMove {
    firstframe: FRAME_MELEE1_FIRST,
    lastframe: FRAME_MELEE1_LAST,
    frames: &FRAMES_MELEE1,
    endfunc: Some(kigrax_melee),
};
pub static MOVE_MELEE2: MMove = MMove {
    firstframe: FRAME_MELEE2_FIRST,
    lastframe: FRAME_MELEE2_LAST,
    frames: &FRAMES_MELEE2,
    endfunc: Some(kigrax_melee),
};
pub static MOVE_ATTACK: MMove = MMove {
    firstframe: FRAME_ATTACK_FIRST,
    lastframe: FRAME_ATTACK_LAST,
    frames: &FRAMES_ATTACK,
    endfunc: Some(kigrax_run),
};

fn sound(self_idx: usize, channel: i32, name: &str) {
    gi_sound(self_idx as i32, channel, gi_soundindex(name), 1.0, ATTN_NORM, 0.0);
}

// ============================================================
// Move selection
// ============================================================

fn stand_move(roll: f32) -> &'static MMove {
    if roll < STAND_CHANCE {
        &MOVE_SCAN
    } else {
        &MOVE_STAND
    }
}

fn walk_move(roll: f32) -> &'static MMove {
    if roll < STAND_CHANCE {
        &MOVE_WALK2
    } else {
        &MOVE_WALK1
    }
}

/// Next melee move: back to running once the enemy is dead or out of
/// reach, or on a `skip_roll` below 10 %.
fn melee_in_reach(ctx: &GameContext, self_idx: usize) -> bool {
    let Some(enemy_idx) = ctx.ent(ctx.edicts[self_idx].enemy) else {
        return false;
    };
    let enemy = &ctx.edicts[enemy_idx];
    enemy.health > 0 && range(&ctx.edicts[self_idx], enemy) == RANGE_MELEE
}

/// The alternate roll is only drawn once the skip roll has passed.
fn melee_pick(skip_roll: f32, alt_roll: impl FnOnce() -> f32) -> &'static MMove {
    if skip_roll < MELEE_SKIP_CHANCE {
        &MOVE_RUN
    } else if alt_roll() < MELEE_ALT_CHANCE {
        &MOVE_MELEE1
    } else {
        &MOVE_MELEE2
    }
}

// ============================================================
// Monster callbacks
// ============================================================

pub fn kigrax_stand(ctx: &mut GameContext, self_idx: usize) {
    if ctx.edicts[self_idx].monsterinfo.aiflags.intersects(AI_STAND_GROUND) {
        return;
    }
    let roll = ctx.random();
    ctx.edicts[self_idx].monsterinfo.currentmove = Some(stand_move(roll));
}

pub fn kigrax_walk(ctx: &mut GameContext, self_idx: usize) {
    debug!(ent = self_idx, "walking...");
    let roll = ctx.random();
    ctx.edicts[self_idx].monsterinfo.currentmove = Some(walk_move(roll));
}

pub fn kigrax_run(ctx: &mut GameContext, self_idx: usize) {
    debug!(ent = self_idx, "running...");
    let ent = &mut ctx.edicts[self_idx];
    if ent.monsterinfo.aiflags.intersects(AI_STAND_GROUND) {
        ent.monsterinfo.currentmove = Some(&MOVE_STAND);
    } else {
        ent.monsterinfo.currentmove = Some(&MOVE_RUN);
    }
}

pub fn kigrax_search(ctx: &mut GameContext, self_idx: usize) {
    if ctx.random() < SEARCH_CHANCE {
        sound(self_idx, CHAN_VOICE, SOUND_SEARCH1);
    } else {
        sound(self_idx, CHAN_VOICE, SOUND_SEARCH2);
    }
}

pub fn kigrax_sight(ctx: &mut GameContext, self_idx: usize, _other_idx: usize) {
    sound(self_idx, CHAN_VOICE, SOUND_SIGHT);
    ctx.edicts[self_idx].monsterinfo.currentmove = Some(&MOVE_SIGHT);
}

pub fn kigrax_attack(ctx: &mut GameContext, self_idx: usize) {
    ctx.edicts[self_idx].monsterinfo.currentmove = Some(&MOVE_ATTACK);
}

pub fn kigrax_melee(ctx: &mut GameContext, self_idx: usize) {
    let mv = if melee_in_reach(ctx, self_idx) {
        let skip_roll = ctx.random();
        melee_pick(skip_roll, || ctx.random())
    } else {
        &MOVE_RUN
    };
    ctx.edicts[self_idx].monsterinfo.currentmove = Some(mv);
}

fn strike(ctx: &mut GameContext, self_idx: usize, damage: i32) {
    sound(self_idx, CHAN_WEAPON, SOUND_ATTACK);
    let aim = [MELEE_DISTANCE, ctx.edicts[self_idx].mins[0], 10.0];
    fire_hit(ctx, self_idx, aim, damage, MELEE_KICK);
}

pub fn kigrax_strike1(ctx: &mut GameContext, self_idx: usize) {
    let damage = 10 + ctx.rand_int() % 6;
    strike(ctx, self_idx, damage);
}

pub fn kigrax_strike2(ctx: &mut GameContext, self_idx: usize) {
    let damage = 20 + ctx.rand_int() % 20;
    strike(ctx, self_idx, damage);
}

/// Plasma bolt at the enemy's eyes.
pub fn kigrax_fire_plasma(ctx: &mut GameContext, self_idx: usize) {
    let Some(enemy_idx) = ctx.ent(ctx.edicts[self_idx].enemy) else {
        return;
    };

    let ent = &ctx.edicts[self_idx];
    let (forward, right, _) = angle_vectors_tuple(&ent.s.angles);
    let start = g_project_source(&ent.s.origin, &PLASMA_OFFSET, &forward, &right);

    let enemy = &ctx.edicts[enemy_idx];
    let mut target = enemy.s.origin;
    target[2] += enemy.viewheight as f32;
    let dir = vector_subtract(&target, &start);

    monster_fire_plasma(ctx, self_idx, start, dir, PLASMA_DAMAGE, PLASMA_SPEED, PLASMA_FLASH);
}

pub fn kigrax_pain(ctx: &mut GameContext, self_idx: usize, _other_idx: usize, _kick: f32, _damage: i32) {
    let time = ctx.level.time;
    if time < ctx.edicts[self_idx].pain_debounce_time {
        return;
    }
    ctx.edicts[self_idx].pain_debounce_time = time + PAIN_DELAY;

    if ctx.skill == 3.0 {
        return; // no pain anims in nightmare
    }

    sound(self_idx, CHAN_VOICE, SOUND_PAIN);
    ctx.edicts[self_idx].monsterinfo.currentmove = Some(&MOVE_PAIN);
}

/// Corpse falls and blows up once it hits the ground.
pub fn kigrax_deadthink(ctx: &mut GameContext, self_idx: usize) {
    let ent = &ctx.edicts[self_idx];
    let time = ctx.level.time;
    if ent.groundentity >= 0 || time >= ent.timestamp {
        become_explosion1(ctx, self_idx);
        return;
    }
    ctx.edicts[self_idx].nextthink = time + FRAMETIME;
}

pub fn kigrax_dead(ctx: &mut GameContext, self_idx: usize) {
    let time = ctx.level.time;
    let ent = &mut ctx.edicts[self_idx];
    if ent.svflags & SVF_DEADMONSTER != 0 {
        return;
    }
    ent.mins = [-16.0, -16.0, -16.0];
    ent.maxs = [16.0, 16.0, 0.0];
    ent.movetype = MoveType::Toss;
    ent.flags.remove(FL_FLY);
    ent.svflags |= SVF_DEADMONSTER;
    ent.timestamp = time + CORPSE_FUSE;
    ent.think_fn = Some(kigrax_deadthink);
    ent.nextthink = time + FRAMETIME;
    gi_linkentity(self_idx as i32);
}

pub fn kigrax_die(ctx: &mut GameContext, self_idx: usize, _inflictor_idx: usize, _attacker_idx: usize, damage: i32, _point: Vec3) {
    if ctx.means_of_death == MOD_INSTANT_EXPLODE {
        become_explosion1(ctx, self_idx);
        return;
    }

    // check for gib
    if ctx.edicts[self_idx].health <= ctx.edicts[self_idx].gib_health {
        sound(self_idx, CHAN_VOICE, "misc/udeath.wav");
        for _ in 0..2 {
            throw_gib(ctx, self_idx, "models/objects/gibs/bone/tris.md2", damage, GIB_ORGANIC);
        }
        for _ in 0..2 {
            throw_gib(ctx, self_idx, "models/objects/gibs/sm_meat/tris.md2", damage, GIB_ORGANIC);
        }
        throw_head(ctx, self_idx, "models/objects/gibs/sm_meat/tris.md2", damage, GIB_ORGANIC);
        ctx.edicts[self_idx].deadflag = DEAD_DEAD;
        return;
    }

    if ctx.edicts[self_idx].deadflag == DEAD_DEAD {
        return;
    }

    let ent = &mut ctx.edicts[self_idx];
    ent.deadflag = DEAD_DEAD;
    ent.takedamage = Damage::Yes as i32;
    ent.monsterinfo.currentmove = Some(&MOVE_DEATH);
}

// ============================================================
// Spawn function
// ============================================================

/// QUAKED monster_kigrax (1 .5 0) (-20 -20 -32) (20 20 12) Ambush Trigger_Spawn Sight
pub fn sp_monster_kigrax(ctx: &mut GameContext, self_idx: usize) {
    if ctx.deathmatch != 0.0 {
        g_free_edict(ctx, self_idx);
        return;
    }

    for name in [SOUND_PAIN, SOUND_DEATH, SOUND_SIGHT, SOUND_SEARCH1, SOUND_SEARCH2, SOUND_ATTACK, SOUND_PLASMA] {
        gi_soundindex(name);
    }

    let ent = &mut ctx.edicts[self_idx];
    ent.s.modelindex = gi_modelindex("models/monsters/kigrax/tris.md2");
    ent.s.sound = gi_soundindex(SOUND_IDLE);

    ent.mins = [-20.0, -20.0, -32.0];
    ent.maxs = [20.0, 20.0, 12.0];
    ent.movetype = MoveType::Step;
    ent.solid = Solid::Bbox;
    ent.health = 200;
    ent.gib_health = -100;
    ent.mass = 150;
    ent.viewheight = 90;

    ent.pain_fn = Some(kigrax_pain);
    ent.die_fn = Some(kigrax_die);

    ent.monsterinfo.stand_fn = Some(kigrax_stand);
    ent.monsterinfo.idle_fn = Some(kigrax_stand);
    ent.monsterinfo.walk_fn = Some(kigrax_walk);
    ent.monsterinfo.run_fn = Some(kigrax_run);
    ent.monsterinfo.attack_fn = Some(kigrax_attack);
    ent.monsterinfo.melee_fn = Some(kigrax_melee);
    ent.monsterinfo.sight_fn = Some(kigrax_sight);
    ent.monsterinfo.search_fn = Some(kigrax_search);
    ent.monsterinfo.scale = 1.0;

    gi_linkentity(self_idx as i32);

    ctx.edicts[self_idx].monsterinfo.currentmove = Some(&MOVE_STAND);
    flymonster_start(ctx, self_idx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::call_think;
    use crate::g_combat::t_damage;
    use crate::g_monster::m_move_frame;
    use crate::g_utils::g_spawn;
    use crate::game_import::testing;
    use rand::Rng;

    fn make_ctx() -> GameContext {
        testing::install();
        let mut ctx = GameCtx::with_capacity(64, 1);
        ctx.level.time = 1.0;
        ctx
    }

    fn spawn_kigrax(ctx: &mut GameContext) -> usize {
        let idx = g_spawn(ctx).unwrap();
        ctx.edicts[idx].classname = "monster_kigrax".into();
        sp_monster_kigrax(ctx, idx);
        idx
    }

    fn spawn_enemy(ctx: &mut GameContext, origin: Vec3) -> usize {
        let idx = g_spawn(ctx).unwrap();
        let e = &mut ctx.edicts[idx];
        e.classname = "enemy".into();
        e.s.origin = origin;
        e.mins = [-16.0, -16.0, -24.0];
        e.maxs = [16.0, 16.0, 32.0];
        e.solid = Solid::Bbox;
        e.health = 100;
        e.takedamage = Damage::Aim as i32;
        e.svflags |= SVF_MONSTER;
        e.viewheight = 22;
        idx
    }

    // ============================================================
    // Spawn
    // ============================================================

    #[test]
    fn test_spawn_sets_up_flyer() {
        let mut ctx = make_ctx();
        let k = spawn_kigrax(&mut ctx);
        let e = &ctx.edicts[k];
        assert_eq!(e.health, 200);
        assert_eq!(e.max_health, 200);
        assert_eq!(e.gib_health, -100);
        assert_eq!(e.mass, 150);
        assert_eq!(e.viewheight, 90);
        assert_eq!(e.maxs, [20.0, 20.0, 12.0]);
        assert!(e.flags.contains(FL_FLY));
        assert!(e.is_monster());
        assert_eq!(e.s.sound, testing::index(SOUND_IDLE));
        assert_eq!(ctx.level.total_monsters, 1);
        assert!(is_move(e.monsterinfo.currentmove, &MOVE_STAND));
    }

    #[test]
    fn test_spawn_in_deathmatch_frees() {
        let mut ctx = make_ctx();
        ctx.deathmatch = 1.0;
        let k = spawn_kigrax(&mut ctx);
        assert!(!ctx.edicts[k].inuse);
    }

    #[test]
    fn test_start_go_keeps_tall_view_height() {
        let mut ctx = make_ctx();
        let k = spawn_kigrax(&mut ctx);
        call_think(&mut ctx, k);
        assert_eq!(ctx.edicts[k].viewheight, 90);
        assert_eq!(ctx.edicts[k].yaw_speed, 10.0);
        let mv = ctx.edicts[k].monsterinfo.currentmove;
        assert!(is_move(mv, &MOVE_STAND) || is_move(mv, &MOVE_SCAN));
    }

    // ============================================================
    // Move selection
    // ============================================================

    #[test]
    fn test_stand_and_walk_rolls() {
        assert!(std::ptr::eq(stand_move(0.2), &MOVE_SCAN));
        assert!(std::ptr::eq(stand_move(0.5), &MOVE_STAND));
        assert!(std::ptr::eq(walk_move(0.1), &MOVE_WALK2));
        assert!(std::ptr::eq(walk_move(0.9), &MOVE_WALK1));
    }

    #[test]
    fn test_stand_ground_keeps_current_move() {
        let mut ctx = make_ctx();
        let k = spawn_kigrax(&mut ctx);
        ctx.edicts[k].monsterinfo.aiflags.insert(AI_STAND_GROUND);
        ctx.edicts[k].monsterinfo.currentmove = Some(&MOVE_ATTACK);
        kigrax_stand(&mut ctx, k);
        assert!(is_move(ctx.edicts[k].monsterinfo.currentmove, &MOVE_ATTACK));
        kigrax_run(&mut ctx, k);
        assert!(is_move(ctx.edicts[k].monsterinfo.currentmove, &MOVE_STAND));
    }

    #[test]
    fn test_melee_choice() {
        assert!(std::ptr::eq(melee_pick(0.05, || 0.5), &MOVE_RUN));
        assert!(std::ptr::eq(melee_pick(0.5, || 0.5), &MOVE_MELEE1));
        assert!(std::ptr::eq(melee_pick(0.5, || 0.95), &MOVE_MELEE2));

        let mut drawn = false;
        melee_pick(0.05, || {
            drawn = true;
            0.5
        });
        assert!(!drawn);
    }

    #[test]
    fn test_melee_out_of_reach_runs_without_rolling() {
        let mut ctx = make_ctx();
        let k = spawn_kigrax(&mut ctx);
        let enemy = spawn_enemy(&mut ctx, [300.0, 0.0, 0.0]);
        ctx.edicts[k].enemy = enemy as i32;

        let mut expected = ctx.rng.clone();
        kigrax_melee(&mut ctx, k);
        assert!(is_move(ctx.edicts[k].monsterinfo.currentmove, &MOVE_RUN));

        ctx.edicts[enemy].s.origin = [40.0, 0.0, 0.0];
        ctx.edicts[enemy].health = 0;
        kigrax_melee(&mut ctx, k);
        assert!(is_move(ctx.edicts[k].monsterinfo.currentmove, &MOVE_RUN));
        assert_eq!(ctx.random(), expected.gen::<f32>());
    }

    #[test]
    fn test_melee_in_reach_rolls() {
        let mut ctx = make_ctx();
        let k = spawn_kigrax(&mut ctx);
        let enemy = spawn_enemy(&mut ctx, [40.0, 0.0, 0.0]);
        ctx.edicts[k].enemy = enemy as i32;

        let mut expected = ctx.rng.clone();
        kigrax_melee(&mut ctx, k);
        let skip = expected.gen::<f32>();
        let want = if skip < MELEE_SKIP_CHANCE {
            &MOVE_RUN
        } else if expected.gen::<f32>() < MELEE_ALT_CHANCE {
            &MOVE_MELEE1
        } else {
            &MOVE_MELEE2
        };
        assert!(is_move(ctx.edicts[k].monsterinfo.currentmove, want));
        assert_eq!(ctx.random(), expected.gen::<f32>());
    }

    #[test]
    fn test_sight_plays_sound_and_move() {
        let mut ctx = make_ctx();
        let k = spawn_kigrax(&mut ctx);
        kigrax_sight(&mut ctx, k, 0);
        assert!(testing::sound_played(SOUND_SIGHT));
        assert!(is_move(ctx.edicts[k].monsterinfo.currentmove, &MOVE_SIGHT));
    }

    // ============================================================
    // Attacks
    // ============================================================

    #[test]
    fn test_strike_damages_enemy_in_reach() {
        let mut ctx = make_ctx();
        let k = spawn_kigrax(&mut ctx);
        let enemy = spawn_enemy(&mut ctx, [40.0, 0.0, 0.0]);
        ctx.edicts[k].enemy = enemy as i32;
        kigrax_strike1(&mut ctx, k);
        let health = ctx.edicts[enemy].health;
        assert!((85..=90).contains(&health), "health {}", health);
        assert!(testing::sound_played(SOUND_ATTACK));
    }

    #[test]
    fn test_attack_fires_plasma_on_fire_frame() {
        let mut ctx = make_ctx();
        let k = spawn_kigrax(&mut ctx);
        let enemy = spawn_enemy(&mut ctx, [500.0, 0.0, 0.0]);
        ctx.edicts[k].enemy = enemy as i32;
        ctx.edicts[k].monsterinfo.currentmove = Some(&MOVE_ATTACK);
        ctx.edicts[k].s.frame = FRAME_ATTACK_FIRE - 1;
        testing::clear();

        m_move_frame(&mut ctx, k);
        assert_eq!(ctx.edicts[k].s.frame, FRAME_ATTACK_FIRE);
        let bolt = ctx.edicts.iter().position(|e| e.inuse && e.classname == "plasma bolt").unwrap();
        assert_eq!(ctx.edicts[bolt].s.origin, [16.0, 0.0, -16.0]);
        assert_eq!(ctx.edicts[bolt].dmg, PLASMA_DAMAGE);
        assert_eq!(ctx.edicts[bolt].owner, k as i32);
        // aimed up at the enemy's eyes
        assert!(ctx.edicts[bolt].velocity[2] > 0.0);
        assert!(testing::writes().contains(&testing::Write::Byte(SVC_MUZZLEFLASH2)));
    }

    #[test]
    fn test_fire_without_enemy_does_nothing() {
        let mut ctx = make_ctx();
        let k = spawn_kigrax(&mut ctx);
        let before = ctx.num_edicts;
        kigrax_fire_plasma(&mut ctx, k);
        assert_eq!(ctx.num_edicts, before);
    }

    // ============================================================
    // Pain and death
    // ============================================================

    #[test]
    fn test_pain_debounce_and_nightmare() {
        let mut ctx = make_ctx();
        let k = spawn_kigrax(&mut ctx);
        kigrax_pain(&mut ctx, k, 0, 0.0, 10);
        assert!(is_move(ctx.edicts[k].monsterinfo.currentmove, &MOVE_PAIN));
        assert_eq!(ctx.edicts[k].pain_debounce_time, 4.0);

        ctx.edicts[k].monsterinfo.currentmove = Some(&MOVE_RUN);
        ctx.level.time = 2.0;
        kigrax_pain(&mut ctx, k, 0, 0.0, 10);
        assert!(is_move(ctx.edicts[k].monsterinfo.currentmove, &MOVE_RUN));

        ctx.skill = 3.0;
        ctx.level.time = 5.0;
        kigrax_pain(&mut ctx, k, 0, 0.0, 10);
        assert!(is_move(ctx.edicts[k].monsterinfo.currentmove, &MOVE_RUN));
        assert_eq!(ctx.edicts[k].pain_debounce_time, 8.0);
    }

    #[test]
    fn test_instant_explode_kill() {
        let mut ctx = make_ctx();
        let k = spawn_kigrax(&mut ctx);
        t_damage(&mut ctx, k, 0, 0, VEC3_ORIGIN, VEC3_ORIGIN, VEC3_ORIGIN, 500, 0, DAMAGE_NO_KNOCKBACK, MOD_INSTANT_EXPLODE);
        assert!(!ctx.edicts[k].inuse);
        assert!(testing::temp_entities().contains(&TE_EXPLOSION1));
    }

    #[test]
    fn test_gib_death() {
        let mut ctx = make_ctx();
        let k = spawn_kigrax(&mut ctx);
        ctx.edicts[k].health = -150;
        kigrax_die(&mut ctx, k, 0, 0, 150, VEC3_ORIGIN);
        assert_eq!(ctx.edicts[k].deadflag, DEAD_DEAD);
        assert_eq!(ctx.edicts.iter().filter(|e| e.inuse && e.classname == "gib").count(), 4);
        assert!(testing::sound_played("misc/udeath.wav"));
    }

    #[test]
    fn test_regular_death_then_corpse_explodes_on_landing() {
        let mut ctx = make_ctx();
        let k = spawn_kigrax(&mut ctx);
        ctx.edicts[k].health = -10;
        kigrax_die(&mut ctx, k, 0, 0, 20, VEC3_ORIGIN);
        assert!(is_move(ctx.edicts[k].monsterinfo.currentmove, &MOVE_DEATH));
        assert!(!testing::sound_played(SOUND_DEATH));

        // a second kill while dying changes nothing
        kigrax_die(&mut ctx, k, 0, 0, 20, VEC3_ORIGIN);
        assert!(is_move(ctx.edicts[k].monsterinfo.currentmove, &MOVE_DEATH));

        ctx.edicts[k].s.frame = FRAME_DEATH_THINK - 1;
        m_move_frame(&mut ctx, k);
        let e = &ctx.edicts[k];
        assert_eq!(e.movetype, MoveType::Toss);
        assert_ne!(e.svflags & SVF_DEADMONSTER, 0);
        assert_eq!(e.maxs, [16.0, 16.0, 0.0]);
        assert_eq!(e.timestamp, 16.0);

        call_think(&mut ctx, k);
        assert!(ctx.edicts[k].inuse);
        ctx.edicts[k].groundentity = 0;
        call_think(&mut ctx, k);
        assert!(!ctx.edicts[k].inuse);
        assert!(testing::temp_entities().contains(&TE_EXPLOSION1));
    }

    #[test]
    fn test_corpse_fuse_expires() {
        let mut ctx = make_ctx();
        let k = spawn_kigrax(&mut ctx);
        kigrax_dead(&mut ctx, k);
        ctx.level.time = 16.0;
        call_think(&mut ctx, k);
        assert!(!ctx.edicts[k].inuse);
    }
}
