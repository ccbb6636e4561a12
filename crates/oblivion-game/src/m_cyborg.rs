// m_cyborg.rs: cyborg, a deatom-firing trooper that digs in when badly hurt

use tracing::trace;

use crate::g_ai::{ai_charge, ai_move, ai_run, ai_stand, ai_walk, range};
use crate::g_local::*;
use crate::g_misc::{throw_gib, throw_head};
use crate::g_monster::{frames, frames_dist, walkmonster_start, with_think};
use crate::g_oblivion_monster::monster_fire_deatom;
use crate::g_utils::{g_free_edict, g_project_source};
use crate::g_weapon::fire_hit;
use crate::game_import::*;

// ============================================================
// Frame definitions
// ============================================================

pub const FRAME_DEATH101: i32 = 15;
pub const FRAME_DEATH108: i32 = 22;
pub const FRAME_WALK1: i32 = 18;
pub const FRAME_WALK18: i32 = 35;
pub const FRAME_ATTACK101: i32 = 24;
pub const FRAME_ATTACK112: i32 = 35;
pub const FRAME_ATTACK201: i32 = 47;
pub const FRAME_ATTACK211: i32 = 57;
pub const FRAME_ATTACK301: i32 = 53;
pub const FRAME_ATTACK306: i32 = 58;
pub const FRAME_ATTACK401: i32 = 59;
pub const FRAME_ATTACK406: i32 = 64;
pub const FRAME_MELEE101: i32 = 65;
pub const FRAME_MELEE108: i32 = 72;
pub const FRAME_PAIN101: i32 = 73;
pub const FRAME_PAIN106: i32 = 78;
pub const FRAME_RUN1: i32 = 79;
pub const FRAME_RUN6: i32 = 84;
pub const FRAME_MELEE201: i32 = 82;
pub const FRAME_MELEE206: i32 = 87;
pub const FRAME_PAIN201: i32 = 88;
pub const FRAME_PAIN216: i32 = 103;
pub const FRAME_TPOSE: i32 = 108;
pub const FRAME_DEATH201: i32 = 110;
pub const FRAME_DEATH206: i32 = 115;
pub const FRAME_DEATH301: i32 = 116;
pub const FRAME_DEATH306: i32 = 121;

pub const MODEL_SCALE: f32 = 1.0;

const DEATOM_DAMAGE: i32 = 50;
const DEATOM_SPEED: i32 = 500;
const DEATOM_FLASH: i32 = 1;
const PAIN_DELAY: f32 = 3.0;
const ATTACK_FINISHED_BASE: f32 = 1.0;
const ATTACK_FINISHED_RANDOM: f32 = 0.4;
/// How long a wounded cyborg holds its ground.
pub const STAND_GROUND_DURATION: f32 = 3.0;

const SOUND_PAIN: &str = "cyborg/pain.wav";
const SOUND_DEATH: &str = "cyborg/death.wav";
const SOUND_SIGHT: &str = "cyborg/sight.wav";
const SOUND_IDLE: &str = "cyborg/idle.wav";
const SOUND_ATTACK: &str = "chick/chkatck2.wav";
const SOUND_STEP: &str = "insane/insane11.wav";

// ============================================================
// Move tables
// ============================================================

static FRAMES_STAND: [MFrame; 1] = frames(ai_stand, 0.0);

static FRAMES_WALK: [MFrame; 18] = with_think(
    frames_dist(ai_walk, [8.0, 6.0, 5.0, 3.0, 1.0, 3.0, 5.0, 6.0, 8.0, 8.0, 5.0, 3.0, 1.0, 1.0, 3.0, 5.0, 6.0, 8.0]),
    &[4, 13],
    cyborg_footstep,
);

static FRAMES_RUN: [MFrame; 6] =
    with_think(frames_dist(ai_run, [16.0, 10.0, 11.0, 16.0, 10.0, 11.0]), &[1, 4], cyborg_footstep);

static FRAMES_ATTACK_RUN: [MFrame; 12] = with_think(
    with_think(
        with_think(
            frames_dist(ai_charge, [16.0, 16.0, 16.0, 12.0, 12.0, 12.0, 12.0, 16.0, 12.0, 12.0, 8.0, 6.0]),
            &[2, 8],
            cyborg_footstep,
        ),
        &[5],
        cyborg_fire_left,
    ),
    &[11],
    cyborg_fire_right,
);

static FRAMES_ATTACK_BACKFLIP: [MFrame; 11] = with_think(
    with_think(
        frames_dist(ai_charge, [1.0, 0.0, 0.0, -4.0, -6.0, -6.0, -4.0, -2.0, -2.0, 0.0, 0.0]),
        &[6],
        cyborg_footstep,
    ),
    &[7],
    cyborg_fire_both_footstep,
);

static FRAMES_ATTACK_RIGHT: [MFrame; 6] = with_think(
    with_think(frames_dist(ai_charge, [0.0, -2.0, -4.0, -2.0, 0.0, 0.0]), &[1], cyborg_fire_right),
    &[5],
    cyborg_reattack,
);

static FRAMES_ATTACK_LEFT: [MFrame; 6] = with_think(
    with_think(frames_dist(ai_charge, [0.0, -2.0, -4.0, -2.0, 0.0, 0.0]), &[1], cyborg_fire_left),
    &[5],
    cyborg_reattack,
);

static FRAMES_MELEE1: [MFrame; 8] = with_think(
    with_think(
        with_think(
            frames_dist(ai_charge, [0.0, 1.0, 2.0, 1.0, 0.0, 1.0, 2.0, -2.0]),
            &[2],
            cyborg_footstep_punch,
        ),
        &[6],
        cyborg_punch,
    ),
    &[7],
    cyborg_footstep_backflip,
);

static FRAMES_MELEE2: [MFrame; 6] = with_think(
    with_think(frames_dist(ai_charge, [1.0, 2.0, 3.0, 3.0, -2.0, -2.0]), &[2], cyborg_kick),
    &[5],
    cyborg_punch_backflip,
);

static FRAMES_PAIN1: [MFrame; 6] = frames(ai_move, 0.0);

static FRAMES_PAIN2: [MFrame; 16] = with_think(
    frames_dist(ai_move, [0.0, -1.0, -1.0, -2.0, -2.0, -2.0, -1.0, 0.0, -1.0, -1.0, 1.0, 4.0, 4.0, 2.0, 0.0, 0.0]),
    &[4, 12],
    cyborg_footstep,
);

static FRAMES_DEATH1: [MFrame; 8] =
    with_think(with_think(frames(ai_move, 0.0), &[4], cyborg_shrink), &[7], cyborg_footstep);

static FRAMES_DEATH2: [MFrame; 6] = with_think(
    with_think(frames_dist(ai_move, [0.0, -1.0, -1.0, -2.0, -2.0, 0.0]), &[2], cyborg_shrink),
    &[4],
    cyborg_footstep,
);

static FRAMES_DEATH3: [MFrame; 6] = with_think(
    with_think(frames_dist(ai_move, [0.0, 1.0, 2.0, 2.0, 1.0, 0.0]), &[3], cyborg_shrink),
    &[5],
    cyborg_footstep,
);

pub static MOVE_STAND: MMove = MMove {
    firstframe: FRAME_TPOSE,
    lastframe: FRAME_TPOSE,
    frames: &FRAMES_STAND,
    endfunc: None,
};
pub static MOVE_WALK: MMove = MMove {
    firstframe: FRAME_WALK1,
    lastframe: FRAME_WALK18,
    frames: &FRAMES_WALK,
    endfunc: None,
};
pub static MOVE_RUN: MMove = MMove {
    firstframe: FRAME_RUN1,
    lastframe: FRAME_RUN6,
    frames: &FRAMES_RUN,
    endfunc: None,
};
pub static MOVE_ATTACK_RUN: MMove = MMove {
    firstframe: FRAME_ATTACK101,
    lastframe: FRAME_ATTACK112,
    frames: &FRAMES_ATTACK_RUN,
    endfunc: Some(cyborg_run),
};
pub static MOVE_ATTACK_BACKFLIP: MMove = MMove {
    firstframe: FRAME_ATTACK201,
    lastframe: FRAME_ATTACK211,
    frames: &FRAMES_ATTACK_BACKFLIP,
    endfunc: Some(cyborg_run),
};
pub static MOVE_ATTACK_RIGHT: MMove = MMove {
    firstframe: FRAME_ATTACK301,
    lastframe: FRAME_ATTACK306,
    frames: &FRAMES_ATTACK_RIGHT,
    endfunc: Some(cyborg_run),
};
pub static MOVE_ATTACK_LEFT: MMove = MMove {
    firstframe: FRAME_ATTACK401,
    lastframe: FRAME_ATTACK406,
    frames: &FRAMES_ATTACK_LEFT,
    endfunc: Some(cyborg_run),
};
pub static MOVE_MELEE1: MMove = MMove {
    firstframe: FRAME_MELEE101,
    lastframe: FRAME_MELEE108,
    frames: &FRAMES_MELEE1,
    endfunc: Some(cyborg_run),
};
pub static MOVE_MELEE2: MMove = MMove {
    firstframe: FRAME_MELEE201,
    lastframe: FRAME_MELEE206,
    frames: &FRAMES_MELEE2,
    endfunc: Some(cyborg_run),
};
pub static MOVE_PAIN1: MMove = MMove {
    firstframe: FRAME_PAIN101,
    lastframe: FRAME_PAIN106,
    frames: &FRAMES_PAIN1,
    endfunc: Some(cyborg_run),
};
pub static MOVE_PAIN2: MMove = MMove {
    firstframe: FRAME_PAIN201,
    lastframe: FRAME_PAIN216,
    frames: &FRAMES_PAIN2,
    endfunc: Some(cyborg_run),
};
pub static MOVE_DEATH1: MMove = MMove {
    firstframe: FRAME_DEATH101,
    lastframe: FRAME_DEATH108,
    frames: &FRAMES_DEATH1,
    endfunc: Some(cyborg_dead),
};
pub static MOVE_DEATH2: MMove = MMove {
    firstframe: FRAME_DEATH201,
    lastframe: FRAME_DEATH206,
    frames: &FRAMES_DEATH2,
    endfunc: Some(cyborg_dead),
};
pub static MOVE_DEATH3: MMove = MMove {
    firstframe: FRAME_DEATH301,
    lastframe: FRAME_DEATH306,
    frames: &FRAMES_DEATH3,
    endfunc: Some(cyborg_dead),
};

// ============================================================
// Sounds
// ============================================================

pub fn cyborg_idle(_ctx: &mut GameContext, self_idx: usize) {
    gi_sound(self_idx as i32, CHAN_VOICE, gi_soundindex(SOUND_IDLE), 1.0, ATTN_IDLE, 0.0);
}

pub fn cyborg_search(_ctx: &mut GameContext, self_idx: usize) {
    gi_sound(self_idx as i32, CHAN_VOICE, gi_soundindex(SOUND_SIGHT), 1.0, ATTN_NORM, 0.0);
}

pub fn cyborg_sight(_ctx: &mut GameContext, self_idx: usize, _other_idx: usize) {
    gi_sound(self_idx as i32, CHAN_VOICE, gi_soundindex(SOUND_SIGHT), 1.0, ATTN_NORM, 0.0);
}

pub fn cyborg_footstep(_ctx: &mut GameContext, self_idx: usize) {
    gi_sound(self_idx as i32, CHAN_BODY, gi_soundindex(SOUND_STEP), 0.5, ATTN_IDLE, 0.0);
}

// ============================================================
// Wound anchor
//
// Below half health a hit roots the cyborg in place for a few seconds.
// When it gets moving again the heavy landing thud plays once.
// ============================================================

/// Plant the cyborg for `duration` seconds. Never shortens a longer anchor.
pub fn cyborg_schedule_stand_ground(ctx: &mut GameContext, self_idx: usize, duration: f32) {
    let time = ctx.level.time;
    let ent = &mut ctx.edicts[self_idx];
    ent.monsterinfo.aiflags.insert(AI_STAND_GROUND);
    ent.monsterinfo.landing_thud = true;

    let anchor_expire = time + duration;
    if ent.monsterinfo.anchor_time <= time || ent.monsterinfo.anchor_time < anchor_expire {
        ent.monsterinfo.anchor_time = anchor_expire;
    }
}

pub fn cyborg_wound_stand_ground(ctx: &mut GameContext, self_idx: usize) {
    let ent = &ctx.edicts[self_idx];
    let max_health = ent.max_health;
    let stage = if ent.health <= max_health / 4 {
        2
    } else if ent.health <= max_health / 2 {
        1
    } else {
        return;
    };

    ctx.edicts[self_idx].monsterinfo.anchor_stage = stage;
    cyborg_schedule_stand_ground(ctx, self_idx, STAND_GROUND_DURATION);
    trace!(ent = self_idx, stage, "cyborg anchored");
}

/// Heavy thud once the cyborg moves off after an anchor or an attack.
pub fn cyborg_land(ctx: &mut GameContext, self_idx: usize) {
    let ent = &mut ctx.edicts[self_idx];
    if !ent.monsterinfo.landing_thud {
        return;
    }
    ent.monsterinfo.landing_thud = false;
    gi_sound(self_idx as i32, CHAN_BODY, gi_soundindex(SOUND_STEP), 1.0, ATTN_NORM, 0.0);
}

/// Release an expired anchor.
pub fn cyborg_update_stand_ground(ctx: &mut GameContext, self_idx: usize) {
    let time = ctx.level.time;
    let ent = &mut ctx.edicts[self_idx];
    if ent.monsterinfo.anchor_time <= 0.0 || ent.monsterinfo.anchor_time > time {
        return;
    }

    ent.monsterinfo.anchor_time = 0.0;
    ent.monsterinfo.anchor_stage = 0;
    ent.monsterinfo.aiflags.remove(AI_STAND_GROUND);
    cyborg_land(ctx, self_idx);
}

// ============================================================
// Locomotion
// ============================================================

pub fn cyborg_stand(ctx: &mut GameContext, self_idx: usize) {
    ctx.edicts[self_idx].monsterinfo.currentmove = Some(&MOVE_STAND);
}

pub fn cyborg_walk(ctx: &mut GameContext, self_idx: usize) {
    cyborg_update_stand_ground(ctx, self_idx);
    if ctx.edicts[self_idx].monsterinfo.aiflags.intersects(AI_STAND_GROUND) {
        cyborg_stand(ctx, self_idx);
        return;
    }
    cyborg_land(ctx, self_idx);
    ctx.edicts[self_idx].monsterinfo.currentmove = Some(&MOVE_WALK);
}

pub fn cyborg_run(ctx: &mut GameContext, self_idx: usize) {
    cyborg_update_stand_ground(ctx, self_idx);
    if ctx.edicts[self_idx].monsterinfo.aiflags.intersects(AI_STAND_GROUND) {
        cyborg_stand(ctx, self_idx);
        return;
    }
    if ctx.ent(ctx.edicts[self_idx].enemy).is_none() {
        cyborg_walk(ctx, self_idx);
        return;
    }
    cyborg_land(ctx, self_idx);
    ctx.edicts[self_idx].monsterinfo.currentmove = Some(&MOVE_RUN);
}

// ============================================================
// Attacks
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hand {
    Left,
    Right,
}

/// Muzzle offset for the arm firing on `frame`. Earlier rows win when a
/// frame appears twice.
fn muzzle_offset(frame: i32, hand: Hand) -> Vec3 {
    match hand {
        Hand::Left => {
            if frame == FRAME_ATTACK101 + 5 {
                [8.0, 23.0, 13.0]
            } else if frame == FRAME_ATTACK201 + 7 {
                [10.5, -12.5, -9.0]
            } else if frame == FRAME_ATTACK401 + 1 {
                [11.0, -16.0, 10.0]
            } else {
                [8.0, -5.0, 12.5]
            }
        }
        Hand::Right => {
            if frame == FRAME_ATTACK101 + 11 {
                [23.0, -8.5, 13.0]
            } else if frame == FRAME_ATTACK201 + 7 {
                [-10.5, 25.0, -9.0]
            } else if frame == FRAME_ATTACK301 + 1 {
                [-11.0, 18.0, 10.0]
            } else {
                [-8.0, 25.0, 12.5]
            }
        }
    }
}

fn cyborg_fire(ctx: &mut GameContext, self_idx: usize, hand: Hand) {
    let Some(enemy_idx) = ctx.ent(ctx.edicts[self_idx].enemy) else {
        return;
    };

    let ent = &ctx.edicts[self_idx];
    let offset = muzzle_offset(ent.s.frame, hand);
    let (forward, right, _) = angle_vectors_tuple(&ent.s.angles);
    let start = g_project_source(&ent.s.origin, &offset, &forward, &right);
    let aim = vector_normalized(&vector_subtract(&ctx.edicts[enemy_idx].s.origin, &start));

    gi_sound(self_idx as i32, CHAN_WEAPON, gi_soundindex(SOUND_ATTACK), 1.0, ATTN_NORM, 0.0);
    monster_fire_deatom(ctx, self_idx, start, aim, DEATOM_DAMAGE, DEATOM_SPEED, DEATOM_FLASH);
}

pub fn cyborg_fire_left(ctx: &mut GameContext, self_idx: usize) {
    cyborg_fire(ctx, self_idx, Hand::Left);
}

pub fn cyborg_fire_right(ctx: &mut GameContext, self_idx: usize) {
    cyborg_fire(ctx, self_idx, Hand::Right);
}

pub fn cyborg_fire_both_footstep(ctx: &mut GameContext, self_idx: usize) {
    cyborg_fire_left(ctx, self_idx);
    cyborg_fire_right(ctx, self_idx);
    cyborg_footstep(ctx, self_idx);
}

/// Running attack at mid range or beyond, otherwise a standing shot from
/// either arm.
fn attack_move(enemy_range: i32, roll: f32) -> &'static MMove {
    if enemy_range >= RANGE_MID {
        &MOVE_ATTACK_RUN
    } else if roll > 0.5 {
        &MOVE_ATTACK_RIGHT
    } else {
        &MOVE_ATTACK_LEFT
    }
}

/// Chain another shot after a standing attack. `None` lets the attack end.
fn reattack_move(stop_roll: f32, backflip_roll: f32, side_roll: f32) -> Option<&'static MMove> {
    if stop_roll > 0.5 {
        None
    } else if backflip_roll >= 0.75 {
        Some(&MOVE_ATTACK_BACKFLIP)
    } else if side_roll >= 0.5 {
        Some(&MOVE_ATTACK_RIGHT)
    } else {
        Some(&MOVE_ATTACK_LEFT)
    }
}

pub fn cyborg_attack(ctx: &mut GameContext, self_idx: usize) {
    let Some(enemy_idx) = ctx.ent(ctx.edicts[self_idx].enemy) else {
        return;
    };
    let cooldown = ATTACK_FINISHED_BASE + ctx.random() * ATTACK_FINISHED_RANDOM;
    ctx.edicts[self_idx].monsterinfo.attack_finished = ctx.level.time + cooldown;

    cyborg_update_stand_ground(ctx, self_idx);
    if ctx.edicts[self_idx].monsterinfo.aiflags.intersects(AI_STAND_GROUND) {
        cyborg_stand(ctx, self_idx);
        return;
    }

    let enemy_range = range(&ctx.edicts[self_idx], &ctx.edicts[enemy_idx]);
    let roll = ctx.random();

    let ent = &mut ctx.edicts[self_idx];
    ent.monsterinfo.currentmove = Some(attack_move(enemy_range, roll));
    ent.monsterinfo.landing_thud = true;
}

pub fn cyborg_reattack(ctx: &mut GameContext, self_idx: usize) {
    let rolls = (ctx.random(), ctx.random(), ctx.random());
    if let Some(mv) = reattack_move(rolls.0, rolls.1, rolls.2) {
        let ent = &mut ctx.edicts[self_idx];
        ent.monsterinfo.currentmove = Some(mv);
        ent.monsterinfo.landing_thud = true;
    }
}

pub fn cyborg_punch(ctx: &mut GameContext, self_idx: usize) {
    let damage = (5.0 + ctx.random() * 6.0) as i32;
    if !fire_hit(ctx, self_idx, [MELEE_DISTANCE, 0.0, -24.0], damage, 250) {
        ctx.edicts[self_idx].monsterinfo.melee_debounce_time = ctx.level.time + 1.2;
    }
}

pub fn cyborg_kick(ctx: &mut GameContext, self_idx: usize) {
    let damage = (15.0 + ctx.random() * 6.0) as i32;
    let aim = [MELEE_DISTANCE, ctx.edicts[self_idx].mins[0], -4.0];
    if !fire_hit(ctx, self_idx, aim, damage, 400) {
        ctx.edicts[self_idx].monsterinfo.melee_debounce_time = ctx.level.time + 2.5;
    }
}

pub fn cyborg_backflip(ctx: &mut GameContext, self_idx: usize) {
    if ctx.random() >= 0.5 {
        ctx.edicts[self_idx].monsterinfo.currentmove = Some(&MOVE_ATTACK_BACKFLIP);
    }
}

pub fn cyborg_footstep_punch(ctx: &mut GameContext, self_idx: usize) {
    cyborg_footstep(ctx, self_idx);
    cyborg_punch(ctx, self_idx);
}

pub fn cyborg_footstep_backflip(ctx: &mut GameContext, self_idx: usize) {
    cyborg_footstep(ctx, self_idx);
    cyborg_backflip(ctx, self_idx);
}

pub fn cyborg_punch_backflip(ctx: &mut GameContext, self_idx: usize) {
    cyborg_punch(ctx, self_idx);
    cyborg_backflip(ctx, self_idx);
}

pub fn cyborg_melee(ctx: &mut GameContext, self_idx: usize) {
    let mv = if ctx.random() >= 0.5 { &MOVE_MELEE1 } else { &MOVE_MELEE2 };
    ctx.edicts[self_idx].monsterinfo.currentmove = Some(mv);
}

// ============================================================
// Pain and death
// ============================================================

pub fn cyborg_pain(ctx: &mut GameContext, self_idx: usize, _other_idx: usize, _kick: f32, _damage: i32) {
    cyborg_wound_stand_ground(ctx, self_idx);

    let time = ctx.level.time;
    if time < ctx.edicts[self_idx].pain_debounce_time {
        return;
    }

    ctx.edicts[self_idx].pain_debounce_time = time + PAIN_DELAY;
    gi_sound(self_idx as i32, CHAN_VOICE, gi_soundindex(SOUND_PAIN), 1.0, ATTN_NORM, 0.0);

    if ctx.skill == 3.0 {
        return; // no pain anims in nightmare
    }

    let roll = ctx.random();
    let ent = &mut ctx.edicts[self_idx];
    ent.monsterinfo.aiflags.remove(AI_MANUAL_STEERING);
    ent.monsterinfo.currentmove = Some(if roll >= 0.5 { &MOVE_PAIN1 } else { &MOVE_PAIN2 });
}

pub fn cyborg_dead(ctx: &mut GameContext, self_idx: usize) {
    let ent = &mut ctx.edicts[self_idx];
    ent.mins = [-16.0, -16.0, -38.0];
    ent.maxs = [16.0, 16.0, -16.0];
    ent.movetype = MoveType::Toss;
    ent.svflags |= SVF_DEADMONSTER;
    ent.nextthink = 0.0;
    gi_linkentity(self_idx as i32);
}

pub fn cyborg_shrink(ctx: &mut GameContext, self_idx: usize) {
    let ent = &mut ctx.edicts[self_idx];
    ent.maxs[2] = 0.0;
    ent.svflags |= SVF_DEADMONSTER;
    gi_linkentity(self_idx as i32);
}

pub fn cyborg_die(ctx: &mut GameContext, self_idx: usize, _inflictor_idx: usize, _attacker_idx: usize, damage: i32, _point: Vec3) {
    // check for gib
    if ctx.edicts[self_idx].health <= ctx.edicts[self_idx].gib_health {
        gi_sound(self_idx as i32, CHAN_VOICE, gi_soundindex("misc/udeath.wav"), 1.0, ATTN_NORM, 0.0);
        ctx.edicts[self_idx].s.skinnum = 0;
        for _ in 0..3 {
            throw_gib(ctx, self_idx, "models/objects/gibs/bone/tris.md2", damage, GIB_ORGANIC);
        }
        for _ in 0..5 {
            throw_gib(ctx, self_idx, "models/objects/gibs/sm_meat/tris.md2", damage, GIB_ORGANIC);
        }
        for _ in 0..2 {
            throw_gib(ctx, self_idx, "models/objects/gibs/gear/tris.md2", damage, GIB_METALLIC);
        }
        throw_head(ctx, self_idx, "models/objects/gibs/head2/tris.md2", damage, GIB_ORGANIC);
        ctx.edicts[self_idx].deadflag = DEAD_DEAD;
        return;
    }

    if ctx.edicts[self_idx].deadflag == DEAD_DEAD {
        return;
    }

    gi_sound(self_idx as i32, CHAN_VOICE, gi_soundindex(SOUND_DEATH), 1.0, ATTN_NORM, 0.0);
    let mv = if damage >= 50 {
        &MOVE_DEATH2
    } else if ctx.random() >= 0.5 {
        &MOVE_DEATH1
    } else {
        &MOVE_DEATH3
    };

    let ent = &mut ctx.edicts[self_idx];
    ent.deadflag = DEAD_DEAD;
    ent.takedamage = Damage::Yes as i32;
    ent.monsterinfo.currentmove = Some(mv);
}

// ============================================================
// Spawn function
// ============================================================

/// QUAKED monster_cyborg (1 .5 0) (-16 -16 -38) (16 16 27) Ambush Trigger_Spawn Sight Corpse
pub fn sp_monster_cyborg(ctx: &mut GameContext, self_idx: usize) {
    if ctx.deathmatch != 0.0 {
        g_free_edict(ctx, self_idx);
        return;
    }

    for name in [SOUND_PAIN, SOUND_DEATH, SOUND_SIGHT, SOUND_IDLE, SOUND_ATTACK, SOUND_STEP] {
        gi_soundindex(name);
    }

    let ent = &mut ctx.edicts[self_idx];
    ent.s.modelindex = gi_modelindex("models/monsters/cyborg/tris.md2");
    ent.mins = [-16.0, -16.0, -38.0];
    ent.maxs = [16.0, 16.0, 27.0];
    ent.movetype = MoveType::Step;
    ent.solid = Solid::Bbox;

    ent.health = 200;
    ent.gib_health = -200;
    ent.mass = 350;
    ent.monsterinfo.power_armor_type = POWER_ARMOR_SCREEN;
    ent.monsterinfo.power_armor_power = 100;
    ent.monsterinfo.scale = MODEL_SCALE;

    ent.pain_fn = Some(cyborg_pain);
    ent.die_fn = Some(cyborg_die);

    ent.monsterinfo.sight_fn = Some(cyborg_sight);
    ent.monsterinfo.idle_fn = Some(cyborg_idle);
    ent.monsterinfo.search_fn = Some(cyborg_search);
    ent.monsterinfo.stand_fn = Some(cyborg_stand);
    ent.monsterinfo.walk_fn = Some(cyborg_walk);
    ent.monsterinfo.run_fn = Some(cyborg_run);
    ent.monsterinfo.attack_fn = Some(cyborg_attack);
    ent.monsterinfo.melee_fn = Some(cyborg_melee);

    gi_linkentity(self_idx as i32);

    ctx.edicts[self_idx].monsterinfo.currentmove = Some(&MOVE_STAND);
    walkmonster_start(ctx, self_idx);
}
