// dispatch.rs: callback signatures and safe invocation helpers
//
// Entity callbacks are plain fn pointers that receive the whole context plus
// entity indices. No callback holds a borrow of an edict across the call, so a
// callback is free to spawn, free or damage other entities.

use crate::g_local::{CPlane, CSurface, GameContext, Vec3};

// ============================================================
// Type aliases for callback signatures
// ============================================================

pub type ThinkFn = fn(ctx: &mut GameContext, self_idx: usize);
pub type AiFn = fn(ctx: &mut GameContext, self_idx: usize, dist: f32);
pub type PainFn = fn(ctx: &mut GameContext, self_idx: usize, other_idx: usize, kick: f32, damage: i32);
pub type DieFn = fn(
    ctx: &mut GameContext,
    self_idx: usize,
    inflictor_idx: usize,
    attacker_idx: usize,
    damage: i32,
    point: Vec3,
);
pub type TouchFn = fn(
    ctx: &mut GameContext,
    self_idx: usize,
    other_idx: usize,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
);
pub type UseFn = fn(ctx: &mut GameContext, self_idx: usize, other_idx: usize, activator_idx: usize);
pub type BlockedFn = fn(ctx: &mut GameContext, self_idx: usize, other_idx: usize);
pub type MonsterFn = fn(ctx: &mut GameContext, self_idx: usize);
pub type SightFn = fn(ctx: &mut GameContext, self_idx: usize, other_idx: usize);
pub type DodgeFn = fn(ctx: &mut GameContext, self_idx: usize, attacker_idx: usize, eta: f32);

// ============================================================
// Entity callbacks
// ============================================================

/// Call the think_fn on an edict if set.
pub fn call_think(ctx: &mut GameContext, self_idx: usize) {
    if let Some(f) = ctx.edicts.get(self_idx).and_then(|e| e.think_fn) {
        f(ctx, self_idx);
    }
}

/// Call the pain_fn on an edict if set.
pub fn call_pain(ctx: &mut GameContext, self_idx: usize, other_idx: usize, kick: f32, damage: i32) {
    if let Some(f) = ctx.edicts.get(self_idx).and_then(|e| e.pain_fn) {
        f(ctx, self_idx, other_idx, kick, damage);
    }
}

/// Call the die_fn on an edict if set.
pub fn call_die(
    ctx: &mut GameContext,
    self_idx: usize,
    inflictor_idx: usize,
    attacker_idx: usize,
    damage: i32,
    point: Vec3,
) {
    if let Some(f) = ctx.edicts.get(self_idx).and_then(|e| e.die_fn) {
        f(ctx, self_idx, inflictor_idx, attacker_idx, damage, point);
    }
}

/// Call the touch_fn on an edict if set.
pub fn call_touch(
    ctx: &mut GameContext,
    self_idx: usize,
    other_idx: usize,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    if let Some(f) = ctx.edicts.get(self_idx).and_then(|e| e.touch_fn) {
        f(ctx, self_idx, other_idx, plane, surf);
    }
}

/// Call the use_fn on an edict if set.
pub fn call_use(ctx: &mut GameContext, self_idx: usize, other_idx: usize, activator_idx: usize) {
    if let Some(f) = ctx.edicts.get(self_idx).and_then(|e| e.use_fn) {
        f(ctx, self_idx, other_idx, activator_idx);
    }
}

/// Call the blocked_fn on an edict if set.
pub fn call_blocked(ctx: &mut GameContext, self_idx: usize, other_idx: usize) {
    if let Some(f) = ctx.edicts.get(self_idx).and_then(|e| e.blocked_fn) {
        f(ctx, self_idx, other_idx);
    }
}

/// Call the mover's end function, if one is pending.
pub fn call_move_endfunc(ctx: &mut GameContext, self_idx: usize) {
    if let Some(f) = ctx.edicts.get(self_idx).and_then(|e| e.moveinfo.endfunc) {
        f(ctx, self_idx);
    }
}

// ============================================================
// Monster callbacks
// ============================================================

macro_rules! monster_call {
    ($name:ident, $field:ident) => {
        /// Returns false when the monster has no such callback.
        pub fn $name(ctx: &mut GameContext, self_idx: usize) -> bool {
            match ctx.edicts.get(self_idx).and_then(|e| e.monsterinfo.$field) {
                Some(f) => {
                    f(ctx, self_idx);
                    true
                }
                None => false,
            }
        }
    };
}

monster_call!(call_stand, stand_fn);
monster_call!(call_idle, idle_fn);
monster_call!(call_search, search_fn);
monster_call!(call_walk, walk_fn);
monster_call!(call_run, run_fn);
monster_call!(call_attack, attack_fn);
monster_call!(call_melee, melee_fn);

pub fn call_sight(ctx: &mut GameContext, self_idx: usize, other_idx: usize) {
    if let Some(f) = ctx.edicts.get(self_idx).and_then(|e| e.monsterinfo.sight_fn) {
        f(ctx, self_idx, other_idx);
    }
}

pub fn call_dodge(ctx: &mut GameContext, self_idx: usize, attacker_idx: usize, eta: f32) {
    if let Some(f) = ctx.edicts.get(self_idx).and_then(|e| e.monsterinfo.dodge_fn) {
        f(ctx, self_idx, attacker_idx, eta);
    }
}
