// g_utils.rs: game utility functions

use tracing::warn;

use crate::dispatch::call_use;
use crate::g_local::{Edict, GameContext};
use crate::game_import::*;
use oblivion_common::q_shared::Vec3;

const MAXCHOICES: usize = 8;

/// Projects a point using forward and right vectors. Used for muzzle positions.
pub fn g_project_source(
    point: &Vec3,
    distance: &Vec3,
    forward: &Vec3,
    right: &Vec3,
) -> Vec3 {
    [
        point[0] + forward[0] * distance[0] + right[0] * distance[1],
        point[1] + forward[1] * distance[0] + right[1] * distance[1],
        point[2] + forward[2] * distance[0] + right[2] * distance[1] + distance[2],
    ]
}

/// Which string field `g_find` compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindField {
    Targetname,
    Classname,
}

/// Searches active entities from index `from` for the next one whose `field`
/// equals `match_val` (case-insensitive).
pub fn g_find(ctx: &GameContext, from: usize, field: FindField, match_val: &str) -> Option<usize> {
    ctx.edicts
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, e)| {
            e.inuse
                && match field {
                    FindField::Targetname => e.targetname.eq_ignore_ascii_case(match_val),
                    FindField::Classname => e.classname.eq_ignore_ascii_case(match_val),
                }
        })
        .map(|(i, _)| i)
}

/// Pick a random entity among those carrying `targetname`.
pub fn g_pick_target(ctx: &mut GameContext, targetname: &str) -> Option<usize> {
    if targetname.is_empty() {
        warn!("G_PickTarget called with empty targetname");
        return None;
    }

    let mut choices: Vec<usize> = Vec::with_capacity(MAXCHOICES);
    let mut search_from = 0;
    while let Some(idx) = g_find(ctx, search_from, FindField::Targetname, targetname) {
        choices.push(idx);
        if choices.len() == MAXCHOICES {
            break;
        }
        search_from = idx + 1;
    }

    if choices.is_empty() {
        warn!("G_PickTarget: target {} not found", targetname);
        return None;
    }

    let pick = ctx.rand_int() as usize % choices.len();
    Some(choices[pick])
}

/// Convert a vector to a string for printing.
pub fn vtos(v: &Vec3) -> String {
    format!("({} {} {})", v[0] as i32, v[1] as i32, v[2] as i32)
}

/// Raw edict initialization.
pub fn init_edict_raw(e: &mut Edict, index: i32) {
    e.inuse = true;
    e.classname = "noclass".to_string();
    e.gravity = 1.0;
    e.s.number = index;
}

/// Either finds a free edict, or allocates a new one. Returns None when the
/// entity table is full.
///
/// Recently freed slots are skipped so the client does not see an entity
/// morph into another one with interpolated angles and trails.
pub fn g_spawn(ctx: &mut GameContext) -> Option<usize> {
    let first = ctx.maxclients as usize + 1;
    let level_time = ctx.level.time;
    let num = ctx.num_edicts as usize;

    for i in first..num.min(ctx.edicts.len()) {
        let e = &ctx.edicts[i];
        if !e.inuse && (e.freetime < 2.0 || level_time - e.freetime > 0.5) {
            ctx.edicts[i] = Edict::default();
            init_edict_raw(&mut ctx.edicts[i], i as i32);
            return Some(i);
        }
    }

    if num >= ctx.max_edicts as usize {
        gi_error("ED_Alloc: no free edicts");
        return None;
    }

    let i = num.max(first);
    while ctx.edicts.len() <= i {
        ctx.edicts.push(Edict::default());
    }
    ctx.num_edicts = i as i32 + 1;
    ctx.edicts[i] = Edict::default();
    init_edict_raw(&mut ctx.edicts[i], i as i32);
    Some(i)
}

/// Marks the edict as free and clears it. The world and client slots are
/// never freed.
pub fn g_free_edict(ctx: &mut GameContext, ent_idx: usize) {
    gi_unlinkentity(ent_idx as i32);

    if ent_idx <= ctx.maxclients as usize || ent_idx >= ctx.edicts.len() {
        return;
    }

    let freetime = ctx.level.time;
    let e = &mut ctx.edicts[ent_idx];
    *e = Edict::default();
    e.classname = "freed".to_string();
    e.freetime = freetime;
    e.inuse = false;
}

/// Think callback form of `g_free_edict`.
pub fn g_free_edict_think(ctx: &mut GameContext, self_idx: usize) {
    g_free_edict(ctx, self_idx);
}

/// Fires all targets of an entity: frees its `killtarget`s, then calls `use`
/// on every entity whose targetname matches its `target`.
pub fn g_use_targets(ctx: &mut GameContext, ent_idx: usize, activator_idx: usize) {
    let (target, killtarget) = {
        let ent = &ctx.edicts[ent_idx];
        (ent.target.clone(), ent.killtarget.clone())
    };

    if !killtarget.is_empty() {
        let mut search_from = 0;
        while let Some(t_idx) = g_find(ctx, search_from, FindField::Targetname, &killtarget) {
            g_free_edict(ctx, t_idx);
            if !ctx.edicts[ent_idx].inuse {
                warn!("entity was removed while using killtargets");
                return;
            }
            search_from = t_idx + 1;
        }
    }

    if !target.is_empty() {
        let mut search_from = 0;
        while let Some(t_idx) = g_find(ctx, search_from, FindField::Targetname, &target) {
            if t_idx == ent_idx {
                warn!("WARNING: Entity used itself.");
            } else {
                call_use(ctx, t_idx, ent_idx, activator_idx);
            }

            if !ctx.edicts[ent_idx].inuse {
                warn!("entity was removed while using targets");
                return;
            }
            search_from = t_idx + 1;
        }
    }
}
