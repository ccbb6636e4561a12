// g_spawn.rs -- Entity spawning: map entity string parsing and the classname registry

use std::collections::HashMap;
use std::sync::OnceLock;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::g_deatomizer::{sp_misc_deatomizer_control, sp_misc_deatomizer_target};
use crate::g_local::*;
use crate::g_misc::{sp_info_notnull, sp_info_null, sp_path_corner};
use crate::g_rtrain::sp_func_rotate_train;
use crate::g_utils::{g_free_edict, g_spawn};
use crate::g_weapon::{sp_detpack, sp_mine};
use crate::game_import::*;
use crate::m_cyborg::sp_monster_cyborg;
use crate::m_kigrax::sp_monster_kigrax;
use crate::m_spider::sp_monster_spider;

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("unexpected end of entity data")]
    UnexpectedEof,
    #[error("found {0} when expecting {{")]
    ExpectedOpenBrace(String),
    #[error("entity block is missing its closing brace")]
    UnterminatedEntity,
    #[error("{0} doesn't have a spawn function")]
    UnknownClassname(String),
    #[error("entity has no classname")]
    MissingClassname,
    #[error("no free edicts")]
    NoFreeEdicts,
    #[error("spawn manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

// ============================================================
// Spawn function registry
// ============================================================

pub type SpawnFn = fn(ctx: &mut GameContext, ent_idx: usize);

/// Maps a classname to the function that sets the entity up.
pub struct SpawnEntry {
    pub name: &'static str,
    pub spawn: SpawnFn,
    /// Spawn function name, reported by the manifest.
    pub function: &'static str,
}

macro_rules! spawn_entry {
    ($name:literal, $func:ident) => {
        SpawnEntry { name: $name, spawn: $func, function: stringify!($func) }
    };
}

pub static SPAWNS: &[SpawnEntry] = &[
    spawn_entry!("worldspawn", sp_worldspawn),
    spawn_entry!("func_rotate_train", sp_func_rotate_train),
    spawn_entry!("path_corner", sp_path_corner),
    spawn_entry!("info_null", sp_info_null),
    spawn_entry!("info_notnull", sp_info_notnull),
    spawn_entry!("misc_deatomizer_control", sp_misc_deatomizer_control),
    spawn_entry!("misc_deatomizer_target", sp_misc_deatomizer_target),
    spawn_entry!("monster_cyborg", sp_monster_cyborg),
    spawn_entry!("monster_spider", sp_monster_spider),
    spawn_entry!("monster_kigrax", sp_monster_kigrax),
    spawn_entry!("detpack", sp_detpack),
    spawn_entry!("mine", sp_mine),
];

static SPAWNS_INDEX: OnceLock<HashMap<&'static str, usize>> = OnceLock::new();

fn spawns_index() -> &'static HashMap<&'static str, usize> {
    SPAWNS_INDEX.get_or_init(|| SPAWNS.iter().enumerate().map(|(i, s)| (s.name, i)).collect())
}

/// Look up the spawn function registered for `classname`.
pub fn find_spawn(classname: &str) -> Option<&'static SpawnEntry> {
    spawns_index().get(classname).map(|&i| &SPAWNS[i])
}

// ============================================================
// Field table
// ============================================================

/// Destination of a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Classname,
    Model,
    Target,
    Targetname,
    Pathtarget,
    Killtarget,
    Spawnflags,
    Health,
    Dmg,
    RadiusDmg,
    Speed,
    Wait,
    DmgRadius,
    Duration,
    Origin,
    Angles,
    /// A lone yaw, stored as `[0, yaw, 0]`.
    Angle,
    Rotate,
    RotateSpeed,
    /// Spawn temp only.
    Noise,
}

pub struct FieldDef {
    pub name: &'static str,
    pub field: Field,
}

pub static FIELDS: &[FieldDef] = &[
    FieldDef { name: "classname",    field: Field::Classname },
    FieldDef { name: "model",        field: Field::Model },
    FieldDef { name: "target",       field: Field::Target },
    FieldDef { name: "targetname",   field: Field::Targetname },
    FieldDef { name: "pathtarget",   field: Field::Pathtarget },
    FieldDef { name: "killtarget",   field: Field::Killtarget },
    FieldDef { name: "spawnflags",   field: Field::Spawnflags },
    FieldDef { name: "health",       field: Field::Health },
    FieldDef { name: "dmg",          field: Field::Dmg },
    FieldDef { name: "radius_dmg",   field: Field::RadiusDmg },
    FieldDef { name: "speed",        field: Field::Speed },
    FieldDef { name: "wait",         field: Field::Wait },
    FieldDef { name: "dmg_radius",   field: Field::DmgRadius },
    FieldDef { name: "duration",     field: Field::Duration },
    FieldDef { name: "origin",       field: Field::Origin },
    FieldDef { name: "angles",       field: Field::Angles },
    FieldDef { name: "angle",        field: Field::Angle },
    FieldDef { name: "rotate",       field: Field::Rotate },
    FieldDef { name: "rotate_speed", field: Field::RotateSpeed },
    FieldDef { name: "noise",        field: Field::Noise },
];

static FIELDS_INDEX: OnceLock<HashMap<&'static str, Field>> = OnceLock::new();

fn fields_index() -> &'static HashMap<&'static str, Field> {
    FIELDS_INDEX.get_or_init(|| FIELDS.iter().map(|f| (f.name, f.field)).collect())
}

/// Copy a map string, turning `\n` escapes into newlines.
pub fn ed_new_string(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek().is_some() {
            match chars.next() {
                Some('n') => result.push('\n'),
                _ => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// `atoi` style: leading number wins, junk reads as zero.
fn parse_int(s: &str) -> i32 {
    let s = s.trim();
    s.parse::<i32>()
        .or_else(|_| s.parse::<f32>().map(|f| f as i32))
        .unwrap_or(0)
}

fn parse_float(s: &str) -> f32 {
    s.trim().parse().unwrap_or(0.0)
}

fn parse_vec3(s: &str) -> Vec3 {
    let mut v = [0.0f32; 3];
    for (slot, part) in v.iter_mut().zip(s.split_whitespace()) {
        *slot = parse_float(part);
    }
    v
}

/// Store one key/value pair on the edict (or the spawn temp).
pub fn ed_parse_field(ctx: &mut GameContext, key: &str, value: &str, ent_idx: usize) {
    let Some(&field) = fields_index().get(key.to_ascii_lowercase().as_str()) else {
        debug!("{} is not a field", key);
        return;
    };

    if field == Field::Noise {
        ctx.st.noise = ed_new_string(value);
        return;
    }

    let ent = &mut ctx.edicts[ent_idx];
    match field {
        Field::Classname => ent.classname = ed_new_string(value),
        Field::Model => ent.model = ed_new_string(value),
        Field::Target => ent.target = ed_new_string(value),
        Field::Targetname => ent.targetname = ed_new_string(value),
        Field::Pathtarget => ent.pathtarget = ed_new_string(value),
        Field::Killtarget => ent.killtarget = ed_new_string(value),
        Field::Spawnflags => ent.spawnflags = parse_int(value),
        Field::Health => ent.health = parse_int(value),
        Field::Dmg => ent.dmg = parse_int(value),
        Field::RadiusDmg => ent.radius_dmg = parse_int(value),
        Field::Speed => ent.speed = parse_float(value),
        Field::Wait => ent.wait = parse_float(value),
        Field::DmgRadius => ent.dmg_radius = parse_float(value),
        Field::Duration => ent.duration = parse_float(value),
        Field::Origin => ent.s.origin = parse_vec3(value),
        Field::Angles => ent.s.angles = parse_vec3(value),
        Field::Angle => ent.s.angles = [0.0, parse_float(value), 0.0],
        Field::Rotate => ent.rotate = parse_vec3(value),
        Field::RotateSpeed => ent.rotate_speed = parse_vec3(value),
        Field::Noise => {}
    }
}

// ============================================================
// Entity blocks
// ============================================================

/// Parse the key/value pairs of one entity block into `ent_idx`. `data`
/// starts just after the opening brace; the text after the closing brace
/// is returned.
pub fn parse_edict<'a>(ctx: &mut GameContext, data: &'a str, ent_idx: usize) -> Result<&'a str, SpawnError> {
    ctx.st = SpawnTemp::default();
    let mut remaining = data;

    loop {
        let (key, rest) = com_parse(remaining);
        if key == "}" {
            return Ok(rest.unwrap_or(""));
        }
        let Some(rest) = rest else {
            return Err(SpawnError::UnterminatedEntity);
        };

        let (value, rest) = com_parse(rest);
        if value == "}" {
            return Err(SpawnError::UnterminatedEntity);
        }
        let Some(rest) = rest else {
            return Err(SpawnError::UnterminatedEntity);
        };

        // leading underscore keys are editor comments
        if !key.starts_with('_') {
            ed_parse_field(ctx, &key, &value, ent_idx);
        }
        remaining = rest;
    }
}

/// Run the registered spawn function for the entity's classname.
pub fn ed_call_spawn(ctx: &mut GameContext, ent_idx: usize) -> Result<(), SpawnError> {
    let classname = ctx.edicts[ent_idx].classname.clone();
    if classname.is_empty() {
        return Err(SpawnError::MissingClassname);
    }

    let entry = find_spawn(&classname).ok_or(SpawnError::UnknownClassname(classname))?;
    trace!(ent = ent_idx, classname = entry.name, "spawn");
    (entry.spawn)(ctx, ent_idx);
    Ok(())
}

/// True when the entity's spawnflags keep it out of this skill level or
/// deathmatch.
fn inhibited(ctx: &GameContext, spawnflags: i32) -> bool {
    if ctx.deathmatch != 0.0 {
        return spawnflags & SPAWNFLAG_NOT_DEATHMATCH != 0;
    }
    (ctx.skill == 0.0 && spawnflags & SPAWNFLAG_NOT_EASY != 0)
        || (ctx.skill == 1.0 && spawnflags & SPAWNFLAG_NOT_MEDIUM != 0)
        || (ctx.skill >= 2.0 && spawnflags & SPAWNFLAG_NOT_HARD != 0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnSummary {
    pub spawned: usize,
    pub inhibited: usize,
    /// Entities dropped for an unknown or missing classname.
    pub rejected: usize,
}

/// Build the level from a map's entity string. The first block is the world.
pub fn spawn_entities(ctx: &mut GameContext, entities: &str) -> Result<SpawnSummary, SpawnError> {
    ctx.skill = ctx.skill.floor().clamp(0.0, 3.0);

    let mapname = std::mem::take(&mut ctx.level.mapname);
    ctx.level = LevelLocals { mapname, ..LevelLocals::default() };

    let maxclients = ctx.maxclients as usize;
    ctx.edicts.par_iter_mut().enumerate().for_each(|(i, e)| {
        *e = Edict::default();
        e.s.number = i as i32;
        if (1..=maxclients).contains(&i) {
            e.client = Some(i - 1);
        }
    });
    ctx.num_edicts = (maxclients + 1).min(ctx.edicts.len()) as i32;

    let mut summary = SpawnSummary::default();
    let mut first_ent = true;
    let mut remaining = entities;

    loop {
        let (token, rest) = com_parse(remaining);
        if token.is_empty() && rest.is_none() {
            break;
        }
        if token != "{" {
            return Err(SpawnError::ExpectedOpenBrace(token));
        }
        let rest = rest.ok_or(SpawnError::UnexpectedEof)?;

        let ent_idx = if first_ent {
            first_ent = false;
            ctx.edicts[0].inuse = true;
            0
        } else {
            g_spawn(ctx).ok_or(SpawnError::NoFreeEdicts)?
        };

        remaining = parse_edict(ctx, rest, ent_idx)?;

        // remove things (except the world) from different skill levels or deathmatch
        if ent_idx != 0 {
            if inhibited(ctx, ctx.edicts[ent_idx].spawnflags) {
                g_free_edict(ctx, ent_idx);
                summary.inhibited += 1;
                continue;
            }
            ctx.edicts[ent_idx].spawnflags &= !(SPAWNFLAG_NOT_EASY
                | SPAWNFLAG_NOT_MEDIUM
                | SPAWNFLAG_NOT_HARD
                | SPAWNFLAG_NOT_COOP
                | SPAWNFLAG_NOT_DEATHMATCH);
        }

        match ed_call_spawn(ctx, ent_idx) {
            Ok(()) => summary.spawned += 1,
            Err(e) => {
                warn!("{}", e);
                if ent_idx != 0 {
                    g_free_edict(ctx, ent_idx);
                }
                summary.rejected += 1;
            }
        }
    }

    if first_ent {
        return Err(SpawnError::UnexpectedEof);
    }

    gi_dprintf(&format!("{} entities inhibited\n", summary.inhibited));
    debug!(?summary, map = %ctx.level.mapname, "level spawned");
    Ok(summary)
}

/// Only used for the world entity.
pub fn sp_worldspawn(ctx: &mut GameContext, ent_idx: usize) {
    let ent = &mut ctx.edicts[ent_idx];
    ent.movetype = MoveType::Push;
    ent.solid = Solid::Bsp;
    ent.inuse = true;
    ent.s.modelindex = 1; // world model is always index 1

    // shared effects every map can trigger
    gi_soundindex("misc/udeath.wav");
    gi_modelindex("models/objects/gibs/sm_meat/tris.md2");
    gi_modelindex("models/objects/gibs/bone/tris.md2");
    gi_modelindex("models/objects/gibs/gear/tris.md2");
}

// ============================================================
// Spawn manifest
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub classname: &'static str,
    pub spawn_fn: &'static str,
}

/// Every registered classname with the function that spawns it.
pub fn spawn_manifest() -> Vec<ManifestEntry> {
    SPAWNS
        .iter()
        .map(|s| ManifestEntry { classname: s.name, spawn_fn: s.function })
        .collect()
}

pub fn spawn_manifest_json() -> Result<String, SpawnError> {
    Ok(serde_json::to_string_pretty(&spawn_manifest())?)
}
