// g_main.rs -- Game entry points: init, the per-frame think loop, host callbacks

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{info, warn};

use crate::dispatch::{call_blocked, call_think, call_touch, call_use};
use crate::g_ai::ai_set_sight_client;
use crate::g_local::*;
use crate::g_log::{init_logging, LogError, DEFAULT_LOG_FILTER};
use crate::g_spawn::{spawn_entities, SpawnError, SpawnSummary};
use crate::game_import::*;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("no free edicts")]
    NoFreeEdicts,
    #[error("game module not initialised")]
    NotInitialised,
    #[error(transparent)]
    Log(#[from] LogError),
    #[error(transparent)]
    Spawn(SpawnError),
}

impl From<SpawnError> for GameError {
    fn from(e: SpawnError) -> Self {
        match e {
            SpawnError::NoFreeEdicts => GameError::NoFreeEdicts,
            other => GameError::Spawn(other),
        }
    }
}

/// The live game, owned by the module between host calls.
static GAME: Mutex<Option<GameContext>> = parking_lot::const_mutex(None);

// ============================================================
// InitGame / ShutdownGame
// ============================================================

/// Build a context sized and configured from the host cvars.
pub fn build_context() -> GameContext {
    let maxclients = gi_cvar("maxclients", "1", 0).max(1.0);
    let maxentities = gi_cvar("maxentities", "1024", 0).max(maxclients + 2.0);

    let mut ctx = GameCtx::with_capacity(maxentities as usize, maxclients as usize);
    ctx.skill = gi_cvar("skill", "1", 0);
    ctx.deathmatch = gi_cvar("deathmatch", "0", 0);
    ctx.coop = gi_cvar("coop", "0", 0);
    ctx
}

/// Called once when the host loads the module.
pub fn init_game() -> Result<(), GameError> {
    gi_dprintf("==== InitGame ====\n");

    let filter = gi_cvar_string("g_log", DEFAULT_LOG_FILTER);
    match init_logging(&filter) {
        Ok(()) => {}
        Err(LogError::AlreadyInstalled(e)) => warn!("logging already installed: {}", e),
        Err(e) => return Err(e.into()),
    }

    let mut ctx = build_context();
    ctx.reseed(rand::random());
    info!(
        maxclients = ctx.maxclients,
        maxentities = ctx.maxentities,
        skill = ctx.skill,
        "game initialised"
    );
    *GAME.lock() = Some(ctx);
    Ok(())
}

/// Replace the live game with `ctx`.
pub fn install_game(ctx: GameContext) {
    *GAME.lock() = Some(ctx);
}

pub fn shutdown_game() {
    gi_dprintf("==== ShutdownGame ====\n");
    *GAME.lock() = None;
}

/// Borrow the live game for the duration of `f`.
pub fn with_game<R>(f: impl FnOnce(&mut GameContext) -> R) -> Result<R, GameError> {
    let mut guard = GAME.lock();
    let ctx = guard.as_mut().ok_or(GameError::NotInitialised)?;
    Ok(f(ctx))
}

/// SpawnEntities entry point: load `entities` as map `mapname`.
pub fn spawn_level(mapname: &str, entities: &str) -> Result<SpawnSummary, GameError> {
    with_game(|ctx| {
        ctx.level.mapname = mapname.to_string();
        spawn_entities(ctx, entities)
    })?
    .map_err(GameError::from)
}

// ============================================================
// G_RunFrame
// ============================================================

/// Run an entity's think if it is due. Returns false if it was not run.
pub fn run_think(ctx: &mut GameContext, ent_idx: usize) -> bool {
    let thinktime = ctx.edicts[ent_idx].nextthink;
    if thinktime <= 0.0 || thinktime > ctx.level.time + 0.001 {
        return false;
    }

    ctx.edicts[ent_idx].nextthink = 0.0;
    if ctx.edicts[ent_idx].think_fn.is_none() {
        warn!("{} ({}) has nextthink but no think", ctx.edicts[ent_idx].classname, ent_idx);
        return false;
    }
    call_think(ctx, ent_idx);
    true
}

/// Advance the world one server frame.
pub fn run_frame(ctx: &mut GameContext) {
    ctx.level.framenum += 1;
    ctx.level.time = ctx.level.framenum as f32 * FRAMETIME;

    // choose a client for monsters to target this frame
    ai_set_sight_client(ctx);

    // even the world gets a chance to think
    let mut i = 0;
    while i < (ctx.num_edicts as usize).min(ctx.edicts.len()) {
        if ctx.edicts[i].inuse {
            ctx.level.current_entity = i as i32;
            ctx.edicts[i].s.old_origin = ctx.edicts[i].s.origin;
            run_think(ctx, i);
        }
        i += 1;
    }
    ctx.level.current_entity = -1;
}

// ============================================================
// Physics results reported by the host
// ============================================================

/// Two entities collided: both get their touch, the second without a plane.
pub fn touch_entities(
    ctx: &mut GameContext,
    e1: usize,
    e2: usize,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    if ctx.edicts[e1].solid != Solid::Not {
        call_touch(ctx, e1, e2, plane, surf);
    }
    if ctx.edicts[e2].inuse && ctx.edicts[e2].solid != Solid::Not {
        call_touch(ctx, e2, e1, None, None);
    }
}

/// A pusher was stopped by `obstacle`.
pub fn blocked_entity(ctx: &mut GameContext, pusher: usize, obstacle: usize) {
    call_blocked(ctx, pusher, obstacle);
}

pub fn use_entity(ctx: &mut GameContext, ent: usize, other: usize, activator: usize) {
    call_use(ctx, ent, other, activator);
}
