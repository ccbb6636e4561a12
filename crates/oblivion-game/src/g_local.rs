// g_local.rs: local definitions for the Oblivion game module

// Re-export all q_shared items so monster files can access them via `use crate::g_local::*`
pub use oblivion_common::q_shared::*;
pub use crate::game::{Solid, SVF_DEADMONSTER, SVF_MONSTER, SVF_NOCLIENT, SVF_PROJECTILE};

use crate::dispatch::{
    AiFn, BlockedFn, DieFn, DodgeFn, MonsterFn, PainFn, SightFn, ThinkFn, TouchFn, UseFn,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const GAMEVERSION: &str = "oblivion";

// edict->spawnflags
pub const SPAWNFLAG_NOT_EASY: i32 = 0x00000100;
pub const SPAWNFLAG_NOT_MEDIUM: i32 = 0x00000200;
pub const SPAWNFLAG_NOT_HARD: i32 = 0x00000400;
pub const SPAWNFLAG_NOT_DEATHMATCH: i32 = 0x00000800;
pub const SPAWNFLAG_NOT_COOP: i32 = 0x00001000;

// edict->flags
bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct EntityFlags: i32 {
        const FLY            = 0x00000001;
        const SWIM           = 0x00000002;
        const IMMUNE_LASER   = 0x00000004;
        const INWATER        = 0x00000008;
        const GODMODE        = 0x00000010;
        const NOTARGET       = 0x00000020;
        const PARTIALGROUND  = 0x00000100;
        const TEAMSLAVE      = 0x00000400;
        const NO_KNOCKBACK   = 0x00000800;
        const POWER_ARMOR    = 0x00001000;
        const DODGE          = 0x00004000;
    }
}
pub const FL_FLY: EntityFlags = EntityFlags::FLY;
pub const FL_SWIM: EntityFlags = EntityFlags::SWIM;
pub const FL_GODMODE: EntityFlags = EntityFlags::GODMODE;
pub const FL_NOTARGET: EntityFlags = EntityFlags::NOTARGET;
pub const FL_PARTIALGROUND: EntityFlags = EntityFlags::PARTIALGROUND;
pub const FL_TEAMSLAVE: EntityFlags = EntityFlags::TEAMSLAVE;
pub const FL_NO_KNOCKBACK: EntityFlags = EntityFlags::NO_KNOCKBACK;
pub const FL_POWER_ARMOR: EntityFlags = EntityFlags::POWER_ARMOR;
/// Projectile that monsters may try to sidestep.
pub const FL_DODGE: EntityFlags = EntityFlags::DODGE;

pub const FRAMETIME: f32 = 0.1;

pub const MELEE_DISTANCE: f32 = 80.0;

/// Effect used for the dual muzzle glow on deatom bolts.
pub const EF_DUALFIRE: u32 = EF_ANIM_ALLFAST;

// ============================================================
// Enums
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum Damage {
    #[default]
    No = 0,
    Yes,
    Aim,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum MoveType {
    #[default]
    None = 0,
    Noclip,
    Push,
    Stop,
    Walk,
    Step,
    Fly,
    Toss,
    FlyMissile,
    Bounce,
}

// Dead flags
pub const DEAD_NO: i32 = 0;
pub const DEAD_DYING: i32 = 1;
pub const DEAD_DEAD: i32 = 2;

// Range
pub const RANGE_MELEE: i32 = 0;
pub const RANGE_NEAR: i32 = 1;
pub const RANGE_MID: i32 = 2;
pub const RANGE_FAR: i32 = 3;

// Monster attack state
pub const AS_STRAIGHT: i32 = 1;
pub const AS_SLIDING: i32 = 2;
pub const AS_MELEE: i32 = 3;
pub const AS_MISSILE: i32 = 4;

// Gib types
pub const GIB_ORGANIC: i32 = 0;
pub const GIB_METALLIC: i32 = 1;

// Monster AI flags
bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct AiFlags: i32 {
        const STAND_GROUND      = 0x00000001;
        const TEMP_STAND_GROUND = 0x00000002;
        const SOUND_TARGET      = 0x00000004;
        const LOST_SIGHT        = 0x00000008;
        const HOLD_FRAME        = 0x00000080;
        const GOOD_GUY          = 0x00000100;
        const NOSTEP            = 0x00000400;
        const DUCKED            = 0x00000800;
        const MANUAL_STEERING   = 0x00008000;
    }
}
pub const AI_STAND_GROUND: AiFlags = AiFlags::STAND_GROUND;
pub const AI_TEMP_STAND_GROUND: AiFlags = AiFlags::TEMP_STAND_GROUND;
pub const AI_SOUND_TARGET: AiFlags = AiFlags::SOUND_TARGET;
pub const AI_LOST_SIGHT: AiFlags = AiFlags::LOST_SIGHT;
pub const AI_HOLD_FRAME: AiFlags = AiFlags::HOLD_FRAME;
pub const AI_GOOD_GUY: AiFlags = AiFlags::GOOD_GUY;
pub const AI_NOSTEP: AiFlags = AiFlags::NOSTEP;
pub const AI_DUCKED: AiFlags = AiFlags::DUCKED;
pub const AI_MANUAL_STEERING: AiFlags = AiFlags::MANUAL_STEERING;

// Power armor types
pub const POWER_ARMOR_NONE: i32 = 0;
pub const POWER_ARMOR_SCREEN: i32 = 1;
pub const POWER_ARMOR_SHIELD: i32 = 2;

// Damage flags
bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct DamageFlags: i32 {
        const RADIUS        = 0x00000001;
        const NO_ARMOR      = 0x00000002;
        const ENERGY        = 0x00000004;
        const NO_KNOCKBACK  = 0x00000008;
        const BULLET        = 0x00000010;
        const NO_PROTECTION = 0x00000020;
    }
}
pub const DAMAGE_RADIUS: DamageFlags = DamageFlags::RADIUS;
pub const DAMAGE_NO_ARMOR: DamageFlags = DamageFlags::NO_ARMOR;
pub const DAMAGE_ENERGY: DamageFlags = DamageFlags::ENERGY;
pub const DAMAGE_NO_KNOCKBACK: DamageFlags = DamageFlags::NO_KNOCKBACK;
pub const DAMAGE_BULLET: DamageFlags = DamageFlags::BULLET;
pub const DAMAGE_NO_PROTECTION: DamageFlags = DamageFlags::NO_PROTECTION;

// Means of death
pub const MOD_UNKNOWN: i32 = 0;
pub const MOD_BLASTER: i32 = 1;
pub const MOD_CRUSH: i32 = 20;
pub const MOD_EXPLOSIVE: i32 = 25;
pub const MOD_HIT: i32 = 32;
/// Kill that makes the victim burst instead of playing a death animation.
pub const MOD_INSTANT_EXPLODE: i32 = 0x23;

// Oblivion weapons
pub const MOD_DISINTEGRATOR: i32 = 40;
pub const MOD_DEATOMIZER: i32 = 41;
pub const MOD_DEATOMIZER_SPLASH: i32 = 42;
pub const MOD_PLASMA_PISTOL: i32 = 43;
pub const MOD_PLASMA_RIFLE: i32 = 44;
pub const MOD_DONUT: i32 = 45;
pub const MOD_HELLFURY: i32 = 46;
pub const MOD_LASERCANNON: i32 = 47;
pub const MOD_DETPACK: i32 = 48;
pub const MOD_MINE: i32 = 49;
pub const MOD_MINE_SPLASH: i32 = 50;

// Temp entity events
pub const TE_GUNSHOT: i32 = 0;
pub const TE_BLOOD: i32 = 1;
pub const TE_BLASTER: i32 = 2;
pub const TE_EXPLOSION1: i32 = 5;
pub const TE_EXPLOSION2: i32 = 6;
pub const TE_SPARKS: i32 = 9;
pub const TE_SCREEN_SPARKS: i32 = 12;
pub const TE_SHIELD_SPARKS: i32 = 13;
pub const TE_BFG_LASER: i32 = 23;
pub const TE_BLUEHYPERBLASTER: i32 = 27;
pub const TE_PLASMA_EXPLOSION: i32 = 28;
/// Disintegration burst the Oblivion client draws where a deatom kill happened.
pub const TE_TELEPORT_EFFECT: i32 = 30;

// ============================================================
// Monster frame/move types
// ============================================================

/// A single animation frame for a monster.
#[derive(Clone, Copy)]
pub struct MFrame {
    pub ai_fn: AiFn,
    pub dist: f32,
    pub think_fn: Option<ThinkFn>,
}

/// A monster move sequence (a set of animation frames).
pub struct MMove {
    pub firstframe: i32,
    pub lastframe: i32,
    pub frames: &'static [MFrame],
    pub endfunc: Option<ThinkFn>,
}

impl MMove {
    pub fn frame_count(&self) -> usize {
        (self.lastframe - self.firstframe + 1) as usize
    }
}

impl std::fmt::Debug for MMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MMove")
            .field("firstframe", &self.firstframe)
            .field("lastframe", &self.lastframe)
            .finish_non_exhaustive()
    }
}

/// True when `current` is exactly the move table `mv`.
pub fn is_move(current: Option<&'static MMove>, mv: &'static MMove) -> bool {
    current.is_some_and(|c| std::ptr::eq(c, mv))
}

// ============================================================
// Structures
// ============================================================

/// Level state (cleared on each map change).
#[derive(Debug, Clone)]
pub struct LevelLocals {
    pub framenum: i32,
    pub time: f32,
    pub mapname: String,
    pub sight_client: i32,   // entity index
    pub total_monsters: i32,
    pub killed_monsters: i32,
    pub current_entity: i32, // entity index
}

impl Default for LevelLocals {
    fn default() -> Self {
        Self {
            framenum: 0,
            time: 0.0,
            mapname: String::new(),
            sight_client: -1,
            total_monsters: 0,
            killed_monsters: 0,
            current_entity: -1,
        }
    }
}

/// Spawn temporary data (only used during entity parsing).
#[derive(Debug, Clone, Default)]
pub struct SpawnTemp {
    pub noise: String,
}

/// Movement info for movers.
#[derive(Debug, Clone, Default)]
pub struct MoveInfo {
    pub start_origin: Vec3,
    pub start_angles: Vec3,
    pub end_origin: Vec3,
    pub end_angles: Vec3,
    pub sound_start: i32,
    pub sound_middle: i32,
    pub sound_end: i32,
    pub accel: f32,
    pub speed: f32,
    pub decel: f32,
    pub distance: f32,
    pub wait: f32,
    pub state: i32,
    pub dir: Vec3,
    pub remaining_distance: f32,
    pub endfunc: Option<ThinkFn>,
}

/// Monster AI info.
#[derive(Debug, Clone, Default)]
pub struct MonsterInfo {
    pub currentmove: Option<&'static MMove>,
    pub aiflags: AiFlags,
    pub nextframe: i32,
    pub attack_state: i32,
    pub scale: f32,
    pub pausetime: f32,
    pub attack_finished: f32,
    pub melee_debounce_time: f32,
    pub last_sighting: Vec3,
    pub lefty: i32,
    pub idle_time: f32,
    pub power_armor_type: i32,
    pub power_armor_power: i32,

    // Wounded stand-ground anchor (cyborg)
    pub anchor_stage: i32,
    pub anchor_time: f32,
    pub landing_thud: bool,

    pub stand_fn: Option<MonsterFn>,
    pub idle_fn: Option<MonsterFn>,
    pub search_fn: Option<MonsterFn>,
    pub walk_fn: Option<MonsterFn>,
    pub run_fn: Option<MonsterFn>,
    pub dodge_fn: Option<DodgeFn>,
    pub attack_fn: Option<MonsterFn>,
    pub melee_fn: Option<MonsterFn>,
    pub sight_fn: Option<SightFn>,
}

/// Travel state of a `misc_deatomizer_control`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeatomizerState {
    pub active: bool,
    pub state: i32,
    /// Time accumulated in the current leg.
    pub accumulator: f32,
    /// Distance left to the target.
    pub distance: f32,
    pub direction: Vec3,
    pub target: i32, // entity index, -1 = none
}

/// Full edict structure.
#[derive(Debug, Clone)]
pub struct Edict {
    // Server-visible fields
    pub s: EntityState,
    pub client: Option<usize>, // client slot, None if not a player
    pub inuse: bool,
    pub linkcount: i32,
    pub svflags: i32,
    pub mins: Vec3,
    pub maxs: Vec3,
    pub absmin: Vec3,
    pub absmax: Vec3,
    pub solid: Solid,
    pub clipmask: i32,
    pub owner: i32, // entity index, -1 = none

    // Game-private fields
    pub movetype: MoveType,
    pub flags: EntityFlags,
    pub model: String,
    pub freetime: f32,
    pub classname: String,
    pub spawnflags: i32,
    pub timestamp: f32,
    pub angle: f32,
    pub target: String,
    pub targetname: String,
    pub killtarget: String,
    pub pathtarget: String,
    pub target_ent: i32, // entity index

    pub speed: f32,
    pub accel: f32,
    pub decel: f32,
    pub duration: f32,
    pub rotate: Vec3,
    pub rotate_speed: Vec3,

    pub velocity: Vec3,
    pub avelocity: Vec3,
    pub mass: i32,
    pub gravity: f32,

    pub goalentity: i32, // entity index
    pub movetarget: i32, // entity index
    pub yaw_speed: f32,
    pub ideal_yaw: f32,

    pub nextthink: f32,
    pub think_fn: Option<ThinkFn>,
    pub blocked_fn: Option<BlockedFn>,
    pub touch_fn: Option<TouchFn>,
    pub use_fn: Option<UseFn>,
    pub pain_fn: Option<PainFn>,
    pub die_fn: Option<DieFn>,

    pub touch_debounce_time: f32,
    pub pain_debounce_time: f32,
    pub damage_debounce_time: f32,

    pub health: i32,
    pub max_health: i32,
    pub gib_health: i32,
    pub deadflag: i32,

    pub viewheight: i32,
    pub takedamage: i32,
    pub dmg: i32,
    pub radius_dmg: i32,
    pub dmg_radius: f32,

    pub enemy: i32,        // entity index
    pub oldenemy: i32,     // entity index
    pub activator: i32,    // entity index
    pub groundentity: i32, // entity index
    pub teammaster: i32,   // entity index

    pub noise_index: i32,
    pub noise_index2: i32,

    pub wait: f32,
    pub teleport_time: f32,

    pub moveinfo: MoveInfo,
    pub monsterinfo: MonsterInfo,
    pub deatom: DeatomizerState,
}

impl Default for Edict {
    fn default() -> Self {
        Self {
            s: EntityState::default(),
            client: None,
            inuse: false,
            linkcount: 0,
            svflags: 0,
            mins: [0.0; 3],
            maxs: [0.0; 3],
            absmin: [0.0; 3],
            absmax: [0.0; 3],
            solid: Solid::Not,
            clipmask: 0,
            owner: -1,
            movetype: MoveType::None,
            flags: EntityFlags::empty(),
            model: String::new(),
            freetime: 0.0,
            classname: String::new(),
            spawnflags: 0,
            timestamp: 0.0,
            angle: 0.0,
            target: String::new(),
            targetname: String::new(),
            killtarget: String::new(),
            pathtarget: String::new(),
            target_ent: -1,
            speed: 0.0,
            accel: 0.0,
            decel: 0.0,
            duration: 0.0,
            rotate: [0.0; 3],
            rotate_speed: [0.0; 3],
            velocity: [0.0; 3],
            avelocity: [0.0; 3],
            mass: 0,
            gravity: 1.0,
            goalentity: -1,
            movetarget: -1,
            yaw_speed: 0.0,
            ideal_yaw: 0.0,
            nextthink: 0.0,
            think_fn: None,
            blocked_fn: None,
            touch_fn: None,
            use_fn: None,
            pain_fn: None,
            die_fn: None,
            touch_debounce_time: 0.0,
            pain_debounce_time: 0.0,
            damage_debounce_time: 0.0,
            health: 0,
            max_health: 0,
            gib_health: 0,
            deadflag: DEAD_NO,
            viewheight: 0,
            takedamage: Damage::No as i32,
            dmg: 0,
            radius_dmg: 0,
            dmg_radius: 0.0,
            enemy: -1,
            oldenemy: -1,
            activator: -1,
            groundentity: -1,
            teammaster: -1,
            noise_index: 0,
            noise_index2: 0,
            wait: 0.0,
            teleport_time: 0.0,
            moveinfo: MoveInfo::default(),
            monsterinfo: MonsterInfo::default(),
            deatom: DeatomizerState { target: -1, ..Default::default() },
        }
    }
}

impl Edict {
    pub fn takes_damage(&self) -> bool {
        self.takedamage != Damage::No as i32
    }

    pub fn is_monster(&self) -> bool {
        self.svflags & SVF_MONSTER != 0
    }

    /// Centre of the bounding box in world space.
    pub fn bbox_center(&self) -> Vec3 {
        [
            self.s.origin[0] + (self.mins[0] + self.maxs[0]) * 0.5,
            self.s.origin[1] + (self.mins[1] + self.maxs[1]) * 0.5,
            self.s.origin[2] + (self.mins[2] + self.maxs[2]) * 0.5,
        ]
    }
}

// ============================================================
// Unified Game Context
// ============================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct AiCache {
    pub enemy_vis: bool,
    pub enemy_infront: bool,
    pub enemy_range: i32,
    pub enemy_yaw: f32,
}

/// Seed used until `init_game` reseeds from entropy.
const DEFAULT_RNG_SEED: u64 = 0x0b11_710e;

/// Holds all game state needed by any game module.
pub struct GameCtx {
    pub edicts: Vec<Edict>,
    pub level: LevelLocals,
    pub st: SpawnTemp,

    pub num_edicts: i32,
    pub max_edicts: i32,

    pub means_of_death: i32,

    /// Enemy checks cached by the last `ai_checkattack`.
    pub ai: AiCache,

    // Cvar values (cached as f32 for fast access)
    pub deathmatch: f32,
    pub coop: f32,
    pub skill: f32,
    pub maxclients: f32,
    pub maxentities: f32,

    pub rng: ChaCha8Rng,
}

/// Convenience alias so every game module can refer to the context as `GameContext`.
pub type GameContext = GameCtx;

impl Default for GameCtx {
    fn default() -> Self {
        Self {
            edicts: Vec::new(),
            level: LevelLocals::default(),
            st: SpawnTemp::default(),
            num_edicts: 0,
            max_edicts: MAX_EDICTS as i32,
            means_of_death: MOD_UNKNOWN,
            ai: AiCache::default(),
            deathmatch: 0.0,
            coop: 0.0,
            skill: 1.0,
            maxclients: 1.0,
            maxentities: MAX_EDICTS as f32,
            rng: ChaCha8Rng::seed_from_u64(DEFAULT_RNG_SEED),
        }
    }
}

impl GameCtx {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with the world and client slots allocated.
    pub fn with_capacity(max_edicts: usize, max_clients: usize) -> Self {
        let mut ctx = Self {
            edicts: Vec::with_capacity(max_edicts),
            max_edicts: max_edicts as i32,
            maxentities: max_edicts as f32,
            maxclients: max_clients as f32,
            ..Self::default()
        };
        for i in 0..=max_clients {
            let mut e = Edict::default();
            e.s.number = i as i32;
            if i > 0 {
                e.client = Some(i - 1);
            }
            ctx.edicts.push(e);
        }
        ctx.edicts[0].inuse = true;
        ctx.edicts[0].classname = "worldspawn".to_string();
        ctx.num_edicts = (max_clients + 1) as i32;
        ctx
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Uniform random number in [0, 1).
    pub fn random(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    /// Uniform random number in [-1, 1).
    pub fn crandom(&mut self) -> f32 {
        2.0 * (self.random() - 0.5)
    }

    /// Non-negative random integer, the equivalent of `rand()`.
    pub fn rand_int(&mut self) -> i32 {
        self.rng.gen_range(0..=i32::MAX)
    }

    /// Resolve an entity reference to an in-use edict index.
    pub fn ent(&self, idx: i32) -> Option<usize> {
        if idx < 0 {
            return None;
        }
        let i = idx as usize;
        self.edicts.get(i).filter(|e| e.inuse).map(|_| i)
    }

    pub fn get_edict(&self, idx: usize) -> Option<&Edict> {
        self.edicts.get(idx)
    }

    pub fn get_edict_mut(&mut self, idx: usize) -> Option<&mut Edict> {
        self.edicts.get_mut(idx)
    }

    pub fn is_client(&self, idx: usize) -> bool {
        self.edicts.get(idx).is_some_and(|e| e.client.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edict_default_references_are_none() {
        let e = Edict::default();
        assert_eq!(e.owner, -1);
        assert_eq!(e.enemy, -1);
        assert_eq!(e.groundentity, -1);
        assert_eq!(e.target_ent, -1);
        assert_eq!(e.deatom.target, -1);
        assert!(!e.takes_damage());
    }

    #[test]
    fn test_with_capacity_reserves_world_and_clients() {
        let ctx = GameCtx::with_capacity(64, 2);
        assert_eq!(ctx.edicts.len(), 3);
        assert_eq!(ctx.num_edicts, 3);
        assert!(ctx.edicts[0].inuse);
        assert_eq!(ctx.edicts[0].classname, "worldspawn");
        assert_eq!(ctx.edicts[1].client, Some(0));
        assert_eq!(ctx.edicts[2].client, Some(1));
        assert!(ctx.is_client(2));
        assert!(!ctx.is_client(0));
    }

    #[test]
    fn test_ent_rejects_free_and_negative() {
        let mut ctx = GameCtx::with_capacity(8, 1);
        assert_eq!(ctx.ent(-1), None);
        assert_eq!(ctx.ent(1), None); // client slot not in use yet
        ctx.edicts[1].inuse = true;
        assert_eq!(ctx.ent(1), Some(1));
        assert_eq!(ctx.ent(99), None);
    }

    #[test]
    fn test_random_ranges() {
        let mut ctx = GameCtx::default();
        for _ in 0..200 {
            let r = ctx.random();
            assert!((0.0..1.0).contains(&r));
            let c = ctx.crandom();
            assert!((-1.0..1.0).contains(&c));
            assert!(ctx.rand_int() >= 0);
        }
    }

    #[test]
    fn test_bbox_center() {
        let mut e = Edict::default();
        e.s.origin = [10.0, 0.0, 0.0];
        e.mins = [-16.0, -16.0, -24.0];
        e.maxs = [16.0, 16.0, 32.0];
        assert_eq!(e.bbox_center(), [10.0, 0.0, 4.0]);
    }

    #[test]
    fn test_mmove_frame_count() {
        fn noop(_: &mut GameContext, _: usize, _: f32) {}
        static FRAMES: [MFrame; 3] = [
            MFrame { ai_fn: noop, dist: 0.0, think_fn: None },
            MFrame { ai_fn: noop, dist: 0.0, think_fn: None },
            MFrame { ai_fn: noop, dist: 0.0, think_fn: None },
        ];
        static MOVE: MMove = MMove { firstframe: 10, lastframe: 12, frames: &FRAMES, endfunc: None };
        static OTHER: MMove = MMove { firstframe: 10, lastframe: 12, frames: &FRAMES, endfunc: None };
        assert_eq!(MOVE.frame_count(), 3);
        assert!(is_move(Some(&MOVE), &MOVE));
        assert!(!is_move(Some(&OTHER), &MOVE));
        assert!(!is_move(None, &MOVE));
    }
}
