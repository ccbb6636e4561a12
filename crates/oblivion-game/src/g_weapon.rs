// g_weapon.rs: Oblivion projectiles and hitscan weapons

use tracing::{debug, trace};

use crate::dispatch::{call_dodge, ThinkFn, TouchFn};
use crate::g_ai::infront;
use crate::g_combat::{findradius, t_damage, t_radius_damage};
use crate::g_local::*;
use crate::g_utils::{g_free_edict, g_free_edict_think, g_spawn};
use crate::game_import::*;

/// Most live detpacks or mines one owner may have.
pub const MAX_ACTIVE_CHARGES: usize = 5;

/// Delay between a charge landing and it arming.
const ARM_DELAY: f32 = 0.2;

/// Mine sensor period.
const MINE_SCAN_INTERVAL: f32 = 0.1;

const DOD_FUSE: f32 = 2.0;

const BOLT_MODEL: &str = "models/objects/laser/tris.md2";
const BOLT_FLY_SOUND: &str = "misc/lasfly.wav";

// ============================================================
// Shared helpers
// ============================================================

/// Charges fired by map spawns belong to the world and still have to land on
/// it, so only a real owner is ignored on touch.
fn touched_owner(ctx: &GameContext, self_idx: usize, other_idx: usize) -> bool {
    other_idx != 0 && ctx.edicts[self_idx].owner == other_idx as i32
}

fn hit_sky(surf: Option<&CSurface>) -> bool {
    surf.is_some_and(CSurface::is_sky)
}

/// Owner if it is still around, else the projectile itself.
fn owner_or_self(ctx: &GameContext, self_idx: usize) -> usize {
    ctx.ent(ctx.edicts[self_idx].owner).unwrap_or(self_idx)
}

/// Direction of travel, zero when the projectile is at rest.
fn travel_dir(ent: &Edict) -> Vec3 {
    if vector_compare(&ent.velocity, &VEC3_ORIGIN) {
        VEC3_ORIGIN
    } else {
        vector_normalized(&ent.velocity)
    }
}

fn plane_normal(plane: Option<&CPlane>) -> Vec3 {
    plane.map_or(VEC3_ORIGIN, |p| p.normal)
}

/// Point temp entity (no direction) multicast from `origin`.
pub fn temp_entity_at(te: i32, origin: &Vec3, to: Multicast) {
    gi_write_byte(SVC_TEMP_ENTITY);
    gi_write_byte(te);
    gi_write_position(origin);
    gi_multicast(origin, to);
}

/// Seconds a bolt lives: whole seconds of flight across 8000 units.
fn bolt_lifetime(speed: i32) -> f32 {
    (8000 / speed.max(1)) as f32
}

/// Common set-up for straight-flying projectiles.
fn spawn_missile(ctx: &mut GameContext, self_idx: usize, start: Vec3, dir: Vec3, speed: i32) -> Option<usize> {
    let idx = g_spawn(ctx)?;
    let ent = &mut ctx.edicts[idx];
    ent.s.origin = start;
    ent.s.old_origin = start;
    ent.s.angles = vectoangles(&dir);
    ent.velocity = vector_scale(&dir, speed as f32);
    ent.movetype = MoveType::FlyMissile;
    ent.clipmask = MASK_SHOT;
    ent.solid = Solid::Bbox;
    ent.mins = VEC3_ORIGIN;
    ent.maxs = VEC3_ORIGIN;
    ent.owner = self_idx as i32;
    Some(idx)
}

// ============================================================
// Dodging and melee
// ============================================================

/// Warn the monster in the line of fire so it can try to get out of the way.
pub fn check_dodge(ctx: &mut GameContext, self_idx: usize, start: Vec3, dir: Vec3, speed: i32) {
    // easy mode only ducks one quarter the time
    if ctx.skill == 0.0 && ctx.random() > 0.25 {
        return;
    }

    let end = vector_ma(&start, 8192.0, &dir);
    let tr = gi_traceline(&start, &end, self_idx as i32, MASK_SHOT);
    let Some(target) = ctx.ent(tr.ent_index) else {
        return;
    };

    let t = &ctx.edicts[target];
    if !t.is_monster() || t.health <= 0 || t.monsterinfo.dodge_fn.is_none() {
        return;
    }
    if !infront(t, &ctx.edicts[self_idx]) {
        return;
    }

    let eta = (vector_length(&vector_subtract(&tr.endpos, &start)) - t.maxs[0]) / speed.max(1) as f32;
    trace!(target, eta, "dodge warning");
    call_dodge(ctx, target, self_idx, eta);
}

/// Melee strike at the current enemy.
///
/// `aim` is (reach, right offset, up offset). Returns false when the enemy
/// is out of reach or the blow was stopped by something that can't be hurt.
pub fn fire_hit(ctx: &mut GameContext, self_idx: usize, aim: Vec3, damage: i32, kick: i32) -> bool {
    let Some(enemy_idx) = ctx.ent(ctx.edicts[self_idx].enemy) else {
        return false;
    };

    let self_origin = ctx.edicts[self_idx].s.origin;
    let dir = vector_subtract(&ctx.edicts[enemy_idx].s.origin, &self_origin);
    let mut range = vector_length(&dir);
    if range > aim[0] {
        return false;
    }

    let mut aim = aim;
    let (self_mins, self_maxs) = (ctx.edicts[self_idx].mins, ctx.edicts[self_idx].maxs);
    if aim[1] > self_mins[0] && aim[1] < self_maxs[0] {
        // straight on hit: back the range up to the edge of their bbox
        range -= ctx.edicts[enemy_idx].maxs[0];
    } else if aim[1] < 0.0 {
        aim[1] = ctx.edicts[enemy_idx].mins[0];
    } else {
        aim[1] = ctx.edicts[enemy_idx].maxs[0];
    }

    let probe = vector_ma(&self_origin, range, &dir);
    let tr = gi_traceline(&self_origin, &probe, self_idx as i32, MASK_SHOT);

    let mut hit_idx = enemy_idx;
    if tr.fraction < 1.0 {
        let struck = ctx.ent(tr.ent_index).unwrap_or(0);
        if !ctx.edicts[struck].takes_damage() {
            return false;
        }
        // anything alive in the way takes it for the enemy
        hit_idx = if ctx.edicts[struck].is_monster() || ctx.is_client(struck) {
            enemy_idx
        } else {
            struck
        };
    }

    let (forward, right, up) = angle_vectors_tuple(&ctx.edicts[self_idx].s.angles);
    let mut point = vector_ma(&self_origin, range, &forward);
    point = vector_ma(&point, aim[1], &right);
    point = vector_ma(&point, aim[2], &up);
    let hit_dir = vector_subtract(&point, &ctx.edicts[enemy_idx].s.origin);

    t_damage(
        ctx,
        hit_idx,
        self_idx,
        self_idx,
        hit_dir,
        point,
        VEC3_ORIGIN,
        damage,
        kick / 2,
        DAMAGE_NO_KNOCKBACK,
        MOD_HIT,
    );

    if !ctx.edicts[hit_idx].is_monster() && !ctx.is_client(hit_idx) {
        return false;
    }

    // our own knockback, aimed at the centre of the enemy
    let enemy = &mut ctx.edicts[enemy_idx];
    let center = enemy.bbox_center();
    let push = vector_normalized(&vector_subtract(&center, &point));
    enemy.velocity = vector_ma(&enemy.velocity, kick as f32, &push);
    if enemy.velocity[2] > 0.0 {
        enemy.groundentity = -1;
    }
    true
}

// ============================================================
// Energy bolts
// ============================================================

/// Straight energy bolts that share one flight model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoltKind {
    /// Monster plasma (Kigrax).
    Plasma,
    /// Big bolt with splash damage around the impact.
    Deatomizer { radius: f32, splash: i32 },
    PlasmaPistol,
    PlasmaRifle,
}

impl BoltKind {
    fn effects(self) -> u32 {
        match self {
            BoltKind::Plasma | BoltKind::PlasmaPistol => EF_PLASMA,
            BoltKind::Deatomizer { .. } => EF_BFG | EF_ANIM_ALLFAST,
            BoltKind::PlasmaRifle => EF_ROTATE,
        }
    }

    pub fn means_of_death(self) -> i32 {
        match self {
            BoltKind::Plasma | BoltKind::PlasmaPistol => MOD_PLASMA_PISTOL,
            BoltKind::Deatomizer { .. } => MOD_DEATOMIZER,
            BoltKind::PlasmaRifle => MOD_PLASMA_RIFLE,
        }
    }

    pub fn classname(self) -> &'static str {
        match self {
            BoltKind::Plasma => "plasma bolt",
            BoltKind::Deatomizer { .. } => "deatomizer bolt",
            BoltKind::PlasmaPistol => "plasma pistol",
            BoltKind::PlasmaRifle => "plasma rifle",
        }
    }

    fn touch(self) -> TouchFn {
        match self {
            BoltKind::Plasma | BoltKind::PlasmaPistol => plasma_pistol_touch,
            BoltKind::Deatomizer { .. } => deatomizer_touch,
            BoltKind::PlasmaRifle => plasma_rifle_touch,
        }
    }
}

fn bolt_touch(
    ctx: &mut GameContext,
    self_idx: usize,
    other_idx: usize,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
    mod_type: i32,
) {
    if touched_owner(ctx, self_idx, other_idx) {
        return;
    }
    if hit_sky(surf) {
        g_free_edict(ctx, self_idx);
        return;
    }

    let origin = ctx.edicts[self_idx].s.origin;
    if ctx.edicts[other_idx].takes_damage() {
        let dir = travel_dir(&ctx.edicts[self_idx]);
        let attacker = owner_or_self(ctx, self_idx);
        let dmg = ctx.edicts[self_idx].dmg;
        t_damage(
            ctx,
            other_idx,
            self_idx,
            attacker,
            dir,
            origin,
            plane_normal(plane),
            dmg,
            0,
            DAMAGE_ENERGY,
            mod_type,
        );
    } else {
        temp_entity_at(TE_PLASMA_EXPLOSION, &origin, Multicast::Pvs);
    }
}

fn plasma_pistol_touch(
    ctx: &mut GameContext,
    self_idx: usize,
    other_idx: usize,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    bolt_touch(ctx, self_idx, other_idx, plane, surf, MOD_PLASMA_PISTOL);
    if ctx.edicts[self_idx].inuse {
        g_free_edict(ctx, self_idx);
    }
}

fn plasma_rifle_touch(
    ctx: &mut GameContext,
    self_idx: usize,
    other_idx: usize,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    bolt_touch(ctx, self_idx, other_idx, plane, surf, MOD_PLASMA_RIFLE);
    if ctx.edicts[self_idx].inuse {
        g_free_edict(ctx, self_idx);
    }
}

fn deatomizer_touch(
    ctx: &mut GameContext,
    self_idx: usize,
    other_idx: usize,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    if touched_owner(ctx, self_idx, other_idx) {
        return;
    }
    bolt_touch(ctx, self_idx, other_idx, plane, surf, MOD_DEATOMIZER);
    if !ctx.edicts[self_idx].inuse {
        return;
    }

    let (radius, splash) = (ctx.edicts[self_idx].dmg_radius, ctx.edicts[self_idx].radius_dmg);
    if radius > 0.0 {
        let attacker = owner_or_self(ctx, self_idx);
        t_radius_damage(ctx, self_idx, attacker, splash as f32, Some(other_idx), radius, MOD_DEATOMIZER_SPLASH);
    }
    g_free_edict(ctx, self_idx);
}

/// Launch an energy bolt. `dir` need not be normalised.
pub fn fire_plasma_bolt(
    ctx: &mut GameContext,
    self_idx: usize,
    start: Vec3,
    dir: Vec3,
    damage: i32,
    speed: i32,
    kind: BoltKind,
) -> Option<usize> {
    let dir = vector_normalized(&dir);
    let bolt = spawn_missile(ctx, self_idx, start, dir, speed)?;
    let time = ctx.level.time;

    let ent = &mut ctx.edicts[bolt];
    ent.s.effects = kind.effects();
    ent.s.sound = gi_soundindex(BOLT_FLY_SOUND);
    ent.s.modelindex = gi_modelindex(BOLT_MODEL);
    ent.touch_fn = Some(kind.touch());
    ent.nextthink = time + bolt_lifetime(speed);
    ent.think_fn = Some(g_free_edict_think);
    ent.dmg = damage;
    ent.classname = kind.classname().to_string();
    if let BoltKind::Deatomizer { radius, splash } = kind {
        ent.radius_dmg = splash;
        ent.dmg_radius = radius;
    }

    if ctx.is_client(self_idx) {
        check_dodge(ctx, self_idx, start, dir, speed);
    }

    gi_linkentity(bolt as i32);
    Some(bolt)
}

pub fn fire_deatomizer(
    ctx: &mut GameContext,
    self_idx: usize,
    start: Vec3,
    dir: Vec3,
    damage: i32,
    speed: i32,
    damage_radius: f32,
    splash_damage: i32,
) -> Option<usize> {
    let kind = BoltKind::Deatomizer { radius: damage_radius, splash: splash_damage };
    fire_plasma_bolt(ctx, self_idx, start, dir, damage, speed, kind)
}

pub fn fire_plasma_pistol(ctx: &mut GameContext, self_idx: usize, start: Vec3, dir: Vec3, damage: i32, speed: i32) -> Option<usize> {
    fire_plasma_bolt(ctx, self_idx, start, dir, damage, speed, BoltKind::PlasmaPistol)
}

pub fn fire_plasma_rifle(ctx: &mut GameContext, self_idx: usize, start: Vec3, dir: Vec3, damage: i32, speed: i32) -> Option<usize> {
    fire_plasma_bolt(ctx, self_idx, start, dir, damage, speed, BoltKind::PlasmaRifle)
}

// ============================================================
// Donut, DoD and Hellfury
// ============================================================

/// Ring blast around `self`, credited to its owner.
pub fn fire_donut(ctx: &mut GameContext, self_idx: usize, radius: f32, splash: i32, ignore: Option<usize>) {
    let attacker = owner_or_self(ctx, self_idx);
    t_radius_damage(ctx, self_idx, attacker, splash as f32, ignore, radius, MOD_DONUT);
}

fn dod_explode(ctx: &mut GameContext, self_idx: usize) {
    if !ctx.edicts[self_idx].inuse {
        return;
    }

    let ignore = ctx.ent(ctx.edicts[self_idx].enemy);
    ctx.edicts[self_idx].s.sound = 0;
    gi_sound(self_idx as i32, CHAN_AUTO, gi_soundindex("sound/dod/DoD.wav"), 1.0, ATTN_NORM, 0.0);

    let origin = ctx.edicts[self_idx].s.origin;
    temp_entity_at(TE_EXPLOSION2, &origin, Multicast::Phs);

    let (radius, splash) = (ctx.edicts[self_idx].dmg_radius, ctx.edicts[self_idx].radius_dmg);
    fire_donut(ctx, self_idx, radius, splash, ignore);

    g_free_edict(ctx, self_idx);
}

fn dod_touch(
    ctx: &mut GameContext,
    self_idx: usize,
    other_idx: usize,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    if touched_owner(ctx, self_idx, other_idx) {
        return;
    }
    if hit_sky(surf) {
        g_free_edict(ctx, self_idx);
        return;
    }

    ctx.edicts[self_idx].enemy = -1;

    if ctx.edicts[other_idx].takes_damage() {
        ctx.edicts[self_idx].enemy = other_idx as i32;
        let dir = travel_dir(&ctx.edicts[self_idx]);
        let origin = ctx.edicts[self_idx].s.origin;
        let attacker = owner_or_self(ctx, self_idx);
        let dmg = ctx.edicts[self_idx].dmg;
        t_damage(ctx, other_idx, self_idx, attacker, dir, origin, plane_normal(plane), dmg, 0, DAMAGE_ENERGY, MOD_DONUT);
    }

    dod_explode(ctx, self_idx);
}

/// Slow plasma orb that bursts into a donut blast after two seconds or on
/// contact.
pub fn fire_dod(
    ctx: &mut GameContext,
    self_idx: usize,
    start: Vec3,
    dir: Vec3,
    damage: i32,
    speed: i32,
    damage_radius: f32,
    splash_damage: i32,
) -> Option<usize> {
    let orb = spawn_missile(ctx, self_idx, start, dir, speed)?;
    let time = ctx.level.time;

    let ent = &mut ctx.edicts[orb];
    ent.s.effects = EF_PLASMA | EF_ANIM_ALLFAST;
    ent.s.renderfx = RF_FULLBRIGHT;
    ent.s.modelindex = gi_modelindex("models/objects/dod/tris.md2");
    ent.s.sound = gi_soundindex("sound/dod/DoD_hum.wav");
    ent.enemy = -1;
    ent.touch_fn = Some(dod_touch);
    ent.nextthink = time + DOD_FUSE;
    ent.think_fn = Some(dod_explode);
    ent.dmg = damage;
    ent.radius_dmg = splash_damage;
    ent.dmg_radius = damage_radius;
    ent.classname = "dod".to_string();

    if ctx.is_client(self_idx) {
        check_dodge(ctx, self_idx, start, dir, speed);
    }

    gi_linkentity(orb as i32);
    Some(orb)
}

fn hellfury_touch(
    ctx: &mut GameContext,
    self_idx: usize,
    other_idx: usize,
    plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    if touched_owner(ctx, self_idx, other_idx) {
        return;
    }
    if hit_sky(surf) {
        g_free_edict(ctx, self_idx);
        return;
    }

    let origin = ctx.edicts[self_idx].s.origin;
    if ctx.edicts[other_idx].takes_damage() {
        let dir = travel_dir(&ctx.edicts[self_idx]);
        let attacker = owner_or_self(ctx, self_idx);
        let dmg = ctx.edicts[self_idx].dmg;
        t_damage(
            ctx,
            other_idx,
            self_idx,
            attacker,
            dir,
            origin,
            plane_normal(plane),
            dmg,
            0,
            DAMAGE_ENERGY | DAMAGE_RADIUS,
            MOD_HELLFURY,
        );
    }

    let (radius, splash) = (ctx.edicts[self_idx].dmg_radius, ctx.edicts[self_idx].radius_dmg);
    fire_donut(ctx, self_idx, radius, splash, Some(other_idx));

    temp_entity_at(TE_EXPLOSION1, &origin, Multicast::Pvs);
    g_free_edict(ctx, self_idx);
}

pub fn fire_hellfury(
    ctx: &mut GameContext,
    self_idx: usize,
    start: Vec3,
    dir: Vec3,
    damage: i32,
    speed: i32,
    damage_radius: f32,
    splash_damage: i32,
) -> Option<usize> {
    let rocket = spawn_missile(ctx, self_idx, start, dir, speed)?;
    let time = ctx.level.time;

    let ent = &mut ctx.edicts[rocket];
    ent.s.effects = EF_ROCKET;
    ent.s.modelindex = gi_modelindex("models/objects/rocket/tris.md2");
    ent.touch_fn = Some(hellfury_touch);
    ent.nextthink = time + bolt_lifetime(speed);
    ent.think_fn = Some(g_free_edict_think);
    ent.dmg = damage;
    ent.radius_dmg = splash_damage;
    ent.dmg_radius = damage_radius;
    ent.classname = "hellfury".to_string();

    if ctx.is_client(self_idx) {
        check_dodge(ctx, self_idx, start, dir, speed);
    }

    gi_linkentity(rocket as i32);
    Some(rocket)
}

// ============================================================
// Laser cannon
// ============================================================

/// Instant beam along `dir`. Returns the entity struck, if it could be hurt.
pub fn fire_laser_cannon(
    ctx: &mut GameContext,
    self_idx: usize,
    start: Vec3,
    dir: Vec3,
    damage: i32,
    kick: i32,
) -> Option<usize> {
    let end = vector_ma(&start, 8192.0, &dir);
    let tr = gi_traceline(&start, &end, self_idx as i32, MASK_SHOT);

    let struck = ctx.ent(tr.ent_index).filter(|&i| ctx.edicts[i].takes_damage());
    if let Some(target) = struck {
        t_damage(
            ctx,
            target,
            self_idx,
            self_idx,
            dir,
            tr.endpos,
            tr.plane.normal,
            damage,
            kick,
            DAMAGE_ENERGY,
            MOD_LASERCANNON,
        );
    }

    gi_write_byte(SVC_TEMP_ENTITY);
    gi_write_byte(TE_BFG_LASER);
    gi_write_position(&start);
    gi_write_position(&tr.endpos);
    gi_multicast(&start, Multicast::Pvs);

    struck
}

// ============================================================
// Charges: detpack and proximity mine
// ============================================================

/// Older charges of the same class and owner, oldest first by timestamp.
/// Detonates the oldest when the owner is over the cap.
fn enforce_charge_limit(ctx: &mut GameContext, charge_idx: usize, detonate: fn(&mut GameContext, usize)) {
    let owner = ctx.edicts[charge_idx].owner;
    if owner < 0 {
        return;
    }
    let classname = ctx.edicts[charge_idx].classname.clone();

    let mut count = 0;
    let mut oldest = charge_idx;
    for (i, ent) in ctx.edicts.iter().enumerate().skip(1) {
        if !ent.inuse || ent.owner != owner || ent.classname != classname {
            continue;
        }
        count += 1;
        if i != charge_idx && (oldest == charge_idx || ent.timestamp < ctx.edicts[oldest].timestamp) {
            oldest = i;
        }
    }

    if count > MAX_ACTIVE_CHARGES {
        debug!(owner, %classname, count, "charge limit reached, detonating oldest");
        detonate(ctx, oldest);
    }
}

/// Stop a charge where it hit and arm it shortly after.
fn charge_land(ctx: &mut GameContext, self_idx: usize, other_idx: usize, arm: ThinkFn) {
    let time = ctx.level.time;
    let ent = &mut ctx.edicts[self_idx];
    if ent.groundentity >= 0 {
        return;
    }
    ent.velocity = VEC3_ORIGIN;
    ent.avelocity = VEC3_ORIGIN;
    ent.movetype = MoveType::None;
    ent.touch_fn = None;
    ent.think_fn = Some(arm);
    ent.nextthink = time + ARM_DELAY;
    ent.groundentity = other_idx as i32;
}

fn detpack_die(ctx: &mut GameContext, self_idx: usize, _inflictor: usize, _attacker: usize, _damage: i32, _point: Vec3) {
    detpack_detonate(ctx, self_idx);
}

fn detpack_arm(ctx: &mut GameContext, self_idx: usize) {
    let ent = &mut ctx.edicts[self_idx];
    ent.think_fn = None;
    ent.nextthink = 0.0;
    ent.touch_fn = None;
}

fn detpack_detonate(ctx: &mut GameContext, self_idx: usize) {
    if !ctx.edicts[self_idx].inuse {
        return;
    }

    // the blast must not set the charge off a second time
    let ent = &mut ctx.edicts[self_idx];
    ent.takedamage = Damage::No as i32;
    ent.die_fn = None;

    let origin = ent.s.origin;
    temp_entity_at(TE_EXPLOSION2, &origin, Multicast::Phs);

    let attacker = owner_or_self(ctx, self_idx);
    let (radius, splash) = (ctx.edicts[self_idx].dmg_radius, ctx.edicts[self_idx].radius_dmg);
    t_radius_damage(ctx, self_idx, attacker, splash as f32, None, radius, MOD_DETPACK);

    g_free_edict(ctx, self_idx);
}

fn detpack_touch(
    ctx: &mut GameContext,
    self_idx: usize,
    other_idx: usize,
    _plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    if touched_owner(ctx, self_idx, other_idx) {
        return;
    }
    if hit_sky(surf) {
        g_free_edict(ctx, self_idx);
        return;
    }
    charge_land(ctx, self_idx, other_idx, detpack_arm);
}

/// Throw a remote-detonated charge.
pub fn fire_detpack(
    ctx: &mut GameContext,
    self_idx: usize,
    start: Vec3,
    aimdir: Vec3,
    damage: i32,
    speed: i32,
    damage_radius: f32,
) -> Option<usize> {
    let charge = spawn_missile(ctx, self_idx, start, aimdir, speed)?;
    let time = ctx.level.time;

    let ent = &mut ctx.edicts[charge];
    ent.movetype = MoveType::Toss;
    ent.s.modelindex = gi_modelindex("models/objects/detpack/tris.md2");
    ent.s.effects = EF_GRENADE;
    ent.touch_fn = Some(detpack_touch);
    ent.think_fn = Some(detpack_arm);
    ent.nextthink = time + ARM_DELAY;
    ent.dmg = damage;
    ent.radius_dmg = damage;
    ent.dmg_radius = damage_radius;
    ent.classname = "detpack".to_string();
    ent.health = 70;
    ent.max_health = 70;
    ent.takedamage = Damage::Yes as i32;
    ent.die_fn = Some(detpack_die);
    ent.timestamp = time;

    gi_linkentity(charge as i32);
    enforce_charge_limit(ctx, charge, detpack_detonate);
    Some(charge)
}

/// Map-placed detpack: thrown once along its angles by the world.
pub fn sp_detpack(ctx: &mut GameContext, self_idx: usize) {
    let ent = &mut ctx.edicts[self_idx];
    if ent.speed <= 0.0 {
        ent.speed = 400.0;
    }
    if ent.dmg == 0 {
        ent.dmg = 240;
    }
    if ent.dmg_radius <= 0.0 {
        ent.dmg_radius = 200.0;
    }

    let (forward, _, _) = angle_vectors_tuple(&ent.s.angles);
    let (origin, damage, speed, radius) = (ent.s.origin, ent.dmg, ent.speed as i32, ent.dmg_radius);

    fire_detpack(ctx, 0, origin, forward, damage, speed, radius);
    g_free_edict(ctx, self_idx);
}

/// Set off every detpack `owner_idx` has out.
pub fn remote_detonator_trigger(ctx: &mut GameContext, owner_idx: usize) {
    let charges: Vec<usize> = ctx
        .edicts
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, e)| e.inuse && e.classname == "detpack" && e.owner == owner_idx as i32)
        .map(|(i, _)| i)
        .collect();

    for idx in charges {
        detpack_detonate(ctx, idx);
    }
}

fn proximity_mine_explode(ctx: &mut GameContext, self_idx: usize, target: Option<usize>) {
    if !ctx.edicts[self_idx].inuse {
        return;
    }

    let origin = ctx.edicts[self_idx].s.origin;
    let attacker = owner_or_self(ctx, self_idx);

    if let Some(target) = target.filter(|&t| ctx.edicts[t].takes_damage()) {
        let dir = vector_normalized(&vector_subtract(&ctx.edicts[target].s.origin, &origin));
        let dmg = ctx.edicts[self_idx].dmg;
        t_damage(ctx, target, self_idx, attacker, dir, origin, VEC3_ORIGIN, dmg, 0, DAMAGE_ENERGY, MOD_MINE);
    }

    temp_entity_at(TE_PLASMA_EXPLOSION, &origin, Multicast::Pvs);

    let (radius, splash) = (ctx.edicts[self_idx].dmg_radius, ctx.edicts[self_idx].radius_dmg);
    if radius > 0.0 {
        let ent = &mut ctx.edicts[self_idx];
        ent.takedamage = Damage::No as i32;
        ent.die_fn = None;
        t_radius_damage(ctx, self_idx, attacker, splash as f32, Some(self_idx), radius, MOD_MINE_SPLASH);
    }

    g_free_edict(ctx, self_idx);
}

fn proximity_mine_detonate(ctx: &mut GameContext, self_idx: usize) {
    proximity_mine_explode(ctx, self_idx, None);
}

fn proximity_mine_die(ctx: &mut GameContext, self_idx: usize, _inflictor: usize, attacker: usize, _damage: i32, _point: Vec3) {
    proximity_mine_explode(ctx, self_idx, Some(attacker));
}

fn proximity_mine_think(ctx: &mut GameContext, self_idx: usize) {
    let ent = &ctx.edicts[self_idx];
    let owner = ent.owner;
    let victim = findradius(ent.s.origin, ent.dmg_radius, &ctx.edicts)
        .into_iter()
        .find(|&i| {
            let e = &ctx.edicts[i];
            i as i32 != owner && e.takes_damage() && (e.is_monster() || e.client.is_some())
        });

    match victim {
        Some(target) => proximity_mine_explode(ctx, self_idx, Some(target)),
        None => ctx.edicts[self_idx].nextthink = ctx.level.time + MINE_SCAN_INTERVAL,
    }
}

fn proximity_mine_arm(ctx: &mut GameContext, self_idx: usize) {
    let time = ctx.level.time;
    let ent = &mut ctx.edicts[self_idx];
    ent.think_fn = Some(proximity_mine_think);
    ent.nextthink = time + MINE_SCAN_INTERVAL;
}

fn proximity_mine_touch(
    ctx: &mut GameContext,
    self_idx: usize,
    other_idx: usize,
    _plane: Option<&CPlane>,
    surf: Option<&CSurface>,
) {
    if touched_owner(ctx, self_idx, other_idx) {
        return;
    }
    if hit_sky(surf) {
        g_free_edict(ctx, self_idx);
        return;
    }
    charge_land(ctx, self_idx, other_idx, proximity_mine_arm);
}

/// Throw a mine that sticks where it lands and waits for something alive.
pub fn fire_proximity_mine(
    ctx: &mut GameContext,
    self_idx: usize,
    start: Vec3,
    aimdir: Vec3,
    damage: i32,
    speed: i32,
    damage_radius: f32,
    splash_damage: i32,
) -> Option<usize> {
    let mine = spawn_missile(ctx, self_idx, start, aimdir, speed)?;
    let time = ctx.level.time;

    let ent = &mut ctx.edicts[mine];
    ent.movetype = MoveType::Toss;
    ent.mins = [-2.0, -2.0, -2.0];
    ent.maxs = [2.0, 2.0, 2.0];
    ent.s.effects = EF_GRENADE;
    ent.s.modelindex = gi_modelindex("models/objects/mine/tris.md2");
    ent.touch_fn = Some(proximity_mine_touch);
    ent.think_fn = Some(proximity_mine_arm);
    ent.nextthink = time + ARM_DELAY;
    ent.dmg = damage;
    ent.radius_dmg = splash_damage;
    ent.dmg_radius = damage_radius;
    ent.classname = "mine".to_string();
    ent.takedamage = Damage::Yes as i32;
    ent.health = 10;
    ent.max_health = 10;
    ent.die_fn = Some(proximity_mine_die);
    ent.timestamp = time;

    gi_linkentity(mine as i32);
    enforce_charge_limit(ctx, mine, proximity_mine_detonate);
    Some(mine)
}

pub fn sp_mine(ctx: &mut GameContext, self_idx: usize) {
    let ent = &mut ctx.edicts[self_idx];
    if ent.speed <= 0.0 {
        ent.speed = 600.0;
    }
    if ent.dmg == 0 {
        ent.dmg = 150;
    }
    if ent.radius_dmg == 0 {
        ent.radius_dmg = 100;
    }
    if ent.dmg_radius <= 0.0 {
        ent.dmg_radius = 180.0;
    }

    let (forward, _, _) = angle_vectors_tuple(&ent.s.angles);
    let (origin, damage, speed, radius, splash) =
        (ent.s.origin, ent.dmg, ent.speed as i32, ent.dmg_radius, ent.radius_dmg);

    fire_proximity_mine(ctx, 0, origin, forward, damage, speed, radius, splash);
    g_free_edict(ctx, self_idx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_import::testing;

    fn make_ctx() -> GameContext {
        testing::install();
        let mut ctx = GameCtx::with_capacity(64, 1);
        ctx.level.time = 10.0;
        ctx
    }

    fn spawn_target(ctx: &mut GameContext, origin: Vec3, health: i32) -> usize {
        let idx = g_spawn(ctx).unwrap();
        let ent = &mut ctx.edicts[idx];
        ent.s.origin = origin;
        ent.mins = [-16.0, -16.0, -24.0];
        ent.maxs = [16.0, 16.0, 32.0];
        ent.solid = Solid::Bbox;
        ent.health = health;
        ent.takedamage = Damage::Yes as i32;
        ent.classname = "target".into();
        idx
    }

    fn spawn_shooter(ctx: &mut GameContext) -> usize {
        let idx = g_spawn(ctx).unwrap();
        ctx.edicts[idx].classname = "shooter".into();
        idx
    }

    fn sky() -> CSurface {
        CSurface { flags: SURF_SKY, ..Default::default() }
    }

    fn record_dodge(ctx: &mut GameContext, self_idx: usize, attacker: usize, eta: f32) {
        ctx.edicts[self_idx].activator = attacker as i32;
        ctx.edicts[self_idx].wait = eta;
    }

    // ============================================================
    // Bolts
    // ============================================================

    #[test]
    fn test_fire_plasma_bolt_setup() {
        let mut ctx = make_ctx();
        let shooter = spawn_shooter(&mut ctx);
        let bolt = fire_plasma_bolt(&mut ctx, shooter, [0.0; 3], [10.0, 0.0, 0.0], 10, 1000, BoltKind::Plasma).unwrap();
        let b = &ctx.edicts[bolt];
        assert_eq!(b.velocity, [1000.0, 0.0, 0.0]);
        assert_eq!(b.owner, shooter as i32);
        assert_eq!(b.movetype, MoveType::FlyMissile);
        assert_eq!(b.s.effects, EF_PLASMA);
        assert_eq!(b.nextthink, 18.0);
        assert_eq!(b.classname, "plasma bolt");
        assert!(testing::links().contains(&(bolt as i32)));
    }

    #[test]
    fn test_bolt_kinds() {
        let deatom = BoltKind::Deatomizer { radius: 100.0, splash: 50 };
        assert_eq!(deatom.effects(), EF_BFG | EF_ANIM_ALLFAST);
        assert_eq!(deatom.means_of_death(), MOD_DEATOMIZER);
        assert_eq!(BoltKind::PlasmaRifle.effects(), EF_ROTATE);
        assert_eq!(BoltKind::PlasmaRifle.means_of_death(), MOD_PLASMA_RIFLE);
        assert_eq!(BoltKind::PlasmaPistol.classname(), "plasma pistol");
    }

    #[test]
    fn test_bolt_lifetime_is_whole_seconds() {
        assert_eq!(bolt_lifetime(1000), 8.0);
        assert_eq!(bolt_lifetime(650), 12.0);
        assert_eq!(bolt_lifetime(0), 8000.0);
    }

    #[test]
    fn test_bolt_ignores_owner() {
        let mut ctx = make_ctx();
        let shooter = spawn_shooter(&mut ctx);
        let bolt = fire_plasma_pistol(&mut ctx, shooter, [0.0; 3], [1.0, 0.0, 0.0], 10, 1000).unwrap();
        call_touch_fn(&mut ctx, bolt, shooter, None);
        assert!(ctx.edicts[bolt].inuse);
    }

    #[test]
    fn test_bolt_sky_frees_silently() {
        let mut ctx = make_ctx();
        let shooter = spawn_shooter(&mut ctx);
        let bolt = fire_plasma_pistol(&mut ctx, shooter, [0.0; 3], [1.0, 0.0, 0.0], 10, 1000).unwrap();
        testing::clear();
        call_touch_fn(&mut ctx, bolt, 0, Some(&sky()));
        assert!(!ctx.edicts[bolt].inuse);
        assert!(testing::temp_entities().is_empty());
    }

    #[test]
    fn test_bolt_world_impact_explodes() {
        let mut ctx = make_ctx();
        let shooter = spawn_shooter(&mut ctx);
        let bolt = fire_plasma_rifle(&mut ctx, shooter, [5.0, 0.0, 0.0], [1.0, 0.0, 0.0], 10, 1000).unwrap();
        testing::clear();
        call_touch_fn(&mut ctx, bolt, 0, None);
        assert!(!ctx.edicts[bolt].inuse);
        assert_eq!(testing::temp_entities(), vec![TE_PLASMA_EXPLOSION]);
        assert_eq!(testing::multicasts()[0], ([5.0, 0.0, 0.0], Multicast::Pvs));
    }

    #[test]
    fn test_bolt_damages_target() {
        let mut ctx = make_ctx();
        let shooter = spawn_shooter(&mut ctx);
        let target = spawn_target(&mut ctx, [100.0, 0.0, 0.0], 100);
        let bolt = fire_plasma_rifle(&mut ctx, shooter, [0.0; 3], [1.0, 0.0, 0.0], 25, 1000).unwrap();
        call_touch_fn(&mut ctx, bolt, target, None);
        assert_eq!(ctx.edicts[target].health, 75);
        assert_eq!(ctx.means_of_death, MOD_PLASMA_RIFLE);
        assert!(!ctx.edicts[bolt].inuse);
    }

    #[test]
    fn test_deatomizer_splashes_bystanders_not_struck() {
        let mut ctx = make_ctx();
        let shooter = spawn_shooter(&mut ctx);
        let struck = spawn_target(&mut ctx, [0.0, 0.0, 0.0], 200);
        let bystander = spawn_target(&mut ctx, [40.0, 0.0, 4.0], 200);
        let bolt = fire_deatomizer(&mut ctx, shooter, [0.0, 0.0, 4.0], [1.0, 0.0, 0.0], 30, 1000, 120.0, 60).unwrap();
        call_touch_fn(&mut ctx, bolt, struck, None);
        // direct hit only
        assert_eq!(ctx.edicts[struck].health, 170);
        // 60 - 0.5 * 40
        assert_eq!(ctx.edicts[bystander].health, 160);
        assert_eq!(ctx.means_of_death, MOD_DEATOMIZER_SPLASH);
    }

    #[test]
    fn test_client_shot_warns_monster() {
        let mut ctx = make_ctx();
        ctx.edicts[1].inuse = true;
        let monster = spawn_target(&mut ctx, [300.0, 0.0, 0.0], 100);
        ctx.edicts[monster].svflags |= SVF_MONSTER;
        ctx.edicts[monster].s.angles = [0.0, 180.0, 0.0];
        ctx.edicts[monster].monsterinfo.dodge_fn = Some(record_dodge);

        testing::push_trace(Trace {
            fraction: 0.03,
            endpos: [284.0, 0.0, 0.0],
            ent_index: monster as i32,
            ..Trace::default()
        });
        fire_plasma_pistol(&mut ctx, 1, [0.0; 3], [1.0, 0.0, 0.0], 10, 1000);
        let m = &ctx.edicts[monster];
        assert_eq!(m.activator, 1);
        assert!((m.wait - 0.268).abs() < 1e-4);
    }

    #[test]
    fn test_check_dodge_needs_shooter_in_front() {
        let mut ctx = make_ctx();
        ctx.edicts[1].inuse = true;
        let monster = spawn_target(&mut ctx, [300.0, 0.0, 0.0], 100);
        ctx.edicts[monster].svflags |= SVF_MONSTER;
        // facing away from the shooter
        ctx.edicts[monster].monsterinfo.dodge_fn = Some(record_dodge);
        testing::push_trace(Trace { fraction: 0.03, endpos: [284.0, 0.0, 0.0], ent_index: monster as i32, ..Trace::default() });
        check_dodge(&mut ctx, 1, [0.0; 3], [1.0, 0.0, 0.0], 1000);
        assert_eq!(ctx.edicts[monster].activator, -1);
    }

    fn call_touch_fn(ctx: &mut GameContext, self_idx: usize, other: usize, surf: Option<&CSurface>) {
        crate::dispatch::call_touch(ctx, self_idx, other, None, surf);
    }

    // ============================================================
    // Melee
    // ============================================================

    #[test]
    fn test_fire_hit_out_of_reach() {
        let mut ctx = make_ctx();
        let attacker = spawn_target(&mut ctx, [0.0; 3], 100);
        let enemy = spawn_target(&mut ctx, [200.0, 0.0, 0.0], 100);
        ctx.edicts[attacker].enemy = enemy as i32;
        assert!(!fire_hit(&mut ctx, attacker, [MELEE_DISTANCE, 0.0, 0.0], 10, 100));
        assert_eq!(ctx.edicts[enemy].health, 100);
    }

    #[test]
    fn test_fire_hit_connects_and_knocks_back() {
        let mut ctx = make_ctx();
        let attacker = spawn_target(&mut ctx, [0.0; 3], 100);
        let enemy = spawn_target(&mut ctx, [50.0, 0.0, 0.0], 100);
        ctx.edicts[enemy].svflags |= SVF_MONSTER;
        ctx.edicts[enemy].groundentity = 0;
        ctx.edicts[attacker].enemy = enemy as i32;
        assert!(fire_hit(&mut ctx, attacker, [MELEE_DISTANCE, 0.0, 10.0], 10, 100));
        let e = &ctx.edicts[enemy];
        assert_eq!(e.health, 90);
        assert_eq!(ctx.means_of_death, MOD_HIT);
        assert!(e.velocity[0] > 0.0);
    }

    // ============================================================
    // DoD / Hellfury / laser
    // ============================================================

    #[test]
    fn test_dod_fuse_and_explosion() {
        let mut ctx = make_ctx();
        let shooter = spawn_shooter(&mut ctx);
        let orb = fire_dod(&mut ctx, shooter, [0.0; 3], [1.0, 0.0, 0.0], 50, 400, 150.0, 80).unwrap();
        assert_eq!(ctx.edicts[orb].nextthink, 12.0);
        assert_eq!(ctx.edicts[orb].s.renderfx, RF_FULLBRIGHT);

        let struck = spawn_target(&mut ctx, [20.0, 0.0, -4.0], 200);
        testing::clear();
        call_touch_fn(&mut ctx, orb, struck, None);
        assert!(!ctx.edicts[orb].inuse);
        // direct hit only, the donut skips the struck entity
        assert_eq!(ctx.edicts[struck].health, 150);
        assert!(testing::temp_entities().contains(&TE_EXPLOSION2));
        assert!(testing::sound_played("sound/dod/DoD.wav"));
    }

    #[test]
    fn test_hellfury_donut_hits_neighbours() {
        let mut ctx = make_ctx();
        let shooter = spawn_shooter(&mut ctx);
        let rocket = fire_hellfury(&mut ctx, shooter, [0.0, 0.0, 4.0], [1.0, 0.0, 0.0], 40, 800, 200.0, 100).unwrap();
        assert_eq!(ctx.edicts[rocket].nextthink, 20.0);
        let neighbour = spawn_target(&mut ctx, [60.0, 0.0, 0.0], 200);
        call_touch_fn(&mut ctx, rocket, 0, None);
        assert_eq!(ctx.edicts[neighbour].health, 130);
        assert_eq!(ctx.means_of_death, MOD_DONUT);
        assert!(testing::temp_entities().contains(&TE_EXPLOSION1));
    }

    #[test]
    fn test_laser_cannon_hits_and_draws_beam() {
        let mut ctx = make_ctx();
        let shooter = spawn_shooter(&mut ctx);
        let target = spawn_target(&mut ctx, [500.0, 0.0, 0.0], 100);
        testing::push_trace(Trace { fraction: 0.06, endpos: [484.0, 0.0, 0.0], ent_index: target as i32, ..Trace::default() });
        let hit = fire_laser_cannon(&mut ctx, shooter, [0.0; 3], [1.0, 0.0, 0.0], 35, 0);
        assert_eq!(hit, Some(target));
        assert_eq!(ctx.edicts[target].health, 65);
        assert_eq!(ctx.means_of_death, MOD_LASERCANNON);
        let writes = testing::writes();
        let beam = writes.iter().position(|w| *w == testing::Write::Byte(TE_BFG_LASER)).unwrap();
        assert_eq!(writes[beam + 2], testing::Write::Position([484.0, 0.0, 0.0]));
    }

    // ============================================================
    // Charges
    // ============================================================

    #[test]
    fn test_detpack_lands_and_arms() {
        let mut ctx = make_ctx();
        let shooter = spawn_shooter(&mut ctx);
        let charge = fire_detpack(&mut ctx, shooter, [0.0; 3], [1.0, 0.0, 0.0], 100, 400, 150.0).unwrap();
        assert_eq!(ctx.edicts[charge].health, 70);
        call_touch_fn(&mut ctx, charge, 0, None);
        let c = &ctx.edicts[charge];
        assert_eq!(c.movetype, MoveType::None);
        assert_eq!(c.velocity, VEC3_ORIGIN);
        assert_eq!(c.groundentity, 0);
        assert!(c.touch_fn.is_none());

        ctx.level.time += 0.2;
        crate::dispatch::call_think(&mut ctx, charge);
        assert!(ctx.edicts[charge].think_fn.is_none());
        assert!(ctx.edicts[charge].inuse);
    }

    #[test]
    fn test_detpack_limit_detonates_oldest() {
        let mut ctx = make_ctx();
        let shooter = spawn_shooter(&mut ctx);
        let mut charges = Vec::new();
        for i in 0..MAX_ACTIVE_CHARGES {
            ctx.level.time = 10.0 + i as f32;
            let pos = [i as f32 * 1000.0, 0.0, 0.0];
            charges.push(fire_detpack(&mut ctx, shooter, pos, [1.0, 0.0, 0.0], 100, 400, 50.0).unwrap());
        }
        assert!(charges.iter().all(|&c| ctx.edicts[c].inuse));

        ctx.level.time = 20.0;
        fire_detpack(&mut ctx, shooter, [9000.0, 0.0, 0.0], [1.0, 0.0, 0.0], 100, 400, 50.0).unwrap();
        assert!(!ctx.edicts[charges[0]].inuse);
        assert!(charges[1..].iter().all(|&c| ctx.edicts[c].inuse));
    }

    #[test]
    fn test_remote_detonator_only_owner_charges() {
        let mut ctx = make_ctx();
        let a = spawn_shooter(&mut ctx);
        let b = spawn_shooter(&mut ctx);
        let mine_a = fire_detpack(&mut ctx, a, [0.0; 3], [1.0, 0.0, 0.0], 100, 400, 50.0).unwrap();
        let mine_b = fire_detpack(&mut ctx, b, [5000.0, 0.0, 0.0], [1.0, 0.0, 0.0], 100, 400, 50.0).unwrap();
        let victim = spawn_target(&mut ctx, [30.0, 0.0, 0.0], 200);

        remote_detonator_trigger(&mut ctx, a);
        assert!(!ctx.edicts[mine_a].inuse);
        assert!(ctx.edicts[mine_b].inuse);
        assert!(ctx.edicts[victim].health < 200);
        assert_eq!(ctx.means_of_death, MOD_DETPACK);
    }

    #[test]
    fn test_detpack_shot_detonates_once() {
        let mut ctx = make_ctx();
        let shooter = spawn_shooter(&mut ctx);
        let charge = fire_detpack(&mut ctx, shooter, [0.0; 3], [1.0, 0.0, 0.0], 100, 400, 150.0).unwrap();
        testing::clear();
        t_damage(&mut ctx, charge, shooter, shooter, [1.0, 0.0, 0.0], [0.0; 3], VEC3_ORIGIN, 80, 0, DamageFlags::empty(), MOD_UNKNOWN);
        assert!(!ctx.edicts[charge].inuse);
        let explosions = testing::temp_entities().iter().filter(|&&te| te == TE_EXPLOSION2).count();
        assert_eq!(explosions, 1);
    }

    #[test]
    fn test_sp_detpack_defaults_and_world_owner() {
        let mut ctx = make_ctx();
        let template = g_spawn(&mut ctx).unwrap();
        ctx.edicts[template].s.origin = [1.0, 2.0, 3.0];
        sp_detpack(&mut ctx, template);

        let charge = crate::g_utils::g_find(&ctx, 1, crate::g_utils::FindField::Classname, "detpack").unwrap();
        let c = &ctx.edicts[charge];
        assert_eq!(c.owner, 0);
        assert_eq!(c.dmg, 240);
        assert_eq!(c.dmg_radius, 200.0);
        assert_eq!(c.velocity, [400.0, 0.0, 0.0]);
        assert_eq!(c.s.origin, [1.0, 2.0, 3.0]);

        // world-owned charges still land on the world
        call_touch_fn(&mut ctx, charge, 0, None);
        assert_eq!(ctx.edicts[charge].movetype, MoveType::None);
    }

    #[test]
    fn test_mine_scans_for_monsters() {
        let mut ctx = make_ctx();
        let shooter = spawn_shooter(&mut ctx);
        let mine = fire_proximity_mine(&mut ctx, shooter, [0.0; 3], [1.0, 0.0, 0.0], 150, 600, 180.0, 100).unwrap();
        call_touch_fn(&mut ctx, mine, 0, None);
        ctx.level.time += 0.2;
        crate::dispatch::call_think(&mut ctx, mine);
        ctx.level.time += 0.1;

        // nothing alive nearby: keep scanning
        let prop = spawn_target(&mut ctx, [50.0, 0.0, 0.0], 100);
        crate::dispatch::call_think(&mut ctx, mine);
        assert!(ctx.edicts[mine].inuse);
        assert!((ctx.edicts[mine].nextthink - (ctx.level.time + 0.1)).abs() < 1e-5);

        let monster = spawn_target(&mut ctx, [100.0, 0.0, 0.0], 500);
        ctx.edicts[monster].svflags |= SVF_MONSTER;
        crate::dispatch::call_think(&mut ctx, mine);
        assert!(!ctx.edicts[mine].inuse);
        assert!(ctx.edicts[monster].health < 500);
        assert!(ctx.edicts[prop].health < 100);
        assert!(testing::temp_entities().contains(&TE_PLASMA_EXPLOSION));
    }

    #[test]
    fn test_mine_ignores_its_owner() {
        let mut ctx = make_ctx();
        let owner = spawn_target(&mut ctx, [20.0, 0.0, 0.0], 100);
        ctx.edicts[owner].svflags |= SVF_MONSTER;
        let mine = fire_proximity_mine(&mut ctx, owner, [0.0; 3], [1.0, 0.0, 0.0], 150, 600, 180.0, 100).unwrap();
        proximity_mine_arm(&mut ctx, mine);
        crate::dispatch::call_think(&mut ctx, mine);
        assert!(ctx.edicts[mine].inuse);
    }

    #[test]
    fn test_sp_mine_defaults() {
        let mut ctx = make_ctx();
        let template = g_spawn(&mut ctx).unwrap();
        sp_mine(&mut ctx, template);
        let mine = crate::g_utils::g_find(&ctx, 1, crate::g_utils::FindField::Classname, "mine").unwrap();
        let m = &ctx.edicts[mine];
        assert_eq!((m.dmg, m.radius_dmg, m.dmg_radius), (150, 100, 180.0));
        assert_eq!(m.velocity, [600.0, 0.0, 0.0]);
        assert_eq!(m.health, 10);
        assert_eq!(m.mins, [-2.0, -2.0, -2.0]);
    }
}
