//! Game import interface: functions provided by the engine to the game module.
//!
//! The host installs its implementation once with [`set_gi`]. Until then a
//! silent null import answers every call, so the module can be driven without
//! a server (map tools, tests).

use std::sync::OnceLock;
use oblivion_common::q_shared::{Multicast, Trace, Vec3};

/// Global game import interface.
static GI: OnceLock<Box<dyn GameImport + Send + Sync>> = OnceLock::new();

/// Set the global game import interface. Returns false if one was already installed.
pub fn set_gi(gi: Box<dyn GameImport + Send + Sync>) -> bool {
    GI.set(gi).is_ok()
}

fn gi() -> &'static dyn GameImport {
    GI.get_or_init(default_import).as_ref()
}

#[cfg(not(test))]
fn default_import() -> Box<dyn GameImport + Send + Sync> {
    Box::new(NullImport)
}

#[cfg(test)]
fn default_import() -> Box<dyn GameImport + Send + Sync> {
    Box::new(testing::RecordingImport)
}

// ---- Free functions mirroring `gi.xxx(...)` calls ----

pub fn gi_bprintf(printlevel: i32, msg: &str) { gi().bprintf(printlevel, msg); }
pub fn gi_dprintf(msg: &str) { gi().dprintf(msg); }
pub fn gi_sound(ent_idx: i32, channel: i32, soundindex: i32, volume: f32, attenuation: f32, timeofs: f32) {
    gi().sound(ent_idx, channel, soundindex, volume, attenuation, timeofs);
}
pub fn gi_positioned_sound(origin: &Vec3, ent_idx: i32, channel: i32, soundindex: i32, volume: f32, attenuation: f32, timeofs: f32) {
    gi().positioned_sound(origin, ent_idx, channel, soundindex, volume, attenuation, timeofs);
}
pub fn gi_configstring(num: i32, string: &str) { gi().configstring(num, string); }
pub fn gi_error(msg: &str) { gi().error(msg); }
pub fn gi_modelindex(name: &str) -> i32 { gi().modelindex(name) }
pub fn gi_soundindex(name: &str) -> i32 { gi().soundindex(name) }
pub fn gi_setmodel(ent_idx: i32, name: &str) { gi().setmodel(ent_idx, name); }
pub fn gi_trace(start: &Vec3, mins: &Vec3, maxs: &Vec3, end: &Vec3, passent: i32, contentmask: i32) -> Trace {
    gi().trace(start, mins, maxs, end, passent, contentmask)
}
/// Point trace (no box).
pub fn gi_traceline(start: &Vec3, end: &Vec3, passent: i32, contentmask: i32) -> Trace {
    gi().trace(start, &[0.0; 3], &[0.0; 3], end, passent, contentmask)
}
pub fn gi_pointcontents(point: &Vec3) -> i32 { gi().pointcontents(point) }
pub fn gi_in_pvs(p1: &Vec3, p2: &Vec3) -> bool { gi().in_pvs(p1, p2) }
pub fn gi_linkentity(ent_idx: i32) { gi().linkentity(ent_idx); }
pub fn gi_unlinkentity(ent_idx: i32) { gi().unlinkentity(ent_idx); }
pub fn gi_multicast(origin: &Vec3, to: Multicast) { gi().multicast(origin, to); }
pub fn gi_write_byte(c: i32) { gi().write_byte(c); }
pub fn gi_write_short(c: i32) { gi().write_short(c); }
pub fn gi_write_position(pos: &Vec3) { gi().write_position(pos); }
pub fn gi_write_dir(dir: &Vec3) { gi().write_dir(dir); }
pub fn gi_cvar(var_name: &str, value: &str, flags: i32) -> f32 { gi().cvar(var_name, value, flags) }
pub fn gi_cvar_string(var_name: &str, value: &str) -> String { gi().cvar_string(var_name, value) }

/// Game import interface: functions provided by the engine to the game module.
pub trait GameImport {
    // Printing
    fn bprintf(&self, printlevel: i32, msg: &str);
    fn dprintf(&self, msg: &str);

    // Sound
    fn sound(&self, ent_idx: i32, channel: i32, soundindex: i32, volume: f32, attenuation: f32, timeofs: f32);
    fn positioned_sound(&self, origin: &Vec3, ent_idx: i32, channel: i32, soundindex: i32, volume: f32, attenuation: f32, timeofs: f32);

    // Config
    fn configstring(&self, num: i32, string: &str);
    fn error(&self, msg: &str);

    // Indexing
    fn modelindex(&self, name: &str) -> i32;
    fn soundindex(&self, name: &str) -> i32;
    fn setmodel(&self, ent_idx: i32, name: &str);

    // Collision
    fn trace(&self, start: &Vec3, mins: &Vec3, maxs: &Vec3, end: &Vec3, passent: i32, contentmask: i32) -> Trace;
    fn pointcontents(&self, point: &Vec3) -> i32;
    fn in_pvs(&self, p1: &Vec3, p2: &Vec3) -> bool;

    // Entity linking
    fn linkentity(&self, ent_idx: i32);
    fn unlinkentity(&self, ent_idx: i32);

    // Network messaging
    fn multicast(&self, origin: &Vec3, to: Multicast);
    fn write_byte(&self, c: i32);
    fn write_short(&self, c: i32);
    fn write_position(&self, pos: &Vec3);
    fn write_dir(&self, dir: &Vec3);

    // Cvars
    fn cvar(&self, var_name: &str, value: &str, flags: i32) -> f32;
    /// String value of a cvar. Defaults to the supplied default.
    fn cvar_string(&self, _var_name: &str, value: &str) -> String {
        value.to_string()
    }
}

/// Import used before the host installs its own: nothing hits, nothing is
/// indexed, output goes nowhere.
pub struct NullImport;

impl GameImport for NullImport {
    fn bprintf(&self, _printlevel: i32, _msg: &str) {}
    fn dprintf(&self, _msg: &str) {}
    fn sound(&self, _ent_idx: i32, _channel: i32, _soundindex: i32, _volume: f32, _attenuation: f32, _timeofs: f32) {}
    fn positioned_sound(&self, _origin: &Vec3, _ent_idx: i32, _channel: i32, _soundindex: i32, _volume: f32, _attenuation: f32, _timeofs: f32) {}
    fn configstring(&self, _num: i32, _string: &str) {}
    fn error(&self, _msg: &str) {}
    fn modelindex(&self, _name: &str) -> i32 { 0 }
    fn soundindex(&self, _name: &str) -> i32 { 0 }
    fn setmodel(&self, _ent_idx: i32, _name: &str) {}
    fn trace(&self, _start: &Vec3, _mins: &Vec3, _maxs: &Vec3, end: &Vec3, _passent: i32, _contentmask: i32) -> Trace {
        Trace { endpos: *end, ..Trace::default() }
    }
    fn pointcontents(&self, _point: &Vec3) -> i32 { 0 }
    fn in_pvs(&self, _p1: &Vec3, _p2: &Vec3) -> bool { true }
    fn linkentity(&self, _ent_idx: i32) {}
    fn unlinkentity(&self, _ent_idx: i32) {}
    fn multicast(&self, _origin: &Vec3, _to: Multicast) {}
    fn write_byte(&self, _c: i32) {}
    fn write_short(&self, _c: i32) {}
    fn write_position(&self, _pos: &Vec3) {}
    fn write_dir(&self, _dir: &Vec3) {}
    fn cvar(&self, _var_name: &str, value: &str, _flags: i32) -> f32 {
        value.parse().unwrap_or(0.0)
    }
}
