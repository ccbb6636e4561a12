// game.rs: server-visible entity flags shared with the host

pub use oblivion_common::q_shared::Multicast;

// edict->svflags
pub const SVF_NOCLIENT: i32 = 0x00000001;
pub const SVF_DEADMONSTER: i32 = 0x00000002;
pub const SVF_MONSTER: i32 = 0x00000004;
pub const SVF_PROJECTILE: i32 = 0x00000008;

// edict->solid values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum Solid {
    #[default]
    Not = 0,
    Trigger,
    Bbox,
    Bsp,
}
