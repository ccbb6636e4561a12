#![allow(clippy::too_many_arguments, clippy::float_cmp, clippy::needless_range_loop)]
// Oblivion game module: monsters, weapons and movers for the Oblivion mission pack

pub mod dispatch;
pub mod game_import;
pub mod game;
pub mod g_local;
pub mod g_log;
pub mod g_utils;
pub mod g_combat;
pub mod g_weapon;
pub mod g_ai;
pub mod m_move;
pub mod g_monster;
pub mod g_misc;
pub mod g_main;
pub mod g_spawn;
pub mod g_oblivion_monster;
pub mod g_deatomizer;
pub mod g_rtrain;
pub mod m_cyborg;
pub mod m_spider;
pub mod m_kigrax;
