// m_move.rs: monster movement

use crate::g_local::*;
use crate::game_import::*;

pub const STEPSIZE: f32 = 18.0;

const DI_NODIR: f32 = -1.0;

/// Trace from the monster's origin to `neworg` with its bbox. Returns the
/// trace and the entity's own index for passent.
fn box_trace(ctx: &GameContext, ent_idx: usize, start: &Vec3, end: &Vec3) -> Trace {
    let ent = &ctx.edicts[ent_idx];
    gi_trace(start, &ent.mins, &ent.maxs, end, ent_idx as i32, MASK_MONSTERSOLID)
}

/// Called by monster program code. The move will be adjusted for slopes and
/// stairs, but if the move isn't possible, no move is done and false is
/// returned.
pub fn sv_movestep(ctx: &mut GameContext, ent_idx: usize, mov: Vec3, relink: bool) -> bool {
    let (origin, flags, enemy) = {
        let ent = &ctx.edicts[ent_idx];
        (ent.s.origin, ent.flags, ent.enemy)
    };

    // flying monsters don't step up
    if flags.intersects(FL_FLY | FL_SWIM) {
        // try one move with vertical motion, then one without
        for i in 0..2 {
            let mut neworg = vector_add(&ctx.edicts[ent_idx].s.origin, &mov);

            if i == 0 {
                if let Some(enemy_idx) = ctx.ent(enemy) {
                    let goal_idx = match ctx.ent(ctx.edicts[ent_idx].goalentity) {
                        Some(g) => g,
                        None => {
                            ctx.edicts[ent_idx].goalentity = enemy;
                            enemy_idx
                        }
                    };
                    let dz = ctx.edicts[ent_idx].s.origin[2] - ctx.edicts[goal_idx].s.origin[2];
                    if ctx.is_client(goal_idx) {
                        if dz > 40.0 {
                            neworg[2] -= 8.0;
                        }
                        if dz < 30.0 {
                            neworg[2] += 8.0;
                        }
                    } else if dz > 8.0 {
                        neworg[2] -= 8.0;
                    } else if dz > 0.0 {
                        neworg[2] -= dz;
                    } else if dz < -8.0 {
                        neworg[2] += 8.0;
                    } else {
                        neworg[2] += dz;
                    }
                }
            }

            let start = ctx.edicts[ent_idx].s.origin;
            let trace = box_trace(ctx, ent_idx, &start, &neworg);

            // fliers don't enter water voluntarily
            if flags.intersects(FL_FLY) {
                let test = [
                    trace.endpos[0],
                    trace.endpos[1],
                    trace.endpos[2] + ctx.edicts[ent_idx].mins[2] + 1.0,
                ];
                if gi_pointcontents(&test) & MASK_WATER != 0 {
                    return false;
                }
            }

            if trace.fraction == 1.0 {
                ctx.edicts[ent_idx].s.origin = trace.endpos;
                if relink {
                    gi_linkentity(ent_idx as i32);
                }
                return true;
            }

            if ctx.ent(enemy).is_none() {
                break;
            }
        }
        return false;
    }

    // push down from a step height above the wished position
    let stepsize = if ctx.edicts[ent_idx].monsterinfo.aiflags.intersects(AI_NOSTEP) {
        1.0
    } else {
        STEPSIZE
    };

    let mut neworg = vector_add(&origin, &mov);
    neworg[2] += stepsize;
    let mut end = neworg;
    end[2] -= stepsize * 2.0;

    let mut trace = box_trace(ctx, ent_idx, &neworg, &end);
    if trace.allsolid {
        return false;
    }

    if trace.startsolid {
        neworg[2] -= stepsize;
        trace = box_trace(ctx, ent_idx, &neworg, &end);
        if trace.allsolid || trace.startsolid {
            return false;
        }
    }

    if trace.fraction == 1.0 {
        // if monster had the ground pulled out, go ahead and fall
        if flags.intersects(FL_PARTIALGROUND) {
            let ent = &mut ctx.edicts[ent_idx];
            ent.s.origin = vector_add(&ent.s.origin, &mov);
            ent.groundentity = -1;
            if relink {
                gi_linkentity(ent_idx as i32);
            }
            return true;
        }
        // walked off an edge
        return false;
    }

    let ent = &mut ctx.edicts[ent_idx];
    ent.s.origin = trace.endpos;
    ent.groundentity = trace.ent_index.max(0);
    ent.flags.remove(FL_PARTIALGROUND);
    if relink {
        gi_linkentity(ent_idx as i32);
    }
    true
}

/// Turns toward `ideal_yaw` by at most `yaw_speed` degrees.
pub fn m_change_yaw(ctx: &mut GameContext, ent_idx: usize) {
    let ent = &mut ctx.edicts[ent_idx];
    let current = anglemod(ent.s.angles[YAW]);
    let ideal = ent.ideal_yaw;

    if current == ideal {
        return;
    }

    let mut mov = ideal - current;
    let speed = ent.yaw_speed.max(0.0);
    if ideal > current {
        if mov >= 180.0 {
            mov -= 360.0;
        }
    } else if mov <= -180.0 {
        mov += 360.0;
    }

    let mov = mov.clamp(-speed, speed);
    ent.s.angles[YAW] = anglemod(current + mov);
}

/// Turns to the movement direction, and walks the current distance if
/// facing it.
pub fn sv_step_direction(ctx: &mut GameContext, ent_idx: usize, yaw: f32, dist: f32) -> bool {
    ctx.edicts[ent_idx].ideal_yaw = yaw;
    m_change_yaw(ctx, ent_idx);

    let yaw_rad = yaw.to_radians();
    let mov: Vec3 = [yaw_rad.cos() * dist, yaw_rad.sin() * dist, 0.0];
    let oldorigin = ctx.edicts[ent_idx].s.origin;

    let moved = sv_movestep(ctx, ent_idx, mov, false);
    if moved {
        let ent = &mut ctx.edicts[ent_idx];
        let delta = ent.s.angles[YAW] - ent.ideal_yaw;
        if delta > 45.0 && delta < 315.0 {
            // not turned far enough, so don't take the step
            ent.s.origin = oldorigin;
        }
    }
    gi_linkentity(ent_idx as i32);
    moved
}

/// Picks a new direction toward `enemy_idx` when the direct one is blocked.
pub fn sv_new_chase_dir(ctx: &mut GameContext, actor_idx: usize, enemy_idx: usize, dist: f32) {
    let olddir = anglemod(((ctx.edicts[actor_idx].ideal_yaw / 45.0) as i32 as f32) * 45.0);
    let turnaround = anglemod(olddir - 180.0);

    let deltax = ctx.edicts[enemy_idx].s.origin[0] - ctx.edicts[actor_idx].s.origin[0];
    let deltay = ctx.edicts[enemy_idx].s.origin[1] - ctx.edicts[actor_idx].s.origin[1];

    let mut d = [0.0_f32; 3];
    d[1] = if deltax > 10.0 {
        0.0
    } else if deltax < -10.0 {
        180.0
    } else {
        DI_NODIR
    };
    d[2] = if deltay < -10.0 {
        270.0
    } else if deltay > 10.0 {
        90.0
    } else {
        DI_NODIR
    };

    // try direct route
    if d[1] != DI_NODIR && d[2] != DI_NODIR {
        let tdir = if d[1] == 0.0 {
            if d[2] == 90.0 { 45.0 } else { 315.0 }
        } else if d[2] == 90.0 {
            135.0
        } else {
            215.0
        };
        if tdir != turnaround && sv_step_direction(ctx, actor_idx, tdir, dist) {
            return;
        }
    }

    // try other directions
    if (ctx.rand_int() & 3) & 1 != 0 || deltay.abs() > deltax.abs() {
        d.swap(1, 2);
    }

    if d[1] != DI_NODIR && d[1] != turnaround && sv_step_direction(ctx, actor_idx, d[1], dist) {
        return;
    }
    if d[2] != DI_NODIR && d[2] != turnaround && sv_step_direction(ctx, actor_idx, d[2], dist) {
        return;
    }

    // there is no direct path to the player, so pick another direction
    if sv_step_direction(ctx, actor_idx, olddir, dist) {
        return;
    }

    let clockwise = ctx.rand_int() & 1 != 0;
    for step in 0..8 {
        let tdir = if clockwise { step as f32 * 45.0 } else { 315.0 - step as f32 * 45.0 };
        if tdir != turnaround && sv_step_direction(ctx, actor_idx, tdir, dist) {
            return;
        }
    }

    if sv_step_direction(ctx, actor_idx, turnaround, dist) {
        return;
    }

    // can't move
    ctx.edicts[actor_idx].ideal_yaw = olddir;
}

/// True when the goal's box is within `dist` of the entity's box.
pub fn sv_close_enough(ctx: &GameContext, ent_idx: usize, goal_idx: usize, dist: f32) -> bool {
    let ent = &ctx.edicts[ent_idx];
    let goal = &ctx.edicts[goal_idx];
    (0..3).all(|i| goal.absmin[i] <= ent.absmax[i] + dist && goal.absmax[i] >= ent.absmin[i] - dist)
}

/// Steps toward `goalentity`, bumping around obstacles.
pub fn m_move_to_goal(ctx: &mut GameContext, ent_idx: usize, dist: f32) {
    let (goal, enemy, flags, groundentity, ideal_yaw) = {
        let ent = &ctx.edicts[ent_idx];
        (ent.goalentity, ent.enemy, ent.flags, ent.groundentity, ent.ideal_yaw)
    };

    if groundentity < 0 && !flags.intersects(FL_FLY | FL_SWIM) {
        return;
    }

    // if the next step hits the enemy, return immediately
    if let Some(enemy_idx) = ctx.ent(enemy) {
        if sv_close_enough(ctx, ent_idx, enemy_idx, dist) {
            return;
        }
    }

    let Some(goal_idx) = ctx.ent(goal) else {
        return;
    };

    // bump around...
    if (ctx.rand_int() & 3) == 1 || !sv_step_direction(ctx, ent_idx, ideal_yaw, dist) {
        if ctx.edicts[ent_idx].inuse {
            sv_new_chase_dir(ctx, ent_idx, goal_idx, dist);
        }
    }
}

/// Moves the entity `dist` units along `yaw`.
pub fn m_walkmove(ctx: &mut GameContext, ent_idx: usize, yaw: f32, dist: f32) -> bool {
    let ent = &ctx.edicts[ent_idx];
    if ent.groundentity < 0 && !ent.flags.intersects(FL_FLY | FL_SWIM) {
        return false;
    }

    let yaw_rad = yaw.to_radians();
    let mov: Vec3 = [yaw_rad.cos() * dist, yaw_rad.sin() * dist, 0.0];
    sv_movestep(ctx, ent_idx, mov, true)
}

/// Drops a walking monster to the floor below it, at most 256 units.
pub fn m_droptofloor(ctx: &mut GameContext, ent_idx: usize) {
    let origin = ctx.edicts[ent_idx].s.origin;
    let start = [origin[0], origin[1], origin[2] + 1.0];
    let end = [origin[0], origin[1], origin[2] - 256.0];

    let trace = box_trace(ctx, ent_idx, &start, &end);
    if trace.fraction == 1.0 || trace.allsolid {
        return;
    }

    let ent = &mut ctx.edicts[ent_idx];
    ent.s.origin = trace.endpos;
    ent.groundentity = trace.ent_index.max(0);
    gi_linkentity(ent_idx as i32);
}
