use anchor_lang::prelude::*;

use crate::events::{RoundFinalized, RoundStarted};
use crate::state::{MeltConfig, MeltRound};
use crate::utils::{
    authorize_forced_start, finalize_core, plan_keeper_action, start_core, KeeperPlan,
};
use crate::{AdminStartRound, FinalizeRound, PlanNextAction, StartRound};

fn emit_started(cfg: &MeltConfig, round: &MeltRound) {
    emit!(RoundStarted {
        seq: round.seq,
        start_ts: round.start_ts,
        end_ts: round.end_ts,
        pot: round.pot,
        locked_payout_amount: round.locked_payout_amount,
        rollover_amount: round.rollover_amount,
        next_round_seq: cfg.next_round_seq,
    });
}

/// Permissionless once the vault reaches the fill threshold.
pub fn start_round(ctx: Context<StartRound>, _round_seq: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let next_bump = ctx.bumps.next_round;

    let cfg = &mut ctx.accounts.config;
    let round = &mut ctx.accounts.round;
    start_core(cfg, round, &mut ctx.accounts.next_round, next_bump, now, true)?;

    emit_started(cfg, round);
    Ok(())
}

/// Test-mode start that skips the fill threshold.
pub fn admin_start_round(ctx: Context<AdminStartRound>, _round_seq: u64) -> Result<()> {
    let cfg = &mut ctx.accounts.config;
    authorize_forced_start(cfg, ctx.accounts.admin.key())?;

    let now = Clock::get()?.unix_timestamp;
    let next_bump = ctx.bumps.next_round;

    let round = &mut ctx.accounts.round;
    start_core(cfg, round, &mut ctx.accounts.next_round, next_bump, now, false)?;

    emit_started(cfg, round);
    Ok(())
}

pub fn finalize_round(ctx: Context<FinalizeRound>, _round_seq: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;

    let cfg = &mut ctx.accounts.config;
    let round = &mut ctx.accounts.round;
    finalize_core(cfg, round, now)?;

    emit!(RoundFinalized {
        seq: round.seq,
        total_contribution: round.total_contribution,
        locked_payout_amount: round.locked_payout_amount,
        rollover_amount: round.rollover_amount,
    });

    Ok(())
}

pub fn plan_next_action(ctx: Context<PlanNextAction>) -> Result<KeeperPlan> {
    let now = Clock::get()?.unix_timestamp;

    let plan = plan_keeper_action(
        &ctx.accounts.config,
        &ctx.accounts.planned_round,
        &ctx.accounts.active_round,
        now,
    );

    msg!(
        "keeper plan: {:?} round={} ready_at={} vault={}/{}",
        plan.action,
        plan.round_seq,
        plan.ready_at,
        plan.vault_balance,
        plan.vault_cap
    );

    Ok(plan)
}
