use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::MeltError;
use crate::events::{MeltInitialized, ParamsUpdated, RoundRecycled, RoundScheduled, VaultWithdrawn};
use crate::utils::{
    apply_params, init_planned_round, pay_from_vault, recycle_core, schedule_core, validate_params,
    withdraw_core, InitMeltParams, SetParamsArgs,
};
use crate::{AdminRecycleRound, AdminSetParams, AdminSetSchedule, AdminWithdraw, InitMelt};

pub fn init_melt(ctx: Context<InitMelt>, params: InitMeltParams) -> Result<()> {
    let round_window_sec = if params.round_window_sec == 0 {
        DEFAULT_ROUND_WINDOW_SEC
    } else {
        params.round_window_sec
    };
    validate_params(params.vault_cap, params.rollover_bps, round_window_sec)?;

    let now = Clock::get()?.unix_timestamp;
    let admin = ctx.accounts.admin.key();
    let vault_key = ctx.accounts.vault.key();

    let vault = &mut ctx.accounts.vault;
    vault.bump = ctx.bumps.vault;

    let cfg = &mut ctx.accounts.config;
    cfg.admin = admin;
    cfg.contribution_mint = ctx.accounts.contribution_mint.key();
    cfg.vault = vault_key;

    cfg.vault_balance = 0;
    cfg.vault_cap = params.vault_cap;
    cfg.rollover_bps = params.rollover_bps;
    cfg.min_contribution = params.min_contribution;
    cfg.round_window_sec = round_window_sec;

    cfg.next_round_seq = INITIAL_ROUND_SEQ
        .checked_add(1)
        .ok_or(MeltError::MathOverflow)?;
    cfg.active_round_seq = INITIAL_ROUND_SEQ;
    cfg.active_round_open = false;
    cfg.reserved_balance = 0;

    cfg.test_mode = params.test_mode;
    cfg.version = ACCOUNT_VERSION;
    cfg.bump = ctx.bumps.config;
    cfg.vault_bump = ctx.bumps.vault;

    init_planned_round(
        &mut ctx.accounts.round,
        INITIAL_ROUND_SEQ,
        ctx.bumps.round,
        vault_key,
        now,
    );

    emit!(MeltInitialized {
        admin,
        contribution_mint: cfg.contribution_mint,
        vault_cap: cfg.vault_cap,
        rollover_bps: cfg.rollover_bps,
        test_mode: cfg.test_mode,
    });

    Ok(())
}

pub fn admin_set_params(ctx: Context<AdminSetParams>, args: SetParamsArgs) -> Result<()> {
    let cfg = &mut ctx.accounts.config;
    require_keys_eq!(cfg.admin, ctx.accounts.admin.key(), MeltError::Unauthorized);

    apply_params(cfg, &args)?;

    emit!(ParamsUpdated {
        vault_cap: cfg.vault_cap,
        rollover_bps: cfg.rollover_bps,
        min_contribution: cfg.min_contribution,
        round_window_sec: cfg.round_window_sec,
    });

    Ok(())
}

pub fn admin_set_schedule(
    ctx: Context<AdminSetSchedule>,
    _round_seq: u64,
    start_ts: i64,
    end_ts: i64,
) -> Result<()> {
    let cfg = &ctx.accounts.config;
    require_keys_eq!(cfg.admin, ctx.accounts.admin.key(), MeltError::Unauthorized);

    let now = Clock::get()?.unix_timestamp;
    let round = &mut ctx.accounts.round;
    schedule_core(cfg, round, start_ts, end_ts, now)?;

    emit!(RoundScheduled {
        seq: round.seq,
        start_ts,
        end_ts,
    });

    Ok(())
}

pub fn admin_withdraw(ctx: Context<AdminWithdraw>, amount: u64) -> Result<()> {
    let cfg = &mut ctx.accounts.config;
    require_keys_eq!(cfg.admin, ctx.accounts.admin.key(), MeltError::Unauthorized);

    let vault_balance = withdraw_core(cfg, amount)?;

    pay_from_vault(
        &ctx.accounts.vault.to_account_info(),
        &ctx.accounts.admin.to_account_info(),
        amount,
    )?;

    emit!(VaultWithdrawn {
        amount,
        vault_balance,
    });

    Ok(())
}

pub fn admin_recycle_round(ctx: Context<AdminRecycleRound>, _round_seq: u64) -> Result<()> {
    let cfg = &mut ctx.accounts.config;
    require_keys_eq!(cfg.admin, ctx.accounts.admin.key(), MeltError::Unauthorized);

    let round = &mut ctx.accounts.round;
    let amount = recycle_core(cfg, round)?;

    emit!(RoundRecycled {
        seq: round.seq,
        amount,
        vault_balance: cfg.vault_balance,
    });

    Ok(())
}
