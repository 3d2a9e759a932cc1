use anchor_lang::prelude::*;
use anchor_lang::solana_program::{program::invoke, system_instruction};

use crate::errors::MeltError;
use crate::events::FundingRecorded;
use crate::utils::deposit_core;
use crate::{AdminTopUp, Deposit};

fn transfer_in<'info>(
    from: AccountInfo<'info>,
    vault: AccountInfo<'info>,
    system_program: AccountInfo<'info>,
    amount: u64,
) -> Result<()> {
    let ix = system_instruction::transfer(from.key, vault.key, amount);
    invoke(&ix, &[from, vault, system_program])?;
    Ok(())
}

pub fn deposit(ctx: Context<Deposit>, amount: u64) -> Result<()> {
    let cfg = &mut ctx.accounts.config;
    let vault_balance = deposit_core(cfg, amount)?;

    transfer_in(
        ctx.accounts.funder.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.accounts.system_program.to_account_info(),
        amount,
    )?;

    emit!(FundingRecorded {
        funder: ctx.accounts.funder.key(),
        amount,
        vault_balance,
        fill_reached: cfg.is_fill_threshold_reached(),
    });

    Ok(())
}

pub fn admin_top_up(ctx: Context<AdminTopUp>, amount: u64) -> Result<()> {
    let cfg = &mut ctx.accounts.config;
    require_keys_eq!(cfg.admin, ctx.accounts.admin.key(), MeltError::Unauthorized);

    let vault_balance = deposit_core(cfg, amount)?;

    transfer_in(
        ctx.accounts.admin.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.accounts.system_program.to_account_info(),
        amount,
    )?;

    emit!(FundingRecorded {
        funder: ctx.accounts.admin.key(),
        amount,
        vault_balance,
        fill_reached: cfg.is_fill_threshold_reached(),
    });

    Ok(())
}
