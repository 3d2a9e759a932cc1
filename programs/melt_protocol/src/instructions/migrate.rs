use anchor_lang::prelude::*;
use anchor_lang::solana_program::{program::invoke, system_instruction};
use anchor_lang::Discriminator;

use crate::constants::*;
use crate::errors::MeltError;
use crate::events::AccountMigrated;
use crate::legacy::{encode_account, upgrade_config, upgrade_round, upgrade_user_round};
use crate::state::{MeltConfig, MeltRound, MeltUserRound};
use crate::utils::init_planned_round;
use crate::{MigrateConfig, MigrateRound, MigrateUserRound};

/// Admin key stored at offset 8 (after the discriminator) in every config layout.
fn stored_admin(config_info: &AccountInfo) -> Result<Pubkey> {
    let data = config_info.try_borrow_data()?;
    if data.len() < DISCRIMINATOR_LEN + 32 {
        return Err(ProgramError::InvalidAccountData.into());
    }
    let admin: [u8; 32] = data[DISCRIMINATOR_LEN..DISCRIMINATOR_LEN + 32]
        .try_into()
        .map_err(|_| error!(MeltError::UnsupportedLayout))?;
    Ok(Pubkey::new_from_array(admin))
}

/// Resizes `target` to `bytes.len()`, funding rent from `payer`, and overwrites it.
fn rewrite_account<'info>(
    target: &AccountInfo<'info>,
    payer: &AccountInfo<'info>,
    system_program: &AccountInfo<'info>,
    bytes: &[u8],
) -> Result<()> {
    let new_size = bytes.len();
    let rent = Rent::get()?;
    let lamports_diff = rent.minimum_balance(new_size).saturating_sub(target.lamports());

    if lamports_diff > 0 {
        invoke(
            &system_instruction::transfer(payer.key, target.key, lamports_diff),
            &[payer.clone(), target.clone(), system_program.clone()],
        )?;
    }

    target.realloc(new_size, false)?;
    target.try_borrow_mut_data()?.copy_from_slice(bytes);

    msg!("Account {} migrated to size: {}", target.key, new_size);
    Ok(())
}

pub fn admin_migrate_config(ctx: Context<MigrateConfig>, planned_seq: u64) -> Result<()> {
    let config_info = ctx.accounts.config.to_account_info();
    let admin = stored_admin(&config_info)?;
    require_keys_eq!(admin, ctx.accounts.admin.key(), MeltError::Unauthorized);

    let vault_info = ctx.accounts.vault.to_account_info();
    let custody = vault_info
        .lamports()
        .saturating_sub(Rent::get()?.minimum_balance(vault_info.data_len()));

    let cfg = {
        let data = config_info.try_borrow_data()?;
        upgrade_config(&data, custody)?
    };
    require_keys_eq!(cfg.vault, vault_info.key(), MeltError::InvariantViolation);
    require!(planned_seq == cfg.planned_round_seq(), MeltError::InvalidParams);

    let planned = &mut ctx.accounts.planned_round;
    if planned.version == 0 {
        let now = Clock::get()?.unix_timestamp;
        init_planned_round(planned, planned_seq, ctx.bumps.planned_round, cfg.vault, now);
    } else {
        require!(planned.seq == planned_seq, MeltError::InvariantViolation);
    }

    let bytes = encode_account(MeltConfig::DISCRIMINATOR, &cfg)?;
    rewrite_account(
        &config_info,
        &ctx.accounts.admin.to_account_info(),
        &ctx.accounts.system_program.to_account_info(),
        &bytes,
    )?;

    emit!(AccountMigrated {
        account: config_info.key(),
        from_version: LEGACY_ACCOUNT_VERSION,
        to_version: ACCOUNT_VERSION,
    });

    Ok(())
}

pub fn migrate_round(ctx: Context<MigrateRound>, round_seq: u64) -> Result<()> {
    let admin = stored_admin(&ctx.accounts.config.to_account_info())?;
    require_keys_eq!(admin, ctx.accounts.admin.key(), MeltError::Unauthorized);

    let now = Clock::get()?.unix_timestamp;
    let round_info = ctx.accounts.round.to_account_info();
    let round = {
        let data = round_info.try_borrow_data()?;
        upgrade_round(&data, round_seq, ctx.bumps.round, ctx.accounts.vault.key(), now)?
    };

    let bytes = encode_account(MeltRound::DISCRIMINATOR, &round)?;
    rewrite_account(
        &round_info,
        &ctx.accounts.admin.to_account_info(),
        &ctx.accounts.system_program.to_account_info(),
        &bytes,
    )?;

    emit!(AccountMigrated {
        account: round_info.key(),
        from_version: LEGACY_ACCOUNT_VERSION,
        to_version: ACCOUNT_VERSION,
    });

    Ok(())
}

pub fn migrate_user_round(ctx: Context<MigrateUserRound>, _round_seq: u64) -> Result<()> {
    let admin = stored_admin(&ctx.accounts.config.to_account_info())?;
    require_keys_eq!(admin, ctx.accounts.admin.key(), MeltError::Unauthorized);

    let user_info = ctx.accounts.user_round.to_account_info();
    let record = {
        let data = user_info.try_borrow_data()?;
        upgrade_user_round(&data, ctx.accounts.round.seq)?
    };
    require_keys_eq!(record.owner, ctx.accounts.owner.key(), MeltError::InvariantViolation);
    require_keys_eq!(record.round, ctx.accounts.round.key(), MeltError::InvariantViolation);
    require!(record.bump == ctx.bumps.user_round, MeltError::InvariantViolation);

    let bytes = encode_account(MeltUserRound::DISCRIMINATOR, &record)?;
    rewrite_account(
        &user_info,
        &ctx.accounts.admin.to_account_info(),
        &ctx.accounts.system_program.to_account_info(),
        &bytes,
    )?;

    emit!(AccountMigrated {
        account: user_info.key(),
        from_version: LEGACY_ACCOUNT_VERSION,
        to_version: ACCOUNT_VERSION,
    });

    Ok(())
}
