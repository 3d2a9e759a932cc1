use anchor_lang::prelude::*;
use anchor_lang::Discriminator;

use crate::{
    constants::*,
    errors::MeltError,
    state::{MeltConfig, MeltRound, MeltUserRound, RoundStatus},
    utils::init_planned_round,
};

// Unversioned layouts written by the first deployment. Same discriminators
// as the current accounts, told apart by body length.

/// Config before the pool fields were added.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, InitSpace)]
pub struct MeltConfigV0 {
    pub admin: Pubkey,
    pub mind_mint: Pubkey,
    pub vault: Pubkey,
    pub vault_cap_lamports: u64,
    pub rollover_bps: u16,
    pub burn_min: u64,
    pub round_window_sec: u64,
    pub test_mode: bool,
    pub round_seq: u64,
    pub bump_config: u8,
    pub bump_vault: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, InitSpace)]
pub struct MeltConfigV1 {
    pub admin: Pubkey,
    pub mind_mint: Pubkey,
    pub vault: Pubkey,
    pub vault_cap_lamports: u64,
    pub rollover_bps: u16,
    pub burn_min: u64,
    pub round_window_sec: u64,
    pub test_mode: bool,
    /// Seq of the next round to start.
    pub round_seq: u64,
    pub vial_lamports: u64,
    pub bonus_pool_lamports: u64,
    pub active_round_seq: u64,
    pub active_round_active: bool,
    pub pending_window_sec: u64,
    pub bump_config: u8,
    pub bump_vault: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, InitSpace)]
pub struct MeltRoundV1 {
    pub seq: u64,
    pub start_ts: i64,
    pub end_ts: i64,
    pub v_round: u64,
    pub v_pay: u64,
    pub total_burn: u64,
    pub status: RoundStatus,
    pub bump: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, InitSpace)]
pub struct MeltUserRoundV1 {
    pub user: Pubkey,
    pub round: Pubkey,
    pub burned: u64,
    pub claimed: bool,
    pub bump: u8,
}

/// Splits `data` into its body after checking the discriminator, and fails
/// with `AlreadyMigrated` when the body already has the current length.
fn legacy_body<'a>(
    data: &'a [u8],
    discriminator: &[u8],
    current_len: usize,
    legacy_lens: &[usize],
) -> Result<&'a [u8]> {
    require!(data.len() >= DISCRIMINATOR_LEN, MeltError::UnsupportedLayout);
    require!(
        &data[..DISCRIMINATOR_LEN] == discriminator,
        MeltError::UnsupportedLayout
    );

    let body = &data[DISCRIMINATOR_LEN..];
    if body.len() == current_len {
        return err!(MeltError::AlreadyMigrated);
    }
    require!(legacy_lens.contains(&body.len()), MeltError::UnsupportedLayout);
    Ok(body)
}

/// Current-layout account bytes (discriminator + body).
pub fn encode_account<T: AnchorSerialize>(discriminator: &[u8], value: &T) -> Result<Vec<u8>> {
    let mut out = discriminator.to_vec();
    value
        .serialize(&mut out)
        .map_err(|_| error!(MeltError::UnsupportedLayout))?;
    Ok(out)
}

/// `custody` is the vault's lamports above rent. The legacy layout does not
/// track what started rounds still owe, so it is whatever custody holds beyond
/// the unlocked pool.
pub fn upgrade_config(data: &[u8], custody: u64) -> Result<MeltConfig> {
    let body = legacy_body(
        data,
        MeltConfig::DISCRIMINATOR,
        MeltConfig::INIT_SPACE,
        &[MeltConfigV1::INIT_SPACE, MeltConfigV0::INIT_SPACE],
    )?;
    let old = if body.len() == MeltConfigV0::INIT_SPACE {
        let v0 = MeltConfigV0::try_from_slice(body)
            .map_err(|_| error!(MeltError::UnsupportedLayout))?;
        MeltConfigV1 {
            admin: v0.admin,
            mind_mint: v0.mind_mint,
            vault: v0.vault,
            vault_cap_lamports: v0.vault_cap_lamports,
            rollover_bps: v0.rollover_bps,
            burn_min: v0.burn_min,
            round_window_sec: v0.round_window_sec,
            test_mode: v0.test_mode,
            round_seq: v0.round_seq,
            vial_lamports: 0,
            bonus_pool_lamports: 0,
            active_round_seq: 0,
            active_round_active: false,
            pending_window_sec: 0,
            bump_config: v0.bump_config,
            bump_vault: v0.bump_vault,
        }
    } else {
        MeltConfigV1::try_from_slice(body).map_err(|_| error!(MeltError::UnsupportedLayout))?
    };

    let vault_balance = old
        .vial_lamports
        .checked_add(old.bonus_pool_lamports)
        .ok_or(MeltError::MathOverflow)?;
    let next_round_seq = old.round_seq.checked_add(1).ok_or(MeltError::MathOverflow)?;
    let reserved_balance = custody.saturating_sub(vault_balance);

    Ok(MeltConfig {
        admin: old.admin,
        contribution_mint: old.mind_mint,
        vault: old.vault,
        vault_balance,
        vault_cap: old.vault_cap_lamports,
        rollover_bps: old.rollover_bps,
        min_contribution: old.burn_min,
        round_window_sec: old.round_window_sec,
        next_round_seq,
        active_round_seq: old.active_round_seq,
        active_round_open: old.active_round_active,
        reserved_balance,
        test_mode: old.test_mode,
        version: ACCOUNT_VERSION,
        bump: old.bump_config,
        vault_bump: old.bump_vault,
    })
}

/// `seq` and `bump` come from the PDA being migrated. Legacy rounds stay
/// zeroed until their first start, so a Planned one is rebuilt from them.
pub fn upgrade_round(
    data: &[u8],
    seq: u64,
    bump: u8,
    vault: Pubkey,
    now: i64,
) -> Result<MeltRound> {
    let body = legacy_body(
        data,
        MeltRound::DISCRIMINATOR,
        MeltRound::INIT_SPACE,
        &[MeltRoundV1::INIT_SPACE],
    )?;
    let old =
        MeltRoundV1::try_from_slice(body).map_err(|_| error!(MeltError::UnsupportedLayout))?;

    if old.status == RoundStatus::Planned {
        require!(
            old.v_round == 0 && old.v_pay == 0 && old.total_burn == 0,
            MeltError::InvariantViolation
        );
        let mut round = MeltRound {
            seq,
            bump,
            status: RoundStatus::Planned,
            vault,
            scheduled: false,
            start_ts: 0,
            end_ts: 0,
            pot: 0,
            locked_payout_amount: 0,
            rollover_amount: 0,
            total_contribution: 0,
            contributor_count: 0,
            claimed_total: 0,
            claim_count: 0,
            created_ts: 0,
            started_ts: 0,
            finalized_ts: 0,
            recycled: false,
            version: 0,
        };
        init_planned_round(&mut round, seq, bump, vault, now);
        return Ok(round);
    }

    require!(old.seq == seq, MeltError::InvariantViolation);
    require!(old.bump == bump, MeltError::InvariantViolation);
    require!(old.v_pay <= old.v_round, MeltError::InvariantViolation);
    let rollover_amount = old
        .v_round
        .checked_sub(old.v_pay)
        .ok_or(MeltError::MathOverflow)?;
    Ok(MeltRound {
        seq,
        bump,
        status: old.status,
        vault,
        scheduled: false,
        start_ts: old.start_ts,
        end_ts: old.end_ts,
        pot: old.v_round,
        locked_payout_amount: old.v_pay,
        rollover_amount,
        total_contribution: old.total_burn,
        contributor_count: 0,
        claimed_total: 0,
        claim_count: 0,
        created_ts: 0,
        started_ts: old.start_ts,
        finalized_ts: if old.status == RoundStatus::Finalized {
            old.end_ts
        } else {
            0
        },
        recycled: false,
        version: ACCOUNT_VERSION,
    })
}

pub fn upgrade_user_round(data: &[u8], round_seq: u64) -> Result<MeltUserRound> {
    let body = legacy_body(
        data,
        MeltUserRound::DISCRIMINATOR,
        MeltUserRound::INIT_SPACE,
        &[MeltUserRoundV1::INIT_SPACE],
    )?;
    let old = MeltUserRoundV1::try_from_slice(body)
        .map_err(|_| error!(MeltError::UnsupportedLayout))?;

    Ok(MeltUserRound {
        owner: old.user,
        round: old.round,
        round_seq,
        contributed: old.burned,
        claimed: old.claimed,
        payout: 0,
        first_contribution_ts: 0,
        claimed_ts: 0,
        bump: old.bump,
        version: ACCOUNT_VERSION,
    })
}
