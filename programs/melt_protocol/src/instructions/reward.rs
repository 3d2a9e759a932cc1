use anchor_lang::prelude::*;

use crate::events::Claimed;
use crate::utils::{claim_core, pay_from_vault};
use crate::Claim;

pub fn claim(ctx: Context<Claim>, _round_seq: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let owner = ctx.accounts.owner.key();

    let cfg = &mut ctx.accounts.config;
    let round = &mut ctx.accounts.round;
    let user_round = &mut ctx.accounts.user_round;

    // ledger first, then lamports
    let payout = claim_core(cfg, round, user_round, owner, now)?;

    pay_from_vault(
        &ctx.accounts.vault.to_account_info(),
        &ctx.accounts.owner.to_account_info(),
        payout,
    )?;

    emit!(Claimed {
        owner,
        round_seq: round.seq,
        payout,
    });

    Ok(())
}
