use anchor_lang::prelude::*;
use anchor_spl::token::{self, Burn};

use crate::events::Contributed;
use crate::utils::contribute_core;
use crate::Contribute;

pub fn contribute(ctx: Context<Contribute>, _round_seq: u64, amount: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let owner = ctx.accounts.owner.key();
    let round_key = ctx.accounts.round.key();
    let bump = ctx.bumps.user_round;

    let cfg = &ctx.accounts.config;
    let round = &mut ctx.accounts.round;
    let user_round = &mut ctx.accounts.user_round;

    contribute_core(cfg, round, round_key, user_round, bump, owner, amount, now)?;

    // ledger first, then burn
    token::burn(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Burn {
                mint: ctx.accounts.contribution_mint.to_account_info(),
                from: ctx.accounts.owner_token.to_account_info(),
                authority: ctx.accounts.owner.to_account_info(),
            },
        ),
        amount,
    )?;

    emit!(Contributed {
        owner,
        round_seq: round.seq,
        amount,
        contributed: user_round.contributed,
        total_contribution: round.total_contribution,
    });

    Ok(())
}
