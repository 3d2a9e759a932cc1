// programs/melt_protocol/src/contexts.rs

use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::INITIAL_ROUND_SEQ;
use crate::state::{MeltConfig, MeltRound, MeltUserRound, MeltVault};

#[derive(Accounts)]
pub struct InitMelt<'info> {
    #[account(
        init,
        payer = admin,
        space = 8 + MeltConfig::INIT_SPACE,
        seeds = [crate::CONFIG_SEED],
        bump
    )]
    pub config: Account<'info, MeltConfig>,

    /// Lamport custody for the pool. Program-owned so payouts can debit it directly.
    #[account(
        init,
        payer = admin,
        space = 8 + MeltVault::INIT_SPACE,
        seeds = [crate::VAULT_SEED],
        bump
    )]
    pub vault: Account<'info, MeltVault>,

    #[account(
        init,
        payer = admin,
        space = 8 + MeltRound::INIT_SPACE,
        seeds = [crate::ROUND_SEED, INITIAL_ROUND_SEQ.to_le_bytes().as_ref()],
        bump
    )]
    pub round: Account<'info, MeltRound>,

    /// SPL mint burned by participants (created off-chain).
    pub contribution_mint: Account<'info, Mint>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct AdminSetParams<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, MeltConfig>,

    pub admin: Signer<'info>,
}

#[derive(Accounts)]
#[instruction(round_seq: u64)]
pub struct AdminSetSchedule<'info> {
    #[account(
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, MeltConfig>,

    #[account(
        mut,
        seeds = [crate::ROUND_SEED, round_seq.to_le_bytes().as_ref()],
        bump = round.bump
    )]
    pub round: Account<'info, MeltRound>,

    pub admin: Signer<'info>,
}

// ----------------------------
// Funding
// ----------------------------

#[derive(Accounts)]
pub struct Deposit<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, MeltConfig>,

    #[account(
        mut,
        seeds = [crate::VAULT_SEED],
        bump = config.vault_bump
    )]
    pub vault: Account<'info, MeltVault>,

    #[account(mut)]
    pub funder: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct AdminTopUp<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, MeltConfig>,

    #[account(
        mut,
        seeds = [crate::VAULT_SEED],
        bump = config.vault_bump
    )]
    pub vault: Account<'info, MeltVault>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct AdminWithdraw<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, MeltConfig>,

    #[account(
        mut,
        seeds = [crate::VAULT_SEED],
        bump = config.vault_bump
    )]
    pub vault: Account<'info, MeltVault>,

    #[account(mut)]
    pub admin: Signer<'info>,
}

// ----------------------------
// Round lifecycle
// ----------------------------

#[derive(Accounts)]
#[instruction(round_seq: u64)]
pub struct StartRound<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, MeltConfig>,

    #[account(
        mut,
        seeds = [crate::ROUND_SEED, round_seq.to_le_bytes().as_ref()],
        bump = round.bump
    )]
    pub round: Account<'info, MeltRound>,

    /// Planned successor, created in the same instruction.
    #[account(
        init,
        payer = caller,
        space = 8 + MeltRound::INIT_SPACE,
        seeds = [crate::ROUND_SEED, config.next_round_seq.to_le_bytes().as_ref()],
        bump
    )]
    pub next_round: Account<'info, MeltRound>,

    #[account(mut)]
    pub caller: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(round_seq: u64)]
pub struct AdminStartRound<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, MeltConfig>,

    #[account(
        mut,
        seeds = [crate::ROUND_SEED, round_seq.to_le_bytes().as_ref()],
        bump = round.bump
    )]
    pub round: Account<'info, MeltRound>,

    #[account(
        init,
        payer = admin,
        space = 8 + MeltRound::INIT_SPACE,
        seeds = [crate::ROUND_SEED, config.next_round_seq.to_le_bytes().as_ref()],
        bump
    )]
    pub next_round: Account<'info, MeltRound>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(round_seq: u64)]
pub struct FinalizeRound<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, MeltConfig>,

    #[account(
        mut,
        seeds = [crate::ROUND_SEED, round_seq.to_le_bytes().as_ref()],
        bump = round.bump
    )]
    pub round: Account<'info, MeltRound>,

    pub caller: Signer<'info>,
}

#[derive(Accounts)]
#[instruction(round_seq: u64)]
pub struct AdminRecycleRound<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, MeltConfig>,

    #[account(
        mut,
        seeds = [crate::ROUND_SEED, round_seq.to_le_bytes().as_ref()],
        bump = round.bump
    )]
    pub round: Account<'info, MeltRound>,

    pub admin: Signer<'info>,
}

/// Read-only view used by keepers through simulation.
#[derive(Accounts)]
pub struct PlanNextAction<'info> {
    #[account(
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, MeltConfig>,

    #[account(
        seeds = [crate::ROUND_SEED, config.planned_round_seq().to_le_bytes().as_ref()],
        bump = planned_round.bump
    )]
    pub planned_round: Account<'info, MeltRound>,

    /// Same account as `planned_round` until the first start.
    #[account(
        seeds = [crate::ROUND_SEED, config.active_round_seq.to_le_bytes().as_ref()],
        bump = active_round.bump
    )]
    pub active_round: Account<'info, MeltRound>,
}

// ----------------------------
// Participants
// ----------------------------

#[derive(Accounts)]
#[instruction(round_seq: u64)]
pub struct Contribute<'info> {
    #[account(
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, MeltConfig>,

    #[account(
        mut,
        seeds = [crate::ROUND_SEED, round_seq.to_le_bytes().as_ref()],
        bump = round.bump
    )]
    pub round: Account<'info, MeltRound>,

    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + MeltUserRound::INIT_SPACE,
        seeds = [crate::USER_ROUND_SEED, owner.key().as_ref(), round.key().as_ref()],
        bump
    )]
    pub user_round: Account<'info, MeltUserRound>,

    #[account(mut, address = config.contribution_mint)]
    pub contribution_mint: Account<'info, Mint>,

    #[account(
        mut,
        token::mint = contribution_mint,
        token::authority = owner
    )]
    pub owner_token: Account<'info, TokenAccount>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(round_seq: u64)]
pub struct Claim<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, MeltConfig>,

    #[account(
        mut,
        seeds = [crate::VAULT_SEED],
        bump = config.vault_bump
    )]
    pub vault: Account<'info, MeltVault>,

    #[account(
        mut,
        seeds = [crate::ROUND_SEED, round_seq.to_le_bytes().as_ref()],
        bump = round.bump
    )]
    pub round: Account<'info, MeltRound>,

    #[account(
        mut,
        seeds = [crate::USER_ROUND_SEED, owner.key().as_ref(), round.key().as_ref()],
        bump = user_round.bump
    )]
    pub user_round: Account<'info, MeltUserRound>,

    #[account(mut)]
    pub owner: Signer<'info>,
}

// ----------------------------
// Migration (legacy layouts)
// ----------------------------

#[derive(Accounts)]
#[instruction(planned_seq: u64)]
pub struct MigrateConfig<'info> {
    /// CHECK: decoded manually; may still hold the legacy layout.
    #[account(
        mut,
        owner = crate::ID,
        seeds = [crate::CONFIG_SEED],
        bump
    )]
    pub config: UncheckedAccount<'info>,

    #[account(
        seeds = [crate::VAULT_SEED],
        bump = vault.bump
    )]
    pub vault: Account<'info, MeltVault>,

    /// Planned round at the legacy `round_seq`. Legacy deployments only create it
    /// on first funding, so it may not exist yet.
    #[account(
        init_if_needed,
        payer = admin,
        space = 8 + MeltRound::INIT_SPACE,
        seeds = [crate::ROUND_SEED, planned_seq.to_le_bytes().as_ref()],
        bump
    )]
    pub planned_round: Account<'info, MeltRound>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(round_seq: u64)]
pub struct MigrateRound<'info> {
    /// CHECK: only the admin key at bytes 8..40 is read; same offset in every layout.
    #[account(
        owner = crate::ID,
        seeds = [crate::CONFIG_SEED],
        bump
    )]
    pub config: UncheckedAccount<'info>,

    #[account(
        seeds = [crate::VAULT_SEED],
        bump = vault.bump
    )]
    pub vault: Account<'info, MeltVault>,

    /// CHECK: decoded manually; holds the legacy layout.
    #[account(
        mut,
        owner = crate::ID,
        seeds = [crate::ROUND_SEED, round_seq.to_le_bytes().as_ref()],
        bump
    )]
    pub round: UncheckedAccount<'info>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(round_seq: u64)]
pub struct MigrateUserRound<'info> {
    /// CHECK: only the admin key at bytes 8..40 is read.
    #[account(
        owner = crate::ID,
        seeds = [crate::CONFIG_SEED],
        bump
    )]
    pub config: UncheckedAccount<'info>,

    /// Must already be on the current layout.
    #[account(
        seeds = [crate::ROUND_SEED, round_seq.to_le_bytes().as_ref()],
        bump = round.bump
    )]
    pub round: Account<'info, MeltRound>,

    /// CHECK: participant key, only used for the PDA derivation.
    pub owner: UncheckedAccount<'info>,

    /// CHECK: decoded manually; holds the legacy layout.
    #[account(
        mut,
        owner = crate::ID,
        seeds = [crate::USER_ROUND_SEED, owner.key().as_ref(), round.key().as_ref()],
        bump
    )]
    pub user_round: UncheckedAccount<'info>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}
