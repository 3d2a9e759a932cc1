use anchor_lang::prelude::*;

#[event]
pub struct MeltInitialized {
    pub admin: Pubkey,
    pub contribution_mint: Pubkey,
    pub vault_cap: u64,
    pub rollover_bps: u16,
    pub test_mode: bool,
}

#[event]
pub struct ParamsUpdated {
    pub vault_cap: u64,
    pub rollover_bps: u16,
    pub min_contribution: u64,
    pub round_window_sec: u64,
}

#[event]
pub struct FundingRecorded {
    pub funder: Pubkey,
    pub amount: u64,
    pub vault_balance: u64,
    pub fill_reached: bool,
}

#[event]
pub struct VaultWithdrawn {
    pub amount: u64,
    pub vault_balance: u64,
}

#[event]
pub struct RoundScheduled {
    pub seq: u64,
    pub start_ts: i64,
    pub end_ts: i64,
}

#[event]
pub struct RoundStarted {
    pub seq: u64,
    pub start_ts: i64,
    pub end_ts: i64,
    pub pot: u64,
    pub locked_payout_amount: u64,
    pub rollover_amount: u64,
    pub next_round_seq: u64,
}

#[event]
pub struct Contributed {
    pub owner: Pubkey,
    pub round_seq: u64,
    pub amount: u64,
    pub contributed: u64,
    pub total_contribution: u64,
}

#[event]
pub struct RoundFinalized {
    pub seq: u64,
    pub total_contribution: u64,
    pub locked_payout_amount: u64,
    pub rollover_amount: u64,
}

#[event]
pub struct Claimed {
    pub owner: Pubkey,
    pub round_seq: u64,
    pub payout: u64,
}

#[event]
pub struct RoundRecycled {
    pub seq: u64,
    pub amount: u64,
    pub vault_balance: u64,
}

#[event]
pub struct AccountMigrated {
    pub account: Pubkey,
    pub from_version: u16,
    pub to_version: u16,
}
