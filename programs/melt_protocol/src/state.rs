use anchor_lang::prelude::*;

#[account]
#[derive(InitSpace)]
pub struct MeltConfig {
    // must stay the first field: migrations authorize on bytes 8..40
    pub admin: Pubkey,

    /// SPL mint burned by participants.
    pub contribution_mint: Pubkey,
    /// Program-owned lamport vault (MeltVault PDA).
    pub vault: Pubkey,

    /// Unlocked lamports accruing toward the next round.
    pub vault_balance: u64,
    /// Fill threshold gating `start_round`.
    pub vault_cap: u64,
    /// Share of the pot held back at start and released into the vault at finalize.
    pub rollover_bps: u16,
    pub min_contribution: u64,
    pub round_window_sec: u64,

    /// Seq handed to the next round account created. The Planned round is always `next_round_seq - 1`.
    pub next_round_seq: u64,
    pub active_round_seq: u64,
    pub active_round_open: bool,

    /// Lamports owed to started rounds (unclaimed payouts + pending rollover).
    pub reserved_balance: u64,

    /// Enables admin withdraw and forced starts. Fixed at init.
    pub test_mode: bool,

    pub version: u16,
    pub bump: u8,
    pub vault_bump: u8,
}

impl MeltConfig {
    pub fn is_fill_threshold_reached(&self) -> bool {
        self.vault_balance >= self.vault_cap
    }

    pub fn planned_round_seq(&self) -> u64 {
        self.next_round_seq.saturating_sub(1)
    }
}

#[account]
#[derive(InitSpace)]
pub struct MeltVault {
    pub bump: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub enum RoundStatus {
    Planned,
    Active,
    Finalized,
}

#[account]
#[derive(InitSpace)]
pub struct MeltRound {
    pub seq: u64,
    pub bump: u8,
    pub status: RoundStatus,

    pub vault: Pubkey,

    // schedule (admin-set while Planned)
    pub scheduled: bool,
    pub start_ts: i64,
    pub end_ts: i64,

    // snapshot taken at start; pot = locked_payout_amount + rollover_amount
    pub pot: u64,
    pub locked_payout_amount: u64,
    pub rollover_amount: u64,

    pub total_contribution: u64,
    pub contributor_count: u64,

    pub claimed_total: u64,
    pub claim_count: u64,

    pub created_ts: i64,
    pub started_ts: i64,
    pub finalized_ts: i64,

    /// Zero-contribution payout returned to the vault by admin.
    pub recycled: bool,

    pub version: u16,
}

#[account]
#[derive(InitSpace)]
pub struct MeltUserRound {
    pub owner: Pubkey,
    pub round: Pubkey,
    pub round_seq: u64,

    pub contributed: u64,

    // claim guard
    pub claimed: bool,
    pub payout: u64,

    pub first_contribution_ts: i64,
    pub claimed_ts: i64,

    pub bump: u8,
    pub version: u16,
}
