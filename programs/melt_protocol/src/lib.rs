use anchor_lang::prelude::*;

pub mod errors;
pub mod events;
pub mod instructions;
pub mod legacy;
pub mod state;
pub mod utils;
pub mod contexts;
pub mod constants;

pub use utils::*;
pub use instructions::*;
pub use state::*;
pub use errors::*;
pub use contexts::*;
pub use constants::*;

declare_id!("HAWdiMtvTfiFhENgxPdWEgBQmoa3A5oN1KV9N3LSmxXz");

#[program]
pub mod melt_protocol {
    use super::*;
    use crate::instructions::{admin, contribute, funding, lifecycle, migrate, reward};

    pub fn init_melt(ctx: Context<InitMelt>, params: InitMeltParams) -> Result<()> {
        admin::init_melt(ctx, params)
    }

    // ----------------------------
    // Admin controls
    // ----------------------------
    pub fn admin_set_params(ctx: Context<AdminSetParams>, args: SetParamsArgs) -> Result<()> {
        admin::admin_set_params(ctx, args)
    }

    pub fn admin_set_schedule(
        ctx: Context<AdminSetSchedule>,
        round_seq: u64,
        start_ts: i64,
        end_ts: i64,
    ) -> Result<()> {
        admin::admin_set_schedule(ctx, round_seq, start_ts, end_ts)
    }

    pub fn admin_top_up(ctx: Context<AdminTopUp>, amount: u64) -> Result<()> {
        funding::admin_top_up(ctx, amount)
    }

    pub fn admin_withdraw(ctx: Context<AdminWithdraw>, amount: u64) -> Result<()> {
        admin::admin_withdraw(ctx, amount)
    }

    pub fn admin_start_round(ctx: Context<AdminStartRound>, round_seq: u64) -> Result<()> {
        lifecycle::admin_start_round(ctx, round_seq)
    }

    pub fn admin_recycle_round(ctx: Context<AdminRecycleRound>, round_seq: u64) -> Result<()> {
        admin::admin_recycle_round(ctx, round_seq)
    }

    // funding
    pub fn deposit(ctx: Context<Deposit>, amount: u64) -> Result<()> {
        funding::deposit(ctx, amount)
    }

    // ----------------------------
    // Triggers (permissionless)
    // ----------------------------
    pub fn start_round(ctx: Context<StartRound>, round_seq: u64) -> Result<()> {
        lifecycle::start_round(ctx, round_seq)
    }

    pub fn finalize_round(ctx: Context<FinalizeRound>, round_seq: u64) -> Result<()> {
        lifecycle::finalize_round(ctx, round_seq)
    }

    pub fn plan_next_action(ctx: Context<PlanNextAction>) -> Result<KeeperPlan> {
        lifecycle::plan_next_action(ctx)
    }

    // participants
    pub fn contribute(ctx: Context<Contribute>, round_seq: u64, amount: u64) -> Result<()> {
        contribute::contribute(ctx, round_seq, amount)
    }

    pub fn claim(ctx: Context<Claim>, round_seq: u64) -> Result<()> {
        reward::claim(ctx, round_seq)
    }

    // ----------------------------
    // Legacy layout migration
    // ----------------------------
    pub fn admin_migrate_config(ctx: Context<MigrateConfig>, planned_seq: u64) -> Result<()> {
        migrate::admin_migrate_config(ctx, planned_seq)
    }

    pub fn migrate_round(ctx: Context<MigrateRound>, round_seq: u64) -> Result<()> {
        migrate::migrate_round(ctx, round_seq)
    }

    pub fn migrate_user_round(ctx: Context<MigrateUserRound>, round_seq: u64) -> Result<()> {
        migrate::migrate_user_round(ctx, round_seq)
    }
}
