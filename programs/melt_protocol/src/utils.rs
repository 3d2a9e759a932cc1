use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::MeltError,
    state::{MeltConfig, MeltRound, MeltUserRound, RoundStatus},
};

// -----------------
// Seeds
// -----------------
pub const CONFIG_SEED: &[u8] = b"melt_config";
pub const VAULT_SEED: &[u8] = b"melt_vault";
pub const ROUND_SEED: &[u8] = b"melt_round";
pub const USER_ROUND_SEED: &[u8] = b"melt_user_round";

// ---------------
// Instruction payloads
// ---------------
#[derive(AnchorSerialize, AnchorDeserialize, Clone)]
pub struct InitMeltParams {
    /// Fill threshold in lamports.
    pub vault_cap: u64,
    /// Rollover in bps (0..=10000).
    pub rollover_bps: u16,
    /// Minimum burn per contribute call, in contribution-mint base units.
    pub min_contribution: u64,
    pub round_window_sec: u64,
    /// Enables test-only admin withdraw and forced starts.
    pub test_mode: bool,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Default)]
pub struct SetParamsArgs {
    pub vault_cap: Option<u64>,
    pub rollover_bps: Option<u16>,
    pub min_contribution: Option<u64>,
    pub round_window_sec: Option<u64>,
}

// ---------------
// Keeper dry-run plan
// ---------------
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeeperAction {
    /// Vault below cap; nothing to do until deposits arrive.
    AwaitFill,
    /// Scheduled window already passed; admin must reschedule.
    AwaitSchedule,
    /// Scheduled start still in the future.
    AwaitStart,
    StartRound,
    /// Active window still open.
    AwaitEnd,
    FinalizeRound,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct KeeperPlan {
    pub action: KeeperAction,
    pub round_seq: u64,
    /// Earliest unix timestamp at which the action (or the next one) can succeed. 0 = unknown.
    pub ready_at: i64,
    pub vault_balance: u64,
    pub vault_cap: u64,
}

// -------------------------
// Amount math
// -------------------------
pub fn apply_bps(amount: u64, bps: u16) -> Result<u64> {
    require!(u64::from(bps) <= BPS_DENOMINATOR, MeltError::InvalidParams);

    let v = (amount as u128)
        .checked_mul(bps as u128)
        .ok_or(MeltError::MathOverflow)?
        .checked_div(BPS_DENOMINATOR as u128)
        .ok_or(MeltError::MathOverflow)?;

    u64::try_from(v).map_err(|_| error!(MeltError::MathOverflow))
}

/// floor(locked * contributed / total), widened to u128.
pub fn pro_rata_payout(locked: u64, contributed: u64, total: u64) -> Result<u64> {
    if total == 0 || locked == 0 {
        return Ok(0);
    }
    require!(contributed <= total, MeltError::InvariantViolation);

    let payout = (locked as u128)
        .checked_mul(contributed as u128)
        .ok_or(MeltError::MathOverflow)?
        .checked_div(total as u128)
        .ok_or(MeltError::MathOverflow)?;

    u64::try_from(payout).map_err(|_| error!(MeltError::MathOverflow))
}

pub fn validate_params(vault_cap: u64, rollover_bps: u16, round_window_sec: u64) -> Result<()> {
    require!(vault_cap > 0, MeltError::InvalidParams);
    require!(u64::from(rollover_bps) <= BPS_DENOMINATOR, MeltError::InvalidParams);
    require!(round_window_sec > 0, MeltError::InvalidParams);
    require!(round_window_sec <= MAX_ROUND_WINDOW_SEC, MeltError::InvalidParams);
    Ok(())
}

// -------------------------
// Pool ledger
// -------------------------
pub fn deposit_core(cfg: &mut MeltConfig, amount: u64) -> Result<u64> {
    require!(amount > 0, MeltError::InvalidParams);

    cfg.vault_balance = cfg
        .vault_balance
        .checked_add(amount)
        .ok_or(MeltError::MathOverflow)?;

    Ok(cfg.vault_balance)
}

/// Test-mode emergency withdraw. Only the unlocked balance is reachable;
/// `reserved_balance` belongs to started rounds.
pub fn withdraw_core(cfg: &mut MeltConfig, amount: u64) -> Result<u64> {
    require!(cfg.test_mode, MeltError::WithdrawDisabled);
    require!(amount > 0, MeltError::InvalidParams);
    require!(amount <= cfg.vault_balance, MeltError::InsufficientFunds);

    cfg.vault_balance = cfg
        .vault_balance
        .checked_sub(amount)
        .ok_or(MeltError::MathOverflow)?;

    Ok(cfg.vault_balance)
}

pub fn apply_params(cfg: &mut MeltConfig, args: &SetParamsArgs) -> Result<()> {
    let vault_cap = args.vault_cap.unwrap_or(cfg.vault_cap);
    let rollover_bps = args.rollover_bps.unwrap_or(cfg.rollover_bps);
    let round_window_sec = args.round_window_sec.unwrap_or(cfg.round_window_sec);
    validate_params(vault_cap, rollover_bps, round_window_sec)?;

    cfg.vault_cap = vault_cap;
    cfg.rollover_bps = rollover_bps;
    cfg.round_window_sec = round_window_sec;
    if let Some(min) = args.min_contribution {
        cfg.min_contribution = min;
    }
    Ok(())
}

// -------------------------
// Round identity & schedule
// -------------------------
pub fn init_planned_round(round: &mut MeltRound, seq: u64, bump: u8, vault: Pubkey, now: i64) {
    round.seq = seq;
    round.bump = bump;
    round.status = RoundStatus::Planned;
    round.vault = vault;

    round.scheduled = false;
    round.start_ts = 0;
    round.end_ts = 0;

    round.pot = 0;
    round.locked_payout_amount = 0;
    round.rollover_amount = 0;

    round.total_contribution = 0;
    round.contributor_count = 0;
    round.claimed_total = 0;
    round.claim_count = 0;

    round.created_ts = now;
    round.started_ts = 0;
    round.finalized_ts = 0;

    round.recycled = false;
    round.version = ACCOUNT_VERSION;
}

/// Admin-only start that skips the fill threshold; test deployments only.
pub fn authorize_forced_start(cfg: &MeltConfig, signer: Pubkey) -> Result<()> {
    require_keys_eq!(cfg.admin, signer, MeltError::Unauthorized);
    require!(cfg.test_mode, MeltError::TestModeOnly);
    Ok(())
}

fn require_planned(cfg: &MeltConfig, round: &MeltRound) -> Result<()> {
    require!(!cfg.active_round_open, MeltError::RoundAlreadyActive);
    require!(round.status == RoundStatus::Planned, MeltError::RoundNotScheduled);
    require!(
        round.seq == cfg.planned_round_seq(),
        MeltError::RoundNotScheduled
    );
    Ok(())
}

pub fn schedule_core(
    cfg: &MeltConfig,
    round: &mut MeltRound,
    start_ts: i64,
    end_ts: i64,
    now: i64,
) -> Result<()> {
    require_planned(cfg, round)?;

    require!(start_ts >= now, MeltError::InvalidSchedule);
    require!(end_ts > start_ts, MeltError::InvalidSchedule);
    let window = end_ts
        .checked_sub(start_ts)
        .ok_or(MeltError::MathOverflow)?;
    require!(
        u64::try_from(window).map_err(|_| error!(MeltError::MathOverflow))? <= MAX_ROUND_WINDOW_SEC,
        MeltError::InvalidSchedule
    );

    round.scheduled = true;
    round.start_ts = start_ts;
    round.end_ts = end_ts;
    Ok(())
}

// -------------------------
// Round state machine
// -------------------------

/// Planned -> Active. Snapshots the whole unlocked balance as the pot and
/// creates the Planned successor in the same step.
pub fn start_core(
    cfg: &mut MeltConfig,
    round: &mut MeltRound,
    next_round: &mut MeltRound,
    next_round_bump: u8,
    now: i64,
    require_fill: bool,
) -> Result<()> {
    require_planned(cfg, round)?;
    if require_fill {
        require!(cfg.is_fill_threshold_reached(), MeltError::FillThresholdNotMet);
    }

    // the snapshot is write-once
    require!(
        round.pot == 0 && round.locked_payout_amount == 0 && round.rollover_amount == 0,
        MeltError::InvariantViolation
    );
    require!(round.total_contribution == 0, MeltError::InvariantViolation);

    let (start_ts, end_ts) = if round.scheduled {
        require!(now >= round.start_ts, MeltError::RoundNotStarted);
        require!(now < round.end_ts, MeltError::ScheduleExpired);
        (round.start_ts, round.end_ts)
    } else {
        let window = i64::try_from(cfg.round_window_sec).map_err(|_| error!(MeltError::MathOverflow))?;
        (now, now.checked_add(window).ok_or(MeltError::MathOverflow)?)
    };

    let pot = cfg.vault_balance;
    let rollover = apply_bps(pot, cfg.rollover_bps)?;
    let locked = pot.checked_sub(rollover).ok_or(MeltError::MathOverflow)?;
    let reserved = cfg
        .reserved_balance
        .checked_add(pot)
        .ok_or(MeltError::MathOverflow)?;

    let next_seq = cfg.next_round_seq;
    let following_seq = next_seq.checked_add(1).ok_or(MeltError::MathOverflow)?;

    round.start_ts = start_ts;
    round.end_ts = end_ts;
    round.pot = pot;
    round.locked_payout_amount = locked;
    round.rollover_amount = rollover;
    round.started_ts = now;
    round.status = RoundStatus::Active;

    cfg.vault_balance = 0;
    cfg.reserved_balance = reserved;
    cfg.active_round_seq = round.seq;
    cfg.active_round_open = true;

    init_planned_round(next_round, next_seq, next_round_bump, cfg.vault, now);
    cfg.next_round_seq = following_seq;

    Ok(())
}

pub fn contribute_core(
    cfg: &MeltConfig,
    round: &mut MeltRound,
    round_key: Pubkey,
    user_round: &mut MeltUserRound,
    user_round_bump: u8,
    owner: Pubkey,
    amount: u64,
    now: i64,
) -> Result<()> {
    require!(round.status == RoundStatus::Active, MeltError::BadRoundStatus);
    require!(now >= round.start_ts, MeltError::RoundNotStarted);
    require!(now <= round.end_ts, MeltError::RoundNotActive);
    require!(amount > 0, MeltError::BelowMinimum);
    require!(amount >= cfg.min_contribution, MeltError::BelowMinimum);

    let total = round
        .total_contribution
        .checked_add(amount)
        .ok_or(MeltError::MathOverflow)?;

    let is_new = record_contribution(
        user_round,
        owner,
        round_key,
        round.seq,
        user_round_bump,
        amount,
        now,
    )?;

    round.total_contribution = total;
    if is_new {
        round.contributor_count = round
            .contributor_count
            .checked_add(1)
            .ok_or(MeltError::MathOverflow)?;
    }
    Ok(())
}

/// Active -> Finalized. Releases the held-back rollover into the vault.
pub fn finalize_core(cfg: &mut MeltConfig, round: &mut MeltRound, now: i64) -> Result<u64> {
    require!(round.status == RoundStatus::Active, MeltError::BadRoundStatus);
    require!(
        cfg.active_round_open && cfg.active_round_seq == round.seq,
        MeltError::BadRoundStatus
    );
    require!(now > round.end_ts, MeltError::RoundNotEnded);

    let pot = round
        .locked_payout_amount
        .checked_add(round.rollover_amount)
        .ok_or(MeltError::MathOverflow)?;
    require!(pot == round.pot, MeltError::InvariantViolation);

    let rollover = round.rollover_amount;
    let reserved = cfg
        .reserved_balance
        .checked_sub(rollover)
        .ok_or(MeltError::InvariantViolation)?;
    let vault_balance = cfg
        .vault_balance
        .checked_add(rollover)
        .ok_or(MeltError::MathOverflow)?;

    round.status = RoundStatus::Finalized;
    round.finalized_ts = now;

    cfg.active_round_open = false;
    cfg.reserved_balance = reserved;
    cfg.vault_balance = vault_balance;

    Ok(rollover)
}

pub fn claim_core(
    cfg: &mut MeltConfig,
    round: &mut MeltRound,
    user_round: &mut MeltUserRound,
    owner: Pubkey,
    now: i64,
) -> Result<u64> {
    require!(round.status == RoundStatus::Finalized, MeltError::BadRoundStatus);
    require!(user_round.contributed > 0, MeltError::NothingToClaim);
    require_keys_eq!(user_round.owner, owner, MeltError::Unauthorized);
    require!(user_round.round_seq == round.seq, MeltError::InvariantViolation);
    require!(!user_round.claimed, MeltError::AlreadyClaimed);

    require!(
        user_round.contributed <= round.total_contribution,
        MeltError::InvariantViolation
    );
    let payout = pro_rata_payout(
        round.locked_payout_amount,
        user_round.contributed,
        round.total_contribution,
    )?;

    let claimed_total = round
        .claimed_total
        .checked_add(payout)
        .ok_or(MeltError::MathOverflow)?;
    require!(
        claimed_total <= round.locked_payout_amount,
        MeltError::InvariantViolation
    );
    let reserved = cfg
        .reserved_balance
        .checked_sub(payout)
        .ok_or(MeltError::InvariantViolation)?;
    let claim_count = round
        .claim_count
        .checked_add(1)
        .ok_or(MeltError::MathOverflow)?;

    mark_claimed(user_round, payout, now)?;
    round.claimed_total = claimed_total;
    round.claim_count = claim_count;
    cfg.reserved_balance = reserved;

    Ok(payout)
}

/// Returns the payout of a finalized round nobody contributed to back to the
/// unlocked vault balance.
pub fn recycle_core(cfg: &mut MeltConfig, round: &mut MeltRound) -> Result<u64> {
    require!(round.status == RoundStatus::Finalized, MeltError::BadRoundStatus);
    require!(round.total_contribution == 0, MeltError::RoundHasContributors);
    require!(!round.recycled, MeltError::AlreadyRecycled);

    let amount = round.locked_payout_amount;
    let reserved = cfg
        .reserved_balance
        .checked_sub(amount)
        .ok_or(MeltError::InvariantViolation)?;
    let vault_balance = cfg
        .vault_balance
        .checked_add(amount)
        .ok_or(MeltError::MathOverflow)?;

    round.recycled = true;
    cfg.reserved_balance = reserved;
    cfg.vault_balance = vault_balance;

    Ok(amount)
}

// -------------------------
// Participant ledger
// -------------------------

/// Returns true when this call created the record.
pub(crate) fn record_contribution(
    user_round: &mut MeltUserRound,
    owner: Pubkey,
    round_key: Pubkey,
    round_seq: u64,
    bump: u8,
    amount: u64,
    now: i64,
) -> Result<bool> {
    require!(amount > 0, MeltError::InvalidParams);

    let is_new = user_round.contributed == 0;
    if is_new {
        require!(!user_round.claimed, MeltError::InvariantViolation);
    } else {
        require_keys_eq!(user_round.owner, owner, MeltError::Unauthorized);
        require_keys_eq!(user_round.round, round_key, MeltError::InvariantViolation);
    }

    let contributed = user_round
        .contributed
        .checked_add(amount)
        .ok_or(MeltError::MathOverflow)?;

    if is_new {
        user_round.owner = owner;
        user_round.round = round_key;
        user_round.round_seq = round_seq;
        user_round.claimed = false;
        user_round.payout = 0;
        user_round.first_contribution_ts = now;
        user_round.claimed_ts = 0;
        user_round.bump = bump;
        user_round.version = ACCOUNT_VERSION;
    }
    user_round.contributed = contributed;

    Ok(is_new)
}

pub(crate) fn mark_claimed(user_round: &mut MeltUserRound, payout: u64, now: i64) -> Result<()> {
    require!(!user_round.claimed, MeltError::AlreadyClaimed);

    user_round.claimed = true;
    user_round.payout = payout;
    user_round.claimed_ts = now;
    Ok(())
}

// -------------------------
// Keeper planning (read-only)
// -------------------------
pub fn plan_keeper_action(
    cfg: &MeltConfig,
    planned: &MeltRound,
    active: &MeltRound,
    now: i64,
) -> KeeperPlan {
    let plan = |action: KeeperAction, round_seq: u64, ready_at: i64| KeeperPlan {
        action,
        round_seq,
        ready_at,
        vault_balance: cfg.vault_balance,
        vault_cap: cfg.vault_cap,
    };

    if cfg.active_round_open {
        let ready_at = active.end_ts.saturating_add(1);
        return if now > active.end_ts {
            plan(KeeperAction::FinalizeRound, active.seq, ready_at)
        } else {
            plan(KeeperAction::AwaitEnd, active.seq, ready_at)
        };
    }

    if planned.scheduled {
        if now >= planned.end_ts {
            return plan(KeeperAction::AwaitSchedule, planned.seq, 0);
        }
        if now < planned.start_ts {
            return plan(KeeperAction::AwaitStart, planned.seq, planned.start_ts);
        }
    }

    if !cfg.is_fill_threshold_reached() {
        return plan(KeeperAction::AwaitFill, planned.seq, 0);
    }

    plan(KeeperAction::StartRound, planned.seq, now)
}

// -------------------------
// Lamport moves out of the program-owned vault
// -------------------------
pub fn pay_from_vault<'info>(
    vault: &AccountInfo<'info>,
    to: &AccountInfo<'info>,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }

    let rent_min = Rent::get()?.minimum_balance(vault.data_len());
    let vault_lamports = vault.lamports();
    let required = amount.checked_add(rent_min).ok_or(MeltError::MathOverflow)?;
    require!(vault_lamports >= required, MeltError::InsufficientFunds);

    let new_vault = vault_lamports
        .checked_sub(amount)
        .ok_or(MeltError::MathOverflow)?;
    let new_to = to
        .lamports()
        .checked_add(amount)
        .ok_or(MeltError::MathOverflow)?;

    **vault.try_borrow_mut_lamports()? = new_vault;
    **to.try_borrow_mut_lamports()? = new_to;

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anchor_lang::error::Error;

    pub(crate) const T0: i64 = 1_700_000_000;

    pub(crate) fn code(err: Error) -> u32 {
        match err {
            Error::AnchorError(e) => e.error_code_number,
            Error::ProgramError(_) => u32::MAX,
        }
    }

    pub(crate) fn assert_melt_err<T>(res: Result<T>, expected: MeltError) {
        match res {
            Ok(_) => panic!("expected {:?}, got Ok", expected),
            Err(e) => assert_eq!(code(e), u32::from(expected), "expected {:?}", expected),
        }
    }

    pub(crate) fn config(vault_cap: u64, rollover_bps: u16, min_contribution: u64) -> MeltConfig {
        MeltConfig {
            admin: Pubkey::new_unique(),
            contribution_mint: Pubkey::new_unique(),
            vault: Pubkey::new_unique(),
            vault_balance: 0,
            vault_cap,
            rollover_bps,
            min_contribution,
            round_window_sec: 600,
            next_round_seq: INITIAL_ROUND_SEQ + 1,
            active_round_seq: INITIAL_ROUND_SEQ,
            active_round_open: false,
            reserved_balance: 0,
            test_mode: true,
            version: ACCOUNT_VERSION,
            bump: 255,
            vault_bump: 254,
        }
    }

    pub(crate) fn blank_round() -> MeltRound {
        MeltRound {
            seq: 0,
            bump: 0,
            status: RoundStatus::Planned,
            vault: Pubkey::default(),
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
        }
    }

    pub(crate) fn blank_user_round() -> MeltUserRound {
        MeltUserRound {
            owner: Pubkey::default(),
            round: Pubkey::default(),
            round_seq: 0,
            contributed: 0,
            claimed: false,
            payout: 0,
            first_contribution_ts: 0,
            claimed_ts: 0,
            bump: 0,
            version: 0,
        }
    }

    /// In-memory stand-in for the config, round and user-round PDAs.
    struct Melt {
        cfg: MeltConfig,
        rounds: Vec<MeltRound>,
        round_keys: Vec<Pubkey>,
        users: Vec<(Pubkey, u64, MeltUserRound)>,
    }

    impl Melt {
        fn new(vault_cap: u64, rollover_bps: u16, min_contribution: u64) -> Self {
            let cfg = config(vault_cap, rollover_bps, min_contribution);
            let mut first = blank_round();
            init_planned_round(&mut first, INITIAL_ROUND_SEQ, 250, cfg.vault, T0);
            Self {
                cfg,
                rounds: vec![first],
                round_keys: vec![Pubkey::new_unique()],
                users: Vec::new(),
            }
        }

        fn round(&self, seq: u64) -> &MeltRound {
            &self.rounds[seq as usize]
        }

        fn deposit(&mut self, amount: u64) {
            deposit_core(&mut self.cfg, amount).unwrap();
        }

        fn start(&mut self, seq: u64, now: i64) -> Result<()> {
            self.start_with(seq, now, true)
        }

        fn start_with(&mut self, seq: u64, now: i64, require_fill: bool) -> Result<()> {
            let mut next = blank_round();
            start_core(
                &mut self.cfg,
                &mut self.rounds[seq as usize],
                &mut next,
                250,
                now,
                require_fill,
            )?;
            self.rounds.push(next);
            self.round_keys.push(Pubkey::new_unique());
            Ok(())
        }

        fn schedule(&mut self, seq: u64, start_ts: i64, end_ts: i64, now: i64) -> Result<()> {
            schedule_core(&self.cfg, &mut self.rounds[seq as usize], start_ts, end_ts, now)
        }

        fn finalize(&mut self, seq: u64, now: i64) -> Result<u64> {
            finalize_core(&mut self.cfg, &mut self.rounds[seq as usize], now)
        }

        fn user_index(&mut self, owner: Pubkey, seq: u64) -> usize {
            if let Some(i) = self
                .users
                .iter()
                .position(|(o, s, _)| *o == owner && *s == seq)
            {
                return i;
            }
            self.users.push((owner, seq, blank_user_round()));
            self.users.len() - 1
        }

        fn contribute(&mut self, owner: Pubkey, seq: u64, amount: u64, now: i64) -> Result<()> {
            let i = self.user_index(owner, seq);
            let key = self.round_keys[seq as usize];
            contribute_core(
                &self.cfg,
                &mut self.rounds[seq as usize],
                key,
                &mut self.users[i].2,
                200,
                owner,
                amount,
                now,
            )
        }

        fn claim(&mut self, owner: Pubkey, seq: u64, now: i64) -> Result<u64> {
            let i = self.user_index(owner, seq);
            claim_core(
                &mut self.cfg,
                &mut self.rounds[seq as usize],
                &mut self.users[i].2,
                owner,
                now,
            )
        }

        fn user(&self, owner: Pubkey, seq: u64) -> Option<&MeltUserRound> {
            self.users
                .iter()
                .find(|(o, s, _)| *o == owner && *s == seq)
                .map(|(_, _, u)| u)
        }
    }

    // ---- amount math ----

    #[test]
    fn apply_bps_floors_and_bounds() {
        assert_eq!(apply_bps(1_000, 0).unwrap(), 0);
        assert_eq!(apply_bps(1_000, 2_500).unwrap(), 250);
        assert_eq!(apply_bps(999, 1).unwrap(), 0);
        assert_eq!(apply_bps(u64::MAX, 10_000).unwrap(), u64::MAX);
        assert_melt_err(apply_bps(1, 10_001), MeltError::InvalidParams);
    }

    #[test]
    fn pro_rata_payout_uses_wide_intermediate() {
        // locked * contributed overflows u64 but not u128
        let locked = u64::MAX / 2;
        let total = u64::MAX;
        let contributed = u64::MAX / 3;
        let expected = ((locked as u128) * (contributed as u128) / (total as u128)) as u64;
        assert_eq!(pro_rata_payout(locked, contributed, total).unwrap(), expected);

        assert_eq!(pro_rata_payout(160, 20, 80).unwrap(), 40);
        assert_eq!(pro_rata_payout(160, 0, 0).unwrap(), 0);
        assert_melt_err(pro_rata_payout(160, 81, 80), MeltError::InvariantViolation);
    }

    #[test]
    fn params_validation() {
        assert!(validate_params(1, 10_000, 1).is_ok());
        assert_melt_err(validate_params(0, 0, 60), MeltError::InvalidParams);
        assert_melt_err(validate_params(10, 10_001, 60), MeltError::InvalidParams);
        assert_melt_err(validate_params(10, 0, 0), MeltError::InvalidParams);
        assert_melt_err(
            validate_params(10, 0, MAX_ROUND_WINDOW_SEC + 1),
            MeltError::InvalidParams,
        );

        let mut cfg = config(150, 0, 10);
        apply_params(
            &mut cfg,
            &SetParamsArgs {
                vault_cap: Some(300),
                min_contribution: Some(5),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(cfg.vault_cap, 300);
        assert_eq!(cfg.min_contribution, 5);
        assert_eq!(cfg.rollover_bps, 0);

        let bad = SetParamsArgs {
            rollover_bps: Some(20_000),
            min_contribution: Some(1),
            ..Default::default()
        };
        assert_melt_err(apply_params(&mut cfg, &bad), MeltError::InvalidParams);
        assert_eq!(cfg.min_contribution, 5);
    }

    // ---- pool ledger ----

    #[test]
    fn deposits_may_exceed_cap() {
        let mut cfg = config(150, 0, 10);
        assert!(!cfg.is_fill_threshold_reached());
        assert_eq!(deposit_core(&mut cfg, 80).unwrap(), 80);
        assert!(!cfg.is_fill_threshold_reached());
        assert_eq!(deposit_core(&mut cfg, 80).unwrap(), 160);
        assert!(cfg.is_fill_threshold_reached());
        assert_melt_err(deposit_core(&mut cfg, 0), MeltError::InvalidParams);

        cfg.vault_balance = u64::MAX;
        assert_melt_err(deposit_core(&mut cfg, 1), MeltError::MathOverflow);
        assert_eq!(cfg.vault_balance, u64::MAX);
    }

    #[test]
    fn withdraw_is_test_mode_only_and_never_touches_reserved() {
        let mut m = Melt::new(100, 0, 1);
        m.deposit(100);
        m.start(0, T0).unwrap();
        m.deposit(30);
        assert_eq!(m.cfg.reserved_balance, 100);

        assert_melt_err(withdraw_core(&mut m.cfg, 31), MeltError::InsufficientFunds);
        assert_eq!(withdraw_core(&mut m.cfg, 30).unwrap(), 0);
        assert_eq!(m.cfg.reserved_balance, 100);

        m.cfg.test_mode = false;
        m.deposit(10);
        assert_melt_err(withdraw_core(&mut m.cfg, 10), MeltError::WithdrawDisabled);
        assert_eq!(m.cfg.vault_balance, 10);
    }

    // ---- scenarios ----

    #[test]
    fn two_contributors_split_the_locked_pool() {
        let mut m = Melt::new(150, 0, 10);
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());

        m.deposit(80);
        m.deposit(80);
        m.start(0, T0).unwrap();
        assert_eq!(m.round(0).locked_payout_amount, 160);
        assert_eq!(m.round(0).status, RoundStatus::Active);
        assert_eq!(m.cfg.vault_balance, 0);

        m.contribute(a, 0, 20, T0 + 1).unwrap();
        m.contribute(b, 0, 60, T0 + 2).unwrap();

        let end = m.round(0).end_ts;
        m.finalize(0, end + 1).unwrap();
        assert_eq!(m.round(0).total_contribution, 80);

        assert_eq!(m.claim(a, 0, end + 2).unwrap(), 40);
        assert_eq!(m.claim(b, 0, end + 3).unwrap(), 120);
        assert_eq!(m.round(0).claimed_total, 160);
        assert_eq!(m.round(0).claim_count, 2);
        assert_eq!(m.cfg.reserved_balance, 0);
    }

    #[test]
    fn second_claim_is_rejected_without_side_effects() {
        let mut m = Melt::new(150, 0, 10);
        let a = Pubkey::new_unique();
        m.deposit(160);
        m.start(0, T0).unwrap();
        m.contribute(a, 0, 20, T0 + 1).unwrap();
        let end = m.round(0).end_ts;
        m.finalize(0, end + 1).unwrap();

        assert_eq!(m.claim(a, 0, end + 2).unwrap(), 160);
        let reserved = m.cfg.reserved_balance;
        let claimed_total = m.round(0).claimed_total;

        assert_melt_err(m.claim(a, 0, end + 3), MeltError::AlreadyClaimed);
        assert_eq!(m.cfg.reserved_balance, reserved);
        assert_eq!(m.round(0).claimed_total, claimed_total);
        assert_eq!(m.user(a, 0).unwrap().payout, 160);
        assert_eq!(m.user(a, 0).unwrap().claimed_ts, end + 2);
    }

    #[test]
    fn claim_without_contribution_is_not_found() {
        let mut m = Melt::new(150, 0, 10);
        let (a, c) = (Pubkey::new_unique(), Pubkey::new_unique());
        m.deposit(160);
        m.start(0, T0).unwrap();
        m.contribute(a, 0, 20, T0 + 1).unwrap();
        let end = m.round(0).end_ts;
        m.finalize(0, end + 1).unwrap();

        assert_melt_err(m.claim(c, 0, end + 2), MeltError::NothingToClaim);
        let rec = m.user(c, 0).unwrap();
        assert!(!rec.claimed);
        assert_eq!(m.round(0).claim_count, 0);
        assert_eq!(m.cfg.reserved_balance, 160);
    }

    #[test]
    fn contribution_minimum_is_inclusive() {
        let mut m = Melt::new(150, 0, 10);
        let a = Pubkey::new_unique();
        m.deposit(150);
        m.start(0, T0).unwrap();

        assert_melt_err(m.contribute(a, 0, 1, T0 + 1), MeltError::BelowMinimum);
        assert_melt_err(m.contribute(a, 0, 9, T0 + 1), MeltError::BelowMinimum);
        assert_eq!(m.round(0).total_contribution, 0);
        assert_eq!(m.round(0).contributor_count, 0);

        m.contribute(a, 0, 10, T0 + 1).unwrap();
        assert_eq!(m.round(0).total_contribution, 10);
    }

    #[test]
    fn finalize_before_end_is_retryable() {
        let mut m = Melt::new(150, 0, 10);
        m.deposit(150);
        m.start(0, T0).unwrap();
        let end = m.round(0).end_ts;

        assert_melt_err(m.finalize(0, end - 3), MeltError::RoundNotEnded);
        assert_melt_err(m.finalize(0, end), MeltError::RoundNotEnded);
        assert_eq!(m.round(0).status, RoundStatus::Active);
        assert!(m.cfg.active_round_open);

        m.finalize(0, end + 3).unwrap();
        assert_eq!(m.round(0).status, RoundStatus::Finalized);
        assert_eq!(m.round(0).finalized_ts, end + 3);
        assert!(!m.cfg.active_round_open);

        assert_melt_err(m.finalize(0, end + 4), MeltError::BadRoundStatus);
    }

    #[test]
    fn repeated_contributions_accumulate() {
        let mut m = Melt::new(100, 0, 10);
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
        m.deposit(100);
        m.start(0, T0).unwrap();

        m.contribute(a, 0, 10, T0 + 1).unwrap();
        m.contribute(a, 0, 15, T0 + 2).unwrap();
        m.contribute(b, 0, 75, T0 + 3).unwrap();

        let rec = m.user(a, 0).unwrap();
        assert_eq!(rec.contributed, 25);
        assert_eq!(rec.first_contribution_ts, T0 + 1);
        assert_eq!(m.round(0).contributor_count, 2);
        assert_eq!(m.round(0).total_contribution, 100);

        let end = m.round(0).end_ts;
        m.finalize(0, end + 1).unwrap();
        assert_eq!(m.claim(a, 0, end + 1).unwrap(), 25);
    }

    // ---- invariants & boundaries ----

    #[test]
    fn rounding_dust_stays_in_custody() {
        let mut m = Melt::new(100, 0, 1);
        let users: Vec<Pubkey> = (0..3).map(|_| Pubkey::new_unique()).collect();
        m.deposit(100);
        m.start(0, T0).unwrap();
        for u in &users {
            m.contribute(*u, 0, 1, T0 + 1).unwrap();
        }
        let end = m.round(0).end_ts;
        m.finalize(0, end + 1).unwrap();

        let paid: u64 = users.iter().map(|u| m.claim(*u, 0, end + 2).unwrap()).sum();
        assert_eq!(paid, 99);
        let round = m.round(0);
        assert!(paid <= round.locked_payout_amount);
        assert!(round.locked_payout_amount - paid < round.total_contribution);
        assert_eq!(m.cfg.reserved_balance, 1);
    }

    #[test]
    fn single_contributor_takes_everything() {
        let mut m = Melt::new(50, 0, 1);
        let a = Pubkey::new_unique();
        m.deposit(77);
        m.start(0, T0).unwrap();
        m.contribute(a, 0, 3, T0).unwrap();
        let end = m.round(0).end_ts;
        m.finalize(0, end + 1).unwrap();
        assert_eq!(m.claim(a, 0, end + 1).unwrap(), 77);
    }

    #[test]
    fn locked_amount_ignores_later_deposits() {
        let mut m = Melt::new(100, 0, 1);
        let a = Pubkey::new_unique();
        m.deposit(120);
        m.start(0, T0).unwrap();
        m.deposit(500);
        m.contribute(a, 0, 5, T0 + 1).unwrap();
        m.deposit(7);
        let end = m.round(0).end_ts;
        m.finalize(0, end + 1).unwrap();
        m.deposit(9);

        assert_eq!(m.round(0).locked_payout_amount, 120);
        assert_eq!(m.cfg.vault_balance, 516);
        assert_eq!(m.claim(a, 0, end + 2).unwrap(), 120);
        assert_eq!(m.round(0).locked_payout_amount, 120);
    }

    #[test]
    fn contribute_window_is_inclusive_of_end() {
        let mut m = Melt::new(100, 0, 1);
        let a = Pubkey::new_unique();
        m.deposit(100);
        m.start(0, T0).unwrap();
        let end = m.round(0).end_ts;
        assert_eq!(end, T0 + 600);

        m.contribute(a, 0, 1, end).unwrap();
        assert_melt_err(m.contribute(a, 0, 1, end + 1), MeltError::RoundNotActive);

        m.finalize(0, end + 1).unwrap();
        assert_melt_err(m.contribute(a, 0, 1, end), MeltError::BadRoundStatus);
        assert_eq!(m.round(0).total_contribution, 1);
    }

    #[test]
    fn contribute_and_claim_require_the_right_status() {
        let mut m = Melt::new(100, 0, 1);
        let a = Pubkey::new_unique();
        assert_melt_err(m.contribute(a, 0, 5, T0), MeltError::BadRoundStatus);

        m.deposit(100);
        m.start(0, T0).unwrap();
        m.contribute(a, 0, 5, T0).unwrap();
        assert_melt_err(m.claim(a, 0, T0 + 1), MeltError::BadRoundStatus);
        assert!(!m.user(a, 0).unwrap().claimed);
    }

    #[test]
    fn zero_contribution_round_finalizes_and_can_be_recycled() {
        let mut m = Melt::new(100, 0, 1);
        m.deposit(100);
        m.start(0, T0).unwrap();
        m.deposit(5);
        let end = m.round(0).end_ts;
        m.finalize(0, end + 1).unwrap();

        assert_eq!(m.cfg.reserved_balance, 100);
        assert_eq!(m.cfg.vault_balance, 5);

        assert_eq!(recycle_core(&mut m.cfg, &mut m.rounds[0]).unwrap(), 100);
        assert_eq!(m.cfg.reserved_balance, 0);
        assert_eq!(m.cfg.vault_balance, 105);
        assert!(m.round(0).recycled);
        assert_eq!(m.round(0).locked_payout_amount, 100);

        assert_melt_err(recycle_core(&mut m.cfg, &mut m.rounds[0]), MeltError::AlreadyRecycled);
    }

    #[test]
    fn recycle_refuses_rounds_with_contributors() {
        let mut m = Melt::new(100, 0, 1);
        m.deposit(100);
        m.start(0, T0).unwrap();
        assert_melt_err(recycle_core(&mut m.cfg, &mut m.rounds[0]), MeltError::BadRoundStatus);

        m.contribute(Pubkey::new_unique(), 0, 1, T0).unwrap();
        let end = m.round(0).end_ts;
        m.finalize(0, end + 1).unwrap();
        assert_melt_err(
            recycle_core(&mut m.cfg, &mut m.rounds[0]),
            MeltError::RoundHasContributors,
        );
    }

    #[test]
    fn rollover_is_held_back_and_released_at_finalize() {
        let mut m = Melt::new(1_000, 1_000, 1);
        let a = Pubkey::new_unique();
        m.deposit(1_000);
        m.start(0, T0).unwrap();

        let r = m.round(0);
        assert_eq!(r.pot, 1_000);
        assert_eq!(r.rollover_amount, 100);
        assert_eq!(r.locked_payout_amount, 900);
        assert_eq!(m.cfg.reserved_balance, 1_000);

        m.contribute(a, 0, 1, T0).unwrap();
        let end = m.round(0).end_ts;
        assert_eq!(m.finalize(0, end + 1).unwrap(), 100);
        assert_eq!(m.cfg.vault_balance, 100);
        assert_eq!(m.cfg.reserved_balance, 900);

        assert_eq!(m.claim(a, 0, end + 1).unwrap(), 900);
        assert_eq!(m.cfg.reserved_balance, 0);
    }

    #[test]
    fn only_one_round_is_active_and_seqs_increase() {
        let mut m = Melt::new(100, 0, 1);
        m.deposit(100);
        m.start(0, T0).unwrap();
        assert_eq!(m.cfg.next_round_seq, 2);
        assert_eq!(m.cfg.planned_round_seq(), 1);
        assert_eq!(m.round(1).seq, 1);
        assert_eq!(m.round(1).status, RoundStatus::Planned);
        assert_eq!(m.round(1).version, ACCOUNT_VERSION);

        m.deposit(100);
        assert_melt_err(m.start(1, T0 + 1), MeltError::RoundAlreadyActive);
        assert_melt_err(m.start(0, T0 + 1), MeltError::RoundAlreadyActive);
        assert_eq!(m.rounds.len(), 2);

        let end = m.round(0).end_ts;
        m.finalize(0, end + 1).unwrap();
        assert_melt_err(m.start(0, end + 2), MeltError::RoundNotScheduled);

        m.start(1, end + 2).unwrap();
        assert_eq!(m.round(1).locked_payout_amount, 100);
        assert_eq!(m.cfg.active_round_seq, 1);
        assert_eq!(m.cfg.next_round_seq, 3);

        let seqs: Vec<u64> = m.rounds.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        let active = m.rounds.iter().filter(|r| r.status == RoundStatus::Active).count();
        assert_eq!(active, 1);
    }

    #[test]
    fn forced_start_needs_admin_then_test_mode() {
        let mut cfg = config(150, 0, 1);
        let admin = cfg.admin;
        authorize_forced_start(&cfg, admin).unwrap();
        assert_melt_err(
            authorize_forced_start(&cfg, Pubkey::new_unique()),
            MeltError::Unauthorized,
        );

        cfg.test_mode = false;
        assert_melt_err(authorize_forced_start(&cfg, admin), MeltError::TestModeOnly);
        assert_melt_err(
            authorize_forced_start(&cfg, Pubkey::new_unique()),
            MeltError::Unauthorized,
        );
    }

    #[test]
    fn start_requires_fill_unless_forced() {
        let mut m = Melt::new(150, 0, 1);
        m.deposit(149);
        assert_melt_err(m.start(0, T0), MeltError::FillThresholdNotMet);
        assert_eq!(m.round(0).status, RoundStatus::Planned);
        assert_eq!(m.cfg.next_round_seq, 1);
        assert_eq!(m.cfg.vault_balance, 149);

        m.start_with(0, T0, false).unwrap();
        assert_eq!(m.round(0).locked_payout_amount, 149);
    }

    // ---- schedule ----

    #[test]
    fn schedule_validates_window() {
        let mut m = Melt::new(100, 0, 1);
        assert_melt_err(m.schedule(0, T0 - 1, T0 + 10, T0), MeltError::InvalidSchedule);
        assert_melt_err(m.schedule(0, T0 + 10, T0 + 10, T0), MeltError::InvalidSchedule);
        assert_melt_err(m.schedule(0, T0 + 10, T0 + 5, T0), MeltError::InvalidSchedule);
        assert_melt_err(
            m.schedule(0, T0, T0 + MAX_ROUND_WINDOW_SEC as i64 + 1, T0),
            MeltError::InvalidSchedule,
        );
        assert!(!m.round(0).scheduled);

        m.schedule(0, T0, T0 + 10, T0).unwrap();
        m.schedule(0, T0 + 100, T0 + 200, T0).unwrap();
        assert_eq!((m.round(0).start_ts, m.round(0).end_ts), (T0 + 100, T0 + 200));
        assert_eq!(m.round(0).status, RoundStatus::Planned);
    }

    #[test]
    fn scheduled_window_gates_start() {
        let mut m = Melt::new(100, 0, 1);
        m.deposit(100);
        m.schedule(0, T0 + 100, T0 + 200, T0).unwrap();

        assert_melt_err(m.start(0, T0 + 99), MeltError::RoundNotStarted);
        assert_melt_err(m.start(0, T0 + 200), MeltError::ScheduleExpired);
        m.start(0, T0 + 150).unwrap();
        assert_eq!((m.round(0).start_ts, m.round(0).end_ts), (T0 + 100, T0 + 200));
        assert_eq!(m.round(0).started_ts, T0 + 150);
    }

    #[test]
    fn schedule_rejected_while_a_round_is_active() {
        let mut m = Melt::new(100, 0, 1);
        m.deposit(100);
        m.start(0, T0).unwrap();
        assert_melt_err(m.schedule(1, T0 + 10, T0 + 20, T0), MeltError::RoundAlreadyActive);

        let end = m.round(0).end_ts;
        m.finalize(0, end + 1).unwrap();
        assert_melt_err(m.schedule(0, end + 10, end + 20, end + 1), MeltError::RoundNotScheduled);
        m.schedule(1, end + 10, end + 20, end + 1).unwrap();
    }

    // ---- participant ledger ----

    #[test]
    fn ledger_records_are_write_once() {
        let mut rec = blank_user_round();
        let owner = Pubkey::new_unique();
        let round = Pubkey::new_unique();

        assert_melt_err(
            record_contribution(&mut rec, owner, round, 4, 7, 0, T0),
            MeltError::InvalidParams,
        );
        assert!(record_contribution(&mut rec, owner, round, 4, 7, 5, T0).unwrap());
        assert!(!record_contribution(&mut rec, owner, round, 4, 7, 5, T0 + 1).unwrap());
        assert_eq!(rec.contributed, 10);
        assert_eq!(rec.round_seq, 4);
        assert_eq!(rec.version, ACCOUNT_VERSION);

        assert_melt_err(
            record_contribution(&mut rec, Pubkey::new_unique(), round, 4, 7, 5, T0),
            MeltError::Unauthorized,
        );

        mark_claimed(&mut rec, 3, T0 + 2).unwrap();
        assert_melt_err(mark_claimed(&mut rec, 9, T0 + 3), MeltError::AlreadyClaimed);
        assert_eq!(rec.payout, 3);
        assert!(rec.claimed);
    }

    #[test]
    fn claim_detects_inconsistent_totals() {
        let mut m = Melt::new(100, 0, 1);
        let a = Pubkey::new_unique();
        m.deposit(100);
        m.start(0, T0).unwrap();
        m.contribute(a, 0, 10, T0).unwrap();
        let end = m.round(0).end_ts;
        m.finalize(0, end + 1).unwrap();

        // a total that shrank below a single record is unsound
        m.rounds[0].total_contribution = 5;
        assert_melt_err(m.claim(a, 0, end + 2), MeltError::InvariantViolation);
        assert!(!m.user(a, 0).unwrap().claimed);
    }

    // ---- keeper plan ----

    #[test]
    fn keeper_plan_follows_the_lifecycle() {
        let mut m = Melt::new(100, 0, 1);
        let p = plan_keeper_action(&m.cfg, m.round(0), m.round(0), T0);
        assert_eq!(p.action, KeeperAction::AwaitFill);
        assert_eq!(p.round_seq, 0);

        m.deposit(100);
        let p = plan_keeper_action(&m.cfg, m.round(0), m.round(0), T0);
        assert_eq!(p.action, KeeperAction::StartRound);
        assert_eq!(p.vault_balance, 100);

        m.schedule(0, T0 + 50, T0 + 100, T0).unwrap();
        let p = plan_keeper_action(&m.cfg, m.round(0), m.round(0), T0);
        assert_eq!((p.action, p.ready_at), (KeeperAction::AwaitStart, T0 + 50));
        let p = plan_keeper_action(&m.cfg, m.round(0), m.round(0), T0 + 100);
        assert_eq!(p.action, KeeperAction::AwaitSchedule);

        m.start(0, T0 + 60).unwrap();
        let p = plan_keeper_action(&m.cfg, m.round(1), m.round(0), T0 + 100);
        assert_eq!((p.action, p.round_seq, p.ready_at), (KeeperAction::AwaitEnd, 0, T0 + 101));
        let p = plan_keeper_action(&m.cfg, m.round(1), m.round(0), T0 + 101);
        assert_eq!(p.action, KeeperAction::FinalizeRound);

        // the plan agrees with what the transition would do
        m.finalize(0, T0 + 101).unwrap();
        let p = plan_keeper_action(&m.cfg, m.round(1), m.round(0), T0 + 101);
        assert_eq!((p.action, p.round_seq), (KeeperAction::AwaitFill, 1));
    }
}
