// Centralized Protocol Constants

// Amount math
// ===========

/// Basis-point denominator. 10_000 bps = 100%.
pub const BPS_DENOMINATOR: u64 = 10_000;

// Round identity
// ==============

/// Sequence number of the Planned round created by `init_melt`.
pub const INITIAL_ROUND_SEQ: u64 = 0;

// Centralized Protocol Defaults
// =============================

/// Default active window (seconds) when a round starts without a schedule.
/// Dev default; check current config.
pub const DEFAULT_ROUND_WINDOW_SEC: u64 = 3_600;

/// Hard ceiling for the active window. One week keeps scheduled rounds from
/// locking the pot indefinitely.
pub const MAX_ROUND_WINDOW_SEC: u64 = 7 * 24 * 3_600;

// Account versions
// ================

/// Current layout version for MeltConfig, MeltRound and MeltUserRound.
/// The unversioned first-deployment layouts count as version 1.
pub const ACCOUNT_VERSION: u16 = 2;

/// Version reported for records decoded from the legacy layouts.
pub const LEGACY_ACCOUNT_VERSION: u16 = 1;

/// Anchor discriminator length prefixed to every account.
pub const DISCRIMINATOR_LEN: usize = 8;
