use anchor_lang::prelude::*;

#[error_code]
pub enum MeltError {
    #[msg("Unauthorized")]
    Unauthorized,
    #[msg("Invalid params")]
    InvalidParams,
    #[msg("Math overflow")]
    MathOverflow,

    // -----------------
    // Round sequencing
    // -----------------
    #[msg("Round is not the planned round")]
    RoundNotScheduled,
    #[msg("Another round is already active")]
    RoundAlreadyActive,
    #[msg("Round window has not started yet")]
    RoundNotStarted,
    #[msg("Round window is closed")]
    RoundNotActive,
    #[msg("Round has not ended yet")]
    RoundNotEnded,
    #[msg("Bad round status")]
    BadRoundStatus,
    #[msg("Scheduled window already passed, reschedule the round")]
    ScheduleExpired,

    // -----------------
    // Validation
    // -----------------
    #[msg("Invalid schedule (requires now <= start < end)")]
    InvalidSchedule,
    #[msg("Contribution below minimum")]
    BelowMinimum,
    #[msg("Vault fill threshold not met")]
    FillThresholdNotMet,
    #[msg("Round has contributors")]
    RoundHasContributors,

    // -----------------
    // Replay
    // -----------------
    #[msg("Already claimed")]
    AlreadyClaimed,
    #[msg("Round already recycled")]
    AlreadyRecycled,

    // -----------------
    // Resources
    // -----------------
    #[msg("Insufficient vault funds")]
    InsufficientFunds,
    #[msg("Admin withdraw disabled outside test mode")]
    WithdrawDisabled,
    #[msg("Nothing to claim")]
    NothingToClaim,

    #[msg("Round accounting invariant violated")]
    InvariantViolation,

    // -----------------
    // Migration
    // -----------------
    #[msg("Unsupported account layout")]
    UnsupportedLayout,
    #[msg("Account already on the current layout")]
    AlreadyMigrated,

    #[msg("Only available in test mode")]
    TestModeOnly,
}
