//! Ecosystem Constants for the Backing Parachain
//!
//! This module centralizes all system-level constants: pallet IDs for
//! deterministic account derivation, the instance code fingerprint, and the
//! economic parameters of the backing flow.
//!
//! These constants are the single source of truth for system architecture and
//! are re-used across all runtime configurations via the primitives crate.

/// Balance type alias for consistency across ecosystem
pub type Balance = u128;

/// Unix-seconds timestamp type used for every time comparison in the system
pub type Seconds = u64;

/// Pallet identifiers for deriving pallet-owned accounts.
///
/// These IDs are used by Polkadot SDK's `PalletId::into_account_truncating()`
/// to deterministically generate accounts for pallet-specific operations.
///
/// Using `modl` prefix (Substrate standard) ensures type safety and prevents
/// collision with user accounts.
pub mod pallet_ids {
  /// Backing Manager pallet ID (factory account + instance derivation base)
  pub const BACKING_MANAGER_PALLET_ID: &[u8; 8] = b"bkngfcty";

  /// Fingerprint of the instance derivation scheme.
  ///
  /// Folded into every instance-account seed so that a future revision of the
  /// derivation logic produces a disjoint address space (a new deployment
  /// generation) instead of colliding with live instances.
  pub const INSTANCE_CODE_FINGERPRINT: [u8; 32] = *b"backing-instance-v1\0\0\0\0\0\0\0\0\0\0\0\0\0";
}

/// Ecosystem parameters defining amounts, durations and thresholds.
///
/// These parameters are global across all pallets and coordinate the
/// economic properties of the backing flow.
pub mod params {
  use super::{Balance, Seconds};
  use sp_arithmetic::Permill;

  /// Precision scalar for personal-token amounts (10^12).
  pub const PRECISION: Balance = 1_000_000_000_000;

  /// Fixed stablecoin commitment per backing (100.0 at 6 decimals).
  ///
  /// Deposits must match this amount exactly; no partial or over-commitment
  /// is accepted.
  pub const REQUIRED_STABLE_AMOUNT: Balance = 100_000_000;

  /// Fixed personal-token commitment per backing (48.0 at `PRECISION`).
  pub const REQUIRED_PERSONAL_AMOUNT: Balance = 48 * PRECISION;

  /// Validity horizon of the swap order (1 day).
  ///
  /// Once `valid_to` passes with no fill, pool creation falls back to the
  /// stablecoin escrow as the backing contribution.
  pub const ORDER_VALIDITY_SECS: Seconds = 86_400;

  /// Pool-receipt lock duration (1 year).
  pub const LOCK_DURATION_SECS: Seconds = 365 * 86_400;

  /// LBP weight interpolation window (1 year).
  ///
  /// Weights shift linearly from the initial skewed split to an even split
  /// over this window, starting at pool creation.
  pub const WEIGHT_SHIFT_DURATION_SECS: Seconds = 365 * 86_400;

  /// Price-feed staleness window (1 day).
  ///
  /// A reading older than this is treated the same as an absent reading.
  pub const ORACLE_STALENESS_SECS: Seconds = 86_400;

  /// Initial LBP weight of the personal token (10%).
  pub const INITIAL_PERSONAL_WEIGHT: Permill = Permill::from_percent(10);

  /// Initial LBP weight of the backing asset (90%).
  pub const INITIAL_BACKING_WEIGHT: Permill = Permill::from_percent(90);

  /// Terminal LBP weight of both assets after the shift window (50/50).
  pub const FINAL_WEIGHT: Permill = Permill::from_percent(50);

  /// Swap fee charged by every backing LBP (1%).
  pub const LBP_SWAP_FEE: Permill = Permill::from_percent(1);

  /// Default estimator slippage haircut (5%), admin-adjustable within the
  /// exclusive interval (0%, 100%).
  pub const DEFAULT_SLIPPAGE: Permill = Permill::from_percent(5);

  /// Gas budget advertised in the order metadata for the post-settlement
  /// callback into the instance.
  pub const SETTLEMENT_CALLBACK_GAS: u64 = 6_000_000;
}
