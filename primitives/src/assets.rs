use codec::{Decode, DecodeWithMemTracking, Encode};
use scale_info::TypeInfo;
use serde::{Deserialize, Serialize};

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

/// Asset identifier used across all pallets.
///
/// Every token the backing flow touches is a `pallet-assets` fungible, so a
/// plain `u32` id with a namespace prefix is sufficient: stablecoins, backing
/// assets, per-human personal tokens and LBP pool receipts all live in the
/// same registry and are told apart by their type nibble.
pub type AssetId = u32;

// Bitmask Architecture for Asset Classification
//
// 32-bit ID Structure:
// [ 4 bits: Type ] [ 28 bits: Index/ID ]
//
// Types:
// 0x1... -> Standard Tokens (WETH, WBTC, staked-ether assets); the only ids
//           eligible for the backing-asset whitelist
// 0x2... -> Stablecoins (USDC, USDT); the escrow currency namespace
// 0x4... -> LBP pool receipts minted by the pool engine
// 0x5... -> Personal tokens issued by the ledger hub (one per human avatar)

pub const MASK_TYPE: u32 = 0xF000_0000;
pub const MASK_INDEX: u32 = 0x0FFF_FFFF;

pub const TYPE_STD: u32 = 0x1000_0000;
pub const TYPE_STABLE: u32 = 0x2000_0000;
pub const TYPE_LP: u32 = 0x4000_0000;
pub const TYPE_PERSONAL: u32 = 0x5000_0000;

/// Helper trait to inspect asset-id namespaces
pub trait AssetClass {
  fn is_standard(&self) -> bool;
  fn is_stable(&self) -> bool;
  fn is_pool_receipt(&self) -> bool;
  fn is_personal(&self) -> bool;
  fn index(&self) -> u32;
}

impl AssetClass for AssetId {
  fn is_standard(&self) -> bool {
    (self & MASK_TYPE) == TYPE_STD
  }

  fn is_stable(&self) -> bool {
    (self & MASK_TYPE) == TYPE_STABLE
  }

  fn is_pool_receipt(&self) -> bool {
    (self & MASK_TYPE) == TYPE_LP
  }

  fn is_personal(&self) -> bool {
    (self & MASK_TYPE) == TYPE_PERSONAL
  }

  fn index(&self) -> u32 {
    self & MASK_INDEX
  }
}

/// Helper to construct compile-time IDs
pub const fn make_id(type_mask: u32, index: u32) -> u32 {
  type_mask | (index & MASK_INDEX)
}

/// Well-known asset constants serving as system defaults
pub mod well_known {
  use super::*;

  // Standard Tokens (0x1...): backing-asset candidates
  pub const WETH: u32 = make_id(TYPE_STD, 1);
  pub const WBTC: u32 = make_id(TYPE_STD, 2);
  pub const STETH: u32 = make_id(TYPE_STD, 3);

  // Stablecoins (0x2...)
  pub const USDC: u32 = make_id(TYPE_STABLE, 1);
  pub const USDT: u32 = make_id(TYPE_STABLE, 2);
}

/// Metadata container for currencies
#[derive(Encode, Decode, DecodeWithMemTracking, Eq, PartialEq, Clone, Debug, TypeInfo)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct CurrencyMetadata {
  pub name: Vec<u8>,
  pub symbol: Vec<u8>,
  pub decimals: u8,
}

/// Helper to resolve metadata for well-known assets (off-chain / view logic)
pub fn well_known_metadata(asset: AssetId) -> Option<CurrencyMetadata> {
  match asset {
    well_known::WETH => Some(CurrencyMetadata {
      name: b"Wrapped Ether".to_vec(),
      symbol: b"WETH".to_vec(),
      decimals: 18,
    }),
    well_known::WBTC => Some(CurrencyMetadata {
      name: b"Wrapped Bitcoin".to_vec(),
      symbol: b"WBTC".to_vec(),
      decimals: 8,
    }),
    well_known::STETH => Some(CurrencyMetadata {
      name: b"Staked Ether".to_vec(),
      symbol: b"stETH".to_vec(),
      decimals: 18,
    }),
    well_known::USDC => Some(CurrencyMetadata {
      name: b"USD Coin".to_vec(),
      symbol: b"USDC".to_vec(),
      decimals: 6,
    }),
    well_known::USDT => Some(CurrencyMetadata {
      name: b"Tether USD".to_vec(),
      symbol: b"USDT".to_vec(),
      decimals: 6,
    }),
    _ => None,
  }
}
