extern crate alloc;

use crate as pallet_value_estimator;
use crate::PriceQuote;
use polkadot_sdk::frame_support::{
  construct_runtime, derive_impl,
  traits::{ConstU32, ConstU64, ConstU128, UnixTime},
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_runtime::{
  BuildStorage,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};
use primitives::{params, well_known};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::Duration;

thread_local! {
    pub static NOW: RefCell<u64> = const { RefCell::new(0) };
    pub static PRICES: RefCell<BTreeMap<u32, PriceQuote>> = const { RefCell::new(BTreeMap::new()) };
}

pub fn set_now(secs: u64) {
  NOW.with(|n| *n.borrow_mut() = secs);
}

pub fn current_time() -> u64 {
  NOW.with(|n| *n.borrow())
}

pub fn set_price(asset: u32, price: u128, decimals: u8, updated_at: u64) {
  PRICES.with(|p| {
    p.borrow_mut().insert(
      asset,
      PriceQuote {
        price,
        decimals,
        updated_at,
      },
    );
  });
}

pub fn clear_price(asset: u32) {
  PRICES.with(|p| {
    p.borrow_mut().remove(&asset);
  });
}

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    Assets: polkadot_sdk::pallet_assets,
    ValueEstimator: pallet_value_estimator,
  }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
  type Block = Block;
  type AccountId = u64;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Hash = H256;
  type Hashing = BlakeTwo256;
  type AccountData = polkadot_sdk::pallet_balances::AccountData<u128>;
}

impl polkadot_sdk::pallet_balances::Config for Test {
  type MaxLocks = ();
  type MaxReserves = ();
  type ReserveIdentifier = [u8; 8];
  type Balance = u128;
  type DustRemoval = ();
  type RuntimeEvent = RuntimeEvent;
  type ExistentialDeposit = ConstU128<1>;
  type AccountStore = System;
  type WeightInfo = ();
  type FreezeIdentifier = ();
  type MaxFreezes = ();
  type RuntimeHoldReason = ();
  type RuntimeFreezeReason = ();
  type DoneSlashHandler = ();
}

impl polkadot_sdk::pallet_assets::Config for Test {
  type RuntimeEvent = RuntimeEvent;
  type Balance = u128;
  type AssetId = u32;
  type AssetIdParameter = u32;
  type Currency = Balances;
  type CreateOrigin = polkadot_sdk::frame_support::traits::AsEnsureOriginWithArg<
    frame_system::EnsureSigned<Self::AccountId>,
  >;
  type ForceOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type AssetDeposit = ConstU128<1>;
  type AssetAccountDeposit = ConstU128<1>;
  type MetadataDepositBase = ConstU128<1>;
  type MetadataDepositPerByte = ConstU128<1>;
  type ApprovalDeposit = ConstU128<1>;
  type StringLimit = ConstU32<50>;
  type Freezer = ();
  type Extra = ();
  type CallbackHandle = ();
  type WeightInfo = ();
  type RemoveItemsLimit = ConstU32<5>;
  type Holder = ();
  type ReserveData = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = ();
}

/// Wall clock driven by the `NOW` thread local
pub struct MockTime;
impl UnixTime for MockTime {
  fn now() -> Duration {
    Duration::from_secs(current_time())
  }
}

/// Oracle aggregation backed by the `PRICES` thread local
pub struct MockFeed;
impl pallet_value_estimator::PriceFeed for MockFeed {
  fn latest(asset: u32) -> Option<PriceQuote> {
    PRICES.with(|p| p.borrow().get(&asset).copied())
  }
}

impl pallet_value_estimator::Config for Test {
  type Assets = Assets;
  type PriceFeed = MockFeed;
  type TimeProvider = MockTime;
  type AdminOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type StalenessWindow = ConstU64<{ params::ORACLE_STALENESS_SECS }>;
  type WeightInfo = ();
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  polkadot_sdk::pallet_assets::GenesisConfig::<Test> {
    assets: alloc::vec![
      (well_known::USDC, 999, true, 1),
      (well_known::WETH, 999, true, 1),
      (well_known::WBTC, 999, true, 1),
    ],
    metadata: alloc::vec![
      (well_known::USDC, b"USD Coin".to_vec(), b"USDC".to_vec(), 6),
      (well_known::WETH, b"Wrapped Ether".to_vec(), b"WETH".to_vec(), 18),
      (well_known::WBTC, b"Wrapped Bitcoin".to_vec(), b"WBTC".to_vec(), 8),
    ],
    accounts: alloc::vec![],
    reserves: alloc::vec![],
    next_asset_id: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  NOW.with(|n| *n.borrow_mut() = 1_700_000_000);
  PRICES.with(|p| p.borrow_mut().clear());

  t.into()
}
