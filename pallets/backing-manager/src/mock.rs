extern crate alloc;

use crate as pallet_backing_manager;
use crate::{JoinRequest, StaticOrderParams};
use codec::Encode;
use polkadot_sdk::frame_support::traits::fungibles::{Inspect, Mutate};
use polkadot_sdk::frame_support::traits::tokens::Preservation;
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl,
  traits::{ConstU32, ConstU64, ConstU128, Get, UnixTime},
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_core::H256;
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError, DispatchResult, Permill,
  traits::{BlakeTwo256, IdentityLookup, IntegerSquareRoot},
};
use primitives::{MASK_INDEX, TYPE_PERSONAL, params, well_known};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Burn address for the pool engine's bootstrap shares
pub const DEAD_ACCOUNT: u64 = u64::MAX;

/// Pool shares permanently minted to `DEAD_ACCOUNT` on the initial join
pub const BOOTSTRAP_SHARES: u128 = 1_000;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MockPool {
  pub assets: [u32; 2],
  pub weights: [Permill; 2],
  pub swap_fee: Permill,
  pub owner: u64,
  pub swap_enabled: bool,
  pub schedule: Option<(u64, u64, [Permill; 2])>,
}

thread_local! {
    pub static NOW: RefCell<u64> = const { RefCell::new(0) };
    pub static HUMANS: RefCell<BTreeSet<u64>> = const { RefCell::new(BTreeSet::new()) };
    pub static REGISTERED_ORDERS: RefCell<BTreeMap<H256, (u64, StaticOrderParams)>> = const { RefCell::new(BTreeMap::new()) };
    pub static PRE_SIGNATURES: RefCell<BTreeMap<H256, bool>> = const { RefCell::new(BTreeMap::new()) };
    pub static FILLS: RefCell<BTreeMap<H256, u128>> = const { RefCell::new(BTreeMap::new()) };
    pub static POOLS: RefCell<BTreeMap<u32, MockPool>> = const { RefCell::new(BTreeMap::new()) };
    pub static NEXT_POOL_INDEX: RefCell<u32> = const { RefCell::new(1) };
    pub static ESTIMATES: RefCell<BTreeMap<(u32, u32), u128>> = const { RefCell::new(BTreeMap::new()) };
}

pub fn set_now(secs: u64) {
  NOW.with(|n| *n.borrow_mut() = secs);
}

pub fn advance_time(secs: u64) {
  NOW.with(|n| *n.borrow_mut() += secs);
}

pub fn current_time() -> u64 {
  NOW.with(|n| *n.borrow())
}

pub fn register_human(who: u64) {
  HUMANS.with(|h| {
    h.borrow_mut().insert(who);
  });
}

pub fn set_estimate(sell: u32, buy: u32, buy_amount: u128) {
  ESTIMATES.with(|e| {
    e.borrow_mut().insert((sell, buy), buy_amount);
  });
}

pub fn registered_params(uid: H256) -> Option<(u64, StaticOrderParams)> {
  REGISTERED_ORDERS.with(|r| r.borrow().get(&uid).cloned())
}

pub fn pre_signature(uid: H256) -> bool {
  PRE_SIGNATURES.with(|p| p.borrow().get(&uid).copied().unwrap_or(false))
}

pub fn pool_info(pool: u32) -> Option<MockPool> {
  POOLS.with(|p| p.borrow().get(&pool).cloned())
}

/// Custody account holding a mock pool's two-sided reserves
pub fn pool_custody_account(pool: u32) -> u64 {
  9_000_000_000 + u64::from(pool & MASK_INDEX)
}

/// Personal-token asset id the mock ledger issues for an avatar
pub fn personal_token_id(avatar: u64) -> u32 {
  TYPE_PERSONAL | (avatar as u32 & MASK_INDEX)
}

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    Assets: polkadot_sdk::pallet_assets,
    BackingManager: pallet_backing_manager,
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

/// Ledger hub: humanity set plus identity-carrying personal-token ids
pub struct MockLedger;
impl pallet_backing_manager::PersonalLedger<u64> for MockLedger {
  fn is_human(who: &u64) -> bool {
    HUMANS.with(|h| h.borrow().contains(who))
  }

  fn identity_of(token_id: u32) -> Option<u64> {
    if (token_id & primitives::MASK_TYPE) == TYPE_PERSONAL {
      Some(u64::from(token_id & MASK_INDEX))
    } else {
      None
    }
  }

  fn wrap(avatar: &u64, amount: u128) -> Result<u32, DispatchError> {
    let asset = personal_token_id(*avatar);
    if !Assets::asset_exists(asset) {
      Assets::force_create(RuntimeOrigin::root(), asset, *avatar, true, 1)?;
    }
    Assets::mint_into(asset, &BackingManager::account_id(), amount)?;
    Ok(asset)
  }
}

/// Settlement venue: order registry, pre-signature flags and fill reports
pub struct MockVenue;
impl pallet_backing_manager::SettlementVenue<u64> for MockVenue {
  fn register_order(owner: &u64, uid: H256, params: StaticOrderParams) -> DispatchResult {
    REGISTERED_ORDERS.with(|r| {
      r.borrow_mut().insert(uid, (*owner, params));
    });
    Ok(())
  }

  fn set_pre_signature(_owner: &u64, uid: H256, signed: bool) -> DispatchResult {
    PRE_SIGNATURES.with(|p| {
      p.borrow_mut().insert(uid, signed);
    });
    Ok(())
  }

  fn filled_amount(uid: &H256) -> u128 {
    FILLS.with(|f| f.borrow().get(uid).copied().unwrap_or(0))
  }
}

/// Settle an instance's standing order: pull the stable sell leg, deliver
/// `backing_amount` of the backing asset, and report the fill.
pub fn simulate_fill(instance: u64, backing_amount: u128) {
  let rec = BackingManager::instances(instance).expect("instance exists");
  <Assets as Mutate<u64>>::transfer(
    well_known::USDC,
    &instance,
    &DEAD_ACCOUNT,
    rec.escrowed_stable,
    Preservation::Expendable,
  )
  .expect("sell leg settles");
  Assets::mint_into(rec.backing_asset, &instance, backing_amount).expect("buy leg settles");
  FILLS.with(|f| {
    f.borrow_mut().insert(rec.order_uid, backing_amount);
  });
}

/// Report a fill without delivering the asset (a lying venue)
pub fn report_fill_without_delivery(instance: u64, backing_amount: u128) {
  let rec = BackingManager::instances(instance).expect("instance exists");
  FILLS.with(|f| {
    f.borrow_mut().insert(rec.order_uid, backing_amount);
  });
}

/// Pool engine: two-asset pools with receipt minting and a weight schedule
pub struct MockLbp;
impl pallet_backing_manager::LbpEngine<u64> for MockLbp {
  fn create_pool(
    owner: &u64,
    assets: [u32; 2],
    weights: [Permill; 2],
    swap_fee: Permill,
    swap_enabled: bool,
  ) -> Result<u32, DispatchError> {
    let index = NEXT_POOL_INDEX.with(|n| {
      let mut next = n.borrow_mut();
      let current = *next;
      *next += 1;
      current
    });
    let pool = primitives::TYPE_LP | index;
    Assets::force_create(RuntimeOrigin::root(), pool, *owner, true, 1)?;
    POOLS.with(|p| {
      p.borrow_mut().insert(
        pool,
        MockPool {
          assets,
          weights,
          swap_fee,
          owner: *owner,
          swap_enabled,
          schedule: None,
        },
      );
    });
    Ok(pool)
  }

  fn join_pool(pool: u32, sender: &u64, recipient: &u64, request: JoinRequest) -> DispatchResult {
    let info =
      POOLS.with(|p| p.borrow().get(&pool).cloned()).ok_or(DispatchError::Other("unknown pool"))?;
    if request.assets != info.assets {
      return Err(DispatchError::Other("token order mismatch"));
    }

    let custody = pool_custody_account(pool);
    for i in 0..2 {
      <Assets as Mutate<u64>>::transfer(
        request.assets[i],
        sender,
        &custody,
        request.max_amounts[i],
        Preservation::Expendable,
      )?;
    }

    let total_shares = request.max_amounts[0]
      .checked_mul(request.max_amounts[1])
      .ok_or(DispatchError::Other("share overflow"))?
      .integer_sqrt();
    if total_shares <= BOOTSTRAP_SHARES {
      return Err(DispatchError::Other("insufficient join"));
    }
    Assets::mint_into(pool, &DEAD_ACCOUNT, BOOTSTRAP_SHARES)?;
    Assets::mint_into(pool, recipient, total_shares - BOOTSTRAP_SHARES)?;

    Ok(())
  }

  fn schedule_weight_change(
    pool: u32,
    start: u64,
    end: u64,
    end_weights: [Permill; 2],
  ) -> DispatchResult {
    POOLS.with(|p| {
      let mut pools = p.borrow_mut();
      let info = pools.get_mut(&pool).ok_or(DispatchError::Other("unknown pool"))?;
      info.schedule = Some((start, end, end_weights));
      Ok(())
    })
  }
}

/// Estimator: fixed per-pair quotes set by tests
pub struct MockEstimate;
impl pallet_backing_manager::ValueEstimate for MockEstimate {
  fn estimate(sell_asset: u32, _sell_amount: u128, buy_asset: u32) -> Result<u128, DispatchError> {
    Ok(
      ESTIMATES
        .with(|e| e.borrow().get(&(sell_asset, buy_asset)).copied())
        .unwrap_or(1),
    )
  }
}

pub struct BackingPalletId;
impl Get<PalletId> for BackingPalletId {
  fn get() -> PalletId {
    PalletId(*primitives::pallet_ids::BACKING_MANAGER_PALLET_ID)
  }
}

impl pallet_backing_manager::Config for Test {
  type Assets = Assets;
  type Ledger = MockLedger;
  type SettlementVenue = MockVenue;
  type LbpEngine = MockLbp;
  type ValueEstimate = MockEstimate;
  type TimeProvider = MockTime;
  type AdminOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type StableAsset = ConstU32<{ well_known::USDC }>;
  type RequiredStableAmount = ConstU128<{ params::REQUIRED_STABLE_AMOUNT }>;
  type RequiredPersonalAmount = ConstU128<{ params::REQUIRED_PERSONAL_AMOUNT }>;
  type OrderValidity = ConstU64<{ params::ORDER_VALIDITY_SECS }>;
  type LockDuration = ConstU64<{ params::LOCK_DURATION_SECS }>;
  type WeightShiftDuration = ConstU64<{ params::WEIGHT_SHIFT_DURATION_SECS }>;
  type PalletId = BackingPalletId;
  type WeightInfo = ();
}

/// Fund a backer's stablecoin account
pub fn fund_stable(who: u64, amount: u128) {
  Assets::mint_into(well_known::USDC, &who, amount).expect("mint stable");
}

/// Run the ledger's transfer notification for a self-deposit
pub fn deposit_for(backer: u64, backing_asset: u32) -> DispatchResult {
  <BackingManager as pallet_backing_manager::TokenDepositHandler<u64>>::on_deposit(
    &backer,
    &backer,
    personal_token_id(backer),
    params::REQUIRED_PERSONAL_AMOUNT,
    &backing_asset.encode(),
  )
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

  // Factory account gets a provider ref (ED-free)
  pallet_backing_manager::GenesisConfig::<Test>::default()
    .assimilate_storage(&mut t)
    .unwrap();

  NOW.with(|n| *n.borrow_mut() = 1_700_000_000);
  HUMANS.with(|h| {
    let mut humans = h.borrow_mut();
    humans.clear();
    humans.extend([1, 2, 3]);
  });
  REGISTERED_ORDERS.with(|r| r.borrow_mut().clear());
  PRE_SIGNATURES.with(|p| p.borrow_mut().clear());
  FILLS.with(|f| f.borrow_mut().clear());
  POOLS.with(|p| p.borrow_mut().clear());
  NEXT_POOL_INDEX.with(|n| *n.borrow_mut() = 1);
  ESTIMATES.with(|e| {
    let mut estimates = e.borrow_mut();
    estimates.clear();
    // 100 USDC ~ 0.03 WETH / 0.0015 WBTC at the default quotes
    estimates.insert((well_known::USDC, well_known::WETH), 30_000_000_000_000_000);
    estimates.insert((well_known::USDC, well_known::WBTC), 150_000);
  });

  t.into()
}
