//! Backing Manager Pallet
//!
//! Factory and per-backer instance coordination for personal-token backing:
//! a human commits a fixed stablecoin amount plus a fixed amount of their
//! personal token, the escrow is routed through a batch-auction settlement
//! venue to acquire a chosen backing asset, and the proceeds seed a
//! liquidity-bootstrapping pool whose ownership receipt stays locked in the
//! instance for a fixed period.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod order;
pub use order::{OrderEvaluator, OrderRejection, OrderTerms, StaticOrderParams};

#[cfg(test)]
pub mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;
pub use weights::WeightInfo;

use codec::{Decode, Encode};
use frame::deps::sp_runtime::{DispatchError, DispatchResult, Permill};
use polkadot_sdk::sp_core::H256;
use primitives::{AssetId, Balance, Seconds};
use scale_info::TypeInfo;

/// Ledger hub tracking avatar identity and issuing personal tokens.
///
/// The hub invokes [`TokenDepositHandler::on_deposit`] synchronously whenever
/// personal tokens are transferred to the factory, and converts raw hub units
/// into the transferable fungible representation on request.
pub trait PersonalLedger<AccountId> {
  /// Whether the account is registered as an individual (not a group or
  /// organization avatar).
  fn is_human(who: &AccountId) -> bool;

  /// The avatar a personal-token id belongs to.
  fn identity_of(token_id: AssetId) -> Option<AccountId>;

  /// Convert `amount` raw units of `avatar`'s personal token into its
  /// transferable fungible asset, credited to the factory account. Returns
  /// the asset id.
  fn wrap(avatar: &AccountId, amount: Balance) -> Result<AssetId, DispatchError>;
}

/// Batch-auction settlement venue holding registered conditional orders.
pub trait SettlementVenue<AccountId> {
  /// Register the order with the venue's off-chain discovery mechanism,
  /// handing over the opaque parameter blob replayed into
  /// [`OrderEvaluator::evaluate`] on every poll.
  fn register_order(owner: &AccountId, uid: H256, params: StaticOrderParams) -> DispatchResult;

  /// Flag the order as executable without a cryptographic signature.
  fn set_pre_signature(owner: &AccountId, uid: H256, signed: bool) -> DispatchResult;

  /// Settled sell amount for the order; zero means unfilled.
  fn filled_amount(uid: &H256) -> Balance;
}

/// Join-kind discriminant understood by the pool engine. Backing instances
/// only ever perform the initial two-asset join.
#[derive(Clone, Copy, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub enum JoinKind {
  Init,
}

/// Structured join request consumed by the pool engine. Token order must
/// match the order the pool was created with.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub struct JoinRequest {
  pub assets: [AssetId; 2],
  pub max_amounts: [Balance; 2],
  pub kind: JoinKind,
  /// Pull from venue-internal balances instead of direct ones; always false
  /// for backing joins.
  pub from_internal: bool,
}

/// Liquidity-bootstrapping pool engine.
pub trait LbpEngine<AccountId> {
  /// Deploy a two-asset pool with the given initial weights, returning the
  /// pool id, which doubles as the pool-receipt asset id.
  fn create_pool(
    owner: &AccountId,
    assets: [AssetId; 2],
    weights: [Permill; 2],
    swap_fee: Permill,
    swap_enabled: bool,
  ) -> Result<AssetId, DispatchError>;

  /// Execute a join, debiting `sender` and minting pool receipts to
  /// `recipient`.
  fn join_pool(
    pool: AssetId,
    sender: &AccountId,
    recipient: &AccountId,
    request: JoinRequest,
  ) -> DispatchResult;

  /// Schedule a linear interpolation of the pool weights between the two
  /// timestamps.
  fn schedule_weight_change(
    pool: AssetId,
    start: Seconds,
    end: Seconds,
    end_weights: [Permill; 2],
  ) -> DispatchResult;
}

/// Fair-minimum-output estimator for the swap leg.
pub trait ValueEstimate {
  fn estimate(
    sell_asset: AssetId,
    sell_amount: Balance,
    buy_asset: AssetId,
  ) -> Result<Balance, DispatchError>;
}

/// Transfer-notification callback surface of the factory. The runtime wires
/// the ledger hub (and nothing else) to this hook; it fires synchronously
/// within the transfer transaction.
pub trait TokenDepositHandler<AccountId> {
  fn on_deposit(
    operator: &AccountId,
    from: &AccountId,
    token_id: AssetId,
    amount: Balance,
    data: &[u8],
  ) -> DispatchResult;
}

#[frame::pallet]
pub mod pallet {
  use super::{
    JoinKind, JoinRequest, LbpEngine, PersonalLedger, SettlementVenue, ValueEstimate, WeightInfo,
    order,
  };
  use alloc::vec::Vec;
  use frame::deps::frame_support::{
    PalletId,
    traits::{
      EnsureOrigin, UnixTime,
      fungibles::{Inspect as FungiblesInspect, Mutate as FungiblesMutate},
      tokens::Preservation,
    },
  };
  use frame::deps::sp_runtime::{DispatchError, traits::AccountIdConversion};
  use frame::prelude::*;
  use polkadot_sdk::sp_core::H256;
  use primitives::{AssetClass, AssetId, Balance, Seconds, pallet_ids, params};

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Asset management interface for fungible tokens
    type Assets: FungiblesInspect<Self::AccountId, AssetId = AssetId, Balance = Balance>
      + FungiblesMutate<Self::AccountId, AssetId = AssetId, Balance = Balance>;
    /// Ledger hub tracking avatar identity and wrapping personal tokens
    type Ledger: super::PersonalLedger<Self::AccountId>;
    /// Settlement venue the orders are registered with
    type SettlementVenue: super::SettlementVenue<Self::AccountId>;
    /// Pool engine the backing proceeds are deposited into
    type LbpEngine: super::LbpEngine<Self::AccountId>;
    /// Minimum-output estimator consulted at order construction time
    type ValueEstimate: super::ValueEstimate;
    /// Wall-clock source for expiry and lock evaluation
    type TimeProvider: UnixTime;
    /// Origin allowed to manage asset support and the global release override
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;
    /// Stablecoin escrowed by every backing
    #[pallet::constant]
    type StableAsset: Get<AssetId>;
    /// Exact stablecoin commitment per backing
    #[pallet::constant]
    type RequiredStableAmount: Get<Balance>;
    /// Exact personal-token commitment per backing
    #[pallet::constant]
    type RequiredPersonalAmount: Get<Balance>;
    /// Order validity horizon in seconds
    #[pallet::constant]
    type OrderValidity: Get<Seconds>;
    /// Pool-receipt lock duration in seconds
    #[pallet::constant]
    type LockDuration: Get<Seconds>;
    /// Weight-interpolation window in seconds
    #[pallet::constant]
    type WeightShiftDuration: Get<Seconds>;
    /// Pallet ID for factory and instance account derivation
    #[pallet::constant]
    type PalletId: Get<PalletId>;
    /// Weight information for extrinsics
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(PhantomData<T>);

  /// Per-instance state. Written once at deployment (the deposit transaction
  /// plays the constructor role), then mutated only along the forward path of
  /// the state machine.
  ///
  /// `pool` transitions `None -> Some` exactly once; `unlock_at` transitions
  /// `0 -> t -> 0` exactly once per instance lifetime.
  #[derive(Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
  pub struct BackingRecord<AccountId> {
    pub backer: AccountId,
    pub backing_asset: AssetId,
    pub personal_token: AssetId,
    pub personal_token_amount: Balance,
    pub escrowed_stable: Balance,
    pub order_uid: H256,
    pub order_valid_to: Seconds,
    pub order_buy_amount: Balance,
    pub pool: Option<AssetId>,
    pub unlock_at: Seconds,
  }

  /// How the settlement venue resolved the order, as observed at
  /// pool-creation time.
  #[derive(
    Clone,
    Copy,
    Debug,
    Decode,
    DecodeWithMemTracking,
    Encode,
    Eq,
    PartialEq,
    TypeInfo,
    MaxEncodedLen,
  )]
  pub enum SettlementOutcome {
    /// The venue filled the order; the pool is seeded with the acquired
    /// backing asset.
    Filled(Balance),
    /// The order expired unfilled; the pool is seeded with the stablecoin
    /// escrow itself.
    Expired,
  }

  /// Backing assets the admin has enabled for new orders
  #[pallet::storage]
  #[pallet::getter(fn supported_assets)]
  pub type SupportedAssets<T: Config> = StorageMap<_, Blake2_128Concat, AssetId, (), OptionQuery>;

  /// Instance account -> backer. Entries are added at deployment and never
  /// removed; doubles as the instance-authentication allowlist.
  #[pallet::storage]
  #[pallet::getter(fn instance_owner)]
  pub type InstanceOwner<T: Config> =
    StorageMap<_, Blake2_128Concat, T::AccountId, T::AccountId, OptionQuery>;

  /// Instance account -> backing state machine record
  #[pallet::storage]
  #[pallet::getter(fn instances)]
  pub type Instances<T: Config> =
    StorageMap<_, Blake2_128Concat, T::AccountId, BackingRecord<T::AccountId>, OptionQuery>;

  #[pallet::type_value]
  pub fn InfiniteFuture() -> Seconds {
    Seconds::MAX
  }

  /// Global release override. Defaults to the infinite future; once set to a
  /// past or present instant it unlocks every instance regardless of its
  /// individual lock.
  #[pallet::storage]
  #[pallet::getter(fn global_release_time)]
  pub type GlobalReleaseTime<T: Config> = StorageValue<_, Seconds, ValueQuery, InfiniteFuture>;

  /// Re-entrancy latch for the deposit hook. Held for exactly one top-level
  /// deposit call and cleared unconditionally before it returns.
  #[pallet::storage]
  pub type DepositInProgress<T: Config> = StorageValue<_, bool, ValueQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// A backing instance was deployed at its deterministic account
    InstanceDeployed {
      backer: T::AccountId,
      instance: T::AccountId,
      backing_asset: AssetId,
    },
    /// The instance's order was registered and pre-authorized with the venue
    OrderInitiated {
      instance: T::AccountId,
      order_uid: H256,
      valid_to: Seconds,
      buy_amount: Balance,
    },
    /// The instance's order was re-derived and re-authorized
    OrderReset {
      instance: T::AccountId,
      previous_uid: H256,
      order_uid: H256,
      valid_to: Seconds,
    },
    /// The instance seeded its pool and started the lock timer
    PoolSeeded {
      instance: T::AccountId,
      pool: AssetId,
      outcome: SettlementOutcome,
      backing_contribution: Balance,
      unlock_at: Seconds,
    },
    /// Pool receipts left the instance for the recipient
    PoolTokensReleased {
      instance: T::AccountId,
      backer: T::AccountId,
      recipient: T::AccountId,
      pool: AssetId,
      amount: Balance,
    },
    /// Backing-asset support toggled by the admin
    AssetSupportUpdated { asset: AssetId, enabled: bool },
    /// Global release override updated by the admin
    GlobalReleaseTimeSet { when: Seconds },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// The deposit hook re-entered itself
    ReentrantDeposit,
    /// Deposit amount differs from the fixed required commitment
    AmountMismatch,
    /// Depositor is not registered as an individual
    NotHumanAccount,
    /// The transferred token id is not a personal token
    UnknownPersonalToken,
    /// Operator, source and token identity must all coincide
    BackingOnBehalfDisallowed,
    /// Backing-asset choice could not be decoded from the transfer data
    InvalidDepositData,
    /// Chosen backing asset is not admin-enabled
    UnsupportedAsset,
    /// Asset id outside the standard-token namespace
    InvalidAssetNamespace,
    /// The backer's deterministic instance account is already occupied
    InstanceAlreadyDeployed,
    /// No instance record exists at this account
    UnknownInstance,
    /// Account is not a recognized backing instance
    CallerNotInstance,
    /// Only the recorded backer may release pool receipts
    CallerNotBacker,
    /// The venue reports a fill; the order can no longer be reset
    OrderAlreadySettled,
    /// Re-derived order terms hash to the stored uid
    OrderUidUnchanged,
    /// The instance already seeded its pool
    PoolAlreadyCreated,
    /// Order is neither filled nor expired yet
    OrderNotYetFilled,
    /// Venue reports a fill but the backing asset has not arrived
    BackingAssetShortfall,
    /// Release requires a seeded pool
    PoolNotYetCreated,
    /// Neither the individual unlock nor the global override has passed
    PoolTokensStillLocked,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Enable or disable a backing asset for new orders.
    ///
    /// Only standard-namespace tokens can be enabled. Disabling an asset
    /// does not touch live instances, but their orders stop evaluating.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::set_asset_support())]
    pub fn set_asset_support(origin: OriginFor<T>, asset: AssetId, enabled: bool) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;

      if enabled {
        ensure!(asset.is_standard(), Error::<T>::InvalidAssetNamespace);
        SupportedAssets::<T>::insert(asset, ());
      } else {
        SupportedAssets::<T>::remove(asset);
      }

      Self::deposit_event(Event::AssetSupportUpdated { asset, enabled });

      Ok(())
    }

    /// Set the global release override.
    ///
    /// A past or present value unlocks every instance's pool receipts
    /// immediately, overriding individual locks.
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::set_global_release_time())]
    pub fn set_global_release_time(origin: OriginFor<T>, when: Seconds) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;

      GlobalReleaseTime::<T>::put(when);

      Self::deposit_event(Event::GlobalReleaseTimeSet { when });

      Ok(())
    }

    /// Re-derive the instance's order terms, e.g. after an oracle price
    /// move, as long as the registered order has not been filled.
    ///
    /// Permissionless: a stale order harms only the instance it belongs to,
    /// and the re-derived terms come from the same estimator either way.
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::reset_order())]
    pub fn reset_order(origin: OriginFor<T>, instance: T::AccountId) -> DispatchResult {
      ensure_signed(origin)?;

      Instances::<T>::try_mutate(&instance, |maybe| -> DispatchResult {
        let rec = maybe.as_mut().ok_or(Error::<T>::UnknownInstance)?;
        ensure!(rec.pool.is_none(), Error::<T>::PoolAlreadyCreated);
        ensure!(
          T::SettlementVenue::filled_amount(&rec.order_uid) == 0,
          Error::<T>::OrderAlreadySettled
        );

        let stable = T::StableAsset::get();
        let buy_amount =
          T::ValueEstimate::estimate(stable, rec.escrowed_stable, rec.backing_asset)?;
        let valid_to = Self::now().saturating_add(T::OrderValidity::get());
        let (uid, static_params) = Self::order_for(
          &instance,
          stable,
          rec.escrowed_stable,
          rec.backing_asset,
          buy_amount,
          valid_to,
        );
        ensure!(uid != rec.order_uid, Error::<T>::OrderUidUnchanged);

        let previous_uid = rec.order_uid;
        rec.order_uid = uid;
        rec.order_valid_to = valid_to;
        rec.order_buy_amount = buy_amount;

        T::SettlementVenue::register_order(&instance, uid, static_params)?;
        T::SettlementVenue::set_pre_signature(&instance, uid, true)?;

        Self::deposit_event(Event::OrderReset {
          instance: instance.clone(),
          previous_uid,
          order_uid: uid,
          valid_to,
        });

        Ok(())
      })
    }

    /// Seed the instance's pool from the settlement outcome.
    ///
    /// Permissionless: the action is economically neutral and gated by the
    /// venue's own state, not by caller identity. If the order filled, the
    /// acquired backing asset funds the pool; if it expired unfilled, the
    /// stablecoin escrow does, so no instance is ever permanently stuck.
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::create_pool())]
    pub fn create_pool(origin: OriginFor<T>, instance: T::AccountId) -> DispatchResult {
      ensure_signed(origin)?;

      let mut rec = Instances::<T>::get(&instance).ok_or(Error::<T>::UnknownInstance)?;
      ensure!(rec.pool.is_none(), Error::<T>::PoolAlreadyCreated);

      let now = Self::now();
      let fill = T::SettlementVenue::filled_amount(&rec.order_uid);
      let outcome = if fill > 0 {
        SettlementOutcome::Filled(fill)
      } else {
        ensure!(now > rec.order_valid_to, Error::<T>::OrderNotYetFilled);
        SettlementOutcome::Expired
      };

      let (contributed_asset, contribution) = match outcome {
        SettlementOutcome::Filled(amount) => {
          // The venue's reported state and actual custody must agree
          let have = T::Assets::balance(rec.backing_asset, &instance);
          ensure!(have >= amount, Error::<T>::BackingAssetShortfall);
          (rec.backing_asset, have)
        }
        SettlementOutcome::Expired => (T::StableAsset::get(), rec.escrowed_stable),
      };

      let (pool, request) = Self::build_pool_join_params(
        &instance,
        rec.personal_token,
        rec.personal_token_amount,
        contributed_asset,
        contribution,
      )?;
      T::LbpEngine::join_pool(pool, &instance, &instance, request)?;
      T::LbpEngine::schedule_weight_change(
        pool,
        now,
        now.saturating_add(T::WeightShiftDuration::get()),
        [params::FINAL_WEIGHT, params::FINAL_WEIGHT],
      )?;

      let unlock_at = now.saturating_add(T::LockDuration::get());
      rec.pool = Some(pool);
      rec.unlock_at = unlock_at;
      Instances::<T>::insert(&instance, rec);

      Self::deposit_event(Event::PoolSeeded {
        instance,
        pool,
        outcome,
        backing_contribution: contribution,
        unlock_at,
      });

      Ok(())
    }

    /// Transfer the instance's entire pool-receipt balance to `recipient`.
    ///
    /// Only the recorded backer may call; release is permitted once either
    /// the individual unlock or the global override has passed. The unlock
    /// timestamp zeroes permanently; a repeat call moves a zero balance.
    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::release_pool_tokens())]
    pub fn release_pool_tokens(
      origin: OriginFor<T>,
      instance: T::AccountId,
      recipient: T::AccountId,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;

      let mut rec = Instances::<T>::get(&instance).ok_or(Error::<T>::UnknownInstance)?;
      ensure!(rec.backer == who, Error::<T>::CallerNotBacker);
      let pool = rec.pool.ok_or(Error::<T>::PoolNotYetCreated)?;

      let now = Self::now();
      ensure!(
        now >= rec.unlock_at || now >= GlobalReleaseTime::<T>::get(),
        Error::<T>::PoolTokensStillLocked
      );

      rec.unlock_at = 0;
      Instances::<T>::insert(&instance, rec.clone());

      let amount = T::Assets::balance(pool, &instance);
      T::Assets::transfer(pool, &instance, &recipient, amount, Preservation::Expendable)?;

      Self::deposit_event(Event::PoolTokensReleased {
        instance,
        backer: rec.backer,
        recipient,
        pool,
        amount,
      });

      Ok(())
    }
  }

  impl<T: Config> super::TokenDepositHandler<T::AccountId> for Pallet<T> {
    /// Entry point of the whole backing flow, invoked by the ledger's
    /// transfer notification. Validates the deposit, deploys the instance at
    /// its deterministic account, escrows both legs and initiates the order,
    /// atomically or not at all.
    fn on_deposit(
      operator: &T::AccountId,
      from: &T::AccountId,
      token_id: AssetId,
      amount: Balance,
      data: &[u8],
    ) -> DispatchResult {
      ensure!(!DepositInProgress::<T>::get(), Error::<T>::ReentrantDeposit);
      DepositInProgress::<T>::put(true);
      let outcome = Self::do_deposit(operator, from, token_id, amount, data);
      DepositInProgress::<T>::kill();
      outcome
    }
  }

  impl<T: Config> super::OrderEvaluator<T::AccountId> for Pallet<T> {
    /// Poll-time order materialization for the venue. Balance, asset
    /// support and expiry are re-checked on every poll; the buy amount is
    /// NOT re-estimated; it was fixed at order construction.
    fn evaluate(
      owner: &T::AccountId,
      static_params: &order::StaticOrderParams,
      now: Seconds,
    ) -> Result<order::OrderTerms<T::AccountId>, order::OrderRejection> {
      if T::Assets::balance(static_params.sell_token, owner) < static_params.sell_amount {
        return Err(order::OrderRejection::BalanceInsufficient);
      }
      if !SupportedAssets::<T>::contains_key(static_params.buy_token) {
        return Err(order::OrderRejection::AssetUnsupported);
      }
      if now > static_params.valid_to {
        return Err(order::OrderRejection::OrderExpired);
      }

      Ok(order::build_order(
        owner.clone(),
        static_params.sell_token,
        static_params.sell_amount,
        static_params.buy_token,
        static_params.buy_amount,
        static_params.valid_to,
        static_params.app_data,
      ))
    }
  }

  impl<T: Config> Pallet<T> {
    /// The factory's account (escrow waypoint for wrapped personal tokens)
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    /// Deterministic instance account for a backer.
    ///
    /// Computable before deployment by anyone: the factory, the venue's
    /// off-chain tooling and the backer all agree on the address prior to
    /// its existence. The salt hashes only the backer identity (plus the
    /// fixed code fingerprint), which caps each backer to exactly one
    /// instance per deployment generation.
    pub fn instance_account_id(backer: &T::AccountId) -> T::AccountId {
      let factory = Self::account_id();
      let mut input = Vec::with_capacity(1 + factory.encoded_size() + 64);
      input.push(0xffu8);
      factory.encode_to(&mut input);
      input.extend_from_slice(&frame::hashing::blake2_256(&backer.encode()));
      input.extend_from_slice(&pallet_ids::INSTANCE_CODE_FINGERPRINT);
      let seed = frame::hashing::blake2_256(&input);

      // Fold the seed into the PalletId so uniqueness is preserved even for
      // small AccountId types where `into_sub_account_truncating` may
      // aggressively truncate the sub-account payload.
      let mut id_bytes = T::PalletId::get().0;
      for (i, b) in seed.iter().enumerate() {
        id_bytes[i % 8] ^= b;
      }
      let mut sub = [0u8; 8];
      sub.copy_from_slice(&seed[..8]);
      PalletId(id_bytes).into_sub_account_truncating(u64::from_le_bytes(sub))
    }

    /// Pool creation plus a join request sized to the two contributions.
    ///
    /// Callable only on behalf of a recognized instance. Token order is
    /// canonical ascending-id, applied exactly once so the pool creation and
    /// the join request can never diverge.
    pub fn build_pool_join_params(
      instance: &T::AccountId,
      personal_token: AssetId,
      personal_amount: Balance,
      backing_asset: AssetId,
      backing_amount: Balance,
    ) -> Result<(AssetId, JoinRequest), DispatchError> {
      ensure!(
        InstanceOwner::<T>::contains_key(instance),
        Error::<T>::CallerNotInstance
      );

      let (assets, amounts, weights) = if backing_asset < personal_token {
        (
          [backing_asset, personal_token],
          [backing_amount, personal_amount],
          [params::INITIAL_BACKING_WEIGHT, params::INITIAL_PERSONAL_WEIGHT],
        )
      } else {
        (
          [personal_token, backing_asset],
          [personal_amount, backing_amount],
          [params::INITIAL_PERSONAL_WEIGHT, params::INITIAL_BACKING_WEIGHT],
        )
      };

      let pool = T::LbpEngine::create_pool(instance, assets, weights, params::LBP_SWAP_FEE, true)?;

      Ok((
        pool,
        JoinRequest {
          assets,
          max_amounts: amounts,
          kind: JoinKind::Init,
          from_internal: false,
        },
      ))
    }

    fn do_deposit(
      operator: &T::AccountId,
      from: &T::AccountId,
      token_id: AssetId,
      amount: Balance,
      data: &[u8],
    ) -> DispatchResult {
      ensure!(
        amount == T::RequiredPersonalAmount::get(),
        Error::<T>::AmountMismatch
      );
      ensure!(T::Ledger::is_human(from), Error::<T>::NotHumanAccount);
      let avatar = T::Ledger::identity_of(token_id).ok_or(Error::<T>::UnknownPersonalToken)?;
      ensure!(
        avatar == *from && operator == from,
        Error::<T>::BackingOnBehalfDisallowed
      );
      let backing_asset =
        AssetId::decode(&mut &data[..]).map_err(|_| Error::<T>::InvalidDepositData)?;
      ensure!(
        SupportedAssets::<T>::contains_key(backing_asset),
        Error::<T>::UnsupportedAsset
      );

      let instance = Self::instance_account_id(from);
      ensure!(
        !InstanceOwner::<T>::contains_key(&instance),
        Error::<T>::InstanceAlreadyDeployed
      );

      // Escrow both legs at the instance before any order exists
      let personal_token = T::Ledger::wrap(from, amount)?;
      let factory = Self::account_id();
      let stable = T::StableAsset::get();
      let escrow = T::RequiredStableAmount::get();
      T::Assets::transfer(stable, from, &instance, escrow, Preservation::Expendable)?;
      T::Assets::transfer(personal_token, &factory, &instance, amount, Preservation::Expendable)?;

      let buy_amount = T::ValueEstimate::estimate(stable, escrow, backing_asset)?;
      let valid_to = Self::now().saturating_add(T::OrderValidity::get());
      let (uid, static_params) =
        Self::order_for(&instance, stable, escrow, backing_asset, buy_amount, valid_to);

      InstanceOwner::<T>::insert(&instance, from.clone());
      Instances::<T>::insert(
        &instance,
        BackingRecord {
          backer: from.clone(),
          backing_asset,
          personal_token,
          personal_token_amount: amount,
          escrowed_stable: escrow,
          order_uid: uid,
          order_valid_to: valid_to,
          order_buy_amount: buy_amount,
          pool: None,
          unlock_at: 0,
        },
      );

      T::SettlementVenue::register_order(&instance, uid, static_params)?;
      T::SettlementVenue::set_pre_signature(&instance, uid, true)?;

      Self::deposit_event(Event::InstanceDeployed {
        backer: from.clone(),
        instance: instance.clone(),
        backing_asset,
      });
      Self::deposit_event(Event::OrderInitiated {
        instance,
        order_uid: uid,
        valid_to,
        buy_amount,
      });

      Ok(())
    }

    /// Order uid plus the static parameter blob for the venue, derived from
    /// the instance's metadata payload and the given economic terms.
    fn order_for(
      instance: &T::AccountId,
      sell_token: AssetId,
      sell_amount: Balance,
      buy_token: AssetId,
      buy_amount: Balance,
      valid_to: Seconds,
    ) -> (H256, order::StaticOrderParams) {
      let (_, app_data) = order::app_data(instance);
      let terms = order::build_order(
        instance.clone(),
        sell_token,
        sell_amount,
        buy_token,
        buy_amount,
        valid_to,
        app_data,
      );
      let uid = order::order_uid(instance, &terms);
      (
        uid,
        order::StaticOrderParams {
          sell_token,
          sell_amount,
          buy_token,
          buy_amount,
          valid_to,
          app_data,
        },
      )
    }

    fn now() -> Seconds {
      T::TimeProvider::now().as_secs()
    }
  }

  /// Genesis configuration: ensures the factory account is ED-free
  #[pallet::genesis_config]
  #[derive(frame::prelude::DefaultNoBound)]
  pub struct GenesisConfig<T: Config> {
    #[serde(skip)]
    pub _marker: core::marker::PhantomData<T>,
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      // Factory account survives zero native balance via provider reference
      frame_system::Pallet::<T>::inc_providers(&Pallet::<T>::account_id());
    }
  }
}
