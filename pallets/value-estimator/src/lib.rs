//! Value Estimator Pallet
//!
//! Converts oracle price feeds into the minimum acceptable output amount for
//! the backing swap: both prices are normalized to a common precision, the
//! cross rate is adjusted for token decimals, and a configurable slippage
//! haircut is applied. Stale or absent readings degrade instead of blocking:
//! a stale sell-side price falls back to a unit price (the sell asset is a
//! stable reference), a stale buy-side price collapses the minimum to the
//! smallest representable unit.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

#[cfg(test)]
pub mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;
pub use weights::WeightInfo;

use primitives::{AssetId, Seconds};

/// Latest oracle reading for an asset. `price` carries `decimals` fractional
/// digits; `updated_at` is unix seconds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PriceQuote {
  pub price: u128,
  pub decimals: u8,
  pub updated_at: Seconds,
}

/// Price-feed aggregation source. `None` and a zero price are both treated
/// as "no usable data" by the estimator, on top of the staleness window.
pub trait PriceFeed {
  fn latest(asset: AssetId) -> Option<PriceQuote>;
}

#[frame::pallet]
pub mod pallet {
  use super::{PriceFeed as _, WeightInfo};
  use frame::deps::frame_support::traits::{
    EnsureOrigin, UnixTime,
    fungibles::metadata::Inspect as MetadataInspect,
  };
  use frame::prelude::*;
  use polkadot_sdk::sp_core::U256;
  use polkadot_sdk::sp_runtime::{
    ArithmeticError, DispatchError,
    traits::{One, Zero},
  };
  use primitives::{AssetId, Balance, Seconds, params};

  /// Common precision both feed prices are scaled to before division
  const NORMALIZED_DECIMALS: u32 = 18;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Asset metadata source for token decimals
    type Assets: MetadataInspect<Self::AccountId, AssetId = AssetId, Balance = Balance>;
    /// Oracle price feeds for both legs of the swap
    type PriceFeed: super::PriceFeed;
    /// Wall-clock source for staleness evaluation
    type TimeProvider: UnixTime;
    /// Origin allowed to adjust the slippage haircut
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;
    /// Maximum feed age before a reading counts as absent
    #[pallet::constant]
    type StalenessWindow: Get<Seconds>;
    /// Weight information for extrinsics
    type WeightInfo: WeightInfo;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(PhantomData<T>);

  #[pallet::type_value]
  pub fn DefaultSlippage() -> Permill {
    params::DEFAULT_SLIPPAGE
  }

  /// Haircut subtracted from the estimated fair output
  #[pallet::storage]
  #[pallet::getter(fn slippage)]
  pub type Slippage<T: Config> = StorageValue<_, Permill, ValueQuery, DefaultSlippage>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// Slippage haircut updated by the admin
    SlippageSet { slippage: Permill },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Slippage must lie strictly between zero and one
    InvalidSlippage,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Adjust the slippage haircut, exclusive bounds on both ends: a zero
    /// haircut removes the manipulation margin, a full one zeroes every
    /// estimate.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::set_slippage())]
    pub fn set_slippage(origin: OriginFor<T>, slippage: Permill) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;

      ensure!(
        slippage > Permill::zero() && slippage < Permill::one(),
        Error::<T>::InvalidSlippage
      );
      Slippage::<T>::put(slippage);

      Self::deposit_event(Event::SlippageSet { slippage });

      Ok(())
    }
  }

  impl<T: Config> pallet_backing_manager::ValueEstimate for Pallet<T> {
    fn estimate(
      sell_asset: AssetId,
      sell_amount: Balance,
      buy_asset: AssetId,
    ) -> Result<Balance, DispatchError> {
      Self::estimate_value(sell_asset, sell_amount, buy_asset)
    }
  }

  impl<T: Config> Pallet<T> {
    /// Estimated minimum acceptable `buy_asset` output for selling
    /// `sell_amount` of `sell_asset`.
    pub fn estimate_value(
      sell_asset: AssetId,
      sell_amount: Balance,
      buy_asset: AssetId,
    ) -> Result<Balance, DispatchError> {
      let now = T::TimeProvider::now().as_secs();
      let staleness = T::StalenessWindow::get();
      let fresh =
        |quote: &super::PriceQuote| quote.price > 0 && now.saturating_sub(quote.updated_at) <= staleness;

      // No usable buy-side price: disable the floor protection rather than
      // block the trade
      let buy_quote = match T::PriceFeed::latest(buy_asset) {
        Some(quote) if fresh(&quote) => quote,
        _ => return Ok(1),
      };
      // No usable sell-side price: assume a unit price, the sell asset is a
      // stable reference
      let sell_normalized = match T::PriceFeed::latest(sell_asset) {
        Some(quote) if fresh(&quote) => Self::normalize(&quote)?,
        _ => U256::exp10(NORMALIZED_DECIMALS as usize),
      };
      let buy_normalized = Self::normalize(&buy_quote)?;
      ensure!(
        !buy_normalized.is_zero(),
        DispatchError::Arithmetic(ArithmeticError::DivisionByZero)
      );

      let sell_decimals = u32::from(T::Assets::decimals(sell_asset));
      let buy_decimals = u32::from(T::Assets::decimals(buy_asset));

      // gross = amount * sell_price * 10^buy_dec / (buy_price * 10^sell_dec)
      let numerator = U256::from(sell_amount)
        .checked_mul(sell_normalized)
        .and_then(|value| value.checked_mul(Self::pow10(buy_decimals)?))
        .ok_or(ArithmeticError::Overflow)?;
      let denominator = buy_normalized
        .checked_mul(Self::pow10(sell_decimals).ok_or(ArithmeticError::Overflow)?)
        .ok_or(ArithmeticError::Overflow)?;

      let gross: Balance = (numerator / denominator)
        .try_into()
        .map_err(|_| ArithmeticError::Overflow)?;
      let haircut = Slippage::<T>::get().mul_floor(gross);
      Ok(gross.saturating_sub(haircut))
    }

    /// Scale a feed price to `NORMALIZED_DECIMALS` fractional digits.
    ///
    /// Down-scaling an extreme-decimals feed can null the price entirely;
    /// the zero then surfaces as a division error in the caller.
    fn normalize(quote: &super::PriceQuote) -> Result<U256, DispatchError> {
      let price = U256::from(quote.price);
      let decimals = u32::from(quote.decimals);
      if decimals <= NORMALIZED_DECIMALS {
        price
          .checked_mul(Self::pow10(NORMALIZED_DECIMALS - decimals).ok_or(ArithmeticError::Overflow)?)
          .ok_or_else(|| ArithmeticError::Overflow.into())
      } else {
        let divisor = Self::pow10(decimals - NORMALIZED_DECIMALS).ok_or(ArithmeticError::Overflow)?;
        Ok(price / divisor)
      }
    }

    fn pow10(exponent: u32) -> Option<U256> {
      U256::from(10u8).checked_pow(U256::from(exponent))
    }
  }
}
