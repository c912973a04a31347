#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use core::marker::PhantomData;
use polkadot_sdk::frame_support::{
  traits::Get,
  weights::{constants::RocksDbWeight, Weight},
};

pub trait WeightInfo {
  fn set_asset_support() -> Weight;
  fn set_global_release_time() -> Weight;
  fn reset_order() -> Weight;
  fn create_pool() -> Weight;
  fn release_pool_tokens() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
  fn set_asset_support() -> Weight {
    Weight::from_parts(9_000_000, 600)
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn set_global_release_time() -> Weight {
    Weight::from_parts(8_000_000, 600)
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn reset_order() -> Weight {
    Weight::from_parts(35_000_000, 2000)
      .saturating_add(T::DbWeight::get().reads_writes(4, 1))
  }

  fn create_pool() -> Weight {
    Weight::from_parts(90_000_000, 3200)
      .saturating_add(T::DbWeight::get().reads_writes(8, 6))
  }

  fn release_pool_tokens() -> Weight {
    Weight::from_parts(40_000_000, 2200)
      .saturating_add(T::DbWeight::get().reads_writes(5, 3))
  }
}

impl WeightInfo for () {
  fn set_asset_support() -> Weight { Weight::from_parts(9_000_000, 600) }
  fn set_global_release_time() -> Weight { Weight::from_parts(8_000_000, 600) }
  fn reset_order() -> Weight { Weight::from_parts(35_000_000, 2000) }
  fn create_pool() -> Weight { Weight::from_parts(90_000_000, 3200) }
  fn release_pool_tokens() -> Weight { Weight::from_parts(40_000_000, 2200) }
}
