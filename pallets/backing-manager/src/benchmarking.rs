extern crate alloc;

use crate::*;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_support::traits::EnsureOrigin;
use primitives::well_known;

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn set_asset_support() -> Result<(), BenchmarkError> {
    let origin = T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;

    #[extrinsic_call]
    _(origin as T::RuntimeOrigin, well_known::WETH, true);

    assert!(SupportedAssets::<T>::contains_key(well_known::WETH));
    Ok(())
  }

  #[benchmark]
  fn set_global_release_time() -> Result<(), BenchmarkError> {
    let origin = T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;

    #[extrinsic_call]
    _(origin as T::RuntimeOrigin, 1_700_000_000u64);

    assert_eq!(GlobalReleaseTime::<T>::get(), 1_700_000_000u64);
    Ok(())
  }

  impl_benchmark_test_suite!(Pallet, crate::mock::new_test_ext(), crate::mock::Test);
}
