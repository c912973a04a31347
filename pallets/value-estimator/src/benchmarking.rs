extern crate alloc;

use crate::*;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_support::traits::EnsureOrigin;
use polkadot_sdk::sp_runtime::Permill;

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn set_slippage() -> Result<(), BenchmarkError> {
    let origin = T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
    let slippage = Permill::from_percent(3);

    #[extrinsic_call]
    _(origin as T::RuntimeOrigin, slippage);

    assert_eq!(Slippage::<T>::get(), slippage);
    Ok(())
  }

  impl_benchmark_test_suite!(Pallet, crate::mock::new_test_ext(), crate::mock::Test);
}
