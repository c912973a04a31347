//! Conditional-order terms and settlement metadata.
//!
//! The settlement venue discovers orders off-chain and polls the pallet's
//! [`OrderEvaluator`] hook with the opaque [`StaticOrderParams`] blob supplied
//! at registration time. Construction is pure and always succeeds; validation
//! happens at poll time because the venue may evaluate repeatedly before
//! filling.

extern crate alloc;

use alloc::{format, string::String, vec::Vec};
use codec::{Decode, Encode};
use polkadot_sdk::sp_core::{H256, hexdisplay::HexDisplay};
use primitives::{AssetId, Balance, Seconds, params};
use scale_info::TypeInfo;
use serde::Serialize;

/// Settlement route of an order leg. Both legs of a backing order settle
/// against the owner's direct balances, never against venue-internal
/// accounting.
#[derive(Clone, Copy, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub enum BalanceSource {
  Direct,
}

/// Fully-formed economic terms handed to the settlement venue.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub struct OrderTerms<AccountId> {
  pub sell_token: AssetId,
  pub buy_token: AssetId,
  pub receiver: AccountId,
  pub sell_amount: Balance,
  pub buy_amount: Balance,
  pub valid_to: Seconds,
  pub app_data: H256,
  /// Always `false`: fill-or-kill, the venue fills the full sell amount or
  /// nothing.
  pub partially_fillable: bool,
  pub sell_source: BalanceSource,
  pub buy_destination: BalanceSource,
}

/// The opaque parameter blob the venue stores at registration time and
/// replays into [`OrderEvaluator::evaluate`] on every poll.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub struct StaticOrderParams {
  pub sell_token: AssetId,
  pub sell_amount: Balance,
  pub buy_token: AssetId,
  pub buy_amount: Balance,
  pub valid_to: Seconds,
  pub app_data: H256,
}

/// Poll-time rejection reasons returned to the venue instead of terms.
#[derive(Clone, Copy, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub enum OrderRejection {
  /// The owner's sell-asset balance no longer covers the sell amount.
  BalanceInsufficient,
  /// The buy asset has been removed from the supported set since the order
  /// was created.
  AssetUnsupported,
  /// The order's validity horizon has passed.
  OrderExpired,
}

/// Capability interface the settlement venue polls to materialize an order.
pub trait OrderEvaluator<AccountId> {
  fn evaluate(
    owner: &AccountId,
    params: &StaticOrderParams,
    now: Seconds,
  ) -> Result<OrderTerms<AccountId>, OrderRejection>;
}

/// Pure order construction. Economic validation is deferred to
/// [`OrderEvaluator::evaluate`].
pub fn build_order<AccountId>(
  owner: AccountId,
  sell_token: AssetId,
  sell_amount: Balance,
  buy_token: AssetId,
  buy_amount: Balance,
  valid_to: Seconds,
  app_data: H256,
) -> OrderTerms<AccountId> {
  OrderTerms {
    sell_token,
    buy_token,
    receiver: owner,
    sell_amount,
    buy_amount,
    valid_to,
    app_data,
    partially_fillable: false,
    sell_source: BalanceSource::Direct,
    buy_destination: BalanceSource::Direct,
  }
}

/// Content-addressed order identifier: hash of the terms plus the owner.
///
/// Any change to the economic terms (buy amount, expiry) yields a new uid,
/// which is what makes the reset path's changed-uid precondition meaningful.
pub fn order_uid<AccountId: Encode>(owner: &AccountId, terms: &OrderTerms<AccountId>) -> H256 {
  let mut buf = terms.encode();
  owner.encode_to(&mut buf);
  H256(frame::hashing::blake2_256(&buf))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AppData {
  app_code: &'static str,
  metadata: AppMetadata,
  version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AppMetadata {
  hooks: SettlementHooks,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SettlementHooks {
  post: [SettlementHook; 1],
  version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SettlementHook {
  gas_limit: String,
  method: &'static str,
  target: String,
}

/// Builds the metadata payload the venue attaches to an order, embedding the
/// instance account as the post-settlement callback target, and its hash.
///
/// Serialization runs over fixed-order structs, so the output is
/// byte-identical for an identical instance account; the hash is what the
/// venue indexes orders by.
pub fn app_data<AccountId: Encode>(instance: &AccountId) -> (Vec<u8>, H256) {
  let payload = AppData {
    app_code: "personal-token-backing",
    metadata: AppMetadata {
      hooks: SettlementHooks {
        post: [SettlementHook {
          gas_limit: format!("{}", params::SETTLEMENT_CALLBACK_GAS),
          method: "notify_settlement",
          target: format!("0x{}", HexDisplay::from(&instance.encode())),
        }],
        version: "1",
      },
    },
    version: "1.0.0",
  };
  // Struct serialization cannot fail: no maps, no non-string keys
  let bytes = serde_json::to_vec(&payload).expect("static shape serializes; qed");
  let hash = H256(frame::hashing::blake2_256(&bytes));
  (bytes, hash)
}
