// tests/cart_store_tests.rs
mod common;

use common::*;
use ranmix::cart::{CartState, CartStore, Product, CART_STORAGE_KEY};
use ranmix::store::{MemoryStorage, StorageBackend};
use ranmix::RanmixError;
use std::sync::Arc;

fn cold_brew() -> Product {
  Product::new("Cold Brew", "coffee", 45_000)
    .with_description("12-hour steeped")
    .with_moods(["focused"])
    .with_branches(["nguyen-binh-khiem"])
}

fn lychee_tea() -> Product {
  Product::new("Lychee Tea", "tea", 39_000)
}

fn assert_totals_consistent(cart: &CartState) {
  let items: u64 = cart.items.iter().map(|l| u64::from(l.quantity)).sum();
  let price: u64 = cart.items.iter().map(|l| l.unit_price * u64::from(l.quantity)).sum();
  assert_eq!(cart.total_items, items);
  assert_eq!(cart.total_price, price);
  assert!(cart.items.iter().all(|l| l.quantity >= 1));
}

#[test]
fn re_adding_a_product_bumps_quantity() {
  setup_tracing();
  let cart = CartStore::load(Arc::new(MemoryStorage::new()));
  let first = cart.add_item(cold_brew()).unwrap();
  let second = cart.add_item(cold_brew()).unwrap();

  assert_eq!(first, second);
  let state = cart.state();
  assert_eq!(state.items.len(), 1);
  assert_eq!(state.items[0].quantity, 2);
  assert_eq!(state.total_price, 90_000);
}

#[test]
fn same_name_in_another_category_is_a_new_line() {
  let cart = CartStore::load(Arc::new(MemoryStorage::new()));
  cart.add_item(Product::new("Signature", "coffee", 50_000)).unwrap();
  cart.add_item(Product::new("Signature", "tea", 40_000)).unwrap();
  assert_eq!(cart.line_count(), 2);
}

#[test]
fn quantity_floor_removes_lines() {
  let cart = CartStore::load(Arc::new(MemoryStorage::new()));
  let brew = cart.add_item(cold_brew()).unwrap();
  let tea = cart.add_item(lychee_tea()).unwrap();

  assert!(cart.update_quantity(&brew, 0).unwrap());
  assert!(cart.update_quantity(&tea, -5).unwrap());
  let state = cart.state();
  assert!(state.is_empty());
  assert_eq!(state.total_items, 0);
  assert_eq!(state.total_price, 0);

  assert!(!cart.update_quantity("missing", 3).unwrap());
}

#[test]
fn totals_never_drift_across_mixed_operations() {
  setup_tracing();
  let cart = CartStore::load(Arc::new(MemoryStorage::new()));
  let brew = cart.add_item(cold_brew()).unwrap();
  assert_totals_consistent(&cart.state());
  let tea = cart.add_item(lychee_tea()).unwrap();
  cart.add_item(lychee_tea()).unwrap();
  assert_totals_consistent(&cart.state());
  cart.update_quantity(&brew, 7).unwrap();
  assert_totals_consistent(&cart.state());
  cart.remove_item(&tea);
  assert_totals_consistent(&cart.state());

  let state = cart.state();
  assert_eq!(state.total_items, 7);
  assert_eq!(state.total_price, 315_000);
}

#[test]
fn subscribers_see_current_state_and_every_change() {
  let cart = CartStore::load(Arc::new(MemoryStorage::new()));
  cart.add_item(cold_brew()).unwrap();

  let totals = Arc::new(parking_lot::Mutex::new(Vec::new()));
  let totals_clone = totals.clone();
  let sub = cart.subscribe(move |c| totals_clone.lock().push((c.total_items, c.total_price)));

  cart.add_item(lychee_tea()).unwrap();
  cart.set_branch("nguyen-binh-khiem");
  cart.clear();
  sub.unsubscribe();
  cart.add_item(lychee_tea()).unwrap();

  assert_eq!(
    *totals.lock(),
    vec![(1, 45_000), (2, 84_000), (2, 84_000), (0, 0)]
  );
}

#[test]
fn clear_resets_branch() {
  let cart = CartStore::load(Arc::new(MemoryStorage::new()));
  cart.add_item(cold_brew()).unwrap();
  cart.set_branch("nguyen-binh-khiem");
  assert_eq!(cart.state().selected_branch, "nguyen-binh-khiem");
  cart.clear();
  assert_eq!(cart.state(), CartState::default());
}

#[test]
fn persisted_layout_uses_camel_case_and_omits_totals() {
  let storage = Arc::new(MemoryStorage::new());
  let cart = CartStore::load(storage.clone());
  cart.add_item(cold_brew()).unwrap();
  cart.set_branch("nguyen-binh-khiem");

  let raw = storage.read(CART_STORAGE_KEY).unwrap().unwrap();
  let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
  assert_eq!(json["selectedBranch"], "nguyen-binh-khiem");
  assert_eq!(json["items"][0]["unitPrice"], 45_000);
  assert_eq!(json["items"][0]["moodTags"][0], "focused");
  assert_eq!(json["items"][0]["branchTags"][0], "nguyen-binh-khiem");
  assert!(json.get("totalItems").is_none());
  assert!(json.get("totalPrice").is_none());
}

#[test]
fn reload_restores_lines_and_recomputes_totals() {
  let storage = Arc::new(MemoryStorage::new());
  {
    let cart = CartStore::load(storage.clone());
    cart.add_item(cold_brew()).unwrap();
    cart.add_item(cold_brew()).unwrap();
    cart.add_item(lychee_tea()).unwrap();
  }
  let reloaded = CartStore::load(storage);
  let state = reloaded.state();
  assert_eq!(state.total_items, 3);
  assert_eq!(state.total_price, 129_000);
}

#[test]
fn corrupt_cart_record_starts_empty() {
  setup_tracing();
  let storage = MemoryStorage::new().with_entry(CART_STORAGE_KEY, "[1,2,");
  let cart = CartStore::load(Arc::new(storage));
  assert!(cart.state().is_empty());
}

#[test]
fn storage_failures_do_not_block_the_cart() {
  setup_tracing();
  let cart = CartStore::load(Arc::new(FailingStorage::default()));
  cart.add_item(cold_brew()).unwrap();
  assert_eq!(cart.state().total_items, 1);
}

#[test]
fn overflowing_totals_are_refused_and_leave_the_cart_intact() {
  setup_tracing();
  let storage = Arc::new(MemoryStorage::new());
  let cart = CartStore::load(storage.clone());
  let bottle = cart.add_item(Product::new("Vintage Cognac", "spirits", u64::MAX / 2)).unwrap();

  let err = cart.update_quantity(&bottle, 3).unwrap_err();
  assert!(matches!(err, RanmixError::Validation(_)));
  assert_eq!(cart.state().items[0].quantity, 1);

  // u64::MAX / 2 * 2 fits exactly; one more unit of anything does not.
  cart.add_item(Product::new("Vintage Cognac", "spirits", u64::MAX / 2)).unwrap();
  let before = cart.state();
  assert_eq!(before.total_price, u64::MAX - 1);
  cart.add_item(lychee_tea()).unwrap_err();
  assert_eq!(cart.state(), before);
  assert_totals_consistent(&cart.state());

  let stored: CartState = serde_json::from_str(&storage.read(CART_STORAGE_KEY).unwrap().unwrap()).unwrap();
  assert_eq!(stored.items.len(), 1);
}

#[test]
fn quantities_beyond_u32_are_refused() {
  let cart = CartStore::load(Arc::new(MemoryStorage::new()));
  let brew = cart.add_item(cold_brew()).unwrap();
  assert!(matches!(
    cart.update_quantity(&brew, i64::from(u32::MAX) + 1),
    Err(RanmixError::Validation(_))
  ));
  assert_eq!(cart.state().total_items, 1);
}

#[test]
fn subscribers_are_not_told_about_refused_mutations() {
  let cart = CartStore::load(Arc::new(MemoryStorage::new()));
  let bottle = cart.add_item(Product::new("Vintage Cognac", "spirits", u64::MAX)).unwrap();
  let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
  let calls_c = calls.clone();
  let sub = cart.subscribe(move |_| {
    calls_c.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
  });
  assert!(cart.update_quantity(&bottle, 2).is_err());
  assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
  sub.unsubscribe();
}
