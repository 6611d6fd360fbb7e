// ranmix/src/cart/store.rs

use super::model::{CartLine, CartState, Product};
use crate::error::{RanmixError, RanmixResult};
use crate::store::{PersistentStore, StorageBackend, Subscription};
use std::sync::Arc;
use tracing::{event, instrument, Level};
use uuid::Uuid;

/// The well-known storage key for the cart record.
pub const CART_STORAGE_KEY: &str = "ranmixology_cart";

/// Cart operations over a [`PersistentStore<CartState>`]. Every mutation recomputes totals
/// before subscribers run.
pub struct CartStore {
  store: PersistentStore<CartState>,
}

impl CartStore {
  pub fn load(storage: Arc<dyn StorageBackend>) -> Self {
    Self {
      store: PersistentStore::load(CART_STORAGE_KEY, storage),
    }
  }

  /// Adds one unit. Re-adding a product with the same name and category bumps its quantity.
  /// Returns the id of the affected line.
  ///
  /// Fails with `Validation`, leaving the cart as it was, when the totals would overflow.
  #[instrument(skip(self, product), fields(product = %product.name, category = %product.category))]
  pub fn add_item(&self, product: Product) -> RanmixResult<String> {
    self.store.try_mutate(|cart| {
      let id = if let Some(line) = cart.items.iter_mut().find(|l| l.matches(&product)) {
        line.quantity = line
          .quantity
          .checked_add(1)
          .ok_or_else(|| RanmixError::Validation(format!("too many '{}' in the cart", line.name)))?;
        event!(Level::DEBUG, line_id = %line.id, quantity = line.quantity, "Incremented cart line.");
        line.id.clone()
      } else {
        push_line(cart, product)
      };
      ensure_representable(cart)?;
      Ok(id)
    })
  }

  /// Returns whether a line was removed.
  pub fn remove_item(&self, line_id: &str) -> bool {
    self.store.mutate(|cart| {
      let before = cart.items.len();
      cart.items.retain(|l| l.id != line_id);
      cart.items.len() != before
    })
  }

  /// Sets the quantity of a line; `quantity <= 0` removes it. Returns whether the line existed.
  ///
  /// Quantities beyond `u32::MAX` and overflowing totals are refused with `Validation`.
  pub fn update_quantity(&self, line_id: &str, quantity: i64) -> RanmixResult<bool> {
    if quantity <= 0 {
      return Ok(self.remove_item(line_id));
    }
    let quantity = u32::try_from(quantity)
      .map_err(|_| RanmixError::Validation(format!("quantity {} is too large", quantity)))?;
    self.store.try_mutate(|cart| {
      let Some(line) = cart.items.iter_mut().find(|l| l.id == line_id) else {
        return Ok(false);
      };
      line.quantity = quantity;
      ensure_representable(cart)?;
      Ok(true)
    })
  }

  pub fn set_branch(&self, branch_id: &str) {
    let branch_id = branch_id.to_string();
    self.store.mutate(move |cart| cart.selected_branch = branch_id);
  }

  /// Empties all lines and resets the branch, e.g. after an order is placed.
  pub fn clear(&self) {
    self.store.mutate(|cart| {
      cart.items.clear();
      cart.selected_branch.clear();
    });
  }

  /// A copy of the current cart.
  pub fn state(&self) -> CartState {
    self.store.get_state()
  }

  pub fn line_count(&self) -> usize {
    self.store.read(|cart| cart.items.len())
  }

  /// The callback runs immediately with the current cart, then after every mutation.
  pub fn subscribe(&self, callback: impl Fn(&CartState) + Send + Sync + 'static) -> Subscription {
    self.store.subscribe(callback)
  }
}

fn push_line(cart: &mut CartState, product: Product) -> String {
  let id = format!("{}_{}_{}", product.category, product.name, Uuid::new_v4().simple());
  cart.items.push(CartLine {
    id: id.clone(),
    name: product.name,
    description: product.description,
    unit_price: product.unit_price,
    category: product.category,
    mood_tags: product.mood_tags,
    branch_tags: product.branch_tags,
    quantity: 1,
  });
  event!(Level::DEBUG, line_id = %id, "Added cart line.");
  id
}

fn ensure_representable(cart: &CartState) -> RanmixResult<()> {
  match cart.checked_totals() {
    Some(_) => Ok(()),
    None => Err(RanmixError::Validation("cart total is larger than any representable price".into())),
  }
}
