// ranmix/src/cart/model.rs

use crate::store::StoreState;
use serde::{Deserialize, Serialize};

/// What the menu hands to `CartStore::add_item`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
  pub name: String,
  pub description: String,
  pub unit_price: u64,
  pub category: String,
  pub mood_tags: Vec<String>,
  pub branch_tags: Vec<String>,
}

impl Product {
  pub fn new(name: impl Into<String>, category: impl Into<String>, unit_price: u64) -> Self {
    Self {
      name: name.into(),
      description: String::new(),
      unit_price,
      category: category.into(),
      mood_tags: Vec::new(),
      branch_tags: Vec::new(),
    }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = description.into();
    self
  }

  pub fn with_moods<I, S>(mut self, moods: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.mood_tags = moods.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_branches<I, S>(mut self, branches: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.branch_tags = branches.into_iter().map(Into::into).collect();
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub unit_price: u64,
  pub category: String,
  #[serde(default)]
  pub mood_tags: Vec<String>,
  #[serde(default)]
  pub branch_tags: Vec<String>,
  pub quantity: u32,
}

impl CartLine {
  pub fn matches(&self, product: &Product) -> bool {
    self.name == product.name && self.category == product.category
  }

  /// `None` when the product does not fit in a `u64`.
  pub fn line_total(&self) -> Option<u64> {
    self.unit_price.checked_mul(u64::from(self.quantity))
  }
}

/// The cart aggregate. `total_items` and `total_price` are never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CartState {
  pub items: Vec<CartLine>,
  pub selected_branch: String,
  #[serde(skip)]
  pub total_items: u64,
  #[serde(skip)]
  pub total_price: u64,
}

impl CartState {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn line(&self, line_id: &str) -> Option<&CartLine> {
    self.items.iter().find(|l| l.id == line_id)
  }

  /// Exact `(total_items, total_price)`, or `None` if the price total overflows.
  pub fn checked_totals(&self) -> Option<(u64, u64)> {
    self.items.iter().try_fold((0u64, 0u64), |(items, price), line| {
      Some((items.checked_add(u64::from(line.quantity))?, price.checked_add(line.line_total()?)?))
    })
  }
}

impl StoreState for CartState {
  fn recompute_derived(&mut self) {
    // Stored data may predate the quantity floor.
    self.items.retain(|l| l.quantity > 0);
    // Mutations refuse overflowing carts; only a hand-edited record can get here.
    let (items, price) = self.checked_totals().unwrap_or((
      self.items.iter().map(|l| u64::from(l.quantity)).sum(),
      u64::MAX,
    ));
    self.total_items = items;
    self.total_price = price;
  }
}
