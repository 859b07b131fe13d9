//! Cart / draft composer
//!
//! Client-local accumulation of line items. The cart never touches the
//! order mirror; submitting turns it into an [`OrderDraft`].

use crate::error::{ClientError, ClientResult};
use shared::models::{
    Category, MenuItem, NO_SPECIAL_REQUEST, OrderDraft, OrderLineItem, QuickOptions, compute_total,
};
use shared::order::OrderError;

/// Merge quick-option labels with the free-text request
///
/// `"extra spicy, scallion; no peanuts"`, or just the labels when the
/// request is empty or the `none` sentinel.
pub fn merge_special_request(options: &QuickOptions, category: Option<Category>, request: &str) -> String {
    let request = request.trim();
    let request = if request.is_empty() { NO_SPECIAL_REQUEST } else { request };

    let labels = options.labels(category);
    if labels.is_empty() {
        return request.to_string();
    }
    let labels = labels.join(", ");
    if request == NO_SPECIAL_REQUEST {
        labels
    } else {
        format!("{}; {}", labels, request)
    }
}

/// One cart line
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    /// Client-local line id; the same dish can appear on several lines
    pub line_id: String,
    pub item: OrderLineItem,
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dish and return the new line id
    pub fn add(
        &mut self,
        menu_item: &MenuItem,
        quantity: u32,
        quick_options: QuickOptions,
        request: &str,
    ) -> ClientResult<String> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity.into());
        }
        let mut item = OrderLineItem::from_menu_item(menu_item, quantity);
        item.special_request = merge_special_request(&quick_options, Some(menu_item.category), request);
        item.quick_options = quick_options;

        let line_id = uuid::Uuid::new_v4().to_string();
        self.lines.push(CartLine {
            line_id: line_id.clone(),
            item,
        });
        Ok(line_id)
    }

    /// Change a line's quantity by `delta`; the line goes away at zero
    pub fn update_quantity(&mut self, line_id: &str, delta: i32) -> ClientResult<()> {
        let index = self.index_of(line_id)?;
        let line = &mut self.lines[index];
        let next = i64::from(line.item.quantity) + i64::from(delta);
        if next <= 0 {
            self.lines.remove(index);
        } else {
            line.item.quantity = u32::try_from(next).map_err(|_| OrderError::InvalidQuantity)?;
        }
        Ok(())
    }

    pub fn remove(&mut self, line_id: &str) -> ClientResult<CartLine> {
        let index = self.index_of(line_id)?;
        Ok(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of dishes across all lines
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.item.quantity).sum()
    }

    pub fn total(&self) -> i64 {
        self.lines.iter().map(|l| l.item.subtotal()).sum()
    }

    /// Build the submission payload without consuming the cart
    pub fn to_draft(&self, owner_id: &str, customer_name: Option<String>) -> Result<OrderDraft, OrderError> {
        if self.lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        let items: Vec<OrderLineItem> = self.lines.iter().map(|l| l.item.clone()).collect();
        debug_assert_eq!(compute_total(&items), self.total());
        Ok(OrderDraft::new(owner_id, items).with_customer_name(customer_name))
    }

    pub fn into_draft(self, owner_id: &str, customer_name: Option<String>) -> Result<OrderDraft, OrderError> {
        self.to_draft(owner_id, customer_name)
    }

    fn index_of(&self, line_id: &str) -> ClientResult<usize> {
        self.lines
            .iter()
            .position(|l| l.line_id == line_id)
            .ok_or_else(|| ClientError::CartLineNotFound(line_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::OrderStatus;

    fn menu_item(id: &str, price: i64, category: Category) -> MenuItem {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("dish {}", id),
            "price": price,
            "category": category,
            "image": "🍲"
        }))
        .unwrap()
    }

    #[test]
    fn test_merge_special_request() {
        let none = QuickOptions::default();
        let spicy = QuickOptions {
            spicy: true,
            ..Default::default()
        };
        assert_eq!(merge_special_request(&none, None, ""), "none");
        assert_eq!(merge_special_request(&none, None, "no peanuts"), "no peanuts");
        assert_eq!(merge_special_request(&spicy, Some(Category::Main), "none"), "extra spicy");
        assert_eq!(
            merge_special_request(&spicy, Some(Category::Main), " no peanuts "),
            "extra spicy; no peanuts"
        );
        assert_eq!(merge_special_request(&spicy, Some(Category::Beverage), ""), "iced");
    }

    #[test]
    fn test_add_and_total() {
        let mut cart = Cart::new();
        let mapo = menu_item("m-1", 19, Category::Main);
        let tea = menu_item("d-1", 5, Category::Beverage);
        cart.add(&mapo, 2, QuickOptions::default(), "").unwrap();
        cart.add(&tea, 1, QuickOptions { cilantro: true, ..Default::default() }, "").unwrap();

        assert_eq!(cart.total(), 43);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.lines()[1].item.special_request, "hot");
        assert_eq!(cart.lines()[0].item.category, Some(Category::Main));
    }

    #[test]
    fn test_same_dish_gets_separate_lines() {
        let mut cart = Cart::new();
        let mapo = menu_item("m-1", 19, Category::Main);
        let a = cart.add(&mapo, 1, QuickOptions::default(), "").unwrap();
        let b = cart.add(&mapo, 1, QuickOptions::default(), "less oil").unwrap();
        assert_ne!(a, b);
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn test_update_quantity_removes_at_zero() {
        let mut cart = Cart::new();
        let mapo = menu_item("m-1", 19, Category::Main);
        let line = cart.add(&mapo, 1, QuickOptions::default(), "").unwrap();

        cart.update_quantity(&line, 2).unwrap();
        assert_eq!(cart.item_count(), 3);
        cart.update_quantity(&line, -3).unwrap();
        assert!(cart.is_empty());

        assert!(matches!(
            cart.update_quantity(&line, 1),
            Err(ClientError::CartLineNotFound(_))
        ));
    }

    #[test]
    fn test_zero_quantity_add_refused() {
        let mut cart = Cart::new();
        let mapo = menu_item("m-1", 19, Category::Main);
        assert!(matches!(
            cart.add(&mapo, 0, QuickOptions::default(), ""),
            Err(ClientError::Order(OrderError::InvalidQuantity))
        ));
    }

    #[test]
    fn test_draft_payload() {
        let mut cart = Cart::new();
        let mapo = menu_item("m-1", 19, Category::Main);
        cart.add(&mapo, 2, QuickOptions::default(), "").unwrap();

        let draft = cart.to_draft("client-1", Some("小蒋".to_string())).unwrap();
        assert_eq!(draft.owner_id, "client-1");
        assert_eq!(draft.total_price, 38);
        assert_eq!(draft.status, OrderStatus::Pending);
        assert!(!draft.urgent);
        assert_eq!(draft.urgent_count, 0);

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["items"][0]["special_request"], "none");
    }

    #[test]
    fn test_empty_cart_has_no_draft() {
        let cart = Cart::new();
        assert_eq!(cart.into_draft("client-1", None).unwrap_err(), OrderError::EmptyOrder);
    }
}
