//! Menu Item Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag that marks a signature dish (招牌)
pub const SIGNATURE_TAG: &str = "signature";

/// Fixed catalog categories
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// 主菜
    #[default]
    Main,
    /// 主食
    Staple,
    /// 素菜
    Vegetable,
    /// 汤品
    Soup,
    /// 饮品
    Beverage,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Main,
        Category::Staple,
        Category::Vegetable,
        Category::Soup,
        Category::Beverage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Staple => "staple",
            Self::Vegetable => "vegetable",
            Self::Soup => "soup",
            Self::Beverage => "beverage",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Menu item entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Unit price in whole currency units
    pub price: i64,
    /// Informational only, never decremented by orders
    #[serde(default)]
    pub stock: i32,
    pub category: Category,
    /// Preparation method
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub flavor: String,
    /// Display glyph (emoji)
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Cumulative quantity sold, bumped on order completion
    #[serde(default)]
    pub sales: u64,
}

impl MenuItem {
    pub fn is_signature(&self) -> bool {
        self.tags.iter().any(|t| t == SIGNATURE_TAG)
    }

    /// Apply a partial update
    pub fn apply_patch(&mut self, patch: &MenuItemPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(method) = &patch.method {
            self.method = method.clone();
        }
        if let Some(flavor) = &patch.flavor {
            self.flavor = flavor.clone();
        }
        if let Some(image) = &patch.image {
            self.image = image.clone();
        }
        if let Some(image_url) = &patch.image_url {
            self.image_url = image_url.clone();
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
        if let Some(sales) = patch.sales {
            self.sales = sales;
        }
    }
}

/// Create menu item payload
///
/// `id` is optional: the default menu carries stable ids, ad-hoc dishes get
/// a store-assigned one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItemCreate {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: Option<i32>,
    pub category: Category,
    pub method: Option<String>,
    pub flavor: Option<String>,
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl MenuItemCreate {
    /// Materialize into a full entity with the given id
    pub fn into_item(self, id: String) -> MenuItem {
        MenuItem {
            id,
            name: self.name,
            description: self.description.unwrap_or_default(),
            price: self.price,
            stock: self.stock.unwrap_or_default(),
            category: self.category,
            method: self.method.unwrap_or_default(),
            flavor: self.flavor.unwrap_or_default(),
            image: self.image.unwrap_or_default(),
            image_url: self.image_url,
            tags: self.tags.unwrap_or_default(),
            sales: 0,
        }
    }
}

impl From<&MenuItem> for MenuItemCreate {
    fn from(item: &MenuItem) -> Self {
        Self {
            id: Some(item.id.clone()),
            name: item.name.clone(),
            description: Some(item.description.clone()),
            price: item.price,
            stock: Some(item.stock),
            category: item.category,
            method: Some(item.method.clone()),
            flavor: Some(item.flavor.clone()),
            image: Some(item.image.clone()),
            image_url: item.image_url.clone(),
            tags: Some(item.tags.clone()),
        }
    }
}

/// Update menu item payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MenuItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i32>,
    pub category: Option<Category>,
    pub method: Option<String>,
    pub flavor: Option<String>,
    pub image: Option<String>,
    /// `Some(None)` clears the photo
    pub image_url: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub sales: Option<u64>,
}
