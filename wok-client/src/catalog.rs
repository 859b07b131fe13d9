//! Catalog helpers
//!
//! Menu browsing order, the signature toggle and default-menu sync.

use crate::error::ClientResult;
use crate::store::MenuStore;
use shared::models::{Category, MenuItem, MenuItemCreate, MenuItemPatch, SIGNATURE_TAG};
use std::collections::HashSet;
use std::sync::Arc;

const DEFAULT_MENU_JSON: &str = include_str!("../assets/default_menu.json");

/// Bundled default menu
pub fn default_menu() -> ClientResult<Vec<MenuItemCreate>> {
    Ok(serde_json::from_str(DEFAULT_MENU_JSON)?)
}

/// Items of one category (all when `None`), signature dishes first
///
/// The sort is stable, so the store's order is kept within each group.
pub fn for_category(items: &[MenuItem], category: Option<Category>) -> Vec<&MenuItem> {
    let mut filtered: Vec<&MenuItem> = items
        .iter()
        .filter(|item| category.is_none_or(|c| item.category == c))
        .collect();
    filtered.sort_by_key(|item| !item.is_signature());
    filtered
}

/// Tag list with the signature tag set or cleared
pub fn with_signature(tags: &[String], signature: bool) -> Vec<String> {
    let mut tags: Vec<String> = tags.iter().filter(|t| *t != SIGNATURE_TAG).cloned().collect();
    if signature {
        tags.push(SIGNATURE_TAG.to_string());
    }
    tags
}

#[derive(Clone)]
pub struct CatalogService {
    menu: Arc<dyn MenuStore>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService").field("menu", &"<MenuStore>").finish()
    }
}

impl CatalogService {
    pub fn new(menu: Arc<dyn MenuStore>) -> Self {
        Self { menu }
    }

    /// Flip the signature tag of one dish
    pub async fn toggle_signature(&self, id: &str) -> ClientResult<MenuItem> {
        let item = self.menu.get_menu_item(id).await?;
        let signature = !item.is_signature();
        let patch = MenuItemPatch {
            tags: Some(with_signature(&item.tags, signature)),
            ..Default::default()
        };
        let updated = self.menu.update_menu_item(id, patch).await?;
        tracing::info!(menu_item_id = %id, signature, "Signature flag toggled");
        Ok(updated)
    }

    /// Insert the entries of `defaults` whose ids are missing; returns the inserted ids
    ///
    /// Existing rows are never overwritten, so edited prices and sales stay.
    pub async fn sync_missing(&self, defaults: Vec<MenuItemCreate>) -> ClientResult<Vec<String>> {
        let existing: HashSet<String> = self
            .menu
            .list_menu_items()
            .await?
            .into_iter()
            .map(|item| item.id)
            .collect();

        let mut inserted = Vec::new();
        for entry in defaults {
            if entry.id.as_ref().is_some_and(|id| existing.contains(id)) {
                continue;
            }
            let item = self.menu.insert_menu_item(entry).await?;
            inserted.push(item.id);
        }
        if !inserted.is_empty() {
            tracing::info!(count = inserted.len(), "Default menu items added");
        }
        Ok(inserted)
    }

    /// Sync the bundled default menu
    pub async fn sync_default_menu(&self) -> ClientResult<Vec<String>> {
        self.sync_missing(default_menu()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn item(id: &str, category: Category, tags: &[&str]) -> MenuItem {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": id,
            "price": 19,
            "category": category,
            "tags": tags,
        }))
        .unwrap()
    }

    #[test]
    fn test_bundled_menu_parses() {
        let menu = default_menu().unwrap();
        assert!(!menu.is_empty());
        assert!(menu.iter().all(|m| m.id.is_some()));
        assert!(menu.iter().any(|m| m.name == "麻婆豆腐" && m.price == 19));
    }

    #[test]
    fn test_signature_first_within_category() {
        let items = vec![
            item("a", Category::Main, &[]),
            item("b", Category::Soup, &["signature"]),
            item("c", Category::Main, &["signature"]),
            item("d", Category::Main, &[]),
        ];
        let ids: Vec<&str> = for_category(&items, Some(Category::Main))
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c", "a", "d"]);

        let all: Vec<&str> = for_category(&items, None).iter().map(|i| i.id.as_str()).collect();
        assert_eq!(all, vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn test_with_signature_keeps_other_tags() {
        let tags = vec!["spicy".to_string()];
        assert_eq!(with_signature(&tags, true), vec!["spicy", "signature"]);
        let tagged = with_signature(&tags, true);
        assert_eq!(with_signature(&tagged, false), vec!["spicy"]);
    }

    #[tokio::test]
    async fn test_toggle_signature() {
        let store = Arc::new(MemoryStore::new());
        let catalog = CatalogService::new(store.clone());
        catalog.sync_default_menu().await.unwrap();

        let toggled = catalog.toggle_signature("m-23").await.unwrap();
        assert!(toggled.is_signature());
        let toggled = catalog.toggle_signature("m-23").await.unwrap();
        assert!(!toggled.is_signature());
    }

    #[tokio::test]
    async fn test_sync_inserts_only_missing() {
        let store = Arc::new(MemoryStore::new());
        let catalog = CatalogService::new(store.clone());

        let total = default_menu().unwrap().len();
        assert_eq!(catalog.sync_default_menu().await.unwrap().len(), total);

        store
            .update_menu_item(
                "m-23",
                MenuItemPatch {
                    price: Some(25),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store.delete_menu_item("m-44").await.unwrap();

        let inserted = catalog.sync_default_menu().await.unwrap();
        assert_eq!(inserted, vec!["m-44".to_string()]);
        assert_eq!(store.get_menu_item("m-23").await.unwrap().price, 25);
    }
}
