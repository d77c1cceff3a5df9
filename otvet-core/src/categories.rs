//! The service's question category tree.
//!
//! Categories form a two-level tree published as one JSON blob on the site's
//! bootstrap page. The tree is stored as an arena: every node lives in one
//! flat list sorted by id, and parent/child links are plain ids rather than
//! owned references. Lookups by id, URL name, and display name are O(1).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::serde_helpers::{bool_from_any, uint_from_any};

/// One node of the category tree as the bootstrap page serializes it.
///
/// This is the wire shape; [`Categories::new`] flattens a list of these
/// into the arena.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryNode {
    /// Category id; serialized as a string.
    #[serde(deserialize_with = "uint_from_any")]
    pub id: u64,
    /// Path segment of the category's listing page.
    pub urlname: String,
    /// Human-readable display name.
    pub name: String,
    /// Sort position within the parent; serialized as a string.
    #[serde(deserialize_with = "uint_from_any")]
    pub position: u32,
    /// `"1"` when the category does not accept new questions.
    #[serde(deserialize_with = "bool_from_any")]
    pub readonly: bool,
    /// Child categories; only top-level nodes carry any.
    #[serde(default)]
    pub categories: Vec<CategoryNode>,
}

/// A question category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    /// Category id.
    pub id: u64,
    /// Path segment of the category's listing page.
    pub urlname: String,
    /// Human-readable display name.
    pub name: String,
    /// Sort position within the parent.
    pub position: u32,
    /// Read-only categories do not accept new questions.
    pub is_readonly: bool,
    /// Id of the parent category; `None` for top-level categories.
    pub parent: Option<u64>,
    /// Ids of the child categories.
    pub children: Vec<u64>,
}

impl Category {
    /// Listing page URL of this category.
    pub fn url(&self) -> String {
        format!("https://otvet.mail.ru/{}/", self.urlname)
    }

    /// Whether this category has subcategories.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Arena of all categories with constant-time lookups.
#[derive(Debug, Clone, Default)]
pub struct Categories {
    items: Vec<Category>,
    by_id: HashMap<u64, usize>,
    by_urlname: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl Categories {
    /// Flattens the bootstrap tree into the arena.
    pub fn new(roots: Vec<CategoryNode>) -> Self {
        let mut items = Vec::new();
        for root in roots {
            flatten(root, None, &mut items);
        }
        items.sort_by_key(|c| c.id);

        let mut by_id = HashMap::with_capacity(items.len());
        let mut by_urlname = HashMap::with_capacity(items.len());
        let mut by_name = HashMap::with_capacity(items.len());
        for (index, category) in items.iter().enumerate() {
            by_id.insert(category.id, index);
            by_urlname.insert(category.urlname.clone(), index);
            by_name.insert(category.name.to_lowercase(), index);
        }

        Self { items, by_id, by_urlname, by_name }
    }

    /// Number of categories, children included.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the arena holds no categories at all.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All categories in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.items.iter()
    }

    /// Category with the given id.
    pub fn by_id(&self, id: u64) -> Option<&Category> {
        self.by_id.get(&id).map(|&index| &self.items[index])
    }

    /// Category with the given URL name.
    pub fn by_urlname(&self, urlname: &str) -> Option<&Category> {
        self.by_urlname.get(urlname).map(|&index| &self.items[index])
    }

    /// Category with the given display name, case-insensitively.
    pub fn by_name(&self, name: &str) -> Option<&Category> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&index| &self.items[index])
    }

    /// Parent of the given category, if it has one.
    pub fn parent_of(&self, category: &Category) -> Option<&Category> {
        category.parent.and_then(|id| self.by_id(id))
    }
}

fn flatten(node: CategoryNode, parent: Option<u64>, out: &mut Vec<Category>) {
    let id = node.id;
    let children: Vec<u64> = node.categories.iter().map(|child| child.id).collect();
    out.push(Category {
        id,
        urlname: node.urlname,
        name: node.name,
        position: node.position,
        is_readonly: node.readonly,
        parent,
        children,
    });
    for child in node.categories {
        flatten(child, Some(id), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Categories {
        let json = r#"[
            {
                "id": "20",
                "urlname": "computers",
                "name": "Компьютеры, Связь",
                "position": "1",
                "readonly": "0",
                "categories": [
                    {"id": "24", "urlname": "hardware", "name": "Железо", "position": "1", "readonly": "0"},
                    {"id": "25", "urlname": "internet", "name": "Интернет", "position": "2", "readonly": "1"}
                ]
            },
            {"id": "4", "urlname": "auto", "name": "Авто, Мото", "position": "2", "readonly": "0"}
        ]"#;
        let roots: Vec<CategoryNode> = serde_json::from_str(json).unwrap();
        Categories::new(roots)
    }

    #[test]
    fn test_flattens_and_sorts_by_id() {
        let categories = sample();
        assert_eq!(categories.len(), 4);
        let ids: Vec<u64> = categories.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![4, 20, 24, 25]);
    }

    #[test]
    fn test_parent_and_child_links_are_ids() {
        let categories = sample();
        let root = categories.by_id(20).unwrap();
        assert_eq!(root.parent, None);
        assert_eq!(root.children, vec![24, 25]);

        let child = categories.by_id(24).unwrap();
        assert_eq!(child.parent, Some(20));
        assert!(child.children.is_empty());
        assert_eq!(categories.parent_of(child).unwrap().id, 20);
    }

    #[test]
    fn test_lookups() {
        let categories = sample();
        assert_eq!(categories.by_urlname("hardware").unwrap().id, 24);
        assert_eq!(categories.by_name("железо").unwrap().id, 24);
        assert_eq!(categories.by_name("ЖЕЛЕЗО").unwrap().id, 24);
        assert_eq!(categories.by_id(999), None);
        assert_eq!(categories.by_urlname("nope"), None);
    }

    #[test]
    fn test_readonly_flag_parsed_from_string() {
        let categories = sample();
        assert!(!categories.by_id(24).unwrap().is_readonly);
        assert!(categories.by_id(25).unwrap().is_readonly);
        assert!(categories.by_id(25).unwrap().url().ends_with("/internet/"));
    }
}
