use crate::models::Collection;
use std::{collections::BTreeMap, path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

pub type TabId = u64;

/// All open tabs, keyed by a monotonically increasing id so iteration order
/// is creation order. Selection is held here explicitly rather than read off
/// any UI widget.
#[derive(Debug, Default)]
pub struct Registry {
    tabs: BTreeMap<TabId, Collection>,
    selected: Option<TabId>,
    next_id: TabId,
}

impl Registry {
    pub fn insert(&mut self, collection: Collection) -> TabId {
        let id = self.next_id;
        self.next_id += 1;
        self.tabs.insert(id, collection);
        self.selected = Some(id);
        id
    }

    pub fn remove(&mut self, id: TabId) -> Option<Collection> {
        let removed = self.tabs.remove(&id);
        if removed.is_some() && self.selected == Some(id) {
            self.selected = self.tabs.keys().next_back().copied();
        }
        removed
    }

    pub fn get(&self, id: TabId) -> Option<&Collection> {
        self.tabs.get(&id)
    }

    pub fn get_mut(&mut self, id: TabId) -> Option<&mut Collection> {
        self.tabs.get_mut(&id)
    }

    pub fn select(&mut self, id: TabId) -> bool {
        if self.tabs.contains_key(&id) {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn selected(&self) -> Option<(TabId, &Collection)> {
        let id = self.selected?;
        self.tabs.get(&id).map(|collection| (id, collection))
    }

    pub fn selected_id(&self) -> Option<TabId> {
        self.selected
    }

    /// Exact display-name match, the only dedup the load boundary performs.
    pub fn find_by_name(&self, name: &str) -> Option<TabId> {
        self.tabs
            .iter()
            .find(|(_, collection)| collection.name == name)
            .map(|(id, _)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TabId, &Collection)> {
        self.tabs.iter().map(|(id, collection)| (*id, collection))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub save_dir: PathBuf,
    pub registry: Arc<Mutex<Registry>>,
}

impl AppState {
    pub fn new(save_dir: PathBuf, registry: Registry) -> Self {
        Self {
            save_dir,
            registry: Arc::new(Mutex::new(registry)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_selects_the_new_tab() {
        let mut registry = Registry::default();
        let first = registry.insert(Collection::new("Emerald"));
        assert_eq!(registry.selected_id(), Some(first));

        let second = registry.insert(Collection::new("Platinum"));
        assert_eq!(registry.selected_id(), Some(second));
    }

    #[test]
    fn removing_selected_falls_back_to_last_remaining() {
        let mut registry = Registry::default();
        let first = registry.insert(Collection::new("Emerald"));
        let second = registry.insert(Collection::new("Platinum"));

        registry.remove(second);
        assert_eq!(registry.selected_id(), Some(first));

        registry.remove(first);
        assert_eq!(registry.selected_id(), None);
    }

    #[test]
    fn find_by_name_is_exact_match_only() {
        let mut registry = Registry::default();
        let id = registry.insert(Collection::new("Pokemon Glazed"));
        assert_eq!(registry.find_by_name("Pokemon Glazed"), Some(id));
        assert_eq!(registry.find_by_name("pokemon glazed"), None);
    }
}
