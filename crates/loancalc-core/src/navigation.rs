//! Open/closed state for a set of dropdown menus where at most one menu is
//! open at a time.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuId(pub String);

impl MenuId {
    pub fn new(id: impl Into<String>) -> Self {
        MenuId(id.into())
    }
}

impl fmt::Display for MenuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "menu", rename_all = "snake_case")]
pub enum MenuState {
    #[default]
    Closed,
    Open(MenuId),
}

impl MenuState {
    /// Clicking a menu's trigger: opens it (closing any other), or closes it
    /// when it is already the open one.
    pub fn toggle(&mut self, menu: MenuId) {
        *self = match std::mem::take(self) {
            MenuState::Open(current) if current == menu => MenuState::Closed,
            _ => MenuState::Open(menu),
        };
    }

    pub fn close(&mut self) {
        *self = MenuState::Closed;
    }

    /// A click or focus change. Interactions inside the open menu (`None`
    /// means outside every menu) leave it open.
    pub fn on_outside_interaction(&mut self, inside: Option<&MenuId>) {
        if matches!(&*self, MenuState::Open(current) if inside != Some(current)) {
            self.close();
        }
    }

    pub fn is_open(&self, menu: &MenuId) -> bool {
        matches!(self, MenuState::Open(current) if current == menu)
    }

    pub fn open_menu(&self) -> Option<&MenuId> {
        match self {
            MenuState::Open(menu) => Some(menu),
            MenuState::Closed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_opens_and_closes() {
        let loans = MenuId::new("loans");
        let mut state = MenuState::default();
        state.toggle(loans.clone());
        assert!(state.is_open(&loans));
        state.toggle(loans.clone());
        assert_eq!(state, MenuState::Closed);
    }

    #[test]
    fn test_only_one_menu_open() {
        let loans = MenuId::new("loans");
        let savings = MenuId::new("savings");
        let mut state = MenuState::default();
        state.toggle(loans.clone());
        state.toggle(savings.clone());
        assert!(!state.is_open(&loans));
        assert_eq!(state.open_menu(), Some(&savings));
    }

    #[test]
    fn test_outside_interaction_closes() {
        let loans = MenuId::new("loans");
        let mut state = MenuState::Open(loans.clone());
        state.on_outside_interaction(Some(&loans));
        assert!(state.is_open(&loans));
        state.on_outside_interaction(Some(&MenuId::new("savings")));
        assert_eq!(state, MenuState::Closed);

        state.on_outside_interaction(None);
        assert_eq!(state, MenuState::Closed);
    }

    #[test]
    fn test_serializes_tagged() {
        let json = serde_json::to_value(MenuState::Open(MenuId::new("loans"))).unwrap();
        assert_eq!(json["state"], "open");
        assert_eq!(json["menu"], "loans");
    }
}
