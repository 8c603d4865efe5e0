// Capability checking. The policy table is built once at startup and
// injected through `AppState`; handlers never consult ambient globals.
use std::collections::{HashMap, HashSet};

use crate::middleware::principal::Principal;

/// Action category a permission is keyed on. Region operations carry their
/// own category; monitoring configs and processing requests are guarded at
/// the user level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Region,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    View,
    ViewAll,
    Update,
    Remove,
}

const ALL_ACTIONS: [Action; 5] = [
    Action::Create,
    Action::View,
    Action::ViewAll,
    Action::Update,
    Action::Remove,
];

/// Role-keyed grant table answering "can this actor perform this action on
/// this resource category".
#[derive(Debug, Clone, Default)]
pub struct PermissionChecker {
    grants: HashMap<String, HashSet<(Category, Action)>>,
}

impl PermissionChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy shipped with the service: admins hold every capability,
    /// managers run the user-level entities and read regions, officers get
    /// the day-to-day create/view/update set.
    pub fn with_default_policy() -> Self {
        let mut checker = Self::new();

        for category in [Category::Region, Category::User] {
            for action in ALL_ACTIONS {
                checker.grant("admin", category, action);
            }
        }

        for action in ALL_ACTIONS {
            checker.grant("manager", Category::User, action);
        }
        checker.grant("manager", Category::Region, Action::View);
        checker.grant("manager", Category::Region, Action::ViewAll);

        for action in [Action::Create, Action::View, Action::Update] {
            checker.grant("officer", Category::User, action);
        }
        checker.grant("officer", Category::Region, Action::View);

        checker
    }

    pub fn grant(&mut self, role: &str, category: Category, action: Action) {
        self.grants
            .entry(role.to_string())
            .or_default()
            .insert((category, action));
    }

    pub fn is_permitted(&self, principal: &Principal, category: Category, action: Action) -> bool {
        principal.roles.iter().any(|role| {
            self.grants
                .get(role.as_str())
                .is_some_and(|granted| granted.contains(&(category, action)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn principal(roles: &[&str]) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn admin_holds_every_capability() {
        let checker = PermissionChecker::with_default_policy();
        let admin = principal(&["admin"]);
        for category in [Category::Region, Category::User] {
            for action in ALL_ACTIONS {
                assert!(checker.is_permitted(&admin, category, action));
            }
        }
    }

    #[test]
    fn officer_cannot_remove_or_view_all() {
        let checker = PermissionChecker::with_default_policy();
        let officer = principal(&["officer"]);
        assert!(checker.is_permitted(&officer, Category::User, Action::Create));
        assert!(checker.is_permitted(&officer, Category::Region, Action::View));
        assert!(!checker.is_permitted(&officer, Category::User, Action::Remove));
        assert!(!checker.is_permitted(&officer, Category::User, Action::ViewAll));
        assert!(!checker.is_permitted(&officer, Category::Region, Action::Create));
    }

    #[test]
    fn unknown_role_is_denied() {
        let checker = PermissionChecker::with_default_policy();
        let stranger = principal(&["auditor"]);
        assert!(!checker.is_permitted(&stranger, Category::Region, Action::View));
    }

    #[test]
    fn any_matching_role_grants() {
        let checker = PermissionChecker::with_default_policy();
        let both = principal(&["officer", "manager"]);
        assert!(checker.is_permitted(&both, Category::User, Action::Remove));
    }
}
