// Branch scoping for listing endpoints.
use uuid::Uuid;

use crate::dal;
use crate::database::manager::DatabaseError;
use crate::database::models::account::Account;
use crate::filter::SearchFilter;
use crate::middleware::principal::Principal;
use crate::permissions::{Action, Category};
use crate::state::AppState;

/// Branch visibility for a listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchScope {
    Unrestricted,
    Branches(Vec<Uuid>),
}

/// Decide which branches a principal may list.
///
/// A principal with no account row is the super-admin case and stays
/// unrestricted. A multi-branch account with view-all capability is
/// unrestricted. An account listing accessible branches is limited to
/// those, otherwise to its default branch. An account with neither is
/// scoped to an empty set: an under-provisioned principal sees an empty
/// listing rather than falling through to full visibility.
pub fn resolve_list_scope(account: Option<&Account>, can_view_all: bool) -> BranchScope {
    let Some(account) = account else {
        return BranchScope::Unrestricted;
    };
    if account.multi_branches && can_view_all {
        return BranchScope::Unrestricted;
    }
    if !account.access_branches.is_empty() {
        return BranchScope::Branches(account.access_branches.clone());
    }
    if let Some(default_branch) = account.default_branch {
        return BranchScope::Branches(vec![default_branch]);
    }
    BranchScope::Branches(Vec::new())
}

/// Build the listing filter for a branch-scoped entity: resolve the
/// principal's account, apply the scoping rule, and restrict on the
/// entity's branch column when the scope is limited.
pub async fn scoped_branch_filter(
    state: &AppState,
    principal: &Principal,
    branch_column: &'static str,
) -> Result<SearchFilter, DatabaseError> {
    let can_view_all = state
        .permissions
        .is_permitted(principal, Category::User, Action::ViewAll);
    let account = dal::account::get_by_user(&state.pool, principal.user_id).await?;

    let mut filter = SearchFilter::empty();
    if let BranchScope::Branches(ids) = resolve_list_scope(account.as_ref(), can_view_all) {
        filter.and_id_in(branch_column, ids);
    }
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(
        default_branch: Option<Uuid>,
        access_branches: Vec<Uuid>,
        multi_branches: bool,
    ) -> Account {
        Account {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            default_branch,
            access_branches,
            multi_branches,
        }
    }

    #[test]
    fn no_account_is_unrestricted() {
        assert_eq!(resolve_list_scope(None, false), BranchScope::Unrestricted);
    }

    #[test]
    fn multi_branch_account_with_view_all_is_unrestricted() {
        let acc = account(None, vec![], true);
        assert_eq!(resolve_list_scope(Some(&acc), true), BranchScope::Unrestricted);
    }

    #[test]
    fn multi_branch_account_without_view_all_is_restricted() {
        let branch = Uuid::new_v4();
        let acc = account(Some(branch), vec![], true);
        assert_eq!(
            resolve_list_scope(Some(&acc), false),
            BranchScope::Branches(vec![branch])
        );
    }

    #[test]
    fn access_branches_win_over_default_branch() {
        let (x, y) = (Uuid::new_v4(), Uuid::new_v4());
        let acc = account(Some(Uuid::new_v4()), vec![x, y], false);
        assert_eq!(
            resolve_list_scope(Some(&acc), false),
            BranchScope::Branches(vec![x, y])
        );
    }

    #[test]
    fn bare_account_sees_nothing() {
        let acc = account(None, vec![], false);
        assert_eq!(
            resolve_list_scope(Some(&acc), true),
            BranchScope::Branches(vec![])
        );
    }
}
