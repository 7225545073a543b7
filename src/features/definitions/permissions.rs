//! Permission name handling
//!
//! Definition files name permissions the way people write them
//! (`Manage Messages`, `MANAGE_MESSAGES`, `ManageMessages`). Matching is done on
//! a normalised form against serenity's own permission names.

use serenity::model::permissions::Permissions;

/// Lowercase and drop separators so all spellings compare equal
pub fn normalize_permission(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Canonical serenity name for a permission, if it exists
pub fn canonical_permission(name: &str) -> Option<&'static str> {
    let wanted = normalize_permission(name);
    Permissions::all()
        .get_permission_names()
        .into_iter()
        .find(|known| normalize_permission(known) == wanted)
}

/// Guild-wide permissions of a member from the role permissions it holds
///
/// The owner and any Administrator role get everything; otherwise @everyone is
/// combined with each of the member's roles.
pub fn guild_permissions(
    is_owner: bool,
    everyone: Permissions,
    member_roles: impl IntoIterator<Item = Permissions>,
) -> Permissions {
    if is_owner {
        return Permissions::all();
    }
    let mut permissions = everyone;
    for role in member_roles {
        if role.administrator() {
            return Permissions::all();
        }
        permissions |= role;
    }
    permissions
}

/// Required permissions that `held` does not grant, in declaration order
///
/// Administrator implies every permission. `None` means nothing is held
/// (e.g. direct messages, where there is no member to check).
pub fn missing_permissions(required: &[String], held: Option<Permissions>) -> Vec<String> {
    let held = held.unwrap_or_else(Permissions::empty);
    if held.administrator() {
        return Vec::new();
    }

    let held_names: Vec<String> = held
        .get_permission_names()
        .into_iter()
        .map(normalize_permission)
        .collect();

    required
        .iter()
        .filter(|perm| !held_names.contains(&normalize_permission(perm)))
        .map(|perm| canonical_permission(perm).unwrap_or(perm.as_str()).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spellings_normalise_equal() {
        assert_eq!(
            normalize_permission("Manage Messages"),
            normalize_permission("MANAGE_MESSAGES")
        );
        assert_eq!(
            normalize_permission("ManageMessages"),
            normalize_permission("manage-messages")
        );
    }

    #[test]
    fn test_canonical_permission_lookup() {
        assert_eq!(canonical_permission("MANAGE_MESSAGES"), Some("Manage Messages"));
        assert_eq!(canonical_permission("kickmembers"), Some("Kick Members"));
        assert_eq!(canonical_permission("Fly"), None);
    }

    #[test]
    fn test_missing_is_set_difference() {
        let required = vec!["SEND_MESSAGES".to_string(), "BAN_MEMBERS".to_string()];
        let held = Permissions::SEND_MESSAGES | Permissions::VIEW_CHANNEL;

        assert_eq!(
            missing_permissions(&required, Some(held)),
            vec!["Ban Members".to_string()]
        );
    }

    #[test]
    fn test_administrator_has_everything() {
        let required = vec!["Ban Members".to_string()];
        assert!(missing_permissions(&required, Some(Permissions::ADMINISTRATOR)).is_empty());
    }

    #[test]
    fn test_no_member_means_nothing_held() {
        let required = vec!["Send Messages".to_string()];
        assert_eq!(missing_permissions(&required, None), vec!["Send Messages"]);
    }

    #[test]
    fn test_guild_permissions_combine_everyone_and_roles() {
        let perms = guild_permissions(
            false,
            Permissions::VIEW_CHANNEL,
            [Permissions::SEND_MESSAGES, Permissions::KICK_MEMBERS],
        );
        assert_eq!(
            perms,
            Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES | Permissions::KICK_MEMBERS
        );
        let required = vec!["Kick Members".to_string(), "Ban Members".to_string()];
        assert_eq!(missing_permissions(&required, Some(perms)), vec!["Ban Members"]);
    }

    #[test]
    fn test_guild_permissions_owner_and_administrator_get_all() {
        assert_eq!(
            guild_permissions(true, Permissions::empty(), []),
            Permissions::all()
        );
        assert_eq!(
            guild_permissions(false, Permissions::empty(), [Permissions::ADMINISTRATOR]),
            Permissions::all()
        );
    }

    #[test]
    fn test_guild_permissions_without_roles_is_everyone() {
        assert_eq!(
            guild_permissions(false, Permissions::SEND_MESSAGES, []),
            Permissions::SEND_MESSAGES
        );
    }

    #[test]
    fn test_nothing_required_nothing_missing() {
        assert!(missing_permissions(&[], None).is_empty());
    }
}
