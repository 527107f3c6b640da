/// Property-based tests for the navigation guard
///
/// These tests verify that every navigation attempt resolves to exactly one
/// outcome, determined only by the route requirement and the session snapshot.
use ecomflex_session::auth::{Role, SessionMode, SessionSnapshot};
use ecomflex_session::guard::{
    Navigation, RouteGuard, RouteRequirement, RouteTable, decide, role_home,
};
use proptest::prelude::*;

fn role_strategy() -> impl Strategy<Value = Option<Role>> {
    prop_oneof![
        Just(None),
        Just(Some(Role::Admin)),
        Just(Some(Role::Influencer)),
        Just(Some(Role::Public)),
    ]
}

fn snapshot_strategy() -> impl Strategy<Value = SessionSnapshot> {
    (any::<bool>(), role_strategy(), any::<bool>()).prop_map(|(is_authenticated, role, bypass)| {
        SessionSnapshot {
            is_authenticated,
            role,
            mode: if bypass {
                SessionMode::ElevatedBypass
            } else {
                SessionMode::Normal
            },
        }
    })
}

fn requirement_strategy() -> impl Strategy<Value = RouteRequirement> {
    (any::<bool>(), role_strategy())
        .prop_map(|(requires_auth, role)| RouteRequirement { requires_auth, role })
}

// Paths drawn from the route table plus arbitrary segments
fn target_strategy() -> impl Strategy<Value = String> {
    let known = prop_oneof![
        Just("/".to_string()),
        Just("/home".to_string()),
        Just("/auth/login".to_string()),
        Just("/admin/dashboard".to_string()),
        Just("/admin/proofs".to_string()),
        Just("/influencer/earnings".to_string()),
        Just("/my-bookings".to_string()),
    ];
    let product = (1u32..10_000).prop_map(|id| format!("/product/{}", id));
    let random = prop::collection::vec("[a-z]{1,8}", 1..4).prop_map(|s| format!("/{}", s.join("/")));
    let query = "[a-z]{1,5}";

    (prop_oneof![known, product, random], prop::option::of(query)).prop_map(|(path, q)| match q {
        Some(q) => format!("{}?q={}", path, q),
        None => path,
    })
}

proptest! {
    #[test]
    fn prop_login_redirect_iff_auth_required_and_anonymous(
        requirement in requirement_strategy(),
        snapshot in snapshot_strategy(),
        target in target_strategy(),
    ) {
        let outcome = decide(requirement, &snapshot, &target);
        let expect_login = requirement.requires_auth && !snapshot.is_authenticated;

        prop_assert_eq!(
            matches!(outcome, Navigation::RedirectToLogin { .. }),
            expect_login
        );
        if let Navigation::RedirectToLogin { redirect } = &outcome {
            prop_assert_eq!(redirect, &target);
        }
    }

    #[test]
    fn prop_role_redirect_points_at_role_home(
        requirement in requirement_strategy(),
        snapshot in snapshot_strategy(),
    ) {
        match decide(requirement, &snapshot, "/x") {
            Navigation::RedirectToRoleHome { path } => {
                prop_assert!(requirement.role.is_some());
                prop_assert_ne!(requirement.role, snapshot.role);
                prop_assert_eq!(path, role_home(snapshot.role));
            }
            Navigation::Proceed => {
                prop_assert!(!requirement.requires_auth || snapshot.is_authenticated);
                prop_assert!(requirement.role.is_none() || requirement.role == snapshot.role);
            }
            Navigation::RedirectToLogin { .. } => {}
        }
    }

    #[test]
    fn prop_guard_is_deterministic(
        snapshot in snapshot_strategy(),
        target in target_strategy(),
    ) {
        let guard = RouteGuard::new(snapshot, RouteTable::ecomflex());
        prop_assert_eq!(guard.check(&target), guard.check(&target));
    }

    #[test]
    fn prop_post_login_destination_is_site_relative(
        snapshot in snapshot_strategy(),
        redirect in prop::option::of("[ -~\t\n\r]{0,24}"),
    ) {
        let guard = RouteGuard::new(snapshot, RouteTable::ecomflex());
        let destination = guard.post_login_destination(redirect.as_deref());

        prop_assert!(destination.starts_with('/'));
        prop_assert!(!destination.starts_with("//"));
        prop_assert!(!destination.starts_with("/auth/"));
        prop_assert!(!destination.contains('\\'));
        prop_assert!(!destination.chars().any(char::is_control));
    }

    #[test]
    fn prop_backslash_redirect_never_resumed(
        snapshot in snapshot_strategy(),
        tail in "[a-z.]{1,16}",
    ) {
        let guard = RouteGuard::new(snapshot, RouteTable::ecomflex());
        let redirect = format!("/\\{}", tail);

        prop_assert_eq!(
            guard.post_login_destination(Some(&redirect)),
            role_home(snapshot.role)
        );
    }
}
