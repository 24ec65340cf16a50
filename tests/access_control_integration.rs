//! ---
//! studio_section: "15-testing-qa-runbook"
//! studio_subsection: "integration-tests"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Role lattice, section visibility and capability table checks across every role pair."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use studio_security::{
    assignable_roles, capabilities, check_delete, check_invite_role, check_role_change,
    visible_sections, Actor, Capabilities, DenialRule, GuardError, ProfileFilter, Role, Section,
    SectionView,
};

#[test]
fn visibility_is_monotonic_in_privilege() {
    for higher in Role::all() {
        for lower in Role::all().filter(|role| *role <= higher) {
            let wide = visible_sections(higher);
            let narrow = visible_sections(lower);
            assert!(
                wide.is_superset(&narrow),
                "{higher} should see everything {lower} sees"
            );
        }
    }
}

#[test]
fn visibility_per_role() {
    assert!(visible_sections(Role::Member).is_empty());
    assert_eq!(
        visible_sections(Role::Editor).into_iter().collect::<Vec<_>>(),
        vec![Section::Gallery, Section::Blog]
    );
    assert_eq!(
        visible_sections(Role::Admin).into_iter().collect::<Vec<_>>(),
        vec![Section::Gallery, Section::Blog, Section::Members]
    );
    assert_eq!(visible_sections(Role::SuperAdmin).len(), 5);
    assert_eq!(visible_sections(Role::Owner), visible_sections(Role::SuperAdmin));
}

#[test]
fn hidden_active_section_falls_back_and_is_stable() {
    let view = SectionView::apply(Role::Editor, Some(Section::Profiles));
    assert_eq!(view.active, Some(Section::Gallery));
    assert_eq!(SectionView::apply(Role::Editor, view.active), view);

    let member = SectionView::apply(Role::Member, Some(Section::Blog));
    assert_eq!(member.active, None);
}

#[test]
fn self_action_is_always_denied() {
    for role in Role::all() {
        assert_eq!(capabilities(role, role, true), Capabilities::NONE, "{role}");
        let actor = Actor::new("me", role);
        assert_eq!(
            check_role_change(&actor, "me", role, role, role),
            Err(GuardError::Denied(DenialRule::SelfAction))
        );
        assert_eq!(
            check_delete(&actor, "me", Some(role)),
            Err(GuardError::Denied(DenialRule::SelfAction))
        );
    }
}

#[test]
fn admin_cannot_touch_admins_or_above() {
    assert!(!capabilities(Role::Admin, Role::Admin, false).can_change_role);
    assert!(!capabilities(Role::Admin, Role::SuperAdmin, false).can_delete);
    assert_eq!(capabilities(Role::Admin, Role::Editor, false), Capabilities::ALL);
}

#[test]
fn super_admin_cannot_change_a_peer_role() {
    assert!(!capabilities(Role::SuperAdmin, Role::SuperAdmin, false).can_change_role);
    assert!(capabilities(Role::SuperAdmin, Role::SuperAdmin, false).can_modify_name);
    assert!(capabilities(Role::SuperAdmin, Role::Admin, false).can_change_role);
    assert_eq!(
        capabilities(Role::SuperAdmin, Role::Owner, false),
        Capabilities::NONE
    );
}

#[test]
fn owner_controls_other_owners() {
    assert_eq!(capabilities(Role::Owner, Role::Owner, false), Capabilities::ALL);
}

#[test]
fn members_and_editors_control_nobody() {
    for actor in [Role::Member, Role::Editor] {
        for subject in Role::all() {
            assert!(!capabilities(actor, subject, false).any(), "{actor} over {subject}");
        }
        assert!(assignable_roles(actor).is_empty());
    }
}

#[test]
fn admin_assignable_roles_stop_at_editor() {
    let roles = assignable_roles(Role::Admin);
    assert_eq!(roles, vec![Role::Member, Role::Editor]);
    for forbidden in [Role::Admin, Role::SuperAdmin, Role::Owner] {
        assert!(!roles.contains(&forbidden));
        assert!(check_invite_role(Role::Admin, forbidden).is_err());
    }
    assert!(!assignable_roles(Role::SuperAdmin).contains(&Role::Owner));
    assert!(assignable_roles(Role::Owner).contains(&Role::Owner));
}

#[test]
fn delete_needs_role_change_rights_too() {
    let actor = Actor::new("sa", Role::SuperAdmin);
    let caps = capabilities(Role::SuperAdmin, Role::SuperAdmin, false);
    assert!(caps.can_delete);
    assert!(check_delete(&actor, "peer", Some(Role::SuperAdmin)).is_err());
    assert!(check_delete(&actor, "adm", Some(Role::Admin)).is_ok());
    assert_eq!(
        check_delete(&actor, "ghost", None),
        Err(GuardError::Denied(DenialRule::UnknownRole))
    );
}

#[test]
fn profile_filter_hides_what_the_actor_cannot_manage() {
    let admin = ProfileFilter::for_actor(Role::Admin);
    assert!(admin.admits(Some(Role::Editor)));
    assert!(admin.admits(None));
    assert!(!admin.admits(Some(Role::Owner)));

    let super_admin = ProfileFilter::for_actor(Role::SuperAdmin);
    assert!(super_admin.admits(Some(Role::SuperAdmin)));
    assert!(!super_admin.admits(Some(Role::Owner)));
}

#[test]
fn unrecognised_columns_resolve_to_no_role() {
    assert_eq!(Role::from_column(Some("super_admin")), Some(Role::SuperAdmin));
    assert_eq!(Role::from_column(Some("  ")), None);
    assert_eq!(Role::from_column(Some("root")), None);
    assert_eq!(Role::from_column(None), None);
}
