//! ---
//! studio_section: "15-testing-qa-runbook"
//! studio_subsection: "integration-tests"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "End-to-end console flows against the in-memory backend."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use std::sync::Arc;

use prometheus::Registry;
use studio_backend::{ContentItem, ContentKind, ContentPatch, InMemoryBackend};
use studio_console::{
    ActorContext, Console, ConsoleError, ConsoleServices, ConsoleSettings, ConsoleState,
    ContentManager, DeleteRequest, SaveRequest, SectionContent, ROLE_ABSENT_MESSAGE,
};
use studio_security::{Actor, AuditLog, ConsoleAction, DenialRule, Role, Section, SecurityMetrics};
use tempfile::tempdir;

fn backend_for(actor_role: Option<&str>) -> Arc<InMemoryBackend> {
    let backend = Arc::new(InMemoryBackend::new());
    backend.sign_in("me", Some("me@example.com"));
    backend.insert_profile("me", Some("Me"), Some("me@example.com"), actor_role);
    backend.insert_profile("ed", Some("Eddie"), Some("ed@example.com"), Some("editor"));
    backend.insert_profile("ad", Some("Ada"), Some("ada@example.com"), Some("admin"));
    backend.insert_profile("sa", Some("Sam"), Some("sam@example.com"), Some("super_admin"));
    backend.insert_profile("ow", Some("Olive"), Some("own@example.com"), Some("owner"));
    backend.insert_content(
        ContentKind::Gallery,
        ContentItem {
            id: "1".into(),
            title: Some("Launch".into()),
            detail: Some("events".into()),
            media_url: None,
            created_at: Some("2024-05-01T10:00:00Z".into()),
        },
    );
    backend
}

fn services(backend: &Arc<InMemoryBackend>) -> Arc<ConsoleServices> {
    Arc::new(ConsoleServices::new(backend.clone(), ConsoleSettings::default()))
}

async fn ready_console(backend: &Arc<InMemoryBackend>, start: Option<Section>) -> Console {
    let console = Console::starting_at(services(backend), start);
    assert!(console.bootstrap().await.is_ready());
    console
}

#[tokio::test]
async fn super_admin_cannot_demote_a_peer() {
    let backend = backend_for(Some("super_admin"));
    let console = ready_console(&backend, Some(Section::Profiles)).await;
    let users = console.users().unwrap();

    let rejection = users
        .save(SaveRequest {
            subject_id: "sa".into(),
            assumed_role: Role::SuperAdmin,
            role: Role::Editor,
            full_name: "Sam".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(
        rejection.error,
        ConsoleError::PermissionDenied(DenialRule::PeerSuperAdminImmutable)
    );
    assert_eq!(rejection.revert_to, Some(Role::SuperAdmin));
    assert!(rejection.status().is_error());
    assert_eq!(backend.call_count("update_profile"), 0);
    assert_eq!(backend.stored_role("sa").as_deref(), Some("super_admin"));
}

#[tokio::test]
async fn control_rendered_for_an_outdated_role_is_refused() {
    let backend = backend_for(Some("super_admin"));
    let console = ready_console(&backend, Some(Section::Profiles)).await;
    let users = console.users().unwrap();
    backend.set_role("ad", Some("super_admin"));

    let rejection = users
        .save(SaveRequest {
            subject_id: "ad".into(),
            assumed_role: Role::Admin,
            role: Role::Editor,
            full_name: "Ada".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(
        rejection.error,
        ConsoleError::StaleRoleConflict {
            assumed: Role::Admin,
            persisted: Role::SuperAdmin,
            rule: Some(DenialRule::PeerSuperAdminImmutable),
        }
    );
    assert_eq!(rejection.revert_to, Some(Role::SuperAdmin));
    assert_eq!(backend.call_count("update_profile"), 0);
}

#[tokio::test]
async fn admin_saving_an_unchanged_editor_role_writes() {
    let backend = backend_for(Some("admin"));
    let console = ready_console(&backend, None).await;
    assert!(console.users().is_err());

    let context = console.context().unwrap().clone();
    let users = studio_console::UserManager::new(console.services().clone(), context);
    let outcome = users
        .save(SaveRequest {
            subject_id: "ed".into(),
            assumed_role: Role::Editor,
            role: Role::Editor,
            full_name: "Eddie".into(),
        })
        .await
        .unwrap();
    assert_eq!(outcome.role, Role::Editor);
    assert_eq!(outcome.status.text, "Successfully updated profile for Eddie.");
    assert_eq!(backend.call_count("update_profile"), 1);
    assert_eq!(backend.stored_role("ed").as_deref(), Some("editor"));
}

#[tokio::test]
async fn member_is_redirected_before_any_listing() {
    let backend = backend_for(Some("member"));
    let console = Console::starting_at(services(&backend), Some(Section::Profiles));
    assert_eq!(
        console.bootstrap().await,
        ConsoleState::MemberRedirect {
            destination: "/member-dashboard.html".into()
        }
    );
    assert_eq!(backend.call_count("list_profiles"), 0);
    assert_eq!(backend.call_count("list_items"), 0);
    assert!(matches!(console.users(), Err(ConsoleError::SessionMissing)));
}

#[tokio::test]
async fn absent_role_blocks_every_data_load() {
    for role in [None, Some(""), Some("superuser")] {
        let backend = backend_for(role);
        let console = Console::new(services(&backend));
        assert_eq!(
            console.bootstrap().await,
            ConsoleState::AccessDenied {
                message: ROLE_ABSENT_MESSAGE.to_owned()
            }
        );
        assert_eq!(backend.call_count("list_items"), 0);
        assert_eq!(backend.call_count("list_profiles"), 0);
        assert!(console.open_section(Section::Gallery).await.is_err());
        assert_eq!(backend.call_count("list_items"), 0);
    }
}

#[tokio::test]
async fn owner_console_loads_profiles_and_records_changes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.log");
    let registry = Arc::new(Registry::new());
    let backend = backend_for(Some("owner"));
    let services = Arc::new(
        ConsoleServices::new(backend.clone(), ConsoleSettings::default())
            .with_metrics(SecurityMetrics::new(registry.clone()).unwrap())
            .with_audit(AuditLog::open(&path).unwrap()),
    );
    let console = Console::starting_at(services, Some(Section::Profiles));

    let ConsoleState::Ready {
        active, content, ..
    } = console.bootstrap().await
    else {
        panic!("expected ready");
    };
    assert_eq!(active, Some(Section::Profiles));
    let Some(SectionContent::Profiles { rows }) = content else {
        panic!("expected profile rows");
    };
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().any(|row| row.subject.id == "ow" && row.capabilities.can_delete));

    let users = console.users().unwrap();
    users
        .save(SaveRequest {
            subject_id: "ed".into(),
            assumed_role: Role::Editor,
            role: Role::Admin,
            full_name: "Edward".into(),
        })
        .await
        .unwrap();
    let status = users
        .delete(DeleteRequest {
            subject_id: "ad".into(),
            email: Some("ada@example.com".into()),
            role: Some(Role::Admin),
            confirmed: true,
        })
        .await
        .unwrap();
    assert_eq!(status.text, "Successfully deleted ada@example.com.");
    assert!(!backend.has_profile("ad"));

    let self_delete = users
        .delete(DeleteRequest {
            subject_id: "me".into(),
            email: Some("me@example.com".into()),
            role: Some(Role::Owner),
            confirmed: true,
        })
        .await
        .unwrap_err();
    assert_eq!(self_delete, ConsoleError::PermissionDenied(DenialRule::SelfAction));
    assert_eq!(backend.call_count("invoke:delete-user"), 1);

    let log = AuditLog::open(&path).unwrap();
    let actions: Vec<ConsoleAction> = log
        .entries()
        .unwrap()
        .into_iter()
        .map(|entry| entry.action)
        .collect();
    assert_eq!(
        actions,
        vec![
            ConsoleAction::RoleChange,
            ConsoleAction::Rename,
            ConsoleAction::UserDelete
        ]
    );
    assert!(log.verify().unwrap());

    let families: Vec<String> = registry
        .gather()
        .iter()
        .map(|family| family.get_name().to_owned())
        .collect();
    assert!(families.contains(&"studio_role_resolutions_total".to_owned()));
    assert!(families.contains(&"studio_permission_denials_total".to_owned()));
}

#[tokio::test]
async fn editor_manages_gallery_but_not_members() {
    let backend = backend_for(Some("editor"));
    let console = ready_console(&backend, None).await;
    assert_eq!(console.active_section(), Some(Section::Gallery));
    assert!(console.inviter().is_err());

    let content = console.content().unwrap();
    let items = content.list(ContentKind::Gallery).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(
        content.list(ContentKind::Members).await.unwrap_err(),
        ConsoleError::PermissionDenied(DenialRule::SectionHidden(Section::Members))
    );

    let status = content
        .delete(ContentKind::Gallery, &items[0], true)
        .await
        .unwrap();
    assert_eq!(status.text, "Item deleted successfully!");
    assert!(backend.content(ContentKind::Gallery).is_empty());
}

#[tokio::test]
async fn editor_updates_a_blog_post_with_an_audit_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.log");
    let backend = backend_for(Some("editor"));
    backend.insert_content(
        ContentKind::Blog,
        ContentItem {
            id: "p-1".into(),
            title: None,
            detail: None,
            media_url: None,
            created_at: Some("2024-05-02T08:00:00Z".into()),
        },
    );
    let services = Arc::new(
        ConsoleServices::new(backend.clone(), ConsoleSettings::default())
            .with_audit(AuditLog::open(&path).unwrap()),
    );
    let console = Console::starting_at(services, Some(Section::Blog));
    let ConsoleState::Ready {
        content: Some(SectionContent::Content { kind, items }),
        ..
    } = console.bootstrap().await
    else {
        panic!("expected blog listing");
    };
    assert_eq!(kind, ContentKind::Blog);
    assert_eq!(items[0].display_title(kind), "Untitled Post");
    assert_eq!(items[0].display_detail(kind).as_deref(), Some("By Unknown Author"));

    let content = console.content().unwrap();
    let post = content.edit("p-1").await.unwrap();
    assert_eq!(post.title, None);
    let status = content
        .update(
            "p-1",
            ContentPatch {
                title: Some("Spring launch".into()),
                author: Some("Eddie".into()),
                content: Some("We shipped.".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(status.text, "Post updated successfully!");
    let post = content.edit("p-1").await.unwrap();
    assert_eq!(post.author.as_deref(), Some("Eddie"));
    assert_eq!(post.content.as_deref(), Some("We shipped."));

    let log = AuditLog::open(&path).unwrap();
    let entries = log.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, ConsoleAction::ContentUpdate);
    assert_eq!(backend.call_count("update_item"), 1);
}

#[tokio::test]
async fn member_cannot_open_the_post_editor() {
    let backend = backend_for(Some("member"));
    let context = ActorContext::new(Actor::new("me", Role::Member));
    let content = ContentManager::new(services(&backend), context);
    assert_eq!(
        content.edit("p-1").await.unwrap_err(),
        ConsoleError::PermissionDenied(DenialRule::SectionHidden(Section::Blog))
    );
    assert_eq!(backend.call_count("fetch_item"), 0);
}

#[tokio::test]
async fn super_admin_invites_within_assignable_roles() {
    let backend = backend_for(Some("super_admin"));
    let console = ready_console(&backend, Some(Section::Invite)).await;
    let inviter = console.inviter().unwrap();
    assert!(!inviter.assignable().contains(&Role::Owner));

    assert_eq!(
        inviter
            .invite("boss@example.com", Some(Role::Owner))
            .await
            .unwrap_err(),
        ConsoleError::PermissionDenied(DenialRule::OwnerGrantReserved)
    );
    let status = inviter
        .invite("new@example.com", Some(Role::Editor))
        .await
        .unwrap();
    assert_eq!(status.text, "Invitation sent successfully!");
    assert_eq!(backend.invocations("invite-user").len(), 1);
}
