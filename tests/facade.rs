use pakscan::core::error::ScanError;
use pakscan::core::facade::InspectSession;
use pakscan::core::package::{AclEntry, PropertyValue};
use pakscan::core::repo::Repository;

fn seeded_repo() -> Repository {
    let mut repo = Repository::new();
    repo.ensure_path("/content/site/en", "cq:Page").unwrap();
    repo.set_property("/content/site", "title", PropertyValue::String("Site".to_string()))
        .unwrap();
    repo
}

#[test]
fn test_inspection_surface_passes_through() {
    let repo = seeded_repo();
    let session = InspectSession::new(&repo);

    assert!(session.node_exists("/content/site/en").unwrap());
    assert!(!session.node_exists("/content/missing").unwrap());

    let site = session.node("/content/site").unwrap().unwrap();
    assert_eq!(site.path(), "/content/site");
    assert_eq!(site.node_type(), "nt:unstructured");
    assert_eq!(site.child_names(), vec!["en"]);
    assert_eq!(site.child("en").unwrap().node_type(), "cq:Page");
    assert!(session.acl("/content/site").unwrap().is_empty());
}

#[test]
fn test_every_mutation_is_rejected_with_read_only_kind() {
    let repo = seeded_repo();
    let session = InspectSession::new(&repo);

    // legal-looking writes still fail, with the read-only kind
    let attempts: Vec<Result<(), ScanError>> = vec![
        session.create_node("/content/new", "nt:unstructured"),
        session.remove_node("/content/site/en"),
        session.set_property("/content/site", "title", PropertyValue::String("x".to_string())),
        session.move_node("/content/site", "/content/site2"),
        session.apply_acl(&AclEntry {
            path: "/content/site".to_string(),
            principal: "everyone".to_string(),
            allow: true,
            privileges: vec!["jcr:read".to_string()],
        }),
        session.refresh_lock("/content/site"),
    ];
    for attempt in attempts {
        assert!(matches!(attempt, Err(ScanError::ReadOnly(_))));
    }

    // nested handles route through the same enforcement
    let node = session.node("/content/site").unwrap().unwrap();
    assert!(matches!(
        node.set_property("title", PropertyValue::Bool(true)),
        Err(ScanError::ReadOnly(_))
    ));
    assert!(matches!(node.remove(), Err(ScanError::ReadOnly(_))));
}

#[test]
fn test_read_only_error_is_distinct_from_repo_error() {
    let repo = seeded_repo();
    let session = InspectSession::new(&repo);

    // a malformed path is a repository error, not a read-only violation
    let repo_err = session.node("not-a-path").unwrap_err();
    assert!(matches!(repo_err, ScanError::Repo(_)));
    assert!(!repo_err.is_read_only());

    let read_only = session.create_node("/content/new", "nt:unstructured").unwrap_err();
    assert!(read_only.is_read_only());
}

#[test]
fn test_facade_never_no_ops_silently() {
    let mut repo = Repository::new();
    repo.ensure_path("/content", "nt:unstructured").unwrap();
    {
        let session = InspectSession::new(&repo);
        assert!(session.remove_node("/content").is_err());
    }
    // the rejected call must not have touched the tree
    assert!(repo.node_exists("/content").unwrap());
}
