//! End-to-end subscribers-group validation against both store backends.
//!
//! Each scenario is written once as a generic function and run against the
//! in-memory store, an in-memory `SQLite` database and an on-disk `SQLite`
//! database.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use groupgate::{
    Group, GroupId, GroupStoreAdmin, MemoryGroupStore, Principal, RealmId, RequestParams,
    SqliteGroupStore, Stream, SubscribersGroupValidator, SystemRoleTag, UserId, UserRole,
    ValidationError,
};
use tempfile::TempDir;

struct Realm<S> {
    store: Arc<S>,
    validator: SubscribersGroupValidator,
    stream: Stream,
    nobody: Group,
}

fn zulip() -> RealmId {
    RealmId::new("zulip")
}

fn iago() -> Principal {
    Principal::new("iago", zulip(), UserRole::Administrator)
}

fn hamlet() -> Principal {
    Principal::new("hamlet", zulip(), UserRole::Member)
}

fn cordelia() -> Principal {
    Principal::new("cordelia", zulip(), UserRole::Member)
}

fn setup<S: GroupStoreAdmin + 'static>(store: S) -> Realm<S> {
    let store = Arc::new(store);
    store
        .create_system_groups(&zulip())
        .expect("Failed to create system groups");
    let nobody = store
        .system_group(&zulip(), SystemRoleTag::Nobody)
        .expect("Failed to read store")
        .expect("role:nobody missing");
    Realm {
        validator: SubscribersGroupValidator::new(store.clone()),
        store,
        stream: Stream::new(1, zulip(), "Denmark"),
        nobody,
    }
}

fn admins<S: GroupStoreAdmin>(realm: &Realm<S>) -> Group {
    realm
        .store
        .system_group(&zulip(), SystemRoleTag::Administrators)
        .expect("Failed to read store")
        .expect("role:administrators missing")
}

fn custom_group<S: GroupStoreAdmin>(realm: &Realm<S>, name: &str) -> Group {
    let group = Group::custom(zulip(), name).with_can_mention_group(realm.nobody.id.clone());
    realm.store.insert_group(&group).expect("Failed to insert group");
    group
}

fn system_group_with_valid_role<S: GroupStoreAdmin + 'static>(store: S) {
    let realm = setup(store);
    let admin_group = admins(&realm);

    let result = realm
        .validator
        .validate(admin_group.clone(), &realm.stream, &RequestParams::new(), &iago())
        .expect("administrator should be allowed");
    assert_eq!(result, admin_group);
}

fn system_group_with_invalid_role<S: GroupStoreAdmin + 'static>(store: S) {
    let realm = setup(store);

    let err = realm
        .validator
        .validate(admins(&realm), &realm.stream, &RequestParams::new(), &hamlet())
        .expect_err("member should be rejected");
    assert_eq!(err.to_string(), "Insufficient permission");
}

fn non_system_group_member<S: GroupStoreAdmin + 'static>(store: S) {
    let realm = setup(store);
    let group = custom_group(&realm, "Test Custom Group");
    realm
        .store
        .add_direct_member(&group.id, &hamlet().id)
        .expect("Failed to add member");

    let result = realm
        .validator
        .validate(group.clone(), &realm.stream, &RequestParams::new(), &hamlet())
        .expect("member should be allowed");
    assert_eq!(result, group);
}

fn non_system_group_non_member<S: GroupStoreAdmin + 'static>(store: S) {
    let realm = setup(store);
    let group = custom_group(&realm, "Test Custom Group 2");

    let err = realm
        .validator
        .validate(group, &realm.stream, &RequestParams::new(), &cordelia())
        .expect_err("non-member should be rejected");
    assert!(matches!(err, ValidationError::InsufficientPermission));
}

fn invalid_group_id<S: GroupStoreAdmin + 'static>(store: S) {
    let realm = setup(store);

    let err = realm
        .validator
        .validate(GroupId::new("9999"), &realm.stream, &RequestParams::new(), &iago())
        .expect_err("unknown id should be rejected");
    assert_eq!(err.to_string(), "Invalid group configuration");
}

fn nested_membership<S: GroupStoreAdmin + 'static>(store: S) {
    let realm = setup(store);
    let outer = custom_group(&realm, "Shakespeare");
    let middle = custom_group(&realm, "Tragedies");
    let inner = custom_group(&realm, "Danes");
    realm
        .store
        .add_subgroup(&outer.id, &middle.id)
        .expect("Failed to add subgroup");
    realm
        .store
        .add_subgroup(&middle.id, &inner.id)
        .expect("Failed to add subgroup");
    // Close the loop so resolution has to cope with a cycle.
    realm
        .store
        .add_subgroup(&inner.id, &outer.id)
        .expect("Failed to add subgroup");
    realm
        .store
        .add_direct_member(&inner.id, &hamlet().id)
        .expect("Failed to add member");

    for group in [&outer, &middle, &inner] {
        realm
            .validator
            .validate(group.id.clone(), &realm.stream, &RequestParams::new(), &hamlet())
            .expect("nested member should be allowed");
    }
    let err = realm
        .validator
        .validate(outer.id, &realm.stream, &RequestParams::new(), &cordelia())
        .expect_err("non-member should be rejected");
    assert!(matches!(err, ValidationError::InsufficientPermission));
}

fn can_mention_group_grants_nothing<S: GroupStoreAdmin + 'static>(store: S) {
    let realm = setup(store);
    let mentioners = custom_group(&realm, "Mentioners");
    realm
        .store
        .add_direct_member(&mentioners.id, &cordelia().id)
        .expect("Failed to add member");
    let group = custom_group(&realm, "Quiet Group");
    realm
        .store
        .set_can_mention_group(&group.id, &mentioners.id)
        .expect("Failed to set capability");

    let err = realm
        .validator
        .validate(group.id, &realm.stream, &RequestParams::new(), &cordelia())
        .expect_err("capability holder is not a member");
    assert!(matches!(err, ValidationError::InsufficientPermission));
}

fn nobody_rejects_everyone<S: GroupStoreAdmin + 'static>(store: S) {
    let realm = setup(store);
    let owner = Principal::new("desdemona", zulip(), UserRole::Owner);

    let err = realm
        .validator
        .validate(realm.nobody.clone(), &realm.stream, &RequestParams::new(), &owner)
        .expect_err("role:nobody admits no one");
    assert!(matches!(err, ValidationError::InsufficientPermission));
}

fn foreign_realm_subgroup_grants_nothing<S: GroupStoreAdmin + 'static>(store: S) {
    let realm = setup(store);
    let engineering = custom_group(&realm, "engineering");
    let outsiders = realm
        .store
        .create_group(&RealmId::new("lear"), "outsiders", "")
        .expect("Failed to create group");
    realm
        .store
        .add_direct_member(&outsiders.id, &hamlet().id)
        .expect("Failed to add member");

    let err = realm
        .store
        .add_subgroup(&engineering.id, &outsiders.id)
        .expect_err("cross-realm nesting should be refused");
    assert!(matches!(err, groupgate::Error::InvalidInput(_)));

    let err = realm
        .validator
        .validate(engineering.id, &realm.stream, &RequestParams::new(), &hamlet())
        .expect_err("membership in another realm grants nothing");
    assert!(matches!(err, ValidationError::InsufficientPermission));

    let err = realm
        .validator
        .validate(outsiders.id, &realm.stream, &RequestParams::new(), &hamlet())
        .expect_err("group from another realm is invalid");
    assert!(matches!(err, ValidationError::InvalidGroupConfiguration));
}

macro_rules! backend_tests {
    ($($scenario:ident),* $(,)?) => {
        mod memory {
            $(
                #[test]
                fn $scenario() {
                    super::$scenario(groupgate::MemoryGroupStore::new());
                }
            )*
        }

        mod sqlite {
            $(
                #[test]
                fn $scenario() {
                    super::$scenario(
                        groupgate::SqliteGroupStore::in_memory().expect("Failed to open store"),
                    );
                }
            )*
        }

        mod sqlite_file {
            $(
                #[test]
                fn $scenario() {
                    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
                    super::$scenario(
                        groupgate::SqliteGroupStore::new(dir.path().join("groups.db"))
                            .expect("Failed to open store"),
                    );
                }
            )*
        }
    };
}

backend_tests!(
    system_group_with_valid_role,
    system_group_with_invalid_role,
    non_system_group_member,
    non_system_group_non_member,
    invalid_group_id,
    nested_membership,
    can_mention_group_grants_nothing,
    nobody_rejects_everyone,
    foreign_realm_subgroup_grants_nothing,
);

#[test]
fn sqlite_decisions_survive_reopen() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("groups.db");

    let group_id = {
        let store = SqliteGroupStore::new(&path).expect("Failed to open store");
        store
            .create_system_groups(&zulip())
            .expect("Failed to create system groups");
        let group = store
            .create_group(&zulip(), "Persisted", "")
            .expect("Failed to create group");
        store
            .add_direct_member(&group.id, &UserId::new("hamlet"))
            .expect("Failed to add member");
        group.id
    };

    let reopened = Arc::new(SqliteGroupStore::new(&path).expect("Failed to reopen store"));
    let validator = SubscribersGroupValidator::new(reopened);
    let stream = Stream::new(1, zulip(), "Denmark");

    validator
        .validate(group_id.clone(), &stream, &RequestParams::new(), &hamlet())
        .expect("persisted membership should be honoured");
    assert!(
        validator
            .validate(group_id, &stream, &RequestParams::new(), &cordelia())
            .is_err()
    );
}

#[test]
fn validator_is_shared_across_threads() {
    let realm = setup(MemoryGroupStore::new());
    let admin_group = admins(&realm);
    let validator = realm.validator.clone();

    let handles: Vec<_> = [iago(), hamlet()]
        .into_iter()
        .map(|user| {
            let validator = validator.clone();
            let group = admin_group.clone();
            let stream = realm.stream.clone();
            std::thread::spawn(move || {
                validator
                    .validate(group, &stream, &RequestParams::new(), &user)
                    .is_ok()
            })
        })
        .collect();

    let outcomes: Vec<bool> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();
    assert_eq!(outcomes, vec![true, false]);
}
