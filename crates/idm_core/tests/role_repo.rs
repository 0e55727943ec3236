mod common;

use idm_core::{EntityKind, EntityRepository, RepoError, Repositories, Role, RoleRepository};

#[test]
fn add_role_returns_positive_id() {
    let (_dir, pool) = common::test_pool();
    let repo = RoleRepository::new(pool);

    let got = repo.add("New role").unwrap();

    assert_eq!(got.name, "New role");
    assert!(got.id > 0);
    assert!(got.created_at > 0);
    assert_eq!(got.created_at, got.updated_at);
}

#[test]
fn find_role_by_id() {
    let (_dir, pool) = common::test_pool();
    let repo = RoleRepository::new(pool);
    let id = common::add(&repo, "New role");

    let got = repo.find_by_id(id).unwrap();
    assert_eq!(got.name, "New role");
}

#[test]
fn find_all_roles_skips_deleted() {
    let (_dir, pool) = common::test_pool();
    let repo = RoleRepository::new(pool);
    let first = common::add(&repo, "New role 1");
    let second = common::add(&repo, "New role 2");
    let third = common::add(&repo, "New role 3");
    repo.delete_by_id_silent(second).unwrap();

    let got = repo.find_all().unwrap();

    assert_eq!(common::ids(&got), vec![first, third]);
    assert_eq!(common::names(&got), vec!["New role 1", "New role 3"]);
}

#[test]
fn find_roles_by_ids_skips_deleted_and_unrequested() {
    let (_dir, pool) = common::test_pool();
    let repo = RoleRepository::new(pool);
    let first = common::add(&repo, "New role 1");
    let second = common::add(&repo, "New role 2");
    let third = common::add(&repo, "New role 3");
    let _fourth = common::add(&repo, "New role 4");
    repo.delete_by_id_silent(second).unwrap();

    let got: Vec<Role> = repo.find_by_ids(&[first, second, third]).unwrap();

    assert_eq!(common::ids(&got), vec![first, third]);
}

#[test]
fn deleted_role_is_not_found() {
    let (_dir, pool) = common::test_pool();
    let repo = RoleRepository::new(pool);
    let id = common::add(&repo, "New role");

    repo.delete_by_id_silent(id).unwrap();

    let err = repo.find_by_id(id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(EntityKind::Role)));
    assert_eq!(err.to_string(), "role not found");
}

#[test]
fn delete_roles_by_ids_keeps_the_rest() {
    let (_dir, pool) = common::test_pool();
    let repo = RoleRepository::new(pool);
    let first = common::add(&repo, "New role 1");
    let second = common::add(&repo, "New role 2");
    let third = common::add(&repo, "New role 3");

    repo.delete_by_ids_silent(&[first, third]).unwrap();

    let got = repo.find_all().unwrap();
    assert_eq!(common::ids(&got), vec![second]);
}

#[test]
fn empty_role_table_reports_not_found() {
    let (_dir, pool) = common::test_pool();
    let repo = RoleRepository::new(pool);

    assert!(matches!(
        repo.find_all().unwrap_err(),
        RepoError::NotFound(EntityKind::Role)
    ));
}

#[test]
fn collections_are_isolated_from_each_other() {
    let (_dir, pool) = common::test_pool();
    let repos = Repositories::new(&pool);
    let employee = repos.employees.add("Shared name").unwrap();
    let role = repos.roles.add("Shared name").unwrap();
    assert_eq!(employee.id, role.id);

    repos.employees.delete_by_id_silent(employee.id).unwrap();

    assert!(repos.employees.find_by_id(employee.id).unwrap_err().is_not_found());
    assert_eq!(repos.roles.find_by_id(role.id).unwrap(), role);
    assert!(!common::raw_is_deleted(&pool, "role", role.id));
}
