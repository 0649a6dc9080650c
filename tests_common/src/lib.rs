//! Shared fixtures and repository test suites reusable across backends.

use async_trait::async_trait;
use blogly_core::{RepoResult, Repository, User};

/// The user every route test starts from.
pub fn test_user() -> User {
    User::new("test1_first", "test1_last", None)
}

#[async_trait]
pub trait RepoFactory {
    /// Construct a repository over an empty, migrated database.
    async fn new_user_repo(&self) -> RepoResult<Box<dyn Repository<User> + Send + Sync>>;
}

/// Generic CRUD roundtrip test.
pub async fn test_crud_roundtrip<F: RepoFactory + Sync>(f: &F) -> RepoResult<()> {
    let repo = f.new_user_repo().await?;

    let created = repo.insert(&test_user()).await?;
    let id = created.id.expect("insert assigns an id");
    assert_eq!(created.first_name, "test1_first");
    assert_eq!(created.image_url, None);

    let fetched = repo.find_by_id(&id).await?;
    assert_eq!(fetched.as_ref(), Some(&created));

    let mut edited = created.clone();
    edited.first_name = "renamed".into();
    edited.image_url = Some("http://img/x.png".into());
    let updated = repo.update(&edited).await?;
    assert_eq!(updated.as_ref(), Some(&edited));

    assert!(repo.delete_by_id(&id).await?);
    assert_eq!(repo.find_by_id(&id).await?, None);
    assert!(!repo.delete_by_id(&id).await?, "second delete finds nothing");
    assert_eq!(repo.update(&edited).await?, None, "update after delete");
    Ok(())
}

/// `find_all` returns users by last name, then first name.
pub async fn test_find_all_ordering<F: RepoFactory + Sync>(f: &F) -> RepoResult<()> {
    let repo = f.new_user_repo().await?;
    assert!(repo.find_all().await?.is_empty());

    for (first, last) in [("Zed", "Banana"), ("Amy", "Cherry"), ("Bob", "Banana")] {
        repo.insert(&User::new(first, last, None)).await?;
    }
    let names: Vec<String> = repo
        .find_all()
        .await?
        .iter()
        .map(User::full_name)
        .collect();
    assert_eq!(names, ["Bob Banana", "Zed Banana", "Amy Cherry"]);
    Ok(())
}
