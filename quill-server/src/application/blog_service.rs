use crate::application::access_gate::AccessGate;
use crate::data::post_repository::PostRepository;
use crate::domain::post::PostResponse;
use crate::domain::{DomainError, Identity, PageRequest, PageWindow, PostFields};
use crate::infrastructure::uploads::{CoverUpload, UploadStore};
use std::sync::Arc;

pub struct BlogService {
    post_repo: Arc<dyn PostRepository + Send + Sync>,
    uploads: Arc<UploadStore>,
}

impl BlogService {
    pub fn new(post_repo: Arc<dyn PostRepository + Send + Sync>, uploads: Arc<UploadStore>) -> Self {
        Self { post_repo, uploads }
    }

    /// The author always comes from the verified identity.
    pub async fn create_post(
        &self,
        identity: &Identity,
        fields: PostFields,
        cover: Option<CoverUpload>,
    ) -> Result<PostResponse, DomainError> {
        fields.validate()?;

        let cover = match cover {
            Some(upload) => Some(self.uploads.save(upload).await?),
            None => None,
        };

        let post = match self
            .post_repo
            .create(identity.user_id, fields, cover.clone())
            .await
        {
            Ok(post) => post,
            Err(e) => return Err(self.abandon_cover(cover.as_deref(), e).await),
        };

        tracing::info!("Post created: id={}, author_id={}", post.id, identity.user_id);

        Ok(PostResponse::from(post))
    }

    pub async fn get_post(&self, id: i64) -> Result<PostResponse, DomainError> {
        let post = self.post_repo.find_by_id(id).await?;
        Ok(PostResponse::from(post))
    }

    /// Ownership is checked before the new cover touches the disk.
    pub async fn update_post(
        &self,
        id: i64,
        identity: &Identity,
        fields: PostFields,
        cover: Option<CoverUpload>,
    ) -> Result<PostResponse, DomainError> {
        let post = self.post_repo.find_by_id(id).await?;
        AccessGate::require_author(&post, identity)?;
        fields.validate()?;

        let new_cover = match cover {
            Some(upload) => Some(self.uploads.save(upload).await?),
            None => None,
        };
        let replaced_cover = new_cover.as_ref().and(post.cover);

        let updated_post = match self.post_repo.update(id, fields, new_cover.clone()).await {
            Ok(post) => post,
            // Пост мог быть удален между чтением и записью
            Err(e) => return Err(self.abandon_cover(new_cover.as_deref(), e).await),
        };

        if let Some(old) = replaced_cover {
            self.discard_cover(&old).await;
        }

        tracing::info!("Post updated: id={}, author_id={}", id, identity.user_id);

        Ok(PostResponse::from(updated_post))
    }

    pub async fn delete_post(&self, id: i64, identity: &Identity) -> Result<(), DomainError> {
        let post = self.post_repo.find_by_id(id).await?;
        AccessGate::require_author(&post, identity)?;

        self.post_repo.delete(id).await?;

        if let Some(cover) = &post.cover {
            self.discard_cover(cover).await;
        }

        tracing::info!("Post deleted: id={}, author_id={}", id, identity.user_id);

        Ok(())
    }

    pub async fn list_posts(
        &self,
        request: PageRequest,
    ) -> Result<PageWindow<PostResponse>, DomainError> {
        let (posts, total) = self
            .post_repo
            .list(request.page_size(), request.offset())
            .await?;

        Ok(PageWindow::new(request, total, posts).map(PostResponse::from))
    }

    /// A cover saved for a row that was never written is removed again.
    async fn abandon_cover(&self, saved: Option<&str>, err: DomainError) -> DomainError {
        if let Some(reference) = saved {
            self.discard_cover(reference).await;
        }
        err
    }

    async fn discard_cover(&self, reference: &str) {
        if let Err(e) = self.uploads.remove(reference).await {
            tracing::warn!("Failed to remove cover {}: {}", reference, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryStore;
    use crate::domain::Post;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use tempfile::TempDir;

    /// Inserts fail, and every update arrives just after the post was deleted.
    struct LostRace {
        inner: Arc<InMemoryStore>,
    }

    #[async_trait]
    impl PostRepository for LostRace {
        async fn create(
            &self,
            _author_id: i64,
            _fields: PostFields,
            _cover: Option<String>,
        ) -> Result<Post, DomainError> {
            Err(DomainError::DatabaseError("connection reset".to_string()))
        }

        async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
            self.inner.find_by_id(id).await
        }

        async fn update(
            &self,
            id: i64,
            fields: PostFields,
            cover: Option<String>,
        ) -> Result<Post, DomainError> {
            self.inner.delete(id).await?;
            PostRepository::update(&*self.inner, id, fields, cover).await
        }

        async fn delete(&self, id: i64) -> Result<(), DomainError> {
            self.inner.delete(id).await
        }

        async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<Post>, i64), DomainError> {
            self.inner.list(limit, offset).await
        }
    }

    struct Fixture {
        blog: BlogService,
        store: Arc<InMemoryStore>,
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(InMemoryStore::new());
            Self::with_repo(store.clone(), store)
        }

        fn losing_races() -> Self {
            let store = Arc::new(InMemoryStore::new());
            let repo = Arc::new(LostRace {
                inner: store.clone(),
            });
            Self::with_repo(store, repo)
        }

        fn with_repo(
            store: Arc<InMemoryStore>,
            repo: Arc<dyn PostRepository + Send + Sync>,
        ) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let uploads = Arc::new(UploadStore::new(dir.path()));
            Self {
                blog: BlogService::new(repo, uploads),
                store,
                dir,
            }
        }

        fn stored_files(&self) -> usize {
            std::fs::read_dir(self.dir.path()).unwrap().count()
        }

        async fn seed(&self, author: &Identity, count: usize) -> Vec<PostResponse> {
            let mut created = Vec::new();
            for n in 0..count {
                created.push(
                    self.blog
                        .create_post(author, fields(&format!("Post {}", n)), None)
                        .await
                        .unwrap(),
                );
            }
            created
        }
    }

    fn alice() -> Identity {
        Identity::new(1, "alice")
    }

    fn bob() -> Identity {
        Identity::new(2, "bob")
    }

    fn fields(title: &str) -> PostFields {
        PostFields {
            title: title.to_string(),
            summary: "summary".to_string(),
            content: "content".to_string(),
        }
    }

    fn cover(name: &str) -> CoverUpload {
        CoverUpload {
            file_name: name.to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    fn page(n: i64, size: i64) -> PageRequest {
        PageRequest::new(n, size).unwrap()
    }

    #[actix_rt::test]
    async fn twelve_posts_in_pages_of_five() {
        let fx = Fixture::new();
        fx.seed(&alice(), 12).await;

        let first = fx.blog.list_posts(page(1, 5)).await.unwrap();
        let third = fx.blog.list_posts(page(3, 5)).await.unwrap();

        assert_eq!(first.items.len(), 5);
        assert_eq!(third.items.len(), 2);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_items, 12);
    }

    #[actix_rt::test]
    async fn pages_partition_the_collection_newest_first() {
        let fx = Fixture::new();
        fx.seed(&alice(), 17).await;

        for size in 1..=8 {
            let total_pages = fx.blog.list_posts(page(1, size)).await.unwrap().total_pages;
            let mut seen = Vec::new();
            for n in 1..=total_pages {
                seen.extend(fx.blog.list_posts(page(n, size)).await.unwrap().items);
            }

            assert_eq!(seen.len(), 17, "page size {}", size);
            let ids: HashSet<i64> = seen.iter().map(|p| p.id).collect();
            assert_eq!(ids.len(), 17, "pages overlap for size {}", size);
            assert!(seen
                .windows(2)
                .all(|w| (w[0].created_at, w[0].id) > (w[1].created_at, w[1].id)));
        }
    }

    #[actix_rt::test]
    async fn page_past_the_end_is_empty() {
        let fx = Fixture::new();
        fx.seed(&alice(), 3).await;

        let window = fx.blog.list_posts(page(4, 1)).await.unwrap();
        assert!(window.items.is_empty());
        assert_eq!(window.total_pages, 3);

        let empty = Fixture::new();
        let window = empty.blog.list_posts(page(1, 10)).await.unwrap();
        assert!(window.items.is_empty());
        assert_eq!(window.total_pages, 0);
    }

    #[actix_rt::test]
    async fn totals_follow_creates_and_deletes() {
        let fx = Fixture::new();
        let created = fx.seed(&alice(), 4).await;
        assert_eq!(fx.blog.list_posts(page(1, 10)).await.unwrap().total_items, 4);

        fx.blog.delete_post(created[0].id, &alice()).await.unwrap();
        assert_eq!(fx.blog.list_posts(page(1, 10)).await.unwrap().total_items, 3);
    }

    #[actix_rt::test]
    async fn create_attributes_post_to_identity_and_stores_cover() {
        let fx = Fixture::new();
        let post = fx
            .blog
            .create_post(&bob(), fields("Hello"), Some(cover("me.jpg")))
            .await
            .unwrap();

        assert_eq!(post.author.id, 2);
        assert!(post.cover.as_deref().unwrap().ends_with(".jpg"));
        assert_eq!(fx.stored_files(), 1);
    }

    #[actix_rt::test]
    async fn create_rejects_blank_title() {
        let fx = Fixture::new();
        let err = fx
            .blog
            .create_post(&alice(), fields("  "), Some(cover("x.png")))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::ValidationError(_)));
        assert_eq!(fx.stored_files(), 0);
    }

    #[actix_rt::test]
    async fn update_and_delete_of_missing_post_is_not_found() {
        let fx = Fixture::new();

        let err = fx
            .blog
            .update_post(99, &alice(), fields("x"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound));

        let err = fx.blog.delete_post(99, &alice()).await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound));
    }

    #[actix_rt::test]
    async fn non_author_is_forbidden_and_nothing_is_written() {
        let fx = Fixture::new();
        let post = fx.seed(&alice(), 1).await.remove(0);

        let err = fx
            .blog
            .update_post(post.id, &bob(), fields("hijacked"), Some(cover("evil.png")))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));
        assert_eq!(fx.stored_files(), 0);

        let err = fx.blog.delete_post(post.id, &bob()).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));

        let unchanged = fx.blog.get_post(post.id).await.unwrap();
        assert_eq!(unchanged.title, "Post 0");
        assert_eq!(fx.store.post_count(), 1);
    }

    #[actix_rt::test]
    async fn update_without_cover_keeps_existing_one() {
        let fx = Fixture::new();
        let post = fx
            .blog
            .create_post(&alice(), fields("v1"), Some(cover("a.png")))
            .await
            .unwrap();

        let updated = fx
            .blog
            .update_post(post.id, &alice(), fields("v2"), None)
            .await
            .unwrap();

        assert_eq!(updated.title, "v2");
        assert_eq!(updated.cover, post.cover);
        assert_eq!(updated.author, post.author);
        assert_eq!(updated.created_at, post.created_at);
    }

    #[actix_rt::test]
    async fn update_with_cover_replaces_and_discards_old_file() {
        let fx = Fixture::new();
        let post = fx
            .blog
            .create_post(&alice(), fields("v1"), Some(cover("a.png")))
            .await
            .unwrap();

        let updated = fx
            .blog
            .update_post(post.id, &alice(), fields("v2"), Some(cover("b.gif")))
            .await
            .unwrap();

        assert_ne!(updated.cover, post.cover);
        assert!(updated.cover.as_deref().unwrap().ends_with(".gif"));
        assert_eq!(fx.stored_files(), 1);
    }

    #[actix_rt::test]
    async fn delete_by_author_removes_post_and_cover() {
        let fx = Fixture::new();
        let post = fx
            .blog
            .create_post(&alice(), fields("bye"), Some(cover("a.png")))
            .await
            .unwrap();

        fx.blog.delete_post(post.id, &alice()).await.unwrap();

        assert!(matches!(
            fx.blog.get_post(post.id).await.unwrap_err(),
            DomainError::PostNotFound
        ));
        assert_eq!(fx.stored_files(), 0);
    }

    #[actix_rt::test]
    async fn failed_insert_leaves_no_cover_behind() {
        let fx = Fixture::losing_races();

        let err = fx
            .blog
            .create_post(&alice(), fields("lost"), Some(cover("a.png")))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::DatabaseError(_)));
        assert_eq!(fx.stored_files(), 0);
    }

    #[actix_rt::test]
    async fn update_racing_a_delete_leaves_no_cover_behind() {
        let fx = Fixture::losing_races();
        let post = PostRepository::create(&*fx.store, alice().user_id, fields("v1"), None)
            .await
            .unwrap();

        let err = fx
            .blog
            .update_post(post.id, &alice(), fields("v2"), Some(cover("b.png")))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::PostNotFound));
        assert_eq!(fx.stored_files(), 0);
        assert_eq!(fx.store.post_count(), 0);
    }
}
