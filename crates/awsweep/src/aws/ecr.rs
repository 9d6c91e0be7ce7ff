//! Deleting ECR repositories and the images inside them.

use aws_config::SdkConfig;

use crate::Outcome;

/// Identifies one image in a repository, by tag and/or digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ImageId {
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.tag, &self.digest) {
            (Some(tag), _) => f.write_str(tag),
            (None, Some(digest)) => f.write_str(digest),
            (None, None) => f.write_str("<unidentified>"),
        }
    }
}

/// The ECR calls a repository sweep performs.
pub(crate) trait RepositoryApi {
    async fn list_repositories(&self) -> anyhow::Result<Vec<String>>;
    async fn list_images(&self, repository: &str) -> anyhow::Result<Vec<ImageId>>;
    async fn delete_image(&self, repository: &str, image: &ImageId) -> anyhow::Result<()>;
    async fn delete_repository(&self, repository: &str) -> anyhow::Result<()>;
}

impl RepositoryApi for aws_sdk_ecr::Client {
    async fn list_repositories(&self) -> anyhow::Result<Vec<String>> {
        let out = self.describe_repositories().send().await?;
        Ok(out
            .repositories
            .unwrap_or_default()
            .into_iter()
            .filter_map(|repository| repository.repository_name)
            .collect())
    }

    async fn list_images(&self, repository: &str) -> anyhow::Result<Vec<ImageId>> {
        let out = self.list_images().repository_name(repository).send().await?;
        Ok(out
            .image_ids
            .unwrap_or_default()
            .into_iter()
            .map(|id| ImageId {
                tag: id.image_tag,
                digest: id.image_digest,
            })
            .collect())
    }

    async fn delete_image(&self, repository: &str, image: &ImageId) -> anyhow::Result<()> {
        let id = aws_sdk_ecr::types::ImageIdentifier::builder()
            .set_image_tag(image.tag.clone())
            .set_image_digest(image.digest.clone())
            .build();
        self.batch_delete_image()
            .repository_name(repository)
            .image_ids(id)
            .send()
            .await?;
        Ok(())
    }

    async fn delete_repository(&self, repository: &str) -> anyhow::Result<()> {
        self.delete_repository()
            .repository_name(repository)
            .send()
            .await?;
        Ok(())
    }
}

/// Delete every repository in the region, one image at a time first.
pub async fn sweep(cfg: &SdkConfig) -> Outcome {
    sweep_repositories(&aws_sdk_ecr::Client::new(cfg)).await
}

async fn sweep_repositories<A: RepositoryApi>(api: &A) -> Outcome {
    log::debug!("removing all ecr repositories");
    let mut outcome = Outcome::default();
    let repositories = match api.list_repositories().await {
        Ok(repositories) => repositories,
        Err(err) => {
            outcome.record("list repositories", Err(err));
            return outcome;
        }
    };
    for repository in repositories {
        let images = match api.list_images(&repository).await {
            Ok(images) => images,
            Err(err) => {
                outcome.record(format!("list images of {repository}"), Err(err));
                Vec::new()
            }
        };
        for image in images {
            log::debug!("delete image: {repository}:{image}");
            let result = api.delete_image(&repository, &image).await;
            outcome.record(format!("delete image {repository}:{image}"), result);
        }
        log::debug!("delete repository: {repository}");
        let result = api.delete_repository(&repository).await;
        outcome.record(format!("delete repository {repository}"), result);
    }
    outcome
}
