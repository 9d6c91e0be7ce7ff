//! Emptying and deleting S3 buckets.

use aws_config::SdkConfig;

use crate::Outcome;

/// The S3 calls a bucket sweep performs.
pub(crate) trait BucketApi {
    async fn list_buckets(&self) -> anyhow::Result<Vec<String>>;
    async fn list_objects(&self, bucket: &str) -> anyhow::Result<Vec<String>>;
    async fn list_object_versions(
        &self,
        bucket: &str,
    ) -> anyhow::Result<Vec<(String, Option<String>)>>;
    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> anyhow::Result<()>;
    async fn delete_bucket(&self, bucket: &str) -> anyhow::Result<()>;
}

impl BucketApi for aws_sdk_s3::Client {
    async fn list_buckets(&self) -> anyhow::Result<Vec<String>> {
        let out = self.list_buckets().send().await?;
        Ok(out
            .buckets
            .unwrap_or_default()
            .into_iter()
            .filter_map(|bucket| bucket.name)
            .collect())
    }

    async fn list_objects(&self, bucket: &str) -> anyhow::Result<Vec<String>> {
        let out = self.list_objects_v2().bucket(bucket).send().await?;
        Ok(out
            .contents
            .unwrap_or_default()
            .into_iter()
            .filter_map(|object| object.key)
            .collect())
    }

    async fn list_object_versions(
        &self,
        bucket: &str,
    ) -> anyhow::Result<Vec<(String, Option<String>)>> {
        let out = self.list_object_versions().bucket(bucket).send().await?;
        let mut versions = Vec::new();
        for version in out.versions.unwrap_or_default() {
            if let Some(key) = version.key {
                versions.push((key, version.version_id));
            }
        }
        Ok(versions)
    }

    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> anyhow::Result<()> {
        self.delete_object()
            .bucket(bucket)
            .key(key)
            .set_version_id(version_id.map(str::to_owned))
            .send()
            .await?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> anyhow::Result<()> {
        self.delete_bucket().bucket(bucket).send().await?;
        Ok(())
    }
}

/// Delete every bucket in the account, emptying each one first.
///
/// Current objects go first, then historical versions, then the bucket
/// itself. A bucket whose contents cannot be listed is treated as already
/// empty rather than as an error.
pub async fn sweep(cfg: &SdkConfig) -> Outcome {
    sweep_buckets(&aws_sdk_s3::Client::new(cfg)).await
}

async fn sweep_buckets<A: BucketApi>(api: &A) -> Outcome {
    log::debug!("removing all s3 buckets");
    let mut outcome = Outcome::default();
    let buckets = match api.list_buckets().await {
        Ok(buckets) => buckets,
        Err(err) => {
            outcome.record("list buckets", Err(err));
            return outcome;
        }
    };
    for bucket in buckets {
        log::debug!("delete bucket: {bucket}");
        for key in list_or_empty(api.list_objects(&bucket).await, &bucket) {
            let result = api.delete_object(&bucket, &key, None).await;
            outcome.record(format!("delete object {bucket}/{key}"), result);
        }
        for (key, version) in list_or_empty(api.list_object_versions(&bucket).await, &bucket) {
            let result = api.delete_object(&bucket, &key, version.as_deref()).await;
            outcome.record(format!("delete version of {bucket}/{key}"), result);
        }
        let result = api.delete_bucket(&bucket).await;
        outcome.record(format!("delete bucket {bucket}"), result);
    }
    outcome
}

fn list_or_empty<T>(result: anyhow::Result<Vec<T>>, bucket: &str) -> Vec<T> {
    result.unwrap_or_else(|err| {
        log::debug!("nothing to delete in {bucket}: {err:#}");
        Vec::new()
    })
}
