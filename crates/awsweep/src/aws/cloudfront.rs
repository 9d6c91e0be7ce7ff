//! Disabling and deleting CloudFront distributions.

use anyhow::Context;
use aws_config::SdkConfig;
use aws_sdk_cloudfront::types::DistributionConfig;

use crate::Outcome;

/// The CloudFront calls a distribution sweep performs.
///
/// A distribution cannot be deleted while enabled, so deletion is a
/// three-step sequence: fetch the current config and consistency token
/// (ETag), submit the config with `enabled` flipped off, then delete using
/// the token returned by the update.
pub(crate) trait DistributionApi {
    /// Whatever the update step needs to carry between fetch and submit.
    type Config;

    async fn list_distributions(&self) -> anyhow::Result<Vec<String>>;
    /// The current configuration and its ETag.
    async fn get_config(&self, id: &str) -> anyhow::Result<(Self::Config, String)>;
    /// Submit the config with `enabled` off; returns the new ETag.
    async fn disable(&self, id: &str, config: Self::Config, etag: &str) -> anyhow::Result<String>;
    async fn delete_distribution(&self, id: &str, etag: &str) -> anyhow::Result<()>;
}

impl DistributionApi for aws_sdk_cloudfront::Client {
    type Config = DistributionConfig;

    async fn list_distributions(&self) -> anyhow::Result<Vec<String>> {
        let out = self.list_distributions().send().await?;
        let items = out
            .distribution_list
            .and_then(|list| list.items)
            .unwrap_or_default();
        Ok(items.into_iter().map(|summary| summary.id).collect())
    }

    async fn get_config(&self, id: &str) -> anyhow::Result<(DistributionConfig, String)> {
        let out = self.get_distribution().id(id).send().await?;
        let etag = out.e_tag.context("missing distribution etag")?;
        let config = out
            .distribution
            .context("missing distribution")?
            .distribution_config
            .context("missing distribution config")?;
        Ok((config, etag))
    }

    async fn disable(
        &self,
        id: &str,
        mut config: DistributionConfig,
        etag: &str,
    ) -> anyhow::Result<String> {
        config.enabled = false;
        let out = self
            .update_distribution()
            .id(id)
            .distribution_config(config)
            .if_match(etag)
            .send()
            .await?;
        out.e_tag.context("missing etag after disabling")
    }

    async fn delete_distribution(&self, id: &str, etag: &str) -> anyhow::Result<()> {
        self.delete_distribution()
            .id(id)
            .if_match(etag)
            .send()
            .await?;
        Ok(())
    }
}

/// Disable then delete every distribution.
///
/// The delete regularly fails right after the disable because CloudFront
/// has not finished propagating it; that is a logged failure, and a later
/// run will get the now-disabled distribution.
pub async fn sweep(cfg: &SdkConfig) -> Outcome {
    sweep_distributions(&aws_sdk_cloudfront::Client::new(cfg)).await
}

async fn sweep_distributions<A: DistributionApi>(api: &A) -> Outcome {
    log::debug!("removing all cloudfront distributions");
    let mut outcome = Outcome::default();
    let ids = match api.list_distributions().await {
        Ok(ids) => ids,
        Err(err) => {
            outcome.record("list distributions", Err(err));
            return outcome;
        }
    };
    for id in ids {
        log::debug!("delete distribution: {id}");
        let (config, etag) = match api.get_config(&id).await {
            Ok(pair) => pair,
            Err(err) => {
                outcome.record(format!("fetch distribution {id}"), Err(err));
                continue;
            }
        };
        // No delete without a successful disable first.
        let etag = match api.disable(&id, config, &etag).await {
            Ok(etag) => etag,
            Err(err) => {
                outcome.record(format!("disable distribution {id}"), Err(err));
                continue;
            }
        };
        let result = api.delete_distribution(&id, &etag).await;
        outcome.record(format!("delete distribution {id}"), result);
    }
    outcome
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct FakeCloudFront {
        distributions: Vec<&'static str>,
        fail_fetch: bool,
        fail_disable: bool,
        calls: RefCell<Vec<String>>,
    }

    impl FakeCloudFront {
        fn push(&self, call: String) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl DistributionApi for FakeCloudFront {
        type Config = ();

        async fn list_distributions(&self) -> anyhow::Result<Vec<String>> {
            Ok(self.distributions.iter().map(|d| d.to_string()).collect())
        }

        async fn get_config(&self, id: &str) -> anyhow::Result<((), String)> {
            self.push(format!("fetch {id}"));
            if self.fail_fetch {
                anyhow::bail!("no such distribution");
            }
            Ok(((), "etag-1".to_string()))
        }

        async fn disable(&self, id: &str, _config: (), etag: &str) -> anyhow::Result<String> {
            self.push(format!("disable {id} with {etag}"));
            if self.fail_disable {
                anyhow::bail!("precondition failed");
            }
            Ok("etag-2".to_string())
        }

        async fn delete_distribution(&self, id: &str, etag: &str) -> anyhow::Result<()> {
            self.push(format!("delete {id} with {etag}"));
            Ok(())
        }
    }

    #[tokio::test]
    async fn no_distributions_means_no_calls() {
        let fake = FakeCloudFront::default();
        let outcome = sweep_distributions(&fake).await;
        assert_eq!(Outcome::default(), outcome);
        assert!(fake.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn delete_uses_the_etag_from_the_disable() {
        let fake = FakeCloudFront {
            distributions: vec!["E123"],
            ..Default::default()
        };
        let outcome = sweep_distributions(&fake).await;
        assert_eq!(
            vec![
                "fetch E123".to_string(),
                "disable E123 with etag-1".to_string(),
                "delete E123 with etag-2".to_string(),
            ],
            fake.calls.into_inner()
        );
        assert_eq!(
            Outcome {
                succeeded: 1,
                failed: 0
            },
            outcome
        );
    }

    #[tokio::test]
    async fn failed_disable_suppresses_the_delete() {
        let fake = FakeCloudFront {
            distributions: vec!["E123", "E456"],
            fail_disable: true,
            ..Default::default()
        };
        let outcome = sweep_distributions(&fake).await;
        assert_eq!(
            vec![
                "fetch E123".to_string(),
                "disable E123 with etag-1".to_string(),
                "fetch E456".to_string(),
                "disable E456 with etag-1".to_string(),
            ],
            fake.calls.into_inner()
        );
        assert_eq!(2, outcome.failed);
        assert_eq!(0, outcome.succeeded);
    }

    #[tokio::test]
    async fn failed_fetch_suppresses_disable_and_delete() {
        let fake = FakeCloudFront {
            distributions: vec!["E123"],
            fail_fetch: true,
            ..Default::default()
        };
        let outcome = sweep_distributions(&fake).await;
        assert_eq!(vec!["fetch E123".to_string()], fake.calls.into_inner());
        assert_eq!(1, outcome.failed);
    }
}
