//! Deleting EventBridge rules.

use aws_config::SdkConfig;

use crate::Outcome;

pub(crate) trait RuleApi {
    async fn list_rules(&self) -> anyhow::Result<Vec<String>>;
    async fn delete_rule(&self, name: &str) -> anyhow::Result<()>;
}

impl RuleApi for aws_sdk_eventbridge::Client {
    async fn list_rules(&self) -> anyhow::Result<Vec<String>> {
        let out = self.list_rules().send().await?;
        Ok(out
            .rules
            .unwrap_or_default()
            .into_iter()
            .filter_map(|rule| rule.name)
            .collect())
    }

    async fn delete_rule(&self, name: &str) -> anyhow::Result<()> {
        self.delete_rule().name(name).send().await?;
        Ok(())
    }
}

/// Delete every rule on the default event bus.
pub async fn sweep(cfg: &SdkConfig) -> Outcome {
    sweep_rules(&aws_sdk_eventbridge::Client::new(cfg)).await
}

async fn sweep_rules<A: RuleApi>(api: &A) -> Outcome {
    log::debug!("removing all eventbridge rules");
    let mut outcome = Outcome::default();
    let rules = match api.list_rules().await {
        Ok(rules) => rules,
        Err(err) => {
            outcome.record("list rules", Err(err));
            return outcome;
        }
    };
    for name in rules {
        log::debug!("delete rule: {name}");
        let result = api.delete_rule(&name).await;
        outcome.record(format!("delete rule {name}"), result);
    }
    outcome
}
