//! Deleting CloudFormation stacks.

use aws_config::SdkConfig;
use aws_sdk_cloudformation::types::StackStatus;

use crate::Outcome;

pub(crate) struct Stack {
    pub name: String,
    /// Already in `DELETE_COMPLETE`; nothing left to do.
    pub deleted: bool,
}

/// The CloudFormation calls a stack sweep performs.
pub(crate) trait StackApi {
    async fn list_stacks(&self) -> anyhow::Result<Vec<Stack>>;
    async fn delete_stack(&self, name: &str) -> anyhow::Result<()>;
}

impl StackApi for aws_sdk_cloudformation::Client {
    async fn list_stacks(&self) -> anyhow::Result<Vec<Stack>> {
        let out = self.list_stacks().send().await?;
        Ok(out
            .stack_summaries
            .unwrap_or_default()
            .into_iter()
            .filter_map(|summary| {
                let deleted = summary.stack_status == Some(StackStatus::DeleteComplete);
                summary.stack_name.map(|name| Stack { name, deleted })
            })
            .collect())
    }

    async fn delete_stack(&self, name: &str) -> anyhow::Result<()> {
        self.delete_stack().stack_name(name).send().await?;
        Ok(())
    }
}

/// Delete every stack that is not already deleted.
///
/// Stack resources are left to CloudFormation itself; nothing is retained.
pub async fn sweep(cfg: &SdkConfig) -> Outcome {
    sweep_stacks(&aws_sdk_cloudformation::Client::new(cfg)).await
}

async fn sweep_stacks<A: StackApi>(api: &A) -> Outcome {
    log::debug!("removing all cloudformation stacks");
    let mut outcome = Outcome::default();
    let stacks = match api.list_stacks().await {
        Ok(stacks) => stacks,
        Err(err) => {
            outcome.record("list stacks", Err(err));
            return outcome;
        }
    };
    for stack in stacks {
        if stack.deleted {
            log::debug!("stack {} is already deleted, skipping", stack.name);
            continue;
        }
        log::debug!("delete stack: {}", stack.name);
        let result = api.delete_stack(&stack.name).await;
        outcome.record(format!("delete stack {}", stack.name), result);
    }
    outcome
}
