//! Deleting IAM roles along with their policy attachments.

use aws_config::SdkConfig;

use crate::Outcome;

/// The IAM calls a role sweep performs.
pub(crate) trait RoleApi {
    async fn list_roles(&self) -> anyhow::Result<Vec<String>>;
    /// ARNs of the managed policies attached to the role.
    async fn list_attached_policies(&self, role: &str) -> anyhow::Result<Vec<String>>;
    async fn detach_policy(&self, role: &str, policy_arn: &str) -> anyhow::Result<()>;
    /// Names of the role's inline policies.
    async fn list_inline_policies(&self, role: &str) -> anyhow::Result<Vec<String>>;
    async fn delete_inline_policy(&self, role: &str, policy: &str) -> anyhow::Result<()>;
    async fn delete_role(&self, role: &str) -> anyhow::Result<()>;
}

impl RoleApi for aws_sdk_iam::Client {
    async fn list_roles(&self) -> anyhow::Result<Vec<String>> {
        let out = self.list_roles().send().await?;
        Ok(out.roles.into_iter().map(|role| role.role_name).collect())
    }

    async fn list_attached_policies(&self, role: &str) -> anyhow::Result<Vec<String>> {
        let out = self
            .list_attached_role_policies()
            .role_name(role)
            .send()
            .await?;
        Ok(out
            .attached_policies
            .unwrap_or_default()
            .into_iter()
            .filter_map(|policy| policy.policy_arn)
            .collect())
    }

    async fn detach_policy(&self, role: &str, policy_arn: &str) -> anyhow::Result<()> {
        self.detach_role_policy()
            .role_name(role)
            .policy_arn(policy_arn)
            .send()
            .await?;
        Ok(())
    }

    async fn list_inline_policies(&self, role: &str) -> anyhow::Result<Vec<String>> {
        let out = self.list_role_policies().role_name(role).send().await?;
        Ok(out.policy_names)
    }

    async fn delete_inline_policy(&self, role: &str, policy: &str) -> anyhow::Result<()> {
        self.delete_role_policy()
            .role_name(role)
            .policy_name(policy)
            .send()
            .await?;
        Ok(())
    }

    async fn delete_role(&self, role: &str) -> anyhow::Result<()> {
        self.delete_role().role_name(role).send().await?;
        Ok(())
    }
}

/// Delete every role in the account.
///
/// IAM refuses to delete a role that still has policies, so each role is
/// stripped first: managed policies detached, inline policies deleted, then
/// the role itself. Each phase is best-effort on its own.
pub async fn sweep(cfg: &SdkConfig) -> Outcome {
    sweep_roles(&aws_sdk_iam::Client::new(cfg)).await
}

async fn sweep_roles<A: RoleApi>(api: &A) -> Outcome {
    log::debug!("removing all iam roles");
    let mut outcome = Outcome::default();
    let roles = match api.list_roles().await {
        Ok(roles) => roles,
        Err(err) => {
            outcome.record("list roles", Err(err));
            return outcome;
        }
    };
    for role in roles {
        let attached = match api.list_attached_policies(&role).await {
            Ok(arns) => arns,
            Err(err) => {
                outcome.record(format!("list attached policies of {role}"), Err(err));
                Vec::new()
            }
        };
        for arn in attached {
            log::debug!("detach policy: {arn}");
            let result = api.detach_policy(&role, &arn).await;
            outcome.record(format!("detach {arn} from {role}"), result);
        }

        let inline = match api.list_inline_policies(&role).await {
            Ok(names) => names,
            Err(err) => {
                outcome.record(format!("list inline policies of {role}"), Err(err));
                Vec::new()
            }
        };
        for name in inline {
            log::debug!("delete inline policy: {name}");
            let result = api.delete_inline_policy(&role, &name).await;
            outcome.record(format!("delete inline policy {name} of {role}"), result);
        }

        log::debug!("delete role: {role}");
        let result = api.delete_role(&role).await;
        outcome.record(format!("delete role {role}"), result);
    }
    outcome
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct FakeIam {
        roles: Vec<&'static str>,
        attached: Vec<&'static str>,
        inline: Vec<&'static str>,
        fail_detach: Option<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeIam {
        fn push(&self, call: String) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl RoleApi for FakeIam {
        async fn list_roles(&self) -> anyhow::Result<Vec<String>> {
            Ok(self.roles.iter().map(|r| r.to_string()).collect())
        }

        async fn list_attached_policies(&self, _role: &str) -> anyhow::Result<Vec<String>> {
            Ok(self.attached.iter().map(|p| p.to_string()).collect())
        }

        async fn detach_policy(&self, role: &str, policy_arn: &str) -> anyhow::Result<()> {
            self.push(format!("detach {policy_arn} from {role}"));
            if self.fail_detach == Some(policy_arn) {
                anyhow::bail!("not attached");
            }
            Ok(())
        }

        async fn list_inline_policies(&self, _role: &str) -> anyhow::Result<Vec<String>> {
            Ok(self.inline.iter().map(|p| p.to_string()).collect())
        }

        async fn delete_inline_policy(&self, role: &str, policy: &str) -> anyhow::Result<()> {
            self.push(format!("delete inline {policy} of {role}"));
            Ok(())
        }

        async fn delete_role(&self, role: &str) -> anyhow::Result<()> {
            self.push(format!("delete role {role}"));
            Ok(())
        }
    }

    #[tokio::test]
    async fn no_roles_means_no_calls() {
        let fake = FakeIam::default();
        let outcome = sweep_roles(&fake).await;
        assert_eq!(Outcome::default(), outcome);
        assert!(fake.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn policies_are_stripped_before_the_role_is_deleted() {
        let fake = FakeIam {
            roles: vec!["deploy"],
            attached: vec!["arn:a", "arn:b"],
            inline: vec!["inline-1"],
            ..Default::default()
        };
        let outcome = sweep_roles(&fake).await;
        assert_eq!(
            vec![
                "detach arn:a from deploy".to_string(),
                "detach arn:b from deploy".to_string(),
                "delete inline inline-1 of deploy".to_string(),
                "delete role deploy".to_string(),
            ],
            fake.calls.into_inner()
        );
        assert_eq!(
            Outcome {
                succeeded: 4,
                failed: 0
            },
            outcome
        );
    }

    #[tokio::test]
    async fn failed_detach_does_not_block_the_role_delete() {
        let fake = FakeIam {
            roles: vec!["deploy"],
            attached: vec!["arn:a", "arn:b"],
            fail_detach: Some("arn:a"),
            ..Default::default()
        };
        let outcome = sweep_roles(&fake).await;
        assert_eq!(
            vec![
                "detach arn:a from deploy".to_string(),
                "detach arn:b from deploy".to_string(),
                "delete role deploy".to_string(),
            ],
            fake.calls.into_inner()
        );
        assert_eq!(1, outcome.failed);
        assert_eq!(2, outcome.succeeded);
    }
}
