//! Deleting Lambda functions.

use aws_config::SdkConfig;

use crate::Outcome;

pub(crate) trait FunctionApi {
    async fn list_functions(&self) -> anyhow::Result<Vec<String>>;
    async fn delete_function(&self, name: &str) -> anyhow::Result<()>;
}

impl FunctionApi for aws_sdk_lambda::Client {
    async fn list_functions(&self) -> anyhow::Result<Vec<String>> {
        let out = self.list_functions().send().await?;
        Ok(out
            .functions
            .unwrap_or_default()
            .into_iter()
            .filter_map(|function| function.function_name)
            .collect())
    }

    async fn delete_function(&self, name: &str) -> anyhow::Result<()> {
        self.delete_function().function_name(name).send().await?;
        Ok(())
    }
}

/// Delete every function in the region. Functions have no dependents to
/// clean up first.
pub async fn sweep(cfg: &SdkConfig) -> Outcome {
    sweep_functions(&aws_sdk_lambda::Client::new(cfg)).await
}

async fn sweep_functions<A: FunctionApi>(api: &A) -> Outcome {
    log::debug!("removing all lambda functions");
    let mut outcome = Outcome::default();
    let functions = match api.list_functions().await {
        Ok(functions) => functions,
        Err(err) => {
            outcome.record("list functions", Err(err));
            return outcome;
        }
    };
    for name in functions {
        log::debug!("delete lambda: {name}");
        let result = api.delete_function(&name).await;
        outcome.record(format!("delete lambda {name}"), result);
    }
    outcome
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct FakeLambda {
        functions: Vec<&'static str>,
        fail_on: Option<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl FunctionApi for FakeLambda {
        async fn list_functions(&self) -> anyhow::Result<Vec<String>> {
            Ok(self.functions.iter().map(|f| f.to_string()).collect())
        }

        async fn delete_function(&self, name: &str) -> anyhow::Result<()> {
            self.calls.borrow_mut().push(name.to_string());
            if self.fail_on == Some(name) {
                anyhow::bail!("resource in use");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn no_functions_means_no_calls() {
        let fake = FakeLambda::default();
        let outcome = sweep_functions(&fake).await;
        assert_eq!(Outcome::default(), outcome);
        assert!(fake.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn one_stubborn_function_does_not_stop_the_rest() {
        let fake = FakeLambda {
            functions: vec!["first", "second", "third"],
            fail_on: Some("second"),
            ..Default::default()
        };
        let outcome = sweep_functions(&fake).await;
        assert_eq!(
            vec![
                "first".to_string(),
                "second".to_string(),
                "third".to_string()
            ],
            fake.calls.into_inner()
        );
        assert_eq!(2, outcome.succeeded);
        assert_eq!(1, outcome.failed);
    }
}
