//! # awsweep
//!
//! Best-effort bulk removal of AWS account resources, meant for tearing down
//! test and sandbox accounts. Point it at an account, pick the resource
//! categories to remove (or `all`), and it lists every resource of each
//! category in the region and deletes them one by one.
//!
//! Deletion is strictly best-effort: a resource that refuses to die (still
//! referenced, permissions, eventual consistency) is logged and skipped, and
//! the sweep moves on to the next one. Nothing is retried. The only hard
//! failure is not being able to resolve credentials at all, which aborts the
//! run before any cleaner starts.
//!
//! Each category lives in its own module under [`aws`] and owns its client;
//! there is no shared state between cleaners, so categories can optionally
//! run concurrently. Ordering only matters *inside* a category (a bucket is
//! emptied before it is deleted, a role's policies are detached before the
//! role is deleted, a distribution is disabled before it is deleted).
//!
//! This is a destructive tool. Do not point it at an account you care about.

use aws_config::SdkConfig;
use clap::ValueEnum;

pub mod aws;

/// Fatal errors. Anything recoverable is logged and counted instead.
#[derive(snafu::Snafu, Debug)]
pub enum Error {
    #[snafu(display("no credentials provider is configured"))]
    NoCredentialProvider,

    #[snafu(display("could not resolve credentials{}: {source}",
        profile.as_deref().map(|p| format!(" for profile '{p}'")).unwrap_or_default()))]
    Credentials {
        profile: Option<String>,
        source: aws_credential_types::provider::error::CredentialsError,
    },
}

/// Tally of the individual provider operations attempted during a sweep.
///
/// Failures are counted but never retried and never described beyond the log
/// line written when they happen. The count exists so the process can exit
/// non-zero when a sweep was not fully clean.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub succeeded: usize,
    pub failed: usize,
}

impl Outcome {
    /// Record one operation, logging it if it failed.
    pub fn record(&mut self, action: impl std::fmt::Display, result: anyhow::Result<()>) {
        match result {
            Ok(()) => self.succeeded += 1,
            Err(err) => {
                log::warn!("{action} failed: {err:#}");
                self.failed += 1;
            }
        }
    }

    pub fn merge(&mut self, other: Outcome) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }
}

/// One class of AWS resource targeted for removal.
///
/// The token of each variant is what `--clean` accepts on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Category {
    /// Run every registered cleaner once.
    All,
    S3,
    Cloudformation,
    Ecr,
    Lambda,
    #[value(name = "iam_roles")]
    IamRoles,
    Eventbridge,
    Cloudfront,
    Acm,
    // Reserved categories with no cleaner behind them yet. They stay
    // selectable so that `all` keeps the same meaning once they grow one.
    Ecs,
    #[value(name = "iam_organizations")]
    IamOrganizations,
    #[value(name = "iam_identity_center")]
    IamIdentityCenter,
}

impl Category {
    /// Every concrete category, in the order the wildcard runs them.
    const REGISTRY: [Category; 11] = [
        Category::S3,
        Category::Cloudformation,
        Category::Ecr,
        Category::Lambda,
        Category::IamRoles,
        Category::Eventbridge,
        Category::Cloudfront,
        Category::Acm,
        Category::Ecs,
        Category::IamOrganizations,
        Category::IamIdentityCenter,
    ];

    /// Turn the requested tokens into the list of categories to run.
    ///
    /// `all` anywhere in the request selects every registered category
    /// exactly once and makes the remaining tokens irrelevant. Otherwise the
    /// categories run in the order first requested, without duplicates.
    pub fn expand(requested: &[Category]) -> Vec<Category> {
        if requested.contains(&Category::All) {
            return Self::REGISTRY.to_vec();
        }
        let mut categories = Vec::new();
        for &category in requested {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        categories
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Category::All => "all",
            Category::S3 => "s3",
            Category::Cloudformation => "cloudformation",
            Category::Ecr => "ecr",
            Category::Lambda => "lambda",
            Category::IamRoles => "iam_roles",
            Category::Eventbridge => "eventbridge",
            Category::Cloudfront => "cloudfront",
            Category::Acm => "acm",
            Category::Ecs => "ecs",
            Category::IamOrganizations => "iam_organizations",
            Category::IamIdentityCenter => "iam_identity_center",
        })
    }
}

/// Run the selected cleaners against one account/region.
///
/// Cleaners run one after another unless `parallel` is set, in which case
/// each category runs as its own task. Ordering constraints only exist
/// inside a category, so running categories concurrently is safe.
pub async fn run(cfg: &SdkConfig, categories: &[Category], parallel: bool) -> Outcome {
    let mut total = Outcome::default();
    if parallel {
        let mut tasks = Vec::with_capacity(categories.len());
        for &category in categories {
            let cfg = cfg.clone();
            tasks.push(tokio::spawn(
                async move { sweep_category(category, &cfg).await },
            ));
        }
        for task in tasks {
            match task.await {
                Ok(outcome) => total.merge(outcome),
                Err(err) => {
                    log::warn!("cleaner task failed: {err}");
                    total.failed += 1;
                }
            }
        }
    } else {
        for &category in categories {
            total.merge(sweep_category(category, cfg).await);
        }
    }
    total
}

async fn sweep_category(category: Category, cfg: &SdkConfig) -> Outcome {
    log::debug!("cleaning {category}");
    match category {
        // `all` is expanded away by `Category::expand` before dispatch.
        Category::All => Outcome::default(),
        Category::S3 => aws::s3::sweep(cfg).await,
        Category::Cloudformation => aws::cloudformation::sweep(cfg).await,
        Category::Ecr => aws::ecr::sweep(cfg).await,
        Category::Lambda => aws::lambda::sweep(cfg).await,
        Category::IamRoles => aws::iam::sweep(cfg).await,
        Category::Eventbridge => aws::eventbridge::sweep(cfg).await,
        Category::Cloudfront => aws::cloudfront::sweep(cfg).await,
        Category::Acm => aws::acm::sweep(cfg).await,
        Category::Ecs | Category::IamOrganizations | Category::IamIdentityCenter => {
            log::debug!("{category} has no cleaner yet, nothing to do");
            Outcome::default()
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn wildcard_selects_every_category_once() {
        let categories = Category::expand(&[Category::S3, Category::All, Category::Acm]);
        assert_eq!(Category::REGISTRY.to_vec(), categories);
    }

    #[test]
    fn explicit_subset_runs_exactly_those_categories() {
        let categories = Category::expand(&[Category::S3, Category::Acm, Category::S3]);
        assert_eq!(vec![Category::S3, Category::Acm], categories);
    }

    #[test]
    fn tokens_match_the_cli_surface() {
        assert_eq!("iam_roles", Category::IamRoles.to_string());
        assert_eq!("iam_identity_center", Category::IamIdentityCenter.to_string());
        assert_eq!("s3", Category::S3.to_string());
    }

    #[test]
    fn outcome_counts_failures_without_dropping_successes() {
        let mut outcome = Outcome::default();
        outcome.record("first", Ok(()));
        outcome.record("second", Err(anyhow::anyhow!("nope")));
        outcome.record("third", Ok(()));
        assert_eq!(
            Outcome {
                succeeded: 2,
                failed: 1
            },
            outcome
        );
    }
}
