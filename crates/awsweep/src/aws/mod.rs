//! Per-category sweepers and the shared credential/config plumbing.
//!
//! Every submodule follows the same shape: a small trait naming the exact
//! list/delete calls its category needs, an implementation of that trait for
//! the real service client, and a sweep function generic over the trait so
//! the deletion logic can be exercised against a recording fake.

pub use aws_config::SdkConfig;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::provider::ProvideCredentials;
use snafu::{OptionExt, ResultExt};

use crate::{CredentialsSnafu, Error, NoCredentialProviderSnafu};

pub mod acm;
pub mod cloudformation;
pub mod cloudfront;
pub mod ecr;
pub mod eventbridge;
pub mod iam;
pub mod lambda;
pub mod s3;

/// Region used when none is given on the command line.
pub const DEFAULT_REGION: &str = "eu-central-1";

/// Load the shared AWS configuration, optionally through a named profile.
///
/// Credentials are resolved eagerly so a broken or expired profile fails the
/// run up front instead of surfacing as a wall of per-resource failures.
pub async fn resolve(profile: Option<&str>, region: &str) -> Result<SdkConfig, Error> {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_owned()));
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    let cfg = loader.load().await;
    let provider = cfg
        .credentials_provider()
        .context(NoCredentialProviderSnafu)?;
    provider
        .provide_credentials()
        .await
        .context(CredentialsSnafu {
            profile: profile.map(str::to_owned),
        })?;
    Ok(cfg)
}
