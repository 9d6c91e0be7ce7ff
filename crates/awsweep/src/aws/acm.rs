//! Deleting ACM certificates.

use aws_config::SdkConfig;

use crate::Outcome;

pub(crate) trait CertificateApi {
    /// ARNs of every certificate in the region.
    async fn list_certificates(&self) -> anyhow::Result<Vec<String>>;
    async fn delete_certificate(&self, arn: &str) -> anyhow::Result<()>;
}

impl CertificateApi for aws_sdk_acm::Client {
    async fn list_certificates(&self) -> anyhow::Result<Vec<String>> {
        let out = self.list_certificates().send().await?;
        Ok(out
            .certificate_summary_list
            .unwrap_or_default()
            .into_iter()
            .filter_map(|summary| summary.certificate_arn)
            .collect())
    }

    async fn delete_certificate(&self, arn: &str) -> anyhow::Result<()> {
        self.delete_certificate().certificate_arn(arn).send().await?;
        Ok(())
    }
}

/// Delete every certificate. A certificate still attached to a distribution
/// or load balancer refuses deletion; that is logged and skipped.
pub async fn sweep(cfg: &SdkConfig) -> Outcome {
    sweep_certificates(&aws_sdk_acm::Client::new(cfg)).await
}

async fn sweep_certificates<A: CertificateApi>(api: &A) -> Outcome {
    log::debug!("removing all acm certificates");
    let mut outcome = Outcome::default();
    let certificates = match api.list_certificates().await {
        Ok(certificates) => certificates,
        Err(err) => {
            outcome.record("list certificates", Err(err));
            return outcome;
        }
    };
    for arn in certificates {
        log::debug!("delete certificate: {arn}");
        let result = api.delete_certificate(&arn).await;
        outcome.record(format!("delete certificate {arn}"), result);
    }
    outcome
}
