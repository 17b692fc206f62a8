//! Bucket bootstrap.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::client::check;
use crate::{InfluxClient, InfluxError, Result, TRACING_TARGET_BUCKET};

const BUCKETS_PATH: &str = "api/v2/buckets";
const ORGS_PATH: &str = "api/v2/orgs";

/// What [`InfluxClient::ensure_bucket`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketOutcome {
    /// The bucket did not exist and was created.
    Created,
    /// The bucket existed; its retention rule was replaced.
    Updated,
}

/// Parses a retention period such as `30d`, `12h`, `90m` or `3600s` into seconds.
pub fn parse_retention(value: &str) -> Result<u64> {
    let invalid = || InfluxError::InvalidRetention(value.to_owned());

    let value_trimmed = value.trim();
    let unit = value_trimmed.chars().last().ok_or_else(invalid)?;
    let amount: u64 = value_trimmed[..value_trimmed.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| invalid())?;

    let multiplier = match unit {
        'd' => 24 * 3600,
        'h' => 3600,
        'm' => 60,
        's' => 1,
        _ => return Err(invalid()),
    };

    amount.checked_mul(multiplier).ok_or_else(invalid)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetentionRule {
    #[serde(rename = "type")]
    kind: &'static str,
    every_seconds: u64,
}

impl RetentionRule {
    fn expire(every_seconds: u64) -> Vec<Self> {
        vec![Self {
            kind: "expire",
            every_seconds,
        }]
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBucket<'a> {
    #[serde(rename = "orgID")]
    org_id: &'a str,
    name: &'a str,
    retention_rules: Vec<RetentionRule>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBucket {
    retention_rules: Vec<RetentionRule>,
}

#[derive(Debug, Deserialize)]
struct Bucket {
    id: String,
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Buckets {
    #[serde(default)]
    buckets: Vec<Bucket>,
}

#[derive(Debug, Deserialize)]
struct Org {
    id: String,
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Orgs {
    #[serde(default)]
    orgs: Vec<Org>,
}

impl InfluxClient {
    /// Makes sure the configured bucket exists with the configured retention.
    ///
    /// Creates the bucket when missing, otherwise replaces its retention rule.
    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_BUCKET,
        fields(bucket = %self.config().bucket)
    )]
    pub async fn ensure_bucket(&self) -> Result<BucketOutcome> {
        let config = self.config();
        let every_seconds = config.retention_seconds()?;

        if let Some(bucket) = self.find_bucket().await? {
            let url = self.endpoint(&format!("{BUCKETS_PATH}/{}", bucket.id))?;
            let body = UpdateBucket {
                retention_rules: RetentionRule::expire(every_seconds),
            };
            check(self.request(Method::PATCH, url).json(&body).send().await?).await?;

            tracing::info!(
                target: TRACING_TARGET_BUCKET,
                bucket_id = %bucket.id,
                retention = %config.retention,
                "Bucket retention updated"
            );
            return Ok(BucketOutcome::Updated);
        }

        let org_id = self.find_org_id().await?;
        let body = CreateBucket {
            org_id: &org_id,
            name: &config.bucket,
            retention_rules: RetentionRule::expire(every_seconds),
        };
        let url = self.endpoint(BUCKETS_PATH)?;
        check(self.request(Method::POST, url).json(&body).send().await?).await?;

        tracing::info!(
            target: TRACING_TARGET_BUCKET,
            org_id = %org_id,
            retention = %config.retention,
            "Bucket created"
        );
        Ok(BucketOutcome::Created)
    }

    async fn find_bucket(&self) -> Result<Option<Bucket>> {
        let config = self.config();
        let mut url = self.endpoint(BUCKETS_PATH)?;
        url.query_pairs_mut()
            .append_pair("org", &config.org)
            .append_pair("name", &config.bucket);

        let response = check(self.request(Method::GET, url).send().await?).await?;
        let buckets: Buckets = serde_json::from_str(&response.text().await?)?;

        Ok(buckets
            .buckets
            .into_iter()
            .find(|bucket| bucket.name == config.bucket))
    }

    async fn find_org_id(&self) -> Result<String> {
        let config = self.config();
        let mut url = self.endpoint(ORGS_PATH)?;
        url.query_pairs_mut().append_pair("org", &config.org);

        let response = check(self.request(Method::GET, url).send().await?).await?;
        let orgs: Orgs = serde_json::from_str(&response.text().await?)?;

        orgs.orgs
            .into_iter()
            .find(|org| org.name == config.org)
            .map(|org| org.id)
            .ok_or_else(|| InfluxError::OrgNotFound(config.org.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_retention_units() {
        assert_eq!(parse_retention("30d").unwrap(), 2_592_000);
        assert_eq!(parse_retention("12h").unwrap(), 43_200);
        assert_eq!(parse_retention("90m").unwrap(), 5_400);
        assert_eq!(parse_retention(" 3600s ").unwrap(), 3_600);
        assert_eq!(parse_retention("0d").unwrap(), 0);
    }

    #[test]
    fn rejects_malformed_retention() {
        for value in ["", "d", "30", "30w", "-1d", "1.5h", "99999999999999999999d"] {
            assert!(parse_retention(value).is_err(), "{value} should be rejected");
        }
    }

    #[test]
    fn retention_rule_wire_shape() {
        let body = UpdateBucket {
            retention_rules: RetentionRule::expire(60),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "retentionRules": [{ "type": "expire", "everySeconds": 60 }] })
        );
    }
}
