use serde::Serialize;
use transcode_core::{DnsRecord, DomainError, DomainSet, RoutingPolicy};

/// DNS レコードの向き先を指定しなかったときのプレースホルダ
pub const DEFAULT_EDGE_TARGET: &str = "edge.invalid";

/// デプロイ時に一度だけ計算される構成（ドメイン・DNS・ルーティング表）
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentPlan {
    pub domains: DomainSet,
    pub dns_records: Vec<DnsRecord>,
    pub routing: RoutingPolicy,
}

impl DeploymentPlan {
    pub fn build(fqdn: &str, target: Option<&str>) -> Result<Self, DomainError> {
        let domains = DomainSet::from_fqdn(fqdn)?;
        let dns_records = domains.dns_records(target.unwrap_or(DEFAULT_EDGE_TARGET));

        Ok(Self {
            domains,
            dns_records,
            routing: RoutingPolicy::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transcode_core::DnsRecordKind;

    #[test]
    fn test_plan_for_apex() {
        let plan = DeploymentPlan::build("example.com", Some("d111.cloudfront.net")).unwrap();

        assert_eq!(plan.domains.names(), ["example.com", "www.example.com"]);
        assert_eq!(plan.dns_records.len(), 2);
        assert_eq!(plan.dns_records[0].kind, DnsRecordKind::AliasA);
        assert_eq!(plan.dns_records[1].name, "www.example.com");
        assert!(plan
            .dns_records
            .iter()
            .all(|record| record.target == "d111.cloudfront.net"));
    }

    #[test]
    fn test_plan_for_subdomain() {
        let plan = DeploymentPlan::build("img.example.com", None).unwrap();

        assert_eq!(plan.domains.apex(), "example.com");
        assert_eq!(plan.dns_records.len(), 1);
        assert_eq!(plan.dns_records[0].kind, DnsRecordKind::Cname);
        assert_eq!(plan.dns_records[0].target, DEFAULT_EDGE_TARGET);
    }

    #[test]
    fn test_plan_rejects_invalid_domain() {
        assert_eq!(
            DeploymentPlan::build("localhost", None).unwrap_err(),
            DomainError::Invalid("localhost".to_string())
        );
    }

    #[test]
    fn test_plan_serializes_routing_table() {
        let plan = DeploymentPlan::build("example.com", None).unwrap();
        let json = serde_json::to_value(&plan).unwrap();

        assert_eq!(json["routing"]["behaviors"][0]["pattern"], "/transform/image*");
        assert_eq!(json["dns_records"][0]["kind"], "A");
    }
}
