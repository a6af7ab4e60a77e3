use crate::core::fields;
use crate::domain::catalog;
use crate::domain::model::{CloudModule, ModuleConfig, PricingTable, ProviderId};
use std::collections::BTreeMap;

pub const HOURS_PER_MONTH: f64 = 730.0;

/// 單一模組的月費估算
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleCost {
    pub module_id: String,
    pub monthly: f64,
}

/// 價格查詢：有即時報價時以即時報價為準（缺 key 用 fallback），
/// 否則使用靜態價格表（缺少或為 0 時用 fallback）
struct PriceLookup<'a> {
    live: Option<&'a BTreeMap<String, f64>>,
    module: Option<&'a CloudModule>,
}

impl PriceLookup<'_> {
    fn get(&self, key: &str, fallback: f64) -> f64 {
        match self.live {
            Some(live) => live.get(key).copied().unwrap_or(fallback),
            None => self
                .module
                .and_then(|m| m.static_price(key))
                .filter(|p| *p != 0.0)
                .unwrap_or(fallback),
        }
    }

    fn static_sum(&self) -> f64 {
        self.module
            .map(|m| m.price.iter().map(|(_, p)| *p).sum())
            .unwrap_or(0.0)
    }
}

pub fn estimate_breakdown(
    provider: Option<ProviderId>,
    modules: &[String],
    configs: &BTreeMap<String, ModuleConfig>,
    live_pricing: &PricingTable,
) -> Vec<ModuleCost> {
    let Some(provider) = provider else {
        return Vec::new();
    };

    let empty = ModuleConfig::new();
    modules
        .iter()
        .map(|module_id| {
            let config = configs.get(module_id).unwrap_or(&empty);
            let lookup = PriceLookup {
                live: live_pricing.get(module_id),
                module: catalog::find_module(provider, module_id),
            };
            ModuleCost {
                module_id: module_id.clone(),
                monthly: module_cost(module_id, config, &lookup),
            }
        })
        .collect()
}

pub fn estimate_monthly_cost(
    provider: Option<ProviderId>,
    modules: &[String],
    configs: &BTreeMap<String, ModuleConfig>,
    live_pricing: &PricingTable,
) -> f64 {
    estimate_breakdown(provider, modules, configs, live_pricing)
        .iter()
        .map(|c| c.monthly)
        .sum()
}

fn module_cost(module_id: &str, config: &ModuleConfig, price: &PriceLookup<'_>) -> f64 {
    match module_id {
        "ec2" => {
            let instance_type = fields::text_or(config, "instanceType", "t2.micro");
            price.get(instance_type, 0.0116) * HOURS_PER_MONTH
        }
        "s3" => {
            let storage_class = fields::text_or(config, "storageClass", "STANDARD");
            price.get(storage_class, 0.023) * HOURS_PER_MONTH
        }
        "vpc" => price.get("natGateway", 0.045) * HOURS_PER_MONTH,
        "lambda" => {
            let requests = fields::positive_or(config, "requestsPerMonth", 1e6);
            let duration_ms = fields::positive_or(config, "avgDurationMs", 1000.0);
            let memory_mb = fields::positive_or(config, "memoryMB", 128.0);
            let request_price = price.get("requests", 0.0000002);
            let duration_price = price.get("duration", 0.0000166667);
            requests * request_price
                + (requests * duration_ms / 1000.0) * (memory_mb / 1024.0) * duration_price
        }
        "dynamodb" => {
            let read = fields::positive_or(config, "readCapacityUnits", 5.0);
            let write = fields::positive_or(config, "writeCapacityUnits", 5.0);
            let storage = fields::positive_or(config, "storageGB", 1.0);
            read * HOURS_PER_MONTH * 60.0 * price.get("read", 0.25)
                + write * HOURS_PER_MONTH * 60.0 * price.get("write", 1.25)
                + storage * price.get("storage", 0.25)
        }
        "kms" => price.get("key", 1.0),
        "route53" => price.get("hostedZone", 0.5),
        "efs" => fields::positive_or(config, "storageGB", 10.0) * price.get("storage", 0.30),
        "sns" => {
            let publish = fields::positive_or(config, "publishCount", 1e6);
            let sms = fields::positive_or(config, "smsCount", 100.0);
            publish * price.get("publish", 0.5 / 1e6) + sms * price.get("sms", 0.00645)
        }
        "cloudwatch" => {
            let log_gb = fields::positive_or(config, "logGB", 1.0);
            let metrics = fields::positive_or(config, "metricsCount", 1.0);
            log_gb * price.get("logs", 0.57) + metrics * price.get("metrics", 0.30)
        }
        "ecr" => fields::positive_or(config, "storageGB", 10.0) * price.get("storage", 0.10),
        "lb" => {
            let lb_type = fields::text_or(config, "lbType", "alb");
            price.get(lb_type, 0.0225) * HOURS_PER_MONTH
        }
        // IAM、EKS 與其他雲端的模組：靜態價格加總 × 730
        _ => price.static_sum() * HOURS_PER_MONTH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn single(
        provider: ProviderId,
        module: &str,
        config: serde_json::Value,
        live: &PricingTable,
    ) -> f64 {
        let mut configs = BTreeMap::new();
        configs.insert(module.to_string(), config.as_object().cloned().unwrap());
        estimate_monthly_cost(Some(provider), &[module.to_string()], &configs, live)
    }

    #[test]
    fn test_empty_selection_costs_nothing() {
        let live = PricingTable::new();
        assert_eq!(estimate_monthly_cost(None, &["ec2".into()], &BTreeMap::new(), &live), 0.0);
        assert_eq!(estimate_monthly_cost(Some(ProviderId::Aws), &[], &BTreeMap::new(), &live), 0.0);
    }

    #[test]
    fn test_ec2_uses_fallback_hourly_rate() {
        let cost = single(ProviderId::Aws, "ec2", json!({}), &PricingTable::new());
        assert!(approx(cost, 0.0116 * 730.0));
    }

    #[test]
    fn test_live_pricing_overrides_static_table() {
        let mut live = PricingTable::new();
        live.insert(
            "ec2".to_string(),
            BTreeMap::from([("m5.large".to_string(), 0.096)]),
        );
        let cost = single(ProviderId::Aws, "ec2", json!({ "instanceType": "m5.large" }), &live);
        assert!(approx(cost, 0.096 * 730.0));

        // 即時報價缺少該 key 時使用 fallback，而非靜態價格
        live.insert("vpc".to_string(), BTreeMap::new());
        let cost = single(ProviderId::Aws, "vpc", json!({}), &live);
        assert!(approx(cost, 0.045 * 730.0));
    }

    #[test]
    fn test_lambda_defaults() {
        let cost = single(ProviderId::Aws, "lambda", json!({}), &PricingTable::new());
        let expected = 1e6 * 0.0000002 + 1e6 * (128.0 / 1024.0) * 0.0000166667;
        assert!(approx(cost, expected));
    }

    #[test]
    fn test_usage_based_modules_read_config() {
        let live = PricingTable::new();
        assert!(approx(single(ProviderId::Aws, "efs", json!({ "storageGB": 20 }), &live), 6.0));
        assert!(approx(single(ProviderId::Aws, "ecr", json!({}), &live), 1.0));
        assert!(approx(
            single(ProviderId::Aws, "cloudwatch", json!({ "logGB": "2", "metricsCount": 3 }), &live),
            2.0 * 0.57 + 3.0 * 0.30
        ));
        assert!(approx(single(ProviderId::Aws, "kms", json!({}), &live), 1.0));
        assert!(approx(single(ProviderId::Aws, "route53", json!({}), &live), 0.5));
    }

    #[test]
    fn test_dynamodb_capacity_and_storage() {
        let live = PricingTable::new();
        let cost = single(ProviderId::Aws, "dynamodb", json!({}), &live);
        assert!(approx(cost, 5.0 * 730.0 * 60.0 * 0.25 + 5.0 * 730.0 * 60.0 * 1.25 + 0.25));

        let cost = single(
            ProviderId::Aws,
            "dynamodb",
            json!({ "readCapacityUnits": 2, "writeCapacityUnits": "1", "storageGB": 40 }),
            &live,
        );
        assert!(approx(cost, 2.0 * 730.0 * 60.0 * 0.25 + 730.0 * 60.0 * 1.25 + 40.0 * 0.25));

        let mut live = PricingTable::new();
        live.insert("dynamodb".to_string(), BTreeMap::from([("read".to_string(), 0.0001)]));
        let cost = single(ProviderId::Aws, "dynamodb", json!({}), &live);
        assert!(approx(cost, 5.0 * 730.0 * 60.0 * 0.0001 + 5.0 * 730.0 * 60.0 * 1.25 + 0.25));
    }

    #[test]
    fn test_sns_publish_and_sms() {
        let live = PricingTable::new();
        let cost = single(ProviderId::Aws, "sns", json!({}), &live);
        assert!(approx(cost, 1e6 * 0.5 / 1e6 + 100.0 * 0.00645));

        let cost = single(ProviderId::Aws, "sns", json!({ "publishCount": 4e6, "smsCount": 0 }), &live);
        assert!(approx(cost, 4e6 * 0.5 / 1e6 + 100.0 * 0.00645));
    }

    #[test]
    fn test_load_balancer_type_selects_rate() {
        let live = PricingTable::new();
        let nlb = single(ProviderId::Aws, "lb", json!({ "lbType": "nlb" }), &live);
        assert!(approx(nlb, 0.0225 * 730.0));
        let alb = single(ProviderId::Aws, "lb", json!({}), &live);
        assert!(approx(alb, 0.022 * 730.0));
    }

    #[test]
    fn test_other_modules_sum_static_prices() {
        let live = PricingTable::new();
        assert!(approx(single(ProviderId::Aws, "eks", json!({}), &live), 0.4 * 730.0));
        assert_eq!(single(ProviderId::Aws, "iam", json!({}), &live), 0.0);
        assert!(approx(single(ProviderId::Azure, "blob", json!({}), &live), 0.0184 * 730.0));
    }

    #[test]
    fn test_breakdown_matches_total() {
        let modules = vec!["vpc".to_string(), "kms".to_string()];
        let live = PricingTable::new();
        let costs = estimate_breakdown(Some(ProviderId::Aws), &modules, &BTreeMap::new(), &live);
        assert_eq!(costs[1].module_id, "kms");
        assert!(approx(costs[1].monthly, 1.0));
        let total = estimate_monthly_cost(Some(ProviderId::Aws), &modules, &BTreeMap::new(), &live);
        assert!(approx(total, 0.045 * 730.0 + 1.0));
    }
}
