use crate::core::fields;
use crate::domain::model::{Account, FormData, ModuleConfig, ProviderId};
use crate::utils::error::WorkflowError;
use crate::utils::validation::{validate_one_of, validate_pattern, validate_range};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;

fn kms_alias_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("valid alias regex"))
}

fn domain_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9.-]+\.[a-z]{2,}$").expect("valid domain regex"))
}

const INSTANCE_TYPES: &[&str] = &["t2.micro", "t2.small", "t2.medium", "m5.large", "t3.medium"];
const STORAGE_CLASSES: &[&str] = &["STANDARD", "INTELLIGENT_TIERING", "GLACIER"];
const LB_TYPES: &[&str] = &["alb", "nlb", "gwlb"];
const PERFORMANCE_MODES: &[&str] = &["generalPurpose", "maxIO"];
const THROUGHPUT_MODES: &[&str] = &["provisioned", "bursting"];
const ENVIRONMENTS: &[&str] = &["dev", "staging", "prod"];
const ROUTING_POLICIES: &[&str] = &["simple", "weighted", "latency"];
const LAMBDA_RUNTIMES: &[&str] = &["python3.9", "nodejs18.x", "java17", "dotnet6"];
const MAX_SUBNETS: f64 = 4.0;
const RETENTION_DAYS: &[f64] = &[0.0, 1.0, 3.0, 7.0, 14.0, 30.0, 60.0, 90.0, 180.0, 365.0];

fn option_set(module_id: &str, key: &str) -> Option<&'static [&'static str]> {
    match (module_id, key) {
        ("ec2", "instanceType") => Some(INSTANCE_TYPES),
        ("s3", "storageClass") => Some(STORAGE_CLASSES),
        ("lb", "lbType") => Some(LB_TYPES),
        ("efs", "performanceMode") => Some(PERFORMANCE_MODES),
        ("efs", "throughputMode") => Some(THROUGHPUT_MODES),
        ("efs" | "dynamodb" | "iam", "environment") => Some(ENVIRONMENTS),
        ("route53", "routingPolicy") => Some(ROUTING_POLICIES),
        ("lambda", "runtime") => Some(LAMBDA_RUNTIMES),
        _ => None,
    }
}

/// 檢查單一欄位的值是否在允許的選項或範圍內；空值交給必填檢查
pub fn check_field(module_id: &str, key: &str, value: &Value) -> Result<(), WorkflowError> {
    let text = match value {
        Value::Null => return Ok(()),
        Value::String(s) if s.trim().is_empty() => return Ok(()),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };

    if let Some(allowed) = option_set(module_id, key) {
        return validate_one_of(key, &text, allowed);
    }

    match (module_id, key) {
        ("vpc", "subnetCount") => {
            let count = text.parse::<f64>().ok().filter(|n| n.fract() == 0.0);
            match count {
                Some(n) => validate_range(key, n, 1.0, MAX_SUBNETS),
                None => Err(WorkflowError::InvalidConfigValueError {
                    field: key.to_string(),
                    value: text,
                    reason: "Value must be a whole number".to_string(),
                }),
            }
        }
        ("cloudwatch", "retentionInDays") => {
            if text.parse::<f64>().is_ok_and(|days| RETENTION_DAYS.contains(&days)) {
                Ok(())
            } else {
                Err(WorkflowError::InvalidConfigValueError {
                    field: key.to_string(),
                    value: text,
                    reason: "Value must be one of 0, 1, 3, 7, 14, 30, 60, 90, 180, 365".to_string(),
                })
            }
        }
        _ => Ok(()),
    }
}

/// 這些欄位輸入前會先轉小寫並去掉空白
pub fn normalize_field(module_id: &str, key: &str, value: &str) -> Option<String> {
    match (module_id, key) {
        ("route53", "domainName" | "recordName") => Some(value.trim().to_lowercase()),
        _ => None,
    }
}

/// 第一次選取模組時套用的預設設定
pub fn default_config(module_id: &str, region: &str) -> ModuleConfig {
    let mut config = ModuleConfig::new();
    config.insert("name".to_string(), json!(""));
    config.insert("region".to_string(), json!(region));

    let extra = match module_id {
        "ec2" => json!({ "instanceType": "t2.micro", "amiId": "", "vpcId": "" }),
        "s3" => json!({ "storageClass": "STANDARD" }),
        "vpc" => json!({ "cidrBlock": "10.0.0.0/16", "subnetCount": 2 }),
        "ecr" => json!({ "imageTagMutability": "MUTABLE", "scanOnPush": true }),
        "kms" => json!({
            "alias": "",
            "description": "KMS key for encryption",
            "enableKeyRotation": true
        }),
        "route53" => json!({
            "domainName": "",
            "recordName": "",
            "recordType": "A",
            "target": "",
            "routingPolicy": "simple",
            "enableHealthCheck": false,
            "healthCheckUrl": ""
        }),
        "efs" => json!({
            "performanceMode": "generalPurpose",
            "throughputMode": "provisioned",
            "encrypted": true,
            "provisionedThroughput": 100,
            "environment": "prod"
        }),
        "lb" => json!({
            "lbType": "alb",
            "vpcId": "",
            "subnets": [],
            "targetPort": 80,
            "enableHttps": false,
            "certificateArn": ""
        }),
        _ => Value::Null,
    };

    if let Value::Object(extra) = extra {
        config.extend(extra);
    }
    config
}

struct Checker<'a> {
    config: &'a ModuleConfig,
    problems: Vec<String>,
}

impl<'a> Checker<'a> {
    fn new(config: &'a ModuleConfig) -> Self {
        Self {
            config,
            problems: Vec::new(),
        }
    }

    fn require(&mut self, key: &str) -> &mut Self {
        if !fields::is_set(self.config, key) {
            self.problems.push(format!("{} is required", key));
        }
        self
    }

    fn problem(&mut self, message: impl Into<String>) -> &mut Self {
        self.problems.push(message.into());
        self
    }

    fn finish(&mut self) -> Result<(), Vec<String>> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.problems))
        }
    }
}

/// 檢查模組設定是否足以進入下一步；回傳所有缺漏項目
pub fn validate_module(module_id: &str, config: &ModuleConfig) -> Result<(), Vec<String>> {
    let mut check = Checker::new(config);

    match module_id {
        "ec2" => {
            check.require("name").require("instanceType").require("vpcId");
            match fields::text(config, "vpcId") {
                Some("default") | Some("use-selected-vpc") | None => {}
                Some(_) => {
                    check
                        .require("subnetId")
                        .require("securityGroupId")
                        .require("keyName");
                }
            }
        }
        "s3" => {
            check.require("name").require("storageClass");
        }
        "vpc" => {
            check.require("name").require("cidrBlock");
        }
        "eks" => {
            check
                .require("clusterName")
                .require("nodeCount")
                .require("instanceType");
        }
        "cloudwatch" => {
            check.require("logGroupName");
        }
        "sns" => {
            check.require("name").require("emailSubscription");
        }
        "iam" => {
            let has_user = fields::flag(config, "create_user") == Some(true)
                && fields::text(config, "user_name").is_some();
            let has_role = fields::flag(config, "create_role") == Some(true)
                && fields::text(config, "role_name").is_some()
                && fields::text(config, "assume_role_policy").is_some();
            if !has_user && !has_role {
                check.problem(
                    "either create_user with user_name, or create_role with role_name and assume_role_policy",
                );
            }
        }
        "ecr" => {
            check.require("name");
        }
        "lambda" => {
            check.require("name").require("runtime");
        }
        "lb" => {
            check.require("name").require("lbType").require("vpcId");
            if fields::string_list(config, "subnets").is_empty() {
                check.problem("at least one subnet is required");
            }
            if fields::text(config, "lbType") == Some("alb")
                && fields::flag(config, "enableHttps") == Some(true)
            {
                check.require("certificateArn");
            }
        }
        "kms" => match fields::text(config, "alias") {
            Some(alias) => {
                if let Err(e) = validate_pattern("alias", alias, kms_alias_pattern()) {
                    check.problem(e.to_string());
                }
            }
            None => {
                check.problem("alias is required");
            }
        },
        "route53" => {
            match fields::text(config, "domainName") {
                Some(domain) => {
                    if let Err(e) = validate_pattern("domainName", domain, domain_pattern()) {
                        check.problem(e.to_string());
                    }
                }
                None => {
                    check.problem("domainName is required");
                }
            }
            check.require("target");
            if !matches!(fields::text(config, "recordType"), Some("A" | "AAAA" | "CNAME")) {
                check.problem("recordType must be A, AAAA or CNAME");
            }
            if fields::text(config, "routingPolicy") == Some("weighted") {
                match fields::number(config, "weight") {
                    Some(weight) => {
                        if let Err(e) = validate_range("weight", weight, 0.0, 255.0) {
                            check.problem(e.to_string());
                        }
                    }
                    None => {
                        check.problem("weight is required for weighted routing");
                    }
                }
            }
            if fields::flag(config, "enableHealthCheck") == Some(true) {
                check.require("healthCheckUrl");
            }
        }
        "efs" => {
            check.require("name").require("throughputMode");
            if fields::text(config, "throughputMode") == Some("provisioned")
                && !fields::number(config, "provisionedThroughput").is_some_and(|t| t > 0.0)
            {
                check.problem("provisionedThroughput must be positive in provisioned mode");
            }
        }
        "dynamodb" => {
            check.require("name");
        }
        _ => {}
    }

    for (key, value) in config {
        if let Err(e) = check_field(module_id, key, value) {
            check.problem(e.to_string());
        }
    }
    check.finish()
}

/// 第一步的表單是否完整
pub fn credentials_valid(
    provider: Option<ProviderId>,
    form: &FormData,
    using_existing_account: bool,
    selected_account: Option<&Account>,
) -> bool {
    match provider {
        Some(ProviderId::Aws) => {
            if using_existing_account {
                selected_account.is_some()
            } else {
                !form.access_key.is_empty() && !form.secret_key.is_empty() && !form.region.is_empty()
            }
        }
        Some(_) => !form.region.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(value: Value) -> ModuleConfig {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_defaults_seed_module_specific_fields() {
        let ec2 = default_config("ec2", "us-west-2");
        assert_eq!(ec2["instanceType"], "t2.micro");
        assert_eq!(ec2["region"], "us-west-2");
        assert_eq!(ec2["name"], "");

        let lb = default_config("lb", "us-east-1");
        assert_eq!(lb["targetPort"], 80);
        assert_eq!(lb["lbType"], "alb");

        let iam = default_config("iam", "us-east-1");
        assert_eq!(iam.len(), 2);
    }

    #[test]
    fn test_defaults_alone_are_not_enough() {
        for module in ["ec2", "s3", "vpc", "kms", "route53", "efs", "lb", "ecr", "dynamodb"] {
            let cfg = default_config(module, "us-east-1");
            assert!(validate_module(module, &cfg).is_err(), "{} should need input", module);
        }
        assert!(validate_module("cloudfront", &default_config("cloudfront", "us-east-1")).is_ok());
    }

    #[test]
    fn test_ec2_with_concrete_vpc_needs_network_details() {
        let mut cfg = config(json!({ "name": "web", "instanceType": "t2.micro", "vpcId": "vpc-123" }));
        let problems = validate_module("ec2", &cfg).unwrap_err();
        assert_eq!(problems.len(), 3);

        cfg.insert("vpcId".to_string(), json!("default"));
        assert!(validate_module("ec2", &cfg).is_ok());
    }

    #[test]
    fn test_kms_alias_format() {
        assert!(validate_module("kms", &config(json!({ "alias": "app-key" }))).is_ok());
        assert!(validate_module("kms", &config(json!({ "alias": "App_Key" }))).is_err());
        assert!(validate_module("kms", &config(json!({}))).is_err());
    }

    #[test]
    fn test_route53_rules() {
        let mut cfg = config(json!({
            "domainName": "example.com",
            "target": "1.2.3.4",
            "recordType": "A",
            "routingPolicy": "weighted",
            "weight": 300
        }));
        assert!(validate_module("route53", &cfg).is_err());

        cfg.insert("weight".to_string(), json!(10));
        assert!(validate_module("route53", &cfg).is_ok());

        cfg.insert("enableHealthCheck".to_string(), json!(true));
        assert!(validate_module("route53", &cfg).is_err());

        cfg.insert("healthCheckUrl".to_string(), json!("https://example.com/health"));
        assert!(validate_module("route53", &cfg).is_ok());

        cfg.insert("recordType".to_string(), json!("MX"));
        assert!(validate_module("route53", &cfg).is_err());
    }

    #[test]
    fn test_route53_rejects_malformed_domains() {
        for domain in ["Example.COM", "example", "exa mple.com", "example.c0m", "example.c"] {
            let cfg = config(json!({ "domainName": domain, "target": "1.2.3.4", "recordType": "A" }));
            let problems = validate_module("route53", &cfg).unwrap_err();
            assert!(problems[0].contains("domainName"), "{} should be rejected", domain);
        }
        let cfg = config(json!({ "domainName": "sub.example-site.io", "target": "1.2.3.4", "recordType": "A" }));
        assert!(validate_module("route53", &cfg).is_ok());
    }

    #[test]
    fn test_route53_names_are_normalized() {
        assert_eq!(
            normalize_field("route53", "domainName", "  Example.COM "),
            Some("example.com".to_string())
        );
        assert_eq!(normalize_field("route53", "recordName", "WWW"), Some("www".to_string()));
        assert_eq!(normalize_field("route53", "target", "Host.Example.com"), None);
        assert_eq!(normalize_field("s3", "name", " Assets "), None);
    }

    #[test]
    fn test_vpc_subnet_count_bounds() {
        let mut cfg = default_config("vpc", "us-east-1");
        cfg.insert("name".to_string(), json!("core"));
        assert!(validate_module("vpc", &cfg).is_ok());

        for bad in [json!(0), json!(5), json!(600), json!(2.5), json!("many")] {
            cfg.insert("subnetCount".to_string(), bad.clone());
            assert!(validate_module("vpc", &cfg).is_err(), "{} should be rejected", bad);
        }
        cfg.insert("subnetCount".to_string(), json!("4"));
        assert!(validate_module("vpc", &cfg).is_ok());
    }

    #[test]
    fn test_check_field_only_limits_known_fields() {
        assert!(check_field("vpc", "subnetCount", &json!(4)).is_ok());
        assert!(check_field("vpc", "subnetCount", &json!(2_000_000)).is_err());
        assert!(check_field("lb", "lbType", &json!("gwlb")).is_ok());
        assert!(check_field("lb", "lbType", &json!("classic")).is_err());
        assert!(check_field("lb", "lbType", &json!("")).is_ok());
        assert!(check_field("s3", "name", &json!("anything-goes")).is_ok());
        assert!(check_field("ec2", "environment", &json!("qa")).is_ok());
    }

    #[test]
    fn test_option_sets_are_enforced() {
        let ec2 = config(json!({ "name": "web", "instanceType": "x1e.32xlarge", "vpcId": "default" }));
        assert!(validate_module("ec2", &ec2).is_err());

        let s3 = config(json!({ "name": "assets", "storageClass": "DEEP_ARCHIVE" }));
        assert!(validate_module("s3", &s3).is_err());
        let s3 = config(json!({ "name": "assets", "storageClass": "GLACIER" }));
        assert!(validate_module("s3", &s3).is_ok());

        let lb = config(json!({ "name": "edge", "lbType": "elb", "vpcId": "vpc-1", "subnets": ["subnet-1"] }));
        let problems = validate_module("lb", &lb).unwrap_err();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("alb, nlb, gwlb"));

        let efs = config(json!({
            "name": "share",
            "throughputMode": "bursting",
            "performanceMode": "turbo",
            "environment": "qa"
        }));
        assert_eq!(validate_module("efs", &efs).unwrap_err().len(), 2);

        let dynamodb = config(json!({ "name": "orders", "environment": "staging" }));
        assert!(validate_module("dynamodb", &dynamodb).is_ok());
        let dynamodb = config(json!({ "name": "orders", "environment": "production" }));
        assert!(validate_module("dynamodb", &dynamodb).is_err());

        let lambda = config(json!({ "name": "fn", "runtime": "ruby3.2" }));
        assert!(validate_module("lambda", &lambda).is_err());

        let logs = config(json!({ "logGroupName": "app", "retentionInDays": 45 }));
        assert!(validate_module("cloudwatch", &logs).is_err());
        let logs = config(json!({ "logGroupName": "app", "retentionInDays": 30 }));
        assert!(validate_module("cloudwatch", &logs).is_ok());
    }

    #[test]
    fn test_iam_needs_user_or_role() {
        assert!(validate_module("iam", &config(json!({ "create_user": true, "user_name": "ci" }))).is_ok());
        assert!(validate_module("iam", &config(json!({ "create_role": true, "role_name": "app" }))).is_err());
        assert!(validate_module(
            "iam",
            &config(json!({ "create_role": true, "role_name": "app", "assume_role_policy": "{}" }))
        )
        .is_ok());
    }

    #[test]
    fn test_lb_alb_https_needs_certificate() {
        let mut cfg = config(json!({
            "name": "edge", "lbType": "alb", "vpcId": "vpc-1",
            "subnets": ["subnet-1"], "enableHttps": true
        }));
        assert!(validate_module("lb", &cfg).is_err());
        cfg.insert("certificateArn".to_string(), json!("arn:aws:acm:cert"));
        assert!(validate_module("lb", &cfg).is_ok());
    }

    #[test]
    fn test_efs_throughput() {
        let cfg = config(json!({ "name": "share", "throughputMode": "provisioned", "provisionedThroughput": 0 }));
        assert!(validate_module("efs", &cfg).is_err());
        let cfg = config(json!({ "name": "share", "throughputMode": "bursting" }));
        assert!(validate_module("efs", &cfg).is_ok());
    }

    #[test]
    fn test_credentials_validity() {
        let mut form = FormData::default();
        assert!(!credentials_valid(Some(ProviderId::Aws), &form, false, None));

        form.access_key = "AKIA".to_string();
        form.secret_key = "secret".to_string();
        assert!(credentials_valid(Some(ProviderId::Aws), &form, false, None));

        assert!(!credentials_valid(Some(ProviderId::Aws), &form, true, None));
        assert!(credentials_valid(Some(ProviderId::Gcp), &FormData::default(), false, None));
        assert!(!credentials_valid(None, &form, false, None));
    }
}
