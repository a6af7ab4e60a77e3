//! Terraform-style preview text for the selected modules.
//!
//! The output is for display only; the backend owns the real templates.

use crate::core::fields;
use crate::domain::catalog;
use crate::domain::model::{CloudModule, FormData, ModuleConfig, ProviderId};
use std::collections::BTreeMap;

const SENSITIVE: &str = "*** sensitive ***";
const MAX_SUBNETS: f64 = 4.0;

pub fn generate_preview(
    provider: Option<ProviderId>,
    form: &FormData,
    modules: &[String],
    configs: &BTreeMap<String, ModuleConfig>,
) -> String {
    let Some(provider) = provider else {
        return String::new();
    };
    if modules.is_empty() {
        return String::new();
    }

    let mut code = provider_block(provider, form);
    let empty = ModuleConfig::new();

    for module_id in modules {
        let Some(module) = catalog::find_module(provider, module_id) else {
            tracing::debug!("Skipping unknown module '{}' in IaC preview", module_id);
            continue;
        };
        let config = configs.get(module_id).unwrap_or(&empty);
        code.push_str(&format!("# {} Resources\n", module.name));

        if module.id == "sns" {
            code.push_str(&sns_blocks(config));
            continue;
        }

        let resource_name = fields::text_or(config, "name", module.id);
        for resource in module.iac_resources {
            code.push_str(&format!("resource \"{}\" \"{}\" {{\n", resource, resource_name));
            code.push_str(&module_body(module, config, modules, configs));
            code.push_str("}\n");
        }
    }

    code
}

fn provider_block(provider: ProviderId, form: &FormData) -> String {
    match provider {
        ProviderId::Aws => format!(
            "# Terraform AWS Provider Configuration\n\
             provider \"aws\" {{\n\
             \x20 region     = \"{}\"\n\
             \x20 access_key = \"{SENSITIVE}\"\n\
             \x20 secret_key = \"{SENSITIVE}\"\n\
             }}\n",
            form.region
        ),
        ProviderId::Gcp => format!(
            "# Terraform GCP Provider Configuration\n\
             provider \"google\" {{\n\
             \x20 project     = \"your-project-id\"\n\
             \x20 region      = \"{}\"\n\
             \x20 credentials = file(\"service-account.json\")\n\
             }}\n",
            form.region
        ),
        ProviderId::Azure => format!(
            "# Terraform Azure Provider Configuration\n\
             provider \"azurerm\" {{\n\
             \x20 features {{}}\n\
             \x20 subscription_id = \"{}\"\n\
             \x20 tenant_id       = \"{}\"\n\
             \x20 client_id       = \"{}\"\n\
             \x20 client_secret   = \"{SENSITIVE}\"\n\
             }}\n",
            or_placeholder(&form.subscription_id, "your-subscription-id"),
            or_placeholder(&form.tenant_id, "your-tenant-id"),
            or_placeholder(&form.client_id, "your-client-id"),
        ),
    }
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

fn module_body(
    module: &CloudModule,
    config: &ModuleConfig,
    selected: &[String],
    configs: &BTreeMap<String, ModuleConfig>,
) -> String {
    let mut body = String::new();
    let mut line = |text: String| {
        body.push_str("  ");
        body.push_str(&text);
        body.push('\n');
    };

    match module.id {
        "ec2" => {
            line(format!(
                "instance_type = \"{}\"",
                fields::text_or(config, "instanceType", "t2.micro")
            ));
            if let Some(ami) = fields::text(config, "amiId") {
                line(format!("ami = \"{}\"", ami));
            }
            match fields::text(config, "vpcId") {
                Some("default") => line("# Uses default VPC".to_string()),
                Some("use-selected-vpc") if selected.iter().any(|m| m == "vpc") => {
                    let vpc_name = configs
                        .get("vpc")
                        .and_then(|c| fields::text(c, "name"))
                        .unwrap_or("main");
                    line(format!("subnet_id = aws_subnet.{}.id", vpc_name));
                }
                _ => {}
            }
        }
        "s3" => {
            line(format!("bucket = \"{}\"", fields::text_or(config, "name", "my-bucket")));
            line("force_destroy = true".to_string());
        }
        "dynamodb" => {
            line(format!(
                "name = \"{}\"",
                fields::text_or(config, "name", "my-dynamodb-table")
            ));
            line(format!(
                "tags = {{ Environment = \"{}\" }}",
                fields::text_or(config, "environment", "prod")
            ));
        }
        "vpc" => {
            let cidr = fields::text_or(config, "cidrBlock", "10.0.0.0/16");
            let subnet_count =
                fields::positive_or(config, "subnetCount", 2.0).clamp(1.0, MAX_SUBNETS) as u32;
            let half = subnet_count.div_ceil(2);
            let public: Vec<String> = (0..half).map(|i| format!("\"10.0.{}.0/24\"", i + 1)).collect();
            let private: Vec<String> = (0..half)
                .map(|i| format!("\"10.0.{}.0/24\"", i + 1 + half))
                .collect();
            line(format!("vpc_cidr             = \"{}\"", cidr));
            line(format!("public_subnets       = [{}]", public.join(", ")));
            line(format!("private_subnets      = [{}]", private.join(", ")));
        }
        "eks" => {
            line(format!(
                "name = \"{}\"",
                fields::text_or(config, "clusterName", "my-eks-cluster")
            ));
        }
        "ecr" => {
            line(format!("name = \"{}\"", fields::text_or(config, "name", "")));
            line(format!(
                "image_tag_mutability = \"{}\"",
                fields::text_or(config, "imageTagMutability", "MUTABLE")
            ));
            line("image_scanning_configuration {".to_string());
            line(format!(
                "  scan_on_push = {}",
                fields::enabled_unless_false(config, "scanOnPush")
            ));
            line("}".to_string());
        }
        "lambda" => {
            line(format!(
                "function_name = \"{}\"",
                fields::text_or(config, "functionName", "my-lambda-function")
            ));
            line(format!("runtime = \"{}\"", fields::text_or(config, "runtime", "python3.9")));
            line(format!(
                "handler = \"{}\"",
                fields::text_or(config, "handler", "lambda_function.lambda_handler")
            ));
            line("# You will need to specify the source code for your Lambda function.".to_string());
            line("# Example: filename = \"lambda_function.py\"".to_string());
            line("# Or use a zip file: filename = \"function.zip\"".to_string());
        }
        "cloudwatch" => {
            line(format!(
                "name = \"{}\"",
                fields::text_or(config, "logGroupName", "default-log-group")
            ));
            line(format!(
                "retention_in_days = {}",
                fields::positive_or(config, "retentionInDays", 14.0) as i64
            ));
            if let Some(kms) = fields::text(config, "kmsKeyId") {
                line(format!("kms_key_id = \"{}\"", kms));
            }
        }
        "kms" => {
            line(format!("alias       = \"alias/{}\"", fields::text_or(config, "alias", "my-key")));
            line(format!(
                "description = \"{}\"",
                fields::text_or(config, "description", "KMS key for encryption")
            ));
            line(format!(
                "enable_key_rotation = {}",
                fields::enabled_unless_false(config, "enableKeyRotation")
            ));
        }
        "route53" => {
            let domain = fields::text_or(config, "domainName", "");
            let routing = fields::text_or(config, "routingPolicy", "simple");
            line(format!("domain_name     = \"{}\"", domain));
            line(format!(
                "record_name     = \"{}\"",
                fields::text_or(config, "recordName", domain)
            ));
            line(format!("record_type     = \"{}\"", fields::text_or(config, "recordType", "A")));
            line(format!("target          = \"{}\"", fields::text_or(config, "target", "")));
            line(format!("routing_policy  = \"{}\"", routing));
            if routing == "weighted" {
                if !matches!(config.get("weight"), None | Some(serde_json::Value::Null)) {
                    let weight = fields::number(config, "weight")
                        .filter(|w| w.is_finite())
                        .unwrap_or(0.0);
                    line(format!("weight = {}", weight.trunc().clamp(0.0, 255.0) as i64));
                }
            }
            if routing == "latency" {
                if let Some(region) = fields::text(config, "region") {
                    line(format!("region = \"{}\"", region));
                }
            }
            let health_check = fields::flag(config, "enableHealthCheck").unwrap_or(false);
            line(format!("enable_health_check = {}", health_check));
            if health_check {
                if let Some(url) = fields::text(config, "healthCheckUrl") {
                    line(format!("health_check_url = \"{}\"", url));
                }
            }
        }
        "lb" => {
            let lb_type = fields::text_or(config, "lbType", "nlb");
            line(format!("name      = \"{}\"", fields::text_or(config, "name", "my-load-balancer")));
            line(format!("lb_type   = \"{}\"", lb_type));
            line(format!("vpc_id    = \"{}\"", fields::text_or(config, "vpcId", "")));
            let subnets: Vec<String> = fields::string_list(config, "subnets")
                .into_iter()
                .map(|s| format!("\"{}\"", s))
                .collect();
            line(format!("subnets   = [{}]", subnets.join(", ")));
            if let Some(port) = fields::number(config, "targetPort").filter(|p| *p != 0.0) {
                line(format!("target_port = {}", port as i64));
            }
            if lb_type == "alb" {
                let https = fields::flag(config, "enableHttps").unwrap_or(false);
                line(format!("enable_https = {}", https));
                if https {
                    if let Some(arn) = fields::text(config, "certificateArn") {
                        line(format!("certificate_arn = \"{}\"", arn));
                    }
                }
            }
        }
        _ => {}
    }

    body
}

/// SNS 產生 topic，有 email 時再加上訂閱
fn sns_blocks(config: &ModuleConfig) -> String {
    let topic = fields::text_or(config, "name", "my-sns-topic");
    let mut code = format!("resource \"aws_sns_topic\" \"{}\" {{\n", topic);
    code.push_str(&format!("  name = \"{}\"\n", topic));
    if let Some(display_name) = fields::text(config, "displayName") {
        code.push_str(&format!("  display_name = \"{}\"\n", display_name));
    }
    code.push_str("}\n");

    if let Some(email) = fields::text(config, "emailSubscription") {
        code.push_str(&format!(
            "resource \"aws_sns_topic_subscription\" \"{topic}_email_sub\" {{\n\
             \x20 topic_arn = aws_sns_topic.{topic}.arn\n\
             \x20 protocol  = \"email\"\n\
             \x20 endpoint  = \"{email}\"\n\
             }}\n"
        ));
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn configs(module: &str, value: serde_json::Value) -> BTreeMap<String, ModuleConfig> {
        BTreeMap::from([(module.to_string(), value.as_object().cloned().unwrap())])
    }

    fn aws_form() -> FormData {
        FormData {
            access_key: "AKIA123".to_string(),
            secret_key: "secret".to_string(),
            region: "eu-central-1".to_string(),
            ..FormData::default()
        }
    }

    #[test]
    fn test_empty_without_provider_or_modules() {
        let form = aws_form();
        assert!(generate_preview(None, &form, &["ec2".into()], &BTreeMap::new()).is_empty());
        assert!(generate_preview(Some(ProviderId::Aws), &form, &[], &BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_aws_provider_block_masks_secrets() {
        let code = generate_preview(
            Some(ProviderId::Aws),
            &aws_form(),
            &["kms".into()],
            &BTreeMap::new(),
        );
        assert!(code.starts_with("# Terraform AWS Provider Configuration\nprovider \"aws\" {\n"));
        assert!(code.contains("  region     = \"eu-central-1\"\n"));
        assert!(!code.contains("AKIA123"));
        assert!(!code.contains("\"secret\""));
        assert!(code.contains("resource \"aws_kms_key\" \"kms\" {\n"));
        assert!(code.contains("  alias       = \"alias/my-key\"\n"));
        assert!(code.contains("  enable_key_rotation = true\n"));
    }

    #[test]
    fn test_ec2_block_per_resource() {
        let cfg = configs(
            "ec2",
            json!({ "name": "web", "instanceType": "t3.medium", "amiId": "ami-1", "vpcId": "default" }),
        );
        let code = generate_preview(Some(ProviderId::Aws), &aws_form(), &["ec2".into()], &cfg);
        assert!(code.contains("# EC2 Resources\n"));
        assert_eq!(code.matches("instance_type = \"t3.medium\"").count(), 6);
        assert!(code.contains("resource \"aws_instance\" \"web\" {\n  instance_type = \"t3.medium\"\n  ami = \"ami-1\"\n  # Uses default VPC\n}\n"));
    }

    #[test]
    fn test_vpc_subnets_are_split_evenly() {
        let cfg = configs("vpc", json!({ "name": "core", "subnetCount": 3 }));
        let code = generate_preview(Some(ProviderId::Aws), &aws_form(), &["vpc".into()], &cfg);
        assert!(code.contains("public_subnets       = [\"10.0.1.0/24\", \"10.0.2.0/24\"]"));
        assert!(code.contains("private_subnets      = [\"10.0.3.0/24\", \"10.0.4.0/24\"]"));
        assert!(code.contains("vpc_cidr             = \"10.0.0.0/16\""));
    }

    #[test]
    fn test_sns_subscription_only_with_email() {
        let cfg = configs("sns", json!({ "name": "alerts", "displayName": "Alerts" }));
        let code = generate_preview(Some(ProviderId::Aws), &aws_form(), &["sns".into()], &cfg);
        assert!(code.contains("resource \"aws_sns_topic\" \"alerts\" {\n  name = \"alerts\"\n  display_name = \"Alerts\"\n}\n"));
        assert!(!code.contains("aws_sns_topic_subscription"));

        let cfg = configs("sns", json!({ "name": "alerts", "emailSubscription": "ops@example.com" }));
        let code = generate_preview(Some(ProviderId::Aws), &aws_form(), &["sns".into()], &cfg);
        assert!(code.contains("resource \"aws_sns_topic_subscription\" \"alerts_email_sub\" {"));
        assert!(code.contains("  topic_arn = aws_sns_topic.alerts.arn\n"));
        assert!(code.contains("  endpoint  = \"ops@example.com\"\n"));
    }

    #[test]
    fn test_route53_weight_is_clamped() {
        let cfg = configs(
            "route53",
            json!({ "domainName": "example.com", "routingPolicy": "weighted", "weight": 900 }),
        );
        let code = generate_preview(Some(ProviderId::Aws), &aws_form(), &["route53".into()], &cfg);
        assert!(code.contains("  weight = 255\n"));
        assert!(code.contains("  record_name     = \"example.com\"\n"));
        assert!(code.contains("  enable_health_check = false\n"));
    }

    #[test]
    fn test_route53_unparsable_weight_prints_zero() {
        let cfg = configs(
            "route53",
            json!({ "domainName": "example.com", "routingPolicy": "weighted", "weight": "heavy" }),
        );
        let code = generate_preview(Some(ProviderId::Aws), &aws_form(), &["route53".into()], &cfg);
        assert!(code.contains("  weight = 0\n"));

        let cfg = configs("route53", json!({ "domainName": "example.com", "routingPolicy": "weighted" }));
        let code = generate_preview(Some(ProviderId::Aws), &aws_form(), &["route53".into()], &cfg);
        assert!(!code.contains("weight ="));
    }

    #[test]
    fn test_vpc_subnet_count_is_capped() {
        let cfg = configs("vpc", json!({ "name": "core", "subnetCount": 2_000_000 }));
        let code = generate_preview(Some(ProviderId::Aws), &aws_form(), &["vpc".into()], &cfg);
        assert!(code.contains("public_subnets       = [\"10.0.1.0/24\", \"10.0.2.0/24\"]"));
        assert!(code.contains("private_subnets      = [\"10.0.3.0/24\", \"10.0.4.0/24\"]"));
        assert!(!code.contains("10.0.5.0/24"));
        assert!(code.len() < 4096);
    }

    #[test]
    fn test_lb_https_only_for_alb() {
        let cfg = configs(
            "lb",
            json!({
                "name": "edge",
                "lbType": "alb",
                "vpcId": "vpc-1",
                "subnets": ["subnet-a", "subnet-b"],
                "targetPort": 8080,
                "enableHttps": true,
                "certificateArn": "arn:aws:acm:cert"
            }),
        );
        let code = generate_preview(Some(ProviderId::Aws), &aws_form(), &["lb".into()], &cfg);
        assert!(code.contains("  subnets   = [\"subnet-a\", \"subnet-b\"]\n"));
        assert!(code.contains("  target_port = 8080\n"));
        assert!(code.contains("  certificate_arn = \"arn:aws:acm:cert\"\n"));

        let cfg = configs("lb", json!({ "name": "edge", "lbType": "nlb", "enableHttps": true }));
        let code = generate_preview(Some(ProviderId::Aws), &aws_form(), &["lb".into()], &cfg);
        assert!(!code.contains("enable_https"));
    }

    #[test]
    fn test_azure_placeholders_and_header_only_modules() {
        let form = FormData {
            region: "westeurope".to_string(),
            tenant_id: "tenant-1".to_string(),
            client_secret: "hunter2".to_string(),
            ..FormData::default()
        };
        let code = generate_preview(Some(ProviderId::Azure), &form, &["vm".into()], &BTreeMap::new());
        assert!(code.contains("  tenant_id       = \"tenant-1\"\n"));
        assert!(code.contains("  subscription_id = \"your-subscription-id\"\n"));
        assert!(!code.contains("hunter2"));
        assert!(code.ends_with("# Virtual Machines Resources\n"));
    }
}
