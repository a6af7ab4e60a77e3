//! Static provider and module tables.

use crate::domain::model::{CloudModule, Provider, ProviderId};

pub static PROVIDERS: [Provider; 3] = [
    Provider {
        id: ProviderId::Aws,
        name: "AWS",
        description: "Amazon Web Services offers reliable, scalable cloud computing services.",
        regions: &["us-east-1", "us-west-2", "eu-central-1", "ap-southeast-1"],
    },
    Provider {
        id: ProviderId::Gcp,
        name: "Google Cloud",
        description: "Google Cloud Platform offers a suite of cloud computing services.",
        regions: &["us-central1", "europe-west1", "asia-east1", "australia-southeast1"],
    },
    Provider {
        id: ProviderId::Azure,
        name: "Azure",
        description: "Microsoft Azure is a cloud computing service for building and managing applications.",
        regions: &["eastus", "westeurope", "southeastasia", "brazilsouth"],
    },
];

static AWS_MODULES: [CloudModule; 16] = [
    CloudModule {
        id: "vpc",
        name: "VPC",
        price: &[("vpc", 0.01), ("endpoints", 0.01), ("natGateway", 0.045)],
        requirements: &["CIDR Block", "Subnets", "Route Tables", "Internet Gateway"],
        description: "Virtual Private Cloud lets you provision a logically isolated section of AWS.",
        iac_resources: &["aws_vpc", "aws_subnet", "aws_route_table", "aws_internet_gateway"],
    },
    CloudModule {
        id: "s3",
        name: "S3",
        price: &[("storage", 0.023), ("requests", 0.0004), ("transfer", 0.09)],
        requirements: &["Bucket Name", "Policy", "Encryption Settings", "Access Control"],
        description: "Simple Storage Service offers scalable object storage for data backup and archiving.",
        iac_resources: &[
            "aws_s3_bucket",
            "aws_s3_bucket_policy",
            "aws_s3_bucket_public_access_block",
        ],
    },
    CloudModule {
        id: "ec2",
        name: "EC2",
        price: &[("base", 0.1), ("storage", 0.08), ("bandwidth", 0.09)],
        requirements: &["VPC", "Security Group", "IAM Role", "Key Pair"],
        description: "Elastic Compute Cloud provides resizable compute capacity in the cloud.",
        iac_resources: &[
            "aws_instance",
            "aws_security_group",
            "aws_key_pair",
            "aws_iam_role",
            "aws_iam_instance_profile",
            "aws_iam_role_policy_attachment",
        ],
    },
    CloudModule {
        id: "eks",
        name: "EKS",
        price: &[("cluster", 0.1), ("nodes", 0.2), ("storage", 0.1)],
        requirements: &["VPC", "IAM Role", "Node Group", "Cluster Config"],
        description: "Elastic Kubernetes Service makes it easy to deploy containerized applications.",
        iac_resources: &["aws_eks_cluster", "aws_eks_node_group", "aws_iam_role"],
    },
    CloudModule {
        id: "lambda",
        name: "Lambda",
        price: &[("requests", 0.0000002), ("duration", 0.0000166667)],
        requirements: &["IAM Role", "Function Code", "Runtime", "Memory Config"],
        description: "Serverless compute service that runs code without provisioning or managing servers.",
        iac_resources: &["aws_lambda_function", "aws_iam_role", "aws_lambda_permission"],
    },
    CloudModule {
        id: "dynamodb",
        name: "DynamoDB",
        price: &[("read", 0.25), ("write", 1.25), ("storage", 0.25)],
        requirements: &["Table Name", "Primary Key", "Billing Mode", "Attributes"],
        description: "Fully managed NoSQL database service for fast and predictable performance.",
        iac_resources: &["aws_dynamodb_table", "aws_dynamodb_global_table"],
    },
    CloudModule {
        id: "lb",
        name: "Load Balancer",
        price: &[("alb", 0.022), ("nlb", 0.0225), ("gwlb", 0.012)],
        requirements: &["VPC", "Subnets", "Target Port", "Type (alb/nlb/gwlb)"],
        description: "Deploy ALB, NLB, or Gateway Load Balancer using a universal Terraform module.",
        iac_resources: &["aws_lb", "aws_lb_target_group", "aws_lb_listener"],
    },
    CloudModule {
        id: "kms",
        name: "KMS Key",
        price: &[("key", 1.0)],
        requirements: &["Key Alias", "Key Policy", "IAM Permissions"],
        description: "Create AWS KMS key to encrypt S3, EBS, RDS, Secrets Manager, and CloudWatch logs.",
        iac_resources: &["aws_kms_key", "aws_kms_alias"],
    },
    CloudModule {
        id: "route53",
        name: "Route53",
        price: &[("hostedZone", 0.5), ("record", 0.0)],
        requirements: &[
            "Domain Name",
            "Record Type (A/CNAME)",
            "Target (ALB/DNS)",
            "Routing Policy",
        ],
        description: "Manage DNS with Route53: Hosted Zones, A/AAAA/CNAME records, and weighted/latency routing.",
        iac_resources: &["aws_route53_zone", "aws_route53_record"],
    },
    CloudModule {
        id: "cloudfront",
        name: "CloudFront",
        price: &[("dataOut", 0.085), ("requests", 0.0075)],
        requirements: &["Origin", "Distribution", "Cache Behavior", "SSL Certificate"],
        description: "Content Delivery Network that securely delivers data with low latency and high speed.",
        iac_resources: &[
            "aws_cloudfront_distribution",
            "aws_cloudfront_origin_access_identity",
        ],
    },
    CloudModule {
        id: "iam",
        name: "IAM",
        price: &[("free", 0.0)],
        requirements: &["Users", "Roles", "Policies", "Access Keys"],
        description: "Identity and Access Management controls user access to AWS resources securely.",
        iac_resources: &["aws_iam_user", "aws_iam_role", "aws_iam_policy", "aws_iam_access_key"],
    },
    CloudModule {
        id: "efs",
        name: "EFS",
        price: &[("storage", 0.30)],
        requirements: &["File System Name", "Performance Mode", "Throughput Mode", "VPC"],
        description: "Elastic File System provides scalable file storage for use with EC2 instances.",
        iac_resources: &["aws_efs_file_system", "aws_efs_mount_target"],
    },
    CloudModule {
        id: "sns",
        name: "SNS",
        price: &[("publish", 0.5 / 1e6), ("sms", 0.00645)],
        requirements: &["Topic", "Subscriptions", "Message Format", "Permissions"],
        description: "Simple Notification Service sends messages to multiple subscribers and endpoints.",
        iac_resources: &["aws_sns_topic", "aws_sns_topic_subscription"],
    },
    CloudModule {
        id: "cloudwatch",
        name: "CloudWatch",
        price: &[("logs", 0.57), ("metrics", 0.30)],
        requirements: &["Log Group Name", "Retention Period", "IAM Permissions"],
        description: "Monitor AWS resources and applications in real-time with logs and metrics.",
        iac_resources: &[
            "aws_cloudwatch_log_group",
            "aws_cloudwatch_metric_alarm",
            "aws_cloudwatch_dashboard",
            "aws_cloudwatch_event_rule",
        ],
    },
    CloudModule {
        id: "cloudtrail",
        name: "CloudTrail",
        price: &[("trail", 0.0), ("storage", 0.023)],
        requirements: &["S3 Bucket", "IAM Role", "Region", "Trail Name"],
        description: "Tracks user activity and API usage across your AWS infrastructure for security and compliance.",
        iac_resources: &[
            "aws_cloudtrail",
            "aws_s3_bucket",
            "aws_s3_bucket_policy",
            "aws_s3_bucket_public_access_block",
        ],
    },
    CloudModule {
        id: "ecr",
        name: "ECR",
        price: &[("storage", 0.1)],
        requirements: &["Repository Name", "IAM Role"],
        description: "Elastic Container Registry securely stores and manages Docker container images.",
        iac_resources: &["aws_ecr_repository"],
    },
];

static GCP_MODULES: [CloudModule; 4] = [
    CloudModule {
        id: "compute",
        name: "Compute Engine",
        price: &[("instance", 0.05)],
        requirements: &["VPC"],
        description: "VMs on Google Cloud.",
        iac_resources: &[],
    },
    CloudModule {
        id: "gke",
        name: "GKE",
        price: &[("cluster", 0.1)],
        requirements: &["Cluster"],
        description: "Kubernetes on GCP.",
        iac_resources: &[],
    },
    CloudModule {
        id: "vpc",
        name: "VPC",
        price: &[("network", 0.01)],
        requirements: &["CIDR"],
        description: "Networking.",
        iac_resources: &[],
    },
    CloudModule {
        id: "storage",
        name: "Cloud Storage",
        price: &[("storage", 0.02)],
        requirements: &["Bucket"],
        description: "Object storage.",
        iac_resources: &[],
    },
];

static AZURE_MODULES: [CloudModule; 4] = [
    CloudModule {
        id: "vm",
        name: "Virtual Machines",
        price: &[("instance", 0.04)],
        requirements: &["VNet"],
        description: "Azure VMs.",
        iac_resources: &[],
    },
    CloudModule {
        id: "aks",
        name: "AKS",
        price: &[("nodes", 0.1)],
        requirements: &["Cluster"],
        description: "Kubernetes on Azure.",
        iac_resources: &[],
    },
    CloudModule {
        id: "vnet",
        name: "Virtual Network",
        price: &[("vnet", 0.01)],
        requirements: &["CIDR"],
        description: "Azure VNet.",
        iac_resources: &[],
    },
    CloudModule {
        id: "blob",
        name: "Blob Storage",
        price: &[("storage", 0.0184)],
        requirements: &["Account"],
        description: "Object storage.",
        iac_resources: &[],
    },
];

pub fn providers() -> &'static [Provider] {
    &PROVIDERS
}

pub fn provider(id: ProviderId) -> &'static Provider {
    match id {
        ProviderId::Aws => &PROVIDERS[0],
        ProviderId::Gcp => &PROVIDERS[1],
        ProviderId::Azure => &PROVIDERS[2],
    }
}

pub fn modules_for(provider: ProviderId) -> &'static [CloudModule] {
    match provider {
        ProviderId::Aws => &AWS_MODULES,
        ProviderId::Gcp => &GCP_MODULES,
        ProviderId::Azure => &AZURE_MODULES,
    }
}

pub fn find_module(provider: ProviderId, module_id: &str) -> Option<&'static CloudModule> {
    modules_for(provider).iter().find(|m| m.id == module_id)
}

/// 名稱不分大小寫的子字串搜尋，空字串回傳全部
pub fn search_modules(provider: ProviderId, query: &str) -> Vec<&'static CloudModule> {
    let needle = query.to_lowercase();
    modules_for(provider)
        .iter()
        .filter(|m| m.name.to_lowercase().contains(&needle))
        .collect()
}

/// 最低的正數價格，用於顯示 "from $X/hr"
pub fn starting_price(module: &CloudModule) -> f64 {
    module
        .price
        .iter()
        .map(|(_, p)| *p)
        .filter(|p| *p > 0.0)
        .fold(None, |min: Option<f64>, p| Some(min.map_or(p, |m| m.min(p))))
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_lookup_and_default_region() {
        assert_eq!(provider(ProviderId::Gcp).default_region(), "us-central1");
        assert_eq!(provider(ProviderId::Azure).default_region(), "eastus");
        assert_eq!(providers().len(), 3);
    }

    #[test]
    fn test_module_ids_are_unique_per_provider() {
        for p in providers() {
            let modules = modules_for(p.id);
            let mut ids: Vec<_> = modules.iter().map(|m| m.id).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), modules.len(), "duplicate module id for {}", p.id);
        }
        assert_eq!(modules_for(ProviderId::Aws).len(), 16);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let hits = search_modules(ProviderId::Aws, "cloud");
        let ids: Vec<_> = hits.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["cloudfront", "cloudwatch", "cloudtrail"]);
        assert_eq!(search_modules(ProviderId::Aws, "").len(), 16);
        assert!(search_modules(ProviderId::Gcp, "lambda").is_empty());
    }

    #[test]
    fn test_starting_price_ignores_free_entries() {
        let route53 = find_module(ProviderId::Aws, "route53").unwrap();
        assert_eq!(starting_price(route53), 0.5);
        let iam = find_module(ProviderId::Aws, "iam").unwrap();
        assert_eq!(starting_price(iam), 0.0);
        let lb = find_module(ProviderId::Aws, "lb").unwrap();
        assert_eq!(starting_price(lb), 0.012);
    }
}
