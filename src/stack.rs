//! The serverless site stack.
//!
//! Declares the fixed topology for the contact-form application: a DNS zone
//! lookup, two independently regioned certificates, the contacts table, the
//! compute function, the HTTP gateway with its alias record, and the
//! CDN-fronted site bucket with its alias record and deployment step.
//! Teardown is an explicit reverse-order destroy the operator invokes, not
//! a side effect of declaration.

use crate::config::StackConfig;
use provision::{AttrValue, NodeKind, ResourceNode, StackBuilder};

/// The CDN only accepts certificates issued in this region, regardless of
/// the stack's primary region.
pub const EDGE_CERTIFICATE_REGION: &str = "us-east-1";

/// Placeholder content hash used when the asset bundle has not been built.
pub const UNBUILT_BUNDLE: &str = "unbuilt";

/// Declare every node of the stack.
///
/// `bundle_hash` is the content hash of the local asset bundle; it flows
/// into the deployment node so an unchanged bundle converges without an
/// upload.
pub fn declare_stack(config: &StackConfig, bundle_hash: &str) -> provision::Result<StackBuilder> {
    let site_domain = config.site_domain();
    let api_domain = config.api_domain();
    let site_url = config.site_url();

    let mut stack = StackBuilder::new();

    stack.declare(
        ResourceNode::new(NodeKind::Zone, "Zone")
            .attr("domain", AttrValue::literal(&config.domain)),
    )?;

    stack.declare(
        ResourceNode::new(NodeKind::Certificate, "ApiCertificate")
            .attr("domain", AttrValue::literal(&api_domain))
            .attr("validation", AttrValue::literal("dns"))
            .attr("zone", AttrValue::reference("Zone", "id"))
            .region(&config.region),
    )?;

    stack.declare(
        ResourceNode::new(NodeKind::Certificate, "SiteCertificate")
            .attr("domain", AttrValue::literal(&site_domain))
            .attr("validation", AttrValue::literal("dns"))
            .attr("zone", AttrValue::reference("Zone", "id"))
            .region(EDGE_CERTIFICATE_REGION),
    )?;

    stack.declare(
        ResourceNode::new(NodeKind::Table, "ContactsTable")
            .attr("name", AttrValue::literal(config.table_name()))
            .attr("partition_key", AttrValue::literal("pk"))
            .attr("sort_key", AttrValue::literal("sk"))
            .attr("billing", AttrValue::literal("on_demand"))
            .region(&config.region),
    )?;

    stack.declare(
        ResourceNode::new(NodeKind::Function, "CreateContact")
            .attr("handler", AttrValue::literal("create-contact"))
            .attr("table", AttrValue::reference("ContactsTable", "arn"))
            .attr(
                "table_access",
                AttrValue::literal(config.table_capability.as_str()),
            )
            .attr("env.TABLE_NAME", AttrValue::reference("ContactsTable", "name"))
            .attr("env.ORIGIN_URL", AttrValue::literal(&site_url))
            .region(&config.region),
    )?;

    stack.declare(
        ResourceNode::new(NodeKind::Gateway, "ContactsApi")
            .attr("domain", AttrValue::literal(&api_domain))
            .attr("certificate", AttrValue::reference("ApiCertificate", "arn"))
            .attr("function", AttrValue::reference("CreateContact", "arn"))
            .attr("route", AttrValue::literal("POST /contacts"))
            .attr("cors_origin", AttrValue::literal(&site_url))
            .region(&config.region),
    )?;

    stack.declare(
        ResourceNode::new(NodeKind::AliasRecord, "ApiAlias")
            .attr("zone", AttrValue::reference("Zone", "id"))
            .attr("name", AttrValue::literal(&api_domain))
            .attr("target", AttrValue::reference("ContactsApi", "domain")),
    )?;

    stack.declare(
        ResourceNode::new(NodeKind::Bucket, "SiteBucket")
            .attr("name", AttrValue::literal(&site_domain))
            .attr("public_read", AttrValue::literal("true"))
            .attr("website_index", AttrValue::literal("index.html"))
            .region(&config.region),
    )?;

    stack.declare(
        ResourceNode::new(NodeKind::Distribution, "SiteDistribution")
            .attr("origin", AttrValue::reference("SiteBucket", "domain"))
            .attr("certificate", AttrValue::reference("SiteCertificate", "arn"))
            .attr("alias", AttrValue::literal(&site_domain))
            .attr("default_root", AttrValue::literal("index.html")),
    )?;

    stack.declare(
        ResourceNode::new(NodeKind::AliasRecord, "SiteAlias")
            .attr("zone", AttrValue::reference("Zone", "id"))
            .attr("name", AttrValue::literal(&site_domain))
            .attr("target", AttrValue::reference("SiteDistribution", "domain")),
    )?;

    stack.declare(
        ResourceNode::new(NodeKind::Deployment, "SiteDeployment")
            .attr("bucket", AttrValue::reference("SiteBucket", "name"))
            .attr("distribution", AttrValue::reference("SiteDistribution", "id"))
            .attr(
                "source",
                AttrValue::literal(config.asset_dir.to_string_lossy()),
            )
            .attr("content_hash", AttrValue::literal(bundle_hash))
            .attr("invalidate", AttrValue::literal("/*")),
    )?;

    Ok(stack)
}
