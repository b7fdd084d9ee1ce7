//! Registration/update validation, including the SSRF host check: a node
//! whose `host` resolves to a loopback or private address is rejected so a
//! registered worker can never be used to pivot requests into the node's
//! own network.

use std::collections::HashSet;
use std::net::IpAddr;

use node_types::Node;

pub fn validate_node(
    candidate: &Node,
    existing: &[&Node],
    known_models: &HashSet<String>,
) -> Result<(), Vec<String>> {
    let mut reasons = Vec::new();

    if candidate.id.trim().is_empty() {
        reasons.push("id must not be empty".to_string());
    }
    if candidate.host.trim().is_empty() {
        reasons.push("host must not be empty".to_string());
    } else if is_disallowed_host(&candidate.host) {
        reasons.push(format!(
            "host {} resolves to a loopback or private address",
            candidate.host
        ));
    }
    if candidate.inference_port == 0 {
        reasons.push("inference_port must be in [1,65535]".to_string());
    }
    if candidate.poc_port == 0 {
        reasons.push("poc_port must be in [1,65535]".to_string());
    }
    if candidate.max_concurrent == 0 {
        reasons.push("max_concurrent must be greater than zero".to_string());
    }
    if candidate.models.is_empty() {
        reasons.push("at least one model must be configured".to_string());
    }
    for model in &candidate.models {
        if !known_models.contains(&model.model_id) {
            reasons.push(format!("unknown model {}", model.model_id));
        }
    }

    for other in existing {
        if other.id == candidate.id {
            continue;
        }
        if other.host == candidate.host && other.inference_port == candidate.inference_port {
            reasons.push(format!(
                "(host, inference_port) already in use by node {}",
                other.id
            ));
        }
        if other.host == candidate.host && other.poc_port == candidate.poc_port {
            reasons.push(format!("(host, poc_port) already in use by node {}", other.id));
        }
    }

    if reasons.is_empty() {
        Ok(())
    } else {
        Err(reasons)
    }
}

fn is_disallowed_host(host: &str) -> bool {
    let bare = host
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .split('/')
        .next()
        .unwrap_or(host);
    let bare = bare.rsplit_once(':').map_or(bare, |(h, _)| h);

    if bare.eq_ignore_ascii_case("localhost") {
        return true;
    }
    match bare.parse::<IpAddr>() {
        Ok(ip) => is_disallowed_ip(ip),
        Err(_) => false,
    }
}

fn is_disallowed_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use node_types::ModelConfig;
    use std::collections::BTreeMap;

    fn node(id: &str, host: &str) -> Node {
        Node {
            id: id.to_string(),
            host: host.to_string(),
            inference_segment: "/v1".to_string(),
            inference_port: 8000,
            poc_segment: "/poc".to_string(),
            poc_port: 8001,
            models: vec![ModelConfig { model_id: "llama-3".to_string(), args: BTreeMap::new() }],
            max_concurrent: 4,
            node_num: 0,
            hardware: Vec::new(),
        }
    }

    fn models() -> HashSet<String> {
        HashSet::from(["llama-3".to_string()])
    }

    #[test]
    fn loopback_host_is_rejected() {
        let n = node("a", "127.0.0.1");
        assert!(validate_node(&n, &[], &models()).is_err());
    }

    #[test]
    fn private_range_host_is_rejected() {
        let n = node("a", "192.168.0.1");
        assert!(validate_node(&n, &[], &models()).is_err());
    }

    #[test]
    fn public_host_with_known_model_is_accepted() {
        let n = node("a", "worker1.example.com");
        assert!(validate_node(&n, &[], &models()).is_ok());
    }

    #[test]
    fn duplicate_endpoint_is_rejected() {
        let existing = node("a", "worker1.example.com");
        let candidate = node("b", "worker1.example.com");
        assert!(validate_node(&candidate, &[&existing], &models()).is_err());
    }

    #[test]
    fn unknown_model_is_rejected() {
        let mut n = node("a", "worker1.example.com");
        n.models[0].model_id = "unknown-model".to_string();
        assert!(validate_node(&n, &[], &models()).is_err());
    }
}
