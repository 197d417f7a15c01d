//! Property tests for Relay resource IDs and rights mapping

use azurerm_provider::arm::resourceids::{ParseError, ResourceIdType, SegmentKind};
use azurerm_provider::relay::ids::{
    HybridConnectionAuthorizationRuleId, HybridConnectionId, NamespaceAuthorizationRuleId,
    NamespaceId,
};
use azurerm_provider::relay::rights::RightsFlags;
use proptest::prelude::*;

fn name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9._-]{0,20}"
}

fn rule_id() -> impl Strategy<Value = HybridConnectionAuthorizationRuleId> {
    (name(), name(), name(), name(), name()).prop_map(|(sub, rg, ns, hc, rule)| {
        NamespaceId::new(sub, rg, ns)
            .hybrid_connection(hc)
            .authorization_rule(rule)
    })
}

/// Re-case the literal segments of `id` according to `styles`
fn recase(id: &str, segments: &[SegmentKind], styles: &[u8]) -> String {
    let parts: Vec<String> = id
        .trim_start_matches('/')
        .split('/')
        .zip(segments)
        .enumerate()
        .map(|(i, (part, kind))| match kind {
            SegmentKind::Static(_) => match styles[i % styles.len()] % 3 {
                0 => part.to_lowercase(),
                1 => part.to_uppercase(),
                _ => part.to_string(),
            },
            SegmentKind::UserSpecified => part.to_string(),
        })
        .collect();
    format!("/{}", parts.join("/"))
}

proptest! {
    #[test]
    fn formatted_ids_parse_back(id in rule_id()) {
        let parsed = HybridConnectionAuthorizationRuleId::parse(&id.id()).unwrap();
        prop_assert_eq!(&parsed, &id);

        let hc = id.hybrid_connection_id();
        prop_assert_eq!(HybridConnectionId::parse(&hc.id()).unwrap(), hc.clone());

        let ns = hc.namespace_id();
        prop_assert_eq!(NamespaceId::parse(&ns.id()).unwrap(), ns.clone());

        let ns_rule = ns.authorization_rule(id.authorization_rule_name.clone());
        prop_assert_eq!(NamespaceAuthorizationRuleId::parse(&ns_rule.id()).unwrap(), ns_rule);
    }

    #[test]
    fn truncated_ids_name_the_missing_segment(id in rule_id(), cut in 1usize..12) {
        let segments = HybridConnectionAuthorizationRuleId::segments();
        let parts: Vec<String> = id
            .id()
            .trim_start_matches('/')
            .split('/')
            .map(str::to_string)
            .collect();
        let truncated = format!("/{}", parts[..cut].join("/"));

        match HybridConnectionAuthorizationRuleId::parse(&truncated) {
            Err(ParseError::MissingSegment { segment, .. }) => {
                prop_assert_eq!(segment, segments[cut].name);
            }
            other => prop_assert!(false, "expected MissingSegment, got {:?}", other),
        }
    }

    #[test]
    fn insensitive_parse_matches_strict_parse(
        id in rule_id(),
        styles in prop::collection::vec(any::<u8>(), 1..12),
    ) {
        let canonical = id.id();
        prop_assert_eq!(
            HybridConnectionAuthorizationRuleId::parse_insensitively(&canonical).unwrap(),
            HybridConnectionAuthorizationRuleId::parse(&canonical).unwrap()
        );

        let kinds: Vec<SegmentKind> = HybridConnectionAuthorizationRuleId::segments()
            .iter()
            .map(|s| s.kind)
            .collect();
        let recased = recase(&canonical, &kinds, &styles);
        prop_assert_eq!(
            HybridConnectionAuthorizationRuleId::parse_insensitively(&recased).unwrap(),
            id
        );
    }

    #[test]
    fn rights_survive_expand_and_flatten(listen: bool, send: bool, manage: bool) {
        let flags = RightsFlags::new(listen, send, manage);
        prop_assert_eq!(RightsFlags::flatten(&flags.expand()), flags);
    }
}

#[test]
fn validation_rejects_invalid_right_combinations() {
    assert!(RightsFlags::new(false, false, false).validate().is_err());
    for send in [false, true] {
        assert!(RightsFlags::new(false, send, true).validate().is_err());
    }
}
