#[cfg(test)]
mod tests {
    use crate::naming::*;
    use crate::types::*;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn ctx() -> OrgContext {
        let mut regions = BTreeMap::new();
        regions.insert("westeurope".to_string(), "weu".to_string());
        let mut tags = BTreeMap::new();
        tags.insert("owner".to_string(), "platform".to_string());
        tags.insert("env".to_string(), "prod".to_string());
        OrgContext::new(
            "vks",
            "s1",
            "westeurope",
            &regions,
            tags,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn resource_group_scenario() {
        let name = render_default(&ctx(), "rg-{region}-{org}-{pattern}-{name}", "landingzone");
        assert_eq!(name, "rg-weu-vks-s1-landingzone-01");
    }

    #[test]
    fn placeholders_substituted_in_any_order() {
        let name = render_default(&ctx(), "{name}.{pattern}.{org}.{region}", "hub");
        assert_eq!(name, "hub.s1.vks.weu-01");
    }

    #[test]
    fn repeated_placeholder_substituted_each_time() {
        let name = render(&ctx(), "{org}-{org}", "x", "");
        assert_eq!(name, "vks-vks");
    }

    #[test]
    fn unknown_placeholder_left_literal() {
        let name = render_default(&ctx(), "rg-{regoin}-{org}-{name}", "core");
        assert_eq!(name, "rg-{regoin}-vks-core-01");
    }

    #[test]
    fn unterminated_brace_left_literal() {
        let name = render(&ctx(), "rg-{org}-{name", "core", "01");
        assert_eq!(name, "rg-vks-{name-01");
    }

    #[test]
    fn doubled_brace_keeps_outer_literal() {
        let name = render(&ctx(), "{{name}}", "core", "");
        assert_eq!(name, "{core}");
    }

    #[test]
    fn substituted_value_is_not_rescanned() {
        let name = render(&ctx(), "x-{name}", "{org}", "");
        assert_eq!(name, "x-{org}");
    }

    #[test]
    fn suffix_separator_handling() {
        let c = ctx();
        assert_eq!(render(&c, "vnet-{name}", "hub", "02"), "vnet-hub-02");
        assert_eq!(render(&c, "vnet-{name}", "hub", "-02"), "vnet-hub-02");
        assert_eq!(render(&c, "vnet-{name}", "hub", "_02"), "vnet-hub_02");
        assert_eq!(render(&c, "vnet-{name}", "hub", ""), "vnet-hub");
    }

    #[test]
    fn storage_account_name_is_provider_safe() {
        let name = storage_account_name("st-weu-vks-s1-flowlogs-archive-01");
        assert!(name.len() <= 24);
        assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_eq!(name, "stweuvkss1flowlogsarchiv");
    }

    #[test]
    fn storage_account_name_needs_three_characters() {
        assert!(check_storage_account_name("st1").is_ok());
        let name = storage_account_name("--01");
        assert_eq!(name, "01");
        let err = check_storage_account_name(&name).unwrap_err();
        assert!(matches!(
            err,
            crate::DomainError::InvalidName {
                category: ResourceCategory::StorageAccount,
                ..
            }
        ));
        assert!(err.to_string().contains("'01'"));
        assert!(check_storage_account_name("").is_err());
    }

    #[test]
    fn unmapped_region_is_rejected() {
        let regions = BTreeMap::new();
        let err = OrgContext::new("vks", "s1", "mars", &regions, BTreeMap::new(), Utc::now())
            .unwrap_err();
        assert!(err.to_string().contains("mars"));
    }

    #[test]
    fn tag_pairs_sorted_with_timestamp_last() {
        let pairs = ctx().tag_pairs();
        assert_eq!(
            pairs,
            vec![
                "env=prod".to_string(),
                "owner=platform".to_string(),
                "deployed_at=2024-05-01T12:30:00Z".to_string(),
            ]
        );
    }

    #[test]
    fn rule_ref_sentinels() {
        assert_eq!(RuleRef::from_raw(None), RuleRef::Empty);
        assert_eq!(RuleRef::from_raw(Some("")), RuleRef::Empty);
        assert_eq!(RuleRef::from_raw(Some("null")), RuleRef::Empty);
        assert_eq!(RuleRef::from_raw(Some("undefined")), RuleRef::Empty);
        assert_eq!(
            RuleRef::from_raw(Some("allow-ssh")),
            RuleRef::Named("allow-ssh".into())
        );
    }

    #[test]
    fn priority_range() {
        let mut rule = NsgRule {
            priority: 100,
            protocol: Protocol::Tcp,
            direction: Direction::Inbound,
            access: Access::Allow,
            source_address: "*".into(),
            source_ports: "*".into(),
            destination_address: "*".into(),
            destination_ports: "22".into(),
            description: None,
        };
        assert!(rule.validate("allow-ssh").is_ok());
        rule.priority = 4097;
        assert!(rule.validate("allow-ssh").is_err());
        rule.priority = 99;
        assert!(rule.validate("allow-ssh").is_err());
    }
}
