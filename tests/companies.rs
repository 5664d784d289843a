use pricing_intel::AliasMatcher;

fn matcher() -> AliasMatcher {
    AliasMatcher::builtin().unwrap()
}

#[test]
fn test_microsoft_azure_scenario() {
    let result = matcher().find_companies_in_text(
        "Microsoft Azure pricing increased 15% affecting Office 365 Enterprise customers",
    );

    assert!(result.matched_companies.contains("microsoft"));
    let hits = &result.alias_hits["microsoft"];
    assert!(hits
        .iter()
        .any(|h| h.eq_ignore_ascii_case("azure") || h.eq_ignore_ascii_case("office365")));
    assert_eq!(result.total_matches, 3);
    assert!(result.confidence_score > 0.2);
}

#[test]
fn test_product_alias_reports_vendor_parent() {
    let matcher = matcher();
    let result = matcher.find_companies_in_text("ESXi renewals");
    assert_eq!(result.acquisition_mappings.get("esxi").map(|s| s.as_str()), Some("broadcom"));

    let intel = matcher.get_acquisition_intelligence("vSphere renewals");
    assert_eq!(intel.direct_acquisitions.get("vsphere").map(|s| s.as_str()), Some("broadcom"));
    assert!(intel.parent_companies.contains("broadcom"));
    assert_eq!(intel.acquisition_chains[0].ultimate_parent, "broadcom");
}

#[test]
fn test_confidence_bounds() {
    let matcher = matcher();
    let texts = [
        "",
        "nothing to see here",
        "vmware",
        "VMware, Veeam, Datto, Kaseya, Sophos and Fortinet all raised partner pricing this quarter",
        "Carbon Black customers are asking about Broadcom renewals and MSP margin",
    ];
    for text in texts {
        let result = matcher.find_companies_in_text(text);
        if result.matched_companies.is_empty() {
            assert_eq!(result.confidence_score, 0.0, "{}", text);
        } else {
            assert!((0.2..=1.0).contains(&result.confidence_score), "{}", text);
        }
    }
}

#[test]
fn test_every_alias_round_trips_to_its_canonical() {
    let matcher = matcher();
    for company in matcher.table().companies() {
        assert_eq!(
            matcher.normalize_company_name(&company.canonical_name).as_deref(),
            Some(company.canonical_name.as_str())
        );
        for alias in &company.aliases {
            assert_eq!(
                matcher.normalize_company_name(alias).as_deref(),
                Some(company.canonical_name.as_str()),
                "alias {}",
                alias
            );
            assert_eq!(
                matcher.normalize_company_name(&alias.to_uppercase()).as_deref(),
                Some(company.canonical_name.as_str())
            );
        }
    }
}

#[test]
fn test_every_alias_is_found_in_text() {
    let matcher = matcher();
    for company in matcher.table().companies() {
        for alias in &company.aliases {
            let text = format!("News about {} pricing.", alias);
            let result = matcher.find_companies_in_text(&text);
            assert!(
                result.matched_companies.contains(&company.canonical_name),
                "{} not detected as {}",
                alias,
                company.canonical_name
            );
        }
    }
}

#[test]
fn test_two_hop_acquisition_chain() {
    let intel = matcher().get_acquisition_intelligence("Carbon Black renewals are due next month");
    let chain = intel
        .acquisition_chains
        .iter()
        .find(|c| c.acquired == "carbon black")
        .unwrap();
    assert_eq!(chain.immediate_parent, "vmware");
    assert_eq!(chain.ultimate_parent, "broadcom");
    assert!(intel.parent_companies.contains("broadcom"));
}

#[test]
fn test_chains_never_exceed_three_hops() {
    let matcher = matcher();
    for acquired in matcher.table().acquisitions().keys() {
        let chain = matcher.resolve_acquisition_chain(acquired).unwrap();
        assert!(chain.hops() >= 1 && chain.hops() <= 3);
    }
}

#[test]
fn test_expansion_is_monotonic() {
    let matcher = matcher();
    let lists: Vec<Vec<&str>> = vec![
        vec![],
        vec!["pricing"],
        vec!["vmware", "vmware", "not a company"],
        vec!["Azure", "veeam", "datto", "carbon black"],
    ];
    for keywords in lists {
        let expanded = matcher.expand_keyword_list(&keywords);
        assert!(expanded.len() >= keywords.len());
        for keyword in &keywords {
            assert!(expanded.iter().any(|e| e == keyword));
        }
    }

    let expanded = matcher.expand_keyword_list(&["azure"]);
    assert!(expanded.iter().any(|e| e == "microsoft"));
    assert!(expanded.iter().any(|e| e == "office 365"));
}

#[test]
fn test_matching_is_idempotent() {
    let matcher = matcher();
    let text = "Broadcom VMware VCSP changes hit Datto and Kaseya partners";
    assert_eq!(matcher.find_companies_in_text(text), matcher.find_companies_in_text(text));
}
