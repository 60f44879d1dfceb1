//! First-match rule resolution.

use chrono::{Local, NaiveDateTime};

use super::{DownloadItem, Rule, RuleCategory, RuleCondition, Suggestion};
use crate::template::{contains_ext_placeholder, expand_at, split_filename};

/// The winning rule together with the suggestion it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch<'a> {
    pub rule: &'a Rule,
    pub suggestion: Suggestion,
}

/// Rules in evaluation order: site before general, then ascending priority
/// with unranked rules last. The sort is stable, so ties keep input order.
pub fn sort_rules(rules: &[Rule]) -> Vec<&Rule> {
    let mut sorted: Vec<&Rule> = rules.iter().collect();
    sorted.sort_by_key(|r| (r.category.rank(), r.priority_rank()));
    sorted
}

/// Resolve a download against `rules`, returning only the suggestion.
pub fn resolve(rules: &[Rule], item: &DownloadItem, page_url: Option<&str>) -> Option<Suggestion> {
    resolve_match(rules, item, page_url).map(|m| m.suggestion)
}

/// Resolve a download against `rules` using the current local time for templates.
pub fn resolve_match<'a>(
    rules: &'a [Rule],
    item: &DownloadItem,
    page_url: Option<&str>,
) -> Option<RuleMatch<'a>> {
    resolve_match_at(rules, item, page_url, Local::now().naive_local())
}

/// Resolve a download against `rules` with rename templates expanded at `now`.
///
/// The first rule (in [`sort_rules`] order) whose site scope and condition
/// both hold wins; later rules are not consulted.
pub fn resolve_match_at<'a>(
    rules: &'a [Rule],
    item: &DownloadItem,
    page_url: Option<&str>,
    now: NaiveDateTime,
) -> Option<RuleMatch<'a>> {
    if rules.is_empty() {
        return None;
    }

    let url = item.url.to_lowercase();
    let page = page_url.map(str::to_lowercase);
    let filename = item.filename.to_lowercase();

    let rule = sort_rules(rules).into_iter().find(|rule| {
        site_matches(rule, &url, page.as_deref()) && condition_matches(rule, &url, &filename)
    })?;

    let name = final_filename_at(rule, &item.filename, now);
    let folder = rule.folder_path();
    let filename = if folder.is_empty() {
        name
    } else {
        format!("{folder}/{name}")
    };

    Some(RuleMatch {
        rule,
        suggestion: Suggestion {
            filename,
            conflict_action: rule.conflict_action(),
        },
    })
}

/// The basename a matched rule saves `filename` under.
///
/// Without a rename template the name is unchanged. With one, the template
/// is expanded against the original name; the original extension is
/// re-appended unless the template places `[ext]` itself.
pub fn final_filename_at(rule: &Rule, filename: &str, now: NaiveDateTime) -> String {
    let Some(template) = rule.rename_template() else {
        return filename.to_string();
    };

    let expanded = expand_at(template, filename, now);
    if contains_ext_placeholder(template) {
        return expanded;
    }
    match split_filename(filename).1 {
        Some(ext) => format!("{expanded}.{ext}"),
        None => expanded,
    }
}

/// Site rules with no site pattern are unscoped, like general rules.
fn site_matches(rule: &Rule, url: &str, page_url: Option<&str>) -> bool {
    if rule.category != RuleCategory::Site {
        return true;
    }
    let Some(site) = rule.site_pattern.as_deref().filter(|s| !s.is_empty()) else {
        return true;
    };
    let site = site.to_lowercase();
    url.contains(&site) || page_url.is_some_and(|p| p.contains(&site))
}

/// `url` and `filename` are already lower-cased.
fn condition_matches(rule: &Rule, url: &str, filename: &str) -> bool {
    if rule.pattern.is_empty() {
        return false;
    }
    let pattern = rule.pattern.to_lowercase();
    match rule.condition {
        RuleCondition::Extension => {
            let ext = filename.rsplit('.').next().unwrap_or("");
            ext == pattern.strip_prefix('.').unwrap_or(&pattern)
        }
        RuleCondition::Filename => filename.contains(&pattern),
        RuleCondition::Url => url.contains(&pattern),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ConflictAction;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap()
    }

    fn general(id: &str, condition: RuleCondition, pattern: &str, folder: &str) -> Rule {
        Rule::new(id, RuleCategory::General, condition, pattern, folder)
    }

    fn site(id: &str, site: &str, condition: RuleCondition, pattern: &str, folder: &str) -> Rule {
        Rule::new(id, RuleCategory::Site, condition, pattern, folder).with_site_pattern(site)
    }

    fn item(url: &str, filename: &str) -> DownloadItem {
        DownloadItem::new(1, url, filename)
    }

    #[test]
    fn sort_puts_site_first_then_priority_then_input_order() {
        let rules = vec![
            general("g-none", RuleCondition::Url, "x", ""),
            general("g2", RuleCondition::Url, "x", "").with_priority(2),
            site("s-none", "a", RuleCondition::Url, "x", ""),
            general("g1", RuleCondition::Url, "x", "").with_priority(1),
            site("s1", "a", RuleCondition::Url, "x", "").with_priority(1),
            general("g1-dup", RuleCondition::Url, "x", "").with_priority(1),
        ];
        let order: Vec<&str> = sort_rules(&rules).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(order, vec!["s1", "s-none", "g1", "g1-dup", "g2", "g-none"]);
    }

    #[test]
    fn extension_beats_filename_by_priority() {
        let rules = vec![
            general("pdf", RuleCondition::Extension, "pdf", "Docs").with_priority(1),
            general("inv", RuleCondition::Filename, "invoice", "Finance").with_priority(2),
        ];
        let s = resolve(&rules, &item("https://example.com/invoice.pdf", "invoice.pdf"), None)
            .unwrap();
        assert_eq!(s.filename, "Docs/invoice.pdf");
        assert_eq!(s.conflict_action, ConflictAction::Uniquify);
    }

    #[test]
    fn extension_ignores_leading_dot_and_case() {
        let rules = vec![general("zip", RuleCondition::Extension, ".ZIP", "Archives/")];
        let s = resolve(&rules, &item("https://e.com/a", "Bundle.Zip"), None).unwrap();
        assert_eq!(s.filename, "Archives/Bundle.Zip");
    }

    #[test]
    fn extension_requires_exact_suffix() {
        let rules = vec![general("gz", RuleCondition::Extension, "gz", "Archives")];
        assert!(resolve(&rules, &item("https://e.com/a", "data.tgz"), None).is_none());
        assert!(resolve(&rules, &item("https://e.com/a", "data.tar.gz"), None).is_some());
    }

    #[test]
    fn url_condition_is_case_insensitive_substring() {
        let rules = vec![general("cdn", RuleCondition::Url, "CDN.example", "Cdn")];
        let s = resolve(&rules, &item("https://cdn.EXAMPLE.com/x.bin", "x.bin"), None).unwrap();
        assert_eq!(s.filename, "Cdn/x.bin");
    }

    #[test]
    fn site_rule_matches_page_url_when_download_url_differs() {
        let rules = vec![
            site("gh", "github.com", RuleCondition::Extension, "zip", "GitHub"),
            general("zip", RuleCondition::Extension, "zip", "Archives").with_priority(1),
        ];
        let dl = item("https://objects.githubusercontent.com/r/1", "repo.zip");

        let with_page = resolve(&rules, &dl, Some("https://github.com/owner/repo")).unwrap();
        assert_eq!(with_page.filename, "GitHub/repo.zip");

        let without_page = resolve(&rules, &dl, None).unwrap();
        assert_eq!(without_page.filename, "Archives/repo.zip");
    }

    #[test]
    fn site_rule_without_site_pattern_is_unscoped() {
        let mut rule = site("s", "x", RuleCondition::Filename, "a", "F");
        rule.site_pattern = None;
        let s = resolve(&[rule], &item("https://other.org/a", "a.txt"), None).unwrap();
        assert_eq!(s.filename, "F/a.txt");
    }

    #[test]
    fn stored_site_rule_with_empty_site_pattern_matches_everywhere() {
        let json = r#"{"id":"1","category":"site","sitePattern":"",
            "condition":"extension","pattern":"pdf","folder":"Docs"}"#;
        let rule: Rule = serde_json::from_str(json).unwrap();
        let s = resolve(&[rule], &item("https://example.com/a.pdf", "a.pdf"), None).unwrap();
        assert_eq!(s.filename, "Docs/a.pdf");
    }

    #[test]
    fn empty_pattern_never_matches() {
        let rules = vec![general("empty", RuleCondition::Filename, "", "All")];
        assert!(resolve(&rules, &item("https://e.com/a", "a.txt"), None).is_none());
    }

    #[test]
    fn empty_rules_and_no_match_resolve_to_none() {
        assert!(resolve(&[], &item("https://e.com/a", "a.txt"), None).is_none());
        let rules = vec![general("pdf", RuleCondition::Extension, "pdf", "Docs")];
        assert!(resolve(&rules, &item("https://e.com/a", "a.txt"), None).is_none());
    }

    #[test]
    fn empty_folder_keeps_bare_filename() {
        let rules = vec![general("ow", RuleCondition::Extension, "iso", "/").with_overwrite()];
        let s = resolve(&rules, &item("https://e.com/a", "debian.iso"), None).unwrap();
        assert_eq!(s.filename, "debian.iso");
        assert_eq!(s.conflict_action, ConflictAction::Overwrite);
    }

    #[test]
    fn rename_appends_original_extension() {
        let rules = vec![
            general("r", RuleCondition::Extension, "pdf", "Docs").with_rename("[filename]_[date]"),
        ];
        let m = resolve_match_at(&rules, &item("https://e.com/a", "report.pdf"), None, at())
            .unwrap();
        assert_eq!(m.rule.id, "r");
        assert_eq!(m.suggestion.filename, "Docs/report_20240315.pdf");
    }

    #[test]
    fn rename_with_ext_placeholder_is_verbatim() {
        let rules = vec![
            general("r", RuleCondition::Extension, "jpg", "").with_rename("[datetime].[EXT]"),
        ];
        let m = resolve_match_at(&rules, &item("https://e.com/a", "IMG_01.jpg"), None, at())
            .unwrap();
        assert_eq!(m.suggestion.filename, "20240315-090507.jpg");
    }

    #[test]
    fn rename_flag_without_template_keeps_name() {
        let mut rule = general("r", RuleCondition::Filename, "notes", "Notes");
        rule.rename = true;
        assert_eq!(final_filename_at(&rule, "notes.md", at()), "notes.md");
    }

    #[test]
    fn template_ignored_when_rename_is_off() {
        let mut rule = general("r", RuleCondition::Filename, "notes", "Notes").with_rename("x");
        rule.rename = false;
        assert_eq!(final_filename_at(&rule, "notes.md", at()), "notes.md");
    }

    #[test]
    fn rename_of_dotfile_treats_whole_name_as_base() {
        let dotfile = item("https://e.com/a", ".bashrc");
        let rule = general("dot", RuleCondition::Filename, "bashrc", "Dotfiles")
            .with_rename("[filename]-[date]");
        let binding = [rule];
        let m = resolve_match_at(&binding, &dotfile, None, at()).unwrap();
        assert_eq!(m.suggestion.filename, "Dotfiles/.bashrc-20240315");

        let rules = vec![
            general("dot", RuleCondition::Filename, "bashrc", "").with_rename("[ext]_[filename]"),
        ];
        let m = resolve_match_at(&rules, &dotfile, None, at()).unwrap();
        assert_eq!(m.suggestion.filename, "_.bashrc");
    }

    #[test]
    fn resolve_is_idempotent() {
        let rules = vec![
            site("s", "example", RuleCondition::Url, "files", "Site").with_priority(1),
            general("g", RuleCondition::Extension, "txt", "Text").with_priority(1),
        ];
        let dl = item("https://files.example.com/a.txt", "a.txt");
        let first = resolve_match_at(&rules, &dl, None, at());
        let second = resolve_match_at(&rules, &dl, None, at());
        assert_eq!(first, second);
        assert_eq!(first.unwrap().suggestion.filename, "Site/a.txt");
    }
}
