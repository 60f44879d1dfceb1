//! Structural edits to the rule set.
//!
//! Every edit leaves the rule list grouped (site rules, then general rules)
//! with priorities renumbered to a dense `1..N` within each category. New and
//! re-categorised rules enter at the head of their category.

use super::{Rule, RuleCategory, RuleError, Settings};

/// Renumber priorities to `1..N` per category and regroup site rules before
/// general rules. Relative order within a category is preserved; unranked
/// rules go after ranked ones in their existing order.
pub fn normalize_priorities(rules: &mut Vec<Rule>) {
    let mut all = std::mem::take(rules);
    all.sort_by_key(|r| r.priority_rank());

    for category in RuleCategory::ALL {
        let mut next = 1;
        for mut rule in all.iter().filter(|r| r.category == category).cloned() {
            rule.priority = Some(next);
            next += 1;
            rules.push(rule);
        }
    }
}

/// Generate an id for a new rule: the current Unix time in milliseconds,
/// bumped until it does not collide with an existing id.
pub fn next_rule_id(settings: &Settings, now_ms: i64) -> String {
    let mut candidate = now_ms;
    while settings.find(&candidate.to_string()).is_some() {
        candidate += 1;
    }
    candidate.to_string()
}

/// Add a new rule at the head of its category. Returns the rule's id.
pub fn add_rule(settings: &mut Settings, rule: Rule) -> Result<String, RuleError> {
    let rule = rule.normalized();
    rule.validate()?;
    if settings.find(&rule.id).is_some() {
        return Err(RuleError::DuplicateId(rule.id));
    }
    let id = rule.id.clone();
    insert_at_category_head(&mut settings.rules, rule);
    normalize_priorities(&mut settings.rules);
    tracing::debug!(rule_id = %id, "rule added");
    Ok(id)
}

/// Replace the rule with the same id.
///
/// If the category is unchanged the rule keeps its position; otherwise it
/// moves to the head of its new category.
pub fn update_rule(settings: &mut Settings, rule: Rule) -> Result<(), RuleError> {
    let mut rule = rule.normalized();
    rule.validate()?;
    let index = settings
        .rules
        .iter()
        .position(|r| r.id == rule.id)
        .ok_or_else(|| RuleError::NotFound(rule.id.clone()))?;

    let original = &settings.rules[index];
    if original.category == rule.category {
        rule.priority = original.priority;
        settings.rules[index] = rule;
    } else {
        settings.rules.remove(index);
        insert_at_category_head(&mut settings.rules, rule);
    }
    normalize_priorities(&mut settings.rules);
    Ok(())
}

/// Remove a rule by id, returning it.
pub fn delete_rule(settings: &mut Settings, id: &str) -> Result<Rule, RuleError> {
    let index = settings
        .rules
        .iter()
        .position(|r| r.id == id)
        .ok_or_else(|| RuleError::NotFound(id.to_string()))?;
    let removed = settings.rules.remove(index);
    normalize_priorities(&mut settings.rules);
    Ok(removed)
}

/// Copy a rule under `new_id` as a new rule at the head of its category.
pub fn duplicate_rule(
    settings: &mut Settings,
    id: &str,
    new_id: impl Into<String>,
) -> Result<String, RuleError> {
    let source = settings
        .find(id)
        .ok_or_else(|| RuleError::NotFound(id.to_string()))?;
    let copy = Rule {
        id: new_id.into(),
        priority: None,
        ..source.clone()
    };
    add_rule(settings, copy)
}

/// Move the rule at position `from` to position `to` within `category`
/// (0-based positions in priority order), then renumber.
pub fn move_rule(
    settings: &mut Settings,
    category: RuleCategory,
    from: usize,
    to: usize,
) -> Result<(), RuleError> {
    let mut ordered: Vec<Rule> = settings
        .category_rules(category)
        .into_iter()
        .cloned()
        .collect();
    let len = ordered.len();
    for index in [from, to] {
        if index >= len {
            return Err(RuleError::PositionOutOfRange {
                category,
                index,
                len,
            });
        }
    }
    if from == to {
        return Ok(());
    }

    let moved = ordered.remove(from);
    ordered.insert(to, moved);
    for (i, rule) in ordered.iter_mut().enumerate() {
        rule.priority = Some(i as u32 + 1);
    }

    settings.rules.retain(|r| r.category != category);
    settings.rules.extend(ordered);
    normalize_priorities(&mut settings.rules);
    Ok(())
}

/// Put `rule` first in its category: it takes priority 1 and every ranked
/// rule of the same category shifts down by one.
fn insert_at_category_head(rules: &mut Vec<Rule>, mut rule: Rule) {
    for existing in rules.iter_mut().filter(|r| r.category == rule.category) {
        if let Some(p) = existing.priority.as_mut() {
            *p = p.saturating_add(1);
        }
    }
    rule.priority = Some(1);
    rules.insert(0, rule);
}
