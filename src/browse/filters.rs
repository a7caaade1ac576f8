//! Filter state with significance gating.
//!
//! Text filters only reach the backend once they are at least
//! [`MIN_TEXT_FILTER_LEN`] characters long (or cleared); digit filters only at
//! exactly the required digit count (or cleared). Partial input is kept for
//! display so the user can keep typing, but it is never sent.

use std::collections::BTreeMap;

use tracing::debug;

/// Minimum trimmed length for a text filter to become active.
pub const MIN_TEXT_FILTER_LEN: usize = 3;

/// Digit count of a year filter.
pub const YEAR_DIGITS: usize = 4;

/// Filter values that are sent with a collection query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveFilters(BTreeMap<String, String>);

impl ActiveFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// How a filter's raw value turns into an active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterRule {
    /// Free text, active at `min_len` trimmed characters or more
    Text { min_len: usize },
    /// Numeric, active only at exactly `digits` ASCII digits
    ExactDigits { digits: usize },
    /// Selected from a closed list; any selection is active
    Choice,
}

impl FilterRule {
    /// Active form of `raw` under this rule, `None` when cleared or partial.
    fn active_value(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match *self {
            FilterRule::Text { min_len } => {
                (trimmed.chars().count() >= min_len).then(|| trimmed.to_string())
            }
            FilterRule::ExactDigits { digits } => (trimmed.len() == digits
                && trimmed.chars().all(|c| c.is_ascii_digit()))
            .then(|| trimmed.to_string()),
            FilterRule::Choice => Some(trimmed.to_string()),
        }
    }

    /// Whether an edit to `raw` should trigger a reload.
    fn is_significant(&self, raw: &str) -> bool {
        raw.trim().is_empty() || self.active_value(raw).is_some()
    }
}

#[derive(Debug, Clone)]
struct FilterSlot {
    rule: FilterRule,
    raw: String,
}

/// Result of a filter edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// The edit is significant; reload from page one with these filters
    Reload(ActiveFilters),
    /// The edit is kept for display only
    Retained,
}

impl FilterOutcome {
    pub fn is_reload(&self) -> bool {
        matches!(self, FilterOutcome::Reload(_))
    }
}

/// Holds every filter of one collection view.
#[derive(Debug, Clone, Default)]
pub struct FilterCoordinator {
    slots: BTreeMap<String, FilterSlot>,
}

impl FilterCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a free-text filter; significant when cleared or at least three characters.
    pub fn set_text_filter(&mut self, name: &str, raw: &str) -> FilterOutcome {
        self.set(
            name,
            raw,
            FilterRule::Text {
                min_len: MIN_TEXT_FILTER_LEN,
            },
        )
    }

    /// Set a numeric filter that only counts at exactly `required_digits` digits.
    pub fn set_exact_digit_filter(
        &mut self,
        name: &str,
        raw: &str,
        required_digits: usize,
    ) -> FilterOutcome {
        self.set(
            name,
            raw,
            FilterRule::ExactDigits {
                digits: required_digits,
            },
        )
    }

    /// Set or clear a closed-list selection such as the month.
    pub fn set_choice_filter(&mut self, name: &str, value: Option<&str>) -> FilterOutcome {
        self.set(name, value.unwrap_or_default(), FilterRule::Choice)
    }

    /// Reset every filter; always reloads exactly once.
    pub fn clear_all(&mut self) -> FilterOutcome {
        for slot in self.slots.values_mut() {
            slot.raw.clear();
        }
        debug!("Cleared all filters");
        FilterOutcome::Reload(ActiveFilters::new())
    }

    /// Filters that would be sent with a query right now.
    pub fn active(&self) -> ActiveFilters {
        let mut active = ActiveFilters::new();
        for (name, slot) in &self.slots {
            if let Some(value) = slot.rule.active_value(&slot.raw) {
                active = active.with(name.clone(), value);
            }
        }
        active
    }

    /// Raw value as typed, including partial input.
    pub fn display_value(&self, name: &str) -> Option<&str> {
        self.slots.get(name).map(|slot| slot.raw.as_str())
    }

    fn set(&mut self, name: &str, raw: &str, rule: FilterRule) -> FilterOutcome {
        let slot = self
            .slots
            .entry(name.to_string())
            .or_insert_with(|| FilterSlot {
                rule,
                raw: String::new(),
            });
        slot.rule = rule;
        slot.raw = raw.to_string();

        if rule.is_significant(raw) {
            let active = self.active();
            debug!(filter = name, active_filters = active.len(), "Filter change triggers reload");
            FilterOutcome::Reload(active)
        } else {
            debug!(filter = name, "Partial filter value retained");
            FilterOutcome::Retained
        }
    }
}
