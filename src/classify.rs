//! Reef category classification.
//!
//! Maps free-text reef labels such as `"2단상자형강제어초 보강"` to a short
//! category abbreviation (`"2단상자"`) using an ordered pattern table.
//!
//! Matching is case-sensitive substring containment. The longest pattern
//! found in the label wins; equal lengths resolve to the rule declared first.
//! Rules with an empty abbreviation are *suppressing*: they recognise noise
//! words (`보강`, `인공어초`) without producing a category, so the search moves
//! on to the next-best rule. The note is only consulted when the label yields
//! nothing.

/// One `pattern -> abbreviation` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    pub pattern: String,
    pub abbreviation: String,
}

impl CategoryRule {
    /// A suppressing rule matches but never classifies.
    pub fn is_suppressing(&self) -> bool {
        self.abbreviation.is_empty()
    }
}

/// Immutable ordered category table.
///
/// # Example
/// ```
/// use waypoint_dedup::CategoryTable;
///
/// let table = CategoryTable::default();
/// let rule = table.classify("2단상자형강제어초 보강", "").unwrap();
/// assert_eq!(rule.abbreviation, "2단상자");
///
/// assert!(table.classify("보강", "").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
    /// Rule indices by descending pattern length, declaration order on ties
    ranked: Vec<usize>,
}

impl CategoryTable {
    /// Build a table from `(pattern, abbreviation)` pairs in declaration order.
    ///
    /// Empty patterns are dropped since they would match every string.
    pub fn new<P, A>(rules: impl IntoIterator<Item = (P, A)>) -> Self
    where
        P: Into<String>,
        A: Into<String>,
    {
        let rules: Vec<CategoryRule> = rules
            .into_iter()
            .map(|(p, a)| CategoryRule { pattern: p.into(), abbreviation: a.into() })
            .filter(|r| !r.pattern.is_empty())
            .collect();

        let mut ranked: Vec<usize> = (0..rules.len()).collect();
        // sort_by_key is stable
        ranked.sort_by_key(|&i| std::cmp::Reverse(rules[i].pattern.chars().count()));

        Self { rules, ranked }
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Classify a label, falling back to the note.
    ///
    /// Returns `None` when neither string contains a non-suppressing pattern.
    pub fn classify(&self, label: &str, note: &str) -> Option<&CategoryRule> {
        self.best_match(label).or_else(|| self.best_match(note))
    }

    fn best_match(&self, text: &str) -> Option<&CategoryRule> {
        if text.is_empty() {
            return None;
        }

        self.ranked
            .iter()
            .map(|&i| &self.rules[i])
            .filter(|rule| text.contains(rule.pattern.as_str()))
            .find(|rule| !rule.is_suppressing())
    }
}

impl Default for CategoryTable {
    /// Built-in table of Korean artificial-reef structure types.
    fn default() -> Self {
        Self::new([
            ("2단상자형강제어초", "2단상자"),
            ("상자형강제어초", "상자"),
            ("대형강제어초", "대형강제"),
            ("팔각반구형어초", "팔각"),
            ("반구형어초", "반구"),
            ("사각형어초", "사각"),
            ("사각어초", "사각"),
            ("터널형어초", "터널"),
            ("아치형어초", "아치"),
            ("원통형어초", "원통"),
            ("삼각뿔형어초", "삼각"),
            ("십자형어초", "십자"),
            ("해중림어초", "해중림"),
            ("강제어초", "강제"),
            ("인공어초", ""),
            ("보강", ""),
            ("추가", ""),
            ("시설", ""),
        ])
    }
}
