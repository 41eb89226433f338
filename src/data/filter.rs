// ---------------------------------------------------------------------------
// Category filter: one pinned brand group, plus a transient hover preview
// ---------------------------------------------------------------------------

/// Whether a mark is drawn at full strength or faded out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Full,
    Dimmed,
}

impl Emphasis {
    /// Mark opacity for this emphasis level.
    pub fn opacity(self) -> f32 {
        match self {
            Emphasis::Full => 0.8,
            Emphasis::Dimmed => 0.15,
        }
    }
}

/// Legend-driven highlight state.
///
/// At most one category is pinned at a time. Clicking the pinned category
/// again clears it. A hovered category takes precedence while the pointer
/// stays on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    active: Option<String>,
    hovered: Option<String>,
}

impl CategoryFilter {
    /// Pin `category`, or clear the pin if it is already the pinned one.
    pub fn toggle(&mut self, category: &str) {
        if self.active.as_deref() == Some(category) {
            self.active = None;
        } else {
            self.active = Some(category.to_string());
        }
        log::debug!("category filter now {:?}", self.active);
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Record the category under the pointer for this frame.
    pub fn set_hovered(&mut self, category: Option<&str>) {
        self.hovered = category.map(str::to_string);
    }

    /// The category currently driving the dimming, hover first.
    pub fn focus(&self) -> Option<&str> {
        self.hovered.as_deref().or(self.active.as_deref())
    }

    /// Emphasis for a mark in `category` (`None` for uncategorised marks).
    pub fn emphasis(&self, category: Option<&str>) -> Emphasis {
        match self.focus() {
            None => Emphasis::Full,
            Some(focus) if category == Some(focus) => Emphasis::Full,
            Some(_) => Emphasis::Dimmed,
        }
    }

    /// Drop both the pin and any hover preview.
    pub fn clear(&mut self) {
        self.active = None;
        self.hovered = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATEGORIES: [&str; 3] = ["Japan", "Germany", "USA"];

    fn emphasis_snapshot(filter: &CategoryFilter) -> Vec<Emphasis> {
        CATEGORIES
            .iter()
            .map(|c| filter.emphasis(Some(*c)))
            .chain(std::iter::once(filter.emphasis(None)))
            .collect()
    }

    #[test]
    fn unfiltered_marks_are_full() {
        let filter = CategoryFilter::default();
        assert!(emphasis_snapshot(&filter).iter().all(|e| *e == Emphasis::Full));
    }

    #[test]
    fn pinned_category_dims_the_rest() {
        let mut filter = CategoryFilter::default();
        filter.toggle("Japan");
        assert_eq!(filter.active(), Some("Japan"));
        assert_eq!(filter.emphasis(Some("Japan")), Emphasis::Full);
        assert_eq!(filter.emphasis(Some("USA")), Emphasis::Dimmed);
        assert_eq!(filter.emphasis(None), Emphasis::Dimmed);
    }

    #[test]
    fn double_toggle_restores_baseline() {
        let mut filter = CategoryFilter::default();
        let baseline = emphasis_snapshot(&filter);
        filter.toggle("Germany");
        filter.toggle("Germany");
        assert_eq!(filter.active(), None);
        assert_eq!(emphasis_snapshot(&filter), baseline);
    }

    #[test]
    fn toggling_another_category_moves_the_pin() {
        let mut filter = CategoryFilter::default();
        filter.toggle("Japan");
        filter.toggle("USA");
        assert_eq!(filter.active(), Some("USA"));
    }

    #[test]
    fn hover_overrides_pin_until_released() {
        let mut filter = CategoryFilter::default();
        filter.toggle("Japan");
        filter.set_hovered(Some("USA"));
        assert_eq!(filter.emphasis(Some("USA")), Emphasis::Full);
        assert_eq!(filter.emphasis(Some("Japan")), Emphasis::Dimmed);

        filter.set_hovered(None);
        assert_eq!(filter.emphasis(Some("Japan")), Emphasis::Full);
    }
}
