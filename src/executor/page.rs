//! Take/skip paging

/// Page window; `take <= 0` disables paging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Page {
    pub skip: i64,
    pub take: i64,
}

impl Page {
    pub fn new(skip: i64, take: i64) -> Self {
        Self { skip, take }
    }

    pub fn is_enabled(&self) -> bool {
        self.take > 0
    }

    /// Applies the window. A negative skip counts as zero.
    pub fn apply<T>(&self, records: Vec<T>) -> Vec<T> {
        if !self.is_enabled() {
            return records;
        }
        let skip = usize::try_from(self.skip.max(0)).unwrap_or(usize::MAX);
        let take = usize::try_from(self.take).unwrap_or(usize::MAX);
        records.into_iter().skip(skip).take(take).collect()
    }
}
